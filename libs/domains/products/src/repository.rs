use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::error::{ProductError, ProductResult};
use crate::models::{Pagination, Product, ProductFilter, ProductPatch};

/// Repository trait for Product persistence
///
/// This trait defines the data access interface for products.
/// Implementations can use different storage backends.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Find a single product by ID
    async fn find(&self, id: ObjectId) -> ProductResult<Product>;

    /// List a page of products matching the filter, with a pagination
    /// descriptor computed fresh for this query
    async fn find_all(&self, filter: ProductFilter) -> ProductResult<(Vec<Product>, Pagination)>;

    /// Insert a new product, returning the assigned ID
    async fn create(&self, product: Product) -> ProductResult<ObjectId>;

    /// Apply a partial update to the product with the given ID
    async fn update(&self, id: ObjectId, patch: ProductPatch) -> ProductResult<()>;

    /// Delete a product by ID
    async fn delete_by_id(&self, id: ObjectId) -> ProductResult<()>;

    /// Delete a product by its external code
    ///
    /// No current backend supports this capability. The default
    /// implementation reports it as unsupported instead of panicking.
    async fn delete_by_code(&self, _code: &str) -> ProductResult<()> {
        Err(ProductError::Unsupported("delete_by_code"))
    }
}
