//! Product Service - Business logic layer

use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, Pagination, Product, ProductFilter, ProductPatch};
use crate::repository::ProductRepository;

/// Product service providing business logic operations
///
/// The service layer validates input, owns lifecycle timestamps, and
/// delegates persistence to the repository.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    /// Create a new ProductService with the given repository
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a new product, stamping `created_at`
    #[instrument(skip(self, input), fields(product_name = %input.product_name))]
    pub async fn create_product(&self, input: CreateProduct) -> ProductResult<Product> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        let mut product = Product::new(input);
        let id = self.repository.create(product.clone()).await?;
        product.id = Some(id);

        Ok(product)
    }

    /// Get a product by ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: ObjectId) -> ProductResult<Product> {
        self.repository.find(id).await
    }

    /// List a page of products matching the filter
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
    ) -> ProductResult<(Vec<Product>, Pagination)> {
        self.repository.find_all(filter).await
    }

    /// Apply a partial update, stamping `updated_at`
    #[instrument(skip(self, patch))]
    pub async fn update_product(&self, id: ObjectId, mut patch: ProductPatch) -> ProductResult<()> {
        patch
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        patch.updated_at = Some(Utc::now().timestamp());
        self.repository.update(id, patch).await
    }

    /// Delete a product by ID
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ObjectId) -> ProductResult<()> {
        self.repository.delete_by_id(id).await
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockProductRepository;
    use mockall::predicate::eq;

    fn sample_input() -> CreateProduct {
        CreateProduct {
            product_name: "Widget".to_string(),
            stock: 5,
        }
    }

    #[tokio::test]
    async fn test_create_product_assigns_id_and_created_at() {
        let id = ObjectId::new();
        let mut repo = MockProductRepository::new();
        repo.expect_create()
            .withf(|p| p.id.is_none() && p.created_at > 0 && p.updated_at == 0)
            .return_once(move |_| Ok(id));

        let service = ProductService::new(repo);
        let product = service.create_product(sample_input()).await.unwrap();

        assert_eq!(product.id, Some(id));
        assert_eq!(product.product_name, "Widget");
        assert!(product.created_at > 0);
    }

    #[tokio::test]
    async fn test_create_product_rejects_empty_name() {
        let mut repo = MockProductRepository::new();
        repo.expect_create().never();

        let service = ProductService::new(repo);
        let result = service
            .create_product(CreateProduct {
                product_name: String::new(),
                stock: 0,
            })
            .await;

        assert!(matches!(result, Err(ProductError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_product_propagates_not_found() {
        let id = ObjectId::new();
        let mut repo = MockProductRepository::new();
        repo.expect_find()
            .with(eq(id))
            .return_once(move |_| Err(ProductError::NotFound(id)));

        let service = ProductService::new(repo);
        let result = service.get_product(id).await;

        assert!(matches!(result, Err(ProductError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_product_stamps_updated_at() {
        let id = ObjectId::new();
        let mut repo = MockProductRepository::new();
        repo.expect_update()
            .withf(|_, patch| patch.updated_at.is_some() && patch.stock == Some(7))
            .return_once(|_, _| Ok(()));

        let service = ProductService::new(repo);
        let patch = ProductPatch {
            stock: Some(7),
            ..Default::default()
        };
        service.update_product(id, patch).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_product_rejects_negative_stock() {
        let mut repo = MockProductRepository::new();
        repo.expect_update().never();

        let service = ProductService::new(repo);
        let patch = ProductPatch {
            stock: Some(-1),
            ..Default::default()
        };
        let result = service.update_product(ObjectId::new(), patch).await;

        assert!(matches!(result, Err(ProductError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_product_delegates() {
        let id = ObjectId::new();
        let mut repo = MockProductRepository::new();
        repo.expect_delete_by_id()
            .with(eq(id))
            .return_once(|_| Ok(()));

        let service = ProductService::new(repo);
        service.delete_product(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_products_returns_pagination() {
        let mut repo = MockProductRepository::new();
        repo.expect_find_all().return_once(|_| {
            Ok((
                vec![],
                Pagination {
                    total: 25,
                    limit: 10,
                    current_page: 3,
                },
            ))
        });

        let service = ProductService::new(repo);
        let (products, pagination) = service
            .list_products(ProductFilter {
                page: 3,
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(products.is_empty());
        assert_eq!(pagination.total, 25);
        assert_eq!(pagination.current_page, 3);
    }

    #[tokio::test]
    async fn test_delete_by_code_is_unsupported_by_default() {
        struct NoopRepository;

        #[async_trait::async_trait]
        impl ProductRepository for NoopRepository {
            async fn find(&self, id: ObjectId) -> ProductResult<Product> {
                Err(ProductError::NotFound(id))
            }
            async fn find_all(
                &self,
                _filter: ProductFilter,
            ) -> ProductResult<(Vec<Product>, Pagination)> {
                Ok((
                    vec![],
                    Pagination {
                        total: 0,
                        limit: 10,
                        current_page: 1,
                    },
                ))
            }
            async fn create(&self, _product: Product) -> ProductResult<ObjectId> {
                Ok(ObjectId::new())
            }
            async fn update(&self, _id: ObjectId, _patch: ProductPatch) -> ProductResult<()> {
                Ok(())
            }
            async fn delete_by_id(&self, _id: ObjectId) -> ProductResult<()> {
                Ok(())
            }
        }

        let result = NoopRepository.delete_by_code("ABC-123").await;
        assert!(matches!(result, Err(ProductError::Unsupported(_))));
    }
}
