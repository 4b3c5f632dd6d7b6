//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, from_document, oid::ObjectId, Document},
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use tracing::instrument;

use crate::error::{ProductError, ProductResult};
use crate::models::{Pagination, Product, ProductFilter, ProductPatch};
use crate::repository::ProductRepository;

/// MongoDB implementation of the ProductRepository
pub struct MongoProductRepository {
    collection: Collection<Product>,
}

impl MongoProductRepository {
    /// Create a new MongoProductRepository
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<Product>("products");
        Self { collection }
    }

    /// Create a new MongoProductRepository with a custom collection name
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<Product>(collection_name);
        Self { collection }
    }

    /// Initialize indexes for optimal query performance
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let indexes = vec![
            // Name lookups and keyword matching
            IndexModel::builder()
                .keys(doc! { "product_name": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_product_name".to_string())
                        .build(),
                )
                .build(),
            // Listing order
            IndexModel::builder()
                .keys(doc! { "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_created_at".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<Product> {
        &self.collection
    }

    /// Build a MongoDB filter document from ProductFilter
    ///
    /// Criteria combine conjunctively. Geo coordinates only apply when
    /// both are present; an empty filter matches everything.
    ///
    /// The keyword is handed to `$regex` verbatim: metacharacters are
    /// interpreted by the store and an invalid pattern fails the query.
    /// Callers rely on this, do not escape it here.
    fn build_filter(filter: &ProductFilter) -> Document {
        let mut doc = doc! {};

        if let Some((latitude, longitude)) = filter.geo() {
            doc.insert("address.geo.latitude", doc! { "$eq": latitude });
            doc.insert("address.geo.longitude", doc! { "$eq": longitude });
        }

        if let Some(keyword) = filter.keyword() {
            doc.insert("product_name", doc! { "$regex": keyword, "$options": "i" });
        }

        doc
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self))]
    async fn find(&self, id: ObjectId) -> ProductResult<Product> {
        let filter = doc! { "_id": id };
        self.collection
            .find_one(filter)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, filter: ProductFilter) -> ProductResult<(Vec<Product>, Pagination)> {
        let (page, limit) = filter.page_and_limit();
        let skip = filter.skip();

        // Total is the collection-wide count, independent of the filter.
        // Callers depend on this exact behavior.
        let total = self.collection.count_documents(doc! {}).await?;

        let mongo_filter = Self::build_filter(&filter);

        let options = mongodb::options::FindOptions::builder()
            .skip(skip)
            .limit(limit)
            .build();

        // Decode per document so a single malformed record skips
        // instead of aborting the whole page.
        let mut cursor = self
            .collection
            .clone_with_type::<Document>()
            .find(mongo_filter)
            .with_options(options)
            .await?;

        let mut products = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            match from_document::<Product>(document) {
                Ok(product) => products.push(product),
                Err(e) => {
                    tracing::warn!("Skipping undecodable product document: {}", e);
                }
            }
        }

        let pagination = Pagination {
            total,
            limit,
            current_page: page,
        };

        Ok((products, pagination))
    }

    #[instrument(skip(self, product), fields(product_name = %product.product_name))]
    async fn create(&self, product: Product) -> ProductResult<ObjectId> {
        let result = self.collection.insert_one(&product).await?;

        let id = result.inserted_id.as_object_id().ok_or_else(|| {
            ProductError::Database("store returned a non-ObjectId identifier".to_string())
        })?;

        tracing::info!(product_id = %id, "Product created successfully");
        Ok(id)
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: ObjectId, patch: ProductPatch) -> ProductResult<()> {
        let set = patch.set_document();
        if set.is_empty() {
            // Nothing to write, but a missing id must still report NotFound
            self.find(id).await?;
            return Ok(());
        }

        let result = self
            .collection
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;

        if result.matched_count == 0 {
            return Err(ProductError::NotFound(id));
        }

        tracing::info!(product_id = %id, "Product updated successfully");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: ObjectId) -> ProductResult<()> {
        let filter = doc! { "_id": id };
        let result = self.collection.delete_one(filter).await?;

        if result.deleted_count == 0 {
            return Err(ProductError::NotFound(id));
        }

        tracing::info!(product_id = %id, "Product deleted successfully");
        Ok(())
    }
}
