use chrono::Utc;
use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Product entity - represents a product stored in MongoDB
///
/// Timestamps are Unix seconds. `created_at` is set exactly once at
/// creation; `updated_at` is stamped on every successful update;
/// `deleted_at` is reserved for soft-delete and stays zero (deletes
/// are hard deletes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (stored as _id in MongoDB), assigned on creation
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Product name
    pub product_name: String,
    /// Current stock quantity
    pub stock: i32,
    /// Creation timestamp (Unix seconds)
    pub created_at: i64,
    /// Last update timestamp (Unix seconds), zero until first update
    pub updated_at: i64,
    /// Soft-delete timestamp (Unix seconds), currently always zero
    pub deleted_at: i64,
}

impl Product {
    /// Create a new product from CreateProduct DTO
    ///
    /// The identifier is left unset until the store assigns one.
    pub fn new(input: CreateProduct) -> Self {
        Self {
            id: None,
            product_name: input.product_name,
            stock: input.stock,
            created_at: Utc::now().timestamp(),
            updated_at: 0,
            deleted_at: 0,
        }
    }
}

/// DTO for creating a new product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 200))]
    pub product_name: String,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub stock: i32,
}

/// Partial update for an existing product
///
/// Fields left as `None` are not touched by the update. `Some(0)` on
/// `stock` explicitly sets the stock to zero, so "absent" and "zero"
/// stay distinguishable.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ProductPatch {
    #[validate(length(min = 1, max = 200))]
    pub product_name: Option<String>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    /// Soft-delete timestamp (Unix seconds)
    pub deleted_at: Option<i64>,
    /// Stamped by the service, never taken from the request body
    #[serde(skip)]
    pub updated_at: Option<i64>,
}

impl ProductPatch {
    /// Build the `$set` document for this patch, keyed by the fields'
    /// serialized names. Absent fields are omitted entirely.
    pub fn set_document(&self) -> Document {
        let mut set = doc! {};
        if let Some(ref product_name) = self.product_name {
            set.insert("product_name", product_name);
        }
        if let Some(stock) = self.stock {
            set.insert("stock", stock);
        }
        if let Some(deleted_at) = self.deleted_at {
            set.insert("deleted_at", deleted_at);
        }
        if let Some(updated_at) = self.updated_at {
            set.insert("updated_at", updated_at);
        }
        set
    }

    /// True when the patch carries no field at all
    pub fn is_empty(&self) -> bool {
        self.product_name.is_none()
            && self.stock.is_none()
            && self.deleted_at.is_none()
            && self.updated_at.is_none()
    }
}

/// Query filters for listing products
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct ProductFilter {
    /// 1-based page number
    #[serde(default)]
    pub page: i64,
    /// Page size
    #[serde(default)]
    pub limit: i64,
    /// Exact-match latitude (paired with longitude)
    pub latitude: Option<String>,
    /// Exact-match longitude (paired with latitude)
    pub longitude: Option<String>,
    /// Case-insensitive substring match against the product name
    pub keyword: Option<String>,
}

impl ProductFilter {
    /// Normalize page/limit: if either is non-positive, fall back to
    /// page 1 with a page size of 10.
    pub fn page_and_limit(&self) -> (i64, i64) {
        if self.page <= 0 || self.limit <= 0 {
            (1, 10)
        } else {
            (self.page, self.limit)
        }
    }

    /// Skip count for the normalized page.
    ///
    /// Saturates instead of overflowing for absurdly large page values,
    /// which are reachable straight from the query string.
    pub fn skip(&self) -> u64 {
        let (page, limit) = self.page_and_limit();
        (page - 1).saturating_mul(limit).max(0) as u64
    }

    /// Both coordinates, when both are present and non-empty
    pub fn geo(&self) -> Option<(&str, &str)> {
        match (self.latitude.as_deref(), self.longitude.as_deref()) {
            (Some(lat), Some(lng)) if !lat.is_empty() && !lng.is_empty() => Some((lat, lng)),
            _ => None,
        }
    }

    /// Keyword, when present and non-empty
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref().filter(|k| !k.is_empty())
    }
}

/// Pagination descriptor accompanying a list response
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Pagination {
    /// Count of all documents in the collection
    pub total: u64,
    /// Page size used for this query
    pub limit: i64,
    /// 1-based page number of this response
    #[serde(rename = "currentPage")]
    pub current_page: i64,
}

/// Product as exposed at the API boundary
///
/// The identifier is serialized as a lowercase hex string.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductResponse {
    /// Product ID as a 24-character lowercase hex string
    pub id: String,
    pub product_name: String,
    pub stock: i32,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: i64,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.map(|id| id.to_hex()).unwrap_or_default(),
            product_name: product.product_name,
            stock: product.stock,
            created_at: product.created_at,
            updated_at: product.updated_at,
            deleted_at: product.deleted_at,
        }
    }
}

/// Paginated list response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductPage {
    pub data: Vec<ProductResponse>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::to_document;

    #[test]
    fn test_new_product_stamps_created_at_only() {
        let product = Product::new(CreateProduct {
            product_name: "Widget".to_string(),
            stock: 3,
        });
        assert!(product.id.is_none());
        assert!(product.created_at > 0);
        assert_eq!(product.updated_at, 0);
        assert_eq!(product.deleted_at, 0);
    }

    #[test]
    fn test_product_bson_field_names() {
        let mut product = Product::new(CreateProduct {
            product_name: "Widget".to_string(),
            stock: 3,
        });
        product.id = Some(ObjectId::new());

        let doc = to_document(&product).unwrap();
        assert!(doc.contains_key("_id"));
        assert!(doc.contains_key("product_name"));
        assert!(doc.contains_key("stock"));
        assert!(doc.contains_key("created_at"));
    }

    #[test]
    fn test_product_bson_omits_unset_id() {
        let product = Product::new(CreateProduct {
            product_name: "Widget".to_string(),
            stock: 0,
        });
        let doc = to_document(&product).unwrap();
        assert!(!doc.contains_key("_id"));
    }

    #[test]
    fn test_patch_set_document_includes_only_present_fields() {
        let patch = ProductPatch {
            product_name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let set = patch.set_document();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get_str("product_name").unwrap(), "Renamed");
    }

    #[test]
    fn test_patch_zero_stock_is_an_explicit_set() {
        let patch = ProductPatch {
            stock: Some(0),
            ..Default::default()
        };
        let set = patch.set_document();
        assert_eq!(set.get_i32("stock").unwrap(), 0);
    }

    #[test]
    fn test_patch_empty() {
        let patch = ProductPatch::default();
        assert!(patch.is_empty());
        assert!(patch.set_document().is_empty());
    }

    #[test]
    fn test_patch_ignores_updated_at_from_body() {
        let patch: ProductPatch =
            serde_json::from_str(r#"{"stock": 5, "updated_at": 123}"#).unwrap();
        assert_eq!(patch.stock, Some(5));
        assert_eq!(patch.updated_at, None);
    }

    #[test]
    fn test_filter_normalization_defaults() {
        assert_eq!(ProductFilter::default().page_and_limit(), (1, 10));

        let filter = ProductFilter {
            page: 3,
            limit: 0,
            ..Default::default()
        };
        assert_eq!(filter.page_and_limit(), (1, 10));

        let filter = ProductFilter {
            page: -1,
            limit: 25,
            ..Default::default()
        };
        assert_eq!(filter.page_and_limit(), (1, 10));

        let filter = ProductFilter {
            page: 3,
            limit: 25,
            ..Default::default()
        };
        assert_eq!(filter.page_and_limit(), (3, 25));
    }

    #[test]
    fn test_filter_skip_for_normalized_page() {
        let filter = ProductFilter {
            page: 3,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(filter.skip(), 20);

        // Non-positive values normalize to page 1
        assert_eq!(ProductFilter::default().skip(), 0);
    }

    #[test]
    fn test_filter_skip_saturates_instead_of_overflowing() {
        let filter = ProductFilter {
            page: i64::MAX,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(filter.skip(), i64::MAX as u64);
    }

    #[test]
    fn test_filter_geo_requires_both_coordinates() {
        let filter = ProductFilter {
            latitude: Some("52.52".to_string()),
            ..Default::default()
        };
        assert!(filter.geo().is_none());

        let filter = ProductFilter {
            latitude: Some("52.52".to_string()),
            longitude: Some("".to_string()),
            ..Default::default()
        };
        assert!(filter.geo().is_none());

        let filter = ProductFilter {
            latitude: Some("52.52".to_string()),
            longitude: Some("13.40".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.geo(), Some(("52.52", "13.40")));
    }

    #[test]
    fn test_filter_empty_keyword_is_ignored() {
        let filter = ProductFilter {
            keyword: Some("".to_string()),
            ..Default::default()
        };
        assert!(filter.keyword().is_none());
    }

    #[test]
    fn test_response_serializes_id_as_lowercase_hex() {
        let id = ObjectId::new();
        let product = Product {
            id: Some(id),
            product_name: "Widget".to_string(),
            stock: 1,
            created_at: 1,
            updated_at: 0,
            deleted_at: 0,
        };
        let response = ProductResponse::from(product);
        assert_eq!(response.id, id.to_hex());
        assert_eq!(response.id, response.id.to_lowercase());
    }

    #[test]
    fn test_pagination_serializes_current_page_in_camel_case() {
        let pagination = Pagination {
            total: 25,
            limit: 10,
            current_page: 3,
        };
        let json = serde_json::to_value(&pagination).unwrap();
        assert_eq!(json["currentPage"], 3);
        assert_eq!(json["total"], 25);
    }
}
