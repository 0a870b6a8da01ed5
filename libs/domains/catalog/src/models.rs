use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Category node in the self-referential category tree
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    /// Unique identifier
    pub id: i32,
    /// Category name
    pub name: String,
    /// Parent category, if this is not a root
    pub parent_id: Option<i32>,
    /// Soft-delete flag; inactive categories are hidden from reads
    pub is_active: bool,
}

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Unique identifier
    pub id: i32,
    /// Product name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Price in integer cents
    pub price: i64,
    /// Price in currency units, derived from `price`
    pub display_price: f64,
    /// Optional image URL
    pub image_url: Option<String>,
    /// Units on hand; decremented by order placement only
    pub stock: i32,
    /// Soft-delete flag
    pub is_active: bool,
    /// Owning category (must be active)
    pub category_id: i32,
    /// Seller identity, supplied by the gateway
    pub seller_id: i32,
    /// Average review grade, owned by the reviews domain
    pub rating: f64,
}

/// DTO for creating or replacing a category
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCategory {
    #[validate(length(min = 3, max = 50))]
    pub name: String,
    pub parent_id: Option<i32>,
}

/// DTO for creating or replacing a product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(length(min = 3, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// Price in integer cents, strictly positive
    #[validate(range(min = 1))]
    pub price: i64,
    #[validate(length(max = 200))]
    pub image_url: Option<String>,
    #[validate(range(min = 0))]
    pub stock: i32,
    pub category_id: i32,
}

/// Query parameters for product search
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct SearchQuery {
    /// Free-text query matched against product name and description
    pub q: String,
    /// Maximum number of results
    #[serde(default = "default_search_limit")]
    pub limit: u64,
}

fn default_search_limit() -> u64 {
    25
}
