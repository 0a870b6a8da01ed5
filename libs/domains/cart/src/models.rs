use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// A persisted cart row; exactly one exists per (user, product)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    /// Unique identifier
    pub id: i32,
    /// Cart owner, supplied by the gateway
    pub user_id: i32,
    /// Selected product
    pub product_id: i32,
    /// Units selected, at least 1
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart row joined with live product data
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product_id: i32,
    /// Current product name
    pub name: String,
    /// Current price in integer cents; not a snapshot
    pub unit_price: i64,
    /// Current price in currency units
    pub display_price: f64,
    /// Units currently on hand
    pub stock: i32,
    pub quantity: i32,
    /// quantity x unit_price, in cents
    pub line_total: i64,
}

/// The full cart with presentation aggregates computed over current prices.
/// Nothing here is persisted; totals change when catalog prices change.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total_quantity: i32,
    /// Sum of line totals in cents
    pub total_price: i64,
    /// Sum of line totals in currency units
    pub display_total_price: f64,
}

/// DTO for adding units of a product to the cart
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddToCart {
    pub product_id: i32,
    /// Units to add to any existing selection
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// DTO for replacing a cart row's quantity
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SetQuantity {
    /// New quantity, at least 1
    #[validate(range(min = 1))]
    pub quantity: i32,
}
