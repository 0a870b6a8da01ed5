use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;

/// Order lifecycle state.
///
/// Legal transitions: pending -> paid -> shipped, plus pending -> cancelled
/// and paid -> cancelled. Everything else is rejected.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "order_status")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, awaiting payment
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Payment received
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Handed to the carrier; terminal
    #[sea_orm(string_value = "shipped")]
    Shipped,
    /// Cancelled with stock restored; terminal
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Paid, Shipped) | (Pending, Cancelled) | (Paid, Cancelled)
        )
    }
}

/// An immutable order; only `status` changes after creation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    /// Unique identifier
    pub id: i32,
    /// Buyer, supplied by the gateway
    pub user_id: i32,
    /// Lifecycle state
    pub status: OrderStatus,
    /// Sum of item totals in cents, frozen at placement
    pub total_amount: i64,
    /// Total in currency units
    pub display_total: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Line items with snapshot prices
    pub items: Vec<OrderItem>,
}

/// One order line with the unit price snapshotted at placement
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    /// Price per unit in cents at placement time; never re-derived
    pub unit_price: i64,
    /// quantity x unit_price, in cents
    pub total_price: i64,
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;

    #[test]
    fn test_legal_transitions() {
        assert!(Pending.can_transition_to(Paid));
        assert!(Paid.can_transition_to(Shipped));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Paid.can_transition_to(Cancelled));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Paid));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Paid));
        assert!(!Paid.can_transition_to(Pending));
    }
}
