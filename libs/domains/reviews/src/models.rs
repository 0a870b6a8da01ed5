use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// A buyer's review of a product
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Review {
    /// Unique identifier
    pub id: i32,
    /// Reviewer, supplied by the gateway
    pub user_id: i32,
    /// Reviewed product
    pub product_id: i32,
    /// Optional free-text comment
    pub comment: Option<String>,
    /// When the review was left
    pub comment_date: DateTime<Utc>,
    /// Grade, 1 to 5
    pub grade: i32,
    /// Soft-delete flag
    pub is_active: bool,
}

/// DTO for creating a review
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReview {
    pub product_id: i32,
    pub comment: Option<String>,
    /// Grade from 1 to 5
    #[validate(range(min = 1, max = 5))]
    pub grade: i32,
}
