//! Reviews Domain
//!
//! Owns review rows and the derived `rating` field on products: whenever a
//! review is added or soft-deleted, the product's rating is recomputed as
//! the mean grade over its active reviews (0.0 when none) inside the same
//! transaction as the triggering write. The one-active-review-per
//! (user, product) rule is enforced both in the repository check and by a
//! partial unique index at the storage layer.

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{ReviewError, ReviewResult};
pub use handlers::ApiDoc;
pub use models::{CreateReview, Review};
pub use postgres::PgReviewRepository;
pub use repository::{InMemoryReviewRepository, ReviewRepository};
pub use service::ReviewService;
