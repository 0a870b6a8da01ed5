use std::sync::Arc;
use validator::Validate;

use crate::error::{ReviewError, ReviewResult};
use crate::models::{CreateReview, Review};
use crate::repository::ReviewRepository;

/// Service layer for review business logic
#[derive(Clone)]
pub struct ReviewService<R: ReviewRepository> {
    repository: Arc<R>,
}

impl<R: ReviewRepository> ReviewService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    pub async fn add_review(&self, user_id: i32, input: CreateReview) -> ReviewResult<Review> {
        input
            .validate()
            .map_err(|e| ReviewError::Validation(e.to_string()))?;

        self.repository.add_review(user_id, input).await
    }

    pub async fn remove_review(&self, review_id: i32) -> ReviewResult<()> {
        self.repository.remove_review(review_id).await
    }

    pub async fn list_reviews(&self) -> ReviewResult<Vec<Review>> {
        self.repository.list_reviews().await
    }

    pub async fn list_product_reviews(&self, product_id: i32) -> ReviewResult<Vec<Review>> {
        self.repository.list_product_reviews(product_id).await
    }
}
