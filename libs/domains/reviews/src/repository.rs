use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{ReviewError, ReviewResult};
use crate::models::{CreateReview, Review};

/// Repository trait for reviews.
///
/// `add_review` and `remove_review` carry the rating recomputation with
/// them: the triggering write and the product's new rating always commit
/// together, so a reader can never observe a stale rating.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Insert a review for an active product and recompute its rating
    async fn add_review(&self, user_id: i32, input: CreateReview) -> ReviewResult<Review>;

    /// Soft-delete a review and recompute the product's rating
    async fn remove_review(&self, review_id: i32) -> ReviewResult<()>;

    /// List all active reviews
    async fn list_reviews(&self) -> ReviewResult<Vec<Review>>;

    /// List active reviews for an active product
    async fn list_product_reviews(&self, product_id: i32) -> ReviewResult<Vec<Review>>;
}

#[derive(Clone, Copy)]
struct ProductRow {
    is_active: bool,
    rating: f64,
}

#[derive(Default)]
struct Inner {
    reviews: HashMap<i32, Review>,
    products: HashMap<i32, ProductRow>,
    next_review_id: i32,
}

impl Inner {
    /// Mean grade over active reviews, or 0.0 when none remain
    fn recompute_rating(&mut self, product_id: i32) {
        let grades: Vec<i32> = self
            .reviews
            .values()
            .filter(|r| r.product_id == product_id && r.is_active)
            .map(|r| r.grade)
            .collect();

        let rating = if grades.is_empty() {
            0.0
        } else {
            grades.iter().sum::<i32>() as f64 / grades.len() as f64
        };

        if let Some(product) = self.products.get_mut(&product_id) {
            product.rating = rating;
        }
    }
}

/// In-memory implementation of [`ReviewRepository`] (for development and
/// tests). It keeps its own minimal view of product rows (active flag and
/// rating), seeded by the caller, mirroring the write access the PostgreSQL
/// implementation has to the products table.
#[derive(Default, Clone)]
pub struct InMemoryReviewRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryReviewRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an active product the repository may review
    pub async fn seed_product(&self, product_id: i32) {
        let mut inner = self.inner.write().await;
        inner.products.insert(
            product_id,
            ProductRow {
                is_active: true,
                rating: 0.0,
            },
        );
    }

    /// Mark a seeded product inactive
    pub async fn deactivate_product(&self, product_id: i32) {
        let mut inner = self.inner.write().await;
        if let Some(product) = inner.products.get_mut(&product_id) {
            product.is_active = false;
        }
    }

    /// Current derived rating of a seeded product
    pub async fn product_rating(&self, product_id: i32) -> Option<f64> {
        let inner = self.inner.read().await;
        inner.products.get(&product_id).map(|p| p.rating)
    }
}

#[async_trait]
impl ReviewRepository for InMemoryReviewRepository {
    async fn add_review(&self, user_id: i32, input: CreateReview) -> ReviewResult<Review> {
        let mut inner = self.inner.write().await;

        if !inner
            .products
            .get(&input.product_id)
            .is_some_and(|p| p.is_active)
        {
            return Err(ReviewError::ProductNotFound(input.product_id));
        }

        let duplicate = inner
            .reviews
            .values()
            .any(|r| r.user_id == user_id && r.product_id == input.product_id && r.is_active);
        if duplicate {
            return Err(ReviewError::Duplicate);
        }

        inner.next_review_id += 1;
        let review = Review {
            id: inner.next_review_id,
            user_id,
            product_id: input.product_id,
            comment: input.comment,
            comment_date: Utc::now(),
            grade: input.grade,
            is_active: true,
        };
        inner.reviews.insert(review.id, review.clone());
        inner.recompute_rating(review.product_id);

        tracing::info!(review_id = review.id, product_id = review.product_id, "Added review");
        Ok(review)
    }

    async fn remove_review(&self, review_id: i32) -> ReviewResult<()> {
        let mut inner = self.inner.write().await;

        let product_id = match inner.reviews.get(&review_id) {
            Some(review) if review.is_active => review.product_id,
            _ => return Err(ReviewError::ReviewNotFound(review_id)),
        };

        inner.reviews.get_mut(&review_id).unwrap().is_active = false;
        inner.recompute_rating(product_id);

        tracing::info!(review_id, product_id, "Removed review");
        Ok(())
    }

    async fn list_reviews(&self) -> ReviewResult<Vec<Review>> {
        let inner = self.inner.read().await;
        let mut reviews: Vec<Review> = inner
            .reviews
            .values()
            .filter(|r| r.is_active)
            .cloned()
            .collect();
        reviews.sort_by_key(|r| r.id);
        Ok(reviews)
    }

    async fn list_product_reviews(&self, product_id: i32) -> ReviewResult<Vec<Review>> {
        let inner = self.inner.read().await;

        if !inner.products.get(&product_id).is_some_and(|p| p.is_active) {
            return Err(ReviewError::ProductNotFound(product_id));
        }

        let mut reviews: Vec<Review> = inner
            .reviews
            .values()
            .filter(|r| r.is_active && r.product_id == product_id)
            .cloned()
            .collect();
        reviews.sort_by_key(|r| r.id);
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(product_id: i32, grade: i32) -> CreateReview {
        CreateReview {
            product_id,
            comment: None,
            grade,
        }
    }

    #[tokio::test]
    async fn test_rating_follows_adds_and_removals() {
        let repo = InMemoryReviewRepository::new();
        repo.seed_product(1).await;

        let first = repo.add_review(10, review(1, 5)).await.unwrap();
        assert_eq!(repo.product_rating(1).await, Some(5.0));

        repo.add_review(11, review(1, 3)).await.unwrap();
        assert_eq!(repo.product_rating(1).await, Some(4.0));

        repo.remove_review(first.id).await.unwrap();
        assert_eq!(repo.product_rating(1).await, Some(3.0));
    }

    #[tokio::test]
    async fn test_rating_resets_when_last_review_removed() {
        let repo = InMemoryReviewRepository::new();
        repo.seed_product(1).await;

        let only = repo.add_review(10, review(1, 4)).await.unwrap();
        assert_eq!(repo.product_rating(1).await, Some(4.0));

        repo.remove_review(only.id).await.unwrap();
        assert_eq!(repo.product_rating(1).await, Some(0.0));
    }

    #[tokio::test]
    async fn test_second_active_review_from_same_user_conflicts() {
        let repo = InMemoryReviewRepository::new();
        repo.seed_product(1).await;

        repo.add_review(10, review(1, 5)).await.unwrap();
        let result = repo.add_review(10, review(1, 2)).await;
        assert!(matches!(result, Err(ReviewError::Duplicate)));

        // A different user is fine
        repo.add_review(11, review(1, 2)).await.unwrap();
    }

    #[tokio::test]
    async fn test_removed_review_frees_the_user_to_review_again() {
        let repo = InMemoryReviewRepository::new();
        repo.seed_product(1).await;

        let first = repo.add_review(10, review(1, 2)).await.unwrap();
        repo.remove_review(first.id).await.unwrap();

        // Only *active* reviews count against the uniqueness rule
        let second = repo.add_review(10, review(1, 5)).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(repo.product_rating(1).await, Some(5.0));
    }

    #[tokio::test]
    async fn test_inactive_product_cannot_be_reviewed() {
        let repo = InMemoryReviewRepository::new();
        repo.seed_product(1).await;
        repo.deactivate_product(1).await;

        let result = repo.add_review(10, review(1, 5)).await;
        assert!(matches!(result, Err(ReviewError::ProductNotFound(1))));
    }

    #[tokio::test]
    async fn test_remove_is_strict_about_missing_or_inactive() {
        let repo = InMemoryReviewRepository::new();
        repo.seed_product(1).await;

        assert!(matches!(
            repo.remove_review(99).await,
            Err(ReviewError::ReviewNotFound(99))
        ));

        let r = repo.add_review(10, review(1, 5)).await.unwrap();
        repo.remove_review(r.id).await.unwrap();
        assert!(matches!(
            repo.remove_review(r.id).await,
            Err(ReviewError::ReviewNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_listings_exclude_soft_deleted_reviews() {
        let repo = InMemoryReviewRepository::new();
        repo.seed_product(1).await;

        let keep = repo.add_review(10, review(1, 5)).await.unwrap();
        let gone = repo.add_review(11, review(1, 3)).await.unwrap();
        repo.remove_review(gone.id).await.unwrap();

        let all = repo.list_reviews().await.unwrap();
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![keep.id]);

        let for_product = repo.list_product_reviews(1).await.unwrap();
        assert_eq!(for_product.len(), 1);
    }
}
