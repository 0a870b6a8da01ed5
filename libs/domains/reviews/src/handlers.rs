use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use axum_helpers::{AppError, Identity, Role, ValidatedJson};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::models::{CreateReview, Review};
use crate::repository::ReviewRepository;
use crate::service::ReviewService;

/// OpenAPI documentation for the review endpoints
#[derive(OpenApi)]
#[openapi(
    paths(list_reviews, create_review, delete_review, list_product_reviews),
    components(schemas(Review, CreateReview)),
    tags((name = "reviews", description = "Product reviews and rating aggregation"))
)]
pub struct ApiDoc;

/// Router for review endpoints. Paths are absolute because product reviews
/// hang off `/products/{id}`; merge this router at the application root.
pub fn router<R: ReviewRepository + 'static>(service: Arc<ReviewService<R>>) -> Router {
    Router::new()
        .route("/reviews", get(list_reviews).post(create_review))
        .route("/reviews/{id}", delete(delete_review))
        .route("/products/{product_id}/reviews", get(list_product_reviews))
        .with_state(service)
}

/// List all active reviews
#[utoipa::path(
    get,
    path = "/reviews",
    tag = "reviews",
    responses(
        (status = 200, description = "Active reviews", body = Vec<Review>)
    )
)]
async fn list_reviews<R: ReviewRepository>(
    State(service): State<Arc<ReviewService<R>>>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(service.list_reviews().await?))
}

/// Leave a review; one active review per buyer per product
#[utoipa::path(
    post,
    path = "/reviews",
    tag = "reviews",
    request_body = CreateReview,
    responses(
        (status = 201, description = "Review created", body = Review),
        (status = 400, description = "Grade out of bounds"),
        (status = 404, description = "Product missing or inactive"),
        (status = 409, description = "This buyer already reviewed the product")
    )
)]
async fn create_review<R: ReviewRepository>(
    State(service): State<Arc<ReviewService<R>>>,
    identity: Identity,
    ValidatedJson(input): ValidatedJson<CreateReview>,
) -> Result<impl IntoResponse, AppError> {
    identity.require_role(Role::Buyer)?;
    let review = service.add_review(identity.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Soft-delete a review (admin only); the product rating is recomputed in
/// the same transaction
#[utoipa::path(
    delete,
    path = "/reviews/{id}",
    tag = "reviews",
    params(("id" = i32, Path, description = "Review id")),
    responses(
        (status = 204, description = "Review removed"),
        (status = 403, description = "Requires admin role"),
        (status = 404, description = "Review missing or already removed")
    )
)]
async fn delete_review<R: ReviewRepository>(
    State(service): State<Arc<ReviewService<R>>>,
    identity: Identity,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    identity.require_role(Role::Admin)?;
    service.remove_review(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List active reviews for a product
#[utoipa::path(
    get,
    path = "/products/{product_id}/reviews",
    tag = "reviews",
    params(("product_id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Reviews for the product", body = Vec<Review>),
        (status = 404, description = "Product missing or inactive")
    )
)]
async fn list_product_reviews<R: ReviewRepository>(
    State(service): State<Arc<ReviewService<R>>>,
    Path(product_id): Path<i32>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(service.list_product_reviews(product_id).await?))
}
