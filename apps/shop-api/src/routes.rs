//! Router assembly: one service per domain over a shared pool handle

use axum::Router;
use axum_helpers::health_router;
use domain_cart::{CartService, PgCartRepository};
use domain_catalog::{CatalogService, PgCatalogRepository};
use domain_orders::{OrderService, PgOrderRepository};
use domain_reviews::{PgReviewRepository, ReviewService};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa_swagger_ui::SwaggerUi;

pub fn router(db: DatabaseConnection) -> Router {
    let catalog = Arc::new(CatalogService::new(PgCatalogRepository::new(db.clone())));
    let reviews = Arc::new(ReviewService::new(PgReviewRepository::new(db.clone())));
    let cart = Arc::new(CartService::new(PgCartRepository::new(db.clone())));
    let orders = Arc::new(OrderService::new(PgOrderRepository::new(db)));

    Router::new()
        .merge(domain_catalog::handlers::categories_router(catalog.clone()))
        .merge(domain_catalog::handlers::products_router(catalog))
        .merge(domain_reviews::handlers::router(reviews))
        .merge(domain_cart::handlers::router(cart))
        .merge(domain_orders::handlers::router(orders))
        .merge(health_router())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", crate::openapi::build()))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::permissive())
}
