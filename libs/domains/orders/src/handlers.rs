use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_helpers::{AppError, Identity, Role};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::models::{Order, OrderItem, OrderStatus};
use crate::repository::OrderRepository;
use crate::service::OrderService;

/// OpenAPI documentation for the order endpoints
#[derive(OpenApi)]
#[openapi(
    paths(place_order, list_orders, get_order, pay_order, ship_order, cancel_order),
    components(schemas(Order, OrderItem, OrderStatus)),
    tags((name = "orders", description = "Order placement and lifecycle"))
)]
pub struct ApiDoc;

/// Router for the order endpoints; paths are absolute, merge at the
/// application root.
pub fn router<R: OrderRepository + 'static>(service: Arc<OrderService<R>>) -> Router {
    Router::new()
        .route("/orders", get(list_orders).post(place_order))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/pay", post(pay_order))
        .route("/orders/{id}/ship", post(ship_order))
        .route("/orders/{id}/cancel", post(cancel_order))
        .with_state(service)
}

/// Convert the calling buyer's cart into a pending order
#[utoipa::path(
    post,
    path = "/orders",
    tag = "orders",
    responses(
        (status = 201, description = "Order placed", body = Order),
        (status = 400, description = "Cart is empty"),
        (status = 404, description = "A cart product is missing or inactive"),
        (status = 409, description = "Insufficient stock for a cart line")
    )
)]
async fn place_order<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    identity.require_role(Role::Buyer)?;
    let order = service.place_order(identity.user_id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// The calling user's orders
#[utoipa::path(
    get,
    path = "/orders",
    tag = "orders",
    responses(
        (status = 200, description = "Orders, oldest first", body = Vec<Order>)
    )
)]
async fn list_orders<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    identity: Identity,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(service.list_orders(identity.user_id).await?))
}

/// Fetch one order (owner or admin)
#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "orders",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order found", body = Order),
        (status = 403, description = "Not the order owner"),
        (status = 404, description = "Order not found")
    )
)]
async fn get_order<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    identity: Identity,
    Path(id): Path<i32>,
) -> Result<Json<Order>, AppError> {
    let order = service
        .get_order_for_user(id, identity.user_id, identity.is_admin())
        .await?;
    Ok(Json(order))
}

/// Mark a pending order paid (admin)
#[utoipa::path(
    post,
    path = "/orders/{id}/pay",
    tag = "orders",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order paid", body = Order),
        (status = 403, description = "Requires admin role"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Illegal transition")
    )
)]
async fn pay_order<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    identity: Identity,
    Path(id): Path<i32>,
) -> Result<Json<Order>, AppError> {
    identity.require_role(Role::Admin)?;
    Ok(Json(service.pay_order(id).await?))
}

/// Mark a paid order shipped (admin)
#[utoipa::path(
    post,
    path = "/orders/{id}/ship",
    tag = "orders",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order shipped", body = Order),
        (status = 403, description = "Requires admin role"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Illegal transition")
    )
)]
async fn ship_order<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    identity: Identity,
    Path(id): Path<i32>,
) -> Result<Json<Order>, AppError> {
    identity.require_role(Role::Admin)?;
    Ok(Json(service.ship_order(id).await?))
}

/// Cancel a pending or paid order (owner or admin); stock is restored
#[utoipa::path(
    post,
    path = "/orders/{id}/cancel",
    tag = "orders",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled", body = Order),
        (status = 403, description = "Not the order owner"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Illegal transition")
    )
)]
async fn cancel_order<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    identity: Identity,
    Path(id): Path<i32>,
) -> Result<Json<Order>, AppError> {
    let order = service
        .cancel_order(id, identity.user_id, identity.is_admin())
        .await?;
    Ok(Json(order))
}
