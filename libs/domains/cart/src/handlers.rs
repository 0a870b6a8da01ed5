use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use axum_helpers::{AppError, Identity, Role, ValidatedJson};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::models::{AddToCart, CartItem, CartLine, CartView, SetQuantity};
use crate::repository::CartRepository;
use crate::service::CartService;

/// OpenAPI documentation for the cart endpoints
#[derive(OpenApi)]
#[openapi(
    paths(view_cart, add_to_cart, set_quantity, remove_from_cart),
    components(schemas(CartView, CartLine, CartItem, AddToCart, SetQuantity)),
    tags((name = "cart", description = "The buyer's pending selections"))
)]
pub struct ApiDoc;

/// Router for the cart endpoints; paths are absolute, merge at the
/// application root.
pub fn router<R: CartRepository + 'static>(service: Arc<CartService<R>>) -> Router {
    Router::new()
        .route("/cart", get(view_cart))
        .route("/cart/items", post(add_to_cart))
        .route(
            "/cart/items/{product_id}",
            put(set_quantity).delete(remove_from_cart),
        )
        .with_state(service)
}

/// The calling buyer's cart with live product data and totals
#[utoipa::path(
    get,
    path = "/cart",
    tag = "cart",
    responses(
        (status = 200, description = "Cart contents", body = CartView)
    )
)]
async fn view_cart<R: CartRepository>(
    State(service): State<Arc<CartService<R>>>,
    identity: Identity,
) -> Result<Json<CartView>, AppError> {
    identity.require_role(Role::Buyer)?;
    Ok(Json(service.view(identity.user_id).await?))
}

/// Add units of a product; an existing row's quantity grows
#[utoipa::path(
    post,
    path = "/cart/items",
    tag = "cart",
    request_body = AddToCart,
    responses(
        (status = 200, description = "Cart row after the upsert", body = CartItem),
        (status = 400, description = "Quantity below 1"),
        (status = 404, description = "Product missing or inactive")
    )
)]
async fn add_to_cart<R: CartRepository>(
    State(service): State<Arc<CartService<R>>>,
    identity: Identity,
    ValidatedJson(input): ValidatedJson<AddToCart>,
) -> Result<Json<CartItem>, AppError> {
    identity.require_role(Role::Buyer)?;
    Ok(Json(service.add_or_update(identity.user_id, input).await?))
}

/// Replace a cart row's quantity
#[utoipa::path(
    put,
    path = "/cart/items/{product_id}",
    tag = "cart",
    params(("product_id" = i32, Path, description = "Product id")),
    request_body = SetQuantity,
    responses(
        (status = 200, description = "Cart row after the replace", body = CartItem),
        (status = 400, description = "Quantity below 1"),
        (status = 404, description = "No cart row for this product")
    )
)]
async fn set_quantity<R: CartRepository>(
    State(service): State<Arc<CartService<R>>>,
    identity: Identity,
    Path(product_id): Path<i32>,
    ValidatedJson(input): ValidatedJson<SetQuantity>,
) -> Result<Json<CartItem>, AppError> {
    identity.require_role(Role::Buyer)?;
    Ok(Json(
        service
            .set_quantity(identity.user_id, product_id, input)
            .await?,
    ))
}

/// Remove a product from the cart
#[utoipa::path(
    delete,
    path = "/cart/items/{product_id}",
    tag = "cart",
    params(("product_id" = i32, Path, description = "Product id")),
    responses(
        (status = 204, description = "Cart row removed"),
        (status = 404, description = "No cart row for this product")
    )
)]
async fn remove_from_cart<R: CartRepository>(
    State(service): State<Arc<CartService<R>>>,
    identity: Identity,
    Path(product_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    identity.require_role(Role::Buyer)?;
    service.remove(identity.user_id, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
