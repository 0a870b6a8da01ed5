use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use axum_helpers::{AppError, Identity, Role, ValidatedJson};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::models::{Category, CreateCategory, CreateProduct, Product, SearchQuery};
use crate::repository::CatalogRepository;
use crate::service::CatalogService;

/// OpenAPI documentation for the catalog endpoints
#[derive(OpenApi)]
#[openapi(
    paths(
        list_categories,
        create_category,
        get_category,
        update_category,
        delete_category,
        list_products,
        create_product,
        search_products,
        list_products_by_category,
        get_product,
        update_product,
        delete_product,
    ),
    components(schemas(Category, CreateCategory, Product, CreateProduct)),
    tags(
        (name = "categories", description = "Category tree management"),
        (name = "products", description = "Product management and search")
    )
)]
pub struct ApiDoc;

/// Router for the category endpoints. Paths are absolute (the reviews
/// domain also registers under `/products`); merge at the application root.
pub fn categories_router<R: CatalogRepository + 'static>(
    service: Arc<CatalogService<R>>,
) -> Router {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
        .with_state(service)
}

/// Router for the product endpoints; merge at the application root.
pub fn products_router<R: CatalogRepository + 'static>(service: Arc<CatalogService<R>>) -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/search", get(search_products))
        .route(
            "/products/category/{category_id}",
            get(list_products_by_category),
        )
        .route(
            "/products/{product_id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .with_state(service)
}

/// List active categories
#[utoipa::path(
    get,
    path = "/categories",
    tag = "categories",
    responses(
        (status = 200, description = "Active categories", body = Vec<Category>)
    )
)]
async fn list_categories<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(service.list_categories().await?))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/categories",
    tag = "categories",
    request_body = CreateCategory,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Validation failed or invalid parent"),
        (status = 403, description = "Requires seller or admin role")
    )
)]
async fn create_category<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    identity: Identity,
    ValidatedJson(input): ValidatedJson<CreateCategory>,
) -> Result<impl IntoResponse, AppError> {
    identity.require_role(Role::Seller)?;
    let category = service.create_category(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Get an active category by id
#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = "categories",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category found", body = Category),
        (status = 404, description = "Category missing or inactive")
    )
)]
async fn get_category<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    Path(id): Path<i32>,
) -> Result<Json<Category>, AppError> {
    Ok(Json(service.get_category(id).await?))
}

/// Replace a category's name/parent
#[utoipa::path(
    put,
    path = "/categories/{id}",
    tag = "categories",
    params(("id" = i32, Path, description = "Category id")),
    request_body = CreateCategory,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 400, description = "Invalid parent or cycle"),
        (status = 404, description = "Category missing or inactive")
    )
)]
async fn update_category<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    identity: Identity,
    Path(id): Path<i32>,
    ValidatedJson(input): ValidatedJson<CreateCategory>,
) -> Result<Json<Category>, AppError> {
    identity.require_role(Role::Seller)?;
    Ok(Json(service.update_category(id, input).await?))
}

/// Soft-delete a category
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "categories",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deactivated"),
        (status = 404, description = "Category missing or inactive"),
        (status = 409, description = "Category still has active products")
    )
)]
async fn delete_category<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    identity: Identity,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    identity.require_role(Role::Seller)?;
    service.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List active products
#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    responses(
        (status = 200, description = "Active products", body = Vec<Product>)
    )
)]
async fn list_products<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(service.list_products().await?))
}

/// Create a product owned by the calling seller
#[utoipa::path(
    post,
    path = "/products",
    tag = "products",
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Validation failed or invalid category"),
        (status = 403, description = "Requires seller or admin role")
    )
)]
async fn create_product<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    identity: Identity,
    ValidatedJson(input): ValidatedJson<CreateProduct>,
) -> Result<impl IntoResponse, AppError> {
    identity.require_role(Role::Seller)?;
    let product = service.create_product(identity.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Ranked full-text search over active products
#[utoipa::path(
    get,
    path = "/products/search",
    tag = "products",
    params(SearchQuery),
    responses(
        (status = 200, description = "Products in relevance order", body = Vec<Product>)
    )
)]
async fn search_products<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(service.search_products(&query.q, query.limit).await?))
}

/// List active products in a category
#[utoipa::path(
    get,
    path = "/products/category/{category_id}",
    tag = "products",
    params(("category_id" = i32, Path, description = "Category id")),
    responses(
        (status = 200, description = "Products in the category", body = Vec<Product>),
        (status = 404, description = "Category missing or inactive")
    )
)]
async fn list_products_by_category<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    Path(category_id): Path<i32>,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(service.list_products_by_category(category_id).await?))
}

/// Get an active product by id
#[utoipa::path(
    get,
    path = "/products/{product_id}",
    tag = "products",
    params(("product_id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 404, description = "Product missing or inactive")
    )
)]
async fn get_product<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    Path(id): Path<i32>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(service.get_product(id).await?))
}

/// Replace a product's caller-writable fields
#[utoipa::path(
    put,
    path = "/products/{product_id}",
    tag = "products",
    params(("product_id" = i32, Path, description = "Product id")),
    request_body = CreateProduct,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Validation failed or invalid category"),
        (status = 404, description = "Product missing or inactive")
    )
)]
async fn update_product<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    identity: Identity,
    Path(id): Path<i32>,
    ValidatedJson(input): ValidatedJson<CreateProduct>,
) -> Result<Json<Product>, AppError> {
    identity.require_role(Role::Seller)?;
    Ok(Json(service.update_product(id, input).await?))
}

/// Soft-delete a product
#[utoipa::path(
    delete,
    path = "/products/{product_id}",
    tag = "products",
    params(("product_id" = i32, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deactivated"),
        (status = 404, description = "Product missing or inactive")
    )
)]
async fn delete_product<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    identity: Identity,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    identity.require_role(Role::Seller)?;
    service.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
