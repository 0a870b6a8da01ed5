//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Top-level API metadata; the domain docs are merged in at runtime
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shop API",
        version = "0.1.0",
        description = "Catalog, reviews, cart, and order placement"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    )
)]
struct ApiDoc;

/// The combined OpenAPI document for every domain router
pub fn build() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.merge(domain_catalog::ApiDoc::openapi());
    doc.merge(domain_reviews::ApiDoc::openapi());
    doc.merge(domain_cart::ApiDoc::openapi());
    doc.merge(domain_orders::ApiDoc::openapi());
    doc
}
