//! Catalog Domain
//!
//! Owns the category tree and product records, including the derived search
//! representation. Soft-delete visibility, category validity, and the cycle
//! guard are enforced inside the repository implementations so the checks
//! stay atomic with the writes they protect. The product `rating` field is
//! owned by the reviews domain and `stock` mutation by the orders domain;
//! this crate never writes either outside of product creation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints (/categories, /products)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Validation, business rules
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Trait + in-memory + PostgreSQL implementations
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Entity    │  ← Sea-ORM models (categories, products)
//! └─────────────┘
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod search;
pub mod service;

// Re-export commonly used types
pub use error::{CatalogError, CatalogResult};
pub use handlers::ApiDoc;
pub use models::{Category, CreateCategory, CreateProduct, Product, SearchQuery};
pub use postgres::PgCatalogRepository;
pub use repository::{CatalogRepository, InMemoryCatalogRepository};
pub use search::SearchDocument;
pub use service::CatalogService;
