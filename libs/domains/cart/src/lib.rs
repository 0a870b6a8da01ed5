//! Cart Domain
//!
//! Owns the buyer's pending selections. Exactly one row exists per
//! (user, product): adds grow the existing row's quantity in place, backed
//! by a storage-level UNIQUE constraint. `view` joins rows with live
//! product data to compute presentation totals over the *current* price,
//! never a snapshot.

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{CartError, CartResult};
pub use handlers::ApiDoc;
pub use models::{AddToCart, CartItem, CartLine, CartView, SetQuantity};
pub use postgres::PgCartRepository;
pub use repository::{CartRepository, InMemoryCartRepository};
pub use service::CartService;
