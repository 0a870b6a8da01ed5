//! Orders Domain
//!
//! The top-level transaction of the system: `place_order` converts a cart
//! into an immutable order, validating and decrementing stock for every line
//! as one atomic unit and snapshotting unit prices so later catalog changes
//! never touch placed orders. Cancellation restores exactly the decremented
//! quantities. Order status moves through a small state machine
//! (pending -> paid -> shipped, with cancellation from the first two).

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{OrderError, OrderResult};
pub use handlers::ApiDoc;
pub use models::{Order, OrderItem, OrderStatus};
pub use postgres::PgOrderRepository;
pub use repository::{InMemoryOrderRepository, OrderRepository};
pub use service::OrderService;
