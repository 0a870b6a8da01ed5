//! PostgreSQL access layer for the workspace.
//!
//! - [`postgres`]: SeaORM connector with pooling, startup retry, and
//!   migration running
//! - [`txn`]: serializable-transaction runner with bounded retry on
//!   serialization conflicts; every consistency-critical write in the
//!   domain crates goes through it
//! - [`common`]: shared [`DatabaseError`] and backoff helpers
//!
//! # Example
//!
//! ```ignore
//! use database::postgres;
//! use migration::Migrator;
//!
//! let db = postgres::connect_with_retry(&config.url, None).await?;
//! postgres::run_migrations::<Migrator>(&db).await?;
//! ```

pub mod common;
pub mod postgres;
pub mod txn;

pub use common::{retry_with_backoff, DatabaseError, DatabaseResult, RetryConfig};
pub use txn::{is_serialization_failure, serializable, TxnError};
