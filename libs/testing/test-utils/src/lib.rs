//! Shared test infrastructure for the domain crates.
//!
//! [`TestDatabase`] starts a disposable PostgreSQL container, connects, and
//! applies the workspace migrations, so integration tests run against the
//! exact schema production uses. The container is removed when the value
//! drops.

mod postgres;

pub use postgres::TestDatabase;
