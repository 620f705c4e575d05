//! # tally-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `tally-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Wrap every repository call in its own scoped transaction
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `tally-app` (for port traits) and `tally-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod command_repo;
mod error;
mod pool;
mod table;
mod transaction;
mod usage_repo;
mod user_repo;

pub use command_repo::{Commands, SqliteCommandRepository};
pub use error::StorageError;
pub use pool::{Config, Database};
pub use table::{SqliteRepository, Table};
pub use transaction::{TxFuture, with_transaction};
pub use usage_repo::SqliteUsageRepository;
pub use user_repo::{SqliteUserRepository, Users};
