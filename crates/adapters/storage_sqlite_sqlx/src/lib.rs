//! # mowerhub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement `ParkReasonStore` and `NotificationHistory` from `mowerhub-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `mowerhub-app` (for port traits) and `mowerhub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod error;
mod notification_history;
mod park_reason_store;
mod pool;

pub use error::StorageError;
pub use notification_history::SqliteNotificationHistory;
pub use park_reason_store::SqliteParkReasonStore;
pub use pool::{Config, Database};
