//! Durable preference storage.
//!
//! SQLite connection management, schema migrations and the `kv_store`
//! backend used by the persistence adapter.
//!
//! # Usage
//!
//! ```no_run
//! use accessbar::database::{Database, SqliteStorage};
//! use accessbar::services::persistence::KeyValueStorage;
//!
//! let db = Database::open("accessbar.db").expect("failed to open database");
//! let mut storage = SqliteStorage::new(db);
//! storage.set_item("accessibility-fontSize", "18").expect("write failed");
//! ```

pub mod connection;
pub mod kv_store;
pub mod migrations;

pub use connection::Database;
pub use kv_store::SqliteStorage;
