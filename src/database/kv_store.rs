// SQLite-backed KeyValueStorage: one row per persisted preference in `kv_store`.

use rusqlite::{params, OptionalExtension};

use super::connection::Database;
use super::migrations::unix_now;
use crate::services::persistence::KeyValueStorage;
use crate::types::errors::StorageError;

pub struct SqliteStorage {
    db: Database,
}

impl SqliteStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens the database at `path`, creating it and its schema if needed.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self, StorageError> {
        let db = Database::open(path).map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(Self::new(db))
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let db = Database::open_in_memory().map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(Self::new(db))
    }
}

impl KeyValueStorage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .db
            .connection()
            .query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.db.connection().execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, unix_now()],
        )?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.db
            .connection()
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}
