//! Connection handle and transaction helper.

use std::path::Path;
use std::sync::Mutex;

use cruxvault_core::Error;
use rusqlite::Connection;
use tracing::{debug, instrument, warn};

use crate::schema;

/// A single SQLite connection guarded by a mutex.
///
/// `cruxvault-storage` does not itself decide *when* a transaction is
/// needed — callers (the Working Store and the Version-Control Engine
/// in `cruxvault-engine`) open one transaction per public operation and
/// pass it down to the row-level functions in this crate's `secrets`,
/// `versions`, `branches`, `commits`, and `audit` modules.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Opens (or creates) the database file at `path` and applies the
    /// schema. Safe to call repeatedly against the same file.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let conn = Connection::open(path).map_err(|e| Error::Storage(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database, for tests and short-lived
    /// embeddings that don't need a file on disk.
    pub fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Storage(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, Error> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| Error::Storage(e.to_string()))?;
        for stmt in schema::STATEMENTS {
            conn.execute(stmt, []).map_err(|e| Error::Storage(e.to_string()))?;
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs `f` inside a single serializable transaction, committing on
    /// `Ok` and rolling back on `Err` or panic-unwind.
    #[instrument(skip(self, f))]
    pub fn with_transaction<T>(
        &self,
        f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut guard = self.conn.lock().map_err(|_| Error::Storage("connection lock poisoned".to_string()))?;
        let tx = guard
            .transaction()
            .map_err(|e| Error::Storage(e.to_string()))?;
        debug!("Began transaction");
        let result = match f(&tx) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Rolling back transaction");
                return Err(e);
            }
        };
        tx.commit().map_err(|e| Error::Storage(e.to_string()))?;
        debug!("Committed transaction");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets;
    use cruxvault_core::types::SecretType;

    #[test]
    fn open_on_disk_creates_schema_and_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.db");

        let store = Store::open(&path).unwrap();
        store
            .with_transaction(|tx| {
                secrets::insert(
                    tx,
                    "db/password",
                    "ciphertext-blob",
                    SecretType::Secret,
                    "2024-01-01T00:00:00Z",
                    &[],
                    &serde_json::Map::new(),
                )
            })
            .unwrap();
        drop(store);

        let reopened = Store::open(&path).unwrap();
        let row = reopened
            .with_transaction(|tx| secrets::get(tx, "db/password"))
            .unwrap();
        assert_eq!(row.unwrap().ciphertext, "ciphertext-blob");
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("vault.db")).unwrap();

        let err = store.with_transaction(|tx| {
            secrets::insert(
                tx,
                "will-not-stick",
                "ct",
                SecretType::Secret,
                "2024-01-01T00:00:00Z",
                &[],
                &serde_json::Map::new(),
            )?;
            Err(Error::Conflict("forced rollback".to_string()))
        });
        assert!(err.is_err());

        let row = store
            .with_transaction(|tx| secrets::get(tx, "will-not-stick"))
            .unwrap();
        assert!(row.is_none());
    }
}
