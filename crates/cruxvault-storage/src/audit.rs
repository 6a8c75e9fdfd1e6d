//! Row-level operations on the indexed `audit_log` table.
//!
//! This is the queryable companion to the JSONL file written by
//! `cruxvault-audit`; the two are populated together by the facade's
//! `CruxVault::record` (via `cruxvault_engine::Engine::log_audit`) but
//! serve different purposes — this one supports lookups by path or
//! time range, the JSONL file is the durable, append-only source of
//! record.

use cruxvault_core::Error;
use rusqlite::{params, Transaction};

use crate::rows::AuditLogRow;

/// Appends one audit row.
pub fn insert(tx: &Transaction<'_>, entry: &AuditLogRow) -> Result<(), Error> {
    let metadata = entry
        .metadata
        .as_ref()
        .map(|v| v.to_string());
    tx.execute(
        "INSERT INTO audit_log (timestamp, user, action, path, success, error, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.timestamp,
            entry.user,
            entry.action,
            entry.path,
            entry.success as i64,
            entry.error,
            metadata,
        ],
    )
    .map_err(|e| Error::Storage(e.to_string()))?;
    Ok(())
}

/// Lists audit rows for a given path, most recent first.
pub fn for_path(
    tx: &Transaction<'_>,
    path: &str,
    limit: usize,
) -> Result<Vec<AuditLogRow>, Error> {
    let mut stmt = tx
        .prepare(
            "SELECT timestamp, user, action, path, success, error, metadata
             FROM audit_log WHERE path = ?1 ORDER BY timestamp DESC LIMIT ?2",
        )
        .map_err(|e| Error::Storage(e.to_string()))?;
    stmt.query_map(params![path, limit as i64], row_to_audit)
        .map_err(|e| Error::Storage(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::Storage(e.to_string()))
}

fn row_to_audit(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditLogRow> {
    let metadata_raw: Option<String> = row.get(6)?;
    let success: i64 = row.get(4)?;
    Ok(AuditLogRow {
        timestamp: row.get(0)?,
        user: row.get(1)?,
        action: row.get(2)?,
        path: row.get(3)?,
        success: success != 0,
        error: row.get(5)?,
        metadata: metadata_raw.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    fn row(path: &str, action: &str, timestamp: &str, success: bool) -> AuditLogRow {
        AuditLogRow {
            timestamp: timestamp.to_string(),
            user: "tester".to_string(),
            action: action.to_string(),
            path: path.to_string(),
            success,
            error: if success { None } else { Some("boom".to_string()) },
            metadata: None,
        }
    }

    #[test]
    fn insert_then_for_path_returns_newest_first() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_transaction(|tx| {
                insert(tx, &row("a", "set", "2024-01-01T00:00:00Z", true))?;
                insert(tx, &row("a", "get", "2024-01-01T00:00:01Z", true))?;
                insert(tx, &row("b", "set", "2024-01-01T00:00:02Z", true))?;
                Ok(())
            })
            .unwrap();

        let rows = store.with_transaction(|tx| for_path(tx, "a", 10)).unwrap();
        let actions: Vec<&str> = rows.iter().map(|r| r.action.as_str()).collect();
        assert_eq!(actions, vec!["get", "set"]);
    }

    #[test]
    fn failed_action_preserves_error_message() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_transaction(|tx| insert(tx, &row("x", "delete", "2024-01-01T00:00:00Z", false)))
            .unwrap();

        let rows = store.with_transaction(|tx| for_path(tx, "x", 10)).unwrap();
        assert_eq!(rows[0].error.as_deref(), Some("boom"));
    }

    #[test]
    fn limit_is_respected() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_transaction(|tx| {
                for i in 0..5 {
                    let ts = format!("2024-01-01T00:00:0{i}Z");
                    insert(tx, &row("x", &format!("action-{i}"), &ts, true))?;
                }
                Ok(())
            })
            .unwrap();

        let rows = store.with_transaction(|tx| for_path(tx, "x", 2)).unwrap();
        assert_eq!(rows.len(), 2);
    }
}
