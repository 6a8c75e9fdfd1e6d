//! Bridges the facade's `AuditEntry` records into the indexed
//! `audit_log` table owned by `cruxvault-storage`.
//!
//! This is the queryable companion to the JSONL file the facade also
//! writes through `cruxvault-audit`; the two are populated together by
//! `cruxvault::CruxVault::record`, one call after the other, right
//! after the audited operation completes.

use cruxvault_core::{AuditEntry, Error};
use cruxvault_storage::audit;
use cruxvault_storage::rows::AuditLogRow;
use tracing::warn;

use crate::engine::Engine;
use crate::time;

impl Engine {
    /// Appends `entry` to the `audit_log` table in its own transaction.
    pub fn log_audit(&self, entry: &AuditEntry) -> Result<(), Error> {
        let row = AuditLogRow {
            timestamp: time::to_storage(entry.timestamp),
            user: entry.user.clone(),
            action: entry.action.clone(),
            path: entry.path.clone(),
            success: entry.success,
            error: entry.error.clone(),
            metadata: if entry.metadata.is_empty() {
                None
            } else {
                Some(serde_json::Value::Object(entry.metadata.clone()))
            },
        };
        self.store.with_transaction(|tx| audit::insert(tx, &row))
    }

    /// Reads back the most recent audit rows for `path` from the
    /// indexed table, newest first.
    pub fn audit_history_for_path(&self, path: &str, limit: usize) -> Result<Vec<AuditEntry>, Error> {
        self.store.with_transaction(|tx| {
            audit::for_path(tx, path, limit)?
                .into_iter()
                .map(|row| {
                    Ok(AuditEntry {
                        timestamp: time::from_storage(&row.timestamp),
                        user: row.user,
                        action: row.action,
                        path: row.path,
                        success: row.success,
                        error: row.error,
                        metadata: match row.metadata {
                            Some(serde_json::Value::Object(map)) => map,
                            _ => serde_json::Map::new(),
                        },
                    })
                })
                .collect()
        })
    }

    /// Logs an audit entry, swallowing failures — a broken audit write
    /// must never fail the operation it describes.
    pub fn log_audit_best_effort(&self, entry: &AuditEntry) {
        if let Err(e) = self.log_audit(entry) {
            warn!(error = %e, action = entry.action, path = entry.path, "Failed to write audit row");
        }
    }
}
