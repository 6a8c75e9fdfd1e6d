//! Append-only JSON-lines audit log.
//!
//! **Internal implementation detail of Crux Vault.** Embedding
//! applications talk to the `cruxvault` facade crate; this crate only
//! knows how to append one line per action and tail-read the file back.
//!
//! A write failure here never aborts the operation it's recording —
//! logging failures are swallowed and reported only through `tracing`.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use cruxvault_core::AuditEntry;
use tracing::warn;

/// Actions gated by the `log_reads` flag — cheap, frequent, and
/// usually not worth a durable record.
const READ_ACTIONS: &[&str] = &["get", "list", "history", "status", "diff"];

/// An append-only audit sink bound to a single JSONL file.
pub struct AuditLog {
    path: PathBuf,
    enabled: bool,
    log_reads: bool,
}

impl AuditLog {
    /// Binds an audit log to `path`. The file is created lazily, on
    /// the first successful write.
    pub fn new(path: impl Into<PathBuf>, enabled: bool, log_reads: bool) -> Self {
        Self {
            path: path.into(),
            enabled,
            log_reads,
        }
    }

    fn should_skip(&self, action: &str) -> bool {
        if !self.enabled {
            return true;
        }
        !self.log_reads && READ_ACTIONS.contains(&action)
    }

    /// Appends `entry`, unless gated out by the enabled/log_reads
    /// flags. Any I/O or serialization failure is logged via `tracing`
    /// and otherwise ignored — the caller's operation has already
    /// succeeded or failed on its own terms by the time this runs.
    pub fn log(&self, entry: &AuditEntry) {
        if self.should_skip(&entry.action) {
            return;
        }
        if let Err(e) = self.append(entry) {
            warn!(error = %e, path = %self.path.display(), "failed to write audit log entry");
        }
    }

    fn append(&self, entry: &AuditEntry) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let line = serde_json::to_string(entry)?;
        writeln!(file, "{line}")
    }

    /// Reads the `limit` most recent entries, newest first.
    pub fn get_recent_entries(&self, limit: usize) -> std::io::Result<Vec<AuditEntry>> {
        read_tail(&self.path, limit, |_| true)
    }

    /// Reads the `limit` most recent entries for `path`, newest first.
    pub fn get_entries_for_path(&self, path: &str, limit: usize) -> std::io::Result<Vec<AuditEntry>> {
        read_tail(&self.path, limit, |e: &AuditEntry| e.path == path)
    }
}

fn read_tail(
    path: &Path,
    limit: usize,
    filter: impl Fn(&AuditEntry) -> bool,
) -> std::io::Result<Vec<AuditEntry>> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let lines: Vec<String> = BufReader::new(file).lines().collect::<std::io::Result<_>>()?;

    let mut out = Vec::new();
    for line in lines.iter().rev() {
        if line.trim().is_empty() {
            continue;
        }
        let Ok(entry) = serde_json::from_str::<AuditEntry>(line) else {
            continue;
        };
        if filter(&entry) {
            out.push(entry);
            if out.len() >= limit {
                break;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(action: &str, path: &str) -> AuditEntry {
        AuditEntry {
            timestamp: Utc::now(),
            user: "tester".to_string(),
            action: action.to_string(),
            path: path.to_string(),
            success: true,
            error: None,
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn disabled_log_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("audit.jsonl");
        let log = AuditLog::new(&file, false, true);
        log.log(&entry("set", "a"));
        assert!(!file.exists());
    }

    #[test]
    fn read_actions_gated_by_log_reads() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("audit.jsonl");
        let log = AuditLog::new(&file, true, false);
        log.log(&entry("get", "a"));
        log.log(&entry("set", "a"));

        let recent = log.get_recent_entries(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].action, "set");
    }

    #[test]
    fn recent_entries_are_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("audit.jsonl");
        let log = AuditLog::new(&file, true, true);
        log.log(&entry("set", "a"));
        log.log(&entry("set", "b"));
        log.log(&entry("delete", "a"));

        let recent = log.get_recent_entries(10).unwrap();
        let paths: Vec<&str> = recent.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a", "b", "a"]);
        assert_eq!(recent[0].action, "delete");
    }

    #[test]
    fn entries_for_path_filters_correctly() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("audit.jsonl");
        let log = AuditLog::new(&file, true, true);
        log.log(&entry("set", "a"));
        log.log(&entry("set", "b"));

        let for_a = log.get_entries_for_path("a", 10).unwrap();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].path, "a");
    }

    #[test]
    fn missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("does-not-exist.jsonl");
        let log = AuditLog::new(&file, true, true);
        assert!(log.get_recent_entries(5).unwrap().is_empty());
    }
}
