//! The public `CruxVault` handle.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use cruxvault_audit::AuditLog;
use cruxvault_core::types::SecretType;
use cruxvault_core::{
    AuditEntry, Branch, Commit, DiffEntry, MergeConflict, Result, Secret, SecretVersion, Status,
};
use cruxvault_crypto::Cipher;
use cruxvault_engine::Engine;
use cruxvault_storage::Store;

use crate::security;

/// Construction-time configuration for a vault.
///
/// None of these fields are read from a file by this crate — the
/// embedding application (or its CLI) owns configuration discovery and
/// persistence and simply hands the resolved values in here.
#[derive(Debug, Clone)]
pub struct VaultOptions {
    /// Path to the SQLite database file.
    pub storage_path: PathBuf,
    /// Path to the append-only JSONL audit log.
    pub audit_path: PathBuf,
    /// Whether any audit entries are written at all.
    pub audit_enabled: bool,
    /// Whether read actions (`get`, `list`, `history`, `status`, `diff`)
    /// are also audited, not just mutations.
    pub audit_log_reads: bool,
    /// Attributed as the `user` field on every audit entry.
    pub user: String,
}

impl VaultOptions {
    /// Starts from sensible defaults: audit enabled, reads not logged,
    /// `user` taken from the `USER` environment variable (or `"unknown"`).
    pub fn new(storage_path: impl Into<PathBuf>, audit_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
            audit_path: audit_path.into(),
            audit_enabled: true,
            audit_log_reads: false,
            user: std::env::var("USER").unwrap_or_else(|_| "unknown".to_string()),
        }
    }

    /// Disables the audit log entirely.
    pub fn without_audit(mut self) -> Self {
        self.audit_enabled = false;
        self
    }

    /// Also audits read actions (`get`, `list`, `history`, `status`, `diff`).
    pub fn with_log_reads(mut self) -> Self {
        self.audit_log_reads = true;
        self
    }

    /// Overrides the attributed user.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }
}

struct Inner {
    engine: Engine,
    audit: AuditLog,
    user: String,
}

/// A handle to an open vault: one database file, one audit log, one
/// master key, behind a cheap `Clone` (an `Arc` around shared state,
/// the way the embedding application is expected to pass it around).
#[derive(Clone)]
pub struct CruxVault(Arc<Inner>);

impl CruxVault {
    /// Opens (or creates) the vault described by `options`, using `key`
    /// (exactly 32 bytes) to encrypt and decrypt values.
    pub fn open(options: VaultOptions, key: &[u8]) -> Result<Self> {
        let cipher = Cipher::new(key)?;
        let store = Store::open(&options.storage_path)?;
        let engine = Engine::new(store, cipher);
        let audit = AuditLog::new(
            options.audit_path.clone(),
            options.audit_enabled,
            options.audit_log_reads,
        );
        Ok(Self(Arc::new(Inner {
            engine,
            audit,
            user: options.user,
        })))
    }

    /// Opens a vault over an in-memory database — for tests and other
    /// short-lived embeddings that don't want a file on disk.
    pub fn open_in_memory(audit_path: impl Into<PathBuf>, key: &[u8]) -> Result<Self> {
        let cipher = Cipher::new(key)?;
        let store = Store::open_in_memory()?;
        let engine = Engine::new(store, cipher);
        let audit = AuditLog::new(audit_path, true, false);
        Ok(Self(Arc::new(Inner {
            engine,
            audit,
            user: std::env::var("USER").unwrap_or_else(|_| "unknown".to_string()),
        })))
    }

    fn record<T>(&self, action: &str, path: &str, result: &Result<T>) {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            user: self.0.user.clone(),
            action: action.to_string(),
            path: path.to_string(),
            success: result.is_ok(),
            error: result.as_ref().err().map(|e| e.to_string()),
            metadata: serde_json::Map::new(),
        };
        self.0.audit.log(&entry);
        self.0.engine.log_audit_best_effort(&entry);
    }

    // ---- Working Store -----------------------------------------------

    /// See the Working Store's `set_secret`.
    pub fn set_secret(
        &self,
        path: &str,
        value: &str,
        secret_type: SecretType,
        tags: Vec<String>,
    ) -> Result<Secret> {
        security::validate_path(path)?;
        security::validate_value(value)?;
        security::validate_tags(&tags)?;
        let result = self.0.engine.set_secret(path, value, secret_type, tags);
        self.record("set", path, &result);
        result
    }

    /// See the Working Store's `get_secret`.
    pub fn get_secret(&self, path: &str) -> Result<Option<Secret>> {
        security::validate_path(path)?;
        let result = self.0.engine.get_secret(path);
        self.record("get", path, &result);
        result
    }

    /// See the Working Store's `get_secret_expanded` (non-core).
    pub fn get_secret_expanded(&self, path: &str) -> Result<Option<Secret>> {
        security::validate_path(path)?;
        let result = self.0.engine.get_secret_expanded(path);
        self.record("get", path, &result);
        result
    }

    /// See the Working Store's `list_secrets`.
    pub fn list_secrets(&self, prefix: Option<&str>) -> Result<Vec<Secret>> {
        let result = self.0.engine.list_secrets(prefix);
        self.record("list", prefix.unwrap_or(""), &result);
        result
    }

    /// See the Working Store's `delete_secret`.
    pub fn delete_secret(&self, path: &str) -> Result<bool> {
        security::validate_path(path)?;
        let result = self.0.engine.delete_secret(path);
        self.record("delete", path, &result);
        result
    }

    /// See the Working Store's `get_history`.
    pub fn get_history(&self, path: &str) -> Result<Vec<SecretVersion>> {
        security::validate_path(path)?;
        let result = self.0.engine.get_history(path);
        self.record("history", path, &result);
        result
    }

    /// See the Working Store's `rollback`.
    pub fn rollback(&self, path: &str, target_version: i64) -> Result<Secret> {
        security::validate_path(path)?;
        let result = self.0.engine.rollback(path, target_version);
        self.record("rollback", path, &result);
        result
    }

    // ---- Version-Control Engine ---------------------------------------

    /// See the VCE's `create_branch`.
    pub fn create_branch(&self, name: &str, from: Option<&str>) -> Result<Branch> {
        security::validate_branch_name(name)?;
        let result = self.0.engine.create_branch(name, from);
        self.record("branch", name, &result);
        result
    }

    /// See the VCE's `delete_branch`.
    pub fn delete_branch(&self, name: &str) -> Result<bool> {
        security::validate_branch_name(name)?;
        let result = self.0.engine.delete_branch(name);
        self.record("branch-delete", name, &result);
        result
    }

    /// See the VCE's `list_branches`.
    pub fn list_branches(&self) -> Result<Vec<Branch>> {
        let result = self.0.engine.list_branches();
        self.record("branch-list", "", &result);
        result
    }

    /// See the VCE's `commit`.
    pub fn commit(&self, branch: &str, message: &str, author: &str) -> Result<Commit> {
        security::validate_branch_name(branch)?;
        let result = self.0.engine.commit(branch, message, author);
        self.record("commit", branch, &result);
        result
    }

    /// See the VCE's `get_commit_history`.
    pub fn get_commit_history(&self, branch: &str, limit: usize) -> Result<Vec<Commit>> {
        security::validate_branch_name(branch)?;
        let result = self.0.engine.get_commit_history(branch, limit);
        self.record("log", branch, &result);
        result
    }

    /// See the VCE's `get_status`.
    pub fn get_status(&self, branch: &str) -> Result<Status> {
        security::validate_branch_name(branch)?;
        let result = self.0.engine.get_status(branch);
        self.record("status", branch, &result);
        result
    }

    /// See the VCE's `diff_commits`.
    pub fn diff_commits(&self, commit_a: i64, commit_b: i64) -> Result<Vec<DiffEntry>> {
        let result = self.0.engine.diff_commits(commit_a, commit_b);
        self.record("diff", "", &result);
        result
    }

    /// See the VCE's `checkout_branch`.
    pub fn checkout_branch(&self, branch: &str) -> Result<()> {
        security::validate_branch_name(branch)?;
        let result = self.0.engine.checkout_branch(branch);
        self.record("checkout", branch, &result);
        result
    }

    /// See the VCE's `rollback_to_commit`.
    pub fn rollback_to_commit(&self, branch: &str, commit_id: i64) -> Result<()> {
        security::validate_branch_name(branch)?;
        let result = self.0.engine.rollback_to_commit(branch, commit_id);
        self.record("reset", branch, &result);
        result
    }

    /// See the VCE's `merge_branch`.
    pub fn merge_branch(&self, target: &str, source: &str) -> Result<(bool, Vec<MergeConflict>)> {
        security::validate_branch_name(target)?;
        security::validate_branch_name(source)?;
        let result = self.0.engine.merge_branch(target, source);
        self.record("merge", target, &result);
        result
    }

    // ---- Key helpers (pass-through to the Cipher) ---------------------

    /// Generates a fresh random 32-byte key and encodes it as base64,
    /// for handoff to the key collaborator.
    pub fn generate_key() -> Result<String> {
        let key = {
            use rand::RngCore;
            let mut bytes = [0u8; cruxvault_crypto::KEY_LEN];
            rand::thread_rng().fill_bytes(&mut bytes);
            bytes
        };
        Cipher::key_to_string(&key)
    }

    /// Decodes a base64-encoded key, as produced by [`CruxVault::generate_key`].
    pub fn string_to_key(encoded: &str) -> Result<Vec<u8>> {
        Cipher::string_to_key(encoded)
    }

    /// Reads recent audit entries across all paths, newest first.
    pub fn recent_audit_entries(&self, limit: usize) -> std::io::Result<Vec<AuditEntry>> {
        self.0.audit.get_recent_entries(limit)
    }

    /// Reads recent audit entries for a single path, newest first.
    pub fn audit_entries_for_path(&self, path: &str, limit: usize) -> std::io::Result<Vec<AuditEntry>> {
        self.0.audit.get_entries_for_path(path, limit)
    }

    /// Reads recent audit entries for a single path from the indexed
    /// `audit_log` table, newest first — the queryable companion to
    /// [`CruxVault::audit_entries_for_path`]'s JSONL read.
    pub fn indexed_audit_entries_for_path(&self, path: &str, limit: usize) -> Result<Vec<AuditEntry>> {
        self.0.engine.audit_history_for_path(path, limit)
    }
}

impl std::fmt::Debug for CruxVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CruxVault").finish_non_exhaustive()
    }
}
