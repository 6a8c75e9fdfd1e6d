//! Table and index definitions.
//!
//! One table per entity in the data model, created with `IF NOT EXISTS`
//! so opening an existing database file is idempotent.

/// Full schema, applied in order inside a single transaction on open.
pub const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS secrets (
        path TEXT PRIMARY KEY,
        ciphertext TEXT NOT NULL,
        type TEXT NOT NULL,
        version INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        tags TEXT NOT NULL,
        metadata TEXT NOT NULL
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_secrets_path ON secrets(path)",
    "CREATE TABLE IF NOT EXISTS secret_versions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        path TEXT NOT NULL,
        ciphertext TEXT NOT NULL,
        version INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        created_by TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_secret_versions_path ON secret_versions(path)",
    "CREATE TABLE IF NOT EXISTS branches (
        name TEXT PRIMARY KEY,
        head_commit_id INTEGER,
        created_at TEXT NOT NULL
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_branches_name ON branches(name)",
    "CREATE TABLE IF NOT EXISTS commits (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        parent_id INTEGER,
        message TEXT NOT NULL,
        author TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        branch TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS commit_secrets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        commit_id INTEGER NOT NULL,
        path TEXT NOT NULL,
        ciphertext TEXT NOT NULL,
        type TEXT NOT NULL,
        tags TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_commit_secrets_commit_id ON commit_secrets(commit_id)",
    "CREATE TABLE IF NOT EXISTS audit_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        user TEXT NOT NULL,
        action TEXT NOT NULL,
        path TEXT NOT NULL,
        success INTEGER NOT NULL,
        error TEXT,
        metadata TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_audit_log_lookup ON audit_log(timestamp, action, path)",
];
