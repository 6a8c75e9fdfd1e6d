//! Shared entity types for Crux Vault.
//!
//! These are plain value records (no ORM, no framework base class) —
//! the Rust equivalent of the prototype's pydantic models. JSON
//! (de)serialization is explicit at each boundary that needs it (the
//! audit log, the CLI's `--json` flag), not baked into the type itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminates what kind of entry a path holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretType {
    /// A credential or other sensitive value.
    Secret,
    /// A non-sensitive configuration value.
    Config,
    /// A boolean-ish feature flag.
    Flag,
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretType::Secret => write!(f, "secret"),
            SecretType::Config => write!(f, "config"),
            SecretType::Flag => write!(f, "flag"),
        }
    }
}

impl std::str::FromStr for SecretType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "secret" => Ok(SecretType::Secret),
            "config" => Ok(SecretType::Config),
            "flag" => Ok(SecretType::Flag),
            other => Err(format!("unknown secret type: {other}")),
        }
    }
}

impl Default for SecretType {
    fn default() -> Self {
        SecretType::Secret
    }
}

/// The current, mutable row for a path.
///
/// `value` holds plaintext — it is only ever populated by decrypting the
/// stored ciphertext on the way out of the Working Store; it is never
/// itself persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    /// Hierarchical, `/`-separated key.
    pub path: String,
    /// Decrypted value.
    pub value: String,
    /// Secret, config, or flag.
    pub r#type: SecretType,
    /// Monotonically non-decreasing version counter, starting at 1.
    pub version: i64,
    /// When this path was first created.
    pub created_at: DateTime<Utc>,
    /// When the current row was last overwritten.
    pub updated_at: DateTime<Utc>,
    /// Ordered, free-form tags.
    pub tags: Vec<String>,
    /// Free-form metadata map.
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// An immutable prior version of a secret's ciphertext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretVersion {
    /// Path this version belongs to.
    pub path: String,
    /// Decrypted value as of this version.
    pub value: String,
    /// The version number this row represents.
    pub version: i64,
    /// When this version was superseded (i.e. when the row that
    /// produced it was overwritten).
    pub created_at: DateTime<Utc>,
    /// Who performed the write that produced this version, if known.
    pub created_by: Option<String>,
}

/// A named line of development.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    /// Unique branch name. `main` is undeletable.
    pub name: String,
    /// Most recent commit on this branch, if any.
    pub head_commit_id: Option<i64>,
    /// When the branch was created.
    pub created_at: DateTime<Utc>,
}

/// A snapshot of the working set at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Monotonically increasing commit id.
    pub id: i64,
    /// The commit this one was created on top of, if any.
    pub parent_id: Option<i64>,
    /// Free-form commit message.
    pub message: String,
    /// Author, usually from the environment.
    pub author: String,
    /// When the commit was created.
    pub timestamp: DateTime<Utc>,
    /// Name of the branch this commit was created on.
    pub branch: String,
}

/// One path's ciphertext as it existed at commit time.
///
/// Immutable once written; the set of `CommitSecret` rows for a given
/// `commit_id` is the entire working set at that moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitSecret {
    /// The commit this snapshot row belongs to.
    pub commit_id: i64,
    /// Path being snapshotted.
    pub path: String,
    /// Ciphertext copied as-is from the working row (no re-encryption).
    pub ciphertext: String,
    /// Secret type at commit time.
    pub r#type: SecretType,
    /// Tags at commit time.
    pub tags: Vec<String>,
}

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// UTC timestamp of the action.
    pub timestamp: DateTime<Utc>,
    /// User performing the action, from the environment.
    pub user: String,
    /// Free-string action name (set/get/list/delete/history/rollback/...).
    pub action: String,
    /// Path the action was performed against.
    pub path: String,
    /// Whether the action succeeded.
    pub success: bool,
    /// Error message, if the action failed.
    pub error: Option<String>,
    /// Free-form metadata.
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Whether a path was added, changed, or removed between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStatus {
    /// Present in the newer snapshot only.
    Added,
    /// Present in both, with different ciphertext.
    Modified,
    /// Present in the older snapshot only.
    Deleted,
}

/// One path's change between two commits (or a commit and the working set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// Path that changed.
    pub path: String,
    /// Added, modified, or deleted.
    pub status: DiffStatus,
    /// Decrypted value before the change, if any.
    pub old_value: Option<String>,
    /// Decrypted value after the change, if any.
    pub new_value: Option<String>,
}

/// A path present with differing ciphertext on both sides of a merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConflict {
    /// Path in conflict.
    pub path: String,
    /// Decrypted value on the target branch.
    pub current_value: String,
    /// Decrypted value on the source branch.
    pub incoming_value: String,
}

/// The set of paths that differ between a branch's head snapshot and
/// its working set, classified by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    /// Paths present in the working set only.
    pub added: Vec<String>,
    /// Paths present in both, with different ciphertext.
    pub modified: Vec<String>,
    /// Paths present in the head snapshot only.
    pub deleted: Vec<String>,
}

impl Status {
    /// A branch is clean when all three sets are empty.
    pub fn is_clean(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}
