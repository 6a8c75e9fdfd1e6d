//! Row types returned by the persistence layer.
//!
//! These carry ciphertext, never plaintext — decryption happens one
//! layer up, in `cruxvault-engine`, which is the only place the cipher
//! key is available.

use cruxvault_core::types::SecretType;
use std::str::FromStr;

/// The current row for a path.
#[derive(Debug, Clone, PartialEq)]
pub struct SecretRow {
    pub path: String,
    pub ciphertext: String,
    pub r#type: SecretType,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
    pub tags: Vec<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// An immutable prior ciphertext for a path.
#[derive(Debug, Clone, PartialEq)]
pub struct SecretVersionRow {
    pub path: String,
    pub ciphertext: String,
    pub version: i64,
    pub created_at: String,
    pub created_by: Option<String>,
}

/// A named line of development.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchRow {
    pub name: String,
    pub head_commit_id: Option<i64>,
    pub created_at: String,
}

/// A point-in-time snapshot marker.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRow {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub message: String,
    pub author: String,
    pub timestamp: String,
    pub branch: String,
}

/// One path's ciphertext as captured at commit time.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitSecretRow {
    pub commit_id: i64,
    pub path: String,
    pub ciphertext: String,
    pub r#type: SecretType,
    pub tags: Vec<String>,
}

/// A persisted audit record (the indexed, queryable companion to the
/// JSONL audit log written by `cruxvault-audit`).
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogRow {
    pub timestamp: String,
    pub user: String,
    pub action: String,
    pub path: String,
    pub success: bool,
    pub error: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

pub(crate) fn tags_to_json(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn tags_from_json(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

pub(crate) fn metadata_to_json(metadata: &serde_json::Map<String, serde_json::Value>) -> String {
    serde_json::to_string(metadata).unwrap_or_else(|_| "{}".to_string())
}

pub(crate) fn metadata_from_json(raw: &str) -> serde_json::Map<String, serde_json::Value> {
    serde_json::from_str(raw).unwrap_or_default()
}

pub(crate) fn type_to_str(t: SecretType) -> &'static str {
    match t {
        SecretType::Secret => "secret",
        SecretType::Config => "config",
        SecretType::Flag => "flag",
    }
}

pub(crate) fn type_from_str(raw: &str) -> SecretType {
    SecretType::from_str(raw).unwrap_or_default()
}
