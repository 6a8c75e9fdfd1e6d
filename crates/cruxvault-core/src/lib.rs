//! Shared types and error taxonomy for the Crux Vault secrets engine.
//!
//! This crate has no opinion on encryption, persistence, or the
//! version-control semantics built on top of it — it exists so that
//! `cruxvault-crypto`, `cruxvault-storage`, `cruxvault-engine`, and
//! `cruxvault-audit` all speak the same vocabulary without depending
//! on one another.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    AuditEntry, Branch, Commit, CommitSecret, DiffEntry, DiffStatus, MergeConflict, Secret,
    SecretType, SecretVersion, Status,
};
