//! # Crux Vault
//!
//! A local, single-user secrets and configuration store with a
//! version-controlled workflow modeled on a distributed VCS: typed
//! key/value entries live under a hierarchical path namespace, values
//! are encrypted at rest, every update keeps a prior version, and the
//! whole working set can be committed, branched, diffed, merged, and
//! reset across named branches.
//!
//! ## Quick start
//!
//! ```rust
//! use cruxvault::{CruxVault, VaultOptions};
//! use cruxvault_core::types::SecretType;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! let key = [0u8; 32]; // from the key collaborator, in a real application
//! let vault = CruxVault::open(
//!     VaultOptions::new(dir.path().join("vault.db"), dir.path().join("audit.jsonl")),
//!     &key,
//! )?;
//!
//! vault.set_secret("db/password", "p@ss", SecretType::Secret, vec![])?;
//! assert_eq!(vault.get_secret("db/password")?.unwrap().value, "p@ss");
//! # Ok(())
//! # }
//! ```
//!
//! ## What this crate does not do
//!
//! Command-line parsing, configuration-file discovery, master-key
//! acquisition from an OS keychain, `.env` import/export, and the
//! optional dashboard UI are all external collaborators. This crate is
//! the versioned, encrypted key-value engine underneath them.

mod logging;
mod security;
mod vault;

pub use cruxvault_core::types::{
    AuditEntry, Branch, Commit, CommitSecret, DiffEntry, DiffStatus, MergeConflict, Secret,
    SecretType, SecretVersion, Status,
};
pub use cruxvault_core::{Error, Result};
pub use cruxvault_crypto::Cipher;
pub use logging::{LogConfig, LogFormat, LogOutput};
pub use vault::{CruxVault, VaultOptions};

/// The crate's own version, as recorded in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert_eq!(VERSION, "0.1.0");
    }
}
