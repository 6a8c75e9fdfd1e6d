//! Error types for Crux Vault.

use std::fmt;

/// The main error type for Crux Vault operations.
///
/// Variants correspond to the error taxonomy: cipher and I/O failures
/// abort the in-flight transaction, `NotFound` and `Conflict` surface
/// cleanly for a caller to translate into a human-readable message.
#[derive(Debug)]
pub enum Error {
    /// Authenticated-encryption failure: invalid key length, a tag
    /// mismatch on decrypt, or malformed base64 input.
    Cipher(String),

    /// Path, version, branch, or commit does not exist.
    NotFound(String),

    /// Branch name collision, deletion of a protected branch, or a
    /// merge attempted against the same branch.
    Conflict(String),

    /// Underlying storage or file-system failure.
    Io(std::io::Error),

    /// Storage-layer failure below the I/O boundary (e.g. a SQLite
    /// error that is not simply an I/O error).
    Storage(String),

    /// Serialization/deserialization failure.
    Serialization(String),

    /// A caller-supplied path, tag, or value failed validation before
    /// any storage or cipher work was attempted.
    InvalidInput(String),
}

impl Error {
    /// `Secret {path} not found`
    pub fn secret_not_found(path: &str) -> Self {
        Error::NotFound(format!("Secret {path} not found"))
    }

    /// `Version {v} not found for {path}`
    pub fn version_not_found(path: &str, version: i64) -> Self {
        Error::NotFound(format!("Version {version} not found for {path}"))
    }

    /// `Branch '{name}' not found`
    pub fn branch_not_found(name: &str) -> Self {
        Error::NotFound(format!("Branch '{name}' not found"))
    }

    /// `Branch '{name}' already exists`
    pub fn branch_already_exists(name: &str) -> Self {
        Error::Conflict(format!("Branch '{name}' already exists"))
    }

    /// `Cannot delete main branch`
    pub fn cannot_delete_main() -> Self {
        Error::Conflict("Cannot delete main branch".to_string())
    }

    /// `Commit {id} not found`
    pub fn commit_not_found(id: i64) -> Self {
        Error::NotFound(format!("Commit {id} not found"))
    }

    /// `Cannot merge branch into itself`
    pub fn cannot_merge_into_self() -> Self {
        Error::Conflict("Cannot merge branch into itself".to_string())
    }

    /// True if this error is a logical `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// True if this error is a logical `Conflict`.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Cipher(msg) => write!(f, "cipher error: {msg}"),
            Error::NotFound(msg) => write!(f, "{msg}"),
            Error::Conflict(msg) => write!(f, "{msg}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Storage(msg) => write!(f, "storage error: {msg}"),
            Error::Serialization(msg) => write!(f, "serialization error: {msg}"),
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Crux Vault operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_messages() {
        assert_eq!(
            Error::secret_not_found("db/password").to_string(),
            "Secret db/password not found"
        );
        assert_eq!(
            Error::version_not_found("api/key", 1).to_string(),
            "Version 1 not found for api/key"
        );
        assert_eq!(
            Error::branch_not_found("feature").to_string(),
            "Branch 'feature' not found"
        );
        assert_eq!(
            Error::branch_already_exists("feature").to_string(),
            "Branch 'feature' already exists"
        );
        assert_eq!(Error::cannot_delete_main().to_string(), "Cannot delete main branch");
        assert_eq!(Error::commit_not_found(7).to_string(), "Commit 7 not found");
        assert_eq!(
            Error::cannot_merge_into_self().to_string(),
            "Cannot merge branch into itself"
        );
    }
}
