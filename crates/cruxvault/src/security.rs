//! Input validation for the public API.
//!
//! Every path, tag, and plaintext value crosses here before it reaches
//! the engine, so storage and cipher code never has to second-guess
//! caller input.

use cruxvault_core::{Error, Result};

const MAX_PATH_LENGTH: usize = 4096;
const MAX_VALUE_LENGTH: usize = 1024 * 1024 * 1024; // 1 GB
const MAX_TAG_LENGTH: usize = 256;

/// Validates a secret path: non-empty, bounded length, no NUL bytes.
#[inline]
pub fn validate_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::InvalidInput("path cannot be empty".to_string()));
    }
    if path.len() > MAX_PATH_LENGTH {
        return Err(Error::InvalidInput(format!(
            "path length {} exceeds maximum {MAX_PATH_LENGTH}",
            path.len()
        )));
    }
    if path.contains('\0') {
        return Err(Error::InvalidInput(
            "path cannot contain null bytes".to_string(),
        ));
    }
    Ok(())
}

/// Validates a plaintext value before encryption: bounded length, no
/// other restriction (binary-safe values are allowed, empty is fine).
#[inline]
pub fn validate_value(value: &str) -> Result<()> {
    if value.len() > MAX_VALUE_LENGTH {
        return Err(Error::InvalidInput(format!(
            "value length {} exceeds maximum {MAX_VALUE_LENGTH}",
            value.len()
        )));
    }
    Ok(())
}

/// Validates a single tag: bounded length, no NUL bytes.
#[inline]
pub fn validate_tag(tag: &str) -> Result<()> {
    if tag.len() > MAX_TAG_LENGTH {
        return Err(Error::InvalidInput(format!(
            "tag length {} exceeds maximum {MAX_TAG_LENGTH}",
            tag.len()
        )));
    }
    if tag.contains('\0') {
        return Err(Error::InvalidInput(
            "tag cannot contain null bytes".to_string(),
        ));
    }
    Ok(())
}

/// Validates every tag in a slice.
pub fn validate_tags(tags: &[String]) -> Result<()> {
    tags.iter().try_for_each(|t| validate_tag(t))
}

/// Validates a branch name: non-empty, bounded length, no path
/// separators (branch names are never used as filesystem paths, but
/// keeping them free of separators avoids ambiguity in CLI output).
#[inline]
pub fn validate_branch_name(name: &str) -> Result<()> {
    const MAX_BRANCH_NAME_LENGTH: usize = 256;

    if name.is_empty() {
        return Err(Error::InvalidInput(
            "branch name cannot be empty".to_string(),
        ));
    }
    if name.len() > MAX_BRANCH_NAME_LENGTH {
        return Err(Error::InvalidInput(format!(
            "branch name length {} exceeds maximum {MAX_BRANCH_NAME_LENGTH}",
            name.len()
        )));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") || name.contains('\0') {
        return Err(Error::InvalidInput(
            "branch name cannot contain path separators, '..', or null bytes".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_validation() {
        assert!(validate_path("db/password").is_ok());
        assert!(validate_path("").is_err());
        assert!(validate_path("has\0null").is_err());
        assert!(validate_path(&"a".repeat(MAX_PATH_LENGTH + 1)).is_err());
    }

    #[test]
    fn value_validation() {
        assert!(validate_value("").is_ok());
        assert!(validate_value("anything goes").is_ok());
    }

    #[test]
    fn tag_validation() {
        assert!(validate_tags(&["prod".to_string(), "db".to_string()]).is_ok());
        assert!(validate_tags(&["bad\0tag".to_string()]).is_err());
    }

    #[test]
    fn branch_name_validation() {
        assert!(validate_branch_name("feature").is_ok());
        assert!(validate_branch_name("").is_err());
        assert!(validate_branch_name("../escape").is_err());
        assert!(validate_branch_name("has/slash").is_err());
    }
}
