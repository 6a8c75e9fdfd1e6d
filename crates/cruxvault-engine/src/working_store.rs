//! The Working Store: the current mutable set of secrets on the
//! active branch, plus linear per-path version history.

use std::collections::HashSet;

use cruxvault_core::types::SecretType;
use cruxvault_core::{Error, Secret, SecretVersion};
use cruxvault_storage::secrets;
use tracing::{debug, instrument, warn};

use crate::engine::Engine;
use crate::time;

impl Engine {
    /// Creates or overwrites `path`.
    ///
    /// If a row already exists at `path`, its current ciphertext is
    /// preserved as a history entry before being overwritten; `type`
    /// of an existing row is never changed by `set_secret`.
    #[instrument(skip(self, plaintext, tags), fields(path = path))]
    pub fn set_secret(
        &self,
        path: &str,
        plaintext: &str,
        secret_type: SecretType,
        tags: Vec<String>,
    ) -> Result<Secret, Error> {
        let ciphertext = self.cipher.encrypt(plaintext)?;
        let now = time::now();
        let now_s = time::to_storage(now);

        let result = self.store.with_transaction(|tx| match secrets::get(tx, path)? {
            Some(existing) => {
                secrets::insert_version(
                    tx,
                    path,
                    &existing.ciphertext,
                    existing.version,
                    &existing.updated_at,
                    None,
                )?;
                let new_version = existing.version + 1;
                secrets::update_current(tx, path, &ciphertext, new_version, &now_s, &tags)?;
                Ok(Secret {
                    path: path.to_string(),
                    value: plaintext.to_string(),
                    r#type: existing.r#type,
                    version: new_version,
                    created_at: time::from_storage(&existing.created_at),
                    updated_at: now,
                    tags,
                    metadata: existing.metadata,
                })
            }
            None => {
                secrets::insert(
                    tx,
                    path,
                    &ciphertext,
                    secret_type,
                    &now_s,
                    &tags,
                    &serde_json::Map::new(),
                )?;
                Ok(Secret {
                    path: path.to_string(),
                    value: plaintext.to_string(),
                    r#type: secret_type,
                    version: 1,
                    created_at: now,
                    updated_at: now,
                    tags,
                    metadata: serde_json::Map::new(),
                })
            }
        })?;
        debug!(path, version = result.version, "Wrote secret");
        Ok(result)
    }

    /// Fetches and decrypts the current row at `path`, if any.
    pub fn get_secret(&self, path: &str) -> Result<Option<Secret>, Error> {
        self.store.with_transaction(|tx| match secrets::get(tx, path)? {
            None => Ok(None),
            Some(row) => {
                let value = self.cipher.decrypt(&row.ciphertext)?;
                Ok(Some(Secret {
                    path: path.to_string(),
                    value,
                    r#type: row.r#type,
                    version: row.version,
                    created_at: time::from_storage(&row.created_at),
                    updated_at: time::from_storage(&row.updated_at),
                    tags: row.tags,
                    metadata: row.metadata,
                }))
            }
        })
    }

    /// Like [`Engine::get_secret`], but resolves `${other/path}`
    /// references in the decrypted value before returning it.
    ///
    /// Non-core: separate from `get_secret` so the invariant-bearing
    /// core path is untouched by this. A reference to a path that does
    /// not exist is left in the output verbatim; a reference cycle
    /// (including a path referencing itself) is a [`Error::Conflict`].
    pub fn get_secret_expanded(&self, path: &str) -> Result<Option<Secret>, Error> {
        self.store.with_transaction(|tx| match secrets::get(tx, path)? {
            None => Ok(None),
            Some(row) => {
                let raw = self.cipher.decrypt(&row.ciphertext)?;
                let mut visited = HashSet::new();
                visited.insert(path.to_string());
                let expanded = expand_variables(self, tx, &raw, &mut visited)?;
                Ok(Some(Secret {
                    path: path.to_string(),
                    value: expanded,
                    r#type: row.r#type,
                    version: row.version,
                    created_at: time::from_storage(&row.created_at),
                    updated_at: time::from_storage(&row.updated_at),
                    tags: row.tags,
                    metadata: row.metadata,
                }))
            }
        })
    }

    /// Lists current rows ordered by path ascending, optionally
    /// filtered to a literal path prefix.
    pub fn list_secrets(&self, prefix: Option<&str>) -> Result<Vec<Secret>, Error> {
        self.store.with_transaction(|tx| {
            secrets::list(tx, prefix)?
                .into_iter()
                .map(|row| {
                    let value = self.cipher.decrypt(&row.ciphertext)?;
                    Ok(Secret {
                        path: row.path,
                        value,
                        r#type: row.r#type,
                        version: row.version,
                        created_at: time::from_storage(&row.created_at),
                        updated_at: time::from_storage(&row.updated_at),
                        tags: row.tags,
                        metadata: row.metadata,
                    })
                })
                .collect()
        })
    }

    /// Deletes the current row at `path` and all of its history.
    /// Returns whether a row existed.
    #[instrument(skip(self), fields(path = path))]
    pub fn delete_secret(&self, path: &str) -> Result<bool, Error> {
        let existed = self.store.with_transaction(|tx| {
            let existed = secrets::delete(tx, path)?;
            secrets::delete_versions(tx, path)?;
            Ok(existed)
        })?;
        if existed {
            debug!(path, "Deleted secret");
        } else {
            warn!(path, "Delete requested for nonexistent path");
        }
        Ok(existed)
    }

    /// Decrypted version history for `path`, descending by version,
    /// with the current row included first as the highest version.
    pub fn get_history(&self, path: &str) -> Result<Vec<SecretVersion>, Error> {
        self.store.with_transaction(|tx| {
            let mut out = Vec::new();
            if let Some(current) = secrets::get(tx, path)? {
                let value = self.cipher.decrypt(&current.ciphertext)?;
                out.push(SecretVersion {
                    path: path.to_string(),
                    value,
                    version: current.version,
                    created_at: time::from_storage(&current.updated_at),
                    created_by: None,
                });
            }
            for row in secrets::list_versions(tx, path)? {
                let value = self.cipher.decrypt(&row.ciphertext)?;
                out.push(SecretVersion {
                    path: path.to_string(),
                    value,
                    version: row.version,
                    created_at: time::from_storage(&row.created_at),
                    created_by: row.created_by,
                });
            }
            Ok(out)
        })
    }

    /// Restores `path`'s current ciphertext to that of `target_version`.
    ///
    /// The outgoing current ciphertext is preserved as a new history
    /// entry first. Tags are **not** rolled back — the current row's
    /// existing tags are kept as-is (see module docs for why).
    #[instrument(skip(self), fields(path = path, target_version = target_version))]
    pub fn rollback(&self, path: &str, target_version: i64) -> Result<Secret, Error> {
        let now = time::now();
        let now_s = time::to_storage(now);

        let result = self.store.with_transaction(|tx| {
            let target = secrets::get_version(tx, path, target_version)?
                .ok_or_else(|| {
                    warn!(path, target_version, "Rollback target version not found");
                    Error::version_not_found(path, target_version)
                })?;
            let current = secrets::get(tx, path)?.ok_or_else(|| Error::secret_not_found(path))?;

            secrets::insert_version(
                tx,
                path,
                &current.ciphertext,
                current.version,
                &current.updated_at,
                None,
            )?;
            let new_version = current.version + 1;
            secrets::update_current(tx, path, &target.ciphertext, new_version, &now_s, &current.tags)?;

            let value = self.cipher.decrypt(&target.ciphertext)?;
            Ok(Secret {
                path: path.to_string(),
                value,
                r#type: current.r#type,
                version: new_version,
                created_at: time::from_storage(&current.created_at),
                updated_at: now,
                tags: current.tags,
                metadata: current.metadata,
            })
        })?;
        debug!(path, new_version = result.version, "Rolled back secret");
        Ok(result)
    }
}

/// Recursively substitutes `${other/path}` references, decrypting each
/// referenced path through the same cipher. `visited` carries the set
/// of paths already on the current resolution stack so a cycle is
/// caught rather than recursing forever.
fn expand_variables(
    engine: &Engine,
    tx: &rusqlite::Transaction<'_>,
    value: &str,
    visited: &mut HashSet<String>,
) -> Result<String, Error> {
    let mut result = String::with_capacity(value.len());
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            if let Some(rel_end) = value[i + 2..].find('}') {
                let end = i + 2 + rel_end;
                let inner_path = &value[i + 2..end];
                if visited.contains(inner_path) {
                    return Err(Error::Conflict(format!(
                        "cycle detected expanding ${{{inner_path}}}"
                    )));
                }
                match secrets::get(tx, inner_path)? {
                    Some(row) => {
                        let inner_plain = engine.cipher.decrypt(&row.ciphertext)?;
                        visited.insert(inner_path.to_string());
                        let expanded = expand_variables(engine, tx, &inner_plain, visited)?;
                        visited.remove(inner_path);
                        result.push_str(&expanded);
                    }
                    None => {
                        // Unresolved reference: leave it intact.
                        result.push_str(&value[i..=end]);
                    }
                }
                i = end + 1;
                continue;
            }
        }
        let ch = value[i..].chars().next().expect("i < bytes.len()");
        result.push(ch);
        i += ch.len_utf8();
    }
    Ok(result)
}
