//! Row-level operations on `secrets` and `secret_versions`.

use cruxvault_core::Error;
use rusqlite::{params, OptionalExtension, Transaction};

use crate::rows::{
    metadata_from_json, metadata_to_json, tags_from_json, tags_to_json, type_from_str,
    type_to_str, SecretRow, SecretVersionRow,
};

fn row_to_secret(row: &rusqlite::Row<'_>) -> rusqlite::Result<SecretRow> {
    let type_raw: String = row.get(2)?;
    let tags_raw: String = row.get(6)?;
    let metadata_raw: String = row.get(7)?;
    Ok(SecretRow {
        path: row.get(0)?,
        ciphertext: row.get(1)?,
        r#type: type_from_str(&type_raw),
        version: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        tags: tags_from_json(&tags_raw),
        metadata: metadata_from_json(&metadata_raw),
    })
}

/// Fetches the current row at `path`, if any.
pub fn get(tx: &Transaction<'_>, path: &str) -> Result<Option<SecretRow>, Error> {
    tx.query_row(
        "SELECT path, ciphertext, type, version, created_at, updated_at, tags, metadata
         FROM secrets WHERE path = ?1",
        params![path],
        row_to_secret,
    )
    .optional()
    .map_err(|e| Error::Storage(e.to_string()))
}

/// Lists current rows ordered by path ascending, optionally filtered
/// to a literal path prefix.
pub fn list(tx: &Transaction<'_>, prefix: Option<&str>) -> Result<Vec<SecretRow>, Error> {
    let mut stmt = if prefix.is_some() {
        tx.prepare(
            "SELECT path, ciphertext, type, version, created_at, updated_at, tags, metadata
             FROM secrets WHERE path LIKE ?1 ESCAPE '\\' ORDER BY path ASC",
        )
    } else {
        tx.prepare(
            "SELECT path, ciphertext, type, version, created_at, updated_at, tags, metadata
             FROM secrets ORDER BY path ASC",
        )
    }
    .map_err(|e| Error::Storage(e.to_string()))?;

    let rows = if let Some(p) = prefix {
        let escaped = p.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        let pattern = format!("{escaped}%");
        stmt.query_map(params![pattern], row_to_secret)
    } else {
        stmt.query_map([], row_to_secret)
    }
    .map_err(|e| Error::Storage(e.to_string()))?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::Storage(e.to_string()))
}

/// Lists every current row, unfiltered — used by the Version-Control
/// Engine to build a commit snapshot or compare against one.
pub fn list_all(tx: &Transaction<'_>) -> Result<Vec<SecretRow>, Error> {
    list(tx, None)
}

/// Inserts a brand-new current row at version 1.
pub fn insert(
    tx: &Transaction<'_>,
    path: &str,
    ciphertext: &str,
    secret_type: cruxvault_core::types::SecretType,
    created_at: &str,
    tags: &[String],
    metadata: &serde_json::Map<String, serde_json::Value>,
) -> Result<(), Error> {
    tx.execute(
        "INSERT INTO secrets (path, ciphertext, type, version, created_at, updated_at, tags, metadata)
         VALUES (?1, ?2, ?3, 1, ?4, ?4, ?5, ?6)",
        params![
            path,
            ciphertext,
            type_to_str(secret_type),
            created_at,
            tags_to_json(tags),
            metadata_to_json(metadata),
        ],
    )
    .map_err(|e| Error::Storage(e.to_string()))?;
    Ok(())
}

/// Overwrites the current row's ciphertext, bumping `version` and
/// `updated_at`, and replacing `tags`. Does not touch `type`.
pub fn update_current(
    tx: &Transaction<'_>,
    path: &str,
    ciphertext: &str,
    new_version: i64,
    updated_at: &str,
    tags: &[String],
) -> Result<(), Error> {
    tx.execute(
        "UPDATE secrets SET ciphertext = ?1, version = ?2, updated_at = ?3, tags = ?4
         WHERE path = ?5",
        params![ciphertext, new_version, updated_at, tags_to_json(tags), path],
    )
    .map_err(|e| Error::Storage(e.to_string()))?;
    Ok(())
}

/// Deletes the current row at `path`. Returns whether a row existed.
pub fn delete(tx: &Transaction<'_>, path: &str) -> Result<bool, Error> {
    let affected = tx
        .execute("DELETE FROM secrets WHERE path = ?1", params![path])
        .map_err(|e| Error::Storage(e.to_string()))?;
    Ok(affected > 0)
}

/// Deletes every current row — used by checkout/reset/merge to replace
/// the working set wholesale.
pub fn delete_all(tx: &Transaction<'_>) -> Result<(), Error> {
    tx.execute("DELETE FROM secrets", [])
        .map_err(|e| Error::Storage(e.to_string()))?;
    Ok(())
}

/// Restores a current row verbatim (path, ciphertext, type, tags),
/// forcing `version = 1` — used by checkout/reset, which reset
/// per-path version numbering intentionally (see module docs on the
/// engine's checkout operation).
pub fn restore_current(
    tx: &Transaction<'_>,
    path: &str,
    ciphertext: &str,
    secret_type: cruxvault_core::types::SecretType,
    tags: &[String],
    now: &str,
) -> Result<(), Error> {
    tx.execute(
        "INSERT INTO secrets (path, ciphertext, type, version, created_at, updated_at, tags, metadata)
         VALUES (?1, ?2, ?3, 1, ?4, ?4, ?5, '{}')",
        params![
            path,
            ciphertext,
            type_to_str(secret_type),
            now,
            tags_to_json(tags),
        ],
    )
    .map_err(|e| Error::Storage(e.to_string()))?;
    Ok(())
}

fn row_to_version(row: &rusqlite::Row<'_>) -> rusqlite::Result<SecretVersionRow> {
    Ok(SecretVersionRow {
        path: row.get(0)?,
        ciphertext: row.get(1)?,
        version: row.get(2)?,
        created_at: row.get(3)?,
        created_by: row.get(4)?,
    })
}

/// Appends a history row, preserving a ciphertext that is about to be
/// overwritten.
pub fn insert_version(
    tx: &Transaction<'_>,
    path: &str,
    ciphertext: &str,
    version: i64,
    created_at: &str,
    created_by: Option<&str>,
) -> Result<(), Error> {
    tx.execute(
        "INSERT INTO secret_versions (path, ciphertext, version, created_at, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![path, ciphertext, version, created_at, created_by],
    )
    .map_err(|e| Error::Storage(e.to_string()))?;
    Ok(())
}

/// Lists history rows for `path`, descending by version.
pub fn list_versions(tx: &Transaction<'_>, path: &str) -> Result<Vec<SecretVersionRow>, Error> {
    let mut stmt = tx
        .prepare(
            "SELECT path, ciphertext, version, created_at, created_by
             FROM secret_versions WHERE path = ?1 ORDER BY version DESC",
        )
        .map_err(|e| Error::Storage(e.to_string()))?;
    stmt.query_map(params![path], row_to_version)
        .map_err(|e| Error::Storage(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::Storage(e.to_string()))
}

/// Fetches a single history row at `(path, version)`.
pub fn get_version(
    tx: &Transaction<'_>,
    path: &str,
    version: i64,
) -> Result<Option<SecretVersionRow>, Error> {
    tx.query_row(
        "SELECT path, ciphertext, version, created_at, created_by
         FROM secret_versions WHERE path = ?1 AND version = ?2",
        params![path, version],
        row_to_version,
    )
    .optional()
    .map_err(|e| Error::Storage(e.to_string()))
}

/// Deletes every history row for `path` — paired with [`delete`] to
/// remove a path entirely.
pub fn delete_versions(tx: &Transaction<'_>, path: &str) -> Result<(), Error> {
    tx.execute(
        "DELETE FROM secret_versions WHERE path = ?1",
        params![path],
    )
    .map_err(|e| Error::Storage(e.to_string()))?;
    Ok(())
}
