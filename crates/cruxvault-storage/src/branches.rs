//! Row-level operations on `branches`.

use cruxvault_core::Error;
use rusqlite::{params, OptionalExtension, Transaction};

use crate::rows::BranchRow;

fn row_to_branch(row: &rusqlite::Row<'_>) -> rusqlite::Result<BranchRow> {
    Ok(BranchRow {
        name: row.get(0)?,
        head_commit_id: row.get(1)?,
        created_at: row.get(2)?,
    })
}

/// Fetches a branch by name.
pub fn get(tx: &Transaction<'_>, name: &str) -> Result<Option<BranchRow>, Error> {
    tx.query_row(
        "SELECT name, head_commit_id, created_at FROM branches WHERE name = ?1",
        params![name],
        row_to_branch,
    )
    .optional()
    .map_err(|e| Error::Storage(e.to_string()))
}

/// Lists every branch, ordered by name.
pub fn list(tx: &Transaction<'_>) -> Result<Vec<BranchRow>, Error> {
    let mut stmt = tx
        .prepare("SELECT name, head_commit_id, created_at FROM branches ORDER BY name ASC")
        .map_err(|e| Error::Storage(e.to_string()))?;
    stmt.query_map([], row_to_branch)
        .map_err(|e| Error::Storage(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::Storage(e.to_string()))
}

/// Inserts a new branch row.
pub fn insert(
    tx: &Transaction<'_>,
    name: &str,
    head_commit_id: Option<i64>,
    created_at: &str,
) -> Result<(), Error> {
    tx.execute(
        "INSERT INTO branches (name, head_commit_id, created_at) VALUES (?1, ?2, ?3)",
        params![name, head_commit_id, created_at],
    )
    .map_err(|e| Error::Storage(e.to_string()))?;
    Ok(())
}

/// Removes a branch row. Returns whether it existed.
pub fn delete(tx: &Transaction<'_>, name: &str) -> Result<bool, Error> {
    let affected = tx
        .execute("DELETE FROM branches WHERE name = ?1", params![name])
        .map_err(|e| Error::Storage(e.to_string()))?;
    Ok(affected > 0)
}

/// Advances a branch's head pointer.
pub fn set_head(tx: &Transaction<'_>, name: &str, commit_id: i64) -> Result<(), Error> {
    tx.execute(
        "UPDATE branches SET head_commit_id = ?1 WHERE name = ?2",
        params![commit_id, name],
    )
    .map_err(|e| Error::Storage(e.to_string()))?;
    Ok(())
}
