//! Row-level operations on `commits` and `commit_secrets`.

use cruxvault_core::Error;
use rusqlite::{params, OptionalExtension, Transaction};

use crate::rows::{
    tags_from_json, tags_to_json, type_from_str, type_to_str, CommitRow, CommitSecretRow,
};

fn row_to_commit(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommitRow> {
    Ok(CommitRow {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        message: row.get(2)?,
        author: row.get(3)?,
        timestamp: row.get(4)?,
        branch: row.get(5)?,
    })
}

/// Creates a commit and returns its id.
pub fn insert(
    tx: &Transaction<'_>,
    parent_id: Option<i64>,
    message: &str,
    author: &str,
    timestamp: &str,
    branch: &str,
) -> Result<i64, Error> {
    tx.execute(
        "INSERT INTO commits (parent_id, message, author, timestamp, branch)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![parent_id, message, author, timestamp, branch],
    )
    .map_err(|e| Error::Storage(e.to_string()))?;
    Ok(tx.last_insert_rowid())
}

/// Fetches a commit by id.
pub fn get(tx: &Transaction<'_>, id: i64) -> Result<Option<CommitRow>, Error> {
    tx.query_row(
        "SELECT id, parent_id, message, author, timestamp, branch FROM commits WHERE id = ?1",
        params![id],
        row_to_commit,
    )
    .optional()
    .map_err(|e| Error::Storage(e.to_string()))
}

/// Walks the `parent_id` chain starting at `head`, newest first, up to
/// `limit` entries.
pub fn history(tx: &Transaction<'_>, head: i64, limit: usize) -> Result<Vec<CommitRow>, Error> {
    let mut out = Vec::new();
    let mut cursor = Some(head);
    while let Some(id) = cursor {
        if out.len() >= limit {
            break;
        }
        let Some(commit) = get(tx, id)? else { break };
        cursor = commit.parent_id;
        out.push(commit);
    }
    Ok(out)
}

fn row_to_commit_secret(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommitSecretRow> {
    let type_raw: String = row.get(3)?;
    let tags_raw: String = row.get(4)?;
    Ok(CommitSecretRow {
        commit_id: row.get(0)?,
        path: row.get(1)?,
        ciphertext: row.get(2)?,
        r#type: type_from_str(&type_raw),
        tags: tags_from_json(&tags_raw),
    })
}

/// Snapshots one path's ciphertext under a commit.
pub fn insert_commit_secret(
    tx: &Transaction<'_>,
    commit_id: i64,
    path: &str,
    ciphertext: &str,
    secret_type: cruxvault_core::types::SecretType,
    tags: &[String],
) -> Result<(), Error> {
    tx.execute(
        "INSERT INTO commit_secrets (commit_id, path, ciphertext, type, tags)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            commit_id,
            path,
            ciphertext,
            type_to_str(secret_type),
            tags_to_json(tags),
        ],
    )
    .map_err(|e| Error::Storage(e.to_string()))?;
    Ok(())
}

/// Lists every `CommitSecret` under a commit — the working set as it
/// existed at that commit's creation.
pub fn list_for_commit(
    tx: &Transaction<'_>,
    commit_id: i64,
) -> Result<Vec<CommitSecretRow>, Error> {
    let mut stmt = tx
        .prepare(
            "SELECT commit_id, path, ciphertext, type, tags
             FROM commit_secrets WHERE commit_id = ?1 ORDER BY path ASC",
        )
        .map_err(|e| Error::Storage(e.to_string()))?;
    stmt.query_map(params![commit_id], row_to_commit_secret)
        .map_err(|e| Error::Storage(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::Storage(e.to_string()))
}
