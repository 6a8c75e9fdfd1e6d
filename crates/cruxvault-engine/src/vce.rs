//! The Version-Control Engine: branches, commits, status/diff,
//! checkout, reset, merge.

use std::collections::{BTreeMap, BTreeSet};

use cruxvault_core::types::{DiffStatus, SecretType};
use cruxvault_core::{Branch, Commit, DiffEntry, Error, MergeConflict, Status};
use cruxvault_storage::{branches, commits, secrets};
use tracing::{debug, instrument, warn};

use crate::engine::Engine;
use crate::time;

impl Engine {
    /// Creates a branch, inheriting `from`'s head commit if given.
    pub fn create_branch(&self, name: &str, from: Option<&str>) -> Result<Branch, Error> {
        let now = time::now();
        let now_s = time::to_storage(now);

        self.store.with_transaction(|tx| {
            if branches::get(tx, name)?.is_some() {
                return Err(Error::branch_already_exists(name));
            }
            let head = match from {
                Some(from_name) => {
                    branches::get(tx, from_name)?
                        .ok_or_else(|| Error::branch_not_found(from_name))?
                        .head_commit_id
                }
                None => None,
            };
            branches::insert(tx, name, head, &now_s)?;
            Ok(Branch {
                name: name.to_string(),
                head_commit_id: head,
                created_at: now,
            })
        })
    }

    /// Removes a branch row (its historical commits are untouched).
    /// Refuses to delete `main`.
    pub fn delete_branch(&self, name: &str) -> Result<bool, Error> {
        if name == "main" {
            return Err(Error::cannot_delete_main());
        }
        self.store.with_transaction(|tx| branches::delete(tx, name))
    }

    /// Lists every branch, ordered by name.
    pub fn list_branches(&self) -> Result<Vec<Branch>, Error> {
        self.store.with_transaction(|tx| {
            branches::list(tx)?
                .into_iter()
                .map(|row| {
                    Ok(Branch {
                        name: row.name,
                        head_commit_id: row.head_commit_id,
                        created_at: time::from_storage(&row.created_at),
                    })
                })
                .collect()
        })
    }

    /// Snapshots the entire working set under a new commit and
    /// advances `branch`'s head to it.
    #[instrument(skip(self, message, author), fields(branch = branch))]
    pub fn commit(&self, branch: &str, message: &str, author: &str) -> Result<Commit, Error> {
        let now = time::now();
        let now_s = time::to_storage(now);

        let result = self.store.with_transaction(|tx| {
            let branch_row = branches::get(tx, branch)?.ok_or_else(|| Error::branch_not_found(branch))?;
            let commit_id = commits::insert(tx, branch_row.head_commit_id, message, author, &now_s, branch)?;

            for row in secrets::list_all(tx)? {
                commits::insert_commit_secret(tx, commit_id, &row.path, &row.ciphertext, row.r#type, &row.tags)?;
            }
            branches::set_head(tx, branch, commit_id)?;

            Ok(Commit {
                id: commit_id,
                parent_id: branch_row.head_commit_id,
                message: message.to_string(),
                author: author.to_string(),
                timestamp: now,
                branch: branch.to_string(),
            })
        })?;
        debug!(branch, commit_id = result.id, "Created commit");
        Ok(result)
    }

    /// Walks `parent_id` pointers from `branch`'s head, newest first,
    /// up to `limit` entries.
    pub fn get_commit_history(&self, branch: &str, limit: usize) -> Result<Vec<Commit>, Error> {
        self.store.with_transaction(|tx| {
            let branch_row = branches::get(tx, branch)?.ok_or_else(|| Error::branch_not_found(branch))?;
            let Some(head) = branch_row.head_commit_id else {
                return Ok(Vec::new());
            };
            commits::history(tx, head, limit)?
                .into_iter()
                .map(|row| {
                    Ok(Commit {
                        id: row.id,
                        parent_id: row.parent_id,
                        message: row.message,
                        author: row.author,
                        timestamp: time::from_storage(&row.timestamp),
                        branch: row.branch,
                    })
                })
                .collect()
        })
    }

    /// Compares the working set against `branch`'s head snapshot.
    ///
    /// Because GCM nonces differ per encryption, re-setting a path to
    /// the same plaintext still reports as `modified` — this follows
    /// directly from comparing ciphertext bytes, which is what the
    /// specification requires.
    pub fn get_status(&self, branch: &str) -> Result<Status, Error> {
        self.store.with_transaction(|tx| {
            let branch_row = branches::get(tx, branch)?.ok_or_else(|| Error::branch_not_found(branch))?;
            let baseline: BTreeMap<String, String> = match branch_row.head_commit_id {
                Some(head) => commits::list_for_commit(tx, head)?
                    .into_iter()
                    .map(|c| (c.path, c.ciphertext))
                    .collect(),
                None => BTreeMap::new(),
            };
            let working: BTreeMap<String, String> = secrets::list_all(tx)?
                .into_iter()
                .map(|s| (s.path, s.ciphertext))
                .collect();

            Ok(diff_sets(&baseline, &working))
        })
    }

    /// Diffs two commits' snapshots, decrypting values for display.
    pub fn diff_commits(&self, commit_a: i64, commit_b: i64) -> Result<Vec<DiffEntry>, Error> {
        self.store.with_transaction(|tx| {
            commits::get(tx, commit_a)?.ok_or_else(|| Error::commit_not_found(commit_a))?;
            commits::get(tx, commit_b)?.ok_or_else(|| Error::commit_not_found(commit_b))?;

            let a: BTreeMap<String, String> = commits::list_for_commit(tx, commit_a)?
                .into_iter()
                .map(|c| (c.path, c.ciphertext))
                .collect();
            let b: BTreeMap<String, String> = commits::list_for_commit(tx, commit_b)?
                .into_iter()
                .map(|c| (c.path, c.ciphertext))
                .collect();

            let mut paths: BTreeSet<&String> = a.keys().collect();
            paths.extend(b.keys());

            let mut out = Vec::new();
            for path in paths {
                match (a.get(path), b.get(path)) {
                    (None, Some(new_ct)) => out.push(DiffEntry {
                        path: path.clone(),
                        status: DiffStatus::Added,
                        old_value: None,
                        new_value: Some(self.cipher.decrypt(new_ct)?),
                    }),
                    (Some(old_ct), None) => out.push(DiffEntry {
                        path: path.clone(),
                        status: DiffStatus::Deleted,
                        old_value: Some(self.cipher.decrypt(old_ct)?),
                        new_value: None,
                    }),
                    (Some(old_ct), Some(new_ct)) if old_ct != new_ct => out.push(DiffEntry {
                        path: path.clone(),
                        status: DiffStatus::Modified,
                        old_value: Some(self.cipher.decrypt(old_ct)?),
                        new_value: Some(self.cipher.decrypt(new_ct)?),
                    }),
                    _ => {}
                }
            }
            Ok(out)
        })
    }

    /// Replaces the working set with `branch`'s head snapshot.
    ///
    /// Every current row's version is reset to 1 regardless of what it
    /// was on the outgoing branch; history rows are left untouched (a
    /// known asymmetry the specification codifies rather than fixes).
    #[instrument(skip(self), fields(branch = branch))]
    pub fn checkout_branch(&self, branch: &str) -> Result<(), Error> {
        self.store.with_transaction(|tx| {
            let branch_row = branches::get(tx, branch)?.ok_or_else(|| Error::branch_not_found(branch))?;
            secrets::delete_all(tx)?;
            if let Some(head) = branch_row.head_commit_id {
                let now_s = time::to_storage(time::now());
                for snap in commits::list_for_commit(tx, head)? {
                    secrets::restore_current(tx, &snap.path, &snap.ciphertext, snap.r#type, &snap.tags, &now_s)?;
                }
            }
            debug!(branch, "Checked out branch");
            Ok(())
        })
    }

    /// Moves `branch`'s head to `commit_id` and replaces the working
    /// set from that commit's snapshot, exactly as [`checkout_branch`].
    ///
    /// [`checkout_branch`]: Engine::checkout_branch
    #[instrument(skip(self), fields(branch = branch, commit_id = commit_id))]
    pub fn rollback_to_commit(&self, branch: &str, commit_id: i64) -> Result<(), Error> {
        self.store.with_transaction(|tx| {
            branches::get(tx, branch)?.ok_or_else(|| Error::branch_not_found(branch))?;
            commits::get(tx, commit_id)?.ok_or_else(|| Error::commit_not_found(commit_id))?;

            branches::set_head(tx, branch, commit_id)?;
            secrets::delete_all(tx)?;
            let now_s = time::to_storage(time::now());
            for snap in commits::list_for_commit(tx, commit_id)? {
                secrets::restore_current(tx, &snap.path, &snap.ciphertext, snap.r#type, &snap.tags, &now_s)?;
            }
            debug!(branch, commit_id, "Reset branch to commit");
            Ok(())
        })
    }

    /// Merges `source`'s head snapshot into `target`'s.
    ///
    /// Detects conflicts as paths present (with differing ciphertext)
    /// in both head snapshots; on any conflict, returns them without
    /// mutating anything. Otherwise replaces the working set with the
    /// **union** of both snapshots, preferring source's row where a
    /// path exists on both sides. Paths that exist only on the target
    /// side are not conflicts and are preserved by the union, matching
    /// the specification's explicit merge semantics.
    #[instrument(skip(self), fields(target = target, source = source))]
    pub fn merge_branch(
        &self,
        target: &str,
        source: &str,
    ) -> Result<(bool, Vec<MergeConflict>), Error> {
        if target == source {
            return Err(Error::cannot_merge_into_self());
        }

        self.store.with_transaction(|tx| {
            let target_row = branches::get(tx, target)?.ok_or_else(|| Error::branch_not_found(target))?;
            let source_row = branches::get(tx, source)?.ok_or_else(|| Error::branch_not_found(source))?;

            let Some(source_head) = source_row.head_commit_id else {
                return Ok((true, Vec::new()));
            };

            let tgt_secrets: BTreeMap<String, (String, SecretType, Vec<String>)> = match target_row.head_commit_id {
                Some(head) => commits::list_for_commit(tx, head)?
                    .into_iter()
                    .map(|c| (c.path, (c.ciphertext, c.r#type, c.tags)))
                    .collect(),
                None => BTreeMap::new(),
            };
            let src_secrets: BTreeMap<String, (String, SecretType, Vec<String>)> =
                commits::list_for_commit(tx, source_head)?
                    .into_iter()
                    .map(|c| (c.path, (c.ciphertext, c.r#type, c.tags)))
                    .collect();

            let mut conflicts = Vec::new();
            for (path, (tgt_ct, _, _)) in &tgt_secrets {
                if let Some((src_ct, _, _)) = src_secrets.get(path) {
                    if src_ct != tgt_ct {
                        conflicts.push(MergeConflict {
                            path: path.clone(),
                            current_value: self.cipher.decrypt(tgt_ct)?,
                            incoming_value: self.cipher.decrypt(src_ct)?,
                        });
                    }
                }
            }
            if !conflicts.is_empty() {
                warn!(target, source, conflicts = conflicts.len(), "Merge blocked by conflicts");
                return Ok((false, conflicts));
            }

            let mut union = tgt_secrets;
            for (path, value) in src_secrets {
                union.insert(path, value);
            }

            secrets::delete_all(tx)?;
            let now_s = time::to_storage(time::now());
            for (path, (ciphertext, secret_type, tags)) in union {
                secrets::restore_current(tx, &path, &ciphertext, secret_type, &tags, &now_s)?;
            }
            debug!(target, source, "Merged branches");
            Ok((true, Vec::new()))
        })
    }
}

fn diff_sets(baseline: &BTreeMap<String, String>, working: &BTreeMap<String, String>) -> Status {
    let mut added = Vec::new();
    let mut modified = Vec::new();
    let mut deleted = Vec::new();

    for (path, working_ct) in working {
        match baseline.get(path) {
            None => added.push(path.clone()),
            Some(baseline_ct) if baseline_ct != working_ct => modified.push(path.clone()),
            _ => {}
        }
    }
    for path in baseline.keys() {
        if !working.contains_key(path) {
            deleted.push(path.clone());
        }
    }

    Status { added, modified, deleted }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cruxvault_crypto::Cipher;
    use cruxvault_storage::Store;

    fn engine() -> Engine {
        let store = Store::open_in_memory().unwrap();
        let cipher = Cipher::new(&[3u8; 32]).unwrap();
        Engine::new(store, cipher)
    }

    #[test]
    fn create_branch_rejects_duplicate_name() {
        let e = engine();
        e.create_branch("main", None).unwrap();
        let err = e.create_branch("main", None).unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn delete_branch_refuses_main() {
        let e = engine();
        e.create_branch("main", None).unwrap();
        assert!(e.delete_branch("main").unwrap_err().is_conflict());
    }

    #[test]
    fn commit_then_status_is_clean() {
        let e = engine();
        e.create_branch("main", None).unwrap();
        e.set_secret("a", "1", SecretType::Secret, vec![]).unwrap();
        e.commit("main", "c1", "tester").unwrap();
        assert!(e.get_status("main").unwrap().is_clean());
    }

    #[test]
    fn branch_commit_checkout_roundtrip() {
        let e = engine();
        e.create_branch("main", None).unwrap();
        e.set_secret("a", "1", SecretType::Secret, vec![]).unwrap();
        e.commit("main", "c1", "tester").unwrap();

        e.create_branch("feature", Some("main")).unwrap();
        e.checkout_branch("feature").unwrap();
        e.set_secret("a", "2", SecretType::Secret, vec![]).unwrap();
        e.commit("feature", "c2", "tester").unwrap();

        e.checkout_branch("main").unwrap();
        let a = e.get_secret("a").unwrap().unwrap();
        assert_eq!(a.value, "1");
        assert_eq!(a.version, 1);
    }

    #[test]
    fn merge_with_conflict_reports_without_mutating() {
        let e = engine();
        e.create_branch("main", None).unwrap();
        e.set_secret("a", "1", SecretType::Secret, vec![]).unwrap();
        e.commit("main", "c1", "tester").unwrap();

        e.create_branch("feature", Some("main")).unwrap();
        e.checkout_branch("feature").unwrap();
        e.set_secret("a", "2", SecretType::Secret, vec![]).unwrap();
        e.commit("feature", "c2", "tester").unwrap();

        e.checkout_branch("main").unwrap();
        e.set_secret("a", "3", SecretType::Secret, vec![]).unwrap();
        e.commit("main", "c3", "tester").unwrap();

        let (success, conflicts) = e.merge_branch("main", "feature").unwrap();
        assert!(!success);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].path, "a");
        assert_eq!(conflicts[0].current_value, "3");
        assert_eq!(conflicts[0].incoming_value, "2");

        // Unmutated: working set still reflects main's value.
        assert_eq!(e.get_secret("a").unwrap().unwrap().value, "3");
    }

    #[test]
    fn merge_without_conflict_is_union_and_idempotent() {
        let e = engine();
        e.create_branch("main", None).unwrap();
        e.set_secret("a", "1", SecretType::Secret, vec![]).unwrap();
        e.commit("main", "c1", "tester").unwrap();

        e.create_branch("feature", Some("main")).unwrap();
        e.checkout_branch("feature").unwrap();
        e.set_secret("b", "only-on-feature", SecretType::Secret, vec![]).unwrap();
        e.commit("feature", "c2", "tester").unwrap();

        e.checkout_branch("main").unwrap();
        let (success, conflicts) = e.merge_branch("main", "feature").unwrap();
        assert!(success);
        assert!(conflicts.is_empty());

        // union: "a" (target-only) and "b" (source-only) both present.
        assert_eq!(e.get_secret("a").unwrap().unwrap().value, "1");
        assert_eq!(e.get_secret("b").unwrap().unwrap().value, "only-on-feature");

        let (success_again, conflicts_again) = e.merge_branch("main", "feature").unwrap();
        assert!(success_again);
        assert!(conflicts_again.is_empty());
    }

    #[test]
    fn merge_into_self_rejected() {
        let e = engine();
        e.create_branch("main", None).unwrap();
        assert!(e.merge_branch("main", "main").unwrap_err().is_conflict());
    }

    #[test]
    fn create_then_delete_branch_leaves_list_unchanged() {
        let e = engine();
        e.create_branch("main", None).unwrap();
        let before = e.list_branches().unwrap();
        e.create_branch("scratch", None).unwrap();
        e.delete_branch("scratch").unwrap();
        let after = e.list_branches().unwrap();
        assert_eq!(before, after);
    }
}
