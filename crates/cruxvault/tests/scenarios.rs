//! End-to-end scenarios exercising `CruxVault` the way an embedding
//! application would, rather than any one module in isolation.

use cruxvault::{CruxVault, VaultOptions};
use cruxvault_core::types::SecretType;

fn open_vault(dir: &std::path::Path) -> CruxVault {
    CruxVault::open(
        VaultOptions::new(dir.join("vault.db"), dir.join("audit.jsonl")).with_log_reads(),
        &[9u8; 32],
    )
    .unwrap()
}

/// S1 — round-trip.
#[test]
fn s1_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open_vault(dir.path());

    vault
        .set_secret("db/password", "p@ss", SecretType::Secret, vec![])
        .unwrap();
    let got = vault.get_secret("db/password").unwrap().unwrap();
    assert_eq!(got.value, "p@ss");
    assert_eq!(got.version, 1);
}

/// S2 — history.
#[test]
fn s2_history() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open_vault(dir.path());

    vault.set_secret("api/key", "v1", SecretType::Secret, vec![]).unwrap();
    vault.set_secret("api/key", "v2", SecretType::Secret, vec![]).unwrap();
    vault.set_secret("api/key", "v3", SecretType::Secret, vec![]).unwrap();

    let history = vault.get_history("api/key").unwrap();
    let versions: Vec<i64> = history.iter().map(|v| v.version).collect();
    let values: Vec<&str> = history.iter().map(|v| v.value.as_str()).collect();
    assert_eq!(versions, vec![3, 2, 1]);
    assert_eq!(values, vec!["v3", "v2", "v1"]);
}

/// S3 — rollback, continuing S2.
#[test]
fn s3_rollback() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open_vault(dir.path());

    vault.set_secret("api/key", "v1", SecretType::Secret, vec![]).unwrap();
    vault.set_secret("api/key", "v2", SecretType::Secret, vec![]).unwrap();
    vault.set_secret("api/key", "v3", SecretType::Secret, vec![]).unwrap();

    let rolled = vault.rollback("api/key", 1).unwrap();
    assert_eq!(rolled.value, "v1");
    assert_eq!(rolled.version, 4);
}

/// S4 — encryption at rest: the raw stored ciphertext must never equal
/// the plaintext that went in.
#[test]
fn s4_encryption_at_rest() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open_vault(dir.path());

    vault
        .set_secret("secret/x", "plaintext-value", SecretType::Secret, vec![])
        .unwrap();

    let conn = rusqlite::Connection::open(dir.path().join("vault.db")).unwrap();
    let ciphertext: String = conn
        .query_row(
            "SELECT ciphertext FROM secrets WHERE path = ?1",
            ["secret/x"],
            |row| row.get(0),
        )
        .unwrap();
    assert_ne!(ciphertext, "plaintext-value");
}

/// S5 — branch/commit/checkout.
#[test]
fn s5_branch_commit_checkout() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open_vault(dir.path());

    vault.create_branch("main", None).unwrap();
    vault.set_secret("a", "1", SecretType::Secret, vec![]).unwrap();
    vault.commit("main", "c1", "tester").unwrap();

    vault.create_branch("feature", Some("main")).unwrap();
    vault.checkout_branch("feature").unwrap();
    vault.set_secret("a", "2", SecretType::Secret, vec![]).unwrap();
    vault.commit("feature", "c2", "tester").unwrap();

    vault.checkout_branch("main").unwrap();
    assert_eq!(vault.get_secret("a").unwrap().unwrap().value, "1");
}

/// S6 — merge conflict, continuing S5.
#[test]
fn s6_merge_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open_vault(dir.path());

    vault.create_branch("main", None).unwrap();
    vault.set_secret("a", "1", SecretType::Secret, vec![]).unwrap();
    vault.commit("main", "c1", "tester").unwrap();

    vault.create_branch("feature", Some("main")).unwrap();
    vault.checkout_branch("feature").unwrap();
    vault.set_secret("a", "2", SecretType::Secret, vec![]).unwrap();
    vault.commit("feature", "c2", "tester").unwrap();

    vault.checkout_branch("main").unwrap();
    vault.set_secret("a", "3", SecretType::Secret, vec![]).unwrap();
    vault.commit("main", "c3", "tester").unwrap();

    let (success, conflicts) = vault.merge_branch("main", "feature").unwrap();
    assert!(!success);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].path, "a");
    assert_eq!(conflicts[0].current_value, "3");
    assert_eq!(conflicts[0].incoming_value, "2");
}

/// Invariant 6: delete leaves both the current row and history empty.
#[test]
fn delete_clears_current_and_history() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open_vault(dir.path());

    vault.set_secret("x", "1", SecretType::Secret, vec![]).unwrap();
    vault.set_secret("x", "2", SecretType::Secret, vec![]).unwrap();
    assert!(vault.delete_secret("x").unwrap());
    assert!(vault.get_secret("x").unwrap().is_none());
    assert!(vault.get_history("x").unwrap().is_empty());
}

/// Invariant 8: a clean commit leaves `get_status` all-empty.
#[test]
fn commit_leaves_status_clean() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open_vault(dir.path());

    vault.create_branch("main", None).unwrap();
    vault.set_secret("a", "1", SecretType::Secret, vec![]).unwrap();
    vault.commit("main", "c1", "tester").unwrap();

    let status = vault.get_status("main").unwrap();
    assert!(status.is_clean());
}

/// Invariant 10: a conflict-free merge is idempotent immediately after.
#[test]
fn conflict_free_merge_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open_vault(dir.path());

    vault.create_branch("main", None).unwrap();
    vault.set_secret("a", "1", SecretType::Secret, vec![]).unwrap();
    vault.commit("main", "c1", "tester").unwrap();

    vault.create_branch("feature", Some("main")).unwrap();
    vault.checkout_branch("feature").unwrap();
    vault.set_secret("b", "2", SecretType::Secret, vec![]).unwrap();
    vault.commit("feature", "c2", "tester").unwrap();

    vault.checkout_branch("main").unwrap();
    let first = vault.merge_branch("main", "feature").unwrap();
    let second = vault.merge_branch("main", "feature").unwrap();
    assert_eq!(first, second);
}

/// Invariant 11: create then delete of a non-main branch is a no-op
/// on the branch list.
#[test]
fn create_then_delete_branch_leaves_list_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open_vault(dir.path());

    vault.create_branch("main", None).unwrap();
    let before = vault.list_branches().unwrap();
    vault.create_branch("scratch", None).unwrap();
    vault.delete_branch("scratch").unwrap();
    let after = vault.list_branches().unwrap();
    assert_eq!(before, after);
}

/// The audit log records mutations once `log_reads` is off by default,
/// and both reads and writes once it's turned on via `with_log_reads`.
#[test]
fn audit_log_records_actions() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open_vault(dir.path());

    vault.set_secret("a", "1", SecretType::Secret, vec![]).unwrap();
    vault.get_secret("a").unwrap();

    let entries = vault.recent_audit_entries(10).unwrap();
    let actions: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
    assert!(actions.contains(&"set"));
    assert!(actions.contains(&"get"));
}

/// Invalid input is rejected before it reaches the engine.
#[test]
fn rejects_invalid_path() {
    let dir = tempfile::tempdir().unwrap();
    let vault = open_vault(dir.path());
    let err = vault
        .set_secret("", "value", SecretType::Secret, vec![])
        .unwrap_err();
    assert!(matches!(err, cruxvault::Error::InvalidInput(_)));
}
