//! Transactional relational persistence for Crux Vault.
//!
//! Five tables, one per entity in the data model, behind a single
//! SQLite connection. This crate knows nothing about encryption or
//! version-control semantics — it stores and retrieves ciphertext
//! bytes and row metadata exactly as handed to it. `cruxvault-engine`
//! composes these row-level operations, inside one [`Store::with_transaction`]
//! call per public operation, into `set_secret`, `commit`, `merge_branch`,
//! and the rest.

pub mod audit;
pub mod branches;
pub mod commits;
pub mod rows;
pub mod schema;
pub mod secrets;
mod store;

pub use store::Store;
