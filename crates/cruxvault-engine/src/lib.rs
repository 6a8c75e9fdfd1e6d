//! The Working Store and Version-Control Engine.
//!
//! [`Engine`] is the single type this crate exports: it owns the
//! cipher and the backing store, and its methods — split across
//! `working_store` (set/get/list/delete/history/rollback), `vce`
//! (branches/commits/status/diff/checkout/reset/merge), and `audit`
//! (bridging the facade's audit entries into the indexed `audit_log`
//! table) — implement every operation layered on top of
//! `cruxvault-storage` and `cruxvault-crypto`.

mod audit;
mod engine;
mod time;
mod vce;
mod working_store;

pub use engine::Engine;
