//! `pw-rules`: per-building parking rules and the versioned rule store.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                 |
//! |------------|----------------------------------------------------------|
//! | [`rule`]   | `Rule`, radius limits and sentinels                      |
//! | [`store`]  | `RuleStore`, `BuildingId → Rule` plus a version counter |
//! | [`error`]  | `RuleError`, `RuleResult<T>`                             |
//!
//! # Versioning
//!
//! Every insert, replace or remove bumps `RuleStore::version`.  Derived
//! structures (the lot index, the scheduler's sweep list) stamp the version
//! they were built from and rebuild when it no longer matches.

pub mod error;
pub mod rule;
pub mod store;

#[cfg(test)]
mod tests;

pub use error::{RuleError, RuleResult};
pub use rule::{MAX_RADIUS_M, MIN_RADIUS_M, Rule, UNLIMITED_RADIUS_M};
pub use store::RuleStore;
