//! `pw-spatial`: which rule-governed lot does a world position belong to?
//!
//! # Crate layout
//!
//! | Module      | Contents                                               |
//! |-------------|--------------------------------------------------------|
//! | [`grid`]    | `CellKey`, `CELL_SIZE`, uniform grid hashing          |
//! | [`index`]   | `LotIndex`, `IndexStats`                               |
//!
//! Only buildings that carry a rule are indexed.  That set is small compared
//! to the city, so the index is rebuilt wholesale whenever the rule store
//! version moves instead of being patched incrementally.

pub mod grid;
pub mod index;


pub use grid::{CELL_SIZE, CellKey};
pub use index::{DEFAULT_SNAP_DISTANCE, IndexStats, LotIndex};
