//! `pw-eval`: "may this actor park here?"
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`decision`]   | `Decision`, `ReasonCode`                                  |
//! | [`actor`]      | `ActorContext`, home/work/visitor facts resolved per call |
//! | [`context`]    | `DecisionContext`, `EpisodeGuard`, `Frame`, `EpisodeStats` |
//! | [`evaluator`]  | `PermissionEvaluator`, `apply_rule`                        |
//!
//! # Fail-open vs fail-closed
//!
//! An enforcement gap must never stall traffic, so anything wrong on the
//! engine's or the lot's side (engine inactive, no rule, lot position
//! unknown, wrong thread) allows parking.  An actor the host cannot identify
//! is refused, because entitlement needs an identity to attach to.

pub mod actor;
pub mod context;
pub mod decision;
pub mod evaluator;

#[cfg(test)]
mod tests;

pub use actor::ActorContext;
pub use context::{DecisionContext, EpisodeGuard, EpisodeStats, EpisodeSummary, Frame};
pub use decision::{Decision, ReasonCode};
pub use evaluator::{PermissionEvaluator, apply_rule};
