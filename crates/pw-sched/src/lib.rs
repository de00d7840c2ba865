//! `pw-sched`: incremental re-evaluation of parked vehicles.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`audit`]       | `BuildingAudit`, `DeniedVehicle`, `AuditCounters`, `AuditSummary` |
//! | [`stuck`]       | `StuckTracker`, two-generation stuck-vehicle memory      |
//! | [`sweep`]       | `SweepCursor`, full-city pass over ruled buildings       |
//! | [`relocation`]  | backend selection for denied vehicles                     |
//! | [`scheduler`]   | `ReevaluationScheduler`, `TickEnv`, `TickReport`          |
//!
//! # Tick model (summary)
//!
//! ```text
//! tick:
//!   ① no active building?  pull next pending lot, collect its parked list
//!   ② evaluate ≤ max_evaluations_per_tick parked vehicles from the cursor
//!        stuck two days running → finalize (≤ max_finalizations_per_tick)
//!        denied                 → denied FIFO
//!   ③ relocate ≤ max_relocations_per_tick denied vehicles, evict on failure
//!   ④ cursor at end and FIFO empty → building finished
//!   reschedule while anything is active or pending, else idle
//! ```
//!
//! The scheduler never loops to drain a backlog.  It does a bounded slice of
//! work and asks to be called again.

pub mod audit;
pub mod relocation;
pub mod scheduler;
pub mod stuck;
pub mod sweep;


pub use audit::{AuditCounters, AuditSummary, BuildingAudit, DeniedVehicle, MAX_LOT_TRAVERSAL};
pub use relocation::RelocationOutcome;
pub use scheduler::{
    ReevaluationScheduler, SchedulerState, SchedulerTotals, TickEnv, TickOutcome, TickReport,
};
pub use stuck::StuckTracker;
pub use sweep::SweepCursor;
