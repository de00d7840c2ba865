//! `pw-engine`: the parking policy engine facade.
//!
//! # What the host does
//!
//! ```text
//! build once:    EngineBuilder::new().settings(s).relocator(r).dispatcher(d).build()?
//! edit rules:    engine.set_rule(lot, rule)?; engine.request_for_building(&city, lot)
//! parking search:
//!   let _episode = engine.begin_episode(vehicle, driver, "find_parking");
//!   lot      = engine.find_building(&city, space_position)
//!   decision = engine.evaluate_vehicle(&city, vehicle, lot)
//! every tick the dispatcher asks for:
//!   engine.run_tick(&mut city)
//! each new day:  engine.notify_day_changed(); engine.request_next_scheduled_building(&city, false)
//! unload:        engine.dispose()
//! ```
//!
//! All of it happens on one simulation thread.  See
//! [`ParkingPolicyEngine`] for what happens on any other.

pub mod builder;
pub mod engine;
pub mod error;
pub mod observer;


pub use builder::EngineBuilder;
pub use engine::{EngineStatus, ParkingPolicyEngine};
pub use error::{EngineError, EngineResult};
pub use observer::{AuditObserver, NoopAuditObserver};

// Types that appear in this crate's API.
pub use pw_eval::{Decision, EpisodeGuard, EpisodeSummary, Frame, ReasonCode};
pub use pw_sched::{
    AuditCounters, AuditSummary, SchedulerState, SchedulerTotals, TickOutcome, TickReport,
};
