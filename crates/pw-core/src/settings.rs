//! Engine settings.
//!
//! # Design
//!
//! The host owns persistence and UI for these values; the engine only reads
//! them.  Every field has a default so a partial TOML document (or none at
//! all) yields a usable configuration:
//!
//! ```toml
//! fix_stuck_vehicles = true
//! relocation_backend = "path_aware"
//!
//! [budgets]
//! max_evaluations_per_tick = 64
//! ```
//!
//! The per-tick budgets are the central cost bound of the audit scheduler:
//! no tick performs more host interaction than they allow, however large
//! the backlog.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

// ── TickBudgets ───────────────────────────────────────────────────────────────

/// Upper bounds on the work the audit scheduler performs in a single tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickBudgets {
    /// Parked vehicles evaluated per tick.  Default: 128.
    pub max_evaluations_per_tick: u32,

    /// Denied vehicles relocated or evicted per tick.  Default: 8.
    pub max_relocations_per_tick: u32,

    /// Stuck vehicles force-finalized per tick.  Default: 4.
    pub max_finalizations_per_tick: u32,
}

impl Default for TickBudgets {
    fn default() -> Self {
        Self {
            max_evaluations_per_tick:   128,
            max_relocations_per_tick:   8,
            max_finalizations_per_tick: 4,
        }
    }
}

// ── RelocationBackend ─────────────────────────────────────────────────────────

/// Which strategy moves a vehicle that may no longer stay on its lot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelocationBackend {
    /// Ask the host to re-park the vehicle in place through its own vehicle
    /// update machinery.
    #[default]
    DirectNudge,
    /// Hand the vehicle to an external path-aware relocator, if one is
    /// installed.  Falls back to `DirectNudge` when it is not.
    PathAware,
}

impl RelocationBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            RelocationBackend::DirectNudge => "direct_nudge",
            RelocationBackend::PathAware   => "path_aware",
        }
    }
}

impl std::fmt::Display for RelocationBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── EngineSettings ────────────────────────────────────────────────────────────

/// Read-only engine configuration supplied by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// When `true` the audit scheduler refuses all work and drops its queues.
    /// Live permission checks are unaffected.
    pub enforcement_disabled: bool,

    /// Force-finalize vehicles that stay stuck mid-parking for two days.
    pub fix_stuck_vehicles: bool,

    /// Active relocation strategy for denied parked vehicles.
    pub relocation_backend: RelocationBackend,

    /// Per-tick work limits for the audit scheduler.
    pub budgets: TickBudgets,

    /// Maximum distance (metres) between a query point and a parking space
    /// for the lot index to attribute the point to that lot.  Default: 8.
    pub snap_distance: f32,

    /// Episodes with at least this many candidate checks log a summary.
    pub summary_min_checks: u32,

    /// Episodes running at least this long log a summary.
    pub summary_slow_episode_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            enforcement_disabled:    false,
            fix_stuck_vehicles:      true,
            relocation_backend:      RelocationBackend::DirectNudge,
            budgets:                 TickBudgets::default(),
            snap_distance:           8.0,
            summary_min_checks:      16,
            summary_slow_episode_ms: 5,
        }
    }
}

impl EngineSettings {
    /// Parse and validate settings from a TOML document.
    pub fn from_toml_str(src: &str) -> CoreResult<Self> {
        let settings: EngineSettings = toml::from_str(src)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject configurations that would stall the scheduler or make the lot
    /// index unusable.
    pub fn validate(&self) -> CoreResult<()> {
        let b = &self.budgets;
        if b.max_evaluations_per_tick == 0 {
            return Err(CoreError::Config("max_evaluations_per_tick must be at least 1".into()));
        }
        if b.max_relocations_per_tick == 0 {
            return Err(CoreError::Config("max_relocations_per_tick must be at least 1".into()));
        }
        if !(self.snap_distance.is_finite() && self.snap_distance > 0.0) {
            return Err(CoreError::Config(format!(
                "snap_distance must be a positive number, got {}",
                self.snap_distance
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn summary_slow_episode(&self) -> Duration {
        Duration::from_millis(self.summary_slow_episode_ms)
    }
}
