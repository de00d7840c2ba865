//! Per-building audit working set.

use std::collections::VecDeque;

use pw_core::{BuildingId, CitizenId, CityHost, ParkedVehicleId, Position};

/// Hard cap on a walk of a lot's parked-vehicle list.  The parked-vehicle
/// pool has `u16` ids, so a longer walk means the host list has a cycle.
pub const MAX_LOT_TRAVERSAL: usize = u16::MAX as usize + 1;

/// A parked vehicle the evaluator turned away, waiting for relocation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DeniedVehicle {
    pub parked:   ParkedVehicleId,
    pub owner:    CitizenId,
    pub home:     BuildingId,
    pub position: Position,
}

/// What happened to a building's parked vehicles during one audit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AuditCounters {
    /// Permission checks run.
    pub evaluated: u32,
    pub allowed:   u32,
    pub denied:    u32,
    /// Denied vehicles re-parked elsewhere.
    pub moved:     u32,
    /// Denied vehicles evicted after relocation failed.
    pub released:  u32,
    /// Stuck vehicles force-finalized.
    pub fixed:     u32,
    /// Entries skipped because the host no longer agreed with what was
    /// collected or queued.
    pub stale:     u32,
}

impl AuditCounters {
    pub fn add(&mut self, other: &AuditCounters) {
        self.evaluated = self.evaluated.saturating_add(other.evaluated);
        self.allowed   = self.allowed.saturating_add(other.allowed);
        self.denied    = self.denied.saturating_add(other.denied);
        self.moved     = self.moved.saturating_add(other.moved);
        self.released  = self.released.saturating_add(other.released);
        self.fixed     = self.fixed.saturating_add(other.fixed);
        self.stale     = self.stale.saturating_add(other.stale);
    }

    /// `true` if the audit changed anything in the city.
    pub fn acted(&self) -> bool {
        self.moved + self.released + self.fixed > 0
    }
}

/// Result of a completed building audit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AuditSummary {
    pub building: BuildingId,
    pub counters: AuditCounters,
    /// Parked vehicles collected when the audit started.
    pub parked:   usize,
    /// Ticks the audit was active for.
    pub ticks:    u32,
    /// `true` if the parked list hit [`MAX_LOT_TRAVERSAL`].
    pub truncated: bool,
}

/// Working set of the building currently being audited.
#[derive(Debug)]
pub struct BuildingAudit {
    pub building:  BuildingId,
    /// Parked vehicles collected at activation, in host list order.
    pub parked:    Vec<ParkedVehicleId>,
    /// Index of the next vehicle to evaluate.
    pub cursor:    usize,
    pub denied:    VecDeque<DeniedVehicle>,
    pub counters:  AuditCounters,
    pub ticks:     u32,
    pub truncated: bool,
}

impl BuildingAudit {
    /// Start an audit of `building`, collecting its parked vehicles fresh
    /// from the host.
    pub fn start<H: CityHost + ?Sized>(host: &H, building: BuildingId) -> Self {
        let (parked, truncated) = collect_parked(host, building);
        Self {
            building,
            parked,
            cursor: 0,
            denied: VecDeque::new(),
            counters: AuditCounters::default(),
            ticks: 0,
            truncated,
        }
    }

    /// Vehicles not yet evaluated.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.parked.len() - self.cursor
    }

    /// Evaluation cursor at the end and nothing left to relocate.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.cursor >= self.parked.len() && self.denied.is_empty()
    }

    pub fn summary(&self) -> AuditSummary {
        AuditSummary {
            building:  self.building,
            counters:  self.counters,
            parked:    self.parked.len(),
            ticks:     self.ticks,
            truncated: self.truncated,
        }
    }
}

/// Walk the lot's parked-vehicle list, stopping at [`MAX_LOT_TRAVERSAL`].
fn collect_parked<H: CityHost + ?Sized>(
    host:     &H,
    building: BuildingId,
) -> (Vec<ParkedVehicleId>, bool) {
    let mut parked = Vec::new();
    let mut next = host.first_parked_vehicle(building);

    while let Some(id) = next {
        if !id.is_valid() {
            break;
        }
        if parked.len() >= MAX_LOT_TRAVERSAL {
            tracing::error!(
                building = %building,
                cap = MAX_LOT_TRAVERSAL,
                "parked vehicle list exceeds traversal cap; list is probably corrupt"
            );
            return (parked, true);
        }
        parked.push(id);
        next = host.next_parked_vehicle(id);
    }
    (parked, false)
}
