//! The `ReevaluationScheduler` and its tick.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use pw_core::{
    BuildingId, CityHost, EngineSettings, ParkingRelocator, RelocationBackend, TickBudgets,
    VehicleId,
};
use pw_eval::{DecisionContext, PermissionEvaluator};
use pw_rules::RuleStore;

use crate::relocation::{RelocationOutcome, relocate};
use crate::{AuditCounters, AuditSummary, BuildingAudit, DeniedVehicle, StuckTracker, SweepCursor};

/// Episode source tag for permission checks made by the audit.
pub const SOURCE_AUDIT: &str = "parking_audit";

/// Episode source tag for relocation attempts.
pub const SOURCE_RELOCATION: &str = "parking_relocation";

// ── Public types ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// Nothing active, nothing pending.
    Idle,
    /// Buildings are queued but none has been activated yet.
    Pending,
    /// Auditing this building.
    BuildingActive(BuildingId),
    /// Terminal; every call is a no-op.
    Disposed,
}

/// What the caller should do after a tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Work remains; run another tick.
    Reschedule,
    /// Nothing left to do.
    Idle,
    Disposed,
}

/// Work done by one tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub outcome:   TickOutcome,
    /// Building audited this tick, if any.
    pub building:  Option<BuildingId>,
    /// Parked vehicles taken off the evaluation cursor.
    pub evaluated: u32,
    /// Stuck vehicles force-finalized.
    pub finalized: u32,
    /// Denied vehicles taken off the relocation queue.
    pub relocated: u32,
    /// Summary of the building whose audit completed this tick.
    pub finished:  Option<AuditSummary>,
}

impl TickReport {
    /// A report of no work done.
    pub fn empty(outcome: TickOutcome) -> Self {
        Self {
            outcome,
            building:  None,
            evaluated: 0,
            finalized: 0,
            relocated: 0,
            finished:  None,
        }
    }
}

/// Cumulative scheduler statistics since creation or the last reset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchedulerTotals {
    /// Ticks that did work.
    pub ticks:             u64,
    pub buildings_audited: u64,
    pub counters:          AuditCounters,
}

/// Everything a tick borrows from its owner for the duration of the call.
pub struct TickEnv<'a, H: CityHost + ?Sized> {
    pub host:      &'a mut H,
    pub rules:     &'a RuleStore,
    pub context:   &'a DecisionContext,
    pub relocator: &'a mut dyn ParkingRelocator,
}

// ── ReevaluationScheduler ─────────────────────────────────────────────────────

/// Budgeted background audit of parked vehicles.
///
/// One building is active at a time.  Further requests wait in a FIFO,
/// de-duplicated against both the queue and the active building.
///
/// # Gating
///
/// The owner enables the scheduler only while the engine is active and
/// enforcement is not disabled.  Disabling drops every queue, the active
/// audit and stuck-vehicle memory at once.
#[derive(Debug)]
pub struct ReevaluationScheduler {
    budgets:   TickBudgets,
    fix_stuck: bool,
    backend:   RelocationBackend,
    enabled:   bool,
    disposed:  bool,

    pending: VecDeque<BuildingId>,
    queued:  FxHashSet<BuildingId>,
    active:  Option<BuildingAudit>,

    sweep:  SweepCursor,
    stuck:  StuckTracker,
    totals: SchedulerTotals,
}

impl ReevaluationScheduler {
    /// Create a disabled scheduler configured from `settings`.
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            budgets:   settings.budgets.clone(),
            fix_stuck: settings.fix_stuck_vehicles,
            backend:   settings.relocation_backend,
            enabled:   false,
            disposed:  false,
            pending:   VecDeque::new(),
            queued:    FxHashSet::default(),
            active:    None,
            sweep:     SweepCursor::new(),
            stuck:     StuckTracker::new(),
            totals:    SchedulerTotals::default(),
        }
    }

    /// Pick up new budgets, stuck-fix flag and backend.  Work in progress is
    /// kept and continues under the new limits.
    pub fn configure(&mut self, settings: &EngineSettings) {
        self.budgets = settings.budgets.clone();
        self.fix_stuck = settings.fix_stuck_vehicles;
        self.backend = settings.relocation_backend;
    }

    /// Enable or disable.  Disabling performs a full reset.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.disposed {
            return;
        }
        if !enabled {
            self.reset();
        }
        self.enabled = enabled;
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn state(&self) -> SchedulerState {
        if self.disposed {
            SchedulerState::Disposed
        } else if let Some(audit) = &self.active {
            SchedulerState::BuildingActive(audit.building)
        } else if !self.pending.is_empty() {
            SchedulerState::Pending
        } else {
            SchedulerState::Idle
        }
    }

    /// `true` if another tick would do something.
    pub fn has_work(&self) -> bool {
        self.enabled && !self.disposed && (self.active.is_some() || !self.pending.is_empty())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// `true` if `building` is pending or being audited.
    pub fn is_queued(&self, building: BuildingId) -> bool {
        self.queued.contains(&building)
            || self.active.as_ref().is_some_and(|a| a.building == building)
    }

    pub fn active(&self) -> Option<&BuildingAudit> {
        self.active.as_ref()
    }

    pub fn totals(&self) -> &SchedulerTotals {
        &self.totals
    }

    pub fn stuck(&self) -> &StuckTracker {
        &self.stuck
    }

    pub fn sweep(&self) -> &SweepCursor {
        &self.sweep
    }

    pub fn budgets(&self) -> &TickBudgets {
        &self.budgets
    }

    // ── Triggers ──────────────────────────────────────────────────────────

    /// Queue `building` for audit.
    ///
    /// Returns `true` if it was newly queued.  A building that has a rule
    /// but is no longer a live, supported lot loses its rule instead.
    pub fn request_for_building<H: CityHost + ?Sized>(
        &mut self,
        host:     &H,
        rules:    &mut RuleStore,
        building: BuildingId,
    ) -> bool {
        if self.disposed || !self.enabled || !building.is_valid() {
            return false;
        }
        if !rules.contains(building) {
            return false;
        }
        if !host.building_exists(building) || !host.is_supported_lot(building) {
            rules.remove(building);
            tracing::debug!(
                building = %building,
                "parking rule removed from building that is no longer a supported lot"
            );
            return false;
        }
        if self.is_queued(building) {
            return false;
        }
        self.pending.push_back(building);
        self.queued.insert(building);
        true
    }

    /// Queue the next building of the full-city sweep.
    ///
    /// Buildings the scope check rejects are skipped.  Returns `false` when
    /// the pass is complete (until the next day change or `reset_sweep`) or
    /// nothing could be queued.
    pub fn request_next_scheduled_building<H: CityHost + ?Sized>(
        &mut self,
        host:        &H,
        rules:       &mut RuleStore,
        reset_sweep: bool,
    ) -> bool {
        if self.disposed || !self.enabled {
            return false;
        }
        let limit = rules.len() + 1;
        let mut reset = reset_sweep;
        for _ in 0..limit {
            let Some(building) = self.sweep.next(rules, reset) else {
                return false;
            };
            reset = false;
            if self.request_for_building(host, rules, building) {
                return true;
            }
        }
        false
    }

    /// Rotate stuck-vehicle generations and let the sweep start a new pass
    /// once the current one completes.
    pub fn notify_day_changed(&mut self) {
        if self.disposed {
            return;
        }
        self.stuck.rotate();
        self.sweep.request_restart();
        tracing::debug!(
            stuck_candidates = self.stuck.seen_yesterday(),
            "parking audit day boundary"
        );
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Do one bounded slice of audit work.
    pub fn run_tick<H: CityHost + ?Sized>(&mut self, env: TickEnv<'_, H>) -> TickReport {
        let TickEnv { host, rules, context, relocator } = env;

        if self.disposed {
            return TickReport::empty(TickOutcome::Disposed);
        }
        if !self.enabled {
            self.reset();
            return TickReport::empty(TickOutcome::Idle);
        }

        if self.active.is_none() && !self.activate_next(&*host, rules) {
            return TickReport::empty(TickOutcome::Idle);
        }
        let Some(mut audit) = self.active.take() else {
            return TickReport::empty(TickOutcome::Idle);
        };

        self.totals.ticks += 1;
        audit.ticks += 1;
        let mut report = TickReport::empty(TickOutcome::Idle);
        report.building = Some(audit.building);

        self.evaluation_phase(&mut audit, &mut *host, rules, context, &mut report);
        self.relocation_phase(&mut audit, host, context, relocator, &mut report);

        if audit.is_complete() {
            report.finished = Some(self.finish(audit));
        } else {
            self.active = Some(audit);
        }

        report.outcome = if self.active.is_some() || !self.pending.is_empty() {
            TickOutcome::Reschedule
        } else {
            TickOutcome::Idle
        };
        report
    }

    /// Drop all queues, the active audit, stuck memory, sweep progress and
    /// totals.
    pub fn reset(&mut self) {
        let dropped = self.pending.len() + usize::from(self.active.is_some());
        self.pending.clear();
        self.queued.clear();
        self.active = None;
        self.stuck.clear();
        self.sweep.reset();
        self.totals = SchedulerTotals::default();
        if dropped > 0 {
            tracing::info!(dropped, "parking audit reset");
        }
    }

    /// Reset and refuse all further work.
    pub fn dispose(&mut self) {
        self.reset();
        self.enabled = false;
        self.disposed = true;
    }

    // ── Phases ────────────────────────────────────────────────────────────

    fn activate_next<H: CityHost + ?Sized>(&mut self, host: &H, rules: &RuleStore) -> bool {
        while let Some(building) = self.pending.pop_front() {
            self.queued.remove(&building);
            if !rules.contains(building) {
                // rule removed while waiting
                continue;
            }
            let audit = BuildingAudit::start(host, building);
            tracing::debug!(
                building = %building,
                parked = audit.parked.len(),
                pending = self.pending.len(),
                "parking audit started"
            );
            self.active = Some(audit);
            return true;
        }
        false
    }

    fn evaluation_phase<H: CityHost + ?Sized>(
        &mut self,
        audit:   &mut BuildingAudit,
        host:    &mut H,
        rules:   &RuleStore,
        context: &DecisionContext,
        report:  &mut TickReport,
    ) {
        let evaluator = PermissionEvaluator::new(rules, context, true);
        let max_evaluations = self.budgets.max_evaluations_per_tick;
        let max_finalizations = self.budgets.max_finalizations_per_tick;

        while report.evaluated < max_evaluations && audit.cursor < audit.parked.len() {
            let parked = audit.parked[audit.cursor];
            audit.cursor += 1;
            report.evaluated += 1;

            let Some(info) = host.parked_vehicle(parked) else {
                audit.counters.stale += 1;
                continue;
            };
            if !info.owner.is_valid() {
                audit.counters.stale += 1;
                continue;
            }

            // `observe` must run for every candidate so today's generation
            // is complete, even when the finalization budget is spent.
            if self.fix_stuck
                && info.stuck_candidate
                && self.stuck.observe(parked, info.owner)
                && report.finalized < max_finalizations
            {
                report.finalized += 1;
                if host.finalize_stuck_vehicle(parked) {
                    audit.counters.fixed += 1;
                }
                self.stuck.forget(parked);
                tracing::debug!(
                    building = %audit.building,
                    parked = %parked,
                    owner = %info.owner,
                    "stuck parked vehicle finalized"
                );
                continue;
            }

            let _episode = context.scope(VehicleId::INVALID, info.owner, SOURCE_AUDIT);
            let decision = evaluator.evaluate_citizen(&*host, info.owner, audit.building);
            audit.counters.evaluated += 1;

            if decision.allowed {
                audit.counters.allowed += 1;
            } else {
                audit.counters.denied += 1;
                let home = host.citizen(info.owner).map_or(BuildingId::INVALID, |c| c.home);
                audit.denied.push_back(DeniedVehicle {
                    parked,
                    owner: info.owner,
                    home,
                    position: info.position,
                });
            }
        }
    }

    fn relocation_phase<H: CityHost + ?Sized>(
        &mut self,
        audit:     &mut BuildingAudit,
        host:      &mut H,
        context:   &DecisionContext,
        relocator: &mut dyn ParkingRelocator,
        report:    &mut TickReport,
    ) {
        while report.relocated < self.budgets.max_relocations_per_tick {
            let Some(denied) = audit.denied.pop_front() else {
                break;
            };
            report.relocated += 1;

            // Skip if the vehicle vanished or changed hands since it was queued.
            let current = host.parked_vehicle(denied.parked).filter(|c| c.owner == denied.owner);
            let Some(current) = current else {
                audit.counters.stale += 1;
                continue;
            };

            let _episode = context.scope(VehicleId::INVALID, denied.owner, SOURCE_RELOCATION);
            match relocate(host, relocator, self.backend, &denied, current.position) {
                RelocationOutcome::Moved(backend) => {
                    audit.counters.moved += 1;
                    tracing::debug!(
                        building = %audit.building,
                        parked = %denied.parked,
                        %backend,
                        "denied parked vehicle relocated"
                    );
                }
                RelocationOutcome::Released => {
                    audit.counters.released += 1;
                    tracing::debug!(
                        building = %audit.building,
                        parked = %denied.parked,
                        "denied parked vehicle released"
                    );
                }
            }
        }
    }

    fn finish(&mut self, audit: BuildingAudit) -> AuditSummary {
        let summary = audit.summary();
        self.totals.buildings_audited += 1;
        self.totals.counters.add(&summary.counters);

        let c = &summary.counters;
        if c.acted() {
            tracing::info!(
                building = %summary.building,
                parked = summary.parked,
                evaluated = c.evaluated,
                denied = c.denied,
                moved = c.moved,
                released = c.released,
                fixed = c.fixed,
                ticks = summary.ticks,
                "parking audit finished"
            );
        } else {
            tracing::debug!(
                building = %summary.building,
                parked = summary.parked,
                evaluated = c.evaluated,
                stale = c.stale,
                ticks = summary.ticks,
                "parking audit finished"
            );
        }
        summary
    }
}
