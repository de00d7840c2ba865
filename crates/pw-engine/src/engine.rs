//! The `ParkingPolicyEngine` facade.

use std::cell::RefCell;

use pw_core::{
    BuildingId, CitizenId, CityHost, EngineSettings, ParkingRelocator, Position,
    RelocationBackend, ThreadAffinity, TickDispatcher, VehicleId,
};
use pw_eval::{
    Decision, DecisionContext, EpisodeGuard, EpisodeSummary, Frame, PermissionEvaluator,
    ReasonCode,
};
use pw_rules::{Rule, RuleStore};
use pw_sched::{
    ReevaluationScheduler, SchedulerState, SchedulerTotals, TickEnv, TickOutcome, TickReport,
    relocation::effective_backend,
};
use pw_spatial::{IndexStats, LotIndex};

use crate::{AuditObserver, EngineError, EngineResult, NoopAuditObserver};

// ── EngineStatus ──────────────────────────────────────────────────────────────

/// Point-in-time snapshot for diagnostics panels and logs.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineStatus {
    pub active:               bool,
    pub enforcement_disabled: bool,
    pub disposed:             bool,
    pub rules:                usize,
    pub rules_version:        u64,
    pub index:                IndexStats,
    pub scheduler:            SchedulerState,
    pub pending:              usize,
    pub context_depth:        usize,
    pub totals:               SchedulerTotals,
    /// Backend the next relocation would use.
    pub backend:              RelocationBackend,
}

// ── ParkingPolicyEngine ───────────────────────────────────────────────────────

/// The parking policy engine.
///
/// Owns the rule store, lot index, decision context and audit scheduler, and
/// is confined to one simulation thread.  Every public method checks the
/// caller's thread first; calls from any other thread are refused with a
/// fail-open or no-op result and a one-time warning per method.
///
/// The host is never stored.  Methods that need city data take a
/// [`CityHost`] by reference, so the host keeps full ownership of its pools
/// between calls.
///
/// # Lifecycle
///
/// ```text
/// EngineBuilder::build()
///   → set_rule / request_for_building / evaluate_* …   (simulation thread)
///   → run_tick whenever the TickDispatcher asks
///   → dispose()                                        (terminal)
/// ```
///
/// Create via [`EngineBuilder`][crate::EngineBuilder].
pub struct ParkingPolicyEngine {
    settings:  EngineSettings,
    rules:     RuleStore,
    /// Rebuilt lazily from `&self` lookups.
    index:     RefCell<LotIndex>,
    context:   DecisionContext,
    scheduler: ReevaluationScheduler,

    relocator:  Box<dyn ParkingRelocator>,
    dispatcher: Box<dyn TickDispatcher>,

    affinity:       ThreadAffinity,
    active:         bool,
    disposed:       bool,
    /// A dispatcher request is outstanding.
    tick_requested: bool,
}

impl ParkingPolicyEngine {
    pub(crate) fn from_parts(
        settings:   EngineSettings,
        relocator:  Box<dyn ParkingRelocator>,
        dispatcher: Box<dyn TickDispatcher>,
    ) -> Self {
        Self {
            rules:     RuleStore::new(),
            index:     RefCell::new(LotIndex::new()),
            context:   DecisionContext::from_settings(&settings),
            scheduler: ReevaluationScheduler::new(&settings),
            settings,
            relocator,
            dispatcher,
            affinity:       ThreadAffinity::current(),
            active:         false,
            disposed:       false,
            tick_requested: false,
        }
    }

    // ── Gates and settings ────────────────────────────────────────────────

    /// Turn the feature gate on or off.
    ///
    /// While inactive every permission check fails open and the audit
    /// scheduler is reset and idle.
    pub fn set_active(&mut self, active: bool) {
        if !self.affinity.check("engine.set_active") || self.disposed {
            return;
        }
        if self.active != active {
            tracing::info!(active, "parking policy feature gate changed");
        }
        self.active = active;
        self.apply_gate();
    }

    /// `true` while the feature gate is on and the engine is not disposed.
    pub fn is_active(&self) -> bool {
        self.active && !self.disposed
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Replace the settings.  Invalid settings are rejected and the old ones
    /// kept.  Turning `enforcement_disabled` on resets the scheduler.
    pub fn update_settings(&mut self, settings: EngineSettings) -> EngineResult<()> {
        if !self.affinity.check("engine.update_settings") {
            return Err(EngineError::WrongThread("update_settings"));
        }
        if self.disposed {
            return Err(EngineError::Disposed);
        }
        settings.validate()?;

        self.context.configure(&settings);
        self.scheduler.configure(&settings);
        self.settings = settings;
        self.apply_gate();
        tracing::debug!(
            enforcement_disabled = self.settings.enforcement_disabled,
            backend = %self.settings.relocation_backend,
            "parking policy settings updated"
        );
        Ok(())
    }

    fn apply_gate(&mut self) {
        let enabled = self.active && !self.disposed && !self.settings.enforcement_disabled;
        self.scheduler.set_enabled(enabled);
        if !enabled {
            self.tick_requested = false;
        }
    }

    // ── Rules ─────────────────────────────────────────────────────────────

    /// Attach or replace the rule of `building`.  Returns the previous rule.
    ///
    /// Vehicles already parked there are not re-checked until the building
    /// is audited; call [`request_for_building`](Self::request_for_building)
    /// to make that happen soon.
    pub fn set_rule(&mut self, building: BuildingId, rule: Rule) -> EngineResult<Option<Rule>> {
        if !self.affinity.check("engine.set_rule") {
            return Err(EngineError::WrongThread("set_rule"));
        }
        if self.disposed {
            return Err(EngineError::Disposed);
        }
        let previous = self.rules.insert(building, rule)?;
        tracing::debug!(building = %building, %rule, "parking rule set");
        Ok(previous)
    }

    /// Detach the rule of `building`.  Returns the removed rule.
    pub fn remove_rule(&mut self, building: BuildingId) -> EngineResult<Option<Rule>> {
        if !self.affinity.check("engine.remove_rule") {
            return Err(EngineError::WrongThread("remove_rule"));
        }
        if self.disposed {
            return Err(EngineError::Disposed);
        }
        Ok(self.rules.remove(building))
    }

    pub fn rule(&self, building: BuildingId) -> Option<Rule> {
        if !self.affinity.check("engine.rule") {
            return None;
        }
        self.rules.get(building)
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    // ── Permission checks ─────────────────────────────────────────────────

    /// May the citizen driving `vehicle` park on `building`?
    pub fn evaluate_vehicle<H: CityHost + ?Sized>(
        &self,
        host:     &H,
        vehicle:  VehicleId,
        building: BuildingId,
    ) -> Decision {
        if !self.affinity.check("engine.evaluate_vehicle") {
            return Decision::allow(ReasonCode::OffThread);
        }
        self.evaluator().evaluate_vehicle(host, vehicle, building)
    }

    /// May `citizen` park on `building`?
    pub fn evaluate_citizen<H: CityHost + ?Sized>(
        &self,
        host:     &H,
        citizen:  CitizenId,
        building: BuildingId,
    ) -> Decision {
        if !self.affinity.check("engine.evaluate_citizen") {
            return Decision::allow(ReasonCode::OffThread);
        }
        self.evaluator().evaluate_citizen(host, citizen, building)
    }

    fn evaluator(&self) -> PermissionEvaluator<'_> {
        PermissionEvaluator::new(&self.rules, &self.context, self.is_active())
    }

    /// The ruled lot whose parking space is nearest to `position`, within
    /// the configured snap distance.
    pub fn find_building<H: CityHost + ?Sized>(
        &self,
        host:     &H,
        position: Position,
    ) -> Option<BuildingId> {
        if !self.affinity.check("engine.find_building") {
            return None;
        }
        self.index
            .borrow_mut()
            .find_building_id(host, &self.rules, position, self.settings.snap_distance)
    }

    /// Like [`find_building`](Self::find_building), also returning the rule.
    pub fn find_lot<H: CityHost + ?Sized>(
        &self,
        host:     &H,
        position: Position,
    ) -> Option<(BuildingId, Rule)> {
        if !self.affinity.check("engine.find_lot") {
            return None;
        }
        self.index
            .borrow_mut()
            .find_building(host, &self.rules, position, self.settings.snap_distance)
    }

    // ── Decision context ──────────────────────────────────────────────────

    /// Open a parking-search episode for `vehicle` driven by `citizen`.  It
    /// ends when the guard drops.  `None` off the simulation thread.
    pub fn begin_episode(
        &self,
        vehicle: VehicleId,
        citizen: CitizenId,
        source:  &'static str,
    ) -> Option<EpisodeGuard<'_>> {
        self.context.scope(vehicle, citizen, source)
    }

    /// Unguarded episode start for call sites that cannot hold a guard.
    /// Every successful push needs a matching [`pop_context`](Self::pop_context).
    pub fn push_context(&self, vehicle: VehicleId, citizen: CitizenId, source: &'static str) -> bool {
        self.context.push(vehicle, citizen, source)
    }

    pub fn pop_context(&self) -> Option<EpisodeSummary> {
        self.context.pop()
    }

    /// The innermost open episode, if any.
    pub fn current_context(&self) -> Option<Frame> {
        self.context.peek()
    }

    pub fn context(&self) -> &DecisionContext {
        &self.context
    }

    // ── Audit scheduling ──────────────────────────────────────────────────

    /// Queue `building` for a re-audit of its parked vehicles.
    pub fn request_for_building<H: CityHost + ?Sized>(
        &mut self,
        host:     &H,
        building: BuildingId,
    ) -> bool {
        if !self.affinity.check("engine.request_for_building") {
            return false;
        }
        let queued = self.scheduler.request_for_building(host, &mut self.rules, building);
        if queued {
            self.ensure_tick();
        }
        queued
    }

    /// Queue the next building of the full-city sweep.
    pub fn request_next_scheduled_building<H: CityHost + ?Sized>(
        &mut self,
        host:        &H,
        reset_sweep: bool,
    ) -> bool {
        if !self.affinity.check("engine.request_next_scheduled_building") {
            return false;
        }
        let queued = self.scheduler.request_next_scheduled_building(host, &mut self.rules, reset_sweep);
        if queued {
            self.ensure_tick();
        }
        queued
    }

    /// The host's simulated date advanced.
    pub fn notify_day_changed(&mut self) {
        if !self.affinity.check("engine.notify_day_changed") {
            return;
        }
        self.scheduler.notify_day_changed();
    }

    /// Run one budgeted audit tick.  Call this when the dispatcher asks.
    pub fn run_tick<H: CityHost + ?Sized>(&mut self, host: &mut H) -> TickReport {
        self.run_tick_observed(host, &mut NoopAuditObserver)
    }

    /// [`run_tick`](Self::run_tick) with observer callbacks.
    pub fn run_tick_observed<H, O>(&mut self, host: &mut H, observer: &mut O) -> TickReport
    where
        H: CityHost + ?Sized,
        O: AuditObserver,
    {
        if !self.affinity.check("engine.run_tick") {
            return TickReport::empty(TickOutcome::Idle);
        }
        self.tick_requested = false;

        let report = self.scheduler.run_tick(TickEnv {
            host,
            rules:     &self.rules,
            context:   &self.context,
            relocator: self.relocator.as_mut(),
        });

        if report.building.is_some() {
            observer.on_tick(&report);
        }
        if let Some(summary) = &report.finished {
            observer.on_audit_finished(summary);
        }
        if report.outcome == TickOutcome::Reschedule {
            self.ensure_tick();
        }
        report
    }

    pub fn scheduler(&self) -> &ReevaluationScheduler {
        &self.scheduler
    }

    /// `true` while a dispatcher request is waiting to be served.
    pub fn tick_requested(&self) -> bool {
        self.tick_requested
    }

    fn ensure_tick(&mut self) {
        if !self.tick_requested && self.scheduler.has_work() {
            self.tick_requested = true;
            self.dispatcher.request_tick();
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Stop for good: queues are dropped, open episodes discarded, and every
    /// later call is a no-op or fails open.
    pub fn dispose(&mut self) {
        if !self.affinity.check("engine.dispose") || self.disposed {
            return;
        }
        self.scheduler.dispose();
        let open = self.context.clear();
        self.disposed = true;
        self.tick_requested = false;
        tracing::info!(open_episodes = open, rules = self.rules.len(), "parking policy engine disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Hand the engine to the calling thread.
    pub fn rebind_to_current_thread(&mut self) {
        self.affinity.rebind_to_current();
        self.context.rebind_to_current_thread();
    }

    /// Diagnostics snapshot.  `None` off the simulation thread.
    pub fn status(&self) -> Option<EngineStatus> {
        if !self.affinity.check("engine.status") {
            return None;
        }
        Some(EngineStatus {
            active:               self.is_active(),
            enforcement_disabled: self.settings.enforcement_disabled,
            disposed:             self.disposed,
            rules:                self.rules.len(),
            rules_version:        self.rules.version(),
            index:                self.index.borrow().stats(),
            scheduler:            self.scheduler.state(),
            pending:              self.scheduler.pending_len(),
            context_depth:        self.context.depth(),
            totals:               self.scheduler.totals().clone(),
            backend:              effective_backend(
                self.settings.relocation_backend,
                self.relocator.as_ref(),
            ),
        })
    }
}

impl std::fmt::Debug for ParkingPolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParkingPolicyEngine")
            .field("active", &self.active)
            .field("disposed", &self.disposed)
            .field("rules", &self.rules.len())
            .field("scheduler", &self.scheduler.state())
            .finish_non_exhaustive()
    }
}
