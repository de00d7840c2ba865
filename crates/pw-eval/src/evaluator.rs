//! The permission evaluator.
//!
//! # Evaluation order
//!
//! ```text
//! engine inactive?            → allowed  (not_active)
//! lot has no rule?            → allowed  (no_rule)
//! lot position unknown?       → allowed  (position_unavailable)
//! actor unresolvable?         → denied   (no_actor_context)
//! visitor?                    → rule.visitors_allowed
//! no axis enabled?            → allowed  (unrestricted)
//! any enabled axis in range?  → allowed, else denied
//! ```
//!
//! Distances are planar and the radius boundary is inclusive.  For a given
//! rule store and host state the result is deterministic.

use pw_core::{BuildingId, CitizenId, CityHost, Position, VehicleId};
use pw_rules::{Rule, RuleStore};

use crate::{ActorContext, Decision, DecisionContext, ReasonCode};

/// Borrowing view over everything a decision needs.
///
/// Cheap to build; the engine constructs one per call.
pub struct PermissionEvaluator<'a> {
    rules:   &'a RuleStore,
    context: &'a DecisionContext,
    active:  bool,
}

impl<'a> PermissionEvaluator<'a> {
    pub fn new(rules: &'a RuleStore, context: &'a DecisionContext, active: bool) -> Self {
        Self { rules, context, active }
    }

    /// May the citizen driving `vehicle` park on `building`?
    pub fn evaluate_vehicle<H: CityHost + ?Sized>(
        &self,
        host:     &H,
        vehicle:  VehicleId,
        building: BuildingId,
    ) -> Decision {
        self.evaluate_with(host, building, || ActorContext::resolve_driver(host, vehicle))
    }

    /// May `citizen` park on `building`?
    ///
    /// Used by the audit path, where the vehicle the citizen arrived in may
    /// no longer exist.
    pub fn evaluate_citizen<H: CityHost + ?Sized>(
        &self,
        host:     &H,
        citizen:  CitizenId,
        building: BuildingId,
    ) -> Decision {
        self.evaluate_with(host, building, || ActorContext::resolve(host, citizen))
    }

    fn evaluate_with<H, F>(&self, host: &H, building: BuildingId, resolve_actor: F) -> Decision
    where
        H: CityHost + ?Sized,
        F: FnOnce() -> Option<ActorContext>,
    {
        let decision = self.decide(host, building, resolve_actor);
        self.context.record_decision(decision);
        decision
    }

    fn decide<H, F>(&self, host: &H, building: BuildingId, resolve_actor: F) -> Decision
    where
        H: CityHost + ?Sized,
        F: FnOnce() -> Option<ActorContext>,
    {
        if !self.active {
            return Decision::allow(ReasonCode::NotActive);
        }
        let Some(rule) = self.rules.get(building) else {
            return Decision::allow(ReasonCode::NoRule);
        };
        let Some(lot) = lot_position(host, building) else {
            return Decision::allow(ReasonCode::PositionUnavailable);
        };
        let Some(actor) = resolve_actor() else {
            return Decision::deny(ReasonCode::NoActorContext);
        };

        self.context.record_visitor(actor.visitor);
        apply_rule(&rule, lot, &actor)
    }
}

/// Judge a resolved actor against `rule` for a lot at `lot`.
///
/// Satisfying any one enabled eligibility axis is sufficient.  Actors with
/// no known home (or work place) fail that axis.
pub fn apply_rule(rule: &Rule, lot: Position, actor: &ActorContext) -> Decision {
    if actor.visitor {
        return if rule.visitors_allowed {
            Decision::allow(ReasonCode::VisitorAllowed)
        } else {
            Decision::deny(ReasonCode::VisitorsNotAllowed)
        };
    }

    let residents = rule.residents_axis_enabled();
    let workers = rule.work_school_axis_enabled();

    if !residents && !workers {
        return Decision::allow(ReasonCode::Unrestricted);
    }
    if residents && in_range(lot, actor.home_position, rule.residents_radius()) {
        return Decision::allow(ReasonCode::ResidentWithinRadius);
    }
    if workers && in_range(lot, actor.work_position, rule.work_school_radius()) {
        return Decision::allow(ReasonCode::WorkSchoolWithinRadius);
    }

    Decision::deny(match (residents, workers) {
        (true, true)  => ReasonCode::OutOfAllRadii,
        (true, false) => ReasonCode::ResidencyOutOfRadius,
        _             => ReasonCode::WorkSchoolOutOfRadius,
    })
}

/// `radius == None` means unlimited.
#[inline]
fn in_range(lot: Position, target: Option<Position>, radius: Option<f32>) -> bool {
    match target {
        None         => false,
        Some(target) => radius.is_none_or(|r| lot.within(target, r)),
    }
}

fn lot_position<H: CityHost + ?Sized>(host: &H, building: BuildingId) -> Option<Position> {
    if !host.building_exists(building) {
        return None;
    }
    host.building_position(building).filter(|p| p.is_finite())
}
