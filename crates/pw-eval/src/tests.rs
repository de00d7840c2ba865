//! Unit tests for pw-eval.

use rustc_hash::FxHashMap;

use pw_core::{
    BuildingId, CitizenId, CitizenInfo, CityHost, ParkedVehicleId, ParkedVehicleInfo, Position,
    VehicleId,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Buildings at fixed positions, citizens, and vehicle drivers.
#[derive(Default)]
struct Town {
    buildings: FxHashMap<BuildingId, Position>,
    citizens:  FxHashMap<CitizenId, CitizenInfo>,
    drivers:   FxHashMap<VehicleId, CitizenId>,
}

impl Town {
    fn building(&mut self, id: u16, x: f32, z: f32) -> BuildingId {
        let b = BuildingId(id);
        self.buildings.insert(b, Position::ground(x, z));
        b
    }

    fn add_citizen(&mut self, id: u32, home: BuildingId, work: BuildingId, visitor: bool) -> CitizenId {
        let c = CitizenId(id);
        self.citizens.insert(c, CitizenInfo { home, work, visitor });
        c
    }

    fn drive(&mut self, vehicle: u16, citizen: CitizenId) -> VehicleId {
        let v = VehicleId(vehicle);
        self.drivers.insert(v, citizen);
        v
    }
}

impl CityHost for Town {
    fn building_exists(&self, b: BuildingId) -> bool { self.buildings.contains_key(&b) }
    fn building_position(&self, b: BuildingId) -> Option<Position> { self.buildings.get(&b).copied() }
    fn is_supported_lot(&self, _: BuildingId) -> bool { true }
    fn parking_spaces(&self, b: BuildingId) -> Option<Vec<Position>> {
        self.buildings.get(&b).map(|p| vec![*p])
    }
    fn first_parked_vehicle(&self, _: BuildingId) -> Option<ParkedVehicleId> { None }
    fn next_parked_vehicle(&self, _: ParkedVehicleId) -> Option<ParkedVehicleId> { None }
    fn vehicle_driver(&self, v: VehicleId) -> Option<CitizenId> { self.drivers.get(&v).copied() }
    fn parked_vehicle(&self, _: ParkedVehicleId) -> Option<ParkedVehicleInfo> { None }
    fn citizen(&self, c: CitizenId) -> Option<CitizenInfo> { self.citizens.get(&c).copied() }
    fn nudge_parked_vehicle(&mut self, _: ParkedVehicleId, _: Position) -> bool { false }
    fn release_parked_vehicle(&mut self, _: ParkedVehicleId) {}
    fn finalize_stuck_vehicle(&mut self, _: ParkedVehicleId) -> bool { false }
}

fn context() -> crate::DecisionContext {
    crate::DecisionContext::new(u32::MAX, std::time::Duration::from_secs(3600))
}

// ── apply_rule ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod apply_rule_tests {
    use proptest::prelude::*;

    use pw_core::{BuildingId, CitizenId, Position};
    use pw_rules::{Rule, UNLIMITED_RADIUS_M};

    use crate::{ActorContext, ReasonCode, apply_rule};

    fn actor(home: Option<f32>, work: Option<f32>, visitor: bool) -> ActorContext {
        ActorContext {
            citizen:       CitizenId(1),
            home:          BuildingId(2),
            home_position: home.map(|d| Position::ground(d, 0.0)),
            work:          BuildingId(3),
            work_position: work.map(|d| Position::ground(0.0, d)),
            visitor,
        }
    }

    const LOT: Position = Position { x: 0.0, y: 0.0, z: 0.0 };

    #[test]
    fn resident_inside_radius_allowed() {
        let rule = Rule::residents_within(300);
        let d = apply_rule(&rule, LOT, &actor(Some(250.0), None, false));
        assert!(d.allowed);
        assert_eq!(d.reason, ReasonCode::ResidentWithinRadius);
    }

    #[test]
    fn resident_outside_radius_without_work_denied() {
        let rule = Rule::residents_within(300);
        let d = apply_rule(&rule, LOT, &actor(Some(350.0), None, false));
        assert!(!d.allowed);
        assert_eq!(d.reason, ReasonCode::ResidencyOutOfRadius);
    }

    #[test]
    fn boundary_is_inclusive() {
        let rule = Rule::residents_within(300);
        assert!(apply_rule(&rule, LOT, &actor(Some(300.0), None, false)).allowed);
    }

    #[test]
    fn either_axis_suffices() {
        let rule = Rule::residents_within(300).with_work_school(500);
        let d = apply_rule(&rule, LOT, &actor(Some(900.0), Some(450.0), false));
        assert_eq!(d.reason, ReasonCode::WorkSchoolWithinRadius);

        let d = apply_rule(&rule, LOT, &actor(Some(900.0), Some(900.0), false));
        assert_eq!(d.reason, ReasonCode::OutOfAllRadii);
        assert!(d.is_denied());
    }

    #[test]
    fn work_only_rule() {
        let rule = Rule::workers_within(200);
        assert_eq!(
            apply_rule(&rule, LOT, &actor(Some(10.0), None, false)).reason,
            ReasonCode::WorkSchoolOutOfRadius,
        );
        assert!(apply_rule(&rule, LOT, &actor(None, Some(199.0), false)).allowed);
    }

    #[test]
    fn unlimited_radius_accepts_any_known_home() {
        let rule = Rule::residents_within(UNLIMITED_RADIUS_M);
        assert!(apply_rule(&rule, LOT, &actor(Some(60_000.0), None, false)).allowed);
        assert!(!apply_rule(&rule, LOT, &actor(None, None, false)).allowed);
    }

    #[test]
    fn visitors_follow_visitor_gate_only() {
        let open = Rule::residents_within(300).with_visitors(true);
        let closed = Rule::residents_within(300);
        // a visitor's home is irrelevant
        assert_eq!(apply_rule(&open, LOT, &actor(Some(9_999.0), None, true)).reason, ReasonCode::VisitorAllowed);
        assert_eq!(apply_rule(&closed, LOT, &actor(Some(10.0), None, true)).reason, ReasonCode::VisitorsNotAllowed);
    }

    proptest! {
        #[test]
        fn no_axes_no_visitors(home in proptest::option::of(0.0f32..20_000.0), visitor: bool) {
            let rule = Rule::new(false, 0, false, 0, false);
            let d = apply_rule(&rule, LOT, &actor(home, None, visitor));
            prop_assert_eq!(d.allowed, !visitor);
        }

        #[test]
        fn residency_axis_matches_distance(
            radius in 50u16..=5_000,
            home in 0.0f32..10_000.0,
            work in proptest::option::of(0.0f32..10_000.0),
            work_radius in proptest::option::of(50u16..=5_000),
        ) {
            let mut rule = Rule::residents_within(radius);
            if let Some(wr) = work_radius {
                rule = rule.with_work_school(wr);
            }
            let work_passes = match (work, work_radius) {
                (Some(w), Some(wr)) => w <= wr as f32,
                _ => false,
            };
            let d = apply_rule(&rule, LOT, &actor(Some(home), work, false));
            prop_assert_eq!(d.allowed, home <= radius as f32 || work_passes);
        }

        #[test]
        fn pure(radius in 50u16..=5_000, home in 0.0f32..10_000.0, visitor: bool) {
            let rule = Rule::residents_within(radius).with_visitors(visitor);
            let a = actor(Some(home), None, visitor);
            prop_assert_eq!(apply_rule(&rule, LOT, &a), apply_rule(&rule, LOT, &a));
        }
    }
}

// ── PermissionEvaluator ───────────────────────────────────────────────────────

#[cfg(test)]
mod evaluator_tests {
    use pw_core::{BuildingId, CitizenId, VehicleId};
    use pw_rules::{Rule, RuleStore};

    use super::{Town, context};
    use crate::{PermissionEvaluator, ReasonCode};

    struct Fixture {
        town:  Town,
        rules: RuleStore,
        lot:   BuildingId,
        near:  CitizenId,
        far:   CitizenId,
    }

    fn fixture() -> Fixture {
        let mut town = Town::default();
        let lot = town.building(10, 0.0, 0.0);
        let near_home = town.building(11, 250.0, 0.0);
        let far_home = town.building(12, 350.0, 0.0);
        let near = town.add_citizen(100, near_home, BuildingId::INVALID, false);
        let far = town.add_citizen(101, far_home, BuildingId::INVALID, false);
        let mut rules = RuleStore::new();
        rules.insert(lot, Rule::residents_within(300)).unwrap();
        Fixture { town, rules, lot, near, far }
    }

    #[test]
    fn worked_example() {
        let f = fixture();
        let ctx = context();
        let eval = PermissionEvaluator::new(&f.rules, &ctx, true);
        assert_eq!(eval.evaluate_citizen(&f.town, f.near, f.lot).reason, ReasonCode::ResidentWithinRadius);
        let d = eval.evaluate_citizen(&f.town, f.far, f.lot);
        assert!(d.is_denied());
        assert_eq!(d.reason, ReasonCode::ResidencyOutOfRadius);
    }

    #[test]
    fn inactive_fails_open() {
        let f = fixture();
        let ctx = context();
        let eval = PermissionEvaluator::new(&f.rules, &ctx, false);
        let d = eval.evaluate_citizen(&f.town, f.far, f.lot);
        assert!(d.allowed);
        assert_eq!(d.reason, ReasonCode::NotActive);
    }

    #[test]
    fn unruled_lot_fails_open() {
        let mut f = fixture();
        let other = f.town.building(20, 5_000.0, 5_000.0);
        let ctx = context();
        let eval = PermissionEvaluator::new(&f.rules, &ctx, true);
        assert_eq!(eval.evaluate_citizen(&f.town, f.far, other).reason, ReasonCode::NoRule);
    }

    #[test]
    fn missing_lot_position_fails_open() {
        let mut f = fixture();
        let ghost = BuildingId(30);
        f.rules.insert(ghost, Rule::residents_within(300)).unwrap();
        let ctx = context();
        let eval = PermissionEvaluator::new(&f.rules, &ctx, true);
        let d = eval.evaluate_citizen(&f.town, f.far, ghost);
        assert!(d.allowed);
        assert_eq!(d.reason, ReasonCode::PositionUnavailable);
    }

    #[test]
    fn unknown_actor_fails_closed() {
        let f = fixture();
        let ctx = context();
        let eval = PermissionEvaluator::new(&f.rules, &ctx, true);
        let d = eval.evaluate_citizen(&f.town, CitizenId(999), f.lot);
        assert!(d.is_denied());
        assert_eq!(d.reason, ReasonCode::NoActorContext);
        assert_eq!(
            eval.evaluate_vehicle(&f.town, VehicleId(77), f.lot).reason,
            ReasonCode::NoActorContext,
        );
    }

    #[test]
    fn vehicle_entry_resolves_driver() {
        let mut f = fixture();
        let v = f.town.drive(5, f.near);
        let ctx = context();
        let eval = PermissionEvaluator::new(&f.rules, &ctx, true);
        assert_eq!(eval.evaluate_vehicle(&f.town, v, f.lot).reason, ReasonCode::ResidentWithinRadius);
    }

    #[test]
    fn records_into_innermost_episode() {
        let mut f = fixture();
        let visitor = f.town.add_citizen(200, BuildingId::INVALID, BuildingId::INVALID, true);
        let ctx = context();
        let eval = PermissionEvaluator::new(&f.rules, &ctx, true);

        let outer = ctx.scope(VehicleId::INVALID, f.near, "outer").unwrap();
        eval.evaluate_citizen(&f.town, f.near, f.lot);
        {
            let inner = ctx.scope(VehicleId::INVALID, visitor, "inner").unwrap();
            eval.evaluate_citizen(&f.town, visitor, f.lot);
            let s = inner.finish().unwrap();
            assert_eq!(s.stats.checks, 1);
            assert_eq!(s.stats.denied, 1);
            assert_eq!(s.stats.visitor, Some(true));
            assert_eq!(s.stats.last_reason, Some(ReasonCode::VisitorsNotAllowed));
        }
        eval.evaluate_citizen(&f.town, f.far, f.lot);
        let s = outer.finish().unwrap();
        assert_eq!(s.stats.checks, 2);
        assert_eq!(s.stats.allowed, 1);
        assert_eq!(s.stats.denied, 1);
        assert_eq!(s.stats.visitor, Some(false));
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn evaluation_without_episode_is_fine() {
        let f = fixture();
        let ctx = context();
        let eval = PermissionEvaluator::new(&f.rules, &ctx, true);
        assert!(eval.evaluate_citizen(&f.town, f.near, f.lot).allowed);
        assert!(ctx.peek().is_none());
    }
}

// ── DecisionContext ───────────────────────────────────────────────────────────

#[cfg(test)]
mod context_tests {
    use proptest::prelude::*;

    use pw_core::{CitizenId, VehicleId};

    use super::context;
    use crate::{Decision, ReasonCode};

    #[test]
    fn peek_reflects_innermost() {
        let ctx = context();
        assert!(ctx.peek().is_none());
        let _a = ctx.scope(VehicleId(1), CitizenId(10), "a").unwrap();
        let b = ctx.scope(VehicleId(2), CitizenId(20), "b").unwrap();
        assert_eq!(ctx.peek().unwrap().citizen, CitizenId(20));
        assert_eq!(b.depth(), 2);
        drop(b);
        let top = ctx.peek().unwrap();
        assert_eq!(top.vehicle, VehicleId(1));
        assert_eq!(top.source, "a");
    }

    #[test]
    fn guard_drop_discards_leaked_inner_frames() {
        let ctx = context();
        {
            let _outer = ctx.scope(VehicleId(1), CitizenId(1), "outer").unwrap();
            // inner callers push without popping
            assert!(ctx.push(VehicleId(2), CitizenId(2), "leaky"));
            assert!(ctx.push(VehicleId(3), CitizenId(3), "leaky"));
            assert_eq!(ctx.depth(), 3);
        }
        assert_eq!(ctx.depth(), 0);
        assert!(ctx.peek().is_none());
    }

    #[test]
    fn guard_survives_manual_pop_of_its_frame() {
        let ctx = context();
        let g = ctx.scope(VehicleId(1), CitizenId(1), "x").unwrap();
        assert!(ctx.pop().is_some());
        // the guard's frame is already gone; finishing is a no-op
        assert!(g.finish().is_none());
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn pop_on_empty_is_none() {
        let ctx = context();
        assert!(ctx.pop().is_none());
    }

    #[test]
    fn unwinding_pops_the_frame() {
        let ctx = context();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _g = ctx.scope(VehicleId(1), CitizenId(1), "panicky").unwrap();
            panic!("search blew up");
        }));
        assert!(result.is_err());
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn stats_count_fail_open() {
        let ctx = context();
        let g = ctx.scope(VehicleId(1), CitizenId(1), "x").unwrap();
        ctx.record_decision(Decision::allow(ReasonCode::NoRule));
        ctx.record_decision(Decision::allow(ReasonCode::Unrestricted));
        ctx.record_decision(Decision::deny(ReasonCode::OutOfAllRadii));
        let s = g.finish().unwrap();
        assert_eq!((s.stats.checks, s.stats.allowed, s.stats.denied, s.stats.fail_open), (3, 2, 1, 1));
    }

    #[test]
    fn off_thread_reports_no_context() {
        let ctx = context();
        assert!(ctx.push(VehicleId(1), CitizenId(1), "owner"));
        let ctx = std::thread::spawn(move || {
            assert!(ctx.peek().is_none());
            assert_eq!(ctx.depth(), 0);
            assert!(ctx.scope(VehicleId(2), CitizenId(2), "foreign").is_none());
            assert!(!ctx.push(VehicleId(2), CitizenId(2), "foreign"));
            ctx
        })
        .join()
        .unwrap();
        assert_eq!(ctx.depth(), 1);
        assert_eq!(ctx.peek().unwrap().source, "owner");
    }

    #[test]
    fn clear_drops_everything() {
        let ctx = context();
        ctx.push(VehicleId(1), CitizenId(1), "a");
        ctx.push(VehicleId(1), CitizenId(1), "b");
        assert_eq!(ctx.clear(), 2);
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn stale_guard_leaves_newer_episode_alone() {
        let ctx = context();
        let stale = ctx.scope(VehicleId(1), CitizenId(1), "old").unwrap();
        assert_eq!(ctx.clear(), 1);

        // a fresh episode lands at the same depth the stale guard remembers
        assert!(ctx.push(VehicleId(2), CitizenId(2), "new"));
        assert_eq!(stale.depth(), ctx.depth());

        drop(stale);
        assert_eq!(ctx.depth(), 1);
        assert_eq!(ctx.peek().unwrap().source, "new");

        let stale = ctx.scope(VehicleId(3), CitizenId(3), "inner").unwrap();
        ctx.clear();
        ctx.push(VehicleId(4), CitizenId(4), "a");
        ctx.push(VehicleId(5), CitizenId(5), "b");
        assert!(stale.finish().is_none());
        assert_eq!(ctx.depth(), 2);
        assert_eq!(ctx.pop().unwrap().source, "b");
    }

    proptest! {
        /// Any push/pop sequence through guards leaves the stack where it
        /// started, however many unguarded pushes happen inside.
        #[test]
        fn stack_returns_to_zero(leaks in proptest::collection::vec(0usize..4, 1..12)) {
            let ctx = context();
            for &n in &leaks {
                let g = ctx.scope(VehicleId(1), CitizenId(1), "prop").unwrap();
                for _ in 0..n {
                    ctx.push(VehicleId(2), CitizenId(2), "leak");
                }
                prop_assert_eq!(ctx.depth(), 1 + n);
                drop(g);
                prop_assert_eq!(ctx.depth(), 0);
            }
            prop_assert!(ctx.peek().is_none());
        }
    }
}
