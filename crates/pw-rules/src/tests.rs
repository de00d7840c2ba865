//! Unit tests for pw-rules.

#[cfg(test)]
mod rule {
    use crate::{MAX_RADIUS_M, MIN_RADIUS_M, Rule, UNLIMITED_RADIUS_M};

    #[test]
    fn enabled_radii_are_clamped() {
        let r = Rule::new(true, 1, true, 60_000, false);
        assert_eq!(r.residents_radius_m, MIN_RADIUS_M);
        assert_eq!(r.work_school_radius_m, MAX_RADIUS_M);
    }

    #[test]
    fn disabled_axes_store_zero() {
        let r = Rule::new(false, 300, false, 300, true);
        assert_eq!(r.residents_radius_m, 0);
        assert_eq!(r.work_school_radius_m, 0);
        assert!(!r.residents_axis_enabled());
        assert!(!r.work_school_axis_enabled());
    }

    #[test]
    fn zero_radius_disables_the_axis() {
        let r = Rule::new(true, 0, true, 0, false);
        assert!(!r.residents_axis_enabled());
        assert!(!r.work_school_axis_enabled());
        assert!(!r.residents_only);
        assert_eq!(r.residents_radius_m, 0);
        assert_eq!(r, Rule::new(false, 0, false, 0, false));
        assert_eq!(Rule::residents_within(300).with_work_school(0), Rule::residents_within(300));
    }

    #[test]
    fn normalized_clamps_literals() {
        let literal = Rule {
            residents_only:       true,
            residents_radius_m:   10,
            work_school_only:     true,
            work_school_radius_m: 0,
            visitors_allowed:     false,
        };
        let r = literal.normalized();
        assert_eq!(r.residents_radius_m, MIN_RADIUS_M);
        assert!(!r.work_school_only);
        assert_eq!(r, Rule::new(true, 10, true, 0, false));
        assert_eq!(r.normalized(), r);
    }

    #[test]
    fn deserialized_rules_are_clamped() {
        let r: Rule = toml::from_str(
            "residents_only = true\nresidents_radius_m = 10\nwork_school_only = true\nwork_school_radius_m = 9000\n",
        )
        .unwrap();
        assert_eq!(r.residents_radius_m, MIN_RADIUS_M);
        assert_eq!(r.work_school_radius_m, MAX_RADIUS_M);
        assert!(!r.visitors_allowed);
    }

    #[test]
    fn unlimited_survives_clamping() {
        let r = Rule::residents_within(UNLIMITED_RADIUS_M);
        assert_eq!(r.residents_radius_m, UNLIMITED_RADIUS_M);
        assert_eq!(r.residents_radius(), None);
    }

    #[test]
    fn in_range_radius_unchanged() {
        let r = Rule::residents_within(300);
        assert_eq!(r.residents_radius(), Some(300.0));
    }

    #[test]
    fn restrictiveness() {
        assert!(!Rule::open().is_restrictive());
        assert!(Rule::open().with_visitors(false).is_restrictive());
        assert!(Rule::residents_within(300).with_visitors(true).is_restrictive());
    }

    #[test]
    fn with_work_school_keeps_residency() {
        let r = Rule::residents_within(300).with_work_school(800);
        assert!(r.residents_axis_enabled());
        assert_eq!(r.work_school_radius_m, 800);
    }

    #[test]
    fn display() {
        let r = Rule::residents_within(300).with_visitors(true);
        assert_eq!(r.to_string(), "residents=300m work/school=off visitors=yes");
    }
}

#[cfg(test)]
mod store {
    use pw_core::BuildingId;

    use crate::{MIN_RADIUS_M, Rule, RuleError, RuleStore};

    #[test]
    fn version_bumps_on_change_only() {
        let mut s = RuleStore::new();
        assert_eq!(s.version(), 0);

        s.insert(BuildingId(5), Rule::residents_within(300)).unwrap();
        assert_eq!(s.version(), 1);

        // identical replacement is not a change
        s.insert(BuildingId(5), Rule::residents_within(300)).unwrap();
        assert_eq!(s.version(), 1);

        let prev = s.insert(BuildingId(5), Rule::open()).unwrap();
        assert_eq!(prev, Some(Rule::residents_within(300)));
        assert_eq!(s.version(), 2);

        assert!(s.remove(BuildingId(9)).is_none());
        assert_eq!(s.version(), 2);

        assert_eq!(s.remove(BuildingId(5)), Some(Rule::open()));
        assert_eq!(s.version(), 3);
        assert!(s.is_empty());
    }

    #[test]
    fn invalid_building_rejected() {
        let mut s = RuleStore::new();
        let err = s.insert(BuildingId::INVALID, Rule::open()).unwrap_err();
        assert!(matches!(err, RuleError::InvalidBuilding(_)));
        assert!(s.insert(BuildingId(0), Rule::open()).is_err());
        assert_eq!(s.version(), 0);
    }

    #[test]
    fn stored_rules_are_normalized() {
        let mut s = RuleStore::new();
        let literal = Rule {
            residents_only:       true,
            residents_radius_m:   10,
            work_school_only:     false,
            work_school_radius_m: 0,
            visitors_allowed:     false,
        };
        s.insert(BuildingId(5), literal).unwrap();
        let stored = s.get(BuildingId(5)).unwrap();
        assert_eq!(stored.residents_radius_m, MIN_RADIUS_M);
        assert_eq!(stored, Rule::residents_within(10));

        // same intent through the constructor is not a change
        s.insert(BuildingId(5), Rule::residents_within(10)).unwrap();
        assert_eq!(s.version(), 1);
    }

    #[test]
    fn sorted_buildings_ascending() {
        let mut s = RuleStore::new();
        for id in [40, 3, 17] {
            s.insert(BuildingId(id), Rule::open()).unwrap();
        }
        assert_eq!(s.sorted_buildings(), vec![BuildingId(3), BuildingId(17), BuildingId(40)]);
    }

    #[test]
    fn clear_bumps_once() {
        let mut s = RuleStore::new();
        s.insert(BuildingId(1), Rule::open()).unwrap();
        s.insert(BuildingId(2), Rule::open()).unwrap();
        s.clear();
        assert_eq!(s.version(), 3);
        s.clear();
        assert_eq!(s.version(), 3);
    }
}
