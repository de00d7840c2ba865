//! The per-building parking rule.

use serde::{Deserialize, Serialize};

/// Smallest radius an enabled eligibility axis may carry.
pub const MIN_RADIUS_M: u16 = 50;

/// Largest finite radius an enabled eligibility axis may carry.
pub const MAX_RADIUS_M: u16 = 5_000;

/// Sentinel radius meaning "any distance".  Never clamped.
pub const UNLIMITED_RADIUS_M: u16 = u16::MAX;

/// Who may park on a lot.
///
/// A radius of `0` disables its axis.  The fields are public for cheap reads;
/// a rule built as a struct literal is brought into range by
/// [`Rule::normalized`], which [`RuleStore::insert`](crate::RuleStore::insert)
/// applies to everything it stores.  Deserialization goes through the same
/// path.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "RawRule")]
pub struct Rule {
    pub residents_only:       bool,
    pub residents_radius_m:   u16,
    pub work_school_only:     bool,
    pub work_school_radius_m: u16,
    pub visitors_allowed:     bool,
}

impl Rule {
    /// Build a rule, clamping the radius of every enabled axis into
    /// `[MIN_RADIUS_M, MAX_RADIUS_M]`.
    ///
    /// An axis whose flag is off or whose radius is `0` is disabled: its flag
    /// is cleared and its radius stored as `0`.
    pub fn new(
        residents_only:       bool,
        residents_radius_m:   u16,
        work_school_only:     bool,
        work_school_radius_m: u16,
        visitors_allowed:     bool,
    ) -> Self {
        let residents_radius_m = clamp_radius(residents_only, residents_radius_m);
        let work_school_radius_m = clamp_radius(work_school_only, work_school_radius_m);
        Self {
            residents_only: residents_radius_m != 0,
            residents_radius_m,
            work_school_only: work_school_radius_m != 0,
            work_school_radius_m,
            visitors_allowed,
        }
    }

    /// The same rule with its radii clamped and disabled axes zeroed.
    /// Idempotent.
    pub fn normalized(self) -> Self {
        Self::new(
            self.residents_only,
            self.residents_radius_m,
            self.work_school_only,
            self.work_school_radius_m,
            self.visitors_allowed,
        )
    }

    /// No restriction at all: everyone may park.
    pub fn open() -> Self {
        Self::new(false, 0, false, 0, true)
    }

    /// Residents living within `radius_m`, nobody else.
    pub fn residents_within(radius_m: u16) -> Self {
        Self::new(true, radius_m, false, 0, false)
    }

    /// Workers and students whose work place lies within `radius_m`.
    pub fn workers_within(radius_m: u16) -> Self {
        Self::new(false, 0, true, radius_m, false)
    }

    /// Copy of `self` with the visitor gate set to `allowed`.
    pub fn with_visitors(self, allowed: bool) -> Self {
        Self { visitors_allowed: allowed, ..self }
    }

    /// Copy of `self` with the work/school axis enabled at `radius_m`.
    pub fn with_work_school(self, radius_m: u16) -> Self {
        Self::new(
            self.residents_only,
            self.residents_radius_m,
            true,
            radius_m,
            self.visitors_allowed,
        )
    }

    /// `true` if the residency axis takes part in the decision.
    #[inline]
    pub fn residents_axis_enabled(&self) -> bool {
        self.residents_only && self.residents_radius_m != 0
    }

    /// `true` if the work/school axis takes part in the decision.
    #[inline]
    pub fn work_school_axis_enabled(&self) -> bool {
        self.work_school_only && self.work_school_radius_m != 0
    }

    /// `true` if the rule turns anyone away.
    pub fn is_restrictive(&self) -> bool {
        !self.visitors_allowed || self.residents_axis_enabled() || self.work_school_axis_enabled()
    }

    /// Residency radius in metres, or `None` for unlimited.
    #[inline]
    pub fn residents_radius(&self) -> Option<f32> {
        radius_metres(self.residents_radius_m)
    }

    /// Work/school radius in metres, or `None` for unlimited.
    #[inline]
    pub fn work_school_radius(&self) -> Option<f32> {
        radius_metres(self.work_school_radius_m)
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let axis = |on: bool, r: u16| match (on, r) {
            (false, _) | (_, 0)         => "off".to_string(),
            (true, UNLIMITED_RADIUS_M)  => "any".to_string(),
            (true, r)                   => format!("{r}m"),
        };
        write!(
            f,
            "residents={} work/school={} visitors={}",
            axis(self.residents_only, self.residents_radius_m),
            axis(self.work_school_only, self.work_school_radius_m),
            if self.visitors_allowed { "yes" } else { "no" },
        )
    }
}

fn clamp_radius(enabled: bool, radius_m: u16) -> u16 {
    match (enabled, radius_m) {
        (false, _) | (true, 0)     => 0,
        (true, UNLIMITED_RADIUS_M) => UNLIMITED_RADIUS_M,
        (true, r)                  => r.clamp(MIN_RADIUS_M, MAX_RADIUS_M),
    }
}

fn radius_metres(radius_m: u16) -> Option<f32> {
    (radius_m != UNLIMITED_RADIUS_M).then_some(radius_m as f32)
}

/// Wire shape of a [`Rule`]; every deserialized rule passes through
/// [`Rule::new`].
#[derive(Deserialize)]
struct RawRule {
    #[serde(default)]
    residents_only:       bool,
    #[serde(default)]
    residents_radius_m:   u16,
    #[serde(default)]
    work_school_only:     bool,
    #[serde(default)]
    work_school_radius_m: u16,
    #[serde(default)]
    visitors_allowed:     bool,
}

impl From<RawRule> for Rule {
    fn from(raw: RawRule) -> Self {
        Self::new(
            raw.residents_only,
            raw.residents_radius_m,
            raw.work_school_only,
            raw.work_school_radius_m,
            raw.visitors_allowed,
        )
    }
}
