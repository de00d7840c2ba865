//! Decision outcome and reason codes.

/// Why a decision came out the way it did.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReasonCode {
    // ── Allowed, fail-open ────────────────────────────────────────────────
    /// Engine disabled or still initialising.
    NotActive,
    /// The lot carries no rule.
    NoRule,
    /// The lot's position could not be resolved.
    PositionUnavailable,
    /// Called from outside the simulation thread.
    OffThread,

    // ── Allowed by the rule ───────────────────────────────────────────────
    /// Neither eligibility axis is enabled for non-visitors.
    Unrestricted,
    VisitorAllowed,
    ResidentWithinRadius,
    WorkSchoolWithinRadius,

    // ── Denied ────────────────────────────────────────────────────────────
    /// The actor could not be identified.
    NoActorContext,
    VisitorsNotAllowed,
    /// Only the residency axis is enabled and the home is too far or unknown.
    ResidencyOutOfRadius,
    /// Only the work/school axis is enabled and the work place is too far or
    /// unknown.
    WorkSchoolOutOfRadius,
    /// Both axes are enabled and neither passes.
    OutOfAllRadii,
}

impl ReasonCode {
    /// `true` for reasons that allow parking because enforcement could not
    /// run, rather than because the rule permits it.
    pub fn is_fail_open(self) -> bool {
        matches!(
            self,
            ReasonCode::NotActive
                | ReasonCode::NoRule
                | ReasonCode::PositionUnavailable
                | ReasonCode::OffThread
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReasonCode::NotActive              => "not_active",
            ReasonCode::NoRule                 => "no_rule",
            ReasonCode::PositionUnavailable    => "position_unavailable",
            ReasonCode::OffThread              => "off_thread",
            ReasonCode::Unrestricted           => "unrestricted",
            ReasonCode::VisitorAllowed         => "visitor_allowed",
            ReasonCode::ResidentWithinRadius   => "resident_within_radius",
            ReasonCode::WorkSchoolWithinRadius => "work_school_within_radius",
            ReasonCode::NoActorContext         => "no_actor_context",
            ReasonCode::VisitorsNotAllowed     => "visitors_not_allowed",
            ReasonCode::ResidencyOutOfRadius   => "residency_out_of_radius",
            ReasonCode::WorkSchoolOutOfRadius  => "work_school_out_of_radius",
            ReasonCode::OutOfAllRadii          => "out_of_all_radii",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one permission check.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Decision {
    pub allowed: bool,
    pub reason:  ReasonCode,
}

impl Decision {
    #[inline]
    pub fn allow(reason: ReasonCode) -> Self {
        Self { allowed: true, reason }
    }

    #[inline]
    pub fn deny(reason: ReasonCode) -> Self {
        Self { allowed: false, reason }
    }

    #[inline]
    pub fn is_allowed(self) -> bool {
        self.allowed
    }

    #[inline]
    pub fn is_denied(self) -> bool {
        !self.allowed
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verdict = if self.allowed { "allowed" } else { "denied" };
        write!(f, "{verdict} ({})", self.reason)
    }
}
