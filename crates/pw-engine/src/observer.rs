//! Audit observer trait for reporting and data collection.

use pw_sched::{AuditSummary, TickReport};

/// Callbacks invoked by
/// [`ParkingPolicyEngine::run_tick_observed`][crate::ParkingPolicyEngine::run_tick_observed].
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: eviction counter
///
/// ```rust,ignore
/// struct Evictions(u32);
///
/// impl AuditObserver for Evictions {
///     fn on_audit_finished(&mut self, summary: &AuditSummary) {
///         self.0 += summary.counters.released;
///     }
/// }
/// ```
pub trait AuditObserver {
    /// Called after every tick that did work.
    fn on_tick(&mut self, _report: &TickReport) {}

    /// Called once per building when its audit completes.
    fn on_audit_finished(&mut self, _summary: &AuditSummary) {}
}

/// An [`AuditObserver`] that does nothing.
pub struct NoopAuditObserver;

impl AuditObserver for NoopAuditObserver {}
