//! Call-scoped "who is asking" propagation.
//!
//! # Why this exists
//!
//! Permission checks are reached from many unrelated host call sites: a
//! citizen's parking search, a vehicle's arrival handling, the audit
//! scheduler's own relocation attempts.  Threading the actor through every
//! one of those signatures is not an option, so each call site opens an
//! *episode* naming the actor before it starts checking candidate lots, and
//! the evaluator reads and annotates the innermost episode.
//!
//! # Episodes
//!
//! ```text
//! let _episode = ctx.scope(vehicle, citizen, "path_find")?;   // push
//! evaluator.evaluate_vehicle(..);                              // peek + record
//! evaluator.evaluate_vehicle(..);
//! // guard dropped → pop, summary logged if the episode was long
//! ```
//!
//! Episodes nest.  When a guard ends, the stack is cut back to the depth it
//! had *before* that guard's push, so frames leaked by an inner caller that
//! forgot to pop (or that bailed out through a panic) never outlive the
//! outer episode.
//!
//! # Thread confinement
//!
//! The context belongs to the simulation thread.  From any other thread it
//! reports "no context", refuses pushes and ignores records, warning once
//! per call site.

use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

use pw_core::{CitizenId, EngineSettings, ThreadAffinity, VehicleId};

use crate::Decision;
use crate::decision::ReasonCode;

// ── Frame ─────────────────────────────────────────────────────────────────────

/// Per-episode counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EpisodeStats {
    /// Candidate lots checked.
    pub checks:    u32,
    pub allowed:   u32,
    pub denied:    u32,
    /// Allowed checks that were fail-open rather than rule-based.
    pub fail_open: u32,
    /// Visitor flag of the last resolved actor, if any check resolved one.
    pub visitor:   Option<bool>,
    pub last_reason: Option<ReasonCode>,
}

impl EpisodeStats {
    fn record(&mut self, decision: Decision) {
        self.checks = self.checks.saturating_add(1);
        if decision.allowed {
            self.allowed = self.allowed.saturating_add(1);
            if decision.reason.is_fail_open() {
                self.fail_open = self.fail_open.saturating_add(1);
            }
        } else {
            self.denied = self.denied.saturating_add(1);
        }
        self.last_reason = Some(decision.reason);
    }
}

/// One entry of the context stack.
#[derive(Clone, Debug)]
pub struct Frame {
    pub vehicle: VehicleId,
    pub citizen: CitizenId,
    /// Human-readable origin of the episode, e.g. `"path_find"`.
    pub source:  &'static str,
    pub stats:   EpisodeStats,
    pub started: Instant,
    /// Unique per context; lets a guard recognise its own frame.
    id:          u64,
}

/// What an ended episode looked like.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeSummary {
    pub vehicle: VehicleId,
    pub citizen: CitizenId,
    pub source:  &'static str,
    pub stats:   EpisodeStats,
    pub elapsed: Duration,
    /// Stack depth the episode ran at (1 = outermost).
    pub depth:   usize,
}

// ── DecisionContext ───────────────────────────────────────────────────────────

/// Thread-bound stack of episode frames.
///
/// Interior mutability lets the evaluator record into the innermost frame
/// through a shared reference while an [`EpisodeGuard`] is alive.  The type
/// is `Send` but not `Sync`.
#[derive(Debug)]
pub struct DecisionContext {
    affinity:           ThreadAffinity,
    frames:             RefCell<Vec<Frame>>,
    next_id:            Cell<u64>,
    summary_min_checks: u32,
    summary_slow:       Duration,
}

impl DecisionContext {
    /// Create a context bound to the calling thread.
    pub fn new(summary_min_checks: u32, summary_slow: Duration) -> Self {
        Self {
            affinity: ThreadAffinity::current(),
            frames:   RefCell::new(Vec::new()),
            next_id:  Cell::new(0),
            summary_min_checks,
            summary_slow,
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(settings.summary_min_checks, settings.summary_slow_episode())
    }

    /// Pick up new summary thresholds.  Open episodes are kept.
    pub fn configure(&mut self, settings: &EngineSettings) {
        self.summary_min_checks = settings.summary_min_checks;
        self.summary_slow = settings.summary_slow_episode();
    }

    pub fn rebind_to_current_thread(&mut self) {
        self.affinity.rebind_to_current();
    }

    // ── Episodes ──────────────────────────────────────────────────────────

    /// Open an episode that ends when the returned guard is dropped.
    ///
    /// Returns `None` off the simulation thread.
    pub fn scope(
        &self,
        vehicle: VehicleId,
        citizen: CitizenId,
        source:  &'static str,
    ) -> Option<EpisodeGuard<'_>> {
        if !self.affinity.check("decision_context.scope") {
            return None;
        }
        let (depth, id) = self.push_frame(vehicle, citizen, source);
        Some(EpisodeGuard { ctx: self, depth, id, done: false })
    }

    /// Open an episode without a guard.  The caller must [`pop`](Self::pop)
    /// it.  Returns `false` off the simulation thread.
    pub fn push(&self, vehicle: VehicleId, citizen: CitizenId, source: &'static str) -> bool {
        if !self.affinity.check("decision_context.push") {
            return false;
        }
        self.push_frame(vehicle, citizen, source);
        true
    }

    /// End the innermost episode.  `None` if the stack is empty or the call
    /// comes from another thread.
    pub fn pop(&self) -> Option<EpisodeSummary> {
        if !self.affinity.check("decision_context.pop") {
            return None;
        }
        let depth = self.frames.borrow().len();
        if depth == 0 {
            tracing::warn!("decision context pop without a matching push");
            return None;
        }
        self.end_episode(depth, None)
    }

    /// The innermost frame, or `None` if no episode is open.
    pub fn peek(&self) -> Option<Frame> {
        if !self.affinity.check("decision_context.peek") {
            return None;
        }
        self.frames.borrow().last().cloned()
    }

    /// Number of open episodes.  `0` off the simulation thread.
    pub fn depth(&self) -> usize {
        if !self.affinity.check("decision_context.depth") {
            return 0;
        }
        self.frames.borrow().len()
    }

    /// Drop every open episode without logging.  Returns how many were open.
    pub fn clear(&self) -> usize {
        if !self.affinity.check("decision_context.clear") {
            return 0;
        }
        let mut frames = self.frames.borrow_mut();
        let n = frames.len();
        frames.clear();
        n
    }

    // ── Recording (called by the evaluator) ───────────────────────────────

    /// Count `decision` against the innermost episode, if any.
    pub fn record_decision(&self, decision: Decision) {
        if !self.affinity.check("decision_context.record_decision") {
            return;
        }
        if let Some(frame) = self.frames.borrow_mut().last_mut() {
            frame.stats.record(decision);
        }
    }

    /// Note the visitor flag of the actor being evaluated.
    pub fn record_visitor(&self, visitor: bool) {
        if !self.affinity.check("decision_context.record_visitor") {
            return;
        }
        if let Some(frame) = self.frames.borrow_mut().last_mut() {
            frame.stats.visitor = Some(visitor);
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn push_frame(
        &self,
        vehicle: VehicleId,
        citizen: CitizenId,
        source:  &'static str,
    ) -> (usize, u64) {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        let mut frames = self.frames.borrow_mut();
        frames.push(Frame {
            vehicle,
            citizen,
            source,
            stats:   EpisodeStats::default(),
            started: Instant::now(),
            id,
        });
        (frames.len(), id)
    }

    /// Pop the frame at `depth` (1-based), discarding anything above it.
    ///
    /// With `owner` set, nothing happens unless the frame at `depth` is the
    /// one pushed under that id.
    fn end_episode(&self, depth: usize, owner: Option<u64>) -> Option<EpisodeSummary> {
        let frame = {
            let mut frames = self.frames.borrow_mut();
            if frames.len() < depth {
                // Already gone: cleared by a reset or popped by hand.
                return None;
            }
            if owner.is_some_and(|owner| frames[depth - 1].id != owner) {
                // Our frame went away and a newer episode took its slot.
                return None;
            }
            if frames.len() > depth {
                tracing::warn!(
                    leaked = frames.len() - depth,
                    depth,
                    "decision context episodes left open by an inner caller; discarding"
                );
                frames.truncate(depth);
            }
            frames.pop()?
        };

        let summary = EpisodeSummary {
            vehicle: frame.vehicle,
            citizen: frame.citizen,
            source:  frame.source,
            elapsed: frame.started.elapsed(),
            stats:   frame.stats,
            depth,
        };

        if summary.stats.checks >= self.summary_min_checks || summary.elapsed >= self.summary_slow {
            tracing::debug!(
                source = summary.source,
                vehicle = %summary.vehicle,
                citizen = %summary.citizen,
                checks = summary.stats.checks,
                allowed = summary.stats.allowed,
                denied = summary.stats.denied,
                fail_open = summary.stats.fail_open,
                visitor = ?summary.stats.visitor,
                elapsed_us = summary.elapsed.as_micros() as u64,
                depth,
                "parking search episode"
            );
        }
        Some(summary)
    }
}

// ── EpisodeGuard ──────────────────────────────────────────────────────────────

/// Ends its episode when dropped, including during unwinding.
#[must_use = "dropping the guard ends the episode immediately"]
pub struct EpisodeGuard<'a> {
    ctx:   &'a DecisionContext,
    depth: usize,
    id:    u64,
    done:  bool,
}

impl EpisodeGuard<'_> {
    /// Stack depth of this episode (1 = outermost).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// End the episode now and return its summary.
    pub fn finish(mut self) -> Option<EpisodeSummary> {
        self.done = true;
        self.ctx.end_episode(self.depth, Some(self.id))
    }
}

impl Drop for EpisodeGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.ctx.end_episode(self.depth, Some(self.id));
        }
    }
}
