//! Full-city sweep over ruled buildings.
//!
//! Explicit requests only cover lots whose rule just changed.  The sweep
//! makes sure every ruled lot gets audited once per pass, even if nobody
//! asked.  A pass runs in ascending building order; when it completes, the
//! next pass starts only after a day change (or an explicit reset).
//!
//! The building list is a snapshot of the rule store.  When the store
//! version moves, the list is rebuilt and the cursor repositioned just after
//! the last building handed out, so frequent rule edits do not restart the
//! pass from the beginning.

use pw_core::BuildingId;
use pw_rules::RuleStore;

#[derive(Debug)]
pub struct SweepCursor {
    buildings:       Vec<BuildingId>,
    cursor:          usize,
    version:         Option<u64>,
    last:            Option<BuildingId>,
    /// No pass in progress; the next call may start one only if
    /// `restart_pending`.
    finished:        bool,
    restart_pending: bool,
    passes:          u64,
}

impl SweepCursor {
    pub fn new() -> Self {
        // Nothing in progress yet; the first call starts the first pass.
        Self {
            buildings:       Vec::new(),
            cursor:          0,
            version:         None,
            last:            None,
            finished:        true,
            restart_pending: true,
            passes:          0,
        }
    }

    /// Let the next pass start as soon as the current one completes.
    pub fn request_restart(&mut self) {
        self.restart_pending = true;
    }

    /// Next building of the current pass.
    ///
    /// `reset` abandons the current pass and starts a fresh one.  Returns
    /// `None` if no buildings are ruled or the pass is complete and no
    /// restart is pending.
    pub fn next(&mut self, rules: &RuleStore, reset: bool) -> Option<BuildingId> {
        if reset {
            self.start_pass(rules);
        } else if self.version != Some(rules.version()) {
            self.refresh(rules);
        }

        if self.cursor >= self.buildings.len() {
            if !self.finished {
                self.finished = true;
                self.passes += 1;
                tracing::debug!(passes = self.passes, "parking sweep pass complete");
            }
            if !self.restart_pending {
                return None;
            }
            self.start_pass(rules);
            if self.buildings.is_empty() {
                return None;
            }
        }

        let building = self.buildings[self.cursor];
        self.cursor += 1;
        self.last = Some(building);
        Some(building)
    }

    /// Buildings left in the current pass.
    pub fn remaining(&self) -> usize {
        self.buildings.len().saturating_sub(self.cursor)
    }

    /// Ruled buildings in the current snapshot.
    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    /// Completed passes.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Forget all progress.  The next call starts a fresh pass.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn start_pass(&mut self, rules: &RuleStore) {
        self.buildings = rules.sorted_buildings();
        self.version = Some(rules.version());
        self.cursor = 0;
        self.last = None;
        self.finished = false;
        self.restart_pending = false;
    }

    fn refresh(&mut self, rules: &RuleStore) {
        self.buildings = rules.sorted_buildings();
        self.version = Some(rules.version());
        self.cursor = match self.last {
            Some(last) => self.buildings.partition_point(|&b| b <= last),
            None       => 0,
        };
        if self.finished {
            // a finished pass stays finished even if new rules appeared
            self.cursor = self.buildings.len();
        }
    }
}

impl Default for SweepCursor {
    fn default() -> Self {
        Self::new()
    }
}
