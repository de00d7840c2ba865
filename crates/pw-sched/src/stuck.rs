//! Stuck-vehicle memory across day boundaries.
//!
//! A vehicle caught mid-parking once is normal: its owner may simply be on
//! the way.  Caught with the same owner on two consecutive simulated days,
//! it is stuck.  The tracker keeps two generations, `today` and
//! `yesterday`, and rotates them when the host reports a new day.

use rustc_hash::FxHashMap;

use pw_core::{CitizenId, ParkedVehicleId};

#[derive(Debug, Default)]
pub struct StuckTracker {
    today:     FxHashMap<ParkedVehicleId, CitizenId>,
    yesterday: FxHashMap<ParkedVehicleId, CitizenId>,
    rotations: u64,
}

impl StuckTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `parked` as a stuck candidate owned by `owner` today.
    ///
    /// Returns `true` if it was also a candidate yesterday with the same
    /// owner, i.e. it is stuck.
    pub fn observe(&mut self, parked: ParkedVehicleId, owner: CitizenId) -> bool {
        self.today.insert(parked, owner);
        self.yesterday.get(&parked) == Some(&owner)
    }

    /// Forget `parked` in both generations (after it was finalized).
    pub fn forget(&mut self, parked: ParkedVehicleId) {
        self.today.remove(&parked);
        self.yesterday.remove(&parked);
    }

    /// Today becomes yesterday; today starts empty.
    pub fn rotate(&mut self) {
        self.yesterday = std::mem::take(&mut self.today);
        self.rotations += 1;
    }

    pub fn clear(&mut self) {
        self.today.clear();
        self.yesterday.clear();
    }

    pub fn seen_today(&self) -> usize {
        self.today.len()
    }

    pub fn seen_yesterday(&self) -> usize {
        self.yesterday.len()
    }

    /// Day boundaries observed since creation.
    pub fn rotations(&self) -> u64 {
        self.rotations
    }
}
