//! The lot index.
//!
//! # Data layout
//!
//! ```text
//! CellKey ──► [BuildingId, …]   one entry per building per cell it touches
//! ```
//!
//! A building appears in every cell that holds at least one of its parking
//! spaces.  Parking-space coordinates are not stored: a query fetches them
//! from the host for the few candidates in the 3×3 neighbourhood and does an
//! exact planar distance test.  That keeps the index valid even if the host
//! nudges space geometry slightly between rebuilds.
//!
//! # Staleness
//!
//! The index stamps the rule store version it was built from.  A query with
//! a newer store triggers a full rebuild first.  Between rebuilds candidates
//! are still re-checked against the live store and the host's scope test,
//! so a stale cell entry can never produce a hit for an unruled building.

use rustc_hash::FxHashMap;

use pw_core::{BuildingId, CityHost, Position};
use pw_rules::{Rule, RuleStore};

use crate::CellKey;

/// Snap distance used when the caller has no better value.
pub const DEFAULT_SNAP_DISTANCE: f32 = 8.0;

/// Snapshot of index size, for diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct IndexStats {
    /// Rule store version the index was built from; `None` if never built.
    pub built_version: Option<u64>,
    /// Non-empty grid cells.
    pub cells: usize,
    /// Buildings with at least one indexed parking space.
    pub indexed_buildings: usize,
    /// Ruled buildings left out because their geometry was unavailable.
    pub skipped_buildings: usize,
}

/// Grid hash from world position to rule-governed lots.
#[derive(Debug, Default)]
pub struct LotIndex {
    cells:         FxHashMap<CellKey, Vec<BuildingId>>,
    built_version: Option<u64>,
    indexed:       usize,
    skipped:       usize,
}

impl LotIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if the index does not reflect `rules` any more.
    #[inline]
    pub fn is_stale(&self, rules: &RuleStore) -> bool {
        self.built_version != Some(rules.version())
    }

    /// Forget everything; the next query rebuilds.
    pub fn invalidate(&mut self) {
        self.cells.clear();
        self.built_version = None;
        self.indexed = 0;
        self.skipped = 0;
    }

    /// Rebuild if stale.  Returns `true` if a rebuild happened.
    pub fn ensure_current<H: CityHost + ?Sized>(&mut self, host: &H, rules: &RuleStore) -> bool {
        if !self.is_stale(rules) {
            return false;
        }
        self.rebuild(host, rules);
        true
    }

    /// Drop all cells and re-insert every ruled building's parking spaces.
    ///
    /// Buildings whose geometry the host cannot resolve are left out for
    /// this version; they come back on the next rebuild if the host can
    /// resolve them by then.
    pub fn rebuild<H: CityHost + ?Sized>(&mut self, host: &H, rules: &RuleStore) {
        self.cells.clear();
        self.indexed = 0;
        self.skipped = 0;

        for building in rules.sorted_buildings() {
            let Some(spaces) = host.parking_spaces(building) else {
                self.skipped += 1;
                continue;
            };

            let mut inserted = false;
            for pos in spaces.into_iter().filter(|p| p.is_finite()) {
                let cell = self.cells.entry(CellKey::of(pos)).or_default();
                // Buildings are inserted one at a time, so a duplicate can
                // only be the most recent entry.
                if cell.last() != Some(&building) {
                    cell.push(building);
                }
                inserted = true;
            }

            if inserted {
                self.indexed += 1;
            } else {
                self.skipped += 1;
            }
        }

        self.built_version = Some(rules.version());
        tracing::debug!(
            version = rules.version(),
            cells = self.cells.len(),
            indexed = self.indexed,
            skipped = self.skipped,
            "lot index rebuilt"
        );
    }

    /// The nearest in-scope ruled building with a parking space within
    /// `max_snap` of `position`, together with its rule.
    ///
    /// Only the 3×3 cell neighbourhood of `position` is scanned, so snap
    /// distances larger than [`CELL_SIZE`](crate::CELL_SIZE) do not widen
    /// the search.  Ties go to the lower building id.
    pub fn find_building<H: CityHost + ?Sized>(
        &mut self,
        host:     &H,
        rules:    &RuleStore,
        position: Position,
        max_snap: f32,
    ) -> Option<(BuildingId, Rule)> {
        if !position.is_finite() || max_snap.is_nan() || max_snap < 0.0 {
            return None;
        }
        self.ensure_current(host, rules);

        let mut candidates: Vec<BuildingId> = CellKey::of(position)
            .neighbourhood()
            .filter_map(|cell| self.cells.get(&cell))
            .flatten()
            .copied()
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        let snap_sq = max_snap * max_snap;
        let mut best: Option<(f32, BuildingId, Rule)> = None;

        for building in candidates {
            let Some(rule) = rules.get(building) else { continue };
            if !host.building_exists(building) || !host.is_supported_lot(building) {
                continue;
            }
            let Some(spaces) = host.parking_spaces(building) else { continue };

            let nearest = spaces
                .iter()
                .map(|&space| space.planar_distance_sq(position))
                .filter(|d| *d <= snap_sq)
                .fold(None, |acc: Option<f32>, d| Some(acc.map_or(d, |a| a.min(d))));

            if let Some(d) = nearest {
                if best.is_none_or(|(bd, _, _)| d < bd) {
                    best = Some((d, building, rule));
                }
            }
        }

        best.map(|(_, building, rule)| (building, rule))
    }

    /// Convenience wrapper returning only the building id.
    pub fn find_building_id<H: CityHost + ?Sized>(
        &mut self,
        host:     &H,
        rules:    &RuleStore,
        position: Position,
        max_snap: f32,
    ) -> Option<BuildingId> {
        self.find_building(host, rules, position, max_snap).map(|(b, _)| b)
    }

    /// Buildings registered in the cell containing `position`.  For
    /// diagnostics; performs no staleness check.
    pub fn buildings_in_cell(&self, position: Position) -> &[BuildingId] {
        self.cells.get(&CellKey::of(position)).map_or(&[], Vec::as_slice)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            built_version:     self.built_version,
            cells:             self.cells.len(),
            indexed_buildings: self.indexed,
            skipped_buildings: self.skipped,
        }
    }
}
