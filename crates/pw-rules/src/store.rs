//! `RuleStore`: versioned `BuildingId → Rule` mapping.

use rustc_hash::FxHashMap;

use pw_core::BuildingId;

use crate::{Rule, RuleError, RuleResult};

/// All configured parking rules plus a change counter.
///
/// The version starts at `0` and increases by one on every effective change.
/// Removing a building that has no rule, or re-inserting an identical rule,
/// is not a change.
#[derive(Debug, Default, Clone)]
pub struct RuleStore {
    rules:   FxHashMap<BuildingId, Rule>,
    version: u64,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach or replace the rule for `building`.  The rule is stored
    /// [normalized](Rule::normalized).
    ///
    /// Returns the previous rule, if any.
    pub fn insert(&mut self, building: BuildingId, rule: Rule) -> RuleResult<Option<Rule>> {
        if !building.is_valid() {
            return Err(RuleError::InvalidBuilding(building));
        }
        let rule = rule.normalized();
        let previous = self.rules.insert(building, rule);
        if previous != Some(rule) {
            self.version += 1;
        }
        Ok(previous)
    }

    /// Detach the rule for `building`, returning it.
    pub fn remove(&mut self, building: BuildingId) -> Option<Rule> {
        let removed = self.rules.remove(&building);
        if removed.is_some() {
            self.version += 1;
        }
        removed
    }

    /// Drop every rule.  Bumps the version once if anything was removed.
    pub fn clear(&mut self) {
        if !self.rules.is_empty() {
            self.rules.clear();
            self.version += 1;
        }
    }

    #[inline]
    pub fn get(&self, building: BuildingId) -> Option<Rule> {
        self.rules.get(&building).copied()
    }

    #[inline]
    pub fn contains(&self, building: BuildingId) -> bool {
        self.rules.contains_key(&building)
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterator over `(building, rule)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (BuildingId, Rule)> + '_ {
        self.rules.iter().map(|(&b, &r)| (b, r))
    }

    /// Ruled buildings in ascending id order.  Used wherever iteration order
    /// must be reproducible.
    pub fn sorted_buildings(&self) -> Vec<BuildingId> {
        let mut ids: Vec<BuildingId> = self.rules.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
