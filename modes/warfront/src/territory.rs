//! Territory Cell and per-team Resource Pool (§3).

use std::collections::HashMap;

use crate::constants::{GRID_SIZE, MAX_FORTIFICATION, MAX_HEALTH};

#[derive(Debug, Clone)]
pub struct TerritoryCell {
    pub id: usize,
    pub x: i32,
    pub y: i32,
    pub owner: Option<String>,
    pub health: i32,
    pub fortification: u32,
    /// Per-team capture progress in `[0, CAPTURE_THRESHOLD)`; cleared on capture (§3
    /// invariant: "capturing resets all capture progress to zero").
    pub capture_progress: HashMap<String, f64>,
}

impl TerritoryCell {
    pub fn new(id: usize, x: i32, y: i32) -> Self {
        TerritoryCell { id, x, y, owner: None, health: 0, fortification: 0, capture_progress: HashMap::new() }
    }

    /// §3 invariant: owner is null iff health is zero, during the neutral/transition
    /// phase (once captured, health is immediately restored to max).
    pub fn is_neutral(&self) -> bool {
        self.owner.is_none()
    }

    pub fn progress_of(&self, team_id: &str) -> f64 {
        self.capture_progress.get(team_id).copied().unwrap_or(0.0)
    }

    /// Applies a capture delta and performs the ownership transition once
    /// `CAPTURE_THRESHOLD` is crossed. Returns true if ownership changed this call.
    pub fn advance_capture(&mut self, team_id: &str, delta: f64, threshold: f64) -> bool {
        let entry = self.capture_progress.entry(team_id.to_string()).or_insert(0.0);
        *entry = (*entry + delta).max(0.0);
        if *entry >= threshold {
            self.owner = Some(team_id.to_string());
            self.health = MAX_HEALTH;
            self.fortification = 0;
            self.capture_progress.clear();
            true
        } else {
            false
        }
    }

    pub fn heal(&mut self, amount: i32) {
        if self.owner.is_some() {
            self.health = (self.health + amount).min(MAX_HEALTH);
        }
    }

    pub fn damage(&mut self, amount: i32) {
        self.health = (self.health - amount).max(0);
    }

    pub fn fortify(&mut self, levels: u32) {
        self.fortification = (self.fortification + levels).min(MAX_FORTIFICATION);
    }
}

pub fn build_grid() -> Vec<TerritoryCell> {
    let mut cells = Vec::with_capacity((GRID_SIZE * GRID_SIZE) as usize);
    let mut id = 0;
    for y in 0..GRID_SIZE {
        for x in 0..GRID_SIZE {
            cells.push(TerritoryCell::new(id, x, y));
            id += 1;
        }
    }
    cells
}

/// A team's non-negative resource counters (§3: "spend is atomic: either all
/// counters decrease or none do").
#[derive(Debug, Default, Clone)]
pub struct ResourcePool {
    counters: HashMap<String, i64>,
}

impl ResourcePool {
    pub fn grant(&mut self, resource: &str, amount: i64) {
        *self.counters.entry(resource.to_string()).or_insert(0) += amount;
    }

    pub fn balance(&self, resource: &str) -> i64 {
        self.counters.get(resource).copied().unwrap_or(0)
    }

    /// Attempts to debit every `(resource, amount)` pair atomically; either every
    /// counter has sufficient balance and all are debited, or none are.
    pub fn try_spend(&mut self, costs: &[(&str, i64)]) -> bool {
        if !costs.iter().all(|(res, amt)| self.balance(res) >= *amt) {
            return false;
        }
        for (res, amt) in costs {
            *self.counters.entry(res.to_string()).or_insert(0) -= amt;
        }
        true
    }

    pub fn as_map(&self) -> &HashMap<String, i64> {
        &self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_crosses_threshold_and_resets_progress() {
        let mut cell = TerritoryCell::new(0, 0, 0);
        let changed = cell.advance_capture("alpha", 0.6, 1.0);
        assert!(!changed);
        let changed = cell.advance_capture("alpha", 0.5, 1.0);
        assert!(changed);
        assert_eq!(cell.owner.as_deref(), Some("alpha"));
        assert_eq!(cell.health, MAX_HEALTH);
        assert!(cell.capture_progress.is_empty());
    }

    #[test]
    fn neutral_cell_has_zero_health() {
        let cell = TerritoryCell::new(0, 0, 0);
        assert!(cell.is_neutral());
        assert_eq!(cell.health, 0);
    }

    #[test]
    fn resource_spend_is_all_or_nothing() {
        let mut pool = ResourcePool::default();
        pool.grant("iron", 10);
        pool.grant("wood", 3);
        assert!(!pool.try_spend(&[("iron", 5), ("wood", 10)]));
        assert_eq!(pool.balance("iron"), 10);
        assert!(pool.try_spend(&[("iron", 5), ("wood", 3)]));
        assert_eq!(pool.balance("iron"), 5);
        assert_eq!(pool.balance("wood"), 0);
    }
}
