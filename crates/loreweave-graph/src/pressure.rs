//! Clamped scalar pressure map with summed delta application.
//!
//! Pressures are named world-tension scalars (`conflict`,
//! `resource_scarcity`, `magical_instability`, ...) in `[0, 100]`. Systems
//! and templates both read them and propose deltas; deltas from multiple
//! sources within one tick accumulate in a pending buffer and are summed
//! before a single clamped apply, so ordering of proposals within a tick
//! does not matter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lower clamp bound for every pressure value.
pub const PRESSURE_MIN: f64 = 0.0;
/// Upper clamp bound for every pressure value.
pub const PRESSURE_MAX: f64 = 100.0;

/// The named pressure scalars plus the per-tick pending delta buffer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PressureMap {
    values: BTreeMap<String, f64>,
    #[serde(skip)]
    pending: BTreeMap<String, f64>,
}

impl PressureMap {
    /// Create an empty pressure map.
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            pending: BTreeMap::new(),
        }
    }

    /// Read a pressure value, defaulting to 0 for unknown names.
    pub fn pressure(&self, id: &str) -> f64 {
        self.values.get(id).copied().unwrap_or(0.0)
    }

    /// Set a pressure directly (seeding), clamped to the valid range.
    pub fn set(&mut self, id: &str, value: f64) {
        self.values
            .insert(String::from(id), value.clamp(PRESSURE_MIN, PRESSURE_MAX));
    }

    /// Accumulate a proposed delta into the pending buffer.
    pub fn propose(&mut self, id: &str, delta: f64) {
        let slot = self.pending.entry(String::from(id)).or_insert(0.0);
        *slot += delta;
    }

    /// Accumulate a batch of proposed deltas.
    pub fn propose_all(&mut self, deltas: &BTreeMap<String, f64>) {
        for (id, delta) in deltas {
            self.propose(id, *delta);
        }
    }

    /// Apply all pending deltas in one pass, clamping each result, and
    /// clear the buffer. Returns the `(name, new value)` pairs that changed.
    pub fn apply_pending(&mut self) -> Vec<(String, f64)> {
        let pending = core::mem::take(&mut self.pending);
        let mut applied = Vec::with_capacity(pending.len());
        for (id, delta) in pending {
            let current = self.pressure(&id);
            let next = (current + delta).clamp(PRESSURE_MIN, PRESSURE_MAX);
            self.values.insert(id.clone(), next);
            applied.push((id, next));
        }
        applied
    }

    /// Move a pressure one bounded step toward a target, without going
    /// through the pending buffer. The tick driver uses this to bleed
    /// channels back toward zero between sources.
    pub fn smooth_toward(&mut self, id: &str, target: f64, step: f64) {
        let current = self.pressure(id);
        let next = if (current - target).abs() <= step {
            target
        } else if current < target {
            current + step
        } else {
            current - step
        };
        self.set(id, next);
    }

    /// Iterate over all known pressures in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.values.iter()
    }

    /// `true` when deltas are waiting to be applied.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
