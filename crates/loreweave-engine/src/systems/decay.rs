//! Relationship decay: bonds weaken unless something maintains them.

use loreweave_graph::WorldGraph;
use loreweave_types::{
    DomainSchema, RelationshipCategory, RelationshipStatus, StrengthAdjustment, SystemResult,
};

use crate::rng::SimRng;
use crate::systems::SimulationSystem;

/// Chance the decay pass runs on a given tick, before era weighting.
const RUN_CHANCE: f64 = 0.9;

const fn decay_rate(category: RelationshipCategory) -> f64 {
    match category {
        RelationshipCategory::Social => 0.010,
        RelationshipCategory::Political => 0.008,
        RelationshipCategory::Institutional => 0.004,
        RelationshipCategory::ImmutableFact => 0.0,
    }
}

/// Per-tick strength erosion on active, non-immutable relationships.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipDecay;

impl SimulationSystem for RelationshipDecay {
    fn name(&self) -> &'static str {
        "relationship_decay"
    }

    fn apply(
        &self,
        graph: &WorldGraph,
        _schema: &DomainSchema,
        era_modifier: f64,
        rng: &mut SimRng,
    ) -> SystemResult {
        if !rng.roll_scaled(RUN_CHANCE, era_modifier) {
            return SystemResult::dormant(self.name());
        }

        let mut result = SystemResult::empty("");
        for r in graph.relationships() {
            if r.status != RelationshipStatus::Active {
                continue;
            }
            let rate = decay_rate(r.category);
            if rate <= 0.0 {
                continue;
            }
            result.relationships_adjusted.push(StrengthAdjustment {
                kind: r.kind.clone(),
                src: r.src,
                dst: r.dst,
                delta: -rate,
            });
        }
        result.description = format!("{} bonds eroded", result.relationships_adjusted.len());
        result
    }
}
