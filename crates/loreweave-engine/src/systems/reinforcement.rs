//! Relationship reinforcement: shared context strengthens bonds.
//!
//! Bonds whose endpoints still share a location regain strength, offsetting
//! decay; romances reinforce regardless of residence.

use loreweave_graph::WorldGraph;
use loreweave_types::{
    DomainSchema, RelationshipCategory, RelationshipStatus, StrengthAdjustment, SystemResult,
};

use crate::rng::SimRng;
use crate::systems::{SimulationSystem, location_of};

/// Chance the reinforcement pass runs, before era weighting.
const RUN_CHANCE: f64 = 0.6;
/// Strength regained by co-resident bonds.
const SHARED_PLACE_GAIN: f64 = 0.02;
/// Strength regained by romances wherever the pair lives.
const ROMANCE_GAIN: f64 = 0.03;

/// The reinforcement pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipReinforcement;

impl SimulationSystem for RelationshipReinforcement {
    fn name(&self) -> &'static str {
        "relationship_reinforcement"
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
            if r.status != RelationshipStatus::Active
                || r.category == RelationshipCategory::ImmutableFact
            {
                continue;
            }
            let gain = if r.kind == "lover_of" {
                ROMANCE_GAIN
            } else {
                let shared = match (location_of(graph, r.src), location_of(graph, r.dst)) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                };
                if !shared {
                    continue;
                }
                SHARED_PLACE_GAIN
            };
            result.relationships_adjusted.push(StrengthAdjustment {
                kind: r.kind.clone(),
                src: r.src,
                dst: r.dst,
                delta: gain,
            });
        }
        result.description = format!("{} bonds reinforced", result.relationships_adjusted.len());
        result
    }
}

#[cfg(test)]
mod tests {
    use loreweave_types::{EntityId, PendingEntity};

    use super::*;

    fn npc(graph: &mut WorldGraph, name: &str) -> EntityId {
        graph.create_entity(
            PendingEntity {
                kind: String::from("npc"),
                subtype: String::from("merchant"),
                name: String::from(name),
                ..PendingEntity::default()
            },
            "alive",
        )
    }

    fn place(graph: &mut WorldGraph, name: &str) -> EntityId {
        graph.create_entity(
            PendingEntity {
                kind: String::from("location"),
                subtype: String::from("colony"),
                name: String::from(name),
                ..PendingEntity::default()
            },
            "stable",
        )
    }

    fn resident(graph: &mut WorldGraph, who: EntityId, at: EntityId) {
        assert!(graph.add_relationship(
            "resident_of",
            who,
            at,
            0.6,
            None,
            RelationshipCategory::Institutional,
        ));
    }

    #[test]
    fn only_co_resident_bonds_reinforce() {
        let mut graph = WorldGraph::new();
        let schema = DomainSchema::baseline();
        let home = place(&mut graph, "Greyfen");
        let away = place(&mut graph, "Oldmarch");
        let a = npc(&mut graph, "Bram");
        let b = npc(&mut graph, "Sella");
        let c = npc(&mut graph, "Odric");
        resident(&mut graph, a, home);
        resident(&mut graph, b, home);
        resident(&mut graph, c, away);
        assert!(graph.add_relationship("friend_of", a, b, 0.5, None, RelationshipCategory::Social));
        assert!(graph.add_relationship("friend_of", a, c, 0.5, None, RelationshipCategory::Social));

        let mut ran = false;
        for seed in 0..16 {
            let mut rng = SimRng::seed_from_u64(seed);
            let result = RelationshipReinforcement.apply(&graph, &schema, 1.0, &mut rng);
            if result.is_empty() {
                continue;
            }
            ran = true;
            let friendships: Vec<_> = result
                .relationships_adjusted
                .iter()
                .filter(|adj| adj.kind == "friend_of")
                .collect();
            assert_eq!(friendships.len(), 1);
            assert_eq!(friendships.first().map(|adj| adj.dst), Some(b));
        }
        assert!(ran);
    }

    #[test]
    fn romance_reinforces_across_distance() {
        let mut graph = WorldGraph::new();
        let schema = DomainSchema::baseline();
        let a = npc(&mut graph, "Bram");
        let b = npc(&mut graph, "Sella");
        assert!(graph.add_relationship("lover_of", a, b, 0.8, None, RelationshipCategory::Social));

        let mut ran = false;
        for seed in 0..16 {
            let mut rng = SimRng::seed_from_u64(seed);
            let result = RelationshipReinforcement.apply(&graph, &schema, 1.0, &mut rng);
            if result.is_empty() {
                continue;
            }
            ran = true;
            let adjusted = result.relationships_adjusted.first();
            assert_eq!(adjusted.map(|adj| adj.kind.as_str()), Some("lover_of"));
            assert_eq!(adjusted.map(|adj| adj.delta > 0.0), Some(true));
        }
        assert!(ran);
    }
}
