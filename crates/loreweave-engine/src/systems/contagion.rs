//! Belief contagion: convictions spread along social bonds.
//!
//! An NPC carrying a `belief` text tag transmits it across each of its
//! active outgoing social edges with probability proportional to bond
//! strength. Adoption is durable graph state; later templates react to the
//! tag, not to this system.

use loreweave_graph::WorldGraph;
use loreweave_types::{
    DomainSchema, EntityChange, EntityPatch, RelationshipCategory, RelationshipStatus,
    SystemResult,
};

use crate::rng::SimRng;
use crate::systems::SimulationSystem;

/// Chance the contagion pass runs, before era weighting.
const RUN_CHANCE: f64 = 0.5;
/// Transmission factor applied to bond strength.
const TRANSMISSION: f64 = 0.4;
/// Tag key carrying an NPC's belief.
const BELIEF_TAG: &str = "belief";

/// The belief contagion pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeliefContagion;

impl SimulationSystem for BeliefContagion {
    fn name(&self) -> &'static str {
        "belief_contagion"
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
        let mut adoptions = 0_u32;
        for carrier in graph.entities() {
            let Some(belief) = carrier.tags.text(BELIEF_TAG) else {
                continue;
            };
            for r in &carrier.links {
                if r.status != RelationshipStatus::Active
                    || r.category != RelationshipCategory::Social
                {
                    continue;
                }
                let susceptible = graph
                    .get_entity(r.dst)
                    .is_some_and(|e| e.kind == "npc" && !e.tags.contains(BELIEF_TAG));
                if !susceptible {
                    continue;
                }
                if rng.roll(r.strength * TRANSMISSION) {
                    result.entities_modified.push(EntityChange {
                        id: r.dst,
                        changes: EntityPatch::tag(BELIEF_TAG, belief),
                    });
                    adoptions = adoptions.saturating_add(1);
                }
            }
        }
        if adoptions > 0 {
            result
                .pressure_changes
                .insert(String::from("cultural_tension"), 0.2 * f64::from(adoptions));
        }
        result.description = format!("{adoptions} beliefs adopted");
        result
    }
}

#[cfg(test)]
mod tests {
    use loreweave_types::EntityId;
    use loreweave_types::PendingEntity;
    use loreweave_types::TagMap;

    use super::*;

    fn believer(graph: &mut WorldGraph, name: &str, belief: Option<&str>) -> EntityId {
        let mut tags = TagMap::new();
        if let Some(belief) = belief {
            tags.set(BELIEF_TAG, belief);
        }
        graph.create_entity(
            PendingEntity {
                kind: String::from("npc"),
                subtype: String::from("mystic"),
                name: String::from(name),
                tags,
                ..PendingEntity::default()
            },
            "alive",
        )
    }

    #[test]
    fn belief_spreads_only_along_social_edges() {
        let schema = DomainSchema::baseline();
        let mut spread = false;
        for seed in 0..32 {
            let mut graph = WorldGraph::new();
            let prophet = believer(&mut graph, "Thessa", Some("river_creed"));
            let friend = believer(&mut graph, "Bram", None);
            let liege = believer(&mut graph, "Sella", None);
            assert!(graph.add_relationship(
                "friend_of",
                prophet,
                friend,
                1.0,
                None,
                RelationshipCategory::Social,
            ));
            assert!(graph.add_relationship(
                "member_of",
                prophet,
                liege,
                1.0,
                None,
                RelationshipCategory::Institutional,
            ));

            let mut rng = SimRng::seed_from_u64(seed);
            let result = BeliefContagion.apply(&graph, &schema, 1.0, &mut rng);
            for change in &result.entities_modified {
                spread = true;
                assert_eq!(change.id, friend);
                let adopted = change
                    .changes
                    .set_tags
                    .iter()
                    .any(|(key, value)| key == BELIEF_TAG && value.as_text() == Some("river_creed"));
                assert!(adopted);
            }
        }
        assert!(spread);
    }

    #[test]
    fn existing_belief_is_not_overwritten() {
        let schema = DomainSchema::baseline();
        for seed in 0..32 {
            let mut graph = WorldGraph::new();
            let prophet = believer(&mut graph, "Thessa", Some("river_creed"));
            let rival = believer(&mut graph, "Bram", Some("ash_creed"));
            assert!(graph.add_relationship(
                "friend_of",
                prophet,
                rival,
                1.0,
                None,
                RelationshipCategory::Social,
            ));
            let mut rng = SimRng::seed_from_u64(seed);
            let result = BeliefContagion.apply(&graph, &schema, 1.0, &mut rng);
            assert!(result.entities_modified.is_empty());
        }
    }
}
