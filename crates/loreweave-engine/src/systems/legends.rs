//! Legend crystallization: renown hardens into lore.
//!
//! The one system that routinely creates entities. Figures woven far
//! enough into the world's memory (mythic while alive, or renowned and
//! dead) crystallize into a memorial `abilities` entity carrying their
//! story, linked back to the subject by a `derived_from` lineage edge.
//! Creation is bounded per tick and each figure crystallizes exactly once.

use tracing::debug;

use loreweave_graph::WorldGraph;
use loreweave_types::{
    DomainSchema, Entity, EntityChange, EntityId, EntityPatch, EntityRef, PendingEntity,
    Prominence, ProposedRelationship, SystemResult,
};

use crate::rng::SimRng;
use crate::systems::SimulationSystem;

/// Chance the crystallization pass runs, before era weighting.
const RUN_CHANCE: f64 = 0.2;
/// Memorials created per pass at most.
const MEMORIALS_PER_TICK: usize = 2;
/// Tag marking a figure whose legend already exists.
const MEMORIAL_TAG: &str = "memorialized";

/// `true` when the figure's standing warrants a legend.
fn warrants_legend(entity: &Entity) -> bool {
    entity.kind == "npc"
        && !entity.tags.contains(MEMORIAL_TAG)
        && (entity.prominence == Prominence::Mythic
            || (entity.prominence == Prominence::Renowned && entity.status == "dead"))
}

/// The crystallization pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegendCrystallization;

impl SimulationSystem for LegendCrystallization {
    fn name(&self) -> &'static str {
        "legend_crystallization"
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

        let mut candidates: Vec<EntityId> = graph
            .entities()
            .filter(|e| warrants_legend(e))
            .map(|e| e.id)
            .collect();

        let mut result = SystemResult::empty("");
        let mut arena_index = 0_usize;
        while arena_index < MEMORIALS_PER_TICK {
            let Some(picked) = rng.index(candidates.len()) else {
                break;
            };
            let subject_id = candidates.swap_remove(picked);
            let Some(subject) = graph.get_entity(subject_id) else {
                continue;
            };
            debug!(subject = %subject_id, name = %subject.name, "legend crystallizing");
            result.entities_created.push(PendingEntity {
                kind: String::from("abilities"),
                subtype: String::from("lore"),
                name: format!("The Legend of {}", subject.name),
                description: format!(
                    "The deeds of {} as the world retells them.",
                    subject.name
                ),
                culture: subject.culture.clone(),
                ..PendingEntity::default()
            });
            result.relationships_added.push(ProposedRelationship::linking(
                "derived_from",
                EntityRef::Pending(arena_index),
                EntityRef::Existing(subject_id),
            ));
            result.entities_modified.push(EntityChange {
                id: subject_id,
                changes: EntityPatch::tag(MEMORIAL_TAG, true),
            });
            arena_index = arena_index.saturating_add(1);
        }
        result.description = format!("{arena_index} legends crystallized");
        result
    }
}

#[cfg(test)]
mod tests {
    use loreweave_types::RelationshipStatus;

    use crate::commit::commit_system;

    use super::*;

    fn figure(graph: &mut WorldGraph, name: &str, prominence: Prominence, status: &str) -> EntityId {
        graph.create_entity(
            PendingEntity {
                kind: String::from("npc"),
                subtype: String::from("hero"),
                name: String::from(name),
                prominence,
                ..PendingEntity::default()
            },
            status,
        )
    }

    #[test]
    fn mythic_figure_crystallizes_once() {
        let schema = DomainSchema::baseline();
        let mut crystallized = false;
        for seed in 0..32 {
            let mut graph = WorldGraph::new();
            let hero = figure(&mut graph, "Karn", Prominence::Mythic, "alive");
            let mut rng = SimRng::seed_from_u64(seed);
            let result = LegendCrystallization.apply(&graph, &schema, 1.0, &mut rng);
            if result.is_empty() {
                continue;
            }
            crystallized = true;
            commit_system(&mut graph, &schema, &result);

            let legend = graph
                .entities()
                .find(|e| e.kind == "abilities" && e.name == "The Legend of Karn");
            assert_eq!(legend.map(|e| e.subtype.as_str()), Some("lore"));
            // Lineage runs legend -> subject and the subject is marked.
            let lineage = graph
                .relationships()
                .iter()
                .any(|r| {
                    r.kind == "derived_from"
                        && r.dst == hero
                        && r.status == RelationshipStatus::Active
                });
            assert!(lineage);
            assert_eq!(
                graph.get_entity(hero).map(|e| e.tags.flag(MEMORIAL_TAG)),
                Some(true)
            );

            // A marked figure never crystallizes again.
            for seed in 0..32 {
                let mut rng = SimRng::seed_from_u64(seed);
                let again = LegendCrystallization.apply(&graph, &schema, 1.0, &mut rng);
                assert!(again.entities_created.is_empty());
            }
            break;
        }
        assert!(crystallized);
    }

    #[test]
    fn renowned_figures_crystallize_only_in_death() {
        let schema = DomainSchema::baseline();
        let mut graph = WorldGraph::new();
        let _living = figure(&mut graph, "Sella", Prominence::Renowned, "alive");
        for seed in 0..32 {
            let mut rng = SimRng::seed_from_u64(seed);
            let result = LegendCrystallization.apply(&graph, &schema, 1.0, &mut rng);
            assert!(result.entities_created.is_empty());
        }

        let mut graph = WorldGraph::new();
        let _fallen = figure(&mut graph, "Odric", Prominence::Renowned, "dead");
        let mut memorialized = false;
        for seed in 0..32 {
            let mut rng = SimRng::seed_from_u64(seed);
            let result = LegendCrystallization.apply(&graph, &schema, 1.0, &mut rng);
            if !result.entities_created.is_empty() {
                memorialized = true;
                break;
            }
        }
        assert!(memorialized);
    }

    #[test]
    fn creation_is_bounded_per_pass() {
        let schema = DomainSchema::baseline();
        let mut graph = WorldGraph::new();
        for i in 0..6 {
            let _ = figure(&mut graph, &format!("Mythic {i}"), Prominence::Mythic, "alive");
        }
        for seed in 0..32 {
            let mut rng = SimRng::seed_from_u64(seed);
            let result = LegendCrystallization.apply(&graph, &schema, 1.0, &mut rng);
            assert!(result.entities_created.len() <= MEMORIALS_PER_TICK);
        }
    }
}
