//! Prominence evolution: renown follows connectedness.
//!
//! Runs every fourth tick. Well-connected entities step up the prominence
//! scale probabilistically; entities with no connections and no recent
//! activity fade one step toward forgotten.

use loreweave_graph::WorldGraph;
use loreweave_types::{DomainSchema, EntityChange, EntityPatch, Prominence, SystemResult};

use crate::rng::{SimRng, scaled_probability};
use crate::systems::SimulationSystem;

/// Tick period of the evolution pass.
const PERIOD: u64 = 4;
/// Degree at which an entity starts accruing renown.
const RISE_DEGREE: usize = 5;
/// Chance of a one-step rise for a qualifying entity, before era weighting.
const RISE_CHANCE: f64 = 0.4;
/// Ticks without any mutation before renown starts fading.
const STALE_TICKS: u64 = 10;

/// The prominence evolution pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProminenceEvolution;

impl SimulationSystem for ProminenceEvolution {
    fn name(&self) -> &'static str {
        "prominence_evolution"
    }

    fn apply(
        &self,
        graph: &WorldGraph,
        _schema: &DomainSchema,
        era_modifier: f64,
        rng: &mut SimRng,
    ) -> SystemResult {
        if graph.tick() == 0 || graph.tick() % PERIOD != 0 {
            return SystemResult::dormant(self.name());
        }

        let rise_chance = scaled_probability(RISE_CHANCE, era_modifier);
        let mut result = SystemResult::empty("");
        let mut rises = 0_u32;
        let mut fades = 0_u32;
        for entity in graph.entities() {
            let next = if entity.degree() >= RISE_DEGREE {
                if entity.prominence == Prominence::Mythic || !rng.roll(rise_chance) {
                    continue;
                }
                rises = rises.saturating_add(1);
                entity.prominence.raised()
            } else if entity.degree() == 0
                && graph.tick() >= entity.updated_at.saturating_add(STALE_TICKS)
                && !graph.relationships().iter().any(|r| r.dst == entity.id)
            {
                if entity.prominence == Prominence::Forgotten {
                    continue;
                }
                fades = fades.saturating_add(1);
                entity.prominence.lowered()
            } else {
                continue;
            };
            result.entities_modified.push(EntityChange {
                id: entity.id,
                changes: EntityPatch {
                    prominence: Some(next),
                    ..EntityPatch::default()
                },
            });
        }
        result.description = format!("{rises} rose, {fades} faded");
        result
    }
}

#[cfg(test)]
mod tests {
    use loreweave_types::{EntityId, PendingEntity, RelationshipCategory};

    use super::*;

    fn npc(graph: &mut WorldGraph, name: &str) -> EntityId {
        graph.create_entity(
            PendingEntity {
                kind: String::from("npc"),
                subtype: String::from("hero"),
                name: String::from(name),
                ..PendingEntity::default()
            },
            "alive",
        )
    }

    #[test]
    fn dormant_off_period() {
        let mut graph = WorldGraph::new();
        let schema = DomainSchema::baseline();
        graph.advance_tick();
        let mut rng = SimRng::seed_from_u64(0);
        let result = ProminenceEvolution.apply(&graph, &schema, 1.0, &mut rng);
        assert!(result.is_empty());
        assert!(result.description.contains("dormant"));
    }

    #[test]
    fn hubs_rise_and_stale_isolates_fade() {
        let schema = DomainSchema::baseline();
        let mut saw_rise = false;
        let mut saw_fade = false;
        for seed in 0..32 {
            let mut graph = WorldGraph::new();
            let hub = npc(&mut graph, "Bram");
            let loner = npc(&mut graph, "Odric");
            for i in 0..RISE_DEGREE {
                let other = npc(&mut graph, &format!("other {i}"));
                assert!(graph.add_relationship(
                    "friend_of",
                    hub,
                    other,
                    0.5,
                    None,
                    RelationshipCategory::Social,
                ));
            }
            // 12 ticks pass with no activity; tick 12 is on-period.
            for _ in 0..12 {
                graph.advance_tick();
            }
            let mut rng = SimRng::seed_from_u64(seed);
            let result = ProminenceEvolution.apply(&graph, &schema, 1.0, &mut rng);
            for change in &result.entities_modified {
                if change.id == hub {
                    saw_rise = true;
                    assert_eq!(change.changes.prominence, Some(Prominence::Recognized));
                }
                if change.id == loner {
                    saw_fade = true;
                    assert_eq!(change.changes.prominence, Some(Prominence::Forgotten));
                }
            }
        }
        assert!(saw_rise);
        assert!(saw_fade);
    }

    #[test]
    fn forgotten_entities_do_not_fade_further() {
        let schema = DomainSchema::baseline();
        let mut graph = WorldGraph::new();
        let loner = npc(&mut graph, "Odric");
        let patch = EntityPatch {
            prominence: Some(Prominence::Forgotten),
            ..EntityPatch::default()
        };
        assert!(graph.update_entity(loner, &patch).is_ok());
        for _ in 0..12 {
            graph.advance_tick();
        }
        for seed in 0..8 {
            let mut rng = SimRng::seed_from_u64(seed);
            let result = ProminenceEvolution.apply(&graph, &schema, 1.0, &mut rng);
            assert!(result.entities_modified.is_empty());
        }
    }
}
