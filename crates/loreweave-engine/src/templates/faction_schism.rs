//! Faction schism: a large faction under cultural tension splinters.
//!
//! The splinter faction and its zealot leader are both pending entities in
//! the same batch, so the leader's edges reference the splinter by arena
//! index before either has an id.

use tracing::debug;

use loreweave_graph::WorldGraph;
use loreweave_types::{
    DomainSchema, EntityId, EntityRef, GrowthResult, PendingEntity, ProposedRelationship,
};

use crate::error::EngineError;
use crate::rng::SimRng;
use crate::template::{GrowthTemplate, bucket_saturated, compose_name};

/// Cultural tension below which factions hold together.
const TENSION_THRESHOLD: f64 = 45.0;
/// Per-tick schism chance once tension is high enough.
const SCHISM_CHANCE: f64 = 0.3;
/// Member count a faction needs before a schism is plausible.
const MIN_MEMBERS: usize = 3;

/// The faction schism template.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactionSchism;

fn member_count(graph: &WorldGraph, faction: EntityId) -> usize {
    graph
        .relationships()
        .iter()
        .filter(|r| r.kind == "member_of" && r.dst == faction)
        .count()
}

impl GrowthTemplate for FactionSchism {
    fn id(&self) -> &'static str {
        "faction_schism"
    }

    fn name(&self) -> &'static str {
        "Faction Schism"
    }

    fn can_apply(&self, graph: &WorldGraph, schema: &DomainSchema, rng: &mut SimRng) -> bool {
        if graph.pressures.pressure("cultural_tension") < TENSION_THRESHOLD {
            return false;
        }
        if bucket_saturated(graph, schema, "faction", None) {
            return false;
        }
        rng.roll(SCHISM_CHANCE)
    }

    fn find_targets(&self, graph: &WorldGraph, _schema: &DomainSchema) -> Vec<EntityId> {
        graph
            .entities()
            .filter(|e| e.kind == "faction" && member_count(graph, e.id) >= MIN_MEMBERS)
            .map(|e| e.id)
            .collect()
    }

    fn expand(
        &self,
        graph: &mut WorldGraph,
        schema: &DomainSchema,
        target: Option<EntityId>,
        rng: &mut SimRng,
    ) -> Result<GrowthResult, EngineError> {
        let Some(parent) = target.and_then(|id| graph.get_entity(id)) else {
            return Ok(GrowthResult::empty("no faction large enough to splinter"));
        };
        let parent_id = parent.id;
        let parent_name = parent.name.clone();
        let culture = parent.culture.clone();

        let splinter_name = compose_name(schema, "faction", "Schismatics", rng);
        let splinter = PendingEntity {
            kind: String::from("faction"),
            subtype: String::from("cult"),
            name: splinter_name.clone(),
            description: format!("Splintered from {parent_name} over irreconcilable doctrine."),
            status: String::from("rising"),
            culture: culture.clone(),
            ..PendingEntity::default()
        };
        let leader_name = compose_name(schema, "npc", "the Zealous", rng);
        let leader = PendingEntity {
            kind: String::from("npc"),
            subtype: String::from("mystic"),
            name: leader_name.clone(),
            description: format!("Voice of the schism that broke {parent_name}."),
            culture,
            ..PendingEntity::default()
        };

        let ideological_distance = rng.range(0.3, 0.7);
        let relationships = vec![
            ProposedRelationship::linking(
                "split_from",
                EntityRef::Pending(0),
                EntityRef::Existing(parent_id),
            )
            .with_distance(ideological_distance),
            ProposedRelationship::linking("leader_of", EntityRef::Pending(1), EntityRef::Pending(0)),
            ProposedRelationship::linking("member_of", EntityRef::Pending(1), EntityRef::Pending(0)),
            ProposedRelationship::linking(
                "rival_of",
                EntityRef::Pending(0),
                EntityRef::Existing(parent_id),
            ),
        ];

        debug!(
            splinter = splinter_name.as_str(),
            parent = parent_name.as_str(),
            "faction splintering"
        );
        Ok(GrowthResult {
            entities: vec![splinter, leader],
            relationships,
            description: format!("{splinter_name} breaks away from {parent_name}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use loreweave_graph::EntityCriteria;
    use loreweave_types::RelationshipCategory;

    use crate::commit::commit_growth;

    use super::*;

    fn faction_with_members(graph: &mut WorldGraph, members: usize) -> EntityId {
        let faction = graph.create_entity(
            PendingEntity {
                kind: String::from("faction"),
                subtype: String::from("guild"),
                name: String::from("Ashen Compact"),
                culture: String::from("ashfolk"),
                ..PendingEntity::default()
            },
            "established",
        );
        for i in 0..members {
            let npc = graph.create_entity(
                PendingEntity {
                    kind: String::from("npc"),
                    subtype: String::from("merchant"),
                    name: format!("member {i}"),
                    ..PendingEntity::default()
                },
                "alive",
            );
            assert!(graph.add_relationship(
                "member_of",
                npc,
                faction,
                0.7,
                None,
                RelationshipCategory::Institutional,
            ));
        }
        faction
    }

    #[test]
    fn small_factions_are_not_targets() {
        let mut graph = WorldGraph::new();
        let _ = faction_with_members(&mut graph, 2);
        assert!(FactionSchism.find_targets(&graph, &DomainSchema::baseline()).is_empty());
    }

    #[test]
    fn low_tension_blocks_applicability() {
        let mut graph = WorldGraph::new();
        let _ = faction_with_members(&mut graph, 4);
        graph.pressures.set("cultural_tension", 20.0);
        let mut rng = SimRng::seed_from_u64(0);
        for _ in 0..32 {
            assert!(!FactionSchism.can_apply(&graph, &DomainSchema::baseline(), &mut rng));
        }
    }

    #[test]
    fn schism_commits_splinter_leader_and_lineage() {
        let mut graph = WorldGraph::new();
        let schema = DomainSchema::baseline();
        let parent = faction_with_members(&mut graph, 4);
        let mut rng = SimRng::seed_from_u64(6);

        let result = FactionSchism.expand(&mut graph, &schema, Some(parent), &mut rng);
        let result = result.unwrap_or_default();
        let outcome = commit_growth(&mut graph, &schema, &result);
        assert_eq!(outcome.created.len(), 2);

        let splinter = graph
            .find_entities(&EntityCriteria::kind("faction").with_subtype("cult"))
            .first()
            .map(|e| e.id);
        let Some(splinter) = splinter else {
            assert!(splinter.is_some());
            return;
        };
        let lineage = graph
            .relationships()
            .iter()
            .find(|r| r.kind == "split_from" && r.src == splinter);
        assert_eq!(lineage.map(|r| r.dst), Some(parent));
        let distance = lineage.and_then(|r| r.distance).unwrap_or_default();
        assert!((0.3..0.7).contains(&distance));

        // Leader's pending-pending edges resolved to the splinter's real id.
        let leads = graph
            .relationships()
            .iter()
            .any(|r| r.kind == "leader_of" && r.dst == splinter);
        assert!(leads);
        assert_eq!(graph.get_entity(splinter).map(|e| e.status.as_str()), Some("rising"));
    }
}
