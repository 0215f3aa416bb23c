//! Hero emergence: a new hero rises out of a settlement.
//!
//! Conflict breeds heroes, but only up to a point: the applicability chance
//! rises with the conflict pressure until a suppression knee, beyond which
//! runaway conflict starts to *reduce* hero emergence instead of feeding
//! it. Without that bidirectional threshold a hero/conflict feedback loop
//! dominates long runs.

use tracing::debug;

use loreweave_graph::{EntityCriteria, WorldGraph, query};
use loreweave_types::{
    DomainSchema, EntityId, EntityRef, GrowthResult, PendingEntity, ProposedRelationship,
};

use crate::error::EngineError;
use crate::rng::SimRng;
use crate::template::{GrowthTemplate, bucket_saturated, compose_name};

/// Base emergence chance at zero conflict.
const BASE_CHANCE: f64 = 0.15;
/// Conflict pressure above which further conflict suppresses emergence.
const SUPPRESSION_KNEE: f64 = 85.0;

/// Settlement subtypes a hero can emerge from, in preference order.
const HOME_PREFERENCE: [&str; 3] = ["colony", "stronghold", "ruin"];

/// The hero emergence template.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeroEmergence;

fn emergence_chance(conflict: f64) -> f64 {
    if conflict > SUPPRESSION_KNEE {
        let excess = ((conflict - SUPPRESSION_KNEE) / (100.0 - SUPPRESSION_KNEE)).clamp(0.0, 1.0);
        return BASE_CHANCE * (1.0 - excess);
    }
    BASE_CHANCE + conflict / 200.0
}

impl GrowthTemplate for HeroEmergence {
    fn id(&self) -> &'static str {
        "hero_emergence"
    }

    fn name(&self) -> &'static str {
        "Hero Emergence"
    }

    fn can_apply(&self, graph: &WorldGraph, schema: &DomainSchema, rng: &mut SimRng) -> bool {
        if bucket_saturated(graph, schema, "npc", Some("hero")) {
            return false;
        }
        let conflict = graph.pressures.pressure("conflict");
        rng.roll(emergence_chance(conflict))
    }

    fn find_targets(&self, graph: &WorldGraph, _schema: &DomainSchema) -> Vec<EntityId> {
        query::preferred_subtype_bucket(graph, "location", &HOME_PREFERENCE)
            .iter()
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
        let Some(home) = target.and_then(|id| graph.get_entity(id)) else {
            return Ok(GrowthResult::empty("no settlement for a hero to rise from"));
        };
        let home_id = home.id;
        let home_name = home.name.clone();
        let culture = home.culture.clone();

        let name = compose_name(schema, "npc", &format!("of {home_name}"), rng);
        let hero = PendingEntity {
            kind: String::from("npc"),
            subtype: String::from("hero"),
            name: name.clone(),
            description: format!("A hero risen from {home_name} in troubled times."),
            culture,
            ..PendingEntity::default()
        };

        let mut relationships = vec![ProposedRelationship::linking(
            "resident_of",
            EntityRef::Pending(0),
            EntityRef::Existing(home_id),
        )];

        // A new hero sometimes arrives with a rivalry already simmering.
        let rivals = graph.find_entities(
            &EntityCriteria::kind("npc")
                .with_subtype("hero")
                .with_status("alive"),
        );
        let rival_ids: Vec<EntityId> = rivals.iter().map(|e| e.id).collect();
        if let Some(rival) = rng.pick(&rival_ids) {
            if rng.roll(0.5) {
                relationships.push(ProposedRelationship::linking(
                    "rival_of",
                    EntityRef::Pending(0),
                    EntityRef::Existing(*rival),
                ));
            }
        }

        debug!(hero = name.as_str(), home = home_name.as_str(), "hero emerging");
        Ok(GrowthResult {
            entities: vec![hero],
            relationships,
            description: format!("{name} rises in {home_name}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_graph() -> (WorldGraph, EntityId) {
        let mut graph = WorldGraph::new();
        let home = graph.create_entity(
            PendingEntity {
                kind: String::from("location"),
                subtype: String::from("colony"),
                name: String::from("Greyfen"),
                culture: String::from("riverfolk"),
                ..PendingEntity::default()
            },
            "stable",
        );
        (graph, home)
    }

    #[test]
    fn chance_rises_then_collapses_past_the_knee() {
        assert!(emergence_chance(40.0) > emergence_chance(0.0));
        assert!(emergence_chance(95.0) < emergence_chance(60.0));
        assert!(emergence_chance(100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn saturated_hero_bucket_blocks_applicability() {
        let (mut graph, _) = seeded_graph();
        let schema = DomainSchema::baseline();
        // Hero target 6, overshoot 1.5: 9 heroes saturate the bucket.
        for i in 0..9 {
            graph.create_entity(
                PendingEntity {
                    kind: String::from("npc"),
                    subtype: String::from("hero"),
                    name: format!("hero {i}"),
                    ..PendingEntity::default()
                },
                "alive",
            );
        }
        let mut rng = SimRng::seed_from_u64(0);
        for _ in 0..32 {
            assert!(!HeroEmergence.can_apply(&graph, &schema, &mut rng));
        }
    }

    #[test]
    fn expansion_links_hero_to_hometown() {
        let (mut graph, home) = seeded_graph();
        let schema = DomainSchema::baseline();
        let mut rng = SimRng::seed_from_u64(4);

        let result = HeroEmergence.expand(&mut graph, &schema, Some(home), &mut rng);
        let result = result.unwrap_or_default();
        assert_eq!(result.entities.len(), 1);
        assert_eq!(
            result.entities.first().map(|e| e.culture.as_str()),
            Some("riverfolk")
        );
        let residence = result
            .relationships
            .iter()
            .find(|r| r.kind == "resident_of");
        assert_eq!(residence.map(|r| r.src), Some(EntityRef::Pending(0)));
        assert_eq!(residence.map(|r| r.dst), Some(EntityRef::Existing(home)));
    }

    #[test]
    fn missing_target_yields_empty_result() {
        let mut graph = WorldGraph::new();
        let schema = DomainSchema::baseline();
        let mut rng = SimRng::seed_from_u64(4);
        let result = HeroEmergence.expand(&mut graph, &schema, None, &mut rng);
        assert!(result.map(|r| r.is_empty()).unwrap_or(false));
    }
}
