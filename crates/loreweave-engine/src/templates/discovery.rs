//! Emergent discovery template: an explorer finds a place the world's
//! current state called into being.
//!
//! Applicability is the shared discovery gate; expansion picks the most
//! urgent detected condition and composes the new location from the
//! schema's theme words. The driver records each committed application
//! against the per-epoch discovery budget.

use tracing::{debug, info};

use loreweave_graph::{WorldGraph, query};
use loreweave_types::{
    DomainSchema, EntityId, EntityRef, GrowthResult, PendingEntity, ProposedRelationship,
};

use crate::discovery::{eligible_explorers, most_urgent_analysis, should_discover_location};
use crate::error::EngineError;
use crate::rng::SimRng;
use crate::template::GrowthTemplate;

/// The emergent discovery template.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmergentDiscovery;

impl GrowthTemplate for EmergentDiscovery {
    fn id(&self) -> &'static str {
        "emergent_discovery"
    }

    fn name(&self) -> &'static str {
        "Emergent Discovery"
    }

    fn counts_as_discovery(&self) -> bool {
        true
    }

    fn can_apply(&self, graph: &WorldGraph, schema: &DomainSchema, rng: &mut SimRng) -> bool {
        should_discover_location(graph, schema, rng)
    }

    fn find_targets(&self, graph: &WorldGraph, schema: &DomainSchema) -> Vec<EntityId> {
        eligible_explorers(graph, schema)
    }

    fn expand(
        &self,
        graph: &mut WorldGraph,
        schema: &DomainSchema,
        target: Option<EntityId>,
        rng: &mut SimRng,
    ) -> Result<GrowthResult, EngineError> {
        let Some(explorer) = target.and_then(|id| graph.get_entity(id)) else {
            return Ok(GrowthResult::empty("no eligible explorer"));
        };
        let explorer_id = explorer.id;
        let explorer_name = explorer.name.clone();

        let Some(analysis) = most_urgent_analysis(graph, schema, rng) else {
            return Ok(GrowthResult::empty(
                "no world condition calls for a discovery",
            ));
        };

        // Place near the explorer's residence when the spatial capability
        // and a reference position are both available.
        let home = query::neighbors_by_kind(graph, explorer_id, "resident_of")
            .first()
            .and_then(|id| graph.get_entity(*id));
        let home_id = home.map(|e| e.id);
        let reference = home.and_then(|e| e.coordinates);
        let coordinates = schema.spatial.map(|spatial| {
            query::derive_coordinates(
                reference.as_ref(),
                (rng.offset(), rng.offset(), rng.offset()),
                spatial.jitter,
            )
        });

        let location = PendingEntity {
            kind: String::from("location"),
            subtype: analysis.subtype.clone(),
            name: analysis.name.clone(),
            description: format!("Found by {explorer_name}; born of {}.", analysis.theme),
            tags: analysis.tags.clone(),
            coordinates,
            ..PendingEntity::default()
        };

        let mut relationships = vec![ProposedRelationship::linking(
            "discovered_by",
            EntityRef::Pending(0),
            EntityRef::Existing(explorer_id),
        )];
        if let Some(home_id) = home_id {
            relationships.push(
                ProposedRelationship::linking(
                    "related_to",
                    EntityRef::Pending(0),
                    EntityRef::Existing(home_id),
                )
                .with_distance(rng.range(0.2, 0.8)),
            );
        }

        debug!(theme = analysis.theme, urgency = analysis.urgency, "discovery expanding");
        info!(
            location = analysis.name.as_str(),
            explorer = explorer_name.as_str(),
            "location discovered"
        );
        Ok(GrowthResult {
            entities: vec![location],
            relationships,
            description: format!("{explorer_name} discovers {}", analysis.name),
        })
    }
}
