//! Settlement founding: a new settlement is established near an existing
//! one, with a founder to lead it.
//!
//! This template must place the settlement in space, so it requires the
//! schema's spatial capability and raises a hard error without it -- that
//! is a configuration defect, not a transient world condition. The
//! settlement itself is created up front during expansion (coordinate
//! derivation needs its reference resolved before the rest of the batch),
//! so the returned arena holds only the founder.

use tracing::debug;

use loreweave_graph::{WorldGraph, query};
use loreweave_types::{
    DomainSchema, EntityId, EntityRef, GrowthResult, PendingEntity, ProposedRelationship,
};

use crate::error::EngineError;
use crate::rng::SimRng;
use crate::template::{GrowthTemplate, bucket_saturated, compose_name};

/// Per-tick founding chance before era weighting.
const FOUNDING_CHANCE: f64 = 0.2;

/// The settlement founding template.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettlementFounding;

impl GrowthTemplate for SettlementFounding {
    fn id(&self) -> &'static str {
        "settlement_founding"
    }

    fn name(&self) -> &'static str {
        "Settlement Founding"
    }

    fn can_apply(&self, graph: &WorldGraph, schema: &DomainSchema, rng: &mut SimRng) -> bool {
        if bucket_saturated(graph, schema, "location", None) {
            return false;
        }
        rng.roll(FOUNDING_CHANCE)
    }

    fn find_targets(&self, graph: &WorldGraph, _schema: &DomainSchema) -> Vec<EntityId> {
        query::find_by_kind(graph, "location")
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
        let Some(spatial) = schema.spatial else {
            return Err(EngineError::MissingCapability {
                capability: String::from("spatial"),
            });
        };

        let reference = target.and_then(|id| graph.get_entity(id));
        let reference_id = reference.map(|e| e.id);
        let reference_coordinates = reference.and_then(|e| e.coordinates);
        let culture = reference.map(|e| e.culture.clone()).unwrap_or_default();

        let offsets = (rng.offset(), rng.offset(), rng.offset());
        let coordinates =
            query::derive_coordinates(reference_coordinates.as_ref(), offsets, spatial.jitter);

        // Created before the rest of the batch so the founder and adjacency
        // edges can reference a real id.
        let name = compose_name(schema, "location", "", rng);
        let settlement = graph.create_entity(
            PendingEntity {
                kind: String::from("location"),
                subtype: String::from("colony"),
                name: name.clone(),
                description: format!("A young settlement called {name}."),
                culture: culture.clone(),
                coordinates: Some(coordinates),
                ..PendingEntity::default()
            },
            &schema.default_status("location"),
        );

        let founder_name = compose_name(schema, "npc", &format!("of {name}"), rng);
        let founder = PendingEntity {
            kind: String::from("npc"),
            subtype: String::from("explorer"),
            name: founder_name.clone(),
            description: format!("Founder and first resident of {name}."),
            culture,
            ..PendingEntity::default()
        };

        let mut relationships = vec![ProposedRelationship::linking(
            "resident_of",
            EntityRef::Pending(0),
            EntityRef::Existing(settlement),
        )];
        if let Some(reference_id) = reference_id {
            let separation = (offsets.0.abs() + offsets.1.abs()) / 2.0;
            relationships.push(
                ProposedRelationship::linking(
                    "adjacent_to",
                    EntityRef::Existing(settlement),
                    EntityRef::Existing(reference_id),
                )
                .with_distance(separation.clamp(0.05, 1.0)),
            );
        }

        debug!(settlement = name.as_str(), founder = founder_name.as_str(), "settlement founded");
        Ok(GrowthResult {
            entities: vec![founder],
            relationships,
            description: format!("{founder_name} founds {name}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use loreweave_types::Coordinates;

    use super::*;

    #[test]
    fn founding_without_spatial_capability_is_a_hard_error() {
        let mut graph = WorldGraph::new();
        let mut schema = DomainSchema::baseline();
        schema.spatial = None;
        let mut rng = SimRng::seed_from_u64(0);

        let result = SettlementFounding.expand(&mut graph, &schema, None, &mut rng);
        assert!(matches!(
            result,
            Err(EngineError::MissingCapability { capability }) if capability == "spatial"
        ));
    }

    #[test]
    fn settlement_is_pre_created_and_placed_near_reference() {
        let mut graph = WorldGraph::new();
        let schema = DomainSchema::baseline();
        let reference = graph.create_entity(
            PendingEntity {
                kind: String::from("location"),
                subtype: String::from("colony"),
                name: String::from("Greyfen"),
                coordinates: Some(Coordinates { x: 2.0, y: -1.0, z: 0.0 }),
                ..PendingEntity::default()
            },
            "stable",
        );
        let mut rng = SimRng::seed_from_u64(9);

        let result = SettlementFounding.expand(&mut graph, &schema, Some(reference), &mut rng);
        let result = result.unwrap_or_default();
        // Arena holds only the founder; the settlement already exists.
        assert_eq!(result.entities.len(), 1);
        assert_eq!(graph.entity_count(Some("location"), None), 2);

        let jitter = schema.spatial.map(|s| s.jitter).unwrap_or_default();
        let placed = graph
            .entities()
            .find(|e| e.kind == "location" && e.id != reference)
            .and_then(|e| e.coordinates);
        let within = placed.map(|c| {
            (c.x - 2.0).abs() <= jitter && (c.y + 1.0).abs() <= jitter && c.z.abs() <= jitter
        });
        assert_eq!(within, Some(true));

        let adjacency = result.relationships.iter().find(|r| r.kind == "adjacent_to");
        assert!(adjacency.and_then(|r| r.distance).is_some());
    }

    #[test]
    fn first_settlement_needs_no_reference() {
        let mut graph = WorldGraph::new();
        let schema = DomainSchema::baseline();
        let mut rng = SimRng::seed_from_u64(9);

        let result = SettlementFounding.expand(&mut graph, &schema, None, &mut rng);
        let result = result.unwrap_or_default();
        assert_eq!(graph.entity_count(Some("location"), None), 1);
        assert_eq!(result.relationships.len(), 1);
    }
}
