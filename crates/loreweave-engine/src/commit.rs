//! The commit step: batched mutations applied to the graph in two passes.
//!
//! Templates and systems describe mutations with pending-entity arenas and
//! [`EntityRef`] endpoints. Commit resolves them in a fixed order:
//!
//! 1. Create every pending entity, recording arena index to assigned id.
//! 2. Resolve relationship endpoints and insert edges, consulting the
//!    schema's allowed-kinds matrix and per-kind defaults.
//! 3. Apply entity patches, strength adjustments, archival, and removal.
//! 4. Propose pressure deltas into the pending buffer (applied once per
//!    tick by the driver, after every source has proposed).
//!
//! Resolution failures (an arena index past the batch, a patch for a
//! deleted entity) skip the single mutation with a warning; the rest of the
//! batch still commits. There is no rollback.

use tracing::{debug, warn};

use loreweave_graph::WorldGraph;
use loreweave_types::{
    DomainSchema, EntityId, EntityRef, GrowthResult, ProposedRelationship, RelationshipCategory,
    SystemResult,
};

/// Distance assigned when a lineage edge arrives without one.
const DEFAULT_LINEAGE_DISTANCE: f64 = 0.5;

/// What a commit actually changed, for logging and tick summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Ids assigned to the batch's pending entities, in arena order.
    pub created: Vec<EntityId>,
    /// Edges inserted (after dedup and matrix filtering).
    pub relationships_added: usize,
    /// Entities patched.
    pub entities_modified: usize,
}

fn resolve(endpoint: EntityRef, created: &[EntityId]) -> Option<EntityId> {
    match endpoint {
        EntityRef::Existing(id) => Some(id),
        EntityRef::Pending(index) => created.get(index).copied(),
    }
}

/// Insert one proposed relationship, filling schema defaults. Returns
/// `true` when an edge was actually added.
fn insert_relationship(
    graph: &mut WorldGraph,
    schema: &DomainSchema,
    proposal: &ProposedRelationship,
    created: &[EntityId],
) -> bool {
    let (Some(src), Some(dst)) = (
        resolve(proposal.src, created),
        resolve(proposal.dst, created),
    ) else {
        warn!(
            kind = proposal.kind.as_str(),
            "pending index out of range, relationship skipped"
        );
        return false;
    };

    // The matrix only constrains pairs whose kinds are both known; a
    // dangling endpoint defers to validation instead.
    if let (Some(src_entity), Some(dst_entity)) = (graph.get_entity(src), graph.get_entity(dst)) {
        if !schema.is_relationship_allowed(&src_entity.kind, &dst_entity.kind, &proposal.kind) {
            warn!(
                kind = proposal.kind.as_str(),
                src_kind = src_entity.kind.as_str(),
                dst_kind = dst_entity.kind.as_str(),
                "relationship kind not allowed between these kinds, skipped"
            );
            return false;
        }
    }

    let strength = proposal
        .strength
        .unwrap_or_else(|| schema.default_strength(&proposal.kind));
    let distance = if schema.is_lineage(&proposal.kind) {
        Some(proposal.distance.unwrap_or(DEFAULT_LINEAGE_DISTANCE))
    } else {
        proposal.distance
    };
    let category = schema.category_of(&proposal.kind);

    let added = graph.add_relationship(&proposal.kind, src, dst, strength, distance, category);
    if added && category != RelationshipCategory::ImmutableFact {
        graph.record_relationship_formation(src, &proposal.kind);
    }
    added
}

fn create_pending(
    graph: &mut WorldGraph,
    schema: &DomainSchema,
    pending: &[loreweave_types::PendingEntity],
) -> Vec<EntityId> {
    pending
        .iter()
        .map(|spec| {
            let default_status = schema.default_status(&spec.kind);
            graph.create_entity(spec.clone(), &default_status)
        })
        .collect()
}

/// Commit a growth template's result.
pub fn commit_growth(
    graph: &mut WorldGraph,
    schema: &DomainSchema,
    result: &GrowthResult,
) -> CommitOutcome {
    let created = create_pending(graph, schema, &result.entities);
    let mut relationships_added = 0_usize;
    for proposal in &result.relationships {
        if insert_relationship(graph, schema, proposal, &created) {
            relationships_added = relationships_added.saturating_add(1);
        }
    }
    debug!(
        created = created.len(),
        relationships_added,
        description = result.description.as_str(),
        "growth committed"
    );
    CommitOutcome {
        created,
        relationships_added,
        entities_modified: 0,
    }
}

/// Commit a simulation system's result.
pub fn commit_system(
    graph: &mut WorldGraph,
    schema: &DomainSchema,
    result: &SystemResult,
) -> CommitOutcome {
    let created = create_pending(graph, schema, &result.entities_created);

    let mut relationships_added = 0_usize;
    for proposal in &result.relationships_added {
        if insert_relationship(graph, schema, proposal, &created) {
            relationships_added = relationships_added.saturating_add(1);
        }
    }

    let mut entities_modified = 0_usize;
    for change in &result.entities_modified {
        match graph.update_entity(change.id, &change.changes) {
            Ok(()) => entities_modified = entities_modified.saturating_add(1),
            Err(error) => {
                warn!(entity = %change.id, %error, "patch target missing, skipped");
            }
        }
    }

    for adjustment in &result.relationships_adjusted {
        if graph
            .adjust_strength(
                adjustment.src,
                adjustment.dst,
                &adjustment.kind,
                adjustment.delta,
            )
            .is_none()
        {
            debug!(
                kind = adjustment.kind.as_str(),
                src = %adjustment.src,
                dst = %adjustment.dst,
                "strength adjustment target gone, skipped"
            );
        }
    }
    for key in &result.relationships_archived {
        graph.archive_relationship(key.src, key.dst, &key.kind);
    }
    for key in &result.relationships_removed {
        graph.remove_relationship(key.src, key.dst, &key.kind);
    }
    for (entity, kind) in &result.cooldowns_recorded {
        graph.set_formation_cooldown(*entity, kind);
    }

    graph.pressures.propose_all(&result.pressure_changes);

    CommitOutcome {
        created,
        relationships_added,
        entities_modified,
    }
}

#[cfg(test)]
mod tests {
    use loreweave_types::{
        EntityChange, EntityPatch, PendingEntity, RelationshipKey, RelationshipStatus,
        StrengthAdjustment,
    };

    use super::*;

    fn pending_npc(name: &str, subtype: &str) -> PendingEntity {
        PendingEntity {
            kind: String::from("npc"),
            subtype: String::from(subtype),
            name: String::from(name),
            description: String::from("test npc"),
            ..PendingEntity::default()
        }
    }

    #[test]
    fn pending_indices_resolve_in_creation_order() {
        let mut graph = WorldGraph::new();
        let schema = DomainSchema::baseline();
        let result = GrowthResult {
            entities: vec![pending_npc("Bram", "hero"), pending_npc("Sella", "mystic")],
            relationships: vec![ProposedRelationship::linking(
                "friend_of",
                EntityRef::Pending(0),
                EntityRef::Pending(1),
            )],
            description: String::from("two friends appear"),
        };

        let outcome = commit_growth(&mut graph, &schema, &result);
        assert_eq!(outcome.created.len(), 2);
        assert_eq!(outcome.relationships_added, 1);
        let (a, b) = (outcome.created.first(), outcome.created.get(1));
        let edge = graph.relationships().first();
        assert_eq!(edge.map(|r| Some(r.src) == a.copied()), Some(true));
        assert_eq!(edge.map(|r| Some(r.dst) == b.copied()), Some(true));
    }

    #[test]
    fn out_of_range_pending_index_skips_only_that_edge() {
        let mut graph = WorldGraph::new();
        let schema = DomainSchema::baseline();
        let result = GrowthResult {
            entities: vec![pending_npc("Bram", "hero"), pending_npc("Sella", "hero")],
            relationships: vec![
                ProposedRelationship::linking(
                    "friend_of",
                    EntityRef::Pending(0),
                    EntityRef::Pending(9),
                ),
                ProposedRelationship::linking(
                    "rival_of",
                    EntityRef::Pending(0),
                    EntityRef::Pending(1),
                ),
            ],
            description: String::new(),
        };

        let outcome = commit_growth(&mut graph, &schema, &result);
        assert_eq!(outcome.relationships_added, 1);
        assert_eq!(graph.relationships().len(), 1);
    }

    #[test]
    fn schema_defaults_fill_strength_and_category() {
        let mut graph = WorldGraph::new();
        let schema = DomainSchema::baseline();
        let result = GrowthResult {
            entities: vec![pending_npc("Bram", "hero"), pending_npc("Karn", "outlaw")],
            relationships: vec![ProposedRelationship::linking(
                "enemy_of",
                EntityRef::Pending(0),
                EntityRef::Pending(1),
            )],
            description: String::new(),
        };

        commit_growth(&mut graph, &schema, &result);
        let edge = graph.relationships().first();
        assert_eq!(
            edge.map(|r| (r.strength - 0.7).abs() < f64::EPSILON),
            Some(true)
        );
        assert_eq!(edge.map(|r| r.category), Some(RelationshipCategory::Social));
    }

    #[test]
    fn lineage_edges_get_a_default_distance() {
        let mut graph = WorldGraph::new();
        let schema = DomainSchema::baseline();
        let loc = PendingEntity {
            kind: String::from("location"),
            subtype: String::from("ruin"),
            name: String::from("Duskharrow"),
            ..PendingEntity::default()
        };
        let result = GrowthResult {
            entities: vec![loc.clone(), loc],
            relationships: vec![ProposedRelationship::linking(
                "adjacent_to",
                EntityRef::Pending(0),
                EntityRef::Pending(1),
            )],
            description: String::new(),
        };

        commit_growth(&mut graph, &schema, &result);
        let edge = graph.relationships().first();
        assert_eq!(edge.and_then(|r| r.distance), Some(0.5));
        assert_eq!(edge.map(|r| r.category), Some(RelationshipCategory::ImmutableFact));
    }

    #[test]
    fn matrix_rejects_disallowed_kind() {
        let mut graph = WorldGraph::new();
        let mut schema = DomainSchema::baseline();
        schema
            .relationship_rules
            .push(loreweave_types::RelationshipRule {
                src_kind: String::from("npc"),
                dst_kind: String::from("npc"),
                kinds: vec![String::from("friend_of")],
            });
        let result = GrowthResult {
            entities: vec![pending_npc("Bram", "hero"), pending_npc("Sella", "hero")],
            relationships: vec![ProposedRelationship::linking(
                "leader_of",
                EntityRef::Pending(0),
                EntityRef::Pending(1),
            )],
            description: String::new(),
        };

        let outcome = commit_growth(&mut graph, &schema, &result);
        assert_eq!(outcome.relationships_added, 0);
        assert!(graph.relationships().is_empty());
    }

    #[test]
    fn formation_commit_sets_cooldown_for_source() {
        let mut graph = WorldGraph::new();
        let schema = DomainSchema::baseline();
        let a = graph.create_entity(pending_npc("Bram", "hero"), "alive");
        let b = graph.create_entity(pending_npc("Sella", "hero"), "alive");

        let result = GrowthResult {
            entities: Vec::new(),
            relationships: vec![ProposedRelationship::between("lover_of", a, b)],
            description: String::new(),
        };
        commit_growth(&mut graph, &schema, &result);
        assert!(!graph.can_form_relationship(a, "lover_of", schema.cooldown("lover_of")));
    }

    #[test]
    fn system_commit_applies_every_channel() {
        let mut graph = WorldGraph::new();
        let schema = DomainSchema::baseline();
        let a = graph.create_entity(pending_npc("Bram", "hero"), "alive");
        let b = graph.create_entity(pending_npc("Sella", "hero"), "alive");
        let c = graph.create_entity(pending_npc("Odric", "hero"), "alive");
        assert!(graph.add_relationship("friend_of", a, b, 0.5, None, RelationshipCategory::Social));
        assert!(graph.add_relationship("rival_of", a, c, 0.5, None, RelationshipCategory::Social));
        assert!(graph.add_relationship("enemy_of", b, c, 0.5, None, RelationshipCategory::Social));

        let mut result = SystemResult::empty("exercise all channels");
        result.entities_modified.push(EntityChange {
            id: a,
            changes: EntityPatch::status("dead"),
        });
        result.relationships_adjusted.push(StrengthAdjustment {
            kind: String::from("friend_of"),
            src: a,
            dst: b,
            delta: -0.2,
        });
        result
            .relationships_archived
            .push(RelationshipKey::new("rival_of", a, c));
        result
            .relationships_removed
            .push(RelationshipKey::new("enemy_of", b, c));
        result
            .cooldowns_recorded
            .push((b, String::from("friend_of")));
        result
            .pressure_changes
            .insert(String::from("conflict"), 3.0);

        let outcome = commit_system(&mut graph, &schema, &result);
        assert_eq!(outcome.entities_modified, 1);
        assert_eq!(graph.get_entity(a).map(|e| e.status.as_str()), Some("dead"));

        let friend = graph
            .relationships()
            .iter()
            .find(|r| r.kind == "friend_of");
        assert_eq!(friend.map(|r| (r.strength - 0.3).abs() < 1e-9), Some(true));

        let rival = graph.relationships().iter().find(|r| r.kind == "rival_of");
        assert_eq!(rival.map(|r| r.status), Some(RelationshipStatus::Historical));
        assert!(!graph.relationships().iter().any(|r| r.kind == "enemy_of"));
        assert!(!graph.can_form_relationship(b, "friend_of", 5));

        // Deltas are proposed, not applied, until the driver's single apply.
        assert!(graph.pressures.pressure("conflict").abs() < f64::EPSILON);
        assert!(graph.pressures.has_pending());
    }

    #[test]
    fn patch_for_missing_entity_does_not_abort_batch() {
        let mut graph = WorldGraph::new();
        let schema = DomainSchema::baseline();
        let a = graph.create_entity(pending_npc("Bram", "hero"), "alive");

        let mut result = SystemResult::empty("partial batch");
        result.entities_modified.push(EntityChange {
            id: EntityId::new(404),
            changes: EntityPatch::status("dead"),
        });
        result.entities_modified.push(EntityChange {
            id: a,
            changes: EntityPatch::status("vanished"),
        });

        let outcome = commit_system(&mut graph, &schema, &result);
        assert_eq!(outcome.entities_modified, 1);
        assert_eq!(
            graph.get_entity(a).map(|e| e.status.as_str()),
            Some("vanished")
        );
    }
}
