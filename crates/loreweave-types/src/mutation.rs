//! Mutation shapes produced by growth templates and simulation systems.
//!
//! Templates and systems never mutate the graph directly. They emit a small
//! arena of *pending* entities plus relationships whose endpoints reference
//! either real ids or pending arena indices; the commit step resolves the
//! indices to real ids in creation order. This is what lets expansion logic
//! wire up siblings created in the same batch before any of them has an id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::{Coordinates, Prominence};
use crate::ids::EntityId;
use crate::tags::{TagMap, TagValue};

/// An endpoint of a proposed relationship: either an entity that already
/// exists in the graph, or an index into the batch's pending-entity arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    /// A committed entity.
    Existing(EntityId),
    /// The `i`-th pending entity of the current batch, by emission order.
    Pending(usize),
}

impl From<EntityId> for EntityRef {
    fn from(id: EntityId) -> Self {
        Self::Existing(id)
    }
}

/// Specification of an entity to be created during commit.
///
/// Missing fields are defaulted by the graph store (`status` from the kind's
/// default, timestamps from the current tick).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingEntity {
    /// Entity kind.
    pub kind: String,
    /// Kind-scoped subtype.
    pub subtype: String,
    /// Display name.
    pub name: String,
    /// Narrative description.
    pub description: String,
    /// Lifecycle status; empty string means "use the kind's default".
    #[serde(default)]
    pub status: String,
    /// Starting prominence.
    #[serde(default)]
    pub prominence: Prominence,
    /// Cultural affiliation.
    #[serde(default)]
    pub culture: String,
    /// Initial tags.
    #[serde(default)]
    pub tags: TagMap,
    /// Spatial position, when the template derived one.
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

/// A relationship proposed by a template or system, with endpoints that may
/// reference pending entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedRelationship {
    /// Relationship kind.
    pub kind: String,
    /// Source endpoint.
    pub src: EntityRef,
    /// Destination endpoint.
    pub dst: EntityRef,
    /// Bond strength; `None` means "use the kind's schema default".
    pub strength: Option<f64>,
    /// Separation value for lineage kinds.
    pub distance: Option<f64>,
}

impl ProposedRelationship {
    /// Propose an edge between two already-committed entities with schema
    /// defaults for strength.
    pub fn between(kind: &str, src: EntityId, dst: EntityId) -> Self {
        Self {
            kind: String::from(kind),
            src: EntityRef::Existing(src),
            dst: EntityRef::Existing(dst),
            strength: None,
            distance: None,
        }
    }

    /// Propose an edge with explicit endpoints (pending or existing).
    pub fn linking(kind: &str, src: EntityRef, dst: EntityRef) -> Self {
        Self {
            kind: String::from(kind),
            src,
            dst,
            strength: None,
            distance: None,
        }
    }

    /// Attach an explicit strength.
    #[must_use]
    pub const fn with_strength(mut self, strength: f64) -> Self {
        self.strength = Some(strength);
        self
    }

    /// Attach a lineage distance.
    #[must_use]
    pub const fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }
}

/// A shallow patch applied to an existing entity.
///
/// `None` fields are left untouched; tag operations are applied after the
/// scalar fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityPatch {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New lifecycle status.
    pub status: Option<String>,
    /// New prominence.
    pub prominence: Option<Prominence>,
    /// New cultural affiliation.
    pub culture: Option<String>,
    /// New coordinates.
    pub coordinates: Option<Coordinates>,
    /// Tags to set (insert or update).
    #[serde(default)]
    pub set_tags: Vec<(String, TagValue)>,
    /// Tag keys to remove.
    #[serde(default)]
    pub remove_tags: Vec<String>,
}

impl EntityPatch {
    /// A patch that only changes the lifecycle status.
    pub fn status(status: &str) -> Self {
        Self {
            status: Some(String::from(status)),
            ..Self::default()
        }
    }

    /// A patch that only sets one tag.
    pub fn tag(key: &str, value: impl Into<TagValue>) -> Self {
        Self {
            set_tags: vec![(String::from(key), value.into())],
            ..Self::default()
        }
    }
}

/// A targeted modification of an existing entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityChange {
    /// The entity to modify.
    pub id: EntityId,
    /// The patch to apply.
    pub changes: EntityPatch,
}

/// A strength delta applied to an existing relationship, identified by its
/// `(kind, src, dst)` triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthAdjustment {
    /// Relationship kind.
    pub kind: String,
    /// Source endpoint.
    pub src: EntityId,
    /// Destination endpoint.
    pub dst: EntityId,
    /// Delta added to the current strength (result clamped to `[0, 1]`).
    pub delta: f64,
}

/// A relationship identified for archival or removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipKey {
    /// Relationship kind.
    pub kind: String,
    /// Source endpoint.
    pub src: EntityId,
    /// Destination endpoint.
    pub dst: EntityId,
}

impl RelationshipKey {
    /// Build a key from its parts.
    pub fn new(kind: &str, src: EntityId, dst: EntityId) -> Self {
        Self {
            kind: String::from(kind),
            src,
            dst,
        }
    }
}

/// Result of a growth template's `expand`.
///
/// A template that cannot satisfy its preconditions returns
/// [`GrowthResult::empty`] with a human-readable reason -- never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthResult {
    /// Entities to create, in arena order.
    pub entities: Vec<PendingEntity>,
    /// Relationships to add after entity creation.
    pub relationships: Vec<ProposedRelationship>,
    /// What happened (or why nothing did).
    pub description: String,
}

impl GrowthResult {
    /// The canonical empty result: zero mutations plus an explanation.
    pub fn empty(reason: &str) -> Self {
        Self {
            description: String::from(reason),
            ..Self::default()
        }
    }

    /// `true` when the result proposes no mutations.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }
}

/// Result of a simulation system's `apply`.
///
/// Systems mostly mutate existing state, but a few (legend crystallization)
/// create a bounded number of new memorial entities, so the shape carries a
/// pending arena as well.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemResult {
    /// New memorial/side-effect entities, in arena order.
    pub entities_created: Vec<PendingEntity>,
    /// Relationships to add.
    pub relationships_added: Vec<ProposedRelationship>,
    /// Patches to existing entities.
    pub entities_modified: Vec<EntityChange>,
    /// Strength deltas on existing relationships (decay, reinforcement).
    #[serde(default)]
    pub relationships_adjusted: Vec<StrengthAdjustment>,
    /// Relationships to mark historical (culling's gentle path).
    #[serde(default)]
    pub relationships_archived: Vec<RelationshipKey>,
    /// Relationships to remove outright (migration, culling cleanup).
    #[serde(default)]
    pub relationships_removed: Vec<RelationshipKey>,
    /// Per-kind formation cooldowns to record for entities.
    #[serde(default)]
    pub cooldowns_recorded: Vec<(EntityId, String)>,
    /// Proposed pressure deltas, summed with other sources before clamping.
    pub pressure_changes: BTreeMap<String, f64>,
    /// What happened (or why the system lay dormant).
    pub description: String,
}

impl SystemResult {
    /// The canonical empty result with an explanation.
    pub fn empty(description: &str) -> Self {
        Self {
            description: String::from(description),
            ..Self::default()
        }
    }

    /// The all-empty result a throttled system returns. This is the expected
    /// steady state most ticks, not an error.
    pub fn dormant(system_name: &str) -> Self {
        Self::empty(&format!("{system_name} dormant this tick"))
    }

    /// `true` when the result proposes no mutations at all.
    pub fn is_empty(&self) -> bool {
        self.entities_created.is_empty()
            && self.relationships_added.is_empty()
            && self.entities_modified.is_empty()
            && self.relationships_adjusted.is_empty()
            && self.relationships_archived.is_empty()
            && self.relationships_removed.is_empty()
            && self.cooldowns_recorded.is_empty()
            && self.pressure_changes.is_empty()
    }
}
