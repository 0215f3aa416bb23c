//! Typed, attributed directed edges between entities.

use serde::{Deserialize, Serialize};

use crate::ids::EntityId;

/// Broad grouping of relationship kinds, derived from the kind by the
/// domain schema's category map.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipCategory {
    /// Alliances, rivalries, wars between power blocs.
    Political,
    /// Personal bonds between individuals.
    #[default]
    Social,
    /// Membership, governance, employment.
    Institutional,
    /// Lineage and spatial facts that never decay (`derived_from`,
    /// `adjacent_to`, ...).
    ImmutableFact,
}

/// Lifecycle state of a relationship.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    /// The relationship currently holds.
    #[default]
    Active,
    /// The relationship once held; kept for the historical record.
    Historical,
}

/// Which direction of edges a relationship query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Edges where the entity is the source.
    Outgoing,
    /// Edges where the entity is the destination.
    Incoming,
    /// Both directions.
    Both,
}

/// A typed directed edge between two entities.
///
/// The `(kind, src, dst)` triple is unique within a graph: the store
/// deduplicates rather than versions repeated insertions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Relationship kind, validated against the domain's
    /// `(src kind, dst kind) -> allowed kinds` matrix.
    pub kind: String,
    /// Source entity id.
    pub src: EntityId,
    /// Destination entity id.
    pub dst: EntityId,
    /// Bond strength in `[0, 1]`; defaulted per kind by the schema.
    pub strength: f64,
    /// Cognitive/ideological/spatial separation in `[0, 1]`; required for
    /// lineage kinds, absent otherwise.
    pub distance: Option<f64>,
    /// Broad grouping derived from `kind`.
    pub category: RelationshipCategory,
    /// Lifecycle state.
    #[serde(default)]
    pub status: RelationshipStatus,
    /// Tick at which the relationship was archived, if it ever was.
    #[serde(default)]
    pub archived_at: Option<u64>,
}

impl Relationship {
    /// `true` when this edge matches the identifying triple.
    pub fn matches(&self, kind: &str, src: EntityId, dst: EntityId) -> bool {
        self.kind == kind && self.src == src && self.dst == dst
    }

    /// `true` when the edge touches the given entity on either end.
    pub const fn touches(&self, id: EntityId) -> bool {
        self.src.0 == id.0 || self.dst.0 == id.0
    }
}
