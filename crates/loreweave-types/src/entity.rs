//! The entity ("hard state") node type and its prominence scale.

use serde::{Deserialize, Serialize};

use crate::ids::EntityId;
use crate::relationship::Relationship;
use crate::tags::TagMap;

/// How widely an entity is known in the world.
///
/// The ordering is meaningful: prominence evolution moves entities one step
/// at a time along this scale.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Prominence {
    /// Known to nobody; a candidate for culling or memorialization.
    Forgotten,
    /// Known only locally.
    #[default]
    Marginal,
    /// Known across its region.
    Recognized,
    /// Known across the world.
    Renowned,
    /// Woven into legend.
    Mythic,
}

impl Prominence {
    /// One step up the scale, saturating at [`Prominence::Mythic`].
    pub const fn raised(self) -> Self {
        match self {
            Self::Forgotten => Self::Marginal,
            Self::Marginal => Self::Recognized,
            Self::Recognized => Self::Renowned,
            Self::Renowned | Self::Mythic => Self::Mythic,
        }
    }

    /// One step down the scale, saturating at [`Prominence::Forgotten`].
    pub const fn lowered(self) -> Self {
        match self {
            Self::Mythic => Self::Renowned,
            Self::Renowned => Self::Recognized,
            Self::Recognized => Self::Marginal,
            Self::Marginal | Self::Forgotten => Self::Forgotten,
        }
    }
}

/// A point in the world's 3-D coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Coordinates {
    /// East-west position.
    pub x: f64,
    /// North-south position.
    pub y: f64,
    /// Elevation.
    pub z: f64,
}

/// A typed node in the world graph.
///
/// `kind`, `subtype`, and `status` are open string vocabularies validated
/// against the domain schema, not compile-time enums -- the set varies per
/// deployed world.
///
/// # Link cache invariant
///
/// `links` must always equal the set of relationships in the graph's global
/// relationship list whose `src` is this entity's id. The graph store
/// maintains this on every relationship insert/remove; any divergence is a
/// validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique, stable identifier.
    pub id: EntityId,
    /// Entity kind (e.g. `location`, `npc`, `faction`, `rules`, `abilities`).
    pub kind: String,
    /// Kind-scoped subtype (e.g. `hero`, `outlaw`, `merchant` for `npc`).
    pub subtype: String,
    /// Display name.
    pub name: String,
    /// Narrative description.
    pub description: String,
    /// Kind-scoped lifecycle tag (e.g. `thriving`, `waning` for colonies).
    pub status: String,
    /// How widely this entity is known.
    pub prominence: Prominence,
    /// Cultural affiliation tag.
    pub culture: String,
    /// Bounded open-ended annotations.
    pub tags: TagMap,
    /// Cached outgoing relationships (see the link cache invariant above).
    pub links: Vec<Relationship>,
    /// Tick at which the entity was created.
    pub created_at: u64,
    /// Tick of the most recent mutation touching this entity.
    pub updated_at: u64,
    /// Optional spatial position, present only for placed entities.
    pub coordinates: Option<Coordinates>,
}

impl Entity {
    /// Number of cached outgoing links.
    pub fn degree(&self) -> usize {
        self.links.len()
    }

    /// `true` when an outgoing link of `kind` to `dst` is cached.
    pub fn has_link(&self, kind: &str, dst: EntityId) -> bool {
        self.links.iter().any(|r| r.kind == kind && r.dst == dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prominence_ordering_is_meaningful() {
        assert!(Prominence::Forgotten < Prominence::Marginal);
        assert!(Prominence::Renowned < Prominence::Mythic);
    }

    #[test]
    fn prominence_raise_saturates_at_mythic() {
        assert_eq!(Prominence::Renowned.raised(), Prominence::Mythic);
        assert_eq!(Prominence::Mythic.raised(), Prominence::Mythic);
    }

    #[test]
    fn prominence_lower_saturates_at_forgotten() {
        assert_eq!(Prominence::Marginal.lowered(), Prominence::Forgotten);
        assert_eq!(Prominence::Forgotten.lowered(), Prominence::Forgotten);
    }

    #[test]
    fn prominence_serde_uses_snake_case() {
        let json = serde_json::to_string(&Prominence::Recognized).ok();
        assert_eq!(json.as_deref(), Some("\"recognized\""));
    }
}
