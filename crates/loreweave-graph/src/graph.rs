//! The graph store: entities, relationships, cooldowns, discovery state.
//!
//! # The link-cache invariant
//!
//! Every entity caches its outgoing relationships in `links`. Every
//! successful [`WorldGraph::add_relationship`] performs a dual write: one
//! copy onto the global chronological relationship list, one identical copy
//! onto the source entity's cache, and an `updated_at` touch on both
//! endpoints. This dual write is the single most important correctness
//! property of the store; the validation engine checks it exactly.
//!
//! # Permissiveness
//!
//! Inserting a relationship whose endpoints do not (yet) exist is allowed:
//! templates rely on forward references resolved within the same commit
//! batch, and cross-batch dangling references are a recoverable data-quality
//! defect reported by validation, not a crash. Such inserts are logged at
//! `warn` level.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use loreweave_types::{
    Direction, Entity, EntityId, EntityPatch, PendingEntity, Relationship, RelationshipCategory,
    RelationshipStatus,
};

use crate::error::GraphError;
use crate::pressure::PressureMap;

/// Width of the rolling window for the relationship-formation rate.
const GROWTH_WINDOW: usize = 10;

/// The era the simulation is currently in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentEra {
    /// Position in the schema's era schedule.
    pub index: usize,
    /// Stable era identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Per-template selection weights for this era.
    pub template_weights: BTreeMap<String, f64>,
    /// Odds-ratio modifier applied to system throttle rolls.
    pub system_modifier: f64,
}

/// Per-epoch discovery bookkeeping; the counters reset at epoch boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryState {
    /// Current probability threshold for the discovery roll.
    pub current_threshold: f64,
    /// Tick of the most recent discovery, if any.
    pub last_discovery_tick: Option<u64>,
    /// Discoveries committed during the current epoch.
    pub discoveries_this_epoch: u32,
}

impl Default for DiscoveryState {
    fn default() -> Self {
        Self {
            current_threshold: Self::BASE_THRESHOLD,
            last_discovery_tick: None,
            discoveries_this_epoch: 0,
        }
    }
}

impl DiscoveryState {
    /// Starting roll threshold, restored at every epoch boundary.
    pub const BASE_THRESHOLD: f64 = 0.5;

    /// Record a committed discovery at the given tick. Each discovery
    /// lowers the threshold, damping further discoveries within the epoch.
    pub fn record(&mut self, tick: u64) {
        self.last_discovery_tick = Some(tick);
        self.discoveries_this_epoch = self.discoveries_this_epoch.saturating_add(1);
        self.current_threshold = (self.current_threshold - 0.15).max(0.1);
    }

    /// Reset the per-epoch counter and threshold at an epoch boundary.
    pub const fn reset_epoch(&mut self) {
        self.discoveries_this_epoch = 0;
        self.current_threshold = Self::BASE_THRESHOLD;
    }
}

/// Rolling relationship-formation rate over the last few ticks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthMetrics {
    /// Relationships formed per tick, most recent last.
    window: Vec<u32>,
    /// Count accumulated during the current tick.
    current: u32,
}

impl GrowthMetrics {
    /// Count one formed relationship in the current tick.
    pub const fn record_formation(&mut self) {
        self.current = self.current.saturating_add(1);
    }

    /// Close out the current tick's count and roll the window.
    pub fn roll_tick(&mut self) {
        self.window.push(self.current);
        self.current = 0;
        if self.window.len() > GROWTH_WINDOW {
            self.window.remove(0);
        }
    }

    /// Mean relationships formed per tick over the window.
    pub fn formation_rate(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let total: u64 = self.window.iter().map(|&c| u64::from(c)).sum();
        #[allow(clippy::cast_precision_loss)]
        let rate = total as f64 / self.window.len() as f64;
        rate
    }
}

/// AND-combined entity filter used by [`WorldGraph::find_entities`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityCriteria {
    /// Required kind, if set.
    pub kind: Option<String>,
    /// Required subtype, if set.
    pub subtype: Option<String>,
    /// Required status, if set.
    pub status: Option<String>,
}

impl EntityCriteria {
    /// Filter by kind only.
    pub fn kind(kind: &str) -> Self {
        Self {
            kind: Some(String::from(kind)),
            ..Self::default()
        }
    }

    /// Add a subtype requirement.
    #[must_use]
    pub fn with_subtype(mut self, subtype: &str) -> Self {
        self.subtype = Some(String::from(subtype));
        self
    }

    /// Add a status requirement.
    #[must_use]
    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(String::from(status));
        self
    }

    fn matches(&self, entity: &Entity) -> bool {
        self.kind.as_ref().is_none_or(|k| &entity.kind == k)
            && self.subtype.as_ref().is_none_or(|s| &entity.subtype == s)
            && self.status.as_ref().is_none_or(|s| &entity.status == s)
    }
}

/// The aggregate root of the simulation: the world graph and all of its
/// bookkeeping state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldGraph {
    entities: BTreeMap<EntityId, Entity>,
    /// Chronological: insertion order is the historical record and is
    /// meaningful for index-based reporting.
    relationships: Vec<Relationship>,
    tick: u64,
    /// The current era's metadata.
    pub era: CurrentEra,
    /// Named world-tension scalars.
    pub pressures: PressureMap,
    relationship_cooldowns: BTreeMap<EntityId, BTreeMap<String, u64>>,
    /// Discovery gating state.
    pub discovery: DiscoveryState,
    /// Rolling relationship-formation rate.
    pub growth: GrowthMetrics,
    next_id: u64,
}

impl WorldGraph {
    /// Create an empty graph at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance the tick counter by one and roll the growth window.
    pub fn advance_tick(&mut self) {
        self.tick = self.tick.saturating_add(1);
        self.growth.roll_tick();
    }

    // -------------------------------------------------------------------
    // Entity operations
    // -------------------------------------------------------------------

    /// Look up an entity by id.
    pub fn get_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// `true` when the entity exists.
    pub fn has_entity(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// All entities matching the AND-combined criteria, in id order.
    pub fn find_entities(&self, criteria: &EntityCriteria) -> Vec<&Entity> {
        self.entities
            .values()
            .filter(|e| criteria.matches(e))
            .collect()
    }

    /// Iterate over all entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Number of entities matching the optional kind/subtype filters.
    pub fn entity_count(&self, kind: Option<&str>, subtype: Option<&str>) -> usize {
        self.entities
            .values()
            .filter(|e| kind.is_none_or(|k| e.kind == k))
            .filter(|e| subtype.is_none_or(|s| e.subtype == s))
            .count()
    }

    /// Create an entity from a pending spec, assigning the next id and
    /// stamping both timestamps with the current tick.
    ///
    /// `default_status` fills the status when the spec leaves it empty
    /// (callers pass the kind's default from the domain schema).
    pub fn create_entity(&mut self, spec: PendingEntity, default_status: &str) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);

        let status = if spec.status.is_empty() {
            String::from(default_status)
        } else {
            spec.status
        };

        let entity = Entity {
            id,
            kind: spec.kind,
            subtype: spec.subtype,
            name: spec.name,
            description: spec.description,
            status,
            prominence: spec.prominence,
            culture: spec.culture,
            tags: spec.tags,
            links: Vec::new(),
            created_at: self.tick,
            updated_at: self.tick,
            coordinates: spec.coordinates,
        };
        self.entities.insert(id, entity);
        id
    }

    /// Insert a fully-built entity, adopting its id into the allocator.
    ///
    /// Used by the seed builder and by templates that must create an entity
    /// mid-`expand` (e.g. so coordinate derivation can reference it) before
    /// the rest of the batch commits.
    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        if id.into_inner() >= self.next_id {
            self.next_id = id.into_inner().saturating_add(1);
        }
        self.entities.insert(id, entity);
        id
    }

    /// Apply a shallow patch to an entity and stamp `updated_at`.
    ///
    /// Tag inserts that would exceed the tag cap are dropped with a warning
    /// rather than failing the whole patch.
    pub fn update_entity(&mut self, id: EntityId, patch: &EntityPatch) -> Result<(), GraphError> {
        let tick = self.tick;
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(GraphError::EntityNotFound(id))?;

        if let Some(name) = &patch.name {
            entity.name.clone_from(name);
        }
        if let Some(description) = &patch.description {
            entity.description.clone_from(description);
        }
        if let Some(status) = &patch.status {
            entity.status.clone_from(status);
        }
        if let Some(prominence) = patch.prominence {
            entity.prominence = prominence;
        }
        if let Some(culture) = &patch.culture {
            entity.culture.clone_from(culture);
        }
        if let Some(coordinates) = patch.coordinates {
            entity.coordinates = Some(coordinates);
        }
        for (key, value) in &patch.set_tags {
            if !entity.tags.set(key, value.clone()) {
                warn!(entity = %id, tag = key.as_str(), "tag cap reached, tag dropped");
            }
        }
        for key in &patch.remove_tags {
            entity.tags.remove(key);
        }
        entity.updated_at = tick;
        Ok(())
    }

    /// Delete an entity and every relationship touching it (global list and
    /// the link caches of other sources).
    pub fn delete_entity(&mut self, id: EntityId) -> Result<(), GraphError> {
        if self.entities.remove(&id).is_none() {
            return Err(GraphError::EntityNotFound(id));
        }
        self.relationships.retain(|r| !r.touches(id));
        for entity in self.entities.values_mut() {
            entity.links.retain(|r| !r.touches(id));
        }
        self.relationship_cooldowns.remove(&id);
        Ok(())
    }

    fn touch(&mut self, id: EntityId) {
        let tick = self.tick;
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.updated_at = tick;
        }
    }

    // -------------------------------------------------------------------
    // Relationship operations
    // -------------------------------------------------------------------

    /// The global chronological relationship list.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Add a relationship, maintaining the link-cache invariant.
    ///
    /// Returns `false` (a no-op) when an identical `(kind, src, dst)`
    /// triple already exists -- relationships are deduplicated, not
    /// versioned. Endpoints are not required to exist; see the module docs.
    pub fn add_relationship(
        &mut self,
        kind: &str,
        src: EntityId,
        dst: EntityId,
        strength: f64,
        distance: Option<f64>,
        category: RelationshipCategory,
    ) -> bool {
        if self.relationships.iter().any(|r| r.matches(kind, src, dst)) {
            return false;
        }
        if !self.has_entity(src) || !self.has_entity(dst) {
            warn!(
                kind,
                %src,
                %dst,
                "relationship endpoint missing at insertion; deferred to validation"
            );
        }

        let relationship = Relationship {
            kind: String::from(kind),
            src,
            dst,
            strength: strength.clamp(0.0, 1.0),
            distance,
            category,
            status: RelationshipStatus::Active,
            archived_at: None,
        };

        // Dual write: global list plus the source entity's cache.
        self.relationships.push(relationship.clone());
        if let Some(entity) = self.entities.get_mut(&src) {
            entity.links.push(relationship);
        }
        self.touch(src);
        self.touch(dst);
        true
    }

    /// Remove a relationship by its identifying triple from both the global
    /// list and the source's cache. Returns `false` when no such edge
    /// exists.
    pub fn remove_relationship(&mut self, src: EntityId, dst: EntityId, kind: &str) -> bool {
        let before = self.relationships.len();
        self.relationships.retain(|r| !r.matches(kind, src, dst));
        if self.relationships.len() == before {
            return false;
        }
        if let Some(entity) = self.entities.get_mut(&src) {
            entity.links.retain(|r| !r.matches(kind, src, dst));
        }
        self.touch(src);
        self.touch(dst);
        true
    }

    /// Mark a relationship historical instead of deleting it, in both the
    /// global list and the source's cache.
    pub fn archive_relationship(&mut self, src: EntityId, dst: EntityId, kind: &str) -> bool {
        let tick = self.tick;
        let mut archived = false;
        for r in &mut self.relationships {
            if r.matches(kind, src, dst) && r.status == RelationshipStatus::Active {
                r.status = RelationshipStatus::Historical;
                r.archived_at = Some(tick);
                archived = true;
            }
        }
        if archived {
            if let Some(entity) = self.entities.get_mut(&src) {
                for r in &mut entity.links {
                    if r.matches(kind, src, dst) {
                        r.status = RelationshipStatus::Historical;
                        r.archived_at = Some(tick);
                    }
                }
            }
            self.touch(src);
            self.touch(dst);
        }
        archived
    }

    /// Mutate the strength of a relationship in both copies. Returns the
    /// new strength, or `None` when the edge does not exist.
    pub fn adjust_strength(
        &mut self,
        src: EntityId,
        dst: EntityId,
        kind: &str,
        delta: f64,
    ) -> Option<f64> {
        let mut updated = None;
        for r in &mut self.relationships {
            if r.matches(kind, src, dst) {
                r.strength = (r.strength + delta).clamp(0.0, 1.0);
                updated = Some(r.strength);
            }
        }
        if let Some(strength) = updated {
            if let Some(entity) = self.entities.get_mut(&src) {
                for r in &mut entity.links {
                    if r.matches(kind, src, dst) {
                        r.strength = strength;
                    }
                }
            }
            self.touch(src);
            self.touch(dst);
        }
        updated
    }

    /// Relationships touching an entity in the requested direction.
    /// Outgoing edges come from the entity's cache; incoming edges from a
    /// scan of the global list.
    pub fn entity_relationships(&self, id: EntityId, direction: Direction) -> Vec<&Relationship> {
        match direction {
            Direction::Outgoing => self
                .entities
                .get(&id)
                .map(|e| e.links.iter().collect())
                .unwrap_or_default(),
            Direction::Incoming => self.relationships.iter().filter(|r| r.dst == id).collect(),
            Direction::Both => self.relationships.iter().filter(|r| r.touches(id)).collect(),
        }
    }

    // -------------------------------------------------------------------
    // Cooldown bookkeeping
    // -------------------------------------------------------------------

    /// Record that `entity` formed a relationship of `kind` this tick,
    /// counting it toward the growth metric.
    pub fn record_relationship_formation(&mut self, entity: EntityId, kind: &str) {
        self.set_formation_cooldown(entity, kind);
        self.growth.record_formation();
    }

    /// Start the formation cooldown for `entity` without counting a new
    /// formation. Used for the passive endpoint of an edge whose active
    /// endpoint was already recorded.
    pub fn set_formation_cooldown(&mut self, entity: EntityId, kind: &str) {
        let tick = self.tick;
        self.relationship_cooldowns
            .entry(entity)
            .or_default()
            .insert(String::from(kind), tick);
    }

    /// `true` when `entity` is off cooldown for forming a `kind`
    /// relationship: at least `cooldown` ticks since the last formation.
    pub fn can_form_relationship(&self, entity: EntityId, kind: &str, cooldown: u64) -> bool {
        self.relationship_cooldowns
            .get(&entity)
            .and_then(|kinds| kinds.get(kind))
            .is_none_or(|&last| self.tick >= last.saturating_add(cooldown))
    }

    /// The tick at which `entity` last formed a `kind` relationship.
    pub fn last_formation_tick(&self, entity: EntityId, kind: &str) -> Option<u64> {
        self.relationship_cooldowns
            .get(&entity)
            .and_then(|kinds| kinds.get(kind))
            .copied()
    }
}
