//! Shared type definitions for the Loreweave world-growth simulation.
//!
//! This crate is the single source of truth for the data model used across
//! the Loreweave workspace: the entity/relationship graph vocabulary, the
//! mutation shapes produced by growth templates and simulation systems, and
//! the domain schema injected as configuration.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifier wrappers
//! - [`tags`] -- Bounded tag map attached to every entity
//! - [`entity`] -- The entity ("hard state") node type and prominence scale
//! - [`relationship`] -- Typed, attributed directed edges
//! - [`mutation`] -- Pending-entity arenas and template/system result shapes
//! - [`schema`] -- Domain-injected vocabularies, matrices, and word lists

pub mod entity;
pub mod ids;
pub mod mutation;
pub mod relationship;
pub mod schema;
pub mod tags;

// Re-export all public types at crate root for convenience.
pub use entity::{Coordinates, Entity, Prominence};
pub use ids::EntityId;
pub use mutation::{
    EntityChange, EntityPatch, EntityRef, GrowthResult, PendingEntity, ProposedRelationship,
    RelationshipKey, StrengthAdjustment, SystemResult,
};
pub use relationship::{Direction, Relationship, RelationshipCategory, RelationshipStatus};
pub use schema::{
    DiscoveryConfig, DomainSchema, EraSpec, KindSpec, RelationshipRule, SaturationTarget,
    SpatialConfig, ThemeWords,
};
pub use tags::{TagMap, TagValue};
