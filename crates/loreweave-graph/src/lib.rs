//! Entity/relationship graph store, pressures, and validation for the
//! Loreweave simulation.
//!
//! The [`WorldGraph`] is the aggregate root: it owns every entity, the
//! chronological relationship list, the pressure map, cooldown and
//! discovery bookkeeping, and the tick counter. It is created once per run
//! from a seed set and mutated in place by the tick driver; it is never
//! shared across concurrent mutators.
//!
//! # Modules
//!
//! - [`graph`] -- The store: entity/relationship CRUD with the link-cache
//!   invariant, cooldowns, discovery state, growth metrics.
//! - [`query`] -- Read-only projections used by templates and systems.
//! - [`pressure`] -- Clamped scalar pressure map with summed delta apply.
//! - [`validation`] -- Post-run structural integrity checks.
//! - [`error`] -- [`GraphError`].
//!
//! [`WorldGraph`]: graph::WorldGraph
//! [`GraphError`]: error::GraphError

pub mod error;
pub mod graph;
pub mod pressure;
pub mod query;
pub mod validation;

pub use error::GraphError;
pub use graph::{CurrentEra, DiscoveryState, EntityCriteria, GrowthMetrics, WorldGraph};
pub use pressure::PressureMap;
pub use validation::{
    CheckResult, EntityValidator, StructureCheck, ValidationReport, validate_world,
};
