//! Simulation engine for the Loreweave world: growth templates, the
//! fixed-order system pipeline, discovery analysis, and the tick driver.
//!
//! The engine is a pure consumer of `loreweave-graph`: every template and
//! system computes a mutation batch against an immutable view of the graph,
//! and the [`commit`] step applies batches through the two-pass protocol
//! (entities first, then relationships with pending-reference resolution).
//!
//! # Modules
//!
//! - [`template`] -- The [`GrowthTemplate`] contract and shared gating
//!   helpers.
//! - [`templates`] -- The standard growth templates.
//! - [`systems`] -- The fixed-order tick mutators.
//! - [`discovery`] -- World-state analysis backing emergent discovery.
//! - [`commit`] -- Two-pass mutation application.
//! - [`tick`] -- [`TickDriver`]: one tick, and epoch-structured runs.
//! - [`rng`] -- Seeded RNG wrapper and odds-ratio probability scaling.
//! - [`error`] -- [`EngineError`].
//!
//! [`GrowthTemplate`]: template::GrowthTemplate
//! [`TickDriver`]: tick::TickDriver
//! [`EngineError`]: error::EngineError

pub mod commit;
pub mod discovery;
pub mod error;
pub mod rng;
pub mod systems;
pub mod template;
pub mod templates;
pub mod tick;

pub use commit::{CommitOutcome, commit_growth, commit_system};
pub use error::EngineError;
pub use rng::{SimRng, scaled_probability};
pub use systems::{SimulationSystem, standard_systems};
pub use template::GrowthTemplate;
pub use templates::standard_templates;
pub use tick::{TickDriver, TickSummary};
