//! Growth template contract and shared gating helpers.

use loreweave_graph::WorldGraph;
use loreweave_types::{DomainSchema, EntityId, GrowthResult};

use crate::error::EngineError;
use crate::rng::SimRng;

/// A structural recipe for world growth.
///
/// Templates run after the fixed system pipeline each tick. The driver asks
/// `can_apply` (a cheap, possibly probabilistic gate), picks a target from
/// `find_targets`, and calls `expand` to produce a mutation batch for the
/// commit step.
///
/// `expand` takes the graph mutably because some templates must create an
/// anchor entity up front so the rest of the expansion can reference its
/// id and derive placement from it; such pre-created entities are *not*
/// part of the returned arena.
pub trait GrowthTemplate {
    /// Stable identifier used for era weighting.
    fn id(&self) -> &'static str;

    /// Human-readable name for logs.
    fn name(&self) -> &'static str;

    /// `true` when this template commits a world discovery, which the
    /// driver must record against the per-epoch discovery budget.
    fn counts_as_discovery(&self) -> bool {
        false
    }

    /// Cheap eligibility gate, rolled once per tick.
    fn can_apply(&self, graph: &WorldGraph, schema: &DomainSchema, rng: &mut SimRng) -> bool;

    /// Candidate target entities, in deterministic order.
    fn find_targets(&self, graph: &WorldGraph, schema: &DomainSchema) -> Vec<EntityId>;

    /// Produce the mutation batch for one application.
    ///
    /// An unmet precondition is an empty result with a reason; an error
    /// means the template cannot run at all in this deployment.
    fn expand(
        &self,
        graph: &mut WorldGraph,
        schema: &DomainSchema,
        target: Option<EntityId>,
        rng: &mut SimRng,
    ) -> Result<GrowthResult, EngineError>;
}

/// `true` when a `(kind, subtype)` bucket has reached its configured target
/// times the overshoot factor. Buckets without a target never saturate.
pub fn bucket_saturated(graph: &WorldGraph, schema: &DomainSchema, kind: &str, subtype: Option<&str>) -> bool {
    let Some(target) = schema.saturation_target(kind, subtype) else {
        return false;
    };
    let cap = (f64::from(target) * DomainSchema::OVERSHOOT).floor();
    #[allow(clippy::cast_precision_loss)]
    let count = graph.entity_count(Some(kind), subtype) as f64;
    count >= cap
}

/// Compose a display name from the schema's pool for a kind plus a
/// generated epithet, falling back to the kind itself for unnamed kinds.
pub fn compose_name(schema: &DomainSchema, kind: &str, epithet: &str, rng: &mut SimRng) -> String {
    let pool = schema.name_pool(kind);
    match rng.pick(pool) {
        Some(base) if epithet.is_empty() => base.clone(),
        Some(base) => format!("{base} {epithet}"),
        None if epithet.is_empty() => String::from(kind),
        None => format!("{kind} {epithet}"),
    }
}
