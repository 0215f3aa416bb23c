//! The fixed-order system pipeline.
//!
//! Systems run every tick in a dependency-ordered sequence: decay before
//! reinforcement (so reinforcement offsets it), formation after both,
//! domain systems in the middle, culling last as cleanup. Each system
//! independently decides whether to run via a throttle roll modulated by
//! the era modifier; a dormant system returns the all-empty result with a
//! descriptive string, the expected steady state most ticks.

pub mod contagion;
pub mod culling;
pub mod decay;
pub mod formation;
pub mod legends;
pub mod prominence;
pub mod reinforcement;
pub mod thermal;
pub mod triggers;

use loreweave_graph::WorldGraph;
use loreweave_types::{DomainSchema, EntityId, RelationshipStatus, SystemResult};

use crate::rng::SimRng;

pub use contagion::BeliefContagion;
pub use culling::RelationshipCulling;
pub use decay::RelationshipDecay;
pub use formation::RelationshipFormation;
pub use legends::LegendCrystallization;
pub use prominence::ProminenceEvolution;
pub use reinforcement::RelationshipReinforcement;
pub use thermal::ThermalCascade;
pub use triggers::{
    ClusterMode, EntityFilter, ThresholdTriggers, TriggerAction, TriggerCondition, TriggerConfig,
};

/// A tick-mutator over existing world state.
///
/// Systems share the mutation shape with templates but mostly modify what
/// already exists; a few create a bounded number of side-effect entities.
/// `apply` never mutates the graph directly -- the driver commits the
/// returned result.
pub trait SimulationSystem {
    /// Stable name for logs and dormancy descriptions.
    fn name(&self) -> &'static str;

    /// Compute this tick's mutations.
    fn apply(
        &self,
        graph: &WorldGraph,
        schema: &DomainSchema,
        era_modifier: f64,
        rng: &mut SimRng,
    ) -> SystemResult;
}

/// The standard pipeline, in execution order.
pub fn standard_systems() -> Vec<Box<dyn SimulationSystem>> {
    vec![
        Box::new(RelationshipDecay),
        Box::new(RelationshipReinforcement),
        Box::new(RelationshipFormation),
        Box::new(BeliefContagion),
        Box::new(ProminenceEvolution),
        Box::new(LegendCrystallization),
        Box::new(ThermalCascade),
        Box::new(ThresholdTriggers::standard()),
        Box::new(RelationshipCulling),
    ]
}

// -----------------------------------------------------------------------
// Shared projections
// -----------------------------------------------------------------------

/// The first location an entity resides in, via its outgoing
/// `resident_of` cache.
pub(crate) fn location_of(graph: &WorldGraph, id: EntityId) -> Option<EntityId> {
    graph.get_entity(id)?.links.iter().find_map(|r| {
        (r.kind == "resident_of" && r.status == RelationshipStatus::Active).then_some(r.dst)
    })
}

/// The first faction an entity belongs to, via its outgoing `member_of`
/// cache.
pub(crate) fn faction_of(graph: &WorldGraph, id: EntityId) -> Option<EntityId> {
    graph.get_entity(id)?.links.iter().find_map(|r| {
        (r.kind == "member_of" && r.status == RelationshipStatus::Active).then_some(r.dst)
    })
}

/// Political stance between two factions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stance {
    Allied,
    AtWar,
    Neutral,
}

/// Stance between two factions, reading active political edges in either
/// direction. War outweighs a stale alliance edge.
pub(crate) fn faction_stance(graph: &WorldGraph, a: EntityId, b: EntityId) -> Stance {
    let mut allied = false;
    for r in graph.relationships() {
        if r.status != RelationshipStatus::Active {
            continue;
        }
        let connects = (r.src == a && r.dst == b) || (r.src == b && r.dst == a);
        if !connects {
            continue;
        }
        if r.kind == "at_war_with" {
            return Stance::AtWar;
        }
        if r.kind == "ally_of" {
            allied = true;
        }
    }
    if allied { Stance::Allied } else { Stance::Neutral }
}

#[cfg(test)]
mod tests {
    use loreweave_types::{PendingEntity, RelationshipCategory};

    use super::*;

    fn entity(graph: &mut WorldGraph, kind: &str, name: &str) -> EntityId {
        graph.create_entity(
            PendingEntity {
                kind: String::from(kind),
                subtype: String::from("guild"),
                name: String::from(name),
                ..PendingEntity::default()
            },
            "established",
        )
    }

    #[test]
    fn stance_prefers_war_over_alliance() {
        let mut graph = WorldGraph::new();
        let a = entity(&mut graph, "faction", "Ashen Compact");
        let b = entity(&mut graph, "faction", "Riverfolk");
        assert_eq!(faction_stance(&graph, a, b), Stance::Neutral);

        assert!(graph.add_relationship("ally_of", a, b, 0.6, None, RelationshipCategory::Political));
        assert_eq!(faction_stance(&graph, a, b), Stance::Allied);

        assert!(graph.add_relationship("at_war_with", b, a, 0.8, None, RelationshipCategory::Political));
        assert_eq!(faction_stance(&graph, a, b), Stance::AtWar);
        assert_eq!(faction_stance(&graph, b, a), Stance::AtWar);
    }

    #[test]
    fn pipeline_order_is_fixed() {
        let systems = standard_systems();
        let names: Vec<&str> = systems.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "relationship_decay",
                "relationship_reinforcement",
                "relationship_formation",
                "belief_contagion",
                "prominence_evolution",
                "legend_crystallization",
                "thermal_cascade",
                "threshold_triggers",
                "relationship_culling",
            ]
        );
    }
}
