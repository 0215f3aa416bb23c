//! Relationship formation: new social bonds between co-located NPCs.
//!
//! Initiators are weighted inversely to their existing degree so isolated
//! entities catch up instead of hubs compounding. The candidate kind is
//! weighted by world pressure and the pair's faction stance, then filtered
//! against duplicates, per-kind cooldowns on both endpoints, and the
//! schema's contradiction table.

use std::collections::BTreeMap;

use tracing::debug;

use loreweave_graph::WorldGraph;
use loreweave_types::{
    DomainSchema, EntityId, ProposedRelationship, RelationshipStatus, SystemResult,
};

use crate::rng::SimRng;
use crate::systems::{SimulationSystem, Stance, faction_of, faction_stance, location_of};

/// Chance the formation pass runs, before era weighting.
const RUN_CHANCE: f64 = 0.4;

/// Candidate bond kinds with their base selection weights.
const CANDIDATE_KINDS: [(&str, f64); 5] = [
    ("friend_of", 1.0),
    ("rival_of", 0.5),
    ("follower_of", 0.4),
    ("enemy_of", 0.3),
    ("lover_of", 0.2),
];

/// Degree-inverse initiator weight: isolated entities are strongly
/// favored, hubs strongly suppressed.
fn connection_weight(degree: usize) -> f64 {
    match degree {
        0 => 3.0,
        1 | 2 => 1.5,
        3 | 4 => 1.0,
        5..=7 => 0.5,
        _ => 0.2,
    }
}

/// `true` when an active edge of `kind` already connects the pair in
/// either direction.
fn pair_has_kind(graph: &WorldGraph, a: EntityId, b: EntityId, kind: &str) -> bool {
    graph.relationships().iter().any(|r| {
        r.kind == kind
            && r.status == RelationshipStatus::Active
            && ((r.src == a && r.dst == b) || (r.src == b && r.dst == a))
    })
}

/// `true` when `kind` contradicts any active kind already held between the
/// pair.
fn pair_contradicts(
    graph: &WorldGraph,
    schema: &DomainSchema,
    a: EntityId,
    b: EntityId,
    kind: &str,
) -> bool {
    graph.relationships().iter().any(|r| {
        r.status == RelationshipStatus::Active
            && ((r.src == a && r.dst == b) || (r.src == b && r.dst == a))
            && schema.contradicts(&r.kind, kind)
    })
}

/// Pressure and stance scaling for one candidate kind.
fn kind_weight(base: f64, kind: &str, conflict: f64, stance: Stance) -> f64 {
    let hostile = kind == "enemy_of" || kind == "rival_of";
    let mut weight = base;
    if hostile {
        weight *= 1.0 + conflict / 50.0;
    } else {
        weight *= 1.0 / (1.0 + conflict / 100.0);
    }
    match stance {
        Stance::AtWar if hostile => weight *= 3.0,
        Stance::AtWar => weight *= 0.2,
        Stance::Allied if hostile => weight *= 0.3,
        Stance::Allied => weight *= 2.0,
        _ => {}
    }
    weight
}

/// The formation pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipFormation;

impl RelationshipFormation {
    /// Attempt one formation among the residents of a single location.
    fn form_at(
        graph: &WorldGraph,
        schema: &DomainSchema,
        residents: &[EntityId],
        rng: &mut SimRng,
        result: &mut SystemResult,
    ) {
        let weighted: Vec<(EntityId, f64)> = residents
            .iter()
            .map(|&id| {
                let degree = graph.get_entity(id).map_or(0, |e| e.degree());
                (id, connection_weight(degree))
            })
            .collect();
        let Some(&initiator) = rng.pick_weighted(&weighted) else {
            return;
        };
        let partners: Vec<EntityId> = residents
            .iter()
            .copied()
            .filter(|&id| id != initiator)
            .collect();
        let Some(&partner) = rng.pick(&partners) else {
            return;
        };

        let conflict = graph.pressures.pressure("conflict");
        let stance = match (faction_of(graph, initiator), faction_of(graph, partner)) {
            (Some(a), Some(b)) if a != b => faction_stance(graph, a, b),
            _ => Stance::Neutral,
        };

        let viable: Vec<(&str, f64)> = CANDIDATE_KINDS
            .iter()
            .filter(|(kind, _)| {
                let cooldown = schema.cooldown(kind);
                !pair_has_kind(graph, initiator, partner, kind)
                    && graph.can_form_relationship(initiator, kind, cooldown)
                    && graph.can_form_relationship(partner, kind, cooldown)
                    && !pair_contradicts(graph, schema, initiator, partner, kind)
            })
            .map(|&(kind, base)| (kind, kind_weight(base, kind, conflict, stance)))
            .collect();
        let Some(&kind) = rng.pick_weighted(&viable) else {
            return;
        };

        debug!(%initiator, %partner, kind, "bond forming");
        result
            .relationships_added
            .push(ProposedRelationship::between(kind, initiator, partner));
        // The commit step records the initiator; the partner shares the
        // cooldown without counting a second formation.
        result
            .cooldowns_recorded
            .push((partner, String::from(kind)));
        if kind == "enemy_of" {
            let slot = result
                .pressure_changes
                .entry(String::from("conflict"))
                .or_insert(0.0);
            *slot += 1.0;
        }
    }
}

impl SimulationSystem for RelationshipFormation {
    fn name(&self) -> &'static str {
        "relationship_formation"
    }

    fn apply(
        &self,
        graph: &WorldGraph,
        schema: &DomainSchema,
        era_modifier: f64,
        rng: &mut SimRng,
    ) -> SystemResult {
        if !rng.roll_scaled(RUN_CHANCE, era_modifier) {
            return SystemResult::dormant(self.name());
        }

        // Group living NPCs by residence; formation is a local affair.
        let mut by_location: BTreeMap<EntityId, Vec<EntityId>> = BTreeMap::new();
        for entity in graph.entities() {
            if entity.kind != "npc" || entity.status != "alive" {
                continue;
            }
            if let Some(location) = location_of(graph, entity.id) {
                by_location.entry(location).or_default().push(entity.id);
            }
        }

        let mut result = SystemResult::empty("");
        for residents in by_location.values() {
            if residents.len() < 2 {
                continue;
            }
            Self::form_at(graph, schema, residents, rng, &mut result);
        }
        result.description = format!("{} bonds formed", result.relationships_added.len());
        result
    }
}
