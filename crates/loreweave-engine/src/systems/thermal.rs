//! Thermal cascade: temperature diffusion over the adjacency graph and
//! its knock-on effects.
//!
//! Runs every fifth tick. Each location carrying a `temperature` number
//! tag moves toward the mean of its `adjacent_to` neighbors through a
//! discrete graph Laplacian step. Downstream effects:
//!
//! - status flips for settlements pushed past the habitable extremes, with
//!   a probabilistic recovery once the temperature returns to the
//!   comfortable band;
//! - resident migration away from extreme locations toward temperate
//!   refuges, gated by a residency-change cooldown;
//! - rediscovery of abilities preserved in the ice once a location
//!   carrying an `ice_memory` tag thaws.

use std::collections::BTreeMap;

use tracing::debug;

use loreweave_graph::{WorldGraph, query};
use loreweave_types::{
    DomainSchema, EntityChange, EntityId, EntityPatch, EntityRef, PendingEntity,
    ProposedRelationship, RelationshipKey, RelationshipStatus, SystemResult,
};

use crate::rng::SimRng;
use crate::systems::SimulationSystem;

/// Tick period of the cascade.
const PERIOD: u64 = 5;
/// Diffusion coefficient of the Laplacian step.
const ALPHA: f64 = 0.1;
/// Tag key holding a location's temperature.
const TEMPERATURE_TAG: &str = "temperature";
/// Tag key marking a preserved ability awaiting thaw.
const ICE_MEMORY_TAG: &str = "ice_memory";
/// Tag set when one step moves a temperature further than expected.
const SHOCK_TAG: &str = "thermal_shock";
/// Upper habitable bound.
const HOT_EXTREME: f64 = 0.8;
/// Lower habitable bound.
const COLD_EXTREME: f64 = 0.2;
/// Comfortable band within which a waning settlement may recover.
const COMFORT: (f64, f64) = (0.3, 0.7);
/// Recovery chance per cascade once back in the comfortable band.
const RECOVERY_CHANCE: f64 = 0.3;
/// One-step excursion treated as a thermal shock.
const SHOCK_DELTA: f64 = 0.3;
/// Temperature above which ice memories thaw.
const THAW_POINT: f64 = 0.5;
/// Residency-change cooldown in ticks.
const MIGRATION_COOLDOWN: u64 = 10;

/// The thermal cascade pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThermalCascade;

fn is_extreme(t: f64) -> bool {
    t > HOT_EXTREME || t < COLD_EXTREME
}

fn in_comfort(t: f64) -> bool {
    (COMFORT.0..=COMFORT.1).contains(&t)
}

/// Residents of a location, via incoming active `resident_of` edges.
fn residents_of(graph: &WorldGraph, location: EntityId) -> Vec<EntityId> {
    graph
        .relationships()
        .iter()
        .filter(|r| {
            r.kind == "resident_of" && r.dst == location && r.status == RelationshipStatus::Active
        })
        .map(|r| r.src)
        .collect()
}

impl ThermalCascade {
    /// One Laplacian step for every temperature-tagged location. Returns
    /// the new temperatures keyed by location id.
    fn diffuse(graph: &WorldGraph) -> BTreeMap<EntityId, f64> {
        let current: BTreeMap<EntityId, f64> = graph
            .entities()
            .filter(|e| e.kind == "location")
            .filter_map(|e| e.tags.number(TEMPERATURE_TAG).map(|t| (e.id, t)))
            .collect();

        let mut next = BTreeMap::new();
        for (&id, &t) in &current {
            let diffs: Vec<f64> = query::neighbors_by_kind(graph, id, "adjacent_to")
                .iter()
                .filter_map(|n| current.get(n).map(|tn| tn - t))
                .collect();
            let t_new = if diffs.is_empty() {
                t
            } else {
                #[allow(clippy::cast_precision_loss)]
                let mean = diffs.iter().sum::<f64>() / diffs.len() as f64;
                t + ALPHA * mean
            };
            next.insert(id, t_new);
        }
        next
    }
}

impl SimulationSystem for ThermalCascade {
    fn name(&self) -> &'static str {
        "thermal_cascade"
    }

    #[allow(clippy::too_many_lines)]
    fn apply(
        &self,
        graph: &WorldGraph,
        _schema: &DomainSchema,
        _era_modifier: f64,
        rng: &mut SimRng,
    ) -> SystemResult {
        if graph.tick() == 0 || graph.tick() % PERIOD != 0 {
            return SystemResult::dormant(self.name());
        }

        let temperatures = Self::diffuse(graph);
        if temperatures.is_empty() {
            return SystemResult::empty("no temperature-tagged locations");
        }

        // Temperate refuges migration can head for, in id order.
        let refuges: Vec<EntityId> = temperatures
            .iter()
            .filter(|&(_, &t)| in_comfort(t))
            .map(|(&id, _)| id)
            .collect();

        let mut result = SystemResult::empty("");
        let mut migrations = 0_u32;
        let mut rediscoveries = 0_usize;
        for (&id, &t_new) in &temperatures {
            let Some(location) = graph.get_entity(id) else {
                continue;
            };
            let t_old = location.tags.number(TEMPERATURE_TAG).unwrap_or(t_new);

            let mut patch = EntityPatch::default();
            patch
                .set_tags
                .push((String::from(TEMPERATURE_TAG), format!("{t_new}").into()));
            if (t_new - t_old).abs() > SHOCK_DELTA {
                patch.set_tags.push((String::from(SHOCK_TAG), true.into()));
            }

            // Habitability transitions.
            if is_extreme(t_new) && location.status == "thriving" {
                patch.status = Some(String::from("waning"));
                debug!(location = %id, temperature = t_new, "settlement pushed to waning");
            } else if in_comfort(t_new)
                && location.status == "waning"
                && rng.roll(RECOVERY_CHANCE)
            {
                // Recovery mirrors the flip: the colony returns to thriving.
                patch.status = Some(String::from("thriving"));
            }

            // Thawed ice gives an ability back to the world.
            if t_new >= THAW_POINT {
                if let Some(memory) = location.tags.text(ICE_MEMORY_TAG) {
                    result.entities_created.push(PendingEntity {
                        kind: String::from("abilities"),
                        subtype: String::from("lore"),
                        name: String::from(memory),
                        description: format!(
                            "An art preserved under the ice of {}, remembered as it thawed.",
                            location.name
                        ),
                        status: String::from("rediscovered"),
                        culture: location.culture.clone(),
                        ..PendingEntity::default()
                    });
                    result.relationships_added.push(ProposedRelationship::linking(
                        "derived_from",
                        EntityRef::Pending(rediscoveries),
                        EntityRef::Existing(id),
                    ));
                    rediscoveries = rediscoveries.saturating_add(1);
                    patch.remove_tags.push(String::from(ICE_MEMORY_TAG));
                }
            }

            result.entities_modified.push(EntityChange { id, changes: patch });

            // Residents flee extremes for the nearest temperate refuge.
            if is_extreme(t_new) {
                for resident in residents_of(graph, id) {
                    if !graph.can_form_relationship(resident, "resident_of", MIGRATION_COOLDOWN) {
                        continue;
                    }
                    let destinations: Vec<EntityId> =
                        refuges.iter().copied().filter(|&r| r != id).collect();
                    let Some(&refuge) = rng.pick(&destinations) else {
                        continue;
                    };
                    result
                        .relationships_removed
                        .push(RelationshipKey::new("resident_of", resident, id));
                    result
                        .relationships_added
                        .push(ProposedRelationship::between("resident_of", resident, refuge));
                    migrations = migrations.saturating_add(1);
                }
            }
        }
        result.description = format!(
            "{} locations diffused, {migrations} migrations, {rediscoveries} rediscoveries",
            temperatures.len()
        );
        result
    }
}
