//! Emergent discovery: world analysis, theme composition, and the gate.
//!
//! Nothing here hardcodes a list of possible places. The analysis functions
//! read graph and pressure state and return a typed record when a condition
//! holds; theme generators compose a name and tag set from the schema's
//! word lists. The result is a location whose character is derived purely
//! from what the world currently looks like.

use std::collections::BTreeSet;

use tracing::debug;

use loreweave_graph::{DiscoveryState, WorldGraph};
use loreweave_types::{DomainSchema, EntityId, RelationshipStatus, TagMap};

use crate::rng::{SimRng, scaled_probability};

/// Pressure level at which resource deficits start driving discovery.
const DEFICIT_PRESSURE: f64 = 50.0;
/// Pressure level at which open conflict starts driving discovery.
const CONFLICT_PRESSURE: f64 = 40.0;
/// Active war count that drives conflict discovery even at low pressure.
const CONFLICT_WAR_COUNT: usize = 2;
/// Pressure level at which magical instability starts driving discovery.
const MAGIC_PRESSURE: f64 = 45.0;

/// A detected world condition that could motivate a discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldAnalysis {
    /// Which analysis produced this record.
    pub theme: &'static str,
    /// Composed display name for the discovered location.
    pub name: String,
    /// Location subtype to assign.
    pub subtype: String,
    /// How urgently the condition calls for a discovery, in `[0, 1]`.
    pub urgency: f64,
    /// Entities implicated in the condition (e.g. warring factions).
    pub involved: Vec<EntityId>,
    /// Tags describing the discovered location's character.
    pub tags: TagMap,
}

fn word<'a>(pool: &'a [String], rng: &mut SimRng) -> &'a str {
    rng.pick(pool).map_or("nameless", String::as_str)
}

/// Detect a resource deficit worth prospecting for.
///
/// Returns `None` below the pressure threshold; above it, composes a
/// depth/resource/form themed site (e.g. "Sunken Iron Vault").
pub fn analyze_resource_deficit(
    graph: &WorldGraph,
    schema: &DomainSchema,
    rng: &mut SimRng,
) -> Option<WorldAnalysis> {
    let scarcity = graph.pressures.pressure("resource_scarcity");
    if scarcity < DEFICIT_PRESSURE {
        return None;
    }
    let depth = word(&schema.themes.depth, rng);
    let resource = word(&schema.themes.resource, rng);
    let form = word(&schema.themes.form, rng);

    let mut tags = TagMap::new();
    tags.set("resource_site", true);
    tags.set("resource", resource);

    Some(WorldAnalysis {
        theme: "resource_deficit",
        name: format!("{depth} {resource} {form}"),
        subtype: String::from("wilderness"),
        urgency: (scarcity / 100.0).clamp(0.0, 1.0),
        involved: Vec::new(),
        tags,
    })
}

/// Detect conflict patterns worth a strategic discovery.
///
/// Holds when the conflict pressure is elevated or when at least
/// [`CONFLICT_WAR_COUNT`] active wars exist; the involved factions are the
/// endpoints of those wars.
pub fn analyze_conflict_patterns(
    graph: &WorldGraph,
    schema: &DomainSchema,
    rng: &mut SimRng,
) -> Option<WorldAnalysis> {
    let conflict = graph.pressures.pressure("conflict");
    let mut involved = BTreeSet::new();
    let mut wars = 0_usize;
    for r in graph.relationships() {
        if r.kind == "at_war_with" && r.status == RelationshipStatus::Active {
            wars = wars.saturating_add(1);
            involved.insert(r.src);
            involved.insert(r.dst);
        }
    }
    if conflict < CONFLICT_PRESSURE && wars < CONFLICT_WAR_COUNT {
        return None;
    }

    let advantage = word(&schema.themes.advantage, rng);
    let form = word(&schema.themes.form, rng);

    let mut tags = TagMap::new();
    tags.set("strategic_site", true);

    #[allow(clippy::cast_precision_loss)]
    let war_urgency = (wars as f64 / 4.0).min(1.0);
    Some(WorldAnalysis {
        theme: "conflict_patterns",
        name: format!("{advantage} {form}"),
        subtype: String::from("stronghold"),
        urgency: (conflict / 100.0).max(war_urgency).clamp(0.0, 1.0),
        involved: involved.into_iter().collect(),
        tags,
    })
}

/// Detect magical instability worth a manifestation site.
pub fn analyze_magic_presence(
    graph: &WorldGraph,
    schema: &DomainSchema,
    rng: &mut SimRng,
) -> Option<WorldAnalysis> {
    let instability = graph.pressures.pressure("magical_instability");
    if instability < MAGIC_PRESSURE {
        return None;
    }
    let intensity = word(&schema.themes.intensity, rng);
    let manifestation = word(&schema.themes.manifestation, rng);

    let mut tags = TagMap::new();
    tags.set("magic_site", true);
    tags.set("manifestation", manifestation);

    Some(WorldAnalysis {
        theme: "magic_presence",
        name: format!("{intensity} {manifestation}"),
        subtype: String::from("ruin"),
        urgency: (instability / 100.0).clamp(0.0, 1.0),
        involved: Vec::new(),
        tags,
    })
}

/// Run every analysis and keep the most urgent detected condition.
pub fn most_urgent_analysis(
    graph: &WorldGraph,
    schema: &DomainSchema,
    rng: &mut SimRng,
) -> Option<WorldAnalysis> {
    let candidates = [
        analyze_resource_deficit(graph, schema, rng),
        analyze_conflict_patterns(graph, schema, rng),
        analyze_magic_presence(graph, schema, rng),
    ];
    candidates
        .into_iter()
        .flatten()
        .max_by(|a, b| a.urgency.total_cmp(&b.urgency))
}

/// Eligible explorers: alive NPCs whose subtype is in the configured list.
pub fn eligible_explorers(graph: &WorldGraph, schema: &DomainSchema) -> Vec<EntityId> {
    graph
        .entities()
        .filter(|e| {
            e.kind == "npc"
                && e.status == "alive"
                && schema
                    .discovery
                    .explorer_subtypes
                    .iter()
                    .any(|s| *s == e.subtype)
        })
        .map(|e| e.id)
        .collect()
}

/// The shared discovery gate.
///
/// All of these must hold: the entity population is below the hard cap, the
/// minimum tick spacing since the last discovery has passed, the per-epoch
/// budget has room, at least one eligible explorer exists, and an
/// era-weighted roll succeeds. The roll chance is the configured base
/// chance damped by the epoch's remaining threshold.
pub fn should_discover_location(
    graph: &WorldGraph,
    schema: &DomainSchema,
    rng: &mut SimRng,
) -> bool {
    let config = &schema.discovery;
    let population = graph.entity_count(None, None);
    let cap = usize::try_from(config.max_entities).unwrap_or(usize::MAX);
    if population >= cap {
        debug!(population, "discovery gated: entity cap reached");
        return false;
    }
    if graph.discovery.discoveries_this_epoch >= config.max_per_epoch {
        return false;
    }
    if let Some(last) = graph.discovery.last_discovery_tick {
        if graph.tick() < last.saturating_add(config.min_ticks_between) {
            return false;
        }
    }
    if eligible_explorers(graph, schema).is_empty() {
        return false;
    }

    let damping = graph.discovery.current_threshold / DiscoveryState::BASE_THRESHOLD;
    let chance = scaled_probability(config.base_chance * damping, graph.era.system_modifier);
    rng.roll(chance)
}
