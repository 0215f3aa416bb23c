//! Threshold triggers: declarative condition watchers over graph state.
//!
//! Each [`TriggerConfig`] names a set of conditions, a clustering mode, and
//! the actions to apply when a large enough group of entities matches.
//! Configs are plain data, so domains can ship their own watchers without
//! touching engine code; [`ThresholdTriggers::standard`] carries the
//! baseline set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use loreweave_graph::WorldGraph;
use loreweave_types::{
    DomainSchema, Entity, EntityChange, EntityId, EntityPatch, ProposedRelationship,
    RelationshipStatus, SystemResult, TagValue,
};

use crate::rng::SimRng;
use crate::systems::SimulationSystem;

/// A filter over the entity on the far end of a relationship.
///
/// `None` fields match anything; set fields are ANDed. A dangling
/// endpoint matches no filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFilter {
    /// Required entity kind.
    #[serde(default)]
    pub kind: Option<String>,
    /// Required subtype.
    #[serde(default)]
    pub subtype: Option<String>,
    /// Required lifecycle status.
    #[serde(default)]
    pub status: Option<String>,
    /// Tag key the entity must carry.
    #[serde(default)]
    pub tag: Option<String>,
}

impl EntityFilter {
    fn matches(&self, entity: &Entity) -> bool {
        self.kind.as_ref().is_none_or(|k| entity.kind == *k)
            && self.subtype.as_ref().is_none_or(|s| entity.subtype == *s)
            && self.status.as_ref().is_none_or(|s| entity.status == *s)
            && self.tag.as_ref().is_none_or(|t| entity.tags.contains(t))
    }
}

/// One predicate an entity (or the world) must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "check")]
pub enum TriggerCondition {
    /// The number of active edges of `kind` touching the entity sits
    /// inside `[min, max]`.
    RelationshipCount {
        /// Relationship kind to count.
        kind: String,
        /// Minimum count, inclusive.
        min: usize,
        /// Maximum count, inclusive; `None` leaves the top unbounded.
        #[serde(default)]
        max: Option<usize>,
    },
    /// At least one active edge of `kind` touches the entity, optionally
    /// requiring the far endpoint to satisfy a filter.
    HasRelationship {
        /// Relationship kind to look for.
        kind: String,
        /// Filter on the entity at the other end of the edge.
        #[serde(default)]
        target: Option<EntityFilter>,
    },
    /// The entity's lifecycle status equals `status`.
    StatusIs {
        /// Required status.
        status: String,
    },
    /// The entity carries the tag `key`.
    HasTag {
        /// Tag key.
        key: String,
    },
    /// The entity does not carry the tag `key`.
    LacksTag {
        /// Tag key.
        key: String,
    },
    /// World-level: the named pressure sits inside `[min, max]`.
    PressureRange {
        /// Pressure channel.
        channel: String,
        /// Lower bound, inclusive.
        min: f64,
        /// Upper bound, inclusive.
        max: f64,
    },
    /// The entity has gone at least `min` ticks without a mutation.
    TicksSinceUpdate {
        /// Minimum staleness, inclusive.
        min: u64,
    },
    /// The entity's outgoing degree sits inside `[min, max]`.
    ConnectionCount {
        /// Minimum degree, inclusive.
        min: usize,
        /// Maximum degree, inclusive; `None` leaves the top unbounded.
        #[serde(default)]
        max: Option<usize>,
    },
}

impl TriggerCondition {
    fn active_edge_count(graph: &WorldGraph, entity: EntityId, kind: &str) -> usize {
        graph
            .relationships()
            .iter()
            .filter(|r| {
                r.kind == kind
                    && r.status == RelationshipStatus::Active
                    && (r.src == entity || r.dst == entity)
            })
            .count()
    }

    /// `true` when some active edge of `kind` touches `entity` and its far
    /// endpoint passes `target`.
    fn has_filtered_edge(
        graph: &WorldGraph,
        entity: EntityId,
        kind: &str,
        target: Option<&EntityFilter>,
    ) -> bool {
        graph
            .relationships()
            .iter()
            .filter(|r| {
                r.kind == kind
                    && r.status == RelationshipStatus::Active
                    && (r.src == entity || r.dst == entity)
            })
            .any(|r| {
                let Some(filter) = target else {
                    return true;
                };
                let other = if r.src == entity { r.dst } else { r.src };
                graph.get_entity(other).is_some_and(|e| filter.matches(e))
            })
    }

    fn matches(&self, graph: &WorldGraph, entity: &Entity) -> bool {
        match self {
            Self::RelationshipCount { kind, min, max } => {
                let count = Self::active_edge_count(graph, entity.id, kind);
                count >= *min && max.is_none_or(|max| count <= max)
            }
            Self::HasRelationship { kind, target } => {
                Self::has_filtered_edge(graph, entity.id, kind, target.as_ref())
            }
            Self::StatusIs { status } => entity.status == *status,
            Self::HasTag { key } => entity.tags.contains(key),
            Self::LacksTag { key } => !entity.tags.contains(key),
            Self::PressureRange { channel, min, max } => {
                let value = graph.pressures.pressure(channel);
                value >= *min && value <= *max
            }
            Self::TicksSinceUpdate { min } => {
                graph.tick() >= entity.updated_at.saturating_add(*min)
            }
            Self::ConnectionCount { min, max } => {
                let degree = entity.degree();
                degree >= *min && max.is_none_or(|max| degree <= max)
            }
        }
    }
}

/// How matching entities are grouped before actions fire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ClusterMode {
    /// Every matching entity is its own cluster of one.
    Individual,
    /// All matching entities form a single cluster.
    AllMatching,
    /// Matching entities connected through edges of `kind` (directly or
    /// through a shared endpoint) merge into one cluster.
    ByRelationship {
        /// Relationship kind that joins cluster members.
        kind: String,
    },
}

/// What to do to each qualifying cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum TriggerAction {
    /// Set `key` to `value` on every member.
    SetTag {
        /// Tag key.
        key: String,
        /// Tag value.
        value: TagValue,
    },
    /// Remove `key` from every member.
    RemoveTag {
        /// Tag key.
        key: String,
    },
    /// Set `key` on every member to a value shared by the whole cluster
    /// and unique to this tick and cluster.
    SetClusterTag {
        /// Tag key.
        key: String,
    },
    /// Shift a pressure channel once per qualifying cluster.
    AdjustPressure {
        /// Pressure channel.
        channel: String,
        /// Signed amount.
        delta: f64,
    },
    /// Propose an edge of `kind` between every pair of members.
    LinkMembers {
        /// Relationship kind to propose.
        kind: String,
    },
}

/// One declarative watcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Stable identifier, used in logs.
    pub id: String,
    /// Restrict matching to one entity kind, or `None` for all kinds.
    pub kind_filter: Option<String>,
    /// All conditions must hold for an entity to match.
    pub conditions: Vec<TriggerCondition>,
    /// Grouping mode for matched entities.
    pub cluster_mode: ClusterMode,
    /// Clusters smaller than this are dropped.
    pub min_cluster_size: usize,
    /// Actions applied to each qualifying cluster.
    pub actions: Vec<TriggerAction>,
}

/// Disjoint-set forest over matched-entity ordinals.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, start: usize) -> usize {
        let mut x = start;
        while let Some(&p) = self.parent.get(x) {
            if p == x {
                return x;
            }
            let grandparent = self.parent.get(p).copied().unwrap_or(p);
            if let Some(slot) = self.parent.get_mut(x) {
                *slot = grandparent;
            }
            x = grandparent;
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            if let Some(slot) = self.parent.get_mut(root_b) {
                *slot = root_a;
            }
        }
    }
}

/// The trigger evaluation pass. Runs every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTriggers {
    configs: Vec<TriggerConfig>,
}

impl ThresholdTriggers {
    /// Build the pass from an explicit config list.
    pub const fn new(configs: Vec<TriggerConfig>) -> Self {
        Self { configs }
    }

    /// The baseline watcher set: war coalitions and abandoned settlements.
    pub fn standard() -> Self {
        Self::new(vec![
            TriggerConfig {
                id: String::from("war_brewing"),
                kind_filter: Some(String::from("faction")),
                conditions: vec![TriggerCondition::HasRelationship {
                    kind: String::from("at_war_with"),
                    target: None,
                }],
                cluster_mode: ClusterMode::ByRelationship {
                    kind: String::from("at_war_with"),
                },
                min_cluster_size: 2,
                actions: vec![
                    TriggerAction::SetClusterTag {
                        key: String::from("war_brewing"),
                    },
                    TriggerAction::AdjustPressure {
                        channel: String::from("conflict"),
                        delta: 2.0,
                    },
                ],
            },
            TriggerConfig {
                id: String::from("ghost_town"),
                kind_filter: Some(String::from("location")),
                conditions: vec![
                    TriggerCondition::StatusIs {
                        status: String::from("abandoned"),
                    },
                    TriggerCondition::LacksTag {
                        key: String::from("ghost_town"),
                    },
                ],
                cluster_mode: ClusterMode::Individual,
                min_cluster_size: 1,
                actions: vec![
                    TriggerAction::SetTag {
                        key: String::from("ghost_town"),
                        value: TagValue::Flag(true),
                    },
                    TriggerAction::AdjustPressure {
                        channel: String::from("stability"),
                        delta: -1.0,
                    },
                ],
            },
        ])
    }

    /// Entities matching the config's filter and all of its conditions, in
    /// id order.
    fn matched(graph: &WorldGraph, config: &TriggerConfig) -> Vec<EntityId> {
        graph
            .entities()
            .filter(|e| {
                config
                    .kind_filter
                    .as_ref()
                    .is_none_or(|kind| e.kind == *kind)
            })
            .filter(|e| config.conditions.iter().all(|c| c.matches(graph, e)))
            .map(|e| e.id)
            .collect()
    }

    /// Group matched entities into clusters per the config's mode.
    fn clusters(
        graph: &WorldGraph,
        config: &TriggerConfig,
        matched: &[EntityId],
    ) -> Vec<Vec<EntityId>> {
        match &config.cluster_mode {
            ClusterMode::Individual => matched.iter().map(|&id| vec![id]).collect(),
            ClusterMode::AllMatching => {
                if matched.is_empty() {
                    Vec::new()
                } else {
                    vec![matched.to_vec()]
                }
            }
            ClusterMode::ByRelationship { kind } => {
                let ordinal: BTreeMap<EntityId, usize> = matched
                    .iter()
                    .enumerate()
                    .map(|(i, &id)| (id, i))
                    .collect();
                let mut forest = UnionFind::new(matched.len());
                // Members joined by a direct edge merge; members pointing at
                // the same third entity merge through it.
                let mut by_target: BTreeMap<EntityId, usize> = BTreeMap::new();
                for r in graph.relationships() {
                    if r.kind != *kind || r.status != RelationshipStatus::Active {
                        continue;
                    }
                    match (ordinal.get(&r.src), ordinal.get(&r.dst)) {
                        (Some(&a), Some(&b)) => forest.union(a, b),
                        (Some(&a), None) => {
                            if let Some(&first) = by_target.get(&r.dst) {
                                forest.union(a, first);
                            } else {
                                by_target.insert(r.dst, a);
                            }
                        }
                        _ => {}
                    }
                }
                let mut groups: BTreeMap<usize, Vec<EntityId>> = BTreeMap::new();
                for (&id, &i) in &ordinal {
                    groups.entry(forest.find(i)).or_default().push(id);
                }
                groups.into_values().collect()
            }
        }
    }

    fn apply_action(
        tick: u64,
        action: &TriggerAction,
        group: usize,
        members: &[EntityId],
        result: &mut SystemResult,
    ) {
        match action {
            TriggerAction::SetTag { key, value } => {
                for &member in members {
                    result.entities_modified.push(EntityChange {
                        id: member,
                        changes: EntityPatch::tag(key, value.clone()),
                    });
                }
            }
            TriggerAction::RemoveTag { key } => {
                for &member in members {
                    result.entities_modified.push(EntityChange {
                        id: member,
                        changes: EntityPatch {
                            remove_tags: vec![key.clone()],
                            ..EntityPatch::default()
                        },
                    });
                }
            }
            TriggerAction::SetClusterTag { key } => {
                let value = format!("cluster_{tick}_{group}");
                for &member in members {
                    result.entities_modified.push(EntityChange {
                        id: member,
                        changes: EntityPatch::tag(key, value.as_str()),
                    });
                }
            }
            TriggerAction::AdjustPressure { channel, delta } => {
                let slot = result
                    .pressure_changes
                    .entry(channel.clone())
                    .or_insert(0.0);
                *slot += delta;
            }
            TriggerAction::LinkMembers { kind } => {
                for (i, &a) in members.iter().enumerate() {
                    for &b in members.iter().skip(i.saturating_add(1)) {
                        result
                            .relationships_added
                            .push(ProposedRelationship::between(kind, a, b));
                    }
                }
            }
        }
    }

    fn apply_config(
        graph: &WorldGraph,
        config: &TriggerConfig,
        result: &mut SystemResult,
        fired: &mut usize,
    ) {
        let matched = Self::matched(graph, config);
        let clusters = Self::clusters(graph, config, &matched);
        for (group, members) in clusters.iter().enumerate() {
            if members.len() < config.min_cluster_size {
                continue;
            }
            debug!(trigger = %config.id, size = members.len(), "trigger fired");
            *fired = fired.saturating_add(1);
            for action in &config.actions {
                Self::apply_action(graph.tick(), action, group, members, result);
            }
        }
    }
}

impl SimulationSystem for ThresholdTriggers {
    fn name(&self) -> &'static str {
        "threshold_triggers"
    }

    fn apply(
        &self,
        graph: &WorldGraph,
        _schema: &DomainSchema,
        _era_modifier: f64,
        _rng: &mut SimRng,
    ) -> SystemResult {
        let mut result = SystemResult::empty("");
        let mut fired = 0_usize;
        for config in &self.configs {
            Self::apply_config(graph, config, &mut result, &mut fired);
        }
        result.description = format!("{fired} triggers fired");
        result
    }
}
