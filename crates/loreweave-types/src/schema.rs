//! The domain schema: vocabularies, matrices, and word lists injected as
//! configuration.
//!
//! The core never hardcodes entity kinds, relationship vocabularies, or
//! narrative word lists -- a deployed world supplies them all through this
//! structure (deserialized from YAML by the runner). [`DomainSchema::baseline`]
//! provides a small self-consistent vocabulary used by tests and as the
//! serde default.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::relationship::RelationshipCategory;

/// Vocabulary for one entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindSpec {
    /// Allowed subtypes for this kind.
    #[serde(default)]
    pub subtypes: Vec<String>,
    /// Allowed lifecycle statuses for this kind.
    #[serde(default)]
    pub statuses: Vec<String>,
    /// Status assigned when a pending entity leaves it unspecified.
    #[serde(default)]
    pub default_status: String,
}

/// One row of the `(src kind, dst kind) -> allowed relationship kinds`
/// matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRule {
    /// Source entity kind.
    pub src_kind: String,
    /// Destination entity kind.
    pub dst_kind: String,
    /// Relationship kinds permitted between the two.
    pub kinds: Vec<String>,
}

/// A soft population cap for a `(kind, subtype)` bucket.
///
/// Templates treat a bucket as saturated once its entity count reaches
/// `target` times the overshoot factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaturationTarget {
    /// Entity kind this target applies to.
    pub kind: String,
    /// Subtype filter; `None` covers the whole kind.
    #[serde(default)]
    pub subtype: Option<String>,
    /// Configured population target.
    pub target: u32,
}

/// Word lists for procedural theme composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeWords {
    /// Depth words for deficit-driven discoveries.
    pub depth: Vec<String>,
    /// Resource words for deficit-driven discoveries.
    pub resource: Vec<String>,
    /// Form words shared by all discovery themes.
    pub form: Vec<String>,
    /// Advantage words for conflict-driven discoveries.
    pub advantage: Vec<String>,
    /// Intensity words for magic-driven discoveries.
    pub intensity: Vec<String>,
    /// Manifestation words for magic-driven discoveries.
    pub manifestation: Vec<String>,
}

impl Default for ThemeWords {
    fn default() -> Self {
        let words = |items: &[&str]| items.iter().map(|s| String::from(*s)).collect();
        Self {
            depth: words(&["sunken", "buried", "hollow", "deep"]),
            resource: words(&["iron", "grain", "silver", "timber"]),
            form: words(&["vault", "hollow", "reach", "warren"]),
            advantage: words(&["overlook", "choke", "refuge", "bulwark"]),
            intensity: words(&["flickering", "seething", "dormant", "radiant"]),
            manifestation: words(&["rift", "wellspring", "scar", "confluence"]),
        }
    }
}

/// Presence of this config marks the spatial placement capability as
/// available; templates that must place entities fail hard without it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialConfig {
    /// Maximum per-axis jitter applied when deriving coordinates from a
    /// reference entity.
    pub jitter: f64,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self { jitter: 0.15 }
    }
}

/// Gating parameters for emergent location discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Hard cap on total entities before discovery shuts off.
    pub max_entities: u32,
    /// Minimum ticks between two discoveries.
    pub min_ticks_between: u64,
    /// Maximum discoveries per epoch; the counter resets at epoch
    /// boundaries.
    pub max_per_epoch: u32,
    /// Base chance for the era-weighted discovery roll.
    pub base_chance: f64,
    /// NPC subtypes that count as eligible explorers.
    pub explorer_subtypes: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_entities: 150,
            min_ticks_between: 6,
            max_per_epoch: 2,
            base_chance: 0.35,
            explorer_subtypes: vec![String::from("explorer"), String::from("outlaw")],
        }
    }
}

/// One era of the simulation's coarse schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EraSpec {
    /// Stable era identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Per-template selection weights; templates absent from the map get
    /// weight 1.0.
    #[serde(default)]
    pub template_weights: BTreeMap<String, f64>,
    /// Odds-ratio exponent applied to system throttle rolls during this
    /// era. `1.0` leaves probabilities untouched; higher values push
    /// mid-range chances toward their nearest extreme, lower values pull
    /// them toward even odds.
    pub system_modifier: f64,
}

/// The full domain-injected schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainSchema {
    /// Entity kind vocabulary.
    pub kinds: BTreeMap<String, KindSpec>,
    /// Allowed relationship kinds per `(src kind, dst kind)` pair. Pairs
    /// without a rule are unconstrained.
    pub relationship_rules: Vec<RelationshipRule>,
    /// Default strength per relationship kind (fallback 0.5).
    pub default_strengths: BTreeMap<String, f64>,
    /// Relationship kinds that require a `distance` value.
    pub lineage_kinds: BTreeSet<String>,
    /// Category per relationship kind (fallback `social`).
    pub categories: BTreeMap<String, RelationshipCategory>,
    /// Mutually exclusive relationship kinds between the same entity pair.
    pub contradictions: BTreeMap<String, Vec<String>>,
    /// Formation cooldown length (ticks) per relationship kind.
    pub cooldowns: BTreeMap<String, u64>,
    /// Soft population caps consulted by template saturation gates.
    pub saturation: Vec<SaturationTarget>,
    /// Name pools per entity kind, combined with a generated suffix.
    pub names: BTreeMap<String, Vec<String>>,
    /// Word lists for procedural theme composition.
    pub themes: ThemeWords,
    /// Spatial placement capability; `None` disables placed templates.
    pub spatial: Option<SpatialConfig>,
    /// Discovery gating parameters.
    pub discovery: DiscoveryConfig,
    /// The era schedule, advanced on epoch boundaries.
    pub eras: Vec<EraSpec>,
}

impl DomainSchema {
    /// Relationship formation cooldown applied when a kind has no
    /// configured value.
    pub const DEFAULT_COOLDOWN: u64 = 5;

    /// Strength assigned when a kind has no configured default.
    pub const DEFAULT_STRENGTH: f64 = 0.5;

    /// Overshoot factor: a bucket saturates at `target * OVERSHOOT`.
    pub const OVERSHOOT: f64 = 1.5;

    /// `true` when `kind` may connect entities of the two kinds.
    ///
    /// Pairs without a configured rule are unconstrained; this mirrors the
    /// schema's advisory role -- integrity is asserted by validation, not
    /// by refusing writes.
    pub fn is_relationship_allowed(&self, src_kind: &str, dst_kind: &str, kind: &str) -> bool {
        let mut constrained = false;
        for rule in &self.relationship_rules {
            if rule.src_kind == src_kind && rule.dst_kind == dst_kind {
                constrained = true;
                if rule.kinds.iter().any(|k| k == kind) {
                    return true;
                }
            }
        }
        !constrained
    }

    /// Default strength for a relationship kind.
    pub fn default_strength(&self, kind: &str) -> f64 {
        self.default_strengths
            .get(kind)
            .copied()
            .unwrap_or(Self::DEFAULT_STRENGTH)
    }

    /// `true` when the kind requires a `distance` value.
    pub fn is_lineage(&self, kind: &str) -> bool {
        self.lineage_kinds.contains(kind)
    }

    /// Category of a relationship kind.
    pub fn category_of(&self, kind: &str) -> RelationshipCategory {
        if self.is_lineage(kind) {
            return RelationshipCategory::ImmutableFact;
        }
        self.categories.get(kind).copied().unwrap_or_default()
    }

    /// `true` when the two kinds may not both hold between one entity pair.
    ///
    /// The table is checked in both directions, so a one-sided entry is
    /// enough to exclude the pair.
    pub fn contradicts(&self, a: &str, b: &str) -> bool {
        let listed = |x: &str, y: &str| {
            self.contradictions
                .get(x)
                .is_some_and(|ex| ex.iter().any(|k| k == y))
        };
        listed(a, b) || listed(b, a)
    }

    /// Formation cooldown (ticks) for a relationship kind.
    pub fn cooldown(&self, kind: &str) -> u64 {
        self.cooldowns
            .get(kind)
            .copied()
            .unwrap_or(Self::DEFAULT_COOLDOWN)
    }

    /// Configured population target for a `(kind, subtype)` bucket, with
    /// subtype-specific targets taking precedence over kind-wide ones.
    pub fn saturation_target(&self, kind: &str, subtype: Option<&str>) -> Option<u32> {
        let mut kind_wide = None;
        for t in &self.saturation {
            if t.kind != kind {
                continue;
            }
            match (&t.subtype, subtype) {
                (Some(ts), Some(s)) if ts == s => return Some(t.target),
                (None, _) => kind_wide = Some(t.target),
                _ => {}
            }
        }
        kind_wide
    }

    /// Default lifecycle status for a kind (empty string when the kind is
    /// unknown).
    pub fn default_status(&self, kind: &str) -> String {
        self.kinds
            .get(kind)
            .map(|k| k.default_status.clone())
            .unwrap_or_default()
    }

    /// Name pool for a kind.
    pub fn name_pool(&self, kind: &str) -> &[String] {
        self.names.get(kind).map_or(&[], Vec::as_slice)
    }

    /// The era spec at a given position in the schedule, clamped to the
    /// final era once the schedule is exhausted.
    pub fn era_at(&self, index: usize) -> Option<&EraSpec> {
        if self.eras.is_empty() {
            return None;
        }
        self.eras.get(index).or_else(|| self.eras.last())
    }

    /// A small self-consistent vocabulary used by tests and defaults.
    pub fn baseline() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| String::from(*s)).collect();

        let mut kinds = BTreeMap::new();
        kinds.insert(
            String::from("npc"),
            KindSpec {
                subtypes: strings(&["hero", "outlaw", "merchant", "explorer", "mystic"]),
                statuses: strings(&["alive", "dead", "vanished"]),
                default_status: String::from("alive"),
            },
        );
        kinds.insert(
            String::from("location"),
            KindSpec {
                subtypes: strings(&["colony", "ruin", "wilderness", "stronghold"]),
                statuses: strings(&["thriving", "stable", "waning", "abandoned"]),
                default_status: String::from("stable"),
            },
        );
        kinds.insert(
            String::from("faction"),
            KindSpec {
                subtypes: strings(&["guild", "cult", "clan", "order"]),
                statuses: strings(&["rising", "established", "fading", "dissolved"]),
                default_status: String::from("established"),
            },
        );
        kinds.insert(
            String::from("abilities"),
            KindSpec {
                subtypes: strings(&["craft", "rite", "lore"]),
                statuses: strings(&["practiced", "forgotten", "rediscovered"]),
                default_status: String::from("practiced"),
            },
        );

        let mut default_strengths = BTreeMap::new();
        for (kind, strength) in [
            ("friend_of", 0.5),
            ("rival_of", 0.6),
            ("enemy_of", 0.7),
            ("lover_of", 0.8),
            ("follower_of", 0.6),
            ("ally_of", 0.6),
            ("member_of", 0.7),
            ("leader_of", 0.8),
            ("resident_of", 0.6),
            ("at_war_with", 0.8),
            ("adjacent_to", 1.0),
            ("derived_from", 1.0),
            ("split_from", 1.0),
        ] {
            default_strengths.insert(String::from(kind), strength);
        }

        let lineage_kinds: BTreeSet<String> = [
            "derived_from",
            "split_from",
            "supersedes",
            "adjacent_to",
            "contains",
            "contained_by",
            "related_to",
            "inspired_by",
            "part_of",
        ]
        .iter()
        .map(|s| String::from(*s))
        .collect();

        let mut categories = BTreeMap::new();
        for kind in ["at_war_with", "ally_of", "vassal_of"] {
            categories.insert(String::from(kind), RelationshipCategory::Political);
        }
        for kind in ["friend_of", "rival_of", "enemy_of", "lover_of", "follower_of"] {
            categories.insert(String::from(kind), RelationshipCategory::Social);
        }
        for kind in ["member_of", "leader_of", "resident_of"] {
            categories.insert(String::from(kind), RelationshipCategory::Institutional);
        }

        let mut contradictions = BTreeMap::new();
        contradictions.insert(
            String::from("enemy_of"),
            strings(&["lover_of", "follower_of", "ally_of", "friend_of"]),
        );
        contradictions.insert(String::from("lover_of"), strings(&["enemy_of", "rival_of"]));
        contradictions.insert(String::from("ally_of"), strings(&["at_war_with"]));

        let mut cooldowns = BTreeMap::new();
        for (kind, ticks) in [
            ("lover_of", 15_u64),
            ("enemy_of", 8),
            ("rival_of", 8),
            ("friend_of", 5),
            ("follower_of", 6),
        ] {
            cooldowns.insert(String::from(kind), ticks);
        }

        let saturation = vec![
            SaturationTarget {
                kind: String::from("npc"),
                subtype: Some(String::from("hero")),
                target: 6,
            },
            SaturationTarget {
                kind: String::from("location"),
                subtype: None,
                target: 20,
            },
            SaturationTarget {
                kind: String::from("faction"),
                subtype: None,
                target: 8,
            },
        ];

        let mut names = BTreeMap::new();
        names.insert(
            String::from("npc"),
            strings(&["Bram", "Sella", "Odric", "Thessa", "Karn", "Ilyana"]),
        );
        names.insert(
            String::from("location"),
            strings(&["Greyfen", "Oldmarch", "Duskharrow", "Vennwood"]),
        );
        names.insert(
            String::from("faction"),
            strings(&["Ashen Compact", "Riverfolk", "Ninefold Circle"]),
        );

        let eras = vec![
            EraSpec {
                id: String::from("founding"),
                name: String::from("Age of Founding"),
                template_weights: BTreeMap::new(),
                system_modifier: 1.0,
            },
            EraSpec {
                id: String::from("strife"),
                name: String::from("Age of Strife"),
                template_weights: [(String::from("hero_emergence"), 2.0)]
                    .into_iter()
                    .collect(),
                system_modifier: 0.8,
            },
        ];

        Self {
            kinds,
            relationship_rules: Vec::new(),
            default_strengths,
            lineage_kinds,
            categories,
            contradictions,
            cooldowns,
            saturation,
            names,
            themes: ThemeWords::default(),
            spatial: Some(SpatialConfig::default()),
            discovery: DiscoveryConfig::default(),
            eras,
        }
    }
}

impl Default for DomainSchema {
    fn default() -> Self {
        Self::baseline()
    }
}
