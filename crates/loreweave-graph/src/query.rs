//! Read-only projections over the world graph.
//!
//! Everything here is a pure function of `&WorldGraph`: templates and
//! systems use these views to select targets and derive placement without
//! taking any mutable access.

use std::collections::{BTreeSet, VecDeque};

use loreweave_types::{Coordinates, Entity, EntityId};

use crate::graph::{EntityCriteria, WorldGraph};

/// All entities of a kind, in id order.
pub fn find_by_kind<'g>(graph: &'g WorldGraph, kind: &str) -> Vec<&'g Entity> {
    graph.find_entities(&EntityCriteria::kind(kind))
}

/// Ids of entities related to `id` through any relationship, outgoing via
/// the link cache and incoming via a scan, deduplicated.
pub fn related_entities(graph: &WorldGraph, id: EntityId) -> Vec<EntityId> {
    let mut seen = BTreeSet::new();
    if let Some(entity) = graph.get_entity(id) {
        for r in &entity.links {
            seen.insert(r.dst);
        }
    }
    for r in graph.relationships() {
        if r.dst == id {
            seen.insert(r.src);
        }
    }
    seen.remove(&id);
    seen.into_iter().collect()
}

/// Ids of entities connected to `id` by an edge of `kind`, in either
/// direction.
pub fn neighbors_by_kind(graph: &WorldGraph, id: EntityId, kind: &str) -> Vec<EntityId> {
    let mut seen = BTreeSet::new();
    for r in graph.relationships() {
        if r.kind != kind {
            continue;
        }
        if r.src == id {
            seen.insert(r.dst);
        } else if r.dst == id {
            seen.insert(r.src);
        }
    }
    seen.into_iter().collect()
}

/// Breadth-first hop distance between two entities over edges of `kind`,
/// treated as undirected. Returns `None` when no path exists.
pub fn hop_distance(graph: &WorldGraph, from: EntityId, to: EntityId, kind: &str) -> Option<u32> {
    if from == to {
        return Some(0);
    }
    let mut visited = BTreeSet::new();
    visited.insert(from);
    let mut queue = VecDeque::new();
    queue.push_back((from, 0_u32));

    while let Some((current, depth)) = queue.pop_front() {
        for neighbor in neighbors_by_kind(graph, current, kind) {
            if neighbor == to {
                return Some(depth.saturating_add(1));
            }
            if visited.insert(neighbor) {
                queue.push_back((neighbor, depth.saturating_add(1)));
            }
        }
    }
    None
}

/// The first non-empty subtype bucket of a kind, in preference order.
///
/// Templates use this to express "hero over outlaw over merchant" target
/// selection: the returned slice of entities all share the first subtype
/// that has any members.
pub fn preferred_subtype_bucket<'g>(
    graph: &'g WorldGraph,
    kind: &str,
    preference: &[&str],
) -> Vec<&'g Entity> {
    for subtype in preference {
        let bucket =
            graph.find_entities(&EntityCriteria::kind(kind).with_subtype(subtype));
        if !bucket.is_empty() {
            return bucket;
        }
    }
    Vec::new()
}

/// Derive coordinates near a reference point by applying a bounded
/// per-axis offset. The offsets are supplied by the caller (drawn from the
/// run's RNG) so this stays a pure function.
pub fn derive_coordinates(
    reference: Option<&Coordinates>,
    offsets: (f64, f64, f64),
    jitter: f64,
) -> Coordinates {
    let base = reference.copied().unwrap_or_default();
    let clamp = |v: f64| v.clamp(-1.0, 1.0);
    Coordinates {
        x: base.x + clamp(offsets.0) * jitter,
        y: base.y + clamp(offsets.1) * jitter,
        z: base.z + clamp(offsets.2) * jitter,
    }
}

#[cfg(test)]
mod tests {
    use loreweave_types::{PendingEntity, RelationshipCategory};

    use super::*;

    fn place(graph: &mut WorldGraph, name: &str, subtype: &str) -> EntityId {
        graph.create_entity(
            PendingEntity {
                kind: String::from("location"),
                subtype: String::from(subtype),
                name: String::from(name),
                ..PendingEntity::default()
            },
            "stable",
        )
    }

    fn adjacent(graph: &mut WorldGraph, a: EntityId, b: EntityId) {
        let added = graph.add_relationship(
            "adjacent_to",
            a,
            b,
            1.0,
            Some(0.2),
            RelationshipCategory::ImmutableFact,
        );
        assert!(added);
    }

    #[test]
    fn related_entities_covers_both_directions() {
        let mut graph = WorldGraph::new();
        let a = place(&mut graph, "Greyfen", "colony");
        let b = place(&mut graph, "Oldmarch", "colony");
        let c = place(&mut graph, "Duskharrow", "ruin");
        adjacent(&mut graph, a, b);
        adjacent(&mut graph, c, a);

        let related = related_entities(&graph, a);
        assert_eq!(related, vec![b, c]);
    }

    #[test]
    fn hop_distance_follows_only_the_given_kind() {
        let mut graph = WorldGraph::new();
        let a = place(&mut graph, "Greyfen", "colony");
        let b = place(&mut graph, "Oldmarch", "colony");
        let c = place(&mut graph, "Duskharrow", "ruin");
        adjacent(&mut graph, a, b);
        adjacent(&mut graph, b, c);
        let crossed = graph.add_relationship(
            "related_to",
            a,
            c,
            1.0,
            Some(0.1),
            RelationshipCategory::ImmutableFact,
        );
        assert!(crossed);

        assert_eq!(hop_distance(&graph, a, c, "adjacent_to"), Some(2));
        assert_eq!(hop_distance(&graph, a, a, "adjacent_to"), Some(0));
    }

    #[test]
    fn hop_distance_none_when_disconnected() {
        let mut graph = WorldGraph::new();
        let a = place(&mut graph, "Greyfen", "colony");
        let b = place(&mut graph, "Oldmarch", "colony");
        assert_eq!(hop_distance(&graph, a, b, "adjacent_to"), None);
    }

    #[test]
    fn preferred_bucket_returns_first_non_empty() {
        let mut graph = WorldGraph::new();
        let _ = place(&mut graph, "Duskharrow", "ruin");
        let _ = place(&mut graph, "Vennwood", "wilderness");

        let bucket = preferred_subtype_bucket(&graph, "location", &["colony", "ruin", "wilderness"]);
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket.first().map(|e| e.subtype.as_str()), Some("ruin"));
    }

    #[test]
    fn preferred_bucket_empty_when_nothing_matches() {
        let graph = WorldGraph::new();
        assert!(preferred_subtype_bucket(&graph, "location", &["colony"]).is_empty());
    }

    #[test]
    fn derived_coordinates_stay_within_jitter() {
        let reference = Coordinates { x: 1.0, y: 2.0, z: 0.0 };
        let derived = derive_coordinates(Some(&reference), (0.5, -3.0, 1.0), 0.2);
        assert!((derived.x - 1.1).abs() < 1e-9);
        // Offsets are clamped to [-1, 1] before scaling.
        assert!((derived.y - 1.8).abs() < 1e-9);
        assert!((derived.z - 0.2).abs() < 1e-9);
    }
}
