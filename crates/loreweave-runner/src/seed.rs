//! The seed world: a small connected starting state for the baseline
//! schema.
//!
//! Every seeded entity participates in at least one relationship, so the
//! connectivity validation check passes before the first tick. Two of the
//! settlements carry temperature tags to give the thermal cascade a
//! gradient to work on, and one explorer is present so discovery can gate
//! open.

use loreweave_graph::WorldGraph;
use loreweave_types::{Coordinates, EntityId, PendingEntity, RelationshipCategory, TagMap};

fn settlement(
    graph: &mut WorldGraph,
    name: &str,
    status: &str,
    at: (f64, f64),
    temperature: Option<f64>,
) -> EntityId {
    let mut tags = TagMap::new();
    if let Some(t) = temperature {
        tags.set_number("temperature", t);
    }
    graph.create_entity(
        PendingEntity {
            kind: String::from("location"),
            subtype: String::from("colony"),
            name: String::from(name),
            description: format!("The settlement of {name}."),
            coordinates: Some(Coordinates {
                x: at.0,
                y: at.1,
                z: 0.0,
            }),
            tags,
            ..PendingEntity::default()
        },
        status,
    )
}

fn person(graph: &mut WorldGraph, name: &str, subtype: &str, culture: &str) -> EntityId {
    graph.create_entity(
        PendingEntity {
            kind: String::from("npc"),
            subtype: String::from(subtype),
            name: String::from(name),
            culture: String::from(culture),
            ..PendingEntity::default()
        },
        "alive",
    )
}

fn link(
    graph: &mut WorldGraph,
    kind: &str,
    src: EntityId,
    dst: EntityId,
    strength: f64,
    category: RelationshipCategory,
) {
    let distance = (category == RelationshipCategory::ImmutableFact).then_some(0.3);
    graph.add_relationship(kind, src, dst, strength, distance, category);
}

/// Build the seed world in place and return the number of seeded entities.
pub fn seed_world(graph: &mut WorldGraph) -> usize {
    let greyfen = settlement(graph, "Greyfen", "thriving", (0.0, 0.0), Some(0.55));
    let oldmarch = settlement(graph, "Oldmarch", "stable", (3.0, 1.0), Some(0.35));
    let duskharrow = settlement(graph, "Duskharrow", "stable", (1.5, -2.0), None);
    link(
        graph,
        "adjacent_to",
        greyfen,
        oldmarch,
        1.0,
        RelationshipCategory::ImmutableFact,
    );
    link(
        graph,
        "adjacent_to",
        oldmarch,
        duskharrow,
        1.0,
        RelationshipCategory::ImmutableFact,
    );

    let pact = graph.create_entity(
        PendingEntity {
            kind: String::from("faction"),
            subtype: String::from("guild"),
            name: String::from("Ashen Pact"),
            description: String::from("The founding trade compact of the valley."),
            ..PendingEntity::default()
        },
        "established",
    );

    let people = [
        ("Bram", "merchant", "valley", greyfen),
        ("Sella", "explorer", "valley", greyfen),
        ("Odric", "soldier", "valley", greyfen),
        ("Thessa", "mystic", "river", oldmarch),
        ("Vask", "outlaw", "river", oldmarch),
        ("Maren", "merchant", "river", duskharrow),
    ];
    for (name, subtype, culture, home) in people {
        let id = person(graph, name, subtype, culture);
        link(
            graph,
            "resident_of",
            id,
            home,
            0.6,
            RelationshipCategory::Institutional,
        );
        link(
            graph,
            "member_of",
            id,
            pact,
            0.5,
            RelationshipCategory::Institutional,
        );
    }

    graph.entities().count()
}
