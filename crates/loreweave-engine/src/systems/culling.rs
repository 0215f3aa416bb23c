//! Relationship culling: archive exhausted bonds, purge old history.
//!
//! Runs every tick. Active mutable edges whose strength has decayed below
//! the floor move to `Historical`; historical edges past the retention
//! window are removed outright, keeping the edge list bounded over long
//! runs.

use loreweave_graph::WorldGraph;
use loreweave_types::{
    DomainSchema, RelationshipCategory, RelationshipKey, RelationshipStatus, SystemResult,
};

use crate::rng::SimRng;
use crate::systems::SimulationSystem;

/// Strength below which an active bond is archived.
const ARCHIVE_FLOOR: f64 = 0.15;
/// Ticks a historical edge is retained before removal.
const RETENTION_TICKS: u64 = 20;

/// The culling pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipCulling;

impl SimulationSystem for RelationshipCulling {
    fn name(&self) -> &'static str {
        "relationship_culling"
    }

    fn apply(
        &self,
        graph: &WorldGraph,
        _schema: &DomainSchema,
        _era_modifier: f64,
        _rng: &mut SimRng,
    ) -> SystemResult {
        let mut result = SystemResult::empty("");
        for r in graph.relationships() {
            match r.status {
                RelationshipStatus::Active => {
                    if r.category != RelationshipCategory::ImmutableFact
                        && r.strength < ARCHIVE_FLOOR
                    {
                        result
                            .relationships_archived
                            .push(RelationshipKey::new(&r.kind, r.src, r.dst));
                    }
                }
                RelationshipStatus::Historical => {
                    let expires = r.archived_at.unwrap_or(graph.tick());
                    if expires.saturating_add(RETENTION_TICKS) <= graph.tick() {
                        result
                            .relationships_removed
                            .push(RelationshipKey::new(&r.kind, r.src, r.dst));
                    }
                }
            }
        }
        result.description = format!(
            "{} archived, {} removed",
            result.relationships_archived.len(),
            result.relationships_removed.len()
        );
        result
    }
}
