//! Error types for the `loreweave-graph` crate.

use loreweave_types::EntityId;

/// Errors that can occur during graph-store operations.
///
/// Note that most "failures" in this crate are not errors at all: duplicate
/// relationship insertion is a `false` return, and dangling endpoints are a
/// logged data-quality defect surfaced later by validation.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The referenced entity does not exist in the graph.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),
}
