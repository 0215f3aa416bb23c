//! Engine error type.

use loreweave_graph::GraphError;

/// Errors raised by templates, systems, and the tick driver.
///
/// Note the asymmetry with empty results: a template whose preconditions are
/// unmet returns an empty result with a reason, not an error. Errors are
/// reserved for genuinely broken situations such as a template requiring a
/// capability the deployed schema does not provide.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A template requires a capability absent from the domain schema.
    #[error("required capability not configured: {capability}")]
    MissingCapability {
        /// Name of the missing capability (e.g. `spatial`).
        capability: String,
    },

    /// A graph store operation failed.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}
