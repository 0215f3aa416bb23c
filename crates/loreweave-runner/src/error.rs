//! Runner-level errors.

/// Errors raised while setting up or finishing a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Snapshot export failed at the filesystem level.
    #[error("snapshot write failed: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot export failed during serialization.
    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
