//! Run configuration: file-based with environment overrides.
//!
//! The runner reads `loreweave.yaml` (or the file named by
//! `LOREWEAVE_CONFIG`) when present and falls back to defaults otherwise.
//! Every field can be overridden through the environment with a
//! `LOREWEAVE_` prefix, e.g. `LOREWEAVE_RUN__SEED=7`.

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::RunnerError;

/// Default config file stem, resolved relative to the working directory.
const DEFAULT_CONFIG: &str = "loreweave";

/// Top-level runner configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Run shape and determinism.
    pub run: RunSection,
    /// Output locations.
    pub output: OutputSection,
}

/// Run shape parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunSection {
    /// RNG seed; identical seeds replay identical histories.
    pub seed: u64,
    /// Number of epochs.
    pub epochs: usize,
    /// Ticks per epoch.
    pub ticks_per_epoch: u64,
}

/// Output parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Where to write the final world snapshot; empty disables the export.
    pub snapshot_path: String,
    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            seed: 42,
            epochs: 3,
            ticks_per_epoch: 40,
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            snapshot_path: String::from("world_snapshot.json"),
            json_logs: false,
        }
    }
}

impl RunConfig {
    /// Load configuration from the default file and the environment.
    pub fn load() -> Result<Self, RunnerError> {
        let file = std::env::var("LOREWEAVE_CONFIG")
            .unwrap_or_else(|_| String::from(DEFAULT_CONFIG));
        Self::load_from(&file)
    }

    /// Load configuration from a named file stem plus the environment.
    pub fn load_from(file: &str) -> Result<Self, RunnerError> {
        let settings = Config::builder()
            .add_source(File::with_name(file).format(FileFormat::Yaml).required(false))
            .add_source(Environment::with_prefix("LOREWEAVE").separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_a_short_deterministic_run() {
        let config = RunConfig::default();
        assert_eq!(config.run.seed, 42);
        assert_eq!(config.run.epochs, 3);
        assert_eq!(config.run.ticks_per_epoch, 40);
        assert!(!config.output.json_logs);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = RunConfig::load_from("no_such_config_file");
        assert!(config.is_ok_and(|c| c.run.epochs == RunConfig::default().run.epochs));
    }
}
