//! Command-line entry point for the Loreweave simulation.
//!
//! Wires the pieces together: configuration, logging, the seed world, the
//! tick driver, and the end-of-run validation report plus JSON snapshot.
//!
//! ```text
//! config --> seed world --> TickDriver::run --> validation --> snapshot
//! ```

mod config;
mod error;
mod seed;

use std::io::Write;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use loreweave_engine::tick::TickDriver;
use loreweave_graph::{WorldGraph, validate_world};
use loreweave_types::DomainSchema;

use crate::config::RunConfig;
use crate::error::RunnerError;

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Write the final world state as pretty-printed JSON.
fn export_snapshot(graph: &WorldGraph, path: &str) -> Result<(), RunnerError> {
    let mut file = std::fs::File::create(path)?;
    let json = serde_json::to_string_pretty(graph)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let config = RunConfig::load().context("loading configuration")?;
    init_logging(config.output.json_logs);
    info!(
        seed = config.run.seed,
        epochs = config.run.epochs,
        ticks_per_epoch = config.run.ticks_per_epoch,
        "loreweave-runner starting"
    );

    let schema = DomainSchema::baseline();
    let mut graph = WorldGraph::new();
    let seeded = seed::seed_world(&mut graph);
    info!(entities = seeded, "seed world built");

    let mut driver = TickDriver::new(schema, config.run.seed);
    let summaries = driver.run(&mut graph, config.run.epochs, config.run.ticks_per_epoch);

    let grown: usize = summaries.iter().map(|s| s.entities_created).sum();
    let linked: usize = summaries.iter().map(|s| s.relationships_added).sum();
    info!(
        ticks = summaries.len(),
        entities_created = grown,
        relationships_added = linked,
        final_entities = graph.entities().count(),
        final_relationships = graph.relationships().len(),
        "run complete"
    );

    let report = validate_world(&graph, None);
    for (check, result) in &report.checks {
        if result.passed {
            info!(check, "validation passed");
        } else {
            warn!(check, failures = result.failure_count, "validation failed");
        }
    }
    if !report.passed() {
        anyhow::bail!(
            "world failed validation: {} of {} checks",
            report.failed_count,
            report.checks.len()
        );
    }

    if config.output.snapshot_path.is_empty() {
        info!("snapshot export disabled");
    } else {
        export_snapshot(&graph, &config.output.snapshot_path)
            .context("exporting world snapshot")?;
        info!(path = %config.output.snapshot_path, "snapshot written");
    }

    Ok(())
}
