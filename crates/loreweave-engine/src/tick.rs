//! The tick driver: one full simulation step and multi-epoch runs.
//!
//! A tick advances the clock, runs the fixed system pipeline (committing
//! each system's result before the next system reads the graph), then runs
//! the growth phase: eligible templates are weighted by the current era and
//! at most [`TEMPLATES_PER_TICK`] distinct templates expand. Pending
//! pressure deltas accumulate through the whole tick and are applied once
//! at the end, so every system and template reads the same pressure values.
//!
//! Epochs are the coarse outer loop: each boundary resets the discovery
//! budget and advances the era schedule.

use tracing::{debug, info, warn};

use loreweave_graph::{CurrentEra, WorldGraph};
use loreweave_types::DomainSchema;

use crate::commit::{commit_growth, commit_system};
use crate::rng::SimRng;
use crate::systems::{SimulationSystem, standard_systems};
use crate::template::GrowthTemplate;
use crate::templates::standard_templates;

/// Maximum distinct templates expanded per tick.
const TEMPLATES_PER_TICK: usize = 2;

/// Per-tick bleed step pulling every pressure back toward zero. Keeps a
/// channel from pinning at its last value once its sources go quiet.
const PRESSURE_RELAXATION: f64 = 0.25;

/// What one tick did, for logs and run reports.
#[derive(Debug, Clone, Default)]
pub struct TickSummary {
    /// The tick this summarizes.
    pub tick: u64,
    /// Era id in effect during the tick.
    pub era: String,
    /// Ids of templates that expanded non-emptily.
    pub templates_applied: Vec<&'static str>,
    /// Entities created by systems and templates combined.
    pub entities_created: usize,
    /// Relationships inserted by systems and templates combined.
    pub relationships_added: usize,
    /// Entities patched by systems.
    pub entities_modified: usize,
    /// Pressure deltas applied at the end of the tick.
    pub pressures_applied: Vec<(String, f64)>,
}

/// Owns the schema, the pipelines, and the run's RNG stream.
pub struct TickDriver {
    schema: DomainSchema,
    templates: Vec<Box<dyn GrowthTemplate>>,
    systems: Vec<Box<dyn SimulationSystem>>,
    rng: SimRng,
}

impl TickDriver {
    /// Driver with the standard template and system pipelines.
    pub fn new(schema: DomainSchema, seed: u64) -> Self {
        Self::with_parts(schema, standard_templates(), standard_systems(), seed)
    }

    /// Driver with explicit pipelines, for domains that extend the
    /// standard set.
    pub fn with_parts(
        schema: DomainSchema,
        templates: Vec<Box<dyn GrowthTemplate>>,
        systems: Vec<Box<dyn SimulationSystem>>,
        seed: u64,
    ) -> Self {
        Self {
            schema,
            templates,
            systems,
            rng: SimRng::seed_from_u64(seed),
        }
    }

    /// The driver's schema.
    pub const fn schema(&self) -> &DomainSchema {
        &self.schema
    }

    /// Load the era at `index` from the schema's schedule into the graph.
    fn set_era(&self, graph: &mut WorldGraph, index: usize) {
        if let Some(spec) = self.schema.era_at(index) {
            info!(era = %spec.name, index, "era begins");
            graph.era = CurrentEra {
                index,
                id: spec.id.clone(),
                name: spec.name.clone(),
                template_weights: spec.template_weights.clone(),
                system_modifier: spec.system_modifier,
            };
        }
    }

    /// Run one full tick against the graph.
    pub fn run_tick(&mut self, graph: &mut WorldGraph) -> TickSummary {
        graph.advance_tick();
        if graph.era.id.is_empty() {
            self.set_era(graph, graph.era.index);
        }

        let mut summary = TickSummary {
            tick: graph.tick(),
            era: graph.era.id.clone(),
            ..TickSummary::default()
        };

        // System phase: each result commits before the next system runs, so
        // later systems see earlier mutations.
        for system in &self.systems {
            let modifier = graph.era.system_modifier;
            let result = system.apply(graph, &self.schema, modifier, &mut self.rng);
            if result.is_empty() {
                continue;
            }
            debug!(system = system.name(), detail = %result.description, "system ran");
            let outcome = commit_system(graph, &self.schema, &result);
            summary.entities_created =
                summary.entities_created.saturating_add(outcome.created.len());
            summary.relationships_added = summary
                .relationships_added
                .saturating_add(outcome.relationships_added);
            summary.entities_modified = summary
                .entities_modified
                .saturating_add(outcome.entities_modified);
        }

        self.growth_phase(graph, &mut summary);

        summary.pressures_applied = graph.pressures.apply_pending();

        // Relax every channel after the apply so sustained pressure needs
        // sustained sources.
        let channels: Vec<String> = graph.pressures.iter().map(|(name, _)| name.clone()).collect();
        for channel in channels {
            graph
                .pressures
                .smooth_toward(&channel, 0.0, PRESSURE_RELAXATION);
        }
        summary
    }

    /// Template selection and expansion for one tick.
    fn growth_phase(&mut self, graph: &mut WorldGraph, summary: &mut TickSummary) {
        // Eligibility is rolled once per template per tick.
        let mut candidates: Vec<(usize, f64)> = Vec::new();
        for (i, template) in self.templates.iter().enumerate() {
            if template.can_apply(graph, &self.schema, &mut self.rng) {
                let weight = graph
                    .era
                    .template_weights
                    .get(template.id())
                    .copied()
                    .unwrap_or(1.0);
                candidates.push((i, weight));
            }
        }

        for _ in 0..TEMPLATES_PER_TICK {
            let Some(&chosen) = self.rng.pick_weighted(&candidates) else {
                break;
            };
            candidates.retain(|&(i, _)| i != chosen);
            let Some(template) = self.templates.get(chosen) else {
                break;
            };

            let targets = template.find_targets(graph, &self.schema);
            let target = self.rng.pick(&targets).copied();
            let result = match template.expand(graph, &self.schema, target, &mut self.rng) {
                Ok(result) => result,
                Err(error) => {
                    warn!(template = template.id(), %error, "template cannot run");
                    continue;
                }
            };
            if result.is_empty() {
                debug!(template = template.id(), reason = %result.description, "expansion skipped");
                continue;
            }

            let outcome = commit_growth(graph, &self.schema, &result);
            info!(
                template = template.id(),
                created = outcome.created.len(),
                detail = %result.description,
                "template expanded"
            );
            summary.templates_applied.push(template.id());
            summary.entities_created =
                summary.entities_created.saturating_add(outcome.created.len());
            summary.relationships_added = summary
                .relationships_added
                .saturating_add(outcome.relationships_added);
            if template.counts_as_discovery() {
                graph.discovery.record(graph.tick());
            }
        }
    }

    /// Run `epochs` epochs of `ticks_per_epoch` ticks each. Each epoch
    /// boundary after the first resets the discovery budget and advances
    /// the era schedule.
    pub fn run(
        &mut self,
        graph: &mut WorldGraph,
        epochs: usize,
        ticks_per_epoch: u64,
    ) -> Vec<TickSummary> {
        let mut summaries = Vec::new();
        for epoch in 0..epochs {
            if epoch > 0 {
                graph.discovery.reset_epoch();
                self.set_era(graph, graph.era.index.saturating_add(1));
            }
            info!(epoch, era = %graph.era.id, "epoch begins");
            for _ in 0..ticks_per_epoch {
                summaries.push(self.run_tick(graph));
            }
        }
        summaries
    }
}
