//! Driver layer for predator-prey automaton runs.
//!
//! Turns flat parameter sets into engine configuration, runs them either to
//! termination or for a fixed number of generations, and packages the
//! resulting history for reporting.

pub mod lotka_volterra;
pub mod render;
pub mod report;

use anyhow::{Context, Result};
use ppac_core::{
    AutomatonConfig, Census, ConfigError, GenerationObserver, History, Neighborhood,
    Probabilities, RuleConfig, RuleSet, Simulation, UpdateMode,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// One run of the automaton, in the shape of a sweep entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunParameters {
    pub initial_prey: usize,
    pub initial_predators: usize,
    /// Side length of a square board; overridden per axis by `rows`/`cols`.
    pub board_size: usize,
    pub rows: Option<usize>,
    pub cols: Option<usize>,
    pub prey_birth_rate: f64,
    pub prey_death_rate: f64,
    pub predator_birth_rate: f64,
    pub predator_death_rate: f64,
    /// Generations to run; `None` runs until termination.
    pub iterations: Option<u64>,
    pub seed: Option<u64>,
    pub neighborhood: Neighborhood,
    pub rule_set: RuleSet,
    /// Update cells in parallel from per-cell random streams.
    pub parallel: bool,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            initial_prey: 400,
            initial_predators: 200,
            board_size: 40,
            rows: None,
            cols: None,
            prey_birth_rate: 0.7,
            prey_death_rate: 0.5,
            predator_birth_rate: 0.8,
            predator_death_rate: 0.4,
            iterations: Some(800),
            seed: None,
            neighborhood: Neighborhood::Moore,
            rule_set: RuleSet::FlatPredatorDeath,
            parallel: false,
        }
    }
}

impl RunParameters {
    /// Fixes the seed so the run can be reproduced from its report.
    #[must_use]
    pub fn resolved(&self) -> Self {
        Self {
            seed: Some(self.seed.unwrap_or_else(rand::random)),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn to_config(&self) -> AutomatonConfig {
        let update = match (self.parallel, self.seed) {
            (true, Some(seed)) => UpdateMode::PerCellStreams { seed },
            (true, None) => UpdateMode::PerCellStreams {
                seed: rand::random(),
            },
            (false, _) => UpdateMode::Sequential,
        };
        AutomatonConfig {
            rows: self.rows.unwrap_or(self.board_size),
            cols: self.cols.unwrap_or(self.board_size),
            initial_prey: self.initial_prey,
            initial_predators: self.initial_predators,
            rules: RuleConfig {
                probabilities: Probabilities {
                    prey_death_rate: self.prey_death_rate,
                    predator_death_rate: self.predator_death_rate,
                    prey_birth_rate: self.prey_birth_rate,
                    predator_birth_rate: self.predator_birth_rate,
                },
                neighborhood: self.neighborhood,
                rule_set: self.rule_set,
                update,
            },
            rng_seed: self.seed,
        }
    }
}

/// Outcome of one run, ready for serialisation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    pub parameters: RunParameters,
    pub generations: u64,
    pub terminated: bool,
    pub final_census: Census,
    pub history: History,
}

/// Run `parameters` to completion, optionally streaming frames to `observer`.
pub fn execute(
    parameters: &RunParameters,
    observer: Option<Box<dyn GenerationObserver>>,
) -> Result<RunReport, ConfigError> {
    let parameters = parameters.resolved();
    let mut sim = Simulation::new(&parameters.to_config())?;
    if let Some(observer) = observer {
        sim = sim.with_observer(observer);
    }
    let generations = match parameters.iterations {
        Some(steps) => sim.iterate(steps),
        None => sim.run(),
    };
    let final_census = sim.census();
    let terminated = sim.is_terminated();
    info!(
        seed = parameters.seed,
        generations,
        terminated,
        prey = final_census.prey,
        predators = final_census.predators,
        "run complete"
    );
    Ok(RunReport {
        parameters,
        generations,
        terminated,
        final_census,
        history: sim.into_history(),
    })
}

/// Reads a JSON array of parameter sets.
pub fn load_sweep(path: &Path) -> Result<Vec<RunParameters>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read sweep file {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("failed to parse sweep file {}", path.display()))
}
