//! Core engine for the stochastic predator-prey cellular automaton.
//!
//! A [`Simulation`] owns one live [`Grid`] of [`CellState`]s, applies the
//! transition rules to every cell against a frozen snapshot of the previous
//! generation, and records one [`PopulationRecord`] per generation in its
//! [`History`]. Randomness is injected through [`DrawSource`] so runs can be
//! replayed exactly under a seeded or scripted source.

pub mod grid;
pub mod neighborhood;
pub mod random;
pub mod rules;
pub mod seeder;
pub mod simulation;

use rand::{SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use grid::{Census, CellState, Grid};
pub use neighborhood::{NeighborCounts, Neighborhood, neighbor_counts};
pub use random::{DrawSource, RngDraws, ScriptedDraws, cell_stream_seed};
pub use rules::{RuleSet, next_state};
pub use seeder::seed;
pub use simulation::{
    GenerationFrame, GenerationObserver, History, NullObserver, Phase, PopulationRecord,
    Simulation, StepOutcome, UpdateMode,
};

/// Errors raised while validating configuration or building grids.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// Either grid dimension is zero.
    #[error("grid dimensions must be non-zero (got {rows}x{cols})")]
    ZeroDimension { rows: usize, cols: usize },
    /// The cell count `rows * cols` does not fit in `usize`.
    #[error("grid of {rows}x{cols} cells is too large to allocate")]
    TooLarge { rows: usize, cols: usize },
    /// The requested initial population cannot fit on the grid.
    #[error("initial population of {requested} exceeds grid capacity of {capacity} cells")]
    Overpopulated { requested: usize, capacity: usize },
    /// A probability is NaN or outside `[0, 1]`.
    #[error("{rate} must lie in [0, 1] (got {value})")]
    RateOutOfRange { rate: &'static str, value: f64 },
    /// Rows of an explicit grid differ in width.
    #[error("row {row} has {actual} cells, expected {expected}")]
    RaggedGrid {
        row: usize,
        expected: usize,
        actual: usize,
    },
    /// Serialized grid data holds the wrong number of cells.
    #[error("grid of {rows}x{cols} needs {expected} cells, found {actual}")]
    CellCountMismatch {
        rows: usize,
        cols: usize,
        expected: usize,
        actual: usize,
    },
    /// A serialized history record is out of generation order.
    #[error("history record {index} is labelled generation {generation}")]
    HistoryOutOfOrder { index: usize, generation: u64 },
    /// A textual grid contains a symbol other than `0`, `1` or `2`.
    #[error("unknown cell symbol {symbol:?} at row {row}, column {col}")]
    UnknownCell {
        row: usize,
        col: usize,
        symbol: String,
    },
}

/// Per-generation transition probabilities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Probabilities {
    /// Chance that a prey threatened by a predator is eaten.
    pub prey_death_rate: f64,
    /// Chance that a predator starves in a generation.
    pub predator_death_rate: f64,
    /// Chance that an empty cell next to prey is colonised by prey.
    pub prey_birth_rate: f64,
    /// Chance that a successful predation spawns a predator.
    pub predator_birth_rate: f64,
}

impl Default for Probabilities {
    fn default() -> Self {
        Self {
            prey_death_rate: 0.4,
            predator_death_rate: 0.3,
            prey_birth_rate: 0.4,
            predator_birth_rate: 0.7,
        }
    }
}

impl Probabilities {
    /// Rejects any rate that is NaN or outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rates = [
            ("prey_death_rate", self.prey_death_rate),
            ("predator_death_rate", self.predator_death_rate),
            ("prey_birth_rate", self.prey_birth_rate),
            ("predator_birth_rate", self.predator_birth_rate),
        ];
        for (rate, value) in rates {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { rate, value });
            }
        }
        Ok(())
    }
}

/// Validated grid dimensions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "RawDimensions")]
pub struct Dimensions {
    rows: usize,
    cols: usize,
}

#[derive(Deserialize)]
struct RawDimensions {
    rows: usize,
    cols: usize,
}

impl TryFrom<RawDimensions> for Dimensions {
    type Error = ConfigError;

    fn try_from(raw: RawDimensions) -> Result<Self, Self::Error> {
        Self::new(raw.rows, raw.cols)
    }
}

impl Dimensions {
    pub fn new(rows: usize, cols: usize) -> Result<Self, ConfigError> {
        if rows == 0 || cols == 0 {
            return Err(ConfigError::ZeroDimension { rows, cols });
        }
        if rows.checked_mul(cols).is_none() {
            return Err(ConfigError::TooLarge { rows, cols });
        }
        Ok(Self { rows, cols })
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of cells; never overflows for a validated value.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.rows * self.cols
    }
}

/// Immutable parameters consulted by every generation step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct RuleConfig {
    pub probabilities: Probabilities,
    pub neighborhood: Neighborhood,
    pub rule_set: RuleSet,
    pub update: UpdateMode,
}

/// Static configuration for an automaton seeded from population counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AutomatonConfig {
    /// Number of grid rows.
    pub rows: usize,
    /// Number of grid columns.
    pub cols: usize,
    /// Prey placed by the seeder before generation 0.
    pub initial_prey: usize,
    /// Predators placed by the seeder before generation 0.
    pub initial_predators: usize,
    /// Transition parameters.
    pub rules: RuleConfig,
    /// Optional RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
}

impl Default for AutomatonConfig {
    fn default() -> Self {
        Self {
            rows: 200,
            cols: 200,
            initial_prey: 60,
            initial_predators: 60,
            rules: RuleConfig::default(),
            rng_seed: None,
        }
    }
}

impl AutomatonConfig {
    /// Validates dimensions, rates and population capacity, in that order.
    pub fn validate(&self) -> Result<Dimensions, ConfigError> {
        let dims = Dimensions::new(self.rows, self.cols)?;
        self.rules.probabilities.validate()?;
        let capacity = dims.cell_count();
        let requested = self.initial_prey.saturating_add(self.initial_predators);
        if requested > capacity {
            return Err(ConfigError::Overpopulated {
                requested,
                capacity,
            });
        }
        Ok(dims)
    }

    /// Returns the configured RNG, generating a seed from entropy if absent.
    #[must_use]
    pub fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let dims = AutomatonConfig::default().validate().expect("valid");
        assert_eq!(dims.rows(), 200);
        assert_eq!(dims.cols(), 200);
        assert_eq!(dims.cell_count(), 40_000);
    }

    #[test]
    fn zero_dimension_is_rejected_before_rates() {
        let config = AutomatonConfig {
            rows: 0,
            cols: 4,
            rules: RuleConfig {
                probabilities: Probabilities {
                    prey_birth_rate: 2.0,
                    ..Probabilities::default()
                },
                ..RuleConfig::default()
            },
            ..AutomatonConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroDimension { rows: 0, cols: 4 })
        );
    }

    #[test]
    fn rates_outside_unit_interval_are_rejected() {
        let mut probabilities = Probabilities {
            predator_death_rate: -0.1,
            ..Probabilities::default()
        };
        assert_eq!(
            probabilities.validate(),
            Err(ConfigError::RateOutOfRange {
                rate: "predator_death_rate",
                value: -0.1
            })
        );

        probabilities.predator_death_rate = 1.0;
        probabilities.prey_birth_rate = f64::NAN;
        assert!(matches!(
            probabilities.validate(),
            Err(ConfigError::RateOutOfRange {
                rate: "prey_birth_rate",
                ..
            })
        ));

        probabilities.prey_birth_rate = 0.0;
        assert!(probabilities.validate().is_ok());
    }

    #[test]
    fn overpopulation_is_rejected() {
        let config = AutomatonConfig {
            rows: 3,
            cols: 3,
            initial_prey: 5,
            initial_predators: 5,
            ..AutomatonConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Overpopulated {
                requested: 10,
                capacity: 9
            })
        );

        let full = AutomatonConfig {
            initial_predators: 4,
            ..config
        };
        assert!(full.validate().is_ok());
    }

    #[test]
    fn oversized_grid_is_rejected() {
        assert_eq!(
            Dimensions::new(usize::MAX, 2),
            Err(ConfigError::TooLarge {
                rows: usize::MAX,
                cols: 2
            })
        );
    }

    #[test]
    fn dimensions_deserialise_through_validation() {
        let dims: Dimensions = serde_json::from_str(r#"{"rows": 3, "cols": 4}"#).expect("json");
        assert_eq!(dims.cell_count(), 12);

        let err = serde_json::from_str::<Dimensions>(r#"{"rows": 0, "cols": 4}"#)
            .expect_err("zero rows");
        assert!(err.to_string().contains("must be non-zero"), "{err}");
    }

    #[test]
    fn config_deserialises_with_defaults() {
        let config: AutomatonConfig =
            serde_json::from_str(r#"{"rows": 10, "cols": 12, "rng_seed": 7}"#).expect("json");
        assert_eq!(config.rows, 10);
        assert_eq!(config.cols, 12);
        assert_eq!(config.initial_prey, 60);
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.rules, RuleConfig::default());
    }
}
