//! Generation stepping, termination and population history.

use rand::{SeedableRng, rngs::SmallRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, trace};

use crate::grid::{Census, CellState, Grid};
use crate::neighborhood::neighbor_counts;
use crate::random::{DrawSource, RngDraws, cell_stream_seed};
use crate::rules::next_state;
use crate::{AutomatonConfig, ConfigError, Probabilities, RuleConfig, seeder};

/// How the per-cell updates of one generation obtain their draws.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum UpdateMode {
    /// Row-major traversal drawing from the simulation's injected source.
    #[default]
    Sequential,
    /// Parallel traversal; every cell draws from a private stream seeded by
    /// [`cell_stream_seed`] from `seed`, the generation and the cell index.
    PerCellStreams { seed: u64 },
}

/// Lifecycle of a simulation after construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Generation 0 is in place and no step has run.
    Seeded,
    /// At least one generation has been committed.
    Running,
    /// Everything died or prey fill the grid; stepping is a no-op.
    Terminated,
}

/// Population counts for one generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PopulationRecord {
    pub generation: u64,
    pub prey: usize,
    pub predators: usize,
}

/// Append-only record of every generation's population.
///
/// Record `i` always holds generation `i`; deserialization rejects any
/// other ordering.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawHistory")]
pub struct History {
    records: Vec<PopulationRecord>,
}

#[derive(Deserialize)]
struct RawHistory {
    records: Vec<PopulationRecord>,
}

impl TryFrom<RawHistory> for History {
    type Error = ConfigError;

    fn try_from(raw: RawHistory) -> Result<Self, Self::Error> {
        for (index, record) in raw.records.iter().enumerate() {
            if record.generation != index as u64 {
                return Err(ConfigError::HistoryOutOfOrder {
                    index,
                    generation: record.generation,
                });
            }
        }
        Ok(Self {
            records: raw.records,
        })
    }
}

impl History {
    fn push(&mut self, record: PopulationRecord) {
        debug_assert_eq!(record.generation, self.records.len() as u64);
        self.records.push(record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[PopulationRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &PopulationRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn get(&self, generation: usize) -> Option<&PopulationRecord> {
        self.records.get(generation)
    }

    #[must_use]
    pub fn last(&self) -> Option<&PopulationRecord> {
        self.records.last()
    }

    /// Generation numbers, for the time axis of population plots.
    pub fn generations(&self) -> impl Iterator<Item = u64> + '_ {
        self.records.iter().map(|record| record.generation)
    }

    pub fn prey(&self) -> impl Iterator<Item = usize> + '_ {
        self.records.iter().map(|record| record.prey)
    }

    pub fn predators(&self) -> impl Iterator<Item = usize> + '_ {
        self.records.iter().map(|record| record.predators)
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a PopulationRecord;
    type IntoIter = std::slice::Iter<'a, PopulationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Result of a [`Simulation::step`] call.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A generation was committed and recorded.
    Advanced(PopulationRecord),
    /// The simulation had already terminated; nothing changed.
    AlreadyTerminated,
}

impl StepOutcome {
    #[must_use]
    pub const fn record(&self) -> Option<PopulationRecord> {
        match self {
            Self::Advanced(record) => Some(*record),
            Self::AlreadyTerminated => None,
        }
    }
}

/// Read-only view handed to observers after each committed generation.
#[derive(Debug, Clone, Copy)]
pub struct GenerationFrame<'a> {
    pub grid: &'a Grid,
    pub record: PopulationRecord,
    pub phase: Phase,
}

/// Sink for per-generation snapshots, such as a renderer.
pub trait GenerationObserver: Send {
    fn on_generation(&mut self, frame: &GenerationFrame<'_>);
}

/// Observer that ignores every frame.
#[derive(Debug, Default)]
pub struct NullObserver;

impl GenerationObserver for NullObserver {
    fn on_generation(&mut self, _frame: &GenerationFrame<'_>) {}
}

/// Predator-prey automaton with double-buffered grids.
pub struct Simulation<D: DrawSource = RngDraws<SmallRng>> {
    rules: RuleConfig,
    current: Grid,
    next: Grid,
    generation: u64,
    phase: Phase,
    history: History,
    draws: D,
    observer: Box<dyn GenerationObserver>,
}

impl<D: DrawSource> fmt::Debug for Simulation<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("rules", &self.rules)
            .field("rows", &self.current.rows())
            .field("cols", &self.current.cols())
            .field("generation", &self.generation)
            .field("phase", &self.phase)
            .field("history_len", &self.history.len())
            .finish()
    }
}

impl Simulation {
    /// Validate `config`, seed a grid and draw from [`AutomatonConfig::seeded_rng`].
    pub fn new(config: &AutomatonConfig) -> Result<Self, ConfigError> {
        let draws = RngDraws::new(config.seeded_rng());
        Self::with_draws(config, draws)
    }
}

impl<D: DrawSource> Simulation<D> {
    /// Validate `config` and seed an empty grid using `draws`, which then
    /// drives every subsequent generation.
    ///
    /// Generation 0 records the requested counts.
    pub fn with_draws(config: &AutomatonConfig, mut draws: D) -> Result<Self, ConfigError> {
        let dims = config.validate()?;
        let mut grid = Grid::empty(dims);
        seeder::seed(
            &mut grid,
            config.initial_prey,
            config.initial_predators,
            &mut draws,
        )?;
        let record = PopulationRecord {
            generation: 0,
            prey: config.initial_prey,
            predators: config.initial_predators,
        };
        Ok(Self::assemble(grid, config.rules, draws, record))
    }

    /// Start from an explicit grid; generation 0 records its scanned counts.
    pub fn from_grid(grid: Grid, rules: RuleConfig, draws: D) -> Result<Self, ConfigError> {
        rules.probabilities.validate()?;
        let census = grid.census();
        let record = PopulationRecord {
            generation: 0,
            prey: census.prey,
            predators: census.predators,
        };
        Ok(Self::assemble(grid, rules, draws, record))
    }

    fn assemble(grid: Grid, rules: RuleConfig, draws: D, record: PopulationRecord) -> Self {
        let cell_count = grid.len();
        let phase = if is_terminal(record.prey, record.predators, cell_count) {
            Phase::Terminated
        } else {
            Phase::Seeded
        };
        let mut history = History::default();
        history.push(record);
        debug!(
            rows = grid.rows(),
            cols = grid.cols(),
            prey = record.prey,
            predators = record.predators,
            ?phase,
            "automaton initialised"
        );
        Self {
            rules,
            next: Grid::empty(grid.dimensions()),
            current: grid,
            generation: 0,
            phase,
            history,
            draws,
            observer: Box::new(NullObserver),
        }
    }

    /// Install an observer and immediately show it the current generation.
    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn GenerationObserver>) -> Self {
        self.observer = observer;
        if let Some(record) = self.history.last().copied() {
            self.notify(record);
        }
        self
    }

    /// Advance one generation, unless already terminated.
    pub fn step(&mut self) -> StepOutcome {
        if self.phase == Phase::Terminated {
            return StepOutcome::AlreadyTerminated;
        }

        let generation = self.generation + 1;
        advance_cells(
            &self.current,
            self.next.cells_mut(),
            &self.rules,
            &mut self.draws,
            generation,
        );
        std::mem::swap(&mut self.current, &mut self.next);
        self.generation = generation;

        let Census {
            prey, predators, ..
        } = self.current.census();
        let record = PopulationRecord {
            generation,
            prey,
            predators,
        };
        self.history.push(record);

        if is_terminal(prey, predators, self.current.len()) {
            self.phase = Phase::Terminated;
            info!(generation, prey, predators, "automaton terminated");
        } else {
            self.phase = Phase::Running;
            trace!(generation, prey, predators, "generation committed");
        }
        self.notify(record);
        StepOutcome::Advanced(record)
    }

    /// Step up to `steps` times, stopping early on termination.
    ///
    /// Returns the number of generations actually committed.
    pub fn iterate(&mut self, steps: u64) -> u64 {
        let mut taken = 0;
        while taken < steps {
            if self.step() == StepOutcome::AlreadyTerminated {
                break;
            }
            taken += 1;
        }
        taken
    }

    /// Step until termination and return the number of generations run.
    ///
    /// There is no iteration cap; use [`Simulation::iterate`] for bounded runs.
    pub fn run(&mut self) -> u64 {
        let start = self.generation;
        while self.step() != StepOutcome::AlreadyTerminated {}
        let taken = self.generation - start;
        info!(generations = taken, "run finished");
        taken
    }

    fn notify(&mut self, record: PopulationRecord) {
        let frame = GenerationFrame {
            grid: &self.current,
            record,
            phase: self.phase,
        };
        self.observer.on_generation(&frame);
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.current
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn into_history(self) -> History {
        self.history
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Terminated
    }

    #[must_use]
    pub const fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    #[must_use]
    pub const fn probabilities(&self) -> &Probabilities {
        &self.rules.probabilities
    }

    /// Full-grid scan of the current generation.
    #[must_use]
    pub fn census(&self) -> Census {
        self.current.census()
    }

    /// Borrow the draw source for out-of-band sampling.
    #[must_use]
    pub fn draws_mut(&mut self) -> &mut D {
        &mut self.draws
    }
}

fn is_terminal(prey: usize, predators: usize, cell_count: usize) -> bool {
    (prey == 0 && predators == 0) || prey == cell_count
}

/// Writes the next generation of `snapshot` into `next`, reading only `snapshot`.
fn advance_cells<D: DrawSource + ?Sized>(
    snapshot: &Grid,
    next: &mut [CellState],
    rules: &RuleConfig,
    draws: &mut D,
    generation: u64,
) {
    match rules.update {
        UpdateMode::Sequential => {
            for (idx, slot) in next.iter_mut().enumerate() {
                *slot = evolve_cell(snapshot, idx, rules, draws);
            }
        }
        UpdateMode::PerCellStreams { seed } => {
            next.par_iter_mut().enumerate().for_each(|(idx, slot)| {
                let rng = SmallRng::seed_from_u64(cell_stream_seed(seed, generation, idx));
                *slot = evolve_cell(snapshot, idx, rules, &mut RngDraws::new(rng));
            });
        }
    }
}

#[inline]
fn evolve_cell<D: DrawSource + ?Sized>(
    snapshot: &Grid,
    idx: usize,
    rules: &RuleConfig,
    draws: &mut D,
) -> CellState {
    let cols = snapshot.cols();
    let counts = neighbor_counts(snapshot, idx / cols, idx % cols, rules.neighborhood);
    next_state(
        rules.rule_set,
        snapshot.cells()[idx],
        counts,
        &rules.probabilities,
        draws,
    )
}
