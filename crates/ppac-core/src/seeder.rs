//! Randomised multi-pass placement of the initial population.

use tracing::debug;

use crate::ConfigError;
use crate::grid::{CellState, Grid};
use crate::random::DrawSource;

/// Places exactly `prey` prey and `predators` predators on empty cells.
///
/// Each pass visits the still-empty cells in row-major order. A cell first
/// draws against `remaining_prey / cell_count`; only if that fails does it
/// draw against `remaining_predators / cell_count`. Passes repeat until both
/// counters reach zero. Returns the number of passes taken.
///
/// Fails with [`ConfigError::Overpopulated`] before drawing anything when the
/// request exceeds the number of empty cells. The loop ends with probability
/// one for any source whose draws are uniform in `[0, 1)`.
pub fn seed<D: DrawSource + ?Sized>(
    grid: &mut Grid,
    prey: usize,
    predators: usize,
    draws: &mut D,
) -> Result<usize, ConfigError> {
    let mut vacant: Vec<usize> = grid
        .cells()
        .iter()
        .enumerate()
        .filter(|(_, cell)| **cell == CellState::Empty)
        .map(|(idx, _)| idx)
        .collect();
    let requested = prey.saturating_add(predators);
    if requested > vacant.len() {
        return Err(ConfigError::Overpopulated {
            requested,
            capacity: vacant.len(),
        });
    }

    let cell_count = grid.len() as f64;
    let cells = grid.cells_mut();
    let mut prey_left = prey;
    let mut predators_left = predators;
    let mut passes = 0usize;

    while prey_left + predators_left > 0 {
        passes += 1;
        let mut kept = 0;
        for read in 0..vacant.len() {
            if prey_left + predators_left == 0 {
                break;
            }
            let idx = vacant[read];
            if draws.draw() < prey_left as f64 / cell_count {
                cells[idx] = CellState::Prey;
                prey_left -= 1;
            } else if draws.draw() < predators_left as f64 / cell_count {
                cells[idx] = CellState::Predator;
                predators_left -= 1;
            } else {
                vacant[kept] = idx;
                kept += 1;
            }
        }
        vacant.truncate(kept);
    }

    debug!(prey, predators, passes, "seeded initial population");
    Ok(passes)
}
