//! Neighbor counting over a frozen grid, clipped at the borders.

use serde::{Deserialize, Serialize};

use crate::grid::{CellState, Grid};

const MOORE_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const VON_NEUMANN_OFFSETS: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

/// Which adjacent cells count as neighbors. Neither topology wraps around.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Neighborhood {
    /// The up to 8 orthogonally and diagonally adjacent cells.
    #[default]
    Moore,
    /// The up to 4 orthogonally adjacent cells.
    VonNeumann,
}

impl Neighborhood {
    /// Relative `(row, col)` offsets visited for this topology.
    #[must_use]
    pub const fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Self::Moore => &MOORE_OFFSETS,
            Self::VonNeumann => &VON_NEUMANN_OFFSETS,
        }
    }

    /// Largest neighbor count an interior cell can have.
    #[must_use]
    pub const fn max_neighbors(self) -> usize {
        self.offsets().len()
    }
}

/// Live neighbors of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NeighborCounts {
    pub prey: u8,
    pub predators: u8,
}

impl NeighborCounts {
    #[must_use]
    pub const fn living(&self) -> u8 {
        self.prey + self.predators
    }
}

/// Counts prey and predators adjacent to `(row, col)` in `grid`.
///
/// Positions outside the grid are skipped, so corner cells see at most three
/// Moore neighbors and edge cells at most five.
#[must_use]
pub fn neighbor_counts(
    grid: &Grid,
    row: usize,
    col: usize,
    neighborhood: Neighborhood,
) -> NeighborCounts {
    let mut counts = NeighborCounts::default();
    for &(dr, dc) in neighborhood.offsets() {
        let (Some(r), Some(c)) = (row.checked_add_signed(dr), col.checked_add_signed(dc)) else {
            continue;
        };
        match grid.get(r, c) {
            Some(CellState::Prey) => counts.prey += 1,
            Some(CellState::Predator) => counts.predators += 1,
            Some(CellState::Empty) | None => {}
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_grid(rows: usize, cols: usize, state: CellState) -> Grid {
        let mut grid = Grid::new(rows, cols).expect("grid");
        grid.fill(state);
        grid
    }

    #[test]
    fn moore_counts_are_clipped_at_borders() {
        let grid = full_grid(4, 5, CellState::Prey);
        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                let on_row_edge = row == 0 || row + 1 == grid.rows();
                let on_col_edge = col == 0 || col + 1 == grid.cols();
                let expected = match (on_row_edge, on_col_edge) {
                    (true, true) => 3,
                    (true, false) | (false, true) => 5,
                    (false, false) => 8,
                };
                let counts = neighbor_counts(&grid, row, col, Neighborhood::Moore);
                assert_eq!(counts.prey, expected, "cell ({row}, {col})");
                assert_eq!(counts.predators, 0);
            }
        }
    }

    #[test]
    fn von_neumann_ignores_diagonals() {
        let grid: Grid = "2 1 2\n1 0 1\n2 1 2\n".parse().expect("grid");
        let counts = neighbor_counts(&grid, 1, 1, Neighborhood::VonNeumann);
        assert_eq!(counts, NeighborCounts { prey: 4, predators: 0 });

        let moore = neighbor_counts(&grid, 1, 1, Neighborhood::Moore);
        assert_eq!(moore, NeighborCounts { prey: 4, predators: 4 });

        let corner = neighbor_counts(&grid, 0, 0, Neighborhood::VonNeumann);
        assert_eq!(corner, NeighborCounts { prey: 2, predators: 0 });
    }

    #[test]
    fn centre_cell_is_not_its_own_neighbor() {
        let grid: Grid = "0 0 0\n0 1 0\n0 0 0\n".parse().expect("grid");
        assert_eq!(
            neighbor_counts(&grid, 1, 1, Neighborhood::Moore),
            NeighborCounts::default()
        );
        assert_eq!(neighbor_counts(&grid, 0, 0, Neighborhood::Moore).prey, 1);
    }

    #[test]
    fn single_row_grid_has_two_neighbors_at_most() {
        let grid = full_grid(1, 4, CellState::Predator);
        assert_eq!(neighbor_counts(&grid, 0, 0, Neighborhood::Moore).predators, 1);
        assert_eq!(neighbor_counts(&grid, 0, 2, Neighborhood::Moore).predators, 2);
        assert_eq!(Neighborhood::Moore.max_neighbors(), 8);
        assert_eq!(Neighborhood::VonNeumann.max_neighbors(), 4);
    }
}
