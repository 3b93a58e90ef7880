//! Fixed-size grid of cell states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ConfigError, Dimensions};

/// Occupant of a single grid cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum CellState {
    #[default]
    Empty,
    Prey,
    Predator,
}

impl CellState {
    /// Numeric code used by the textual grid format.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Prey => 1,
            Self::Predator => 2,
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::Prey),
            2 => Some(Self::Predator),
            _ => None,
        }
    }

    /// Returns true for prey and predators.
    #[must_use]
    pub const fn is_alive(self) -> bool {
        !matches!(self, Self::Empty)
    }
}

/// Population totals from a full-grid scan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Census {
    pub empty: usize,
    pub prey: usize,
    pub predators: usize,
}

impl Census {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.empty + self.prey + self.predators
    }

    #[must_use]
    pub const fn living(&self) -> usize {
        self.prey + self.predators
    }
}

/// Row-major `rows x cols` array of [`CellState`]s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawGrid")]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<CellState>,
}

#[derive(Deserialize)]
struct RawGrid {
    rows: usize,
    cols: usize,
    cells: Vec<CellState>,
}

impl TryFrom<RawGrid> for Grid {
    type Error = ConfigError;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        let dims = Dimensions::new(raw.rows, raw.cols)?;
        if raw.cells.len() != dims.cell_count() {
            return Err(ConfigError::CellCountMismatch {
                rows: raw.rows,
                cols: raw.cols,
                expected: dims.cell_count(),
                actual: raw.cells.len(),
            });
        }
        Ok(Self {
            rows: raw.rows,
            cols: raw.cols,
            cells: raw.cells,
        })
    }
}

impl Grid {
    /// Construct an all-empty grid.
    pub fn new(rows: usize, cols: usize) -> Result<Self, ConfigError> {
        Ok(Self::empty(Dimensions::new(rows, cols)?))
    }

    /// Construct an all-empty grid from validated dimensions.
    #[must_use]
    pub fn empty(dims: Dimensions) -> Self {
        Self {
            rows: dims.rows(),
            cols: dims.cols(),
            cells: vec![CellState::Empty; dims.cell_count()],
        }
    }

    /// Build a grid from nested rows, which must all share one width.
    pub fn from_rows(rows: Vec<Vec<CellState>>) -> Result<Self, ConfigError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let dims = Dimensions::new(height, width)?;
        let mut cells = Vec::with_capacity(dims.cell_count());
        for (row, line) in rows.into_iter().enumerate() {
            if line.len() != width {
                return Err(ConfigError::RaggedGrid {
                    row,
                    expected: width,
                    actual: line.len(),
                });
            }
            cells.extend(line);
        }
        Ok(Self {
            rows: height,
            cols: width,
            cells,
        })
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions {
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when the grid has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [CellState] {
        &mut self.cells
    }

    /// Returns the flat index for `(row, col)` without bounds checks.
    #[inline]
    pub(crate) const fn offset(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Immutable access to a specific cell.
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<CellState> {
        if row < self.rows && col < self.cols {
            Some(self.cells[self.offset(row, col)])
        } else {
            None
        }
    }

    /// Overwrites a cell, returning false if the position is out of bounds.
    pub fn set(&mut self, row: usize, col: usize, state: CellState) -> bool {
        if row < self.rows && col < self.cols {
            let idx = self.offset(row, col);
            self.cells[idx] = state;
            true
        } else {
            false
        }
    }

    /// Fills every cell with `state`.
    pub fn fill(&mut self, state: CellState) {
        self.cells.fill(state);
    }

    /// Counts every state with one pass over the cells.
    #[must_use]
    pub fn census(&self) -> Census {
        self.cells
            .iter()
            .fold(Census::default(), |mut census, cell| {
                match cell {
                    CellState::Empty => census.empty += 1,
                    CellState::Prey => census.prey += 1,
                    CellState::Predator => census.predators += 1,
                }
                census
            })
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.cells.chunks(self.cols) {
            let mut first = true;
            for cell in line {
                if !first {
                    f.write_str(" ")?;
                }
                write!(f, "{}", cell.code())?;
                first = false;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl FromStr for Grid {
    type Err = ConfigError;

    /// Parses whitespace-separated `0`/`1`/`2` codes, one row per non-blank line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rows = Vec::new();
        for line in s.lines().filter(|line| !line.trim().is_empty()) {
            let row = rows.len();
            let parsed = line
                .split_whitespace()
                .enumerate()
                .map(|(col, symbol)| {
                    symbol
                        .parse::<u8>()
                        .ok()
                        .and_then(CellState::from_code)
                        .ok_or_else(|| ConfigError::UnknownCell {
                            row,
                            col,
                            symbol: symbol.to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(parsed);
        }
        Self::from_rows(rows)
    }
}
