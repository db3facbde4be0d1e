//! Fixed-size Game of Life grid: generation rule and change diffing.
//!
//! The grid is a `width x height` boolean matrix indexed `[y][x]`,
//! created all-dead. [`Grid::advance`] computes the next generation
//! under the classic rule -- a cell is alive in generation *t+1* iff
//! its live-neighbor count is exactly 3, or exactly 2 and the cell is
//! alive at *t* -- and returns the row-major list of cells that
//! changed. The neighborhood is the 8 grid-adjacent cells, bounded at
//! the edges: coordinates outside the grid are not counted and do not
//! wrap.
//!
//! Nothing mutates the cell matrix outside [`Grid::advance`],
//! [`Grid::randomize`], [`Grid::set`], [`Grid::apply`], and full
//! re-creation.

use lifecast_types::CellChange;
use rand::Rng;
use tracing::debug;

/// Errors that can occur during grid operations.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// Grid dimensions must be strictly positive and addressable.
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidDimensions {
        /// The requested width.
        width: usize,
        /// The requested height.
        height: usize,
    },

    /// Seed probability outside the closed interval `[0, 1]`.
    #[error("seed probability must be within [0, 1], got {probability}")]
    InvalidProbability {
        /// The rejected probability value.
        probability: f64,
    },

    /// A coordinate outside `[0, width) x [0, height)`.
    #[error("cell ({x}, {y}) is outside the grid")]
    OutOfBounds {
        /// The requested column.
        x: usize,
        /// The requested row.
        y: usize,
    },
}

/// A fixed-size 2D boolean cell matrix.
///
/// Width and height are immutable after creation. Cells are stored in
/// a flat row-major vector; all public access is coordinate-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// Number of columns.
    width: usize,
    /// Number of rows.
    height: usize,
    /// Row-major cell storage, `cells[y * width + x]`.
    cells: Vec<bool>,
}

impl Grid {
    /// Allocate an all-dead grid of the given dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDimensions`] if either dimension is
    /// zero or `width * height` does not fit in `usize`.
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        let len = width
            .checked_mul(height)
            .filter(|len| *len > 0)
            .ok_or(GridError::InvalidDimensions { width, height })?;
        Ok(Self {
            width,
            height,
            cells: vec![false; len],
        })
    }

    /// Number of columns.
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub const fn height(&self) -> usize {
        self.height
    }

    /// The cell at `(x, y)`, or `None` when out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<bool> {
        self.index(x, y).and_then(|idx| self.cells.get(idx).copied())
    }

    /// Set the cell at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] if the coordinate is outside
    /// the grid.
    pub fn set(&mut self, x: usize, y: usize, alive: bool) -> Result<(), GridError> {
        let idx = self.index(x, y).ok_or(GridError::OutOfBounds { x, y })?;
        if let Some(cell) = self.cells.get_mut(idx) {
            *cell = alive;
        }
        Ok(())
    }

    /// Independently set every cell alive with probability `p`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidProbability`] if `p` is outside
    /// `[0, 1]` (or NaN). The grid is left untouched on error -- the
    /// failure is local to the requesting operation.
    pub fn randomize<R: Rng>(&mut self, p: f64, rng: &mut R) -> Result<(), GridError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(GridError::InvalidProbability { probability: p });
        }
        for cell in &mut self.cells {
            *cell = rng.random_bool(p);
        }
        debug!(p, alive = self.alive_count(), "grid randomized");
        Ok(())
    }

    /// Advance the grid by one generation and return the cells that
    /// changed, in row-major order (y ascending, then x ascending).
    ///
    /// The new generation replaces the old one atomically from the
    /// caller's perspective: no partial generation is ever observable.
    /// The returned list is empty when the generation is a fixed point.
    pub fn advance(&mut self) -> Vec<CellChange> {
        let mut next = vec![false; self.cells.len()];
        let mut changes = Vec::new();

        for y in 0..self.height {
            for x in 0..self.width {
                let alive = self.get(x, y).unwrap_or(false);
                let neighbors = self.live_neighbors(x, y);
                let next_alive = neighbors == 3 || (alive && neighbors == 2);

                if let Some(slot) = self.index(x, y).and_then(|idx| next.get_mut(idx)) {
                    *slot = next_alive;
                }
                if next_alive != alive {
                    changes.push(CellChange {
                        x,
                        y,
                        alive: next_alive,
                    });
                }
            }
        }

        self.cells = next;
        changes
    }

    /// Apply a change list as point updates.
    ///
    /// Applying the list returned by [`Grid::advance`] to a copy of the
    /// pre-tick grid reproduces the post-tick grid exactly. This is the
    /// operation observers perform on their mirrored state.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] on the first change whose
    /// coordinate is outside the grid.
    pub fn apply(&mut self, changes: &[CellChange]) -> Result<(), GridError> {
        for change in changes {
            self.set(change.x, change.y, change.alive)?;
        }
        Ok(())
    }

    /// Total number of alive cells. O(width * height).
    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|cell| **cell).count()
    }

    /// The full cell matrix as nested rows, indexed `[y][x]`.
    ///
    /// Used to build snapshot events.
    pub fn rows(&self) -> Vec<Vec<bool>> {
        self.cells.chunks(self.width).map(<[bool]>::to_vec).collect()
    }

    /// Flat index for `(x, y)`, or `None` when out of bounds.
    fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        y.checked_mul(self.width)?.checked_add(x)
    }

    /// Count alive cells among the 8 grid-adjacent neighbors of
    /// `(x, y)`. Cells outside the grid are not counted and do not
    /// wrap.
    fn live_neighbors(&self, x: usize, y: usize) -> u8 {
        let x_hi = x.saturating_add(1).min(self.width.saturating_sub(1));
        let y_hi = y.saturating_add(1).min(self.height.saturating_sub(1));

        let mut count: u8 = 0;
        for ny in y.saturating_sub(1)..=y_hi {
            for nx in x.saturating_sub(1)..=x_hi {
                if nx == x && ny == y {
                    continue;
                }
                if self.get(nx, ny) == Some(true) {
                    count = count.saturating_add(1);
                }
            }
        }
        count
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    /// Build a grid from a pattern of `'#'` (alive) and `'.'` (dead) rows.
    fn grid_from(rows: &[&str]) -> Grid {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.len());
        let mut grid = Grid::new(width, height).unwrap();
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                grid.set(x, y, ch == '#').unwrap();
            }
        }
        grid
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(matches!(
            Grid::new(0, 10),
            Err(GridError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Grid::new(10, 0),
            Err(GridError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn new_grid_is_all_dead() {
        let grid = Grid::new(8, 4).unwrap();
        assert_eq!(grid.alive_count(), 0);
        assert_eq!(grid.get(7, 3), Some(false));
        assert_eq!(grid.get(8, 3), None);
    }

    #[test]
    fn dead_grid_stays_dead() {
        let mut grid = Grid::new(5, 5).unwrap();
        for _ in 0..10 {
            let changes = grid.advance();
            assert!(changes.is_empty());
            assert_eq!(grid.alive_count(), 0);
        }
    }

    #[test]
    fn lone_cell_dies() {
        let mut grid = Grid::new(5, 5).unwrap();
        grid.set(2, 2, true).unwrap();
        let changes = grid.advance();
        assert_eq!(grid.alive_count(), 0);
        assert_eq!(
            changes,
            vec![CellChange {
                x: 2,
                y: 2,
                alive: false
            }]
        );
    }

    #[test]
    fn corner_cell_with_one_neighbor_dies() {
        let mut grid = grid_from(&["#.", ".#"]);
        let _ = grid.advance();
        assert_eq!(grid.alive_count(), 0);
    }

    #[test]
    fn block_is_stable() {
        let mut grid = grid_from(&["....", ".##.", ".##.", "...."]);
        let before = grid.clone();
        let changes = grid.advance();
        assert!(changes.is_empty());
        assert_eq!(grid, before);
    }

    #[test]
    fn blinker_oscillates_with_period_two() {
        let mut grid = grid_from(&["...", "###", "..."]);
        let original = grid.clone();

        let changes = grid.advance();
        assert_eq!(grid, grid_from(&[".#.", ".#.", ".#."]));
        // Row-major: births before deaths on earlier rows.
        assert_eq!(
            changes,
            vec![
                CellChange { x: 1, y: 0, alive: true },
                CellChange { x: 0, y: 1, alive: false },
                CellChange { x: 2, y: 1, alive: false },
                CellChange { x: 1, y: 2, alive: true },
            ]
        );

        let _ = grid.advance();
        assert_eq!(grid, original);
    }

    #[test]
    fn plus_shape_becomes_ring() {
        // Center plus its 4 orthogonal neighbors: every edge cell
        // survives or is born, the over-crowded center dies.
        let mut grid = grid_from(&[".#.", "###", ".#."]);
        let changes = grid.advance();
        assert_eq!(grid, grid_from(&["###", "#.#", "###"]));
        assert_eq!(
            changes,
            vec![
                CellChange { x: 0, y: 0, alive: true },
                CellChange { x: 2, y: 0, alive: true },
                CellChange { x: 1, y: 1, alive: false },
                CellChange { x: 0, y: 2, alive: true },
                CellChange { x: 2, y: 2, alive: true },
            ]
        );
    }

    #[test]
    fn edges_do_not_wrap() {
        // A vertical pair on the left edge would be a stable block if
        // the grid wrapped horizontally. Bounded, both cells die.
        let mut grid = grid_from(&["#..#", "#..#"]);
        let _ = grid.advance();
        assert_eq!(grid.alive_count(), 0);
    }

    #[test]
    fn randomize_zero_and_one() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut grid = Grid::new(16, 16).unwrap();

        grid.randomize(0.0, &mut rng).unwrap();
        assert_eq!(grid.alive_count(), 0);

        grid.randomize(1.0, &mut rng).unwrap();
        assert_eq!(grid.alive_count(), 256);
    }

    #[test]
    fn randomize_rejects_out_of_range_probability() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut grid = Grid::new(4, 4).unwrap();
        grid.set(1, 1, true).unwrap();

        for p in [-0.1, 1.1, f64::NAN] {
            let result = grid.randomize(p, &mut rng);
            assert!(matches!(result, Err(GridError::InvalidProbability { .. })));
        }
        // Grid untouched by the failed calls.
        assert_eq!(grid.alive_count(), 1);
    }

    #[test]
    fn changes_roundtrip_onto_pre_tick_grid() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut grid = Grid::new(20, 15).unwrap();
        grid.randomize(0.3, &mut rng).unwrap();

        let mut mirror = grid.clone();
        let changes = grid.advance();
        mirror.apply(&changes).unwrap();

        // The patched pre-tick grid reproduces the post-tick grid
        // exactly, so no coordinate outside `changes` differs.
        assert_eq!(mirror, grid);
    }

    #[test]
    fn apply_rejects_out_of_bounds_change() {
        let mut grid = Grid::new(3, 3).unwrap();
        let result = grid.apply(&[CellChange {
            x: 3,
            y: 0,
            alive: true,
        }]);
        assert!(matches!(result, Err(GridError::OutOfBounds { x: 3, y: 0 })));
    }

    #[test]
    fn rows_match_coordinates() {
        let grid = grid_from(&["#..", ".#."]);
        assert_eq!(
            grid.rows(),
            vec![vec![true, false, false], vec![false, true, false]]
        );
    }
}
