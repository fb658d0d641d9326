//! Occupation grid: dense 2D occupancy tracking for item placement.
//!
//! Row-major boolean grid recording which (column, row) cells already
//! hold an item. The grid only ever grows during one layout pass;
//! callers grow it to cover an area before querying cells in that area.

use tracing::trace;

/// Dense 2D occupancy grid.
///
/// All rows always have equal length (`column_count`). Bounds queries
/// are a caller precondition: `is_occupied` on an out-of-range cell is
/// a logic bug and panics via slice indexing.
#[derive(Debug, Clone)]
pub struct OccupationGrid {
    /// `cells[row][column]`, true when occupied.
    cells: Vec<Vec<bool>>,
}

impl OccupationGrid {
    /// Create a grid with the given extent, floored at 1x1.
    pub fn new(column_count: usize, row_count: usize) -> Self {
        let column_count = column_count.max(1);
        let row_count = row_count.max(1);
        Self {
            cells: vec![vec![false; column_count]; row_count],
        }
    }

    /// Current number of columns.
    pub fn column_count(&self) -> usize {
        self.cells[0].len()
    }

    /// Current number of rows.
    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    /// Grow to at least `needed_columns` columns, preserving occupancy.
    /// No-op when the grid is already wide enough; the grid never shrinks.
    pub fn maybe_add_column(&mut self, needed_columns: usize) {
        if needed_columns <= self.column_count() {
            return;
        }
        trace!(from = self.column_count(), to = needed_columns, "growing occupation grid columns");
        for row in &mut self.cells {
            row.resize(needed_columns, false);
        }
    }

    /// Grow to at least `needed_rows` rows, preserving occupancy.
    /// No-op when the grid is already tall enough; the grid never shrinks.
    pub fn maybe_add_row(&mut self, needed_rows: usize) {
        if needed_rows <= self.row_count() {
            return;
        }
        trace!(from = self.row_count(), to = needed_rows, "growing occupation grid rows");
        let columns = self.column_count();
        self.cells.resize(needed_rows, vec![false; columns]);
    }

    /// Mark the half-open rectangle
    /// `[column_start, column_end) x [row_start, row_end)` occupied.
    /// Cells outside the current extent are silently skipped.
    pub fn set_occupied_rect(
        &mut self,
        column_start: usize,
        column_end: usize,
        row_start: usize,
        row_end: usize,
    ) {
        for row in row_start..row_end.min(self.row_count()) {
            let columns = self.cells[row].len();
            for column in column_start..column_end.min(columns) {
                self.cells[row][column] = true;
            }
        }
    }

    /// Mark a single cell occupied. Bounds are a caller precondition.
    pub fn set_occupied(&mut self, column: usize, row: usize) {
        self.cells[row][column] = true;
    }

    /// Whether a cell is occupied. Bounds are a caller precondition:
    /// grow the grid before querying.
    pub fn is_occupied(&self, column: usize, row: usize) -> bool {
        self.cells[row][column]
    }

    /// Whether every in-bounds cell of the half-open rectangle is free.
    ///
    /// Cells beyond the current extent count as free; callers that need
    /// the full rectangle inside the grid check the extent themselves.
    pub fn is_rect_free(
        &self,
        column_start: usize,
        column_end: usize,
        row_start: usize,
        row_end: usize,
    ) -> bool {
        for row in row_start..row_end.min(self.row_count()) {
            for column in column_start..column_end.min(self.cells[row].len()) {
                if self.cells[row][column] {
                    return false;
                }
            }
        }
        true
    }

    /// Whether any cell in the given column is occupied.
    pub fn column_has_occupied_cell(&self, column: usize) -> bool {
        self.cells.iter().any(|row| row.get(column).copied().unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_floors_at_one() {
        let grid = OccupationGrid::new(0, 0);
        assert_eq!(grid.column_count(), 1);
        assert_eq!(grid.row_count(), 1);
        assert!(!grid.is_occupied(0, 0));
    }

    #[test]
    fn test_growth_preserves_occupancy() {
        let mut grid = OccupationGrid::new(2, 2);
        grid.set_occupied(1, 1);

        grid.maybe_add_column(4);
        grid.maybe_add_row(3);

        assert_eq!(grid.column_count(), 4);
        assert_eq!(grid.row_count(), 3);
        assert!(grid.is_occupied(1, 1));
        assert!(!grid.is_occupied(3, 2));
        // Every row has the new width.
        for row in 0..grid.row_count() {
            assert!(!grid.is_occupied(3, row) || row == 1);
        }
    }

    #[test]
    fn test_growth_is_monotonic() {
        let mut grid = OccupationGrid::new(3, 3);
        grid.maybe_add_column(2);
        grid.maybe_add_row(1);
        assert_eq!(grid.column_count(), 3);
        assert_eq!(grid.row_count(), 3);
    }

    #[test]
    fn test_set_occupied_rect() {
        let mut grid = OccupationGrid::new(3, 3);
        grid.set_occupied_rect(0, 2, 0, 1);

        assert!(grid.is_occupied(0, 0));
        assert!(grid.is_occupied(1, 0));
        assert!(!grid.is_occupied(2, 0));
        assert!(!grid.is_occupied(0, 1));
    }

    #[test]
    fn test_set_occupied_rect_clips_to_bounds() {
        let mut grid = OccupationGrid::new(2, 2);
        // Rectangle extends past both edges; out-of-range cells are a no-op.
        grid.set_occupied_rect(1, 5, 1, 5);

        assert!(grid.is_occupied(1, 1));
        assert!(!grid.is_occupied(0, 0));
        assert_eq!(grid.column_count(), 2);
        assert_eq!(grid.row_count(), 2);
    }

    #[test]
    fn test_is_rect_free() {
        let mut grid = OccupationGrid::new(4, 2);
        grid.set_occupied(2, 0);

        assert!(grid.is_rect_free(0, 2, 0, 1));
        assert!(!grid.is_rect_free(1, 3, 0, 1));
        assert!(grid.is_rect_free(3, 4, 0, 2));
    }

    #[test]
    fn test_column_has_occupied_cell() {
        let mut grid = OccupationGrid::new(3, 2);
        grid.set_occupied(1, 1);

        assert!(!grid.column_has_occupied_cell(0));
        assert!(grid.column_has_occupied_cell(1));
        assert!(!grid.column_has_occupied_cell(2));
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds_query_panics() {
        let grid = OccupationGrid::new(2, 2);
        grid.is_occupied(5, 0);
    }
}
