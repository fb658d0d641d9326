//! Grid item placement.
//!
//! Implements the CSS grid item placement algorithm
//! (<https://drafts.csswg.org/css-grid/#auto-placement-algo>) in four
//! phases over a shared pending list:
//!
//! 1. Items with a definite position in both axes
//! 2. Items locked to a definite row
//! 3. Remaining items with a definite column (cursor-driven row search)
//! 4. Fully automatic items (row-major cursor sweep, sparse packing)
//!
//! Each phase consumes a pending list and returns the items it could
//! not place, so phase transitions are explicit and the occupation grid
//! only ever grows. Dense packing is not supported.

use lattice_style::GridTrackPlacement;
use tracing::trace;

use crate::occupation::OccupationGrid;
use crate::{BoxId, GridChild};

/// A placed grid item: 0-based start tracks and spans per axis.
///
/// Created during placement, consumed by track sizing and the final
/// layout pass; not persisted beyond one layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedBox {
    /// External box reference.
    pub id: BoxId,
    /// 0-based start row.
    pub row: usize,
    /// Number of rows spanned (>= 1).
    pub row_span: usize,
    /// 0-based start column.
    pub column: usize,
    /// Number of columns spanned (>= 1).
    pub column_span: usize,
    /// Content height carried from the measurement pass.
    pub computed_height: f32,
}

/// A resolved axis placement: 0-based start track and span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAxis {
    pub start: usize,
    pub span: usize,
}

/// Resolve a 1-based line number against the current grid dimension.
/// Negative lines count backward from the end of the explicit grid:
/// line -1 is the last line, i.e. `track_count + 1`.
fn resolve_line(line: i32, track_count: usize) -> i32 {
    if line < 0 {
        track_count as i32 + line + 2
    } else {
        line
    }
}

/// Resolve one axis of an item whose placement contributes at least one
/// concrete line, applying the grid placement conflict rules
/// (<https://drafts.csswg.org/css-grid/#grid-placement-errors>).
///
/// `track_count` is the grid dimension at the time this item is
/// processed; negative lines resolve against it.
pub fn resolve_axis(
    start: &GridTrackPlacement,
    end: &GridTrackPlacement,
    track_count: usize,
) -> ResolvedAxis {
    debug_assert!(
        start.is_line() || end.is_line(),
        "resolve_axis requires a concrete line on at least one edge"
    );
    if let GridTrackPlacement::Line { name: Some(name), .. } = start {
        trace!(name = %name, "named grid lines are not implemented; using the numeric line");
    }
    if let GridTrackPlacement::Line { name: Some(name), .. } = end {
        trace!(name = %name, "named grid lines are not implemented; using the numeric line");
    }

    let start_line = start.line_number().map(|l| resolve_line(l, track_count));
    let end_line = end.line_number().map(|l| resolve_line(l, track_count));

    let (mut start_line, span) = match (start_line, end_line) {
        // Two lines: swap when the start is further end-ward; equal lines
        // drop the end and keep a span of 1.
        (Some(s), Some(e)) => {
            let (s, e) = if s > e { (e, s) } else { (s, e) };
            (s, if s == e { 1 } else { e - s })
        }
        // Line start with a span end.
        (Some(s), None) => {
            let span = end.span_count().unwrap_or(1);
            (s, span)
        }
        // Span (or auto) start against a line end: count backward.
        (None, Some(e)) => {
            let span = start.span_count().unwrap_or(1);
            (e - span, span)
        }
        (None, None) => unreachable!("caller checked for a concrete line"),
    };

    // Spans overflowing before the grid start are not supported; snap to
    // the first line. Span values below 1 are caller error, clamped.
    if start_line < 1 {
        start_line = 1;
    }
    let span = span.max(1);

    ResolvedAxis {
        start: (start_line - 1) as usize,
        span: span as usize,
    }
}

/// Span requested by a bare `span N` placement on an auto axis.
fn auto_axis_span(start: &GridTrackPlacement) -> usize {
    start.span_count().unwrap_or(1).max(1) as usize
}

/// The 4-phase placement engine. Owns the auto-placement cursor and
/// mutates the occupation grid as items are placed.
#[derive(Debug)]
pub struct PlacementEngine<'a> {
    grid: &'a mut OccupationGrid,
    cursor_column: usize,
    cursor_row: usize,
}

impl<'a> PlacementEngine<'a> {
    /// Create an engine over an occupation grid sized to the explicit
    /// tracks.
    pub fn new(grid: &'a mut OccupationGrid) -> Self {
        Self {
            grid,
            cursor_column: 0,
            cursor_row: 0,
        }
    }

    /// Place every child, in document order within each phase, and
    /// return the positioned boxes in placement order.
    pub fn place_items(mut self, children: &[GridChild]) -> Vec<PositionedBox> {
        let mut placed = Vec::with_capacity(children.len());
        let pending: Vec<&GridChild> = children.iter().collect();

        let pending = self.place_definite_items(pending, &mut placed);
        let pending = self.place_row_locked_items(pending, &mut placed);
        let pending = self.place_column_locked_items(pending, &mut placed);
        self.place_auto_items(pending, &mut placed);

        placed
    }

    /// Phase 1: items with a concrete position in both axes.
    fn place_definite_items<'c>(
        &mut self,
        pending: Vec<&'c GridChild>,
        placed: &mut Vec<PositionedBox>,
    ) -> Vec<&'c GridChild> {
        let mut still_pending = Vec::new();
        for child in pending {
            if child.style.is_auto_positioned_row() || child.style.is_auto_positioned_column() {
                still_pending.push(child);
                continue;
            }

            let row = resolve_axis(
                &child.style.row_start,
                &child.style.row_end,
                self.grid.row_count(),
            );
            let column = resolve_axis(
                &child.style.column_start,
                &child.style.column_end,
                self.grid.column_count(),
            );

            self.grid.maybe_add_row(row.start + row.span);
            self.grid.maybe_add_column(column.start + column.span);
            self.grid.set_occupied_rect(
                column.start,
                column.start + column.span,
                row.start,
                row.start + row.span,
            );

            trace!(
                id = child.id.0,
                row = row.start,
                row_span = row.span,
                column = column.start,
                column_span = column.span,
                "placed explicitly positioned item"
            );
            placed.push(PositionedBox {
                id: child.id,
                row: row.start,
                row_span: row.span,
                column: column.start,
                column_span: column.span,
                computed_height: 0.0,
            });
        }
        still_pending
    }

    /// Phase 2: items locked to a definite row; the column is found by
    /// scanning left-to-right in the assigned rows.
    fn place_row_locked_items<'c>(
        &mut self,
        pending: Vec<&'c GridChild>,
        placed: &mut Vec<PositionedBox>,
    ) -> Vec<&'c GridChild> {
        let mut still_pending = Vec::new();
        for child in pending {
            if child.style.is_auto_positioned_row() {
                still_pending.push(child);
                continue;
            }

            let row = resolve_axis(
                &child.style.row_start,
                &child.style.row_end,
                self.grid.row_count(),
            );
            self.grid.maybe_add_row(row.start + row.span);

            let column_span = auto_axis_span(&child.style.column_start);
            self.grid.maybe_add_column(column_span);

            // First column where the whole span rectangle is free.
            let mut column_start = None;
            for column in 0..self.grid.column_count() {
                if column + column_span <= self.grid.column_count()
                    && self.grid.is_rect_free(
                        column,
                        column + column_span,
                        row.start,
                        row.start + row.span,
                    )
                {
                    column_start = Some(column);
                    break;
                }
            }
            // None fit: extend the grid by exactly the span at the end.
            let column_start = column_start.unwrap_or_else(|| {
                let at_end = self.grid.column_count();
                self.grid.maybe_add_column(at_end + column_span);
                at_end
            });

            self.grid.set_occupied_rect(
                column_start,
                column_start + column_span,
                row.start,
                row.start + row.span,
            );

            trace!(
                id = child.id.0,
                row = row.start,
                column = column_start,
                column_span,
                "placed row-locked item"
            );
            placed.push(PositionedBox {
                id: child.id,
                row: row.start,
                row_span: row.span,
                column: column_start,
                column_span,
                computed_height: 0.0,
            });
        }
        still_pending
    }

    /// Phase 3: remaining items with a definite column. The cursor moves
    /// to the item's column (advancing a row when the column regresses)
    /// and then walks down until the item's rectangle is free.
    fn place_column_locked_items<'c>(
        &mut self,
        pending: Vec<&'c GridChild>,
        placed: &mut Vec<PositionedBox>,
    ) -> Vec<&'c GridChild> {
        let mut still_pending = Vec::new();
        for child in pending {
            if child.style.is_auto_positioned_column() {
                still_pending.push(child);
                continue;
            }

            let column = resolve_axis(
                &child.style.column_start,
                &child.style.column_end,
                self.grid.column_count(),
            );
            let row_span = auto_axis_span(&child.style.row_start);

            if column.start < self.cursor_column {
                self.cursor_row += 1;
            }
            self.cursor_column = column.start;

            self.grid.maybe_add_column(column.start + column.span);
            self.grid.maybe_add_row(self.cursor_row + row_span);
            while !self.grid.is_rect_free(
                column.start,
                column.start + column.span,
                self.cursor_row,
                self.cursor_row + row_span,
            ) {
                self.cursor_row += 1;
                self.grid.maybe_add_row(self.cursor_row + row_span);
            }

            self.grid.set_occupied_rect(
                column.start,
                column.start + column.span,
                self.cursor_row,
                self.cursor_row + row_span,
            );

            trace!(
                id = child.id.0,
                row = self.cursor_row,
                column = column.start,
                "placed column-locked item at cursor"
            );
            placed.push(PositionedBox {
                id: child.id,
                row: self.cursor_row,
                row_span,
                column: column.start,
                column_span: column.span,
                computed_height: 0.0,
            });
        }
        still_pending
    }

    /// Phase 4: fully automatic items. Row-major sweep from the cursor
    /// for the first position where the item's rectangle fits within the
    /// current column count; with no fit, a fresh row is appended and
    /// the item placed at its start.
    fn place_auto_items(&mut self, pending: Vec<&GridChild>, placed: &mut Vec<PositionedBox>) {
        for child in pending {
            let column_span = auto_axis_span(&child.style.column_start);
            let row_span = auto_axis_span(&child.style.row_start);
            self.grid.maybe_add_column(column_span);

            let mut found = None;
            'scan: for row in self.cursor_row..self.grid.row_count() {
                let first_column = if row == self.cursor_row {
                    self.cursor_column
                } else {
                    0
                };
                for column in first_column..self.grid.column_count() {
                    if column + column_span <= self.grid.column_count()
                        && self
                            .grid
                            .is_rect_free(column, column + column_span, row, row + row_span)
                    {
                        found = Some((column, row));
                        break 'scan;
                    }
                }
            }

            let (column_start, row_start) = found.unwrap_or_else(|| {
                // Whole grid scanned with no fit: append one new row.
                let new_row = self.grid.row_count();
                self.grid.maybe_add_row(new_row + 1);
                (0, new_row)
            });

            self.grid.maybe_add_row(row_start + row_span);
            self.grid.set_occupied_rect(
                column_start,
                column_start + column_span,
                row_start,
                row_start + row_span,
            );

            // Sparse packing: the cursor moves just past the placed item,
            // earlier gaps are never backfilled.
            self.cursor_row = row_start;
            self.cursor_column = column_start + column_span;

            trace!(
                id = child.id.0,
                row = row_start,
                column = column_start,
                column_span,
                row_span,
                "auto-placed item"
            );
            placed.push(PositionedBox {
                id: child.id,
                row: row_start,
                row_span,
                column: column_start,
                column_span,
                computed_height: 0.0,
            });
        }
    }
}
