//! Grid formatting context.
//!
//! Orchestrates one full grid layout pass: auto-repeat expansion,
//! placement, the measurement pass, column-then-row track sizing and
//! the final geometry write-back. One context lays out one container
//! and is then discarded; the only state that survives is what gets
//! written into the externally owned [`LayoutState`].

use lattice_style::{GridContainerStyle, RepeatMode, TrackList};
use tracing::debug;

use crate::occupation::OccupationGrid;
use crate::placement::{PlacementEngine, PositionedBox};
use crate::track_sizing::{
    collapse_unoccupied_tracks, distribute_space_to_spanned_tracks, expand_flexible_tracks,
    initialize_track_sizes, maximize_tracks, resolve_intrinsic_column_sizes,
    resolve_intrinsic_row_sizes, stretch_auto_tracks, GridTrack,
};
use crate::{
    AvailableSpace, BoxId, GridChild, LayoutDelegate, LayoutError, LayoutMode, LayoutState, Offset,
};

/// Number of template repetitions for one axis. Auto-fill and auto-fit
/// divide the available space by the template's definite size; the
/// count is always at least 1, including when the template has no
/// definite size at all.
fn repeat_count(template: &TrackList, available_size: Option<f32>) -> usize {
    match template.repeat {
        RepeatMode::None => 1,
        RepeatMode::Count(count) => count.max(1) as usize,
        RepeatMode::AutoFill | RepeatMode::AutoFit => {
            let available = available_size.unwrap_or(0.0);
            let definite_sum: f32 = template
                .tracks
                .iter()
                .map(|t| t.definite_size_for_repeat(available))
                .sum();
            if definite_sum <= 0.0 {
                1
            } else {
                ((available / definite_sum).floor() as usize).max(1)
            }
        }
    }
}

/// Build one axis's track array: the template replicated across its
/// repeat count, padded with implicit `auto` tracks up to the
/// occupation grid's final count for the axis.
fn build_tracks(template: &TrackList, repetitions: usize, needed: usize) -> Vec<GridTrack> {
    let mut tracks = Vec::with_capacity(needed.max(repetitions * template.track_count()));
    for _ in 0..repetitions {
        for definition in &template.tracks {
            tracks.push(GridTrack::from_definition(definition));
        }
    }
    while tracks.len() < needed {
        tracks.push(GridTrack::implicit());
    }
    tracks
}

fn sum_base_sizes(tracks: &[GridTrack]) -> f32 {
    tracks.iter().map(|t| t.base_size).sum()
}

/// The grid formatting context. Borrows the layout-state map and the
/// measurement delegate for one [`run`](GridFormattingContext::run).
pub struct GridFormattingContext<'s, 'd> {
    state: &'s mut LayoutState,
    delegate: &'d mut dyn LayoutDelegate,
    automatic_content_height: f32,
}

impl<'s, 'd> GridFormattingContext<'s, 'd> {
    pub fn new(state: &'s mut LayoutState, delegate: &'d mut dyn LayoutDelegate) -> Self {
        Self {
            state,
            delegate,
            automatic_content_height: 0.0,
        }
    }

    /// Lay out one grid container: place `children` into tracks, size
    /// the tracks, and write each child's final geometry into the
    /// layout state.
    ///
    /// The container's content size comes from its layout-state record
    /// when one exists (the tree walker resolves it before descending);
    /// `available_space` is the fallback for a container laid out cold.
    pub fn run(
        &mut self,
        container: BoxId,
        style: &GridContainerStyle,
        children: &[GridChild],
        mode: LayoutMode,
        available_space: AvailableSpace,
    ) -> Result<(), LayoutError> {
        let (content_width, definite_height) = match self.state.get(container) {
            Some(record) => (
                record.content_width,
                if record.has_definite_height {
                    Some(record.content_height)
                } else {
                    None
                },
            ),
            None => (available_space.width, available_space.height),
        };

        let column_repetitions = repeat_count(&style.template_columns, Some(content_width));
        let row_repetitions = repeat_count(&style.template_rows, definite_height);
        let explicit_columns = column_repetitions * style.template_columns.track_count();
        let explicit_rows = row_repetitions * style.template_rows.track_count();
        debug!(
            container = container.0,
            explicit_columns,
            explicit_rows,
            children = children.len(),
            "grid layout pass"
        );

        let mut occupation = OccupationGrid::new(explicit_columns, explicit_rows);
        let mut positioned = PlacementEngine::new(&mut occupation).place_items(children);

        self.measure_items(&mut positioned, content_width, mode)?;

        let mut column_tracks = build_tracks(
            &style.template_columns,
            column_repetitions,
            occupation.column_count(),
        );
        self.size_columns(&mut column_tracks, &positioned, style, &occupation, content_width);

        let mut row_tracks = build_tracks(
            &style.template_rows,
            row_repetitions,
            occupation.row_count(),
        );
        Self::size_rows(&mut row_tracks, &positioned, definite_height);

        self.place_geometry(&positioned, &column_tracks, &row_tracks, mode)?;

        self.automatic_content_height = sum_base_sizes(&row_tracks);
        debug!(
            container = container.0,
            columns = column_tracks.len(),
            rows = row_tracks.len(),
            automatic_content_height = self.automatic_content_height,
            "grid layout complete"
        );
        Ok(())
    }

    /// The container's content-derived height: the sum of all row
    /// sizes. Meaningful after [`run`](GridFormattingContext::run);
    /// the parent context consumes it when the container's own height
    /// is auto.
    pub fn automatic_content_height(&self) -> f32 {
        self.automatic_content_height
    }

    /// Measurement pass: lay out each item's contents against the
    /// container width so auto rows can size to content. The recorded
    /// height only ever grows; a pre-resolved height from an earlier
    /// pass is kept when it is larger.
    fn measure_items(
        &mut self,
        positioned: &mut [PositionedBox],
        content_width: f32,
        mode: LayoutMode,
    ) -> Result<(), LayoutError> {
        for item in positioned.iter_mut() {
            item.computed_height = self
                .state
                .get(item.id)
                .map(|record| record.content_height)
                .unwrap_or(0.0);
            self.delegate.layout_inside(
                item.id,
                mode,
                AvailableSpace {
                    width: content_width,
                    height: None,
                },
                self.state,
            )?;
            let measured = self
                .state
                .get(item.id)
                .map(|record| record.content_height)
                .unwrap_or(0.0);
            if measured > item.computed_height {
                item.computed_height = measured;
            }
        }
        Ok(())
    }

    /// Column sizing: the full seven-step run. The inline axis is
    /// always definite, so every step applies.
    fn size_columns(
        &mut self,
        tracks: &mut [GridTrack],
        positioned: &[PositionedBox],
        style: &GridContainerStyle,
        occupation: &OccupationGrid,
        content_width: f32,
    ) {
        initialize_track_sizes(tracks, content_width);
        resolve_intrinsic_column_sizes(tracks, positioned, self.delegate);
        if style.template_columns.is_auto_fit() {
            collapse_unoccupied_tracks(tracks, |index| occupation.column_has_occupied_cell(index));
        }
        let free_space = (content_width - sum_base_sizes(tracks)).max(0.0);
        distribute_space_to_spanned_tracks(tracks, free_space);
        maximize_tracks(tracks, Some(content_width));
        expand_flexible_tracks(tracks, Some(content_width));
        stretch_auto_tracks(tracks, Some(content_width));
    }

    /// Row sizing: the block axis may be indefinite, in which case
    /// maximize snaps finite growth limits and the space-driven steps
    /// are skipped. Rows are sized after columns so content heights
    /// reflect final column widths.
    fn size_rows(tracks: &mut [GridTrack], positioned: &[PositionedBox], definite_height: Option<f32>) {
        initialize_track_sizes(tracks, definite_height.unwrap_or(0.0));
        resolve_intrinsic_row_sizes(tracks, positioned);
        maximize_tracks(tracks, definite_height);
        expand_flexible_tracks(tracks, definite_height);
        stretch_auto_tracks(tracks, definite_height);
    }

    /// Convert track boundaries into absolute offsets, write each
    /// item's geometry into the layout state and lay its contents out
    /// into the resolved rectangle.
    fn place_geometry(
        &mut self,
        positioned: &[PositionedBox],
        column_tracks: &[GridTrack],
        row_tracks: &[GridTrack],
        mode: LayoutMode,
    ) -> Result<(), LayoutError> {
        for item in positioned {
            // Spans never reach past the final track counts.
            let column = item.column.min(column_tracks.len() - 1);
            let column_span = item.column_span.min(column_tracks.len() - column);
            let row = item.row.min(row_tracks.len() - 1);
            let row_span = item.row_span.min(row_tracks.len() - row);

            let x = sum_base_sizes(&column_tracks[..column]);
            let width = sum_base_sizes(&column_tracks[column..column + column_span]);
            let y = sum_base_sizes(&row_tracks[..row]);
            let height = sum_base_sizes(&row_tracks[row..row + row_span]);

            let record = self.state.get_mutable(item.id);
            record.content_width = width;
            record.content_height = height;
            record.has_definite_height = true;
            record.offset = Offset { x, y };

            self.delegate.layout_inside(
                item.id,
                mode,
                AvailableSpace {
                    width,
                    height: Some(height),
                },
                self.state,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_style::{GridItemStyle, GridTrackPlacement, TrackDefinition};
    use std::collections::HashMap;

    /// Delegate with canned measurements: a min-content width per box
    /// and a content height that `layout_inside` writes into the state,
    /// standing in for a real child layout.
    #[derive(Default)]
    struct MockDelegate {
        min_widths: HashMap<usize, f32>,
        content_heights: HashMap<usize, f32>,
        layout_calls: usize,
    }

    impl LayoutDelegate for MockDelegate {
        fn min_content_width(&mut self, id: BoxId) -> f32 {
            self.min_widths.get(&id.0).copied().unwrap_or(0.0)
        }

        fn layout_inside(
            &mut self,
            id: BoxId,
            _mode: LayoutMode,
            _available_space: AvailableSpace,
            state: &mut LayoutState,
        ) -> Result<(), LayoutError> {
            self.layout_calls += 1;
            if let Some(height) = self.content_heights.get(&id.0) {
                state.get_mutable(id).content_height = *height;
            }
            Ok(())
        }
    }

    fn seed_container(state: &mut LayoutState, id: BoxId, width: f32, height: Option<f32>) {
        let record = state.get_mutable(id);
        record.content_width = width;
        if let Some(height) = height {
            record.content_height = height;
            record.has_definite_height = true;
        }
    }

    fn auto_children(ids: &[usize]) -> Vec<GridChild> {
        ids.iter()
            .map(|&id| GridChild::new(BoxId(id), GridItemStyle::auto()))
            .collect()
    }

    fn columns(defs: Vec<TrackDefinition>) -> GridContainerStyle {
        GridContainerStyle::new(TrackList::from_tracks(defs), TrackList::none())
    }

    #[test]
    fn test_fixed_flex_fixed_columns() {
        // 100px 1fr 100px at 500px wide.
        let mut state = LayoutState::new();
        let mut delegate = MockDelegate::default();
        seed_container(&mut state, BoxId(0), 500.0, None);
        let style = columns(vec![
            TrackDefinition::fixed(100.0),
            TrackDefinition::fr(1.0),
            TrackDefinition::fixed(100.0),
        ]);
        let children = auto_children(&[1, 2, 3]);

        let mut context = GridFormattingContext::new(&mut state, &mut delegate);
        context
            .run(
                BoxId(0),
                &style,
                &children,
                LayoutMode::Normal,
                AvailableSpace::default(),
            )
            .unwrap();

        let widths: Vec<f32> = (1..=3)
            .map(|id| state.get(BoxId(id)).unwrap().content_width)
            .collect();
        let xs: Vec<f32> = (1..=3)
            .map(|id| state.get(BoxId(id)).unwrap().offset.x)
            .collect();
        assert!((widths[0] - 100.0).abs() < 0.1);
        assert!((widths[1] - 300.0).abs() < 0.1);
        assert!((widths[2] - 100.0).abs() < 0.1);
        assert!((xs[0] - 0.0).abs() < 0.1);
        assert!((xs[1] - 100.0).abs() < 0.1);
        assert!((xs[2] - 400.0).abs() < 0.1);
    }

    #[test]
    fn test_explicitly_placed_item_geometry() {
        // grid-column: 1 / 3 over 3 equal 100px columns.
        let mut state = LayoutState::new();
        let mut delegate = MockDelegate::default();
        seed_container(&mut state, BoxId(0), 300.0, None);
        let style = columns(vec![
            TrackDefinition::fixed(100.0),
            TrackDefinition::fixed(100.0),
            TrackDefinition::fixed(100.0),
        ]);
        let children = vec![GridChild::new(
            BoxId(1),
            GridItemStyle {
                column_start: GridTrackPlacement::line(1),
                column_end: GridTrackPlacement::line(3),
                ..GridItemStyle::auto()
            },
        )];

        let mut context = GridFormattingContext::new(&mut state, &mut delegate);
        context
            .run(
                BoxId(0),
                &style,
                &children,
                LayoutMode::Normal,
                AvailableSpace::default(),
            )
            .unwrap();

        let record = state.get(BoxId(1)).unwrap();
        assert!((record.content_width - 200.0).abs() < 0.1);
        assert!((record.offset.x - 0.0).abs() < 0.1);
    }

    #[test]
    fn test_auto_fill_repeat_count() {
        // repeat(auto-fill, 50px) at 220px yields 4 columns.
        let mut state = LayoutState::new();
        let mut delegate = MockDelegate::default();
        seed_container(&mut state, BoxId(0), 220.0, None);
        let style = GridContainerStyle::new(
            TrackList::repeated(vec![TrackDefinition::fixed(50.0)], RepeatMode::AutoFill),
            TrackList::none(),
        );
        let children = auto_children(&[1, 2, 3, 4, 5]);

        let mut context = GridFormattingContext::new(&mut state, &mut delegate);
        context
            .run(
                BoxId(0),
                &style,
                &children,
                LayoutMode::Normal,
                AvailableSpace::default(),
            )
            .unwrap();

        // Four items fill the first row; the fifth wraps.
        for id in 1..=4 {
            let record = state.get(BoxId(id)).unwrap();
            assert!((record.offset.x - 50.0 * (id - 1) as f32).abs() < 0.1);
            assert!((record.offset.y - 0.0).abs() < 0.1);
        }
        let fifth = state.get(BoxId(5)).unwrap();
        assert!((fifth.offset.x - 0.0).abs() < 0.1);
    }

    #[test]
    fn test_auto_fill_keeps_empty_trailing_tracks() {
        let mut state = LayoutState::new();
        let mut delegate = MockDelegate::default();
        seed_container(&mut state, BoxId(0), 220.0, None);
        let style = GridContainerStyle::new(
            TrackList::repeated(vec![TrackDefinition::fixed(50.0)], RepeatMode::AutoFill),
            TrackList::none(),
        );
        let children = auto_children(&[1, 2]);

        let mut context = GridFormattingContext::new(&mut state, &mut delegate);
        context
            .run(
                BoxId(0),
                &style,
                &children,
                LayoutMode::Normal,
                AvailableSpace::default(),
            )
            .unwrap();

        // Items keep their 50px tracks; the empty tracks still exist,
        // so widths are unaffected by occupancy.
        assert!((state.get(BoxId(1)).unwrap().content_width - 50.0).abs() < 0.1);
        assert!((state.get(BoxId(2)).unwrap().offset.x - 50.0).abs() < 0.1);
    }

    #[test]
    fn test_auto_fit_collapses_empty_tracks() {
        let mut state = LayoutState::new();
        let mut delegate = MockDelegate::default();
        seed_container(&mut state, BoxId(0), 220.0, None);
        let style = GridContainerStyle::new(
            TrackList::repeated(vec![TrackDefinition::fixed(50.0)], RepeatMode::AutoFit),
            TrackList::none(),
        );
        let children = auto_children(&[1, 2]);

        let mut context = GridFormattingContext::new(&mut state, &mut delegate);
        context
            .run(
                BoxId(0),
                &style,
                &children,
                LayoutMode::Normal,
                AvailableSpace::default(),
            )
            .unwrap();

        // Occupied tracks keep their size; collapsed ones are zero, so
        // the items sit flush at the start.
        assert!((state.get(BoxId(1)).unwrap().content_width - 50.0).abs() < 0.1);
        assert!((state.get(BoxId(1)).unwrap().offset.x - 0.0).abs() < 0.1);
        assert!((state.get(BoxId(2)).unwrap().offset.x - 50.0).abs() < 0.1);
    }

    #[test]
    fn test_negative_row_end_spans_all_explicit_rows() {
        // grid-row: 1 / -1 over four 30px rows.
        let mut state = LayoutState::new();
        let mut delegate = MockDelegate::default();
        seed_container(&mut state, BoxId(0), 100.0, Some(120.0));
        let style = GridContainerStyle::new(
            TrackList::from_tracks(vec![TrackDefinition::fixed(100.0)]),
            TrackList::from_tracks(vec![
                TrackDefinition::fixed(30.0),
                TrackDefinition::fixed(30.0),
                TrackDefinition::fixed(30.0),
                TrackDefinition::fixed(30.0),
            ]),
        );
        let children = vec![GridChild::new(
            BoxId(1),
            GridItemStyle {
                row_start: GridTrackPlacement::line(1),
                row_end: GridTrackPlacement::line(-1),
                column_start: GridTrackPlacement::line(1),
                column_end: GridTrackPlacement::line(2),
                ..GridItemStyle::auto()
            },
        )];

        let mut context = GridFormattingContext::new(&mut state, &mut delegate);
        context
            .run(
                BoxId(0),
                &style,
                &children,
                LayoutMode::Normal,
                AvailableSpace::default(),
            )
            .unwrap();

        let record = state.get(BoxId(1)).unwrap();
        assert!((record.content_height - 120.0).abs() < 0.1);
        assert!((record.offset.y - 0.0).abs() < 0.1);
    }

    #[test]
    fn test_auto_rows_size_to_content() {
        let mut state = LayoutState::new();
        let mut delegate = MockDelegate {
            content_heights: HashMap::from([(1, 40.0), (2, 25.0)]),
            ..MockDelegate::default()
        };
        seed_container(&mut state, BoxId(0), 200.0, None);
        let style = GridContainerStyle::new(
            TrackList::from_tracks(vec![TrackDefinition::fixed(200.0)]),
            TrackList::none(),
        );
        let children = auto_children(&[1, 2]);

        let mut context = GridFormattingContext::new(&mut state, &mut delegate);
        context
            .run(
                BoxId(0),
                &style,
                &children,
                LayoutMode::Normal,
                AvailableSpace::default(),
            )
            .unwrap();

        let automatic_height = context.automatic_content_height();
        assert!((automatic_height - 65.0).abs() < 0.1);
        // Single column: the second item starts below the first row.
        assert!((state.get(BoxId(2)).unwrap().offset.y - 40.0).abs() < 0.1);
    }

    #[test]
    fn test_intrinsic_column_takes_min_content_width() {
        let mut state = LayoutState::new();
        let mut delegate = MockDelegate {
            min_widths: HashMap::from([(1, 80.0)]),
            ..MockDelegate::default()
        };
        seed_container(&mut state, BoxId(0), 300.0, None);
        // min-content column next to a fixed one.
        let style = columns(vec![
            TrackDefinition::minmax(
                lattice_style::TrackSizingFunction::MinContent,
                lattice_style::TrackSizingFunction::MinContent,
            ),
            TrackDefinition::fixed(100.0),
        ]);
        let children = auto_children(&[1, 2]);

        let mut context = GridFormattingContext::new(&mut state, &mut delegate);
        context
            .run(
                BoxId(0),
                &style,
                &children,
                LayoutMode::Normal,
                AvailableSpace::default(),
            )
            .unwrap();

        assert!((state.get(BoxId(1)).unwrap().content_width - 80.0).abs() < 0.1);
        assert!((state.get(BoxId(2)).unwrap().offset.x - 80.0).abs() < 0.1);
    }

    #[test]
    fn test_run_is_idempotent() {
        let mut state = LayoutState::new();
        let mut delegate = MockDelegate::default();
        seed_container(&mut state, BoxId(0), 500.0, None);
        let style = columns(vec![
            TrackDefinition::fixed(100.0),
            TrackDefinition::fr(1.0),
        ]);
        let children = auto_children(&[1, 2]);

        let mut context = GridFormattingContext::new(&mut state, &mut delegate);
        context
            .run(
                BoxId(0),
                &style,
                &children,
                LayoutMode::Normal,
                AvailableSpace::default(),
            )
            .unwrap();
        let first: Vec<(f32, f32)> = (1..=2)
            .map(|id| {
                let r = state.get(BoxId(id)).unwrap();
                (r.content_width, r.offset.x)
            })
            .collect();

        let mut context = GridFormattingContext::new(&mut state, &mut delegate);
        context
            .run(
                BoxId(0),
                &style,
                &children,
                LayoutMode::Normal,
                AvailableSpace::default(),
            )
            .unwrap();
        let second: Vec<(f32, f32)> = (1..=2)
            .map(|id| {
                let r = state.get(BoxId(id)).unwrap();
                (r.content_width, r.offset.x)
            })
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_layout_inside_called_per_item_per_pass() {
        // One measurement call plus one final call per item.
        let mut state = LayoutState::new();
        let mut delegate = MockDelegate::default();
        seed_container(&mut state, BoxId(0), 100.0, None);
        let style = columns(vec![TrackDefinition::fixed(100.0)]);
        let children = auto_children(&[1, 2, 3]);

        let mut context = GridFormattingContext::new(&mut state, &mut delegate);
        context
            .run(
                BoxId(0),
                &style,
                &children,
                LayoutMode::Normal,
                AvailableSpace::default(),
            )
            .unwrap();
        assert_eq!(delegate.layout_calls, 6);
    }

    #[test]
    fn test_child_layout_error_propagates() {
        struct FailingDelegate;
        impl LayoutDelegate for FailingDelegate {
            fn min_content_width(&mut self, _id: BoxId) -> f32 {
                0.0
            }
            fn layout_inside(
                &mut self,
                id: BoxId,
                _mode: LayoutMode,
                _available_space: AvailableSpace,
                _state: &mut LayoutState,
            ) -> Result<(), LayoutError> {
                Err(LayoutError::ChildLayoutFailed(id, "no box tree".into()))
            }
        }

        let mut state = LayoutState::new();
        let mut delegate = FailingDelegate;
        seed_container(&mut state, BoxId(0), 100.0, None);
        let style = columns(vec![TrackDefinition::fixed(100.0)]);
        let children = auto_children(&[1]);

        let mut context = GridFormattingContext::new(&mut state, &mut delegate);
        let result = context.run(
            BoxId(0),
            &style,
            &children,
            LayoutMode::Normal,
            AvailableSpace::default(),
        );
        assert!(matches!(result, Err(LayoutError::ChildLayoutFailed(_, _))));
    }

    #[test]
    fn test_fallback_to_available_space_without_container_record() {
        let mut state = LayoutState::new();
        let mut delegate = MockDelegate::default();
        let style = columns(vec![TrackDefinition::fr(1.0)]);
        let children = auto_children(&[1]);

        let mut context = GridFormattingContext::new(&mut state, &mut delegate);
        context
            .run(
                BoxId(0),
                &style,
                &children,
                LayoutMode::Normal,
                AvailableSpace {
                    width: 240.0,
                    height: None,
                },
            )
            .unwrap();

        assert!((state.get(BoxId(1)).unwrap().content_width - 240.0).abs() < 0.1);
    }
}
