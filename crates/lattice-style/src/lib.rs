//! # Lattice Style
//!
//! Grid-related computed style value types for the Lattice layout engine.
//!
//! These are flat, pre-extracted snapshots of the grid properties a style
//! cascade would compute: track templates for the container and placement
//! lines for each item. The layout engine consumes them by value and never
//! touches a live style object graph.

// ==================== Track Sizing ====================

/// A single track sizing function (one side of a minmax pair).
#[derive(Debug, Clone, PartialEq)]
pub enum TrackSizingFunction {
    /// Fixed length in pixels.
    Px(f32),
    /// Percentage of the container's content box (0-100).
    Percent(f32),
    /// Fractional unit (flexible).
    Fr(f32),
    /// Auto sizing.
    Auto,
    /// Size based on content minimum.
    MinContent,
    /// Size based on content maximum.
    MaxContent,
}

impl Default for TrackSizingFunction {
    fn default() -> Self {
        TrackSizingFunction::Auto
    }
}

impl TrackSizingFunction {
    /// Whether this sizing function resolves to a definite length given a
    /// definite containing size.
    pub fn is_definite(&self) -> bool {
        matches!(
            self,
            TrackSizingFunction::Px(_) | TrackSizingFunction::Percent(_)
        )
    }

    /// Whether this is an intrinsic (content-based) sizing function.
    pub fn is_intrinsic(&self) -> bool {
        matches!(
            self,
            TrackSizingFunction::Auto
                | TrackSizingFunction::MinContent
                | TrackSizingFunction::MaxContent
        )
    }

    /// Whether this is a flexible (`fr`) sizing function.
    pub fn is_flexible(&self) -> bool {
        matches!(self, TrackSizingFunction::Fr(_))
    }

    /// Resolve a definite sizing function against a containing size.
    ///
    /// Returns `None` for intrinsic and flexible functions.
    pub fn resolve_definite(&self, containing_size: f32) -> Option<f32> {
        match self {
            TrackSizingFunction::Px(px) => Some(*px),
            TrackSizingFunction::Percent(p) => Some(containing_size * p / 100.0),
            _ => None,
        }
    }
}

/// A track definition: the min and max sizing functions for one track.
///
/// A single-value template entry such as `100px` or `1fr` sets both sides
/// to the same function; `minmax(a, b)` sets them independently.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackDefinition {
    /// Minimum track sizing function.
    pub min: TrackSizingFunction,
    /// Maximum track sizing function.
    pub max: TrackSizingFunction,
}

impl TrackDefinition {
    /// A fixed pixel track.
    pub fn fixed(px: f32) -> Self {
        Self {
            min: TrackSizingFunction::Px(px),
            max: TrackSizingFunction::Px(px),
        }
    }

    /// A percentage track (0-100).
    pub fn percent(p: f32) -> Self {
        Self {
            min: TrackSizingFunction::Percent(p),
            max: TrackSizingFunction::Percent(p),
        }
    }

    /// A flexible track.
    pub fn fr(factor: f32) -> Self {
        Self {
            min: TrackSizingFunction::Fr(factor),
            max: TrackSizingFunction::Fr(factor),
        }
    }

    /// An auto track.
    pub fn auto() -> Self {
        Self {
            min: TrackSizingFunction::Auto,
            max: TrackSizingFunction::Auto,
        }
    }

    /// A minmax constraint.
    pub fn minmax(min: TrackSizingFunction, max: TrackSizingFunction) -> Self {
        Self { min, max }
    }

    /// The definite size this track contributes when counting auto-repeat
    /// repetitions: the definite max function if the min is not definite,
    /// the definite min if the max is not, and the smaller of the two when
    /// both are definite.
    pub fn definite_size_for_repeat(&self, containing_size: f32) -> f32 {
        match (
            self.min.resolve_definite(containing_size),
            self.max.resolve_definite(containing_size),
        ) {
            (Some(min), Some(max)) => min.min(max),
            (Some(min), None) => min,
            (None, Some(max)) => max,
            (None, None) => 0.0,
        }
    }
}

impl Default for TrackDefinition {
    fn default() -> Self {
        Self::auto()
    }
}

/// Repeat mode for a track template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    /// No repetition; the template is used as-is.
    #[default]
    None,
    /// Repeat the whole template a fixed number of times.
    Count(u32),
    /// Auto-fill: as many repetitions as fit the container.
    AutoFill,
    /// Auto-fit: as many as fit, collapsing empty tracks after placement.
    AutoFit,
}

/// An explicit track template (grid-template-columns/rows).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackList {
    /// Track definitions for one repetition of the template.
    pub tracks: Vec<TrackDefinition>,
    /// How the template repeats.
    pub repeat: RepeatMode,
}

impl TrackList {
    /// Create an empty template (no explicit tracks).
    pub fn none() -> Self {
        Self::default()
    }

    /// Create a non-repeating template from track definitions.
    pub fn from_tracks(tracks: Vec<TrackDefinition>) -> Self {
        Self {
            tracks,
            repeat: RepeatMode::None,
        }
    }

    /// Create a repeating template.
    pub fn repeated(tracks: Vec<TrackDefinition>, repeat: RepeatMode) -> Self {
        Self { tracks, repeat }
    }

    /// Number of tracks in one repetition of the template.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the template uses any repeat notation.
    pub fn is_repeat(&self) -> bool {
        !matches!(self.repeat, RepeatMode::None)
    }

    /// Whether the template is an auto-fill repetition.
    pub fn is_auto_fill(&self) -> bool {
        matches!(self.repeat, RepeatMode::AutoFill)
    }

    /// Whether the template is an auto-fit repetition.
    pub fn is_auto_fit(&self) -> bool {
        matches!(self.repeat, RepeatMode::AutoFit)
    }

    /// Fixed repeat count, when one was specified.
    pub fn repeat_count(&self) -> Option<u32> {
        match self.repeat {
            RepeatMode::Count(n) => Some(n),
            _ => None,
        }
    }
}

// ==================== Item Placement ====================

/// One grid-placement property value (grid-row-start and friends).
#[derive(Debug, Clone, PartialEq)]
pub enum GridTrackPlacement {
    /// Auto placement.
    Auto,
    /// A 1-based grid line. Negative lines count backward from the end of
    /// the explicit grid. The optional name is carried from the cascade
    /// but named-line lookup is not implemented.
    Line { line: i32, name: Option<String> },
    /// Span a number of tracks.
    Span(i32),
}

impl Default for GridTrackPlacement {
    fn default() -> Self {
        GridTrackPlacement::Auto
    }
}

impl GridTrackPlacement {
    /// A plain numeric line.
    pub fn line(line: i32) -> Self {
        GridTrackPlacement::Line { line, name: None }
    }

    /// A span of `count` tracks.
    pub fn span(count: i32) -> Self {
        GridTrackPlacement::Span(count)
    }

    /// Whether this placement contributes nothing (auto).
    pub fn is_auto(&self) -> bool {
        matches!(self, GridTrackPlacement::Auto)
    }

    /// Whether this placement names a concrete line.
    pub fn is_line(&self) -> bool {
        matches!(self, GridTrackPlacement::Line { .. })
    }

    /// Whether this placement is a span.
    pub fn is_span(&self) -> bool {
        matches!(self, GridTrackPlacement::Span(_))
    }

    /// The raw line number, if this is a line placement.
    pub fn line_number(&self) -> Option<i32> {
        match self {
            GridTrackPlacement::Line { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// The span count, if this is a span placement.
    pub fn span_count(&self) -> Option<i32> {
        match self {
            GridTrackPlacement::Span(count) => Some(*count),
            _ => None,
        }
    }
}

/// Whether an axis is auto-positioned: neither edge contributes a line.
pub fn is_auto_positioned_axis(start: &GridTrackPlacement, end: &GridTrackPlacement) -> bool {
    !start.is_line() && !end.is_line()
}

/// Per-item grid placement snapshot (all four placement properties).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridItemStyle {
    /// Row start line.
    pub row_start: GridTrackPlacement,
    /// Row end line.
    pub row_end: GridTrackPlacement,
    /// Column start line.
    pub column_start: GridTrackPlacement,
    /// Column end line.
    pub column_end: GridTrackPlacement,
}

impl GridItemStyle {
    /// Fully automatic placement.
    pub fn auto() -> Self {
        Self::default()
    }

    /// Placement from explicit 1-based lines on both axes.
    pub fn from_lines(row_start: i32, row_end: i32, column_start: i32, column_end: i32) -> Self {
        Self {
            row_start: GridTrackPlacement::line(row_start),
            row_end: GridTrackPlacement::line(row_end),
            column_start: GridTrackPlacement::line(column_start),
            column_end: GridTrackPlacement::line(column_end),
        }
    }

    /// Whether the row axis needs auto-placement.
    pub fn is_auto_positioned_row(&self) -> bool {
        is_auto_positioned_axis(&self.row_start, &self.row_end)
    }

    /// Whether the column axis needs auto-placement.
    pub fn is_auto_positioned_column(&self) -> bool {
        is_auto_positioned_axis(&self.column_start, &self.column_end)
    }
}

/// Per-container grid style snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridContainerStyle {
    /// Explicit column template.
    pub template_columns: TrackList,
    /// Explicit row template.
    pub template_rows: TrackList,
}

impl GridContainerStyle {
    /// Create a container style from column and row templates.
    pub fn new(template_columns: TrackList, template_rows: TrackList) -> Self {
        Self {
            template_columns,
            template_rows,
        }
    }
}
