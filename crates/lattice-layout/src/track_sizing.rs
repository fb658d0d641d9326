//! Grid track sizing.
//!
//! The track sizing algorithm
//! (<https://drafts.csswg.org/css-grid/#algo-track-sizing>) as free
//! functions over a mutable track slice, run once per axis. Column and
//! row arrays are built fresh for every container; nothing here
//! survives a layout pass.
//!
//! Base sizes grow monotonically within one pass. A growth limit of
//! `f32::INFINITY` means unbounded; after every step the invariant
//! `growth_limit == INFINITY || growth_limit >= base_size` holds.

use lattice_style::{TrackDefinition, TrackSizingFunction};
use tracing::debug;

use crate::placement::PositionedBox;
use crate::LayoutDelegate;

/// Distribution convergence threshold, in pixels.
const SIZING_EPSILON: f32 = 0.01;

/// One grid track during sizing: the sizing functions it was declared
/// with plus the algorithm's working state.
#[derive(Debug, Clone, PartialEq)]
pub struct GridTrack {
    /// Minimum track sizing function.
    pub min_sizing_function: TrackSizingFunction,
    /// Maximum track sizing function.
    pub max_sizing_function: TrackSizingFunction,
    /// Current resolved size; only grows within one pass.
    pub base_size: f32,
    /// Upper bound on growth; `f32::INFINITY` when unbounded.
    pub growth_limit: f32,
    /// Accumulated share during one distribution round.
    planned_increase: f32,
    /// Room this track can still absorb during one distribution round.
    space_to_distribute: f32,
}

impl GridTrack {
    /// A track from a template definition, before initialization.
    pub fn from_definition(definition: &TrackDefinition) -> Self {
        Self {
            min_sizing_function: definition.min.clone(),
            max_sizing_function: definition.max.clone(),
            base_size: 0.0,
            growth_limit: f32::INFINITY,
            planned_increase: 0.0,
            space_to_distribute: 0.0,
        }
    }

    /// An implicit `auto` track.
    pub fn implicit() -> Self {
        Self::from_definition(&TrackDefinition::auto())
    }

    /// Whether this track takes part in flexible expansion.
    /// Single-value `fr` templates set both sizing functions, so the
    /// min function is the discriminator.
    pub fn is_flexible(&self) -> bool {
        self.min_sizing_function.is_flexible()
    }

    /// Collapse an unoccupied auto-fit track to zero size. The sizing
    /// functions are overwritten so no later step can grow it again.
    fn collapse(&mut self) {
        self.min_sizing_function = TrackSizingFunction::Px(0.0);
        self.max_sizing_function = TrackSizingFunction::Px(0.0);
        self.base_size = 0.0;
        self.growth_limit = 0.0;
    }

    fn clamp_growth_limit(&mut self) {
        if self.growth_limit < self.base_size {
            self.growth_limit = self.base_size;
        }
    }
}

/// Step 1: set each track's base size from its definite min function
/// (0 otherwise) and its growth limit from its definite max function
/// (unbounded otherwise).
pub fn initialize_track_sizes(tracks: &mut [GridTrack], containing_size: f32) {
    for track in tracks.iter_mut() {
        track.base_size = track
            .min_sizing_function
            .resolve_definite(containing_size)
            .unwrap_or(0.0);
        track.growth_limit = track
            .max_sizing_function
            .resolve_definite(containing_size)
            .unwrap_or(f32::INFINITY);
        track.clamp_growth_limit();
        track.planned_increase = 0.0;
        track.space_to_distribute = 0.0;
    }
}

/// Whether a max sizing function bounds its track at a content size.
/// `Auto` is excluded: auto-maxed tracks keep an unbounded limit so
/// the maximize and stretch steps can grow them.
fn max_function_is_content_bounded(function: &TrackSizingFunction) -> bool {
    matches!(
        function,
        TrackSizingFunction::MinContent | TrackSizingFunction::MaxContent
    )
}

/// Step 2, inline axis: raise intrinsic column tracks to the largest
/// min-content contribution of the span-1 items they hold. Content-
/// bounded max functions also pin the growth limit to the contribution
/// so later steps cannot stretch the track past its content.
pub fn resolve_intrinsic_column_sizes(
    tracks: &mut [GridTrack],
    items: &[PositionedBox],
    delegate: &mut dyn LayoutDelegate,
) {
    for item in items {
        if item.column_span != 1 {
            continue;
        }
        let Some(track) = tracks.get_mut(item.column) else {
            continue;
        };
        let min_is_intrinsic = track.min_sizing_function.is_intrinsic();
        let max_is_bounded = max_function_is_content_bounded(&track.max_sizing_function);
        if !min_is_intrinsic && !max_is_bounded {
            continue;
        }
        let contribution = delegate.min_content_width(item.id);
        if min_is_intrinsic && contribution > track.base_size {
            track.base_size = contribution;
        }
        if max_is_bounded {
            track.growth_limit = if track.growth_limit.is_finite() {
                track.growth_limit.max(contribution)
            } else {
                contribution
            };
        }
        track.clamp_growth_limit();
    }
}

/// Step 2, block axis: raise intrinsic row tracks to the largest
/// content height of the span-1 items they hold. Heights come from the
/// measurement pass, so no delegate call is needed here.
pub fn resolve_intrinsic_row_sizes(tracks: &mut [GridTrack], items: &[PositionedBox]) {
    for item in items {
        if item.row_span != 1 {
            continue;
        }
        let Some(track) = tracks.get_mut(item.row) else {
            continue;
        };
        let min_is_intrinsic = track.min_sizing_function.is_intrinsic();
        let max_is_bounded = max_function_is_content_bounded(&track.max_sizing_function);
        if min_is_intrinsic && item.computed_height > track.base_size {
            track.base_size = item.computed_height;
        }
        if max_is_bounded {
            track.growth_limit = if track.growth_limit.is_finite() {
                track.growth_limit.max(item.computed_height)
            } else {
                item.computed_height
            };
        }
        track.clamp_growth_limit();
    }
}

/// Step 3: collapse auto-fit tracks that hold no item in any row.
///
/// `occupied` reports whether the track at an index holds at least one
/// item; collapsed tracks size to zero and are excluded from every
/// later step.
pub fn collapse_unoccupied_tracks<F>(tracks: &mut [GridTrack], occupied: F)
where
    F: Fn(usize) -> bool,
{
    let mut collapsed = 0usize;
    for (index, track) in tracks.iter_mut().enumerate() {
        if !occupied(index) {
            track.collapse();
            collapsed += 1;
        }
    }
    if collapsed > 0 {
        debug!(collapsed, "collapsed unoccupied auto-fit tracks");
    }
}

/// Step 4: grow tracks toward their growth limits out of the remaining
/// free space, equally and in rounds, freezing each track once it has
/// absorbed all the room below its limit.
///
/// Tracks with an unbounded growth limit have no room here; they are
/// grown by the maximize and flex steps instead.
pub fn distribute_space_to_spanned_tracks(tracks: &mut [GridTrack], free_space: f32) {
    for track in tracks.iter_mut() {
        let bounded_limit = if track.growth_limit.is_finite() {
            track.growth_limit
        } else {
            track.base_size
        };
        track.space_to_distribute = (bounded_limit - track.base_size).max(0.0);
        track.planned_increase = 0.0;
    }

    let mut remaining = free_space;
    while remaining > SIZING_EPSILON {
        let unfrozen = tracks
            .iter()
            .filter(|t| t.space_to_distribute - t.planned_increase > SIZING_EPSILON)
            .count();
        if unfrozen == 0 {
            break;
        }
        let share = remaining / unfrozen as f32;
        let mut distributed = 0.0;
        for track in tracks.iter_mut() {
            let room = track.space_to_distribute - track.planned_increase;
            if room > SIZING_EPSILON {
                let increase = share.min(room);
                track.planned_increase += increase;
                distributed += increase;
            }
        }
        if distributed <= SIZING_EPSILON {
            break;
        }
        remaining -= distributed;
    }

    for track in tracks.iter_mut() {
        track.base_size += track.planned_increase;
        track.planned_increase = 0.0;
        track.space_to_distribute = 0.0;
        track.clamp_growth_limit();
    }
}

/// Step 5: distribute the axis's free space equally across all
/// tracks, capping each at its growth limit, until the space is
/// exhausted or no track can grow.
///
/// `available_size` of `None` means the axis size is indefinite;
/// tracks with a finite growth limit then snap directly to it.
pub fn maximize_tracks(tracks: &mut [GridTrack], available_size: Option<f32>) {
    let Some(available_size) = available_size else {
        for track in tracks.iter_mut() {
            if track.growth_limit.is_finite() && track.base_size < track.growth_limit {
                track.base_size = track.growth_limit;
            }
        }
        return;
    };

    let used: f32 = tracks.iter().map(|t| t.base_size).sum();
    let mut remaining = (available_size - used).max(0.0);
    while remaining > SIZING_EPSILON {
        let growable = tracks
            .iter()
            .filter(|t| t.base_size < t.growth_limit)
            .count();
        if growable == 0 {
            break;
        }
        let share = remaining / growable as f32;
        let mut distributed = 0.0;
        for track in tracks.iter_mut() {
            if track.base_size < track.growth_limit {
                let increase = share.min(track.growth_limit - track.base_size);
                track.base_size += increase;
                distributed += increase;
            }
        }
        if distributed <= SIZING_EPSILON {
            break;
        }
        remaining -= distributed;
    }
}

/// Step 6: expand flexible tracks. Every `fr` track is treated with a
/// flex factor of 1; the factor sum is floored at 1 so a lone
/// fractional track absorbs all the leftover space.
///
/// No-op when the axis size is indefinite.
pub fn expand_flexible_tracks(tracks: &mut [GridTrack], available_size: Option<f32>) {
    let Some(available_size) = available_size else {
        return;
    };
    let flexible_count = tracks.iter().filter(|t| t.is_flexible()).count();
    if flexible_count == 0 {
        return;
    }

    let inflexible: f32 = tracks
        .iter()
        .filter(|t| !t.is_flexible())
        .map(|t| t.base_size)
        .sum();
    let leftover = available_size - inflexible;
    if leftover <= 0.0 {
        return;
    }

    let flex_factor_sum = (flexible_count as f32).max(1.0);
    let hypothetical = leftover / flex_factor_sum;
    debug!(flexible_count, hypothetical, "expanding flexible tracks");
    for track in tracks.iter_mut().filter(|t| t.is_flexible()) {
        if hypothetical > track.base_size {
            track.base_size = hypothetical;
        }
        track.clamp_growth_limit();
    }
}

/// Step 7: stretch `auto`-maxed tracks to share whatever space is
/// still left after the earlier steps, each raised to at least its
/// equal share.
///
/// No-op when the axis size is indefinite.
pub fn stretch_auto_tracks(tracks: &mut [GridTrack], available_size: Option<f32>) {
    let Some(available_size) = available_size else {
        return;
    };
    let auto_count = tracks
        .iter()
        .filter(|t| t.max_sizing_function == TrackSizingFunction::Auto)
        .count();
    if auto_count == 0 {
        return;
    }

    let used: f32 = tracks.iter().map(|t| t.base_size).sum();
    let remaining = available_size - used;
    if remaining <= 0.0 {
        return;
    }

    let share = remaining / auto_count as f32;
    for track in tracks
        .iter_mut()
        .filter(|t| t.max_sizing_function == TrackSizingFunction::Auto)
    {
        track.base_size += share;
        track.clamp_growth_limit();
    }
}
