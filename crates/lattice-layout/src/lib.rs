//! # Lattice Layout
//!
//! CSS Grid track sizing and placement engine.
//!
//! ## Design Goals
//!
//! 1. **Placement**: the 4-phase grid item placement algorithm with
//!    sparse auto-placement and an occupation grid
//! 2. **Track sizing**: the 5-step track sizing algorithm over parallel
//!    column/row track arrays (initialize, intrinsic, maximize, flex,
//!    stretch)
//! 3. **Decoupled inputs**: flat style snapshots from `lattice-style`,
//!    no live cascade
//! 4. **Injected collaborators**: intrinsic measurement and recursive
//!    child layout behind a trait, so the engine is testable in isolation
//!
//! The engine is single-threaded and synchronous: one
//! [`GridFormattingContext::run`] call fully places and sizes one grid
//! container, writes per-item geometry into the externally owned
//! [`LayoutState`], and is then discarded.

pub mod grid;
pub mod occupation;
pub mod placement;
pub mod track_sizing;

pub use grid::GridFormattingContext;
pub use occupation::OccupationGrid;
pub use placement::{PlacementEngine, PositionedBox};
pub use track_sizing::GridTrack;

use std::collections::HashMap;

use thiserror::Error;

/// Errors that can occur in layout.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Layout failed: {0}")]
    LayoutFailed(String),

    #[error("Child layout failed for box {0:?}: {1}")]
    ChildLayoutFailed(BoxId, String),
}

/// Opaque identifier for an externally owned layout box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxId(pub usize);

/// A 2D offset within the grid container's content box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

/// Per-box layout record, owned by the external layout tree walker.
#[derive(Debug, Clone, Default)]
pub struct BoxLayout {
    /// Content-box width.
    pub content_width: f32,
    /// Content-box height.
    pub content_height: f32,
    /// Offset from the containing block's content origin.
    pub offset: Offset,
    /// Whether the height was definitely resolved (not content-derived).
    pub has_definite_height: bool,
}

/// The externally owned layout-state map.
///
/// The grid engine borrows this for one `run()` call, reads the
/// container's resolved content size from it, and writes each item's
/// final geometry back into it.
#[derive(Debug, Default)]
pub struct LayoutState {
    boxes: HashMap<BoxId, BoxLayout>,
}

impl LayoutState {
    /// Create an empty state map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the layout record for a box.
    pub fn get_mutable(&mut self, id: BoxId) -> &mut BoxLayout {
        self.boxes.entry(id).or_default()
    }

    /// Read a box's layout record, if one exists.
    pub fn get(&self, id: BoxId) -> Option<&BoxLayout> {
        self.boxes.get(&id)
    }

    /// Whether a box has a definitely resolved height.
    pub fn has_definite_height(&self, id: BoxId) -> bool {
        self.boxes.get(&id).is_some_and(|b| b.has_definite_height)
    }
}

/// Layout invocation mode for recursive child layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    #[default]
    Normal,
}

/// Available space handed down to child layout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AvailableSpace {
    /// Available inline size.
    pub width: f32,
    /// Available block size, when definite.
    pub height: Option<f32>,
}

/// Measurement and recursive-layout collaborator.
///
/// The grid engine never walks box contents itself; intrinsic
/// measurement and child layout are delegated so the sizing algorithm
/// can be exercised with mock providers.
pub trait LayoutDelegate {
    /// The min-content width contribution of a box.
    fn min_content_width(&mut self, id: BoxId) -> f32;

    /// Lay out the contents of a box (an independent formatting
    /// context), updating its record in `state`.
    fn layout_inside(
        &mut self,
        id: BoxId,
        mode: LayoutMode,
        available_space: AvailableSpace,
        state: &mut LayoutState,
    ) -> Result<(), LayoutError>;
}

/// A grid container child paired with its placement style.
#[derive(Debug, Clone)]
pub struct GridChild {
    /// External box reference.
    pub id: BoxId,
    /// Placement snapshot from the cascade.
    pub style: lattice_style::GridItemStyle,
}

impl GridChild {
    /// Pair a box with its placement style.
    pub fn new(id: BoxId, style: lattice_style::GridItemStyle) -> Self {
        Self { id, style }
    }
}
