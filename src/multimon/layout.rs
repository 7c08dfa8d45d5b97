//! Layout Calculation Engine
//!
//! Per-pair display layouts, their storage, and the solver that positions a
//! secondary display against the primary one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::display::{Display, DisplayId, DisplayIdPair, Point, Rect};

/// Minimum number of pixels a secondary display must keep in common with the
/// primary display's adjacent edge, whatever offset was stored
pub const MIN_OVERLAP: i32 = 100;

/// Edge of the reference display that the other display touches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Above the reference display
    Top,
    /// To the right of the reference display
    #[default]
    Right,
    /// Below the reference display
    Bottom,
    /// To the left of the reference display
    Left,
}

impl Position {
    /// The edge seen from the other display
    pub fn opposite(&self) -> Self {
        match self {
            Position::Top => Position::Bottom,
            Position::Right => Position::Left,
            Position::Bottom => Position::Top,
            Position::Left => Position::Right,
        }
    }
}

/// Relative placement of two displays
///
/// `position` and `offset` describe where the other display sits relative to
/// the reference display. `primary_id` names which display of the pair is
/// primary; it does not depend on the point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayLayout {
    /// Edge of the reference display that is touched
    pub position: Position,
    /// Offset along that edge, in DIP
    pub offset: i32,
    /// Displays mirror each other
    #[serde(default)]
    pub mirrored: bool,
    /// Primary display of the pair, if decided
    #[serde(default)]
    pub primary_id: Option<DisplayId>,
}

impl DisplayLayout {
    /// Layout with the given placement, no primary and no mirroring
    pub fn new(position: Position, offset: i32) -> Self {
        Self {
            position,
            offset,
            mirrored: false,
            primary_id: None,
        }
    }

    /// Same layout as seen from the other display
    ///
    /// Flips the edge and negates the offset. Applying it twice yields the
    /// original layout.
    pub fn invert(&self) -> Self {
        Self {
            position: self.position.opposite(),
            offset: -self.offset,
            ..*self
        }
    }
}

/// Stores one layout per unordered display pair
///
/// Each entry remembers which display it was registered relative to, so
/// lookups with the pair in either order resolve to the right orientation.
#[derive(Debug, Clone, Default)]
pub struct DisplayLayoutStore {
    default_display_layout: DisplayLayout,
    layouts: HashMap<DisplayIdPair, StoredLayout>,
}

#[derive(Debug, Clone, Copy)]
struct StoredLayout {
    reference: DisplayId,
    layout: DisplayLayout,
}

impl DisplayLayoutStore {
    /// Create an empty store with the default right-of layout
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout handed out for pairs without an entry
    pub fn default_display_layout(&self) -> DisplayLayout {
        self.default_display_layout
    }

    /// True if the pair has an entry
    pub fn has_layout(&self, pair: &DisplayIdPair) -> bool {
        self.layouts.contains_key(pair)
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// True if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Store `layout`, expressed relative to `pair.first`
    pub fn register_layout_for_display_id_pair(
        &mut self,
        pair: DisplayIdPair,
        layout: DisplayLayout,
    ) {
        debug!("Registering layout for {}: {:?}", pair, layout);
        self.layouts.insert(
            pair,
            StoredLayout {
                reference: pair.first,
                layout,
            },
        );
    }

    /// Layout relative to `pair.first`, creating the default entry on first use
    pub fn registered_layout(&mut self, pair: DisplayIdPair) -> DisplayLayout {
        let default_layout = self.default_display_layout;
        let stored = self.layouts.entry(pair).or_insert_with(|| {
            trace!("No layout stored for {}, using default", pair);
            StoredLayout {
                reference: pair.first,
                layout: DisplayLayout {
                    primary_id: Some(pair.first),
                    ..default_layout
                },
            }
        });

        if stored.reference == pair.first {
            stored.layout
        } else {
            stored.layout.invert()
        }
    }

    /// Layout relative to the pair's primary display
    pub fn compute_display_layout_for_display_id_pair(
        &mut self,
        pair: DisplayIdPair,
    ) -> DisplayLayout {
        let layout = self.registered_layout(pair);
        match layout.primary_id {
            Some(primary) if primary != pair.first => layout.invert(),
            _ => layout,
        }
    }

    /// Record whether the pair is mirrored
    pub fn update_mirror_status(&mut self, pair: DisplayIdPair, mirrored: bool) {
        let mut layout = self.registered_layout(pair);
        layout.mirrored = mirrored;
        self.register_layout_for_display_id_pair(pair, layout);
    }

    /// All entries, each relative to its reference display
    pub fn entries(&self) -> impl Iterator<Item = (DisplayIdPair, DisplayLayout)> + '_ {
        self.layouts.iter().map(|(pair, stored)| {
            let pair = if stored.reference == pair.first { *pair } else { pair.swapped() };
            (pair, stored.layout)
        })
    }
}

/// Position `secondary` so it touches the requested edge of `primary`
///
/// The primary display must sit at the screen origin. The stored offset is
/// clamped so that at least [`MIN_OVERLAP`] pixels of the shared edge remain,
/// which keeps a layout saved against a differently-sized display on screen.
/// The secondary's work area insets are carried over to its new bounds.
pub fn update_display_bounds_for_layout(
    layout: &DisplayLayout,
    primary: &Display,
    secondary: &mut Display,
) {
    let primary_bounds = primary.bounds();
    let secondary_bounds = secondary.bounds();
    debug_assert_eq!(
        primary_bounds.origin,
        Point::new(0, 0),
        "primary display must be anchored at the origin"
    );

    let mut offset = layout.offset;
    match layout.position {
        Position::Top | Position::Bottom => {
            offset = offset.min(primary_bounds.width() - MIN_OVERLAP);
            offset = offset.max(-secondary_bounds.width() + MIN_OVERLAP);
        }
        Position::Left | Position::Right => {
            offset = offset.min(primary_bounds.height() - MIN_OVERLAP);
            offset = offset.max(-secondary_bounds.height() + MIN_OVERLAP);
        }
    }

    let mut origin = primary_bounds.origin;
    match layout.position {
        Position::Top => origin.offset(offset, -secondary_bounds.height()),
        Position::Right => origin.offset(primary_bounds.width(), offset),
        Position::Bottom => origin.offset(offset, primary_bounds.height()),
        Position::Left => origin.offset(-secondary_bounds.width(), offset),
    }

    let insets = secondary.work_area_insets();
    secondary.set_bounds(Rect {
        origin,
        size: secondary_bounds.size,
    });
    secondary.update_work_area_from_insets(insets);

    trace!(
        "Placed display {} at {} ({:?}, offset {} -> {})",
        secondary.id(),
        origin,
        layout.position,
        layout.offset,
        offset
    );
}

/// Chain every display except `primary_index` left to right after the primary
///
/// Used when more than two displays are active. Returns the indices whose
/// bounds moved.
pub fn arrange_horizontal(displays: &mut [Display], primary_index: usize) -> Vec<usize> {
    let mut moved = Vec::new();
    let Some(primary) = displays.get(primary_index) else {
        return moved;
    };
    let mut current_x = primary.bounds().right();

    for (index, display) in displays.iter_mut().enumerate() {
        if index == primary_index {
            continue;
        }
        let before = display.bounds();
        let insets = display.work_area_insets();
        display.set_bounds(Rect {
            origin: Point::new(current_x, 0),
            size: before.size,
        });
        display.update_work_area_from_insets(insets);
        current_x += before.width();

        if display.bounds() != before {
            moved.push(index);
        }
    }

    moved
}

/// Bounding box of all displays
pub fn virtual_desktop_bounds(displays: &[Display]) -> Rect {
    if displays.is_empty() {
        return Rect::default();
    }

    let mut min_x = i32::MAX;
    let mut min_y = i32::MAX;
    let mut max_x = i32::MIN;
    let mut max_y = i32::MIN;

    for display in displays {
        let bounds = display.bounds();
        min_x = min_x.min(bounds.x());
        min_y = min_y.min(bounds.y());
        max_x = max_x.max(bounds.right());
        max_y = max_y.max(bounds.bottom());
    }

    Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
}
