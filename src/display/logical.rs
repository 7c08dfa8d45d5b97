//! Logical Displays
//!
//! The reconciled, screen-space representation of one output surface.

use serde::{Deserialize, Serialize};

use crate::display::geometry::{Insets, Rect, Size};
use crate::display::id::DisplayId;
use crate::display::info::{DisplayInfo, Rotation, TouchSupport};

/// A display in the active set, positioned in DIP screen space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Display {
    id: DisplayId,
    bounds: Rect,
    work_area: Rect,
    device_scale_factor: f32,
    rotation: Rotation,
    touch_support: TouchSupport,
}

impl Display {
    /// Build a display from its info
    ///
    /// The origin is always (0,0); the layout pass moves non-primary
    /// displays afterwards.
    pub fn from_info(info: &DisplayInfo) -> Self {
        let mut device_scale_factor = info.device_scale_factor();
        if device_scale_factor == 2.0 && info.configured_ui_scale() == 2.0 {
            device_scale_factor = 1.0;
        }

        let size = info.size_in_pixel().scale_floored(1.0 / device_scale_factor);
        let bounds = Rect::from_size(size);

        Self {
            id: info.id(),
            bounds,
            work_area: bounds,
            device_scale_factor,
            rotation: info.rotation(),
            touch_support: info.touch_support(),
        }
    }

    /// Display id
    pub fn id(&self) -> DisplayId {
        self.id
    }

    /// Bounds in screen space
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Move/resize the display. The work area is reset to the full bounds.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
        self.work_area = bounds;
    }

    /// Area available to regular content
    pub fn work_area(&self) -> Rect {
        self.work_area
    }

    /// Space reserved for persistent UI on each edge
    pub fn work_area_insets(&self) -> Insets {
        Insets::between(&self.bounds, &self.work_area)
    }

    /// Re-derive the work area from the bounds and `insets`
    pub fn update_work_area_from_insets(&mut self, insets: Insets) {
        self.work_area = self.bounds.inset(insets);
    }

    /// Device scale factor applied to this display
    pub fn device_scale_factor(&self) -> f32 {
        self.device_scale_factor
    }

    /// Rotation
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Touch capability
    pub fn touch_support(&self) -> TouchSupport {
        self.touch_support
    }

    /// Size in physical pixels
    pub fn size_in_pixel(&self) -> Size {
        self.bounds.size.scale_floored(self.device_scale_factor)
    }
}
