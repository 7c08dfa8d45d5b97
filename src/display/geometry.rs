//! Integer Geometry
//!
//! Minimal screen-space primitives shared by the display model and the
//! layout solver. All coordinates are in pixels (native or DIP depending on
//! the owning type).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in screen space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
}

impl Point {
    /// Create a new point
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate the point in place
    pub fn offset(&mut self, dx: i32, dy: i32) {
        self.x += dx;
        self.y += dy;
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// A width/height pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Size {
    /// Create a new size
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// True if either dimension is zero or negative
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Grow (or shrink, for negative values) both dimensions
    pub fn enlarge(&mut self, dw: i32, dh: i32) {
        self.width = (self.width + dw).max(0);
        self.height = (self.height + dh).max(0);
    }

    /// Size with width and height swapped
    pub fn transposed(&self) -> Self {
        Self::new(self.height, self.width)
    }

    /// Scale both dimensions and floor the result
    pub fn scale_floored(&self, scale: f32) -> Self {
        Self::new(
            (self.width as f32 * scale).floor() as i32,
            (self.height as f32 * scale).floor() as i32,
        )
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner
    pub origin: Point,
    /// Dimensions
    pub size: Size,
}

impl Rect {
    /// Create a rectangle from origin and size components
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Create a rectangle at the origin
    pub const fn from_size(size: Size) -> Self {
        Self {
            origin: Point::new(0, 0),
            size,
        }
    }

    /// Left edge
    pub fn x(&self) -> i32 {
        self.origin.x
    }

    /// Top edge
    pub fn y(&self) -> i32 {
        self.origin.y
    }

    /// Width
    pub fn width(&self) -> i32 {
        self.size.width
    }

    /// Height
    pub fn height(&self) -> i32 {
        self.size.height
    }

    /// Right edge (exclusive)
    pub fn right(&self) -> i32 {
        self.origin.x + self.size.width
    }

    /// Bottom edge (exclusive)
    pub fn bottom(&self) -> i32 {
        self.origin.y + self.size.height
    }

    /// True if the rectangle covers no area
    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    /// Shrink the rectangle by the given insets
    pub fn inset(&self, insets: Insets) -> Self {
        Self::new(
            self.x() + insets.left,
            self.y() + insets.top,
            (self.width() - insets.width()).max(0),
            (self.height() - insets.height()).max(0),
        )
    }

    /// Intersection of two rectangles (empty if disjoint)
    pub fn intersect(&self, other: &Rect) -> Rect {
        let left = self.x().max(other.x());
        let top = self.y().max(other.y());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return Rect::default();
        }
        Rect::new(left, top, right - left, bottom - top)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.origin, self.size)
    }
}

/// Per-edge insets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Insets {
    /// Top inset
    pub top: i32,
    /// Left inset
    pub left: i32,
    /// Bottom inset
    pub bottom: i32,
    /// Right inset
    pub right: i32,
}

impl Insets {
    /// Create insets (top, left, bottom, right)
    pub const fn new(top: i32, left: i32, bottom: i32, right: i32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Total horizontal inset
    pub fn width(&self) -> i32 {
        self.left + self.right
    }

    /// Total vertical inset
    pub fn height(&self) -> i32 {
        self.top + self.bottom
    }

    /// True if every edge is zero
    pub fn is_empty(&self) -> bool {
        self.top == 0 && self.left == 0 && self.bottom == 0 && self.right == 0
    }

    /// Scale every edge, rounding to the nearest pixel
    pub fn scale(&self, scale: f32) -> Self {
        let s = |v: i32| (v as f32 * scale).round() as i32;
        Self::new(s(self.top), s(self.left), s(self.bottom), s(self.right))
    }

    /// Insets that turn `outer` into `inner`
    pub fn between(outer: &Rect, inner: &Rect) -> Self {
        Self::new(
            inner.y() - outer.y(),
            inner.x() - outer.x(),
            outer.bottom() - inner.bottom(),
            outer.right() - inner.right(),
        )
    }
}

impl fmt::Display for Insets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.top, self.left, self.bottom, self.right)
    }
}
