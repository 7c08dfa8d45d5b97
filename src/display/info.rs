//! Display Information
//!
//! Raw per-output configuration as reported by hardware, plus the user
//! overrides (rotation, UI scale, overscan) layered on top of it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::display::geometry::{Insets, Rect, Size};
use crate::display::id::DisplayId;
use crate::display::{DisplayError, Result};

/// Bounds used when a spec omits (or garbles) its geometry
pub const DEFAULT_DISPLAY_BOUNDS: Rect = Rect::new(0, 0, 1366, 768);

/// Overscan generated by the `o` spec option is 1/N of each DIP dimension
const SPEC_OVERSCAN_DIVISOR: f32 = 40.0;

/// Display rotation in 90 degree steps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    /// No rotation
    #[default]
    Rotate0,
    /// 90 degrees clockwise
    Rotate90,
    /// 180 degrees
    Rotate180,
    /// 270 degrees clockwise
    Rotate270,
}

impl Rotation {
    /// Rotation in degrees
    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::Rotate0 => 0,
            Rotation::Rotate90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Rotate270 => 270,
        }
    }

    /// True for 90 and 270, which swap width and height
    pub fn is_transposing(&self) -> bool {
        matches!(self, Rotation::Rotate90 | Rotation::Rotate270)
    }
}

impl TryFrom<u16> for Rotation {
    type Error = DisplayError;

    fn try_from(degrees: u16) -> Result<Self> {
        match degrees {
            0 => Ok(Rotation::Rotate0),
            90 => Ok(Rotation::Rotate90),
            180 => Ok(Rotation::Rotate180),
            270 => Ok(Rotation::Rotate270),
            other => Err(DisplayError::InvalidRotation(other)),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

/// Whether a display accepts touch input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchSupport {
    /// Not reported
    #[default]
    Unknown,
    /// Touch input available
    Available,
    /// No touch input
    Unavailable,
}

/// A resolution advertised by a display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    /// Native pixel size
    pub size: Size,
    /// Interlaced scan-out
    pub interlaced: bool,
}

impl Resolution {
    /// Progressive resolution of the given size
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            size: Size::new(width, height),
            interlaced: false,
        }
    }
}

impl FromStr for Resolution {
    type Err = DisplayError;

    /// Parses `WxH`, with an optional trailing `i` for interlaced modes
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (dims, interlaced) = match s.strip_suffix('i') {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        let size = parse_size(dims).ok_or_else(|| DisplayError::InvalidSpec(s.to_string()))?;
        if size.is_empty() {
            return Err(DisplayError::InvalidSpec(s.to_string()));
        }
        Ok(Self { size, interlaced })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.size, if self.interlaced { "i" } else { "" })
    }
}

/// Configuration of one physical or logical display
///
/// `size_in_pixel` is derived state: every setter that touches bounds,
/// overscan, rotation or scale re-derives it, and there is no way to set it
/// directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayInfo {
    id: DisplayId,
    name: String,
    /// Came straight from a hardware report rather than preferences
    native: bool,
    has_overscan: bool,
    bounds_in_native: Rect,
    size_in_pixel: Size,
    device_scale_factor: f32,
    configured_ui_scale: f32,
    rotation: Rotation,
    overscan_insets_in_dip: Insets,
    touch_support: TouchSupport,
    resolutions: Vec<Resolution>,
}

impl DisplayInfo {
    /// Create an info with empty bounds and unit scales
    pub fn new(id: DisplayId, name: impl Into<String>, has_overscan: bool) -> Self {
        Self {
            id,
            name: name.into(),
            native: false,
            has_overscan,
            bounds_in_native: Rect::default(),
            size_in_pixel: Size::default(),
            device_scale_factor: 1.0,
            configured_ui_scale: 1.0,
            rotation: Rotation::Rotate0,
            overscan_insets_in_dip: Insets::default(),
            touch_support: TouchSupport::Unknown,
            resolutions: Vec::new(),
        }
    }

    /// Parse a hardware spec string
    ///
    /// Format: `[<x>+<y>-]<w>x<h>[*<scale>][/<options>][@<ui_scale>][#<res>|<res>...]`
    ///
    /// Options: `o` overscan, `r`/`u`/`l` rotation 90/180/270, `t` touch.
    /// A spec whose geometry cannot be read at all yields the default bounds.
    ///
    /// # Errors
    ///
    /// Returns `DisplayError::InvalidSpec` for malformed scale factors,
    /// resolutions, or an empty size.
    pub fn from_spec(id: DisplayId, spec: &str) -> Result<Self> {
        let invalid = || DisplayError::InvalidSpec(spec.to_string());

        let (main, resolutions) = match spec.trim().split_once('#') {
            Some((main, list)) => (main, Some(list)),
            None => (spec.trim(), None),
        };

        let (main, ui_scale) = match main.split_once('@') {
            Some((main, scale)) => (main, scale.parse::<f32>().map_err(|_| invalid())?),
            None => (main, 1.0),
        };

        let (main, options) = main.split_once('/').unwrap_or((main, ""));

        let mut rotation = Rotation::Rotate0;
        let mut has_overscan = false;
        let mut touch_support = TouchSupport::Unknown;
        for option in options.chars() {
            match option {
                'o' => has_overscan = true,
                'r' => rotation = Rotation::Rotate90,
                'u' => rotation = Rotation::Rotate180,
                'l' => rotation = Rotation::Rotate270,
                't' => touch_support = TouchSupport::Available,
                _ => {}
            }
        }

        let (geometry, device_scale_factor) = match main.split_once('*') {
            Some((geometry, scale)) => (geometry, scale.parse::<f32>().map_err(|_| invalid())?),
            None => (main, 1.0),
        };
        if device_scale_factor <= 0.0 || ui_scale <= 0.0 {
            return Err(invalid());
        }

        let bounds = parse_geometry(geometry).unwrap_or(DEFAULT_DISPLAY_BOUNDS);
        if bounds.is_empty() {
            return Err(invalid());
        }

        let mut info = DisplayInfo::new(id, "", has_overscan);
        info.device_scale_factor = device_scale_factor;
        info.rotation = rotation;
        info.configured_ui_scale = ui_scale;
        info.touch_support = touch_support;
        info.set_bounds(bounds);

        if has_overscan {
            let dip_width = bounds.width() as f32 / device_scale_factor;
            let dip_height = bounds.height() as f32 / device_scale_factor;
            let width = (dip_width / SPEC_OVERSCAN_DIVISOR) as i32;
            let height = (dip_height / SPEC_OVERSCAN_DIVISOR) as i32;
            info.set_overscan_insets(Insets::new(height, width, height, width));
        }

        if let Some(list) = resolutions {
            let resolutions = list
                .split('|')
                .filter(|s| !s.trim().is_empty())
                .map(Resolution::from_str)
                .collect::<Result<Vec<_>>>()?;
            info.set_resolutions(resolutions);
        }

        Ok(info)
    }

    /// Display id
    pub fn id(&self) -> DisplayId {
        self.id
    }

    /// Human-readable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if this info came from a hardware report
    pub fn native(&self) -> bool {
        self.native
    }

    /// Mark this info as a hardware report
    pub fn set_native(&mut self, native: bool) {
        self.native = native;
    }

    /// Hardware hint that the output overscans
    pub fn has_overscan(&self) -> bool {
        self.has_overscan
    }

    /// Bounds in native (hardware) coordinates
    pub fn bounds_in_native(&self) -> Rect {
        self.bounds_in_native
    }

    /// Derived pixel size after overscan, rotation and UI scale
    pub fn size_in_pixel(&self) -> Size {
        self.size_in_pixel
    }

    /// Physical-to-logical pixel ratio
    pub fn device_scale_factor(&self) -> f32 {
        self.device_scale_factor
    }

    /// User-selected UI scale
    pub fn configured_ui_scale(&self) -> f32 {
        self.configured_ui_scale
    }

    /// Current rotation
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Overscan insets in DIP
    pub fn overscan_insets_in_dip(&self) -> Insets {
        self.overscan_insets_in_dip
    }

    /// Touch capability
    pub fn touch_support(&self) -> TouchSupport {
        self.touch_support
    }

    /// Advertised resolutions, best first
    pub fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }

    /// Replace the advertised resolutions
    pub fn set_resolutions(&mut self, resolutions: Vec<Resolution>) {
        self.resolutions = resolutions;
    }

    /// Set native bounds
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds_in_native = bounds;
        self.update_display_size();
    }

    /// Set overscan insets (DIP)
    pub fn set_overscan_insets(&mut self, insets_in_dip: Insets) {
        self.overscan_insets_in_dip = insets_in_dip;
        self.update_display_size();
    }

    /// Set rotation
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
        self.update_display_size();
    }

    /// Set device scale factor
    pub fn set_device_scale_factor(&mut self, scale: f32) {
        self.device_scale_factor = scale;
        self.update_display_size();
    }

    /// Set the user UI scale
    pub fn set_configured_ui_scale(&mut self, scale: f32) {
        self.configured_ui_scale = scale;
        self.update_display_size();
    }

    /// UI scale actually applied to the pixel size
    ///
    /// A 2x panel running at UI scale 2.0 renders at 1x, so the two cancel out.
    pub fn effective_ui_scale(&self) -> f32 {
        if self.device_scale_factor == 2.0 && self.configured_ui_scale == 2.0 {
            return 1.0;
        }
        self.configured_ui_scale
    }

    /// Fold a newer report for the same display into this one
    ///
    /// Geometry, scale, touch and resolutions always follow the report.
    /// Rotation and UI scale only follow non-native reports so that hardware
    /// refreshes never clobber user choices. Native overscan is taken only
    /// when the hardware actually reports some.
    pub fn merge_from(&mut self, report: &DisplayInfo) {
        debug_assert_eq!(self.id, report.id);

        self.name = report.name.clone();
        self.has_overscan = report.has_overscan;
        self.bounds_in_native = report.bounds_in_native;
        self.device_scale_factor = report.device_scale_factor;
        self.touch_support = report.touch_support;
        self.resolutions = report.resolutions.clone();

        if !report.native || !report.overscan_insets_in_dip.is_empty() {
            self.overscan_insets_in_dip = report.overscan_insets_in_dip;
        }
        if !report.native {
            self.rotation = report.rotation;
            self.configured_ui_scale = report.configured_ui_scale;
        }

        self.update_display_size();
    }

    fn update_display_size(&mut self) {
        let mut size = self.bounds_in_native.size;
        if !self.overscan_insets_in_dip.is_empty() {
            let insets_in_pixel = self.overscan_insets_in_dip.scale(self.device_scale_factor);
            size.enlarge(-insets_in_pixel.width(), -insets_in_pixel.height());
        }
        if self.rotation.is_transposing() {
            size = size.transposed();
        }
        self.size_in_pixel = size.scale_floored(self.effective_ui_scale());
    }
}

impl fmt::Display for DisplayInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DisplayInfo[{}] native bounds={}, size={}, scale={}, overscan={}, rotation={}, \
             ui-scale={}, touch={:?}",
            self.id,
            self.bounds_in_native,
            self.size_in_pixel,
            self.device_scale_factor,
            self.overscan_insets_in_dip,
            self.rotation.degrees(),
            self.configured_ui_scale,
            self.touch_support,
        )
    }
}

fn parse_size(s: &str) -> Option<Size> {
    let (w, h) = s.split_once('x')?;
    Some(Size::new(w.trim().parse().ok()?, h.trim().parse().ok()?))
}

/// `WxH` or `X+Y-WxH`
fn parse_geometry(s: &str) -> Option<Rect> {
    match s.split_once('+') {
        Some((x, rest)) => {
            // y may itself be negative, so split at the last '-'
            let (y, size) = rest.rsplit_once('-')?;
            let size = parse_size(size)?;
            Some(Rect::new(
                x.trim().parse().ok()?,
                y.trim().parse().ok()?,
                size.width,
                size.height,
            ))
        }
        None => parse_size(s).map(Rect::from_size),
    }
}
