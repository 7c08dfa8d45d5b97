//! UI Scale Steps
//!
//! Curated UI scale lists per panel type and stepping between them.

use crate::display::DisplayInfo;

const UI_SCALES_FOR_2X: &[f32] = &[0.5, 0.625, 0.8, 1.0, 1.125, 1.25, 1.5, 2.0];
const UI_SCALES_FOR_1280: &[f32] = &[0.5, 0.625, 0.8, 1.0, 1.125];
const UI_SCALES_FOR_1366: &[f32] = &[0.5, 0.6, 0.75, 1.0, 1.125];

const SCALE_EPSILON: f32 = 0.0001;

/// UI scales advertised for a display
///
/// Chosen by device scale factor, then by native panel width. Widths other
/// than 1280 and 1366 use the 1280 list.
pub fn scales_for_display(info: &DisplayInfo) -> &'static [f32] {
    if info.device_scale_factor() == 2.0 {
        return UI_SCALES_FOR_2X;
    }
    match info.bounds_in_native().width() {
        1366 => UI_SCALES_FOR_1366,
        _ => UI_SCALES_FOR_1280,
    }
}

/// True if `scale` is one of the display's advertised steps
pub fn is_supported_scale(info: &DisplayInfo, scale: f32) -> bool {
    scales_for_display(info)
        .iter()
        .any(|s| (s - scale).abs() < SCALE_EPSILON)
}

/// Next larger (`up`) or smaller UI scale, clamped at the ends
///
/// Returns 1.0 if the configured scale is not in the list.
pub fn next_ui_scale(info: &DisplayInfo, up: bool) -> f32 {
    let scales = scales_for_display(info);
    let current = info.configured_ui_scale();

    let Some(index) = scales.iter().position(|s| (s - current).abs() < SCALE_EPSILON) else {
        return 1.0;
    };

    if up {
        scales[(index + 1).min(scales.len() - 1)]
    } else {
        scales[index.saturating_sub(1)]
    }
}
