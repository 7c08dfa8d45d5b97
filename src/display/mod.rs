//! Display Data Model
//!
//! Value types shared by the reconciler, the layout solver and the
//! [`DisplayManager`](crate::multimon::DisplayManager) facade:
//!
//! - [`DisplayId`] / [`DisplayIdPair`]: stable identity
//! - [`DisplayInfo`]: per-output hardware report plus user overrides
//! - [`Display`]: the logical, screen-space display derived from an info
//!
//! # Hardware Spec Strings
//!
//! For bootstrap and tests, displays can be described textually:
//!
//! ```text
//! 1920x1080                 1920x1080 at the origin
//! 1920+0-1280x1024          1280x1024 with native origin (1920, 0)
//! 2560x1700*2/r             2x device scale, rotated 90 degrees
//! 1366x768@1.25             UI scale 1.25
//! 1920x1080#1920x1080|1280x720
//!                           advertised resolutions, best first
//! ```
//!
//! A comma-separated list of specs describes a multi-display setup.

mod geometry;
mod id;
mod info;
mod logical;

pub use geometry::{Insets, Point, Rect, Size};
pub use id::{DisplayId, DisplayIdAllocator, DisplayIdPair, SYNTHESIZED_DISPLAY_ID_START};
pub use info::{DisplayInfo, Resolution, Rotation, TouchSupport, DEFAULT_DISPLAY_BOUNDS};
pub use logical::Display;

use thiserror::Error;

/// Display model result type
pub type Result<T> = std::result::Result<T, DisplayError>;

/// Display model error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DisplayError {
    /// Malformed hardware spec string
    #[error("Invalid display spec: {0:?}")]
    InvalidSpec(String),

    /// Rotation not in 90 degree steps
    #[error("Invalid rotation: {0} degrees")]
    InvalidRotation(u16),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Parse a comma-separated list of hardware specs
///
/// Each entry gets the next id from `ids`. An empty list yields no infos.
///
/// # Errors
///
/// Returns the first spec parse error.
pub fn parse_display_specs(specs: &str, ids: &mut DisplayIdAllocator) -> Result<Vec<DisplayInfo>> {
    specs
        .split(',')
        .map(str::trim)
        .filter(|spec| !spec.is_empty())
        .map(|spec| DisplayInfo::from_spec(ids.allocate(), spec))
        .collect()
}
