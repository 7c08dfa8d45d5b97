//! Configuration type definitions

use serde::{Deserialize, Serialize};

use crate::display::{DisplayId, Insets, Rotation};
use crate::multimon::Position;

pub use crate::multimon::DisplayManagerConfig as ManagerConfig;

/// Displays to bring up at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Comma-separated hardware spec list (empty = one default display)
    pub displays: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    pub level: String,

    /// Output format ("pretty", "compact", "json")
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Persisted layout of one display pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutEntry {
    /// Reference display
    pub first: DisplayId,

    /// Display placed relative to `first`
    pub second: DisplayId,

    /// Edge of `first` that `second` touches
    #[serde(default)]
    pub position: Position,

    /// Offset along that edge, in DIP
    #[serde(default)]
    pub offset: i32,

    /// Primary display of the pair (default: `first`)
    #[serde(default)]
    pub primary: Option<DisplayId>,

    /// The pair mirrors
    #[serde(default)]
    pub mirrored: bool,
}

/// Persisted per-display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayPropertyEntry {
    /// Display the settings belong to
    pub id: DisplayId,

    /// Rotation in degrees (0, 90, 180, 270)
    #[serde(default)]
    pub rotation: Rotation,

    /// UI scale, only honored on the UI scaling display
    #[serde(default = "default_ui_scale")]
    pub ui_scale: f32,

    /// Overscan insets in DIP
    #[serde(default)]
    pub overscan: Option<Insets>,

    /// Selected resolution ("WxH")
    #[serde(default)]
    pub resolution: Option<String>,
}

fn default_ui_scale() -> f32 {
    1.0
}
