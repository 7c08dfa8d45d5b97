//! Configuration management
//!
//! Handles loading, validation, and merging of configuration from:
//! - TOML files
//! - CLI arguments
//!
//! Besides manager settings, the file can carry persisted per-pair layouts
//! and per-display properties that are seeded into a new
//! [`DisplayManager`] before it sees any hardware.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::display::{DisplayError, DisplayId, DisplayIdPair, Resolution};
use crate::multimon::{DisplayLayout, DisplayLayoutStore, DisplayManager, SecondDisplayMode};

pub mod types;

pub use types::{BootstrapConfig, DisplayPropertyEntry, LayoutEntry, LoggingConfig, ManagerConfig};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Display manager configuration
    #[serde(default)]
    pub manager: ManagerConfig,
    /// Startup displays
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Persisted display pair layouts
    #[serde(default)]
    pub layouts: Vec<LayoutEntry>,
    /// Persisted per-display settings
    #[serde(default)]
    pub display_properties: Vec<DisplayPropertyEntry>,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Validate configuration
    ///
    /// Value errors carry [`DisplayError::InvalidConfiguration`] so the CLI
    /// can point at the config file.
    pub fn validate(&self) -> Result<()> {
        let invalid = DisplayError::InvalidConfiguration;

        match self.logging.format.as_str() {
            "pretty" | "compact" | "json" => {}
            _ => anyhow::bail!(invalid(format!("Invalid log format: {}", self.logging.format))),
        }

        for layout in &self.layouts {
            if layout.first == layout.second {
                anyhow::bail!(invalid(format!(
                    "Layout pairs display {} with itself",
                    layout.first
                )));
            }
            if let Some(primary) = layout.primary {
                if primary != layout.first && primary != layout.second {
                    anyhow::bail!(invalid(format!(
                        "Primary display {} is not part of layout {}/{}",
                        primary, layout.first, layout.second
                    )));
                }
            }
        }

        for property in &self.display_properties {
            if property.ui_scale <= 0.0 {
                anyhow::bail!(invalid(format!(
                    "UI scale of display {} must be positive, got {}",
                    property.id, property.ui_scale
                )));
            }
            if let Some(insets) = property.overscan {
                if insets.top < 0 || insets.left < 0 || insets.bottom < 0 || insets.right < 0 {
                    anyhow::bail!(invalid(format!(
                        "Overscan of display {} cannot be negative: {}",
                        property.id, insets
                    )));
                }
            }
            if let Some(resolution) = &property.resolution {
                Resolution::from_str(resolution)
                    .context(format!("Invalid resolution for display {}", property.id))?;
            }
        }

        Ok(())
    }

    /// Write configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context(format!("Failed to write config file: {}", path))?;
        Ok(())
    }

    /// Replace the persisted layouts with the contents of `store`
    ///
    /// Each entry is written relative to the display it was stored against,
    /// so loading it back yields the same layouts.
    pub fn capture_layouts(&mut self, store: &DisplayLayoutStore) {
        self.layouts = store
            .entries()
            .map(|(pair, layout)| LayoutEntry {
                first: pair.first,
                second: pair.second,
                position: layout.position,
                offset: layout.offset,
                primary: layout.primary_id,
                mirrored: layout.mirrored,
            })
            .collect();
        self.layouts.sort_by_key(|entry| (entry.first, entry.second));
        debug!("Captured {} layouts", self.layouts.len());
    }

    /// Override config with CLI arguments
    pub fn with_overrides(
        mut self,
        displays: Option<String>,
        mode: Option<SecondDisplayMode>,
        internal_display_id: Option<u64>,
    ) -> Self {
        if let Some(displays) = displays {
            self.bootstrap.displays = displays;
        }
        if let Some(mode) = mode {
            self.manager.second_display_mode = mode;
        }
        if let Some(id) = internal_display_id {
            self.manager.internal_display_id = Some(DisplayId::new(id));
        }

        self
    }

    /// Create a display manager seeded with the persisted layouts and
    /// display properties
    ///
    /// The manager has no displays yet; bootstrap it with
    /// [`DisplayManager::init_from_spec`] once observers are attached.
    pub fn build_display_manager(&self) -> Result<DisplayManager> {
        self.validate()?;
        let mut manager = DisplayManager::new(self.manager.clone());

        for entry in &self.layouts {
            let pair = DisplayIdPair::new(entry.first, entry.second);
            let layout = DisplayLayout {
                position: entry.position,
                offset: entry.offset,
                mirrored: entry.mirrored,
                primary_id: Some(entry.primary.unwrap_or(entry.first)),
            };
            manager.layout_store_mut().register_layout_for_display_id_pair(pair, layout);
        }

        for property in &self.display_properties {
            let resolution = property
                .resolution
                .as_deref()
                .map(Resolution::from_str)
                .transpose()
                .context(format!("Invalid resolution for display {}", property.id))?
                .map(|r| r.size);
            manager.register_display_property(
                property.id,
                property.rotation,
                property.ui_scale,
                property.overscan,
                resolution,
            );
        }

        debug!(
            "Seeded {} layouts and {} display properties from config",
            self.layouts.len(),
            self.display_properties.len()
        );
        Ok(manager)
    }
}
