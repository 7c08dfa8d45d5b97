//! # lamco-display-manager
//!
//! Display configuration manager: reconciles hardware display reports with
//! user settings into an arranged set of logical displays.
//!
//! The crate is organized as:
//! - [`display`] - display ids, geometry, per-display info and the hardware
//!   spec mini-language
//! - [`multimon`] - layouts, reconciliation, and the [`DisplayManager`]
//!   facade
//! - [`config`] - TOML configuration used to bootstrap a manager
//!
//! # Architecture
//!
//! ```text
//! lamco-display-manager
//!   ├─> DisplayManager (owns active displays and stored infos)
//!   │     ├─> Reconciler (merge-diff of old vs. new display lists)
//!   │     ├─> LayoutSolver (places the secondary display)
//!   │     └─> DisplayLayoutStore (layout per display pair)
//!   └─> Observers / Delegate (window layer notifications)
//! ```
//!
//! # Data Flow
//!
//! **Hardware Path:** Native report → DisplayManager → Reconciler → Observers
//!
//! **Settings Path:** User setting → DisplayInfo update → Reconciler → Observers
//!
//! [`DisplayManager`]: multimon::DisplayManager

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Manager configuration
pub mod config;

/// Display data model
pub mod display;

/// Multi-display management
pub mod multimon;

/// Utility functions
pub mod utils;
