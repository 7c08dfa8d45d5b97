//! Multi-Display Management
//!
//! Keeps the set of active logical displays in step with what the hardware
//! reports and what the user configured, and tells the window layer about
//! every change.
//!
//! # Overview
//!
//! ```text
//! hardware report ──┐
//!                   ├─> DisplayManager ──> Reconciler ──> LayoutSolver
//! user settings ────┘          │                              │
//!                              └──< DisplayLayoutStore <──────┘
//!                              │
//!                              └──> observers / delegate
//! ```
//!
//! Every pass runs the same way:
//!
//! 1. **Mode pre-pass:** with exactly two displays outside extended mode, one
//!    display is kept out of the desktop as mirror target or virtual
//!    keyboard display.
//! 2. **Merge-diff:** the active list and the new info list (both sorted by
//!    id) are walked together to find added, removed and changed displays.
//! 3. **Layout:** the secondary display is placed against the primary using
//!    the stored layout for that pair. With more than two displays they are
//!    chained horizontally.
//! 4. **Notify:** removals, additions, then bounds changes, bracketed by the
//!    delegate's pre/post hooks.
//!
//! # Layouts
//!
//! A [`DisplayLayout`] says on which edge of the primary display the
//! secondary sits and how far it is shifted along that edge:
//!
//! ```text
//!            Top
//!         ┌────────┐
//!   Left  │primary │ Right ──offset──┐
//!         └────────┘                 ▼
//!           Bottom              ┌─────────┐
//!                               │secondary│
//!                               └─────────┘
//! ```
//!
//! The offset is clamped so at least [`MIN_OVERLAP`] DIP of the shared edge
//! remain.
//!
//! # Example
//!
//! ```
//! use lamco_display_manager::multimon::{DisplayManager, DisplayManagerConfig};
//!
//! let mut manager = DisplayManager::new(DisplayManagerConfig::default());
//! manager.init_from_spec("1280x800,1920x1080*2");
//!
//! assert_eq!(manager.num_displays(), 2);
//! assert_eq!(manager.displays()[1].bounds().x(), 1280);
//! ```

pub mod layout;
mod manager;
mod observer;
pub mod reconcile;
pub mod ui_scale;

pub use layout::{
    arrange_horizontal, update_display_bounds_for_layout, virtual_desktop_bounds, DisplayLayout,
    DisplayLayoutStore, Position, MIN_OVERLAP,
};
pub use manager::{DisplayManager, DisplayManagerConfig, SecondDisplayMode};
pub use observer::{DisplayEvent, DisplayManagerDelegate, DisplayObserver, EventRecorder};
