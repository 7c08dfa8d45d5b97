//! Display Change Consumers
//!
//! Traits implemented by the window/compositor layer to receive
//! configuration changes, and a recorder that implements both.

use parking_lot::Mutex;
use serde::Serialize;

use crate::display::{Display, DisplayId, DisplayInfo, Rect};

/// Receives per-display notifications after a configuration pass
///
/// Called synchronously, in order: removals (newest first), additions,
/// bounds changes.
pub trait DisplayObserver {
    /// A display joined the active set
    fn on_display_added(&self, display: &Display);

    /// A display left the active set
    fn on_display_removed(&self, display: &Display);

    /// A display's bounds, scale or rotation changed
    fn on_display_bounds_changed(&self, display: &Display);
}

/// Brackets configuration passes and hosts the non-desktop display
#[cfg_attr(test, mockall::automock)]
pub trait DisplayManagerDelegate {
    /// Called before any add/remove/bounds notification of a pass
    fn pre_display_configuration_change(&self, clear_focus: bool);

    /// Called after all notifications of a pass
    fn post_display_configuration_change(&self);

    /// The mirror target or virtual keyboard display appeared or changed
    fn create_or_update_non_desktop_display(&self, info: &DisplayInfo);

    /// The mirror target or virtual keyboard display went away
    fn close_non_desktop_display(&self);
}

/// One recorded notification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayEvent {
    /// Display added
    Added(DisplayId),
    /// Display removed
    Removed(DisplayId),
    /// Display bounds changed
    BoundsChanged(DisplayId, Rect),
    /// Pass started
    PreConfigurationChange {
        /// Focus should be cleared
        clear_focus: bool,
    },
    /// Pass finished
    PostConfigurationChange,
    /// Non-desktop display created or updated
    NonDesktopUpdated(DisplayId),
    /// Non-desktop display closed
    NonDesktopClosed,
}

/// Records every notification it receives
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<DisplayEvent>>,
}

impl EventRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events so far
    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().clone()
    }

    /// Drain the events so far
    pub fn take(&self) -> Vec<DisplayEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Only the per-display events (no pass brackets)
    pub fn display_events(&self) -> Vec<DisplayEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    DisplayEvent::Added(_)
                        | DisplayEvent::Removed(_)
                        | DisplayEvent::BoundsChanged(..)
                )
            })
            .cloned()
            .collect()
    }

    fn push(&self, event: DisplayEvent) {
        self.events.lock().push(event);
    }
}

impl DisplayObserver for EventRecorder {
    fn on_display_added(&self, display: &Display) {
        self.push(DisplayEvent::Added(display.id()));
    }

    fn on_display_removed(&self, display: &Display) {
        self.push(DisplayEvent::Removed(display.id()));
    }

    fn on_display_bounds_changed(&self, display: &Display) {
        self.push(DisplayEvent::BoundsChanged(display.id(), display.bounds()));
    }
}

impl DisplayManagerDelegate for EventRecorder {
    fn pre_display_configuration_change(&self, clear_focus: bool) {
        self.push(DisplayEvent::PreConfigurationChange { clear_focus });
    }

    fn post_display_configuration_change(&self) {
        self.push(DisplayEvent::PostConfigurationChange);
    }

    fn create_or_update_non_desktop_display(&self, info: &DisplayInfo) {
        self.push(DisplayEvent::NonDesktopUpdated(info.id()));
    }

    fn close_non_desktop_display(&self) {
        self.push(DisplayEvent::NonDesktopClosed);
    }
}
