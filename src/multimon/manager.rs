//! Display Manager
//!
//! Owns the active display list and the per-display info map, runs the
//! reconciler on every hardware or user change, and notifies observers.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::display::{
    parse_display_specs, Display, DisplayId, DisplayIdAllocator, DisplayIdPair, DisplayInfo, Insets,
    Rect,
    Resolution, Rotation, Size, DEFAULT_DISPLAY_BOUNDS,
};
use crate::multimon::layout::{
    arrange_horizontal, update_display_bounds_for_layout, DisplayLayout, DisplayLayoutStore,
};
use crate::multimon::observer::{DisplayManagerDelegate, DisplayObserver};
use crate::multimon::reconcile::{
    fold_hardware_mirrors, merge_info, reconcile, select_second_display_target, ReconcileContext,
};
use crate::multimon::ui_scale;

/// What a second connected display is used for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondDisplayMode {
    /// Both displays extend the desktop
    #[default]
    Extended,
    /// The second display shows the first one's content
    Mirroring,
    /// The second display hosts a virtual keyboard
    VirtualKeyboard,
}

/// Display manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayManagerConfig {
    /// Allow UI scale changes on the internal display
    pub ui_scaling_enabled: bool,

    /// Report every surviving display as changed on each pass
    pub force_bounds_changed: bool,

    /// Initial second display mode
    pub second_display_mode: SecondDisplayMode,

    /// Built-in panel, if known up front
    pub internal_display_id: Option<DisplayId>,
}

impl Default for DisplayManagerConfig {
    fn default() -> Self {
        Self {
            ui_scaling_enabled: true,
            force_bounds_changed: false,
            second_display_mode: SecondDisplayMode::Extended,
            internal_display_id: None,
        }
    }
}

/// Keeps the logical display configuration in sync with hardware
///
/// Single-threaded: every operation runs to completion on the caller's
/// thread, and notifications are delivered before it returns.
pub struct DisplayManager {
    config: DisplayManagerConfig,

    /// Active displays, sorted by id
    displays: Vec<Display>,

    /// Every display seen so far, connected or not
    display_info: BTreeMap<DisplayId, DisplayInfo>,

    /// Non-default resolutions chosen by the user
    resolutions: HashMap<DisplayId, Resolution>,

    layout_store: DisplayLayoutStore,

    /// Ids passed to the last reconciliation, sorted
    connected_ids: Vec<DisplayId>,
    num_connected_displays: usize,

    first_display_id: Option<DisplayId>,
    internal_display_id: Option<DisplayId>,
    primary_display_id: Option<DisplayId>,

    hardware_mirrored_id: Option<DisplayId>,
    mirrored_display_id: Option<DisplayId>,
    non_desktop_display_id: Option<DisplayId>,
    /// Last info handed to the delegate for the non-desktop display
    non_desktop_info: Option<DisplayInfo>,

    second_display_mode: SecondDisplayMode,
    ids: DisplayIdAllocator,

    observers: Vec<Arc<dyn DisplayObserver>>,
    delegate: Option<Arc<dyn DisplayManagerDelegate>>,
}

impl DisplayManager {
    /// Create a manager with no displays
    pub fn new(config: DisplayManagerConfig) -> Self {
        Self {
            second_display_mode: config.second_display_mode,
            internal_display_id: config.internal_display_id,
            config,
            displays: Vec::new(),
            display_info: BTreeMap::new(),
            resolutions: HashMap::new(),
            layout_store: DisplayLayoutStore::new(),
            connected_ids: Vec::new(),
            num_connected_displays: 0,
            first_display_id: None,
            primary_display_id: None,
            hardware_mirrored_id: None,
            mirrored_display_id: None,
            non_desktop_display_id: None,
            non_desktop_info: None,
            ids: DisplayIdAllocator::default(),
            observers: Vec::new(),
            delegate: None,
        }
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Register an observer
    pub fn add_observer(&mut self, observer: Arc<dyn DisplayObserver>) {
        self.observers.push(observer);
    }

    /// Unregister an observer
    pub fn remove_observer(&mut self, observer: &Arc<dyn DisplayObserver>) {
        let target = Arc::as_ptr(observer) as *const ();
        self.observers.retain(|o| Arc::as_ptr(o) as *const () != target);
    }

    /// Set or clear the delegate
    pub fn set_delegate(&mut self, delegate: Option<Arc<dyn DisplayManagerDelegate>>) {
        self.delegate = delegate;
    }

    // =========================================================================
    // Bootstrap
    // =========================================================================

    /// Bootstrap from a comma-separated hardware spec list
    ///
    /// An empty or malformed list falls back to a single default display.
    pub fn init_from_spec(&mut self, specs: &str) {
        match parse_display_specs(specs, &mut self.ids) {
            Ok(infos) if !infos.is_empty() => {
                info!("Initializing {} display(s) from spec {:?}", infos.len(), specs);
                self.num_connected_displays = infos.len();
                self.update_displays(infos);
            }
            Ok(_) => self.init_default_display(),
            Err(e) => {
                warn!("Ignoring display spec: {}", e);
                self.init_default_display();
            }
        }
    }

    /// Bootstrap with one synthetic display
    pub fn init_default_display(&mut self) {
        let mut info = DisplayInfo::new(self.ids.allocate(), "Default display", false);
        info.set_bounds(DEFAULT_DISPLAY_BOUNDS);
        info!("Initializing default display {}", info.id());
        self.num_connected_displays = 1;
        self.update_displays(vec![info]);
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Hardware reported its current outputs
    ///
    /// An empty report is treated as transient signal loss and ignored,
    /// unless nothing is active yet.
    pub fn on_native_displays_changed(&mut self, report: Vec<DisplayInfo>) {
        if report.is_empty() {
            if self.displays.is_empty() {
                info!("No displays reported and none active, creating default display");
                self.init_default_display();
            } else {
                debug!("Empty display report ignored");
            }
            return;
        }

        let num_reported = report.len();
        let internal_connected = self
            .internal_display_id
            .is_some_and(|internal| report.iter().any(|info| info.id() == internal));

        let report = report
            .into_iter()
            .map(|mut info| {
                info.set_native(true);
                info
            })
            .collect();
        let (mut unique, mirrored) = fold_hardware_mirrors(report);

        self.hardware_mirrored_id = None;
        for info in mirrored {
            let merged = merge_info(&self.display_info, &info);
            self.hardware_mirrored_id = Some(merged.id());
            self.display_info.insert(merged.id(), merged);
        }

        for info in &mut unique {
            if let Some(selected) = self.resolutions.get(&info.id()) {
                if info.resolutions().contains(selected) {
                    let origin = info.bounds_in_native().origin;
                    info.set_bounds(Rect {
                        origin,
                        size: selected.size,
                    });
                }
            }
        }

        if let Some(internal) = self.internal_display_id {
            if !internal_connected && !self.display_info.contains_key(&internal) {
                debug!("Internal display {} absent, adding placeholder info", internal);
                let mut placeholder = DisplayInfo::new(internal, "Internal display", false);
                placeholder.set_bounds(DEFAULT_DISPLAY_BOUNDS);
                self.display_info.insert(internal, placeholder);
            }
        }

        self.num_connected_displays = num_reported;
        self.update_displays(unique);
    }

    /// Reconcile the active list against `infos`
    pub fn update_displays(&mut self, mut infos: Vec<DisplayInfo>) {
        if infos.is_empty() {
            if self.displays.is_empty() {
                self.init_default_display();
            }
            return;
        }

        infos.sort_by_key(DisplayInfo::id);
        infos.dedup_by_key(|info| info.id());

        if self.first_display_id.is_none() {
            self.first_display_id = Some(infos[0].id());
        }

        if self.num_connected_displays > 2
            && self.second_display_mode != SecondDisplayMode::Extended
        {
            info!(
                "{} displays connected, switching from {:?} to extended mode",
                self.num_connected_displays, self.second_display_mode
            );
            self.second_display_mode = SecondDisplayMode::Extended;
        }

        let target = select_second_display_target(
            self.second_display_mode,
            &infos,
            self.first_display_id,
            self.internal_display_id,
        );
        self.mirrored_display_id = match (self.second_display_mode, target) {
            (SecondDisplayMode::Mirroring, Some(target)) => Some(target),
            _ => self.hardware_mirrored_id,
        };
        self.non_desktop_display_id = match self.second_display_mode {
            SecondDisplayMode::VirtualKeyboard => target,
            _ => None,
        };
        self.connected_ids = infos.iter().map(DisplayInfo::id).collect();

        let result = reconcile(
            &self.displays,
            &infos,
            &ReconcileContext {
                infos: &self.display_info,
                excluded_id: target,
                force_bounds_changed: self.config.force_bounds_changed,
            },
        );

        for merged in &result.infos {
            self.display_info.insert(merged.id(), merged.clone());
        }

        if result.is_noop() {
            debug!("Display configuration unchanged");
            self.sync_non_desktop_display(result.non_desktop);
            return;
        }

        let replaced = result.removed.len() == 1 && result.added.len() == 1;
        let clear_focus = !result.removed.is_empty() && !replaced;
        if let Some(delegate) = &self.delegate {
            delegate.pre_display_configuration_change(clear_focus);
        }

        let mut displays = result.displays;
        let mut changed = result.changed;
        let added = result.added;
        self.apply_layout(&mut displays);

        for (index, display) in displays.iter().enumerate() {
            if added.contains(&index) || changed.contains(&index) {
                continue;
            }
            let moved = self
                .displays
                .iter()
                .find(|previous| previous.id() == display.id())
                .is_some_and(|previous| previous.bounds() != display.bounds());
            if moved {
                changed.push(index);
            }
        }

        self.displays = displays;
        info!(
            "Display configuration updated: {} active, {} added, {} changed, {} removed",
            self.displays.len(),
            added.len(),
            changed.len(),
            result.removed.len()
        );

        for removed_display in result.removed.iter().rev() {
            debug!("Display {} removed", removed_display.id());
            for observer in &self.observers {
                observer.on_display_removed(removed_display);
            }
        }
        for &index in &added {
            let added_display = &self.displays[index];
            debug!("Display {} added at {}", added_display.id(), added_display.bounds());
            for observer in &self.observers {
                observer.on_display_added(added_display);
            }
        }
        for &index in &changed {
            let changed_display = &self.displays[index];
            debug!(
                "Display {} bounds changed to {}",
                changed_display.id(),
                changed_display.bounds()
            );
            for observer in &self.observers {
                observer.on_display_bounds_changed(changed_display);
            }
        }

        if let Some(delegate) = &self.delegate {
            delegate.post_display_configuration_change();
        }

        self.sync_non_desktop_display(result.non_desktop);
    }

    /// Re-run reconciliation over the last reported displays
    pub fn reconfigure_current_displays(&mut self) {
        let infos = self.current_display_infos(None);
        self.update_displays(infos);
    }

    fn reconfigure_with(&mut self, replacement: DisplayInfo) {
        if !self.connected_ids.contains(&replacement.id()) {
            debug!("Display {} not connected, storing settings for later", replacement.id());
            self.display_info.insert(replacement.id(), replacement);
            return;
        }
        let infos = self.current_display_infos(Some(replacement));
        self.update_displays(infos);
    }

    fn current_display_infos(&self, replacement: Option<DisplayInfo>) -> Vec<DisplayInfo> {
        let mut replacement = replacement;
        self.connected_ids
            .iter()
            .filter_map(|id| {
                if replacement.as_ref().is_some_and(|info| info.id() == *id) {
                    replacement.take()
                } else {
                    self.display_info.get(id).cloned()
                }
            })
            .collect()
    }

    /// Position displays according to the stored layout
    ///
    /// Returns the secondary's index when exactly two displays are active.
    fn apply_layout(&mut self, displays: &mut [Display]) -> Option<usize> {
        match displays.len() {
            0 => {
                self.primary_display_id = None;
                None
            }
            1 => {
                self.primary_display_id = Some(displays[0].id());
                None
            }
            2 => {
                let pair = self.display_id_pair_for(displays[0].id(), displays[1].id());
                let layout = self.layout_store.compute_display_layout_for_display_id_pair(pair);
                let primary_index = match layout.primary_id {
                    Some(primary) if primary == displays[1].id() => 1,
                    _ => 0,
                };
                self.primary_display_id = Some(displays[primary_index].id());

                let (head, tail) = displays.split_at_mut(1);
                let (primary, secondary) = if primary_index == 0 {
                    (&head[0], &mut tail[0])
                } else {
                    (&tail[0], &mut head[0])
                };
                update_display_bounds_for_layout(&layout, primary, secondary);
                Some(1 - primary_index)
            }
            _ => {
                self.primary_display_id = Some(displays[0].id());
                arrange_horizontal(displays, 0);
                None
            }
        }
    }

    /// Order a pair so the internal display, else the boot display, is the
    /// reference
    fn display_id_pair_for(&self, a: DisplayId, b: DisplayId) -> DisplayIdPair {
        let reference = [self.internal_display_id, self.first_display_id]
            .into_iter()
            .flatten()
            .find(|id| *id == a || *id == b);
        match reference {
            Some(id) if id == b => DisplayIdPair::new(b, a),
            _ => DisplayIdPair::new(a, b),
        }
    }

    fn sync_non_desktop_display(&mut self, reported: Option<DisplayInfo>) {
        match reported {
            Some(info) => {
                if self.non_desktop_info.as_ref() != Some(&info) {
                    debug!("Non-desktop display {} updated", info.id());
                    if let Some(delegate) = &self.delegate {
                        delegate.create_or_update_non_desktop_display(&info);
                    }
                    self.non_desktop_info = Some(info);
                }
            }
            None => {
                if self.non_desktop_info.take().is_some() {
                    debug!("Non-desktop display closed");
                    if let Some(delegate) = &self.delegate {
                        delegate.close_non_desktop_display();
                    }
                }
            }
        }
    }

    // =========================================================================
    // User Configuration
    // =========================================================================

    /// Set overscan insets (DIP) of a display
    pub fn set_overscan_insets(&mut self, display_id: DisplayId, insets_in_dip: Insets) {
        let Some(info) = self.display_info.get(&display_id) else {
            warn!("Overscan requested for unknown display {}", display_id);
            return;
        };
        if info.overscan_insets_in_dip() == insets_in_dip {
            debug!("Overscan of display {} already {}", display_id, insets_in_dip);
            return;
        }
        let mut info = info.clone();
        info.set_overscan_insets(insets_in_dip);
        self.reconfigure_with(info);
    }

    /// Remove any custom overscan from a display
    pub fn clear_custom_overscan_insets(&mut self, display_id: DisplayId) {
        self.set_overscan_insets(display_id, Insets::default());
    }

    /// Rotate a display
    pub fn set_display_rotation(&mut self, display_id: DisplayId, rotation: Rotation) {
        let Some(info) = self.display_info.get(&display_id) else {
            warn!("Rotation requested for unknown display {}", display_id);
            return;
        };
        if info.rotation() == rotation {
            debug!("Display {} already at {} degrees", display_id, rotation.degrees());
            return;
        }
        let mut info = info.clone();
        info.set_rotation(rotation);
        self.reconfigure_with(info);
    }

    /// Change the UI scale of the UI scaling display
    pub fn set_display_ui_scale(&mut self, display_id: DisplayId, ui_scale: f32) {
        if self.display_id_for_ui_scaling() != Some(display_id) {
            warn!("UI scaling not available on display {}", display_id);
            return;
        }
        let Some(info) = self.display_info.get(&display_id) else {
            warn!("UI scale requested for unknown display {}", display_id);
            return;
        };
        if !ui_scale::is_supported_scale(info, ui_scale) {
            warn!("Unsupported UI scale {} for display {}", ui_scale, display_id);
            return;
        }
        if info.configured_ui_scale() == ui_scale {
            debug!("Display {} already at UI scale {}", display_id, ui_scale);
            return;
        }
        let mut info = info.clone();
        info.set_configured_ui_scale(ui_scale);
        self.reconfigure_with(info);
    }

    /// Select one of a display's advertised resolutions
    ///
    /// Choosing the best (first) resolution forgets the override.
    pub fn set_display_resolution(&mut self, display_id: DisplayId, size: Size) {
        if Some(display_id) == self.internal_display_id {
            warn!("Resolution of the internal display {} is fixed", display_id);
            return;
        }
        let Some(info) = self.display_info.get(&display_id) else {
            warn!("Resolution requested for unknown display {}", display_id);
            return;
        };
        let Some(index) = info.resolutions().iter().position(|r| r.size == size) else {
            warn!("Unsupported resolution {} requested for display {}", size, display_id);
            return;
        };

        if index == 0 {
            self.resolutions.remove(&display_id);
        } else {
            self.resolutions.insert(display_id, info.resolutions()[index]);
        }

        if info.bounds_in_native().size == size {
            debug!("Display {} already at {}", display_id, size);
            return;
        }
        let mut info = info.clone();
        let origin = info.bounds_in_native().origin;
        info.set_bounds(Rect { origin, size });
        self.reconfigure_with(info);
    }

    /// User-selected resolution of a display, if not the default one
    pub fn get_selected_resolution_for_display_id(&self, display_id: DisplayId) -> Option<Size> {
        self.resolutions.get(&display_id).map(|r| r.size)
    }

    /// Seed persisted per-display settings
    ///
    /// The UI scale is only honored for the UI scaling display.
    pub fn register_display_property(
        &mut self,
        display_id: DisplayId,
        rotation: Rotation,
        ui_scale: f32,
        overscan_insets: Option<Insets>,
        resolution: Option<Size>,
    ) {
        let ui_scaling = self.display_id_for_ui_scaling() == Some(display_id);
        let info = self
            .display_info
            .entry(display_id)
            .or_insert_with(|| DisplayInfo::new(display_id, "", false));

        info.set_rotation(rotation);
        if ui_scaling {
            info.set_configured_ui_scale(ui_scale);
        }
        if let Some(insets) = overscan_insets {
            info.set_overscan_insets(insets);
        }
        if let Some(size) = resolution {
            self.resolutions.insert(
                display_id,
                Resolution {
                    size,
                    interlaced: false,
                },
            );
        }
        debug!("Registered properties for display {}", display_id);
    }

    /// Set the work area insets of an active display
    ///
    /// Returns true if the work area changed.
    pub fn update_work_area_of_display(&mut self, display_id: DisplayId, insets: Insets) -> bool {
        let Some(display) = self.displays.iter_mut().find(|d| d.id() == display_id) else {
            return false;
        };
        let before = display.work_area();
        display.update_work_area_from_insets(insets);
        before != display.work_area()
    }

    // =========================================================================
    // Layout and Modes
    // =========================================================================

    /// Store a layout for the two active displays and re-position them
    ///
    /// `layout` is relative to the current primary display. Only the
    /// layout step runs, and only the secondary is reported as changed,
    /// provided its bounds actually moved.
    pub fn set_layout_for_current_displays(&mut self, layout: DisplayLayout) {
        if self.displays.len() != 2 {
            warn!("Layout can only be set with two active displays, have {}", self.displays.len());
            return;
        }

        let pair = self.display_id_pair_for(self.displays[0].id(), self.displays[1].id());
        let primary = self.primary_display_id.unwrap_or(pair.first);

        let current = self.layout_store.registered_layout(pair);
        let mut to_set = if pair.first == primary { layout } else { layout.invert() };
        to_set.primary_id = Some(primary);
        to_set.mirrored = current.mirrored;

        if current == to_set {
            debug!("Layout for {} unchanged", pair);
            return;
        }
        self.layout_store.register_layout_for_display_id_pair(pair, to_set);

        let mut displays = self.displays.clone();
        let moved = self
            .apply_layout(&mut displays)
            .filter(|&index| displays[index].bounds() != self.displays[index].bounds());
        self.displays = displays;

        let Some(index) = moved else {
            debug!("Layout for {} stored, displays already in place", pair);
            return;
        };

        if let Some(delegate) = &self.delegate {
            delegate.pre_display_configuration_change(false);
        }

        let secondary = &self.displays[index];
        for observer in &self.observers {
            observer.on_display_bounds_changed(secondary);
        }

        if let Some(delegate) = &self.delegate {
            delegate.post_display_configuration_change();
        }
    }

    /// Layout of the two connected displays, relative to the primary
    ///
    /// Needs exactly two connected displays; otherwise falls back to the
    /// default layout with the first display as primary.
    pub fn get_current_display_layout(&mut self) -> DisplayLayout {
        debug_assert_eq!(self.num_connected_displays, 2, "layout requested without two displays");

        if self.num_connected_displays > 1 {
            if let Some(pair) = self.current_display_id_pair() {
                return self.layout_store.compute_display_layout_for_display_id_pair(pair);
            }
        }

        warn!("Display layout requested for {} display(s)", self.num_connected_displays);
        DisplayLayout {
            primary_id: self.displays.first().map(Display::id),
            ..self.layout_store.default_display_layout()
        }
    }

    /// The two displays a layout applies to, internal/boot display first
    ///
    /// In mirroring or virtual keyboard mode the pair is the single active
    /// display and the display kept out of the desktop.
    pub fn current_display_id_pair(&self) -> Option<DisplayIdPair> {
        match self.displays.as_slice() {
            [only] => self
                .mirrored_display_id
                .or(self.non_desktop_display_id)
                .filter(|other| *other != only.id())
                .map(|other| self.display_id_pair_for(only.id(), other)),
            [a, b] => Some(self.display_id_pair_for(a.id(), b.id())),
            _ => None,
        }
    }

    /// Switch between mirroring and extended mode
    pub fn set_mirror_mode(&mut self, mirrored: bool) {
        let mode = if mirrored {
            SecondDisplayMode::Mirroring
        } else {
            SecondDisplayMode::Extended
        };
        self.set_second_display_mode(mode);
    }

    /// Change what a second display is used for
    ///
    /// Takes effect on the next reconciliation pass.
    pub fn set_second_display_mode(&mut self, mode: SecondDisplayMode) {
        info!("Second display mode {:?} -> {:?}", self.second_display_mode, mode);
        if let Some(pair) = self.current_display_id_pair() {
            self.layout_store
                .update_mirror_status(pair, mode == SecondDisplayMode::Mirroring);
        }
        self.second_display_mode = mode;
        self.mirrored_display_id = None;
        self.non_desktop_display_id = None;
    }

    /// Current second display mode
    pub fn second_display_mode(&self) -> SecondDisplayMode {
        self.second_display_mode
    }

    /// True if a display mirrors another, in software or hardware
    pub fn is_mirrored(&self) -> bool {
        self.mirrored_display_id.is_some()
    }

    // =========================================================================
    // UI Scale
    // =========================================================================

    /// Display whose UI scale may be changed
    ///
    /// The internal display when known, otherwise the primary display.
    pub fn display_id_for_ui_scaling(&self) -> Option<DisplayId> {
        if !self.config.ui_scaling_enabled {
            return None;
        }
        self.internal_display_id.or(self.primary_display_id)
    }

    /// Next UI scale step for `info`, clamped at the ends of its list
    pub fn get_next_ui_scale(info: &DisplayInfo, up: bool) -> f32 {
        ui_scale::next_ui_scale(info, up)
    }

    // =========================================================================
    // Internal Display
    // =========================================================================

    /// Designate the built-in display
    ///
    /// Can only be set once; returns false if already set.
    pub fn set_internal_display_id(&mut self, display_id: DisplayId) -> bool {
        if let Some(current) = self.internal_display_id {
            if current != display_id {
                warn!("Internal display already set to {}, ignoring {}", current, display_id);
            }
            return false;
        }
        info!("Internal display set to {}", display_id);
        self.internal_display_id = Some(display_id);
        true
    }

    /// The built-in display, if designated
    pub fn internal_display_id(&self) -> Option<DisplayId> {
        self.internal_display_id
    }

    /// True if `display_id` is the built-in display
    pub fn is_internal_display_id(&self, display_id: DisplayId) -> bool {
        self.internal_display_id == Some(display_id)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Active displays, sorted by id
    pub fn displays(&self) -> &[Display] {
        &self.displays
    }

    /// Number of active displays
    pub fn num_displays(&self) -> usize {
        self.displays.len()
    }

    /// Number of displays in the last hardware report or bootstrap
    pub fn num_connected_displays(&self) -> usize {
        self.num_connected_displays
    }

    /// Active display by id
    pub fn find_display_for_id(&self, display_id: DisplayId) -> Option<&Display> {
        self.displays.iter().find(|d| d.id() == display_id)
    }

    /// Primary display of the desktop
    pub fn primary_display(&self) -> Option<&Display> {
        self.primary_display_id.and_then(|id| self.find_display_for_id(id))
    }

    /// Stored info of any display seen so far
    pub fn display_info(&self, display_id: DisplayId) -> Option<&DisplayInfo> {
        self.display_info.get(&display_id)
    }

    /// First display seen since startup
    pub fn first_display_id(&self) -> Option<DisplayId> {
        self.first_display_id
    }

    /// Display mirroring the desktop, if any
    pub fn mirrored_display_id(&self) -> Option<DisplayId> {
        self.mirrored_display_id
    }

    /// Display hosting the virtual keyboard, if any
    pub fn non_desktop_display_id(&self) -> Option<DisplayId> {
        self.non_desktop_display_id
    }

    /// Per-pair layouts
    pub fn layout_store(&self) -> &DisplayLayoutStore {
        &self.layout_store
    }

    /// Per-pair layouts, for seeding persisted entries
    pub fn layout_store_mut(&mut self) -> &mut DisplayLayoutStore {
        &mut self.layout_store
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new(DisplayManagerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multimon::layout::Position;
    use crate::multimon::observer::{DisplayEvent, EventRecorder, MockDisplayManagerDelegate};
    use mockall::predicate::*;

    fn info(id: u64, spec: &str) -> DisplayInfo {
        DisplayInfo::from_spec(DisplayId::new(id), spec).unwrap()
    }

    fn manager_with_recorder() -> (DisplayManager, Arc<EventRecorder>) {
        let recorder = Arc::new(EventRecorder::new());
        let mut manager = DisplayManager::default();
        manager.add_observer(recorder.clone());
        manager.set_delegate(Some(recorder.clone()));
        (manager, recorder)
    }

    // =========================================================================
    // Bootstrap
    // =========================================================================

    #[test]
    fn test_init_default_display() {
        let mut manager = DisplayManager::default();
        manager.init_default_display();

        assert_eq!(manager.num_displays(), 1);
        assert_eq!(manager.displays()[0].bounds(), DEFAULT_DISPLAY_BOUNDS);
        assert_eq!(manager.primary_display().map(Display::id), manager.first_display_id());
    }

    #[test]
    fn test_init_from_spec() {
        let mut manager = DisplayManager::default();
        manager.init_from_spec("1280x800,1920x1080*2");

        assert_eq!(manager.num_displays(), 2);
        assert_eq!(manager.num_connected_displays(), 2);
        assert_eq!(manager.displays()[0].bounds(), Rect::new(0, 0, 1280, 800));
        assert_eq!(manager.displays()[1].bounds(), Rect::new(1280, 0, 960, 540));
    }

    #[test]
    fn test_init_from_bad_spec_falls_back() {
        let mut manager = DisplayManager::default();
        manager.init_from_spec("not-a-display");

        assert_eq!(manager.num_displays(), 1);
        assert_eq!(manager.displays()[0].bounds(), DEFAULT_DISPLAY_BOUNDS);
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    #[test]
    fn test_empty_report_keeps_displays() {
        let (mut manager, recorder) = manager_with_recorder();
        manager.on_native_displays_changed(vec![info(1, "1280x800")]);
        recorder.take();

        manager.on_native_displays_changed(Vec::new());

        assert_eq!(manager.num_displays(), 1);
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn test_empty_report_without_displays_creates_default() {
        let mut manager = DisplayManager::default();
        manager.on_native_displays_changed(Vec::new());

        assert_eq!(manager.num_displays(), 1);
        assert_eq!(manager.displays()[0].bounds(), DEFAULT_DISPLAY_BOUNDS);
    }

    #[test]
    fn test_clear_focus_only_on_real_removal() {
        let mut delegate = MockDisplayManagerDelegate::new();
        // Added, then one replaced by another: focus stays
        delegate
            .expect_pre_display_configuration_change()
            .with(eq(false))
            .times(2)
            .return_const(());
        // Plain removal
        delegate
            .expect_pre_display_configuration_change()
            .with(eq(true))
            .times(1)
            .return_const(());
        delegate
            .expect_post_display_configuration_change()
            .times(3)
            .return_const(());

        let mut manager = DisplayManager::default();
        manager.set_delegate(Some(Arc::new(delegate)));

        manager.on_native_displays_changed(vec![info(1, "1280x800"), info(2, "1280+0-1280x800")]);
        manager.on_native_displays_changed(vec![info(1, "1280x800"), info(3, "1280+0-1280x800")]);
        manager.on_native_displays_changed(vec![info(1, "1280x800")]);
    }

    #[test]
    fn test_identical_report_is_noop() {
        let (mut manager, recorder) = manager_with_recorder();
        let report = vec![info(1, "1280x800"), info(2, "1280+0-1920x1080")];
        manager.on_native_displays_changed(report.clone());
        recorder.take();

        manager.on_native_displays_changed(report);

        assert!(recorder.events().is_empty());
    }

    #[test]
    fn test_hardware_mirror_is_folded() {
        let mut manager = DisplayManager::default();
        manager.on_native_displays_changed(vec![info(1, "0+0-1280x800"), info(2, "0+0-1280x800")]);

        assert_eq!(manager.num_displays(), 1);
        assert_eq!(manager.mirrored_display_id(), Some(DisplayId::new(2)));
        assert!(manager.is_mirrored());
        assert!(manager.display_info(DisplayId::new(2)).is_some());
    }

    #[test]
    fn test_internal_placeholder_when_absent() {
        let mut manager = DisplayManager::new(DisplayManagerConfig {
            internal_display_id: Some(DisplayId::new(10)),
            ..Default::default()
        });
        manager.on_native_displays_changed(vec![info(20, "1920x1080")]);

        let placeholder = manager.display_info(DisplayId::new(10)).unwrap();
        assert_eq!(placeholder.bounds_in_native(), DEFAULT_DISPLAY_BOUNDS);
        assert!(placeholder.overscan_insets_in_dip().is_empty());
        assert!(manager.find_display_for_id(DisplayId::new(10)).is_none());
    }

    // =========================================================================
    // Modes
    // =========================================================================

    #[test]
    fn test_mirror_mode_keeps_source_active() {
        let (mut manager, recorder) = manager_with_recorder();
        manager.set_mirror_mode(true);
        manager.on_native_displays_changed(vec![info(1, "1280x800"), info(2, "0+800-1920x1080")]);

        assert_eq!(manager.num_displays(), 1);
        assert_eq!(manager.displays()[0].id(), DisplayId::new(1));
        assert_eq!(manager.mirrored_display_id(), Some(DisplayId::new(2)));
        assert!(recorder.events().contains(&DisplayEvent::NonDesktopUpdated(DisplayId::new(2))));
    }

    #[test]
    fn test_virtual_keyboard_mode() {
        let (mut manager, recorder) = manager_with_recorder();
        manager.set_second_display_mode(SecondDisplayMode::VirtualKeyboard);
        manager.on_native_displays_changed(vec![info(1, "1280x800"), info(2, "0+800-1920x1080/o")]);

        assert_eq!(manager.num_displays(), 1);
        assert_eq!(manager.non_desktop_display_id(), Some(DisplayId::new(2)));
        assert!(!manager.is_mirrored());
        let kept_out = manager.display_info(DisplayId::new(2)).unwrap();
        assert!(!kept_out.overscan_insets_in_dip().is_empty());

        manager.on_native_displays_changed(vec![info(1, "1280x800")]);
        assert_eq!(recorder.events().last(), Some(&DisplayEvent::NonDesktopClosed));
    }

    #[test]
    fn test_more_than_two_displays_forces_extended() {
        let mut manager = DisplayManager::default();
        manager.set_mirror_mode(true);
        manager.on_native_displays_changed(vec![
            info(1, "1280x800"),
            info(2, "0+800-1280x800"),
            info(3, "0+1600-1280x800"),
        ]);

        assert_eq!(manager.second_display_mode(), SecondDisplayMode::Extended);
        assert_eq!(manager.num_displays(), 3);
        assert_eq!(manager.displays()[2].bounds(), Rect::new(2560, 0, 1280, 800));
    }

    #[test]
    fn test_mode_change_clears_recorded_ids() {
        let mut manager = DisplayManager::default();
        manager.set_mirror_mode(true);
        manager.on_native_displays_changed(vec![info(1, "1280x800"), info(2, "0+800-1280x800")]);
        assert!(manager.mirrored_display_id().is_some());

        manager.set_mirror_mode(false);
        assert!(manager.mirrored_display_id().is_none());
        assert_eq!(manager.num_displays(), 1);

        manager.reconfigure_current_displays();
        assert_eq!(manager.num_displays(), 2);
    }

    #[test]
    fn test_overscan_survives_mirroring_round_trip() {
        let mut manager = DisplayManager::default();
        manager.on_native_displays_changed(vec![info(1, "1280x800"), info(2, "1280+0-1920x1080")]);
        let insets = Insets::new(10, 10, 10, 10);
        manager.set_overscan_insets(DisplayId::new(2), insets);
        assert_eq!(manager.find_display_for_id(DisplayId::new(2)).unwrap().bounds().width(), 1900);

        manager.set_mirror_mode(true);
        manager.reconfigure_current_displays();
        assert_eq!(manager.mirrored_display_id(), Some(DisplayId::new(2)));
        let stored = manager.display_info(DisplayId::new(2)).unwrap();
        assert_eq!(stored.overscan_insets_in_dip(), insets);

        manager.set_mirror_mode(false);
        manager.reconfigure_current_displays();
        assert_eq!(manager.num_displays(), 2);
        let stored = manager.display_info(DisplayId::new(2)).unwrap();
        assert_eq!(stored.overscan_insets_in_dip(), insets);
        assert_eq!(manager.find_display_for_id(DisplayId::new(2)).unwrap().bounds().width(), 1900);
    }

    // =========================================================================
    // User Configuration
    // =========================================================================

    #[test]
    fn test_rotation_change_and_noop() {
        let (mut manager, recorder) = manager_with_recorder();
        manager.on_native_displays_changed(vec![info(1, "1280x800")]);
        recorder.take();

        manager.set_display_rotation(DisplayId::new(1), Rotation::Rotate90);
        assert_eq!(manager.displays()[0].bounds(), Rect::new(0, 0, 800, 1280));
        assert_eq!(
            recorder.display_events(),
            vec![DisplayEvent::BoundsChanged(DisplayId::new(1), Rect::new(0, 0, 800, 1280))]
        );
        recorder.take();

        manager.set_display_rotation(DisplayId::new(1), Rotation::Rotate90);
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn test_rotation_survives_hardware_report() {
        let mut manager = DisplayManager::default();
        manager.on_native_displays_changed(vec![info(1, "1280x800")]);
        manager.set_display_rotation(DisplayId::new(1), Rotation::Rotate270);

        manager.on_native_displays_changed(vec![info(1, "1280x800")]);
        assert_eq!(manager.displays()[0].rotation(), Rotation::Rotate270);
    }

    #[test]
    fn test_overscan_shrinks_display() {
        let mut manager = DisplayManager::default();
        manager.on_native_displays_changed(vec![info(1, "1280x800")]);

        manager.set_overscan_insets(DisplayId::new(1), Insets::new(10, 20, 30, 40));
        assert_eq!(manager.displays()[0].bounds(), Rect::new(0, 0, 1220, 760));

        manager.clear_custom_overscan_insets(DisplayId::new(1));
        assert_eq!(manager.displays()[0].bounds(), Rect::new(0, 0, 1280, 800));
    }

    #[test]
    fn test_settings_for_disconnected_display_are_stored() {
        let (mut manager, recorder) = manager_with_recorder();
        manager.on_native_displays_changed(vec![info(1, "1280x800"), info(2, "1280+0-1280x800")]);
        manager.on_native_displays_changed(vec![info(1, "1280x800")]);
        recorder.take();

        manager.set_display_rotation(DisplayId::new(2), Rotation::Rotate180);
        assert!(recorder.events().is_empty());
        assert_eq!(
            manager.display_info(DisplayId::new(2)).map(DisplayInfo::rotation),
            Some(Rotation::Rotate180)
        );
    }

    #[test]
    fn test_ui_scale_only_on_internal_display() {
        let mut manager = DisplayManager::new(DisplayManagerConfig {
            internal_display_id: Some(DisplayId::new(1)),
            ..Default::default()
        });
        manager.on_native_displays_changed(vec![info(1, "1280x800"), info(2, "1280+0-1920x1080")]);

        manager.set_display_ui_scale(DisplayId::new(2), 0.8);
        assert_eq!(manager.display_info(DisplayId::new(2)).unwrap().configured_ui_scale(), 1.0);

        manager.set_display_ui_scale(DisplayId::new(1), 0.7);
        assert_eq!(manager.display_info(DisplayId::new(1)).unwrap().configured_ui_scale(), 1.0);

        manager.set_display_ui_scale(DisplayId::new(1), 0.8);
        assert_eq!(manager.display_info(DisplayId::new(1)).unwrap().configured_ui_scale(), 0.8);
        assert_eq!(manager.displays()[0].bounds(), Rect::new(0, 0, 1024, 640));
    }

    #[test]
    fn test_ui_scaling_disabled() {
        let mut manager = DisplayManager::new(DisplayManagerConfig {
            ui_scaling_enabled: false,
            ..Default::default()
        });
        manager.on_native_displays_changed(vec![info(1, "1280x800")]);

        assert_eq!(manager.display_id_for_ui_scaling(), None);
        manager.set_display_ui_scale(DisplayId::new(1), 0.8);
        assert_eq!(manager.display_info(DisplayId::new(1)).unwrap().configured_ui_scale(), 1.0);
    }

    #[test]
    fn test_resolution_selection() {
        let mut manager = DisplayManager::default();
        manager.on_native_displays_changed(vec![
            info(1, "1280x800"),
            info(2, "1280+0-1920x1080#1920x1080|1280x720"),
        ]);
        let external = DisplayId::new(2);

        manager.set_display_resolution(external, Size::new(800, 600));
        assert_eq!(manager.get_selected_resolution_for_display_id(external), None);

        manager.set_display_resolution(external, Size::new(1280, 720));
        assert_eq!(
            manager.get_selected_resolution_for_display_id(external),
            Some(Size::new(1280, 720))
        );
        let display = manager.find_display_for_id(external).unwrap();
        assert_eq!(display.bounds().size, Size::new(1280, 720));

        manager.set_display_resolution(external, Size::new(1920, 1080));
        assert_eq!(manager.get_selected_resolution_for_display_id(external), None);
    }

    #[test]
    fn test_resolution_override_applied_to_reports() {
        let mut manager = DisplayManager::default();
        let report = vec![info(1, "1280x800"), info(2, "1280+0-1920x1080#1920x1080|1280x720")];
        manager.on_native_displays_changed(report.clone());
        manager.set_display_resolution(DisplayId::new(2), Size::new(1280, 720));

        manager.on_native_displays_changed(report);
        let external = manager.find_display_for_id(DisplayId::new(2)).unwrap();
        assert_eq!(external.bounds().size, Size::new(1280, 720));
    }

    #[test]
    fn test_resolution_fixed_on_internal_display() {
        let mut manager = DisplayManager::new(DisplayManagerConfig {
            internal_display_id: Some(DisplayId::new(1)),
            ..Default::default()
        });
        manager.on_native_displays_changed(vec![info(1, "1280x800#1280x800|1024x768")]);

        manager.set_display_resolution(DisplayId::new(1), Size::new(1024, 768));
        assert_eq!(manager.get_selected_resolution_for_display_id(DisplayId::new(1)), None);
        assert_eq!(manager.displays()[0].bounds().size, Size::new(1280, 800));
    }

    #[test]
    fn test_register_display_property_applies_on_connect() {
        let mut manager = DisplayManager::default();
        manager.register_display_property(
            DisplayId::new(5),
            Rotation::Rotate90,
            1.0,
            Some(Insets::new(10, 10, 10, 10)),
            None,
        );

        manager.on_native_displays_changed(vec![info(5, "1280x800")]);
        assert_eq!(manager.displays()[0].bounds(), Rect::new(0, 0, 780, 1260));
    }

    #[test]
    fn test_work_area_update() {
        let mut manager = DisplayManager::default();
        manager.on_native_displays_changed(vec![info(1, "1280x800")]);

        assert!(manager.update_work_area_of_display(DisplayId::new(1), Insets::new(0, 0, 48, 0)));
        assert!(!manager.update_work_area_of_display(DisplayId::new(1), Insets::new(0, 0, 48, 0)));
        assert!(!manager.update_work_area_of_display(DisplayId::new(9), Insets::default()));
        assert_eq!(manager.displays()[0].work_area(), Rect::new(0, 0, 1280, 752));

        manager.set_display_rotation(DisplayId::new(1), Rotation::Rotate180);
        assert_eq!(manager.displays()[0].work_area(), Rect::new(0, 0, 1280, 752));
    }

    #[test]
    fn test_internal_display_set_once() {
        let mut manager = DisplayManager::default();
        assert!(manager.set_internal_display_id(DisplayId::new(1)));
        assert!(!manager.set_internal_display_id(DisplayId::new(2)));
        assert!(manager.is_internal_display_id(DisplayId::new(1)));
    }

    // =========================================================================
    // Layout
    // =========================================================================

    #[test]
    fn test_set_layout_moves_secondary_only() {
        let (mut manager, recorder) = manager_with_recorder();
        manager.on_native_displays_changed(vec![info(1, "1280x800"), info(2, "1280+0-1920x1080")]);
        recorder.take();

        manager.set_layout_for_current_displays(DisplayLayout::new(Position::Bottom, 20));

        assert_eq!(manager.displays()[1].bounds(), Rect::new(20, 800, 1920, 1080));
        assert_eq!(
            recorder.events(),
            vec![
                DisplayEvent::PreConfigurationChange { clear_focus: false },
                DisplayEvent::BoundsChanged(DisplayId::new(2), Rect::new(20, 800, 1920, 1080)),
                DisplayEvent::PostConfigurationChange,
            ]
        );

        recorder.take();
        manager.set_layout_for_current_displays(DisplayLayout::new(Position::Bottom, 20));
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn test_set_layout_clamped_to_same_bounds_is_silent() {
        let (mut manager, recorder) = manager_with_recorder();
        manager.on_native_displays_changed(vec![info(1, "1280x800"), info(2, "1280+0-1920x1080")]);

        manager.set_layout_for_current_displays(DisplayLayout::new(Position::Right, 5000));
        assert_eq!(manager.displays()[1].bounds(), Rect::new(1280, 700, 1920, 1080));
        recorder.take();

        manager.set_layout_for_current_displays(DisplayLayout::new(Position::Right, 6000));
        assert!(recorder.events().is_empty());
        assert_eq!(manager.get_current_display_layout().offset, 6000);
        assert_eq!(manager.displays()[1].bounds(), Rect::new(1280, 700, 1920, 1080));
    }

    #[test]
    fn test_current_layout_round_trip() {
        let mut manager = DisplayManager::default();
        manager.on_native_displays_changed(vec![info(1, "1280x800"), info(2, "1280+0-1920x1080")]);

        manager.set_layout_for_current_displays(DisplayLayout::new(Position::Left, -50));
        let layout = manager.get_current_display_layout();

        assert_eq!(layout.position, Position::Left);
        assert_eq!(layout.offset, -50);
        assert_eq!(layout.primary_id, Some(DisplayId::new(1)));
    }

    #[test]
    fn test_set_layout_needs_two_displays() {
        let (mut manager, recorder) = manager_with_recorder();
        manager.on_native_displays_changed(vec![info(1, "1280x800")]);
        recorder.take();

        manager.set_layout_for_current_displays(DisplayLayout::new(Position::Top, 0));
        assert!(recorder.events().is_empty());
        assert!(manager.layout_store().is_empty());
    }
}
