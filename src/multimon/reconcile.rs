//! Display Reconciliation
//!
//! Merge-diff of the active display list against a fresh, id-sorted list of
//! display infos. Everything here is a pure function of its inputs; the
//! [`DisplayManager`](super::DisplayManager) commits the result and sends
//! notifications.

use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace};

use super::manager::SecondDisplayMode;
use crate::display::{Display, DisplayId, DisplayInfo, Insets, Point};

/// Inputs besides the two lists being merged
#[derive(Debug, Clone, Copy)]
pub struct ReconcileContext<'a> {
    /// Infos as stored before this pass
    pub infos: &'a BTreeMap<DisplayId, DisplayInfo>,
    /// Display kept out of the active list (mirror target or non-desktop)
    pub excluded_id: Option<DisplayId>,
    /// Report every surviving display as changed
    pub force_bounds_changed: bool,
}

/// Outcome of one merge pass
#[derive(Debug, Clone, Default)]
pub struct ReconcileResult {
    /// New active list, sorted by id, every display at the origin
    pub displays: Vec<Display>,
    /// Indices into `displays` of new displays
    pub added: Vec<usize>,
    /// Indices into `displays` of displays whose geometry changed
    pub changed: Vec<usize>,
    /// Displays that left the active list
    pub removed: Vec<Display>,
    /// Merged infos to store, including the excluded display's
    pub infos: Vec<DisplayInfo>,
    /// Merged info of the excluded display, if it was reported
    pub non_desktop: Option<DisplayInfo>,
}

impl ReconcileResult {
    /// True if nothing was added, changed or removed
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Pick the display that becomes the mirror target or non-desktop display
///
/// Only applies outside extended mode and with exactly two displays. The
/// source is, in order of preference: the first display seen since boot, the
/// internal display, the lower id. The other display is the target.
pub fn select_second_display_target(
    mode: SecondDisplayMode,
    new_infos: &[DisplayInfo],
    first_display_id: Option<DisplayId>,
    internal_display_id: Option<DisplayId>,
) -> Option<DisplayId> {
    if mode == SecondDisplayMode::Extended || new_infos.len() != 2 {
        return None;
    }

    let (a, b) = (new_infos[0].id(), new_infos[1].id());
    let source = [first_display_id, internal_display_id]
        .into_iter()
        .flatten()
        .find(|id| *id == a || *id == b)
        .unwrap_or_else(|| a.min(b));

    let target = if source == a { b } else { a };
    debug!("{:?}: source display {}, target display {}", mode, source, target);
    Some(target)
}

/// Split hardware-mirrored duplicates off a report
///
/// Displays whose native origin matches one already seen show the same
/// content and are returned separately. The report is sorted by id first,
/// so the lowest id at each origin stays.
pub fn fold_hardware_mirrors(mut report: Vec<DisplayInfo>) -> (Vec<DisplayInfo>, Vec<DisplayInfo>) {
    report.sort_by_key(DisplayInfo::id);

    let mut origins: HashSet<Point> = HashSet::new();
    let mut unique = Vec::with_capacity(report.len());
    let mut mirrored = Vec::new();

    for info in report {
        if origins.insert(info.bounds_in_native().origin) {
            unique.push(info);
        } else {
            debug!("Display {} mirrors another output in hardware", info.id());
            mirrored.push(info);
        }
    }

    (unique, mirrored)
}

/// Store-ready info: the previous entry updated with the report, or the
/// report itself for a display never seen before
pub fn merge_info(infos: &BTreeMap<DisplayId, DisplayInfo>, report: &DisplayInfo) -> DisplayInfo {
    match infos.get(&report.id()) {
        Some(stored) => {
            let mut merged = stored.clone();
            merged.merge_from(report);
            merged
        }
        None => {
            let mut fresh = report.clone();
            fresh.set_native(false);
            fresh
        }
    }
}

/// Merge-diff `old` (active displays) against `new` (reported infos)
///
/// Both lists must be sorted by id. Displays present in both keep their work
/// area insets; they are reported as changed only when native bounds,
/// device scale, pixel size or rotation moved.
pub fn reconcile(
    old: &[Display],
    new: &[DisplayInfo],
    ctx: &ReconcileContext<'_>,
) -> ReconcileResult {
    debug_assert!(old.windows(2).all(|w| w[0].id() < w[1].id()), "active list must be id-sorted");
    debug_assert!(new.windows(2).all(|w| w[0].id() < w[1].id()), "new list must be id-sorted");

    let mut result = ReconcileResult::default();
    let mut curr = 0;
    let mut next = 0;

    while curr < old.len() || next < new.len() {
        if let Some(info) = new.get(next) {
            if Some(info.id()) == ctx.excluded_id {
                let merged = merge_info(ctx.infos, info);
                trace!("Display {} kept out of the desktop", merged.id());
                // Stored info keeps user overscan for when the display rejoins
                let mut non_desktop = merged.clone();
                non_desktop.set_overscan_insets(Insets::default());
                result.non_desktop = Some(non_desktop);
                result.infos.push(merged);
                next += 1;

                if let Some(current) = old.get(curr) {
                    if current.id() == info.id() {
                        result.removed.push(current.clone());
                        curr += 1;
                    }
                }
                continue;
            }
        }

        match (old.get(curr), new.get(next)) {
            (None, Some(info)) => {
                add_display(&mut result, ctx, info);
                next += 1;
            }
            (Some(current), None) => {
                trace!("Display {} removed", current.id());
                result.removed.push(current.clone());
                curr += 1;
            }
            (Some(current), Some(info)) if current.id() == info.id() => {
                update_display(&mut result, ctx, current, info);
                curr += 1;
                next += 1;
            }
            (Some(current), Some(info)) if current.id() < info.id() => {
                trace!("Display {} removed", current.id());
                result.removed.push(current.clone());
                curr += 1;
            }
            (Some(_), Some(info)) => {
                add_display(&mut result, ctx, info);
                next += 1;
            }
            (None, None) => break,
        }
    }

    result
}

fn add_display(result: &mut ReconcileResult, ctx: &ReconcileContext<'_>, info: &DisplayInfo) {
    let merged = merge_info(ctx.infos, info);
    trace!("Display {} added", merged.id());
    result.added.push(result.displays.len());
    result.displays.push(Display::from_info(&merged));
    result.infos.push(merged);
}

fn update_display(
    result: &mut ReconcileResult,
    ctx: &ReconcileContext<'_>,
    current: &Display,
    info: &DisplayInfo,
) {
    let merged = merge_info(ctx.infos, info);
    let mut display = Display::from_info(&merged);

    let changed = ctx.force_bounds_changed
        || match ctx.infos.get(&current.id()) {
            Some(previous) => {
                previous.bounds_in_native() != merged.bounds_in_native()
                    || previous.size_in_pixel() != merged.size_in_pixel()
            }
            None => true,
        }
        || current.device_scale_factor() != display.device_scale_factor()
        || current.rotation() != display.rotation();

    if changed {
        trace!("Display {} changed", current.id());
        result.changed.push(result.displays.len());
    }

    display.update_work_area_from_insets(current.work_area_insets());
    result.displays.push(display);
    result.infos.push(merged);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Rect;

    fn info(id: u64, spec: &str) -> DisplayInfo {
        let mut info = DisplayInfo::from_spec(DisplayId::new(id), spec).unwrap();
        info.set_native(true);
        info
    }

    fn ctx(infos: &BTreeMap<DisplayId, DisplayInfo>) -> ReconcileContext<'_> {
        ReconcileContext {
            infos,
            excluded_id: None,
            force_bounds_changed: false,
        }
    }

    /// Run a pass and return the committed state, like the manager would
    fn commit(
        old: &[Display],
        new: &[DisplayInfo],
        infos: &mut BTreeMap<DisplayId, DisplayInfo>,
    ) -> (ReconcileResult, Vec<Display>) {
        let result = reconcile(old, new, &ctx(infos));
        for merged in &result.infos {
            infos.insert(merged.id(), merged.clone());
        }
        let displays = result.displays.clone();
        (result, displays)
    }

    // =========================================================================
    // Merge Pass
    // =========================================================================

    #[test]
    fn test_all_added_from_empty() {
        let mut infos = BTreeMap::new();
        let new = vec![info(1, "1920x1080"), info(2, "1920+0-1280x1024")];

        let (result, displays) = commit(&[], &new, &mut infos);

        assert_eq!(result.added, vec![0, 1]);
        assert!(result.changed.is_empty());
        assert!(result.removed.is_empty());
        assert_eq!(displays.len(), 2);
        assert_eq!(displays[1].bounds(), Rect::new(0, 0, 1280, 1024));
        assert!(!infos[&DisplayId::new(1)].native());
    }

    #[test]
    fn test_identical_report_is_noop() {
        let mut infos = BTreeMap::new();
        let new = vec![info(1, "1920x1080"), info(2, "1920+0-1280x1024")];
        let (_, displays) = commit(&[], &new, &mut infos);

        let (result, _) = commit(&displays, &new, &mut infos);
        assert!(result.is_noop());
    }

    #[test]
    fn test_removed_and_added_interleaved() {
        let mut infos = BTreeMap::new();
        let (_, displays) = commit(&[], &[info(1, "800x600"), info(3, "800x600")], &mut infos);

        let (result, displays) = commit(
            &displays,
            &[info(2, "1024x768"), info(3, "800x600"), info(4, "640x480")],
            &mut infos,
        );

        let removed: Vec<_> = result.removed.iter().map(Display::id).collect();
        assert_eq!(removed, vec![DisplayId::new(1)]);
        assert_eq!(result.added, vec![0, 2]);
        assert!(result.changed.is_empty());
        let ids: Vec<_> = displays.iter().map(Display::id).collect();
        assert_eq!(ids, vec![DisplayId::new(2), DisplayId::new(3), DisplayId::new(4)]);
    }

    #[test]
    fn test_resolution_change_is_changed() {
        let mut infos = BTreeMap::new();
        let (_, displays) = commit(&[], &[info(1, "1920x1080")], &mut infos);

        let (result, displays) = commit(&displays, &[info(1, "1280x720")], &mut infos);

        assert_eq!(result.changed, vec![0]);
        assert_eq!(displays[0].bounds().size.width, 1280);
    }

    #[test]
    fn test_native_origin_change_is_changed() {
        let mut infos = BTreeMap::new();
        let (_, displays) = commit(&[], &[info(1, "1920x1080")], &mut infos);

        let (result, _) = commit(&displays, &[info(1, "10+0-1920x1080")], &mut infos);
        assert_eq!(result.changed, vec![0]);
    }

    #[test]
    fn test_force_bounds_changed() {
        let mut infos = BTreeMap::new();
        let new = vec![info(1, "1920x1080")];
        let (_, displays) = commit(&[], &new, &mut infos);

        let result = reconcile(
            &displays,
            &new,
            &ReconcileContext {
                infos: &infos,
                excluded_id: None,
                force_bounds_changed: true,
            },
        );
        assert_eq!(result.changed, vec![0]);
    }

    #[test]
    fn test_work_area_preserved_across_update() {
        let mut infos = BTreeMap::new();
        let (_, mut displays) = commit(&[], &[info(1, "1920x1080")], &mut infos);
        displays[0].update_work_area_from_insets(Insets::new(0, 0, 48, 0));

        let (_, displays) = commit(&displays, &[info(1, "1920x1080")], &mut infos);
        assert_eq!(displays[0].work_area_insets(), Insets::new(0, 0, 48, 0));
    }

    // =========================================================================
    // Excluded Display
    // =========================================================================

    #[test]
    fn test_excluded_display_leaves_active_list() {
        let mut infos = BTreeMap::new();
        let new = vec![info(1, "1920x1080"), info(2, "1920+0-1280x1024/o")];
        let (_, displays) = commit(&[], &new, &mut infos);

        let result = reconcile(
            &displays,
            &new,
            &ReconcileContext {
                infos: &infos,
                excluded_id: Some(DisplayId::new(2)),
                force_bounds_changed: false,
            },
        );

        assert_eq!(result.displays.len(), 1);
        assert_eq!(result.removed.len(), 1);
        assert_eq!(result.removed[0].id(), DisplayId::new(2));
        let non_desktop = result.non_desktop.unwrap();
        assert_eq!(non_desktop.id(), DisplayId::new(2));
        assert!(non_desktop.overscan_insets_in_dip().is_empty());
        assert_eq!(result.infos.len(), 2);

        let stored = result.infos.iter().find(|i| i.id() == DisplayId::new(2)).unwrap();
        let before = infos[&DisplayId::new(2)].overscan_insets_in_dip();
        assert_eq!(stored.overscan_insets_in_dip(), before);
        assert!(!stored.overscan_insets_in_dip().is_empty());
    }

    // =========================================================================
    // Target Selection
    // =========================================================================

    #[test]
    fn test_target_requires_two_displays_and_non_extended_mode() {
        let two = vec![info(1, "800x600"), info(2, "800x600")];
        let three = vec![info(1, "800x600"), info(2, "800x600"), info(3, "800x600")];

        let extended = select_second_display_target(SecondDisplayMode::Extended, &two, None, None);
        assert_eq!(extended, None);
        let crowded =
            select_second_display_target(SecondDisplayMode::Mirroring, &three, None, None);
        assert_eq!(crowded, None);
    }

    #[test]
    fn test_target_source_preference() {
        let two = vec![info(1, "800x600"), info(2, "800x600")];
        let mode = SecondDisplayMode::Mirroring;
        let (one, two_id) = (DisplayId::new(1), DisplayId::new(2));

        // First display seen at boot wins
        assert_eq!(select_second_display_target(mode, &two, Some(two_id), Some(one)), Some(one));
        // Then the internal display
        assert_eq!(select_second_display_target(mode, &two, None, Some(two_id)), Some(one));
        let target =
            select_second_display_target(mode, &two, Some(DisplayId::new(9)), Some(two_id));
        assert_eq!(target, Some(one));
        // Then the lower id
        assert_eq!(select_second_display_target(mode, &two, None, None), Some(two_id));
    }

    // =========================================================================
    // Hardware Mirrors
    // =========================================================================

    #[test]
    fn test_fold_hardware_mirrors() {
        let report = vec![
            info(3, "0+0-1920x1080"),
            info(1, "0+0-1920x1080"),
            info(2, "1920+0-1280x1024"),
        ];

        let (unique, mirrored) = fold_hardware_mirrors(report);

        let ids: Vec<_> = unique.iter().map(DisplayInfo::id).collect();
        assert_eq!(ids, vec![DisplayId::new(1), DisplayId::new(2)]);
        assert_eq!(mirrored.len(), 1);
        assert_eq!(mirrored[0].id(), DisplayId::new(3));
    }
}
