//! Best-focus selection before a move.
//!
//! When the active tab of a window is about to move away, the host picks its
//! own replacement, and that replacement may be an unloaded tab; focusing it
//! forces a page load the user never asked for. [`activate_best`] preempts
//! that by activating a tab that is not part of the move: the nearest
//! non-moving tab after the active one, else the nearest before it, else the
//! last tab of the window.

use std::collections::HashSet;

use tracing::debug;

use crate::host::{Result, Tab, TabHost, TabId, WindowId};

/// Outcome of the selection over one window snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// The active tab is staying put; nothing to do.
    KeepCurrent,
    /// Explicitly activate this tab before the move.
    Activate(TabId),
    /// The chosen tab is the active tab's immediate successor; removing the
    /// active tab shifts focus there on its own, so skip the host call.
    NaturalShift,
}

/// Pure selection over a window snapshot. `moving` is the full set of tabs
/// the current operation will take out of the window.
pub(crate) fn pick_best(tabs: &[Tab], moving: &HashSet<TabId>) -> Verdict {
    let Some(active) = tabs.iter().find(|t| t.active) else {
        return Verdict::KeepCurrent;
    };
    if !moving.contains(&active.id) {
        return Verdict::KeepCurrent;
    }

    let last = tabs.iter().max_by_key(|t| t.index);
    // Nearest non-moving tab after the active one, and nearest before it.
    let mut next: Option<&Tab> = None;
    let mut prev: Option<&Tab> = None;
    for tab in tabs.iter().filter(|t| !moving.contains(&t.id)) {
        if tab.index < active.index {
            if prev.map_or(true, |p| tab.index > p.index) {
                prev = Some(tab);
            }
        } else if next.map_or(true, |n| tab.index < n.index) {
            next = Some(tab);
        }
    }

    let Some(best) = next.or(prev).or(last) else {
        return Verdict::KeepCurrent;
    };
    if best.id == active.id {
        // Everything moves and the active tab was already the last one.
        Verdict::KeepCurrent
    } else if active.index + 1 == best.index {
        Verdict::NaturalShift
    } else {
        Verdict::Activate(best.id)
    }
}

/// Ensure `window` will not be left focused on an unloaded tab once the tabs
/// in `moving` leave it. Performs at most one activation call.
pub async fn activate_best<H: TabHost>(
    host: &H,
    window: WindowId,
    moving: &HashSet<TabId>,
) -> Result<()> {
    let tabs = host.list_tabs(window).await?;
    match pick_best(&tabs, moving) {
        Verdict::Activate(tab) => {
            host.activate_tab(tab).await?;
            debug!("activated tab {tab} in window {window} ahead of a move");
            Ok(())
        }
        Verdict::KeepCurrent | Verdict::NaturalShift => Ok(()),
    }
}
