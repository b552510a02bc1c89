//! Batch tab moving.
//!
//! Moves happen in bounded batches because hosts get unstable when a single
//! call carries hundreds of tabs. Within one run the batches are strictly
//! sequential: a batch is not issued until the previous host call resolved.
//! Pinned tabs are moved first, into the destination's pinned region; then
//! unpinned tabs are appended. Nothing is transactional: batches already
//! moved stay moved if a later one fails.

use std::collections::HashSet;

use tracing::debug;

use super::focus;
use super::progress::Progress;
use crate::host::{CreateWindow, InsertPos, Result, TabHost, TabId, WindowHost, WindowId};
use crate::message::MoveKind;
use crate::monitor::FocusMonitor;

/// Tabs per host move call.
pub(crate) const BULK_SIZE: usize = 5;

/// A partitioned move, borrowed for the duration of one run.
struct MovePlan<'a> {
    pinned: &'a [TabId],
    unpinned: &'a [TabId],
    /// Every tab the whole operation takes away, pinned and unpinned alike.
    moving: &'a HashSet<TabId>,
}

/// Resolve a selection criterion into a concrete tab list, sorted by index.
pub async fn listing<H: TabHost>(host: &H, tab: TabId, kind: MoveKind) -> Result<Vec<TabId>> {
    if kind == MoveKind::One {
        return Ok(vec![tab]);
    }
    if matches!(kind, MoveKind::Select | MoveKind::Raw) {
        debug!("listing called with non-criterion kind {kind:?}");
        return Ok(Vec::new());
    }

    let anchor = host.get_tab(tab).await?;
    let mut tabs = host.list_tabs(anchor.window_id).await?;
    match kind {
        MoveKind::Right => tabs.retain(|t| t.index > anchor.index),
        MoveKind::Left => tabs.retain(|t| t.index < anchor.index),
        _ => {}
    }
    tabs.sort_by_key(|t| t.index);
    Ok(tabs.into_iter().map(|t| t.id).collect())
}

/// Move `tab_ids` to `to`, or to a freshly created window when `to` is
/// `None`. Progress counters are bumped as each batch resolves. An empty
/// list returns immediately.
pub async fn run<H>(
    host: &H,
    monitor: &FocusMonitor,
    tab_ids: &[TabId],
    to: Option<WindowId>,
    progress: &Progress,
    focus: bool,
) -> Result<()>
where
    H: TabHost + WindowHost,
{
    if tab_ids.is_empty() {
        return Ok(());
    }

    let moving: HashSet<TabId> = tab_ids.iter().copied().collect();
    let mut pinned = Vec::new();
    let mut unpinned = Vec::new();
    let mut rescued: HashSet<WindowId> = HashSet::new();
    for &id in tab_ids {
        let tab = host.get_tab(id).await?;
        if tab.pinned {
            pinned.push(id);
        } else {
            unpinned.push(id);
        }
        // Rescue focus once per source window whose active tab is leaving.
        if tab.active && rescued.insert(tab.window_id) {
            focus::activate_best(host, tab.window_id, &moving).await?;
        }
    }

    let plan = MovePlan {
        pinned: &pinned,
        unpinned: &unpinned,
        moving: &moving,
    };
    match to {
        Some(window) => run_with_window(host, monitor, &plan, window, progress, focus).await,
        None => run_with_new_window(host, monitor, &plan, progress, focus).await,
    }
}

/// Index just past the destination's last pinned tab.
async fn next_pinned_slot<H: TabHost>(host: &H, window: WindowId) -> Result<u32> {
    let tabs = host.list_tabs(window).await?;
    Ok(tabs.iter().filter(|t| t.pinned).map(|t| t.index + 1).max().unwrap_or(0))
}

/// One host move call, with a last-moment focus re-check: if an activation
/// slipped in since partitioning, the selector runs again before the batch
/// leaves.
async fn move_batch<H>(
    host: &H,
    monitor: &FocusMonitor,
    batch: &[TabId],
    to: WindowId,
    pos: InsertPos,
    moving: &HashSet<TabId>,
    focus: bool,
) -> Result<()>
where
    H: TabHost + WindowHost,
{
    if let Some(&active) = batch.iter().find(|&&id| monitor.is_active_tab(id)) {
        let tab = host.get_tab(active).await?;
        focus::activate_best(host, tab.window_id, moving).await?;
    }
    let moved = host.move_tabs(batch, to, pos).await?;
    if focus {
        host.focus_window(to).await?;
        if let Some(last) = moved.last() {
            host.activate_tab(last.id).await?;
        }
    }
    debug!("moved {} tabs to window {to} at {pos:?}", batch.len());
    Ok(())
}

async fn run_with_window<H>(
    host: &H,
    monitor: &FocusMonitor,
    plan: &MovePlan<'_>,
    to: WindowId,
    progress: &Progress,
    focus: bool,
) -> Result<()>
where
    H: TabHost + WindowHost,
{
    if !plan.pinned.is_empty() {
        let slot = next_pinned_slot(host, to).await?;
        // Later chunks go first at a constant index; earlier chunks then land
        // in front of them, so the original order survives the batching.
        let mut hi = plan.pinned.len();
        while hi > 0 {
            let lo = hi.saturating_sub(BULK_SIZE);
            let batch = &plan.pinned[lo..hi];
            let last_batch = lo == 0 && plan.unpinned.is_empty();
            move_batch(host, monitor, batch, to, InsertPos::At(slot), plan.moving, focus && last_batch)
                .await?;
            progress.add_done(batch.len());
            hi = lo;
        }
    }

    if !plan.unpinned.is_empty() {
        let total = plan.unpinned.chunks(BULK_SIZE).count();
        for (i, batch) in plan.unpinned.chunks(BULK_SIZE).enumerate() {
            let last_batch = i + 1 == total;
            move_batch(host, monitor, batch, to, InsertPos::Append, plan.moving, focus && last_batch)
                .await?;
            progress.add_done(batch.len());
        }
    }
    Ok(())
}

async fn run_with_new_window<H>(
    host: &H,
    monitor: &FocusMonitor,
    plan: &MovePlan<'_>,
    progress: &Progress,
    focus: bool,
) -> Result<()>
where
    H: TabHost + WindowHost,
{
    // The window is created empty save for a host placeholder tab; passing
    // the real tabs to creation fails for unloaded tabs on some hosts.
    let (first, rest_pinned, rest_unpinned) = if !plan.pinned.is_empty() {
        let take = plan.pinned.len().min(BULK_SIZE);
        (&plan.pinned[..take], &plan.pinned[take..], plan.unpinned)
    } else {
        let take = plan.unpinned.len().min(BULK_SIZE);
        (&plan.unpinned[..take], plan.pinned, &plan.unpinned[take..])
    };

    let window = host.create_window(CreateWindow::default()).await?;
    let placeholders: Vec<TabId> = window.tabs.iter().map(|t| t.id).collect();
    let last_batch = rest_pinned.is_empty() && rest_unpinned.is_empty();
    move_batch(
        host,
        monitor,
        first,
        window.id,
        InsertPos::At(0),
        plan.moving,
        focus && last_batch,
    )
    .await?;
    if !placeholders.is_empty() {
        host.remove_tabs(&placeholders).await?;
    }
    progress.add_done(first.len());

    let rest = MovePlan {
        pinned: rest_pinned,
        unpinned: rest_unpinned,
        moving: plan.moving,
    };
    run_with_window(host, monitor, &rest, window.id, progress, focus).await
}
