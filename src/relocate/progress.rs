//! Progress accounting and the notification wrapper around a relocation.
//!
//! Every relocation enters through [`wrapped_run`] or [`wrapped_raw_run`].
//! The wrapper is the error boundary: host failures are logged, optionally
//! surfaced as a failure notification, and never propagated further, so no
//! relocation leaves an unhandled error behind. With notifications on,
//! a ticker re-announces progress every [`NOTIFICATION_INTERVAL`] until the
//! operation settles.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, warn};

use super::mover;
use crate::host::{NotificationSink, TabHost, TabId, WindowHost, WindowId};
use crate::message::MoveKind;
use crate::monitor::FocusMonitor;

/// Cadence of intermediate progress notifications.
pub(crate) const NOTIFICATION_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Default)]
struct Inner {
    done: usize,
    start: Option<Instant>,
    end: Option<Instant>,
    error: Option<String>,
}

/// Counters for one relocation. Created when the operation starts, updated
/// by the mover as batches land, read by the notification ticker.
pub struct Progress {
    all: usize,
    inner: Mutex<Inner>,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub all: usize,
    pub done: usize,
    pub start: Option<Instant>,
    pub end: Option<Instant>,
    pub error: Option<String>,
}

impl Progress {
    pub fn new(all: usize) -> Self {
        Self {
            all,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn add_done(&self, n: usize) {
        self.inner.lock().done += n;
    }

    pub fn begin(&self) {
        self.inner.lock().start = Some(Instant::now());
    }

    pub fn finish(&self) {
        self.inner.lock().end = Some(Instant::now());
    }

    pub fn fail(&self, error: String) {
        self.inner.lock().error = Some(error);
    }

    /// Finished or failed.
    pub fn is_settled(&self) -> bool {
        let inner = self.inner.lock();
        inner.end.is_some() || inner.error.is_some()
    }

    pub fn snapshot(&self) -> Snapshot {
        let inner = self.inner.lock();
        Snapshot {
            all: self.all,
            done: inner.done,
            start: inner.start,
            end: inner.end,
            error: inner.error.clone(),
        }
    }
}

/// Notification text for the current state of a relocation.
pub(crate) fn render(s: &Snapshot) -> String {
    if let Some(error) = &s.error {
        return format!("Failed to move tabs: {error}");
    }
    match (s.start, s.end) {
        (Some(start), Some(end)) => format!(
            "Moved {} of {} tabs in {:.1}s",
            s.done,
            s.all,
            (end - start).as_secs_f64()
        ),
        (Some(start), None) if s.all > 0 => {
            let percentage = s.done * 100 / s.all;
            format!(
                "Moving tabs... {:.1}s elapsed, {percentage}% done",
                start.elapsed().as_secs_f64()
            )
        }
        _ => "Moving tabs...".to_owned(),
    }
}

/// Re-announce progress each interval until the operation settles. The loop
/// checks for settlement once per sleep, so it stops within one interval of
/// the end even when polled outside a `select!`.
async fn notify_loop<H: NotificationSink>(host: &H, progress: &Progress) {
    loop {
        sleep(NOTIFICATION_INTERVAL).await;
        if progress.is_settled() {
            break;
        }
        if let Err(e) = host.notify(&render(&progress.snapshot())).await {
            warn!("progress notification failed: {e}");
        }
    }
}

async fn notify_now<H: NotificationSink>(host: &H, progress: &Progress) {
    if let Err(e) = host.notify(&render(&progress.snapshot())).await {
        warn!("notification failed: {e}");
    }
}

/// Resolve a selection criterion, then move the result. All failures are
/// contained here.
pub async fn wrapped_run<H>(
    host: &H,
    monitor: &FocusMonitor,
    tab: TabId,
    kind: MoveKind,
    to: Option<WindowId>,
    notification: bool,
    focus: bool,
) where
    H: TabHost + WindowHost + NotificationSink,
{
    let tab_ids = match mover::listing(host, tab, kind).await {
        Ok(tab_ids) => tab_ids,
        Err(e) => {
            error!("could not list tabs for {kind:?} from tab {tab}: {e}");
            return;
        }
    };
    wrapped_raw_run(host, monitor, tab_ids, to, notification, focus).await;
}

/// Move an explicit tab list. All failures are contained here.
pub async fn wrapped_raw_run<H>(
    host: &H,
    monitor: &FocusMonitor,
    tab_ids: Vec<TabId>,
    to: Option<WindowId>,
    notification: bool,
    focus: bool,
) where
    H: TabHost + WindowHost + NotificationSink,
{
    let progress = Progress::new(tab_ids.len());

    let result = if notification {
        notify_now(host, &progress).await;
        progress.begin();
        tokio::select! {
            biased;
            result = mover::run(host, monitor, &tab_ids, to, &progress, focus) => result,
            // The loop only returns once the operation settled, so this arm
            // never ends a live move.
            () = notify_loop(host, &progress) => Ok(()),
        }
    } else {
        mover::run(host, monitor, &tab_ids, to, &progress, focus).await
    };

    match result {
        Ok(()) => {
            debug!("finished moving {} tabs", tab_ids.len());
            if notification {
                progress.finish();
                notify_now(host, &progress).await;
            }
        }
        Err(e) => {
            error!("tab move failed: {e}");
            if notification {
                progress.fail(e.to_string());
                notify_now(host, &progress).await;
            }
        }
    }
}
