//! Picker window lifecycle.
//!
//! At most one picker window exists at a time. The manager creates it on
//! demand, waits for its document to finish loading, and reuses it for every
//! later request as long as the window is still alive. A recorded id whose
//! window has silently disappeared is discarded and the window recreated;
//! the caller never sees that recovery.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::host::{
    CreateWindow, HostError, LoadStatus, MessagePort, SettingsStore, TabHost, WindowHost, WindowId,
};
use crate::message::Message;
use crate::settings::{self, DEFAULT_SELECT_SIZE, KEY_SELECT_SIZE};

/// Document the picker window loads.
pub(crate) const PICKER_PAGE: &str = "select.html";

/// Poll cadence while the picker document is loading.
pub(crate) const POLLING_INTERVAL: Duration = Duration::from_millis(300);

/// How long the picker may take to become ready before the attempt fails.
pub(crate) const READY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum PickerError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("picker window was not ready after {0:?}")]
    ReadyTimeout(Duration),
}

/// Lifecycle state. `Creating` means the window exists but its document has
/// not reported ready; staleness is detected on use, not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PickerState {
    NoWindow,
    Creating(WindowId),
    Ready(WindowId),
}

/// Owner of the single picker window id.
pub struct PickerManager {
    state: PickerState,
}

impl Default for PickerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PickerManager {
    pub fn new() -> Self {
        Self {
            state: PickerState::NoWindow,
        }
    }

    /// The picker's window id, in any state that has one.
    pub fn window_id(&self) -> Option<WindowId> {
        match self.state {
            PickerState::NoWindow => None,
            PickerState::Creating(id) | PickerState::Ready(id) => Some(id),
        }
    }

    /// Forget the recorded window. Called when the picker window is observed
    /// closing, so the next request creates a fresh one.
    pub fn forget(&mut self, window: WindowId) {
        if self.window_id() == Some(window) {
            debug!("picker window {window} closed");
            self.state = PickerState::NoWindow;
        }
    }

    /// Open (or reuse) the picker for selecting tabs of `from`, destined for
    /// `to`. `on_create` fires with the new window's id the moment it exists,
    /// before the readiness wait.
    pub async fn select<H, S>(
        &mut self,
        host: &H,
        store: &S,
        from: WindowId,
        to: Option<WindowId>,
        notification: bool,
        focus: bool,
        on_create: Option<&mut dyn FnMut(WindowId)>,
    ) -> Result<(), PickerError>
    where
        H: TabHost + WindowHost + MessagePort,
        S: SettingsStore,
    {
        let reset = Message::Reset {
            from_window_id: from,
            to_window_id: to,
            notification,
            focus,
        };

        if let Some(id) = self.window_id() {
            match host.get_window(id).await {
                Ok(_) => {
                    debug!("reusing picker window {id}");
                    host.post(&reset).await?;
                    self.state = PickerState::Ready(id);
                    return Ok(());
                }
                Err(e) => {
                    debug!("recorded picker window {id} is gone ({e}), recreating");
                    self.state = PickerState::NoWindow;
                }
            }
        }

        self.create(host, store, &reset, on_create).await
    }

    async fn create<H, S>(
        &mut self,
        host: &H,
        store: &S,
        reset: &Message,
        on_create: Option<&mut dyn FnMut(WindowId)>,
    ) -> Result<(), PickerError>
    where
        H: TabHost + WindowHost + MessagePort,
        S: SettingsStore,
    {
        let (width, height) = settings::get_or(store, KEY_SELECT_SIZE, DEFAULT_SELECT_SIZE).await;
        let window = host
            .create_window(CreateWindow {
                width: Some(width),
                height: Some(height),
                url: Some(PICKER_PAGE.to_owned()),
                panel: true,
            })
            .await?;
        debug!("picker window {} created", window.id);
        self.state = PickerState::Creating(window.id);
        if let Some(callback) = on_create {
            callback(window.id);
        }

        let tab = window
            .tabs
            .first()
            .ok_or_else(|| HostError::Backend("picker window has no tab".into()))?
            .id;

        // The picker cannot receive messages until its document has loaded.
        let deadline = Instant::now() + READY_TIMEOUT;
        loop {
            let snapshot = host.get_tab(tab).await?;
            if snapshot.url.ends_with(PICKER_PAGE) && snapshot.status == LoadStatus::Complete {
                break;
            }
            if Instant::now() >= deadline {
                warn!("picker window {} never became ready, closing it", window.id);
                if let Err(e) = host.remove_window(window.id).await {
                    warn!("could not close unready picker window: {e}");
                }
                self.state = PickerState::NoWindow;
                return Err(PickerError::ReadyTimeout(READY_TIMEOUT));
            }
            debug!("waiting for picker window...");
            sleep(POLLING_INTERVAL).await;
        }

        host.post(reset).await?;
        self.state = PickerState::Ready(window.id);
        Ok(())
    }
}
