//! The relocation engine.
//!
//! [`Engine`] owns the focus index, the picker window, and the menu
//! presenter, and is the single entry point for everything the embedder
//! forwards: browser events, menu clicks, bus messages from the picker, and
//! requests from other extensions. Event handlers never return errors; a
//! failed host call at this boundary is logged and absorbed, matching the
//! top-level catch of a background page.
//!
//! Mutating entry points take `&mut self`, so overlapping relocation
//! requests serialize through the engine rather than interleaving batches.

use tracing::{debug, error, warn};

use crate::host::{Host, HostError, SettingsStore, TabId, WindowId};
use crate::menu::{self, MenuPresenter};
use crate::message::{Message, MoveKind};
use crate::monitor::{FocusEvent, FocusMonitor};
use crate::picker::{PickerError, PickerManager};
use crate::relocate::progress;
use crate::settings::{
    self, DEFAULT_FOCUS, DEFAULT_NOTIFICATION, DEFAULT_SELECT_SAVE, KEY_FOCUS, KEY_MENU_ITEMS,
    KEY_NOTIFICATION, KEY_SELECT_SAVE, KEY_SELECT_SIZE,
};

pub struct Engine<H, S> {
    host: H,
    store: S,
    monitor: FocusMonitor,
    picker: PickerManager,
    menu: MenuPresenter,
}

impl<H: Host, S: SettingsStore> Engine<H, S> {
    pub fn new(host: H, store: S) -> Self {
        Self {
            host,
            store,
            monitor: FocusMonitor::new(),
            picker: PickerManager::new(),
            menu: MenuPresenter::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// The focus index, e.g. to [`subscribe`](FocusMonitor::subscribe) to
    /// its events.
    pub fn monitor(&mut self) -> &mut FocusMonitor {
        &mut self.monitor
    }

    /// The picker window's id, while one exists.
    pub fn picker_window(&self) -> Option<WindowId> {
        self.picker.window_id()
    }

    /// Build the focus index and menu from the host's current state. Call
    /// once at startup.
    pub async fn bootstrap(&mut self) {
        self.menu.load_keys(&self.store).await;
        if let Err(e) = self.refresh().await {
            error!("could not build initial menu state: {e}");
        }
    }

    /// Rebuild the focus index and the menu from a fresh host snapshot.
    async fn refresh(&mut self) -> Result<(), HostError> {
        self.monitor.clear();
        let windows = self.host.list_windows().await?;
        for window in &windows {
            if self.picker.window_id() == Some(window.id) {
                continue;
            }
            if let Some(active) = window.tabs.iter().find(|t| t.active) {
                self.monitor.record_activation(window.id, active.id, &active.title);
            }
        }
        let focused = match self.host.current_window().await {
            Ok(window) => Some(window.id),
            Err(e) => {
                warn!("no current window while rebuilding menu: {e}");
                None
            }
        };
        let entries: Vec<(WindowId, String)> =
            self.monitor.entries().map(|(w, e)| (w, e.title.clone())).collect();
        self.menu.rebuild(&self.host, &entries, focused).await;
        Ok(())
    }

    // --- browser events ---------------------------------------------------

    /// A tab became the active tab of its window.
    pub async fn on_tab_activated(&mut self, tab: TabId) {
        if let Err(e) = self.tab_activated(tab).await {
            error!("tab activation handling failed: {e}");
        }
    }

    async fn tab_activated(&mut self, tab: TabId) -> Result<(), HostError> {
        let tab = self.host.get_tab(tab).await?;
        if self.picker.window_id() == Some(tab.window_id) {
            return Ok(());
        }
        let event = self.monitor.record_activation(tab.window_id, tab.id, &tab.title);
        self.apply_focus_event(event).await;
        Ok(())
    }

    /// A tab changed (the engine cares about title changes of active tabs).
    pub async fn on_tab_updated(&mut self, tab: TabId) {
        if let Err(e) = self.tab_updated(tab).await {
            error!("tab update handling failed: {e}");
        }
    }

    async fn tab_updated(&mut self, tab: TabId) -> Result<(), HostError> {
        let tab = self.host.get_tab(tab).await?;
        // Only the active tab of the window it is still in labels a menu
        // entry; anything else is noise.
        if self.monitor.window_of(tab.id) != Some(tab.window_id) {
            return Ok(());
        }
        let event = self.monitor.record_title(tab.id, &tab.title);
        self.apply_focus_event(event).await;
        Ok(())
    }

    /// A window appeared; its initially active tab counts as an activation.
    pub async fn on_window_created(&mut self, window: WindowId) {
        if let Err(e) = self.window_created(window).await {
            error!("window creation handling failed: {e}");
        }
    }

    async fn window_created(&mut self, window: WindowId) -> Result<(), HostError> {
        if self.picker.window_id() == Some(window) {
            return Ok(());
        }
        let window = self.host.get_window(window).await?;
        if let Some(active) = window.tabs.iter().find(|t| t.active) {
            let event = self.monitor.record_activation(window.id, active.id, &active.title);
            self.apply_focus_event(event).await;
        }
        Ok(())
    }

    /// A window closed.
    pub async fn on_window_removed(&mut self, window: WindowId) {
        debug!("window {window} was closed");
        self.picker.forget(window);
        let event = self.monitor.record_removal(window);
        self.apply_focus_event(event).await;
    }

    /// Another window took focus; it stops being offered as a destination.
    pub async fn on_window_focus_changed(&mut self, window: WindowId) {
        debug!("window {window} is focused");
        let monitor = &self.monitor;
        self.menu
            .refocus(&self.host, window, |w| {
                monitor.active_of(w).map(|e| e.title.clone())
            })
            .await;
    }

    /// A settings key changed in the external store.
    pub async fn on_settings_changed(&mut self, key: &str) {
        if key != KEY_MENU_ITEMS {
            return;
        }
        self.menu.load_keys(&self.store).await;
        if let Err(e) = self.refresh().await {
            error!("menu rebuild after settings change failed: {e}");
        }
    }

    /// A context-menu item was clicked with `tab` as the anchor.
    pub async fn on_menu_clicked(&mut self, item_id: &str, tab: TabId) {
        let Some((kind, to)) = menu::parse_item_id(item_id) else {
            warn!("unrecognized menu item {item_id:?}");
            return;
        };
        let notification =
            settings::get_or(&self.store, KEY_NOTIFICATION, DEFAULT_NOTIFICATION).await;
        let focus = settings::get_or(&self.store, KEY_FOCUS, DEFAULT_FOCUS).await;
        match kind {
            MoveKind::Select => {
                let from = match self.host.get_tab(tab).await {
                    Ok(tab) => tab.window_id,
                    Err(e) => {
                        error!("could not resolve picker source window: {e}");
                        return;
                    }
                };
                if let Err(e) = self.open_picker(from, to, notification, focus).await {
                    error!("could not open picker: {e}");
                }
            }
            MoveKind::Raw => warn!("raw is not a menu operation"),
            _ => self.move_tabs(tab, kind, to, notification, focus).await,
        }
    }

    // --- commands ---------------------------------------------------------

    /// Move the tabs selected by `kind` around the anchor tab. Never fails;
    /// problems are logged and, with `notification`, shown to the user.
    pub async fn move_tabs(
        &mut self,
        tab: TabId,
        kind: MoveKind,
        to: Option<WindowId>,
        notification: bool,
        focus: bool,
    ) {
        progress::wrapped_run(&self.host, &self.monitor, tab, kind, to, notification, focus).await;
    }

    /// Move an explicit tab list. Never fails; see [`Engine::move_tabs`].
    pub async fn move_raw(
        &mut self,
        tab_ids: Vec<TabId>,
        to: Option<WindowId>,
        notification: bool,
        focus: bool,
    ) {
        progress::wrapped_raw_run(&self.host, &self.monitor, tab_ids, to, notification, focus)
            .await;
    }

    /// Open (or reuse) the picker window for tabs of `from`.
    pub async fn open_picker(
        &mut self,
        from: WindowId,
        to: Option<WindowId>,
        notification: bool,
        focus: bool,
    ) -> Result<(), PickerError> {
        let mut created = None;
        {
            let mut remember = |id: WindowId| created = Some(id);
            self.picker
                .select(&self.host, &self.store, from, to, notification, focus, Some(&mut remember))
                .await?;
        }
        // The picker window may already have been indexed by the time its id
        // was recorded; evict it, it must never show up as a destination.
        if let Some(window) = created {
            let event = self.monitor.record_removal(window);
            self.apply_focus_event(event).await;
        }
        Ok(())
    }

    // --- message bus ------------------------------------------------------

    /// A message from this extension's own pages, i.e. the picker.
    pub async fn handle_message(&mut self, message: Message) {
        debug!("message received: {message:?}");
        match message {
            Message::SelectSize { select_size } => {
                let save =
                    settings::get_or(&self.store, KEY_SELECT_SAVE, DEFAULT_SELECT_SAVE).await;
                if !save {
                    return;
                }
                if let Err(e) = settings::set_json(&self.store, KEY_SELECT_SIZE, &select_size).await
                {
                    error!("could not persist picker size: {e}");
                }
            }
            Message::Move {
                key_type: MoveKind::Raw,
                tab_ids,
                to_window_id,
                notification,
                focus,
                ..
            } => {
                self.move_raw(
                    tab_ids.unwrap_or_default(),
                    to_window_id,
                    notification.unwrap_or(false),
                    focus.unwrap_or(false),
                )
                .await;
            }
            _ => {}
        }
    }

    /// A message from another extension. Supports every operation kind.
    pub async fn handle_external(&mut self, message: Message) {
        debug!("external message received: {message:?}");
        let Message::Move {
            key_type,
            tab_id,
            tab_ids,
            to_window_id,
            notification,
            focus,
        } = message
        else {
            return;
        };
        let notification = notification.unwrap_or(false);
        let focus = focus.unwrap_or(false);
        match key_type {
            MoveKind::One | MoveKind::Right | MoveKind::Left | MoveKind::All => {
                let Some(tab) = tab_id else {
                    warn!("{} move without a tabId", key_type.as_key());
                    return;
                };
                self.move_tabs(tab, key_type, to_window_id, notification, focus).await;
            }
            MoveKind::Select => {
                let Some(tab) = tab_id else {
                    warn!("select move without a tabId");
                    return;
                };
                let from = match self.host.get_tab(tab).await {
                    Ok(tab) => tab.window_id,
                    Err(e) => {
                        error!("could not resolve picker source window: {e}");
                        return;
                    }
                };
                if let Err(e) = self.open_picker(from, to_window_id, notification, focus).await {
                    error!("could not open picker: {e}");
                }
            }
            MoveKind::Raw => {
                self.move_raw(tab_ids.unwrap_or_default(), to_window_id, notification, focus)
                    .await;
            }
        }
    }

    async fn apply_focus_event(&mut self, event: Option<FocusEvent>) {
        match event {
            Some(FocusEvent::Tracked { window, title, .. }) => {
                self.menu.track(&self.host, window, &title).await;
            }
            Some(FocusEvent::Retitled { window, title, .. }) => {
                self.menu.retitle(&self.host, window, &title).await;
            }
            Some(FocusEvent::Inactivated { window }) => {
                self.menu.remove(&self.host, window).await;
            }
            None => {}
        }
    }
}
