//! Destination menu presentation.
//!
//! Renders the per-window destination entries of the context menu from the
//! focus index: one branch per enabled operation, with a "New window" leaf
//! and one leaf per candidate window labelled by its active tab. The focused
//! window is never offered as a destination (moving a tab to its own window
//! is meaningless), and neither is the picker window (filtered upstream by
//! the engine, which never tracks it).
//!
//! Menu item ids encode the whole click: `<operation>_<windowId>` or
//! `<operation>_newWindow`. Rendering is best-effort: a failed menu call is
//! logged and skipped, never propagated.

use tracing::warn;

use crate::host::{MenuHost, SettingsStore, WindowId};
use crate::message::MoveKind;
use crate::settings::{self, default_menu_items, KEY_MENU_ITEMS};

const SEP: char = '_';
const NEW_WINDOW: &str = "newWindow";
const ROOT_ID: &str = "move";
/// Longest destination label before truncation.
const ITEM_LENGTH: usize = 64;

/// Menu item id for an operation aimed at a destination (`None` = new
/// window).
pub fn item_id(kind: MoveKind, dest: Option<WindowId>) -> String {
    match dest {
        Some(window) => format!("{}{SEP}{window}", kind.as_key()),
        None => format!("{}{SEP}{NEW_WINDOW}", kind.as_key()),
    }
}

/// Decode a clicked menu item id. A bare operation key and the `newWindow`
/// suffix both mean "new window".
pub fn parse_item_id(id: &str) -> Option<(MoveKind, Option<WindowId>)> {
    match id.split_once(SEP) {
        None => MoveKind::from_key(id).map(|kind| (kind, None)),
        Some((key, dest)) => {
            let kind = MoveKind::from_key(key)?;
            if dest == NEW_WINDOW {
                Some((kind, None))
            } else {
                dest.parse().ok().map(|window| (kind, Some(window)))
            }
        }
    }
}

fn phrase(kind: MoveKind) -> &'static str {
    match kind {
        MoveKind::One => "this tab",
        MoveKind::Right => "tabs to the right",
        MoveKind::Left => "tabs to the left",
        MoveKind::All => "all tabs",
        MoveKind::Select => "selected tabs",
        MoveKind::Raw => "tabs",
    }
}

fn title(kind: MoveKind) -> &'static str {
    match kind {
        MoveKind::One => "This tab",
        MoveKind::Right => "Tabs to the right",
        MoveKind::Left => "Tabs to the left",
        MoveKind::All => "All tabs",
        MoveKind::Select => "Selected tabs",
        MoveKind::Raw => "Tabs",
    }
}

fn cut(text: &str, length: usize) -> String {
    if text.chars().count() <= length {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(length).collect();
    out.push_str("...");
    out
}

fn destination_label(window: WindowId, title: &str) -> String {
    cut(&format!("{window}: {title}"), ITEM_LENGTH)
}

/// Keeps the host menu in sync with the focus index.
pub struct MenuPresenter {
    keys: Vec<MoveKind>,
    focused: Option<WindowId>,
}

impl Default for MenuPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl MenuPresenter {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            focused: None,
        }
    }

    pub fn focused(&self) -> Option<WindowId> {
        self.focused
    }

    /// Reload the enabled operation set from settings.
    pub async fn load_keys<S: SettingsStore>(&mut self, store: &S) {
        self.keys = settings::get_or(store, KEY_MENU_ITEMS, default_menu_items()).await;
    }

    /// Tear the menu down and rebuild it: operation roots, "New window"
    /// leaves, then a destination leaf per tracked window except the focused
    /// one.
    pub async fn rebuild<H: MenuHost>(
        &mut self,
        host: &H,
        entries: &[(WindowId, String)],
        focused: Option<WindowId>,
    ) {
        self.focused = focused;
        if let Err(e) = host.remove_all().await {
            warn!("could not clear menu: {e}");
        }

        match self.keys.len() {
            0 => {}
            1 => {
                let kind = self.keys[0];
                self.create(host, kind.as_key(), &format!("Move {}", phrase(kind)), None).await;
                if kind != MoveKind::All {
                    self.create(host, &item_id(kind, None), "New window", Some(kind.as_key()))
                        .await;
                }
            }
            _ => {
                self.create(host, ROOT_ID, "Move tabs", None).await;
                for kind in self.keys.clone() {
                    self.create(host, kind.as_key(), title(kind), Some(ROOT_ID)).await;
                    if kind != MoveKind::All {
                        self.create(host, &item_id(kind, None), "New window", Some(kind.as_key()))
                            .await;
                    }
                }
            }
        }

        for (window, label) in entries {
            if Some(*window) != focused {
                self.track(host, *window, label).await;
            }
        }
    }

    /// A window became a destination candidate.
    pub async fn track<H: MenuHost>(&mut self, host: &H, window: WindowId, label: &str) {
        if self.focused == Some(window) {
            return;
        }
        let text = destination_label(window, label);
        for kind in self.keys.clone() {
            self.create(host, &item_id(kind, Some(window)), &text, Some(kind.as_key())).await;
        }
    }

    /// A candidate window's label changed.
    pub async fn retitle<H: MenuHost>(&mut self, host: &H, window: WindowId, label: &str) {
        if self.focused == Some(window) {
            return;
        }
        let text = destination_label(window, label);
        for kind in &self.keys {
            if let Err(e) = host.update_item(&item_id(*kind, Some(window)), &text).await {
                warn!("could not update menu item for window {window}: {e}");
            }
        }
    }

    /// A window closed; drop its leaves.
    pub async fn remove<H: MenuHost>(&mut self, host: &H, window: WindowId) {
        for kind in &self.keys {
            if let Err(e) = host.remove_item(&item_id(*kind, Some(window))).await {
                warn!("could not remove menu item for window {window}: {e}");
            }
        }
    }

    /// Window focus moved: the previously focused window becomes a
    /// destination again and the newly focused one stops being offered.
    /// `title_of` resolves a window's current label from the focus index.
    pub async fn refocus<H, F>(&mut self, host: &H, focused: WindowId, title_of: F)
    where
        H: MenuHost,
        F: Fn(WindowId) -> Option<String>,
    {
        let old = self.focused.replace(focused);
        if let Some(old) = old.filter(|&w| w != focused) {
            if let Some(label) = title_of(old) {
                self.track(host, old, &label).await;
            }
        }
        self.remove(host, focused).await;
    }

    async fn create<H: MenuHost>(&self, host: &H, id: &str, text: &str, parent: Option<&str>) {
        if let Err(e) = host.create_item(id, text, parent).await {
            warn!("could not add menu item {id}: {e}");
        }
    }
}
