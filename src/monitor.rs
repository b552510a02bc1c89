//! Focus tracking - which tab is active in which window.
//!
//! [`FocusMonitor`] mirrors the host's activation events into two maps kept
//! in lockstep (window → active tab, active tab → window) plus the active
//! tab's last-seen title, so the menu presenter can label destinations
//! without re-querying the host. The batch mover consults [`is_active_tab`]
//! to decide whether focus needs rescuing before a move.
//!
//! [`is_active_tab`]: FocusMonitor::is_active_tab

use std::collections::HashMap;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::host::{TabId, WindowId};

/// Index entry for one window: its active tab and that tab's title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEntry {
    pub tab: TabId,
    pub title: String,
}

/// A change to the focus index worth telling observers about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusEvent {
    /// A window gained an index entry (first activation seen).
    Tracked {
        window: WindowId,
        tab: TabId,
        title: String,
    },
    /// An already-tracked window's active title changed (new active tab, or
    /// the active tab renamed itself).
    Retitled {
        window: WindowId,
        tab: TabId,
        title: String,
    },
    /// A window closed; its entry is gone.
    Inactivated { window: WindowId },
}

/// Bookkeeping for active tabs, one entry per window.
///
/// Pure state: no host calls, no failure modes. Mutations return the
/// [`FocusEvent`] they caused (if any) and mirror it to subscribers.
#[derive(Default)]
pub struct FocusMonitor {
    window_to_active: HashMap<WindowId, ActiveEntry>,
    tab_to_window: HashMap<TabId, WindowId>,
    subscribers: Vec<UnboundedSender<FocusEvent>>,
}

impl FocusMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Is this tab currently the active tab of some window?
    pub fn is_active_tab(&self, tab: TabId) -> bool {
        self.tab_to_window.contains_key(&tab)
    }

    /// The active entry for a window, if one is tracked.
    pub fn active_of(&self, window: WindowId) -> Option<&ActiveEntry> {
        self.window_to_active.get(&window)
    }

    /// The window a tab is the active tab of, if any.
    pub fn window_of(&self, tab: TabId) -> Option<WindowId> {
        self.tab_to_window.get(&tab).copied()
    }

    /// All tracked windows and their entries, in unspecified order.
    pub fn entries(&self) -> impl Iterator<Item = (WindowId, &ActiveEntry)> {
        self.window_to_active.iter().map(|(w, e)| (*w, e))
    }

    /// Receive a copy of every future [`FocusEvent`].
    pub fn subscribe(&mut self) -> UnboundedReceiver<FocusEvent> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// A tab became the active tab of `window`.
    pub fn record_activation(
        &mut self,
        window: WindowId,
        tab: TabId,
        title: &str,
    ) -> Option<FocusEvent> {
        let event = match self.window_to_active.get_mut(&window) {
            Some(entry) => {
                if entry.tab != tab {
                    debug!("tab {tab} became active instead of tab {} in window {window}", entry.tab);
                    self.tab_to_window.remove(&entry.tab);
                    self.tab_to_window.insert(tab, window);
                    entry.tab = tab;
                } else {
                    debug!("tab {tab} is still active in window {window}");
                }
                if entry.title != title {
                    entry.title = title.to_owned();
                    Some(FocusEvent::Retitled {
                        window,
                        tab,
                        title: title.to_owned(),
                    })
                } else {
                    None
                }
            }
            None => {
                debug!("tab {tab} became active in window {window}");
                self.window_to_active.insert(
                    window,
                    ActiveEntry {
                        tab,
                        title: title.to_owned(),
                    },
                );
                self.tab_to_window.insert(tab, window);
                Some(FocusEvent::Tracked {
                    window,
                    tab,
                    title: title.to_owned(),
                })
            }
        };
        self.check_consistency();
        if let Some(event) = &event {
            self.emit(event);
        }
        event
    }

    /// The active tab of its window changed title.
    ///
    /// Ignored unless `tab` is currently someone's active tab; inactive tabs
    /// never appear in the index.
    pub fn record_title(&mut self, tab: TabId, title: &str) -> Option<FocusEvent> {
        let window = *self.tab_to_window.get(&tab)?;
        let entry = self.window_to_active.get_mut(&window)?;
        if entry.title == title {
            return None;
        }
        debug!("active tab {tab} of window {window} retitled");
        entry.title = title.to_owned();
        let event = FocusEvent::Retitled {
            window,
            tab,
            title: title.to_owned(),
        };
        self.emit(&event);
        Some(event)
    }

    /// A window closed; drop its entry.
    pub fn record_removal(&mut self, window: WindowId) -> Option<FocusEvent> {
        let entry = self.window_to_active.remove(&window)?;
        debug!("tab {} became inactive with window {window}", entry.tab);
        self.tab_to_window.remove(&entry.tab);
        self.check_consistency();
        let event = FocusEvent::Inactivated { window };
        self.emit(&event);
        Some(event)
    }

    /// Drop every entry (used when the index is rebuilt from a fresh host
    /// snapshot).
    pub fn clear(&mut self) {
        self.window_to_active.clear();
        self.tab_to_window.clear();
    }

    fn emit(&mut self, event: &FocusEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn check_consistency(&self) {
        debug_assert_eq!(self.window_to_active.len(), self.tab_to_window.len());
        debug_assert!(self
            .window_to_active
            .iter()
            .all(|(w, e)| self.tab_to_window.get(&e.tab) == Some(w)));
    }
}
