//! In-memory host and settings store used by the test suites.
//!
//! `FakeHost` models just enough browser behavior for the engine's tests: an
//! ordered tab strip per window, one active tab per window with natural
//! focus shift when the active tab leaves, pinned flags that survive moves,
//! and a call log for asserting what the engine asked the host to do.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::host::{
    CreateWindow, HostError, InsertPos, LoadStatus, MenuHost, MessagePort, NotificationSink,
    Result, SettingsStore, Tab, TabHost, TabId, Window, WindowHost, WindowId,
};
use crate::message::Message;

#[derive(Debug, Clone, PartialEq)]
pub enum MenuOp {
    Create {
        id: String,
        title: String,
        parent: Option<String>,
    },
    Update {
        id: String,
        title: String,
    },
    Remove {
        id: String,
    },
    RemoveAll,
}

/// Everything the engine asked the host to do, in call order per category.
#[derive(Debug, Clone, Default)]
pub struct Calls {
    pub moves: Vec<(Vec<TabId>, WindowId, InsertPos)>,
    pub activations: Vec<TabId>,
    pub notifications: Vec<String>,
    pub posted: Vec<Message>,
    pub menu: Vec<MenuOp>,
    pub created_windows: Vec<WindowId>,
    pub removed_tabs: Vec<TabId>,
    pub removed_windows: Vec<WindowId>,
    pub focused_windows: Vec<WindowId>,
}

#[derive(Debug)]
struct FakeTab {
    pinned: bool,
    title: String,
    url: String,
    status: LoadStatus,
}

#[derive(Debug)]
struct FakeWindow {
    id: WindowId,
    width: u32,
    height: u32,
    tabs: Vec<TabId>,
    active: Option<TabId>,
}

#[derive(Default)]
struct State {
    windows: Vec<FakeWindow>,
    tabs: HashMap<TabId, FakeTab>,
    focused: Option<WindowId>,
    next_window_id: WindowId,
    next_tab_id: TabId,
    /// get_tab calls remaining before a loading tab reports complete.
    ready_countdown: HashMap<TabId, u32>,
    calls: Calls,
}

pub struct FakeHost {
    state: Mutex<State>,
    /// Polls a freshly created document takes to finish loading.
    pub load_polls: Mutex<u32>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_window_id: 1000,
                next_tab_id: 1000,
                ..State::default()
            }),
            load_polls: Mutex::new(0),
        }
    }

    pub fn add_window(&self, id: WindowId) {
        let mut state = self.state.lock();
        state.windows.push(FakeWindow {
            id,
            width: 1280,
            height: 720,
            tabs: Vec::new(),
            active: None,
        });
        if state.focused.is_none() {
            state.focused = Some(id);
        }
    }

    pub fn add_tab(&self, window: WindowId, id: TabId, pinned: bool, active: bool, title: &str) {
        let mut state = self.state.lock();
        state.tabs.insert(
            id,
            FakeTab {
                pinned,
                title: title.to_owned(),
                url: format!("https://example.test/{id}"),
                status: LoadStatus::Complete,
            },
        );
        let window = state
            .windows
            .iter_mut()
            .find(|w| w.id == window)
            .expect("add_tab: unknown window");
        window.tabs.push(id);
        if active || window.active.is_none() {
            window.active = Some(id);
        }
    }

    pub fn rename_tab(&self, tab: TabId, title: &str) {
        if let Some(tab) = self.state.lock().tabs.get_mut(&tab) {
            tab.title = title.to_owned();
        }
    }

    pub fn calls(&self) -> Calls {
        self.state.lock().calls.clone()
    }

    pub fn tab_ids_of(&self, window: WindowId) -> Vec<TabId> {
        let state = self.state.lock();
        state
            .windows
            .iter()
            .find(|w| w.id == window)
            .map(|w| w.tabs.clone())
            .unwrap_or_default()
    }

    pub fn active_tab_of(&self, window: WindowId) -> Option<TabId> {
        let state = self.state.lock();
        state.windows.iter().find(|w| w.id == window).and_then(|w| w.active)
    }

    /// Windows created by the engine (as opposed to `add_window`).
    pub fn created_windows(&self) -> Vec<WindowId> {
        self.state.lock().calls.created_windows.clone()
    }

    fn snapshot_tab(state: &State, id: TabId) -> Result<Tab> {
        let tab = state.tabs.get(&id).ok_or(HostError::TabNotFound(id))?;
        let (window_id, index, active) = state
            .windows
            .iter()
            .find_map(|w| {
                w.tabs
                    .iter()
                    .position(|&t| t == id)
                    .map(|i| (w.id, i as u32, w.active == Some(id)))
            })
            .ok_or(HostError::TabNotFound(id))?;
        Ok(Tab {
            id,
            window_id,
            index,
            pinned: tab.pinned,
            active,
            title: tab.title.clone(),
            url: tab.url.clone(),
            status: tab.status,
        })
    }

    fn snapshot_window(state: &State, window: &FakeWindow) -> Window {
        let tabs = window
            .tabs
            .iter()
            .filter_map(|&id| Self::snapshot_tab(state, id).ok())
            .collect();
        Window {
            id: window.id,
            focused: state.focused == Some(window.id),
            width: window.width,
            height: window.height,
            tabs,
        }
    }

    /// Detach `ids` from whatever windows hold them, shifting each source
    /// window's active tab to its natural successor when it leaves.
    fn detach(state: &mut State, ids: &[TabId]) {
        let displaced: Vec<(WindowId, usize)> = state
            .windows
            .iter()
            .filter_map(|w| {
                let active = w.active?;
                if !ids.contains(&active) {
                    return None;
                }
                w.tabs.iter().position(|&t| t == active).map(|i| (w.id, i))
            })
            .collect();
        for window in state.windows.iter_mut() {
            window.tabs.retain(|t| !ids.contains(t));
        }
        for (window_id, old_index) in displaced {
            let window = state
                .windows
                .iter_mut()
                .find(|w| w.id == window_id)
                .expect("detach: window vanished");
            window.active = window
                .tabs
                .get(old_index.min(window.tabs.len().saturating_sub(1)))
                .copied();
        }
    }
}

impl TabHost for FakeHost {
    async fn get_tab(&self, tab: TabId) -> Result<Tab> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if let Some(left) = state.ready_countdown.get_mut(&tab) {
            if *left == 0 {
                if let Some(t) = state.tabs.get_mut(&tab) {
                    t.status = LoadStatus::Complete;
                }
                state.ready_countdown.remove(&tab);
            } else {
                *left -= 1;
            }
        }
        Self::snapshot_tab(state, tab)
    }

    async fn list_tabs(&self, window: WindowId) -> Result<Vec<Tab>> {
        let state = self.state.lock();
        let window = state
            .windows
            .iter()
            .find(|w| w.id == window)
            .ok_or(HostError::WindowNotFound(window))?;
        window.tabs.iter().map(|&id| Self::snapshot_tab(&state, id)).collect()
    }

    async fn move_tabs(&self, tabs: &[TabId], window: WindowId, pos: InsertPos) -> Result<Vec<Tab>> {
        let mut state = self.state.lock();
        state.calls.moves.push((tabs.to_vec(), window, pos));
        for &id in tabs {
            if !state.tabs.contains_key(&id) {
                return Err(HostError::TabNotFound(id));
            }
        }
        if !state.windows.iter().any(|w| w.id == window) {
            return Err(HostError::WindowNotFound(window));
        }
        Self::detach(&mut state, tabs);
        let dest = state
            .windows
            .iter_mut()
            .find(|w| w.id == window)
            .expect("move_tabs: destination vanished");
        let at = match pos {
            InsertPos::At(i) => (i as usize).min(dest.tabs.len()),
            InsertPos::Append => dest.tabs.len(),
        };
        for (offset, &id) in tabs.iter().enumerate() {
            dest.tabs.insert(at + offset, id);
        }
        tabs.iter().map(|&id| Self::snapshot_tab(&state, id)).collect()
    }

    async fn activate_tab(&self, tab: TabId) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.activations.push(tab);
        let window_id = state
            .windows
            .iter()
            .find(|w| w.tabs.contains(&tab))
            .map(|w| w.id)
            .ok_or(HostError::TabNotFound(tab))?;
        let window = state
            .windows
            .iter_mut()
            .find(|w| w.id == window_id)
            .expect("activate_tab: window vanished");
        window.active = Some(tab);
        Ok(())
    }

    async fn remove_tabs(&self, tabs: &[TabId]) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.removed_tabs.extend_from_slice(tabs);
        Self::detach(&mut state, tabs);
        for id in tabs {
            state.tabs.remove(id);
        }
        // A window with no tabs left closes, like the host would close it.
        state.windows.retain(|w| !w.tabs.is_empty());
        Ok(())
    }
}

impl WindowHost for FakeHost {
    async fn get_window(&self, window: WindowId) -> Result<Window> {
        let state = self.state.lock();
        state
            .windows
            .iter()
            .find(|w| w.id == window)
            .map(|w| Self::snapshot_window(&state, w))
            .ok_or(HostError::WindowNotFound(window))
    }

    async fn list_windows(&self) -> Result<Vec<Window>> {
        let state = self.state.lock();
        Ok(state.windows.iter().map(|w| Self::snapshot_window(&state, w)).collect())
    }

    async fn current_window(&self) -> Result<Window> {
        let state = self.state.lock();
        let focused = state.focused.ok_or_else(|| HostError::Backend("no windows".into()))?;
        state
            .windows
            .iter()
            .find(|w| w.id == focused)
            .map(|w| Self::snapshot_window(&state, w))
            .ok_or(HostError::WindowNotFound(focused))
    }

    async fn create_window(&self, params: CreateWindow) -> Result<Window> {
        let mut state = self.state.lock();
        let window_id = state.next_window_id;
        state.next_window_id += 1;
        let tab_id = state.next_tab_id;
        state.next_tab_id += 1;

        let (url, status) = match params.url {
            Some(url) => (url, LoadStatus::Loading),
            None => ("about:blank".to_owned(), LoadStatus::Complete),
        };
        if status == LoadStatus::Loading {
            let polls = *self.load_polls.lock();
            state.ready_countdown.insert(tab_id, polls);
        }
        state.tabs.insert(
            tab_id,
            FakeTab {
                pinned: false,
                title: String::new(),
                url,
                status,
            },
        );
        state.windows.push(FakeWindow {
            id: window_id,
            width: params.width.unwrap_or(1280),
            height: params.height.unwrap_or(720),
            tabs: vec![tab_id],
            active: Some(tab_id),
        });
        state.calls.created_windows.push(window_id);
        let window = state.windows.last().expect("create_window: just pushed");
        Ok(Self::snapshot_window(&state, window))
    }

    async fn focus_window(&self, window: WindowId) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.focused_windows.push(window);
        if !state.windows.iter().any(|w| w.id == window) {
            return Err(HostError::WindowNotFound(window));
        }
        state.focused = Some(window);
        Ok(())
    }

    async fn remove_window(&self, window: WindowId) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.removed_windows.push(window);
        let index = state
            .windows
            .iter()
            .position(|w| w.id == window)
            .ok_or(HostError::WindowNotFound(window))?;
        let removed = state.windows.remove(index);
        for tab in removed.tabs {
            state.tabs.remove(&tab);
        }
        if state.focused == Some(window) {
            state.focused = state.windows.first().map(|w| w.id);
        }
        Ok(())
    }
}

impl NotificationSink for FakeHost {
    async fn notify(&self, message: &str) -> Result<()> {
        self.state.lock().calls.notifications.push(message.to_owned());
        Ok(())
    }
}

impl MenuHost for FakeHost {
    async fn create_item(&self, id: &str, title: &str, parent: Option<&str>) -> Result<()> {
        self.state.lock().calls.menu.push(MenuOp::Create {
            id: id.to_owned(),
            title: title.to_owned(),
            parent: parent.map(str::to_owned),
        });
        Ok(())
    }

    async fn update_item(&self, id: &str, title: &str) -> Result<()> {
        self.state.lock().calls.menu.push(MenuOp::Update {
            id: id.to_owned(),
            title: title.to_owned(),
        });
        Ok(())
    }

    async fn remove_item(&self, id: &str) -> Result<()> {
        self.state.lock().calls.menu.push(MenuOp::Remove { id: id.to_owned() });
        Ok(())
    }

    async fn remove_all(&self) -> Result<()> {
        self.state.lock().calls.menu.push(MenuOp::RemoveAll);
        Ok(())
    }
}

impl MessagePort for FakeHost {
    async fn post(&self, message: &Message) -> Result<()> {
        self.state.lock().calls.posted.push(message.clone());
        Ok(())
    }
}

/// In-memory settings store.
#[derive(Default)]
pub struct MemStore {
    values: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemStore {
    pub fn value(&self, key: &str) -> Option<serde_json::Value> {
        self.values.lock().get(key).cloned()
    }
}

impl SettingsStore for MemStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.values.lock().insert(key.to_owned(), value);
        Ok(())
    }
}
