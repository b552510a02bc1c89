//! Host-side collaborator traits and entity snapshots.
//!
//! The engine never owns a tab or a window; it holds opaque ids and asks the
//! embedding host for snapshots when it needs them. Every call that touches
//! the host is async and can fail, which is why all trait methods return
//! [`Result`]. A single host object normally implements every trait here;
//! the [`Host`](crate::host::Host) alias bundles them for the engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::Message;

/// Unique identifier for a tab, assigned by the host.
pub type TabId = u64;

/// Unique identifier for a window, assigned by the host.
pub type WindowId = u64;

/// Document load state of a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Loading,
    Complete,
}

/// Snapshot of a tab's metadata at query time.
///
/// Snapshots go stale the moment the event loop yields; code that suspends
/// between reading a snapshot and acting on it must re-query.
#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    pub id: TabId,
    pub window_id: WindowId,
    /// Ordinal position within the window, 0-based.
    pub index: u32,
    pub pinned: bool,
    pub active: bool,
    pub title: String,
    pub url: String,
    pub status: LoadStatus,
}

/// Snapshot of a window and its child tabs.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub id: WindowId,
    pub focused: bool,
    pub width: u32,
    pub height: u32,
    pub tabs: Vec<Tab>,
}

/// Insertion position for a tab move.
///
/// `Append` maps to the host's "-1" sentinel: place the tabs after the
/// current last tab of the destination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPos {
    At(u32),
    Append,
}

/// Parameters for window creation. The default value creates a plain window
/// with a single host-provided placeholder tab.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateWindow {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Document to load into the window's initial tab.
    pub url: Option<String>,
    /// Create a detached panel instead of a normal window.
    pub panel: bool,
}

/// Failures raised by host calls.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("tab {0} not found")]
    TabNotFound(TabId),

    #[error("window {0} not found")]
    WindowNotFound(WindowId),

    #[error("host call failed: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, HostError>;

/// Tab enumeration and manipulation.
pub trait TabHost {
    async fn get_tab(&self, tab: TabId) -> Result<Tab>;

    /// All tabs of a window, in index order.
    async fn list_tabs(&self, window: WindowId) -> Result<Vec<Tab>>;

    /// Move `tabs` (as one group, preserving their order) into `window` at
    /// `pos`. Returns the moved tabs with their post-move metadata.
    async fn move_tabs(&self, tabs: &[TabId], window: WindowId, pos: InsertPos) -> Result<Vec<Tab>>;

    /// Make a tab the active tab of its window.
    async fn activate_tab(&self, tab: TabId) -> Result<()>;

    async fn remove_tabs(&self, tabs: &[TabId]) -> Result<()>;
}

/// Window enumeration and manipulation.
pub trait WindowHost {
    async fn get_window(&self, window: WindowId) -> Result<Window>;

    async fn list_windows(&self) -> Result<Vec<Window>>;

    /// The currently focused window.
    async fn current_window(&self) -> Result<Window>;

    async fn create_window(&self, params: CreateWindow) -> Result<Window>;

    async fn focus_window(&self, window: WindowId) -> Result<()>;

    async fn remove_window(&self, window: WindowId) -> Result<()>;
}

/// Transient status notifications. Repeated calls replace the previous
/// notification rather than stacking new ones.
pub trait NotificationSink {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Context-menu surface. Items form a tree via `parent` ids.
pub trait MenuHost {
    async fn create_item(&self, id: &str, title: &str, parent: Option<&str>) -> Result<()>;

    async fn update_item(&self, id: &str, title: &str) -> Result<()>;

    async fn remove_item(&self, id: &str) -> Result<()>;

    async fn remove_all(&self) -> Result<()>;
}

/// Outbound side of the embedder's message bus. The picker document and any
/// other extension page listening on the bus receive what is posted here.
pub trait MessagePort {
    async fn post(&self, message: &Message) -> Result<()>;
}

/// Async key/value settings storage. Values are JSON so the blob stays flat
/// and host-portable; change notifications arrive separately through
/// [`Engine::on_settings_changed`](crate::engine::Engine::on_settings_changed).
pub trait SettingsStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()>;
}

/// Everything the engine needs from the embedding host.
pub trait Host: TabHost + WindowHost + NotificationSink + MenuHost + MessagePort {}

impl<T: TabHost + WindowHost + NotificationSink + MenuHost + MessagePort> Host for T {}
