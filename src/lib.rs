//! tabshift - move browser tabs between windows, in batches.
//!
//! tabshift is the engine behind a tab-relocation extension: it decides which
//! tabs move, in what order and batches, to which window and position, and
//! it keeps the user's focus off unloaded tabs while doing so. The browser
//! itself stays behind a set of host traits, so the engine runs against any
//! embedder (or an in-memory fake in tests).
//!
//! # Features
//!
//! - **Batch moves**: pinned and unpinned tabs are partitioned and moved in
//!   bounded batches, preserving order within each group
//! - **Focus rescue**: before the active tab leaves a window, the nearest
//!   surviving tab is activated so no unloaded tab gets focused
//! - **Destination menu**: per-window context-menu entries labelled by each
//!   window's active tab, kept current from activation events
//! - **Picker window**: a single reusable selection window with readiness
//!   polling, stale-window recovery, and size persistence
//! - **Progress notifications**: optional start/progress/success/failure
//!   reporting for long-running moves
//!
//! # Overview
//!
//! The embedder constructs an [`Engine`] from its host implementation and
//! settings store, calls [`Engine::bootstrap`] once, and then forwards
//! browser events (tab activated, window created/removed/focused), menu
//! clicks, and bus [`Message`]s. Everything else happens inside.
//!
//! ```ignore
//! let mut engine = Engine::new(host, store);
//! engine.bootstrap().await;
//!
//! // from the embedder's event hooks:
//! engine.on_tab_activated(tab_id).await;
//! engine.on_menu_clicked("one_42", tab_id).await;
//! engine.handle_external(message).await;
//! ```

#![allow(async_fn_in_trait)]

pub mod engine;
pub mod host;
pub mod menu;
pub mod message;
pub mod monitor;
pub mod picker;
pub mod relocate;
pub mod settings;

#[cfg(test)]
pub(crate) mod testutil;

pub use engine::Engine;
pub use host::{
    CreateWindow, Host, HostError, InsertPos, LoadStatus, MenuHost, MessagePort, NotificationSink,
    SettingsStore, Tab, TabHost, TabId, Window, WindowHost, WindowId,
};
pub use message::{Message, MoveKind};
pub use monitor::{FocusEvent, FocusMonitor};
pub use picker::{PickerError, PickerManager};
pub use relocate::Progress;
