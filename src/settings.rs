//! Settings keys, defaults, and typed reads over the external store.
//!
//! The store is a flat key/value blob owned by the embedder (usually synced
//! storage). Every read goes through [`get_or`], which applies the default
//! when the key is absent, the read fails, or the stored value no longer
//! decodes. A stale blob must never break a relocation.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::host::{HostError, SettingsStore};
use crate::message::MoveKind;

/// Which operations appear in the destination menu.
pub const KEY_MENU_ITEMS: &str = "menuItems";
/// Picker window size as a `[width, height]` pair.
pub const KEY_SELECT_SIZE: &str = "selectSize";
/// Whether the picker's last-used size replaces the stored default.
pub const KEY_SELECT_SAVE: &str = "selectSave";
/// Whether relocations report progress notifications.
pub const KEY_NOTIFICATION: &str = "notification";
/// Whether the destination window is focused after a move.
pub const KEY_FOCUS: &str = "focus";

pub const DEFAULT_SELECT_SIZE: (u32, u32) = (640, 480);
pub const DEFAULT_SELECT_SAVE: bool = true;
pub const DEFAULT_NOTIFICATION: bool = false;
pub const DEFAULT_FOCUS: bool = false;

pub fn default_menu_items() -> Vec<MoveKind> {
    vec![MoveKind::One, MoveKind::Right, MoveKind::All]
}

/// Read `key`, falling back to `default` on absence or any failure.
pub async fn get_or<T, S>(store: &S, key: &str, default: T) -> T
where
    T: DeserializeOwned,
    S: SettingsStore,
{
    let value = match store.get(key).await {
        Ok(value) => value,
        Err(e) => {
            warn!("settings read for {key} failed: {e}");
            return default;
        }
    };
    match value {
        Some(value) => match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("stored value for {key} is malformed: {e}");
                default
            }
        },
        None => default,
    }
}

/// Serialize and store a value under `key`.
pub async fn set_json<T, S>(store: &S, key: &str, value: &T) -> Result<(), HostError>
where
    T: Serialize,
    S: SettingsStore,
{
    let json = serde_json::to_value(value)
        .map_err(|e| HostError::Backend(format!("cannot encode {key}: {e}")))?;
    store.set(key, json).await
}
