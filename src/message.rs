//! Wire messages exchanged over the embedder's message bus.
//!
//! Three parties speak this protocol: the engine, the picker document, and
//! other extensions. The JSON layout is part of the public surface, so every
//! field is camelCase and the variant tag rides in a `type` field:
//!
//! ```json
//! {"type": "reset", "fromWindowId": 3, "notification": false, "focus": true}
//! {"type": "move", "keyType": "raw", "tabIds": [5, 9], "toWindowId": 3}
//! {"type": "selectSize", "selectSize": [640, 480]}
//! ```

use serde::{Deserialize, Serialize};

use crate::host::{TabId, WindowId};

/// Which tabs a move operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveKind {
    /// Just the anchor tab.
    One,
    /// Tabs with a higher index than the anchor.
    Right,
    /// Tabs with a lower index than the anchor.
    Left,
    /// Every tab in the anchor's window.
    All,
    /// Open the picker window for manual selection.
    Select,
    /// An explicit tab-id list, already resolved.
    Raw,
}

impl MoveKind {
    /// Stable string form, used in menu item ids and the wire protocol.
    pub fn as_key(self) -> &'static str {
        match self {
            MoveKind::One => "one",
            MoveKind::Right => "right",
            MoveKind::Left => "left",
            MoveKind::All => "all",
            MoveKind::Select => "select",
            MoveKind::Raw => "raw",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "one" => Some(MoveKind::One),
            "right" => Some(MoveKind::Right),
            "left" => Some(MoveKind::Left),
            "all" => Some(MoveKind::All),
            "select" => Some(MoveKind::Select),
            "raw" => Some(MoveKind::Raw),
            _ => None,
        }
    }
}

/// A bus message. `Reset` flows engine → picker; the rest flow into the
/// engine, either from the picker or from another extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
    /// Repopulate the picker from `from_window_id` and relabel its
    /// destination header. A missing `to_window_id` means "new window".
    #[serde(rename_all = "camelCase")]
    Reset {
        from_window_id: WindowId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to_window_id: Option<WindowId>,
        notification: bool,
        focus: bool,
    },

    /// A relocation request. `tab_id` anchors the criterion kinds
    /// (one/right/left/all/select); `tab_ids` carries the explicit list for
    /// `raw`. Absent flags fall back to stored settings or `false`.
    #[serde(rename_all = "camelCase")]
    Move {
        key_type: MoveKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tab_id: Option<TabId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tab_ids: Option<Vec<TabId>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to_window_id: Option<WindowId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notification: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        focus: Option<bool>,
    },

    /// The picker's window size, reported just before it closes so the
    /// engine can persist it as the new default.
    #[serde(rename_all = "camelCase")]
    SelectSize { select_size: (u32, u32) },
}
