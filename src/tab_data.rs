/// Data structures exchanged with the browser's tab and window APIs
use serde::{Deserialize, Serialize};

/// Opaque browser tab identifier
pub type TabId = i32;

/// Opaque browser window identifier
pub type WindowId = i32;

/// Milliseconds since the Unix epoch
pub type Timestamp = u64;

/// Window id the browser reports when no window holds OS focus
pub const WINDOW_ID_NONE: WindowId = -1;

/// Information about a browser tab, as returned by tab queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: TabId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub window_id: Option<WindowId>,
    #[serde(default)]
    pub active: bool,
}

impl TabInfo {
    pub fn new(id: TabId, url: impl Into<String>) -> TabInfo {
        TabInfo {
            id,
            url: Some(url.into()),
            window_id: None,
            active: true,
        }
    }
}

/// Loading status carried by a tab-updated event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStatus {
    Loading,
    Complete,
    Unknown,
}

impl TabStatus {
    pub fn parse(status: Option<&str>) -> TabStatus {
        match status {
            Some("loading") => TabStatus::Loading,
            Some("complete") => TabStatus::Complete,
            _ => TabStatus::Unknown,
        }
    }
}

/// Focus state reported by a window focus-changed event
#[derive(Debug, Clone, PartialEq)]
pub enum WindowFocus {
    /// No browser window holds OS focus
    Lost,
    /// A window gained focus; carries its active tab when the query found one
    Gained { active_tab: Option<TabInfo> },
}

/// A browser event with its tab metadata already resolved
///
/// The background page awaits any tab or window query before building one of these,
/// so the values are current as of the moment the event is handed to the tracker.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowserEvent {
    TabActivated {
        tab_id: TabId,
        url: Option<String>,
    },
    TabUpdated {
        tab_id: TabId,
        status: TabStatus,
        url: Option<String>,
    },
    TabRemoved {
        tab_id: TabId,
    },
    WindowFocusChanged(WindowFocus),
}
