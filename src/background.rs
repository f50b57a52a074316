/// Background service worker: feeds browser events into the tracker and persists snapshots
use std::cell::RefCell;

use log::{debug, info, warn};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::config::{CONFIG_KEY, Config, StoredConfig};
use crate::error::BridgeError;
use crate::snapshot::{SNAPSHOT_KEYS, Snapshot};
use crate::tab_data::{BrowserEvent, TabId, TabInfo, TabStatus, WINDOW_ID_NONE, WindowFocus, WindowId};
use crate::tracker::Tracker;

// Import JS bridge functions
#[wasm_bindgen(module = "/js/background.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getTab(tab_id: i32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getActiveTab(window_id: i32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getStorage(keys: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(items: JsValue) -> Result<(), JsValue>;
}

thread_local! {
    static TRACKER: RefCell<Tracker> = RefCell::new(Tracker::default());
}

fn now() -> u64 {
    js_sys::Date::now() as u64
}

/// Apply an event. `now` is read here, after any awaited query has resumed.
fn dispatch(event: BrowserEvent) {
    let now = now();
    TRACKER.with(|tracker| tracker.borrow_mut().handle(event, now));
}

/// Load config and the last persisted snapshot; returns the tick period for the JS timer
#[wasm_bindgen]
pub async fn start_background() -> Result<u32, JsValue> {
    let config = load_config().await.unwrap_or_else(|e| {
        warn!("using default config: {}", e);
        Config::default()
    });
    let saved = load_snapshot().await.unwrap_or_else(|e| {
        warn!("starting with an empty ledger: {}", e);
        Snapshot::new()
    });

    let interval = config.tick_interval();
    TRACKER.with(|tracker| {
        let mut tracker = tracker.borrow_mut();
        tracker.set_config(config);
        tracker.restore(&saved);
    });
    info!("background started, tick every {} ms", interval);
    Ok(interval)
}

#[wasm_bindgen]
pub async fn on_tab_activated(tab_id: TabId) -> Result<(), JsValue> {
    let tab = query_tab(tab_id).await?;
    dispatch(BrowserEvent::TabActivated {
        tab_id,
        url: tab.and_then(|t| t.url),
    });
    Ok(())
}

#[wasm_bindgen]
pub fn on_tab_updated(tab_id: TabId, status: Option<String>, url: Option<String>) {
    dispatch(BrowserEvent::TabUpdated {
        tab_id,
        status: TabStatus::parse(status.as_deref()),
        url,
    });
}

#[wasm_bindgen]
pub fn on_tab_removed(tab_id: TabId) {
    dispatch(BrowserEvent::TabRemoved { tab_id });
}

#[wasm_bindgen]
pub async fn on_window_focus_changed(window_id: WindowId) -> Result<(), JsValue> {
    let focus = if window_id == WINDOW_ID_NONE {
        WindowFocus::Lost
    } else {
        WindowFocus::Gained {
            active_tab: query_active_tab(window_id).await?,
        }
    };
    dispatch(BrowserEvent::WindowFocusChanged(focus));
    Ok(())
}

/// Periodic flush. The storage write is fire-and-forget.
#[wasm_bindgen]
pub fn tick() {
    let now = now();
    let snapshot = TRACKER.with(|tracker| tracker.borrow_mut().tick(now));

    spawn_local(async move {
        if let Err(e) = save_snapshot(&snapshot).await {
            warn!("snapshot not persisted: {}", e);
        }
    });
}

// Helper functions

async fn query_tab(tab_id: TabId) -> Result<Option<TabInfo>, BridgeError> {
    let tab_js = getTab(tab_id).await?;
    Ok(serde_wasm_bindgen::from_value(tab_js)?)
}

async fn query_active_tab(window_id: WindowId) -> Result<Option<TabInfo>, BridgeError> {
    let tab_js = getActiveTab(window_id).await?;
    Ok(serde_wasm_bindgen::from_value(tab_js)?)
}

async fn load_config() -> Result<Config, BridgeError> {
    let keys = serde_wasm_bindgen::to_value(&[CONFIG_KEY])?;
    let stored: StoredConfig = serde_wasm_bindgen::from_value(getStorage(keys).await?)?;
    if let Some(config) = &stored.tracker_config {
        match serde_json::to_string(config) {
            Ok(json) => debug!("config overrides: {}", json),
            Err(e) => debug!("config overrides found, not printable: {}", e),
        }
    }
    Ok(stored.into_config())
}

async fn load_snapshot() -> Result<Snapshot, BridgeError> {
    let keys = serde_wasm_bindgen::to_value(&SNAPSHOT_KEYS)?;
    let stored = getStorage(keys).await?;

    if stored.is_null() || stored.is_undefined() {
        return Ok(Snapshot::new());
    }
    Ok(serde_wasm_bindgen::from_value(stored)?)
}

async fn save_snapshot(snapshot: &Snapshot) -> Result<(), BridgeError> {
    // Plain objects rather than JS Maps, so the stored record is JSON
    let items = snapshot.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?;
    setStorage(items).await?;
    Ok(())
}
