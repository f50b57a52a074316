/// UI module exports: popup and dashboard, both read-only views of the stored snapshot
use std::cell::RefCell;
use std::rc::Rc;

use log::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::config::{CONFIG_KEY, Config, StoredConfig};
use crate::error::BridgeError;
use crate::snapshot::{SNAPSHOT_KEYS, Snapshot};

pub mod components;
pub mod dashboard;
pub mod popup;

// Import JS bridge functions
#[wasm_bindgen(module = "/js/ui.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getStorage(keys: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn openDashboard() -> Result<(), JsValue>;
}

#[derive(Clone, PartialEq)]
pub enum ViewState {
    Loading,
    Ready { snapshot: Snapshot, config: Config },
    Error(String),
}

/// Load the config once, then re-read the snapshot every poll interval
#[hook]
pub fn use_tracker_view() -> UseStateHandle<ViewState> {
    let view = use_state(|| ViewState::Loading);

    {
        let view = view.clone();
        use_effect_with((), move |_| {
            let poller: Rc<RefCell<Option<Poller>>> = Rc::default();
            let slot = poller.clone();

            spawn_local(async move {
                let config = load_config().await.unwrap_or_else(|e| {
                    warn!("using default config: {}", e);
                    Config::default()
                });
                refresh(view.clone(), config.clone());

                let interval = config.poll_interval();
                *slot.borrow_mut() = Poller::start(interval, move || refresh(view.clone(), config.clone()));
            });

            move || drop(poller.borrow_mut().take())
        });
    }

    view
}

pub(crate) fn open_dashboard() {
    spawn_local(async move {
        if let Err(e) = openDashboard().await {
            warn!("could not open dashboard: {:?}", e);
        }
    });
}

fn refresh(view: UseStateHandle<ViewState>, config: Config) {
    spawn_local(async move {
        match load_snapshot().await {
            Ok(snapshot) => view.set(ViewState::Ready { snapshot, config }),
            Err(e) => view.set(ViewState::Error(format!("Failed to load: {}", e))),
        }
    });
}

/// A `setInterval` registration, cleared on drop
struct Poller {
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

impl Poller {
    fn start(interval_ms: u32, f: impl FnMut() + 'static) -> Option<Poller> {
        let timeout = i32::try_from(interval_ms).unwrap_or(i32::MAX);
        let callback = Closure::<dyn FnMut()>::new(f);
        let handle = web_sys::window()?
            .set_interval_with_callback_and_timeout_and_arguments_0(callback.as_ref().unchecked_ref(), timeout)
            .ok()?;

        Some(Poller {
            handle,
            _callback: callback,
        })
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            window.clear_interval_with_handle(self.handle);
        }
    }
}

// Helper functions

async fn load_config() -> Result<Config, BridgeError> {
    let keys = serde_wasm_bindgen::to_value(&[CONFIG_KEY])?;
    let stored: StoredConfig = serde_wasm_bindgen::from_value(getStorage(keys).await?)?;
    Ok(stored.into_config())
}

async fn load_snapshot() -> Result<Snapshot, BridgeError> {
    let keys = serde_wasm_bindgen::to_value(&SNAPSHOT_KEYS)?;
    let stored = getStorage(keys).await?;

    // Nothing written yet: show the empty state
    if stored.is_null() || stored.is_undefined() {
        return Ok(Snapshot::new());
    }
    Ok(serde_wasm_bindgen::from_value(stored)?)
}
