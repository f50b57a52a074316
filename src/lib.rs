/// Site Time Tracker - Chrome extension measuring time spent per website
/// Built with Rust + WASM + Yew

pub mod config;
pub mod error;
pub mod focus;
pub mod hostname;
pub mod ledger;
pub mod report;
pub mod snapshot;
pub mod tab_data;
pub mod tracker;

mod background;
pub mod ui;

use wasm_bindgen::prelude::*;

pub use background::{on_tab_activated, on_tab_removed, on_tab_updated, on_window_focus_changed, start_background, tick};
pub use tracker::Tracker;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Re-export the hostname normalizer for JavaScript access
#[wasm_bindgen]
pub fn normalize_hostname(url: &str) -> Option<String> {
    hostname::normalize(url).map(hostname::Hostname::into_string)
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

// Start the Yew app for the dashboard page
#[wasm_bindgen]
pub fn start_dashboard() {
    yew::Renderer::<ui::dashboard::Dashboard>::new().render();
}
