/// AARP Rewards - Chrome extension that claims AARP Rewards activity points
/// Built with Rust + WASM + Yew
pub mod activities;
pub mod api;
pub mod background;
pub mod chrome;
pub mod config;
pub mod content;
pub mod credentials;
pub mod error;
pub mod filter;
pub mod http;
pub mod messaging;
pub mod model;
pub mod notifier;
pub mod options;
pub mod schema;
pub mod site;
pub mod tab_data;
pub mod tabs;
pub mod ui;

use wasm_bindgen::prelude::*;

use crate::config::Config;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Entry point for the background service worker
#[wasm_bindgen]
pub fn start_background() {
    if let Err(e) = background::install(Config::default()) {
        log::error!("Background worker failed to start: {}", e);
    }
}

// Entry point for the content script injected into aarp.org pages
#[wasm_bindgen]
pub fn start_content_script() {
    if let Err(e) = content::install() {
        log::error!("Content script failed to start: {}", e);
    }
}

// Start the Yew app for the side panel
#[wasm_bindgen]
pub fn start_sidepanel() {
    yew::Renderer::<ui::sidepanel::App>::new().render();
}
