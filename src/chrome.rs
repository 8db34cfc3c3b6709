/// wasm-bindgen bindings for the chrome.* extension APIs we touch
use js_sys::{Function, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::WasmClosure;
use wasm_bindgen::prelude::*;

use crate::error::{Result, RewardsError};

#[wasm_bindgen]
extern "C" {
    /// `chrome.runtime.Port`
    #[derive(Debug, Clone)]
    pub type Port;

    #[wasm_bindgen(method, getter)]
    pub fn name(this: &Port) -> String;

    #[wasm_bindgen(method, js_name = postMessage)]
    pub fn post_message(this: &Port, message: &JsValue);

    #[wasm_bindgen(method)]
    pub fn disconnect(this: &Port);

    #[wasm_bindgen(method, getter, js_name = onMessage)]
    pub fn on_message(this: &Port) -> ChromeEvent;

    #[wasm_bindgen(method, getter, js_name = onDisconnect)]
    pub fn on_disconnect(this: &Port) -> ChromeEvent;

    /// Any `chrome.events.Event`
    #[derive(Debug, Clone)]
    pub type ChromeEvent;

    #[wasm_bindgen(method, js_name = addListener)]
    pub fn add_listener(this: &ChromeEvent, callback: &Function);

    #[wasm_bindgen(method, js_name = removeListener)]
    pub fn remove_listener(this: &ChromeEvent, callback: &Function);
}

// chrome.tabs
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "tabs"], js_name = query, catch)]
    pub async fn tabs_query(query_info: &JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "tabs"], js_name = create, catch)]
    pub async fn tabs_create(properties: &JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "tabs"], js_name = update, catch)]
    pub async fn tabs_update(
        tab_id: i32,
        properties: &JsValue,
    ) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "tabs"], js_name = sendMessage, catch)]
    pub async fn tabs_send_message(
        tab_id: i32,
        message: &JsValue,
    ) -> std::result::Result<JsValue, JsValue>;
}

// chrome.cookies
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "cookies"], js_name = get, catch)]
    pub async fn cookies_get(details: &JsValue) -> std::result::Result<JsValue, JsValue>;
}

// chrome.runtime
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "runtime"], js_name = sendMessage, catch)]
    pub async fn runtime_send_message(message: &JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "runtime"], js_name = connect, catch)]
    pub fn runtime_connect(connect_info: &JsValue) -> std::result::Result<Port, JsValue>;
}

// chrome.storage.sync
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "storage", "sync"], js_name = get, catch)]
    pub async fn storage_sync_get(keys: &JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "storage", "sync"], js_name = set, catch)]
    pub async fn storage_sync_set(items: &JsValue) -> std::result::Result<JsValue, JsValue>;
}

// chrome.sidePanel
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "sidePanel"], js_name = setPanelBehavior, catch)]
    pub async fn side_panel_set_behavior(
        behavior: &JsValue,
    ) -> std::result::Result<JsValue, JsValue>;
}

// Globals available in pages and workers alike
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = fetch, catch)]
    pub async fn fetch(request: &web_sys::Request) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = setTimeout)]
    pub fn set_timeout(handler: &Function, timeout_ms: i32) -> JsValue;

    #[wasm_bindgen(js_name = clearTimeout)]
    pub fn clear_timeout(handle: &JsValue);
}

/// Look up an event object such as `chrome.tabs.onUpdated` by path
pub fn event(path: &[&str]) -> Result<ChromeEvent> {
    let mut current: JsValue = js_sys::global().into();
    for segment in path {
        current = Reflect::get(&current, &JsValue::from_str(segment))?;
        if current.is_undefined() {
            return Err(RewardsError::Browser(format!(
                "{} is not available in this context",
                path.join(".")
            )));
        }
    }
    Ok(current.unchecked_into())
}

/// A listener registered on a `ChromeEvent`, removed again on drop
pub struct Subscription<F: ?Sized + WasmClosure> {
    event: ChromeEvent,
    closure: Option<Closure<F>>,
}

impl<F: ?Sized + WasmClosure> Subscription<F> {
    pub fn new(event: ChromeEvent, closure: Closure<F>) -> Self {
        event.add_listener(closure.as_ref().unchecked_ref());
        Subscription {
            event,
            closure: Some(closure),
        }
    }

    /// Keep the listener registered for the life of the context
    pub fn forget(mut self) {
        if let Some(closure) = self.closure.take() {
            closure.forget();
        }
    }
}

impl<F: ?Sized + WasmClosure> Drop for Subscription<F> {
    fn drop(&mut self) {
        if let Some(closure) = &self.closure {
            self.event.remove_listener(closure.as_ref().unchecked_ref());
        }
    }
}
