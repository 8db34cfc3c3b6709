/// Content script running inside AARP pages
///
/// Gives the background worker read access to the page's localStorage and
/// reports storage changes that may mean a different user.
use wasm_bindgen::prelude::*;
use web_sys::{Storage, StorageEvent};

use crate::config::USER_STORAGE_KEYS;
use crate::error::{Result, RewardsError};
use crate::messaging::{Request, TabRequest, on_tab_message, reply_value, send_message};

fn local_storage() -> Result<Storage> {
    web_sys::window()
        .ok_or_else(|| RewardsError::Browser("No window in content script".to_string()))?
        .local_storage()?
        .ok_or_else(|| RewardsError::Browser("localStorage is unavailable".to_string()))
}

async fn handle(request: TabRequest) -> Result<serde_json::Value> {
    match request {
        TabRequest::GetLocalStorage(key) => reply_value(local_storage()?.get_item(&key)?),
    }
}

/// Whether a `storage` event concerns one of the keys that identify the user
pub fn is_user_storage_key(key: Option<&str>) -> bool {
    key.is_some_and(|key| USER_STORAGE_KEYS.contains(&key))
}

fn watch_storage() -> Result<()> {
    let window = web_sys::window().ok_or_else(|| RewardsError::Browser("No window".to_string()))?;
    let own_storage = local_storage()?;

    let listener = Closure::<dyn FnMut(StorageEvent)>::new(move |event: StorageEvent| {
        let is_local = event
            .storage_area()
            .is_some_and(|area| JsValue::from(area) == JsValue::from(own_storage.clone()));
        if is_local && is_user_storage_key(event.key().as_deref()) {
            wasm_bindgen_futures::spawn_local(async {
                if let Err(e) = send_message::<()>(&Request::PossibleUserChange).await {
                    log::warn!("Could not alert background of user change: {}", e);
                }
            });
        }
    });
    window.add_event_listener_with_callback("storage", listener.as_ref().unchecked_ref())?;
    listener.forget();
    Ok(())
}

pub fn install() -> Result<()> {
    on_tab_message(handle)?;
    watch_storage()?;
    log::debug!("AARP content script ready");
    Ok(())
}
