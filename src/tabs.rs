/// Locating, opening and navigating the AARP tab
use std::cell::Cell;
use std::rc::Rc;

use js_sys::{Function, Promise};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::chrome::{self, Subscription};
use crate::config::Config;
use crate::error::{Result, RewardsError};
use crate::messaging::{from_js, to_js};
use crate::site::is_site_tab_url;
use crate::tab_data::{TabChange, TabInfo, TabUpdate};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TabQuery {
    active: bool,
    current_window: bool,
}

/// First tab in the list that is on the site
pub fn find_site_tab(tabs: &[TabInfo]) -> Option<&TabInfo> {
    tabs.iter().find(|tab| is_site_tab_url(tab.url.as_deref()))
}

/// Waits for `chrome.tabs.onUpdated` to report a tab as loaded
///
/// The listener is registered before the tab is created or updated, and
/// events are ignored until `wait_for` sets the id; nothing is buffered.
/// `onUpdated` is dispatched as a separate task, so it cannot fire before
/// the `tabs.create`/`tabs.update` promise hands back the id.
struct LoadWaiter {
    tab_id: Rc<Cell<Option<i32>>>,
    promise: Promise,
    _subscription: Subscription<dyn FnMut(i32, JsValue, JsValue)>,
}

impl LoadWaiter {
    fn new() -> Result<Self> {
        let mut resolve_slot: Option<Function> = None;
        let promise = Promise::new(&mut |resolve, _reject| resolve_slot = Some(resolve));
        let resolve = resolve_slot
            .ok_or_else(|| RewardsError::Browser("Promise executor did not run".to_string()))?;

        let tab_id: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
        let watched = tab_id.clone();
        let listener = Closure::<dyn FnMut(i32, JsValue, JsValue)>::new(
            move |updated_id: i32, change_info: JsValue, tab: JsValue| {
                if watched.get() != Some(updated_id) {
                    return;
                }
                let change: TabChange = from_js(change_info).unwrap_or_default();
                if change.status.as_deref() == Some("complete") {
                    let _ = resolve.call1(&JsValue::NULL, &tab);
                }
            },
        );

        let on_updated = chrome::event(&["chrome", "tabs", "onUpdated"])?;
        let subscription = Subscription::new(on_updated, listener);
        Ok(LoadWaiter {
            tab_id,
            promise,
            _subscription: subscription,
        })
    }

    async fn wait_for(self, tab_id: i32) -> Result<TabInfo> {
        self.tab_id.set(Some(tab_id));
        let tab = JsFuture::from(self.promise.clone()).await?;
        from_js(tab)
    }
}

fn tab_id(tab: &TabInfo) -> Result<i32> {
    tab.id.ok_or(RewardsError::NoSiteTab)
}

/// Find the site tab among the active tabs, or open one and wait for it to load
pub async fn get_site_tab(config: &Config) -> Result<TabInfo> {
    let query = to_js(&TabQuery {
        active: true,
        current_window: true,
    })?;
    let tabs: Vec<TabInfo> = from_js(chrome::tabs_query(&query).await?)?;
    if let Some(tab) = find_site_tab(&tabs) {
        return Ok(tab.clone());
    }

    log::info!("No AARP tab in the current window, opening {}", config.origin);
    let waiter = LoadWaiter::new()?;
    let create = to_js(&TabUpdate::navigate(config.origin.clone()).activate())?;
    let created: TabInfo = from_js(chrome::tabs_create(&create).await?)?;
    waiter.wait_for(tab_id(&created)?).await
}

/// Apply an update to a tab and resolve once the resulting load completes
pub async fn update_tab_and_wait(tab_id: i32, update: &TabUpdate) -> Result<TabInfo> {
    let waiter = LoadWaiter::new()?;
    let updated = chrome::tabs_update(tab_id, &to_js(update)?).await?;
    if updated.is_undefined() || updated.is_null() {
        return Err(RewardsError::NoSiteTab);
    }
    let updated: TabInfo = from_js(updated)?;

    // Activating an already-loaded tab does not fire a new load
    if update.url.is_none() && updated.is_loaded() {
        return Ok(updated);
    }
    waiter.wait_for(self::tab_id(&updated)?).await
}

/// Navigate/activate the site tab (opening it if needed); returns its id
pub async fn update_site_tab(config: &Config, update: &TabUpdate) -> Result<i32> {
    let tab = get_site_tab(config).await?;
    let updated = update_tab_and_wait(tab_id(&tab)?, update).await?;
    tab_id(&updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_tab(id: i32, url: Option<&str>) -> TabInfo {
        TabInfo {
            id: Some(id),
            url: url.map(str::to_string),
            active: true,
            status: Some("complete".to_string()),
        }
    }

    #[test]
    fn test_find_site_tab() {
        let tabs = vec![
            create_test_tab(1, Some("https://github.com/rust-lang")),
            create_test_tab(2, None),
            create_test_tab(3, Some("https://www.aarp.org/rewards/")),
            create_test_tab(4, Some("https://secure.aarp.org/")),
        ];

        assert_eq!(find_site_tab(&tabs).and_then(|t| t.id), Some(3));
    }

    #[test]
    fn test_find_site_tab_none() {
        let tabs = vec![create_test_tab(1, Some("https://example.com/aarp.org"))];
        assert!(find_site_tab(&tabs).is_none());
        assert!(find_site_tab(&[]).is_none());
    }
}
