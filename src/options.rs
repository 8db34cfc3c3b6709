/// User options persisted in chrome.storage.sync
///
/// Each option is stored under its own key as a JSON string. A missing key
/// (or setting `None`) means the default value.
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

use crate::chrome::{self, Subscription};
use crate::error::{Result, RewardsError};

pub struct StoredOption<T> {
    name: &'static str,
    default: fn() -> T,
    _value: PhantomData<T>,
}

/// Unset means follow the system color scheme
pub static DARK_MODE: StoredOption<Option<bool>> = StoredOption::new("darkMode", || None);
pub static OPEN_ACTIVITY_URL: StoredOption<bool> = StoredOption::new("openActivityUrl", || true);
pub static MAX_ACTIVITIES: StoredOption<usize> = StoredOption::new("maxActivities", || 4000);

pub type OptionListener = Subscription<dyn FnMut(JsValue, JsValue)>;

impl<T: Serialize + DeserializeOwned + 'static> StoredOption<T> {
    pub const fn new(name: &'static str, default: fn() -> T) -> Self {
        StoredOption {
            name,
            default,
            _value: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn default_value(&self) -> T {
        (self.default)()
    }

    fn default_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.default_value())?)
    }

    pub fn encode(&self, value: Option<&T>) -> Result<String> {
        match value {
            Some(value) => Ok(serde_json::to_string(value)?),
            None => self.default_string(),
        }
    }

    pub fn decode(&self, raw: Option<&str>) -> Result<T> {
        match raw {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| RewardsError::Schema(format!("option {}: {}", self.name, e))),
            None => Ok(self.default_value()),
        }
    }

    pub async fn get(&self) -> Result<T> {
        let keys = js_sys::Object::new();
        js_sys::Reflect::set(&keys, &self.name.into(), &self.default_string()?.into())?;
        let items = chrome::storage_sync_get(&keys).await?;
        let raw = js_sys::Reflect::get(&items, &self.name.into())?.as_string();
        self.decode(raw.as_deref())
    }

    pub async fn set(&self, value: Option<T>) -> Result<()> {
        let items = js_sys::Object::new();
        js_sys::Reflect::set(&items, &self.name.into(), &self.encode(value.as_ref())?.into())?;
        chrome::storage_sync_set(&items).await?;
        Ok(())
    }

    /// Call `callback` with each new value; dropping the listener unsubscribes
    pub fn on_update(&'static self, callback: impl Fn(T) + 'static) -> Result<OptionListener> {
        let on_changed = move |changes: JsValue, _area: JsValue| {
            let Ok(change) = js_sys::Reflect::get(&changes, &self.name.into()) else {
                return;
            };
            if change.is_undefined() {
                return;
            }
            let raw = js_sys::Reflect::get(&change, &"newValue".into())
                .ok()
                .and_then(|v| v.as_string());
            match self.decode(raw.as_deref()) {
                Ok(value) => callback(value),
                Err(e) => log::warn!("Ignoring bad value for {}: {}", self.name, e),
            }
        };
        let listener = Closure::<dyn FnMut(JsValue, JsValue)>::new(on_changed);
        Ok(Subscription::new(
            chrome::event(&["chrome", "storage", "sync", "onChanged"])?,
            listener,
        ))
    }
}
