/// Typed message passing between the background worker, content script and side panel
///
/// Every request travels as `{type, payload}` and every reply as
/// `{status: "ok", value}` or `{status: "error", error}`, so errors raised in
/// one context reach the caller in another as `Err`.
use std::future::Future;

use js_sys::Function;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::chrome::{self, Subscription};
use crate::error::{ErrorPayload, Result, RewardsError};
use crate::filter::ActivitiesFilter;
use crate::model::{Activity, User};
use crate::tab_data::TabUpdate;

/// Serialize into a plain JS object (maps become objects, not `Map`s)
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    Ok(value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}

pub fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T> {
    Ok(serde_wasm_bindgen::from_value(value)?)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitiesQuery {
    pub max_activities: usize,
    pub access_token: String,
    #[serde(default)]
    pub filter: ActivitiesFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub activity_ids: Vec<Uuid>,
    pub user_fed_id: String,
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnRequest {
    pub activity: Activity,
    pub user: User,
    #[serde(default)]
    pub open_activity_url: bool,
}

/// Requests handled by the background worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Request {
    #[serde(rename = "getAarpUser")]
    GetUser,
    #[serde(rename = "getAarpActivities")]
    GetActivities(ActivitiesQuery),
    #[serde(rename = "getAarpActivityStatuses")]
    GetActivityStatuses(StatusQuery),
    #[serde(rename = "earnAarpActivityRewards")]
    EarnActivityRewards(EarnRequest),
    #[serde(rename = "updateAarpTab")]
    UpdateSiteTab(TabUpdate),
    /// Bring the site tab to the front on the configured login page
    #[serde(rename = "openAarpLoginPage")]
    OpenLoginPage,
    #[serde(rename = "alertPossibleUserChange")]
    PossibleUserChange,
}

/// Requests handled by the content script in a specific tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum TabRequest {
    #[serde(rename = "getTabLocalStorage")]
    GetLocalStorage(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Reply {
    Ok {
        #[serde(default)]
        value: serde_json::Value,
    },
    Error {
        error: ErrorPayload,
    },
}

impl Reply {
    pub fn from_result<T: Serialize>(result: Result<T>) -> Reply {
        match result.and_then(|value| Ok(serde_json::to_value(value)?)) {
            Ok(value) => Reply::Ok { value },
            Err(err) => Reply::Error {
                error: ErrorPayload::from(&err),
            },
        }
    }

    pub fn into_result<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Reply::Ok { value } => Ok(serde_json::from_value(value)?),
            Reply::Error { error } => Err(error.into()),
        }
    }
}

fn parse_reply<T: DeserializeOwned>(raw: JsValue) -> Result<T> {
    if raw.is_undefined() {
        return Err(RewardsError::NoResponse);
    }
    from_js::<Reply>(raw)?.into_result()
}

/// Send a request to the background worker and wait for its reply
pub async fn send_message<T: DeserializeOwned>(request: &Request) -> Result<T> {
    let raw = chrome::runtime_send_message(&to_js(request)?).await?;
    parse_reply(raw)
}

/// Send a request to the content script running in `tab_id`
pub async fn send_tab_message<T: DeserializeOwned>(tab_id: i32, request: &TabRequest) -> Result<T> {
    let raw = chrome::tabs_send_message(tab_id, &to_js(request)?).await?;
    parse_reply(raw)
}

/// Register `handler` for every message that parses as `R`
///
/// Messages of other shapes are left for other listeners.
fn listen<R, F, Fut>(handler: F) -> Result<()>
where
    R: DeserializeOwned + 'static,
    F: Fn(R) -> Fut + 'static,
    Fut: Future<Output = Result<serde_json::Value>> + 'static,
{
    let listener = Closure::<dyn FnMut(JsValue, JsValue, Function) -> bool>::new(
        move |message: JsValue, _sender: JsValue, send_response: Function| {
            let request: R = match from_js(message) {
                Ok(request) => request,
                Err(_) => return false,
            };
            let response = handler(request);
            spawn_local(async move {
                let reply = Reply::from_result(response.await);
                match to_js(&reply) {
                    Ok(reply) => {
                        if let Err(e) = send_response.call1(&JsValue::NULL, &reply) {
                            log::warn!("Failed to send reply: {:?}", e);
                        }
                    }
                    Err(e) => log::error!("Failed to serialize reply: {}", e),
                }
            });
            // Keep the channel open for the async reply
            true
        },
    );

    Subscription::new(chrome::event(&["chrome", "runtime", "onMessage"])?, listener).forget();
    Ok(())
}

pub fn on_runtime_message<F, Fut>(handler: F) -> Result<()>
where
    F: Fn(Request) -> Fut + 'static,
    Fut: Future<Output = Result<serde_json::Value>> + 'static,
{
    listen(handler)
}

pub fn on_tab_message<F, Fut>(handler: F) -> Result<()>
where
    F: Fn(TabRequest) -> Fut + 'static,
    Fut: Future<Output = Result<serde_json::Value>> + 'static,
{
    listen(handler)
}

/// Serialize a handler's result for the reply envelope
pub fn reply_value<T: Serialize>(value: T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}
