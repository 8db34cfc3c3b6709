/// Sending `ApiRequest`s through the browser's fetch
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

use crate::api::ApiRequest;
use crate::chrome;
use crate::config::Config;
use crate::error::{Result, RewardsError};

/// Map an HTTP status to the error the UI should see, if any
pub fn check_status(status: u16, url: &str, login_url: &str) -> Result<()> {
    match status {
        200..=299 => Ok(()),
        401 | 403 => Err(RewardsError::NotLoggedIn {
            login_url: login_url.to_string(),
        }),
        _ => Err(RewardsError::Http {
            status,
            url: url.to_string(),
        }),
    }
}

fn build_request(api_request: &ApiRequest) -> Result<Request> {
    let headers = Headers::new()?;
    for (name, value) in &api_request.headers {
        // Forbidden names (Referer) are dropped by the browser; `referrer` covers that
        headers.set(name, value)?;
    }

    let init = RequestInit::new();
    init.set_method(api_request.method.as_str());
    init.set_mode(RequestMode::Cors);
    init.set_headers(&headers);
    init.set_referrer(&api_request.referrer);
    if let Some(body) = &api_request.body {
        init.set_body(&body.into());
    }

    Ok(Request::new_with_str_and_init(&api_request.url, &init)?)
}

/// A body of only whitespace counts as no body at all
pub fn non_empty_body(text: Option<String>) -> Option<String> {
    text.filter(|body| !body.trim().is_empty())
}

/// Send a request and return its body, or `None` for an empty body
pub async fn send(config: &Config, api_request: &ApiRequest) -> Result<Option<String>> {
    log::debug!("{} {}", api_request.method.as_str(), api_request.url);

    let request = build_request(api_request)?;
    let response: Response = chrome::fetch(&request).await?.dyn_into()?;
    check_status(response.status(), &api_request.url, &config.login_url)?;

    let text = JsFuture::from(response.text()?).await?;
    Ok(non_empty_body(text.as_string()))
}
