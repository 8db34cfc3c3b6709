/// Reading the signed-in user out of cookies and the site's local storage
use serde::{Deserialize, Serialize};

use crate::chrome;
use crate::config::Config;
use crate::error::{Result, RewardsError};
use crate::messaging::{TabRequest, from_js, send_tab_message, to_js};
use crate::model::User;
use crate::tabs::get_site_tab;

#[derive(Serialize)]
struct CookieQuery<'a> {
    name: &'a str,
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct Cookie {
    value: String,
}

/// Build a user from the raw session values
///
/// Both identity cookies are required. With them but without a token the
/// site wants the password confirmed before it will issue one.
pub fn assemble_user(
    username: Option<String>,
    fed_id: Option<String>,
    access_token: Option<String>,
    rewards_balance: Option<f64>,
    daily_points_left: Option<f64>,
) -> Option<User> {
    let username = username.filter(|v| !v.is_empty())?;
    let fed_id = fed_id.filter(|v| !v.is_empty())?;
    let access_token = access_token.filter(|v| !v.is_empty());

    Some(User {
        username,
        fed_id,
        must_confirm_password: access_token.is_none(),
        access_token: access_token.unwrap_or_default(),
        rewards_balance,
        daily_points_left,
    })
}

/// Parse a balance stored as text; anything unparseable counts as unknown
pub fn parse_balance(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

async fn read_cookie(config: &Config, name: &str) -> Result<Option<String>> {
    let query = to_js(&CookieQuery {
        name,
        url: &config.cookie_url,
    })?;
    let raw = chrome::cookies_get(&query).await?;
    if raw.is_null() || raw.is_undefined() {
        return Ok(None);
    }
    Ok(Some(from_js::<Cookie>(raw)?.value))
}

/// Read the current user, opening the site tab if needed to reach its local storage
pub async fn read_user(config: &Config, daily_points_left: Option<f64>) -> Result<Option<User>> {
    let tab = get_site_tab(config).await?;
    let tab_id = tab.id.ok_or(RewardsError::NoSiteTab)?;

    let username = read_cookie(config, &config.username_cookie).await?;
    let fed_id = read_cookie(config, &config.fed_id_cookie).await?;
    let access_token: Option<String> = send_tab_message(
        tab_id,
        &TabRequest::GetLocalStorage(config.access_token_key.clone()),
    )
    .await?;
    let balance: Option<String> = send_tab_message(
        tab_id,
        &TabRequest::GetLocalStorage(config.rewards_balance_key.clone()),
    )
    .await?;

    let user = assemble_user(
        username,
        fed_id,
        access_token,
        parse_balance(balance.as_deref()),
        daily_points_left,
    );
    match &user {
        Some(user) if user.must_confirm_password => {
            log::info!("{} must confirm their password", user.username)
        }
        Some(user) => log::debug!("Signed in as {}", user.username),
        None => log::info!("No AARP session cookies"),
    }
    Ok(user)
}
