/// Static configuration for the AARP site and the extension's timing knobs
use url::Url;

pub const ORIGIN: &str = "https://www.aarp.org";
pub const LOGIN_URL: &str = "https://secure.aarp.org/applications/user/login";
pub const API_BASE: &str = "https://services.share.aarp.org/applications/CoreAPI/private/rewards";

/// Cookie and local storage keys that identify the signed-in user
pub const USERNAME_COOKIE: &str = "game";
pub const FED_ID_COOKIE: &str = "fedid";
pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REWARDS_BALANCE_KEY: &str = "rewards_balance";
pub const USER_STORAGE_KEYS: [&str; 2] = [ACCESS_TOKEN_KEY, REWARDS_BALANCE_KEY];

pub const SIDEPANEL_PORT: &str = "sidepanel-port";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub origin: String,
    pub login_url: String,
    /// URL the identity cookies are scoped to
    pub cookie_url: String,
    pub api_base: String,
    pub username_cookie: String,
    pub fed_id_cookie: String,
    pub access_token_key: String,
    pub rewards_balance_key: String,
    pub debounce_ms: u32,
    pub status_batch_size: usize,
    /// Upper bound on activities returned to the panel
    pub max_activities: usize,
    pub sidepanel_port: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            origin: ORIGIN.to_string(),
            login_url: LOGIN_URL.to_string(),
            cookie_url: "https://secure.aarp.org".to_string(),
            api_base: API_BASE.to_string(),
            username_cookie: USERNAME_COOKIE.to_string(),
            fed_id_cookie: FED_ID_COOKIE.to_string(),
            access_token_key: ACCESS_TOKEN_KEY.to_string(),
            rewards_balance_key: REWARDS_BALANCE_KEY.to_string(),
            debounce_ms: 500,
            status_batch_size: 10,
            max_activities: 4000,
            sidepanel_port: SIDEPANEL_PORT.to_string(),
        }
    }
}

impl Config {
    /// Referer sent with every API call
    pub fn referer(&self) -> String {
        format!("{}/", self.origin.trim_end_matches('/'))
    }

    pub fn user_cookie_names(&self) -> [&str; 2] {
        [&self.username_cookie, &self.fed_id_cookie]
    }

    /// Parent domain of `cookie_url`; identity cookies may live on any host under it
    pub fn cookie_domain(&self) -> Option<String> {
        let url = Url::parse(&self.cookie_url).ok()?;
        let host = url.host_str()?.to_lowercase();
        let labels: Vec<&str> = host.split('.').collect();
        Some(labels[labels.len().saturating_sub(2)..].join("."))
    }
}
