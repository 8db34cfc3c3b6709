/// Error types shared by every extension context
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RewardsError {
    #[error("Not logged into AARP")]
    NotLoggedIn { login_url: String },

    #[error("Browser API error: {0}")]
    Browser(String),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Invalid response: {0}")]
    Schema(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No AARP tab available")]
    NoSiteTab,

    #[error("No response from the other side of the message")]
    NoResponse,

    #[error("{name}: {message}")]
    Remote { name: String, message: String },
}

impl RewardsError {
    /// Stable name used when the error crosses a message boundary
    pub fn name(&self) -> &'static str {
        match self {
            RewardsError::NotLoggedIn { .. } => "NotLoggedInError",
            RewardsError::Browser(_) => "BrowserError",
            RewardsError::Http { .. } => "HttpError",
            RewardsError::Schema(_) => "SchemaError",
            RewardsError::Serialization(_) => "SerializationError",
            RewardsError::Config(_) => "ConfigError",
            RewardsError::NoSiteTab => "NoSiteTabError",
            RewardsError::NoResponse => "NoResponseError",
            RewardsError::Remote { .. } => "Error",
        }
    }

    pub fn login_url(&self) -> Option<&str> {
        match self {
            RewardsError::NotLoggedIn { login_url } => Some(login_url),
            _ => None,
        }
    }
}

impl From<JsValue> for RewardsError {
    fn from(value: JsValue) -> Self {
        let message = value
            .as_string()
            .or_else(|| {
                js_sys::Reflect::get(&value, &JsValue::from_str("message"))
                    .ok()
                    .and_then(|m| m.as_string())
            })
            .unwrap_or_else(|| format!("{:?}", value));
        RewardsError::Browser(message)
    }
}

impl From<serde_wasm_bindgen::Error> for RewardsError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        RewardsError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for RewardsError {
    fn from(err: serde_json::Error) -> Self {
        RewardsError::Serialization(err.to_string())
    }
}

/// Serializable form of an error, carried inside message replies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,
}

impl From<&RewardsError> for ErrorPayload {
    fn from(err: &RewardsError) -> Self {
        let (name, message) = match err {
            RewardsError::Remote { name, message } => (name.clone(), message.clone()),
            other => (other.name().to_string(), other.to_string()),
        };
        ErrorPayload {
            name,
            message,
            login_url: err.login_url().map(str::to_string),
        }
    }
}

impl From<ErrorPayload> for RewardsError {
    fn from(payload: ErrorPayload) -> Self {
        match payload.login_url {
            Some(login_url) if payload.name == "NotLoggedInError" => {
                RewardsError::NotLoggedIn { login_url }
            }
            _ => RewardsError::Remote {
                name: payload.name,
                message: payload.message,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, RewardsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_logged_in_keeps_login_url_across_payload() {
        let err = RewardsError::NotLoggedIn {
            login_url: "https://secure.aarp.org/applications/user/login".to_string(),
        };

        let payload = ErrorPayload::from(&err);
        assert_eq!(payload.name, "NotLoggedInError");

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"loginUrl\""));

        let back: ErrorPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(RewardsError::from(back), err);
    }

    #[test]
    fn test_other_errors_become_remote() {
        let err = RewardsError::Http {
            status: 500,
            url: "https://example.test/activities".to_string(),
        };

        let remote = RewardsError::from(ErrorPayload::from(&err));

        assert_eq!(
            remote,
            RewardsError::Remote {
                name: "HttpError".to_string(),
                message: "HTTP 500 from https://example.test/activities".to_string(),
            }
        );
        // Forwarding a remote error again keeps its name and message as-is
        let forwarded = ErrorPayload::from(&remote);
        assert_eq!(forwarded.name, "HttpError");
        assert_eq!(forwarded.message, "HTTP 500 from https://example.test/activities");
    }
}
