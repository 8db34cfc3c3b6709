/// Data structures for browser tabs as seen through chrome.tabs
use serde::{Deserialize, Serialize};

/// Information about a browser tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub status: Option<String>,
}

impl TabInfo {
    pub fn is_loaded(&self) -> bool {
        self.status.as_deref() == Some("complete")
    }
}

/// Subset of `chrome.tabs.UpdateProperties` the extension uses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl TabUpdate {
    pub fn navigate(url: impl Into<String>) -> Self {
        TabUpdate {
            url: Some(url.into()),
            active: None,
        }
    }

    pub fn activate(mut self) -> Self {
        self.active = Some(true);
        self
    }
}

/// `changeInfo` argument of `chrome.tabs.onUpdated`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TabChange {
    #[serde(default)]
    pub status: Option<String>,
}
