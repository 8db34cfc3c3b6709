/// Request construction for the AARP rewards REST endpoints
///
/// Building is kept separate from sending (see `http`) so the exact
/// requests can be checked without a browser.
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Result, RewardsError};
use crate::model::Activity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Also passed to fetch as `referrer`, since browsers drop a literal Referer header
    pub referrer: String,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClaimBody<'a> {
    activity_id: Uuid,
    activity_type: &'a str,
}

pub struct RewardsApi<'a> {
    config: &'a Config,
}

impl<'a> RewardsApi<'a> {
    pub fn new(config: &'a Config) -> Self {
        RewardsApi { config }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = format!("{}/", self.config.api_base.trim_end_matches('/'));
        Url::parse(&base)
            .and_then(|base| base.join(path.trim_start_matches('/')))
            .map_err(|e| RewardsError::Config(format!("Bad API URL for {}: {}", path, e)))
    }

    fn request(
        &self,
        method: Method,
        url: Url,
        access_token: &str,
        body: Option<String>,
    ) -> ApiRequest {
        let referer = self.config.referer();
        let mut headers = vec![
            ("Authorization".to_string(), format!("Bearer {}", access_token)),
            ("Accept".to_string(), "application/json".to_string()),
            ("Referer".to_string(), referer.clone()),
        ];
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        ApiRequest {
            method,
            url: url.to_string(),
            headers,
            referrer: referer,
            body,
        }
    }

    pub fn list_activities(&self, access_token: &str) -> Result<ApiRequest> {
        let url = self.endpoint("activities")?;
        Ok(self.request(Method::Get, url, access_token, None))
    }

    /// Completion status for up to one batch of activities
    pub fn activity_statuses(
        &self,
        fed_id: &str,
        access_token: &str,
        activity_ids: &[Uuid],
    ) -> Result<ApiRequest> {
        let mut url = self.endpoint(&format!("users/{}/activities/status", fed_id))?;
        let ids = activity_ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        url.query_pairs_mut().append_pair("activityIds", &ids);
        Ok(self.request(Method::Get, url, access_token, None))
    }

    pub fn claim_reward(
        &self,
        fed_id: &str,
        access_token: &str,
        activity: &Activity,
    ) -> Result<ApiRequest> {
        let url = self.endpoint(&format!("users/{}/activities", fed_id))?;
        let body = serde_json::to_string(&ClaimBody {
            activity_id: activity.identifier,
            activity_type: &activity.activity_type.identifier,
        })?;
        Ok(self.request(Method::Post, url, access_token, Some(body)))
    }
}
