/// Validation of the AARP API responses
///
/// serde covers field presence and types, UUIDs and ISO datetimes; the
/// URL-or-empty rules are checked here after deserialization.
use url::Url;

use crate::error::{Result, RewardsError};
use crate::model::{Activity, RewardsResponse, StatusEntry};

fn schema_error(context: &str, err: impl std::fmt::Display) -> RewardsError {
    RewardsError::Schema(format!("{}: {}", context, err))
}

/// A URL field that may also be an empty string
fn check_url_or_empty(field: &str, value: &str) -> std::result::Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| format!("{} {:?} is not a URL ({})", field, value, e))
}

pub fn validate_activity(activity: &Activity) -> Result<()> {
    check_url_or_empty("url", &activity.url)
        .and_then(|_| match &activity.image_url {
            Some(image_url) => check_url_or_empty("imageUrl", image_url),
            None => Ok(()),
        })
        .map_err(|e| schema_error(&format!("activity {}", activity.identifier), e))
}

/// Parse and validate the list endpoint's body
pub fn parse_activities(body: &str) -> Result<Vec<Activity>> {
    let activities: Vec<Activity> =
        serde_json::from_str(body).map_err(|e| schema_error("activities list", e))?;
    for activity in &activities {
        validate_activity(activity)?;
    }
    Ok(activities)
}

pub fn parse_statuses(body: &str) -> Result<Vec<StatusEntry>> {
    serde_json::from_str(body).map_err(|e| schema_error("activity statuses", e))
}

pub fn parse_rewards_response(body: &str) -> Result<RewardsResponse> {
    serde_json::from_str(body).map_err(|e| schema_error("rewards response", e))
}
