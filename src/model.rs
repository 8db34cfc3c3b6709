/// Data structures for AARP users, activities and rewards
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The signed-in AARP user, rebuilt from cookies and local storage on every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub fed_id: String,
    pub access_token: String,
    pub must_confirm_password: bool,
    #[serde(default)]
    pub rewards_balance: Option<f64>,
    #[serde(default)]
    pub daily_points_left: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityType {
    pub identifier: String,
    pub base_point_value: f64,
    pub name: String,
    pub visible_on_site: bool,
    pub active: Option<bool>,
}

/// An activity as returned by the list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub identifier: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub activity_type: ActivityType,
    pub name: String,
    pub category: String,
    pub url: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub primary_topic: Option<String>,
    pub active: bool,
    pub deleted: Option<bool>,
    pub members_only: bool,
}

impl Activity {
    pub fn points(&self) -> f64 {
        self.activity_type.base_point_value
    }

    pub fn is_within(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.end_date
    }
}

/// One element of the status endpoint's response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub activity_id: Uuid,
    pub completed: bool,
}

/// Completion state of a single activity as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityStatus {
    Complete,
    Incomplete,
    Unknown,
}

impl From<Option<bool>> for ActivityStatus {
    fn from(completed: Option<bool>) -> Self {
        match completed {
            Some(true) => ActivityStatus::Complete,
            Some(false) => ActivityStatus::Incomplete,
            None => ActivityStatus::Unknown,
        }
    }
}

/// Response of the claim endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardsResponse {
    pub activity_completed: Uuid,
    pub points_earned: f64,
    pub user_daily_points_left: f64,
    pub awarded: bool,
    pub success: bool,
}

/// Message pushed to connected side panels when the user may have changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub user: Option<User>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{Value, json};

    pub fn activity_json(id: &str) -> Value {
        json!({
            "identifier": id,
            "startDate": "2026-01-01T00:00:00Z",
            "endDate": "2026-12-31T23:59:59Z",
            "activityType": {
                "identifier": "READ_ARTICLE",
                "basePointValue": 50,
                "name": "Read an article",
                "visibleOnSite": true,
                "active": true
            },
            "name": "Read about retirement",
            "category": "Money",
            "url": "https://www.aarp.org/retirement/",
            "imageUrl": null,
            "description": "Learn something new",
            "primaryTopic": "Retirement",
            "active": true,
            "deleted": null,
            "membersOnly": false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_activity_deserialization() {
        let json = fixtures::activity_json("0b5b1d7e-2f55-4c44-9a46-5d2f8f3c1a10");

        let activity: Activity = serde_json::from_value(json).unwrap();

        assert_eq!(activity.name, "Read about retirement");
        assert_eq!(activity.points(), 50.0);
        assert_eq!(activity.activity_type.identifier, "READ_ARTICLE");
        assert_eq!(activity.deleted, None);
        assert!(activity.is_within(Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()));
        assert!(!activity.is_within(Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_activity_status_from_option() {
        assert_eq!(ActivityStatus::from(Some(true)), ActivityStatus::Complete);
        assert_eq!(ActivityStatus::from(Some(false)), ActivityStatus::Incomplete);
        assert_eq!(ActivityStatus::from(None), ActivityStatus::Unknown);
    }

    #[test]
    fn test_user_serializes_camel_case() {
        let user = User {
            username: "pat".to_string(),
            fed_id: "fed-123".to_string(),
            access_token: "token".to_string(),
            must_confirm_password: false,
            rewards_balance: Some(1200.0),
            daily_points_left: None,
        };

        let json = serde_json::to_value(&user).unwrap();

        assert_eq!(json["fedId"], "fed-123");
        assert_eq!(json["mustConfirmPassword"], false);
        assert_eq!(json["rewardsBalance"], 1200.0);
    }
}
