/// Activity filtering: which activities are worth showing and claiming
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Activity;

/// User-selectable refinements on top of availability
///
/// Empty lists mean "no restriction".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivitiesFilter {
    pub phrases: Vec<String>,
    pub topics: Vec<String>,
    pub excluded_types: Vec<String>,
    pub include_members_only: bool,
}

impl Default for ActivitiesFilter {
    fn default() -> Self {
        ActivitiesFilter {
            phrases: Vec::new(),
            topics: Vec::new(),
            excluded_types: Vec::new(),
            include_members_only: true,
        }
    }
}

/// Whether an activity can be completed right now at all
pub fn is_available(activity: &Activity, now: DateTime<Utc>) -> bool {
    activity.active
        && activity.deleted != Some(true)
        && activity.is_within(now)
        && activity.activity_type.visible_on_site
        && activity.activity_type.active != Some(false)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Whether an activity passes the user's filter
pub fn matches(filter: &ActivitiesFilter, activity: &Activity) -> bool {
    if activity.members_only && !filter.include_members_only {
        return false;
    }

    if filter
        .excluded_types
        .iter()
        .any(|t| eq_ignore_case(t, &activity.activity_type.identifier))
    {
        return false;
    }

    let phrase_ok = filter.phrases.is_empty()
        || filter.phrases.iter().any(|phrase| {
            contains_ignore_case(&activity.name, phrase)
                || activity
                    .description
                    .as_deref()
                    .is_some_and(|d| contains_ignore_case(d, phrase))
        });

    let topic_ok = filter.topics.is_empty()
        || activity.primary_topic.as_deref().is_some_and(|topic| {
            filter.topics.iter().any(|t| eq_ignore_case(t, topic))
        });

    phrase_ok && topic_ok
}

/// Available activities passing the filter, in source order, truncated to `cap`
pub fn select_activities(
    activities: Vec<Activity>,
    filter: &ActivitiesFilter,
    now: DateTime<Utc>,
    cap: usize,
) -> Vec<Activity> {
    activities
        .into_iter()
        .filter(|activity| is_available(activity, now) && matches(filter, activity))
        .take(cap)
        .collect()
}

/// Indices of the activities that pass the filter
pub fn apply_activities_filter(activities: &[Activity], filter: &ActivitiesFilter) -> Vec<usize> {
    activities
        .iter()
        .enumerate()
        .filter(|(_, activity)| matches(filter, activity))
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::activity_json;
    use chrono::TimeZone;

    fn create_test_activity(id: &str, name: &str) -> Activity {
        let mut json = activity_json(id);
        json["name"] = serde_json::Value::from(name);
        serde_json::from_value(json).unwrap()
    }

    fn june() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    const ID_A: &str = "00000000-0000-4000-8000-00000000000a";
    const ID_B: &str = "00000000-0000-4000-8000-00000000000b";
    const ID_C: &str = "00000000-0000-4000-8000-00000000000c";

    #[test]
    fn test_is_available() {
        let activity = create_test_activity(ID_A, "Quiz");
        assert!(is_available(&activity, june()));
    }

    #[test]
    fn test_is_available_rejects_inactive_and_deleted() {
        let mut inactive = create_test_activity(ID_A, "Quiz");
        inactive.active = false;
        assert!(!is_available(&inactive, june()));

        let mut deleted = create_test_activity(ID_A, "Quiz");
        deleted.deleted = Some(true);
        assert!(!is_available(&deleted, june()));

        // null means "not deleted"
        let mut not_deleted = create_test_activity(ID_A, "Quiz");
        not_deleted.deleted = Some(false);
        assert!(is_available(&not_deleted, june()));
    }

    #[test]
    fn test_is_available_date_window() {
        let activity = create_test_activity(ID_A, "Quiz");

        assert!(!is_available(&activity, Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap()));
        assert!(is_available(&activity, activity.start_date));
        assert!(is_available(&activity, activity.end_date));
        assert!(!is_available(&activity, Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_is_available_activity_type() {
        let mut hidden = create_test_activity(ID_A, "Quiz");
        hidden.activity_type.visible_on_site = false;
        assert!(!is_available(&hidden, june()));

        let mut retired_type = create_test_activity(ID_A, "Quiz");
        retired_type.activity_type.active = Some(false);
        assert!(!is_available(&retired_type, june()));

        let mut unknown_type_state = create_test_activity(ID_A, "Quiz");
        unknown_type_state.activity_type.active = None;
        assert!(is_available(&unknown_type_state, june()));
    }

    #[test]
    fn test_matches_default_filter_accepts_everything() {
        let activity = create_test_activity(ID_A, "Quiz");
        assert!(matches(&ActivitiesFilter::default(), &activity));
    }

    #[test]
    fn test_matches_phrases() {
        let activity = create_test_activity(ID_A, "Brain Games Weekly");
        let filter = ActivitiesFilter {
            phrases: vec!["brain games".to_string()],
            ..Default::default()
        };
        assert!(matches(&filter, &activity));

        // Description is searched too
        let filter = ActivitiesFilter {
            phrases: vec!["SOMETHING NEW".to_string()],
            ..Default::default()
        };
        assert!(matches(&filter, &activity));

        let filter = ActivitiesFilter {
            phrases: vec!["crossword".to_string()],
            ..Default::default()
        };
        assert!(!matches(&filter, &activity));
    }

    #[test]
    fn test_matches_topics() {
        let mut activity = create_test_activity(ID_A, "Quiz");
        let filter = ActivitiesFilter {
            topics: vec!["retirement".to_string(), "health".to_string()],
            ..Default::default()
        };
        assert!(matches(&filter, &activity));

        activity.primary_topic = None;
        assert!(!matches(&filter, &activity));
    }

    #[test]
    fn test_matches_non_ascii_case() {
        let mut activity = create_test_activity(ID_A, "ÉCONOMIE");
        activity.primary_topic = Some("ÉCONOMIE".to_string());

        let topic = ActivitiesFilter {
            topics: vec!["économie".to_string()],
            ..Default::default()
        };
        assert!(matches(&topic, &activity));

        let phrase = ActivitiesFilter {
            phrases: vec!["économie".to_string()],
            ..Default::default()
        };
        assert!(matches(&phrase, &activity));

        activity.activity_type.identifier = "LIRE_ÉTUDE".to_string();
        let excluded = ActivitiesFilter {
            excluded_types: vec!["lire_étude".to_string()],
            ..Default::default()
        };
        assert!(!matches(&excluded, &activity));
    }

    #[test]
    fn test_matches_excluded_types_and_members_only() {
        let mut activity = create_test_activity(ID_A, "Quiz");
        let filter = ActivitiesFilter {
            excluded_types: vec!["read_article".to_string()],
            ..Default::default()
        };
        assert!(!matches(&filter, &activity));

        activity.members_only = true;
        let filter = ActivitiesFilter {
            include_members_only: false,
            ..Default::default()
        };
        assert!(!matches(&filter, &activity));
    }

    #[test]
    fn test_select_activities_filters_and_truncates() {
        let mut expired = create_test_activity(ID_B, "Expired");
        expired.end_date = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();

        let activities = vec![
            create_test_activity(ID_A, "First"),
            expired,
            create_test_activity(ID_C, "Third"),
            create_test_activity(ID_A, "Fourth"),
        ];

        let selected =
            select_activities(activities.clone(), &ActivitiesFilter::default(), june(), 10);
        let names: Vec<&str> = selected.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Third", "Fourth"]);

        let capped = select_activities(activities, &ActivitiesFilter::default(), june(), 2);
        assert_eq!(capped.len(), 2);
        assert_eq!(capped[1].name, "Third");
    }

    #[test]
    fn test_select_activities_zero_cap() {
        let activities = vec![create_test_activity(ID_A, "First")];
        assert!(select_activities(activities, &ActivitiesFilter::default(), june(), 0).is_empty());
    }

    #[test]
    fn test_apply_activities_filter_returns_indices() {
        let activities = vec![
            create_test_activity(ID_A, "Crossword"),
            create_test_activity(ID_B, "Sudoku"),
            create_test_activity(ID_C, "Daily crossword"),
        ];
        let filter = ActivitiesFilter {
            phrases: vec!["crossword".to_string()],
            ..Default::default()
        };

        assert_eq!(apply_activities_filter(&activities, &filter), vec![0, 2]);
        assert_eq!(
            apply_activities_filter(&activities, &ActivitiesFilter::default()),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_filter_deserializes_with_defaults() {
        let filter: ActivitiesFilter = serde_json::from_str(r#"{"phrases": ["quiz"]}"#).unwrap();

        assert_eq!(filter.phrases, vec!["quiz"]);
        assert!(filter.topics.is_empty());
        assert!(filter.include_members_only);
    }
}
