/// Fetching activities, their statuses, and claiming rewards
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::api::RewardsApi;
use crate::config::Config;
use crate::error::{Result, RewardsError};
use crate::filter::{ActivitiesFilter, select_activities};
use crate::http;
use crate::model::{Activity, RewardsResponse, StatusEntry, User};
use crate::schema::{parse_activities, parse_rewards_response, parse_statuses};

/// Current time according to the JS clock
pub fn now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(js_sys::Date::now() as i64).unwrap_or_default()
}

fn require_token(config: &Config, access_token: &str) -> Result<()> {
    if access_token.is_empty() {
        return Err(RewardsError::NotLoggedIn {
            login_url: config.login_url.clone(),
        });
    }
    Ok(())
}

/// Line the status entries up with the requested ids; ids the server left out are unknown
pub fn statuses_in_order(requested: &[Uuid], entries: &[StatusEntry]) -> Vec<Option<bool>> {
    let by_id: HashMap<Uuid, bool> = entries
        .iter()
        .map(|entry| (entry.activity_id, entry.completed))
        .collect();
    requested.iter().map(|id| by_id.get(id).copied()).collect()
}

/// Resolve every batch in turn; a failed batch yields `None` for its ids and the rest continue
pub async fn collect_batches<F, Fut>(
    ids: &[Uuid],
    batch_size: usize,
    mut fetch_batch: F,
) -> Vec<Option<bool>>
where
    F: FnMut(Vec<Uuid>) -> Fut,
    Fut: std::future::Future<Output = Result<Vec<StatusEntry>>>,
{
    let mut statuses = Vec::with_capacity(ids.len());
    for batch in ids.chunks(batch_size.max(1)) {
        match fetch_batch(batch.to_vec()).await {
            Ok(entries) => statuses.extend(statuses_in_order(batch, &entries)),
            Err(e) => {
                log::warn!("Status batch of {} failed: {}", batch.len(), e);
                statuses.extend(std::iter::repeat_n(None, batch.len()));
            }
        }
    }
    statuses
}

pub async fn fetch_activities(
    config: &Config,
    access_token: &str,
    filter: &ActivitiesFilter,
    max_activities: usize,
) -> Result<Vec<Activity>> {
    require_token(config, access_token)?;

    let request = RewardsApi::new(config).list_activities(access_token)?;
    let body = http::send(config, &request).await?.unwrap_or_else(|| "[]".to_string());
    let activities = parse_activities(&body)?;
    let total = activities.len();

    let cap = max_activities.min(config.max_activities);
    let selected = select_activities(activities, filter, now(), cap);
    log::info!("{} of {} activities available", selected.len(), total);
    Ok(selected)
}

pub async fn fetch_statuses(
    config: &Config,
    fed_id: &str,
    access_token: &str,
    activity_ids: &[Uuid],
) -> Result<Vec<Option<bool>>> {
    require_token(config, access_token)?;

    let api = RewardsApi::new(config);
    let statuses = collect_batches(activity_ids, config.status_batch_size, |batch| {
        let request = api.activity_statuses(fed_id, access_token, &batch);
        async move {
            let body = http::send(config, &request?).await?.unwrap_or_else(|| "[]".to_string());
            parse_statuses(&body)
        }
    })
    .await;
    Ok(statuses)
}

/// Claim the reward for one activity; `None` when the site answers with no body
pub async fn claim_rewards(
    config: &Config,
    user: &User,
    activity: &Activity,
) -> Result<Option<RewardsResponse>> {
    require_token(config, &user.access_token)?;

    let request = RewardsApi::new(config).claim_reward(&user.fed_id, &user.access_token, activity)?;
    let Some(body) = http::send(config, &request).await? else {
        log::warn!("Empty rewards response for {}", activity.identifier);
        return Ok(None);
    };

    let response = parse_rewards_response(&body)?;
    check_claim(activity, &response)?;
    log::info!(
        "Claimed {} ({} points, {} left today)",
        activity.name,
        response.points_earned,
        response.user_daily_points_left
    );
    Ok(Some(response))
}

/// The site must confirm the activity we asked for
pub fn check_claim(activity: &Activity, response: &RewardsResponse) -> Result<()> {
    if response.activity_completed != activity.identifier {
        return Err(RewardsError::Schema(format!(
            "claimed {} but the response is for {}",
            activity.identifier, response.activity_completed
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::activity_json;
    use std::cell::RefCell;
    use std::future::Future;
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    /// Drive a future that never actually waits
    fn block_on<F: Future>(future: F) -> F::Output {
        let mut future = pin!(future);
        let mut cx = Context::from_waker(Waker::noop());
        loop {
            if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
                return output;
            }
        }
    }

    fn ids(n: u128) -> Vec<Uuid> {
        (1..=n).map(Uuid::from_u128).collect()
    }

    fn entry(id: Uuid, completed: bool) -> StatusEntry {
        StatusEntry {
            activity_id: id,
            completed,
        }
    }

    #[test]
    fn test_statuses_in_order() {
        let requested = ids(3);
        // Server answers out of order and omits one id
        let entries = vec![entry(requested[2], true), entry(requested[0], false)];

        assert_eq!(statuses_in_order(&requested, &entries), vec![Some(false), None, Some(true)]);
    }

    #[test]
    fn test_collect_batches_splits_by_batch_size() {
        let all = ids(23);
        let seen = RefCell::new(Vec::new());

        let statuses = block_on(collect_batches(&all, 10, |batch| {
            seen.borrow_mut().push(batch.len());
            let entries: Vec<StatusEntry> = batch.iter().map(|id| entry(*id, true)).collect();
            async move { Ok(entries) }
        }));

        assert_eq!(*seen.borrow(), vec![10, 10, 3]);
        assert_eq!(statuses.len(), 23);
        assert!(statuses.iter().all(|s| *s == Some(true)));
    }

    #[test]
    fn test_collect_batches_continues_after_failed_batch() {
        let all = ids(25);
        let calls = RefCell::new(0);

        let statuses = block_on(collect_batches(&all, 10, |batch| {
            *calls.borrow_mut() += 1;
            let call = *calls.borrow();
            async move {
                if call == 2 {
                    Err(RewardsError::Http {
                        status: 500,
                        url: "status".to_string(),
                    })
                } else {
                    Ok(batch.iter().map(|id| entry(*id, false)).collect())
                }
            }
        }));

        assert_eq!(*calls.borrow(), 3);
        assert_eq!(statuses.len(), 25);
        assert!(statuses[..10].iter().all(|s| *s == Some(false)));
        assert!(statuses[10..20].iter().all(|s| s.is_none()));
        assert!(statuses[20..].iter().all(|s| *s == Some(false)));
    }

    #[test]
    fn test_collect_batches_empty() {
        let statuses = block_on(collect_batches(&[], 10, |_| async { Ok(Vec::new()) }));
        assert!(statuses.is_empty());
    }

    #[test]
    fn test_check_claim() {
        let activity: Activity =
            serde_json::from_value(activity_json("00000000-0000-4000-8000-00000000000a")).unwrap();
        let mut response = RewardsResponse {
            activity_completed: activity.identifier,
            points_earned: 50.0,
            user_daily_points_left: 4950.0,
            awarded: true,
            success: true,
        };
        assert!(check_claim(&activity, &response).is_ok());

        response.activity_completed = Uuid::from_u128(99);
        assert!(matches!(check_claim(&activity, &response), Err(RewardsError::Schema(_))));
    }

    #[test]
    fn test_missing_token_is_not_logged_in() {
        let config = Config::default();
        match require_token(&config, "") {
            Err(RewardsError::NotLoggedIn { login_url }) => assert_eq!(login_url, config.login_url),
            other => panic!("expected NotLoggedIn, got {:?}", other),
        }
        assert!(require_token(&config, "tok").is_ok());
    }
}
