/// Side panel UI: shows the signed-in user and lets them claim activity rewards
use std::collections::HashMap;
use std::rc::Rc;

use uuid::Uuid;

use patternfly_yew::prelude::*;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::chrome::{self, Port, Subscription};
use crate::config::SIDEPANEL_PORT;
use crate::error::{Result, RewardsError};
use crate::filter::{ActivitiesFilter, apply_activities_filter};
use crate::messaging::{
    ActivitiesQuery, EarnRequest, Request, StatusQuery, from_js, send_message, to_js,
};
use crate::model::{Activity, ActivityStatus, RewardsResponse, User, UserUpdate};
use crate::options::{DARK_MODE, MAX_ACTIVITIES, OPEN_ACTIVITY_URL};
use crate::ui::components::{ActivityCard, LoginPrompt, UserSummary};

const ACTIVITIES_CHUNK_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq)]
enum Session {
    Loading,
    NotLoggedIn,
    MustConfirmPassword(User),
    LoggedIn(User),
}

impl Session {
    fn from_user(user: Option<User>) -> Self {
        match user {
            None => Session::NotLoggedIn,
            Some(user) if user.must_confirm_password => Session::MustConfirmPassword(user),
            Some(user) => Session::LoggedIn(user),
        }
    }

    fn user(&self) -> Option<&User> {
        match self {
            Session::LoggedIn(user) => Some(user),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ConnectInfo {
    name: &'static str,
}

type PortListener = Subscription<dyn FnMut(JsValue)>;

/// Open the port the background uses to push user updates
fn connect_panel(session: UseStateHandle<Session>) -> Result<(Port, PortListener)> {
    let port = chrome::runtime_connect(&to_js(&ConnectInfo { name: SIDEPANEL_PORT })?)?;
    let listener = Closure::<dyn FnMut(JsValue)>::new(move |message: JsValue| {
        match from_js::<UserUpdate>(message) {
            Ok(update) => session.set(Session::from_user(update.user)),
            Err(e) => log::warn!("Ignoring unreadable panel message: {}", e),
        }
    });
    let subscription = Subscription::new(port.on_message(), listener);
    Ok((port, subscription))
}

fn system_prefers_dark() -> bool {
    web_sys::window()
        .and_then(|w| w.match_media("(prefers-color-scheme: dark)").ok().flatten())
        .is_some_and(|query| query.matches())
}

fn phrase_filter(phrase: &str) -> ActivitiesFilter {
    let phrase = phrase.trim();
    ActivitiesFilter {
        phrases: if phrase.is_empty() {
            Vec::new()
        } else {
            vec![phrase.to_string()]
        },
        ..ActivitiesFilter::default()
    }
}

/// Shown activities whose status is worth asking for again
fn stale_ids(shown: &[Uuid], statuses: &HashMap<Uuid, ActivityStatus>) -> Vec<Uuid> {
    shown
        .iter()
        .copied()
        .filter(|id| statuses.get(id) != Some(&ActivityStatus::Complete))
        .collect()
}

fn merge_statuses(
    mut statuses: HashMap<Uuid, ActivityStatus>,
    ids: &[Uuid],
    results: Result<Vec<Option<bool>>>,
) -> HashMap<Uuid, ActivityStatus> {
    match results {
        Ok(results) => {
            for (id, completed) in ids.iter().zip(results) {
                statuses.insert(*id, ActivityStatus::from(completed));
            }
        }
        Err(e) => {
            log::error!("Failed to fetch activity statuses: {}", e);
            statuses.clear();
        }
    }
    statuses
}

fn error_message(err: &RewardsError) -> String {
    match err {
        RewardsError::NotLoggedIn { .. } => {
            "Your AARP session has expired. Please log in again.".to_string()
        }
        other => other.to_string(),
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let session = use_state_eq(|| Session::Loading);
    let activities = use_state(|| Rc::new(Vec::<Activity>::new()));
    let activities_loading = use_state(|| false);
    let phrase = use_state(String::new);
    let statuses = use_state(HashMap::<Uuid, ActivityStatus>::new);
    // Identity of the list the latest status request was made for
    let status_list = use_mut_ref(|| 0usize);
    let shown = use_state(|| ACTIVITIES_CHUNK_SIZE);
    let refresh = use_state(|| 0u32);
    let busy = use_state(|| false);
    let error = use_state(|| None::<String>);
    let dark_mode = use_state(system_prefers_dark);
    let open_activity_url = use_state(|| OPEN_ACTIVITY_URL.default_value());

    // Initial user plus live updates from the background
    {
        let session = session.clone();
        let error = error.clone();
        use_effect_with((), move |_| {
            {
                let session = session.clone();
                spawn_local(async move {
                    match send_message::<Option<User>>(&Request::GetUser).await {
                        Ok(user) => session.set(Session::from_user(user)),
                        Err(e) => {
                            log::error!("Failed to read user: {}", e);
                            error.set(Some(error_message(&e)));
                            session.set(Session::NotLoggedIn);
                        }
                    }
                });
            }

            let connection = connect_panel(session)
                .map_err(|e| log::error!("Failed to connect to background: {}", e))
                .ok();
            move || {
                if let Some((port, listener)) = connection {
                    drop(listener);
                    port.disconnect();
                }
            }
        });
    }

    // Stored options
    {
        let dark_mode = dark_mode.clone();
        let open_activity_url = open_activity_url.clone();
        use_effect_with((), move |_| {
            {
                let dark_mode = dark_mode.clone();
                spawn_local(async move {
                    match DARK_MODE.get().await {
                        Ok(Some(dark)) => dark_mode.set(dark),
                        Ok(None) => {}
                        Err(e) => log::warn!("Failed to read dark mode: {}", e),
                    }
                    match OPEN_ACTIVITY_URL.get().await {
                        Ok(open) => open_activity_url.set(open),
                        Err(e) => log::warn!("Failed to read open activity option: {}", e),
                    }
                });
            }

            let listener = DARK_MODE
                .on_update(move |dark| dark_mode.set(dark.unwrap_or_else(system_prefers_dark)))
                .map_err(|e| log::warn!("Cannot watch dark mode: {}", e))
                .ok();
            move || drop(listener)
        });
    }

    // Activities for the signed-in user
    {
        let activities = activities.clone();
        let activities_loading = activities_loading.clone();
        let statuses = statuses.clone();
        let shown = shown.clone();
        let token = session.user().map(|user| user.access_token.clone());
        use_effect_with(token, move |token| {
            statuses.set(HashMap::new());
            shown.set(ACTIVITIES_CHUNK_SIZE);
            match token.clone() {
                Some(access_token) => {
                    activities_loading.set(true);
                    spawn_local(async move {
                        let max_activities = MAX_ACTIVITIES
                            .get()
                            .await
                            .unwrap_or_else(|_| MAX_ACTIVITIES.default_value());
                        let query = ActivitiesQuery {
                            max_activities,
                            access_token,
                            filter: ActivitiesFilter::default(),
                        };
                        let list = send_message::<Vec<Activity>>(&Request::GetActivities(query))
                            .await
                            .unwrap_or_else(|e| {
                                log::error!("Failed to fetch activities: {}", e);
                                Vec::new()
                            });
                        log::debug!("Loaded {} activities", list.len());
                        activities.set(Rc::new(list));
                        activities_loading.set(false);
                    });
                }
                None => activities.set(Rc::new(Vec::new())),
            }
            || ()
        });
    }

    let filtered = apply_activities_filter(&activities, &phrase_filter(&phrase));
    let shown_indices: Vec<usize> = filtered.iter().take(*shown).copied().collect();
    let shown_ids: Vec<Uuid> = shown_indices
        .iter()
        .filter_map(|idx| activities.get(*idx).map(|a| a.identifier))
        .collect();

    // Statuses of what is on screen
    {
        let statuses = statuses.clone();
        let status_list = status_list.clone();
        let user = session.user().cloned();
        let list_id = Rc::as_ptr(&*activities) as usize;
        use_effect_with((list_id, shown_ids, *refresh), move |(list_id, ids, _)| {
            let list_id = *list_id;
            *status_list.borrow_mut() = list_id;
            let pending = stale_ids(ids, &statuses);
            if let (Some(user), false) = (user, pending.is_empty()) {
                let query = StatusQuery {
                    activity_ids: pending.clone(),
                    user_fed_id: user.fed_id,
                    access_token: user.access_token,
                };
                let current = (*statuses).clone();
                spawn_local(async move {
                    let request = Request::GetActivityStatuses(query);
                    let results = send_message::<Vec<Option<bool>>>(&request).await;
                    if *status_list.borrow() != list_id {
                        log::debug!("Dropping statuses for a replaced activity list");
                        return;
                    }
                    statuses.set(merge_statuses(current, &pending, results));
                });
            }
            || ()
        });
    }

    let on_login = Callback::from(|_: MouseEvent| {
        spawn_local(async {
            if let Err(e) = send_message::<i32>(&Request::OpenLoginPage).await {
                log::error!("Failed to open login page: {}", e);
            }
        });
    });

    let on_earn = {
        let session = session.clone();
        let busy = busy.clone();
        let error = error.clone();
        let refresh = refresh.clone();
        let open_activity_url = open_activity_url.clone();
        Callback::from(move |activity: Activity| {
            let Some(user) = session.user().cloned() else {
                return;
            };
            let busy = busy.clone();
            let error = error.clone();
            let refresh = refresh.clone();
            let request = Request::EarnActivityRewards(EarnRequest {
                activity,
                user,
                open_activity_url: *open_activity_url,
            });
            busy.set(true);
            spawn_local(async move {
                match send_message::<Option<RewardsResponse>>(&request).await {
                    Ok(Some(response)) => {
                        log::info!("Earned {} points", response.points_earned);
                        error.set(None);
                    }
                    Ok(None) => log::warn!("Reward claim returned no body"),
                    Err(e) => error.set(Some(error_message(&e))),
                }
                busy.set(false);
                refresh.set(*refresh + 1);
            });
        })
    };

    let on_refresh = {
        let refresh = refresh.clone();
        Callback::from(move |_: MouseEvent| refresh.set(*refresh + 1))
    };

    let on_show_more = {
        let shown = shown.clone();
        Callback::from(move |_: MouseEvent| shown.set(*shown + ACTIVITIES_CHUNK_SIZE))
    };

    let on_show_less = {
        let shown = shown.clone();
        Callback::from(move |_: MouseEvent| {
            shown.set(shown.saturating_sub(ACTIVITIES_CHUNK_SIZE).max(ACTIVITIES_CHUNK_SIZE))
        })
    };

    let on_phrase = {
        let phrase = phrase.clone();
        let shown = shown.clone();
        Callback::from(move |e: InputEvent| {
            phrase.set(e.target_unchecked_into::<HtmlInputElement>().value());
            shown.set(ACTIVITIES_CHUNK_SIZE);
        })
    };

    let on_toggle_dark = {
        let dark_mode = dark_mode.clone();
        Callback::from(move |_: Event| {
            let dark = !*dark_mode;
            dark_mode.set(dark);
            spawn_local(async move {
                if let Err(e) = DARK_MODE.set(Some(Some(dark))).await {
                    log::error!("Failed to save dark mode: {}", e);
                }
            });
        })
    };

    let on_toggle_open = {
        let open_activity_url = open_activity_url.clone();
        Callback::from(move |_: Event| {
            let open = !*open_activity_url;
            open_activity_url.set(open);
            spawn_local(async move {
                if let Err(e) = OPEN_ACTIVITY_URL.set(Some(open)).await {
                    log::error!("Failed to save open activity option: {}", e);
                }
            });
        })
    };

    let content = match &*session {
        Session::Loading => html! {
            <div class="loading-text-center">
                <Spinner />
            </div>
        },
        Session::NotLoggedIn => html! {
            <LoginPrompt message="You are not logged into AARP." on_login={on_login.clone()} />
        },
        Session::MustConfirmPassword(user) => html! {
            <LoginPrompt
                message={format!("You are logged in as {}, but need to confirm your password.", user.username)}
                on_login={on_login.clone()}
            />
        },
        Session::LoggedIn(user) => html! {
            <>
                <UserSummary user={user.clone()} />
                <div class="activities-toolbar">
                    <input
                        class="pf-v5-c-form-control"
                        type="search"
                        placeholder="Filter activities"
                        value={(*phrase).clone()}
                        oninput={on_phrase}
                    />
                    <Button onclick={on_refresh} disabled={*busy} variant={ButtonVariant::Secondary}>
                        {"Refresh"}
                    </Button>
                </div>
                if *activities_loading {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{"Loading activities..."}</p>
                    </div>
                } else if filtered.is_empty() {
                    <p class="message-text">{"No activities available."}</p>
                } else {
                    <div class="activities-list">
                        {for shown_indices.iter().filter_map(|idx| activities.get(*idx)).map(|activity| html! {
                            <ActivityCard
                                key={activity.identifier.to_string()}
                                activity={activity.clone()}
                                status={statuses.get(&activity.identifier).copied().unwrap_or(ActivityStatus::Unknown)}
                                busy={*busy}
                                on_earn={on_earn.clone()}
                            />
                        })}
                    </div>
                    <div class="flex-row-gap">
                        if *shown < filtered.len() {
                            <Button onclick={on_show_more} variant={ButtonVariant::Link}>{"Show more"}</Button>
                        }
                        if *shown > ACTIVITIES_CHUNK_SIZE {
                            <Button onclick={on_show_less} variant={ButtonVariant::Link}>{"Show less"}</Button>
                        }
                    </div>
                }
            </>
        },
    };

    html! {
        <div class={classes!("padding-20", (*dark_mode).then_some("dark-mode"))}>
            <h1 class="panel-title">{"AARP Rewards"}</h1>

            if let Some(message) = (*error).clone() {
                <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                    {message}
                </Alert>
            }

            {content}

            <div class="settings">
                <label>
                    <input type="checkbox" checked={*dark_mode} onchange={on_toggle_dark} />
                    {" Dark mode"}
                </label>
                <label>
                    <input type="checkbox" checked={*open_activity_url} onchange={on_toggle_open} />
                    {" Open activity page after claiming"}
                </label>
            </div>
        </div>
    }
}
