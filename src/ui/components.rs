/// Reusable side panel components
use patternfly_yew::prelude::*;
use yew::prelude::*;

use crate::model::{Activity, ActivityStatus, User};

/// Text shown next to an activity's name
pub fn status_label(status: ActivityStatus, points: f64) -> String {
    match status {
        ActivityStatus::Complete => "Completed".to_string(),
        ActivityStatus::Incomplete => format!("{} points", points),
        ActivityStatus::Unknown => "Status unknown".to_string(),
    }
}

/// Balance figures are optional; the site does not always expose them
pub fn format_points(points: Option<f64>) -> String {
    points
        .map(|p| format!("{}", p))
        .unwrap_or_else(|| "unknown".to_string())
}

#[derive(Properties, PartialEq)]
pub struct ActivityCardProps {
    pub activity: Activity,
    pub status: ActivityStatus,
    #[prop_or(false)]
    pub busy: bool,
    pub on_earn: Callback<Activity>,
}

#[function_component(ActivityCard)]
pub fn activity_card(props: &ActivityCardProps) -> Html {
    let on_click = {
        let on_earn = props.on_earn.clone();
        let activity = props.activity.clone();
        Callback::from(move |_: MouseEvent| on_earn.emit(activity.clone()))
    };

    html! {
        <div class="activity-card">
            <div class="activity-header">
                <h4 class="activity-name">{&props.activity.name}</h4>
                <span class="activity-status">{status_label(props.status, props.activity.points())}</span>
            </div>
            if let Some(description) = &props.activity.description {
                <p class="activity-description">{description}</p>
            }
            if props.status == ActivityStatus::Incomplete {
                <Button onclick={on_click} disabled={props.busy} variant={ButtonVariant::Primary}>
                    {"Get rewards"}
                </Button>
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct LoginPromptProps {
    pub message: AttrValue,
    pub on_login: Callback<MouseEvent>,
}

#[function_component(LoginPrompt)]
pub fn login_prompt(props: &LoginPromptProps) -> Html {
    html! {
        <div class="login-prompt">
            <h2 class="login-message">{props.message.clone()}</h2>
            <Button onclick={props.on_login.clone()} variant={ButtonVariant::Primary}>
                {"Log in"}
            </Button>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct UserSummaryProps {
    pub user: User,
}

#[function_component(UserSummary)]
pub fn user_summary(props: &UserSummaryProps) -> Html {
    html! {
        <div class="user-summary">
            <h2>{format!("Hello {}!", props.user.username)}</h2>
            <h3>{format!("Rewards balance: {}", format_points(props.user.rewards_balance))}</h3>
            <h3>{format!("Daily points left: {}", format_points(props.user.daily_points_left))}</h3>
        </div>
    }
}
