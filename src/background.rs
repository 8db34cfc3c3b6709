/// Background service worker: message handlers and the user-change notifier
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::activities::{claim_rewards, fetch_activities, fetch_statuses};
use crate::chrome::{self, Port, Subscription};
use crate::config::Config;
use crate::credentials::read_user;
use crate::error::Result;
use crate::messaging::{EarnRequest, Request, from_js, on_runtime_message, reply_value, to_js};
use crate::model::{RewardsResponse, UserUpdate};
use crate::notifier::{CookieChange, Debouncer, JsTimer, is_user_cookie_change};
use crate::tab_data::TabUpdate;
use crate::tabs::update_site_tab;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PanelBehavior {
    open_panel_on_action_click: bool,
}

/// Values keyed by a connection id handed out on insert
pub struct Connections<P> {
    next_id: u32,
    entries: Vec<(u32, P)>,
}

impl<P> Default for Connections<P> {
    fn default() -> Self {
        Connections {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<P> Connections<P> {
    /// Store the value built from its new id and return that id
    pub fn insert_with(&mut self, make: impl FnOnce(u32) -> P) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push((id, make(id)));
        id
    }

    pub fn remove(&mut self, id: u32) -> Option<P> {
        let pos = self.entries.iter().position(|(entry_id, _)| *entry_id == id)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &P> {
        self.entries.iter().map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A connected side panel; dropping it unsubscribes from its disconnect event
struct PanelPort {
    port: Port,
    _on_disconnect: Subscription<dyn FnMut(JsValue)>,
}

pub struct Background {
    config: Config,
    ports: RefCell<Connections<PanelPort>>,
    debouncer: Debouncer<JsTimer>,
    /// Reported by the last successful claim; the site offers no other source
    daily_points_left: Cell<Option<f64>>,
}

impl Background {
    pub fn new(config: Config) -> Rc<Self> {
        let debouncer = Debouncer::new(JsTimer, config.debounce_ms);
        Rc::new(Background {
            config,
            ports: RefCell::new(Connections::default()),
            debouncer,
            daily_points_left: Cell::new(None),
        })
    }

    async fn handle(self: Rc<Self>, request: Request) -> Result<serde_json::Value> {
        let config = &self.config;
        match request {
            Request::GetUser => reply_value(read_user(config, self.daily_points_left.get()).await?),
            Request::GetActivities(query) => {
                let activities = fetch_activities(
                    config,
                    &query.access_token,
                    &query.filter,
                    query.max_activities,
                )
                .await?;
                reply_value(activities)
            }
            Request::GetActivityStatuses(query) => {
                let statuses = fetch_statuses(
                    config,
                    &query.user_fed_id,
                    &query.access_token,
                    &query.activity_ids,
                )
                .await?;
                reply_value(statuses)
            }
            Request::EarnActivityRewards(earn) => reply_value(self.earn(earn).await?),
            Request::UpdateSiteTab(update) => reply_value(update_site_tab(config, &update).await?),
            Request::OpenLoginPage => {
                reply_value(update_site_tab(config, &login_tab_update(config)).await?)
            }
            Request::PossibleUserChange => {
                self.schedule_user_update();
                reply_value(())
            }
        }
    }

    async fn earn(self: &Rc<Self>, earn: EarnRequest) -> Result<Option<RewardsResponse>> {
        let response = claim_rewards(&self.config, &earn.user, &earn.activity).await?;

        if let Some(response) = &response {
            self.daily_points_left.set(Some(response.user_daily_points_left));
        }

        // Visiting the page is what makes the site count the activity as done
        if earn.open_activity_url && !earn.activity.url.is_empty() {
            update_site_tab(&self.config, &TabUpdate::navigate(earn.activity.url.clone())).await?;
        }

        self.schedule_user_update();
        Ok(response)
    }

    /// Re-read the user after the debounce delay and push it to every panel
    fn schedule_user_update(self: &Rc<Self>) {
        let this = self.clone();
        self.debouncer.trigger(move || {
            spawn_local(async move {
                match read_user(&this.config, this.daily_points_left.get()).await {
                    Ok(user) => this.broadcast(&UserUpdate { user }),
                    Err(e) => log::warn!("Failed to refresh user: {}", e),
                }
            });
        });
    }

    fn broadcast(&self, update: &UserUpdate) {
        let message = match to_js(update) {
            Ok(message) => message,
            Err(e) => {
                log::error!("Failed to serialize user update: {}", e);
                return;
            }
        };
        let ports = self.ports.borrow();
        log::debug!("Pushing user update to {} panel(s)", ports.len());
        for panel in ports.iter() {
            panel.port.post_message(&message);
        }
    }

    fn add_port(self: &Rc<Self>, port: Port) {
        let this = Rc::downgrade(self);
        self.ports.borrow_mut().insert_with(|id| {
            let on_disconnect = Closure::<dyn FnMut(JsValue)>::new(move |_port: JsValue| {
                let Some(this) = this.upgrade() else {
                    return;
                };
                // The listener being run is owned by the entry; drop it after this call returns
                spawn_local(async move {
                    let removed = this.ports.borrow_mut().remove(id);
                    if removed.is_some() {
                        log::debug!("Side panel {} disconnected", id);
                    }
                });
            });
            PanelPort {
                _on_disconnect: Subscription::new(port.on_disconnect(), on_disconnect),
                port,
            }
        });
    }
}

fn login_tab_update(config: &Config) -> TabUpdate {
    TabUpdate::navigate(config.login_url.clone()).activate()
}

async fn open_panel_on_action_click() -> Result<()> {
    let behavior = to_js(&PanelBehavior {
        open_panel_on_action_click: true,
    })?;
    chrome::side_panel_set_behavior(&behavior).await?;
    Ok(())
}

fn listen_for_panels(background: &Rc<Background>) -> Result<()> {
    let background = background.clone();
    let listener = Closure::<dyn FnMut(Port)>::new(move |port: Port| {
        if port.name() != background.config.sidepanel_port {
            return;
        }
        log::debug!("Side panel connected");
        background.add_port(port);
    });
    Subscription::new(chrome::event(&["chrome", "runtime", "onConnect"])?, listener).forget();
    Ok(())
}

fn listen_for_cookies(background: &Rc<Background>) -> Result<()> {
    let background = background.clone();
    let listener = Closure::<dyn FnMut(JsValue)>::new(move |change: JsValue| {
        match from_js::<CookieChange>(change) {
            Ok(change) if is_user_cookie_change(&change, &background.config) => {
                log::debug!(
                    "Cookie {} {}",
                    change.cookie.name,
                    if change.removed { "removed" } else { "set" }
                );
                background.schedule_user_update();
            }
            Ok(_) => {}
            Err(e) => log::warn!("Unreadable cookie change: {}", e),
        }
    });
    Subscription::new(chrome::event(&["chrome", "cookies", "onChanged"])?, listener).forget();
    Ok(())
}

pub fn install(config: Config) -> Result<()> {
    let background = Background::new(config);

    spawn_local(async {
        if let Err(e) = open_panel_on_action_click().await {
            log::error!("Failed to set side panel behavior: {}", e);
        }
    });

    let handler = background.clone();
    on_runtime_message(move |request| handler.clone().handle(request))?;
    listen_for_panels(&background)?;
    listen_for_cookies(&background)?;

    log::info!("AARP rewards background worker started");
    Ok(())
}
