/// Debounced "the user may have changed" notifications
use std::cell::RefCell;
use std::rc::Rc;

use serde::Deserialize;
use wasm_bindgen::prelude::*;

use crate::chrome;
use crate::config::Config;

/// Something that can run a task after a delay and cancel it again
pub trait Timer {
    type Handle;

    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Self::Handle;
    fn cancel(&self, handle: Self::Handle);
}

/// `setTimeout` / `clearTimeout`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsTimer;

impl Timer for JsTimer {
    type Handle = JsValue;

    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> JsValue {
        let callback = Closure::once_into_js(task);
        chrome::set_timeout(callback.unchecked_ref(), delay_ms.min(i32::MAX as u32) as i32)
    }

    fn cancel(&self, handle: JsValue) {
        chrome::clear_timeout(&handle);
    }
}

/// Runs only the last task triggered within the delay window
pub struct Debouncer<T: Timer> {
    timer: T,
    delay_ms: u32,
    pending: Rc<RefCell<Option<T::Handle>>>,
}

impl<T: Timer> Debouncer<T> {
    pub fn new(timer: T, delay_ms: u32) -> Self {
        Debouncer {
            timer,
            delay_ms,
            pending: Rc::new(RefCell::new(None)),
        }
    }

    pub fn trigger(&self, task: impl FnOnce() + 'static)
    where
        T::Handle: 'static,
    {
        if let Some(previous) = self.pending.borrow_mut().take() {
            self.timer.cancel(previous);
        }

        let pending = self.pending.clone();
        let handle = self.timer.schedule(
            self.delay_ms,
            Box::new(move || {
                pending.borrow_mut().take();
                task();
            }),
        );
        *self.pending.borrow_mut() = Some(handle);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub domain: String,
}

/// Argument of `chrome.cookies.onChanged`
#[derive(Debug, Clone, Deserialize)]
pub struct CookieChange {
    pub removed: bool,
    pub cookie: Cookie,
}

/// Only the identity cookies on the site's domain say anything about the user
pub fn is_user_cookie_change(change: &CookieChange, config: &Config) -> bool {
    let Some(site) = config.cookie_domain() else {
        return false;
    };
    let domain = change.cookie.domain.trim_start_matches('.').to_lowercase();
    let on_site = domain == site || domain.ends_with(&format!(".{}", site));
    on_site && config.user_cookie_names().contains(&change.cookie.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Timer that holds scheduled tasks until the test fires them
    #[derive(Default, Clone)]
    struct ManualTimer {
        next_id: Rc<Cell<u32>>,
        tasks: Rc<RefCell<Vec<(u32, Box<dyn FnOnce()>)>>>,
        delays: Rc<RefCell<Vec<u32>>>,
    }

    impl ManualTimer {
        fn fire_all(&self) {
            let tasks: Vec<_> = self.tasks.borrow_mut().drain(..).collect();
            for (_, task) in tasks {
                task();
            }
        }

        fn scheduled(&self) -> usize {
            self.tasks.borrow().len()
        }
    }

    impl Timer for ManualTimer {
        type Handle = u32;

        fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> u32 {
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            self.delays.borrow_mut().push(delay_ms);
            self.tasks.borrow_mut().push((id, task));
            id
        }

        fn cancel(&self, handle: u32) {
            self.tasks.borrow_mut().retain(|(id, _)| *id != handle);
        }
    }

    #[test]
    fn test_debouncer_runs_only_last_task() {
        let timer = ManualTimer::default();
        let debouncer = Debouncer::new(timer.clone(), 500);
        let runs = Rc::new(RefCell::new(Vec::new()));

        for n in 0..3 {
            let runs = runs.clone();
            debouncer.trigger(move || runs.borrow_mut().push(n));
        }

        assert_eq!(timer.scheduled(), 1);
        assert!(debouncer.is_pending());

        timer.fire_all();

        assert_eq!(*runs.borrow(), vec![2]);
        assert!(!debouncer.is_pending());
        assert!(timer.delays.borrow().iter().all(|d| *d == 500));
    }

    #[test]
    fn test_debouncer_runs_again_after_firing() {
        let timer = ManualTimer::default();
        let debouncer = Debouncer::new(timer.clone(), 500);
        let runs = Rc::new(Cell::new(0));

        let counter = runs.clone();
        debouncer.trigger(move || counter.set(counter.get() + 1));
        timer.fire_all();

        let counter = runs.clone();
        debouncer.trigger(move || counter.set(counter.get() + 1));
        timer.fire_all();

        assert_eq!(runs.get(), 2);
    }

    fn change(name: &str, domain: &str) -> CookieChange {
        serde_json::from_value(serde_json::json!({
            "removed": false,
            "cause": "explicit",
            "cookie": {"name": name, "domain": domain, "value": "x", "path": "/"}
        }))
        .unwrap()
    }

    #[test]
    fn test_is_user_cookie_change() {
        let config = Config::default();

        assert!(is_user_cookie_change(&change("game", ".aarp.org"), &config));
        assert!(is_user_cookie_change(&change("fedid", "secure.aarp.org"), &config));
        assert!(!is_user_cookie_change(&change("_ga", ".aarp.org"), &config));
        assert!(!is_user_cookie_change(&change("fedid", ".example.com"), &config));
        assert!(!is_user_cookie_change(&change("game", "notaarp.org"), &config));
    }

    #[test]
    fn test_is_user_cookie_change_follows_config() {
        let config = Config {
            cookie_url: "https://accounts.example.test".to_string(),
            username_cookie: "user".to_string(),
            ..Config::default()
        };

        assert!(is_user_cookie_change(&change("user", ".example.test"), &config));
        assert!(is_user_cookie_change(&change("fedid", "accounts.example.test"), &config));
        assert!(!is_user_cookie_change(&change("game", ".example.test"), &config));
        assert!(!is_user_cookie_change(&change("user", ".aarp.org"), &config));
    }
}
