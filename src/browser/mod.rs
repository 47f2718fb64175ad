// src/browser/mod.rs

//! Headless rendering of client-side cinema pages.
//!
//! [`RenderBackend`] is the small surface the adapter needs from a browser.
//! [`render_with`] drives one page through navigation, consent dismissal and
//! the settle waits, and always closes the backend before returning. A plan
//! carries a deadline: waits are cut short and every step after it fails.

#[cfg(feature = "browser")]
mod chrome;
mod discover;

use std::thread;
use std::time::{Duration, Instant};

use crate::error::{AppError, Result};
use crate::models::{BrowserConfig, HttpConfig};

#[cfg(feature = "browser")]
pub use chrome::ChromeSession;
pub use discover::{find_executable, find_executable_in};

/// Browser capability used by the headless adapter.
pub trait RenderBackend {
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Run a script and return its string result.
    fn evaluate(&mut self, script: &str) -> Result<String>;

    /// Serialized DOM of the current page.
    fn content(&mut self) -> Result<String>;

    /// Release the browser. Must be safe to call more than once.
    fn close(&mut self) -> Result<()>;

    /// Cap how long the next call may block.
    fn limit(&mut self, _remaining: Duration) {}
}

/// Closes the wrapped backend when dropped.
pub struct SessionGuard<B: RenderBackend> {
    backend: B,
    closed: bool,
}

impl<B: RenderBackend> SessionGuard<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            closed: false,
        }
    }

    pub fn backend(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Close now and surface the error, instead of on drop.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.backend.close()
    }
}

impl<B: RenderBackend> Drop for SessionGuard<B> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.backend.close() {
                log::warn!("Failed to close browser session: {e}");
            }
        }
    }
}

/// What to render, how long to let it settle, and when to give up.
#[derive(Debug, Clone)]
pub struct RenderPlan {
    pub url: String,
    pub settle: Duration,
    pub follow_up: Duration,
    pub consent_selectors: Vec<String>,
    /// No browser call starts after this instant
    pub deadline: Instant,
}

impl RenderPlan {
    /// Plan whose deadline is the full render budget from now.
    pub fn new(url: impl Into<String>, config: &BrowserConfig) -> Self {
        let settle = Duration::from_secs(config.settle_secs);
        let follow_up = Duration::from_secs(config.follow_up_secs);
        Self {
            url: url.into(),
            settle,
            follow_up,
            consent_selectors: config.consent_selectors.clone(),
            deadline: Instant::now() + Duration::from_secs(config.timeout_secs) + settle + follow_up,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn check_deadline(&self) -> Result<()> {
        if self.remaining().is_zero() {
            return Err(AppError::browser(format!(
                "render of {} ran past its deadline",
                self.url
            )));
        }
        Ok(())
    }

    /// Sleep for `wait`, or until the deadline if that comes first.
    fn pause(&self, wait: Duration) -> Result<()> {
        thread::sleep(wait.min(self.remaining()));
        self.check_deadline()
    }
}

const SCROLL_SCRIPT: &str = "window.scrollBy(0, window.innerHeight); 'ok'";

/// Script that clicks the first visible consent button from `selectors`.
pub fn consent_script(selectors: &[String]) -> String {
    let list = serde_json::to_string(selectors).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"(function() {{
  const selectors = {list};
  for (const sel of selectors) {{
    let el = null;
    try {{ el = document.querySelector(sel); }} catch (e) {{ continue; }}
    if (el) {{ el.click(); return 'clicked:' + sel; }}
  }}
  return 'none';
}})()"#
    )
}

/// Render `plan.url` and return the settled document.
///
/// The backend is closed on every path out of this function, including a
/// missed `plan.deadline`.
pub fn render_with<B: RenderBackend>(backend: B, plan: &RenderPlan) -> Result<String> {
    let mut session = SessionGuard::new(backend);

    bounded(&mut session, plan)?.navigate(&plan.url)?;

    if !plan.consent_selectors.is_empty() {
        match bounded(&mut session, plan)?.evaluate(&consent_script(&plan.consent_selectors)) {
            Ok(outcome) => log::debug!("Consent banner: {outcome}"),
            Err(e) => log::debug!("Consent dismissal skipped: {e}"),
        }
    }

    scroll(bounded(&mut session, plan)?);
    plan.pause(plan.settle)?;
    scroll(bounded(&mut session, plan)?);
    plan.pause(plan.follow_up)?;

    let html = bounded(&mut session, plan)?.content()?;
    session.close()?;
    Ok(html)
}

/// The backend, capped to what is left before the deadline.
fn bounded<'a, B: RenderBackend>(
    session: &'a mut SessionGuard<B>,
    plan: &RenderPlan,
) -> Result<&'a mut B> {
    plan.check_deadline()?;
    let remaining = plan.remaining();
    let backend = session.backend();
    backend.limit(remaining);
    Ok(backend)
}

fn scroll<B: RenderBackend>(backend: &mut B) {
    if let Err(e) = backend.evaluate(SCROLL_SCRIPT) {
        log::debug!("Scroll failed: {e}");
    }
}

/// Launch a browser, render one page, and tear the browser down.
#[cfg(feature = "browser")]
pub fn render_page(browser: &BrowserConfig, http: &HttpConfig, url: &str) -> Result<String> {
    let plan = RenderPlan::new(url, browser);
    let executable = find_executable(browser)?;
    log::debug!("Using browser at {}", executable.display());

    let session = ChromeSession::launch(browser, http, &executable)?;
    render_with(session, &plan)
}

/// Launch a browser, render one page, and tear the browser down.
#[cfg(not(feature = "browser"))]
pub fn render_page(_browser: &BrowserConfig, _http: &HttpConfig, url: &str) -> Result<String> {
    Err(AppError::browser(format!(
        "cannot render {url}: built without the `browser` feature"
    )))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Default)]
    struct Log {
        calls: Vec<String>,
        closes: usize,
    }

    struct FakeBackend {
        log: Rc<RefCell<Log>>,
        fail_navigate: bool,
        fail_content: bool,
    }

    impl FakeBackend {
        fn new(log: &Rc<RefCell<Log>>) -> Self {
            Self {
                log: Rc::clone(log),
                fail_navigate: false,
                fail_content: false,
            }
        }
    }

    impl RenderBackend for FakeBackend {
        fn navigate(&mut self, url: &str) -> Result<()> {
            self.log.borrow_mut().calls.push(format!("navigate {url}"));
            if self.fail_navigate {
                return Err(AppError::browser("navigation timeout"));
            }
            Ok(())
        }

        fn evaluate(&mut self, script: &str) -> Result<String> {
            let kind = if script.contains("scrollBy") { "scroll" } else { "consent" };
            self.log.borrow_mut().calls.push(kind.to_string());
            if kind == "consent" {
                return Err(AppError::browser("no banner"));
            }
            Ok("ok".into())
        }

        fn content(&mut self) -> Result<String> {
            self.log.borrow_mut().calls.push("content".into());
            if self.fail_content {
                return Err(AppError::browser("target crashed"));
            }
            Ok("<html><body>rendered</body></html>".into())
        }

        fn close(&mut self) -> Result<()> {
            self.log.borrow_mut().closes += 1;
            Ok(())
        }
    }

    fn plan() -> RenderPlan {
        RenderPlan {
            url: "https://cine.example".into(),
            settle: Duration::ZERO,
            follow_up: Duration::ZERO,
            consent_selectors: vec!["#accept".into()],
            deadline: Instant::now() + Duration::from_secs(60),
        }
    }

    #[test]
    fn test_render_success_closes_once() {
        let log = Rc::new(RefCell::new(Log::default()));
        let html = render_with(FakeBackend::new(&log), &plan()).unwrap();

        assert!(html.contains("rendered"));
        let log = log.borrow();
        assert_eq!(log.closes, 1);
        assert_eq!(
            log.calls,
            vec!["navigate https://cine.example", "consent", "scroll", "scroll", "content"]
        );
    }

    #[test]
    fn test_navigation_failure_still_closes() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut backend = FakeBackend::new(&log);
        backend.fail_navigate = true;

        assert!(render_with(backend, &plan()).is_err());
        assert_eq!(log.borrow().closes, 1);
        assert_eq!(log.borrow().calls.len(), 1);
    }

    #[test]
    fn test_capture_failure_still_closes() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut backend = FakeBackend::new(&log);
        backend.fail_content = true;

        assert!(render_with(backend, &plan()).is_err());
        assert_eq!(log.borrow().closes, 1);
    }

    #[test]
    fn test_passed_deadline_stops_before_capture() {
        let log = Rc::new(RefCell::new(Log::default()));
        let plan = RenderPlan {
            settle: Duration::from_secs(60),
            deadline: Instant::now() + Duration::from_millis(50),
            ..plan()
        };

        let started = Instant::now();
        let err = render_with(FakeBackend::new(&log), &plan).unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(err.to_string().contains("deadline"));
        let log = log.borrow();
        assert_eq!(log.closes, 1);
        assert!(!log.calls.contains(&"content".to_string()));
    }

    #[test]
    fn test_plan_deadline_covers_the_budget() {
        let config = BrowserConfig {
            timeout_secs: 10,
            settle_secs: 5,
            follow_up_secs: 1,
            ..BrowserConfig::default()
        };
        let plan = RenderPlan::new("https://cine.example", &config);
        let remaining = plan.remaining();
        assert!(remaining > Duration::from_secs(15));
        assert!(remaining <= Duration::from_secs(16));
    }

    #[test]
    fn test_consent_script_lists_selectors() {
        let script = consent_script(&["#a".into(), r#"button[aria-label*="Aceptar"]"#.into()]);
        assert!(script.contains(r##"["#a","button[aria-label*=\"Aceptar\"]"]"##));
        assert!(script.contains("return 'none'"));
    }
}
