// src/browser/chrome.rs

//! Chrome DevTools backend.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;

use crate::browser::RenderBackend;
use crate::error::{AppError, Result};
use crate::models::{BrowserConfig, HttpConfig};

/// One browser process with a single tab.
///
/// Dropping the session drops the [`Browser`], which kills the process.
pub struct ChromeSession {
    browser: Option<Browser>,
    tab: Arc<Tab>,
}

impl ChromeSession {
    /// Launch `executable` and open a tab configured like our HTTP client.
    pub fn launch(browser: &BrowserConfig, http: &HttpConfig, executable: &Path) -> Result<Self> {
        let timeout = Duration::from_secs(browser.timeout_secs);

        let options = LaunchOptions::default_builder()
            .headless(browser.headless)
            .sandbox(false)
            .path(Some(executable.to_path_buf()))
            .idle_browser_timeout(timeout)
            .build()
            .map_err(AppError::browser)?;

        let instance = Browser::new(options).map_err(AppError::browser)?;
        let tab = instance.new_tab().map_err(AppError::browser)?;
        tab.set_default_timeout(timeout);
        tab.set_user_agent(&http.user_agent, Some(&http.accept_language), None)
            .map_err(AppError::browser)?;

        Ok(Self {
            browser: Some(instance),
            tab,
        })
    }
}

impl RenderBackend for ChromeSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| AppError::browser(format!("navigation to {url} failed: {e}")))?;
        Ok(())
    }

    fn evaluate(&mut self, script: &str) -> Result<String> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(AppError::browser)?;
        Ok(match result.value {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        })
    }

    fn content(&mut self) -> Result<String> {
        self.tab.get_content().map_err(AppError::browser)
    }

    fn limit(&mut self, remaining: Duration) {
        self.tab
            .set_default_timeout(remaining.max(Duration::from_millis(100)));
    }

    fn close(&mut self) -> Result<()> {
        let Some(browser) = self.browser.take() else {
            return Ok(());
        };
        let closed = self.tab.close(true).map(|_| ()).map_err(AppError::browser);
        drop(browser);
        closed
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::debug!("Browser tab close failed: {e}");
        }
    }
}
