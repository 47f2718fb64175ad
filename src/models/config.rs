//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::CardSelectors;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Headless browser settings
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Yelmo Cines API source
    #[serde(default)]
    pub yelmo: YelmoConfig,

    /// Artesiete API source
    #[serde(default)]
    pub artesiete: ArtesieteConfig,

    /// Pages that need a headless browser to render
    #[serde(default = "defaults::headless_targets")]
    pub headless: Vec<HeadlessTarget>,

    /// Extra server-rendered pages scraped with plain HTTP
    #[serde(default)]
    pub html: Vec<HtmlSourceConfig>,

    /// Static calendar output
    #[serde(default)]
    pub calendar: CalendarConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.browser.timeout_secs == 0 {
            return Err(AppError::validation("browser.timeout_secs must be > 0"));
        }
        if self.yelmo.cinemas.is_empty() {
            return Err(AppError::validation("yelmo.cinemas is empty"));
        }
        url::Url::parse(&self.yelmo.endpoint)?;
        url::Url::parse(&self.artesiete.base_url)?;

        for target in &self.headless {
            if target.key.trim().is_empty() {
                return Err(AppError::validation("headless target with empty key"));
            }
            url::Url::parse(&target.url)?;
            target.selectors.compile()?;
        }
        for (i, key) in self.headless.iter().map(|t| &t.key).enumerate() {
            if self.headless[..i].iter().any(|t| &t.key == key) {
                return Err(AppError::validation(format!(
                    "duplicate headless target key '{key}'"
                )));
            }
        }
        for source in &self.html {
            url::Url::parse(&source.url)?;
            source.selectors.compile()?;
        }
        Ok(())
    }

    /// Look up a headless target by key.
    pub fn headless_target(&self, key: &str) -> Option<&HeadlessTarget> {
        self.headless.iter().find(|t| t.key == key)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            browser: BrowserConfig::default(),
            yelmo: YelmoConfig::default(),
            artesiete: ArtesieteConfig::default(),
            headless: defaults::headless_targets(),
            html: Vec::new(),
            calendar: CalendarConfig::default(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Accept-Language header for HTTP requests
    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            accept_language: defaults::accept_language(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Headless browser settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Explicit browser executable; searched for when unset
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Locations tried when no explicit executable is configured
    #[serde(default = "defaults::search_paths")]
    pub search_paths: Vec<PathBuf>,

    #[serde(default = "defaults::enabled")]
    pub headless: bool,

    /// Wait after navigation before the first capture attempt
    #[serde(default = "defaults::settle_secs")]
    pub settle_secs: u64,

    /// Extra wait after the second scroll
    #[serde(default = "defaults::follow_up_secs")]
    pub follow_up_secs: u64,

    /// Hard limit for one page render, navigation included
    #[serde(default = "defaults::browser_timeout")]
    pub timeout_secs: u64,

    /// Render in a child process of this executable
    #[serde(default = "defaults::enabled")]
    pub isolate: bool,

    /// Cookie-consent buttons clicked when present
    #[serde(default = "defaults::consent_selectors")]
    pub consent_selectors: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            search_paths: defaults::search_paths(),
            headless: true,
            settle_secs: defaults::settle_secs(),
            follow_up_secs: defaults::follow_up_secs(),
            timeout_secs: defaults::browser_timeout(),
            isolate: true,
            consent_selectors: defaults::consent_selectors(),
        }
    }
}

/// Yelmo Cines JSON API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YelmoConfig {
    #[serde(default = "defaults::yelmo_endpoint")]
    pub endpoint: String,

    /// Region key sent in the request body
    #[serde(default = "defaults::yelmo_city_key")]
    pub city_key: String,

    /// Venue keys kept from the response
    #[serde(default = "defaults::yelmo_cinemas")]
    pub cinemas: Vec<String>,

    /// Public listing page prefix, joined with the venue key
    #[serde(default = "defaults::yelmo_page_base")]
    pub page_base: String,
}

impl Default for YelmoConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::yelmo_endpoint(),
            city_key: defaults::yelmo_city_key(),
            cinemas: defaults::yelmo_cinemas(),
            page_base: defaults::yelmo_page_base(),
        }
    }
}

/// Artesiete theater page plus its per-film session endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtesieteConfig {
    #[serde(default = "defaults::artesiete_base_url")]
    pub base_url: String,

    /// Path of the page embedding the film list
    #[serde(default = "defaults::artesiete_page_path")]
    pub page_path: String,

    /// Theater name used in the session endpoint path
    #[serde(default = "defaults::artesiete_theater_name")]
    pub theater_name: String,

    /// Cinema name shown in records
    #[serde(default = "defaults::artesiete_display_name")]
    pub display_name: String,
}

impl ArtesieteConfig {
    pub fn page_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.page_path)
    }
}

impl Default for ArtesieteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::artesiete_base_url(),
            page_path: defaults::artesiete_page_path(),
            theater_name: defaults::artesiete_theater_name(),
            display_name: defaults::artesiete_display_name(),
        }
    }
}

/// A client-rendered cinema page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessTarget {
    /// Short identifier, also used for `--render-target`
    pub key: String,

    /// Cinema display name
    pub name: String,

    pub url: String,

    #[serde(default)]
    pub selectors: CardSelectors,
}

/// A server-rendered cinema page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlSourceConfig {
    /// Cinema display name
    pub name: String,

    pub url: String,

    #[serde(default)]
    pub selectors: CardSelectors,
}

/// Static calendar page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default = "defaults::calendar_output")]
    pub output: PathBuf,

    #[serde(default = "defaults::calendar_title")]
    pub title: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            output: defaults::calendar_output(),
            title: defaults::calendar_title(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    use super::{CardSelectors, HeadlessTarget};

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .into()
    }
    pub fn accept_language() -> String {
        "es-ES,es;q=0.9,en;q=0.8".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Browser defaults
    pub fn enabled() -> bool {
        true
    }
    pub fn settle_secs() -> u64 {
        12
    }
    pub fn follow_up_secs() -> u64 {
        3
    }
    pub fn browser_timeout() -> u64 {
        60
    }
    pub fn search_paths() -> Vec<PathBuf> {
        [
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ]
        .into_iter()
        .map(PathBuf::from)
        .collect()
    }
    pub fn consent_selectors() -> Vec<String> {
        vec![
            "#onetrust-accept-btn-handler".into(),
            "#didomi-notice-agree-button".into(),
            "button#CybotCookiebotDialogBodyButtonAccept".into(),
            ".cc-allow".into(),
            r#"button[aria-label*="Aceptar"]"#.into(),
            r#"[id*="cookie"] button"#.into(),
        ]
    }

    // Yelmo defaults
    pub fn yelmo_endpoint() -> String {
        "https://www.yelmocines.es/now-playing.aspx/GetNowPlaying".into()
    }
    pub fn yelmo_city_key() -> String {
        "las-palmas".into()
    }
    pub fn yelmo_cinemas() -> Vec<String> {
        vec![
            "premium-alisios".into(),
            "las-arenas".into(),
            "vecindario".into(),
        ]
    }
    pub fn yelmo_page_base() -> String {
        "https://www.yelmocines.es/cartelera".into()
    }

    // Artesiete defaults
    pub fn artesiete_base_url() -> String {
        "https://terrazas.artesiete.es".into()
    }
    pub fn artesiete_page_path() -> String {
        "/Cine/1/Artesiete-terrazas".into()
    }
    pub fn artesiete_theater_name() -> String {
        "ARTESIETE Las Terrazas".into()
    }
    pub fn artesiete_display_name() -> String {
        "Artesiete Las Terrazas (Telde)".into()
    }

    // Headless defaults
    pub fn headless_targets() -> Vec<HeadlessTarget> {
        vec![
            HeadlessTarget {
                key: "ocine".into(),
                name: "Ocine Premium 7 Palmas".into(),
                url: "https://www.ocine.es/cines/premium-7-palmas/cartelera".into(),
                selectors: CardSelectors::from_parts(
                    r#"article, [class*="movie"], .swiper-slide, div[class*="flex"]"#,
                    r#"h1, h2, h3, h4, [class*="title"]"#,
                    "button, span, a",
                ),
            },
            HeadlessTarget {
                key: "cinesa".into(),
                name: "Cinesa El Muelle".into(),
                url: "https://www.cinesa.es/cines/cinesa-el-muelle/".into(),
                selectors: CardSelectors::from_parts(
                    r#"[class*="movie"], [class*="Movie"], article"#,
                    r#"[class*="title"], [class*="Title"], h2, h3"#,
                    "button, a, span",
                ),
            },
        ]
    }

    // Calendar defaults
    pub fn calendar_output() -> PathBuf {
        PathBuf::from("docs/index.html")
    }
    pub fn calendar_title() -> String {
        "VOSE Gran Canaria".into()
    }
}
