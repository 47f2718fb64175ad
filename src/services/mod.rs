//! Source adapters.
//!
//! Each adapter knows one upstream and turns its payload into [`Showing`]s:
//! - Yelmo Cines JSON API (`YelmoAdapter`)
//! - Artesiete page + per-film session API (`ArtesieteAdapter`)
//! - Server-rendered listings (`StaticHtmlAdapter`)
//! - Client-rendered listings via headless Chrome (`HeadlessAdapter`)

mod artesiete;
pub mod cards;
mod headless;
mod html;
mod yelmo;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;

use crate::error::Result;
use crate::models::{Config, Showing};
use crate::utils::date::{iso, today};

pub use artesiete::ArtesieteAdapter;
pub use headless::{ChildCommand, HeadlessAdapter, RenderMode, render_target};
pub use html::StaticHtmlAdapter;
pub use yelmo::YelmoAdapter;

/// Shared inputs for one run.
#[derive(Debug, Clone)]
pub struct FetchContext {
    pub client: Client,
    /// Date the run treats as "today"
    pub today: NaiveDate,
    /// Keep sessions on every date, not only today
    pub all_dates: bool,
}

impl FetchContext {
    pub fn new(client: Client, all_dates: bool) -> Self {
        Self {
            client,
            today: today(),
            all_dates,
        }
    }

    pub fn today_iso(&self) -> String {
        iso(self.today)
    }

    /// Whether a session on `date` belongs in this run.
    pub fn wants(&self, date: Option<&str>) -> bool {
        self.all_dates || date == Some(self.today_iso().as_str())
    }
}

/// One upstream data source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Label used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Fetch and normalize this source's VOSE showings.
    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<Showing>>;
}

/// Build the fixed adapter list for a configuration.
pub fn default_adapters(config: &Config, render: RenderMode) -> Vec<Box<dyn SourceAdapter>> {
    let mut adapters: Vec<Box<dyn SourceAdapter>> = vec![
        Box::new(YelmoAdapter::new(config.yelmo.clone())),
        Box::new(ArtesieteAdapter::new(config.artesiete.clone())),
    ];

    for source in &config.html {
        adapters.push(Box::new(StaticHtmlAdapter::new(source.clone())));
    }

    for target in &config.headless {
        adapters.push(Box::new(HeadlessAdapter::new(
            target.clone(),
            config,
            render.clone(),
        )));
    }

    adapters
}

/// Text of a JSON scalar; empty strings and nulls become `None`.
pub(crate) fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Context pinned to 2026-02-13 for fixture-driven tests.
#[cfg(test)]
pub(crate) fn test_context(all_dates: bool) -> FetchContext {
    FetchContext {
        client: Client::new(),
        today: NaiveDate::from_ymd_opt(2026, 2, 13).unwrap(),
        all_dates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(all_dates: bool) -> FetchContext {
        test_context(all_dates)
    }

    #[test]
    fn test_wants_today_only() {
        let ctx = ctx(false);
        assert!(ctx.wants(Some("2026-02-13")));
        assert!(!ctx.wants(Some("2026-02-14")));
        assert!(!ctx.wants(None));
    }

    #[test]
    fn test_wants_all_dates() {
        let ctx = ctx(true);
        assert!(ctx.wants(Some("2026-02-14")));
        assert!(ctx.wants(None));
    }

    #[test]
    fn test_json_text() {
        assert_eq!(json_text(&Value::from(118)), Some("118".into()));
        assert_eq!(json_text(&Value::from(" +12 ")), Some("+12".into()));
        assert_eq!(json_text(&Value::from("")), None);
        assert_eq!(json_text(&Value::Null), None);
    }

    #[test]
    fn test_default_adapters_cover_every_source() {
        let config = Config::default();
        let adapters = default_adapters(&config, RenderMode::InProcess);
        let names: Vec<_> = adapters.iter().map(|a| a.name().to_string()).collect();
        assert_eq!(
            names,
            vec![
                "Yelmo",
                "Artesiete",
                "Ocine Premium 7 Palmas",
                "Cinesa El Muelle"
            ]
        );
    }
}
