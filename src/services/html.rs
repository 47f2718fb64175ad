// src/services/html.rs

//! Adapter for server-rendered cinema listings.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{HtmlSourceConfig, Showing};
use crate::services::cards::{CardOrigin, cards_to_showings, extract_cards};
use crate::services::{FetchContext, SourceAdapter};
use crate::utils::http::fetch_page;

const SOURCE_TAG: &str = "html";

/// Scrapes one static HTML page with the card heuristics.
pub struct StaticHtmlAdapter {
    config: HtmlSourceConfig,
}

impl StaticHtmlAdapter {
    pub fn new(config: HtmlSourceConfig) -> Self {
        Self { config }
    }

    /// Extract today's VOSE showings from a fetched page.
    pub fn parse_page(&self, html: &str, ctx: &FetchContext) -> Result<Vec<Showing>> {
        let selectors = self.config.selectors.compile()?;
        let cards = extract_cards(html, &selectors);
        let date = ctx.today_iso();

        Ok(cards_to_showings(
            cards,
            CardOrigin {
                cinema: &self.config.name,
                url: &self.config.url,
                date: &date,
                source: SOURCE_TAG,
            },
        ))
    }
}

#[async_trait]
impl SourceAdapter for StaticHtmlAdapter {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<Showing>> {
        log::info!("Fetching {} ({})...", self.config.name, self.config.url);

        let html = fetch_page(&ctx.client, &self.config.url).await?;
        let showings = self.parse_page(&html, ctx)?;

        log::info!(
            "Found {} VOSE showings from {}",
            showings.len(),
            self.config.name
        );
        Ok(showings)
    }
}
