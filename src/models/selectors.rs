// src/models/selectors.rs

//! CSS selectors for finding film cards on a cinema page.

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// CSS selectors for scraping film cards out of a rendered listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardSelectors {
    /// Selector for each candidate film card
    #[serde(default = "default_card_selector")]
    pub card_selector: String,

    /// Selector for the title element within a card (first match wins)
    #[serde(default = "default_title_selector")]
    pub title_selector: String,

    /// Selector for elements that may hold a single showtime
    #[serde(default = "default_time_selector")]
    pub time_selector: String,
}

fn default_card_selector() -> String {
    r#"article, [class*="movie"], [class*="film"]"#.to_string()
}

fn default_title_selector() -> String {
    r#"h1, h2, h3, h4, [class*="title"]"#.to_string()
}

fn default_time_selector() -> String {
    "button, span, a".to_string()
}

impl Default for CardSelectors {
    fn default() -> Self {
        Self::fallback()
    }
}

impl CardSelectors {
    /// Create selectors from explicit strings.
    pub fn from_parts(
        card: impl Into<String>,
        title: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            card_selector: card.into(),
            title_selector: title.into(),
            time_selector: time.into(),
        }
    }

    /// Generic selectors that match most card-based listings.
    pub fn fallback() -> Self {
        Self {
            card_selector: default_card_selector(),
            title_selector: default_title_selector(),
            time_selector: default_time_selector(),
        }
    }

    /// Parse all three selectors.
    pub fn compile(&self) -> Result<CompiledSelectors> {
        Ok(CompiledSelectors {
            card: parse_selector(&self.card_selector)?,
            title: parse_selector(&self.title_selector)?,
            time: parse_selector(&self.time_selector)?,
        })
    }
}

/// Parsed form of [`CardSelectors`].
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub card: Selector,
    pub title: Selector,
    pub time: Selector,
}

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
