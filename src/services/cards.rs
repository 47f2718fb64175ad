// src/services/cards.rs

//! Film-card heuristics shared by the HTML and headless adapters.
//!
//! A card is any element matching the card selector whose whole text carries
//! a VOSE marker. Its title is the first title-selector match; its times are
//! the time-selector elements whose entire text is a showtime.

use std::collections::HashSet;

use scraper::{ElementRef, Html};

use crate::models::{CompiledSelectors, Showing};
use crate::utils::{clean_text, is_vose, parse_showtime};

/// A VOSE film card found in a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilmCard {
    pub title: String,
    pub times: Vec<String>,
}

/// Extract VOSE cards from an HTML document.
///
/// Cards are de-duplicated on (title, times), so nested matches of the same
/// card collapse while the same title with other times survives.
pub fn extract_cards(html: &str, selectors: &CompiledSelectors) -> Vec<FilmCard> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut cards = Vec::new();

    for element in document.select(&selectors.card) {
        let Some(card) = parse_card(element, selectors) else {
            continue;
        };
        if seen.insert((card.title.clone(), card.times.join(","))) {
            cards.push(card);
        }
    }

    cards
}

fn parse_card(element: ElementRef<'_>, selectors: &CompiledSelectors) -> Option<FilmCard> {
    let text = element.text().collect::<Vec<_>>().join(" ");
    if !is_vose(&text) {
        return None;
    }

    let title_elem = element.select(&selectors.title).next()?;
    let title = clean_text(&title_elem.text().collect::<String>());
    if title.is_empty() {
        return None;
    }

    let mut times: Vec<String> = Vec::new();
    for candidate in element.select(&selectors.time) {
        let raw = candidate.text().collect::<String>();
        if let Some(time) = parse_showtime(&raw) {
            if !times.contains(&time) {
                times.push(time);
            }
        }
    }
    if times.is_empty() {
        return None;
    }
    times.sort();

    Some(FilmCard { title, times })
}

/// Where a set of cards came from.
#[derive(Debug, Clone, Copy)]
pub struct CardOrigin<'a> {
    pub cinema: &'a str,
    pub url: &'a str,
    pub date: &'a str,
    pub source: &'a str,
}

/// Turn cards into canonical records.
pub fn cards_to_showings(cards: Vec<FilmCard>, origin: CardOrigin<'_>) -> Vec<Showing> {
    cards
        .into_iter()
        .map(|card| Showing {
            cinema: origin.cinema.to_string(),
            title: card.title,
            language: "VOSE".to_string(),
            format: "VOSE".to_string(),
            date: Some(origin.date.to_string()),
            times: card.times,
            rating: None,
            runtime: None,
            poster: None,
            url: Some(origin.url.to_string()),
            source: origin.source.to_string(),
        })
        .collect()
}
