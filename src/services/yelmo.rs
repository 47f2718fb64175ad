// src/services/yelmo.rs

//! Yelmo Cines adapter.
//!
//! One POST to the now-playing endpoint returns every cinema in the region
//! with its dates, movies, formats and showtimes.

use async_trait::async_trait;
use chrono::Datelike;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::Result;
use crate::models::{Showing, ShowingCollector, YelmoConfig};
use crate::services::{FetchContext, SourceAdapter, json_text};
use crate::utils::date::{normalize_date_in_year, parse_showtime};
use crate::utils::http::send_text;
use crate::utils::is_vose;

const SOURCE_TAG: &str = "yelmo-api";

#[derive(Debug, Deserialize)]
struct Envelope {
    d: NowPlaying,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NowPlaying {
    #[serde(default)]
    cinemas: Vec<RawCinema>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawCinema {
    key: String,
    name: String,
    #[serde(default)]
    dates: Vec<RawDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawDate {
    #[serde(default)]
    showtime_date: String,
    #[serde(default)]
    movies: Vec<RawMovie>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawMovie {
    title: String,
    #[serde(default)]
    rating: Value,
    #[serde(default)]
    run_time: Value,
    #[serde(default)]
    poster: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawFormat {
    #[serde(default)]
    name: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    showtimes: Vec<RawShowtime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawShowtime {
    #[serde(default)]
    time: String,
}

/// Adapter for the Yelmo Cines now-playing API.
pub struct YelmoAdapter {
    config: YelmoConfig,
}

impl YelmoAdapter {
    pub fn new(config: YelmoConfig) -> Self {
        Self { config }
    }

    /// Map a raw now-playing payload to canonical records.
    pub fn parse_payload(&self, body: &str, ctx: &FetchContext) -> Result<Vec<Showing>> {
        let envelope: Envelope = serde_json::from_str(body)?;
        let year = ctx.today.year();
        let mut collector = ShowingCollector::new();

        for cinema in envelope.d.cinemas {
            if !self.config.cinemas.iter().any(|k| *k == cinema.key) {
                continue;
            }

            let cinema_name = format!("Yelmo {}", cinema.name.trim());
            let url = format!(
                "{}/{}",
                self.config.page_base.trim_end_matches('/'),
                cinema.key
            );

            for day in cinema.dates {
                let date = normalize_date_in_year(&day.showtime_date, year);
                if !date.is_iso() {
                    log::warn!(
                        "Yelmo: unrecognized date '{}' at {}",
                        date.as_str(),
                        cinema_name
                    );
                }
                let date = date.into_iso();
                if !ctx.wants(date.as_deref()) {
                    continue;
                }

                for movie in day.movies {
                    for format in &movie.formats {
                        if !is_vose(&format.language) {
                            continue;
                        }

                        let times: Vec<String> = format
                            .showtimes
                            .iter()
                            .filter_map(|s| parse_showtime(&s.time))
                            .collect();

                        collector.add(Showing {
                            cinema: cinema_name.clone(),
                            title: movie.title.trim().to_string(),
                            language: format.language.trim().to_string(),
                            format: format.name.trim().to_string(),
                            date: date.clone(),
                            times,
                            rating: json_text(&movie.rating),
                            runtime: json_text(&movie.run_time).map(|r| format!("{r} min")),
                            poster: movie.poster.clone().filter(|p| !p.is_empty()),
                            url: Some(url.clone()),
                            source: SOURCE_TAG.to_string(),
                        });
                    }
                }
            }
        }

        Ok(collector.finish())
    }
}

#[async_trait]
impl SourceAdapter for YelmoAdapter {
    fn name(&self) -> &str {
        "Yelmo"
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<Showing>> {
        log::info!("Fetching Yelmo Cines ({})...", self.config.city_key);

        let body = json!({ "cityKey": self.config.city_key }).to_string();
        let request = ctx
            .client
            .post(&self.config.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body);

        let payload = send_text(request).await?;
        let showings = self.parse_payload(&payload, ctx)?;

        log::info!("Found {} VOSE showings from Yelmo", showings.len());
        Ok(showings)
    }
}
