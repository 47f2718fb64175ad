// src/services/artesiete.rs

//! Artesiete Las Terrazas adapter.
//!
//! The theater page embeds its film list as HTML-escaped JSON in a Vue prop.
//! Sessions come from one extra request per film; a film whose request fails
//! is skipped.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::Datelike;
use regex::Regex;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ArtesieteConfig, Showing, ShowingCollector};
use crate::services::{FetchContext, SourceAdapter, json_text};
use crate::utils::date::{normalize_date_in_year, parse_showtime};
use crate::utils::http::{fetch_page, send_text};
use crate::utils::{decode_entities, is_vose};

const SOURCE_TAG: &str = "artesiete-api";

static FILM_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s):onlytitlesinfo='(\[.*?\])'\s").expect("valid regex")
});

/// Entry of the embedded film list.
#[derive(Debug, Clone, Deserialize)]
pub struct FilmEntry {
    #[serde(rename = "ID_Espectaculo")]
    pub id: Value,
    #[serde(rename = "Titulo")]
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPayload {
    #[serde(default)]
    sessions: Vec<RawSession>,
    #[serde(default)]
    film: Option<RawFilmInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawSession {
    #[serde(default)]
    nombre_formato: String,
    #[serde(default)]
    n_copia: Value,
    #[serde(default)]
    hora_cine: Option<String>,
    #[serde(default, rename = "film")]
    film: Option<RawFilmInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawFilmInfo {
    #[serde(default)]
    abreviatura_calificacion: Value,
    #[serde(default)]
    duracion: Value,
}

/// Adapter for the Artesiete theater page and session endpoint.
pub struct ArtesieteAdapter {
    config: ArtesieteConfig,
}

impl ArtesieteAdapter {
    pub fn new(config: ArtesieteConfig) -> Self {
        Self { config }
    }

    /// Pull the embedded film list out of the theater page.
    pub fn parse_film_list(page: &str) -> Result<Vec<FilmEntry>> {
        let caps = FILM_LIST
            .captures(page)
            .ok_or_else(|| AppError::source("Artesiete", "film data not found in page"))?;
        let decoded = decode_entities(&caps[1]);
        Ok(serde_json::from_str(&decoded)?)
    }

    /// Session endpoint for one film.
    pub fn sessions_url(&self, film: &FilmEntry) -> Result<Url> {
        let id = json_text(&film.id)
            .ok_or_else(|| AppError::source("Artesiete", format!("film '{}' has no id", film.title)))?;

        let mut url = Url::parse(&self.config.base_url)?;
        url.path_segments_mut()
            .map_err(|_| AppError::config("artesiete.base_url cannot be a base URL"))?
            .pop_if_empty()
            .push("TitlesHoursAtTheater")
            .push(&self.config.theater_name)
            .push(&id);
        Ok(url)
    }

    /// Merge one film's session payload into the collector.
    fn collect_sessions(
        &self,
        film: &FilmEntry,
        body: &str,
        ctx: &FetchContext,
        collector: &mut ShowingCollector,
    ) -> Result<()> {
        let payload: SessionPayload = serde_json::from_str(body)?;
        let year = ctx.today.year();
        let page_url = self.config.page_url();

        for session in &payload.sessions {
            let format = session.nombre_formato.trim();
            if !is_vose(format) {
                continue;
            }

            let date = session_date(session, year);
            if !ctx.wants(date.as_deref()) {
                continue;
            }

            let Some(time) = session
                .hora_cine
                .as_deref()
                .and_then(|h| h.get(11..16))
                .and_then(parse_showtime)
            else {
                log::debug!("Artesiete: session of '{}' without a time", film.title);
                continue;
            };

            let info = session
                .film
                .clone()
                .or_else(|| payload.film.clone())
                .unwrap_or_default();

            let language = if format.contains("VO") {
                "Versión Original".to_string()
            } else {
                format.to_string()
            };

            collector.add(Showing {
                cinema: self.config.display_name.clone(),
                title: film.title.trim().to_string(),
                language,
                format: format.to_string(),
                date,
                times: vec![time],
                rating: json_text(&info.abreviatura_calificacion),
                runtime: json_text(&info.duracion).map(|d| format!("{d} min")),
                poster: None,
                url: Some(page_url.clone()),
                source: SOURCE_TAG.to_string(),
            });
        }

        Ok(())
    }

    async fn fetch_sessions(&self, ctx: &FetchContext, film: &FilmEntry) -> Result<String> {
        let url = self.sessions_url(film)?;
        let request = ctx
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .header("X-Requested-With", "XMLHttpRequest");
        send_text(request).await
    }
}

/// `NCopia` when it reads as a date, otherwise the date part of `HoraCine`.
fn session_date(session: &RawSession, year: i32) -> Option<String> {
    json_text(&session.n_copia)
        .and_then(|copy| normalize_date_in_year(&copy, year).into_iso())
        .or_else(|| {
            session
                .hora_cine
                .as_deref()
                .and_then(|h| h.get(..10))
                .and_then(|d| normalize_date_in_year(d, year).into_iso())
        })
}

#[async_trait]
impl SourceAdapter for ArtesieteAdapter {
    fn name(&self) -> &str {
        "Artesiete"
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<Vec<Showing>> {
        log::info!("Fetching {}...", self.config.display_name);

        let (showings, skipped) = self.fetch_films(ctx).await?;
        if skipped > 0 {
            log::warn!("Artesiete: {skipped} films skipped");
        }

        log::info!("Found {} VO/VOSE showings from Artesiete", showings.len());
        Ok(showings)
    }
}

impl ArtesieteAdapter {
    /// Fetch the film list and every film's sessions.
    ///
    /// Returns the merged records and how many films were skipped because
    /// their session request or payload failed.
    pub async fn fetch_films(&self, ctx: &FetchContext) -> Result<(Vec<Showing>, usize)> {
        let page = fetch_page(&ctx.client, &self.config.page_url()).await?;
        let films = Self::parse_film_list(&page)?;
        log::info!(
            "Found {} films, checking for VO/VOSE sessions...",
            films.len()
        );

        let mut collector = ShowingCollector::new();
        let mut skipped = 0usize;

        for film in &films {
            let result = match self.fetch_sessions(ctx, film).await {
                Ok(body) => self.collect_sessions(film, &body, ctx, &mut collector),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                skipped += 1;
                log::debug!("Artesiete: skipping '{}': {}", film.title, e);
            }
        }

        Ok((collector.finish(), skipped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_context;

    const PAGE: &str = r#"<div id="app"><cartelera
        :onlytitlesinfo='[{&quot;ID_Espectaculo&quot;:4411,&quot;Titulo&quot;:&quot;Anora&quot;},{&quot;ID_Espectaculo&quot;:&quot;4412&quot;,&quot;Titulo&quot;:&quot;Tom &amp; Jerry&quot;}]' :cine='1'></cartelera></div>"#;

    const SESSIONS: &str = r#"{
      "film": { "AbreviaturaCalificacion": "+16", "Duracion": 139 },
      "sessions": [
        { "NombreFormato": "DIGITAL VOSE", "NCopia": "13/02/2026", "HoraCine": "2026-02-13T22:15:00" },
        { "NombreFormato": "DIGITAL VOSE", "NCopia": "1", "HoraCine": "2026-02-13T18:00:00" },
        { "NombreFormato": "DIGITAL VOSE", "NCopia": null, "HoraCine": "2026-02-13T18:00:00" },
        { "NombreFormato": "DIGITAL", "NCopia": "13/02/2026", "HoraCine": "2026-02-13T20:00:00" },
        { "NombreFormato": "DIGITAL VOSE", "NCopia": "14/02/2026", "HoraCine": "2026-02-14T19:30:00" }
      ]
    }"#;

    fn adapter() -> ArtesieteAdapter {
        ArtesieteAdapter::new(ArtesieteConfig::default())
    }

    fn film() -> FilmEntry {
        ArtesieteAdapter::parse_film_list(PAGE).unwrap().remove(0)
    }

    #[test]
    fn test_parse_film_list() {
        let films = ArtesieteAdapter::parse_film_list(PAGE).unwrap();
        assert_eq!(films.len(), 2);
        assert_eq!(films[0].title, "Anora");
        assert_eq!(films[1].title, "Tom & Jerry");
    }

    #[test]
    fn test_missing_film_list_is_an_error() {
        assert!(ArtesieteAdapter::parse_film_list("<html></html>").is_err());
    }

    #[test]
    fn test_sessions_url_encodes_theater_name() {
        let films = ArtesieteAdapter::parse_film_list(PAGE).unwrap();
        let adapter = adapter();
        assert_eq!(
            adapter.sessions_url(&films[0]).unwrap().as_str(),
            "https://terrazas.artesiete.es/TitlesHoursAtTheater/ARTESIETE%20Las%20Terrazas/4411"
        );
        assert!(adapter.sessions_url(&films[1]).unwrap().as_str().ends_with("/4412"));
    }

    #[test]
    fn test_sessions_merge_into_one_record_per_date() {
        let adapter = adapter();
        let mut collector = ShowingCollector::new();
        adapter
            .collect_sessions(&film(), SESSIONS, &test_context(false), &mut collector)
            .unwrap();

        let showings = collector.finish();
        assert_eq!(showings.len(), 1);
        let anora = &showings[0];
        assert_eq!(anora.cinema, "Artesiete Las Terrazas (Telde)");
        assert_eq!(anora.times, vec!["18:00", "22:15"]);
        assert_eq!(anora.language, "Versión Original");
        assert_eq!(anora.format, "DIGITAL VOSE");
        assert_eq!(anora.rating.as_deref(), Some("+16"));
        assert_eq!(anora.runtime.as_deref(), Some("139 min"));
    }

    #[test]
    fn test_all_dates_keeps_later_sessions() {
        let adapter = adapter();
        let mut collector = ShowingCollector::new();
        adapter
            .collect_sessions(&film(), SESSIONS, &test_context(true), &mut collector)
            .unwrap();
        assert_eq!(collector.finish().len(), 2);
    }

    /// Serve canned responses keyed by request path until the test ends.
    async fn serve(routes: Vec<(String, u16, &'static str)>) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let path = request.split_whitespace().nth(1).unwrap_or("").to_string();
                let (status, body) = routes
                    .iter()
                    .find(|(p, _, _)| *p == path)
                    .map(|(_, status, body)| (*status, *body))
                    .unwrap_or((404, "not found"));
                let reply = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_failed_films_are_skipped() {
        const THREE_FILMS: &str = r#"<cartelera :onlytitlesinfo='[{&quot;ID_Espectaculo&quot;:1,&quot;Titulo&quot;:&quot;Gone&quot;},{&quot;ID_Espectaculo&quot;:2,&quot;Titulo&quot;:&quot;Broken&quot;},{&quot;ID_Espectaculo&quot;:3,&quot;Titulo&quot;:&quot;Anora&quot;}]' :cine='1'></cartelera>"#;

        let sessions = "/TitlesHoursAtTheater/ARTESIETE%20Las%20Terrazas";
        let base = serve(vec![
            ("/Cine/1/Artesiete-terrazas".into(), 200, THREE_FILMS),
            (format!("{sessions}/2"), 200, "{\"sessions\": ["),
            (format!("{sessions}/3"), 200, SESSIONS),
        ])
        .await;

        let adapter = ArtesieteAdapter::new(ArtesieteConfig {
            base_url: base,
            ..ArtesieteConfig::default()
        });
        let ctx = FetchContext {
            client: reqwest::Client::builder().no_proxy().build().unwrap(),
            ..test_context(false)
        };

        let (showings, skipped) = adapter.fetch_films(&ctx).await.unwrap();
        assert_eq!(skipped, 2);
        assert_eq!(showings.len(), 1);
        assert_eq!(showings[0].title, "Anora");
        assert_eq!(showings[0].times, vec!["18:00", "22:15"]);
    }

    #[test]
    fn test_bad_session_payload_is_an_error() {
        let mut collector = ShowingCollector::new();
        assert!(
            adapter()
                .collect_sessions(&film(), "<html>", &test_context(false), &mut collector)
                .is_err()
        );
        assert!(collector.is_empty());
    }
}
