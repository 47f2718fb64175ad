// src/report/calendar.rs

//! Static HTML calendar of dated showings, one Monday-first grid per month.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use chrono::{Datelike, NaiveDate};

use crate::error::Result;
use crate::models::{Report, Showing};
use crate::utils::escape_html;

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

const DAY_NAMES: [&str; 7] = ["Lun", "Mar", "Mié", "Jue", "Vie", "Sáb", "Dom"];

/// (chip background, border/badge)
const PALETTE: [(&str, &str); 8] = [
    ("#fef3c7", "#f59e0b"),
    ("#dbeafe", "#3b82f6"),
    ("#dcfce7", "#22c55e"),
    ("#fce7f3", "#ec4899"),
    ("#ede9fe", "#8b5cf6"),
    ("#fee2e2", "#ef4444"),
    ("#cffafe", "#06b6d4"),
    ("#f3f4f6", "#6b7280"),
];

const STYLE: &str = r#"
  :root { --bg: #0f172a; --surface: #1e293b; --surface2: #334155; --text: #e2e8f0; --dim: #94a3b8; --accent: #38bdf8; --today: #facc15; }
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; background: var(--bg); color: var(--text); padding: 20px; max-width: 1200px; margin: 0 auto; }
  header { text-align: center; padding: 30px 0 20px; }
  header h1 { font-size: 2rem; color: var(--accent); margin-bottom: 6px; }
  .subtitle { color: var(--dim); font-size: 0.9rem; }
  .legend { display: flex; flex-wrap: wrap; gap: 12px; justify-content: center; margin: 16px 0 30px; }
  .legend-item { display: flex; align-items: center; gap: 6px; font-size: 0.8rem; color: var(--dim); }
  .legend-dot { width: 10px; height: 10px; border-radius: 50%; }
  .month-block { margin-bottom: 40px; }
  .month-title { font-size: 1.4rem; margin-bottom: 12px; color: var(--accent); }
  .calendar-grid { display: grid; grid-template-columns: repeat(7, 1fr); gap: 2px; background: var(--surface2); border-radius: 12px; overflow: hidden; }
  .day-header { background: var(--surface); text-align: center; padding: 10px 4px; font-size: 0.8rem; color: var(--dim); text-transform: uppercase; }
  .day-cell { background: var(--surface); min-height: 100px; padding: 6px; }
  .day-cell.empty { background: var(--bg); min-height: 60px; }
  .day-cell.past { opacity: 0.45; }
  .day-cell.today { box-shadow: inset 0 0 0 2px var(--today); }
  .day-number { font-size: 0.85rem; font-weight: 700; color: var(--dim); margin-bottom: 4px; }
  .day-cell.today .day-number { color: var(--today); }
  .films-list { display: flex; flex-direction: column; gap: 3px; }
  .film-link { text-decoration: none; display: block; }
  .film-chip { padding: 3px 6px; border-radius: 4px; font-size: 0.7rem; color: #1f2937; display: flex; flex-wrap: wrap; gap: 3px; }
  .film-time { font-weight: 700; }
  .film-title-text { font-weight: 600; flex: 1; min-width: 0; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
  .film-cinema-badge { font-size: 0.55rem; font-weight: 700; color: white; padding: 1px 4px; border-radius: 3px; text-transform: uppercase; }
  footer { text-align: center; padding: 30px 0; color: var(--dim); font-size: 0.8rem; }
  @media (max-width: 768px) { .film-cinema-badge { display: none; } .day-cell { min-height: 70px; padding: 4px; } }
"#;

/// Showings bucketed by (year, month) then day.
fn by_month(films: &[Showing]) -> BTreeMap<(i32, u32), BTreeMap<u32, Vec<&Showing>>> {
    let mut months: BTreeMap<(i32, u32), BTreeMap<u32, Vec<&Showing>>> = BTreeMap::new();
    for film in films {
        let Some(date) = film
            .date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        else {
            continue;
        };
        months
            .entry((date.year(), date.month()))
            .or_default()
            .entry(date.day())
            .or_default()
            .push(film);
    }
    months
}

fn days_in_month(first: NaiveDate) -> u32 {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|next| (next - first).num_days() as u32)
        .unwrap_or(31)
}

/// Venue name without the chain prefix, for the chip badge.
fn short_cinema(cinema: &str) -> String {
    cinema
        .replace("Yelmo ", "")
        .replace("Artesiete ", "")
        .replace(" (Telde)", "")
}

struct Palette<'a> {
    cinemas: Vec<&'a str>,
}

impl<'a> Palette<'a> {
    fn new(films: &'a [Showing]) -> Self {
        let cinemas: BTreeSet<&str> = films.iter().map(|f| f.cinema.as_str()).collect();
        Self {
            cinemas: cinemas.into_iter().collect(),
        }
    }

    fn color(&self, cinema: &str) -> (&'static str, &'static str) {
        let idx = self.cinemas.iter().position(|c| *c == cinema).unwrap_or(0);
        PALETTE[idx % PALETTE.len()]
    }
}

fn render_chip(out: &mut String, film: &Showing, palette: &Palette<'_>) {
    let (bg, border) = palette.color(&film.cinema);
    let title = escape_html(&film.title);
    out.push_str(&format!(
        r#"<a href="{href}" target="_blank" class="film-link"><div class="film-chip" style="background:{bg};border-left:3px solid {border}" title="{title} - {cinema}&#10;{times}"><span class="film-time">{first}</span><span class="film-title-text">{title}</span><span class="film-cinema-badge" style="background:{border}">{badge}</span></div></a>"#,
        href = escape_html(film.url.as_deref().unwrap_or("#")),
        cinema = escape_html(&film.cinema),
        times = escape_html(&film.times.join(", ")),
        first = escape_html(film.first_time()),
        badge = escape_html(&short_cinema(&film.cinema)),
    ));
}

fn render_month(
    out: &mut String,
    (year, month): (i32, u32),
    days: &BTreeMap<u32, Vec<&Showing>>,
    today: NaiveDate,
    palette: &Palette<'_>,
) {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return;
    };
    let lead = first.weekday().num_days_from_monday();
    let total = days_in_month(first);

    out.push_str(&format!(
        r#"<div class="month-block"><h2 class="month-title">{} {year}</h2><div class="calendar-grid">"#,
        MONTH_NAMES[month as usize - 1]
    ));
    for name in DAY_NAMES {
        out.push_str(&format!(r#"<div class="day-header">{name}</div>"#));
    }
    for _ in 0..lead {
        out.push_str(r#"<div class="day-cell empty"></div>"#);
    }

    for day in 1..=total {
        let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
            continue;
        };

        let mut seen = HashSet::new();
        let films: Vec<&Showing> = days
            .get(&day)
            .map(|list| {
                list.iter()
                    .copied()
                    .filter(|f| seen.insert((f.title.as_str(), f.cinema.as_str())))
                    .collect()
            })
            .unwrap_or_default();

        let mut class = String::from("day-cell");
        if date == today {
            class.push_str(" today");
        } else if date < today {
            class.push_str(" past");
        }
        if !films.is_empty() {
            class.push_str(" has-films");
        }

        out.push_str(&format!(
            r#"<div class="{class}"><div class="day-number">{day}</div>"#
        ));
        if !films.is_empty() {
            out.push_str(r#"<div class="films-list">"#);
            for film in films {
                render_chip(out, film, palette);
            }
            out.push_str("</div>");
        }
        out.push_str("</div>");
    }

    let used = lead + total;
    let trailing = (7 - used % 7) % 7;
    for _ in 0..trailing {
        out.push_str(r#"<div class="day-cell empty"></div>"#);
    }
    out.push_str("</div></div>\n");
}

/// Render the calendar page for every dated record in `report`.
pub fn render_calendar(report: &Report, title: &str, today: NaiveDate) -> String {
    let palette = Palette::new(&report.films);
    let title = escape_html(title);

    let mut out = String::new();
    out.push_str(&format!(
        "<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n"
    ));
    out.push_str(&format!(
        "<header><h1>{title}</h1><p class=\"subtitle\">Films in original version (VOSE/VO)</p>\
         <p class=\"subtitle\">Updated: {}</p></header>\n",
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    out.push_str(r#"<div class="legend">"#);
    for cinema in &palette.cinemas {
        let (_, dot) = palette.color(cinema);
        out.push_str(&format!(
            r#"<span class="legend-item"><span class="legend-dot" style="background:{dot}"></span>{}</span>"#,
            escape_html(cinema)
        ));
    }
    out.push_str("</div>\n");

    for (month, days) in &by_month(&report.films) {
        render_month(&mut out, *month, days, today, &palette);
    }

    out.push_str(&format!(
        "<footer><p>{} showings found across {} cinemas</p></footer>\n</body>\n</html>\n",
        report.total_films,
        palette.cinemas.len()
    ));
    out
}

/// Render and write the calendar to `path`, creating parent directories.
pub fn write_calendar(report: &Report, title: &str, today: NaiveDate, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_calendar(report, title, today))?;
    log::info!("Calendar written to {}", path.display());
    Ok(())
}
