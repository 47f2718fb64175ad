// src/utils/date.rs

//! Date and showtime normalization.
//!
//! Sources publish dates as ISO (`2026-02-10`), day/month/year (`10/02/2026`)
//! or a Spanish day + month name (`10 febrero`). Everything is turned into
//! ISO here; text that fits none of those shapes comes back as
//! [`NormalizedDate::Unrecognized`] so callers can decide what to do with it.

use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("valid regex"));

static DMY_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid regex"));

static DAY_MONTH_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{1,2})\s+(?:de\s+)?(\p{L}+)$").expect("valid regex")
});

static SHOWTIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[:.](\d{2})$").expect("valid regex"));

/// Spanish month names and their two-digit codes.
pub const MONTHS: &[(&str, u32)] = &[
    ("enero", 1),
    ("febrero", 2),
    ("marzo", 3),
    ("abril", 4),
    ("mayo", 5),
    ("junio", 6),
    ("julio", 7),
    ("agosto", 8),
    ("septiembre", 9),
    ("setiembre", 9),
    ("octubre", 10),
    ("noviembre", 11),
    ("diciembre", 12),
];

/// Outcome of date normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedDate {
    /// Canonical `YYYY-MM-DD`
    Iso(String),
    /// Input passed through untouched; not a valid record date
    Unrecognized(String),
}

impl NormalizedDate {
    pub fn is_iso(&self) -> bool {
        matches!(self, Self::Iso(_))
    }

    /// The text either way, for display.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Iso(s) | Self::Unrecognized(s) => s,
        }
    }

    /// The ISO date, or `None` for unrecognized input.
    pub fn into_iso(self) -> Option<String> {
        match self {
            Self::Iso(s) => Some(s),
            Self::Unrecognized(_) => None,
        }
    }
}

/// Current local date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Current local date as `YYYY-MM-DD`.
pub fn today_iso() -> String {
    iso(today())
}

/// Format a date as `YYYY-MM-DD`.
pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Normalize a source date, assuming the current year when it is missing.
pub fn normalize_date(text: &str) -> NormalizedDate {
    normalize_date_in_year(text, today().year())
}

/// Normalize a source date, using `year` for day + month-name input.
///
/// The year is never rolled forward: `"10 febrero"` read in late December
/// still yields `{year}-02-10`.
pub fn normalize_date_in_year(text: &str, year: i32) -> NormalizedDate {
    let trimmed = text.trim();

    if let Some(caps) = ISO_DATE.captures(trimmed) {
        return from_parts(trimmed, &caps[1], &caps[2], &caps[3]);
    }

    if let Some(caps) = DMY_DATE.captures(trimmed) {
        return from_parts(trimmed, &caps[3], &caps[2], &caps[1]);
    }

    if let Some(caps) = DAY_MONTH_NAME.captures(trimmed) {
        let name = caps[2].to_lowercase();
        if let Some(&(_, month)) = MONTHS.iter().find(|(m, _)| *m == name) {
            let date = caps[1]
                .parse()
                .ok()
                .and_then(|day| NaiveDate::from_ymd_opt(year, month, day));
            if let Some(date) = date {
                return NormalizedDate::Iso(iso(date));
            }
        }
    }

    NormalizedDate::Unrecognized(text.to_string())
}

fn from_parts(original: &str, year: &str, month: &str, day: &str) -> NormalizedDate {
    let date = match (year.parse(), month.parse(), day.parse()) {
        (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d),
        _ => None,
    };
    match date {
        Some(date) => NormalizedDate::Iso(iso(date)),
        None => NormalizedDate::Unrecognized(original.to_string()),
    }
}

/// Spanish "DD month" label for a date, e.g. `05 febrero`.
pub fn spanish_label(date: NaiveDate) -> String {
    let month = MONTHS
        .iter()
        .find(|(name, m)| *m == date.month() && *name != "setiembre")
        .map(|(name, _)| *name)
        .unwrap_or_default();
    format!("{:02} {}", date.day(), month)
}

/// Parse a showtime like `20:30`, `9:05` or `20.30` into `HH:MM`.
pub fn parse_showtime(text: &str) -> Option<String> {
    let caps = SHOWTIME.captures(text.trim())?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    (hour < 24 && minute < 60).then(|| format!("{hour:02}:{minute:02}"))
}
