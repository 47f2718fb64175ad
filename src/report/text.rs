// src/report/text.rs

//! Console listing grouped by cinema and date.

use std::fmt;

use crate::models::{Report, Showing};

const RULE_WIDTH: usize = 66;

/// Human-readable view of a [`Report`].
pub struct TextReport<'a> {
    report: &'a Report,
    /// Print a heading per date
    all_dates: bool,
}

impl<'a> TextReport<'a> {
    pub fn new(report: &'a Report, all_dates: bool) -> Self {
        Self { report, all_dates }
    }

    fn write_cinema(&self, f: &mut fmt::Formatter<'_>, films: &[Showing]) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "  {}", films[0].cinema)?;
        writeln!(f, "  {}", "─".repeat(60))?;

        for day in films.chunk_by(|a, b| a.date == b.date) {
            if self.all_dates {
                writeln!(f, "    [{}]", day[0].date.as_deref().unwrap_or("unknown"))?;
            }
            for film in day {
                writeln!(f, "    {}", film.title)?;
                write!(f, "       {} | {}", film.language, film.format)?;
                if let Some(runtime) = &film.runtime {
                    write!(f, " | {runtime}")?;
                }
                writeln!(f)?;
                writeln!(f, "       {}", film.times.join(", "))?;
            }
        }

        if let Some(url) = films.iter().find_map(|s| s.url.as_deref()) {
            writeln!(f, "    -> {url}")?;
        }
        Ok(())
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "═".repeat(RULE_WIDTH);
        writeln!(f)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "  VOSE / VO films in Gran Canaria ({})", self.report.date)?;
        writeln!(f, "{rule}")?;

        if self.report.films.is_empty() {
            writeln!(f)?;
            if self.all_dates {
                writeln!(f, "  No VOSE/VO films found.")?;
            } else {
                writeln!(f, "  No VOSE/VO films found for today.")?;
                writeln!(f, "  Try with --all-dates to see upcoming showings.")?;
            }
        } else {
            for films in self.report.films.chunk_by(|a, b| a.cinema == b.cinema) {
                self.write_cinema(f, films)?;
            }
        }

        if !self.report.errors.is_empty() {
            writeln!(f)?;
            writeln!(f, "  Errors:")?;
            for err in &self.report.errors {
                writeln!(f, "    * {err}")?;
            }
        }

        writeln!(f)?;
        write!(f, "{rule}")
    }
}
