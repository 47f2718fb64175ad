// src/models/report.rs

//! Run output: merged showings plus per-source diagnostics.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Showing;

/// A source that failed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceError {
    pub source: String,
    pub message: String,
}

impl SourceError {
    pub fn new(source: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            source: source.into(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.message)
    }
}

/// JSON report emitted by `--json`.
///
/// Field names and order are part of the output contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Run date (`YYYY-MM-DD`)
    pub date: String,
    pub generated_at: DateTime<Utc>,
    pub total_films: usize,
    pub films: Vec<Showing>,
    pub errors: Vec<String>,
}

impl Report {
    pub fn new(date: impl Into<String>, films: Vec<Showing>, errors: &[SourceError]) -> Self {
        Self {
            date: date.into(),
            generated_at: Utc::now(),
            total_films: films.len(),
            films,
            errors: errors.iter().map(ToString::to_string).collect(),
        }
    }
}
