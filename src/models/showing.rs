// src/models/showing.rs

//! Canonical showing record and the per-pass collector that merges sessions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One film at one cinema on one date, with all of its VOSE showtimes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Showing {
    /// Venue display name
    pub cinema: String,

    /// Film title as the source presents it
    pub title: String,

    /// Language descriptor kept for display
    pub language: String,

    /// Format descriptor kept for display (comma-joined when merged)
    pub format: String,

    /// ISO calendar date, `None` when the source date could not be read
    pub date: Option<String>,

    /// Sorted, de-duplicated `HH:MM` times
    pub times: Vec<String>,

    pub rating: Option<String>,
    pub runtime: Option<String>,
    pub poster: Option<String>,
    pub url: Option<String>,

    /// Adapter tag, e.g. `yelmo-api`
    pub source: String,
}

impl Showing {
    /// Key used by the final cross-source dedupe.
    pub fn dedupe_key(&self) -> (String, String, String, String) {
        (
            self.cinema.clone(),
            self.title.clone(),
            self.date.clone().unwrap_or_default(),
            self.times.join(","),
        )
    }

    /// First showtime, or `""` when there is none.
    pub fn first_time(&self) -> &str {
        self.times.first().map(String::as_str).unwrap_or("")
    }

    /// Add a time keeping the list sorted and free of duplicates.
    pub fn add_time(&mut self, time: &str) {
        if let Err(pos) = self.times.binary_search_by(|t| t.as_str().cmp(time)) {
            self.times.insert(pos, time.to_string());
        }
    }

    /// Append a format label unless the same whole label is already present.
    pub fn add_format(&mut self, format: &str) {
        let format = format.trim();
        if format.is_empty() || self.format.split(", ").any(|label| label == format) {
            return;
        }
        if self.format.is_empty() {
            self.format = format.to_string();
        } else {
            self.format.push_str(", ");
            self.format.push_str(format);
        }
    }
}

/// Accumulates sessions within one adapter pass, merging repeats of the
/// same (cinema, title, date) into a single record.
#[derive(Debug, Default)]
pub struct ShowingCollector {
    showings: Vec<Showing>,
    index: HashMap<(String, String, Option<String>), usize>,
}

impl ShowingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a session into the collection.
    ///
    /// The first session for a key fixes the descriptive metadata; later ones
    /// only contribute times and format labels.
    pub fn add(&mut self, mut session: Showing) {
        let key = (
            session.cinema.clone(),
            session.title.clone(),
            session.date.clone(),
        );

        match self.index.get(&key) {
            Some(&pos) => {
                let existing = &mut self.showings[pos];
                for time in &session.times {
                    existing.add_time(time);
                }
                existing.add_format(&session.format);
            }
            None => {
                let times = std::mem::take(&mut session.times);
                let mut fresh = session;
                for time in &times {
                    fresh.add_time(time);
                }
                self.index.insert(key, self.showings.len());
                self.showings.push(fresh);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.showings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.showings.is_empty()
    }

    /// Finish the pass. Records without any showtime are dropped.
    pub fn finish(self) -> Vec<Showing> {
        self.showings
            .into_iter()
            .filter(|s| !s.times.is_empty())
            .collect()
    }
}

#[cfg(test)]
pub(crate) fn sample_showing(cinema: &str, title: &str, date: &str, times: &[&str]) -> Showing {
    Showing {
        cinema: cinema.to_string(),
        title: title.to_string(),
        language: "VOSE".to_string(),
        format: "2D".to_string(),
        date: Some(date.to_string()),
        times: times.iter().map(|t| t.to_string()).collect(),
        rating: None,
        runtime: None,
        poster: None,
        url: None,
        source: "test".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_same_key_combines_times() {
        let mut collector = ShowingCollector::new();
        collector.add(sample_showing("A", "Film", "2026-02-13", &["22:45"]));
        collector.add(sample_showing("A", "Film", "2026-02-13", &["20:30", "22:45"]));

        let merged = collector.finish();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].times, vec!["20:30", "22:45"]);
    }

    #[test]
    fn test_different_dates_stay_apart() {
        let mut collector = ShowingCollector::new();
        collector.add(sample_showing("A", "Film", "2026-02-13", &["20:30"]));
        collector.add(sample_showing("A", "Film", "2026-02-14", &["20:30"]));
        assert_eq!(collector.len(), 2);
    }

    #[test]
    fn test_format_labels_are_joined_once() {
        let mut collector = ShowingCollector::new();
        let mut first = sample_showing("A", "Film", "2026-02-13", &["18:00"]);
        first.format = "VOSE".into();
        let mut second = first.clone();
        second.format = "VOSE 3D".into();
        let third = first.clone();

        collector.add(first);
        collector.add(second);
        collector.add(third);

        let merged = collector.finish();
        assert_eq!(merged[0].format, "VOSE, VOSE 3D");
        assert_eq!(merged[0].times, vec!["18:00"]);
    }

    #[test]
    fn test_finish_drops_records_without_times() {
        let mut collector = ShowingCollector::new();
        collector.add(sample_showing("A", "Film", "2026-02-13", &[]));
        assert!(!collector.is_empty());
        assert!(collector.finish().is_empty());
    }

    #[test]
    fn test_duplicate_times_in_one_session_collapse() {
        let mut collector = ShowingCollector::new();
        collector.add(sample_showing("A", "Film", "2026-02-13", &["20:30", "20:30"]));
        assert_eq!(collector.finish()[0].times, vec!["20:30"]);
    }

    #[test]
    fn test_format_label_inside_another_is_kept() {
        let mut showing = sample_showing("A", "Film", "2026-02-13", &["20:30"]);
        showing.format = "IMAX 2D".into();
        showing.add_format("2D");
        showing.add_format("IMAX 2D");
        assert_eq!(showing.format, "IMAX 2D, 2D");
    }
}
