// src/pipeline/aggregate.rs

//! Source aggregation.

use std::collections::HashSet;

use crate::models::{Config, Report, Showing, SourceError};
use crate::services::{FetchContext, RenderMode, SourceAdapter, default_adapters};

/// Merged output of one run.
#[derive(Debug, Default)]
pub struct AggregateOutput {
    pub showings: Vec<Showing>,
    pub errors: Vec<SourceError>,
}

impl AggregateOutput {
    pub fn into_report(self, date: impl Into<String>) -> Report {
        Report::new(date, self.showings, &self.errors)
    }
}

/// Runs a fixed list of adapters one after another.
pub struct Aggregator {
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl Aggregator {
    pub fn new(adapters: Vec<Box<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    pub fn from_config(config: &Config, render: RenderMode) -> Self {
        Self::new(default_adapters(config, render))
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Run every adapter; a failing adapter contributes one error and no records.
    pub async fn run(&self, ctx: &FetchContext) -> AggregateOutput {
        let mut showings = Vec::new();
        let mut errors = Vec::new();

        for adapter in &self.adapters {
            match adapter.fetch(ctx).await {
                Ok(found) => {
                    log::debug!("{}: {} records", adapter.name(), found.len());
                    showings.extend(found);
                }
                Err(e) => {
                    log::warn!("{} failed: {}", adapter.name(), e);
                    errors.push(SourceError::new(adapter.name(), e));
                }
            }
        }

        showings.retain(|s| !s.times.is_empty());
        let mut showings = dedupe(showings);
        sort_showings(&mut showings);

        log::info!(
            "Aggregated {} showings from {} sources ({} failed)",
            showings.len(),
            self.adapters.len(),
            errors.len()
        );

        AggregateOutput { showings, errors }
    }
}

/// Keep the first record for each (cinema, title, date, times).
pub fn dedupe(showings: Vec<Showing>) -> Vec<Showing> {
    let mut seen = HashSet::new();
    showings
        .into_iter()
        .filter(|s| seen.insert(s.dedupe_key()))
        .collect()
}

/// Stable sort by cinema, date, then first showtime.
pub fn sort_showings(showings: &mut [Showing]) {
    showings.sort_by(|a, b| {
        a.cinema
            .cmp(&b.cinema)
            .then_with(|| {
                a.date
                    .as_deref()
                    .unwrap_or("")
                    .cmp(b.date.as_deref().unwrap_or(""))
            })
            .then_with(|| a.first_time().cmp(b.first_time()))
    });
}

/// One full run: every configured source, merged into a report.
pub async fn run_pipeline(config: &Config, ctx: &FetchContext, render: RenderMode) -> Report {
    Aggregator::from_config(config, render)
        .run(ctx)
        .await
        .into_report(ctx.today_iso())
}
