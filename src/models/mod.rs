// src/models/mod.rs

//! Domain models for the showing finder.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod report;
mod selectors;
mod showing;

// Re-export all public types
pub use config::{
    ArtesieteConfig, BrowserConfig, CalendarConfig, Config, HeadlessTarget, HtmlSourceConfig,
    HttpConfig, YelmoConfig,
};
pub use report::{Report, SourceError};
pub use selectors::{CardSelectors, CompiledSelectors};
pub use showing::{Showing, ShowingCollector};

#[cfg(test)]
pub(crate) use showing::sample_showing;
