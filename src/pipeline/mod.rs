//! Run pipeline: adapters → merge → dedupe → sort → report.
//!
//! - `Aggregator`: Runs every adapter in turn and collects failures
//! - `run_pipeline`: One full run producing a [`Report`](crate::models::Report)

pub mod aggregate;

pub use aggregate::{AggregateOutput, Aggregator, dedupe, run_pipeline, sort_showings};
