//! Report emitters.
//!
//! - JSON for `--json`
//! - Console text (default)
//! - Static month-grid calendar page for `--calendar`

mod calendar;
mod text;

pub use calendar::{render_calendar, write_calendar};
pub use text::TextReport;

use crate::error::Result;
use crate::models::Report;

/// Pretty-printed JSON report.
pub fn to_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_showing;

    #[test]
    fn test_to_json_uses_report_field_names() {
        let report = Report::new(
            "2026-02-13",
            vec![sample_showing("A", "Film", "2026-02-13", &["20:30"])],
            &[],
        );
        let json = to_json(&report).unwrap();
        assert!(json.contains("\"totalFilms\": 1"));
        assert!(json.contains("\"generatedAt\""));
        assert!(json.contains("\"errors\": []"));
    }
}
