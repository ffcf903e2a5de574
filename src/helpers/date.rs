//! Date helper functions

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt::Write;

use crate::content::parse_date_string;

/// Format a post's date string for display.
///
/// Unparseable dates are shown as written; an invalid `format` falls back to
/// ISO `YYYY-MM-DD`.
pub fn format_post_date(date: &str, format: &str) -> String {
    match parse_date_string(date) {
        Some(dt) => format_datetime(&dt, format),
        None => date.to_string(),
    }
}

/// Format with a chrono pattern without panicking on bad specifiers
pub fn format_datetime(date: &NaiveDateTime, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_err() {
        tracing::warn!("Invalid date format {:?}, using %Y-%m-%d", format);
        return date.format("%Y-%m-%d").to_string();
    }
    out
}

/// Machine-readable value for a `<time datetime>` attribute
pub fn date_xml(date: &str) -> Option<String> {
    parse_date_string(date).map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// Heading for a `"<year>-<month>"` archive group, e.g. "March 2024"
pub fn month_label(key: &str) -> String {
    key.split_once('-')
        .and_then(|(year, month)| {
            let year = year.parse::<i32>().ok()?;
            let month = month.parse::<u32>().ok()?;
            NaiveDate::from_ymd_opt(year, month, 1)
        })
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_else(|| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_post_date() {
        assert_eq!(format_post_date("2024-03-01", "%B %-d, %Y"), "March 1, 2024");
        assert_eq!(format_post_date("2024-03-01 10:30", "%Y/%m/%d %H:%M"), "2024/03/01 10:30");
        assert_eq!(format_post_date("soon", "%Y"), "soon");
        assert_eq!(format_post_date("", "%Y"), "");
    }

    #[test]
    fn test_invalid_format_falls_back() {
        assert_eq!(format_post_date("2024-03-01", "%Q"), "2024-03-01");
    }

    #[test]
    fn test_date_xml() {
        assert_eq!(date_xml("2024-03-01").as_deref(), Some("2024-03-01T00:00:00"));
        assert_eq!(date_xml("nope"), None);
    }

    #[test]
    fn test_month_label() {
        assert_eq!(month_label("2024-03"), "March 2024");
        assert_eq!(month_label("2024-3"), "March 2024");
        assert_eq!(month_label("drafts-misc"), "drafts-misc");
    }
}
