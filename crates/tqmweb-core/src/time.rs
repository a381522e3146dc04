//! Date window used to filter cached orders per request

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive order-date filter; a missing bound is open
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// Build from raw `from`/`to` query values; blank or unparsable values are ignored
    pub fn from_query(from: Option<&str>, to: Option<&str>) -> Self {
        Self {
            from: from.and_then(parse_iso_date),
            to: to.and_then(parse_iso_date),
        }
    }

    /// Check if a date falls inside the window
    pub fn contains(&self, date: &NaiveDate) -> bool {
        match (self.from, self.to) {
            (None, None) => true,
            (Some(s), None) => *date >= s,
            (None, Some(e)) => *date <= e,
            (Some(s), Some(e)) => *date >= s && *date <= e,
        }
    }

    /// Human-readable description of the window
    pub fn description(&self) -> String {
        match (self.from, self.to) {
            (None, None) => "All orders".to_string(),
            (Some(s), None) => format!("From {}", s),
            (None, Some(e)) => format!("Up to {}", e),
            (Some(s), Some(e)) => format!("{} to {}", s, e),
        }
    }

    /// `YYYY-MM-DD` or empty, for echoing back into date inputs
    pub fn from_value(&self) -> String {
        self.from.map(|d| d.to_string()).unwrap_or_default()
    }

    pub fn to_value(&self) -> String {
        self.to.map(|d| d.to_string()).unwrap_or_default()
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_contains_inclusive() {
        let window = DateWindow::new(Some(date(2024, 1, 1)), Some(date(2024, 1, 31)));
        assert!(window.contains(&date(2024, 1, 1)));
        assert!(window.contains(&date(2024, 1, 31)));
        assert!(!window.contains(&date(2023, 12, 31)));
        assert!(!window.contains(&date(2024, 2, 1)));
    }

    #[test]
    fn test_open_bounds() {
        assert!(DateWindow::default().contains(&date(1999, 1, 1)));
        let window = DateWindow::new(Some(date(2024, 1, 1)), None);
        assert!(window.contains(&date(2030, 1, 1)));
        assert!(!window.contains(&date(2023, 1, 1)));
    }

    #[test]
    fn test_from_query_ignores_garbage() {
        let window = DateWindow::from_query(Some("2024-01-05"), Some("next week"));
        assert_eq!(window.from, Some(date(2024, 1, 5)));
        assert_eq!(window.to, None);
        assert_eq!(DateWindow::from_query(Some(""), None), DateWindow::default());
    }

    #[test]
    fn test_description_and_values() {
        let window = DateWindow::new(Some(date(2024, 1, 1)), Some(date(2024, 12, 31)));
        assert_eq!(window.description(), "2024-01-01 to 2024-12-31");
        assert_eq!(window.from_value(), "2024-01-01");
        assert_eq!(DateWindow::default().to_value(), "");
    }
}
