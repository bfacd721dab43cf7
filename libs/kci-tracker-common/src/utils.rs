//! Utility functions shared across the KCI Tracker workspace

use chrono::{Datelike, NaiveDate};

/// Check whether a string is empty or whitespace-only
#[must_use]
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Truncate a string to a maximum length, appending an ellipsis when cut
#[must_use]
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}

/// Split a `YYYY-MM` month key into year and month numbers
#[must_use]
pub fn split_month_key(month_key: &str) -> Option<(i32, u32)> {
    let (year, month) = month_key.split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    if (1..=12).contains(&month) {
        Some((year, month))
    } else {
        None
    }
}

/// Build the ISO date key (`YYYY-MM-DD`) for a day within a month key
#[must_use]
pub fn day_key(month_key: &str, day: u32) -> String {
    format!("{month_key}-{day:02}")
}

/// Month key (`YYYY-MM`) of a calendar date
#[must_use]
pub fn month_key_of(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_blank_empty() {
        assert!(is_blank(""));
    }

    #[test]
    fn test_is_blank_whitespace() {
        assert!(is_blank("   \t"));
    }

    #[test]
    fn test_is_blank_non_empty() {
        assert!(!is_blank("Closed"));
    }

    #[test]
    fn test_truncate_string_short() {
        assert_eq!(truncate_string("short", 10), "short");
    }

    #[test]
    fn test_truncate_string_long() {
        assert_eq!(truncate_string("hello world", 5), "he...");
    }

    #[test]
    fn test_split_month_key_valid() {
        assert_eq!(split_month_key("2024-02"), Some((2024, 2)));
    }

    #[test]
    fn test_split_month_key_invalid_month() {
        assert_eq!(split_month_key("2024-13"), None);
    }

    #[test]
    fn test_split_month_key_garbage() {
        assert_eq!(split_month_key("not-a-month"), None);
        assert_eq!(split_month_key("2024"), None);
    }

    #[test]
    fn test_day_key_padding() {
        assert_eq!(day_key("2024-02", 3), "2024-02-03");
        assert_eq!(day_key("2024-02", 29), "2024-02-29");
    }

    #[test]
    fn test_month_key_of() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(month_key_of(date), "2024-02");
    }
}
