//! Date normalization and comparison
//!
//! Source data reaches the tracker in three shapes: spreadsheet serial
//! numbers, ISO strings, and free-form text. Each raw value is classified
//! once at ingestion into a [`DateInput`] variant and normalized to the
//! canonical display form (`DD-MM-YYYY`); nothing downstream re-sniffs the
//! representation. Normalization never fails: the worst case returns the
//! original string unchanged.

use chrono::{Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use kci_tracker_common::{split_month_key, DISPLAY_DATE_FORMAT};

use crate::error::{Result, TrackerError};

/// Spreadsheet serial epoch: 1899-12-30
const SHEET_EPOCH_YMD: (i32, u32, u32) = (1899, 12, 30);

/// Milliseconds per day, used to truncate fractional serials
const MS_PER_DAY: i64 = 86_400_000;

/// Text formats attempted by generic date parsing, in order
const TEXT_DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%m/%d/%Y", "%B %e, %Y", "%e %B %Y"];

/// A raw date value classified once at ingestion
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    /// Missing value
    Empty,
    /// Spreadsheet day count since 1899-12-30
    Serial(f64),
    /// Anything else, resolved by string parsing
    Text(String),
}

impl DateInput {
    /// Classify a raw cell value
    ///
    /// Numeric strings without a hyphen are serials; everything else is text.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        if !trimmed.contains('-') {
            if let Ok(serial) = trimmed.parse::<f64>() {
                return Self::Serial(serial);
            }
        }
        Self::Text(trimmed.to_string())
    }
}

/// Spreadsheet serial epoch as a `NaiveDate`
fn sheet_epoch() -> NaiveDate {
    let (y, m, d) = SHEET_EPOCH_YMD;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Convert a spreadsheet serial to a date, truncating to whole days
/// via millisecond rounding
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let ms = (serial * MS_PER_DAY as f64).round();
    if ms.abs() > i64::MAX as f64 {
        return None;
    }
    let days = (ms as i64).div_euclid(MS_PER_DAY);
    sheet_epoch().checked_add_signed(Duration::days(days))
}

/// Render a date in the canonical display form
#[must_use]
pub fn format_display(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

/// Parse a canonical display date, `None` for anything else
#[must_use]
pub fn parse_display(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DISPLAY_DATE_FORMAT).ok()
}

/// True when the string starts with a `YYYY-MM-DD` prefix
fn has_iso_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit)
}

/// Normalize a classified date value to the display form
///
/// `Empty` becomes an empty string. Serials are anchored at the spreadsheet
/// epoch. Text with an ISO prefix is reordered to day-month-year; other text
/// is run through generic parsing and reformatted on success. Unparseable
/// text comes back unchanged; malformed passthrough is deliberate.
#[must_use]
pub fn normalize(input: &DateInput) -> String {
    match input {
        DateInput::Empty => String::new(),
        DateInput::Serial(serial) => match serial_to_date(*serial) {
            Some(date) => format_display(date),
            None => serial.to_string(),
        },
        DateInput::Text(text) => normalize_text(text),
    }
}

/// Classify and normalize a raw value in one step
#[must_use]
pub fn normalize_raw(raw: &str) -> String {
    normalize(&DateInput::from_raw(raw))
}

fn normalize_text(text: &str) -> String {
    if has_iso_prefix(text) {
        if let Ok(date) = NaiveDate::parse_from_str(&text[..10], "%Y-%m-%d") {
            return format_display(date);
        }
    }
    for format in TEXT_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return format_display(date);
        }
    }
    text.to_string()
}

/// Reconstruct a sortable year-month-day key from a display date
///
/// Empty input yields an empty key. A three-part value is reversed
/// positionally, so even out-of-calendar values keep a stable ordering;
/// anything else passes through for the same reason.
#[must_use]
pub fn sortable_key(display: &str) -> String {
    let trimmed = display.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let parts: Vec<&str> = trimmed.split('-').collect();
    if parts.len() == 3 {
        format!("{}-{}-{}", parts[2], parts[1], parts[0])
    } else {
        trimmed.to_string()
    }
}

/// Compare two display dates by their sortable keys
///
/// An empty operand sorts before a non-empty one; two empties are equal.
#[must_use]
pub fn compare(a: &str, b: &str) -> std::cmp::Ordering {
    sortable_key(a).cmp(&sortable_key(b))
}

/// Number of days in a `YYYY-MM` month
///
/// # Errors
///
/// Returns `TrackerError::InvalidMonth` for anything that is not a valid
/// month key.
pub fn days_in_month(month_key: &str) -> Result<u32> {
    let (year, month) = split_month_key(month_key).ok_or_else(|| TrackerError::InvalidMonth {
        month: month_key.to_string(),
    })?;
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        TrackerError::InvalidMonth {
            month: month_key.to_string(),
        }
    })?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| TrackerError::InvalidMonth {
        month: month_key.to_string(),
    })?;
    #[allow(clippy::cast_sign_loss)]
    Ok((next - first).num_days() as u32)
}

/// Team-local "today" at a given instant
///
/// Before the team's reset hour in its timezone the calendar day rolls back
/// one; this shifts both the current report document and the due predicate.
#[must_use]
pub fn local_today_at(instant: chrono::DateTime<Utc>, tz: Tz, reset_hour: u8) -> NaiveDate {
    let local = instant.with_timezone(&tz);
    let date = local.date_naive();
    if local.hour() < u32::from(reset_hour) {
        date.pred_opt().unwrap_or(date)
    } else {
        date
    }
}

/// Team-local "today" right now
#[must_use]
pub fn local_today(tz: Tz, reset_hour: u8) -> NaiveDate {
    local_today_at(Utc::now(), tz, reset_hour)
}
