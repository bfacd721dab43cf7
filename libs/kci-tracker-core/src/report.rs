//! Report aggregation
//!
//! Turns a month's worth of per-day report documents into per-category
//! series for tabular and chart rendering, and cross-tabulates the live
//! case collection by resolution code and age bucket.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use kci_tracker_common::{day_key, month_key_of, AGE_BUCKETS, TRACKED_RESOLUTIONS};

use crate::dates::{days_in_month, local_today_at};
use crate::error::Result;
use crate::models::{Case, DailyReport, MetricKind, ReportCategory};

/// One category's values for a month, one entry per calendar day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySeries {
    pub category: ReportCategory,
    pub values: Vec<u32>,
}

/// Per-category month series for a single metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthSeries {
    /// `YYYY-MM` month key
    pub month: String,
    /// Metric the series was extracted for
    pub metric: MetricKind,
    /// One series per report category, in [`ReportCategory::ALL`] order
    pub series: Vec<CategorySeries>,
}

impl MonthSeries {
    /// Series labels in order
    #[must_use]
    pub fn labels(&self) -> Vec<&'static str> {
        self.series.iter().map(|s| s.category.label()).collect()
    }

    /// Number of days covered
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.first().map_or(0, |s| s.values.len())
    }

    /// True when the month resolved to zero days (never happens for a
    /// valid month key)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Chart Y-axis scale: the maximum value across all series, floored at 1
    #[must_use]
    pub fn chart_scale(&self) -> u32 {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .max()
            .unwrap_or(0)
            .max(1)
    }
}

/// Build the per-day series for one metric across a month
///
/// Days with no stored document contribute an all-zero record, so every
/// series always spans the month's actual length.
///
/// # Errors
///
/// Returns `TrackerError::InvalidMonth` for a malformed month key.
pub fn month_series(
    docs: &HashMap<String, DailyReport>,
    month_key: &str,
    metric: MetricKind,
) -> Result<MonthSeries> {
    let days = days_in_month(month_key)?;
    let series = ReportCategory::ALL
        .iter()
        .map(|&category| {
            let values = (1..=days)
                .map(|day| {
                    let doc = docs.get(&day_key(month_key, day)).copied().unwrap_or_default();
                    doc.metric(metric, category)
                })
                .collect();
            CategorySeries { category, values }
        })
        .collect();

    Ok(MonthSeries {
        month: month_key.to_string(),
        metric,
        series,
    })
}

/// Cross-tabulation of live cases by resolution code and age bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionTable {
    /// Tracked resolution-code categories, row order
    pub resolutions: Vec<&'static str>,
    /// Tracked age buckets, column order
    pub buckets: Vec<&'static str>,
    /// `cells[row][col]`: cases matching both dimensions exactly
    pub cells: Vec<Vec<usize>>,
    /// Row sums: cases per tracked resolution across tracked buckets
    pub resolution_totals: Vec<usize>,
    /// Per-bucket counts regardless of resolution code
    pub bucket_totals: Vec<usize>,
    /// Cases with any tracked age bucket regardless of resolution code
    pub grand_total: usize,
}

/// Count live cases into the fixed resolution-by-age grid
///
/// Matching is string-trimmed equality on both dimensions. The totals row
/// counts every case in a tracked bucket, including cases whose resolution
/// code is outside the tracked set.
#[must_use]
pub fn distribution(cases: &[Case]) -> DistributionTable {
    let resolutions: Vec<&'static str> = TRACKED_RESOLUTIONS.to_vec();
    let buckets: Vec<&'static str> = AGE_BUCKETS.to_vec();

    let cells: Vec<Vec<usize>> = resolutions
        .iter()
        .map(|resolution| {
            buckets
                .iter()
                .map(|bucket| {
                    cases
                        .iter()
                        .filter(|case| {
                            case.resolution_code.trim() == *resolution
                                && case.age_bucket.trim() == *bucket
                        })
                        .count()
                })
                .collect()
        })
        .collect();

    let resolution_totals: Vec<usize> = cells.iter().map(|row| row.iter().sum()).collect();

    let bucket_totals: Vec<usize> = buckets
        .iter()
        .map(|bucket| {
            cases
                .iter()
                .filter(|case| case.age_bucket.trim() == *bucket)
                .count()
        })
        .collect();

    let grand_total = bucket_totals.iter().sum();

    DistributionTable {
        resolutions,
        buckets,
        cells,
        resolution_totals,
        bucket_totals,
        grand_total,
    }
}

/// Team-local report day at a given instant, as the ISO document key
#[must_use]
pub fn current_report_key_at(instant: DateTime<Utc>, tz: Tz, reset_hour: u8) -> String {
    local_today_at(instant, tz, reset_hour)
        .format("%Y-%m-%d")
        .to_string()
}

/// Team-local report day right now
#[must_use]
pub fn current_report_day(tz: Tz, reset_hour: u8) -> NaiveDate {
    local_today_at(Utc::now(), tz, reset_hour)
}

/// Team-local current month key right now
#[must_use]
pub fn current_month_key(tz: Tz, reset_hour: u8) -> String {
    month_key_of(current_report_day(tz, reset_hour))
}
