//! KCI Tracker Core - Case filtering, report aggregation, and local caching
//!
//! This library implements the data side of the KCI case tracker: a pure
//! filter engine re-run over every pushed collection snapshot, a month-level
//! report aggregator, a persistent read-through cache, and the bulk
//! import/export surface. The hosted document store and authentication are
//! external collaborators behind the [`store::CaseStore`] trait.
//!
//! # Quick Start
//!
//! ```
//! use kci_tracker_core::{apply, Case, CaseFilters, FilterMode};
//! use chrono::NaiveDate;
//!
//! let cases = vec![Case {
//!     id: "CAS-1001".to_string(),
//!     customer: "Maria Santos".to_string(),
//!     follow_date: "01-06-2024".to_string(),
//!     ..Case::default()
//! }];
//! let filters = CaseFilters {
//!     mode: FilterMode::Due,
//!     ..CaseFilters::default()
//! };
//! let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
//! let outcome = apply(&cases, &filters, today);
//! assert_eq!(outcome.visible.len(), 1);
//! assert_eq!(outcome.due_count, 1);
//! ```
//!
//! # Crate Features
//!
//! - `test-utils`: Enable test fixtures (for testing only)

pub mod bulk;
pub mod cache;
pub mod config;
pub mod dates;
pub mod error;
pub mod filter;
pub mod models;
pub mod report;
pub mod store;
pub mod sync;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use bulk::{
    backup_to_json, export_backup, export_csv, parse_spreadsheet, reconcile, restore_backup,
    validate_backup, BackupData, ImportSummary, RestoreSummary,
};
pub use cache::{LocalCache, LocalCacheConfig, LocalCacheStats};
pub use config::TrackerConfig;
pub use dates::{
    compare, days_in_month, format_display, local_today, local_today_at, normalize, normalize_raw,
    parse_display, sortable_key, DateInput,
};
pub use error::{Result, TrackerError};
pub use filter::{apply, is_due, FilterBuilder, FilterOutcome};
pub use models::{
    Case, CaseFilters, CaseStatus, CategoryFilter, CategoryKey, CollectionSnapshot, DailyReport,
    FilterMode, MetricKind, ReportCategory, SortOrder, UpdateCaseRequest,
};
pub use report::{
    current_month_key, current_report_day, current_report_key_at, distribution, month_series,
    CategorySeries, DistributionTable, MonthSeries,
};
pub use store::{CaseStore, MemoryStore, ReportReader};
pub use sync::{TrackerController, TrackerState, ViewSink};

/// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, Utc};
pub use chrono_tz::Tz;
