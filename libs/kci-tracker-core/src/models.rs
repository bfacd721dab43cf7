//! Data models for KCI Tracker entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Case status enumeration
///
/// The closed set of statuses a case may carry after normalization through
/// the update path. The stored field on [`Case`] remains a string because
/// bulk import writes rows verbatim and may bypass this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStatus {
    #[serde(rename = "Closed")]
    Closed,
    #[serde(rename = "NCM 1")]
    Ncm1,
    #[serde(rename = "NCM 2")]
    Ncm2,
    #[serde(rename = "PNS")]
    Pns,
    #[serde(rename = "Service Pending")]
    ServicePending,
    #[serde(rename = "Monitoring")]
    Monitoring,
}

impl CaseStatus {
    /// All statuses in display order
    pub const ALL: [Self; 6] = [
        Self::Closed,
        Self::Ncm1,
        Self::Ncm2,
        Self::Pns,
        Self::ServicePending,
        Self::Monitoring,
    ];

    /// Display string for this status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "Closed",
            Self::Ncm1 => "NCM 1",
            Self::Ncm2 => "NCM 2",
            Self::Pns => "PNS",
            Self::ServicePending => "Service Pending",
            Self::Monitoring => "Monitoring",
        }
    }

    /// Parse a display string into a status, `None` for anything outside the set
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s.trim())
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked support case
///
/// Dates are persisted in the canonical display form (`DD-MM-YYYY`) or empty;
/// raw source values (spreadsheet serials, ISO timestamps) are normalized once
/// at ingestion. Field names on the wire follow the document store's camelCase
/// convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Case {
    /// Stable identifier, used as the storage key
    pub id: String,
    /// Customer name
    pub customer: String,
    /// Customer country
    pub country: String,
    /// Case resolution code
    pub resolution_code: String,
    /// Owning user
    pub owner: String,
    /// CA group dimension
    pub ca_group: String,
    /// Team lead dimension
    pub tl: String,
    /// SBD dimension
    pub sbd: String,
    /// RFC status for onsite work
    pub rfc_onsite: String,
    /// RFC status for CSR work
    pub rfc_csr: String,
    /// RFC status for bench work
    pub rfc_bench: String,
    /// Age bucket, one of the tracked bucket labels (or free text from import)
    pub age_bucket: String,
    /// Free-text notes
    pub notes: String,
    /// Follow-up flag
    pub flagged: bool,
    /// Status string; an enumerated value or empty after UI normalization
    pub status: String,
    /// Follow-up date (display form or empty)
    pub follow_date: String,
    /// Creation date (display form or empty)
    pub created_date: String,
    /// Last-actioned date (display form or empty)
    pub last_action_date: String,
    /// Identity of the last updater
    pub updated_by: String,
}

impl Case {
    /// Status parsed against the closed enumeration, `None` when empty or
    /// when bulk import left an arbitrary string behind
    #[must_use]
    pub fn status_enum(&self) -> Option<CaseStatus> {
        CaseStatus::parse(&self.status)
    }

    /// Whether the status is empty or whitespace-only
    #[must_use]
    pub fn is_unupdated(&self) -> bool {
        self.status.trim().is_empty()
    }

    /// Value of a categorical dimension
    #[must_use]
    pub fn category_value(&self, key: CategoryKey) -> &str {
        match key {
            CategoryKey::CaGroup => &self.ca_group,
            CategoryKey::Tl => &self.tl,
            CategoryKey::Sbd => &self.sbd,
            CategoryKey::RfcOnsite => &self.rfc_onsite,
            CategoryKey::RfcCsr => &self.rfc_csr,
            CategoryKey::RfcBench => &self.rfc_bench,
            CategoryKey::Owner => &self.owner,
            CategoryKey::Country => &self.country,
            CategoryKey::ResolutionCode => &self.resolution_code,
        }
    }
}

/// Metric families in a daily report document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    #[serde(rename = "totalOpen")]
    TotalOpen,
    #[serde(rename = "readyForClosure")]
    ReadyForClosure,
    #[serde(rename = "overdue")]
    Overdue,
}

impl MetricKind {
    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TotalOpen => "Total Open",
            Self::ReadyForClosure => "Ready for Closure",
            Self::Overdue => "Overdue",
        }
    }
}

impl std::str::FromStr for MetricKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "open" | "total-open" | "totalopen" => Ok(Self::TotalOpen),
            "ready" | "ready-for-closure" | "readyforclosure" => Ok(Self::ReadyForClosure),
            "overdue" => Ok(Self::Overdue),
            _ => Err(anyhow::anyhow!("Unsupported metric: {}", s)),
        }
    }
}

/// Report categories, in series order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportCategory {
    Onsite,
    Offsite,
    Csr,
    Total,
}

impl ReportCategory {
    /// All categories in series order
    pub const ALL: [Self; 4] = [Self::Onsite, Self::Offsite, Self::Csr, Self::Total];

    /// Series label; CSR renders as "Parts"
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Onsite => "Onsite",
            Self::Offsite => "Offsite",
            Self::Csr => "Parts",
            Self::Total => "Total",
        }
    }
}

/// One team's aggregate report for a single calendar day
///
/// Keyed in the store by ISO date string. Missing fields default to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyReport {
    pub total_open_onsite: u32,
    pub total_open_offsite: u32,
    pub total_open_csr: u32,
    pub total_open_total: u32,
    pub ready_for_closure_onsite: u32,
    pub ready_for_closure_offsite: u32,
    pub ready_for_closure_csr: u32,
    pub ready_for_closure_total: u32,
    pub overdue_onsite: u32,
    pub overdue_offsite: u32,
    pub overdue_csr: u32,
    pub overdue_total: u32,
}

impl DailyReport {
    /// Look up one cell of the metric-by-category table
    #[must_use]
    pub const fn metric(&self, kind: MetricKind, category: ReportCategory) -> u32 {
        match (kind, category) {
            (MetricKind::TotalOpen, ReportCategory::Onsite) => self.total_open_onsite,
            (MetricKind::TotalOpen, ReportCategory::Offsite) => self.total_open_offsite,
            (MetricKind::TotalOpen, ReportCategory::Csr) => self.total_open_csr,
            (MetricKind::TotalOpen, ReportCategory::Total) => self.total_open_total,
            (MetricKind::ReadyForClosure, ReportCategory::Onsite) => self.ready_for_closure_onsite,
            (MetricKind::ReadyForClosure, ReportCategory::Offsite) => {
                self.ready_for_closure_offsite
            }
            (MetricKind::ReadyForClosure, ReportCategory::Csr) => self.ready_for_closure_csr,
            (MetricKind::ReadyForClosure, ReportCategory::Total) => self.ready_for_closure_total,
            (MetricKind::Overdue, ReportCategory::Onsite) => self.overdue_onsite,
            (MetricKind::Overdue, ReportCategory::Offsite) => self.overdue_offsite,
            (MetricKind::Overdue, ReportCategory::Csr) => self.overdue_csr,
            (MetricKind::Overdue, ReportCategory::Total) => self.overdue_total,
        }
    }
}

/// Mutually exclusive list modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    #[default]
    Normal,
    /// Follow-up date reached and case not closed
    Due,
    /// Flag set
    Flagged,
    /// Customers with more than one remaining case
    Repeating,
    /// Status empty or whitespace-only
    Unupdated,
}

impl std::str::FromStr for FilterMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "due" => Ok(Self::Due),
            "flagged" => Ok(Self::Flagged),
            "repeating" => Ok(Self::Repeating),
            "unupdated" => Ok(Self::Unupdated),
            _ => Err(anyhow::anyhow!("Unsupported filter mode: {}", s)),
        }
    }
}

/// Creation-date sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Categorical facets available for filtering, each independently lockable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CategoryKey {
    CaGroup,
    Tl,
    Sbd,
    RfcOnsite,
    RfcCsr,
    RfcBench,
    Owner,
    Country,
    ResolutionCode,
}

/// Selection state for one categorical facet
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryFilter {
    /// Selected values; empty means the facet is a no-op
    pub selected: BTreeSet<String>,
    /// Locked facets survive a filter reset
    pub locked: bool,
}

/// Transient filter specification for the case list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseFilters {
    /// Case-insensitive free-text search
    pub search: String,
    /// Exact status equality filter
    pub status: Option<CaseStatus>,
    /// Inclusive creation-date lower bound (display form)
    pub created_from: Option<String>,
    /// Inclusive creation-date upper bound (display form)
    pub created_to: Option<String>,
    /// Per-facet selections
    pub categories: BTreeMap<CategoryKey, CategoryFilter>,
    /// Active mode
    pub mode: FilterMode,
    /// Creation-date sort toggle
    pub sort: Option<SortOrder>,
}

impl CaseFilters {
    /// Reset everything except locked categorical facets
    pub fn reset(&mut self) {
        self.search.clear();
        self.status = None;
        self.created_from = None;
        self.created_to = None;
        self.mode = FilterMode::Normal;
        self.sort = None;
        self.categories.retain(|_, facet| facet.locked);
    }
}

/// Case update request covering the three UI mutations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCaseRequest {
    /// New status; validated against the closed enumeration
    pub status: Option<CaseStatus>,
    /// Clear the status back to empty
    pub clear_status: bool,
    /// New flag value
    pub flagged: Option<bool>,
    /// New notes text
    pub notes: Option<String>,
    /// Identity applying the change
    pub updated_by: Option<String>,
}

/// Full-collection snapshot pushed by the live sync boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    /// The entire current case collection, not a diff
    pub cases: Vec<Case>,
    /// When the snapshot was received
    pub received_at: DateTime<Utc>,
}

impl CollectionSnapshot {
    #[must_use]
    pub fn new(cases: Vec<Case>) -> Self {
        Self {
            cases,
            received_at: Utc::now(),
        }
    }
}
