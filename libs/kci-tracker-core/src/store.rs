//! Document store boundary
//!
//! The hosted document store is an external collaborator. [`CaseStore`] is
//! the seam the rest of the crate talks through: point CRUD on cases, an
//! inclusive id-range query over daily report documents, and a subscription
//! that pushes the full case collection on every change. [`MemoryStore`] is
//! the in-process implementation used by tests and the CLI.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::cache::LocalCache;
use crate::dates::days_in_month;
use crate::error::{Result, TrackerError};
use crate::models::{Case, CollectionSnapshot, DailyReport};

/// Capacity of the snapshot broadcast channel
const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

/// Boundary trait for the hosted document store
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Fetch the entire case collection
    async fn fetch_all(&self) -> Result<Vec<Case>>;

    /// Point lookup by case id
    async fn get_case(&self, id: &str) -> Result<Option<Case>>;

    /// Merge-or-overwrite write keyed by the case id
    async fn upsert_case(&self, case: Case) -> Result<()>;

    /// Physical removal; cases are never soft-deleted
    async fn delete_case(&self, id: &str) -> Result<()>;

    /// Point lookup of one team's daily report document
    async fn get_report(&self, team: &str, date_key: &str) -> Result<Option<DailyReport>>;

    /// All report documents whose date key falls within `[from_key, to_key]`
    /// inclusive
    async fn reports_in_range(
        &self,
        team: &str,
        from_key: &str,
        to_key: &str,
    ) -> Result<Vec<(String, DailyReport)>>;

    /// Subscribe to full-collection snapshots, one per mutation
    fn subscribe(&self) -> broadcast::Receiver<CollectionSnapshot>;
}

/// In-memory reference implementation of [`CaseStore`]
///
/// Emits a full snapshot after every case mutation, mirroring how the hosted
/// store's realtime subscription behaves. `set_failing` makes every
/// operation return a store error, for exercising failure paths.
pub struct MemoryStore {
    cases: DashMap<String, Case>,
    reports: DashMap<String, DailyReport>,
    snapshots: broadcast::Sender<CollectionSnapshot>,
    failing: AtomicBool,
    failing_writes: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        let (snapshots, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            cases: DashMap::new(),
            reports: DashMap::new(),
            snapshots,
            failing: AtomicBool::new(false),
            failing_writes: AtomicBool::new(false),
        }
    }

    /// Toggle simulated store failure
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Toggle simulated failure of writes only; reads keep working
    pub fn set_failing_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(TrackerError::store("store unavailable"))
        } else {
            Ok(())
        }
    }

    fn check_writable(&self) -> Result<()> {
        self.check_available()?;
        if self.failing_writes.load(Ordering::SeqCst) {
            Err(TrackerError::store("write rejected"))
        } else {
            Ok(())
        }
    }

    /// Seed a report document; in production the reporting pipeline writes
    /// these, the tracker only reads
    pub fn put_report(&self, team: &str, date_key: &str, report: DailyReport) {
        self.reports
            .insert(Self::report_key(team, date_key), report);
    }

    fn report_key(team: &str, date_key: &str) -> String {
        format!("{team}/{date_key}")
    }

    fn collection(&self) -> Vec<Case> {
        let mut cases: Vec<Case> = self.cases.iter().map(|entry| entry.value().clone()).collect();
        cases.sort_by(|a, b| a.id.cmp(&b.id));
        cases
    }

    fn emit_snapshot(&self) {
        let snapshot = CollectionSnapshot::new(self.collection());
        // Send fails only when nobody is subscribed, which is fine
        let _ = self.snapshots.send(snapshot);
    }
}

#[async_trait]
impl CaseStore for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<Case>> {
        self.check_available()?;
        Ok(self.collection())
    }

    async fn get_case(&self, id: &str) -> Result<Option<Case>> {
        self.check_available()?;
        Ok(self.cases.get(id).map(|entry| entry.value().clone()))
    }

    async fn upsert_case(&self, case: Case) -> Result<()> {
        self.check_writable()?;
        if case.id.trim().is_empty() {
            return Err(TrackerError::validation("case id must not be empty"));
        }
        self.cases.insert(case.id.clone(), case);
        self.emit_snapshot();
        Ok(())
    }

    async fn delete_case(&self, id: &str) -> Result<()> {
        self.check_writable()?;
        self.cases.remove(id);
        self.emit_snapshot();
        Ok(())
    }

    async fn get_report(&self, team: &str, date_key: &str) -> Result<Option<DailyReport>> {
        self.check_available()?;
        Ok(self
            .reports
            .get(&Self::report_key(team, date_key))
            .map(|entry| *entry.value()))
    }

    async fn reports_in_range(
        &self,
        team: &str,
        from_key: &str,
        to_key: &str,
    ) -> Result<Vec<(String, DailyReport)>> {
        self.check_available()?;
        let prefix = format!("{team}/");
        let mut rows: Vec<(String, DailyReport)> = self
            .reports
            .iter()
            .filter_map(|entry| {
                let date_key = entry.key().strip_prefix(&prefix)?;
                if date_key >= from_key && date_key <= to_key {
                    Some((date_key.to_string(), *entry.value()))
                } else {
                    None
                }
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(rows)
    }

    fn subscribe(&self) -> broadcast::Receiver<CollectionSnapshot> {
        self.snapshots.subscribe()
    }
}

/// Read-through access to daily report documents
///
/// Consults the live store first and caches what it gets; the local cache
/// only answers when the live fetch fails. The cache is never authoritative.
pub struct ReportReader<S: CaseStore> {
    store: S,
    cache: LocalCache,
    team: String,
}

impl<S: CaseStore> ReportReader<S> {
    pub fn new(store: S, cache: LocalCache, team: impl Into<String>) -> Self {
        Self {
            store,
            cache,
            team: team.into(),
        }
    }

    /// Borrow the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    fn cache_key(&self, date_key: &str) -> String {
        format!("{}/{}", self.team, date_key)
    }

    /// Fetch one day's report, falling back to the cached copy when the
    /// live fetch fails
    ///
    /// # Errors
    ///
    /// Returns the store error when the live fetch fails and no cached copy
    /// exists.
    pub async fn report(&self, date_key: &str) -> Result<Option<DailyReport>> {
        match self.store.get_report(&self.team, date_key).await {
            Ok(Some(report)) => {
                self.cache.set(&self.cache_key(date_key), &report).await;
                Ok(Some(report))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(date_key, error = %e, "live report fetch failed, trying cache");
                match self.cache.get(&self.cache_key(date_key)).await {
                    Some(report) => Ok(Some(report)),
                    None => Err(e),
                }
            }
        }
    }

    /// Fetch a month's report documents keyed by ISO date
    ///
    /// On live failure every day of the month is tried against the cache;
    /// the error surfaces only when nothing cached is available either.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::InvalidMonth` for a bad month key, or the
    /// store error when both the live fetch and the cache come up empty.
    pub async fn month_reports(&self, month_key: &str) -> Result<HashMap<String, DailyReport>> {
        let days = days_in_month(month_key)?;
        let from_key = format!("{month_key}-01");
        let to_key = format!("{month_key}-{days:02}");

        match self.store.reports_in_range(&self.team, &from_key, &to_key).await {
            Ok(rows) => {
                let mut docs = HashMap::with_capacity(rows.len());
                for (date_key, report) in rows {
                    self.cache.set(&self.cache_key(&date_key), &report).await;
                    docs.insert(date_key, report);
                }
                Ok(docs)
            }
            Err(e) => {
                warn!(month_key, error = %e, "live range fetch failed, trying cache");
                let mut docs = HashMap::new();
                for day in 1..=days {
                    let date_key = kci_tracker_common::day_key(month_key, day);
                    if let Some(report) = self.cache.get(&self.cache_key(&date_key)).await {
                        docs.insert(date_key, report);
                    }
                }
                if docs.is_empty() {
                    Err(e)
                } else {
                    debug!(month_key, cached_days = docs.len(), "served month from cache");
                    Ok(docs)
                }
            }
        }
    }
}
