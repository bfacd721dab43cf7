//! KCI Tracker CLI library
//!
//! Loads a case collection from a JSON file into the in-process store and
//! runs the core filtering, reporting, and bulk operations against it.

pub mod output;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use kci_tracker_core::{BackupData, Case, CaseStore, DailyReport, MemoryStore};

#[derive(Parser, Debug)]
#[command(name = "kci-tracker")]
#[command(about = "Case list filtering, daily reports, and bulk data for KCI Tracker")]
#[command(version)]
pub struct Cli {
    /// Case data file (JSON backup or plain case array)
    #[arg(long, short, env = "KCI_TRACKER_DATA")]
    pub data: Option<PathBuf>,

    /// Team identifier for report lookups
    #[arg(long, default_value = "default")]
    pub team: String,

    /// Verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List cases with filters applied
    List {
        /// Free-text search
        #[arg(long, short)]
        search: Option<String>,
        /// Exact status filter (Closed, NCM 1, NCM 2, PNS, Service Pending, Monitoring)
        #[arg(long)]
        status: Option<String>,
        /// Mode: normal, due, flagged, repeating, unupdated
        #[arg(long, short, default_value = "normal")]
        mode: String,
        /// Creation-date lower bound (DD-MM-YYYY)
        #[arg(long)]
        from: Option<String>,
        /// Creation-date upper bound (DD-MM-YYYY)
        #[arg(long)]
        to: Option<String>,
        /// Sort by creation date: asc or desc
        #[arg(long)]
        sort: Option<String>,
    },
    /// Print one metric's per-day series for a month
    Report {
        /// Month key, YYYY-MM; defaults to the team's current month
        month: Option<String>,
        /// Metric: open, ready, overdue
        #[arg(long, short, default_value = "open")]
        metric: String,
        /// Report documents file (JSON map of date key to document)
        #[arg(long, short)]
        reports: PathBuf,
    },
    /// Cross-tabulate live cases by resolution code and age bucket
    Distribution,
    /// Reconcile the collection against a spreadsheet upload
    Import {
        /// CSV file to import
        file: PathBuf,
        /// Where to write the reconciled collection (JSON backup)
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Export the collection
    Export {
        /// Export format (json, csv)
        #[arg(long, short, default_value = "json")]
        format: String,
    },
    /// Restore the collection from a JSON backup, replacing everything
    Restore {
        /// Backup file to restore
        file: PathBuf,
        /// Where to write the restored collection (JSON backup)
        #[arg(long, short)]
        output: PathBuf,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Load cases from a JSON file
///
/// Accepts either a full backup payload or a bare case array.
pub fn load_cases(path: &Path) -> Result<Vec<Case>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if let Ok(backup) = serde_json::from_str::<BackupData>(&text) {
        return Ok(backup.cases);
    }
    serde_json::from_str::<Vec<Case>>(&text)
        .with_context(|| format!("{} is neither a backup nor a case array", path.display()))
}

/// Load a month's report documents keyed by ISO date
pub fn load_reports(path: &Path) -> Result<HashMap<String, DailyReport>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a report document map", path.display()))
}

/// Seed an in-process store from a case list
pub async fn store_from_cases(cases: Vec<Case>) -> Result<MemoryStore> {
    let store = MemoryStore::new();
    for case in cases {
        store.upsert_case(case).await?;
    }
    Ok(store)
}

/// Write the store's collection out as a JSON backup
pub async fn write_backup<S: CaseStore>(store: &S, path: &Path) -> Result<()> {
    let backup = kci_tracker_core::export_backup(store).await?;
    let json = kci_tracker_core::backup_to_json(&backup)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
