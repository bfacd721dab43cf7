//! Bulk import, reconciliation, and backup
//!
//! Spreadsheet upload is an authoritative merge: every uploaded row is
//! merge-written over the existing case (tracker-owned fields survive), and
//! every existing case absent from the upload is deleted. The sequence is
//! individual writes with no batching or transaction; a failure mid-way
//! leaves a partially applied import, and the summary counts attempted
//! operations, not confirmed end state.
//!
//! JSON backup round-trips the whole collection verbatim. Restore validates
//! the file shape before the first destructive call, then deletes everything
//! and writes the backup back.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::io::Read;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use kci_tracker_common::columns;

use crate::dates::normalize_raw;
use crate::error::{Result, TrackerError};
use crate::models::Case;
use crate::store::CaseStore;

/// Outcome of a spreadsheet reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Rows written for previously unknown ids
    pub added: usize,
    /// Rows merge-written over existing cases
    pub updated: usize,
    /// Existing cases deleted because the upload omitted them
    pub removed: usize,
    /// Individual operations that failed; the rest were still attempted
    pub failed: usize,
}

/// Outcome of a backup restore
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreSummary {
    /// Cases deleted before the restore
    pub removed: usize,
    /// Cases written from the backup
    pub restored: usize,
}

/// JSON backup payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupData {
    pub cases: Vec<Case>,
    pub exported_at: DateTime<Utc>,
}

impl BackupData {
    #[must_use]
    pub fn new(cases: Vec<Case>) -> Self {
        Self {
            cases,
            exported_at: Utc::now(),
        }
    }
}

/// Parse an uploaded spreadsheet (CSV) into cases
///
/// Columns are matched by header name; a missing column silently defaults
/// every row's field to empty. Date columns are normalized at ingestion, so
/// serial numbers and ISO timestamps land in display form. Rows without a
/// case id are skipped.
///
/// # Errors
///
/// Returns `TrackerError::Import` when the file itself is unreadable as CSV.
pub fn parse_spreadsheet<R: Read>(reader: R) -> Result<Vec<Case>> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| TrackerError::import(e.to_string()))?
        .clone();
    let index: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim(), i))
        .collect();
    let field = |record: &csv::StringRecord, column: &str| -> String {
        index
            .get(column)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
            .trim()
            .to_string()
    };

    let mut cases = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                // Malformed rows are dropped, not surfaced
                warn!(row, error = %e, "skipping unreadable spreadsheet row");
                continue;
            }
        };
        let id = field(&record, columns::CASE_ID);
        if id.is_empty() {
            continue;
        }
        cases.push(Case {
            id,
            customer: field(&record, columns::CUSTOMER),
            country: field(&record, columns::COUNTRY),
            resolution_code: field(&record, columns::RESOLUTION_CODE),
            owner: field(&record, columns::OWNER),
            ca_group: field(&record, columns::CA_GROUP),
            tl: field(&record, columns::TL),
            sbd: field(&record, columns::SBD),
            rfc_onsite: field(&record, columns::RFC_ONSITE),
            rfc_csr: field(&record, columns::RFC_CSR),
            rfc_bench: field(&record, columns::RFC_BENCH),
            age_bucket: field(&record, columns::AGE_BUCKET),
            created_date: normalize_raw(&field(&record, columns::CREATED_ON)),
            follow_date: normalize_raw(&field(&record, columns::FOLLOW_UP)),
            ..Case::default()
        });
    }
    Ok(cases)
}

/// Merge an uploaded row over an existing case
///
/// Spreadsheet columns overwrite; tracker-owned fields (status, flag, notes,
/// audit trail) survive the merge.
fn merge_uploaded(existing: &Case, uploaded: Case) -> Case {
    Case {
        status: existing.status.clone(),
        flagged: existing.flagged,
        notes: existing.notes.clone(),
        last_action_date: existing.last_action_date.clone(),
        updated_by: existing.updated_by.clone(),
        ..uploaded
    }
}

/// Reconcile the store against an authoritative upload
///
/// Every uploaded row is written; every existing case not present in the
/// upload is deleted. Individual failures are logged, counted, and skipped;
/// there is no rollback and no retry.
///
/// # Errors
///
/// Returns the store error only when the initial full fetch fails; per-row
/// failures are reported through [`ImportSummary::failed`].
pub async fn reconcile<S: CaseStore>(store: &S, uploaded: Vec<Case>) -> Result<ImportSummary> {
    let existing = store.fetch_all().await?;
    let existing_by_id: HashMap<String, Case> =
        existing.into_iter().map(|c| (c.id.clone(), c)).collect();
    let uploaded_ids: HashSet<String> = uploaded.iter().map(|c| c.id.clone()).collect();

    let mut summary = ImportSummary::default();

    for case in uploaded {
        let (next, is_update) = match existing_by_id.get(&case.id) {
            Some(existing) => (merge_uploaded(existing, case), true),
            None => (case, false),
        };
        match store.upsert_case(next).await {
            Ok(()) => {
                if is_update {
                    summary.updated += 1;
                } else {
                    summary.added += 1;
                }
            }
            Err(e) => {
                warn!(error = %e, "import write failed");
                summary.failed += 1;
            }
        }
    }

    for id in existing_by_id.keys() {
        if !uploaded_ids.contains(id) {
            match store.delete_case(id).await {
                Ok(()) => summary.removed += 1,
                Err(e) => {
                    warn!(id, error = %e, "import delete failed");
                    summary.failed += 1;
                }
            }
        }
    }

    info!(
        added = summary.added,
        updated = summary.updated,
        removed = summary.removed,
        failed = summary.failed,
        "spreadsheet reconciliation finished"
    );
    Ok(summary)
}

/// Export the full collection as a backup payload
///
/// # Errors
///
/// Surfaces the store error when the collection cannot be fetched.
pub async fn export_backup<S: CaseStore>(store: &S) -> Result<BackupData> {
    Ok(BackupData::new(store.fetch_all().await?))
}

/// Serialize a backup to pretty JSON
///
/// # Errors
///
/// Returns a serialization error, which does not happen for well-formed
/// backup data.
pub fn backup_to_json(backup: &BackupData) -> Result<String> {
    Ok(serde_json::to_string_pretty(backup)?)
}

/// Validate a backup file without touching the store
///
/// # Errors
///
/// Returns `TrackerError::InvalidBackup` when the JSON does not match the
/// expected shape or any case is missing its id.
pub fn validate_backup(json: &str) -> Result<BackupData> {
    let backup: BackupData =
        serde_json::from_str(json).map_err(|e| TrackerError::InvalidBackup {
            message: e.to_string(),
        })?;
    if backup.cases.iter().any(|c| c.id.trim().is_empty()) {
        return Err(TrackerError::InvalidBackup {
            message: "backup contains a case without an id".to_string(),
        });
    }
    Ok(backup)
}

/// Destructive restore: delete everything, then write the backup back
///
/// The file is validated up front; nothing is deleted when validation
/// fails. Callers are expected to have confirmed the operation with the
/// user before invoking this.
///
/// # Errors
///
/// `InvalidBackup` for a malformed file; store errors pass through from the
/// first failing call, which may leave a partially restored collection.
pub async fn restore_backup<S: CaseStore>(store: &S, json: &str) -> Result<RestoreSummary> {
    let backup = validate_backup(json)?;

    let mut summary = RestoreSummary::default();
    for case in store.fetch_all().await? {
        store.delete_case(&case.id).await?;
        summary.removed += 1;
    }
    for case in backup.cases {
        store.upsert_case(case).await?;
        summary.restored += 1;
    }
    Ok(summary)
}

/// Render cases as CSV with the import column headers
#[must_use]
pub fn export_csv(cases: &[Case]) -> String {
    let mut out = String::new();
    out.push_str("Case ID,Full Name,Country,Case Resolution Code,Full Name (Owning User) (User),CA Group,TL,SBD,RFC Onsite,RFC CSR,RFC Bench,Age Bucket,Created On,Follow Up Date,Status,Flagged,Notes\n");
    for case in cases {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            escape_csv(&case.id),
            escape_csv(&case.customer),
            escape_csv(&case.country),
            escape_csv(&case.resolution_code),
            escape_csv(&case.owner),
            escape_csv(&case.ca_group),
            escape_csv(&case.tl),
            escape_csv(&case.sbd),
            escape_csv(&case.rfc_onsite),
            escape_csv(&case.rfc_csr),
            escape_csv(&case.rfc_bench),
            escape_csv(&case.age_bucket),
            escape_csv(&case.created_date),
            escape_csv(&case.follow_date),
            escape_csv(&case.status),
            case.flagged,
            escape_csv(&case.notes),
        )
        .unwrap();
    }
    out
}

/// Escape a CSV field if it contains special characters
fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const SHEET: &str = "\
Case ID,Full Name,Country,Case Resolution Code,Full Name (Owning User) (User),Created On,Follow Up Date,Age Bucket
CAS-1,Maria Santos,Portugal,Hardware,Ana Silva,44927,2024-06-15,0-7
CAS-2,Joao Costa,Portugal,Software,Ana Silva,2024-06-01T08:00:00Z,,8-14
,Rowless Person,Spain,Hardware,Nobody,44927,,0-7
";

    #[test]
    fn test_parse_spreadsheet_maps_columns() {
        let cases = parse_spreadsheet(SHEET.as_bytes()).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].id, "CAS-1");
        assert_eq!(cases[0].customer, "Maria Santos");
        assert_eq!(cases[0].owner, "Ana Silva");
        assert_eq!(cases[1].resolution_code, "Software");
    }

    #[test]
    fn test_parse_spreadsheet_normalizes_dates_once() {
        let cases = parse_spreadsheet(SHEET.as_bytes()).unwrap();
        // Serial 44927 and an ISO timestamp both land in display form
        assert_eq!(cases[0].created_date, "31-12-2022");
        assert_eq!(cases[0].follow_date, "15-06-2024");
        assert_eq!(cases[1].created_date, "01-06-2024");
        assert_eq!(cases[1].follow_date, "");
    }

    #[test]
    fn test_parse_spreadsheet_skips_blank_ids() {
        let cases = parse_spreadsheet(SHEET.as_bytes()).unwrap();
        assert!(cases.iter().all(|c| !c.id.is_empty()));
    }

    #[test]
    fn test_parse_spreadsheet_missing_columns_default_empty() {
        let sheet = "Case ID,Full Name\nCAS-9,Someone\n";
        let cases = parse_spreadsheet(sheet.as_bytes()).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].country, "");
        assert_eq!(cases[0].created_date, "");
    }

    #[tokio::test]
    async fn test_reconcile_adds_updates_and_removes() {
        let store = MemoryStore::new();
        let mut kept = Case {
            id: "CAS-1".to_string(),
            status: "PNS".to_string(),
            flagged: true,
            notes: "keep these".to_string(),
            ..Case::default()
        };
        kept.customer = "Old Name".to_string();
        store.upsert_case(kept).await.unwrap();
        store
            .upsert_case(Case {
                id: "CAS-GONE".to_string(),
                ..Case::default()
            })
            .await
            .unwrap();

        let uploaded = parse_spreadsheet(SHEET.as_bytes()).unwrap();
        let summary = reconcile(&store, uploaded).await.unwrap();

        assert_eq!(summary.added, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.failed, 0);

        // Spreadsheet columns overwrote, tracker-owned fields survived
        let merged = store.get_case("CAS-1").await.unwrap().unwrap();
        assert_eq!(merged.customer, "Maria Santos");
        assert_eq!(merged.status, "PNS");
        assert!(merged.flagged);
        assert_eq!(merged.notes, "keep these");

        assert!(store.get_case("CAS-GONE").await.unwrap().is_none());
        assert!(store.get_case("CAS-2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_backup_roundtrip() {
        let store = MemoryStore::new();
        store
            .upsert_case(Case {
                id: "CAS-1".to_string(),
                customer: "Maria".to_string(),
                flagged: true,
                ..Case::default()
            })
            .await
            .unwrap();

        let backup = export_backup(&store).await.unwrap();
        let json = backup_to_json(&backup).unwrap();

        let restored_store = MemoryStore::new();
        let summary = restore_backup(&restored_store, &json).await.unwrap();
        assert_eq!(summary.restored, 1);
        assert_eq!(summary.removed, 0);

        let restored = restored_store.get_case("CAS-1").await.unwrap().unwrap();
        assert_eq!(restored.customer, "Maria");
        assert!(restored.flagged);
    }

    #[tokio::test]
    async fn test_restore_is_destructive() {
        let store = MemoryStore::new();
        store
            .upsert_case(Case {
                id: "CAS-OLD".to_string(),
                ..Case::default()
            })
            .await
            .unwrap();

        let json = backup_to_json(&BackupData::new(vec![Case {
            id: "CAS-NEW".to_string(),
            ..Case::default()
        }]))
        .unwrap();

        let summary = restore_backup(&store, &json).await.unwrap();
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.restored, 1);
        assert!(store.get_case("CAS-OLD").await.unwrap().is_none());
        assert!(store.get_case("CAS-NEW").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_restore_rejects_malformed_file_before_deleting() {
        let store = MemoryStore::new();
        store
            .upsert_case(Case {
                id: "CAS-SAFE".to_string(),
                ..Case::default()
            })
            .await
            .unwrap();

        let result = restore_backup(&store, "{\"nope\": true}").await;
        assert!(matches!(result, Err(TrackerError::InvalidBackup { .. })));
        // Nothing destructive happened
        assert!(store.get_case("CAS-SAFE").await.unwrap().is_some());
    }

    #[test]
    fn test_validate_backup_rejects_blank_ids() {
        let json = backup_to_json(&BackupData::new(vec![Case::default()])).unwrap();
        assert!(matches!(
            validate_backup(&json),
            Err(TrackerError::InvalidBackup { .. })
        ));
    }

    #[test]
    fn test_export_csv_escapes_fields() {
        let cases = vec![Case {
            id: "CAS-1".to_string(),
            customer: "Santos, Maria".to_string(),
            notes: "said \"tomorrow\"".to_string(),
            ..Case::default()
        }];
        let csv = export_csv(&cases);
        assert!(csv.contains("\"Santos, Maria\""));
        assert!(csv.contains("\"said \"\"tomorrow\"\"\""));
    }

    #[tokio::test]
    async fn test_reconcile_counts_failures_and_continues() {
        let store = MemoryStore::new();
        store
            .upsert_case(Case {
                id: "CAS-STALE".to_string(),
                ..Case::default()
            })
            .await
            .unwrap();
        store.set_failing_writes(true);

        let uploaded = vec![
            Case {
                id: "CAS-1".to_string(),
                ..Case::default()
            },
            Case {
                id: "CAS-2".to_string(),
                ..Case::default()
            },
        ];
        let summary = reconcile(&store, uploaded).await.unwrap();

        // Two writes and one delete attempted, all rejected, none retried
        assert_eq!(summary.added, 0);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.removed, 0);
        assert_eq!(summary.failed, 3);
        assert!(store.get_case("CAS-STALE").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reconcile_fetch_failure_surfaces() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let result = reconcile(&store, Vec::new()).await;
        assert!(matches!(result, Err(TrackerError::Store(_))));
    }
}
