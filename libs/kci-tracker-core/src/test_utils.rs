//! Test fixtures for KCI Tracker

use crate::models::{Case, DailyReport};
use crate::store::{CaseStore, MemoryStore};

/// Build a case with the fields the fixtures care about
#[must_use]
pub fn make_case(id: &str, customer: &str, status: &str, created: &str) -> Case {
    Case {
        id: id.to_string(),
        customer: customer.to_string(),
        status: status.to_string(),
        created_date: created.to_string(),
        country: "Portugal".to_string(),
        owner: "Ana Silva".to_string(),
        ..Case::default()
    }
}

/// A small realistic case collection
#[must_use]
pub fn sample_cases() -> Vec<Case> {
    vec![
        Case {
            follow_date: "01-06-2024".to_string(),
            resolution_code: "Hardware".to_string(),
            age_bucket: "0-7".to_string(),
            ..make_case("CAS-1001", "Maria Santos", "", "01-05-2024")
        },
        Case {
            flagged: true,
            resolution_code: "Software".to_string(),
            age_bucket: "8-14".to_string(),
            ..make_case("CAS-1002", "Joao Costa", "PNS", "10-05-2024")
        },
        Case {
            resolution_code: "Hardware".to_string(),
            age_bucket: "15-30".to_string(),
            ..make_case("CAS-1003", "Maria Santos", "Closed", "20-04-2024")
        },
        make_case("CAS-1004", "Lucia Fernandes", "Monitoring", "15-05-2024"),
    ]
}

/// A memory store seeded with [`sample_cases`] and one report document
pub async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    for case in sample_cases() {
        store
            .upsert_case(case)
            .await
            .unwrap_or_else(|e| panic!("fixture seed failed: {e}"));
    }
    store.put_report(
        "alpha",
        "2024-06-01",
        DailyReport {
            total_open_onsite: 3,
            total_open_offsite: 2,
            total_open_csr: 1,
            total_open_total: 6,
            overdue_total: 2,
            ..DailyReport::default()
        },
    );
    store
}
