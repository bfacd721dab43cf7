//! Constants shared across the KCI Tracker workspace

/// Namespace for the on-device key-value cache
pub const CACHE_NAMESPACE: &str = "kci-tracker-cache";

/// Logical store name inside the cache namespace
pub const CACHE_STORE: &str = "tracker";

/// Cache schema version; a mismatch on open wipes and recreates the store
pub const CACHE_VERSION: u32 = 1;

/// Canonical display format for all persisted dates (day-month-year)
pub const DISPLAY_DATE_FORMAT: &str = "%d-%m-%Y";

/// Sortable key format reconstructed from display dates
pub const SORTABLE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Resolution-code categories tracked by the distribution cross-tab
pub const TRACKED_RESOLUTIONS: &[&str] = &["Hardware", "Software", "Customer Induced"];

/// Ordered age buckets tracked by the distribution cross-tab
pub const AGE_BUCKETS: &[&str] = &[
    "0-7",
    "8-14",
    "15-30",
    "31-60",
    "61-90",
    "91-180",
    "181-365",
    "365+",
];

/// Spreadsheet column headers recognized by bulk import
pub mod columns {
    pub const CASE_ID: &str = "Case ID";
    pub const CUSTOMER: &str = "Full Name";
    pub const COUNTRY: &str = "Country";
    pub const RESOLUTION_CODE: &str = "Case Resolution Code";
    pub const OWNER: &str = "Full Name (Owning User) (User)";
    pub const CA_GROUP: &str = "CA Group";
    pub const TL: &str = "TL";
    pub const SBD: &str = "SBD";
    pub const RFC_ONSITE: &str = "RFC Onsite";
    pub const RFC_CSR: &str = "RFC CSR";
    pub const RFC_BENCH: &str = "RFC Bench";
    pub const AGE_BUCKET: &str = "Age Bucket";
    pub const CREATED_ON: &str = "Created On";
    pub const FOLLOW_UP: &str = "Follow Up Date";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_namespace() {
        assert_eq!(CACHE_NAMESPACE, "kci-tracker-cache");
    }

    #[test]
    fn test_cache_store() {
        assert_eq!(CACHE_STORE, "tracker");
    }

    #[test]
    fn test_display_date_format() {
        assert_eq!(DISPLAY_DATE_FORMAT, "%d-%m-%Y");
    }

    #[test]
    fn test_tracked_resolutions_count() {
        assert_eq!(TRACKED_RESOLUTIONS.len(), 3);
    }

    #[test]
    fn test_age_buckets_count_and_order() {
        assert_eq!(AGE_BUCKETS.len(), 8);
        assert_eq!(AGE_BUCKETS[0], "0-7");
        assert_eq!(AGE_BUCKETS[7], "365+");
    }

    #[test]
    fn test_case_id_column() {
        assert_eq!(columns::CASE_ID, "Case ID");
    }

    #[test]
    fn test_owner_column() {
        assert_eq!(columns::OWNER, "Full Name (Owning User) (User)");
    }
}
