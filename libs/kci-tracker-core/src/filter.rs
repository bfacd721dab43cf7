//! Case filter engine
//!
//! Pure function over the in-memory case collection: applies the transient
//! filter specification in a fixed pipeline order and derives the global
//! badge counts. Re-run in full on every collection snapshot; there is no
//! incremental state.

use chrono::NaiveDate;

use crate::dates::{compare, parse_display, sortable_key};
use crate::models::{Case, CaseFilters, CaseStatus, CategoryKey, FilterMode, SortOrder};

/// Result of one filter pass
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    /// Cases to display, in pipeline order
    pub visible: Vec<Case>,
    /// Due cases across the full unfiltered collection
    pub due_count: usize,
    /// Flagged cases across the full unfiltered collection
    pub flagged_count: usize,
}

/// Due predicate: follow-up date reached and the case is not closed
///
/// A case with an unparseable follow-up date is never due. A case with no
/// status is not `Closed`, so it can be due.
#[must_use]
pub fn is_due(case: &Case, today: NaiveDate) -> bool {
    let Some(follow) = parse_display(&case.follow_date) else {
        return false;
    };
    follow <= today && case.status_enum() != Some(CaseStatus::Closed)
}

/// Apply a filter specification to the full case collection
///
/// Badge counts are computed against the unfiltered input: they describe
/// global state and never move when filters change. In `Repeating` mode the
/// customer-name re-sort supersedes the creation-date sort toggle.
#[must_use]
pub fn apply(cases: &[Case], filters: &CaseFilters, today: NaiveDate) -> FilterOutcome {
    let due_count = cases.iter().filter(|c| is_due(c, today)).count();
    let flagged_count = cases.iter().filter(|c| c.flagged).count();

    let needle = filters.search.trim().to_lowercase();
    let mut visible: Vec<&Case> = cases
        .iter()
        .filter(|case| matches_search(case, &needle))
        .filter(|case| matches_status(case, filters.status))
        .filter(|case| matches_created_range(case, filters))
        .filter(|case| matches_categories(case, filters))
        .filter(|case| matches_mode(case, filters.mode, today))
        .collect();

    if filters.mode == FilterMode::Repeating {
        visible = keep_repeating_customers(visible);
        visible.sort_by(|a, b| a.customer.cmp(&b.customer));
    } else if let Some(order) = filters.sort {
        visible.sort_by(|a, b| {
            let ordering = compare(&a.created_date, &b.created_date);
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
    }

    FilterOutcome {
        visible: visible.into_iter().cloned().collect(),
        due_count,
        flagged_count,
    }
}

fn matches_search(case: &Case, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let haystack = [
        case.id.as_str(),
        case.customer.as_str(),
        case.country.as_str(),
        case.resolution_code.as_str(),
        case.owner.as_str(),
        case.ca_group.as_str(),
        case.tl.as_str(),
        case.rfc_onsite.as_str(),
        case.rfc_csr.as_str(),
        case.rfc_bench.as_str(),
        case.notes.as_str(),
    ]
    .join(" ")
    .to_lowercase();
    haystack.contains(needle)
}

fn matches_status(case: &Case, status: Option<CaseStatus>) -> bool {
    match status {
        Some(wanted) => case.status_enum() == Some(wanted),
        None => true,
    }
}

fn matches_created_range(case: &Case, filters: &CaseFilters) -> bool {
    let key = sortable_key(&case.created_date);
    if let Some(from) = &filters.created_from {
        // A case with no creation date fails any bound check
        if key.is_empty() || key < sortable_key(from) {
            return false;
        }
    }
    if let Some(to) = &filters.created_to {
        if key.is_empty() || key > sortable_key(to) {
            return false;
        }
    }
    true
}

fn matches_categories(case: &Case, filters: &CaseFilters) -> bool {
    filters.categories.iter().all(|(key, facet)| {
        facet.selected.is_empty() || facet.selected.contains(case.category_value(*key))
    })
}

fn matches_mode(case: &Case, mode: FilterMode, today: NaiveDate) -> bool {
    match mode {
        // Repeating is a grouping step, not a per-case predicate
        FilterMode::Normal | FilterMode::Repeating => true,
        FilterMode::Due => is_due(case, today),
        FilterMode::Flagged => case.flagged,
        FilterMode::Unupdated => case.is_unupdated(),
    }
}

/// Keep only cases whose customer appears more than once among the
/// remaining rows, preserving input order
fn keep_repeating_customers(rows: Vec<&Case>) -> Vec<&Case> {
    use std::collections::HashMap;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for case in &rows {
        *counts.entry(case.customer.as_str()).or_insert(0) += 1;
    }
    rows.into_iter()
        .filter(|case| counts.get(case.customer.as_str()).copied().unwrap_or(0) > 1)
        .collect()
}

/// Fluent builder for [`CaseFilters`]
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    filters: CaseFilters,
}

impl FilterBuilder {
    /// Create a new builder with match-all defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Free-text search
    #[must_use]
    pub fn search(mut self, query: &str) -> Self {
        self.filters.search = query.to_string();
        self
    }

    /// Exact status filter
    #[must_use]
    pub const fn status(mut self, status: CaseStatus) -> Self {
        self.filters.status = Some(status);
        self
    }

    /// Inclusive creation-date range (display form); either bound optional
    #[must_use]
    pub fn created_range(mut self, from: Option<&str>, to: Option<&str>) -> Self {
        self.filters.created_from = from.map(ToString::to_string);
        self.filters.created_to = to.map(ToString::to_string);
        self
    }

    /// Select values for one categorical facet
    #[must_use]
    pub fn category<I, S>(mut self, key: CategoryKey, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let facet = self.filters.categories.entry(key).or_default();
        facet.selected = values.into_iter().map(Into::into).collect();
        self
    }

    /// Lock a categorical facet so it survives a reset
    #[must_use]
    pub fn lock(mut self, key: CategoryKey) -> Self {
        self.filters.categories.entry(key).or_default().locked = true;
        self
    }

    /// Active mode
    #[must_use]
    pub const fn mode(mut self, mode: FilterMode) -> Self {
        self.filters.mode = mode;
        self
    }

    /// Creation-date sort toggle
    #[must_use]
    pub const fn sort(mut self, order: SortOrder) -> Self {
        self.filters.sort = Some(order);
        self
    }

    /// Build the final specification
    #[must_use]
    pub fn build(self) -> CaseFilters {
        self.filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(id: &str) -> Case {
        Case {
            id: id.to_string(),
            ..Case::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_is_due_closed_case_excluded() {
        let mut c = case("CAS-1");
        c.status = "Closed".to_string();
        c.follow_date = "01-01-2020".to_string();
        assert!(!is_due(&c, today()));
    }

    #[test]
    fn test_is_due_future_follow_up_excluded() {
        let mut c = case("CAS-2");
        c.follow_date = "01-01-2099".to_string();
        assert!(!is_due(&c, today()));
    }

    #[test]
    fn test_is_due_unparseable_follow_up_never_due() {
        let mut c = case("CAS-3");
        c.follow_date = "soon".to_string();
        assert!(!is_due(&c, today()));
    }

    #[test]
    fn test_is_due_empty_status_can_be_due() {
        let mut c = case("CAS-4");
        c.follow_date = "01-01-2020".to_string();
        assert!(is_due(&c, today()));
    }

    #[test]
    fn test_is_due_on_exact_day() {
        let mut c = case("CAS-5");
        c.follow_date = "15-06-2024".to_string();
        assert!(is_due(&c, today()));
    }

    #[test]
    fn test_due_mode_spec_scenario() {
        // Closed case with a past follow-up, open case with a future one:
        // both are excluded and the result is empty
        let mut closed = case("CAS-1");
        closed.status = "Closed".to_string();
        closed.follow_date = "01-01-2020".to_string();
        let mut future = case("CAS-2");
        future.follow_date = "01-01-2099".to_string();

        let filters = FilterBuilder::new().mode(FilterMode::Due).build();
        let outcome = apply(&[closed, future], &filters, today());
        assert!(outcome.visible.is_empty());
    }

    #[test]
    fn test_search_matches_across_fields() {
        let mut a = case("CAS-100");
        a.customer = "Maria Santos".to_string();
        let mut b = case("CAS-200");
        b.notes = "waiting on SANTOS parts".to_string();
        let mut c = case("CAS-300");
        c.country = "Spain".to_string();

        let filters = FilterBuilder::new().search("santos").build();
        let outcome = apply(&[a, b, c], &filters, today());
        let ids: Vec<&str> = outcome.visible.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["CAS-100", "CAS-200"]);
    }

    #[test]
    fn test_status_filter_exact_equality() {
        let mut a = case("CAS-1");
        a.status = "PNS".to_string();
        let mut b = case("CAS-2");
        b.status = "Monitoring".to_string();
        let c = case("CAS-3");

        let filters = FilterBuilder::new().status(CaseStatus::Pns).build();
        let outcome = apply(&[a, b, c], &filters, today());
        assert_eq!(outcome.visible.len(), 1);
        assert_eq!(outcome.visible[0].id, "CAS-1");
    }

    #[test]
    fn test_created_range_inclusive_both_ends() {
        let mut a = case("CAS-1");
        a.created_date = "01-06-2024".to_string();
        let mut b = case("CAS-2");
        b.created_date = "10-06-2024".to_string();
        let mut c = case("CAS-3");
        c.created_date = "20-06-2024".to_string();

        let filters = FilterBuilder::new()
            .created_range(Some("01-06-2024"), Some("10-06-2024"))
            .build();
        let outcome = apply(&[a, b, c], &filters, today());
        let ids: Vec<&str> = outcome.visible.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["CAS-1", "CAS-2"]);
    }

    #[test]
    fn test_created_range_missing_date_fails_bounds() {
        let dated = {
            let mut c = case("CAS-1");
            c.created_date = "10-06-2024".to_string();
            c
        };
        let undated = case("CAS-2");

        let filters = FilterBuilder::new()
            .created_range(Some("01-06-2024"), None)
            .build();
        let outcome = apply(&[dated.clone(), undated.clone()], &filters, today());
        assert_eq!(outcome.visible.len(), 1);

        let filters = FilterBuilder::new()
            .created_range(None, Some("30-06-2024"))
            .build();
        let outcome = apply(&[dated, undated], &filters, today());
        assert_eq!(outcome.visible.len(), 1);
    }

    #[test]
    fn test_category_facet_empty_selection_is_noop() {
        let mut a = case("CAS-1");
        a.tl = "Lead A".to_string();
        let mut b = case("CAS-2");
        b.tl = "Lead B".to_string();

        let filters = FilterBuilder::new()
            .category(CategoryKey::Tl, Vec::<String>::new())
            .build();
        let outcome = apply(&[a, b], &filters, today());
        assert_eq!(outcome.visible.len(), 2);
    }

    #[test]
    fn test_category_facets_and_together() {
        let mut a = case("CAS-1");
        a.tl = "Lead A".to_string();
        a.country = "Spain".to_string();
        let mut b = case("CAS-2");
        b.tl = "Lead A".to_string();
        b.country = "Portugal".to_string();

        let filters = FilterBuilder::new()
            .category(CategoryKey::Tl, ["Lead A"])
            .category(CategoryKey::Country, ["Spain"])
            .build();
        let outcome = apply(&[a, b], &filters, today());
        assert_eq!(outcome.visible.len(), 1);
        assert_eq!(outcome.visible[0].id, "CAS-1");
    }

    #[test]
    fn test_unupdated_mode() {
        let mut a = case("CAS-1");
        a.status = "   ".to_string();
        let mut b = case("CAS-2");
        b.status = "PNS".to_string();
        let c = case("CAS-3");

        let filters = FilterBuilder::new().mode(FilterMode::Unupdated).build();
        let outcome = apply(&[a, b, c], &filters, today());
        let ids: Vec<&str> = outcome.visible.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["CAS-1", "CAS-3"]);
    }

    #[test]
    fn test_flagged_mode() {
        let mut a = case("CAS-1");
        a.flagged = true;
        let b = case("CAS-2");

        let filters = FilterBuilder::new().mode(FilterMode::Flagged).build();
        let outcome = apply(&[a, b], &filters, today());
        assert_eq!(outcome.visible.len(), 1);
        assert_eq!(outcome.visible[0].id, "CAS-1");
    }

    #[test]
    fn test_repeating_mode_spec_scenario() {
        // Customers [A, A, B]: exactly the two A rows remain, sorted by name,
        // regardless of any active date-sort toggle
        let mut a1 = case("CAS-1");
        a1.customer = "A Corp".to_string();
        a1.created_date = "10-06-2024".to_string();
        let mut b = case("CAS-2");
        b.customer = "B Corp".to_string();
        b.created_date = "01-06-2024".to_string();
        let mut a2 = case("CAS-3");
        a2.customer = "A Corp".to_string();
        a2.created_date = "05-06-2024".to_string();

        let filters = FilterBuilder::new()
            .mode(FilterMode::Repeating)
            .sort(SortOrder::Descending)
            .build();
        let outcome = apply(&[a1, b, a2], &filters, today());
        let ids: Vec<&str> = outcome.visible.iter().map(|c| c.id.as_str()).collect();
        // Date sort toggle is superseded; input order preserved within the group
        assert_eq!(ids, vec!["CAS-1", "CAS-3"]);
        assert!(outcome.visible.iter().all(|c| c.customer == "A Corp"));
    }

    #[test]
    fn test_repeating_groups_after_other_filters() {
        // The >1 grouping counts rows remaining after the earlier stages
        let mut a1 = case("CAS-1");
        a1.customer = "A Corp".to_string();
        a1.country = "Spain".to_string();
        let mut a2 = case("CAS-2");
        a2.customer = "A Corp".to_string();
        a2.country = "Portugal".to_string();

        let filters = FilterBuilder::new()
            .category(CategoryKey::Country, ["Spain"])
            .mode(FilterMode::Repeating)
            .build();
        let outcome = apply(&[a1, a2], &filters, today());
        assert!(outcome.visible.is_empty());
    }

    #[test]
    fn test_sort_ascending_and_descending() {
        let mut a = case("CAS-1");
        a.created_date = "10-06-2024".to_string();
        let mut b = case("CAS-2");
        b.created_date = "01-06-2024".to_string();
        let cases = vec![a, b];

        let asc = FilterBuilder::new().sort(SortOrder::Ascending).build();
        let outcome = apply(&cases, &asc, today());
        let ids: Vec<&str> = outcome.visible.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["CAS-2", "CAS-1"]);

        let desc = FilterBuilder::new().sort(SortOrder::Descending).build();
        let outcome = apply(&cases, &desc, today());
        let ids: Vec<&str> = outcome.visible.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["CAS-1", "CAS-2"]);
    }

    #[test]
    fn test_sort_stable_on_ties() {
        let mut a = case("CAS-1");
        a.created_date = "10-06-2024".to_string();
        let mut b = case("CAS-2");
        b.created_date = "10-06-2024".to_string();

        let filters = FilterBuilder::new().sort(SortOrder::Ascending).build();
        let outcome = apply(&[a, b], &filters, today());
        let ids: Vec<&str> = outcome.visible.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["CAS-1", "CAS-2"]);
    }

    #[test]
    fn test_empty_created_date_sorts_first_ascending() {
        let mut a = case("CAS-1");
        a.created_date = "10-06-2024".to_string();
        let b = case("CAS-2");

        let filters = FilterBuilder::new().sort(SortOrder::Ascending).build();
        let outcome = apply(&[a, b], &filters, today());
        let ids: Vec<&str> = outcome.visible.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["CAS-2", "CAS-1"]);
    }

    #[test]
    fn test_badge_counts_ignore_active_filters() {
        let mut due = case("CAS-1");
        due.follow_date = "01-01-2020".to_string();
        let mut flagged = case("CAS-2");
        flagged.flagged = true;
        let plain = case("CAS-3");
        let cases = vec![due, flagged, plain];

        let unfiltered = apply(&cases, &CaseFilters::default(), today());
        let narrowed = apply(
            &cases,
            &FilterBuilder::new().search("no such case").build(),
            today(),
        );

        assert_eq!(unfiltered.due_count, 1);
        assert_eq!(unfiltered.flagged_count, 1);
        assert_eq!(narrowed.due_count, unfiltered.due_count);
        assert_eq!(narrowed.flagged_count, unfiltered.flagged_count);
        assert!(narrowed.visible.is_empty());
    }

    #[test]
    fn test_builder_lock_marks_facet() {
        let filters = FilterBuilder::new()
            .category(CategoryKey::Tl, ["Lead A"])
            .lock(CategoryKey::Tl)
            .build();
        assert!(filters.categories[&CategoryKey::Tl].locked);
    }

    #[test]
    fn test_pipeline_composes_by_and() {
        let mut target = case("CAS-1");
        target.customer = "Maria".to_string();
        target.status = "PNS".to_string();
        target.created_date = "10-06-2024".to_string();
        let mut near_miss = case("CAS-2");
        near_miss.customer = "Maria".to_string();
        near_miss.status = "Closed".to_string();
        near_miss.created_date = "10-06-2024".to_string();

        let filters = FilterBuilder::new()
            .search("maria")
            .status(CaseStatus::Pns)
            .created_range(Some("01-06-2024"), Some("30-06-2024"))
            .build();
        let outcome = apply(&[target, near_miss], &filters, today());
        assert_eq!(outcome.visible.len(), 1);
        assert_eq!(outcome.visible[0].id, "CAS-1");
    }
}
