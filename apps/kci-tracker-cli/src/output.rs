//! Terminal rendering for case lists and report tables

use std::io::Write;

use anyhow::Result;
use kci_tracker_core::{
    DistributionTable, FilterOutcome, ImportSummary, MonthSeries, RestoreSummary,
};

/// Print a filter pass: global badges, then the visible cases
pub fn print_cases<W: Write>(outcome: &FilterOutcome, writer: &mut W) -> Result<()> {
    writeln!(
        writer,
        "Due: {} | Flagged: {}",
        outcome.due_count, outcome.flagged_count
    )?;

    if outcome.visible.is_empty() {
        writeln!(writer, "No cases found")?;
        return Ok(());
    }

    writeln!(writer, "Found {} cases:", outcome.visible.len())?;
    for case in &outcome.visible {
        writeln!(writer, "  • {} — {}", case.id, case.customer)?;
        if !case.status.is_empty() {
            writeln!(writer, "    Status: {}", case.status)?;
        }
        if !case.created_date.is_empty() {
            writeln!(writer, "    Created: {}", case.created_date)?;
        }
        if !case.follow_date.is_empty() {
            writeln!(writer, "    Follow up: {}", case.follow_date)?;
        }
        if case.flagged {
            writeln!(writer, "    Flagged")?;
        }
        if !case.notes.is_empty() {
            writeln!(writer, "    Notes: {}", case.notes)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Print a month's per-day series as a day/category table
pub fn print_month_series<W: Write>(series: &MonthSeries, writer: &mut W) -> Result<()> {
    writeln!(writer, "{} — {:?}", series.month, series.metric)?;

    write!(writer, "{:>5}", "Day")?;
    for label in series.labels() {
        write!(writer, "{label:>10}")?;
    }
    writeln!(writer)?;

    for day in 0..series.len() {
        write!(writer, "{:>5}", day + 1)?;
        for cat in &series.series {
            write!(writer, "{:>10}", cat.values[day])?;
        }
        writeln!(writer)?;
    }
    writeln!(writer, "Scale max: {}", series.chart_scale())?;
    Ok(())
}

/// Print the resolution-by-age cross-tab with marginal totals
pub fn print_distribution<W: Write>(table: &DistributionTable, writer: &mut W) -> Result<()> {
    write!(writer, "{:<18}", "Resolution")?;
    for bucket in &table.buckets {
        write!(writer, "{bucket:>8}")?;
    }
    writeln!(writer, "{:>8}", "Total")?;

    for (row, resolution) in table.resolutions.iter().enumerate() {
        write!(writer, "{resolution:<18}")?;
        for cell in &table.cells[row] {
            write!(writer, "{cell:>8}")?;
        }
        writeln!(writer, "{:>8}", table.resolution_totals[row])?;
    }

    write!(writer, "{:<18}", "Total")?;
    for total in &table.bucket_totals {
        write!(writer, "{total:>8}")?;
    }
    writeln!(writer, "{:>8}", table.grand_total)?;
    Ok(())
}

/// Print the outcome of a spreadsheet reconcile
pub fn print_import_summary<W: Write>(summary: &ImportSummary, writer: &mut W) -> Result<()> {
    writeln!(
        writer,
        "Import complete: {} added, {} updated, {} removed, {} failed",
        summary.added, summary.updated, summary.removed, summary.failed
    )?;
    Ok(())
}

/// Print the outcome of a backup restore
pub fn print_restore_summary<W: Write>(summary: &RestoreSummary, writer: &mut W) -> Result<()> {
    writeln!(
        writer,
        "Restore complete: {} removed, {} restored",
        summary.removed, summary.restored
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kci_tracker_core::{distribution, month_series, Case, DailyReport, MetricKind};
    use std::collections::HashMap;

    fn case(id: &str, customer: &str) -> Case {
        Case {
            id: id.to_string(),
            customer: customer.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_print_cases_empty() {
        let outcome = FilterOutcome {
            visible: vec![],
            due_count: 2,
            flagged_count: 1,
        };
        let mut buf = Vec::new();
        print_cases(&outcome, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Due: 2 | Flagged: 1"));
        assert!(text.contains("No cases found"));
    }

    #[test]
    fn test_print_cases_lists_ids() {
        let outcome = FilterOutcome {
            visible: vec![case("CAS-001", "Maria Santos"), case("CAS-002", "Joao Costa")],
            due_count: 0,
            flagged_count: 0,
        };
        let mut buf = Vec::new();
        print_cases(&outcome, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Found 2 cases:"));
        assert!(text.contains("CAS-001 — Maria Santos"));
        assert!(text.contains("CAS-002 — Joao Costa"));
    }

    #[test]
    fn test_print_month_series_spans_month() {
        let docs: HashMap<String, DailyReport> = HashMap::new();
        let series = month_series(&docs, "2024-02", MetricKind::TotalOpen).unwrap();
        let mut buf = Vec::new();
        print_month_series(&series, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("2024-02"));
        // 29 data rows plus header and scale line
        assert_eq!(text.lines().count(), 32);
    }

    #[test]
    fn test_print_distribution_totals() {
        let mut one = case("CAS-001", "Maria Santos");
        one.resolution_code = "Hardware".to_string();
        one.age_bucket = "0-7".to_string();
        let table = distribution(&[one]);
        let mut buf = Vec::new();
        print_distribution(&table, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Resolution"));
        assert!(text.contains("Hardware"));
    }
}
