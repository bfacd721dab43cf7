//! KCI Tracker CLI - filter, report on, and bulk-manage the case collection

use std::fs::File;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kci_tracker_cli::{
    load_cases, load_reports, output, store_from_cases, write_backup, Cli, Commands,
};
use kci_tracker_core::{
    backup_to_json, current_month_key, distribution, export_csv, filter, local_today, month_series,
    parse_spreadsheet, reconcile, restore_backup, BackupData, CaseStatus, FilterBuilder,
    FilterMode, MetricKind, SortOrder, TrackerConfig,
};

fn data_path(cli: &Cli) -> Result<PathBuf> {
    cli.data
        .clone()
        .context("--data is required for this command")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter_directive = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive)),
        )
        .init();

    let mut config = TrackerConfig::from_env();
    config.team = cli.team.clone();
    tracing::debug!(team = %config.team, timezone = %config.timezone, "resolved configuration");

    let stdout = &mut std::io::stdout();

    match &cli.command {
        Commands::List {
            search,
            status,
            mode,
            from,
            to,
            sort,
        } => {
            let cases = load_cases(&data_path(&cli)?)?;

            let mut builder = FilterBuilder::new()
                .mode(mode.parse::<FilterMode>()?)
                .created_range(from.as_deref(), to.as_deref());
            if let Some(query) = search {
                builder = builder.search(query);
            }
            if let Some(raw) = status {
                let parsed = CaseStatus::parse(raw)
                    .with_context(|| format!("Unknown status: {raw}"))?;
                builder = builder.status(parsed);
            }
            if let Some(raw) = sort {
                let order = match raw.to_lowercase().as_str() {
                    "asc" | "ascending" => SortOrder::Ascending,
                    "desc" | "descending" => SortOrder::Descending,
                    other => bail!("Unsupported sort order: {other}"),
                };
                builder = builder.sort(order);
            }
            let filters = builder.build();

            let today = local_today(config.timezone, config.reset_hour);
            let outcome = filter::apply(&cases, &filters, today);
            output::print_cases(&outcome, stdout)?;
        }
        Commands::Report {
            month,
            metric,
            reports,
        } => {
            let month = month
                .clone()
                .unwrap_or_else(|| current_month_key(config.timezone, config.reset_hour));
            let docs = load_reports(reports)?;
            let series = month_series(&docs, &month, metric.parse::<MetricKind>()?)?;
            output::print_month_series(&series, stdout)?;
        }
        Commands::Distribution => {
            let cases = load_cases(&data_path(&cli)?)?;
            let table = distribution(&cases);
            output::print_distribution(&table, stdout)?;
        }
        Commands::Import { file, output: out } => {
            let cases = load_cases(&data_path(&cli)?)?;
            let store = store_from_cases(cases).await?;

            let sheet = File::open(file)
                .with_context(|| format!("failed to open {}", file.display()))?;
            let uploaded = parse_spreadsheet(sheet)?;
            let summary = reconcile(&store, uploaded).await?;
            output::print_import_summary(&summary, stdout)?;

            write_backup(&store, out).await?;
        }
        Commands::Export { format } => {
            let cases = load_cases(&data_path(&cli)?)?;
            match format.to_lowercase().as_str() {
                "json" => {
                    let backup = BackupData::new(cases);
                    println!("{}", backup_to_json(&backup)?);
                }
                "csv" => print!("{}", export_csv(&cases)),
                other => bail!("Unsupported export format: {other}"),
            }
        }
        Commands::Restore {
            file,
            output: out,
            yes,
        } => {
            if !*yes {
                bail!("Restore replaces the entire collection; pass --yes to confirm");
            }
            let cases = load_cases(&data_path(&cli)?)?;
            let store = store_from_cases(cases).await?;

            let json = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let summary = restore_backup(&store, &json).await?;
            output::print_restore_summary(&summary, stdout)?;

            write_backup(&store, out).await?;
        }
    }

    Ok(())
}
