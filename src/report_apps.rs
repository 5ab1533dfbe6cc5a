use std::error::Error;
use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, ValueEnum, error::ErrorKind};

use crate::aggregate::AggregateMap;
use crate::config::DashboardConfig;
use crate::dates::parse_iso_date;
use crate::filter::{DateRange, FilterSpec};
use crate::format::{format_number, format_share};
use crate::metrics::aggregate_summary;
use crate::normalize::{ColumnResolution, ResolvedColumns};
use crate::pipeline::{DashboardFrame, DashboardSession, RefreshOrchestrator};
use crate::source::{CsvFileSource, GeoJsonFileSource};
use crate::surfaces::TextReportSurfaces;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VariantArg {
    /// Daily cumulative metric per state, windowed growth.
    TimeSeries,
    /// Incident log, counts per beat and per category.
    Incidents,
}

#[derive(Debug, Parser)]
#[command(
    name = "dashboard_report",
    disable_help_subcommand = true,
    about = "Render a choropleth dashboard refresh as text",
    long_about = "Load a CSV dataset and a GeoJSON boundary file, apply the selected filter, and print the KPI, chart and map payloads a dashboard would receive.",
    after_help = "Empty, 'all' or '*' for --category/--year select everything. Set RUST_LOG=debug for join diagnostics."
)]
struct DashboardReportCli {
    #[arg(long, value_name = "PATH", help = "Tabular dataset with a header row")]
    csv: PathBuf,
    #[arg(long, value_name = "PATH", help = "GeoJSON FeatureCollection of regions")]
    geojson: PathBuf,
    #[arg(
        long,
        value_enum,
        default_value_t = VariantArg::TimeSeries,
        help = "Dataset shape and aggregation plan"
    )]
    variant: VariantArg,
    #[arg(
        long,
        default_value = "cases",
        help = "Metric column differenced by the time-series variant"
    )]
    metric: String,
    #[arg(
        long,
        value_parser = parse_positive_usize,
        help = "Lookback window in date buckets (time-series only, default 7)"
    )]
    window: Option<usize>,
    #[arg(long, default_value = "", help = "Category filter")]
    category: String,
    #[arg(long, default_value = "", help = "Year filter")]
    year: String,
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date_arg, requires = "to", help = "Inclusive start of a date range filter")]
    from: Option<NaiveDate>,
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date_arg, requires = "from", help = "Inclusive end of a date range filter")]
    to: Option<NaiveDate>,
    #[arg(long, value_parser = parse_delimiter_arg, help = "CSV field delimiter (single ASCII character)")]
    delimiter: Option<u8>,
    #[arg(long, value_name = "PATH", help = "Write the enriched GeoJSON here")]
    output: Option<PathBuf>,
    #[arg(long, help = "List category and year filter options, then exit")]
    list_filters: bool,
}

/// Run one dashboard refresh from the command line and print every payload.
pub fn run_dashboard_report<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) = parse_cli::<DashboardReportCli, _>(
        std::iter::once("dashboard_report".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let config = match cli.variant {
        VariantArg::TimeSeries => {
            let mut config = DashboardConfig::time_series(cli.metric.clone());
            if !config.columns.metrics.contains(&cli.metric) {
                config.columns.metrics.push(cli.metric.clone());
            }
            match cli.window {
                Some(window) => config.with_window(window),
                None => config,
            }
        }
        VariantArg::Incidents => DashboardConfig::incident_log(),
    };

    let mut tabular = CsvFileSource::new("csv", &cli.csv);
    if let Some(delimiter) = cli.delimiter {
        tabular = tabular.with_delimiter(delimiter);
    }
    let geographic = GeoJsonFileSource::new("geojson", &cli.geojson);
    let session = DashboardSession::from_sources(&tabular, &geographic, config)?;

    println!(
        "Loaded {} records and {} features",
        session.records().len(),
        session.geography().len()
    );
    if let Some(columns) = session.columns() {
        print_columns(columns);
    }

    if cli.list_filters {
        print_filter_options(&session);
        return Ok(());
    }

    let mut spec = FilterSpec::from_controls(&cli.category, &cli.year);
    if let (Some(from), Some(to)) = (cli.from, cli.to) {
        spec = spec.with_dates(DateRange::new(from, to));
    }
    println!("Filter: {spec}");
    println!();

    let mut surfaces = TextReportSurfaces::new(io::stdout());
    let mut orchestrator = RefreshOrchestrator::new(session);
    let frame = orchestrator.refresh(&spec, &mut surfaces)?;

    println!();
    print_join_summary(frame);
    print_value_summary("map values", &frame.map_values);

    if let Some(path) = &cli.output {
        fs::write(path, frame.map.features.to_json_string()?)?;
        println!("Wrote enriched GeoJSON to {}", path.display());
    }

    Ok(())
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse --window value '{}' as a positive integer", raw))?;
    if parsed == 0 {
        return Err("--window must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    parse_iso_date(raw).ok_or_else(|| format!("invalid date '{}': expected YYYY-MM-DD", raw))
}

fn parse_delimiter_arg(raw: &str) -> Result<u8, String> {
    match raw.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ if raw == "\\t" => Ok(b'\t'),
        _ => Err(format!("invalid delimiter '{}': expected one ASCII character", raw)),
    }
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn print_columns(columns: &ResolvedColumns) {
    let describe = |resolution: &Option<ColumnResolution>| match resolution {
        None => "(not configured)".to_string(),
        Some(ColumnResolution::Unresolved) => "(unresolved)".to_string(),
        Some(resolution) => resolution.column().unwrap_or_default().to_string(),
    };
    println!("--- columns ---");
    println!("date: {}", describe(&columns.date));
    println!("timestamp: {}", describe(&columns.timestamp));
    println!("category: {}", describe(&columns.category));
    println!("location: {}", describe(&columns.location));
    for (metric, resolution) in &columns.metrics {
        println!("metric {metric}: {}", describe(&Some(resolution.clone())));
    }
}

fn print_filter_options(session: &DashboardSession) {
    let categories = session.categories();
    let years = session.years();
    println!("--- filter options ---");
    if categories.is_empty() {
        println!("categories: none");
    } else {
        println!("categories: {}", categories.join(", "));
    }
    if years.is_empty() {
        println!("years: none");
    } else {
        let years: Vec<String> = years.iter().map(i32::to_string).collect();
        println!("years: {}", years.join(", "));
    }
}

fn print_join_summary(frame: &DashboardFrame) {
    println!("--- join ---");
    println!(
        "refresh #{}: {} records matched, {} features received a value",
        frame.generation, frame.filtered_records, frame.matched_features
    );
    if let Some(window) = &frame.window {
        println!("window: {} -> {}", window.previous, window.latest);
    }
    if !frame.unmatched_keys.is_empty() {
        let preview: Vec<&str> = frame
            .unmatched_keys
            .iter()
            .take(5)
            .map(String::as_str)
            .collect();
        println!(
            "{} keys without a feature (still counted): {}",
            frame.unmatched_keys.len(),
            preview.join(", ")
        );
    }
}

fn print_value_summary(label: &str, values: &AggregateMap) {
    let Some(summary) = aggregate_summary(values) else {
        return;
    };
    println!("--- {} ---", label);
    println!(
        "keys={} total={} min={} max={} mean={} top_share={}",
        summary.keys,
        format_number(summary.total),
        format_number(summary.min),
        format_number(summary.max),
        format_number(summary.mean),
        format_share(summary.max_share)
    );
}
