//! QuantDash CLI: analyze tickers and list the symbol catalog.
//!
//! Commands:
//! - `analyze` runs fetch → normalize → indicators → summary for each symbol
//!   and prints the snapshot, timings and the newest rows
//! - `symbols` lists the catalog of known tickers

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use quantdash_core::config::{AnalysisConfig, WindowProfile};
use quantdash_core::data::{
    CircuitBreaker, CsvProvider, DataProvider, FetchCache, SyntheticProvider, YahooProvider,
};
use quantdash_core::domain::Catalog;
use quantdash_core::export::{write_csv_file, write_parquet};
use quantdash_core::indicators::IndicatorRow;
use quantdash_core::pipeline::{Analysis, Pipeline};
use quantdash_core::summary::{Snapshot, Summary};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "quantdash",
    about = "QuantDash: price history, technical indicators and summaries"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch prices, compute indicators and print a summary per symbol.
    Analyze(AnalyzeArgs),
    /// List the symbol catalog.
    Symbols {
        /// TOML catalog file. Defaults to the built-in list.
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Source {
    Yahoo,
    Csv,
    Synthetic,
}

#[derive(clap::Args)]
struct AnalyzeArgs {
    /// Symbols to analyze (e.g., PETR4.SA AAPL). Adds to the config's list.
    symbols: Vec<String>,

    /// TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start date (YYYY-MM-DD). Defaults to one year before the end date.
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<String>,

    /// SMA window profile: standard (20/50) or short (7/21).
    #[arg(long)]
    profile: Option<String>,

    /// Fast SMA window, overriding the profile.
    #[arg(long)]
    fast: Option<usize>,

    /// Slow SMA window, overriding the profile.
    #[arg(long)]
    slow: Option<usize>,

    /// Where prices come from.
    #[arg(long, value_enum, default_value_t = Source::Yahoo)]
    source: Source,

    /// Directory of `{SYMBOL}.csv` files for `--source csv`.
    #[arg(long, default_value = "data")]
    csv_dir: PathBuf,

    /// Header lines in each CSV file (3 for a pandas multi-index export).
    #[arg(long, default_value_t = 1)]
    header_rows: usize,

    /// Number of newest rows to print.
    #[arg(long, default_value_t = 10)]
    rows: usize,

    /// Print JSON instead of tables.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Write the full indicator frame as CSV.
    #[arg(long)]
    export_csv: Option<PathBuf>,

    /// Write the full indicator frame as Parquet.
    #[arg(long)]
    export_parquet: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => run_analyze(args),
        Commands::Symbols { catalog } => run_symbols(catalog.as_deref()),
    }
}

fn parse_date(value: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("{flag} must be YYYY-MM-DD, got '{value}'"))
}

/// File config with command-line flags applied on top.
fn resolve_config(args: &AnalyzeArgs) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    config.symbols.extend(args.symbols.iter().cloned());
    if let Some(start) = &args.start {
        config.start = Some(parse_date(start, "--start")?);
    }
    if let Some(end) = &args.end {
        config.end = Some(parse_date(end, "--end")?);
    }
    if let Some(profile) = &args.profile {
        config.profile = profile.parse::<WindowProfile>()?;
    }
    if args.fast.is_some() {
        config.fast = args.fast;
    }
    if args.slow.is_some() {
        config.slow = args.slow;
    }
    Ok(config)
}

fn build_provider(args: &AnalyzeArgs) -> Result<Arc<dyn DataProvider>> {
    Ok(match args.source {
        Source::Yahoo => {
            let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
            Arc::new(YahooProvider::new(circuit_breaker)?)
        }
        Source::Csv => {
            if !args.csv_dir.is_dir() {
                bail!("CSV directory '{}' does not exist", args.csv_dir.display());
            }
            Arc::new(CsvProvider::new(args.csv_dir.clone()).with_header_rows(args.header_rows))
        }
        Source::Synthetic => Arc::new(SyntheticProvider),
    })
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    if config.symbols.is_empty() {
        bail!("no symbols given (pass them as arguments or set `symbols` in --config)");
    }
    let params = config.indicator_params()?;
    let (start, end) = config.date_range(chrono::Local::now().date_naive())?;

    let provider = build_provider(&args)?;
    let pipeline = Pipeline::with_cache(provider, FetchCache::with_ttl(config.ttl()), params)?;
    let catalog = Catalog::default_catalog();
    let multiple = config.symbols.len() > 1;

    let mut failures = 0;
    for symbol in &config.symbols {
        let analysis = match pipeline.analyze(symbol, start, end) {
            Ok(analysis) => analysis,
            Err(e) => {
                error!(symbol = %symbol, error = %e, "analysis failed");
                eprintln!("Error for {symbol}: {e}");
                failures += 1;
                continue;
            }
        };

        if args.json {
            println!("{}", serde_json::to_string_pretty(&analysis_json(&analysis, args.rows))?);
        } else {
            print_analysis(&analysis, &catalog.label(symbol), start, end, args.rows);
        }

        if let Some(path) = &args.export_csv {
            let path = export_path(path, symbol, multiple);
            write_csv_file(&analysis.frame, &path)?;
        }
        if let Some(path) = &args.export_parquet {
            let path = export_path(path, symbol, multiple);
            write_parquet(&analysis.frame, &path)?;
        }
    }

    if failures > 0 {
        bail!("{failures} of {} symbols failed", config.symbols.len());
    }
    Ok(())
}

/// With several symbols, `out.csv` becomes `out_AAPL.csv`.
fn export_path(path: &Path, symbol: &str, multiple: bool) -> PathBuf {
    if !multiple {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{symbol}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{symbol}"),
    };
    path.with_file_name(name)
}

fn newest_rows(analysis: &Analysis, n: usize) -> Vec<IndicatorRow> {
    analysis.frame.rows().rev().take(n).collect()
}

fn analysis_json(analysis: &Analysis, n: usize) -> serde_json::Value {
    let t = &analysis.timings;
    serde_json::json!({
        "summary": analysis.summary,
        "timings": {
            "fetch_secs": t.fetch.as_secs_f64(),
            "compute_secs": t.compute.as_secs_f64(),
            "rows": t.rows,
            "rows_per_sec": t.rows_per_sec(),
        },
        "rows": newest_rows(analysis, n),
    })
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "-".to_string(),
    }
}

fn print_analysis(analysis: &Analysis, label: &str, start: NaiveDate, end: NaiveDate, n: usize) {
    println!();
    println!("=== {label} ===");
    println!("Period:         {start} to {end}");

    match &analysis.summary {
        Summary::NoData { .. } => {
            println!("No data for this period.");
            println!();
            return;
        }
        Summary::Ready(snapshot) => print_snapshot(snapshot),
    }

    let t = &analysis.timings;
    println!();
    println!("--- Timings ---");
    println!("Download:       {:.3}s", t.fetch.as_secs_f64());
    println!("Compute:        {:.6}s", t.compute.as_secs_f64());
    match t.rows_per_sec() {
        Some(rate) => println!("Throughput:     {rate:.0} rows/s"),
        None => println!("Throughput:     -"),
    }

    println!();
    println!(
        "{:<10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>7} {:>9} {:>8}",
        "date", "close", "sma_fast", "sma_slow", "bb_upper", "bb_lower", "volume", "rsi", "return%", "vol%"
    );
    for row in newest_rows(analysis, n) {
        println!(
            "{:<10} {:>10.2} {:>10} {:>10} {:>10} {:>10} {:>10} {:>7} {:>9} {:>8}",
            row.date,
            row.close,
            fmt_opt(row.sma_fast, 2),
            fmt_opt(row.sma_slow, 2),
            fmt_opt(row.bollinger_upper, 2),
            fmt_opt(row.bollinger_lower, 2),
            row.volume.map_or_else(|| "-".to_string(), |v| v.to_string()),
            fmt_opt(row.rsi, 1),
            fmt_opt(row.daily_return.map(|r| r * 100.0), 2),
            fmt_opt(row.annual_volatility, 1),
        );
    }
    println!();
}

fn print_snapshot(s: &Snapshot) {
    println!("Last date:      {} ({} rows)", s.date, s.rows);
    println!("Close:          {:.2}", s.close);
    println!("Change:         {:+.2} ({:+.2}%)", s.change, s.change_pct);
    match (s.rsi, s.rsi_zone) {
        (Some(rsi), Some(zone)) => println!("RSI:            {rsi:.1} ({zone})"),
        _ => println!("RSI:            -"),
    }
    println!("Volatility:     {}%", fmt_opt(s.annual_volatility, 1));
    println!("Trend:          {}", s.trend);
    println!("Period high:    {:.2}", s.period_high);
    println!("Period low:     {:.2}", s.period_low);
}

fn run_symbols(catalog_path: Option<&Path>) -> Result<()> {
    let catalog = match catalog_path {
        Some(path) => Catalog::from_file(path)?,
        None => Catalog::default_catalog(),
    };
    if catalog.is_empty() {
        println!("Catalog is empty.");
        return Ok(());
    }
    println!("{:<12} NAME", "SYMBOL");
    for symbol in catalog.symbols() {
        println!("{symbol:<12} {}", catalog.display_name(symbol).unwrap_or(""));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "quantdash", "analyze", "AAPL", "--start", "2024-01-02", "--profile", "short",
            "--slow", "30", "--source", "synthetic",
        ])
        .unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.source, Source::Synthetic);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.symbols, vec!["AAPL"]);
        assert_eq!(config.start, NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(config.windows().fast, 7);
        assert_eq!(config.windows().slow, 30);
    }

    #[test]
    fn bad_date_flag_is_rejected() {
        let cli = Cli::try_parse_from(["quantdash", "analyze", "AAPL", "--end", "01/02/2024"]).unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn export_path_gets_symbol_suffix() {
        let p = Path::new("out/frame.csv");
        assert_eq!(export_path(p, "AAPL", false), PathBuf::from("out/frame.csv"));
        assert_eq!(export_path(p, "AAPL", true), PathBuf::from("out/frame_AAPL.csv"));
        assert_eq!(export_path(Path::new("frame"), "X", true), PathBuf::from("frame_X"));
    }
}
