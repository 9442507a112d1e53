//! Ricecast CLI — fetch, inspect and forecast rice price series.
//!
//! Commands:
//! - `fetch futures` — download rough-rice futures closes to canonical CSV
//! - `fetch spreadsheet` — extract the Thai 5% broken series from the monthly workbook
//! - `show` — print the tail of a canonical CSV
//! - `forecast` — forecast the next N days from a canonical CSV

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ricecast_core::config::RicecastConfig;
use ricecast_core::data::{
    fetch_futures, fetch_spreadsheet_with, read_series, FetchReport, HttpWorkbookSource,
    YahooProvider,
};
use ricecast_core::forecast::forecast;
use ricecast_core::logging::{self, LogFormat};
use ricecast_core::series::{CanonicalSeries, ForecastSeries, SourceKind};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "ricecast",
    about = "Ricecast CLI — rice price ingestion and short-horizon forecasts"
)]
struct Cli {
    /// TOML config file. Flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format on stderr: pretty, compact or json.
    #[arg(long, global = true, default_value = "compact")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a source and write it as canonical Date,Price CSV.
    Fetch {
        #[command(subcommand)]
        source: FetchSource,
    },
    /// Print the most recent rows of a canonical CSV.
    Show {
        /// Which source's CSV to read.
        #[arg(long, value_enum, default_value_t = SourceArg::Futures)]
        source: SourceArg,

        /// Explicit CSV path (overrides --source).
        #[arg(long)]
        path: Option<PathBuf>,

        /// Number of trailing rows to print.
        #[arg(long, default_value_t = 30)]
        tail: usize,
    },
    /// Forecast the next days from a canonical CSV.
    Forecast {
        /// Which source's CSV to read.
        #[arg(long, value_enum, default_value_t = SourceArg::Futures)]
        source: SourceArg,

        /// Explicit CSV path (overrides --source).
        #[arg(long)]
        path: Option<PathBuf>,

        /// Days to forecast. Defaults to the config value (30).
        #[arg(long)]
        horizon: Option<usize>,

        /// Forecast rows to print.
        #[arg(long, default_value_t = 5)]
        head: usize,

        /// Print the full forecast as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FetchSource {
    /// Rough-rice futures daily closes from the chart API.
    Futures {
        /// Output CSV path.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Instrument symbol.
        #[arg(long)]
        symbol: Option<String>,

        /// Primary retrieval window (e.g. max, 10y).
        #[arg(long)]
        range: Option<String>,

        /// Bar interval (e.g. 1d).
        #[arg(long)]
        interval: Option<String>,
    },
    /// Monthly reference prices from the published workbook.
    Spreadsheet {
        /// Output CSV path.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Workbook URL.
        #[arg(long)]
        url: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    Futures,
    Spreadsheet,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Futures => SourceKind::Futures,
            SourceArg::Spreadsheet => SourceKind::Spreadsheet,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.log_format, "info")
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let config = RicecastConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Fetch { source } => match source {
            FetchSource::Futures {
                out,
                symbol,
                range,
                interval,
            } => run_fetch_futures(config, out, symbol, range, interval),
            FetchSource::Spreadsheet { out, url } => run_fetch_spreadsheet(config, out, url),
        },
        Commands::Show { source, path, tail } => {
            let path = resolve_path(&config, source, path);
            run_show(&path, tail)
        }
        Commands::Forecast {
            source,
            path,
            horizon,
            head,
            json,
        } => {
            let path = resolve_path(&config, source, path);
            let horizon = horizon.unwrap_or(config.forecast.horizon);
            run_forecast(&path, horizon, head, json)
        }
    }
}

fn resolve_path(config: &RicecastConfig, source: SourceArg, path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(|| config.output_for(source.into()).to_path_buf())
}

fn run_fetch_futures(
    mut config: RicecastConfig,
    out: Option<PathBuf>,
    symbol: Option<String>,
    range: Option<String>,
    interval: Option<String>,
) -> Result<()> {
    let request = &mut config.futures.request;
    if let Some(symbol) = symbol {
        request.symbol = symbol;
    }
    if let Some(range) = range {
        request.range = range;
    }
    if let Some(interval) = interval {
        request.interval = interval;
    }
    let out = out.unwrap_or(config.futures.output);

    let provider = YahooProvider::with_base_url(config.futures.base_url)?;
    let report = fetch_futures(&provider, &config.futures.request, &out)
        .with_context(|| format!("fetching {}", config.futures.request.symbol))?;

    print_report(&report);
    Ok(())
}

fn run_fetch_spreadsheet(
    config: RicecastConfig,
    out: Option<PathBuf>,
    url: Option<String>,
) -> Result<()> {
    let locator = config.spreadsheet.layout.locator();
    let url = url.unwrap_or(config.spreadsheet.url);
    let out = out.unwrap_or(config.spreadsheet.output);

    let source = HttpWorkbookSource::new(url)?;
    let report = fetch_spreadsheet_with(&source, locator.as_ref(), &out)
        .with_context(|| format!("fetching workbook {}", source.url()))?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &FetchReport) {
    if report.is_empty() {
        eprintln!(
            "warning: {} source produced no rows; wrote header-only {}",
            report.source,
            report.path.display()
        );
    }
    println!(
        "{}: wrote {} rows to {} (dropped {}, blake3 {})",
        report.source,
        report.rows,
        report.path.display(),
        report.dropped,
        &report.content_hash[..16.min(report.content_hash.len())]
    );
}

fn load(path: &Path) -> Result<CanonicalSeries> {
    read_series(path).with_context(|| {
        format!(
            "reading {} (run `ricecast fetch` first to create it)",
            path.display()
        )
    })
}

fn run_show(path: &Path, tail: usize) -> Result<()> {
    let series = load(path)?;

    match (series.first(), series.last()) {
        (Some(first), Some(last)) => println!(
            "{}: {} rows, {} .. {}",
            path.display(),
            series.len(),
            first.date,
            last.date
        ),
        _ => {
            println!("{}: no rows", path.display());
            return Ok(());
        }
    }

    let (recent, _) = CanonicalSeries::from_points(series.tail(tail).to_vec());
    println!("{}", recent.to_dataframe()?);
    Ok(())
}

fn run_forecast(path: &Path, horizon: usize, head: usize, json: bool) -> Result<()> {
    let series = load(path)?;
    let result = forecast(&series, horizon)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match series.last() {
        Some(last) => println!(
            "last observation {} = {:.4}; {} day forecast",
            last.date, last.price, horizon
        ),
        None => println!("no observations; flat forecast of 0 for {horizon} days"),
    }

    let shown = ForecastSeries {
        points: result.head(head).to_vec(),
    };
    println!("{}", shown.to_dataframe()?);
    Ok(())
}
