use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use sales_report_builder::utils::parse_day_month_year;
use sales_report_builder::{source_for_path, LogObserver, ReportConfig, RetryPolicy, SalesReportPipeline};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate MTD and YTD PDF sales reports", long_about = None)]
struct Cli {
    /// Exported query rows: a .json or .csv file, or a directory of query* exports
    #[arg(long, short)]
    input: PathBuf,

    /// JSON configuration file; defaults apply to anything it leaves out
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Directory the reports are written to (overrides the configuration)
    #[arg(long, short)]
    output_dir: Option<PathBuf>,

    /// Report as of this date (DD/MM/YYYY, end of day) instead of now
    #[arg(long)]
    reference_date: Option<String>,

    /// Fetch attempts before giving up (overrides the configuration)
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Seconds to wait between fetch attempts (overrides the configuration)
    #[arg(long)]
    retry_delay: Option<u64>,

    /// TrueType font to embed, needed for text outside Latin-1 such as Czech names
    #[arg(long)]
    font: Option<PathBuf>,

    /// TrueType font for bold text (defaults to --font)
    #[arg(long, requires = "font")]
    bold_font: Option<PathBuf>,

    /// Append log output to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let mut config = match &cli.config {
        Some(path) => ReportConfig::from_json_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => ReportConfig::default(),
    };
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(font) = cli.font {
        config.font_regular = Some(font);
        config.font_bold = cli.bold_font;
    }
    if cli.max_attempts.is_some() || cli.retry_delay.is_some() {
        config.retry = RetryPolicy::new(
            cli.max_attempts.unwrap_or(config.retry.max_attempts),
            cli.retry_delay
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.retry.delay()),
        );
    }
    config.validate()?;

    let reference = reference_instant(cli.reference_date.as_deref())?;
    let mut source = source_for_path(&cli.input, &config.query_prefix)?;

    let observer = LogObserver;
    let pipeline = SalesReportPipeline::new(config, &observer);
    let written = pipeline
        .run_from_source(source.as_mut(), reference)
        .context("no reports were produced")?;

    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn reference_instant(date: Option<&str>) -> Result<NaiveDateTime> {
    match date {
        Some(text) => {
            let day = parse_day_month_year(text)?;
            day.and_hms_opt(23, 59, 59)
                .context("reference date has no end of day")
        }
        None => Ok(Local::now().naive_local()),
    }
}
