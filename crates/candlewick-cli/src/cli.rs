//! CLI argument definitions for candlewick.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `init` | Provision the warehouse schema |
//! | `run` | Run the pipeline once and print the outcome |
//! | `schedule` | Run the pipeline on an hourly timer with task-level retry |
//!
//! # Environment
//!
//! | Variable | Flag | Default |
//! |----------|------|---------|
//! | `ALPHA_VANTAGE_API_KEY` | `--api-key` | none |
//! | `STOCK_SYMBOLS` | `--symbols` | `AAPL` |
//! | `CANDLEWICK_HOME` | `--home` | `$HOME/.candlewick` |
//!
//! # Examples
//!
//! ```bash
//! candlewick init
//! STOCK_SYMBOLS=AAPL,MSFT candlewick run --pretty
//! candlewick schedule --max-concurrency 2 --requests-per-minute 5
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Hourly intraday price ingestion into a local DuckDB warehouse.
#[derive(Debug, Parser)]
#[command(name = "candlewick", author, version, about)]
pub struct Cli {
    /// Data root; the warehouse lives at `<home>/warehouse.duckdb`.
    #[arg(long, global = true, env = "CANDLEWICK_HOME")]
    pub home: Option<PathBuf>,

    /// Explicit warehouse file, overriding `--home`.
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the warehouse and apply schema migrations.
    Init,

    /// Fetch, parse and store every configured symbol once.
    ///
    /// Exits 0 when every symbol stored records, 3 when the run was degraded.
    Run(RunArgs),

    /// Run on a fixed interval until stopped or `--max-runs` is reached.
    Schedule(ScheduleArgs),
}

#[derive(Debug, Clone, Args)]
pub struct PipelineArgs {
    /// Alpha Vantage API key.
    #[arg(
        long,
        env = "ALPHA_VANTAGE_API_KEY",
        hide_env_values = true,
        default_value = ""
    )]
    pub api_key: String,

    /// Comma-separated ticker symbols.
    #[arg(long, env = "STOCK_SYMBOLS", value_delimiter = ',', default_value = "AAPL")]
    pub symbols: Vec<String>,

    /// Per-request timeout in milliseconds.
    #[arg(long, default_value_t = 30_000)]
    pub timeout_ms: u64,

    /// Symbols processed at the same time.
    #[arg(long, default_value_t = 1)]
    pub max_concurrency: usize,

    /// Provider request budget per minute.
    #[arg(long, default_value_t = 5)]
    pub requests_per_minute: u32,

    /// Skip symbols not started within this many seconds of the run start.
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// Provider endpoint override.
    #[arg(long)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Debug, Clone, Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Seconds between scheduled runs.
    #[arg(long, default_value_t = 3_600)]
    pub interval_secs: u64,

    /// Stop after this many scheduled runs.
    #[arg(long)]
    pub max_runs: Option<u32>,

    /// Retries for a failed run.
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Seconds between retries of a failed run.
    #[arg(long, default_value_t = 300)]
    pub retry_delay_secs: u64,
}
