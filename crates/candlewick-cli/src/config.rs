use std::path::Path;
use std::time::Duration;

use candlewick_core::{
    PipelineSettings, ProviderPolicy, RunnerConfig, TaskRetryPolicy, Warehouse, WarehouseConfig,
};

use crate::cli::{Cli, PipelineArgs, ScheduleArgs};
use crate::error::CliError;

/// Warehouse location from `--db-path`, then `--home`/`CANDLEWICK_HOME`, then the default.
pub fn warehouse_config(cli: &Cli) -> WarehouseConfig {
    let mut config = match &cli.home {
        Some(home) if !home.as_os_str().is_empty() => WarehouseConfig::at_home(home),
        _ => WarehouseConfig::default(),
    };
    if let Some(db_path) = &cli.db_path {
        config.db_path = db_path.clone();
    }
    config
}

pub fn open_warehouse(cli: &Cli) -> Result<Warehouse, CliError> {
    Ok(Warehouse::open(warehouse_config(cli))?)
}

pub fn runner_config(args: &PipelineArgs) -> Result<RunnerConfig, CliError> {
    if args.max_concurrency == 0 {
        return Err(CliError::Config(String::from(
            "--max-concurrency must be at least 1",
        )));
    }
    if args.requests_per_minute == 0 {
        return Err(CliError::Config(String::from(
            "--requests-per-minute must be at least 1",
        )));
    }

    let policy = ProviderPolicy::alphavantage_default()
        .with_requests_per_minute(args.requests_per_minute)
        .with_max_concurrency(args.max_concurrency);
    let mut config = RunnerConfig::paced(policy);
    config.deadline = args.deadline_secs.map(Duration::from_secs);
    Ok(config)
}

pub fn request_timeout(args: &PipelineArgs) -> Result<Duration, CliError> {
    if args.timeout_ms == 0 {
        return Err(CliError::Config(String::from(
            "--timeout-ms must be greater than zero",
        )));
    }
    Ok(Duration::from_millis(args.timeout_ms))
}

pub fn retry_policy(args: &ScheduleArgs) -> TaskRetryPolicy {
    TaskRetryPolicy {
        max_retries: args.retries,
        delay: Duration::from_secs(args.retry_delay_secs),
    }
}

/// Everything a run needs besides the credential, symbols and warehouse.
pub fn pipeline_settings(args: &PipelineArgs) -> Result<PipelineSettings, CliError> {
    Ok(PipelineSettings {
        runner: runner_config(args)?,
        timeout: request_timeout(args)?,
        base_url: args.base_url.clone(),
    })
}

pub fn display_path(path: Option<&Path>) -> String {
    path.map_or_else(|| String::from(":memory:"), |path| path.display().to_string())
}
