use std::process::ExitCode;

use candlewick_core::{run_pipeline, RunOutcome, Warehouse};

use crate::cli::{Cli, PipelineArgs, RunArgs};
use crate::config::{open_warehouse, pipeline_settings};
use crate::error::CliError;
use crate::output;

use super::DEGRADED_EXIT;

pub async fn run(cli: &Cli, args: &RunArgs) -> Result<ExitCode, CliError> {
    let warehouse = open_warehouse(cli)?;
    let outcome = run_once(&args.pipeline, warehouse).await?;
    output::render(&outcome, cli.pretty)?;

    if outcome.is_degraded() {
        return Ok(ExitCode::from(DEGRADED_EXIT));
    }
    Ok(ExitCode::SUCCESS)
}

/// One pipeline run against `warehouse`.
pub async fn run_once(args: &PipelineArgs, warehouse: Warehouse) -> Result<RunOutcome, CliError> {
    let settings = pipeline_settings(args)?;
    Ok(run_pipeline(&args.api_key, &args.symbols, warehouse, &settings).await)
}
