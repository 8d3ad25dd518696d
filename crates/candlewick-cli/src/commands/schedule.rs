use std::process::ExitCode;
use std::time::Duration;

use candlewick_core::{RunOutcome, TaskRetryPolicy, Warehouse};
use tokio::time::{self, MissedTickBehavior};

use crate::cli::{Cli, PipelineArgs, ScheduleArgs};
use crate::config::{open_warehouse, retry_policy};
use crate::error::CliError;
use crate::output;

use super::run::run_once;
use super::DEGRADED_EXIT;

/// Fire a run on every tick. Runs never overlap: a tick that arrives while a
/// run (or its retries) is in progress is dropped rather than queued.
pub async fn run(cli: &Cli, args: &ScheduleArgs) -> Result<ExitCode, CliError> {
    if args.interval_secs == 0 {
        return Err(CliError::Config(String::from(
            "--interval-secs must be greater than zero",
        )));
    }

    let warehouse = open_warehouse(cli)?;
    let policy = retry_policy(args);
    let mut ticker = time::interval(Duration::from_secs(args.interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        interval_secs = args.interval_secs,
        max_runs = ?args.max_runs,
        "scheduler started"
    );

    let mut completed = 0_u32;
    let last_failed = loop {
        ticker.tick().await;

        let outcome = run_with_retries(&args.pipeline, &warehouse, &policy).await?;
        output::render(&outcome, cli.pretty)?;

        completed = completed.saturating_add(1);
        if args.max_runs.is_some_and(|max_runs| completed >= max_runs) {
            break outcome.is_failed();
        }
    };

    tracing::info!(runs = completed, "scheduler stopped");
    if last_failed {
        return Ok(ExitCode::from(DEGRADED_EXIT));
    }
    Ok(ExitCode::SUCCESS)
}

/// One scheduled task: a run, repeated per `policy` while it counts as failed.
async fn run_with_retries(
    args: &PipelineArgs,
    warehouse: &Warehouse,
    policy: &TaskRetryPolicy,
) -> Result<RunOutcome, CliError> {
    let mut attempt = 0_u32;
    loop {
        let outcome = run_once(args, warehouse.clone()).await?;
        if !outcome.is_failed() {
            return Ok(outcome);
        }

        attempt = attempt.saturating_add(1);
        match policy.delay_for(attempt) {
            Some(delay) => {
                tracing::warn!(
                    run_id = %outcome.run_id,
                    attempt,
                    delay_secs = delay.as_secs(),
                    "run failed, retrying"
                );
                time::sleep(delay).await;
            }
            None => {
                tracing::error!(
                    run_id = %outcome.run_id,
                    retries = policy.max_retries,
                    "run failed after all retries"
                );
                return Ok(outcome);
            }
        }
    }
}
