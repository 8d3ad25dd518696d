mod init;
mod run;
mod schedule;

use std::process::ExitCode;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Exit code for a run that completed but did not store every symbol.
pub const DEGRADED_EXIT: u8 = 3;

pub async fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    match &cli.command {
        Command::Init => init::run(cli),
        Command::Run(args) => run::run(cli, args).await,
        Command::Schedule(args) => schedule::run(cli, args).await,
    }
}
