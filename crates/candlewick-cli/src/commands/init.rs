use std::process::ExitCode;

use serde_json::json;

use crate::cli::Cli;
use crate::config::{display_path, open_warehouse};
use crate::error::CliError;
use crate::output;

pub fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let warehouse = open_warehouse(cli)?;
    let versions = warehouse.schema_versions()?;
    let db_path = display_path(warehouse.db_path());

    tracing::info!(db_path = %db_path, "warehouse schema is up to date");
    output::render(
        &json!({
            "db_path": db_path,
            "schema_versions": versions,
            "observations": warehouse.count_observations()?,
        }),
        cli.pretty,
    )?;

    Ok(ExitCode::SUCCESS)
}
