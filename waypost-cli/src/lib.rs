//! Command-line interface for querying Waypost datasets.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};
use serde_json::Value;

mod dataset;
mod error;
mod import;
mod query;

pub use error::CliError;

use dataset::EngineQuery;
use import::{ImportArgs, run_import};
use query::{
    BboxArgs, CategoryArgs, FilterArgs, Invocation, NearbyArgs, NearestArgs, RelationsArgs,
    RouteArgs,
};

pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_DATASET: &str = "dataset";
pub(crate) const ARG_CATEGORY: &str = "category";
pub(crate) const ARG_GEOMETRY: &str = "geometry";
pub(crate) const ARG_MIN_LON: &str = "min-lon";
pub(crate) const ARG_MIN_LAT: &str = "min-lat";
pub(crate) const ARG_MAX_LON: &str = "max-lon";
pub(crate) const ARG_MAX_LAT: &str = "max-lat";
pub(crate) const ARG_LON: &str = "lon";
pub(crate) const ARG_LAT: &str = "lat";
pub(crate) const ARG_RADIUS: &str = "radius";
pub(crate) const ARG_FROM_LON: &str = "from-lon";
pub(crate) const ARG_FROM_LAT: &str = "from-lat";
pub(crate) const ARG_TO: &str = "to";

/// Environment variable consulted for `field` of `command`.
pub(crate) fn env_var(command: &str, field: &str) -> String {
    format!(
        "WAYPOST_CMDS_{}_{}",
        command.to_uppercase(),
        field.replace('-', "_").to_uppercase()
    )
}

/// Run the Waypost CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    run_with(cli, &mut stdout)
}

fn run_with(cli: Cli, writer: &mut dyn Write) -> Result<(), CliError> {
    let output = match cli.command {
        Command::Bbox(args) => run_query(args.into_invocation()?)?,
        Command::Category(args) => run_query(args.into_invocation()?)?,
        Command::Filter(args) => run_query(args.into_invocation()?)?,
        Command::Nearby(args) => run_query(args.into_invocation()?)?,
        Command::Nearest(args) => run_query(args.into_invocation()?)?,
        Command::Relations(args) => run_query(args.into_invocation()?)?,
        Command::Route(args) => run_query(args.into_invocation()?)?,
        Command::Import(args) => run_import(&args.into_config()?)?,
    };
    write_output(writer, &output)
}

fn run_query<Q: EngineQuery>(invocation: Invocation<Q>) -> Result<Value, CliError> {
    invocation.dataset.validate_sources()?;
    invocation.dataset.execute(&invocation.query)
}

fn write_output(writer: &mut dyn Write, output: &Value) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(output).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[derive(Debug, Parser)]
#[command(
    name = "waypost",
    about = "Spatial queries and routing over Waypost SQLite datasets",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List features intersecting a bounding box.
    Bbox(BboxArgs),
    /// List features tagged with a category.
    Category(CategoryArgs),
    /// List features intersecting a geometry read from a JSON file.
    Filter(FilterArgs),
    /// List features within a radius of a point.
    Nearby(NearbyArgs),
    /// List the features nearest to a point.
    Nearest(NearestArgs),
    /// Report intersecting and containing pairs inside a bounding box.
    Relations(RelationsArgs),
    /// Route from a coordinate to a point of interest.
    Route(RouteArgs),
    /// Import a JSON dataset into SQLite.
    Import(ImportArgs),
}

#[cfg(test)]
mod tests;
