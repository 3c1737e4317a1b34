//! Import command: write a JSON dataset into the SQLite schema.

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use waypost_core::routing::{GraphEdge, GraphVertex};
use waypost_core::store::sqlite::persist_dataset;
use waypost_core::{GeoRecord, GeometryContext, PointOfInterest, RoadNetwork, Trail};

use crate::dataset::{read_json, require_existing};
use crate::{ARG_DATABASE, ARG_DATASET, CliError, env_var};

/// CLI arguments for the `import` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "import",
    long_about = "Write points of interest, trails and the road network from \
                 a JSON document into a SQLite dataset. Rows sharing an id \
                 with existing rows replace them; missing tables are \
                 created.",
    about = "Import a JSON dataset into SQLite"
)]
#[ortho_config(prefix = "WAYPOST")]
pub(crate) struct ImportArgs {
    /// Path to the JSON dataset.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) dataset: Option<Utf8PathBuf>,
    /// Path to the SQLite dataset to write.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl ImportArgs {
    pub(crate) fn into_config(self) -> Result<ImportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ImportConfig::try_from(merged)
    }
}

/// Resolved `import` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportConfig {
    pub(crate) dataset: Utf8PathBuf,
    pub(crate) database: Utf8PathBuf,
}

impl TryFrom<ImportArgs> for ImportConfig {
    type Error = CliError;

    fn try_from(args: ImportArgs) -> Result<Self, Self::Error> {
        let dataset = args.dataset.ok_or_else(|| CliError::MissingArgument {
            field: ARG_DATASET,
            env: env_var("import", ARG_DATASET),
        })?;
        let database = args.database.ok_or_else(|| CliError::MissingArgument {
            field: ARG_DATABASE,
            env: env_var("import", ARG_DATABASE),
        })?;
        Ok(Self { dataset, database })
    }
}

/// JSON document accepted by `import`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ImportDocument {
    #[serde(default)]
    pub(crate) points_of_interest: Vec<PointOfInterest>,
    #[serde(default)]
    pub(crate) trails: Vec<Trail>,
    #[serde(default)]
    pub(crate) vertices: Vec<GraphVertex>,
    #[serde(default)]
    pub(crate) edges: Vec<GraphEdge>,
}

/// Re-express every record's geometry under `context`, closing open rings.
///
/// The first record whose geometry cannot be made valid aborts the import.
fn validated<R: GeoRecord>(
    context: &GeometryContext,
    records: Vec<R>,
) -> Result<Vec<R>, CliError> {
    records
        .into_iter()
        .map(|mut record| {
            let geometry = context
                .geometry(record.geometry().clone())
                .map_err(|source| CliError::InvalidFeatureGeometry {
                    id: record.id(),
                    source,
                })?;
            record.feature_mut().geometry = geometry;
            Ok(record)
        })
        .collect()
}

/// Check the whole document, then write it in a single transaction.
pub(crate) fn run_import(config: &ImportConfig) -> Result<Value, CliError> {
    require_existing(&config.dataset, ARG_DATASET)?;
    let document: ImportDocument = read_json(&config.dataset)?;
    let context = GeometryContext::wgs84();
    let pois = validated(&context, document.points_of_interest)?;
    let trails = validated(&context, document.trails)?;
    let network = RoadNetwork::new(document.vertices, document.edges)?;

    persist_dataset(config.database.as_std_path(), &pois, &trails, &network)?;

    info!(
        "imported {} points of interest, {} trails and {} vertices into {}",
        pois.len(),
        trails.len(),
        network.vertices().len(),
        config.database
    );
    Ok(json!({
        "points_of_interest": pois.len(),
        "trails": trails.len(),
        "vertices": network.vertices().len(),
        "edges": network.edges().len(),
    }))
}
