//! Opening the SQLite dataset and running a query against it.

use std::fs::File;
use std::io::BufReader;

use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use waypost_core::store::sqlite::{
    LoadReport, load_points_of_interest, load_road_network, load_trails,
};
use waypost_core::{EngineConfig, FeatureStore, MemoryStore, QueryEngine, RoadNetwork};

use crate::{ARG_DATABASE, CliError};

/// Table a query reads its features from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FeatureTable {
    PointsOfInterest,
    Trails,
}

impl FeatureTable {
    pub(crate) const fn from_flag(trails: bool) -> Self {
        if trails {
            Self::Trails
        } else {
            Self::PointsOfInterest
        }
    }
}

/// A query that can run against any feature store.
pub(crate) trait EngineQuery {
    /// Whether the road network must be loaded before running.
    const NEEDS_NETWORK: bool = false;

    fn run<S>(&self, engine: &QueryEngine<S, RoadNetwork>) -> Result<Value, CliError>
    where
        S: FeatureStore,
        S::Record: Serialize;
}

/// Resolved location and shape of the dataset a command reads.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DatasetConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) table: FeatureTable,
    pub(crate) engine: EngineConfig,
}

impl DatasetConfig {
    pub(crate) fn new(database: Utf8PathBuf, table: FeatureTable) -> Self {
        Self {
            database,
            table,
            engine: EngineConfig::default(),
        }
    }

    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.database, ARG_DATABASE)
    }

    /// Load the selected table and run `query` over it.
    pub(crate) fn execute<Q: EngineQuery>(&self, query: &Q) -> Result<Value, CliError> {
        let path = self.database.as_std_path();
        let network = if Q::NEEDS_NETWORK {
            load_road_network(path)?
        } else {
            RoadNetwork::empty()
        };
        match self.table {
            FeatureTable::PointsOfInterest => {
                let (store, report) = load_points_of_interest(path)?;
                self.run_loaded(store, report, network, query)
            }
            FeatureTable::Trails => {
                let (store, report) = load_trails(path)?;
                self.run_loaded(store, report, network, query)
            }
        }
    }

    fn run_loaded<R, Q>(
        &self,
        store: MemoryStore<R>,
        report: LoadReport,
        network: RoadNetwork,
        query: &Q,
    ) -> Result<Value, CliError>
    where
        Q: EngineQuery,
        MemoryStore<R>: FeatureStore<Record = R>,
        R: Serialize,
    {
        if !report.skipped.is_empty() {
            warn!(
                "skipped {} malformed rows in {}",
                report.skipped.len(),
                self.database
            );
        }
        info!("loaded {} features from {}", report.loaded, self.database);
        let engine = QueryEngine::new(store, network, self.engine)?;
        query.run(&engine)
    }
}

pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match path.metadata() {
        Ok(metadata) if metadata.is_file() => Ok(()),
        Ok(_) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Decode a JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Utf8Path) -> Result<T, CliError> {
    let file = File::open(path).map_err(|source| CliError::OpenInput {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseInput {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Value, CliError> {
    serde_json::to_value(value).map_err(CliError::SerializeOutput)
}
