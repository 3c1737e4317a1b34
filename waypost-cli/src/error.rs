//! Error types emitted by the Waypost CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use waypost_core::routing::RoadNetworkError;
use waypost_core::store::sqlite::SqliteStoreError;
use waypost_core::{EngineError, FeatureId, GeometryError};

/// Errors emitted by the Waypost CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: String,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A category name was not recognised.
    #[error("invalid category: {0}")]
    InvalidCategory(String),
    /// Opening a JSON input file failed.
    #[error("failed to open {path:?}: {source}")]
    OpenInput {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A JSON input file could not be decoded.
    #[error("failed to parse JSON at {path:?}: {source}")]
    ParseInput {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// An imported feature carries a geometry that cannot be made valid.
    #[error("feature {id} has an invalid geometry: {source}")]
    InvalidFeatureGeometry {
        id: FeatureId,
        #[source]
        source: GeometryError,
    },
    /// An imported road network violates a graph invariant.
    #[error("invalid road network: {0}")]
    InvalidNetwork(#[from] RoadNetworkError),
    /// Reading or writing the SQLite dataset failed.
    #[error(transparent)]
    Store(Box<SqliteStoreError>),
    /// The query engine rejected the request.
    #[error("query failed: {0}")]
    Engine(#[from] EngineError),
    /// Serialising the query result failed.
    #[error("failed to serialise query output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing the query result failed.
    #[error("failed to write query output: {0}")]
    WriteOutput(#[source] std::io::Error),
}

impl From<SqliteStoreError> for CliError {
    fn from(source: SqliteStoreError) -> Self {
        Self::Store(Box::new(source))
    }
}
