//! Test helpers for building SQLite datasets and driving the CLI.

use super::*;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;
use waypost_core::store::sqlite::{
    persist_points_of_interest, persist_road_network, persist_trails,
};
use waypost_core::test_support::{
    grid_network, sample_points_of_interest, sample_trail, square_feature,
};
use waypost_core::{DifficultyLevel, Trail};

/// A temporary SQLite dataset holding the sample points of interest, two
/// trails and a small grid road network.
#[derive(Debug)]
pub(super) struct DatasetFiles {
    _dir: TempDir,
    root: Utf8PathBuf,
    database: Utf8PathBuf,
}

impl DatasetFiles {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        let database = root.join("waypost.db");
        let trails = vec![
            sample_trail(),
            Trail::new(square_feature(200, -0.001, -0.001, 0.004), DifficultyLevel::Easy),
        ];
        persist_points_of_interest(&database, &sample_points_of_interest())
            .expect("persist points of interest");
        persist_trails(&database, &trails).expect("persist trails");
        let network = grid_network(3, 3, 0.001).expect("valid grid");
        persist_road_network(&database, &network).expect("persist road network");
        Self {
            _dir: dir,
            root,
            database,
        }
    }

    pub(super) fn database(&self) -> &Utf8Path {
        &self.database
    }

    pub(super) fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.root.join(name);
        fs::write(&path, contents).expect("write input file");
        path
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    pub(super) fn missing(&self) -> Utf8PathBuf {
        self.path("missing.db")
    }
}

/// Parse `args` as a `waypost` invocation and return the printed JSON.
pub(super) fn run_cli(args: &[&str]) -> Result<Value, CliError> {
    let cli = Cli::try_parse_from(std::iter::once("waypost").chain(args.iter().copied()))?;
    let mut output = Vec::new();
    run_with(cli, &mut output)?;
    Ok(serde_json::from_slice(&output).expect("CLI prints JSON"))
}

/// Identifiers of the feature records in a JSON array of features.
pub(super) fn feature_ids(value: &Value) -> Vec<u64> {
    value
        .as_array()
        .expect("JSON array")
        .iter()
        .map(|entry| entry.get("record").unwrap_or(entry))
        .filter_map(|record| record.get("id").and_then(Value::as_u64))
        .collect()
}
