//! SQLite persistence for features and the road network.
//!
//! Tables:
//!
//! - `pois` and `trails` hold one row per feature. Geometry and category
//!   columns are JSON text; `created_at` is whole seconds since the Unix
//!   epoch.
//! - `road_network_vertices` and `road_network` hold the routing graph.
//!
//! Loaders open the database read-only and build in-memory structures. Rows
//! that cannot be decoded are skipped and reported instead of failing the
//! whole load; database errors are fatal.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use geo::Coord;
use log::warn;
use rusqlite::{Connection, OpenFlags, Row, Transaction};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::feature::{Category, FeatureId, GeoFeature, PointOfInterest, Trail};
use crate::geometry::GeometryKind;
use crate::routing::{EdgeId, GraphEdge, GraphVertex, RoadNetwork, RoadNetworkError, VertexId};

use super::MemoryStore;

/// Errors raised when reading or writing a SQLite dataset.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Beginning the write transaction failed.
    #[error("failed to begin persistence transaction")]
    BeginTransaction {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Creating a table failed.
    #[error("failed to create table {table}")]
    CreateSchema {
        /// Table being created.
        table: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Preparing an insert statement failed.
    #[error("failed to prepare insert statement for {table}")]
    PrepareInsert {
        /// Table being written.
        table: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// An identifier could not be represented as an SQLite integer.
    #[error("{table} id {id} exceeds SQLite i64 range")]
    IdOutOfRange {
        /// Table being written.
        table: &'static str,
        /// Identifier that failed the conversion.
        id: u64,
    },
    /// Serialising a JSON column failed.
    #[error("failed to serialise {table} row {id}")]
    Serialize {
        /// Table being written.
        table: &'static str,
        /// Identifier of the row.
        id: u64,
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// Writing a row failed.
    #[error("failed to persist {table} row {id}")]
    PersistRow {
        /// Table being written.
        table: &'static str,
        /// Identifier of the row.
        id: u64,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Committing the transaction failed.
    #[error("failed to commit persistence transaction")]
    Commit {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Reading rows from a table failed.
    #[error("failed to read table {table}: {source}")]
    Query {
        /// Table being read.
        table: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The stored road network violated a graph invariant.
    #[error(transparent)]
    InvalidNetwork(#[from] RoadNetworkError),
}

/// A row that was skipped during a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// Raw identifier column of the row.
    pub id: i64,
    /// Why the row could not be decoded.
    pub reason: String,
}

/// Summary of a load: how many rows were accepted and which were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of rows turned into records.
    pub loaded: usize,
    /// Rows that could not be decoded.
    pub skipped: Vec<SkippedRow>,
}

impl LoadReport {
    fn skip(&mut self, table: &str, id: i64, reason: String) {
        warn!("skipping {table} row {id}: {reason}");
        self.skipped.push(SkippedRow { id, reason });
    }
}

const POIS: &str = "pois";
const TRAILS: &str = "trails";
const VERTICES: &str = "road_network_vertices";
const EDGES: &str = "road_network";

/// Columns shared by every feature table, before decoding.
struct RawFeature {
    id: i64,
    name: String,
    description: Option<String>,
    geometry: String,
    categories: String,
    created_at: i64,
}

impl RawFeature {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            geometry: row.get("geometry")?,
            categories: row.get("categories")?,
            created_at: row.get("created_at")?,
        })
    }

    fn decode(self) -> Result<GeoFeature, String> {
        let id = u64::try_from(self.id).map_err(|_| format!("negative id {}", self.id))?;
        let geometry = serde_json::from_str::<GeometryKind>(&self.geometry)
            .map_err(|err| format!("unparseable geometry: {err}"))?
            .into_valid()
            .map_err(|err| format!("invalid geometry: {err}"))?;
        let names: Vec<String> = serde_json::from_str(&self.categories)
            .map_err(|err| format!("unparseable categories: {err}"))?;
        let categories = names
            .iter()
            .map(|name| Category::from_str(name))
            .collect::<Result<Vec<_>, _>>()?;
        let seconds = u64::try_from(self.created_at)
            .map_err(|_| format!("timestamp {} precedes the epoch", self.created_at))?;
        let mut feature = GeoFeature::new(FeatureId(id), self.name, geometry)
            .with_categories(categories)
            .with_created_at(SystemTime::UNIX_EPOCH + Duration::from_secs(seconds));
        feature.description = self.description;
        Ok(feature)
    }
}

fn open_read_only(path: &Path) -> Result<Connection, SqliteStoreError> {
    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(|source| {
        SqliteStoreError::OpenDatabase {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn read_rows<T>(
    connection: &Connection,
    table: &'static str,
    sql: &str,
    read: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>, SqliteStoreError> {
    let query = |source| SqliteStoreError::Query { table, source };
    let mut statement = connection.prepare(sql).map_err(query)?;
    let rows = statement.query_map([], read).map_err(query)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(query)
}

fn parse_enum<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(text.to_owned()))
        .map_err(|err| format!("unknown value '{text}': {err}"))
}

/// Load the `pois` table into a [`MemoryStore`].
///
/// # Errors
/// Returns [`SqliteStoreError`] when the database cannot be opened or read.
pub fn load_points_of_interest(
    path: impl AsRef<Path>,
) -> Result<(MemoryStore<PointOfInterest>, LoadReport), SqliteStoreError> {
    let connection = open_read_only(path.as_ref())?;
    let rows = read_rows(
        &connection,
        POIS,
        "SELECT id, name, description, geometry, categories, created_at, trail_id
         FROM pois ORDER BY id",
        |row| Ok((RawFeature::read(row)?, row.get::<_, Option<i64>>("trail_id")?)),
    )?;

    let mut report = LoadReport::default();
    let mut pois = Vec::with_capacity(rows.len());
    for (raw, trail_id) in rows {
        let id = raw.id;
        let decoded = raw.decode().and_then(|feature| {
            let trail = trail_id
                .map(|t| u64::try_from(t).map_err(|_| format!("negative trail id {t}")))
                .transpose()?;
            let poi = PointOfInterest::new(feature);
            Ok(match trail {
                Some(trail) => poi.on_trail(FeatureId(trail)),
                None => poi,
            })
        });
        match decoded {
            Ok(poi) => pois.push(poi),
            Err(reason) => report.skip(POIS, id, reason),
        }
    }
    report.loaded = pois.len();
    Ok((MemoryStore::new(pois), report))
}

/// Load the `trails` table into a [`MemoryStore`].
///
/// # Errors
/// Returns [`SqliteStoreError`] when the database cannot be opened or read.
pub fn load_trails(
    path: impl AsRef<Path>,
) -> Result<(MemoryStore<Trail>, LoadReport), SqliteStoreError> {
    let connection = open_read_only(path.as_ref())?;
    let rows = read_rows(
        &connection,
        TRAILS,
        "SELECT id, name, description, geometry, categories, created_at,
                trail_type, difficulty, estimated_length_meters
         FROM trails ORDER BY id",
        |row| {
            Ok((
                RawFeature::read(row)?,
                row.get::<_, String>("trail_type")?,
                row.get::<_, String>("difficulty")?,
                row.get::<_, Option<f64>>("estimated_length_meters")?,
            ))
        },
    )?;

    let mut report = LoadReport::default();
    let mut trails = Vec::with_capacity(rows.len());
    for (raw, trail_type, difficulty, length) in rows {
        let id = raw.id;
        let decoded = raw.decode().and_then(|feature| {
            let mut trail = Trail::new(feature, parse_enum(&difficulty)?);
            trail.trail_type = parse_enum(&trail_type)?;
            trail.estimated_length_meters = length;
            Ok(trail)
        });
        match decoded {
            Ok(trail) => trails.push(trail),
            Err(reason) => report.skip(TRAILS, id, reason),
        }
    }
    report.loaded = trails.len();
    Ok((MemoryStore::new(trails), report))
}

/// Load the routing graph from `road_network_vertices` and `road_network`.
///
/// Edge geometry that cannot be decoded is dropped with a warning; the edge
/// itself is kept.
///
/// # Errors
/// Returns [`SqliteStoreError`] when the database cannot be read or the
/// stored graph is invalid.
pub fn load_road_network(path: impl AsRef<Path>) -> Result<RoadNetwork, SqliteStoreError> {
    let connection = open_read_only(path.as_ref())?;
    let vertices = read_rows(
        &connection,
        VERTICES,
        "SELECT id, lon, lat FROM road_network_vertices ORDER BY id",
        |row| {
            Ok(GraphVertex {
                id: VertexId(row.get("id")?),
                coord: Coord {
                    x: row.get("lon")?,
                    y: row.get("lat")?,
                },
            })
        },
    )?;
    let edges = read_rows(
        &connection,
        EDGES,
        "SELECT id, source, target, cost, reverse_cost, geometry FROM road_network ORDER BY id",
        |row| {
            let geometry: Option<String> = row.get("geometry")?;
            Ok(GraphEdge {
                id: EdgeId(row.get("id")?),
                source: VertexId(row.get("source")?),
                target: VertexId(row.get("target")?),
                cost: row.get("cost")?,
                reverse_cost: row.get("reverse_cost")?,
                geometry: geometry.and_then(|json| decode_edge_geometry(&json)),
            })
        },
    )?;
    Ok(RoadNetwork::new(vertices, edges)?)
}

fn decode_edge_geometry(json: &str) -> Option<Vec<Coord<f64>>> {
    serde_json::from_str(json)
        .inspect_err(|err| warn!("dropping unparseable edge geometry: {err}"))
        .ok()
}

/// Write points of interest to the `pois` table, replacing rows with the same
/// id. The table is created when missing.
///
/// # Errors
/// Returns [`SqliteStoreError`] when the database cannot be written.
pub fn persist_points_of_interest(
    path: impl AsRef<Path>,
    pois: &[PointOfInterest],
) -> Result<(), SqliteStoreError> {
    with_transaction(path.as_ref(), |transaction| write_points_of_interest(transaction, pois))
}

fn write_points_of_interest(
    transaction: &Transaction<'_>,
    pois: &[PointOfInterest],
) -> Result<(), SqliteStoreError> {
    create_table(
        transaction,
        POIS,
        "CREATE TABLE IF NOT EXISTS pois (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            geometry TEXT NOT NULL,
            categories TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            trail_id INTEGER
        )",
    )?;
    let mut statement = transaction
        .prepare(
            "INSERT OR REPLACE INTO pois
             (id, name, description, geometry, categories, created_at, trail_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .map_err(|source| SqliteStoreError::PrepareInsert { table: POIS, source })?;
    for poi in pois {
        let columns = FeatureColumns::encode(POIS, &poi.feature)?;
        let trail_id = poi
            .trail_id
            .map(|trail| to_sql_id(POIS, trail.0))
            .transpose()?;
        statement
            .execute((
                columns.id,
                &poi.feature.name,
                &poi.feature.description,
                &columns.geometry,
                &columns.categories,
                columns.created_at,
                trail_id,
            ))
            .map_err(|source| SqliteStoreError::PersistRow {
                table: POIS,
                id: poi.feature.id.0,
                source,
            })?;
    }
    Ok(())
}

/// Write trails to the `trails` table, replacing rows with the same id.
///
/// # Errors
/// Returns [`SqliteStoreError`] when the database cannot be written.
pub fn persist_trails(path: impl AsRef<Path>, trails: &[Trail]) -> Result<(), SqliteStoreError> {
    with_transaction(path.as_ref(), |transaction| write_trails(transaction, trails))
}

fn write_trails(transaction: &Transaction<'_>, trails: &[Trail]) -> Result<(), SqliteStoreError> {
    create_table(
        transaction,
        TRAILS,
        "CREATE TABLE IF NOT EXISTS trails (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            geometry TEXT NOT NULL,
            categories TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            trail_type TEXT NOT NULL,
            difficulty TEXT NOT NULL,
            estimated_length_meters REAL
        )",
    )?;
    let mut statement = transaction
        .prepare(
            "INSERT OR REPLACE INTO trails
             (id, name, description, geometry, categories, created_at,
              trail_type, difficulty, estimated_length_meters)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .map_err(|source| SqliteStoreError::PrepareInsert {
            table: TRAILS,
            source,
        })?;
    for trail in trails {
        let id = trail.feature.id.0;
        let columns = FeatureColumns::encode(TRAILS, &trail.feature)?;
        let serialize = |source| SqliteStoreError::Serialize {
            table: TRAILS,
            id,
            source,
        };
        let trail_type = enum_text(&trail.trail_type).map_err(serialize)?;
        let difficulty = enum_text(&trail.difficulty).map_err(serialize)?;
        statement
            .execute((
                columns.id,
                &trail.feature.name,
                &trail.feature.description,
                &columns.geometry,
                &columns.categories,
                columns.created_at,
                trail_type,
                difficulty,
                trail.estimated_length_meters,
            ))
            .map_err(|source| SqliteStoreError::PersistRow {
                table: TRAILS,
                id,
                source,
            })?;
    }
    Ok(())
}

/// Write a road network to `road_network_vertices` and `road_network`.
///
/// # Errors
/// Returns [`SqliteStoreError`] when the database cannot be written.
pub fn persist_road_network(
    path: impl AsRef<Path>,
    network: &RoadNetwork,
) -> Result<(), SqliteStoreError> {
    with_transaction(path.as_ref(), |transaction| write_road_network(transaction, network))
}

/// Write points of interest, trails and a road network in one transaction.
///
/// Nothing is committed unless every row is written, so a failure leaves the
/// database as it was.
///
/// # Errors
/// Returns [`SqliteStoreError`] when the database cannot be written.
pub fn persist_dataset(
    path: impl AsRef<Path>,
    pois: &[PointOfInterest],
    trails: &[Trail],
    network: &RoadNetwork,
) -> Result<(), SqliteStoreError> {
    with_transaction(path.as_ref(), |transaction| {
        write_points_of_interest(transaction, pois)?;
        write_trails(transaction, trails)?;
        write_road_network(transaction, network)
    })
}

fn write_road_network(
    transaction: &Transaction<'_>,
    network: &RoadNetwork,
) -> Result<(), SqliteStoreError> {
    create_table(
        transaction,
        VERTICES,
        "CREATE TABLE IF NOT EXISTS road_network_vertices (
            id INTEGER PRIMARY KEY,
            lon REAL NOT NULL,
            lat REAL NOT NULL
        )",
    )?;
    create_table(
        transaction,
        EDGES,
        "CREATE TABLE IF NOT EXISTS road_network (
            id INTEGER PRIMARY KEY,
            source INTEGER NOT NULL,
            target INTEGER NOT NULL,
            cost REAL NOT NULL,
            reverse_cost REAL,
            geometry TEXT
        )",
    )?;
    for vertex in network.vertices() {
        transaction
            .execute(
                "INSERT OR REPLACE INTO road_network_vertices (id, lon, lat) VALUES (?1, ?2, ?3)",
                (to_sql_id(VERTICES, vertex.id.0)?, vertex.coord.x, vertex.coord.y),
            )
            .map_err(|source| SqliteStoreError::PersistRow {
                table: VERTICES,
                id: vertex.id.0,
                source,
            })?;
    }
    for edge in network.edges() {
        let geometry = edge
            .geometry
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|source| SqliteStoreError::Serialize {
                table: EDGES,
                id: edge.id.0,
                source,
            })?;
        transaction
            .execute(
                "INSERT OR REPLACE INTO road_network
                 (id, source, target, cost, reverse_cost, geometry)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (
                    to_sql_id(EDGES, edge.id.0)?,
                    to_sql_id(EDGES, edge.source.0)?,
                    to_sql_id(EDGES, edge.target.0)?,
                    edge.cost,
                    edge.reverse_cost,
                    geometry,
                ),
            )
            .map_err(|source| SqliteStoreError::PersistRow {
                table: EDGES,
                id: edge.id.0,
                source,
            })?;
    }
    Ok(())
}

/// Encoded columns shared by every feature table.
struct FeatureColumns {
    id: i64,
    geometry: String,
    categories: String,
    created_at: i64,
}

impl FeatureColumns {
    fn encode(table: &'static str, feature: &GeoFeature) -> Result<Self, SqliteStoreError> {
        let id = feature.id.0;
        let serialize = |source| SqliteStoreError::Serialize { table, id, source };
        let names: Vec<&str> = feature.categories.iter().map(|c| c.as_str()).collect();
        let seconds = feature
            .created_at
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        Ok(Self {
            id: to_sql_id(table, id)?,
            geometry: serde_json::to_string(&feature.geometry).map_err(serialize)?,
            categories: serde_json::to_string(&names).map_err(serialize)?,
            created_at: i64::try_from(seconds).unwrap_or(i64::MAX),
        })
    }
}

fn enum_text<T: serde::Serialize>(value: &T) -> Result<String, serde_json::Error> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(text) => Ok(text),
        other => Ok(other.to_string()),
    }
}

fn to_sql_id(table: &'static str, id: u64) -> Result<i64, SqliteStoreError> {
    i64::try_from(id).map_err(|_| SqliteStoreError::IdOutOfRange { table, id })
}

fn create_table(
    transaction: &Transaction<'_>,
    table: &'static str,
    sql: &str,
) -> Result<(), SqliteStoreError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| SqliteStoreError::CreateSchema { table, source })
}

fn with_transaction(
    path: &Path,
    write: impl FnOnce(&Transaction<'_>) -> Result<(), SqliteStoreError>,
) -> Result<(), SqliteStoreError> {
    let mut connection =
        Connection::open(path).map_err(|source| SqliteStoreError::OpenDatabase {
            path: path.to_path_buf(),
            source,
        })?;
    let transaction = connection
        .transaction()
        .map_err(|source| SqliteStoreError::BeginTransaction { source })?;
    write(&transaction)?;
    transaction
        .commit()
        .map_err(|source| SqliteStoreError::Commit { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::DifficultyLevel;
    use crate::store::FeatureStore;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp_db() -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("waypost.db");
        (dir, path)
    }

    fn poi(id: u64, x: f64, y: f64, categories: &[Category]) -> PointOfInterest {
        PointOfInterest::new(
            GeoFeature::new(FeatureId(id), format!("poi {id}"), GeometryKind::point(x, y))
                .with_categories(categories.iter().copied()),
        )
    }

    #[rstest]
    fn points_of_interest_survive_a_round_trip(
        #[from(temp_db)] (_dir, path): (TempDir, PathBuf),
    ) {
        let pois = vec![
            poi(2, 1.0, 1.0, &[Category::Shelter]).on_trail(FeatureId(9)),
            poi(1, 0.0, 0.0, &[Category::DrinkingWater, Category::Bench]),
        ];
        persist_points_of_interest(&path, &pois).expect("persist");
        let (store, report) = load_points_of_interest(&path).expect("load");
        assert_eq!(report.loaded, 2);
        assert!(report.skipped.is_empty());
        let loaded: Vec<_> = store.records().to_vec();
        let mut expected = pois;
        expected.sort_by_key(|p| p.feature.id);
        assert_eq!(loaded, expected);
    }

    #[rstest]
    fn malformed_rows_are_skipped(#[from(temp_db)] (_dir, path): (TempDir, PathBuf)) {
        persist_points_of_interest(&path, &[poi(1, 0.0, 0.0, &[])]).expect("persist");
        let connection = Connection::open(&path).expect("open database");
        connection
            .execute(
                "INSERT INTO pois (id, name, geometry, categories, created_at)
                 VALUES (2, 'bad geometry', 'not-json', '[]', 0),
                        (3, 'bad category', '{\"type\":\"Point\",\"coordinates\":{\"x\":0.0,\"y\":0.0}}', '[\"volcano\"]', 0)",
                [],
            )
            .expect("insert malformed rows");

        let (store, report) = load_points_of_interest(&path).expect("load");
        assert_eq!(store.len(), 1);
        let skipped: Vec<_> = report.skipped.iter().map(|s| s.id).collect();
        assert_eq!(skipped, vec![2, 3]);
    }

    #[rstest]
    fn trails_keep_grading(#[from(temp_db)] (_dir, path): (TempDir, PathBuf)) {
        let line = GeometryKind::LineString(vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }]);
        let mut trail = Trail::new(
            GeoFeature::new(FeatureId(4), "ridge", line),
            DifficultyLevel::Hard,
        );
        trail.estimated_length_meters = Some(1_500.0);
        persist_trails(&path, std::slice::from_ref(&trail)).expect("persist");
        let (store, report) = load_trails(&path).expect("load");
        assert_eq!(report.loaded, 1);
        assert_eq!(store.feature(FeatureId(4)), Some(trail));
    }

    #[rstest]
    fn road_network_survives_a_round_trip(#[from(temp_db)] (_dir, path): (TempDir, PathBuf)) {
        let network = RoadNetwork::new(
            vec![
                GraphVertex {
                    id: VertexId(1),
                    coord: Coord { x: 0.0, y: 0.0 },
                },
                GraphVertex {
                    id: VertexId(2),
                    coord: Coord { x: 0.01, y: 0.0 },
                },
            ],
            vec![GraphEdge::new(EdgeId(7), VertexId(1), VertexId(2), 2.5).with_reverse_cost(3.0)],
        )
        .expect("valid network");
        persist_road_network(&path, &network).expect("persist");
        let loaded = load_road_network(&path).expect("load");
        assert_eq!(loaded.vertices(), network.vertices());
        assert_eq!(loaded.edges(), network.edges());
    }

    #[rstest]
    fn invalid_stored_network_is_rejected(#[from(temp_db)] (_dir, path): (TempDir, PathBuf)) {
        let empty = RoadNetwork::empty();
        persist_road_network(&path, &empty).expect("create tables");
        let connection = Connection::open(&path).expect("open database");
        connection
            .execute(
                "INSERT INTO road_network (id, source, target, cost) VALUES (1, 1, 2, 1.0)",
                [],
            )
            .expect("insert dangling edge");
        let err = load_road_network(&path).expect_err("dangling edge");
        assert!(matches!(
            err,
            SqliteStoreError::InvalidNetwork(RoadNetworkError::DanglingEdge { .. })
        ));
    }

    #[rstest]
    fn missing_database_is_an_open_error(#[from(temp_db)] (_dir, path): (TempDir, PathBuf)) {
        let err = load_points_of_interest(&path).expect_err("missing file");
        assert!(matches!(err, SqliteStoreError::OpenDatabase { .. }));
    }

    #[rstest]
    fn dataset_write_is_all_or_nothing(#[from(temp_db)] (_dir, path): (TempDir, PathBuf)) {
        persist_points_of_interest(&path, &[poi(1, 0.0, 0.0, &[])]).expect("seed");
        let unrepresentable = Trail::new(
            GeoFeature::new(FeatureId(u64::MAX), "too far", GeometryKind::point(0.0, 0.0)),
            DifficultyLevel::Easy,
        );
        let err = persist_dataset(
            &path,
            &[poi(2, 1.0, 1.0, &[Category::Bench])],
            &[unrepresentable],
            &RoadNetwork::empty(),
        )
        .expect_err("trail id out of range");
        assert!(matches!(
            err,
            SqliteStoreError::IdOutOfRange { table: TRAILS, .. }
        ));

        let (store, _) = load_points_of_interest(&path).expect("load");
        let ids: Vec<_> = store.records().iter().map(|p| p.feature.id).collect();
        assert_eq!(ids, vec![FeatureId(1)]);
        let connection = Connection::open(&path).expect("open database");
        let trail_tables: i64 = connection
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = 'trails'",
                [],
                |row| row.get(0),
            )
            .expect("inspect schema");
        assert_eq!(trail_tables, 0);
    }

    #[rstest]
    fn out_of_range_id_is_rejected(#[from(temp_db)] (_dir, path): (TempDir, PathBuf)) {
        let err = persist_points_of_interest(&path, &[poi(u64::MAX, 0.0, 0.0, &[])])
            .expect_err("id too large");
        assert!(matches!(err, SqliteStoreError::IdOutOfRange { .. }));
    }
}
