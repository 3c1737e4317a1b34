//! Query subcommands: argument layering, resolution and execution.

use camino::Utf8PathBuf;
use clap::Parser;
use geo::Coord;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use waypost_core::{
    Category, Envelope, FeatureId, FeatureStore, GeometryKind, QueryEngine, RoadNetwork,
    RoutingConfig,
};

use crate::dataset::{DatasetConfig, EngineQuery, FeatureTable, read_json, to_json};
use crate::{
    ARG_CATEGORY, ARG_DATABASE, ARG_FROM_LAT, ARG_FROM_LON, ARG_GEOMETRY, ARG_LAT, ARG_LON,
    ARG_MAX_LAT, ARG_MAX_LON, ARG_MIN_LAT, ARG_MIN_LON, ARG_RADIUS, ARG_TO, CliError, env_var,
};

/// Number of results `nearest` returns when `--k` is not given.
pub(crate) const DEFAULT_K: usize = 10;

/// A resolved query ready to run against its dataset.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Invocation<Q> {
    pub(crate) dataset: DatasetConfig,
    pub(crate) query: Q,
}

fn required<T>(value: Option<T>, command: &str, field: &'static str) -> Result<T, CliError> {
    value.ok_or_else(|| CliError::MissingArgument {
        field,
        env: env_var(command, field),
    })
}

fn dataset(
    command: &str,
    database: Option<Utf8PathBuf>,
    trails: bool,
) -> Result<DatasetConfig, CliError> {
    let path = required(database, command, ARG_DATABASE)?;
    Ok(DatasetConfig::new(path, FeatureTable::from_flag(trails)))
}

fn bounds(
    command: &str,
    corners: [Option<f64>; 4],
) -> Result<Envelope, CliError> {
    let [min_lon, min_lat, max_lon, max_lat] = corners;
    Ok(Envelope::new(
        required(min_lon, command, ARG_MIN_LON)?,
        required(min_lat, command, ARG_MIN_LAT)?,
        required(max_lon, command, ARG_MAX_LON)?,
        required(max_lat, command, ARG_MAX_LAT)?,
    ))
}

/// CLI arguments for the `bbox` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "bbox",
    about = "List features intersecting a bounding box",
    allow_negative_numbers = true
)]
#[ortho_config(prefix = "WAYPOST")]
pub(crate) struct BboxArgs {
    /// Path to the SQLite dataset.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Query the trails table instead of points of interest.
    #[arg(long)]
    #[serde(default)]
    pub(crate) trails: bool,
    /// Western edge in degrees.
    #[arg(long = ARG_MIN_LON, value_name = "deg")]
    #[serde(default)]
    pub(crate) min_lon: Option<f64>,
    /// Southern edge in degrees.
    #[arg(long = ARG_MIN_LAT, value_name = "deg")]
    #[serde(default)]
    pub(crate) min_lat: Option<f64>,
    /// Eastern edge in degrees.
    #[arg(long = ARG_MAX_LON, value_name = "deg")]
    #[serde(default)]
    pub(crate) max_lon: Option<f64>,
    /// Northern edge in degrees.
    #[arg(long = ARG_MAX_LAT, value_name = "deg")]
    #[serde(default)]
    pub(crate) max_lat: Option<f64>,
    /// Maximum number of features to print.
    #[arg(long, value_name = "count")]
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

/// Features intersecting an envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BoxQuery {
    pub(crate) envelope: Envelope,
}

impl EngineQuery for BoxQuery {
    fn run<S>(&self, engine: &QueryEngine<S, RoadNetwork>) -> Result<Value, CliError>
    where
        S: FeatureStore,
        S::Record: Serialize,
    {
        let e = &self.envelope;
        let found = engine.features_in_box(e.min_lon(), e.min_lat(), e.max_lon(), e.max_lat())?;
        to_json(&found)
    }
}

impl BboxArgs {
    pub(crate) fn into_invocation(self) -> Result<Invocation<BoxQuery>, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Invocation::try_from(merged)
    }
}

impl TryFrom<BboxArgs> for Invocation<BoxQuery> {
    type Error = CliError;

    fn try_from(args: BboxArgs) -> Result<Self, Self::Error> {
        let envelope = bounds(
            "bbox",
            [args.min_lon, args.min_lat, args.max_lon, args.max_lat],
        )?;
        let mut dataset = dataset("bbox", args.database, args.trails)?;
        dataset.engine = dataset.engine.with_max_box_results(args.limit);
        Ok(Self {
            dataset,
            query: BoxQuery { envelope },
        })
    }
}

/// CLI arguments for the `category` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "category", about = "List features tagged with a category")]
#[ortho_config(prefix = "WAYPOST")]
pub(crate) struct CategoryArgs {
    /// Category name, e.g. `DrinkingWater` (case is ignored).
    #[arg(value_name = "category")]
    #[serde(default)]
    pub(crate) category: Option<String>,
    /// Path to the SQLite dataset.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Query the trails table instead of points of interest.
    #[arg(long)]
    #[serde(default)]
    pub(crate) trails: bool,
}

/// Features carrying one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CategoryQuery {
    pub(crate) category: Category,
}

impl EngineQuery for CategoryQuery {
    fn run<S>(&self, engine: &QueryEngine<S, RoadNetwork>) -> Result<Value, CliError>
    where
        S: FeatureStore,
        S::Record: Serialize,
    {
        to_json(&engine.features_by_category(self.category))
    }
}

impl CategoryArgs {
    pub(crate) fn into_invocation(self) -> Result<Invocation<CategoryQuery>, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Invocation::try_from(merged)
    }
}

impl TryFrom<CategoryArgs> for Invocation<CategoryQuery> {
    type Error = CliError;

    fn try_from(args: CategoryArgs) -> Result<Self, Self::Error> {
        let name = required(args.category, "category", ARG_CATEGORY)?;
        let category = name.parse::<Category>().map_err(CliError::InvalidCategory)?;
        Ok(Self {
            dataset: dataset("category", args.database, args.trails)?,
            query: CategoryQuery { category },
        })
    }
}

/// CLI arguments for the `filter` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "filter",
    long_about = "List distinct features intersecting a query geometry. The \
                 geometry is read from a JSON file such as \
                 {\"type\":\"Polygon\",\"coordinates\":[{\"x\":0,\"y\":0},...]}; \
                 open polygon rings are closed automatically.",
    about = "List features intersecting a geometry"
)]
#[ortho_config(prefix = "WAYPOST")]
pub(crate) struct FilterArgs {
    /// Path to a JSON file holding the query geometry.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) geometry: Option<Utf8PathBuf>,
    /// Path to the SQLite dataset.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Query the trails table instead of points of interest.
    #[arg(long)]
    #[serde(default)]
    pub(crate) trails: bool,
}

/// Features intersecting a geometry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FilterQuery {
    pub(crate) geometry: GeometryKind,
}

impl EngineQuery for FilterQuery {
    fn run<S>(&self, engine: &QueryEngine<S, RoadNetwork>) -> Result<Value, CliError>
    where
        S: FeatureStore,
        S::Record: Serialize,
    {
        to_json(&engine.filter_by_geometry(&self.geometry)?)
    }
}

impl FilterArgs {
    pub(crate) fn into_invocation(self) -> Result<Invocation<FilterQuery>, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Invocation::try_from(merged)
    }
}

impl TryFrom<FilterArgs> for Invocation<FilterQuery> {
    type Error = CliError;

    fn try_from(args: FilterArgs) -> Result<Self, Self::Error> {
        let path = required(args.geometry, "filter", ARG_GEOMETRY)?;
        let geometry = read_json(&path)?;
        Ok(Self {
            dataset: dataset("filter", args.database, args.trails)?,
            query: FilterQuery { geometry },
        })
    }
}

/// CLI arguments for the `nearby` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "nearby",
    about = "List features within a radius of a point",
    allow_negative_numbers = true
)]
#[ortho_config(prefix = "WAYPOST")]
pub(crate) struct NearbyArgs {
    /// Path to the SQLite dataset.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Query the trails table instead of points of interest.
    #[arg(long)]
    #[serde(default)]
    pub(crate) trails: bool,
    /// Longitude of the centre in degrees.
    #[arg(long = ARG_LON, value_name = "deg")]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// Latitude of the centre in degrees.
    #[arg(long = ARG_LAT, value_name = "deg")]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Search radius in meters.
    #[arg(long = ARG_RADIUS, value_name = "meters")]
    #[serde(default)]
    pub(crate) radius: Option<f64>,
}

/// Features within a radius of a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RadiusQuery {
    pub(crate) centre: Coord<f64>,
    pub(crate) radius_meters: f64,
}

impl EngineQuery for RadiusQuery {
    fn run<S>(&self, engine: &QueryEngine<S, RoadNetwork>) -> Result<Value, CliError>
    where
        S: FeatureStore,
        S::Record: Serialize,
    {
        let found = engine.within_radius(self.centre.x, self.centre.y, self.radius_meters)?;
        to_json(&found)
    }
}

impl NearbyArgs {
    pub(crate) fn into_invocation(self) -> Result<Invocation<RadiusQuery>, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Invocation::try_from(merged)
    }
}

impl TryFrom<NearbyArgs> for Invocation<RadiusQuery> {
    type Error = CliError;

    fn try_from(args: NearbyArgs) -> Result<Self, Self::Error> {
        let centre = Coord {
            x: required(args.lon, "nearby", ARG_LON)?,
            y: required(args.lat, "nearby", ARG_LAT)?,
        };
        let radius_meters = required(args.radius, "nearby", ARG_RADIUS)?;
        Ok(Self {
            dataset: dataset("nearby", args.database, args.trails)?,
            query: RadiusQuery {
                centre,
                radius_meters,
            },
        })
    }
}

/// CLI arguments for the `nearest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "nearest",
    long_about = "List the k distinct features nearest to a point. The \
                 engine ranks k times the oversample factor candidates \
                 before removing duplicate geometries; raise the factor \
                 when the dataset holds many overlapping records.",
    about = "List the features nearest to a point",
    allow_negative_numbers = true
)]
#[ortho_config(prefix = "WAYPOST")]
pub(crate) struct NearestArgs {
    /// Path to the SQLite dataset.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Query the trails table instead of points of interest.
    #[arg(long)]
    #[serde(default)]
    pub(crate) trails: bool,
    /// Longitude of the query point in degrees.
    #[arg(long = ARG_LON, value_name = "deg")]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// Latitude of the query point in degrees.
    #[arg(long = ARG_LAT, value_name = "deg")]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Number of results.
    #[arg(long, value_name = "count")]
    #[serde(default)]
    pub(crate) k: Option<usize>,
    /// Candidates ranked per requested result before deduplication.
    #[arg(long, value_name = "factor")]
    #[serde(default)]
    pub(crate) oversample_factor: Option<usize>,
}

/// The `k` features nearest to a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NearestQuery {
    pub(crate) centre: Coord<f64>,
    pub(crate) k: usize,
}

impl EngineQuery for NearestQuery {
    fn run<S>(&self, engine: &QueryEngine<S, RoadNetwork>) -> Result<Value, CliError>
    where
        S: FeatureStore,
        S::Record: Serialize,
    {
        to_json(&engine.nearest(self.centre.x, self.centre.y, self.k)?)
    }
}

impl NearestArgs {
    pub(crate) fn into_invocation(self) -> Result<Invocation<NearestQuery>, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Invocation::try_from(merged)
    }
}

impl TryFrom<NearestArgs> for Invocation<NearestQuery> {
    type Error = CliError;

    fn try_from(args: NearestArgs) -> Result<Self, Self::Error> {
        let centre = Coord {
            x: required(args.lon, "nearest", ARG_LON)?,
            y: required(args.lat, "nearest", ARG_LAT)?,
        };
        let mut dataset = dataset("nearest", args.database, args.trails)?;
        if let Some(factor) = args.oversample_factor {
            dataset.engine = dataset.engine.with_oversample_factor(factor);
        }
        dataset.engine.validate()?;
        Ok(Self {
            dataset,
            query: NearestQuery {
                centre,
                k: args.k.unwrap_or(DEFAULT_K),
            },
        })
    }
}

/// CLI arguments for the `relations` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "relations",
    about = "Report intersecting and containing pairs inside a bounding box",
    allow_negative_numbers = true
)]
#[ortho_config(prefix = "WAYPOST")]
pub(crate) struct RelationsArgs {
    /// Path to the SQLite dataset.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Query the trails table instead of points of interest.
    #[arg(long)]
    #[serde(default)]
    pub(crate) trails: bool,
    /// Western edge in degrees.
    #[arg(long = ARG_MIN_LON, value_name = "deg")]
    #[serde(default)]
    pub(crate) min_lon: Option<f64>,
    /// Southern edge in degrees.
    #[arg(long = ARG_MIN_LAT, value_name = "deg")]
    #[serde(default)]
    pub(crate) min_lat: Option<f64>,
    /// Eastern edge in degrees.
    #[arg(long = ARG_MAX_LON, value_name = "deg")]
    #[serde(default)]
    pub(crate) max_lon: Option<f64>,
    /// Northern edge in degrees.
    #[arg(long = ARG_MAX_LAT, value_name = "deg")]
    #[serde(default)]
    pub(crate) max_lat: Option<f64>,
    /// Refuse boxes holding more candidates than this.
    #[arg(long, value_name = "count")]
    #[serde(default)]
    pub(crate) max_candidates: Option<usize>,
}

/// Pairwise relations inside an envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RelationsQuery {
    pub(crate) envelope: Envelope,
}

impl EngineQuery for RelationsQuery {
    fn run<S>(&self, engine: &QueryEngine<S, RoadNetwork>) -> Result<Value, CliError>
    where
        S: FeatureStore,
        S::Record: Serialize,
    {
        to_json(&engine.relations_in_box(&self.envelope)?)
    }
}

impl RelationsArgs {
    pub(crate) fn into_invocation(self) -> Result<Invocation<RelationsQuery>, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Invocation::try_from(merged)
    }
}

impl TryFrom<RelationsArgs> for Invocation<RelationsQuery> {
    type Error = CliError;

    fn try_from(args: RelationsArgs) -> Result<Self, Self::Error> {
        let envelope = bounds(
            "relations",
            [args.min_lon, args.min_lat, args.max_lon, args.max_lat],
        )?;
        let mut dataset = dataset("relations", args.database, args.trails)?;
        if let Some(limit) = args.max_candidates {
            dataset.engine = dataset.engine.with_max_relation_candidates(limit);
        }
        Ok(Self {
            dataset,
            query: RelationsQuery { envelope },
        })
    }
}

/// CLI arguments for the `route` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "route",
    long_about = "Route over the stored road network from a coordinate to a \
                 point of interest. Both ends snap to their nearest network \
                 vertex.",
    about = "Route to a point of interest",
    allow_negative_numbers = true
)]
#[ortho_config(prefix = "WAYPOST")]
pub(crate) struct RouteArgs {
    /// Path to the SQLite dataset.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Longitude of the start in degrees.
    #[arg(long = ARG_FROM_LON, value_name = "deg")]
    #[serde(default)]
    pub(crate) from_lon: Option<f64>,
    /// Latitude of the start in degrees.
    #[arg(long = ARG_FROM_LAT, value_name = "deg")]
    #[serde(default)]
    pub(crate) from_lat: Option<f64>,
    /// Identifier of the destination point of interest.
    #[arg(long = ARG_TO, value_name = "id")]
    #[serde(default)]
    pub(crate) to: Option<u64>,
    /// Allow edges to be walked against their direction.
    #[arg(long)]
    #[serde(default)]
    pub(crate) undirected: bool,
}

/// A route from a coordinate to a stored point of interest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RouteQuery {
    pub(crate) start: Coord<f64>,
    pub(crate) destination: FeatureId,
}

impl EngineQuery for RouteQuery {
    const NEEDS_NETWORK: bool = true;

    fn run<S>(&self, engine: &QueryEngine<S, RoadNetwork>) -> Result<Value, CliError>
    where
        S: FeatureStore,
        S::Record: Serialize,
    {
        to_json(&engine.route_to_feature(self.start, self.destination)?)
    }
}

impl RouteArgs {
    pub(crate) fn into_invocation(self) -> Result<Invocation<RouteQuery>, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Invocation::try_from(merged)
    }
}

impl TryFrom<RouteArgs> for Invocation<RouteQuery> {
    type Error = CliError;

    fn try_from(args: RouteArgs) -> Result<Self, Self::Error> {
        let start = Coord {
            x: required(args.from_lon, "route", ARG_FROM_LON)?,
            y: required(args.from_lat, "route", ARG_FROM_LAT)?,
        };
        let destination = FeatureId(required(args.to, "route", ARG_TO)?);
        let mut dataset = dataset("route", args.database, false)?;
        if args.undirected {
            dataset.engine = dataset.engine.with_routing(RoutingConfig::undirected());
        }
        Ok(Self {
            dataset,
            query: RouteQuery { start, destination },
        })
    }
}
