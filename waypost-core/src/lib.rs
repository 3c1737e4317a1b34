//! Core types and algorithms for the Waypost spatial query engine.
//!
//! Features carry a [`GeometryKind`] in WGS84 longitude/latitude order and
//! live in a [`FeatureStore`]. The [`QueryEngine`] answers bounding-box,
//! category, geometry, radius and nearest-neighbour queries over a store,
//! reports pairwise relations, and routes to features over a
//! [`RoadNetwork`] through the [`RoutingService`] seam. Results are
//! deduplicated by exact geometry so overlapping datasets do not surface
//! the same place twice.

#![forbid(unsafe_code)]

pub mod dedup;
pub mod engine;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod nearest;
pub mod predicates;
pub mod relations;
pub mod routing;
pub mod store;
pub mod test_support;

pub use dedup::{CanonicalKey, DedupGroup};
pub use engine::{EngineConfig, QueryEngine};
pub use error::{EngineError, NotFoundReason};
pub use feature::{
    Category, DifficultyLevel, FeatureId, GeoFeature, GeoRecord, PointOfInterest, Trail, TrailType,
};
pub use geometry::{
    Envelope, GeometryContext, GeometryError, GeometryKind, GeometryTag, PrecisionModel,
    WGS84_SRID,
};
pub use nearest::Ranked;
pub use predicates::UnsupportedGeometryError;
pub use relations::RelationReport;
pub use routing::{
    NoRouteError, PathStep, RoadNetwork, RouteOutcome, RoutingConfig, RoutingService,
};
pub use store::{FeatureStore, MemoryStore};
