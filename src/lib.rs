//! Facade crate for the Waypost spatial query engine.
//!
//! This crate re-exports the core geometry, query and routing types and
//! exposes the SQLite-backed store behind a feature flag.

#![forbid(unsafe_code)]

pub use waypost_core::{
    Category, DedupGroup, DifficultyLevel, EngineConfig, EngineError, Envelope, FeatureId,
    FeatureStore, GeoFeature, GeoRecord, GeometryContext, GeometryError, GeometryKind, MemoryStore,
    NoRouteError, NotFoundReason, PathStep, PointOfInterest, PrecisionModel, QueryEngine, Ranked,
    RelationReport, RoadNetwork, RouteOutcome, RoutingConfig, RoutingService, Trail, TrailType,
    UnsupportedGeometryError,
};

#[cfg(feature = "store-sqlite")]
pub use waypost_core::store::sqlite::{LoadReport, SqliteStoreError};
