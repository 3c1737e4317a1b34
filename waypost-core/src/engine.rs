//! Caller-facing spatial queries.
//!
//! [`QueryEngine`] combines a [`FeatureStore`] and a [`RoutingService`] and
//! turns each query into an ordered, deduplicated result set. The engine
//! never mutates either collaborator, so a single instance can be shared
//! between threads.

use std::num::NonZeroUsize;

use geo::Coord;
use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dedup::dedup;
use crate::error::{EngineError, NotFoundReason};
use crate::feature::{Category, FeatureId, GeoRecord};
use crate::geometry::{Envelope, GeometryContext, GeometryKind, PrecisionModel};
use crate::nearest::{
    DEFAULT_OVERSAMPLE_FACTOR, EQUATORIAL_METERS_PER_DEGREE, Ranked, meters_to_degrees, nearest_k,
    within_radius,
};
use crate::predicates::intersects;
use crate::relations::{RelationReport, detect_relations};
use crate::routing::{RouteOutcome, RoutingConfig, RoutingService};
use crate::store::FeatureStore;

/// Default cap on candidates fed to the pairwise relation scan.
pub const DEFAULT_MAX_RELATION_CANDIDATES: usize = 2_000;

/// Tunables of a [`QueryEngine`].
///
/// # Examples
/// ```
/// use waypost_core::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_oversample_factor(5)
///     .with_max_box_results(Some(1_000));
/// assert!(config.validate().is_ok());
/// assert!(EngineConfig::default().with_oversample_factor(0).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Multiplier applied to `k` before nearest-neighbour deduplication.
    pub oversample_factor: usize,
    /// Meters per degree used to convert radius queries.
    pub meters_per_degree: f64,
    /// Optional cap on bounding-box results.
    pub max_box_results: Option<usize>,
    /// Maximum number of candidates for relation detection.
    pub max_relation_candidates: usize,
    /// Traversal options for routing.
    pub routing: RoutingConfig,
    /// Reference system and precision of query geometries.
    pub context: GeometryContext,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            oversample_factor: DEFAULT_OVERSAMPLE_FACTOR,
            meters_per_degree: EQUATORIAL_METERS_PER_DEGREE,
            max_box_results: None,
            max_relation_candidates: DEFAULT_MAX_RELATION_CANDIDATES,
            routing: RoutingConfig::default(),
            context: GeometryContext::wgs84(),
        }
    }
}

impl EngineConfig {
    /// Set the nearest-neighbour oversample factor.
    #[must_use]
    pub const fn with_oversample_factor(mut self, factor: usize) -> Self {
        self.oversample_factor = factor;
        self
    }

    /// Set the meters-per-degree conversion.
    #[must_use]
    pub const fn with_meters_per_degree(mut self, meters_per_degree: f64) -> Self {
        self.meters_per_degree = meters_per_degree;
        self
    }

    /// Cap bounding-box results.
    #[must_use]
    pub const fn with_max_box_results(mut self, limit: Option<usize>) -> Self {
        self.max_box_results = limit;
        self
    }

    /// Set the relation candidate cap.
    #[must_use]
    pub const fn with_max_relation_candidates(mut self, limit: usize) -> Self {
        self.max_relation_candidates = limit;
        self
    }

    /// Replace the routing options.
    #[must_use]
    pub const fn with_routing(mut self, routing: RoutingConfig) -> Self {
        self.routing = routing;
        self
    }

    /// Replace the geometry context.
    #[must_use]
    pub const fn with_context(mut self, context: GeometryContext) -> Self {
        self.context = context;
        self
    }

    /// Check every tunable is usable.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidConfig`] for a zero oversample factor,
    /// a non-positive or non-finite meters-per-degree, or a fixed precision
    /// model with a non-positive scale.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.oversample_factor == 0 {
            return Err(EngineError::invalid_config(
                "oversample factor must be at least 1",
            ));
        }
        if !(self.meters_per_degree.is_finite() && self.meters_per_degree > 0.0) {
            return Err(EngineError::invalid_config(
                "meters per degree must be positive and finite",
            ));
        }
        if let PrecisionModel::Fixed { scale } = self.context.precision
            && !(scale.is_finite() && scale > 0.0)
        {
            return Err(EngineError::invalid_config(
                "fixed precision scale must be positive and finite",
            ));
        }
        Ok(())
    }
}

/// Spatial query engine over a feature store and a routing service.
///
/// # Examples
/// ```
/// use waypost_core::{
///     EngineConfig, FeatureId, GeoFeature, GeometryKind, MemoryStore, QueryEngine, RoadNetwork,
/// };
///
/// let store = MemoryStore::new(vec![
///     GeoFeature::new(FeatureId(1), "spring", GeometryKind::point(0.0, 0.0)),
///     GeoFeature::new(FeatureId(2), "hut", GeometryKind::point(0.001, 0.0)),
/// ]);
/// let engine = QueryEngine::new(store, RoadNetwork::empty(), EngineConfig::default())?;
/// let nearest = engine.nearest(0.0009, 0.0, 1)?;
/// assert_eq!(nearest[0].record.id, FeatureId(2));
/// # Ok::<(), waypost_core::EngineError>(())
/// ```
#[derive(Debug)]
pub struct QueryEngine<S, G> {
    store: S,
    router: G,
    config: EngineConfig,
}

impl<S, G> QueryEngine<S, G>
where
    S: FeatureStore,
    G: RoutingService,
{
    /// Create an engine after validating `config`.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidConfig`] when the configuration is
    /// rejected by [`EngineConfig::validate`].
    pub fn new(store: S, router: G, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            store,
            router,
            config,
        })
    }

    /// Borrow the active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Borrow the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Records intersecting the bounding box, ascending by id.
    ///
    /// Corners are normalised. The result is capped by
    /// [`EngineConfig::max_box_results`] when set.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidQuery`] for non-finite bounds.
    pub fn features_in_box(
        &self,
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    ) -> Result<Vec<S::Record>, EngineError> {
        if ![min_lon, min_lat, max_lon, max_lat]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(EngineError::invalid_query("bounding box must be finite"));
        }
        let envelope = Envelope::new(min_lon, min_lat, max_lon, max_lat);
        let limit = self.config.max_box_results.unwrap_or(usize::MAX);
        let found: Vec<_> = self.store.features_in(&envelope).take(limit).collect();
        debug!("bounding box query returned {} records", found.len());
        Ok(found)
    }

    /// Records tagged with `category`, ascending by id.
    #[must_use]
    pub fn features_by_category(&self, category: Category) -> Vec<S::Record> {
        self.store.features_by_category(category).collect()
    }

    /// Distinct records whose geometry intersects `geometry`.
    ///
    /// The query geometry is re-expressed in the engine's context and
    /// validated first; open polygon rings are closed.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidGeometryInput`] for malformed input.
    pub fn filter_by_geometry(&self, geometry: &GeometryKind) -> Result<Vec<S::Record>, EngineError> {
        let query = self.config.context.geometry(geometry.clone())?;
        let matches = self
            .store
            .features_in(&query.envelope())
            .filter(|record| intersects(record.geometry(), &query));
        Ok(dedup(matches))
    }

    /// Distinct records within `radius_meters` of a point, in store order.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidQuery`] for a non-finite position or a
    /// negative or non-finite radius.
    pub fn within_radius(
        &self,
        lon: f64,
        lat: f64,
        radius_meters: f64,
    ) -> Result<Vec<Ranked<S::Record>>, EngineError> {
        let centre = self.query_point(lon, lat)?;
        if !radius_meters.is_finite() || radius_meters < 0.0 {
            return Err(EngineError::invalid_query(
                "radius must be a non-negative finite number of meters",
            ));
        }
        let threshold = meters_to_degrees(radius_meters, self.config.meters_per_degree);
        let candidates = self
            .store
            .features_in(&Envelope::around(centre, threshold));
        Ok(within_radius(centre, threshold, candidates))
    }

    /// Up to `k` distinct records nearest to a point.
    ///
    /// See [`nearest_k`] for the oversampling heuristic and its limitation.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidQuery`] when `k` is zero or the
    /// position is not finite.
    pub fn nearest(
        &self,
        lon: f64,
        lat: f64,
        k: usize,
    ) -> Result<Vec<Ranked<S::Record>>, EngineError> {
        let centre = self.query_point(lon, lat)?;
        let count =
            NonZeroUsize::new(k).ok_or_else(|| EngineError::invalid_query("k must be at least 1"))?;
        let factor = NonZeroUsize::new(self.config.oversample_factor)
            .ok_or_else(|| EngineError::invalid_config("oversample factor must be at least 1"))?;
        let window = count.get().saturating_mul(factor.get());
        let candidates = self.store.nearest_candidates(centre, window);
        Ok(nearest_k(centre, count, factor, candidates))
    }

    /// Intersecting and containing pairs among records in the envelope.
    ///
    /// # Errors
    /// Returns [`EngineError::CandidateSetTooLarge`] when more than
    /// [`EngineConfig::max_relation_candidates`] records fall in the
    /// envelope.
    pub fn relations_in_box(
        &self,
        envelope: &Envelope,
    ) -> Result<RelationReport<S::Record>, EngineError> {
        let limit = self.config.max_relation_candidates;
        let candidates: Vec<_> = self
            .store
            .features_in(envelope)
            .take(limit.saturating_add(1))
            .collect();
        if candidates.len() > limit {
            return Err(EngineError::CandidateSetTooLarge { limit });
        }
        Ok(detect_relations(&candidates))
    }

    /// Route from a coordinate to the point geometry of a stored feature.
    ///
    /// Both ends are snapped to their nearest road-network vertex.
    ///
    /// # Errors
    /// Returns [`EngineError::FeatureNotFound`] when the destination is
    /// missing or not a point, and [`EngineError::NoRoute`] when snapping or
    /// vertex lookup fails. An unreachable destination is
    /// `Ok(RouteOutcome::NoPath)`.
    pub fn route_to_feature(
        &self,
        start: Coord<f64>,
        destination: FeatureId,
    ) -> Result<RouteOutcome, EngineError> {
        let record = self
            .store
            .feature(destination)
            .ok_or(EngineError::FeatureNotFound {
                id: destination,
                reason: NotFoundReason::Missing,
            })?;
        let target = record
            .geometry()
            .as_point()
            .ok_or(EngineError::FeatureNotFound {
                id: destination,
                reason: NotFoundReason::NoPointGeometry,
            })?;
        let origin = self.config.context.coord(start.x, start.y);
        let outcome = self.router.route(origin, target, &self.config.routing)?;
        debug!(
            "route to feature {destination}: {}",
            outcome
                .total_cost()
                .map_or_else(|| String::from("no path"), |cost| format!("cost {cost}"))
        );
        Ok(outcome)
    }

    fn query_point(&self, lon: f64, lat: f64) -> Result<Coord<f64>, EngineError> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(EngineError::invalid_query("query position must be finite"));
        }
        Ok(self.config.context.coord(lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{GeoFeature, PointOfInterest};
    use crate::geometry::GeometryError;
    use crate::routing::{NoRouteError, RoadNetwork};
    use crate::store::MemoryStore;
    use crate::test_support::{StaticRouter, line_feature, point_feature, square_feature};
    use rstest::{fixture, rstest};

    type Engine = QueryEngine<MemoryStore<GeoFeature>, RoadNetwork>;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    #[fixture]
    fn engine() -> Engine {
        let store = MemoryStore::new(vec![
            point_feature(1, 0.0, 0.0, &[Category::Shelter]),
            point_feature(2, 0.0, 0.0, &[Category::DrinkingWater]),
            point_feature(3, 0.001, 0.0, &[Category::Bench]),
            point_feature(4, 0.01, 0.01, &[]),
            square_feature(5, 0.3, 0.3, 0.7),
            line_feature(6, &[(0.4, 0.6), (0.8, 0.6)]),
        ]);
        QueryEngine::new(store, RoadNetwork::empty(), EngineConfig::default())
            .expect("valid config")
    }

    fn ids<R: GeoRecord>(records: &[R]) -> Vec<u64> {
        records.iter().map(|r| r.id().0).collect()
    }

    fn ranked_ids<R: GeoRecord>(ranked: &[Ranked<R>]) -> Vec<u64> {
        ranked.iter().map(|r| r.record.id().0).collect()
    }

    #[rstest]
    fn invalid_config_is_rejected() {
        let config = EngineConfig::default().with_meters_per_degree(0.0);
        let err = QueryEngine::new(
            MemoryStore::<GeoFeature>::default(),
            RoadNetwork::empty(),
            config,
        )
        .expect_err("invalid config");
        assert!(matches!(err, EngineError::InvalidConfig { .. }));
    }

    #[rstest]
    fn box_query_normalises_corners(engine: Engine) {
        let found = engine
            .features_in_box(0.02, 0.02, -0.01, -0.01)
            .expect("finite box");
        assert_eq!(ids(&found), vec![1, 2, 3, 4]);
    }

    #[rstest]
    fn box_query_honours_result_cap() {
        let store = MemoryStore::new((1..=5).map(|id| point_feature(id, 0.0, 0.0, &[])));
        let config = EngineConfig::default().with_max_box_results(Some(2));
        let engine =
            QueryEngine::new(store, RoadNetwork::empty(), config).expect("valid config");
        let found = engine.features_in_box(-1.0, -1.0, 1.0, 1.0).expect("finite");
        assert_eq!(ids(&found), vec![1, 2]);
    }

    #[rstest]
    fn box_query_rejects_nan(engine: Engine) {
        let err = engine
            .features_in_box(f64::NAN, 0.0, 1.0, 1.0)
            .expect_err("nan bound");
        assert!(matches!(err, EngineError::InvalidQuery { .. }));
    }

    #[rstest]
    fn category_query_keeps_id_order(engine: Engine) {
        assert_eq!(ids(&engine.features_by_category(Category::Shelter)), vec![1]);
    }

    #[rstest]
    fn geometry_filter_dedups_and_closes_rings(engine: Engine) {
        let open_ring = GeometryKind::Polygon(vec![
            c(-0.1, -0.1),
            c(0.005, -0.1),
            c(0.005, 0.005),
            c(-0.1, 0.005),
        ]);
        let found = engine.filter_by_geometry(&open_ring).expect("closable ring");
        assert_eq!(ids(&found), vec![1, 3]);
        let merged = found.first().expect("first");
        assert!(merged.categories.contains(&Category::DrinkingWater));
    }

    #[rstest]
    fn geometry_filter_rejects_degenerate_ring(engine: Engine) {
        let err = engine
            .filter_by_geometry(&GeometryKind::Polygon(vec![c(0.0, 0.0), c(1.0, 1.0)]))
            .expect_err("degenerate ring");
        assert_eq!(
            err,
            EngineError::InvalidGeometryInput(GeometryError::RingNotClosable { distinct: 2 })
        );
    }

    #[rstest]
    fn radius_query_converts_meters(engine: Engine) {
        let found = engine.within_radius(0.0, 0.0, 150.0).expect("valid radius");
        assert_eq!(ranked_ids(&found), vec![1, 3]);
        let none = engine.within_radius(0.0, 0.0, 50.0).expect("valid radius");
        assert_eq!(ranked_ids(&none), vec![1]);
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::INFINITY)]
    fn radius_query_rejects_bad_radius(engine: Engine, #[case] radius: f64) {
        let err = engine.within_radius(0.0, 0.0, radius).expect_err("bad radius");
        assert!(matches!(err, EngineError::InvalidQuery { .. }));
    }

    #[rstest]
    fn nearest_query_dedups_and_ranks(engine: Engine) {
        let found = engine.nearest(0.0, 0.0, 2).expect("valid k");
        assert_eq!(ranked_ids(&found), vec![1, 3]);
    }

    #[rstest]
    fn nearest_query_rejects_zero_k(engine: Engine) {
        let err = engine.nearest(0.0, 0.0, 0).expect_err("k = 0");
        assert!(matches!(err, EngineError::InvalidQuery { .. }));
    }

    #[rstest]
    fn relations_report_polygon_members(engine: Engine) {
        let report = engine
            .relations_in_box(&Envelope::new(0.3, 0.3, 1.2, 1.2))
            .expect("small candidate set");
        assert_eq!(report.intersecting, vec![(FeatureId(5), FeatureId(6))]);
        assert_eq!(report.containing, vec![(FeatureId(5), FeatureId(6))]);
    }

    #[rstest]
    fn relations_guard_caps_candidates() {
        let store = MemoryStore::new((1..=3).map(|id| point_feature(id, 0.0, 0.0, &[])));
        let config = EngineConfig::default().with_max_relation_candidates(2);
        let engine =
            QueryEngine::new(store, RoadNetwork::empty(), config).expect("valid config");
        let err = engine
            .relations_in_box(&Envelope::new(-1.0, -1.0, 1.0, 1.0))
            .expect_err("too many candidates");
        assert_eq!(err, EngineError::CandidateSetTooLarge { limit: 2 });
    }

    #[rstest]
    fn route_requires_known_point_destination() {
        let store = MemoryStore::new(vec![
            PointOfInterest::new(point_feature(1, 0.0, 0.0, &[])),
            PointOfInterest::new(square_feature(2, 0.0, 0.0, 1.0)),
        ]);
        let engine = QueryEngine::new(store, StaticRouter::no_path(), EngineConfig::default())
            .expect("valid config");
        let missing = engine
            .route_to_feature(c(0.0, 0.0), FeatureId(9))
            .expect_err("missing");
        assert_eq!(
            missing,
            EngineError::FeatureNotFound {
                id: FeatureId(9),
                reason: NotFoundReason::Missing,
            }
        );
        let polygon = engine
            .route_to_feature(c(0.0, 0.0), FeatureId(2))
            .expect_err("not a point");
        assert!(matches!(
            polygon,
            EngineError::FeatureNotFound {
                reason: NotFoundReason::NoPointGeometry,
                ..
            }
        ));
        let outcome = engine
            .route_to_feature(c(0.0, 0.0), FeatureId(1))
            .expect("point destination");
        assert_eq!(outcome, RouteOutcome::NoPath);
    }

    #[rstest]
    fn route_on_empty_network_reports_no_route(engine: Engine) {
        let err = engine
            .route_to_feature(c(0.0, 0.0), FeatureId(1))
            .expect_err("empty graph");
        assert_eq!(err, EngineError::NoRoute(NoRouteError::EmptyGraph));
    }
}
