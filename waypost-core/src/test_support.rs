//! Fixture builders shared by unit, behaviour and benchmark code.

use geo::Coord;

use crate::feature::{Category, DifficultyLevel, FeatureId, GeoFeature, PointOfInterest, Trail};
use crate::geometry::GeometryKind;
use crate::routing::{EdgeId, GraphEdge, GraphVertex, RoadNetwork, RoadNetworkError, VertexId};
#[cfg(any(test, feature = "test-support"))]
use crate::routing::{NoRouteError, RouteOutcome, RoutingConfig, RoutingService};

/// Point feature named after its id.
#[must_use]
pub fn point_feature(id: u64, x: f64, y: f64, categories: &[Category]) -> GeoFeature {
    GeoFeature::new(FeatureId(id), format!("feature {id}"), GeometryKind::point(x, y))
        .with_categories(categories.iter().copied())
}

/// Line string feature through `points`.
#[must_use]
pub fn line_feature(id: u64, points: &[(f64, f64)]) -> GeoFeature {
    let coords = points.iter().map(|&(x, y)| Coord { x, y }).collect();
    GeoFeature::new(
        FeatureId(id),
        format!("line {id}"),
        GeometryKind::LineString(coords),
    )
}

/// Axis-aligned square polygon with a closed ring.
#[must_use]
pub fn square_feature(id: u64, min_x: f64, min_y: f64, side: f64) -> GeoFeature {
    let ring = vec![
        Coord { x: min_x, y: min_y },
        Coord {
            x: min_x + side,
            y: min_y,
        },
        Coord {
            x: min_x + side,
            y: min_y + side,
        },
        Coord {
            x: min_x,
            y: min_y + side,
        },
        Coord { x: min_x, y: min_y },
    ];
    GeoFeature::new(
        FeatureId(id),
        format!("area {id}"),
        GeometryKind::Polygon(ring),
    )
}

/// A handful of points of interest around the origin.
///
/// Ids 1 and 2 share a position so deduplication has something to merge.
#[must_use]
pub fn sample_points_of_interest() -> Vec<PointOfInterest> {
    vec![
        PointOfInterest::new(
            point_feature(1, 0.0, 0.0, &[Category::DrinkingWater]).with_description("spring"),
        )
        .on_trail(FeatureId(100)),
        PointOfInterest::new(point_feature(2, 0.0, 0.0, &[Category::PicnicSite])),
        PointOfInterest::new(point_feature(3, 0.001, 0.0, &[Category::Bench])),
        PointOfInterest::new(point_feature(4, 0.002, 0.001, &[Category::Viewpoint])),
        PointOfInterest::new(point_feature(5, 0.05, 0.05, &[Category::Shelter])),
    ]
}

/// One graded trail following the equator eastwards.
#[must_use]
pub fn sample_trail() -> Trail {
    Trail::new(
        line_feature(100, &[(0.0, 0.0), (0.001, 0.0), (0.002, 0.001)]),
        DifficultyLevel::Moderate,
    )
}

/// A `columns` x `rows` lattice of unit-cost edges joining horizontal and
/// vertical neighbours.
///
/// Vertex ids count from 1 in row-major order and sit `spacing` degrees
/// apart, starting at the origin. Edges point east and north; use an
/// undirected [`RoutingConfig`](crate::RoutingConfig) to walk them back.
///
/// # Errors
/// Propagates [`RoadNetworkError`] from network assembly.
pub fn grid_network(
    columns: u64,
    rows: u64,
    spacing: f64,
) -> Result<RoadNetwork, RoadNetworkError> {
    let id = |col: u64, row: u64| VertexId(row * columns + col + 1);
    let mut vertices = Vec::new();
    let mut edges = Vec::new();
    let mut next_edge = 0_u64;
    let mut link = |from: VertexId, to: VertexId| {
        next_edge += 1;
        GraphEdge::new(EdgeId(next_edge), from, to, 1.0)
    };
    for row in 0..rows {
        for col in 0..columns {
            #[expect(clippy::cast_precision_loss, reason = "grid sizes stay small")]
            let coord = Coord {
                x: col as f64 * spacing,
                y: row as f64 * spacing,
            };
            vertices.push(GraphVertex {
                id: id(col, row),
                coord,
            });
            if col + 1 < columns {
                edges.push(link(id(col, row), id(col + 1, row)));
            }
            if row + 1 < rows {
                edges.push(link(id(col, row), id(col, row + 1)));
            }
        }
    }
    RoadNetwork::new(vertices, edges)
}

/// Router that snaps every coordinate to vertex zero and returns a fixed
/// outcome.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, PartialEq)]
pub struct StaticRouter {
    outcome: RouteOutcome,
}

#[cfg(any(test, feature = "test-support"))]
impl StaticRouter {
    /// Router whose every query is unreachable.
    #[must_use]
    pub const fn no_path() -> Self {
        Self {
            outcome: RouteOutcome::NoPath,
        }
    }

    /// Router answering every query with `outcome`.
    #[must_use]
    pub const fn answering(outcome: RouteOutcome) -> Self {
        Self { outcome }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl RoutingService for StaticRouter {
    fn nearest_vertex(&self, coord: Coord<f64>) -> Result<VertexId, NoRouteError> {
        if coord.x.is_finite() && coord.y.is_finite() {
            Ok(VertexId(0))
        } else {
            Err(NoRouteError::UnsnappableCoordinate {
                x: coord.x,
                y: coord.y,
            })
        }
    }

    fn shortest_path(
        &self,
        _start: VertexId,
        _end: VertexId,
        _config: &RoutingConfig,
    ) -> Result<RouteOutcome, NoRouteError> {
        Ok(self.outcome.clone())
    }
}
