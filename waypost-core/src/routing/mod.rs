//! Point-to-point routing over a road-network graph.
//!
//! A [`RoadNetwork`] holds validated vertices and edges, snaps WGS84
//! coordinates to their nearest vertex and answers single-pair shortest-path
//! queries with Dijkstra's algorithm. Consumers depend on the
//! [`RoutingService`] trait so an external router can stand in for the
//! in-process graph.

use geo::Coord;
use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod dijkstra;
mod graph;
mod snapping;

pub use graph::{EdgeId, GraphEdge, GraphVertex, RoadNetworkError, VertexId};
pub use snapping::to_web_mercator;

use graph::Graph;
use snapping::Snapper;

/// Traversal options for a shortest-path query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoutingConfig {
    /// Follow edges from source to target only. When `false`, edges may also
    /// be walked backwards at their reverse cost.
    pub directed: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self { directed: true }
    }
}

impl RoutingConfig {
    /// Treat every edge as traversable in both directions.
    #[must_use]
    pub const fn undirected() -> Self {
        Self { directed: false }
    }
}

/// One step of a route.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathStep {
    /// Zero-based position in the route.
    pub seq: usize,
    /// Vertex reached by this step.
    pub node: VertexId,
    /// Edge taken to reach `node`; `None` for the start vertex.
    pub edge: Option<EdgeId>,
    /// Cost of `edge`, zero for the start vertex.
    pub cost: f64,
    /// Total cost from the start vertex to `node`.
    pub agg_cost: f64,
}

/// Outcome of a shortest-path query.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", content = "steps"))]
pub enum RouteOutcome {
    /// Steps from start to end in travel order.
    Found(Vec<PathStep>),
    /// The end vertex cannot be reached from the start vertex.
    NoPath,
}

impl RouteOutcome {
    /// Borrow the steps of a found route.
    #[must_use]
    pub fn steps(&self) -> Option<&[PathStep]> {
        match self {
            Self::Found(steps) => Some(steps),
            Self::NoPath => None,
        }
    }

    /// Total cost of a found route.
    #[must_use]
    pub fn total_cost(&self) -> Option<f64> {
        self.steps()
            .and_then(<[PathStep]>::last)
            .map(|step| step.agg_cost)
    }
}

/// Reasons a route could not be attempted.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum NoRouteError {
    /// The network has no vertices to snap to.
    #[error("road network has no vertices")]
    EmptyGraph,
    /// The coordinate could not be projected for snapping.
    #[error("coordinate ({x}, {y}) cannot be snapped to the road network")]
    UnsnappableCoordinate {
        /// Longitude component.
        x: f64,
        /// Latitude component.
        y: f64,
    },
    /// A vertex id was not part of the network.
    #[error("vertex {id} is not part of the road network")]
    UnknownVertex {
        /// Requested vertex.
        id: VertexId,
    },
}

/// Shortest-path capability consumed by the query engine.
pub trait RoutingService {
    /// Return the vertex nearest to a WGS84 coordinate.
    ///
    /// # Errors
    /// Returns [`NoRouteError::EmptyGraph`] for an empty network and
    /// [`NoRouteError::UnsnappableCoordinate`] for non-finite input.
    fn nearest_vertex(&self, coord: Coord<f64>) -> Result<VertexId, NoRouteError>;

    /// Compute the cheapest path between two vertices.
    ///
    /// An unreachable end vertex is reported as [`RouteOutcome::NoPath`].
    ///
    /// # Errors
    /// Returns [`NoRouteError::UnknownVertex`] when either vertex is absent.
    fn shortest_path(
        &self,
        start: VertexId,
        end: VertexId,
        config: &RoutingConfig,
    ) -> Result<RouteOutcome, NoRouteError>;

    /// Snap both coordinates and route between the snapped vertices.
    ///
    /// # Errors
    /// Propagates snapping and lookup failures.
    fn route(
        &self,
        from: Coord<f64>,
        to: Coord<f64>,
        config: &RoutingConfig,
    ) -> Result<RouteOutcome, NoRouteError> {
        let start = self.nearest_vertex(from)?;
        let end = self.nearest_vertex(to)?;
        self.shortest_path(start, end, config)
    }
}

/// In-memory road network answering routing queries in process.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waypost_core::routing::{
///     EdgeId, GraphEdge, GraphVertex, RoadNetwork, RouteOutcome, RoutingConfig, RoutingService,
///     VertexId,
/// };
///
/// let vertices = vec![
///     GraphVertex { id: VertexId(1), coord: Coord { x: 0.0, y: 0.0 } },
///     GraphVertex { id: VertexId(2), coord: Coord { x: 0.01, y: 0.0 } },
/// ];
/// let edges = vec![GraphEdge::new(EdgeId(10), VertexId(1), VertexId(2), 4.0)];
/// let network = RoadNetwork::new(vertices, edges)?;
/// let outcome = network.shortest_path(VertexId(1), VertexId(2), &RoutingConfig::default())?;
/// assert_eq!(outcome.total_cost(), Some(4.0));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    graph: Graph,
    snapper: Snapper,
    edges: Vec<GraphEdge>,
}

impl RoadNetwork {
    /// Validate and index a set of vertices and edges.
    ///
    /// # Errors
    /// Returns [`RoadNetworkError`] for duplicate ids, non-finite vertex
    /// positions, negative or non-finite costs and edges that reference
    /// unknown vertices.
    pub fn new(
        vertices: Vec<GraphVertex>,
        edges: Vec<GraphEdge>,
    ) -> Result<Self, RoadNetworkError> {
        let graph = Graph::build(vertices, &edges)?;
        let snapper = Snapper::new(&graph.vertices);
        Ok(Self {
            graph,
            snapper,
            edges,
        })
    }

    /// A network with no vertices or edges.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            graph: Graph::default(),
            snapper: Snapper::new(&[]),
            edges: Vec::new(),
        }
    }

    /// Vertices sorted by id.
    #[must_use]
    pub fn vertices(&self) -> &[GraphVertex] {
        &self.graph.vertices
    }

    /// Edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Whether the network has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.vertices.is_empty()
    }

    fn slot(&self, id: VertexId) -> Result<usize, NoRouteError> {
        self.graph
            .slots
            .get(&id)
            .copied()
            .ok_or(NoRouteError::UnknownVertex { id })
    }
}

impl RoutingService for RoadNetwork {
    fn nearest_vertex(&self, coord: Coord<f64>) -> Result<VertexId, NoRouteError> {
        if self.is_empty() {
            return Err(NoRouteError::EmptyGraph);
        }
        let projected = to_web_mercator(coord).ok_or(NoRouteError::UnsnappableCoordinate {
            x: coord.x,
            y: coord.y,
        })?;
        self.snapper
            .nearest(projected)
            .and_then(|slot| self.graph.vertex_at(slot))
            .ok_or(NoRouteError::EmptyGraph)
    }

    fn shortest_path(
        &self,
        start: VertexId,
        end: VertexId,
        config: &RoutingConfig,
    ) -> Result<RouteOutcome, NoRouteError> {
        let from = self.slot(start)?;
        let to = self.slot(end)?;
        let search = dijkstra::shortest_path(&self.graph, from, to, !config.directed);
        debug!(
            "routing {start} -> {end} settled {} of {} vertices over {} edges",
            search.settled,
            self.graph.vertices.len(),
            self.graph.edge_count
        );
        let Some(path) = search.path else {
            return Ok(RouteOutcome::NoPath);
        };
        let steps = path
            .into_iter()
            .enumerate()
            .filter_map(|(seq, (slot, via, agg_cost))| {
                let node = self.graph.vertex_at(slot)?;
                let (edge, cost) = via.map_or((None, 0.0), |(edge, cost)| (Some(edge), cost));
                Some(PathStep {
                    seq,
                    node,
                    edge,
                    cost,
                    agg_cost,
                })
            })
            .collect();
        Ok(RouteOutcome::Found(steps))
    }
}
