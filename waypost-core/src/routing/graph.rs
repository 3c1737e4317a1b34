//! Road-network graph model and construction checks.

use std::collections::{HashMap, HashSet};
use std::fmt;

use geo::Coord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a graph vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct VertexId(pub u64);

/// Identifier of a graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EdgeId(pub u64);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A road-network vertex in WGS84.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GraphVertex {
    /// Unique identifier.
    pub id: VertexId,
    /// Longitude/latitude position.
    pub coord: Coord<f64>,
}

/// A road-network edge.
///
/// `reverse_cost` follows the pgRouting convention: when the network is
/// traversed as undirected it prices the `target -> source` direction, and a
/// negative value marks that direction as closed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GraphEdge {
    /// Unique identifier.
    pub id: EdgeId,
    /// Vertex the edge leaves.
    pub source: VertexId,
    /// Vertex the edge enters.
    pub target: VertexId,
    /// Non-negative traversal cost.
    pub cost: f64,
    /// Optional cost of the reverse direction.
    #[cfg_attr(feature = "serde", serde(default))]
    pub reverse_cost: Option<f64>,
    /// Optional display geometry.
    #[cfg_attr(feature = "serde", serde(default))]
    pub geometry: Option<Vec<Coord<f64>>>,
}

impl GraphEdge {
    /// Build an edge without reverse cost or geometry.
    #[must_use]
    pub const fn new(id: EdgeId, source: VertexId, target: VertexId, cost: f64) -> Self {
        Self {
            id,
            source,
            target,
            cost,
            reverse_cost: None,
            geometry: None,
        }
    }

    /// Attach a reverse-direction cost.
    #[must_use]
    pub const fn with_reverse_cost(mut self, reverse_cost: f64) -> Self {
        self.reverse_cost = Some(reverse_cost);
        self
    }
}

/// Errors raised while assembling a [`RoadNetwork`](super::RoadNetwork).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoadNetworkError {
    /// Two vertices shared an identifier.
    #[error("vertex {id} is defined more than once")]
    DuplicateVertex {
        /// Repeated identifier.
        id: VertexId,
    },
    /// Two edges shared an identifier.
    #[error("edge {id} is defined more than once")]
    DuplicateEdge {
        /// Repeated identifier.
        id: EdgeId,
    },
    /// A vertex position was NaN or infinite.
    #[error("vertex {id} has a non-finite coordinate")]
    NonFiniteVertex {
        /// Offending vertex.
        id: VertexId,
    },
    /// An edge referenced a vertex that does not exist.
    #[error("edge {edge} references unknown vertex {vertex}")]
    DanglingEdge {
        /// Offending edge.
        edge: EdgeId,
        /// Missing vertex.
        vertex: VertexId,
    },
    /// An edge cost was negative.
    #[error("edge {edge} has negative cost {cost}")]
    NegativeCost {
        /// Offending edge.
        edge: EdgeId,
        /// Supplied cost.
        cost: f64,
    },
    /// An edge cost was NaN or infinite.
    #[error("edge {edge} has non-finite cost")]
    NonFiniteCost {
        /// Offending edge.
        edge: EdgeId,
    },
}

/// Directed arc stored in an adjacency list.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Arc {
    pub(crate) edge: EdgeId,
    pub(crate) to: usize,
    pub(crate) cost: f64,
}

/// Validated vertices plus forward and reverse adjacency.
///
/// Vertices are stored sorted by id so that a lower slot index always means a
/// lower vertex id.
#[derive(Debug, Clone, Default)]
pub(crate) struct Graph {
    pub(crate) vertices: Vec<GraphVertex>,
    pub(crate) slots: HashMap<VertexId, usize>,
    pub(crate) forward: Vec<Vec<Arc>>,
    pub(crate) reverse: Vec<Vec<Arc>>,
    pub(crate) edge_count: usize,
}

impl Graph {
    pub(crate) fn build(
        mut vertices: Vec<GraphVertex>,
        edges: &[GraphEdge],
    ) -> Result<Self, RoadNetworkError> {
        vertices.sort_by_key(|vertex| vertex.id);
        let mut slots = HashMap::with_capacity(vertices.len());
        for (slot, vertex) in vertices.iter().enumerate() {
            if !vertex.coord.x.is_finite() || !vertex.coord.y.is_finite() {
                return Err(RoadNetworkError::NonFiniteVertex { id: vertex.id });
            }
            if slots.insert(vertex.id, slot).is_some() {
                return Err(RoadNetworkError::DuplicateVertex { id: vertex.id });
            }
        }

        let mut forward = vec![Vec::new(); vertices.len()];
        let mut reverse = vec![Vec::new(); vertices.len()];
        let mut seen_edges = HashSet::with_capacity(edges.len());
        for edge in edges {
            if !seen_edges.insert(edge.id) {
                return Err(RoadNetworkError::DuplicateEdge { id: edge.id });
            }
            check_cost(edge.id, edge.cost)?;
            let slot_of = |vertex: VertexId| {
                slots
                    .get(&vertex)
                    .copied()
                    .ok_or(RoadNetworkError::DanglingEdge {
                        edge: edge.id,
                        vertex,
                    })
            };
            let from = slot_of(edge.source)?;
            let to = slot_of(edge.target)?;
            let back_cost = match edge.reverse_cost {
                Some(cost) if !cost.is_finite() => {
                    return Err(RoadNetworkError::NonFiniteCost { edge: edge.id });
                }
                Some(cost) if cost < 0.0 => None,
                Some(cost) => Some(cost),
                None => Some(edge.cost),
            };
            if let Some(list) = forward.get_mut(from) {
                list.push(Arc {
                    edge: edge.id,
                    to,
                    cost: edge.cost,
                });
            }
            if let (Some(cost), Some(list)) = (back_cost, reverse.get_mut(to)) {
                list.push(Arc {
                    edge: edge.id,
                    to: from,
                    cost,
                });
            }
        }

        Ok(Self {
            vertices,
            slots,
            forward,
            reverse,
            edge_count: edges.len(),
        })
    }

    pub(crate) fn vertex_at(&self, slot: usize) -> Option<VertexId> {
        self.vertices.get(slot).map(|vertex| vertex.id)
    }
}

fn check_cost(edge: EdgeId, cost: f64) -> Result<(), RoadNetworkError> {
    if !cost.is_finite() {
        return Err(RoadNetworkError::NonFiniteCost { edge });
    }
    if cost < 0.0 {
        return Err(RoadNetworkError::NegativeCost { edge, cost });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn vertex(id: u64, x: f64, y: f64) -> GraphVertex {
        GraphVertex {
            id: VertexId(id),
            coord: Coord { x, y },
        }
    }

    fn edge(id: u64, source: u64, target: u64, cost: f64) -> GraphEdge {
        GraphEdge::new(EdgeId(id), VertexId(source), VertexId(target), cost)
    }

    #[rstest]
    fn vertices_are_sorted_by_id() {
        let graph = Graph::build(vec![vertex(9, 0.0, 0.0), vertex(2, 1.0, 1.0)], &[])
            .expect("valid graph");
        assert_eq!(graph.vertex_at(0), Some(VertexId(2)));
        assert_eq!(graph.vertex_at(1), Some(VertexId(9)));
    }

    #[rstest]
    #[case(-1.0, RoadNetworkError::NegativeCost { edge: EdgeId(1), cost: -1.0 })]
    #[case(f64::INFINITY, RoadNetworkError::NonFiniteCost { edge: EdgeId(1) })]
    fn invalid_costs_are_rejected(#[case] cost: f64, #[case] expected: RoadNetworkError) {
        let err = Graph::build(
            vec![vertex(1, 0.0, 0.0), vertex(2, 1.0, 0.0)],
            &[edge(1, 1, 2, cost)],
        )
        .expect_err("invalid cost");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn dangling_edge_is_rejected() {
        let err = Graph::build(vec![vertex(1, 0.0, 0.0)], &[edge(4, 1, 7, 1.0)])
            .expect_err("dangling edge");
        assert_eq!(
            err,
            RoadNetworkError::DanglingEdge {
                edge: EdgeId(4),
                vertex: VertexId(7),
            }
        );
    }

    #[rstest]
    fn duplicate_ids_are_rejected() {
        let vertices = vec![vertex(1, 0.0, 0.0), vertex(1, 1.0, 0.0)];
        assert_eq!(
            Graph::build(vertices, &[]).expect_err("duplicate vertex"),
            RoadNetworkError::DuplicateVertex { id: VertexId(1) }
        );
        let vertices = vec![vertex(1, 0.0, 0.0), vertex(2, 1.0, 0.0)];
        let edges = [edge(3, 1, 2, 1.0), edge(3, 2, 1, 1.0)];
        assert_eq!(
            Graph::build(vertices, &edges).expect_err("duplicate edge"),
            RoadNetworkError::DuplicateEdge { id: EdgeId(3) }
        );
    }

    #[rstest]
    fn negative_reverse_cost_closes_backward_direction() {
        let vertices = vec![vertex(1, 0.0, 0.0), vertex(2, 1.0, 0.0)];
        let edges = [
            edge(1, 1, 2, 1.0).with_reverse_cost(-1.0),
            edge(2, 1, 2, 5.0).with_reverse_cost(2.0),
        ];
        let graph = Graph::build(vertices, &edges).expect("valid graph");
        let back: Vec<_> = graph
            .reverse
            .get(1)
            .expect("slot for vertex 2")
            .iter()
            .map(|arc| (arc.edge, arc.cost))
            .collect();
        assert_eq!(back, vec![(EdgeId(2), 2.0)]);
    }
}
