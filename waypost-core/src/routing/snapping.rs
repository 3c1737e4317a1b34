//! Snap WGS84 coordinates to the nearest road-network vertex.
//!
//! Distances are measured in Web Mercator (EPSG:3857) meters so that a degree
//! of longitude is not over-weighted at higher latitudes.

use std::f64::consts::FRAC_PI_4;

use geo::Coord;
use rstar::RTree;
use rstar::primitives::GeomWithData;

use super::graph::GraphVertex;

/// Spherical radius used by the Web Mercator projection.
const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// Latitude beyond which Web Mercator is undefined.
const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

type Projected = GeomWithData<[f64; 2], usize>;

/// Project a WGS84 coordinate to Web Mercator meters.
///
/// Latitudes are clamped to the projection's valid band. Returns `None` for
/// non-finite input.
#[must_use]
pub fn to_web_mercator(coord: Coord<f64>) -> Option<[f64; 2]> {
    if !coord.x.is_finite() || !coord.y.is_finite() {
        return None;
    }
    let lat = coord
        .y
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
        .to_radians();
    let x = EARTH_RADIUS_METERS * coord.x.to_radians();
    let y = EARTH_RADIUS_METERS * (FRAC_PI_4 + lat / 2.0).tan().ln();
    Some([x, y])
}

/// Projected R\*-tree over vertex slots.
#[derive(Debug, Clone)]
pub(crate) struct Snapper {
    tree: RTree<Projected>,
}

impl Snapper {
    pub(crate) fn new(vertices: &[GraphVertex]) -> Self {
        let points = vertices
            .iter()
            .enumerate()
            .filter_map(|(slot, vertex)| {
                to_web_mercator(vertex.coord).map(|point| GeomWithData::new(point, slot))
            })
            .collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// Return the slot of the closest vertex, preferring the lowest slot among
    /// equally distant vertices.
    pub(crate) fn nearest(&self, point: [f64; 2]) -> Option<usize> {
        let mut frontier = self.tree.nearest_neighbor_iter_with_distance_2(&point);
        let (first, best) = frontier.next()?;
        let mut slot = first.data;
        for (candidate, distance_2) in frontier {
            if distance_2 > best {
                break;
            }
            slot = slot.min(candidate.data);
        }
        Some(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::graph::VertexId;
    use rstest::rstest;

    fn vertex(id: u64, x: f64, y: f64) -> GraphVertex {
        GraphVertex {
            id: VertexId(id),
            coord: Coord { x, y },
        }
    }

    #[rstest]
    fn origin_projects_to_origin() {
        let [x, y] = to_web_mercator(Coord { x: 0.0, y: 0.0 }).expect("finite");
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[rstest]
    fn antimeridian_projects_to_half_circumference() {
        let [x, _] = to_web_mercator(Coord { x: 180.0, y: 0.0 }).expect("finite");
        assert!((x - 20_037_508.342_789_244).abs() < 1e-3);
    }

    #[rstest]
    fn poles_are_clamped() {
        let north = to_web_mercator(Coord { x: 0.0, y: 90.0 }).expect("finite");
        assert!(north[1].is_finite());
    }

    #[rstest]
    fn non_finite_input_is_rejected() {
        assert!(to_web_mercator(Coord { x: f64::NAN, y: 0.0 }).is_none());
    }

    #[rstest]
    fn exact_coordinate_snaps_to_that_vertex() {
        let snapper = Snapper::new(&[vertex(1, 0.0, 0.0), vertex(2, 0.01, 0.0)]);
        let point = to_web_mercator(Coord { x: 0.01, y: 0.0 }).expect("finite");
        assert_eq!(snapper.nearest(point), Some(1));
    }

    #[rstest]
    fn equidistant_vertices_prefer_lowest_slot() {
        let snapper = Snapper::new(&[vertex(1, -0.01, 0.0), vertex(2, 0.01, 0.0)]);
        let point = to_web_mercator(Coord { x: 0.0, y: 0.0 }).expect("finite");
        assert_eq!(snapper.nearest(point), Some(0));
    }

    #[rstest]
    fn empty_tree_has_no_nearest() {
        assert_eq!(Snapper::new(&[]).nearest([0.0, 0.0]), None);
    }
}
