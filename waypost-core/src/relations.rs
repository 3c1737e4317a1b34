//! Pairwise geometric relations inside a bounded candidate set.

use std::collections::HashSet;

use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::feature::{FeatureId, GeoRecord};
use crate::predicates::{contains, intersects};

/// Relations found among a candidate set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RelationReport<R> {
    /// Unordered intersecting pairs, each listed once in candidate order.
    pub intersecting: Vec<(FeatureId, FeatureId)>,
    /// `(polygon, other)` pairs where the polygon contains the other record.
    pub containing: Vec<(FeatureId, FeatureId)>,
    /// Records appearing in at least one pair, once each, in candidate order.
    pub participants: Vec<R>,
}

impl<R> RelationReport<R> {
    /// Whether no relation was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intersecting.is_empty() && self.containing.is_empty()
    }
}

/// Exhaustively test every candidate pair.
///
/// The scan is quadratic in the number of candidates; callers bound the
/// candidate set before invoking it.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waypost_core::{FeatureId, GeoFeature, GeometryKind, relations::detect_relations};
///
/// let park = GeometryKind::polygon(vec![
///     Coord { x: 0.0, y: 0.0 },
///     Coord { x: 2.0, y: 0.0 },
///     Coord { x: 2.0, y: 2.0 },
///     Coord { x: 0.0, y: 2.0 },
/// ])?;
/// let candidates = vec![
///     GeoFeature::new(FeatureId(1), "park", park),
///     GeoFeature::new(FeatureId(2), "bench", GeometryKind::point(1.0, 1.0)),
/// ];
/// let report = detect_relations(&candidates);
/// assert_eq!(report.containing, vec![(FeatureId(1), FeatureId(2))]);
/// assert_eq!(report.participants.len(), 2);
/// # Ok::<(), waypost_core::GeometryError>(())
/// ```
#[must_use]
pub fn detect_relations<R: GeoRecord>(candidates: &[R]) -> RelationReport<R> {
    let mut intersecting = Vec::new();
    let mut containing = Vec::new();
    let mut involved: HashSet<FeatureId> = HashSet::new();

    for (i, a) in candidates.iter().enumerate() {
        for b in candidates.iter().skip(i + 1) {
            if intersects(a.geometry(), b.geometry()) {
                intersecting.push((a.id(), b.id()));
                involved.extend([a.id(), b.id()]);
            }
        }
    }

    for polygon in candidates.iter().filter(|r| r.geometry().is_polygon()) {
        for other in candidates.iter().filter(|r| !r.geometry().is_polygon()) {
            if matches!(contains(polygon.geometry(), other.geometry()), Ok(true)) {
                containing.push((polygon.id(), other.id()));
                involved.extend([polygon.id(), other.id()]);
            }
        }
    }

    let mut emitted: HashSet<FeatureId> = HashSet::new();
    let participants: Vec<R> = candidates
        .iter()
        .filter(|r| involved.contains(&r.id()) && emitted.insert(r.id()))
        .cloned()
        .collect();
    debug!(
        "relation scan over {} candidates found {} intersecting and {} containing pairs",
        candidates.len(),
        intersecting.len(),
        containing.len()
    );
    RelationReport {
        intersecting,
        containing,
        participants,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::GeoFeature;
    use crate::geometry::GeometryKind;
    use geo::Coord;
    use rstest::{fixture, rstest};

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn feature(id: u64, geometry: GeometryKind) -> GeoFeature {
        GeoFeature::new(FeatureId(id), format!("f{id}"), geometry)
    }

    #[fixture]
    fn park_scene() -> Vec<GeoFeature> {
        let park = GeometryKind::polygon(vec![c(0.0, 0.0), c(4.0, 0.0), c(4.0, 4.0), c(0.0, 4.0)])
            .expect("valid park");
        vec![
            feature(1, park),
            feature(2, GeometryKind::point(1.0, 1.0)),
            feature(3, GeometryKind::LineString(vec![c(-1.0, 2.0), c(5.0, 2.0)])),
            feature(4, GeometryKind::point(9.0, 9.0)),
        ]
    }

    #[rstest]
    fn intersecting_pairs_are_listed_once(park_scene: Vec<GeoFeature>) {
        let report = detect_relations(&park_scene);
        assert_eq!(
            report.intersecting,
            vec![(FeatureId(1), FeatureId(2)), (FeatureId(1), FeatureId(3))]
        );
    }

    #[rstest]
    fn polygon_contains_only_enclosed_members(park_scene: Vec<GeoFeature>) {
        let report = detect_relations(&park_scene);
        assert_eq!(report.containing, vec![(FeatureId(1), FeatureId(2))]);
    }

    #[rstest]
    fn participants_exclude_isolated_records(park_scene: Vec<GeoFeature>) {
        let report = detect_relations(&park_scene);
        let ids: Vec<_> = report.participants.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![FeatureId(1), FeatureId(2), FeatureId(3)]);
    }

    #[rstest]
    fn disjoint_candidates_yield_empty_report() {
        let candidates = vec![
            feature(1, GeometryKind::point(0.0, 0.0)),
            feature(2, GeometryKind::point(1.0, 1.0)),
        ];
        let report = detect_relations(&candidates);
        assert!(report.is_empty());
        assert!(report.participants.is_empty());
    }
}
