//! Distance-ranked retrieval: k-nearest and radius search.
//!
//! Both searches run over a candidate list supplied by a store and return
//! deduplicated records paired with their exact distance to the query point.

use std::num::NonZeroUsize;

use geo::Coord;
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dedup::dedup;
use crate::feature::GeoRecord;
use crate::predicates::{approximate_distance, distance};

/// Meters per degree of arc along the equator.
///
/// Converting a metric radius with this constant is an equatorial
/// approximation: away from the equator a degree of longitude covers fewer
/// meters, so radius searches become elongated east-west.
pub const EQUATORIAL_METERS_PER_DEGREE: f64 = 111_320.0;

/// Default multiplier applied to `k` before deduplication.
pub const DEFAULT_OVERSAMPLE_FACTOR: usize = 3;

/// A record paired with its exact distance to the query point, in degrees.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ranked<R> {
    /// Matched record.
    pub record: R,
    /// Planar distance in degrees.
    pub distance: f64,
}

/// Convert a metric radius into degrees.
#[must_use]
pub fn meters_to_degrees(meters: f64, meters_per_degree: f64) -> f64 {
    meters / meters_per_degree
}

/// Return up to `k` distinct records closest to `query`.
///
/// Candidates are ordered by their cheap envelope distance and only the first
/// `k * oversample_factor` are refined: deduplicated, measured exactly and
/// sorted ascending by distance with ties broken by ascending id.
///
/// The oversample is a heuristic. When more than `k * oversample_factor - k`
/// duplicates sit among the nearest candidates, a close distinct record may
/// fall outside the refined window and be missed. Raise the factor for
/// datasets with heavy duplication.
///
/// # Examples
/// ```
/// use std::num::NonZeroUsize;
/// use geo::Coord;
/// use waypost_core::{FeatureId, GeoFeature, GeometryKind, nearest::nearest_k};
///
/// let candidates = vec![
///     GeoFeature::new(FeatureId(1), "far", GeometryKind::point(5.0, 0.0)),
///     GeoFeature::new(FeatureId(2), "near", GeometryKind::point(1.0, 0.0)),
/// ];
/// let one = NonZeroUsize::MIN;
/// let ranked = nearest_k(Coord { x: 0.0, y: 0.0 }, one, NonZeroUsize::new(3).unwrap(), candidates);
/// assert_eq!(ranked[0].record.id, FeatureId(2));
/// ```
#[must_use]
pub fn nearest_k<R, I>(
    query: Coord<f64>,
    k: NonZeroUsize,
    oversample_factor: NonZeroUsize,
    candidates: I,
) -> Vec<Ranked<R>>
where
    R: GeoRecord,
    I: IntoIterator<Item = R>,
{
    let window = k.get().saturating_mul(oversample_factor.get());
    let mut keyed: Vec<(f64, R)> = candidates
        .into_iter()
        .map(|record| (approximate_distance(record.geometry(), query), record))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    keyed.truncate(window);

    let distinct = dedup(keyed.into_iter().map(|(_, record)| record));
    let mut ranked: Vec<Ranked<R>> = distinct
        .into_iter()
        .map(|record| Ranked {
            distance: distance(record.geometry(), query),
            record,
        })
        .collect();
    ranked.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.record.id().cmp(&b.record.id()))
    });
    ranked.truncate(k.get());
    debug!(
        "nearest search refined {window} candidates into {} results",
        ranked.len()
    );
    ranked
}

/// Return every distinct record whose exact distance to `query` is at most
/// `radius_degrees`, in candidate order.
#[must_use]
pub fn within_radius<R, I>(query: Coord<f64>, radius_degrees: f64, candidates: I) -> Vec<Ranked<R>>
where
    R: GeoRecord,
    I: IntoIterator<Item = R>,
{
    let inside = candidates
        .into_iter()
        .filter(|record| distance(record.geometry(), query) <= radius_degrees);
    dedup(inside)
        .into_iter()
        .map(|record| Ranked {
            distance: distance(record.geometry(), query),
            record,
        })
        .collect()
}
