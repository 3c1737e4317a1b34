//! Exact spatial predicates over [`GeometryKind`].
//!
//! Distances are planar and expressed in degrees; callers convert to meters
//! where needed. All functions are pure.

use geo::{Contains, Coord, Distance, Euclidean, Intersects, LineString, Point};
use thiserror::Error;

use crate::geometry::{Envelope, GeometryKind, GeometryTag};

/// Raised when an operation is not defined for the supplied geometry variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{operation} is not supported for {found} geometries")]
pub struct UnsupportedGeometryError {
    /// Name of the rejected operation.
    pub operation: &'static str,
    /// Variant that was supplied.
    pub found: GeometryTag,
}

/// Whether any part of `geometry` lies within the closed `envelope`.
///
/// Points use boundary-inclusive containment; other shapes use general
/// intersection with the rectangle.
///
/// # Examples
/// ```
/// use waypost_core::{Envelope, GeometryKind, predicates::intersects_box};
///
/// let envelope = Envelope::new(0.0, 0.0, 1.0, 1.0);
/// assert!(intersects_box(&GeometryKind::point(1.0, 1.0), &envelope));
/// assert!(!intersects_box(&GeometryKind::point(1.5, 1.0), &envelope));
/// ```
#[must_use]
pub fn intersects_box(geometry: &GeometryKind, envelope: &Envelope) -> bool {
    match geometry {
        GeometryKind::Point(coord) => envelope.contains_coord(*coord),
        other => {
            if !other.envelope().overlaps(envelope) {
                return false;
            }
            other.to_geo().intersects(&geo::Geometry::Rect(*envelope.rect()))
        }
    }
}

/// Euclidean distance in degrees from `point` to the nearest part of
/// `geometry`.
///
/// A point inside a polygon is at distance zero.
#[must_use]
pub fn distance(geometry: &GeometryKind, point: Coord<f64>) -> f64 {
    let origin = Point::from(point);
    match geometry {
        GeometryKind::Point(coord) => Euclidean.distance(origin, Point::from(*coord)),
        GeometryKind::LineString(coords) => {
            Euclidean.distance(&origin, &LineString::new(coords.clone()))
        }
        GeometryKind::MultiLineString(lines) => lines
            .iter()
            .map(|line| Euclidean.distance(&origin, &LineString::new(line.clone())))
            .fold(f64::INFINITY, f64::min),
        GeometryKind::Polygon(ring) => {
            let polygon = geo::Polygon::new(LineString::new(ring.clone()), Vec::new());
            Euclidean.distance(&origin, &polygon)
        }
    }
}

/// Distance in degrees from `point` to the envelope of `geometry`.
///
/// The value never exceeds [`distance`] and is zero when the point lies in
/// the envelope. It is the ordering key used by index-backed candidate scans.
#[must_use]
pub fn approximate_distance(geometry: &GeometryKind, point: Coord<f64>) -> f64 {
    envelope_distance(&geometry.envelope(), point)
}

pub(crate) fn envelope_distance(envelope: &Envelope, point: Coord<f64>) -> f64 {
    let dx = (envelope.min_lon() - point.x)
        .max(point.x - envelope.max_lon())
        .max(0.0);
    let dy = (envelope.min_lat() - point.y)
        .max(point.y - envelope.max_lat())
        .max(0.0);
    dx.hypot(dy)
}

/// Whether two geometries share at least one point. Symmetric.
#[must_use]
pub fn intersects(a: &GeometryKind, b: &GeometryKind) -> bool {
    if !a.envelope().overlaps(&b.envelope()) {
        return false;
    }
    a.to_geo().intersects(&b.to_geo())
}

/// Whether polygon `a` contains `b`.
///
/// # Errors
/// Returns [`UnsupportedGeometryError`] when `a` is not a polygon.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waypost_core::{GeometryKind, predicates::contains};
///
/// let square = GeometryKind::polygon(vec![
///     Coord { x: 0.0, y: 0.0 },
///     Coord { x: 4.0, y: 0.0 },
///     Coord { x: 4.0, y: 4.0 },
///     Coord { x: 0.0, y: 4.0 },
/// ])?;
/// assert_eq!(contains(&square, &GeometryKind::point(1.0, 1.0)), Ok(true));
/// assert!(contains(&GeometryKind::point(1.0, 1.0), &square).is_err());
/// # Ok::<(), waypost_core::GeometryError>(())
/// ```
pub fn contains(a: &GeometryKind, b: &GeometryKind) -> Result<bool, UnsupportedGeometryError> {
    let GeometryKind::Polygon(ring) = a else {
        return Err(UnsupportedGeometryError {
            operation: "contains",
            found: a.tag(),
        });
    };
    let polygon = geo::Polygon::new(LineString::new(ring.clone()), Vec::new());
    let inside = match b.to_geo() {
        geo::Geometry::Point(point) => polygon.contains(&point),
        geo::Geometry::LineString(line) => polygon.contains(&line),
        geo::Geometry::MultiLineString(lines) => polygon.contains(&lines),
        geo::Geometry::Polygon(other) => polygon.contains(&other),
        _ => false,
    };
    Ok(inside)
}
