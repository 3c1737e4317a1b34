//! Geometry substrate shared by every spatial algorithm.
//!
//! [`GeometryKind`] is the closed set of shapes a feature may carry. All
//! coordinates are WGS84 with `x = longitude` and `y = latitude`. Shapes are
//! converted to [`geo`] types on demand so predicates can reuse the `geo`
//! algorithms.

use std::fmt;

use geo::{Coord, LineString, MultiLineString, Point, Polygon, Rect};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Spatial reference identifier for WGS84 longitude/latitude.
pub const WGS84_SRID: u32 = 4326;

/// Discriminant of a [`GeometryKind`], used in error reports and keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GeometryTag {
    /// A single coordinate.
    Point,
    /// An ordered, open coordinate sequence.
    LineString,
    /// A collection of line strings.
    MultiLineString,
    /// A closed exterior ring.
    Polygon,
}

impl GeometryTag {
    /// Return the tag in WKT spelling.
    ///
    /// # Examples
    /// ```
    /// use waypost_core::geometry::GeometryTag;
    ///
    /// assert_eq!(GeometryTag::MultiLineString.as_str(), "MULTILINESTRING");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Point => "POINT",
            Self::LineString => "LINESTRING",
            Self::MultiLineString => "MULTILINESTRING",
            Self::Polygon => "POLYGON",
        }
    }
}

impl fmt::Display for GeometryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised when a geometry cannot be accepted as query input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A shape contained no coordinates at all.
    #[error("{kind} geometry has no coordinates")]
    Empty {
        /// Shape that was empty.
        kind: GeometryTag,
    },
    /// A shape had fewer positions than its type requires.
    #[error("{kind} geometry needs at least {required} positions, found {found}")]
    TooFewPoints {
        /// Shape that was too short.
        kind: GeometryTag,
        /// Minimum number of positions.
        required: usize,
        /// Number of positions supplied.
        found: usize,
    },
    /// A coordinate was NaN or infinite.
    #[error("coordinate ({x}, {y}) is not finite")]
    NonFiniteCoordinate {
        /// Longitude component.
        x: f64,
        /// Latitude component.
        y: f64,
    },
    /// A polygon ring was open and could not be closed into a valid ring.
    #[error("polygon ring with {distinct} distinct positions cannot be closed")]
    RingNotClosable {
        /// Number of distinct positions in the ring.
        distinct: usize,
    },
}

/// The shape of a geo feature.
///
/// Polygons hold a single exterior ring whose first and last positions are
/// equal. Use [`GeometryKind::polygon`] or [`GeometryKind::into_valid`] to
/// auto-close rings supplied without the closing vertex.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waypost_core::GeometryKind;
///
/// let ring = vec![
///     Coord { x: 0.0, y: 0.0 },
///     Coord { x: 1.0, y: 0.0 },
///     Coord { x: 1.0, y: 1.0 },
/// ];
/// let polygon = GeometryKind::polygon(ring)?;
/// assert!(matches!(&polygon, GeometryKind::Polygon(r) if r.len() == 4));
/// # Ok::<(), waypost_core::GeometryError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "coordinates"))]
pub enum GeometryKind {
    /// A single position.
    Point(Coord<f64>),
    /// An ordered sequence of at least two positions.
    LineString(Vec<Coord<f64>>),
    /// One or more line strings.
    MultiLineString(Vec<Vec<Coord<f64>>>),
    /// A closed exterior ring.
    Polygon(Vec<Coord<f64>>),
}

impl GeometryKind {
    /// Construct a point geometry.
    #[must_use]
    pub const fn point(x: f64, y: f64) -> Self {
        Self::Point(Coord { x, y })
    }

    /// Construct a validated line string.
    pub fn line_string(coords: Vec<Coord<f64>>) -> Result<Self, GeometryError> {
        Self::LineString(coords).into_valid()
    }

    /// Construct a validated multi line string.
    pub fn multi_line_string(lines: Vec<Vec<Coord<f64>>>) -> Result<Self, GeometryError> {
        Self::MultiLineString(lines).into_valid()
    }

    /// Construct a polygon, appending the first vertex when the ring is open.
    pub fn polygon(ring: Vec<Coord<f64>>) -> Result<Self, GeometryError> {
        Self::Polygon(ring).into_valid()
    }

    /// Return the variant discriminant.
    #[must_use]
    pub const fn tag(&self) -> GeometryTag {
        match self {
            Self::Point(_) => GeometryTag::Point,
            Self::LineString(_) => GeometryTag::LineString,
            Self::MultiLineString(_) => GeometryTag::MultiLineString,
            Self::Polygon(_) => GeometryTag::Polygon,
        }
    }

    /// Whether the geometry is a polygon.
    #[must_use]
    pub const fn is_polygon(&self) -> bool {
        matches!(self, Self::Polygon(_))
    }

    /// Return the point coordinate when the geometry is a point.
    #[must_use]
    pub const fn as_point(&self) -> Option<Coord<f64>> {
        match self {
            Self::Point(coord) => Some(*coord),
            _ => None,
        }
    }

    /// Iterate over every coordinate in storage order.
    pub fn coords(&self) -> Box<dyn Iterator<Item = &Coord<f64>> + '_> {
        match self {
            Self::Point(coord) => Box::new(std::iter::once(coord)),
            Self::LineString(coords) | Self::Polygon(coords) => Box::new(coords.iter()),
            Self::MultiLineString(lines) => Box::new(lines.iter().flatten()),
        }
    }

    /// Validate the geometry, closing open polygon rings.
    ///
    /// Every coordinate must be finite. Line strings need two positions,
    /// multi line strings need at least one member and polygon rings need
    /// three distinct positions.
    pub fn into_valid(self) -> Result<Self, GeometryError> {
        if let Some(bad) = self.coords().find(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(GeometryError::NonFiniteCoordinate { x: bad.x, y: bad.y });
        }
        match self {
            Self::Point(_) => Ok(self),
            Self::LineString(coords) => {
                validate_line(&coords)?;
                Ok(Self::LineString(coords))
            }
            Self::MultiLineString(lines) => {
                if lines.is_empty() {
                    return Err(GeometryError::Empty {
                        kind: GeometryTag::MultiLineString,
                    });
                }
                for line in &lines {
                    validate_line(line)?;
                }
                Ok(Self::MultiLineString(lines))
            }
            Self::Polygon(ring) => close_ring(ring).map(Self::Polygon),
        }
    }

    /// Return the smallest envelope covering the geometry.
    #[must_use]
    pub fn envelope(&self) -> Envelope {
        let mut coords = self.coords();
        let Some(first) = coords.next() else {
            return Envelope::new(0.0, 0.0, 0.0, 0.0);
        };
        let (min, max) = coords.fold((*first, *first), |(min, max), c| {
            (
                Coord {
                    x: min.x.min(c.x),
                    y: min.y.min(c.y),
                },
                Coord {
                    x: max.x.max(c.x),
                    y: max.y.max(c.y),
                },
            )
        });
        Envelope::from_rect(Rect::new(min, max))
    }

    /// Convert into the equivalent [`geo::Geometry`].
    #[must_use]
    pub fn to_geo(&self) -> geo::Geometry<f64> {
        match self {
            Self::Point(coord) => geo::Geometry::Point(Point::from(*coord)),
            Self::LineString(coords) => geo::Geometry::LineString(LineString::new(coords.clone())),
            Self::MultiLineString(lines) => geo::Geometry::MultiLineString(MultiLineString::new(
                lines.iter().cloned().map(LineString::new).collect(),
            )),
            Self::Polygon(ring) => {
                geo::Geometry::Polygon(Polygon::new(LineString::new(ring.clone()), Vec::new()))
            }
        }
    }
}

fn validate_line(coords: &[Coord<f64>]) -> Result<(), GeometryError> {
    match coords.len() {
        0 => Err(GeometryError::Empty {
            kind: GeometryTag::LineString,
        }),
        1 => Err(GeometryError::TooFewPoints {
            kind: GeometryTag::LineString,
            required: 2,
            found: 1,
        }),
        _ => Ok(()),
    }
}

fn close_ring(mut ring: Vec<Coord<f64>>) -> Result<Vec<Coord<f64>>, GeometryError> {
    let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) else {
        return Err(GeometryError::Empty {
            kind: GeometryTag::Polygon,
        });
    };
    let mut distinct: Vec<Coord<f64>> = Vec::with_capacity(ring.len());
    for coord in &ring {
        if !distinct.contains(coord) {
            distinct.push(*coord);
        }
    }
    if distinct.len() < 3 {
        return Err(GeometryError::RingNotClosable {
            distinct: distinct.len(),
        });
    }
    if first != last {
        ring.push(first);
    }
    Ok(ring)
}

/// Closed axis-aligned rectangle `[min_lon, max_lon] × [min_lat, max_lat]`.
///
/// Corners are normalised so that `min ≤ max` on both axes. Envelopes do not
/// model regions crossing the antimeridian; split such areas into two
/// envelopes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Envelope(Rect<f64>);

impl Envelope {
    /// Build an envelope from longitude/latitude bounds.
    ///
    /// # Examples
    /// ```
    /// use waypost_core::Envelope;
    ///
    /// let envelope = Envelope::new(10.0, 45.0, 9.0, 46.0);
    /// assert_eq!(envelope.min_lon(), 9.0);
    /// assert_eq!(envelope.max_lon(), 10.0);
    /// ```
    #[must_use]
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self(Rect::new(
            Coord {
                x: min_lon,
                y: min_lat,
            },
            Coord {
                x: max_lon,
                y: max_lat,
            },
        ))
    }

    /// Wrap an existing `geo` rectangle.
    #[must_use]
    pub const fn from_rect(rect: Rect<f64>) -> Self {
        Self(rect)
    }

    /// Square envelope of half-width `half_extent` centred on `centre`.
    #[must_use]
    pub fn around(centre: Coord<f64>, half_extent: f64) -> Self {
        Self::new(
            centre.x - half_extent,
            centre.y - half_extent,
            centre.x + half_extent,
            centre.y + half_extent,
        )
    }

    /// Minimum longitude.
    #[must_use]
    pub fn min_lon(&self) -> f64 {
        self.0.min().x
    }

    /// Minimum latitude.
    #[must_use]
    pub fn min_lat(&self) -> f64 {
        self.0.min().y
    }

    /// Maximum longitude.
    #[must_use]
    pub fn max_lon(&self) -> f64 {
        self.0.max().x
    }

    /// Maximum latitude.
    #[must_use]
    pub fn max_lat(&self) -> f64 {
        self.0.max().y
    }

    /// Borrow the underlying `geo` rectangle.
    #[must_use]
    pub const fn rect(&self) -> &Rect<f64> {
        &self.0
    }

    /// Whether the coordinate lies inside or on the boundary.
    #[must_use]
    pub fn contains_coord(&self, coord: Coord<f64>) -> bool {
        (self.min_lon()..=self.max_lon()).contains(&coord.x)
            && (self.min_lat()..=self.max_lat()).contains(&coord.y)
    }

    /// Whether two envelopes share at least one point.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_lon() <= other.max_lon()
            && other.min_lon() <= self.max_lon()
            && self.min_lat() <= other.max_lat()
            && other.min_lat() <= self.max_lat()
    }

    /// Convert into an `rstar` bounding box.
    #[must_use]
    pub fn to_aabb(&self) -> rstar::AABB<[f64; 2]> {
        rstar::AABB::from_corners(
            [self.min_lon(), self.min_lat()],
            [self.max_lon(), self.max_lat()],
        )
    }
}

/// Numeric precision applied to coordinates built through a context.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PrecisionModel {
    /// Full `f64` precision.
    #[default]
    Floating,
    /// Coordinates are rounded to `1 / scale` units.
    Fixed {
        /// Grid resolution multiplier, e.g. `1e6` for micro-degrees.
        scale: f64,
    },
}

impl PrecisionModel {
    /// Round a single ordinate according to the model.
    #[must_use]
    pub fn make_precise(self, value: f64) -> f64 {
        match self {
            Self::Floating => value,
            Self::Fixed { scale } if scale > 0.0 && scale.is_finite() => {
                (value * scale).round() / scale
            }
            Self::Fixed { .. } => value,
        }
    }
}

/// Explicit geometry-construction context: reference system plus precision.
///
/// The context travels with each query instead of living in global state so
/// several reference systems can coexist and tests can inject deterministic
/// rounding.
///
/// # Examples
/// ```
/// use waypost_core::{GeometryContext, GeometryKind, PrecisionModel};
///
/// let context = GeometryContext::wgs84().with_precision(PrecisionModel::Fixed { scale: 10.0 });
/// assert_eq!(context.point(1.04, 2.06), GeometryKind::point(1.0, 2.1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeometryContext {
    /// Spatial reference identifier of every coordinate.
    pub srid: u32,
    /// Rounding applied when building geometries.
    pub precision: PrecisionModel,
}

impl Default for GeometryContext {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl GeometryContext {
    /// WGS84 longitude/latitude with floating precision.
    #[must_use]
    pub const fn wgs84() -> Self {
        Self {
            srid: WGS84_SRID,
            precision: PrecisionModel::Floating,
        }
    }

    /// Replace the precision model.
    #[must_use]
    pub const fn with_precision(mut self, precision: PrecisionModel) -> Self {
        self.precision = precision;
        self
    }

    /// Replace the spatial reference identifier.
    #[must_use]
    pub const fn with_srid(mut self, srid: u32) -> Self {
        self.srid = srid;
        self
    }

    /// Round a coordinate according to the precision model.
    #[must_use]
    pub fn coord(&self, x: f64, y: f64) -> Coord<f64> {
        Coord {
            x: self.precision.make_precise(x),
            y: self.precision.make_precise(y),
        }
    }

    /// Build a point geometry.
    #[must_use]
    pub fn point(&self, x: f64, y: f64) -> GeometryKind {
        GeometryKind::Point(self.coord(x, y))
    }

    /// Re-express a geometry under this context and validate it.
    pub fn geometry(&self, geometry: GeometryKind) -> Result<GeometryKind, GeometryError> {
        let round = |coords: Vec<Coord<f64>>| -> Vec<Coord<f64>> {
            coords.into_iter().map(|c| self.coord(c.x, c.y)).collect()
        };
        let rounded = match geometry {
            GeometryKind::Point(c) => GeometryKind::Point(self.coord(c.x, c.y)),
            GeometryKind::LineString(coords) => GeometryKind::LineString(round(coords)),
            GeometryKind::MultiLineString(lines) => {
                GeometryKind::MultiLineString(lines.into_iter().map(round).collect())
            }
            GeometryKind::Polygon(ring) => GeometryKind::Polygon(round(ring)),
        };
        rounded.into_valid()
    }
}
