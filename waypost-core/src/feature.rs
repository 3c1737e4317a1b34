//! Geo feature records.
//!
//! Points of interest and trails are two concrete record shapes that embed
//! the same [`GeoFeature`]. Spatial algorithms are generic over
//! [`GeoRecord`] and only ever look at the embedded feature.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::GeometryKind;

/// Identifier of a stored feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FeatureId(pub u64);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category tags a point of interest may carry.
///
/// # Examples
/// ```
/// use waypost_core::Category;
///
/// assert_eq!(Category::DrinkingWater.as_str(), "DrinkingWater");
/// assert_eq!("campSite".parse::<Category>(), Ok(Category::CampSite));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Category {
    /// Uncategorised location.
    Generic,
    /// Potable water source.
    DrinkingWater,
    /// Hut or covered refuge.
    Shelter,
    /// Public toilet.
    Toilet,
    /// Restaurant.
    Restaurant,
    /// Bar or pub.
    Bar,
    /// Scenic viewpoint.
    Viewpoint,
    /// Camp site.
    CampSite,
    /// Bench.
    Bench,
    /// Information board or office.
    Info,
    /// Parking area.
    Parking,
    /// Picnic site.
    PicnicSite,
    /// Fireplace or barbecue spot.
    Fireplace,
    /// Ruin.
    Ruin,
    /// Mountain summit.
    Summit,
    /// Waterfall.
    Waterfall,
    /// Bridge.
    Bridge,
    /// Gate.
    Gate,
    /// Summit or wayside cross.
    Cross,
    /// Cave.
    Cave,
    /// Hazard.
    Danger,
    /// Signpost.
    Signpost,
}

impl Category {
    /// Every category in declaration order.
    pub const ALL: [Self; 22] = [
        Self::Generic,
        Self::DrinkingWater,
        Self::Shelter,
        Self::Toilet,
        Self::Restaurant,
        Self::Bar,
        Self::Viewpoint,
        Self::CampSite,
        Self::Bench,
        Self::Info,
        Self::Parking,
        Self::PicnicSite,
        Self::Fireplace,
        Self::Ruin,
        Self::Summit,
        Self::Waterfall,
        Self::Bridge,
        Self::Gate,
        Self::Cross,
        Self::Cave,
        Self::Danger,
        Self::Signpost,
    ];

    /// Return the PascalCase name used on the wire and in the `categories`
    /// column. Parsing ignores case, so camelCase input is also accepted.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "Generic",
            Self::DrinkingWater => "DrinkingWater",
            Self::Shelter => "Shelter",
            Self::Toilet => "Toilet",
            Self::Restaurant => "Restaurant",
            Self::Bar => "Bar",
            Self::Viewpoint => "Viewpoint",
            Self::CampSite => "CampSite",
            Self::Bench => "Bench",
            Self::Info => "Info",
            Self::Parking => "Parking",
            Self::PicnicSite => "PicnicSite",
            Self::Fireplace => "Fireplace",
            Self::Ruin => "Ruin",
            Self::Summit => "Summit",
            Self::Waterfall => "Waterfall",
            Self::Bridge => "Bridge",
            Self::Gate => "Gate",
            Self::Cross => "Cross",
            Self::Cave => "Cave",
            Self::Danger => "Danger",
            Self::Signpost => "Signpost",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

/// Shared shape of every stored geo feature.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoFeature {
    /// Unique identifier.
    pub id: FeatureId,
    /// Display name.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Shape in WGS84 longitude/latitude order.
    pub geometry: GeometryKind,
    /// Category tags.
    #[cfg_attr(feature = "serde", serde(default))]
    pub categories: BTreeSet<Category>,
    /// Creation timestamp.
    #[cfg_attr(feature = "serde", serde(default = "unix_epoch"))]
    pub created_at: SystemTime,
}

#[cfg(feature = "serde")]
const fn unix_epoch() -> SystemTime {
    SystemTime::UNIX_EPOCH
}

impl GeoFeature {
    /// Construct a feature with no description and no categories.
    ///
    /// # Examples
    /// ```
    /// use waypost_core::{FeatureId, GeoFeature, GeometryKind};
    ///
    /// let feature = GeoFeature::new(FeatureId(1), "Spring", GeometryKind::point(9.1, 45.2));
    /// assert!(feature.categories.is_empty());
    /// ```
    #[must_use]
    pub fn new(id: FeatureId, name: impl Into<String>, geometry: GeometryKind) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            geometry,
            categories: BTreeSet::new(),
            created_at: SystemTime::UNIX_EPOCH,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach categories.
    #[must_use]
    pub fn with_categories<I>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = Category>,
    {
        self.categories.extend(categories);
        self
    }

    /// Set the creation timestamp.
    #[must_use]
    pub const fn with_created_at(mut self, created_at: SystemTime) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Access to the embedded [`GeoFeature`] of a concrete record.
pub trait GeoRecord: Clone {
    /// Borrow the shared feature shape.
    fn feature(&self) -> &GeoFeature;

    /// Mutably borrow the shared feature shape.
    fn feature_mut(&mut self) -> &mut GeoFeature;

    /// Identifier shortcut.
    fn id(&self) -> FeatureId {
        self.feature().id
    }

    /// Geometry shortcut.
    fn geometry(&self) -> &GeometryKind {
        &self.feature().geometry
    }
}

impl GeoRecord for GeoFeature {
    fn feature(&self) -> &GeoFeature {
        self
    }

    fn feature_mut(&mut self) -> &mut GeoFeature {
        self
    }
}

/// A point of interest, optionally attached to a trail.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointOfInterest {
    /// Shared feature shape.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub feature: GeoFeature,
    /// Trail this point belongs to, if any.
    pub trail_id: Option<FeatureId>,
}

impl PointOfInterest {
    /// Wrap a feature as a free-standing point of interest.
    #[must_use]
    pub const fn new(feature: GeoFeature) -> Self {
        Self {
            feature,
            trail_id: None,
        }
    }

    /// Attach the point to a trail.
    #[must_use]
    pub const fn on_trail(mut self, trail_id: FeatureId) -> Self {
        self.trail_id = Some(trail_id);
        self
    }
}

impl GeoRecord for PointOfInterest {
    fn feature(&self) -> &GeoFeature {
        &self.feature
    }

    fn feature_mut(&mut self) -> &mut GeoFeature {
        &mut self.feature
    }
}

/// Shape family of a trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum TrailType {
    /// Not recorded.
    #[default]
    Unknown,
    /// A single line.
    Line,
    /// Several disjoint lines.
    MultiLine,
    /// A closed area.
    Polygon,
}

impl TrailType {
    /// Derive the trail type matching a geometry.
    #[must_use]
    pub const fn of(geometry: &GeometryKind) -> Self {
        match geometry {
            GeometryKind::Point(_) => Self::Unknown,
            GeometryKind::LineString(_) => Self::Line,
            GeometryKind::MultiLineString(_) => Self::MultiLine,
            GeometryKind::Polygon(_) => Self::Polygon,
        }
    }
}

/// Difficulty grade of a trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum DifficultyLevel {
    /// Not graded.
    #[default]
    Unknown,
    /// Suitable for everyone.
    Easy,
    /// Some experience needed.
    Moderate,
    /// Demanding.
    Hard,
    /// Technical terrain.
    Expert,
}

/// A trail: a line, multi-line or polygon feature with grading attributes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trail {
    /// Shared feature shape.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub feature: GeoFeature,
    /// Shape family.
    #[cfg_attr(feature = "serde", serde(default))]
    pub trail_type: TrailType,
    /// Difficulty grade.
    #[cfg_attr(feature = "serde", serde(default))]
    pub difficulty: DifficultyLevel,
    /// Estimated length in meters, when surveyed.
    pub estimated_length_meters: Option<f64>,
}

impl Trail {
    /// Wrap a feature as a trail, deriving the trail type from its geometry.
    #[must_use]
    pub const fn new(feature: GeoFeature, difficulty: DifficultyLevel) -> Self {
        let trail_type = TrailType::of(&feature.geometry);
        Self {
            feature,
            trail_type,
            difficulty,
            estimated_length_meters: None,
        }
    }
}

impl GeoRecord for Trail {
    fn feature(&self) -> &GeoFeature {
        &self.feature
    }

    fn feature_mut(&mut self) -> &mut GeoFeature {
        &mut self.feature
    }
}
