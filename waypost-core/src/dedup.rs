//! Collapse records that share an identical geometry.
//!
//! Several stored records can describe the same physical feature with the
//! same shape. Query results keep one representative per distinct shape and
//! merge the category tags of every collapsed record into it.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use geo::Coord;
use log::debug;

use crate::feature::{Category, FeatureId, GeoRecord};
use crate::geometry::{GeometryKind, GeometryTag};

/// Exact, order-sensitive identity of a geometry.
///
/// Two geometries share a key only when they have the same variant and the
/// same coordinate sequence bit for bit, with `-0.0` treated as `0.0`.
/// Reversed line strings and rotated rings therefore have distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalKey {
    tag: GeometryTag,
    parts: Vec<Vec<[u64; 2]>>,
}

impl CanonicalKey {
    /// Compute the key of a geometry.
    #[must_use]
    pub fn of(geometry: &GeometryKind) -> Self {
        let parts = match geometry {
            GeometryKind::Point(coord) => vec![vec![ordinate_bits(*coord)]],
            GeometryKind::LineString(coords) | GeometryKind::Polygon(coords) => {
                vec![coords.iter().copied().map(ordinate_bits).collect()]
            }
            GeometryKind::MultiLineString(lines) => lines
                .iter()
                .map(|line| line.iter().copied().map(ordinate_bits).collect())
                .collect(),
        };
        Self {
            tag: geometry.tag(),
            parts,
        }
    }
}

const fn ordinate_bits(coord: Coord<f64>) -> [u64; 2] {
    [normalise_zero(coord.x).to_bits(), normalise_zero(coord.y).to_bits()]
}

const fn normalise_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

impl fmt::Display for CanonicalKey {
    /// Render the key in WKT-like text, e.g. `POINT(1 2)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag.as_str())?;
        match self.tag {
            GeometryTag::Point | GeometryTag::LineString => {
                f.write_str("(")?;
                for part in &self.parts {
                    write_sequence(f, part)?;
                }
                f.write_str(")")
            }
            GeometryTag::MultiLineString | GeometryTag::Polygon => {
                f.write_str("(")?;
                for (index, part) in self.parts.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str("(")?;
                    write_sequence(f, part)?;
                    f.write_str(")")?;
                }
                f.write_str(")")
            }
        }
    }
}

fn write_sequence(f: &mut fmt::Formatter<'_>, seq: &[[u64; 2]]) -> fmt::Result {
    for (index, [x, y]) in seq.iter().enumerate() {
        if index > 0 {
            f.write_str(",")?;
        }
        write!(f, "{} {}", f64::from_bits(*x), f64::from_bits(*y))?;
    }
    Ok(())
}

/// One distinct geometry and every record that carried it.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupGroup<R> {
    /// First record encountered with this geometry.
    pub representative: R,
    /// Union of the categories of every member.
    pub categories: BTreeSet<Category>,
    /// Identifiers of every member in input order.
    pub members: Vec<FeatureId>,
}

impl<R: GeoRecord> DedupGroup<R> {
    /// Consume the group, returning the representative carrying the merged
    /// categories.
    #[must_use]
    pub fn into_merged(self) -> R {
        let mut record = self.representative;
        record.feature_mut().categories = self.categories;
        record
    }
}

/// Group records by canonical geometry key, preserving first-seen order.
///
/// # Examples
/// ```
/// use waypost_core::{FeatureId, GeoFeature, GeometryKind, dedup::group};
///
/// let records = vec![
///     GeoFeature::new(FeatureId(1), "a", GeometryKind::point(1.0, 1.0)),
///     GeoFeature::new(FeatureId(2), "b", GeometryKind::point(1.0, 1.0)),
///     GeoFeature::new(FeatureId(3), "c", GeometryKind::point(2.0, 2.0)),
/// ];
/// let groups = group(records);
/// assert_eq!(groups.len(), 2);
/// assert_eq!(groups[0].members, vec![FeatureId(1), FeatureId(2)]);
/// ```
#[must_use]
pub fn group<R, I>(records: I) -> Vec<DedupGroup<R>>
where
    R: GeoRecord,
    I: IntoIterator<Item = R>,
{
    let mut positions: HashMap<CanonicalKey, usize> = HashMap::new();
    let mut groups: Vec<DedupGroup<R>> = Vec::new();
    for record in records {
        let key = CanonicalKey::of(record.geometry());
        let id = record.id();
        if let Some(&position) = positions.get(&key) {
            if let Some(existing) = groups.get_mut(position) {
                existing
                    .categories
                    .extend(record.feature().categories.iter().copied());
                existing.members.push(id);
            }
            continue;
        }
        positions.insert(key, groups.len());
        groups.push(DedupGroup {
            categories: record.feature().categories.clone(),
            members: vec![id],
            representative: record,
        });
    }
    groups
}

/// Return one representative per distinct geometry, carrying the merged
/// categories of its group, in first-occurrence order.
///
/// Applying `dedup` to its own output returns the same records.
#[must_use]
pub fn dedup<R, I>(records: I) -> Vec<R>
where
    R: GeoRecord,
    I: IntoIterator<Item = R>,
{
    let groups = group(records);
    let collapsed: usize = groups.iter().map(|g| g.members.len() - 1).sum();
    if collapsed > 0 {
        debug!(
            "collapsed {collapsed} duplicate geometries into {} groups",
            groups.len()
        );
    }
    groups.into_iter().map(DedupGroup::into_merged).collect()
}
