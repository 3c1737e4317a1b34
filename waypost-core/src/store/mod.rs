//! Data access traits for geo features.
//!
//! The [`FeatureStore`] trait is the read-only seam between the query engine
//! and wherever features live. [`MemoryStore`] keeps records in an R\*-tree;
//! the optional `sqlite` module loads such a store from a database file.

use geo::Coord;

use crate::feature::{Category, FeatureId, GeoRecord};
use crate::geometry::Envelope;

mod memory;
#[cfg(feature = "store-sqlite")]
pub mod sqlite;

pub use memory::MemoryStore;

/// Read-only access to stored features.
///
/// Envelopes use WGS84 coordinates (`x = longitude`, `y = latitude`) and do
/// not model regions crossing the antimeridian; callers split such areas
/// into two envelopes.
///
/// # Examples
///
/// ```rust
/// use waypost_core::{
///     Envelope, FeatureId, FeatureStore, GeoFeature, GeometryKind, MemoryStore,
/// };
///
/// let store = MemoryStore::new(vec![
///     GeoFeature::new(FeatureId(2), "hut", GeometryKind::point(0.5, 0.5)),
///     GeoFeature::new(FeatureId(1), "spring", GeometryKind::point(0.0, 0.0)),
///     GeoFeature::new(FeatureId(3), "peak", GeometryKind::point(4.0, 4.0)),
/// ]);
/// let found: Vec<_> = store
///     .features_in(&Envelope::new(-1.0, -1.0, 1.0, 1.0))
///     .map(|f| f.id)
///     .collect();
/// assert_eq!(found, vec![FeatureId(1), FeatureId(2)]);
/// ```
pub trait FeatureStore {
    /// Concrete record shape held by the store.
    type Record: GeoRecord + Send;

    /// Return every record whose geometry intersects the closed envelope, in
    /// ascending id order.
    fn features_in(
        &self,
        envelope: &Envelope,
    ) -> Box<dyn Iterator<Item = Self::Record> + Send + '_>;

    /// Return every record tagged with `category`, in ascending id order.
    fn features_by_category(
        &self,
        category: Category,
    ) -> Box<dyn Iterator<Item = Self::Record> + Send + '_>;

    /// Look up a single record.
    fn feature(&self, id: FeatureId) -> Option<Self::Record>;

    /// Return up to `limit` records ordered by their envelope distance to
    /// `coord`, ties in ascending id order.
    fn nearest_candidates(&self, coord: Coord<f64>, limit: usize) -> Vec<Self::Record>;
}
