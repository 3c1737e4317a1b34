//! In-memory feature store indexed by an R\*-tree of record envelopes.

use std::collections::{BTreeMap, btree_map::Entry};
use std::fmt;

use geo::Coord;
use log::warn;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::feature::{Category, FeatureId, GeoRecord};
use crate::geometry::Envelope;
use crate::predicates::{envelope_distance, intersects_box};

use super::FeatureStore;

/// Envelope of one stored record pointing back at its slot.
#[derive(Debug, Clone, Copy)]
struct Indexed {
    envelope: Envelope,
    slot: usize,
}

impl RTreeObject for Indexed {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope.to_aabb()
    }
}

impl PointDistance for Indexed {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let [x, y] = *point;
        envelope_distance(&self.envelope, Coord { x, y }).powi(2)
    }
}

/// Immutable in-memory store.
///
/// Records are held in ascending id order. The R\*-tree only narrows the
/// candidate set; results match a sequential scan with an exact predicate.
pub struct MemoryStore<R> {
    records: Vec<R>,
    index: RTree<Indexed>,
}

impl<R> fmt::Debug for MemoryStore<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.records.len())
            .finish_non_exhaustive()
    }
}

impl<R: GeoRecord> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<R: GeoRecord> MemoryStore<R> {
    /// Build a store from records. When ids repeat, the first record wins.
    #[must_use]
    pub fn new<I>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
    {
        let mut by_id: BTreeMap<FeatureId, R> = BTreeMap::new();
        for record in records {
            match by_id.entry(record.id()) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                Entry::Occupied(_) => {
                    warn!("ignoring duplicate feature id {}", record.id());
                }
            }
        }
        let sorted: Vec<R> = by_id.into_values().collect();
        let entries = sorted
            .iter()
            .enumerate()
            .map(|(slot, record)| Indexed {
                envelope: record.geometry().envelope(),
                slot,
            })
            .collect();
        Self {
            records: sorted,
            index: RTree::bulk_load(entries),
        }
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Borrow every record in ascending id order.
    #[must_use]
    pub fn records(&self) -> &[R] {
        &self.records
    }
}

impl<R> FeatureStore for MemoryStore<R>
where
    R: GeoRecord + Send + Sync,
{
    type Record = R;

    fn features_in(&self, envelope: &Envelope) -> Box<dyn Iterator<Item = R> + Send + '_> {
        let mut slots: Vec<usize> = self
            .index
            .locate_in_envelope_intersecting(&envelope.to_aabb())
            .map(|entry| entry.slot)
            .collect();
        slots.sort_unstable();
        let query = *envelope;
        Box::new(
            slots
                .into_iter()
                .filter_map(|slot| self.records.get(slot))
                .filter(move |record| intersects_box(record.geometry(), &query))
                .cloned(),
        )
    }

    fn features_by_category(&self, category: Category) -> Box<dyn Iterator<Item = R> + Send + '_> {
        Box::new(
            self.records
                .iter()
                .filter(move |record| record.feature().categories.contains(&category))
                .cloned(),
        )
    }

    fn feature(&self, id: FeatureId) -> Option<R> {
        self.records
            .binary_search_by_key(&id, GeoRecord::id)
            .ok()
            .and_then(|slot| self.records.get(slot))
            .cloned()
    }

    fn nearest_candidates(&self, coord: Coord<f64>, limit: usize) -> Vec<R> {
        if limit == 0 {
            return Vec::new();
        }
        let mut picked: Vec<(f64, usize)> = Vec::with_capacity(limit);
        for (entry, distance_2) in self
            .index
            .nearest_neighbor_iter_with_distance_2(&[coord.x, coord.y])
        {
            if picked.len() >= limit && picked.last().is_some_and(|(d, _)| distance_2 > *d) {
                break;
            }
            picked.push((distance_2, entry.slot));
        }
        picked.sort_by(|(da, sa), (db, sb)| da.total_cmp(db).then(sa.cmp(sb)));
        picked.truncate(limit);
        picked
            .into_iter()
            .filter_map(|(_, slot)| self.records.get(slot).cloned())
            .collect()
    }
}
