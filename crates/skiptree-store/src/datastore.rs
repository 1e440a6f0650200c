//! `DataStore` — local storage keyed by `SpacePart`, with a `CompCounter`
//! per dimension observed so far.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use skiptree_core::{Cpe, Dimension, SpacePart, Value};
use tracing::debug;

use crate::comp_counter::{CompCounter, ItemId};
use crate::error::StoreError;

/// Opaque application payload stored alongside a key.
pub type PureData = Vec<u8>;

/// A single stored `(key, data)` pair.
#[derive(Debug, Clone)]
pub struct StoredItem {
    pub space_part: SpacePart,
    pub data: PureData,
}

/// The chosen split for one dimension, returned by
/// [`DataStore::get_partition_value`].
#[derive(Debug, Clone)]
pub struct PartitionValue {
    pub dimension: Dimension,
    pub pivot: Value,
    pub items_left: Vec<ItemId>,
    pub items_right: Vec<ItemId>,
}

/// Local storage for one peer: every `(SpacePart, PureData)` pair it owns,
/// plus one [`CompCounter`] per dimension observed across those pairs.
#[derive(Debug, Default)]
pub struct DataStore {
    items: Vec<StoredItem>,
    counters: HashMap<Dimension, CompCounter>,
}

impl DataStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&StoredItem> {
        self.items.get(id)
    }

    #[must_use]
    pub fn items(&self) -> &[StoredItem] {
        &self.items
    }

    /// Add one `(space_part, data)` pair, discovering any new dimensions it
    /// introduces and back-filling their counters from every item already
    /// stored (items lacking a newly-discovered dimension count as
    /// virtual for it).
    pub fn add(&mut self, space_part: SpacePart, data: PureData) -> ItemId {
        let id = self.items.len();

        for dim in space_part.dimensions() {
            self.counters.entry(dim.clone()).or_insert_with(|| {
                debug!(dimension = %dim, "discovered new dimension, backfilling counter");
                let mut backfilled = CompCounter::new();
                for (existing_id, existing) in self.items.iter().enumerate() {
                    let value = existing
                        .space_part
                        .component(dim)
                        .and_then(|c| match &c.value {
                            skiptree_core::ComponentValue::Point(v) => Some(v),
                            skiptree_core::ComponentValue::Range(r) if r.is_degenerate() => {
                                r.min.as_ref()
                            }
                            skiptree_core::ComponentValue::Range(_) => None,
                        });
                    backfilled.add(value, existing_id);
                }
                backfilled
            });
        }

        for (dim, counter) in &mut self.counters {
            let value = space_part.component(dim).and_then(|c| match &c.value {
                skiptree_core::ComponentValue::Point(v) => Some(v),
                skiptree_core::ComponentValue::Range(r) if r.is_degenerate() => r.min.as_ref(),
                skiptree_core::ComponentValue::Range(_) => None,
            });
            counter.add(value, id);
        }

        self.items.push(StoredItem { space_part, data });
        id
    }

    /// Every item whose key is included by `query` (§3, `SpacePart::includes_value`).
    #[must_use]
    pub fn get(&self, query: &SpacePart) -> Vec<&StoredItem> {
        self.items
            .iter()
            .filter(|item| query.includes_value(&item.space_part))
            .collect()
    }

    /// Choose the dimension and pivot to split this store on, for a join at
    /// the leaf described by `cpe`.
    ///
    /// `cpe` is accepted for signature fidelity with the source algorithm
    /// (§4.3); the pivot selection itself only consults the per-dimension
    /// counters, so it is otherwise unused here.
    ///
    /// # Errors
    /// Returns [`StoreError::EmptyStore`] if fewer than two items have been
    /// added (no dimension can yield both a non-empty left and right side).
    pub fn get_partition_value<R: Rng + ?Sized>(
        &self,
        _cpe: &Cpe,
        rng: &mut R,
    ) -> Result<PartitionValue, StoreError> {
        if self.items.len() < 2 {
            return Err(StoreError::EmptyStore);
        }

        let mut dims: Vec<&Dimension> = self.counters.keys().collect();
        // Randomize before the stable sort so dimensions tied on
        // (virtual_count, ratio_diff) don't always resolve the same way.
        dims.shuffle(rng);

        let mut candidates: Vec<(&Dimension, crate::comp_counter::PivotChoice)> = dims
            .into_iter()
            .filter_map(|dim| {
                self.counters[dim]
                    .best_pivot(rng)
                    .map(|choice| (dim, choice))
            })
            .collect();

        candidates.sort_by(|(_, a), (_, b)| {
            a.virtual_count
                .cmp(&b.virtual_count)
                .then(a.ratio_diff.total_cmp(&b.ratio_diff))
        });

        let (dimension, choice) = candidates.into_iter().next().ok_or(StoreError::EmptyStore)?;

        debug!(
            dimension = %dimension,
            left = choice.items_left.len(),
            right = choice.items_right.len(),
            "chose split"
        );
        Ok(PartitionValue {
            dimension: dimension.clone(),
            pivot: choice.pivot,
            items_left: choice.items_left,
            items_right: choice.items_right,
        })
    }

    /// Clone the `(space_part, data)` pairs for `ids`, e.g. to hand to a
    /// joining peer in an `STJoinReply`.
    #[must_use]
    pub fn extract(&self, ids: &[ItemId]) -> Vec<(SpacePart, PureData)> {
        ids.iter()
            .filter_map(|&id| self.items.get(id))
            .map(|item| (item.space_part.clone(), item.data.clone()))
            .collect()
    }

    /// A fresh store containing every item except `remove_ids`, with
    /// counters rebuilt from scratch. Used by the welcoming peer once an
    /// `STJoinRequest(ACCEPT)` commits a split: the items that moved to the
    /// joiner are dropped from the retained store.
    #[must_use]
    pub fn rebuild_without(&self, remove_ids: &HashSet<ItemId>) -> Self {
        let mut out = Self::new();
        for (id, item) in self.items.iter().enumerate() {
            if !remove_ids.contains(&id) {
                out.add(item.space_part.clone(), item.data.clone());
            }
        }
        out
    }
}
