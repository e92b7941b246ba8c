// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The displayed-view set and the diff that drives reconciliation.
//!
//! Each pass queries the geometry for the keys intersecting the (overscanned)
//! viewport, removes displayed keys that fell out of that set, and adds the
//! missing ones in ascending [`ElementKey`] order.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use crate::update::IndexRemap;
use crate::view::{ReusableView, ViewSlot};
use crate::ElementKey;

/// Keys added and removed by one reconciliation pass, ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Keys that gained a view.
    pub added: Vec<ElementKey>,
    /// Keys whose view was pooled.
    pub removed: Vec<ElementKey>,
}

impl ReconcileReport {
    /// Returns `true` if the pass changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Displayed slots keyed by element.
///
/// At most one slot is bound to a key. Keys the data source declined to
/// populate (supplementary views it returned nothing for) are remembered so
/// repeated passes do not ask again while they stay visible.
#[derive(Debug)]
pub(crate) struct VisibleSet<V> {
    displayed: BTreeMap<ElementKey, ViewSlot<V>>,
    declined: BTreeSet<ElementKey>,
}

impl<V> Default for VisibleSet<V> {
    fn default() -> Self {
        Self {
            displayed: BTreeMap::new(),
            declined: BTreeSet::new(),
        }
    }
}

impl<V: ReusableView> VisibleSet<V> {
    pub(crate) fn len(&self) -> usize {
        self.displayed.len()
    }

    pub(crate) fn get(&self, key: &ElementKey) -> Option<&ViewSlot<V>> {
        self.displayed.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &ElementKey) -> Option<&mut ViewSlot<V>> {
        self.displayed.get_mut(key)
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = ElementKey> + '_ {
        self.displayed.keys().copied()
    }

    pub(crate) fn slots_mut(&mut self) -> impl Iterator<Item = (&ElementKey, &mut ViewSlot<V>)> {
        self.displayed.iter_mut()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&ElementKey, &ViewSlot<V>)> {
        self.displayed.iter()
    }

    /// Splits `target` (ascending) against the displayed keys.
    ///
    /// Returns `(to_remove, to_add)`, both ascending. Declined keys that left
    /// the target are forgotten; declined keys still in it are not re-added.
    pub(crate) fn diff(&mut self, target: &[ElementKey]) -> (Vec<ElementKey>, Vec<ElementKey>) {
        let wanted: BTreeSet<ElementKey> = target.iter().copied().collect();
        self.declined.retain(|key| wanted.contains(key));
        let to_remove = self
            .displayed
            .keys()
            .filter(|key| !wanted.contains(key))
            .copied()
            .collect();
        let to_add = wanted
            .into_iter()
            .filter(|key| !self.displayed.contains_key(key) && !self.declined.contains(key))
            .collect();
        (to_remove, to_add)
    }

    pub(crate) fn insert(&mut self, key: ElementKey, mut slot: ViewSlot<V>) {
        slot.bind(key);
        let previous = self.displayed.insert(key, slot);
        debug_assert!(previous.is_none(), "two views bound to {key:?}");
    }

    pub(crate) fn decline(&mut self, key: ElementKey) {
        self.declined.insert(key);
    }

    pub(crate) fn remove(&mut self, key: &ElementKey) -> Option<ViewSlot<V>> {
        self.displayed.remove(key)
    }

    /// Removes every slot, ascending.
    pub(crate) fn drain(&mut self) -> Vec<(ElementKey, ViewSlot<V>)> {
        self.declined.clear();
        core::mem::take(&mut self.displayed).into_iter().collect()
    }

    /// Rebinds displayed slots to their post-update keys.
    ///
    /// Returns the slots that must be retired: deleted elements and reloaded
    /// items. They keep their old keys so end-of-display can be reported.
    pub(crate) fn remap(&mut self, remap: &IndexRemap) -> Vec<(ElementKey, ViewSlot<V>)> {
        let mut retired = Vec::new();
        let mut rebound = BTreeMap::new();
        for (key, mut slot) in core::mem::take(&mut self.displayed) {
            let reloaded = key.index_path().is_some_and(|ip| remap.is_reloaded(ip));
            match remap.map_element(key) {
                Some(new_key) if !reloaded => {
                    slot.bind(new_key);
                    rebound.insert(new_key, slot);
                }
                _ => retired.push((key, slot)),
            }
        }
        self.displayed = rebound;
        self.declined.clear();
        retired
    }
}
