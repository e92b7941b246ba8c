// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batch updates: validation, old→new index remapping and transaction scopes.
//!
//! ## Coordinates
//!
//! `Delete`, `Reload` and `DeleteSection` name positions *before* the batch;
//! `Insert` and `InsertSection` name positions *after* it.
//!
//! ## Remapping order
//!
//! Section deltas apply first: surviving old sections map, in order, onto the
//! new sections that were not inserted. Intra-section shifts apply second:
//! within each surviving section, surviving old items map, in order, onto the
//! new positions that were not inserted.
//!
//! [`IndexRemap::plan`] performs every check before anything is mutated, so a
//! rejected batch leaves the surface untouched.

use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::fmt;

use crate::{
    CollectionError, ConsistencyFault, ElementKey, IndexPath, ItemCounts, ValidationFault,
};

/// One operation of a batch update.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PendingUpdate {
    /// Insert an item at its post-update path.
    Insert(IndexPath),
    /// Delete the item at its pre-update path.
    Delete(IndexPath),
    /// Rebuild the view of the item at its pre-update path.
    Reload(IndexPath),
    /// Insert a whole section at its post-update index.
    InsertSection(usize),
    /// Delete a whole section at its pre-update index.
    DeleteSection(usize),
}

/// Shift applied to one surviving section.
#[derive(Clone, Debug)]
struct SectionShift {
    new_section: usize,
    /// Deleted items, old numbering, ascending.
    deleted: Vec<usize>,
    /// Inserted items, new numbering, ascending.
    inserted: Vec<usize>,
}

/// Validated old→new mapping for one batch.
#[derive(Clone, Debug)]
pub struct IndexRemap {
    old_counts: ItemCounts,
    new_counts: ItemCounts,
    /// Indexed by old section; `None` for deleted sections.
    sections: Vec<Option<SectionShift>>,
    inserted_sections: BTreeSet<usize>,
    inserted_items: BTreeSet<IndexPath>,
    reloaded: BTreeSet<IndexPath>,
}

impl IndexRemap {
    /// Validates `updates` against `old` and checks the result against the
    /// counts the data source `reported` after the change.
    ///
    /// Duplicate operations collapse to one.
    pub fn plan(
        old: &ItemCounts,
        updates: &[PendingUpdate],
        reported: &ItemCounts,
    ) -> Result<Self, CollectionError> {
        let mut deleted_sections = BTreeSet::new();
        let mut inserted_sections = BTreeSet::new();
        let mut deleted = BTreeSet::new();
        let mut inserted = BTreeSet::new();
        let mut reloaded = BTreeSet::new();
        for update in updates {
            match *update {
                PendingUpdate::Insert(ip) => inserted.insert(ip),
                PendingUpdate::Delete(ip) => deleted.insert(ip),
                PendingUpdate::Reload(ip) => reloaded.insert(ip),
                PendingUpdate::InsertSection(s) => inserted_sections.insert(s),
                PendingUpdate::DeleteSection(s) => deleted_sections.insert(s),
            };
        }

        // Sections.
        let old_sections = old.section_count();
        if let Some(&section) = deleted_sections.range(old_sections..).next() {
            return Err(ValidationFault::SectionOutOfRange { section }.into());
        }
        let new_sections = old_sections - deleted_sections.len() + inserted_sections.len();
        if let Some(&section) = inserted_sections.range(new_sections..).next() {
            return Err(ValidationFault::SectionOutOfRange { section }.into());
        }
        let mut section_map: Vec<Option<usize>> = Vec::with_capacity(old_sections);
        let mut next_new = 0;
        for section in 0..old_sections {
            if deleted_sections.contains(&section) {
                section_map.push(None);
                continue;
            }
            while inserted_sections.contains(&next_new) {
                next_new += 1;
            }
            section_map.push(Some(next_new));
            next_new += 1;
        }

        // Old-coordinate item operations.
        for &ip in deleted.iter().chain(reloaded.iter()) {
            if deleted_sections.contains(&ip.section) {
                return Err(ValidationFault::ConflictingUpdate { index_path: ip }.into());
            }
            if !old.contains(ip) {
                return Err(ValidationFault::ItemOutOfRange { index_path: ip }.into());
            }
        }
        if let Some(&ip) = reloaded.intersection(&deleted).next() {
            return Err(ValidationFault::ConflictingUpdate { index_path: ip }.into());
        }
        if let Some(&ip) = inserted.intersection(&deleted).next() {
            return Err(ValidationFault::ConflictingUpdate { index_path: ip }.into());
        }

        // New-coordinate item operations.
        for &ip in &inserted {
            if ip.section >= new_sections {
                return Err(ValidationFault::ItemOutOfRange { index_path: ip }.into());
            }
            if inserted_sections.contains(&ip.section) {
                return Err(ValidationFault::ConflictingUpdate { index_path: ip }.into());
            }
        }

        // Shifts, range checks and consistency against the reported counts.
        if reported.section_count() != new_sections {
            return Err(Self::inconsistent(ConsistencyFault::SectionCount {
                expected: new_sections,
                reported: reported.section_count(),
            }));
        }
        let mut sections: Vec<Option<SectionShift>> = Vec::with_capacity(old_sections);
        for (old_section, new_section) in section_map.iter().enumerate() {
            let Some(new_section) = *new_section else {
                sections.push(None);
                continue;
            };
            let deleted_items: Vec<usize> = items_in_section(&deleted, old_section).collect();
            let inserted_items: Vec<usize> = items_in_section(&inserted, new_section).collect();
            let expected =
                old.item_count(old_section) - deleted_items.len() + inserted_items.len();
            if let Some(&item) = inserted_items.iter().find(|&&item| item >= expected) {
                return Err(ValidationFault::ItemOutOfRange {
                    index_path: IndexPath::new(new_section, item),
                }
                .into());
            }
            let reported_count = reported.item_count(new_section);
            if reported_count != expected {
                return Err(Self::inconsistent(ConsistencyFault::ItemCount {
                    section: new_section,
                    expected,
                    reported: reported_count,
                }));
            }
            sections.push(Some(SectionShift {
                new_section,
                deleted: deleted_items,
                inserted: inserted_items,
            }));
        }

        log::debug!(
            "planned batch: {} sections -{} +{}, items -{} +{} ~{}",
            old_sections,
            deleted_sections.len(),
            inserted_sections.len(),
            deleted.len(),
            inserted.len(),
            reloaded.len()
        );
        Ok(Self {
            old_counts: old.clone(),
            new_counts: reported.clone(),
            sections,
            inserted_sections,
            inserted_items: inserted,
            reloaded,
        })
    }

    fn inconsistent(fault: ConsistencyFault) -> CollectionError {
        log::error!("{fault}");
        fault.into()
    }

    /// Counts before the batch.
    #[must_use]
    pub fn old_counts(&self) -> &ItemCounts {
        &self.old_counts
    }

    /// Counts after the batch, as reported by the data source.
    #[must_use]
    pub fn new_counts(&self) -> &ItemCounts {
        &self.new_counts
    }

    /// New index of old `section`, or `None` if it was deleted.
    #[must_use]
    pub fn map_section(&self, section: usize) -> Option<usize> {
        self.sections
            .get(section)?
            .as_ref()
            .map(|shift| shift.new_section)
    }

    /// New path of the item at old `index_path`, or `None` if it was deleted.
    #[must_use]
    pub fn map_index_path(&self, index_path: IndexPath) -> Option<IndexPath> {
        if !self.old_counts.contains(index_path) {
            return None;
        }
        let shift = self.sections.get(index_path.section)?.as_ref()?;
        if shift.deleted.binary_search(&index_path.item).is_ok() {
            return None;
        }
        // Rank among surviving items, then the rank-th position not taken by an insert.
        let mut item = index_path.item - shift.deleted.partition_point(|&d| d < index_path.item);
        for &inserted in &shift.inserted {
            if inserted <= item {
                item += 1;
            } else {
                break;
            }
        }
        Some(IndexPath::new(shift.new_section, item))
    }

    /// New key of an old element.
    #[must_use]
    pub fn map_element(&self, key: ElementKey) -> Option<ElementKey> {
        match key {
            ElementKey::Item(ip) => self.map_index_path(ip).map(ElementKey::Item),
            ElementKey::Supplementary(kind, section) => self
                .map_section(section)
                .map(|section| ElementKey::Supplementary(kind, section)),
        }
    }

    /// Whether the item at old `index_path` must be rebuilt.
    #[must_use]
    pub fn is_reloaded(&self, index_path: IndexPath) -> bool {
        self.reloaded.contains(&index_path)
    }

    /// Whether new `section` was inserted by this batch.
    #[must_use]
    pub fn is_inserted_section(&self, section: usize) -> bool {
        self.inserted_sections.contains(&section)
    }

    /// Whether the item at new `index_path` was inserted by this batch.
    #[must_use]
    pub fn is_inserted(&self, index_path: IndexPath) -> bool {
        self.inserted_items.contains(&index_path) || self.is_inserted_section(index_path.section)
    }
}

fn items_in_section(
    paths: &BTreeSet<IndexPath>,
    section: usize,
) -> impl Iterator<Item = usize> + '_ {
    paths
        .range(IndexPath::new(section, 0)..=IndexPath::new(section, usize::MAX))
        .map(|ip| ip.item)
}

/// Callback run when a batch finishes; the flag is `false` if it was rejected.
pub type Completion = Box<dyn FnOnce(bool)>;

/// Nested `begin_updates`/`end_updates` scope.
///
/// Operations and completions accumulate until the outermost scope closes.
#[derive(Default)]
pub(crate) struct UpdateScope {
    depth: usize,
    updates: Vec<PendingUpdate>,
    completions: Vec<Completion>,
}

impl fmt::Debug for UpdateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateScope")
            .field("depth", &self.depth)
            .field("updates", &self.updates)
            .field("completions", &self.completions.len())
            .finish()
    }
}

impl UpdateScope {
    pub(crate) fn begin(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn is_open(&self) -> bool {
        self.depth > 0
    }

    pub(crate) fn push(&mut self, updates: impl IntoIterator<Item = PendingUpdate>) {
        self.updates.extend(updates);
    }

    pub(crate) fn on_complete(&mut self, completion: Completion) {
        self.completions.push(completion);
    }

    /// Closes one scope. Returns the accumulated batch when the outermost scope closes.
    pub(crate) fn end(
        &mut self,
    ) -> Result<Option<(Vec<PendingUpdate>, Vec<Completion>)>, ValidationFault> {
        if self.depth == 0 {
            return Err(ValidationFault::UnbalancedEndUpdates);
        }
        self.depth -= 1;
        if self.depth > 0 {
            return Ok(None);
        }
        Ok(Some((
            core::mem::take(&mut self.updates),
            core::mem::take(&mut self.completions),
        )))
    }
}
