// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Index paths and per-section item counts.

use alloc::vec::Vec;
use core::fmt;

/// Address of an item: `(section, item)`.
///
/// Index paths order lexicographically by section, then item. The section-only
/// form (see [`IndexPath::for_section`]) addresses a whole section, for example
/// a section frame or a drop location past the end of a section.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexPath {
    /// Zero-based section index.
    pub section: usize,
    /// Zero-based item index within `section`.
    pub item: usize,
}

impl IndexPath {
    /// Item value used by the section-only form.
    pub const SECTION_ONLY: usize = usize::MAX;

    /// Creates an index path for `item` in `section`.
    #[inline]
    pub const fn new(section: usize, item: usize) -> Self {
        Self { section, item }
    }

    /// Creates the section-only index path for `section`.
    #[inline]
    pub const fn for_section(section: usize) -> Self {
        Self {
            section,
            item: Self::SECTION_ONLY,
        }
    }

    /// Returns `true` if this path addresses a section rather than an item.
    #[inline]
    pub const fn is_section_only(&self) -> bool {
        self.item == Self::SECTION_ONLY
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_section_only() {
            write!(f, "[{}]", self.section)
        } else {
            write!(f, "[{}, {}]", self.section, self.item)
        }
    }
}

/// Snapshot of how many items each section holds.
///
/// This is the "ground truth" read from a data source at reload or at the end
/// of a batch update. All geometry and selection state is validated against
/// the counts current at the time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemCounts {
    counts: Vec<usize>,
}

impl ItemCounts {
    /// Creates counts from one entry per section.
    #[must_use]
    pub fn new(counts: Vec<usize>) -> Self {
        Self { counts }
    }

    /// Builds counts for `sections` sections by calling `item_count` for each.
    pub fn from_fn(sections: usize, mut item_count: impl FnMut(usize) -> usize) -> Self {
        Self {
            counts: (0..sections).map(&mut item_count).collect(),
        }
    }

    /// Number of sections.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.counts.len()
    }

    /// Number of items in `section`, or zero if the section does not exist.
    #[must_use]
    pub fn item_count(&self, section: usize) -> usize {
        self.counts.get(section).copied().unwrap_or(0)
    }

    /// Per-section counts as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.counts
    }

    /// Total number of items across every section.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Returns `true` if no section holds any item.
    #[must_use]
    pub fn has_no_items(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Returns `true` if `index_path` names an existing item.
    #[must_use]
    pub fn contains(&self, index_path: IndexPath) -> bool {
        index_path.item < self.item_count(index_path.section)
    }

    /// First item in ascending order, skipping empty sections.
    #[must_use]
    pub fn first_index_path(&self) -> Option<IndexPath> {
        self.counts
            .iter()
            .position(|&c| c > 0)
            .map(|section| IndexPath::new(section, 0))
    }

    /// Last item in ascending order, skipping empty sections.
    #[must_use]
    pub fn last_index_path(&self) -> Option<IndexPath> {
        self.counts
            .iter()
            .rposition(|&c| c > 0)
            .map(|section| IndexPath::new(section, self.counts[section] - 1))
    }

    /// The item following `index_path` in ascending order.
    ///
    /// A section-only path sorts after every item of its section, so its
    /// successor is the first item of a later section.
    #[must_use]
    pub fn next_index_path(&self, index_path: IndexPath) -> Option<IndexPath> {
        let item = index_path.item.saturating_add(1);
        if item < self.item_count(index_path.section) {
            return Some(IndexPath::new(index_path.section, item));
        }
        (index_path.section + 1..self.counts.len())
            .find(|&s| self.counts[s] > 0)
            .map(|s| IndexPath::new(s, 0))
    }

    /// The item preceding `index_path` in ascending order.
    #[must_use]
    pub fn previous_index_path(&self, index_path: IndexPath) -> Option<IndexPath> {
        let count = self.item_count(index_path.section);
        if index_path.item > 0 && count > 0 {
            let item = (index_path.item - 1).min(count - 1);
            return Some(IndexPath::new(index_path.section, item));
        }
        (0..index_path.section.min(self.counts.len()))
            .rev()
            .find(|&s| self.counts[s] > 0)
            .map(|s| IndexPath::new(s, self.counts[s] - 1))
    }

    /// Iterates every valid index path in ascending order.
    pub fn index_paths(&self) -> impl Iterator<Item = IndexPath> + '_ {
        self.counts
            .iter()
            .enumerate()
            .flat_map(|(section, &count)| (0..count).map(move |item| IndexPath::new(section, item)))
    }

    /// Iterates the valid index paths between `a` and `b` (inclusive, in either order).
    pub fn index_paths_between(
        &self,
        a: IndexPath,
        b: IndexPath,
    ) -> impl Iterator<Item = IndexPath> + '_ {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.index_paths()
            .skip_while(move |p| *p < lo)
            .take_while(move |p| *p <= hi)
    }
}
