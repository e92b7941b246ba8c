// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selection state machine.
//!
//! [`SelectionController`] owns the set of selected index paths and enforces
//! the single/multiple/empty policy from [`SelectionOptions`]. Every operation
//! returns a [`SelectionChange`]: the diff between the selection before and
//! after. Hosts derive notifications from that diff, either one per index
//! path or one per batch.
//!
//! Predicates (should-select, should-deselect) are passed per call so the
//! controller stays independent of any delegate object.

use alloc::vec::Vec;

use hashbrown::HashSet;

use crate::{IndexPath, ItemCounts};

bitflags::bitflags! {
    /// Selection policy switches.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct SelectionOptions: u8 {
        /// Items can be selected at all.
        const ALLOWS_SELECTION     = 0b0000_0001;
        /// More than one item may be selected.
        const ALLOWS_MULTIPLE      = 0b0000_0010;
        /// The selection may become empty while items exist.
        const ALLOWS_EMPTY         = 0b0000_0100;
        /// `select_all` is honored (requires `ALLOWS_MULTIPLE`).
        const ALLOWS_SELECT_ALL    = 0b0000_1000;
        /// Report changes per index path instead of once per batch.
        const SENDS_MULTIPLE_CALLS = 0b0001_0000;
    }
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self::all()
    }
}

bitflags::bitflags! {
    /// Modifier keys held during a click, as far as they affect selection.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ClickModifiers: u8 {
        /// Toggle the clicked item (Command on macOS, Ctrl elsewhere).
        const TOGGLE = 0b0000_0001;
        /// Extend from the anchor to the clicked item (Shift).
        const EXTEND = 0b0000_0010;
    }
}

/// Diff produced by a selection operation. Both lists are ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionChange {
    /// Paths that became selected.
    pub selected: Vec<IndexPath>,
    /// Paths that stopped being selected.
    pub deselected: Vec<IndexPath>,
}

impl SelectionChange {
    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.deselected.is_empty()
    }
}

/// Owner of the selected index paths.
#[derive(Clone, Debug, Default)]
pub struct SelectionController {
    options: SelectionOptions,
    /// Selected paths in the order they were selected.
    order: Vec<IndexPath>,
    members: HashSet<IndexPath>,
    last_acted: Option<IndexPath>,
    /// Paths added by the current run of range extensions.
    extension: Vec<IndexPath>,
    extent: Option<IndexPath>,
}

impl SelectionController {
    /// Creates an empty selection with `options`.
    #[must_use]
    pub fn new(options: SelectionOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Current policy.
    #[must_use]
    pub const fn options(&self) -> SelectionOptions {
        self.options
    }

    /// Replaces the policy and re-applies it to the current selection.
    pub fn set_options(&mut self, options: SelectionOptions, counts: &ItemCounts) -> SelectionChange {
        self.options = options;
        self.enforce(counts)
    }

    /// Selected paths in selection order.
    #[must_use]
    pub fn selected(&self) -> &[IndexPath] {
        &self.order
    }

    /// Selected paths, ascending.
    #[must_use]
    pub fn selected_sorted(&self) -> Vec<IndexPath> {
        let mut paths = self.order.clone();
        paths.sort_unstable();
        paths
    }

    /// Number of selected paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns `true` if `index_path` is selected.
    #[must_use]
    pub fn is_selected(&self, index_path: IndexPath) -> bool {
        self.members.contains(&index_path)
    }

    /// Most recently selected path.
    #[must_use]
    pub fn last_selected(&self) -> Option<IndexPath> {
        self.order.last().copied()
    }

    /// Path most recently acted upon; the anchor for range extension.
    #[must_use]
    pub const fn last_acted(&self) -> Option<IndexPath> {
        self.last_acted
    }

    /// Moving end of the current range extension, if one is in progress.
    #[must_use]
    pub const fn extent(&self) -> Option<IndexPath> {
        self.extent
    }

    /// Selects `index_path`.
    ///
    /// Without `extend` (or when multiple selection is off) every other path
    /// is deselected first. Declined or out-of-range requests change nothing.
    pub fn select(
        &mut self,
        index_path: IndexPath,
        extend: bool,
        counts: &ItemCounts,
        should_select: &mut dyn FnMut(IndexPath) -> bool,
    ) -> SelectionChange {
        if !self.options.contains(SelectionOptions::ALLOWS_SELECTION)
            || !counts.contains(index_path)
            || !should_select(index_path)
        {
            return SelectionChange::default();
        }
        self.last_acted = Some(index_path);

        if extend && self.options.contains(SelectionOptions::ALLOWS_MULTIPLE) {
            let mut paths = self.order.clone();
            paths.retain(|p| *p != index_path);
            paths.push(index_path);
            self.replace(paths)
        } else {
            self.replace(alloc::vec![index_path])
        }
    }

    /// Adds every accepted path in `paths` to the selection.
    ///
    /// With multiple selection off, only the last accepted path remains.
    pub fn select_many(
        &mut self,
        paths: &[IndexPath],
        counts: &ItemCounts,
        should_select: &mut dyn FnMut(IndexPath) -> bool,
    ) -> SelectionChange {
        if !self.options.contains(SelectionOptions::ALLOWS_SELECTION) {
            return SelectionChange::default();
        }
        let accepted: Vec<_> = paths
            .iter()
            .copied()
            .filter(|&p| counts.contains(p) && should_select(p))
            .collect();
        let Some(&last) = accepted.last() else {
            return SelectionChange::default();
        };
        self.last_acted = Some(last);
        if !self.options.contains(SelectionOptions::ALLOWS_MULTIPLE) {
            return self.replace(alloc::vec![last]);
        }
        let mut next = self.order.clone();
        for p in accepted {
            next.retain(|q| *q != p);
            next.push(p);
        }
        self.replace(next)
    }

    /// Selects the range between the anchor ([`Self::last_acted`]) and `target`.
    ///
    /// Repeated extensions from the same anchor replace the range added by
    /// the previous one, so moving back toward the anchor deselects the
    /// overshoot. Paths selected before the first extension are kept.
    pub fn extend_to(
        &mut self,
        target: IndexPath,
        counts: &ItemCounts,
        should_select: &mut dyn FnMut(IndexPath) -> bool,
    ) -> SelectionChange {
        if !self.options.contains(SelectionOptions::ALLOWS_MULTIPLE) {
            return self.select(target, false, counts, should_select);
        }
        if !self.options.contains(SelectionOptions::ALLOWS_SELECTION) || !counts.contains(target) {
            return SelectionChange::default();
        }
        let anchor = self
            .last_acted
            .filter(|p| counts.contains(*p))
            .unwrap_or(target);
        let previous: HashSet<IndexPath> = self.extension.iter().copied().collect();
        let mut next: Vec<_> = self
            .order
            .iter()
            .copied()
            .filter(|p| !previous.contains(p))
            .collect();
        let base: HashSet<IndexPath> = next.iter().copied().collect();
        let mut range: Vec<_> = counts.index_paths_between(anchor, target).collect();
        if target < anchor {
            range.reverse();
        }
        let mut extension = Vec::new();
        for p in range {
            if !base.contains(&p) && should_select(p) {
                next.push(p);
                extension.push(p);
            }
        }
        let change = self.replace(next);
        self.last_acted = Some(anchor);
        self.extension = extension;
        self.extent = Some(target);
        change
    }

    /// Deselects `index_path`.
    ///
    /// Rejected when declined by the predicate, or when it would leave the
    /// selection empty while empty selection is disallowed and items exist.
    pub fn deselect(
        &mut self,
        index_path: IndexPath,
        counts: &ItemCounts,
        should_deselect: &mut dyn FnMut(IndexPath) -> bool,
    ) -> SelectionChange {
        if !self.members.contains(&index_path) || !should_deselect(index_path) {
            return SelectionChange::default();
        }
        if self.order.len() == 1 && !self.empty_allowed(counts) {
            log::debug!("keeping {index_path} selected: empty selection is not allowed");
            return SelectionChange::default();
        }
        self.last_acted = Some(index_path);
        let mut next = self.order.clone();
        next.retain(|p| *p != index_path);
        self.replace(next)
    }

    /// Selects every item. No-op unless multiple selection and select-all are allowed.
    pub fn select_all(
        &mut self,
        counts: &ItemCounts,
        should_select: &mut dyn FnMut(IndexPath) -> bool,
    ) -> SelectionChange {
        let required = SelectionOptions::ALLOWS_SELECTION
            | SelectionOptions::ALLOWS_MULTIPLE
            | SelectionOptions::ALLOWS_SELECT_ALL;
        if !self.options.contains(required) {
            return SelectionChange::default();
        }
        let mut next = self.order.clone();
        for p in counts.index_paths() {
            if !self.members.contains(&p) && should_select(p) {
                next.push(p);
            }
        }
        self.replace(next)
    }

    /// Deselects every item the predicate allows.
    ///
    /// When empty selection is disallowed, the first item ends up selected.
    pub fn deselect_all(
        &mut self,
        counts: &ItemCounts,
        should_deselect: &mut dyn FnMut(IndexPath) -> bool,
    ) -> SelectionChange {
        let mut next: Vec<_> = self
            .order
            .iter()
            .copied()
            .filter(|&p| !should_deselect(p))
            .collect();
        if next.is_empty() && !self.empty_allowed(counts) {
            next.extend(counts.first_index_path());
        }
        self.replace(next)
    }

    /// Re-applies the policy against `counts`: drops paths that no longer
    /// exist, trims to the most recent path when multiple selection is off,
    /// and auto-selects the first item when the selection may not be empty.
    pub fn enforce(&mut self, counts: &ItemCounts) -> SelectionChange {
        let mut next: Vec<_> = self
            .order
            .iter()
            .copied()
            .filter(|p| counts.contains(*p))
            .collect();
        if !self.options.contains(SelectionOptions::ALLOWS_MULTIPLE) && next.len() > 1 {
            next.drain(..next.len() - 1);
        }
        if next.is_empty() && !self.empty_allowed(counts) {
            next.extend(counts.first_index_path());
        }
        if self.last_acted.is_some_and(|p| !counts.contains(p)) {
            self.last_acted = None;
        }
        self.replace(next)
    }

    /// Rewrites every selected path through `map`; paths mapping to `None`
    /// are dropped silently.
    ///
    /// Call [`Self::enforce`] afterwards to re-apply the policy.
    pub fn remap(&mut self, mut map: impl FnMut(IndexPath) -> Option<IndexPath>) {
        let order: Vec<_> = self.order.iter().copied().filter_map(&mut map).collect();
        self.members = order.iter().copied().collect();
        self.order = order;
        self.last_acted = self.last_acted.and_then(map);
        self.extension.clear();
        self.extent = None;
    }

    fn empty_allowed(&self, counts: &ItemCounts) -> bool {
        self.options.contains(SelectionOptions::ALLOWS_EMPTY) || counts.has_no_items()
    }

    fn replace(&mut self, next: Vec<IndexPath>) -> SelectionChange {
        self.extension.clear();
        self.extent = None;
        let next_members: HashSet<IndexPath> = next.iter().copied().collect();
        let mut selected: Vec<_> = next
            .iter()
            .copied()
            .filter(|p| !self.members.contains(p))
            .collect();
        let mut deselected: Vec<_> = self
            .order
            .iter()
            .copied()
            .filter(|p| !next_members.contains(p))
            .collect();
        selected.sort_unstable();
        deselected.sort_unstable();
        self.order = next;
        self.members = next_members;
        SelectionChange {
            selected,
            deselected,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::{SelectionChange, SelectionController, SelectionOptions};
    use crate::{IndexPath, ItemCounts};

    fn ip(section: usize, item: usize) -> IndexPath {
        IndexPath::new(section, item)
    }

    fn yes(_: IndexPath) -> bool {
        true
    }

    #[test]
    fn exclusive_select_replaces_previous() {
        let counts = ItemCounts::new(vec![3]);
        let mut sel = SelectionController::new(SelectionOptions::default());
        sel.select(ip(0, 0), false, &counts, &mut yes);
        let change = sel.select(ip(0, 2), false, &counts, &mut yes);
        assert_eq!(
            change,
            SelectionChange {
                selected: vec![ip(0, 2)],
                deselected: vec![ip(0, 0)],
            }
        );
        assert_eq!(sel.selected(), &[ip(0, 2)]);
    }

    #[test]
    fn reselecting_singleton_reports_nothing() {
        let counts = ItemCounts::new(vec![3]);
        let mut sel = SelectionController::new(SelectionOptions::default());
        sel.select(ip(0, 1), false, &counts, &mut yes);
        assert!(sel.select(ip(0, 1), false, &counts, &mut yes).is_empty());
    }

    #[test]
    fn declined_select_changes_nothing() {
        let counts = ItemCounts::new(vec![3]);
        let mut sel = SelectionController::new(SelectionOptions::default());
        sel.select(ip(0, 0), false, &counts, &mut yes);
        let change = sel.select(ip(0, 1), true, &counts, &mut |_| false);
        assert!(change.is_empty());
        assert_eq!(sel.selected(), &[ip(0, 0)]);
    }

    #[test]
    fn single_selection_never_exceeds_one() {
        let counts = ItemCounts::new(vec![4]);
        let options = SelectionOptions::default() - SelectionOptions::ALLOWS_MULTIPLE;
        let mut sel = SelectionController::new(options);
        sel.select(ip(0, 0), true, &counts, &mut yes);
        sel.select(ip(0, 1), true, &counts, &mut yes);
        assert_eq!(sel.len(), 1);
        sel.select_many(&[ip(0, 2), ip(0, 3)], &counts, &mut yes);
        assert_eq!(sel.selected(), &[ip(0, 3)]);
        assert!(sel.select_all(&counts, &mut yes).is_empty());
        sel.extend_to(ip(0, 0), &counts, &mut yes);
        assert_eq!(sel.selected(), &[ip(0, 0)]);
    }

    #[test]
    fn empty_selection_disallowed_keeps_one_selected() {
        let counts = ItemCounts::new(vec![3]);
        let options = SelectionOptions::default() - SelectionOptions::ALLOWS_EMPTY;
        let mut sel = SelectionController::new(options);

        // Enforcement auto-selects the first item.
        let change = sel.enforce(&counts);
        assert_eq!(change.selected, vec![ip(0, 0)]);

        // The last selected item cannot be deselected.
        assert!(sel.deselect(ip(0, 0), &counts, &mut yes).is_empty());
        assert!(sel.is_selected(ip(0, 0)));

        sel.select(ip(0, 2), false, &counts, &mut yes);
        let change = sel.deselect_all(&counts, &mut yes);
        assert_eq!(change.selected, vec![ip(0, 0)]);
        assert_eq!(change.deselected, vec![ip(0, 2)]);
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn empty_data_allows_empty_selection() {
        let counts = ItemCounts::new(vec![0]);
        let options = SelectionOptions::default() - SelectionOptions::ALLOWS_EMPTY;
        let mut sel = SelectionController::new(options);
        assert!(sel.enforce(&counts).is_empty());
        assert!(sel.is_empty());
    }

    #[test]
    fn select_all_honors_flags_and_predicate() {
        let counts = ItemCounts::new(vec![2, 2]);
        let mut sel = SelectionController::new(SelectionOptions::default());
        let change = sel.select_all(&counts, &mut |p| p.item == 0);
        assert_eq!(change.selected, vec![ip(0, 0), ip(1, 0)]);

        let options = SelectionOptions::default() - SelectionOptions::ALLOWS_SELECT_ALL;
        let mut sel = SelectionController::new(options);
        assert!(sel.select_all(&counts, &mut yes).is_empty());
    }

    #[test]
    fn range_extension_uses_anchor() {
        let counts = ItemCounts::new(vec![2, 3]);
        let mut sel = SelectionController::new(SelectionOptions::default());
        sel.select(ip(0, 1), false, &counts, &mut yes);
        let change = sel.extend_to(ip(1, 1), &counts, &mut yes);
        assert_eq!(change.selected, vec![ip(1, 0), ip(1, 1)]);
        assert_eq!(sel.last_acted(), Some(ip(0, 1)));
        assert_eq!(sel.last_selected(), Some(ip(1, 1)));
    }

    #[test]
    fn shrinking_a_range_deselects_the_overshoot() {
        let counts = ItemCounts::new(vec![6]);
        let mut sel = SelectionController::new(SelectionOptions::default());
        sel.select(ip(0, 0), false, &counts, &mut yes);
        sel.select(ip(0, 2), true, &counts, &mut yes);
        sel.extend_to(ip(0, 4), &counts, &mut yes);
        assert_eq!(sel.selected_sorted(), vec![ip(0, 0), ip(0, 2), ip(0, 3), ip(0, 4)]);
        assert_eq!(sel.extent(), Some(ip(0, 4)));

        let change = sel.extend_to(ip(0, 3), &counts, &mut yes);
        assert_eq!(change.deselected, vec![ip(0, 4)]);
        assert!(change.selected.is_empty());

        // Crossing the anchor flips the range; earlier picks survive.
        let change = sel.extend_to(ip(0, 1), &counts, &mut yes);
        assert_eq!(change.selected, vec![ip(0, 1)]);
        assert_eq!(change.deselected, vec![ip(0, 3)]);
        assert_eq!(sel.selected_sorted(), vec![ip(0, 0), ip(0, 1), ip(0, 2)]);
        assert_eq!(sel.last_selected(), Some(ip(0, 1)));
        assert_eq!(sel.last_acted(), Some(ip(0, 2)));

        // Any other operation ends the run.
        sel.select(ip(0, 5), true, &counts, &mut yes);
        assert_eq!(sel.extent(), None);
    }

    #[test]
    fn remap_moves_surviving_paths() {
        let counts = ItemCounts::new(vec![2]);
        let mut sel = SelectionController::new(SelectionOptions::default());
        sel.select_many(&[ip(0, 0), ip(0, 2)], &ItemCounts::new(vec![3]), &mut yes);
        sel.remap(|p| match p.item {
            0 => None,
            n => Some(ip(0, n - 1)),
        });
        assert_eq!(sel.selected(), &[ip(0, 1)]);
        assert!(sel.enforce(&counts).is_empty());
    }

    #[test]
    fn disabling_selection_blocks_select() {
        let counts = ItemCounts::new(vec![2]);
        let options = SelectionOptions::default() - SelectionOptions::ALLOWS_SELECTION;
        let mut sel = SelectionController::new(options);
        assert!(sel.select(ip(0, 0), false, &counts, &mut yes).is_empty());
        assert!(sel.is_empty());
    }
}
