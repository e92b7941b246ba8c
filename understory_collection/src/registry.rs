// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registration table mapping `(kind, identifier)` to a class or template.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::{Registration, ReuseIdentifier, SupplementaryKind, ViewKind};

/// Per-surface registration table.
///
/// Each `(kind, identifier)` pair maps to exactly one [`Registration`];
/// registering a class replaces a template and vice versa.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    entries: HashMap<(ViewKind, ReuseIdentifier), Registration>,
}

impl Registry {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `registration` for `(kind, identifier)`, returning the one it replaced.
    pub fn register(
        &mut self,
        kind: ViewKind,
        identifier: ReuseIdentifier,
        registration: Registration,
    ) -> Option<Registration> {
        let previous = self.entries.insert((kind, identifier), registration);
        if previous.is_some_and(|p| p != registration) {
            log::debug!("re-registered {kind:?}/{identifier}: {previous:?} -> {registration:?}");
        }
        previous
    }

    /// Removes the registration for `(kind, identifier)`.
    pub fn unregister(&mut self, kind: ViewKind, identifier: ReuseIdentifier) -> Option<Registration> {
        self.entries.remove(&(kind, identifier))
    }

    /// Registration for `(kind, identifier)`, if any.
    #[must_use]
    pub fn registration(&self, kind: ViewKind, identifier: ReuseIdentifier) -> Option<Registration> {
        self.entries.get(&(kind, identifier)).copied()
    }

    /// Registration for a cell identifier, falling back to the base cell class.
    #[must_use]
    pub fn cell_registration(&self, identifier: ReuseIdentifier) -> Registration {
        self.registration(ViewKind::Cell, identifier)
            .unwrap_or(Registration::BASE_CELL)
    }

    /// Supplementary kinds with at least one registration, sorted.
    #[must_use]
    pub fn supplementary_kinds(&self) -> Vec<SupplementaryKind> {
        let mut kinds: Vec<_> = self
            .entries
            .keys()
            .filter_map(|(kind, _)| match kind {
                ViewKind::Supplementary(kind) => Some(*kind),
                ViewKind::Cell => None,
            })
            .collect();
        kinds.sort_unstable();
        kinds.dedup();
        kinds
    }
}
