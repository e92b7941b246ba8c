// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pool of detached view slots, bucketed by `(kind, reuse identifier)`.

use alloc::collections::VecDeque;

use hashbrown::HashMap;

use crate::view::{ReusableView, ViewFactory, ViewSlot};
use crate::{Registration, Registry, ReuseIdentifier, SupplementaryKind, SurfaceId, ViewKind};

/// Default number of pooled slots kept per bucket.
pub const DEFAULT_MAX_PER_BUCKET: usize = 16;

/// Pool-pressure policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReusePolicy {
    /// Maximum number of slots kept in each `(kind, identifier)` bucket.
    /// When exceeded, the oldest pooled slot is destroyed.
    pub max_per_bucket: usize,
}

impl Default for ReusePolicy {
    fn default() -> Self {
        Self {
            max_per_bucket: DEFAULT_MAX_PER_BUCKET,
        }
    }
}

/// Detached view slots awaiting reuse.
///
/// Buckets are LIFO: the most recently enqueued slot is handed out first,
/// since it is the most likely to already have the right size and content
/// structure.
#[derive(Debug)]
pub struct ReusePool<V> {
    buckets: HashMap<(ViewKind, ReuseIdentifier), VecDeque<ViewSlot<V>>>,
    policy: ReusePolicy,
}

impl<V> Default for ReusePool<V> {
    fn default() -> Self {
        Self::with_policy(ReusePolicy::default())
    }
}

impl<V> ReusePool<V> {
    /// Creates an empty pool with the given policy.
    #[must_use]
    pub fn with_policy(policy: ReusePolicy) -> Self {
        Self {
            buckets: HashMap::new(),
            policy,
        }
    }

    /// Current policy.
    #[must_use]
    pub const fn policy(&self) -> ReusePolicy {
        self.policy
    }

    /// Replaces the policy, trimming buckets that exceed the new cap.
    pub fn set_policy(&mut self, policy: ReusePolicy) {
        self.policy = policy;
        for bucket in self.buckets.values_mut() {
            while bucket.len() > policy.max_per_bucket {
                bucket.pop_front();
            }
        }
    }

    /// Number of pooled slots for `(kind, identifier)`.
    #[must_use]
    pub fn pooled(&self, kind: ViewKind, identifier: ReuseIdentifier) -> usize {
        self.buckets
            .get(&(kind, identifier))
            .map_or(0, VecDeque::len)
    }

    /// Total number of pooled slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.values().map(VecDeque::len).sum()
    }

    /// Returns `true` if no slot is pooled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Destroys every pooled slot.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

impl<V: ReusableView> ReusePool<V> {
    /// Pops the most recently pooled slot for `(kind, identifier)`.
    ///
    /// Slots whose registration differs from `registration` (the class
    /// currently registered for the pair) are discarded; `None` means the
    /// caller must construct a fresh instance.
    pub fn dequeue(
        &mut self,
        kind: ViewKind,
        identifier: ReuseIdentifier,
        registration: Registration,
    ) -> Option<ViewSlot<V>> {
        let bucket = self.buckets.get_mut(&(kind, identifier))?;
        while let Some(slot) = bucket.pop_back() {
            if slot.registration() == registration {
                log::trace!("reusing pooled {kind:?}/{identifier}");
                return Some(slot);
            }
            log::trace!(
                "discarding pooled {kind:?}/{identifier}: {:?} is no longer registered",
                slot.registration()
            );
        }
        None
    }

    /// Detaches `slot` and pools it under its own `(kind, identifier)`.
    pub fn enqueue(&mut self, mut slot: ViewSlot<V>) {
        slot.reset();
        if self.policy.max_per_bucket == 0 {
            return;
        }
        let bucket = self
            .buckets
            .entry((slot.kind(), slot.reuse_identifier()))
            .or_default();
        if bucket.len() >= self.policy.max_per_bucket {
            bucket.pop_front();
        }
        bucket.push_back(slot);
    }
}

/// Dequeue-or-create access handed to data sources while they populate views.
pub struct Dequeue<'a, V> {
    pub(crate) surface: SurfaceId,
    pub(crate) pool: &'a mut ReusePool<V>,
    pub(crate) registry: &'a Registry,
    pub(crate) factory: &'a mut dyn ViewFactory<V>,
}

impl<V> core::fmt::Debug for Dequeue<'_, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dequeue")
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}

impl<V: ReusableView> Dequeue<'_, V> {
    /// Reuses or creates a cell for `identifier`.
    ///
    /// Identifiers without a registration produce base-class cells.
    pub fn dequeue_cell(&mut self, identifier: ReuseIdentifier) -> ViewSlot<V> {
        let registration = self.registry.cell_registration(identifier);
        self.dequeue_or_create(ViewKind::Cell, identifier, registration)
    }

    /// Reuses or creates a supplementary view.
    ///
    /// Returns `None` when nothing is registered for `(kind, identifier)`.
    pub fn dequeue_supplementary(
        &mut self,
        kind: SupplementaryKind,
        identifier: ReuseIdentifier,
    ) -> Option<ViewSlot<V>> {
        let kind = ViewKind::Supplementary(kind);
        let registration = self.registry.registration(kind, identifier)?;
        Some(self.dequeue_or_create(kind, identifier, registration))
    }

    fn dequeue_or_create(
        &mut self,
        kind: ViewKind,
        identifier: ReuseIdentifier,
        registration: Registration,
    ) -> ViewSlot<V> {
        self.pool
            .dequeue(kind, identifier, registration)
            .unwrap_or_else(|| {
                log::trace!("instantiating {kind:?}/{identifier} from {registration:?}");
                let view = self.factory.instantiate(kind, registration);
                ViewSlot::new(view, kind, identifier, registration, self.surface)
            })
    }
}
