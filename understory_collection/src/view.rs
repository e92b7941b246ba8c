// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View slots: host view instances plus the bookkeeping the core needs to recycle them.

use kurbo::Rect;

use crate::{ElementKey, IndexPath, Registration, ReuseIdentifier, SurfaceId, ViewKind};

/// Hooks a host view type exposes to the core.
///
/// All methods have empty defaults so plain data types can act as views in
/// headless hosts and tests.
pub trait ReusableView {
    /// Clears transient state before the view is pooled.
    fn prepare_for_reuse(&mut self) {}

    /// Reflects selection state.
    fn set_selected(&mut self, selected: bool) {
        let _ = selected;
    }

    /// Positions the view in content coordinates.
    fn set_frame(&mut self, frame: Rect) {
        let _ = frame;
    }
}

/// Constructs new view instances for a registration.
pub trait ViewFactory<V> {
    /// Instantiates a view of `kind` described by `registration`.
    fn instantiate(&mut self, kind: ViewKind, registration: Registration) -> V;
}

impl<V, F> ViewFactory<V> for F
where
    F: FnMut(ViewKind, Registration) -> V,
{
    fn instantiate(&mut self, kind: ViewKind, registration: Registration) -> V {
        self(kind, registration)
    }
}

/// A view instance bound to at most one element at a time.
///
/// A slot is either displayed (bound, held by the surface's visible set) or
/// pooled (unbound, held by the reuse pool). Ownership moves between the two,
/// so a slot can never be in both places.
#[derive(Debug)]
pub struct ViewSlot<V> {
    view: V,
    kind: ViewKind,
    reuse_identifier: ReuseIdentifier,
    registration: Registration,
    owner: SurfaceId,
    pub(crate) key: Option<ElementKey>,
    pub(crate) frame: Rect,
    pub(crate) selected: bool,
}

impl<V: ReusableView> ViewSlot<V> {
    pub(crate) fn new(
        view: V,
        kind: ViewKind,
        reuse_identifier: ReuseIdentifier,
        registration: Registration,
        owner: SurfaceId,
    ) -> Self {
        Self {
            view,
            kind,
            reuse_identifier,
            registration,
            owner,
            key: None,
            frame: Rect::ZERO,
            selected: false,
        }
    }

    /// The host view.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// The host view, mutably; used by data sources to populate content.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Cell or supplementary kind this slot was created for.
    pub const fn kind(&self) -> ViewKind {
        self.kind
    }

    /// Reuse identifier this slot was dequeued under.
    pub const fn reuse_identifier(&self) -> ReuseIdentifier {
        self.reuse_identifier
    }

    /// Registration the view was instantiated from.
    pub const fn registration(&self) -> Registration {
        self.registration
    }

    /// Surface that created this slot.
    pub const fn owner(&self) -> SurfaceId {
        self.owner
    }

    /// Element currently bound to this slot, if displayed.
    pub const fn key(&self) -> Option<ElementKey> {
        self.key
    }

    /// Item currently bound to this slot, if it is a displayed cell.
    pub fn index_path(&self) -> Option<IndexPath> {
        self.key.and_then(|key| key.index_path())
    }

    /// Frame assigned at the last reconciliation.
    pub const fn frame(&self) -> Rect {
        self.frame
    }

    /// Whether the slot is shown as selected.
    pub const fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn bind(&mut self, key: ElementKey) {
        self.key = Some(key);
    }

    pub(crate) fn set_frame(&mut self, frame: Rect) {
        if self.frame != frame {
            self.frame = frame;
            self.view.set_frame(frame);
        }
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        if self.selected != selected {
            self.selected = selected;
            self.view.set_selected(selected);
        }
    }

    /// Unbinds the slot and clears transient state before pooling.
    pub(crate) fn reset(&mut self) {
        self.key = None;
        self.frame = Rect::ZERO;
        if self.selected {
            self.selected = false;
            self.view.set_selected(false);
        }
        self.view.prepare_for_reuse();
    }
}
