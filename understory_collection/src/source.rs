// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborator contracts: the data source that supplies counts and views, and
//! the delegate that observes and vetoes selection and scrolling.
//!
//! Optional methods are gated by capability flags read once when the
//! collaborator is installed, so the surface never probes for them on hot
//! paths.

use crate::reuse::Dequeue;
use crate::selection::SelectionChange;
use crate::view::{ReusableView, ViewSlot};
use crate::{ElementKey, IndexPath, ScrollPosition, SupplementaryKind};

bitflags::bitflags! {
    /// Optional [`DataSource`] methods the implementation provides.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DataSourceCapabilities: u8 {
        /// [`DataSource::section_count`] is implemented; otherwise one section is assumed.
        const SECTION_COUNT       = 0b0000_0001;
        /// [`DataSource::supplementary_view`] is implemented.
        const SUPPLEMENTARY_VIEWS = 0b0000_0010;
    }
}

bitflags::bitflags! {
    /// Optional [`CollectionDelegate`] predicates the implementation provides.
    ///
    /// Predicates that are not flagged are treated as returning `true`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DelegateCapabilities: u8 {
        /// [`CollectionDelegate::should_select`] is implemented.
        const SHOULD_SELECT   = 0b0000_0001;
        /// [`CollectionDelegate::should_deselect`] is implemented.
        const SHOULD_DESELECT = 0b0000_0010;
        /// [`CollectionDelegate::should_scroll_to`] is implemented.
        const SHOULD_SCROLL   = 0b0000_0100;
    }
}

/// Supplier of counts and populated views.
///
/// Queried synchronously; counts must describe the data as it is at the time
/// of the call.
pub trait DataSource {
    /// Host view type.
    type View: ReusableView;

    /// Optional methods this source implements.
    fn capabilities(&self) -> DataSourceCapabilities {
        DataSourceCapabilities::empty()
    }

    /// Number of sections. Only called with [`DataSourceCapabilities::SECTION_COUNT`].
    fn section_count(&self) -> usize {
        1
    }

    /// Number of items in `section`.
    fn item_count(&self, section: usize) -> usize;

    /// Returns a populated cell for `index_path`, normally obtained through
    /// [`Dequeue::dequeue_cell`].
    fn cell_for(&mut self, cx: &mut Dequeue<'_, Self::View>, index_path: IndexPath)
    -> ViewSlot<Self::View>;

    /// Returns a populated supplementary view, normally obtained through
    /// [`Dequeue::dequeue_supplementary`].
    ///
    /// Only called with [`DataSourceCapabilities::SUPPLEMENTARY_VIEWS`] and for
    /// kinds that have a registration.
    fn supplementary_view(
        &mut self,
        cx: &mut Dequeue<'_, Self::View>,
        kind: SupplementaryKind,
        section: usize,
    ) -> Option<ViewSlot<Self::View>> {
        let _ = (cx, kind, section);
        None
    }
}

/// Observer of selection, pointer input, display and scrolling.
///
/// Every method has a default; notifications are fire-and-forget.
pub trait CollectionDelegate<V> {
    /// Predicates this delegate implements.
    fn capabilities(&self) -> DelegateCapabilities {
        DelegateCapabilities::empty()
    }

    /// Whether `index_path` may become selected.
    fn should_select(&mut self, index_path: IndexPath) -> bool {
        let _ = index_path;
        true
    }

    /// Whether `index_path` may become deselected.
    fn should_deselect(&mut self, index_path: IndexPath) -> bool {
        let _ = index_path;
        true
    }

    /// Per-item notification, sent when multiple calls are enabled.
    fn did_select(&mut self, index_path: IndexPath) {
        let _ = index_path;
    }

    /// Per-item notification, sent when multiple calls are enabled.
    fn did_deselect(&mut self, index_path: IndexPath) {
        let _ = index_path;
    }

    /// Batched notification (ascending), sent when multiple calls are disabled.
    fn did_select_items(&mut self, index_paths: &[IndexPath]) {
        let _ = index_paths;
    }

    /// Batched notification (ascending), sent when multiple calls are disabled.
    fn did_deselect_items(&mut self, index_paths: &[IndexPath]) {
        let _ = index_paths;
    }

    /// Sent once after every effective selection change.
    ///
    /// `selected` is the whole selection afterwards, ascending; `change` is
    /// the diff that produced it.
    fn selected_items_changed(&mut self, selected: &[IndexPath], change: &SelectionChange) {
        let _ = (selected, change);
    }

    /// A mouse button went down over the item at `index_path`.
    fn mouse_down_in_item(&mut self, index_path: IndexPath) {
        let _ = index_path;
    }

    /// The button pressed over `index_path` was released, possibly elsewhere.
    fn mouse_up_in_item(&mut self, index_path: IndexPath) {
        let _ = index_path;
    }

    /// The item at `index_path` was double-clicked.
    fn did_double_click_item(&mut self, index_path: IndexPath) {
        let _ = index_path;
    }

    /// The item at `index_path` was right-clicked.
    fn did_right_click_item(&mut self, index_path: IndexPath) {
        let _ = index_path;
    }

    /// A displayed view is about to be pooled.
    fn did_end_displaying(&mut self, key: ElementKey, view: &V) {
        let _ = (key, view);
    }

    /// Whether the surface may scroll to show `index_path`.
    fn should_scroll_to(&mut self, index_path: IndexPath, position: ScrollPosition) -> bool {
        let _ = (index_path, position);
        true
    }

    /// The surface scrolled to show `index_path`.
    ///
    /// The viewport has already moved; `animated` tells the host whether the
    /// caller asked for the transition to be animated.
    fn did_scroll_to(&mut self, index_path: IndexPath, position: ScrollPosition, animated: bool) {
        let _ = (index_path, position, animated);
    }
}
