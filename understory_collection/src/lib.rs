// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_collection --heading-base-level=0

//! Understory Collection: the virtualization and update engine of a sectioned collection view.
//!
//! This crate provides a renderer-agnostic core for presenting a large,
//! sectioned data set (`sections × items`) through a small number of
//! recycled views. It does not draw anything and does not handle events;
//! host frameworks supply view instances and consume the resulting frames.
//!
//! The core concepts are:
//!
//! - [`IndexPath`] and [`ItemCounts`]: the `(section, item)` address space and
//!   a snapshot of how many items each section holds.
//! - [`LayoutPolicy`]: a pluggable strategy mapping counts to rectangles.
//!   [`ListLayout`] and [`GridLayout`] are provided.
//! - [`GeometryCache`]: the rectangles of the last layout pass, with O(1)
//!   lookups and binary-searched spatial queries.
//! - [`ReusePool`]: detached [`ViewSlot`]s bucketed by `(kind, reuse identifier)`,
//!   handed out LIFO through a [`Dequeue`] context.
//! - [`CollectionView`]: the surface. It reconciles the displayed views with
//!   the viewport, applies batch updates ([`PendingUpdate`]) through a validated
//!   [`IndexRemap`], and owns the [`SelectionController`].
//!
//! Collaborators plug in through traits: a [`DataSource`] supplies counts and
//! populated views, a [`CollectionDelegate`] observes and vetoes selection and
//! scrolling, and a [`DragDropHandler`] concludes drops.
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::Size;
//! use understory_collection::{
//!     CollectionView, DataSource, Dequeue, IndexPath, ListLayout, Registration, ReusableView,
//!     ReuseIdentifier, ViewKind, ViewSlot,
//! };
//!
//! #[derive(Default)]
//! struct Label {
//!     text: &'static str,
//! }
//!
//! impl ReusableView for Label {}
//!
//! struct Fruits(Vec<&'static str>);
//!
//! impl DataSource for Fruits {
//!     type View = Label;
//!
//!     fn item_count(&self, _section: usize) -> usize {
//!         self.0.len()
//!     }
//!
//!     fn cell_for(&mut self, cx: &mut Dequeue<'_, Label>, ip: IndexPath) -> ViewSlot<Label> {
//!         let mut cell = cx.dequeue_cell(ReuseIdentifier("fruit"));
//!         cell.view_mut().text = self.0[ip.item];
//!         cell
//!     }
//! }
//!
//! let fruits = Fruits(vec!["apple", "banana", "cherry", "date"]);
//! let mut view = CollectionView::new(fruits, |_: ViewKind, _: Registration| Label::default());
//! view.set_viewport_size(Size::new(200.0, 40.0)).unwrap();
//! view.set_layout(ListLayout::new(20.0)).unwrap();
//! assert_eq!(
//!     view.index_paths_for_visible_items(),
//!     [IndexPath::new(0, 0), IndexPath::new(0, 1)]
//! );
//!
//! // Mutate the data, then describe the mutation.
//! view.data_source_mut().0.remove(0);
//! view.delete_items(&[IndexPath::new(0, 0)]).unwrap();
//! let first = view.cell_for_item(IndexPath::new(0, 0)).unwrap();
//! assert_eq!(first.view().text, "banana");
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod drag;
mod error;
mod geometry;
mod index_path;
mod layout;
mod reconcile;
mod registry;
mod reuse;
mod scroll;
mod selection;
mod source;
mod surface;
mod types;
mod update;
mod view;

pub use drag::{DROP_MARKER_THICKNESS, DragDropHandler, DropRelation, DropTarget};
pub use error::{CollectionError, ConfigurationFault, ConsistencyFault, ValidationFault};
pub use geometry::GeometryCache;
pub use index_path::{IndexPath, ItemCounts};
pub use layout::{Direction, GridLayout, LayoutContext, LayoutPolicy, ListLayout, RowHeightFn};
pub use reconcile::ReconcileReport;
pub use registry::Registry;
pub use reuse::{DEFAULT_MAX_PER_BUCKET, Dequeue, ReusePolicy, ReusePool};
pub use scroll::{ScrollPosition, Viewport};
pub use selection::{ClickModifiers, SelectionChange, SelectionController, SelectionOptions};
pub use source::{CollectionDelegate, DataSource, DataSourceCapabilities, DelegateCapabilities};
pub use surface::CollectionView;
pub use types::{
    Axis, ElementKey, Registration, ReuseIdentifier, SupplementaryKind, SurfaceId, TemplateId,
    ViewClass, ViewKind,
};
pub use update::{Completion, IndexRemap, PendingUpdate};
pub use view::{ReusableView, ViewFactory, ViewSlot};
