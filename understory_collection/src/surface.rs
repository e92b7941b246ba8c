// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The presentation surface tying geometry, reuse, updates and selection together.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Rect, Size};

use crate::drag::{DragDropHandler, DropTarget, drop_marker_rect, resolve_drop_target};
use crate::layout::{Direction, LayoutContext, LayoutPolicy};
use crate::reconcile::{ReconcileReport, VisibleSet};
use crate::reuse::{Dequeue, ReusePolicy, ReusePool};
use crate::scroll::{ScrollPosition, Viewport};
use crate::selection::{ClickModifiers, SelectionChange, SelectionController, SelectionOptions};
use crate::source::{
    CollectionDelegate, DataSource, DataSourceCapabilities, DelegateCapabilities,
};
use crate::update::{IndexRemap, PendingUpdate, UpdateScope};
use crate::view::{ViewFactory, ViewSlot};
use crate::{
    CollectionError, ConfigurationFault, ElementKey, GeometryCache, IndexPath, ItemCounts,
    Registration, Registry, ReuseIdentifier, SupplementaryKind, SurfaceId, TemplateId, ViewClass,
    ViewKind,
};

type Delegate<V> = Option<Box<dyn CollectionDelegate<V>>>;

/// A virtualized, sectioned collection of views.
///
/// Owns its data source, layout, registration table, reuse pool, geometry
/// cache and selection. Only views intersecting the viewport (plus overscan)
/// are materialized; everything else lives in the pool or not at all.
///
/// All work happens synchronously inside the triggering call. Fallible
/// operations check everything before mutating, so an `Err` leaves the
/// surface as it was.
pub struct CollectionView<D: DataSource> {
    id: SurfaceId,
    data_source: D,
    source_caps: DataSourceCapabilities,
    factory: Box<dyn ViewFactory<D::View>>,
    delegate: Delegate<D::View>,
    delegate_caps: DelegateCapabilities,
    layout: Option<Box<dyn LayoutPolicy>>,
    registry: Registry,
    pool: ReusePool<D::View>,
    geometry: GeometryCache,
    counts: ItemCounts,
    supplementary_kinds: Vec<SupplementaryKind>,
    viewport: Viewport,
    visible: VisibleSet<D::View>,
    selection: SelectionController,
    updates: UpdateScope,
    pressed: Option<IndexPath>,
}

impl<D: DataSource> fmt::Debug for CollectionView<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionView")
            .field("id", &self.id)
            .field("source_caps", &self.source_caps)
            .field("delegate_caps", &self.delegate_caps)
            .field("has_layout", &self.layout.is_some())
            .field("registry", &self.registry)
            .field("geometry", &self.geometry)
            .field("counts", &self.counts)
            .field("viewport", &self.viewport)
            .field("displayed", &self.visible.len())
            .field("pooled", &self.pool.len())
            .field("selection", &self.selection)
            .field("updates", &self.updates)
            .field("pressed", &self.pressed)
            .finish_non_exhaustive()
    }
}

fn layout_not_set() -> CollectionError {
    log::error!("collection view used before a layout was set");
    ConfigurationFault::LayoutNotSet.into()
}

fn should_select<V>(delegate: &mut Delegate<V>, caps: DelegateCapabilities, ip: IndexPath) -> bool {
    match delegate {
        Some(d) if caps.contains(DelegateCapabilities::SHOULD_SELECT) => d.should_select(ip),
        _ => true,
    }
}

fn should_deselect<V>(
    delegate: &mut Delegate<V>,
    caps: DelegateCapabilities,
    ip: IndexPath,
) -> bool {
    match delegate {
        Some(d) if caps.contains(DelegateCapabilities::SHOULD_DESELECT) => d.should_deselect(ip),
        _ => true,
    }
}

impl<D: DataSource> CollectionView<D> {
    /// Creates a surface over `data_source`; `factory` constructs views when
    /// the pool has none to reuse.
    ///
    /// Nothing is displayed until a layout is set.
    pub fn new(data_source: D, factory: impl ViewFactory<D::View> + 'static) -> Self {
        let source_caps = data_source.capabilities();
        Self {
            id: SurfaceId::next(),
            data_source,
            source_caps,
            factory: Box::new(factory),
            delegate: None,
            delegate_caps: DelegateCapabilities::empty(),
            layout: None,
            registry: Registry::new(),
            pool: ReusePool::default(),
            geometry: GeometryCache::new(),
            counts: ItemCounts::default(),
            supplementary_kinds: Vec::new(),
            viewport: Viewport::default(),
            visible: VisibleSet::default(),
            selection: SelectionController::default(),
            updates: UpdateScope::default(),
            pressed: None,
        }
    }

    /// Identity of this surface; every slot it creates carries it.
    #[must_use]
    pub const fn id(&self) -> SurfaceId {
        self.id
    }

    /// The data source.
    pub fn data_source(&self) -> &D {
        &self.data_source
    }

    /// The data source, mutably.
    ///
    /// Mutations must be followed by [`Self::reload_data`] or a matching
    /// batch update.
    pub fn data_source_mut(&mut self) -> &mut D {
        &mut self.data_source
    }

    /// Installs the delegate, reading its capabilities once.
    pub fn set_delegate(&mut self, delegate: impl CollectionDelegate<D::View> + 'static) {
        self.delegate_caps = delegate.capabilities();
        self.delegate = Some(Box::new(delegate));
    }

    /// Installs `layout` and performs a full reload.
    pub fn set_layout(
        &mut self,
        layout: impl LayoutPolicy + 'static,
    ) -> Result<ReconcileReport, CollectionError> {
        self.layout = Some(Box::new(layout));
        self.reload_data()
    }

    /// Returns `true` once a layout has been set.
    #[must_use]
    pub fn has_layout(&self) -> bool {
        self.layout.is_some()
    }

    /// Registers `class` for `(kind, identifier)`, replacing any template.
    ///
    /// Supplementary registrations take effect at the next reload or
    /// [`Self::invalidate_layout`].
    pub fn register_class(
        &mut self,
        kind: ViewKind,
        identifier: ReuseIdentifier,
        class: ViewClass,
    ) -> Option<Registration> {
        self.registry
            .register(kind, identifier, Registration::Class(class))
    }

    /// Registers `template` for `(kind, identifier)`, replacing any class.
    pub fn register_template(
        &mut self,
        kind: ViewKind,
        identifier: ReuseIdentifier,
        template: TemplateId,
    ) -> Option<Registration> {
        self.registry
            .register(kind, identifier, Registration::Template(template))
    }

    /// Removes the registration for `(kind, identifier)`.
    pub fn unregister(
        &mut self,
        kind: ViewKind,
        identifier: ReuseIdentifier,
    ) -> Option<Registration> {
        self.registry.unregister(kind, identifier)
    }

    /// The registration table.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Replaces the pool-pressure policy.
    pub fn set_reuse_policy(&mut self, policy: ReusePolicy) {
        self.pool.set_policy(policy);
    }

    /// The reuse pool.
    #[must_use]
    pub fn reuse_pool(&self) -> &ReusePool<D::View> {
        &self.pool
    }

    /// Current selection policy.
    #[must_use]
    pub fn selection_options(&self) -> SelectionOptions {
        self.selection.options()
    }

    /// Replaces the selection policy and re-applies it to the current selection.
    pub fn set_selection_options(&mut self, options: SelectionOptions) -> SelectionChange {
        let change = self.selection.set_options(options, &self.counts);
        self.notify_selection(&change);
        change
    }

    /// Sets the margin added around the viewport when reconciling.
    pub fn set_overscan(&mut self, overscan: f64) -> Result<ReconcileReport, CollectionError> {
        self.viewport.set_overscan(overscan);
        self.reconcile()
    }

    /// Resizes the viewport. A size change recomputes geometry, since flow
    /// layouts depend on the width.
    pub fn set_viewport_size(&mut self, size: Size) -> Result<ReconcileReport, CollectionError> {
        if !self.viewport.set_size(size) || self.layout.is_none() {
            return Ok(ReconcileReport::default());
        }
        self.rebuild_geometry()?;
        self.reconcile()
    }

    /// Moves the viewport origin, clamped to the content.
    pub fn scroll_to_point(&mut self, origin: Point) -> Result<ReconcileReport, CollectionError> {
        self.viewport.scroll_to(origin, self.geometry.content_size());
        self.reconcile()
    }

    /// Discards every displayed view, re-reads the counts, recomputes
    /// geometry and reconciles from scratch.
    ///
    /// Selected paths that no longer exist are dropped and the selection
    /// policy is re-applied.
    pub fn reload_data(&mut self) -> Result<ReconcileReport, CollectionError> {
        if self.layout.is_none() {
            return Err(layout_not_set());
        }
        for (key, slot) in self.visible.drain() {
            self.retire(key, slot);
        }
        self.counts = self.read_counts();
        self.rebuild_geometry()?;
        let change = self.selection.enforce(&self.counts);
        let report = self.reconcile()?;
        self.notify_selection(&change);
        log::debug!(
            "reloaded {} sections, {} items",
            self.counts.section_count(),
            self.counts.total()
        );
        Ok(report)
    }

    /// Recomputes geometry without re-reading the data source, then reconciles.
    pub fn invalidate_layout(&mut self) -> Result<ReconcileReport, CollectionError> {
        self.rebuild_geometry()?;
        self.reconcile()
    }

    /// Runs one reconciliation pass against the current viewport.
    ///
    /// Views whose keys left the viewport are pooled; keys that entered it
    /// are populated in ascending order.
    pub fn reconcile(&mut self) -> Result<ReconcileReport, CollectionError> {
        let target = self.geometry.elements_in_rect(self.viewport.query_rect());
        let (removed, to_add) = self.visible.diff(&target);
        for key in &removed {
            if let Some(slot) = self.visible.remove(key) {
                self.retire(*key, slot);
            }
        }
        let mut added = Vec::with_capacity(to_add.len());
        for key in to_add {
            match self.materialize(key)? {
                Some(slot) => {
                    self.visible.insert(key, slot);
                    added.push(key);
                }
                None => self.visible.decline(key),
            }
        }
        self.sync_displayed();
        let report = ReconcileReport { added, removed };
        if !report.is_empty() {
            log::debug!(
                "reconciled: +{} -{}, {} displayed, {} pooled",
                report.added.len(),
                report.removed.len(),
                self.visible.len(),
                self.pool.len()
            );
        }
        Ok(report)
    }

    /// Opens an update scope. Scopes nest; operations are applied when the
    /// outermost one closes.
    pub fn begin_updates(&mut self) {
        self.updates.begin();
    }

    /// Closes an update scope, applying the accumulated batch when it was
    /// the outermost one. Completion callbacks run with the outcome.
    pub fn end_updates(&mut self) -> Result<ReconcileReport, CollectionError> {
        let closed = self.updates.end().inspect_err(|fault| log::error!("{fault}"))?;
        let Some((updates, completions)) = closed else {
            return Ok(ReconcileReport::default());
        };
        let result = self.apply_batch(&updates);
        for completion in completions {
            completion(result.is_ok());
        }
        result
    }

    /// Runs `updates` inside one update scope and reports the outcome to
    /// `completion`.
    pub fn perform_batch_updates(
        &mut self,
        updates: impl FnOnce(&mut Self),
        completion: impl FnOnce(bool) + 'static,
    ) -> Result<ReconcileReport, CollectionError> {
        self.begin_updates();
        updates(self);
        self.updates.on_complete(Box::new(completion));
        self.end_updates()
    }

    /// Inserts items at their post-update paths.
    pub fn insert_items(&mut self, paths: &[IndexPath]) -> Result<ReconcileReport, CollectionError> {
        self.submit(paths.iter().copied().map(PendingUpdate::Insert))
    }

    /// Deletes items at their pre-update paths.
    pub fn delete_items(&mut self, paths: &[IndexPath]) -> Result<ReconcileReport, CollectionError> {
        self.submit(paths.iter().copied().map(PendingUpdate::Delete))
    }

    /// Rebuilds the views of items at their pre-update paths.
    pub fn reload_items(&mut self, paths: &[IndexPath]) -> Result<ReconcileReport, CollectionError> {
        self.submit(paths.iter().copied().map(PendingUpdate::Reload))
    }

    /// Inserts whole sections at their post-update indices.
    pub fn insert_sections(&mut self, sections: &[usize]) -> Result<ReconcileReport, CollectionError> {
        self.submit(sections.iter().copied().map(PendingUpdate::InsertSection))
    }

    /// Deletes whole sections at their pre-update indices.
    pub fn delete_sections(&mut self, sections: &[usize]) -> Result<ReconcileReport, CollectionError> {
        self.submit(sections.iter().copied().map(PendingUpdate::DeleteSection))
    }

    /// Applies arbitrary operations, or queues them inside an open scope.
    pub fn apply_updates(
        &mut self,
        updates: impl IntoIterator<Item = PendingUpdate>,
    ) -> Result<ReconcileReport, CollectionError> {
        self.submit(updates)
    }

    fn submit(
        &mut self,
        updates: impl IntoIterator<Item = PendingUpdate>,
    ) -> Result<ReconcileReport, CollectionError> {
        if self.updates.is_open() {
            self.updates.push(updates);
            return Ok(ReconcileReport::default());
        }
        let updates: Vec<_> = updates.into_iter().collect();
        self.apply_batch(&updates)
    }

    fn apply_batch(&mut self, updates: &[PendingUpdate]) -> Result<ReconcileReport, CollectionError> {
        if self.layout.is_none() {
            return Err(layout_not_set());
        }
        let reported = self.read_counts();
        let remap = IndexRemap::plan(&self.counts, updates, &reported).inspect_err(|err| {
            if matches!(err, CollectionError::InvalidUpdate(_)) {
                log::warn!("discarding batch update: {err}");
            }
        })?;

        self.counts = remap.new_counts().clone();
        self.rebuild_geometry()?;
        for (key, slot) in self.visible.remap(&remap) {
            self.retire(key, slot);
        }
        self.selection.remap(|ip| remap.map_index_path(ip));
        let change = self.selection.enforce(&self.counts);
        let report = self.reconcile()?;
        self.notify_selection(&change);
        Ok(report)
    }

    /// Scrolls so `index_path` lands at `position`.
    ///
    /// Returns `false` when the item does not exist, `position` is
    /// [`ScrollPosition::None`], or the delegate declined.
    pub fn scroll_to_item(
        &mut self,
        index_path: IndexPath,
        position: ScrollPosition,
        animated: bool,
    ) -> Result<bool, CollectionError> {
        if self.layout.is_none() {
            return Err(layout_not_set());
        }
        if position == ScrollPosition::None {
            return Ok(false);
        }
        let Some(rect) = self.geometry.rect_for_item(index_path) else {
            return Ok(false);
        };
        if self.delegate_caps.contains(DelegateCapabilities::SHOULD_SCROLL) {
            if let Some(delegate) = self.delegate.as_mut() {
                if !delegate.should_scroll_to(index_path, position) {
                    return Ok(false);
                }
            }
        }
        let origin = self
            .viewport
            .origin_for(rect, position, self.geometry.axis());
        self.viewport.scroll_to(origin, self.geometry.content_size());
        self.reconcile()?;
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.did_scroll_to(index_path, position, animated);
        }
        Ok(true)
    }

    /// Selects `index_path`, deselecting everything else unless `extend`.
    pub fn select(&mut self, index_path: IndexPath, extend: bool) -> SelectionChange {
        let caps = self.delegate_caps;
        let change = self.selection.select(index_path, extend, &self.counts, &mut |ip| {
            should_select(&mut self.delegate, caps, ip)
        });
        self.notify_selection(&change);
        change
    }

    /// Selects `index_path` exclusively, then scrolls it to `position`.
    pub fn select_item(
        &mut self,
        index_path: IndexPath,
        position: ScrollPosition,
        animated: bool,
    ) -> Result<SelectionChange, CollectionError> {
        let change = self.select(index_path, false);
        if self.selection.is_selected(index_path) {
            self.scroll_to_item(index_path, position, animated)?;
        }
        Ok(change)
    }

    /// Adds `paths` to the selection without scrolling.
    pub fn select_items(&mut self, paths: &[IndexPath]) -> SelectionChange {
        let caps = self.delegate_caps;
        let change = self.selection.select_many(paths, &self.counts, &mut |ip| {
            should_select(&mut self.delegate, caps, ip)
        });
        self.notify_selection(&change);
        change
    }

    /// Selects the range between the last acted-upon item and `index_path`.
    pub fn extend_selection_to(&mut self, index_path: IndexPath) -> SelectionChange {
        let caps = self.delegate_caps;
        let change = self.selection.extend_to(index_path, &self.counts, &mut |ip| {
            should_select(&mut self.delegate, caps, ip)
        });
        self.notify_selection(&change);
        change
    }

    /// Deselects `index_path`.
    pub fn deselect_item(&mut self, index_path: IndexPath) -> SelectionChange {
        let caps = self.delegate_caps;
        let change = self.selection.deselect(index_path, &self.counts, &mut |ip| {
            should_deselect(&mut self.delegate, caps, ip)
        });
        self.notify_selection(&change);
        change
    }

    /// Selects every item the delegate allows.
    pub fn select_all(&mut self) -> SelectionChange {
        let caps = self.delegate_caps;
        let change = self
            .selection
            .select_all(&self.counts, &mut |ip| should_select(&mut self.delegate, caps, ip));
        self.notify_selection(&change);
        change
    }

    /// Deselects every item the delegate allows.
    pub fn deselect_all(&mut self) -> SelectionChange {
        let caps = self.delegate_caps;
        let change = self
            .selection
            .deselect_all(&self.counts, &mut |ip| should_deselect(&mut self.delegate, caps, ip));
        self.notify_selection(&change);
        change
    }

    /// Moves the selection one step in `direction`, as arrow keys do.
    ///
    /// With `extend`, the range from the anchor grows to the new item. The
    /// newly selected item is scrolled into view.
    pub fn move_selection(
        &mut self,
        direction: Direction,
        extend: bool,
    ) -> Result<SelectionChange, CollectionError> {
        let layout = self.layout.as_deref().ok_or_else(layout_not_set)?;
        let current = self.selection.extent().or_else(|| self.selection.last_selected());
        let next = match current {
            Some(current) => {
                let cx = LayoutContext {
                    counts: &self.counts,
                    supplementary_kinds: &self.supplementary_kinds,
                    viewport_size: self.viewport.size(),
                };
                layout.next_index_path(&cx, current, direction)
            }
            None => self.counts.first_index_path(),
        };
        let Some(next) = next.filter(|ip| self.counts.contains(*ip)) else {
            return Ok(SelectionChange::default());
        };
        let change = if extend {
            self.extend_selection_to(next)
        } else {
            self.select(next, false)
        };
        if self.selection.is_selected(next) {
            self.scroll_to_item(next, ScrollPosition::Nearest, false)?;
        }
        Ok(change)
    }

    /// Handles a button press at `point` (content coordinates).
    ///
    /// Notifies the delegate, then updates the selection: a plain click
    /// selects exclusively, [`ClickModifiers::TOGGLE`] flips the item and
    /// [`ClickModifiers::EXTEND`] selects the range from the anchor. Returns
    /// the item under the point, if any.
    pub fn mouse_down_at(&mut self, point: Point, modifiers: ClickModifiers) -> Option<IndexPath> {
        let index_path = self.geometry.index_path_at_point(point)?;
        self.pressed = Some(index_path);
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.mouse_down_in_item(index_path);
        }
        if modifiers.contains(ClickModifiers::EXTEND) {
            self.extend_selection_to(index_path);
        } else if modifiers.contains(ClickModifiers::TOGGLE) {
            if self.selection.is_selected(index_path) {
                self.deselect_item(index_path);
            } else {
                self.select(index_path, true);
            }
        } else {
            self.select(index_path, false);
        }
        Some(index_path)
    }

    /// Handles the release of the button pressed in [`Self::mouse_down_at`].
    ///
    /// The delegate hears about the item the press started on, wherever the
    /// release happens.
    pub fn mouse_up(&mut self) -> Option<IndexPath> {
        let index_path = self.pressed.take()?;
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.mouse_up_in_item(index_path);
        }
        Some(index_path)
    }

    /// Reports a double click at `point` to the delegate.
    pub fn double_click_at(&mut self, point: Point) -> Option<IndexPath> {
        let index_path = self.geometry.index_path_at_point(point)?;
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.did_double_click_item(index_path);
        }
        Some(index_path)
    }

    /// Reports a right click at `point` to the delegate.
    pub fn right_click_at(&mut self, point: Point) -> Option<IndexPath> {
        let index_path = self.geometry.index_path_at_point(point)?;
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.did_right_click_item(index_path);
        }
        Some(index_path)
    }

    /// Number of sections as of the last reload or update.
    #[must_use]
    pub fn number_of_sections(&self) -> usize {
        self.counts.section_count()
    }

    /// Number of items in `section` as of the last reload or update.
    #[must_use]
    pub fn number_of_items(&self, section: usize) -> usize {
        self.counts.item_count(section)
    }

    /// Counts as of the last reload or update.
    #[must_use]
    pub fn item_counts(&self) -> &ItemCounts {
        &self.counts
    }

    /// The geometry cache.
    #[must_use]
    pub fn geometry(&self) -> &GeometryCache {
        &self.geometry
    }

    /// Frame of an item; a zero rect for paths that do not exist.
    #[must_use]
    pub fn rect_for_item(&self, index_path: IndexPath) -> Rect {
        self.geometry.rect_for_item(index_path).unwrap_or(Rect::ZERO)
    }

    /// Frame of a section; a zero rect for sections that do not exist.
    #[must_use]
    pub fn rect_for_section(&self, section: usize) -> Rect {
        self.geometry.rect_for_section(section).unwrap_or(Rect::ZERO)
    }

    /// Frame of a supplementary view; a zero rect when there is none.
    #[must_use]
    pub fn rect_for_supplementary_view(&self, kind: SupplementaryKind, section: usize) -> Rect {
        self.geometry
            .rect_for_supplementary(kind, section)
            .unwrap_or(Rect::ZERO)
    }

    /// The item under `point`, in content coordinates.
    #[must_use]
    pub fn index_path_for_item_at_point(&self, point: Point) -> Option<IndexPath> {
        self.geometry.index_path_at_point(point)
    }

    /// Items intersecting `rect`, ascending.
    #[must_use]
    pub fn index_paths_for_items_in_rect(&self, rect: Rect) -> Vec<IndexPath> {
        self.geometry.index_paths_in_rect(rect)
    }

    /// Sections intersecting `rect`, ascending.
    #[must_use]
    pub fn sections_in_rect(&self, rect: Rect) -> Vec<usize> {
        self.geometry.sections_in_rect(rect)
    }

    /// Size of the whole content.
    #[must_use]
    pub fn content_size(&self) -> Size {
        self.geometry.content_size()
    }

    /// Size of the viewport.
    #[must_use]
    pub fn visible_size(&self) -> Size {
        self.viewport.size()
    }

    /// Visible area in content coordinates.
    #[must_use]
    pub fn visible_rect(&self) -> Rect {
        self.viewport.rect()
    }

    /// Viewport state.
    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Displayed cell for `index_path`.
    #[must_use]
    pub fn cell_for_item(&self, index_path: IndexPath) -> Option<&ViewSlot<D::View>> {
        self.visible.get(&ElementKey::Item(index_path))
    }

    /// Displayed cell for `index_path`, mutably.
    pub fn cell_for_item_mut(&mut self, index_path: IndexPath) -> Option<&mut ViewSlot<D::View>> {
        self.visible.get_mut(&ElementKey::Item(index_path))
    }

    /// Displayed supplementary view of `kind` in `section`.
    #[must_use]
    pub fn supplementary_view(
        &self,
        kind: SupplementaryKind,
        section: usize,
    ) -> Option<&ViewSlot<D::View>> {
        self.visible.get(&ElementKey::Supplementary(kind, section))
    }

    /// Displayed cells, ascending by index path.
    #[must_use]
    pub fn visible_cells(&self) -> Vec<&ViewSlot<D::View>> {
        self.visible
            .iter()
            .filter(|(key, _)| matches!(key, ElementKey::Item(_)))
            .map(|(_, slot)| slot)
            .collect()
    }

    /// Index paths of the displayed cells, ascending.
    #[must_use]
    pub fn index_paths_for_visible_items(&self) -> Vec<IndexPath> {
        self.visible.keys().filter_map(|key| key.index_path()).collect()
    }

    /// Every displayed element, ascending.
    #[must_use]
    pub fn visible_elements(&self) -> Vec<ElementKey> {
        self.visible.keys().collect()
    }

    /// Item a displayed view is bound to. `None` for views of other surfaces.
    #[must_use]
    pub fn index_path_for_view(&self, slot: &ViewSlot<D::View>) -> Option<IndexPath> {
        if slot.owner() != self.id {
            log::warn!(
                "view of surface {:?} queried on surface {:?}",
                slot.owner(),
                self.id
            );
            return None;
        }
        slot.index_path()
    }

    /// Selected paths, ascending.
    #[must_use]
    pub fn selected_index_paths(&self) -> Vec<IndexPath> {
        self.selection.selected_sorted()
    }

    /// Returns `true` if `index_path` is selected.
    #[must_use]
    pub fn is_selected(&self, index_path: IndexPath) -> bool {
        self.selection.is_selected(index_path)
    }

    /// Selection state.
    #[must_use]
    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    /// Resolves where a drop at `point` would land.
    #[must_use]
    pub fn drop_target_at(&self, point: Point) -> Option<DropTarget> {
        resolve_drop_target(&self.geometry, &self.counts, point)
    }

    /// Frame to emphasize while hovering `target`.
    #[must_use]
    pub fn drop_marker_rect(&self, target: DropTarget) -> Option<Rect> {
        drop_marker_rect(&self.geometry, target)
    }

    /// Payloads for dragging `dragged`, or `None` if the handler refuses the drag.
    pub fn drag_payloads<H: DragDropHandler<D>>(
        &self,
        handler: &mut H,
        dragged: &[IndexPath],
    ) -> Option<Vec<H::Payload>> {
        if !handler.should_allow_drag(dragged) {
            return None;
        }
        Some(
            dragged
                .iter()
                .filter(|ip| self.counts.contains(**ip))
                .map(|ip| handler.payload(&self.data_source, *ip))
                .collect(),
        )
    }

    /// Concludes a drop at `point`.
    ///
    /// The handler mutates the data source and describes the mutation; the
    /// description is applied as one batch. Returns `Ok(None)` when the
    /// point resolves to nothing or the handler refuses.
    pub fn perform_drop<H: DragDropHandler<D>>(
        &mut self,
        handler: &mut H,
        dragged: &[IndexPath],
        point: Point,
    ) -> Result<Option<ReconcileReport>, CollectionError> {
        let Some(target) = self.drop_target_at(point) else {
            return Ok(None);
        };
        if !dragged.is_empty() && !handler.should_allow_drag(dragged) {
            return Ok(None);
        }
        let Some(updates) = handler.perform_drop(&mut self.data_source, dragged, target) else {
            return Ok(None);
        };
        log::debug!("drop at {:?} {}", target.relation, target.index_path);
        self.submit(updates).map(Some)
    }

    fn read_counts(&self) -> ItemCounts {
        let sections = if self.source_caps.contains(DataSourceCapabilities::SECTION_COUNT) {
            self.data_source.section_count()
        } else {
            1
        };
        ItemCounts::from_fn(sections, |section| self.data_source.item_count(section))
    }

    fn rebuild_geometry(&mut self) -> Result<(), CollectionError> {
        let layout = self.layout.as_deref_mut().ok_or_else(layout_not_set)?;
        self.supplementary_kinds =
            if self.source_caps.contains(DataSourceCapabilities::SUPPLEMENTARY_VIEWS) {
                self.registry.supplementary_kinds()
            } else {
                Vec::new()
            };
        let cx = LayoutContext {
            counts: &self.counts,
            supplementary_kinds: &self.supplementary_kinds,
            viewport_size: self.viewport.size(),
        };
        self.geometry.rebuild(layout, &cx);
        self.viewport.clamp_to_content(self.geometry.content_size());
        Ok(())
    }

    fn materialize(&mut self, key: ElementKey) -> Result<Option<ViewSlot<D::View>>, CollectionError> {
        let mut cx = Dequeue {
            surface: self.id,
            pool: &mut self.pool,
            registry: &self.registry,
            factory: &mut *self.factory,
        };
        let slot = match key {
            ElementKey::Item(ip) => Some(self.data_source.cell_for(&mut cx, ip)),
            ElementKey::Supplementary(kind, section) => {
                self.data_source.supplementary_view(&mut cx, kind, section)
            }
        };
        let Some(slot) = slot else {
            return Ok(None);
        };
        if slot.owner() != self.id {
            let fault = ConfigurationFault::ForeignView {
                owner: slot.owner(),
                surface: self.id,
            };
            log::error!("{fault}");
            return Err(fault.into());
        }
        if slot.kind() != key.view_kind() {
            let fault = match key {
                ElementKey::Item(index_path) => ConfigurationFault::IncompatibleCell { index_path },
                ElementKey::Supplementary(..) => ConfigurationFault::IncompatibleView { key },
            };
            log::error!("{fault}: got {:?}", slot.kind());
            return Err(fault.into());
        }
        Ok(Some(slot))
    }

    fn retire(&mut self, key: ElementKey, slot: ViewSlot<D::View>) {
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.did_end_displaying(key, slot.view());
        }
        self.pool.enqueue(slot);
    }

    /// Pushes frames and selection state to every displayed slot.
    fn sync_displayed(&mut self) {
        for (key, slot) in self.visible.slots_mut() {
            if let Some(rect) = self.geometry.rect_for_element(*key) {
                slot.set_frame(rect);
            }
            let selected = key
                .index_path()
                .is_some_and(|ip| self.selection.is_selected(ip));
            slot.set_selected(selected);
        }
    }

    fn notify_selection(&mut self, change: &SelectionChange) {
        if change.is_empty() {
            return;
        }
        for (paths, selected) in [(&change.deselected, false), (&change.selected, true)] {
            for ip in paths {
                if let Some(slot) = self.visible.get_mut(&ElementKey::Item(*ip)) {
                    slot.set_selected(selected);
                }
            }
        }
        let Some(delegate) = self.delegate.as_mut() else {
            return;
        };
        if self
            .selection
            .options()
            .contains(SelectionOptions::SENDS_MULTIPLE_CALLS)
        {
            for ip in &change.deselected {
                delegate.did_deselect(*ip);
            }
            for ip in &change.selected {
                delegate.did_select(*ip);
            }
        } else {
            if !change.deselected.is_empty() {
                delegate.did_deselect_items(&change.deselected);
            }
            if !change.selected.is_empty() {
                delegate.did_select_items(&change.selected);
            }
        }
        delegate.selected_items_changed(&self.selection.selected_sorted(), change);
    }
}
