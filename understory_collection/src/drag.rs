// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drop-target resolution against cached geometry.
//!
//! The drag session itself (pasteboards, dragging images, event plumbing) is
//! the host's business. This module only answers "where would a drop at this
//! point land" and hands the outcome to a [`DragDropHandler`], whose updates
//! are then applied as one batch.

use alloc::vec::Vec;

use kurbo::{Point, Rect};

use crate::geometry::{axis_max, axis_min};
use crate::{Axis, GeometryCache, IndexPath, ItemCounts, PendingUpdate};

/// Thickness of the marker drawn between two items.
pub const DROP_MARKER_THICKNESS: f64 = 2.0;

/// Where a drop lands relative to its target item.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DropRelation {
    /// Insert before the item.
    Before,
    /// Drop onto the item itself.
    On,
    /// Insert after the item.
    After,
}

/// Resolved drop location.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DropTarget {
    /// Item the drop is relative to.
    pub index_path: IndexPath,
    /// Relation to that item.
    pub relation: DropRelation,
}

/// Host collaborator that owns drag payloads and concludes drops.
pub trait DragDropHandler<D> {
    /// Payload written for each dragged item.
    type Payload;

    /// Type identifiers this handler accepts.
    fn accepted_types(&self) -> &[&'static str];

    /// Whether a drag carrying `type_id` is accepted.
    fn accepts(&self, type_id: &str) -> bool {
        self.accepted_types().contains(&type_id)
    }

    /// Payload for the item at `index_path`.
    fn payload(&mut self, data_source: &D, index_path: IndexPath) -> Self::Payload;

    /// Whether `dragged` may be dragged at all.
    fn should_allow_drag(&mut self, dragged: &[IndexPath]) -> bool {
        let _ = dragged;
        true
    }

    /// Concludes a drop by mutating `data_source`.
    ///
    /// `dragged` is empty when the drag started outside this surface. Returns
    /// the updates describing the mutation, or `None` to refuse the drop.
    fn perform_drop(
        &mut self,
        data_source: &mut D,
        dragged: &[IndexPath],
        target: DropTarget,
    ) -> Option<Vec<PendingUpdate>>;
}

/// Resolves a drop at `point`.
///
/// The leading quarter of an item (along the scroll axis) resolves to
/// [`DropRelation::Before`], the trailing quarter to [`DropRelation::After`],
/// and the middle to [`DropRelation::On`]. A point past the end of the content
/// lands after the last item; an empty collection accepts drops before
/// `(0, 0)`.
#[must_use]
pub(crate) fn resolve_drop_target(
    geometry: &GeometryCache,
    counts: &ItemCounts,
    point: Point,
) -> Option<DropTarget> {
    let axis = geometry.axis();
    if let Some(index_path) = geometry.index_path_at_point(point) {
        let rect = geometry.rect_for_item(index_path)?;
        let (lo, hi) = (axis_min(axis, rect), axis_max(axis, rect));
        let at = match axis {
            Axis::Vertical => point.y,
            Axis::Horizontal => point.x,
        };
        let quarter = (hi - lo) / 4.0;
        let relation = if at < lo + quarter {
            DropRelation::Before
        } else if at >= hi - quarter {
            DropRelation::After
        } else {
            DropRelation::On
        };
        return Some(DropTarget {
            index_path,
            relation,
        });
    }

    if counts.has_no_items() {
        return (counts.section_count() > 0).then_some(DropTarget {
            index_path: IndexPath::new(0, 0),
            relation: DropRelation::Before,
        });
    }
    let last = counts.last_index_path()?;
    let last_rect = geometry.rect_for_item(last)?;
    let at = match axis {
        Axis::Vertical => point.y,
        Axis::Horizontal => point.x,
    };
    (at >= axis_max(axis, last_rect)).then_some(DropTarget {
        index_path: last,
        relation: DropRelation::After,
    })
}

/// Frame a host should emphasize for `target`.
///
/// `On` yields the item rect; `Before`/`After` yield a thin strip centered on
/// the item's leading or trailing edge.
#[must_use]
pub(crate) fn drop_marker_rect(geometry: &GeometryCache, target: DropTarget) -> Option<Rect> {
    let rect = geometry.rect_for_item(target.index_path)?;
    let half = DROP_MARKER_THICKNESS / 2.0;
    Some(match (target.relation, geometry.axis()) {
        (DropRelation::On, _) => rect,
        (DropRelation::Before, Axis::Vertical) => {
            Rect::new(rect.x0, rect.y0 - half, rect.x1, rect.y0 + half)
        }
        (DropRelation::After, Axis::Vertical) => {
            Rect::new(rect.x0, rect.y1 - half, rect.x1, rect.y1 + half)
        }
        (DropRelation::Before, Axis::Horizontal) => {
            Rect::new(rect.x0 - half, rect.y0, rect.x0 + half, rect.y1)
        }
        (DropRelation::After, Axis::Horizontal) => {
            Rect::new(rect.x1 - half, rect.y0, rect.x1 + half, rect.y1)
        }
    })
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::{Point, Rect, Size};

    use super::{DropRelation, DropTarget, drop_marker_rect, resolve_drop_target};
    use crate::layout::{LayoutContext, ListLayout};
    use crate::{GeometryCache, IndexPath, ItemCounts};

    fn list(counts: &ItemCounts) -> GeometryCache {
        let mut layout = ListLayout::new(20.0);
        let cx = LayoutContext {
            counts,
            supplementary_kinds: &[],
            viewport_size: Size::new(100.0, 60.0),
        };
        let mut geometry = GeometryCache::new();
        geometry.rebuild(&mut layout, &cx);
        geometry
    }

    #[test]
    fn item_is_split_into_before_on_after() {
        let counts = ItemCounts::new(vec![3]);
        let geometry = list(&counts);
        let at = |y| resolve_drop_target(&geometry, &counts, Point::new(10.0, y));
        let target = |item, relation| {
            Some(DropTarget {
                index_path: IndexPath::new(0, item),
                relation,
            })
        };
        assert_eq!(at(21.0), target(1, DropRelation::Before));
        assert_eq!(at(30.0), target(1, DropRelation::On));
        assert_eq!(at(39.0), target(1, DropRelation::After));
    }

    #[test]
    fn past_the_end_lands_after_last_item() {
        let counts = ItemCounts::new(vec![2]);
        let geometry = list(&counts);
        assert_eq!(
            resolve_drop_target(&geometry, &counts, Point::new(10.0, 500.0)),
            Some(DropTarget {
                index_path: IndexPath::new(0, 1),
                relation: DropRelation::After,
            })
        );
    }

    #[test]
    fn empty_collection_accepts_drop_at_origin() {
        let counts = ItemCounts::new(vec![0]);
        let geometry = list(&counts);
        assert_eq!(
            resolve_drop_target(&geometry, &counts, Point::new(10.0, 10.0)),
            Some(DropTarget {
                index_path: IndexPath::new(0, 0),
                relation: DropRelation::Before,
            })
        );
    }

    #[test]
    fn marker_straddles_item_edge() {
        let counts = ItemCounts::new(vec![3]);
        let geometry = list(&counts);
        let marker = drop_marker_rect(
            &geometry,
            DropTarget {
                index_path: IndexPath::new(0, 1),
                relation: DropRelation::After,
            },
        );
        assert_eq!(marker, Some(Rect::new(0.0, 39.0, 100.0, 41.0)));
    }
}
