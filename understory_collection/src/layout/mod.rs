// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pluggable layout policies.
//!
//! A [`LayoutPolicy`] maps the current [`ItemCounts`] and the viewport size to
//! rectangles in content coordinates. The [`GeometryCache`](crate::GeometryCache)
//! drives it once per (re)layout and keeps the results for O(1) lookup.
//!
//! Policies may keep state between calls (row offsets, column counts), but the
//! rectangles they report must be a pure function of the [`LayoutContext`].
//! Within a section, item rectangles must not overlap and must advance along
//! the policy's [`Axis`]; sections must advance along the same axis.

mod grid;
mod list;

pub use grid::GridLayout;
pub use list::{ListLayout, RowHeightFn};

use kurbo::{Rect, Size};

use crate::{Axis, IndexPath, ItemCounts, SupplementaryKind};

/// Inputs available to a layout pass.
#[derive(Clone, Copy, Debug)]
pub struct LayoutContext<'a> {
    /// Item counts per section.
    pub counts: &'a ItemCounts,
    /// Supplementary kinds with a registered class or template.
    pub supplementary_kinds: &'a [SupplementaryKind],
    /// Size of the visible area; flow layouts read its width.
    pub viewport_size: Size,
}

impl LayoutContext<'_> {
    /// Returns `true` if views of `kind` have been registered.
    #[must_use]
    pub fn has_supplementary(&self, kind: SupplementaryKind) -> bool {
        self.supplementary_kinds.contains(&kind)
    }
}

/// Keyboard-style navigation direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward smaller y.
    Up,
    /// Toward larger y.
    Down,
    /// Toward smaller x.
    Left,
    /// Toward larger x.
    Right,
}

/// Strategy producing geometry for a collection view.
pub trait LayoutPolicy {
    /// Axis along which sections and items advance.
    fn scroll_axis(&self) -> Axis {
        Axis::Vertical
    }

    /// Called once at the start of every layout pass, before any rect queries.
    fn prepare(&mut self, cx: &LayoutContext<'_>) {
        let _ = cx;
    }

    /// Rectangle of a valid item.
    ///
    /// Returning `None` for an index path that exists under `cx.counts` is a
    /// contract violation; the cache substitutes a zero rect and logs it.
    fn item_rect(&self, cx: &LayoutContext<'_>, index_path: IndexPath) -> Option<Rect>;

    /// Rectangle of the `kind` supplementary view in `section`, if it has one.
    fn supplementary_rect(
        &self,
        cx: &LayoutContext<'_>,
        kind: SupplementaryKind,
        section: usize,
    ) -> Option<Rect> {
        let _ = (cx, kind, section);
        None
    }

    /// Frame of a whole section.
    ///
    /// Defaults to the union of the section's item and supplementary rects.
    fn section_rect(&self, cx: &LayoutContext<'_>, section: usize) -> Option<Rect> {
        let _ = (cx, section);
        None
    }

    /// Total content size.
    ///
    /// Defaults to the extent of the union of all section frames.
    fn content_size(&self, cx: &LayoutContext<'_>) -> Option<Size> {
        let _ = cx;
        None
    }

    /// The item reached from `current` by moving in `direction`.
    ///
    /// The default treats the collection as one flat sequence: up/left step
    /// back, down/right step forward.
    fn next_index_path(
        &self,
        cx: &LayoutContext<'_>,
        current: IndexPath,
        direction: Direction,
    ) -> Option<IndexPath> {
        match direction {
            Direction::Up | Direction::Left => cx.counts.previous_index_path(current),
            Direction::Down | Direction::Right => cx.counts.next_index_path(current),
        }
    }
}

/// Clamps a caller-supplied extent to a finite, non-negative value.
pub(crate) fn sanitize_extent(extent: f64) -> f64 {
    debug_assert!(extent.is_finite(), "layout extents must be finite; got {extent:?}");
    if extent.is_sign_negative() || !extent.is_finite() {
        0.0
    } else {
        extent
    }
}
