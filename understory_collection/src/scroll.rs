// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewport state and item-aligned scrolling.

use kurbo::{Point, Rect, Size};

use crate::Axis;
use crate::layout::sanitize_extent;

/// Where an item should land in the viewport after a scroll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScrollPosition {
    /// Do not scroll.
    None,
    /// Move just enough to make the item fully visible, preferring the
    /// smallest change from the current offset.
    #[default]
    Nearest,
    /// Align the leading edge of the item with the viewport.
    Top,
    /// Center the item within the viewport.
    Middle,
    /// Align the trailing edge of the item with the viewport.
    Bottom,
}

/// Scroll origin, visible size and overscan margin of a surface.
///
/// The origin is kept inside the content: `0 <= origin <= content - size`
/// on each axis, or `0` when the content is smaller than the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    origin: Point,
    size: Size,
    overscan: f64,
}

impl Viewport {
    /// Creates a viewport of `size` at the content origin.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            origin: Point::ZERO,
            size: Size::new(sanitize_extent(size.width), sanitize_extent(size.height)),
            overscan: 0.0,
        }
    }

    /// Top-left corner of the visible area in content coordinates.
    #[must_use]
    pub const fn origin(&self) -> Point {
        self.origin
    }

    /// Visible size.
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Margin added around the visible area for reconciliation.
    #[must_use]
    pub const fn overscan(&self) -> f64 {
        self.overscan
    }

    /// Visible area in content coordinates.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.origin, self.size)
    }

    /// Visible area expanded by the overscan margin.
    #[must_use]
    pub fn query_rect(&self) -> Rect {
        self.rect().inflate(self.overscan, self.overscan)
    }

    pub(crate) fn set_size(&mut self, size: Size) -> bool {
        let size = Size::new(sanitize_extent(size.width), sanitize_extent(size.height));
        let changed = self.size != size;
        self.size = size;
        changed
    }

    pub(crate) fn set_overscan(&mut self, overscan: f64) {
        self.overscan = sanitize_extent(overscan);
    }

    /// Moves the origin to `origin`, clamped to `content`. Returns `true` if it moved.
    pub(crate) fn scroll_to(&mut self, origin: Point, content: Size) -> bool {
        let clamped = Point::new(
            clamp_offset(origin.x, self.size.width, content.width),
            clamp_offset(origin.y, self.size.height, content.height),
        );
        let moved = clamped != self.origin;
        self.origin = clamped;
        moved
    }

    /// Re-clamps the current origin after the content size changed.
    pub(crate) fn clamp_to_content(&mut self, content: Size) -> bool {
        self.scroll_to(self.origin, content)
    }

    /// Origin that shows `item` at `position` along `axis`, before clamping.
    #[must_use]
    pub fn origin_for(&self, item: Rect, position: ScrollPosition, axis: Axis) -> Point {
        let (current, viewport, item_start, item_end) = match axis {
            Axis::Vertical => (self.origin.y, self.size.height, item.y0, item.y1),
            Axis::Horizontal => (self.origin.x, self.size.width, item.x0, item.x1),
        };
        let offset = match position {
            ScrollPosition::None => current,
            ScrollPosition::Top => item_start,
            ScrollPosition::Bottom => (item_end - viewport).max(0.0),
            ScrollPosition::Middle => ((item_start + item_end) / 2.0 - viewport / 2.0).max(0.0),
            ScrollPosition::Nearest => {
                let viewport_end = current + viewport;
                if item_start >= current && item_end <= viewport_end {
                    current
                } else if item_start < current {
                    item_start
                } else {
                    (item_end - viewport).max(0.0)
                }
            }
        };
        match axis {
            Axis::Vertical => Point::new(self.origin.x, offset),
            Axis::Horizontal => Point::new(offset, self.origin.y),
        }
    }
}

fn clamp_offset(offset: f64, viewport: f64, content: f64) -> f64 {
    let max = (content - viewport).max(0.0);
    if offset.is_nan() {
        return 0.0;
    }
    offset.clamp(0.0, max)
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Rect, Size};

    use super::{ScrollPosition, Viewport};
    use crate::Axis;

    fn row(i: f64) -> Rect {
        Rect::new(0.0, i * 10.0, 100.0, i * 10.0 + 10.0)
    }

    #[test]
    fn positions_align_item_as_expected() {
        let content = Size::new(100.0, 100.0);
        let mut vp = Viewport::new(Size::new(100.0, 30.0));

        let top = vp.origin_for(row(3.0), ScrollPosition::Top, Axis::Vertical);
        assert_eq!(top, Point::new(0.0, 30.0));

        let bottom = vp.origin_for(row(3.0), ScrollPosition::Bottom, Axis::Vertical);
        assert_eq!(bottom, Point::new(0.0, 10.0));

        let middle = vp.origin_for(row(3.0), ScrollPosition::Middle, Axis::Vertical);
        assert_eq!(middle, Point::new(0.0, 20.0));

        vp.scroll_to(middle, content);
        let nearest = vp.origin_for(row(3.0), ScrollPosition::Nearest, Axis::Vertical);
        assert_eq!(nearest, vp.origin());
        assert_eq!(
            vp.origin_for(row(9.0), ScrollPosition::None, Axis::Vertical),
            vp.origin()
        );
    }

    #[test]
    fn nearest_moves_minimally() {
        let vp = Viewport::new(Size::new(100.0, 30.0));
        let below = vp.origin_for(row(5.0), ScrollPosition::Nearest, Axis::Vertical);
        assert_eq!(below.y, 30.0);
    }

    #[test]
    fn origin_is_clamped_to_content() {
        let mut vp = Viewport::new(Size::new(100.0, 30.0));
        assert!(vp.scroll_to(Point::new(0.0, 500.0), Size::new(100.0, 50.0)));
        assert_eq!(vp.origin().y, 20.0);

        // Content smaller than the viewport pins the origin to zero.
        vp.clamp_to_content(Size::new(100.0, 20.0));
        assert_eq!(vp.origin().y, 0.0);
        assert!(!vp.scroll_to(Point::new(-5.0, -5.0), Size::new(100.0, 20.0)));
    }

    #[test]
    fn overscan_expands_query_rect() {
        let mut vp = Viewport::new(Size::new(100.0, 30.0));
        vp.set_overscan(5.0);
        assert_eq!(vp.query_rect(), Rect::new(-5.0, -5.0, 105.0, 35.0));
    }
}
