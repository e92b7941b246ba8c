// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A vertical list: one full-width row per item, sections stacked top to bottom.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Rect, Size};

use super::{LayoutContext, LayoutPolicy, sanitize_extent};
use crate::{IndexPath, SupplementaryKind};

/// Per-row height callback.
pub type RowHeightFn = Box<dyn Fn(IndexPath) -> f64>;

#[derive(Clone, Debug, Default)]
struct ListSection {
    /// Offset of the section's top edge.
    origin: f64,
    header: f64,
    /// Offset of each row's top edge, relative to the first row.
    row_starts: Vec<f64>,
    rows_extent: f64,
    footer: f64,
}

impl ListSection {
    fn extent(&self) -> f64 {
        self.header + self.rows_extent + self.footer
    }
}

/// Full-width rows of fixed or per-row height, with optional section headers
/// and footers.
///
/// Headers and footers only take space when their kind is registered on the
/// collection view and their configured height is positive.
///
/// ```rust
/// use kurbo::{Rect, Size};
/// use understory_collection::{IndexPath, ItemCounts, LayoutContext, LayoutPolicy, ListLayout};
///
/// let counts = ItemCounts::new(vec![3]);
/// let cx = LayoutContext {
///     counts: &counts,
///     supplementary_kinds: &[],
///     viewport_size: Size::new(100.0, 50.0),
/// };
/// let mut layout = ListLayout::new(20.0);
/// layout.prepare(&cx);
/// assert_eq!(
///     layout.item_rect(&cx, IndexPath::new(0, 2)),
///     Some(Rect::new(0.0, 40.0, 100.0, 60.0))
/// );
/// ```
pub struct ListLayout {
    row_height: f64,
    row_height_fn: Option<RowHeightFn>,
    header_height: f64,
    footer_height: f64,
    width: f64,
    sections: Vec<ListSection>,
}

impl fmt::Debug for ListLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListLayout")
            .field("row_height", &self.row_height)
            .field("has_row_height_fn", &self.row_height_fn.is_some())
            .field("header_height", &self.header_height)
            .field("footer_height", &self.footer_height)
            .field("width", &self.width)
            .field("sections", &self.sections.len())
            .finish()
    }
}

impl ListLayout {
    /// Creates a list whose rows are all `row_height` tall.
    #[must_use]
    pub fn new(row_height: f64) -> Self {
        Self {
            row_height: sanitize_extent(row_height),
            row_height_fn: None,
            header_height: 0.0,
            footer_height: 0.0,
            width: 0.0,
            sections: Vec::new(),
        }
    }

    /// Uses `height_of` to size each row instead of the uniform row height.
    #[must_use]
    pub fn with_row_heights(mut self, height_of: impl Fn(IndexPath) -> f64 + 'static) -> Self {
        self.row_height_fn = Some(Box::new(height_of));
        self
    }

    /// Sets the header height applied to every section.
    #[must_use]
    pub fn with_header_height(mut self, height: f64) -> Self {
        self.header_height = sanitize_extent(height);
        self
    }

    /// Sets the footer height applied to every section.
    #[must_use]
    pub fn with_footer_height(mut self, height: f64) -> Self {
        self.footer_height = sanitize_extent(height);
        self
    }

    /// Uniform row height.
    #[must_use]
    pub const fn row_height(&self) -> f64 {
        self.row_height
    }

    /// Sets the uniform row height. Takes effect on the next layout pass.
    pub fn set_row_height(&mut self, row_height: f64) {
        self.row_height = sanitize_extent(row_height);
    }

    fn height_of(&self, index_path: IndexPath) -> f64 {
        match &self.row_height_fn {
            Some(height_of) => sanitize_extent(height_of(index_path)),
            None => self.row_height,
        }
    }

    fn row(&self, section: usize, width: f64, top: f64, bottom: f64) -> Option<Rect> {
        let s = self.sections.get(section)?;
        Some(Rect::new(0.0, s.origin + top, width, s.origin + bottom))
    }
}

impl LayoutPolicy for ListLayout {
    fn prepare(&mut self, cx: &LayoutContext<'_>) {
        let header = if cx.has_supplementary(SupplementaryKind::HEADER) {
            self.header_height
        } else {
            0.0
        };
        let footer = if cx.has_supplementary(SupplementaryKind::FOOTER) {
            self.footer_height
        } else {
            0.0
        };

        self.width = cx.viewport_size.width.max(0.0);
        let mut sections = Vec::with_capacity(cx.counts.section_count());
        let mut origin = 0.0;
        for (section, &count) in cx.counts.as_slice().iter().enumerate() {
            let mut row_starts = Vec::with_capacity(count);
            let mut pos = 0.0;
            for item in 0..count {
                row_starts.push(pos);
                pos += self.height_of(IndexPath::new(section, item));
            }
            let s = ListSection {
                origin,
                header,
                row_starts,
                rows_extent: pos,
                footer,
            };
            origin += s.extent();
            sections.push(s);
        }
        self.sections = sections;
    }

    fn item_rect(&self, _cx: &LayoutContext<'_>, index_path: IndexPath) -> Option<Rect> {
        let s = self.sections.get(index_path.section)?;
        let start = *s.row_starts.get(index_path.item)?;
        let end = s
            .row_starts
            .get(index_path.item + 1)
            .copied()
            .unwrap_or(s.rows_extent);
        self.row(
            index_path.section,
            self.width,
            s.header + start,
            s.header + end,
        )
    }

    fn supplementary_rect(
        &self,
        _cx: &LayoutContext<'_>,
        kind: SupplementaryKind,
        section: usize,
    ) -> Option<Rect> {
        let s = self.sections.get(section)?;
        if kind == SupplementaryKind::HEADER && s.header > 0.0 {
            self.row(section, self.width, 0.0, s.header)
        } else if kind == SupplementaryKind::FOOTER && s.footer > 0.0 {
            let top = s.header + s.rows_extent;
            self.row(section, self.width, top, top + s.footer)
        } else {
            None
        }
    }

    fn section_rect(&self, _cx: &LayoutContext<'_>, section: usize) -> Option<Rect> {
        let s = self.sections.get(section)?;
        self.row(section, self.width, 0.0, s.extent())
    }

    fn content_size(&self, _cx: &LayoutContext<'_>) -> Option<Size> {
        let height = self.sections.last().map_or(0.0, |s| s.origin + s.extent());
        Some(Size::new(self.width, height))
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::{Rect, Size};

    use super::ListLayout;
    use crate::layout::{Direction, LayoutContext, LayoutPolicy};
    use crate::{IndexPath, ItemCounts, SupplementaryKind};

    fn cx<'a>(counts: &'a ItemCounts, kinds: &'a [SupplementaryKind]) -> LayoutContext<'a> {
        LayoutContext {
            counts,
            supplementary_kinds: kinds,
            viewport_size: Size::new(120.0, 60.0),
        }
    }

    #[test]
    fn fixed_rows_stack_in_order() {
        let counts = ItemCounts::new(vec![3]);
        let cx = cx(&counts, &[]);
        let mut layout = ListLayout::new(20.0);
        layout.prepare(&cx);

        assert_eq!(
            layout.item_rect(&cx, IndexPath::new(0, 0)),
            Some(Rect::new(0.0, 0.0, 120.0, 20.0))
        );
        assert_eq!(
            layout.item_rect(&cx, IndexPath::new(0, 1)),
            Some(Rect::new(0.0, 20.0, 120.0, 40.0))
        );
        assert_eq!(
            layout.item_rect(&cx, IndexPath::new(0, 2)),
            Some(Rect::new(0.0, 40.0, 120.0, 60.0))
        );
        assert_eq!(layout.item_rect(&cx, IndexPath::new(0, 3)), None);
        assert_eq!(layout.content_size(&cx), Some(Size::new(120.0, 60.0)));
    }

    #[test]
    fn headers_and_footers_only_apply_when_registered() {
        let counts = ItemCounts::new(vec![1, 1]);
        let layout_with = |kinds: &[SupplementaryKind]| {
            let cx = cx(&counts, kinds);
            let mut layout = ListLayout::new(10.0)
                .with_header_height(5.0)
                .with_footer_height(2.0);
            layout.prepare(&cx);
            (
                layout.item_rect(&cx, IndexPath::new(1, 0)),
                layout.supplementary_rect(&cx, SupplementaryKind::HEADER, 1),
                layout.supplementary_rect(&cx, SupplementaryKind::FOOTER, 0),
            )
        };

        let (item, header, footer) = layout_with(&[]);
        assert_eq!(item, Some(Rect::new(0.0, 10.0, 120.0, 20.0)));
        assert_eq!(header, None);
        assert_eq!(footer, None);

        let (item, header, footer) =
            layout_with(&[SupplementaryKind::HEADER, SupplementaryKind::FOOTER]);
        // Section 0 spans 5 + 10 + 2 = 17.
        assert_eq!(header, Some(Rect::new(0.0, 17.0, 120.0, 22.0)));
        assert_eq!(item, Some(Rect::new(0.0, 22.0, 120.0, 32.0)));
        assert_eq!(footer, Some(Rect::new(0.0, 15.0, 120.0, 17.0)));
    }

    #[test]
    fn per_row_heights_and_negative_clamping() {
        let counts = ItemCounts::new(vec![3]);
        let cx = cx(&counts, &[]);
        let mut layout = ListLayout::new(10.0).with_row_heights(|ip| match ip.item {
            0 => 30.0,
            1 => -4.0,
            _ => 15.0,
        });
        layout.prepare(&cx);
        assert_eq!(
            layout.item_rect(&cx, IndexPath::new(0, 1)),
            Some(Rect::new(0.0, 30.0, 120.0, 30.0))
        );
        assert_eq!(
            layout.item_rect(&cx, IndexPath::new(0, 2)),
            Some(Rect::new(0.0, 30.0, 120.0, 45.0))
        );
        assert_eq!(
            layout.section_rect(&cx, 0),
            Some(Rect::new(0.0, 0.0, 120.0, 45.0))
        );
    }

    #[test]
    fn vertical_navigation_walks_rows() {
        let counts = ItemCounts::new(vec![2, 1]);
        let cx = cx(&counts, &[]);
        let mut layout = ListLayout::new(10.0);
        layout.prepare(&cx);
        assert_eq!(
            layout.next_index_path(&cx, IndexPath::new(0, 1), Direction::Down),
            Some(IndexPath::new(1, 0))
        );
        assert_eq!(
            layout.next_index_path(&cx, IndexPath::new(0, 0), Direction::Up),
            None
        );
    }
}
