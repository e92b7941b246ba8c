// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A vertical grid of fixed-size items whose column count follows the viewport width.

use alloc::vec::Vec;

use kurbo::{Rect, Size};

use super::{Direction, LayoutContext, LayoutPolicy, sanitize_extent};
use crate::{IndexPath, SupplementaryKind};

#[derive(Clone, Copy, Debug, Default)]
struct GridSection {
    origin: f64,
    header: f64,
    rows: usize,
    footer: f64,
}

/// Fixed-size items flowed left to right into rows, rows stacked top to bottom.
///
/// The number of columns is derived on every layout pass from the viewport
/// width, so the layout is recomputed whenever the viewport is resized.
#[derive(Clone, Debug)]
pub struct GridLayout {
    item_size: Size,
    spacing: f64,
    header_height: f64,
    footer_height: f64,
    columns: usize,
    width: f64,
    sections: Vec<GridSection>,
}

impl GridLayout {
    /// Creates a grid of `item_size` items separated by `spacing` in both directions.
    #[must_use]
    pub fn new(item_size: Size, spacing: f64) -> Self {
        Self {
            item_size: Size::new(
                sanitize_extent(item_size.width),
                sanitize_extent(item_size.height),
            ),
            spacing: sanitize_extent(spacing),
            header_height: 0.0,
            footer_height: 0.0,
            columns: 1,
            width: 0.0,
            sections: Vec::new(),
        }
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

    /// Number of columns computed by the most recent layout pass.
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    fn columns_for_width(&self, width: f64) -> usize {
        let stride = self.item_size.width + self.spacing;
        if stride <= 0.0 {
            return 1;
        }
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "Value is floored and clamped to at least one column"
        )]
        let columns = ((width + self.spacing) / stride).floor().max(1.0) as usize;
        columns
    }

    fn rows_extent(&self, rows: usize) -> f64 {
        if rows == 0 {
            return 0.0;
        }
        let rows = rows as f64;
        rows * self.item_size.height + (rows - 1.0) * self.spacing
    }

    fn section_extent(&self, s: &GridSection) -> f64 {
        s.header + self.rows_extent(s.rows) + s.footer
    }
}

impl LayoutPolicy for GridLayout {
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
        self.columns = self.columns_for_width(self.width);
        let mut origin = 0.0;
        let mut sections = Vec::with_capacity(cx.counts.section_count());
        for &count in cx.counts.as_slice() {
            let s = GridSection {
                origin,
                header,
                rows: count.div_ceil(self.columns),
                footer,
            };
            origin += self.section_extent(&s);
            sections.push(s);
        }
        self.sections = sections;
    }

    fn item_rect(&self, cx: &LayoutContext<'_>, index_path: IndexPath) -> Option<Rect> {
        if !cx.counts.contains(index_path) {
            return None;
        }
        let s = self.sections.get(index_path.section)?;
        let row = (index_path.item / self.columns) as f64;
        let column = (index_path.item % self.columns) as f64;
        let x = column * (self.item_size.width + self.spacing);
        let y = s.origin + s.header + row * (self.item_size.height + self.spacing);
        Some(Rect::from_origin_size((x, y), self.item_size))
    }

    fn supplementary_rect(
        &self,
        _cx: &LayoutContext<'_>,
        kind: SupplementaryKind,
        section: usize,
    ) -> Option<Rect> {
        let s = self.sections.get(section)?;
        if kind == SupplementaryKind::HEADER && s.header > 0.0 {
            Some(Rect::new(0.0, s.origin, self.width, s.origin + s.header))
        } else if kind == SupplementaryKind::FOOTER && s.footer > 0.0 {
            let top = s.origin + s.header + self.rows_extent(s.rows);
            Some(Rect::new(0.0, top, self.width, top + s.footer))
        } else {
            None
        }
    }

    fn section_rect(&self, _cx: &LayoutContext<'_>, section: usize) -> Option<Rect> {
        let s = self.sections.get(section)?;
        Some(Rect::new(
            0.0,
            s.origin,
            self.width,
            s.origin + self.section_extent(s),
        ))
    }

    fn content_size(&self, _cx: &LayoutContext<'_>) -> Option<Size> {
        let height = self
            .sections
            .last()
            .map_or(0.0, |s| s.origin + self.section_extent(s));
        Some(Size::new(self.width, height))
    }

    fn next_index_path(
        &self,
        cx: &LayoutContext<'_>,
        current: IndexPath,
        direction: Direction,
    ) -> Option<IndexPath> {
        let count = cx.counts.item_count(current.section);
        if current.item >= count {
            return None;
        }
        let columns = self.columns;
        match direction {
            Direction::Left => cx.counts.previous_index_path(current),
            Direction::Right => cx.counts.next_index_path(current),
            Direction::Up if current.item >= columns => {
                Some(IndexPath::new(current.section, current.item - columns))
            }
            Direction::Up => {
                cx.counts
                    .previous_index_path(IndexPath::new(current.section, 0))
            }
            Direction::Down if current.item + columns < count => {
                Some(IndexPath::new(current.section, current.item + columns))
            }
            Direction::Down if current.item / columns < (count - 1) / columns => {
                // Next row is partial and shorter than this column.
                Some(IndexPath::new(current.section, count - 1))
            }
            Direction::Down => cx
                .counts
                .next_index_path(IndexPath::new(current.section, count - 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::{Rect, Size};

    use super::GridLayout;
    use crate::layout::{Direction, LayoutContext, LayoutPolicy};
    use crate::{IndexPath, ItemCounts, SupplementaryKind};

    #[test]
    fn columns_follow_viewport_width() {
        let counts = ItemCounts::new(vec![7]);
        let mut layout = GridLayout::new(Size::new(30.0, 20.0), 10.0);
        for (width, columns) in [(30.0, 1), (69.0, 1), (70.0, 2), (110.0, 3), (5.0, 1)] {
            let cx = LayoutContext {
                counts: &counts,
                supplementary_kinds: &[],
                viewport_size: Size::new(width, 100.0),
            };
            layout.prepare(&cx);
            assert_eq!(layout.columns(), columns, "width {width}");
        }
    }

    #[test]
    fn items_flow_into_rows_after_header() {
        let counts = ItemCounts::new(vec![4, 1]);
        let kinds = [SupplementaryKind::HEADER];
        let cx = LayoutContext {
            counts: &counts,
            supplementary_kinds: &kinds,
            viewport_size: Size::new(70.0, 100.0),
        };
        let mut layout = GridLayout::new(Size::new(30.0, 20.0), 10.0).with_header_height(8.0);
        layout.prepare(&cx);

        assert_eq!(
            layout.item_rect(&cx, IndexPath::new(0, 1)),
            Some(Rect::new(40.0, 8.0, 70.0, 28.0))
        );
        assert_eq!(
            layout.item_rect(&cx, IndexPath::new(0, 2)),
            Some(Rect::new(0.0, 38.0, 30.0, 58.0))
        );
        // Section 0: 8 + 2 rows (20 + 10 + 20) = 58.
        assert_eq!(
            layout.supplementary_rect(&cx, SupplementaryKind::HEADER, 1),
            Some(Rect::new(0.0, 58.0, 70.0, 66.0))
        );
        assert_eq!(
            layout.item_rect(&cx, IndexPath::new(1, 0)),
            Some(Rect::new(0.0, 66.0, 30.0, 86.0))
        );
        assert_eq!(layout.item_rect(&cx, IndexPath::new(1, 1)), None);
    }

    #[test]
    fn vertical_navigation_moves_by_rows() {
        let counts = ItemCounts::new(vec![5, 2]);
        let cx = LayoutContext {
            counts: &counts,
            supplementary_kinds: &[],
            viewport_size: Size::new(110.0, 100.0),
        };
        let mut layout = GridLayout::new(Size::new(30.0, 20.0), 10.0);
        layout.prepare(&cx);
        assert_eq!(layout.columns(), 3);

        let down = |item| layout.next_index_path(&cx, IndexPath::new(0, item), Direction::Down);
        assert_eq!(down(1), Some(IndexPath::new(0, 4)));
        // Column 2 has no item in the partial second row.
        assert_eq!(down(2), Some(IndexPath::new(0, 4)));
        assert_eq!(down(4), Some(IndexPath::new(1, 0)));

        assert_eq!(
            layout.next_index_path(&cx, IndexPath::new(0, 4), Direction::Up),
            Some(IndexPath::new(0, 1))
        );
        assert_eq!(
            layout.next_index_path(&cx, IndexPath::new(1, 1), Direction::Up),
            Some(IndexPath::new(0, 4))
        );
        assert_eq!(
            layout.next_index_path(&cx, IndexPath::new(0, 2), Direction::Right),
            Some(IndexPath::new(0, 3))
        );
    }
}
