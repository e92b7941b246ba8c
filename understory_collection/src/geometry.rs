// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cached geometry for every item, section, and supplementary view.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Size};
use smallvec::SmallVec;

use crate::layout::{LayoutContext, LayoutPolicy};
use crate::{Axis, ElementKey, IndexPath, SupplementaryKind};

#[derive(Clone, Debug)]
struct SectionGeometry {
    frame: Rect,
    items: Vec<Rect>,
    supplementary: SmallVec<[(SupplementaryKind, Rect); 2]>,
}

/// Rectangles computed by a [`LayoutPolicy`], keyed by logical index.
///
/// After [`GeometryCache::rebuild`], every item that exists under the counts
/// of that pass has exactly one rectangle, and no other item has one. Lookups
/// are O(1); spatial queries binary-search the section and item sequences
/// along the layout's scroll axis.
#[derive(Clone, Debug, Default)]
pub struct GeometryCache {
    axis: Axis,
    sections: Vec<SectionGeometry>,
    content_size: Size,
}

impl GeometryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes all geometry from `layout` for the counts in `cx`.
    ///
    /// Items for which the layout reports no rect receive a zero rect and a
    /// warning is logged. Negative sizes are normalized.
    pub fn rebuild(&mut self, layout: &mut dyn LayoutPolicy, cx: &LayoutContext<'_>) {
        layout.prepare(cx);
        self.axis = layout.scroll_axis();

        let mut sections = Vec::with_capacity(cx.counts.section_count());
        let mut previous_end = 0.0;
        for (section, &count) in cx.counts.as_slice().iter().enumerate() {
            let mut items = Vec::with_capacity(count);
            for item in 0..count {
                let index_path = IndexPath::new(section, item);
                let rect = match layout.item_rect(cx, index_path) {
                    Some(rect) => rect.abs(),
                    None => {
                        log::warn!(
                            "layout returned no rect for item {index_path}; using a zero rect"
                        );
                        Rect::ZERO
                    }
                };
                items.push(rect);
            }

            let supplementary: SmallVec<[(SupplementaryKind, Rect); 2]> = cx
                .supplementary_kinds
                .iter()
                .filter_map(|&kind| {
                    layout
                        .supplementary_rect(cx, kind, section)
                        .map(|rect| (kind, rect.abs()))
                })
                .collect();

            let frame = layout
                .section_rect(cx, section)
                .map(|rect| rect.abs())
                .or_else(|| {
                    items
                        .iter()
                        .copied()
                        .chain(supplementary.iter().map(|(_, rect)| *rect))
                        .reduce(|acc, rect| acc.union(rect))
                })
                .unwrap_or_else(|| match self.axis {
                    Axis::Vertical => Rect::new(0.0, previous_end, 0.0, previous_end),
                    Axis::Horizontal => Rect::new(previous_end, 0.0, previous_end, 0.0),
                });
            previous_end = axis_max(self.axis, frame);

            sections.push(SectionGeometry {
                frame,
                items,
                supplementary,
            });
        }

        self.content_size = layout.content_size(cx).unwrap_or_else(|| {
            sections
                .iter()
                .map(|s| s.frame)
                .reduce(|acc, rect| acc.union(rect))
                .map_or(Size::ZERO, |rect| Size::new(rect.x1.max(0.0), rect.y1.max(0.0)))
        });
        self.sections = sections;
    }

    /// Drops all geometry.
    pub fn clear(&mut self) {
        self.sections.clear();
        self.content_size = Size::ZERO;
    }

    /// Scroll axis reported by the layout of the last pass.
    #[must_use]
    pub const fn axis(&self) -> Axis {
        self.axis
    }

    /// Number of sections with geometry.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Total content size.
    #[must_use]
    pub const fn content_size(&self) -> Size {
        self.content_size
    }

    /// Rectangle of an item.
    #[must_use]
    pub fn rect_for_item(&self, index_path: IndexPath) -> Option<Rect> {
        self.sections
            .get(index_path.section)?
            .items
            .get(index_path.item)
            .copied()
    }

    /// Frame of a section.
    #[must_use]
    pub fn rect_for_section(&self, section: usize) -> Option<Rect> {
        self.sections.get(section).map(|s| s.frame)
    }

    /// Rectangle of a supplementary view.
    #[must_use]
    pub fn rect_for_supplementary(&self, kind: SupplementaryKind, section: usize) -> Option<Rect> {
        self.sections
            .get(section)?
            .supplementary
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, rect)| *rect)
    }

    /// Rectangle of any element.
    #[must_use]
    pub fn rect_for_element(&self, key: ElementKey) -> Option<Rect> {
        match key {
            ElementKey::Item(index_path) => self.rect_for_item(index_path),
            ElementKey::Supplementary(kind, section) => self.rect_for_supplementary(kind, section),
        }
    }

    /// Sections whose frame intersects `rect`, ascending.
    #[must_use]
    pub fn sections_in_rect(&self, rect: Rect) -> Vec<usize> {
        self.candidate_sections(rect)
            .filter(|&section| overlaps(self.sections[section].frame, rect))
            .collect()
    }

    /// Items whose rect intersects `rect`, ascending.
    #[must_use]
    pub fn index_paths_in_rect(&self, rect: Rect) -> Vec<IndexPath> {
        let mut out = Vec::new();
        for section in self.candidate_sections(rect) {
            self.push_items_in_rect(section, rect, &mut out);
        }
        out
    }

    /// Items and supplementary views whose rect intersects `rect`, ascending
    /// by [`ElementKey`] order.
    #[must_use]
    pub fn elements_in_rect(&self, rect: Rect) -> Vec<ElementKey> {
        let mut out = Vec::new();
        let mut items = Vec::new();
        for section in self.candidate_sections(rect) {
            let mut supplementary: SmallVec<[SupplementaryKind; 2]> = self.sections[section]
                .supplementary
                .iter()
                .filter(|(_, r)| overlaps(*r, rect))
                .map(|(kind, _)| *kind)
                .collect();
            supplementary.sort();
            out.extend(
                supplementary
                    .into_iter()
                    .map(|kind| ElementKey::Supplementary(kind, section)),
            );

            items.clear();
            self.push_items_in_rect(section, rect, &mut items);
            out.extend(items.iter().copied().map(ElementKey::Item));
        }
        out
    }

    /// The item whose rect contains `point`, if any.
    #[must_use]
    pub fn index_path_at_point(&self, point: Point) -> Option<IndexPath> {
        let probe = Rect::from_points(point, point);
        self.candidate_sections_inclusive(probe)
            .find_map(|section| {
                let items = &self.sections[section].items;
                let lo = axis_min_point(self.axis, point);
                let start = items.partition_point(|r| axis_max(self.axis, *r) <= lo);
                items[start..]
                    .iter()
                    .take_while(|r| axis_min(self.axis, **r) <= lo)
                    .position(|r| contains(*r, point))
                    .map(|offset| IndexPath::new(section, start + offset))
            })
    }

    fn candidate_sections(&self, rect: Rect) -> impl Iterator<Item = usize> + '_ {
        let lo = axis_min(self.axis, rect);
        let hi = axis_max(self.axis, rect);
        let start = self
            .sections
            .partition_point(|s| axis_max(self.axis, s.frame) <= lo);
        (start..self.sections.len())
            .take_while(move |&section| axis_min(self.axis, self.sections[section].frame) < hi)
    }

    fn candidate_sections_inclusive(&self, rect: Rect) -> impl Iterator<Item = usize> + '_ {
        let lo = axis_min(self.axis, rect);
        let start = self
            .sections
            .partition_point(|s| axis_max(self.axis, s.frame) <= lo);
        (start..self.sections.len())
            .take_while(move |&section| axis_min(self.axis, self.sections[section].frame) <= lo)
    }

    fn push_items_in_rect(&self, section: usize, rect: Rect, out: &mut Vec<IndexPath>) {
        let items = &self.sections[section].items;
        let lo = axis_min(self.axis, rect);
        let hi = axis_max(self.axis, rect);
        let start = items.partition_point(|r| axis_max(self.axis, *r) <= lo);
        out.extend(
            items[start..]
                .iter()
                .take_while(|r| axis_min(self.axis, **r) < hi)
                .enumerate()
                .filter(|(_, r)| overlaps(**r, rect))
                .map(|(offset, _)| IndexPath::new(section, start + offset)),
        );
    }
}

/// Open-interval overlap: rects that only share an edge do not intersect, and
/// empty rects intersect nothing.
pub(crate) fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

fn contains(r: Rect, p: Point) -> bool {
    r.x0 <= p.x && p.x < r.x1 && r.y0 <= p.y && p.y < r.y1
}

pub(crate) fn axis_min(axis: Axis, r: Rect) -> f64 {
    match axis {
        Axis::Vertical => r.y0,
        Axis::Horizontal => r.x0,
    }
}

pub(crate) fn axis_max(axis: Axis, r: Rect) -> f64 {
    match axis {
        Axis::Vertical => r.y1,
        Axis::Horizontal => r.x1,
    }
}

fn axis_min_point(axis: Axis, p: Point) -> f64 {
    match axis {
        Axis::Vertical => p.y,
        Axis::Horizontal => p.x,
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use kurbo::{Point, Rect, Size};

    use super::GeometryCache;
    use crate::layout::{LayoutContext, LayoutPolicy, ListLayout};
    use crate::{ElementKey, IndexPath, ItemCounts, SupplementaryKind};

    fn list_cache(counts: &ItemCounts, kinds: &[SupplementaryKind]) -> GeometryCache {
        let cx = LayoutContext {
            counts,
            supplementary_kinds: kinds,
            viewport_size: Size::new(100.0, 50.0),
        };
        let mut layout = ListLayout::new(20.0).with_header_height(10.0);
        let mut cache = GeometryCache::new();
        cache.rebuild(&mut layout, &cx);
        cache
    }

    /// Places item 1 nowhere, everything else in a column.
    struct Gappy;

    impl LayoutPolicy for Gappy {
        fn item_rect(&self, _cx: &LayoutContext<'_>, index_path: IndexPath) -> Option<Rect> {
            if index_path.item == 1 {
                return None;
            }
            let y = index_path.item as f64 * 10.0;
            Some(Rect::new(0.0, y + 10.0, 10.0, y))
        }
    }

    #[test]
    fn geometry_is_total_for_current_counts() {
        let counts = ItemCounts::new(vec![3, 2]);
        let cache = list_cache(&counts, &[]);
        for ip in counts.index_paths() {
            assert!(cache.rect_for_item(ip).is_some(), "missing {ip}");
        }
        assert_eq!(cache.rect_for_item(IndexPath::new(0, 3)), None);
        assert_eq!(cache.rect_for_item(IndexPath::new(2, 0)), None);
        assert_eq!(cache.content_size(), Size::new(100.0, 100.0));
    }

    #[test]
    fn missing_rects_fall_back_to_zero_and_sizes_are_normalized() {
        let counts = ItemCounts::new(vec![3]);
        let cx = LayoutContext {
            counts: &counts,
            supplementary_kinds: &[],
            viewport_size: Size::new(10.0, 10.0),
        };
        let mut cache = GeometryCache::new();
        cache.rebuild(&mut Gappy, &cx);
        assert_eq!(cache.rect_for_item(IndexPath::new(0, 1)), Some(Rect::ZERO));
        assert_eq!(
            cache.rect_for_item(IndexPath::new(0, 2)),
            Some(Rect::new(0.0, 20.0, 10.0, 30.0))
        );
        // Default section frame is the union of its items.
        assert_eq!(cache.rect_for_section(0), Some(Rect::new(0.0, 0.0, 10.0, 30.0)));
    }

    #[test]
    fn rect_queries_exclude_edge_touching_items() {
        let counts = ItemCounts::new(vec![5]);
        let cache = list_cache(&counts, &[]);
        let hits = cache.index_paths_in_rect(Rect::new(0.0, 20.0, 100.0, 60.0));
        assert_eq!(hits, vec![IndexPath::new(0, 1), IndexPath::new(0, 2)]);

        let hits = cache.index_paths_in_rect(Rect::new(0.0, 25.0, 100.0, 45.0));
        assert_eq!(hits, vec![IndexPath::new(0, 1), IndexPath::new(0, 2)]);

        assert!(cache.index_paths_in_rect(Rect::new(0.0, 200.0, 100.0, 300.0)).is_empty());
    }

    #[test]
    fn elements_in_rect_span_sections_with_headers_first() {
        let counts = ItemCounts::new(vec![2, 2]);
        let cache = list_cache(&counts, &[SupplementaryKind::HEADER]);
        // Section 0: header 0..10, items 10..30, 30..50. Section 1: header 50..60, items 60..80, 80..100.
        let keys = cache.elements_in_rect(Rect::new(0.0, 35.0, 100.0, 65.0));
        assert_eq!(
            keys,
            vec![
                ElementKey::Item(IndexPath::new(0, 1)),
                ElementKey::Supplementary(SupplementaryKind::HEADER, 1),
                ElementKey::Item(IndexPath::new(1, 0)),
            ]
        );
        assert_eq!(cache.sections_in_rect(Rect::new(0.0, 35.0, 100.0, 65.0)), vec![0, 1]);
        let sections: Vec<_> = cache.sections_in_rect(Rect::new(0.0, 50.0, 100.0, 51.0));
        assert_eq!(sections, vec![1]);
    }

    #[test]
    fn point_lookup_finds_containing_item() {
        let counts = ItemCounts::new(vec![2, 2]);
        let cache = list_cache(&counts, &[SupplementaryKind::HEADER]);
        assert_eq!(
            cache.index_path_at_point(Point::new(5.0, 62.0)),
            Some(IndexPath::new(1, 0))
        );
        assert_eq!(
            cache.index_path_at_point(Point::new(5.0, 30.0)),
            Some(IndexPath::new(0, 1))
        );
        // Header area is not an item.
        assert_eq!(cache.index_path_at_point(Point::new(5.0, 55.0)), None);
        assert_eq!(cache.index_path_at_point(Point::new(5.0, 500.0)), None);
    }
}
