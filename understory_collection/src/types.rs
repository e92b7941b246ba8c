// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public identifier types: kinds, reuse identifiers, registrations, and element keys.

use core::cmp::Ordering;
use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

use crate::IndexPath;

/// Label for a supplementary view role, such as a section header or footer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SupplementaryKind(pub &'static str);

impl SupplementaryKind {
    /// Section header.
    pub const HEADER: Self = Self("header");
    /// Section footer.
    pub const FOOTER: Self = Self("footer");
}

impl fmt::Display for SupplementaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Caller-assigned tag distinguishing view templates within one kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReuseIdentifier(pub &'static str);

impl fmt::Display for ReuseIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Whether a view is an ordinary cell or a supplementary view of some kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ViewKind {
    /// An item cell.
    Cell,
    /// A supplementary view of the given kind.
    Supplementary(SupplementaryKind),
}

/// Host-defined view class handle.
///
/// The host owns the mapping from classes to concrete view construction; the
/// core only compares classes for equality when recycling.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ViewClass(pub u64);

impl ViewClass {
    /// Class used for cells dequeued under an unregistered identifier.
    pub const BASE: Self = Self(0);
}

/// Host-defined handle to a view template (an archived view description).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TemplateId(pub u64);

/// How views for one `(kind, identifier)` pair are constructed.
///
/// Class and template registrations are mutually exclusive: registering one
/// replaces the other.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Registration {
    /// Instantiate a view class.
    Class(ViewClass),
    /// Instantiate from a template.
    Template(TemplateId),
}

impl Registration {
    /// Registration used for cells whose identifier was never registered.
    pub const BASE_CELL: Self = Self::Class(ViewClass::BASE);
}

/// Key of a displayable element: an item or a `(kind, section)` supplementary view.
///
/// Keys sort by section first. Within a section, supplementary views precede
/// items, and items follow ascending item order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementKey {
    /// An item cell.
    Item(IndexPath),
    /// A supplementary view of `kind` in `section`.
    Supplementary(SupplementaryKind, usize),
}

impl ElementKey {
    /// Section containing this element.
    #[must_use]
    pub const fn section(&self) -> usize {
        match self {
            Self::Item(ip) => ip.section,
            Self::Supplementary(_, section) => *section,
        }
    }

    /// Index path for item keys.
    #[must_use]
    pub const fn index_path(&self) -> Option<IndexPath> {
        match self {
            Self::Item(ip) => Some(*ip),
            Self::Supplementary(..) => None,
        }
    }

    /// View kind this key is displayed with.
    #[must_use]
    pub const fn view_kind(&self) -> ViewKind {
        match self {
            Self::Item(_) => ViewKind::Cell,
            Self::Supplementary(kind, _) => ViewKind::Supplementary(*kind),
        }
    }
}

impl Ord for ElementKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.section()
            .cmp(&other.section())
            .then_with(|| match (self, other) {
                (Self::Supplementary(a, _), Self::Supplementary(b, _)) => a.cmp(b),
                (Self::Supplementary(..), Self::Item(_)) => Ordering::Less,
                (Self::Item(_), Self::Supplementary(..)) => Ordering::Greater,
                (Self::Item(a), Self::Item(b)) => a.item.cmp(&b.item),
            })
    }
}

impl PartialOrd for ElementKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Identity of one presentation surface.
///
/// View slots carry the id of the surface that produced them instead of a
/// back-pointer; pools and layouts are never shared between surfaces.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(u32);

impl SurfaceId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

/// Primary scroll axis of a layout.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Content grows downward; sections stack along y.
    #[default]
    Vertical,
    /// Content grows rightward; sections stack along x.
    Horizontal,
}
