// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fault taxonomy for the collection core.

use thiserror::Error;

use crate::{ElementKey, IndexPath, SurfaceId};

/// Programmer error in how the surface or its collaborators are set up.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigurationFault {
    /// An operation needing geometry ran before a layout was installed.
    #[error("no layout has been set on the collection view")]
    LayoutNotSet,
    /// The data source returned a view that was not dequeued as a cell.
    #[error("data source returned a non-cell view for item {index_path}")]
    IncompatibleCell {
        /// Item the view was requested for.
        index_path: IndexPath,
    },
    /// The data source returned a view of the wrong kind for a supplementary element.
    #[error("data source returned a view of the wrong kind for {key:?}")]
    IncompatibleView {
        /// Element the view was requested for.
        key: ElementKey,
    },
    /// A view slot produced by another surface was handed to this one.
    #[error("view slot belongs to surface {owner:?}, not {surface:?}")]
    ForeignView {
        /// Surface that produced the slot.
        owner: SurfaceId,
        /// Surface the slot was handed to.
        surface: SurfaceId,
    },
}

/// Malformed batch of updates. The whole transaction is discarded.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationFault {
    /// The same path is targeted by operations of conflicting kinds.
    #[error("conflicting updates target {index_path}")]
    ConflictingUpdate {
        /// Offending path (section-only for section operations).
        index_path: IndexPath,
    },
    /// A delete or reload names an item that does not exist before the
    /// update, or an insert names one past the end after it.
    #[error("update targets item {index_path}, which is out of range")]
    ItemOutOfRange {
        /// Offending path.
        index_path: IndexPath,
    },
    /// A section operation names a section that is out of range.
    #[error("update targets section {section}, which is out of range")]
    SectionOutOfRange {
        /// Offending section.
        section: usize,
    },
    /// `end_updates` was called without a matching `begin_updates`.
    #[error("end_updates called without a matching begin_updates")]
    UnbalancedEndUpdates,
}

/// The data source's post-update counts disagree with the applied operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConsistencyFault {
    /// Reported section count differs from the count implied by the updates.
    #[error("expected {expected} sections after update, data source reports {reported}")]
    SectionCount {
        /// Count implied by the updates.
        expected: usize,
        /// Count reported by the data source.
        reported: usize,
    },
    /// Reported item count for a section differs from the implied count.
    #[error("expected {expected} items in section {section} after update, data source reports {reported}")]
    ItemCount {
        /// Section (post-update numbering).
        section: usize,
        /// Count implied by the updates.
        expected: usize,
        /// Count reported by the data source.
        reported: usize,
    },
}

/// Errors surfaced by collection view operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// Fatal setup error.
    #[error("configuration fault: {0}")]
    Configuration(#[from] ConfigurationFault),
    /// Rejected batch update; prior state is unchanged.
    #[error("invalid update: {0}")]
    InvalidUpdate(#[from] ValidationFault),
    /// Fatal disagreement between the data source and the applied updates.
    #[error("data source inconsistency: {0}")]
    Consistency(#[from] ConsistencyFault),
}
