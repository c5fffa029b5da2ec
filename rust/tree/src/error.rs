// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for classification, tree building and name resolution.

use crate::snapshot::{ElementId, GroupId};

/// Result type alias for tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning a classification into a tree.
///
/// None of these reach the renderer: the builder degrades through its
/// fallback ladder and the name resolver substitutes placeholders.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Relation indexing did not complete before spatial grouping was requested.
    #[error("relation indexing failed: {0}")]
    Indexing(String),

    /// The classifier produced nothing usable.
    #[error("classification failed: {0}")]
    Classification(String),

    /// Spatial groups contain each other.
    #[error("spatial nesting cycle: group #{child} is an ancestor of group #{parent}")]
    NestingCycle { parent: GroupId, child: GroupId },

    /// The entity-only fallback had no entity groups to work with.
    #[error("no entity groups to build categories from")]
    NoEntityGroups,

    /// A per-element property fetch failed.
    #[error("property fetch failed for element #{id}: {reason}")]
    NameFetch { id: ElementId, reason: String },

    /// The selection consumer has gone away.
    #[error("selection channel closed")]
    Channel,
}
