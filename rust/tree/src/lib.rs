// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-Lite Tree
//!
//! Model structure tree for IFC viewers.
//!
//! A classifier reports a loaded model twice: elements grouped by spatial
//! container and elements grouped by entity type. This crate merges the two
//! into one deduplicated, correctly nested tree for display:
//!
//! ```text
//! Project
//! └── Building
//!     └── Storey
//!         ├── Doors (1)
//!         │   └── Entrance
//!         └── Walls (1)
//!             └── Basic Wall
//! ```
//!
//! ## Overview
//!
//! - **Snapshot**: [`Classification`] is the tagged, immutable input
//!   (spatial, entity-only, or failed).
//! - **Names**: [`resolve_names`] fetches display names in bounded chunks.
//! - **Builder**: [`build_tree`] nests spatial groups, groups elements by type
//!   and falls back to flat categories when the hierarchy is unusable.
//! - **Filter**: [`filter_tree`] keeps matches and their ancestor paths.
//! - **Selection**: [`selection_channel`] carries clicked element ids to a
//!   single consumer that owns highlight and property-panel state.
//! - **Session**: [`TreeSession`] tags loads with generations and drops stale
//!   results.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_lite_tree::{Classification, EntityGroup, PropertyTable, SpatialGroup, TreeSession};
//!
//! let classification = Classification::from_provider(
//!     Ok(()),
//!     vec![SpatialGroup::new("Level 1", 10).with_fragment("f1", [2, 3])],
//!     vec![EntityGroup::new("IFCWALL", [2]), EntityGroup::new("IFCDOOR", [3])],
//! );
//!
//! let session = TreeSession::default();
//! let published = session.load(&classification, &PropertyTable::new()).await;
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod filter;
pub mod labels;
pub mod names;
pub mod node;
pub mod selection;
pub mod session;
pub mod snapshot;

pub use builder::{build_entity_tree, build_spatial_tree, build_tree, error_tree, ERROR_NODE_NAME};
pub use config::{NestingPolicy, TreeConfig, DEFAULT_NAME_BATCH_SIZE};
pub use error::{Error, Result};
pub use filter::filter_tree;
pub use names::{
    display_name, placeholder_name, resolve_names, NameMap, Properties, PropertyFetch,
    PropertyTable,
};
pub use node::TreeNode;
pub use selection::{selection_channel, SelectionConsumer, SelectionEvent, SelectionState, Selector};
pub use session::{Generation, PublishedTree, SearchResult, TreeSession};
pub use snapshot::{
    entity_groups_from_raw, spatial_groups_from_raw, Classification, ClassificationSnapshot,
    ElementId, EntityGroup, FragmentMap, GroupId, NamedGroups, RawEntityGroup, RawSpatialGroup,
    SpatialGroup,
};
