// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Load session: runs resolve -> build for each model load and publishes the
//! newest tree.
//!
//! Every load is tagged with a monotonically increasing [`Generation`]. When
//! a newer load starts while an older one is still resolving names, the older
//! result is dropped on arrival instead of being published. Publication takes
//! a write lock and re-checks the generation, so rebuilds never interleave.

use crate::builder::build_tree;
use crate::config::TreeConfig;
use crate::filter::filter_tree;
use crate::names::{resolve_names, PropertyFetch};
use crate::node::TreeNode;
use crate::snapshot::Classification;
use serde::Serialize;
use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Model load generation. Later loads have larger generations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Generation(pub u64);

/// A tree published for one generation.
#[derive(Debug, Clone)]
pub struct PublishedTree {
    pub generation: Generation,
    pub tree: Arc<TreeNode>,
}

/// Search over the published tree. `tree` is `None` when nothing matched.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub generation: Generation,
    pub tree: Option<Arc<TreeNode>>,
}

/// Owner of the current model's tree.
#[derive(Debug)]
pub struct TreeSession {
    config: TreeConfig,
    generation: AtomicU64,
    published: RwLock<Option<PublishedTree>>,
}

impl TreeSession {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            generation: AtomicU64::new(0),
            published: RwLock::new(None),
        }
    }

    /// Start a new load, superseding any load still in flight.
    pub fn begin_load(&self) -> Generation {
        Generation(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Generation of the most recently started load.
    pub fn latest(&self) -> Generation {
        Generation(self.generation.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.latest() == generation
    }

    /// Resolve names and build the tree for a new model.
    ///
    /// Returns `None` if another load started before this one finished.
    pub async fn load<F: PropertyFetch>(
        &self,
        classification: &Classification,
        fetch: &F,
    ) -> Option<PublishedTree> {
        let generation = self.begin_load();
        self.load_as(generation, classification, fetch).await
    }

    /// Like [`load`](Self::load) for a generation obtained from
    /// [`begin_load`](Self::begin_load).
    pub async fn load_as<F: PropertyFetch>(
        &self,
        generation: Generation,
        classification: &Classification,
        fetch: &F,
    ) -> Option<PublishedTree> {
        tracing::info!(
            generation = generation.0,
            kind = classification.kind(),
            "Loading model tree"
        );

        let names = resolve_names(
            fetch,
            classification.element_ids(),
            self.config.name_batch_size,
        )
        .await;

        if !self.is_current(generation) {
            tracing::debug!(
                generation = generation.0,
                latest = self.latest().0,
                "Discarding names for superseded load"
            );
            return None;
        }

        let tree = Arc::new(build_tree(classification, &names, &self.config));
        self.publish(generation, tree).await
    }

    /// Publish a tree if `generation` is still the latest load.
    pub async fn publish(&self, generation: Generation, tree: Arc<TreeNode>) -> Option<PublishedTree> {
        let mut published = self.published.write().await;
        if !self.is_current(generation) {
            tracing::debug!(generation = generation.0, "Discarding tree for superseded load");
            return None;
        }

        let entry = PublishedTree { generation, tree };
        *published = Some(entry.clone());
        tracing::info!(generation = generation.0, nodes = entry.tree.len(), "Published model tree");
        Some(entry)
    }

    /// The published tree, if any model has loaded.
    pub async fn current(&self) -> Option<PublishedTree> {
        self.published.read().await.clone()
    }

    /// Filter the published tree. `None` if no model has loaded.
    pub async fn search(&self, query: &str) -> Option<SearchResult> {
        let current = self.current().await?;
        let tree = match filter_tree(&current.tree, query) {
            Some(Cow::Borrowed(_)) => Some(Arc::clone(&current.tree)),
            Some(Cow::Owned(filtered)) => Some(Arc::new(filtered)),
            None => None,
        };
        Some(SearchResult {
            generation: current.generation,
            tree,
        })
    }

    /// Drop the published tree and supersede loads in flight.
    pub async fn reset(&self) {
        let mut published = self.published.write().await;
        self.begin_load();
        *published = None;
    }
}

impl Default for TreeSession {
    fn default() -> Self {
        Self::new(TreeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::PropertyTable;
    use crate::snapshot::EntityGroup;

    fn entity_only() -> Classification {
        Classification::from_provider(Ok(()), vec![], vec![EntityGroup::new("IFCWALL", [7, 8])])
    }

    #[tokio::test]
    async fn load_publishes_and_search_filters() {
        let session = TreeSession::default();
        let published = session
            .load(&entity_only(), &PropertyTable::new())
            .await
            .unwrap();
        assert_eq!(published.generation, Generation(1));

        let all = session.search("").await.unwrap();
        assert!(Arc::ptr_eq(all.tree.as_ref().unwrap(), &published.tree));

        let hit = session.search("element 8").await.unwrap().tree.unwrap();
        assert_eq!(hit.children[0].children.len(), 1);

        assert!(session.search("door").await.unwrap().tree.is_none());
    }

    #[tokio::test]
    async fn stale_publish_is_rejected() {
        let session = TreeSession::default();
        let old = session.begin_load();
        let new = session.begin_load();

        let tree = Arc::new(TreeNode::synthetic(0, "Project", None));
        assert!(session.publish(old, tree.clone()).await.is_none());
        assert!(session.publish(new, tree).await.is_some());
        assert_eq!(session.current().await.unwrap().generation, new);
    }

    #[tokio::test]
    async fn reset_clears_tree() {
        let session = TreeSession::default();
        session.load(&entity_only(), &PropertyTable::new()).await.unwrap();
        session.reset().await;
        assert!(session.current().await.is_none());
        assert!(session.search("").await.is_none());
    }
}
