// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property store of the currently published model.
//!
//! The selection consumer reads element properties from here. Each upload
//! swaps in its own table once its tree is published; a table from an older
//! generation never replaces a newer one.

use ifc_lite_tree::{ElementId, Generation, Properties, PropertyFetch, PropertyTable, Result};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct ModelProperties {
    current: RwLock<(Generation, Arc<PropertyTable>)>,
}

impl ModelProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the table for `generation`. Returns false if a newer table is
    /// already installed.
    pub async fn replace(&self, generation: Generation, table: Arc<PropertyTable>) -> bool {
        let mut current = self.current.write().await;
        if current.0 > generation {
            tracing::debug!(
                generation = generation.0,
                installed = current.0 .0,
                "Keeping properties of newer model"
            );
            return false;
        }
        *current = (generation, table);
        true
    }

    async fn table(&self) -> Arc<PropertyTable> {
        Arc::clone(&self.current.read().await.1)
    }
}

impl PropertyFetch for ModelProperties {
    async fn fetch(&self, id: ElementId) -> Result<Properties> {
        let table = self.table().await;
        table.fetch(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn table(name: &str) -> Arc<PropertyTable> {
        let Value::Object(props) = json!({ "Name": { "value": name } }) else {
            unreachable!()
        };
        Arc::new([(3, props)].into_iter().collect())
    }

    #[tokio::test]
    async fn older_generation_does_not_replace_newer() {
        let store = ModelProperties::new();
        assert!(store.replace(Generation(2), table("New")).await);
        assert!(!store.replace(Generation(1), table("Old")).await);

        let props = store.fetch(3).await.unwrap();
        assert_eq!(props["Name"]["value"], "New");
    }

    #[tokio::test]
    async fn empty_store_misses() {
        assert!(ModelProperties::new().fetch(3).await.is_err());
    }
}
