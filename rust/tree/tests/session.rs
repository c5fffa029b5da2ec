// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reload races between overlapping model loads.

use ifc_lite_tree::{
    Classification, ElementId, EntityGroup, Generation, Properties, PropertyFetch, PropertyTable,
    TreeSession,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Property source that blocks until its gate opens.
struct GatedFetch {
    gate: watch::Receiver<bool>,
}

impl PropertyFetch for GatedFetch {
    async fn fetch(&self, _id: ElementId) -> ifc_lite_tree::Result<Properties> {
        let mut gate = self.gate.clone();
        let _ = gate.wait_for(|open| *open).await;
        Ok(Properties::new())
    }
}

fn model(type_name: &str, ids: &[ElementId]) -> Classification {
    Classification::from_provider(
        Ok(()),
        vec![],
        vec![EntityGroup::new(type_name, ids.iter().copied())],
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn superseded_load_is_discarded() {
    let session = Arc::new(TreeSession::default());
    let (open, gate) = watch::channel(false);

    let first = {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            let fetch = GatedFetch { gate };
            session.load(&model("IFCWALL", &[1, 2]), &fetch).await
        })
    };

    tokio::time::timeout(Duration::from_secs(5), async {
        while session.latest() < Generation(1) {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    let second = session
        .load(&model("IFCDOOR", &[7]), &PropertyTable::new())
        .await
        .unwrap();
    assert_eq!(second.generation, Generation(2));

    open.send(true).unwrap();
    assert!(first.await.unwrap().is_none());

    let current = session.current().await.unwrap();
    assert_eq!(current.generation, Generation(2));
    assert_eq!(current.tree.children[0].name, "Doors");
}

#[tokio::test]
async fn reload_replaces_tree() {
    let session = TreeSession::default();
    let table = PropertyTable::new();

    session.load(&model("IFCWALL", &[1]), &table).await.unwrap();
    let reloaded = session.load(&model("IFCSLAB", &[5]), &table).await.unwrap();

    assert_eq!(reloaded.generation, Generation(2));
    assert!(session.search("wall").await.unwrap().tree.is_none());
    assert!(session.search("slab").await.unwrap().tree.is_some());
}
