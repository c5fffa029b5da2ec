// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Selection channel between the tree renderer and the property panel.
//!
//! Any number of [`Selector`]s send element ids; exactly one
//! [`SelectionConsumer`] applies them in order, updating the highlighted
//! element and fetching its properties. Observers read the resulting
//! [`SelectionState`] from a watch channel.

use crate::error::{Error, Result};
use crate::names::{Properties, PropertyFetch};
use crate::node::TreeNode;
use crate::snapshot::ElementId;
use serde::Serialize;
use tokio::sync::{mpsc, watch};

/// Request sent over the selection channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    Select(ElementId),
    Clear,
}

/// Highlight and property-panel state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub highlighted: Option<ElementId>,
    pub properties: Option<Properties>,
}

/// Sending half of the selection channel.
#[derive(Debug, Clone)]
pub struct Selector {
    tx: mpsc::UnboundedSender<SelectionEvent>,
}

impl Selector {
    /// Request selection of an element. Id 0 is not an element and is ignored.
    pub fn select(&self, id: ElementId) -> Result<bool> {
        if id == 0 {
            return Ok(false);
        }
        self.send(SelectionEvent::Select(id))?;
        Ok(true)
    }

    /// Request selection of a clicked tree node. Synthetic nodes are ignored.
    pub fn select_node(&self, node: &TreeNode) -> Result<bool> {
        match node.selectable() {
            Some(id) => self.select(id),
            None => Ok(false),
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.send(SelectionEvent::Clear)
    }

    fn send(&self, event: SelectionEvent) -> Result<()> {
        self.tx.send(event).map_err(|_| Error::Channel)
    }
}

/// Receiving half: the single consumer of selection events.
#[derive(Debug)]
pub struct SelectionConsumer {
    rx: mpsc::UnboundedReceiver<SelectionEvent>,
    state: watch::Sender<SelectionState>,
}

/// Create a selection channel.
pub fn selection_channel() -> (Selector, SelectionConsumer, watch::Receiver<SelectionState>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (state, observer) = watch::channel(SelectionState::default());
    (Selector { tx }, SelectionConsumer { rx, state }, observer)
}

impl SelectionConsumer {
    /// Apply events until every [`Selector`] is dropped.
    pub async fn run<F: PropertyFetch>(mut self, fetch: F) {
        while let Some(event) = self.rx.recv().await {
            self.apply(event, &fetch).await;
        }
        tracing::debug!("Selection channel closed");
    }

    async fn apply<F: PropertyFetch>(&self, event: SelectionEvent, fetch: &F) {
        match event {
            SelectionEvent::Clear => {
                self.state.send_replace(SelectionState::default());
            }
            SelectionEvent::Select(id) => {
                self.state.send_replace(SelectionState {
                    highlighted: Some(id),
                    properties: None,
                });
                match fetch.fetch(id).await {
                    Ok(properties) => {
                        self.state.send_modify(|state| {
                            if state.highlighted == Some(id) {
                                state.properties = Some(properties);
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!(element_id = id, error = %e, "Could not load properties for selection");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::PropertyTable;
    use serde_json::{json, Value};

    fn table() -> PropertyTable {
        let Value::Object(props) = json!({ "Name": { "value": "Entrance" } }) else {
            unreachable!()
        };
        [(3, props)].into_iter().collect()
    }

    #[tokio::test]
    async fn selecting_a_leaf_highlights_and_loads_properties() {
        let (selector, consumer, mut observer) = selection_channel();
        let task = tokio::spawn(consumer.run(table()));

        let leaf = TreeNode::element(3, "Entrance", Some("Door".into()));
        assert!(selector.select_node(&leaf).unwrap());

        let state = observer
            .wait_for(|s| s.properties.is_some())
            .await
            .unwrap()
            .clone();
        assert_eq!(state.highlighted, Some(3));
        assert_eq!(state.properties.unwrap()["Name"]["value"], "Entrance");

        selector.clear().unwrap();
        observer.wait_for(|s| s.highlighted.is_none()).await.unwrap();

        drop(selector);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn synthetic_nodes_are_inert() {
        let (selector, _consumer, observer) = selection_channel();
        let header = TreeNode::synthetic(-41, "Walls (2)", Some("WallGroup".into()));
        assert!(!selector.select_node(&header).unwrap());
        assert!(!selector.select(0).unwrap());
        assert_eq!(*observer.borrow(), SelectionState::default());
    }

    #[tokio::test]
    async fn failed_fetch_keeps_highlight_without_properties() {
        let (selector, consumer, mut observer) = selection_channel();
        let task = tokio::spawn(consumer.run(table()));

        selector.select(99).unwrap();
        drop(selector);
        task.await.unwrap();

        let state = observer.borrow_and_update().clone();
        assert_eq!(state.highlighted, Some(99));
        assert!(state.properties.is_none());
    }

    #[test]
    fn sending_without_consumer_fails() {
        let (selector, consumer, _observer) = selection_channel();
        drop(consumer);
        assert_eq!(selector.select(5), Err(Error::Channel));
    }
}
