// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Name resolution: display names for element ids from their properties.
//!
//! Property fetches are asynchronous and may fail individually. Ids are
//! fetched in fixed-size chunks: every fetch in a chunk runs concurrently,
//! chunks run one after another, so at most `batch_size` requests are
//! outstanding. A failed fetch only costs that element its name.

use crate::error::{Error, Result};
use crate::snapshot::ElementId;
use futures_util::future::join_all;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Property mapping of one element: attribute name -> `{ value, ... }`.
pub type Properties = serde_json::Map<String, Value>;

/// Source of per-element properties.
pub trait PropertyFetch {
    /// Fetch the properties of one element.
    fn fetch(&self, id: ElementId) -> impl Future<Output = Result<Properties>> + Send;
}

impl<T: PropertyFetch + Send + Sync> PropertyFetch for Arc<T> {
    fn fetch(&self, id: ElementId) -> impl Future<Output = Result<Properties>> + Send {
        (**self).fetch(id)
    }
}

/// In-memory property source keyed by express id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyTable {
    entries: FxHashMap<ElementId, Properties>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ElementId, properties: Properties) {
        self.entries.insert(id, properties);
    }

    pub fn get(&self, id: ElementId) -> Option<&Properties> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(ElementId, Properties)> for PropertyTable {
    fn from_iter<I: IntoIterator<Item = (ElementId, Properties)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl PropertyFetch for PropertyTable {
    async fn fetch(&self, id: ElementId) -> Result<Properties> {
        self.entries.get(&id).cloned().ok_or_else(|| Error::NameFetch {
            id,
            reason: "no properties recorded".to_string(),
        })
    }
}

/// Placeholder label for an element without a resolved name.
pub fn placeholder_name(id: ElementId) -> String {
    format!("Element {}", id)
}

/// Display name from a property mapping: the `Name` attribute's value.
///
/// IFC properties wrap values as `{ "value": ..., "type": ... }`; a bare
/// string is accepted too. Empty names count as absent.
pub fn display_name(properties: &Properties) -> Option<String> {
    let name = properties.get("Name")?;
    let value = match name {
        Value::Object(attr) => attr.get("value")?,
        other => other,
    };
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Resolved display names. Entries are write-once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NameMap {
    names: FxHashMap<ElementId, String>,
}

impl NameMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            names: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Record a name. Returns false and keeps the existing entry if the id
    /// already has one.
    pub fn insert(&mut self, id: ElementId, name: impl Into<String>) -> bool {
        match self.names.entry(id) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(name.into());
                true
            }
        }
    }

    pub fn get(&self, id: ElementId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Resolved name, or `Element <id>`.
    pub fn name_or_placeholder(&self, id: ElementId) -> String {
        self.get(id)
            .map(str::to_string)
            .unwrap_or_else(|| placeholder_name(id))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(ElementId, String)> for NameMap {
    fn from_iter<I: IntoIterator<Item = (ElementId, String)>>(iter: I) -> Self {
        let mut map = NameMap::new();
        for (id, name) in iter {
            map.insert(id, name);
        }
        map
    }
}

/// Resolve a display name for every id.
///
/// Always returns one entry per distinct requested id; fetch failures and
/// nameless elements get [`placeholder_name`]. A `batch_size` of 0 is
/// treated as 1.
pub async fn resolve_names<F: PropertyFetch>(
    fetch: &F,
    ids: impl IntoIterator<Item = ElementId>,
    batch_size: usize,
) -> NameMap {
    let mut ids: Vec<ElementId> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();

    let batch_size = batch_size.max(1);
    let mut names = NameMap::with_capacity(ids.len());
    let mut failed = 0usize;

    tracing::info!(
        elements = ids.len(),
        batch_size = batch_size,
        "Fetching properties for element names"
    );

    for (chunk_index, chunk) in ids.chunks(batch_size).enumerate() {
        let results = join_all(
            chunk
                .iter()
                .map(|&id| async move { (id, fetch.fetch(id).await) }),
        )
        .await;

        for (id, result) in results {
            let name = match result {
                Ok(properties) => {
                    display_name(&properties).unwrap_or_else(|| placeholder_name(id))
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(element_id = id, error = %e, "Could not get properties for element");
                    placeholder_name(id)
                }
            };
            names.insert(id, name);
        }

        tracing::debug!(chunk = chunk_index, size = chunk.len(), "Resolved name chunk");
    }

    tracing::info!(
        resolved = names.len() - failed,
        failed = failed,
        "Name resolution complete"
    );

    names
}
