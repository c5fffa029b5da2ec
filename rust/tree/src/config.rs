// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tree configuration loaded from environment variables.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default number of property fetches in flight per chunk.
pub const DEFAULT_NAME_BATCH_SIZE: usize = 100;

/// How a spatial group listed by several other groups picks its parent.
///
/// The classifier does not guarantee a single container per group, so the
/// choice is explicit. Under both policies the child's id is removed from
/// every candidate parent's member set; it is attached under exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NestingPolicy {
    /// The first candidate parent in snapshot order wins.
    #[default]
    FirstMatch,
    /// The candidate parent with the smallest member set wins.
    ///
    /// Classifiers that report transitive membership list a storey under both
    /// its building and its site; the smallest container is the direct one.
    Innermost,
}

impl FromStr for NestingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-match" | "first_match" | "first" => Ok(Self::FirstMatch),
            "innermost" => Ok(Self::Innermost),
            other => Err(format!("unknown nesting policy '{}'", other)),
        }
    }
}

/// Tree builder and name resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Property fetches run concurrently within a chunk of this size.
    pub name_batch_size: usize,
    /// Parent selection for multiply-listed spatial groups.
    pub nesting_policy: NestingPolicy,
}

impl TreeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            name_batch_size: std::env::var("NAME_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(DEFAULT_NAME_BATCH_SIZE),
            nesting_policy: match std::env::var("NESTING_POLICY") {
                Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                    tracing::warn!(error = %e, "Ignoring NESTING_POLICY");
                    NestingPolicy::default()
                }),
                Err(_) => NestingPolicy::default(),
            },
        }
    }

    /// Builder-style override of the nesting policy.
    pub fn with_nesting_policy(mut self, policy: NestingPolicy) -> Self {
        self.nesting_policy = policy;
        self
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            name_batch_size: DEFAULT_NAME_BATCH_SIZE,
            nesting_policy: NestingPolicy::default(),
        }
    }
}
