use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// Number of parse entries kept when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 200;

/// Where a structural query's pattern text comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum QuerySource {
    Path { path: String },
    Query { query: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TreeCacheSettings {
    /// Maximum number of cached parse entries
    pub capacity: Option<usize>,
    /// Pattern set replacing the built-in declaration query
    pub declarations: Option<QuerySource>,
}

impl TreeCacheSettings {
    /// Effective cache capacity; zero falls back to the default.
    pub fn capacity(&self) -> NonZeroUsize {
        let fallback = NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        match self.capacity {
            None => fallback,
            Some(capacity) => NonZeroUsize::new(capacity).unwrap_or_else(|| {
                log::warn!(
                    target: "tree_cache::config",
                    "Cache capacity must be positive; using {}",
                    DEFAULT_CAPACITY
                );
                fallback
            }),
        }
    }
}
