//! Incremental parse-tree cache.
//!
//! Documents are parsed on demand and kept in a bounded, least-recently-used
//! cache. Edits reported by a [`DocumentSource`] are translated into parser
//! edits and folded into the cached tree on the next request, so a reparse
//! only revisits the changed regions. A [`StructuralQuery`] extracts tagged
//! nodes (such as global declarations) from a finished tree.

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod query;
pub mod syntax;
pub mod text;

pub use cache::BoundedCache;
pub use config::{QuerySource, TreeCacheSettings};
pub use document::{Document, DocumentChange, DocumentEvent, DocumentSource, DocumentStore};
pub use error::{TreeCacheError, TreeCacheResult};
pub use query::{QueryMatch, StructuralQuery};
pub use syntax::{ParseEngine, ParseKind, ParseOrchestrator, TreeSitterEngine};
