use std::path::Path;

use tree_sitter::{Language, Node, Query, QueryCursor, StreamingIterator};

use super::matches::QueryMatch;
use crate::config::QuerySource;
use crate::error::{TreeCacheError, TreeCacheResult};

const RUST_DECLARATIONS: &str = include_str!("../../queries/rust/declarations.scm");

/// A compiled set of structural patterns.
///
/// Compilation happens once in the constructor; the same instance can be run
/// against any number of trees of its language.
pub struct StructuralQuery {
    query: Query,
}

impl std::fmt::Debug for StructuralQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuralQuery")
            .field("patterns", &self.query.pattern_count())
            .field("captures", &self.query.capture_names())
            .finish()
    }
}

impl StructuralQuery {
    pub fn new(language: &Language, source: &str) -> TreeCacheResult<Self> {
        let query = Query::new(language, source)?;
        Ok(Self { query })
    }

    /// Built-in global declaration patterns for Rust.
    ///
    /// Captures: `function`, `globalVar`, `const`, `type`, `module`, `macro`.
    pub fn declarations(language: &Language) -> TreeCacheResult<Self> {
        Self::new(language, RUST_DECLARATIONS)
    }

    /// Compile patterns given inline or read from a file
    pub fn from_source(language: &Language, source: &QuerySource) -> TreeCacheResult<Self> {
        match source {
            QuerySource::Query { query } => Self::new(language, query),
            QuerySource::Path { path } => Self::from_file(language, Path::new(path)),
        }
    }

    fn from_file(language: &Language, path: &Path) -> TreeCacheResult<Self> {
        let patterns = std::fs::read_to_string(path).map_err(|e| {
            TreeCacheError::query(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::new(language, &patterns)
    }

    /// Names reported by [`StructuralQuery::execute`]
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.query
            .capture_names()
            .iter()
            .copied()
            .filter(|name| !is_helper_capture(name))
    }

    /// Run the patterns below `root`.
    ///
    /// `source` must be the text `root`'s tree was parsed from. Captures are
    /// returned in document order; subtrees containing syntax errors only
    /// lose the matches inside the broken region.
    pub fn execute<'tree>(&self, root: Node<'tree>, source: &str) -> Vec<QueryMatch<'tree>> {
        let names = self.query.capture_names();
        let mut cursor = QueryCursor::new();
        let mut captures = cursor.captures(&self.query, root, source.as_bytes());

        let mut results = Vec::new();
        while let Some((matched, index)) = captures.next() {
            let capture = matched.captures[*index];
            let name = names[capture.index as usize];
            if is_helper_capture(name) {
                continue;
            }

            let node = capture.node;
            let Some(text) = source.get(node.byte_range()) else {
                log::warn!(
                    target: "tree_cache::query",
                    "Capture @{} at {:?} lies outside the source text",
                    name,
                    node.byte_range()
                );
                continue;
            };

            results.push(QueryMatch {
                capture: name.to_string(),
                text: text.to_string(),
                start: node.start_position(),
                end: node.end_position(),
                byte_range: node.byte_range(),
                node,
            });
        }
        results
    }
}

fn is_helper_capture(name: &str) -> bool {
    name.starts_with('_')
}
