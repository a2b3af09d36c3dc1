use std::ops::Range;

use serde::Serialize;
use tree_sitter::{Node, Point};

/// One capture produced by [`super::StructuralQuery::execute`].
///
/// `node` borrows the tree the query ran on and is only usable while that
/// tree is alive.
#[derive(Debug, Clone)]
pub struct QueryMatch<'tree> {
    pub capture: String,
    pub text: String,
    pub start: Point,
    pub end: Point,
    pub byte_range: Range<usize>,
    pub node: Node<'tree>,
}

impl QueryMatch<'_> {
    /// Owned copy of this match that outlives the tree.
    pub fn to_record(&self) -> MatchRecord {
        MatchRecord {
            capture: self.capture.clone(),
            text: self.text.clone(),
            range: SourceRange {
                start: self.start.into(),
                end: self.end.into(),
            },
        }
    }
}

/// Zero-based line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
}

impl From<Point> for SourcePosition {
    fn from(point: Point) -> Self {
        Self {
            line: point.row,
            column: point.column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceRange {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

/// Serializable form of a [`QueryMatch`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub capture: String,
    pub text: String,
    pub range: SourceRange,
}
