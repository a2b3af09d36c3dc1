//! Translation of content changes into tree-sitter edits.
//!
//! A change notification describes each replacement by its range in the old
//! text and the inserted text. Tree-sitter needs the same replacement as an
//! [`InputEdit`]: start, old end and new end, each as byte offset and point.
//! Changes of one notification are sequential, so every change's offsets are
//! relative to the text produced by the changes before it.

use tree_sitter::InputEdit;

use super::position::advance_point;
use crate::document::{ContentChange, DocumentChange};

/// Edits produced from one change notification, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBatch {
    version: i32,
    edits: Vec<InputEdit>,
}

impl EditBatch {
    pub fn new(version: i32, edits: Vec<InputEdit>) -> Self {
        Self { version, edits }
    }

    /// Document version the batch leads to.
    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn edits(&self) -> &[InputEdit] {
        &self.edits
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Build the tree-sitter edit for one ranged content change.
///
/// Returns `None` for a full-text replacement, which carries no range and
/// cannot be expressed as an incremental edit.
pub fn translate_change(change: &ContentChange) -> Option<InputEdit> {
    let range = change.range?;
    let start_byte = change.range_offset;

    Some(InputEdit {
        start_byte,
        old_end_byte: start_byte + change.range_length,
        new_end_byte: start_byte + change.text.len(),
        start_position: range.start,
        old_end_position: range.end,
        new_end_position: advance_point(range.start, &change.text),
    })
}

/// Translate a whole notification into an [`EditBatch`].
///
/// Returns `None` when any change replaces the full text; the previous tree
/// can then no longer be reused.
pub fn translate_changes(change: &DocumentChange) -> Option<EditBatch> {
    let edits = change
        .changes
        .iter()
        .map(translate_change)
        .collect::<Option<Vec<_>>>()?;
    Some(EditBatch::new(change.version, edits))
}
