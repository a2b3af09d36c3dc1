//! The document source seam.
//!
//! The parse cache does not own document text. It asks a [`DocumentSource`]
//! for the current snapshot and listens to its change stream to collect the
//! edits needed for incremental reparsing.

use std::future::Future;

use tokio::sync::broadcast;
use tree_sitter::Point;
use url::Url;

use super::Document;
use crate::text::position::{PointMapper, floor_char_boundary};

/// Range of a replacement in the text before the change, in byte columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRange {
    pub start: Point,
    pub end: Point,
}

/// One replacement inside a change notification.
///
/// `range` is `None` when the whole text was replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    pub range: Option<ChangeRange>,
    pub range_offset: usize,
    pub range_length: usize,
    pub text: String,
}

impl ContentChange {
    /// Describe replacing `length` bytes at `offset` of `old_text` with `text`.
    ///
    /// The offset range is clamped into `old_text` and snapped to char
    /// boundaries before the points are derived.
    pub fn from_offsets(
        old_text: &str,
        offset: usize,
        length: usize,
        text: impl Into<String>,
    ) -> Self {
        let start = floor_char_boundary(old_text, offset);
        let end = floor_char_boundary(old_text, offset.saturating_add(length)).max(start);
        let mapper = PointMapper::new(old_text);

        Self {
            range: Some(ChangeRange {
                start: mapper.point_at(start),
                end: mapper.point_at(end),
            }),
            range_offset: start,
            range_length: end - start,
            text: text.into(),
        }
    }

    /// Replace the whole document text.
    pub fn full(text: impl Into<String>) -> Self {
        Self {
            range: None,
            range_offset: 0,
            range_length: 0,
            text: text.into(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.range.is_none()
    }
}

/// A change notification: the changes that turned the previous version into `version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChange {
    pub uri: Url,
    pub version: i32,
    pub changes: Vec<ContentChange>,
}

/// Events published on a document source's change stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    Changed(DocumentChange),
    /// The document is no longer tracked; its tree can be released.
    Closed(Url),
}

/// Supplier of document snapshots and change notifications.
pub trait DocumentSource: Send + Sync {
    /// Resolve the current snapshot of a document, `None` if it does not exist.
    fn retrieve(&self, uri: &Url) -> impl Future<Output = Option<Document>> + Send;

    /// Subscribe to change notifications, in arrival order.
    fn subscribe(&self) -> broadcast::Receiver<DocumentEvent>;
}
