use crate::document::{ContentChange, Document, DocumentChange, DocumentEvent, DocumentSource};
use crate::error::{TreeCacheError, TreeCacheResult};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::Ref;
use std::ops::Deref;
use tokio::sync::broadcast;
use url::Url;

/// Capacity of the change stream before slow subscribers start lagging.
const EVENT_BUFFER: usize = 1024;

/// A byte-offset replacement applied to a stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub offset: usize,
    pub length: usize,
    pub text: String,
}

impl TextEdit {
    pub fn new(offset: usize, length: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            length,
            text: text.into(),
        }
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::new(offset, 0, text)
    }

    pub fn delete(offset: usize, length: usize) -> Self {
        Self::new(offset, length, "")
    }
}

// In-memory document source: owns document text and publishes every change.
pub struct DocumentStore {
    documents: DashMap<Url, Document>,
    events: broadcast::Sender<DocumentEvent>,
}

pub struct DocumentHandle<'a> {
    inner: Ref<'a, Url, Document>,
}

impl<'a> DocumentHandle<'a> {
    fn new(inner: Ref<'a, Url, Document>) -> Self {
        Self { inner }
    }
}

impl<'a> Deref for DocumentHandle<'a> {
    type Target = Document;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            documents: DashMap::new(),
            events,
        }
    }
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or reopen) a document.
    ///
    /// Reopening replaces the text and must move to a newer version; it
    /// publishes a full-text change so cached trees for the old text are not
    /// reused.
    pub fn open(&self, uri: Url, version: i32, text: impl Into<String>) -> TreeCacheResult<()> {
        let text = text.into();
        match self.documents.entry(uri.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(Document::new(uri, version, text));
                return Ok(());
            }
            Entry::Occupied(mut entry) => {
                check_version(entry.get(), version)?;
                entry.get_mut().update(version, text.clone());
            }
        }

        self.publish(DocumentEvent::Changed(DocumentChange {
            uri,
            version,
            changes: vec![ContentChange::full(text)],
        }));
        Ok(())
    }

    pub fn get(&self, uri: &Url) -> Option<DocumentHandle<'_>> {
        self.documents.get(uri).map(DocumentHandle::new)
    }

    pub fn snapshot(&self, uri: &Url) -> Option<Document> {
        self.documents.get(uri).map(|doc| doc.clone())
    }

    /// Apply byte-offset edits in order and publish them as one notification.
    ///
    /// Each edit's offset is relative to the text after the edits before it.
    /// `version` must be newer than the stored version.
    pub fn apply_edits(&self, uri: &Url, version: i32, edits: &[TextEdit]) -> TreeCacheResult<()> {
        let change = {
            let mut doc = self
                .documents
                .get_mut(uri)
                .ok_or_else(|| TreeCacheError::internal(format!("Document not open: {uri}")))?;
            check_version(&doc, version)?;

            let mut text = doc.text().to_string();
            let mut changes = Vec::with_capacity(edits.len());
            for edit in edits {
                let change = ContentChange::from_offsets(
                    &text,
                    edit.offset,
                    edit.length,
                    edit.text.as_str(),
                );
                if change.range_offset != edit.offset || change.range_length != edit.length {
                    return Err(TreeCacheError::internal(format!(
                        "Edit {}..{} is outside {} or splits a character",
                        edit.offset,
                        edit.offset + edit.length,
                        uri
                    )));
                }
                text.replace_range(
                    change.range_offset..change.range_offset + change.range_length,
                    &change.text,
                );
                changes.push(change);
            }
            doc.update(version, text);

            DocumentChange {
                uri: uri.clone(),
                version,
                changes,
            }
        };

        self.publish(DocumentEvent::Changed(change));
        Ok(())
    }

    /// Replace the whole text of a document.
    pub fn replace_text(
        &self,
        uri: &Url,
        version: i32,
        text: impl Into<String>,
    ) -> TreeCacheResult<()> {
        let text = text.into();
        {
            let mut doc = self
                .documents
                .get_mut(uri)
                .ok_or_else(|| TreeCacheError::internal(format!("Document not open: {uri}")))?;
            check_version(&doc, version)?;
            doc.update(version, text.clone());
        }

        self.publish(DocumentEvent::Changed(DocumentChange {
            uri: uri.clone(),
            version,
            changes: vec![ContentChange::full(text)],
        }));
        Ok(())
    }

    pub fn close(&self, uri: &Url) -> Option<Document> {
        let removed = self.documents.remove(uri).map(|(_, doc)| doc);
        if removed.is_some() {
            self.publish(DocumentEvent::Closed(uri.clone()));
        }
        removed
    }

    fn publish(&self, event: DocumentEvent) {
        // Sending fails only when nobody listens
        if self.events.send(event).is_err() {
            log::trace!(
                target: "tree_cache::document",
                "No subscribers for document event"
            );
        }
    }
}

fn check_version(doc: &Document, version: i32) -> TreeCacheResult<()> {
    if version <= doc.version() {
        return Err(TreeCacheError::internal(format!(
            "Version {} of {} is not newer than {}",
            version,
            doc.uri(),
            doc.version()
        )));
    }
    Ok(())
}

impl DocumentSource for DocumentStore {
    async fn retrieve(&self, uri: &Url) -> Option<Document> {
        self.snapshot(uri)
    }

    fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.events.subscribe()
    }
}
