//! Parse orchestration over the bounded tree cache.
//!
//! `ParseOrchestrator` keeps one [`ParseEntry`] per document URI. Change
//! notifications are translated into edit batches and queued on the entry;
//! the next tree request folds the queued edits into the old tree and
//! reparses incrementally. Everything that touches an entry (lookup, parse,
//! swap, listener dispatch) runs under one cache-wide lock, so a request
//! never observes a half-updated entry and parse-completed listeners always
//! see the entry after its update.
//!
//! ```text
//!  DocumentSource ──events──▶ record_changes ──▶ entry.pending
//!        │                                            │
//!        └──retrieve──▶ get_tree_for_document ◀───────┘
//!                          │   fold edits, reparse, swap tree
//!                          ▼
//!                  parse-completed listeners
//! ```
//!
//! Any engine failure evicts the entry: a tree derived from a failed
//! incremental step is never served, and the next request parses from
//! scratch.

use std::num::NonZeroUsize;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use url::Url;

use super::engine::ParseEngine;
use super::events::{ListenerId, ParseCompleted, ParseKind, ParseListeners};
use crate::cache::BoundedCache;
use crate::config::TreeCacheSettings;
use crate::document::{Document, DocumentChange, DocumentEvent, DocumentSource};
use crate::error::TreeCacheResult;
use crate::text::{EditBatch, translate_changes};

/// Cached parse state of one document.
struct ParseEntry<T> {
    /// Document version `tree` reflects
    version: i32,
    tree: T,
    /// Edits observed since `tree` was produced, in arrival order
    pending: Vec<EditBatch>,
    /// Version reached by the newest recorded change
    latest_change: i32,
    /// The edit log cannot reproduce the current text
    requires_fresh_parse: bool,
}

impl<T> ParseEntry<T> {
    fn new(version: i32, tree: T) -> Self {
        Self {
            version,
            tree,
            pending: Vec::new(),
            latest_change: version,
            requires_fresh_parse: false,
        }
    }

    /// Whether the pending edits lead exactly to `version`.
    fn can_reparse_incrementally(&self, version: i32) -> bool {
        !self.requires_fresh_parse && self.latest_change == version
    }

    fn mark_for_fresh_parse(&mut self) {
        self.pending.clear();
        self.requires_fresh_parse = true;
    }

    /// Install a tree built from scratch, dropping the old one.
    fn replace_tree(&mut self, version: i32, tree: T) {
        self.tree = tree;
        self.version = version;
        self.pending.clear();
        self.latest_change = version;
        self.requires_fresh_parse = false;
    }

    /// Fold the pending edits into the tree and reparse with it as hint.
    ///
    /// On error the tree may already be edited and must not be reused.
    fn reparse<E>(&mut self, engine: &mut E, text: &str, version: i32) -> TreeCacheResult<()>
    where
        E: ParseEngine<Tree = T>,
    {
        let batches = std::mem::take(&mut self.pending);
        for edit in batches.iter().flat_map(EditBatch::edits) {
            engine.edit(&mut self.tree, edit)?;
        }
        let tree = engine.parse(text, Some(&self.tree))?;
        self.tree = tree;
        self.version = version;
        Ok(())
    }
}

/// Counters describing cache behaviour since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub fresh_parses: u64,
    pub incremental_parses: u64,
    pub failures: u64,
    /// Entries that left the cache (eviction, failure, close or disposal)
    pub evictions: u64,
}

/// Read access to a cached tree.
///
/// Holds the cache lock: drop it before calling back into the orchestrator.
/// Do not keep it across an `.await` either. The task started by
/// [`ParseOrchestrator::attach`] blocks on the same lock, and on a
/// current-thread runtime that stalls the whole event loop.
pub struct TreeRef<'a, T> {
    guard: MappedMutexGuard<'a, T>,
}

impl<T> Deref for TreeRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

enum Refresh {
    Hit,
    Parsed(ParseKind),
}

struct Inner<E: ParseEngine> {
    engine: E,
    entries: BoundedCache<Url, ParseEntry<E::Tree>>,
    stats: CacheStats,
}

impl<E: ParseEngine> Inner<E> {
    /// Bring the entry for `doc` up to `doc.version()`.
    fn refresh(&mut self, doc: &Document) -> TreeCacheResult<Refresh> {
        let Inner {
            engine,
            entries,
            stats,
        } = self;
        let uri = doc.uri();
        let version = doc.version();

        if let Some(entry) = entries.get_mut(uri) {
            if entry.version == version {
                stats.hits += 1;
                return Ok(Refresh::Hit);
            }

            if entry.can_reparse_incrementally(version) {
                let edits: usize = entry.pending.iter().map(EditBatch::len).sum();
                entry.reparse(engine, doc.text(), version)?;
                stats.incremental_parses += 1;
                log::debug!(
                    target: "tree_cache::orchestrator",
                    "Reparsed {} incrementally to version {} ({} edits)",
                    uri,
                    version,
                    edits
                );
                return Ok(Refresh::Parsed(ParseKind::Incremental));
            }

            // Edit log is missing changes or was invalidated
            log::debug!(
                target: "tree_cache::orchestrator",
                "Edit log of {} does not reach version {}; parsing from scratch",
                uri,
                version
            );
            let tree = engine.parse(doc.text(), None)?;
            entry.replace_tree(version, tree);
            stats.fresh_parses += 1;
            return Ok(Refresh::Parsed(ParseKind::Fresh));
        }

        let tree = engine.parse(doc.text(), None)?;
        entries.set(uri.clone(), ParseEntry::new(version, tree));
        stats.fresh_parses += 1;
        log::debug!(
            target: "tree_cache::orchestrator",
            "Parsed {} (version {})",
            uri,
            version
        );
        Ok(Refresh::Parsed(ParseKind::Fresh))
    }
}

/// Keeps a syntax tree per document in sync with the document's text.
pub struct ParseOrchestrator<E: ParseEngine, S> {
    source: Arc<S>,
    inner: Mutex<Inner<E>>,
    listeners: ParseListeners<E::Tree>,
    evictions: Arc<AtomicU64>,
    subscription: Mutex<Option<JoinHandle<()>>>,
}

impl<E: ParseEngine, S: DocumentSource> ParseOrchestrator<E, S> {
    pub fn new(engine: E, source: Arc<S>, settings: &TreeCacheSettings) -> Self {
        Self::with_capacity(engine, source, settings.capacity())
    }

    pub fn with_capacity(engine: E, source: Arc<S>, capacity: NonZeroUsize) -> Self {
        let evictions = Arc::new(AtomicU64::new(0));
        let counter = evictions.clone();
        let entries = BoundedCache::new(capacity, move |uri: Url, entry: ParseEntry<E::Tree>| {
            counter.fetch_add(1, Ordering::Relaxed);
            log::debug!(
                target: "tree_cache::cache",
                "Releasing tree of {} (version {})",
                uri,
                entry.version
            );
            // Dropping the entry releases its tree
            drop(entry);
        });

        Self {
            source,
            inner: Mutex::new(Inner {
                engine,
                entries,
                stats: CacheStats::default(),
            }),
            listeners: ParseListeners::new(),
            evictions,
            subscription: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Tree for `doc`, parsed or reparsed as needed.
    ///
    /// Returns `None` when the engine fails; the entry for the document is
    /// then evicted so the next request starts from scratch.
    pub fn get_tree_for_document(&self, doc: &Document) -> Option<TreeRef<'_, E::Tree>> {
        let mut inner = self.inner.lock();
        let uri = doc.uri();

        match inner.refresh(doc) {
            Ok(Refresh::Hit) => {}
            Ok(Refresh::Parsed(kind)) => {
                if let Some(entry) = inner.entries.peek(uri) {
                    self.listeners.notify(&ParseCompleted {
                        uri,
                        version: entry.version,
                        kind,
                        tree: &entry.tree,
                    });
                }
            }
            Err(err) => {
                log::warn!(
                    target: "tree_cache::orchestrator",
                    "Discarding parse state of {} (version {}): {}",
                    uri,
                    doc.version(),
                    err
                );
                inner.stats.failures += 1;
                inner.entries.delete(uri);
                return None;
            }
        }

        MutexGuard::try_map(inner, |inner| {
            inner.entries.peek_mut(uri).map(|entry| &mut entry.tree)
        })
        .ok()
        .map(|guard| TreeRef { guard })
    }

    /// Resolve `uri` through the document source, then return its tree.
    ///
    /// Resolution is the only suspension point; the cache is touched only
    /// after the document is in hand.
    pub async fn get_tree_for_uri(&self, uri: &Url) -> Option<TreeRef<'_, E::Tree>> {
        let document = self.source.retrieve(uri).await?;
        self.get_tree_for_document(&document)
    }

    /// Queue the edits of a change notification on the document's entry.
    ///
    /// Changes for documents without an entry are dropped; so are changes not
    /// newer than the entry's latest recorded version.
    pub fn record_changes(&self, change: &DocumentChange) {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.entries.peek_mut(&change.uri) else {
            log::trace!(
                target: "tree_cache::orchestrator",
                "Ignoring change for untracked {}",
                change.uri
            );
            return;
        };

        if change.version <= entry.latest_change {
            log::debug!(
                target: "tree_cache::orchestrator",
                "Ignoring stale change {} for {} (latest {})",
                change.version,
                change.uri,
                entry.latest_change
            );
            return;
        }

        match translate_changes(change) {
            Some(batch) if !entry.requires_fresh_parse => entry.pending.push(batch),
            Some(_) => {}
            None => entry.mark_for_fresh_parse(),
        }
        entry.latest_change = change.version;
    }

    /// React to one event of the document source's change stream.
    pub fn handle_event(&self, event: &DocumentEvent) {
        match event {
            DocumentEvent::Changed(change) => self.record_changes(change),
            DocumentEvent::Closed(uri) => {
                self.release_document(uri);
            }
        }
    }

    /// Drop the entry of a document that is no longer needed.
    pub fn release_document(&self, uri: &Url) -> bool {
        self.inner.lock().entries.delete(uri)
    }

    /// Force every entry to be rebuilt from scratch on next request.
    pub fn invalidate_pending_edits(&self) {
        let mut inner = self.inner.lock();
        for entry in inner.entries.values_mut() {
            entry.mark_for_fresh_parse();
        }
    }

    /// Register a parse-completed listener.
    ///
    /// Listeners run while the cache lock is held and must not call back
    /// into the orchestrator.
    pub fn on_parse_completed(
        &self,
        listener: impl Fn(&ParseCompleted<'_, E::Tree>) + Send + Sync + 'static,
    ) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Stop listening to the document source and release every tree.
    pub fn dispose(&self) {
        if let Some(task) = self.subscription.lock().take() {
            task.abort();
        }
        let mut inner = self.inner.lock();
        let released = inner.entries.len();
        inner.entries.clear();
        if released > 0 {
            log::debug!(
                target: "tree_cache::orchestrator",
                "Disposed parse cache ({} trees released)",
                released
            );
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            evictions: self.evictions.load(Ordering::Relaxed),
            ..self.inner.lock().stats
        }
    }

    /// URIs with a cached tree, most recently used first.
    pub fn cached_uris(&self) -> Vec<Url> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|(uri, _)| uri.clone())
            .collect()
    }

    /// Version of the cached tree for `uri`.
    pub fn cached_version(&self, uri: &Url) -> Option<i32> {
        self.inner.lock().entries.peek(uri).map(|entry| entry.version)
    }

    /// Number of edits queued for `uri`.
    pub fn pending_edit_count(&self, uri: &Url) -> Option<usize> {
        self.inner
            .lock()
            .entries
            .peek(uri)
            .map(|entry| entry.pending.iter().map(EditBatch::len).sum())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.inner.lock().entries.capacity()
    }
}

impl<E, S> ParseOrchestrator<E, S>
where
    E: ParseEngine + Send + 'static,
    E::Tree: Send + 'static,
    S: DocumentSource + 'static,
{
    /// Follow the document source's change stream on the tokio runtime.
    ///
    /// A lagging stream has lost edits, so every entry falls back to a fresh
    /// parse. Calling `attach` again replaces the previous subscription.
    pub fn attach(self: &Arc<Self>) {
        let mut events = self.source.subscribe();
        let orchestrator = Arc::downgrade(self);

        let task = tokio::spawn(async move {
            loop {
                let event = events.recv().await;
                let Some(orchestrator) = orchestrator.upgrade() else {
                    break;
                };
                match event {
                    Ok(event) => orchestrator.handle_event(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!(
                            target: "tree_cache::orchestrator",
                            "Change stream lagged by {} events; dropping edit logs",
                            skipped
                        );
                        orchestrator.invalidate_pending_edits();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        if let Some(previous) = self.subscription.lock().replace(task) {
            previous.abort();
        }
    }
}

impl<E: ParseEngine, S> Drop for ParseOrchestrator<E, S> {
    fn drop(&mut self) {
        if let Some(task) = self.subscription.get_mut().take() {
            task.abort();
        }
    }
}
