use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use url::Url;

/// How a tree was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseKind {
    Fresh,
    Incremental,
}

/// Payload of the parse-completed event.
///
/// Borrowed from the cache entry that was just updated; the tree reference
/// is only valid for the duration of the callback.
#[derive(Debug)]
pub struct ParseCompleted<'a, T> {
    pub uri: &'a Url,
    pub version: i32,
    pub kind: ParseKind,
    pub tree: &'a T,
}

/// Handle returned by a subscription, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Box<dyn Fn(&ParseCompleted<'_, T>) + Send + Sync>;

/// Callback registry for parse-completed events.
pub(crate) struct ParseListeners<T> {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, Listener<T>)>>,
}

impl<T> ParseListeners<T> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(
        &self,
        listener: impl Fn(&ParseCompleted<'_, T>) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Box::new(listener)));
        id
    }

    pub(crate) fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Invoke every listener in subscription order.
    pub(crate) fn notify(&self, event: &ParseCompleted<'_, T>) {
        for (_, listener) in self.listeners.read().iter() {
            listener(event);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.listeners.read().len()
    }
}
