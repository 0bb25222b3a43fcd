//! Subscriber-side handles for cached queries.

use crate::cache::{CacheInner, Entry};
use resource_state::{FetchError, ResourceState, Snapshot};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// One subscriber's view of one key.
///
/// Created by [`QueryCache::subscribe`](crate::QueryCache::subscribe).
/// Dropping the handle unsubscribes; when the last subscriber leaves,
/// the entry is detached, any in-flight settlement for it is discarded
/// on arrival, and its last success payload moves to the cache's
/// retained store.
pub struct QueryHandle<T> {
    inner: Arc<CacheInner>,
    entry: Arc<Mutex<Entry>>,
    rx: watch::Receiver<u64>,
    _payload: PhantomData<fn() -> T>,
}

impl<T> QueryHandle<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new(
        inner: Arc<CacheInner>,
        entry: Arc<Mutex<Entry>>,
        rx: watch::Receiver<u64>,
    ) -> Self {
        Self {
            inner,
            entry,
            rx,
            _payload: PhantomData,
        }
    }

    /// The key this handle subscribes to.
    pub fn key(&self) -> crate::QueryKey {
        self.entry.lock().unwrap().key.clone()
    }

    /// Borrow the current resource state for one render pass.
    pub fn snapshot(&self) -> Snapshot<T> {
        self.entry.lock().unwrap().snapshot()
    }

    /// Wait for the next state change on this key.
    pub async fn changed(&mut self) {
        let _ = self.rx.changed().await;
    }

    /// Wait until the key has a settled result and no fetch in flight,
    /// then return the snapshot.
    pub async fn settled(&mut self) -> Snapshot<T> {
        loop {
            {
                let e = self.entry.lock().unwrap();
                if !e.in_flight && !e.state.is_idle() {
                    return e.snapshot();
                }
            }
            if self.rx.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }

    /// Issue a new fetch and wait for its outcome.
    ///
    /// The returned future settles independently of any earlier call. If
    /// an even newer fetch supersedes this one before it settles, the
    /// newest outcome is returned; stale results never win.
    pub async fn refetch(&self) -> Result<Arc<T>, FetchError> {
        let (pending, mut rx) = {
            let mut e = self.entry.lock().unwrap();
            let rx = e.notify.subscribe();
            (e.begin_fetch(), rx)
        };
        let generation = pending.generation;
        pending.spawn(Arc::clone(&self.entry));

        loop {
            {
                let e = self.entry.lock().unwrap();
                if e.settled_generation >= generation {
                    match &e.state {
                        ResourceState::Success(value) => {
                            return value
                                .clone()
                                .downcast::<T>()
                                .map_err(|_| FetchError::new("payload type changed"));
                        }
                        ResourceState::Error(err) => return Err(err.clone()),
                        // A newer fetch is already in flight; wait for it.
                        _ => {}
                    }
                }
            }
            if rx.changed().await.is_err() {
                return Err(FetchError::new("query cache entry closed"));
            }
        }
    }

    /// A cheap, clonable trigger for retry affordances.
    pub fn refetcher(&self) -> Refetcher {
        Refetcher {
            entry: Arc::clone(&self.entry),
        }
    }
}

impl<T> std::fmt::Debug for QueryHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryHandle")
            .field("key", &self.entry.lock().unwrap().key)
            .finish_non_exhaustive()
    }
}

impl<T> Drop for QueryHandle<T> {
    fn drop(&mut self) {
        let mut entries = self.inner.entries.lock().unwrap();
        let mut e = self.entry.lock().unwrap();
        e.subscribers -= 1;
        if e.subscribers > 0 {
            return;
        }
        e.detached = true;
        entries.remove(&e.key);
        if let Some(value) = e.last_success.take() {
            self.inner
                .retain_value(&e.key, e.payload_type, e.payload_type_name, value);
        }
        tracing::debug!(key = %e.key, "query entry detached");
    }
}

/// Fire-and-forget refetch trigger.
///
/// Holds no subscription of its own, so it never keeps an entry alive;
/// triggering a detached entry is a no-op. This is what retry buttons
/// should be wired to: pressing one must trigger a fetch, not perform
/// it inline.
#[derive(Clone)]
pub struct Refetcher {
    entry: Arc<Mutex<Entry>>,
}

impl Refetcher {
    /// Issue a new fetch for the entry unless it is detached.
    pub fn trigger(&self) {
        let pending = {
            let mut e = self.entry.lock().unwrap();
            if e.detached {
                None
            } else {
                Some(e.begin_fetch())
            }
        };
        if let Some(pending) = pending {
            pending.spawn(Arc::clone(&self.entry));
        }
    }
}
