//! Cache entries, de-duplication, and settlement rules.

use crate::handle::QueryHandle;
use crate::{CacheError, QueryCacheConfig, QueryKey};
use futures_util::future::BoxFuture;
use lru::LruCache;
use resource_state::{FetchError, ResourceState, Snapshot};
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Type-erased payload, shared across every subscriber of a key.
pub(crate) type StoredValue = Arc<dyn Any + Send + Sync>;

/// Type-erased fetch function, kept per entry for refetch and invalidate.
pub(crate) type StoredFetcher =
    Arc<dyn Fn() -> BoxFuture<'static, Result<StoredValue, FetchError>> + Send + Sync>;

/// Canonical state of one key.
///
/// Lives behind a `Mutex`; the map in [`CacheInner`] and every handle
/// share it through an `Arc`. Lock order across the crate is
/// entries map -> entry -> retained store.
pub(crate) struct Entry {
    pub(crate) key: QueryKey,
    pub(crate) payload_type: TypeId,
    pub(crate) payload_type_name: &'static str,
    pub(crate) fetcher: StoredFetcher,
    pub(crate) state: ResourceState<StoredValue>,
    /// Last success payload, kept across refetches and errors so
    /// renderers can preserve content while newer data is on the way.
    pub(crate) last_success: Option<StoredValue>,
    pub(crate) latest_generation: u64,
    pub(crate) settled_generation: u64,
    pub(crate) in_flight: bool,
    pub(crate) subscribers: usize,
    pub(crate) detached: bool,
    pub(crate) notify: watch::Sender<u64>,
    version: u64,
}

impl Entry {
    fn new<T: 'static>(key: QueryKey, fetcher: StoredFetcher, warm: Option<StoredValue>) -> Self {
        let (notify, _) = watch::channel(0);
        let (state, last_success) = match warm {
            Some(value) => (ResourceState::Success(value.clone()), Some(value)),
            None => (ResourceState::Idle, None),
        };
        Self {
            key,
            payload_type: TypeId::of::<T>(),
            payload_type_name: type_name::<T>(),
            fetcher,
            state,
            last_success,
            latest_generation: 0,
            settled_generation: 0,
            in_flight: false,
            subscribers: 0,
            detached: false,
            notify,
            version: 0,
        }
    }

    fn bump(&mut self) {
        self.version += 1;
        self.notify.send_replace(self.version);
    }

    /// Read-only view for one render pass.
    pub(crate) fn snapshot<T: Send + Sync + 'static>(&self) -> Snapshot<T> {
        let stored = self.state.success().or(self.last_success.as_ref());
        let data = stored.and_then(|value| value.clone().downcast::<T>().ok());
        Snapshot {
            error: self.state.error().cloned(),
            is_loading: self.in_flight,
            is_refetching: self.in_flight && data.is_some(),
            data,
        }
    }

    /// Record that a new fetch is being issued and hand back what the
    /// caller needs to run it outside the lock.
    ///
    /// The generation stamp is how "newest request wins" is enforced:
    /// [`Entry::apply`] drops any settlement older than the latest
    /// issued generation.
    pub(crate) fn begin_fetch(&mut self) -> PendingFetch {
        self.latest_generation += 1;
        self.in_flight = true;
        self.state = ResourceState::Loading;
        self.bump();
        tracing::debug!(key = %self.key, generation = self.latest_generation, "query fetch issued");
        PendingFetch {
            generation: self.latest_generation,
            fetcher: Arc::clone(&self.fetcher),
        }
    }

    /// Apply one fetch settlement, subject to the staleness and detach
    /// guards.
    pub(crate) fn apply(&mut self, generation: u64, result: Result<StoredValue, FetchError>) {
        if self.detached {
            tracing::debug!(key = %self.key, generation, "settlement dropped, entry detached");
            return;
        }
        if generation < self.latest_generation {
            tracing::debug!(
                key = %self.key,
                generation,
                latest = self.latest_generation,
                "stale settlement dropped"
            );
            return;
        }
        self.in_flight = false;
        self.settled_generation = generation;
        match result {
            Ok(value) => {
                tracing::debug!(key = %self.key, generation, "query fetch succeeded");
                self.last_success = Some(value.clone());
                self.state = ResourceState::Success(value);
            }
            Err(err) => {
                tracing::warn!(key = %self.key, generation, error = %err, "query fetch failed");
                self.state = ResourceState::Error(err);
            }
        }
        self.bump();
    }
}

/// A fetch that has been recorded on its entry but not yet started.
pub(crate) struct PendingFetch {
    pub(crate) generation: u64,
    fetcher: StoredFetcher,
}

impl PendingFetch {
    /// Run the fetch on the runtime and apply its settlement.
    pub(crate) fn spawn(self, entry: Arc<Mutex<Entry>>) {
        tokio::spawn(async move {
            let result = (self.fetcher)().await;
            entry.lock().unwrap().apply(self.generation, result);
        });
    }
}

/// Settled value kept after a key's last subscriber left.
struct Retained {
    payload_type: TypeId,
    payload_type_name: &'static str,
    value: StoredValue,
}

pub(crate) struct CacheInner {
    config: QueryCacheConfig,
    pub(crate) entries: Mutex<HashMap<QueryKey, Arc<Mutex<Entry>>>>,
    retained: Mutex<LruCache<QueryKey, Retained>>,
}

impl CacheInner {
    /// Move a detached entry's payload into the bounded retained store.
    pub(crate) fn retain_value(
        &self,
        key: &QueryKey,
        payload_type: TypeId,
        payload_type_name: &'static str,
        value: StoredValue,
    ) {
        if self.config.retained_capacity == 0 {
            return;
        }
        self.retained.lock().unwrap().put(
            key.clone(),
            Retained {
                payload_type,
                payload_type_name,
                value,
            },
        );
    }

    fn take_retained<T: 'static>(&self, key: &QueryKey) -> Option<StoredValue> {
        let hit = self.retained.lock().unwrap().pop(key)?;
        if hit.payload_type != TypeId::of::<T>() {
            tracing::warn!(
                key = %key,
                entry_type = hit.payload_type_name,
                requested_type = type_name::<T>(),
                "retained value discarded, payload type changed"
            );
            return None;
        }
        tracing::debug!(key = %key, "subscribe warmed from retained value");
        Some(hit.value)
    }
}

/// Handle to one cache instance.
///
/// Cloning is cheap and shares the same entries; there is no implicit
/// global instance. Fetches run on the ambient tokio runtime, so
/// [`QueryCache::subscribe`] and the refetch paths must be called from
/// within one.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl QueryCache {
    pub fn new(config: QueryCacheConfig) -> Self {
        let capacity =
            NonZeroUsize::new(config.retained_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(CacheInner {
                config,
                entries: Mutex::new(HashMap::new()),
                retained: Mutex::new(LruCache::new(capacity)),
            }),
        }
    }

    /// Declare interest in a key, fetching with `fetch` when needed.
    ///
    /// Issues a fetch only if the key has never settled and none is in
    /// flight; concurrent subscribers to the same key share one request.
    /// The supplied fetch function becomes the entry's fetcher for later
    /// refetches (last subscriber wins). A key's payload type is fixed
    /// by its first subscriber.
    ///
    /// # Errors
    /// Returns [`CacheError::TypeMismatch`] if the key is already live
    /// with a different payload type.
    pub fn subscribe<T, F, Fut>(
        &self,
        key: QueryKey,
        fetch: F,
    ) -> Result<QueryHandle<T>, CacheError>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let fetcher: StoredFetcher = Arc::new(move || {
            let fut = fetch();
            let boxed: BoxFuture<'static, Result<StoredValue, FetchError>> =
                Box::pin(async move { fut.await.map(|value| Arc::new(value) as StoredValue) });
            boxed
        });

        let mut entries = self.inner.entries.lock().unwrap();
        let entry = match entries.get(&key) {
            Some(entry) => Arc::clone(entry),
            None => {
                let warm = self.inner.take_retained::<T>(&key);
                let entry = Arc::new(Mutex::new(Entry::new::<T>(
                    key.clone(),
                    Arc::clone(&fetcher),
                    warm,
                )));
                entries.insert(key.clone(), Arc::clone(&entry));
                entry
            }
        };

        let mut pending = None;
        let handle = {
            let mut e = entry.lock().unwrap();
            if e.payload_type != TypeId::of::<T>() {
                return Err(CacheError::TypeMismatch {
                    key,
                    entry_type: e.payload_type_name,
                    requested_type: type_name::<T>(),
                });
            }
            e.subscribers += 1;
            e.fetcher = fetcher;
            let rx = e.notify.subscribe();
            if e.state.is_idle() && !e.in_flight {
                pending = Some(e.begin_fetch());
            }
            QueryHandle::new(Arc::clone(&self.inner), Arc::clone(&entry), rx)
        };
        drop(entries);

        if let Some(pending) = pending {
            pending.spawn(entry);
        }
        Ok(handle)
    }

    /// Force a refetch for a live key, or drop its retained value.
    pub fn invalidate(&self, key: &QueryKey) {
        let entry = self.inner.entries.lock().unwrap().get(key).cloned();
        if let Some(entry) = entry {
            let pending = entry.lock().unwrap().begin_fetch();
            pending.spawn(entry);
            return;
        }
        if self.inner.retained.lock().unwrap().pop(key).is_some() {
            tracing::debug!(key = %key, "retained value invalidated");
        }
    }

    /// Drop the retained value for a key, if any. Live subscriptions are
    /// unaffected.
    pub fn evict(&self, key: &QueryKey) {
        self.inner.retained.lock().unwrap().pop(key);
    }

    /// Drop every retained value.
    pub fn clear(&self) {
        self.inner.retained.lock().unwrap().clear();
    }

    /// Number of keys with live subscribers.
    pub fn len(&self) -> usize {
        self.inner.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{QueryCache, QueryCacheConfig, QueryKey};
    use resource_state::FetchError;

    fn cache() -> QueryCache {
        QueryCache::new(QueryCacheConfig::default())
    }

    #[tokio::test]
    async fn subscribe_is_loading_before_first_settlement() {
        let cache = cache();
        let handle = cache
            .subscribe::<Vec<i32>, _, _>(QueryKey::new("students"), || async {
                Ok(vec![1, 2, 3])
            })
            .unwrap();

        let snap = handle.snapshot();
        assert!(snap.is_loading);
        assert!(!snap.is_refetching);
        assert!(snap.data.is_none());
    }

    #[tokio::test]
    async fn payload_type_is_fixed_by_first_subscriber() {
        let cache = cache();
        let _numbers = cache
            .subscribe::<Vec<i32>, _, _>(QueryKey::new("students"), || async { Ok(vec![1]) })
            .unwrap();

        let err = cache
            .subscribe::<String, _, _>(QueryKey::new("students"), || async {
                Ok("nope".to_string())
            })
            .unwrap_err();
        assert!(err.to_string().contains("students"));
    }

    #[tokio::test]
    async fn distinct_keys_do_not_share_state() {
        let cache = cache();
        let mut a = cache
            .subscribe::<Vec<i32>, _, _>(
                QueryKey::new("students").with_param("group", "a"),
                || async { Ok(vec![1]) },
            )
            .unwrap();
        let mut b = cache
            .subscribe::<Vec<i32>, _, _>(
                QueryKey::new("students").with_param("group", "b"),
                || async { Ok(vec![2]) },
            )
            .unwrap();

        let (snap_a, snap_b) = (a.settled().await, b.settled().await);
        assert_eq!(*snap_a.data.unwrap(), vec![1]);
        assert_eq!(*snap_b.data.unwrap(), vec![2]);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn failed_fetch_error_is_surfaced_verbatim() {
        let cache = cache();
        let mut handle = cache
            .subscribe::<Vec<i32>, _, _>(QueryKey::new("students"), || async {
                Err(FetchError::new("network down"))
            })
            .unwrap();

        let snap = handle.settled().await;
        assert!(snap.data.is_none());
        assert_eq!(snap.error.unwrap().message(), "network down");
    }
}
