//! Lifecycle tests for the query cache: de-duplication, settlement
//! ordering, detach behavior, and retention.
//!
//! Timing-sensitive tests run under paused tokio time, so sleeps are
//! exact barriers rather than real delays.

use query_cache::{QueryCache, QueryCacheConfig, QueryKey};
use resource_state::FetchError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn cache() -> QueryCache {
    QueryCache::new(QueryCacheConfig::default())
}

#[tokio::test(start_paused = true)]
async fn concurrent_subscribers_share_one_fetch() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));

    let fetch = {
        let calls = Arc::clone(&calls);
        move || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(vec![1, 2])
            }
        }
    };

    let mut first = cache
        .subscribe::<Vec<i32>, _, _>(QueryKey::new("students"), fetch.clone())
        .unwrap();
    let mut second = cache
        .subscribe::<Vec<i32>, _, _>(QueryKey::new("students"), fetch)
        .unwrap();

    let (snap_a, snap_b) = (first.settled().await, second.settled().await);
    assert_eq!(calls.load(Ordering::SeqCst), 1, "one underlying fetch");
    assert!(Arc::ptr_eq(
        &snap_a.data.unwrap(),
        &snap_b.data.unwrap()
    ));
}

#[tokio::test(start_paused = true)]
async fn newest_request_wins_over_a_slow_stale_response() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));

    // Invocation 0 settles instantly; 1 is slow; 2 is fast. The sleep
    // barriers below pin which generation each invocation belongs to.
    let fetch = {
        let calls = Arc::clone(&calls);
        move || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                match call {
                    0 => Ok("initial".to_string()),
                    1 => {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok("slow stale".to_string())
                    }
                    _ => {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Ok("fresh".to_string())
                    }
                }
            }
        }
    };

    let mut handle = cache
        .subscribe::<String, _, _>(QueryKey::new("announcements"), fetch)
        .unwrap();
    assert_eq!(*handle.settled().await.data.unwrap(), "initial");

    // Second fetch (slow) goes out, then a third (fast) supersedes it.
    let refetcher = handle.refetcher();
    refetcher.trigger();
    tokio::time::sleep(Duration::from_millis(1)).await;
    refetcher.trigger();

    assert_eq!(*handle.settled().await.data.unwrap(), "fresh");

    // Let the slow response land; it must be dropped as stale.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(*handle.snapshot().data.unwrap(), "fresh");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn refetch_settles_with_its_own_outcome() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));

    let fetch = {
        let calls = Arc::clone(&calls);
        move || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Err(FetchError::new("network down"))
                } else {
                    Ok(vec![call])
                }
            }
        }
    };

    let mut handle = cache
        .subscribe::<Vec<usize>, _, _>(QueryKey::new("payments"), fetch)
        .unwrap();
    let snap = handle.settled().await;
    assert_eq!(snap.error.unwrap().message(), "network down");

    let refetched = handle.refetch().await.unwrap();
    assert_eq!(*refetched, vec![1]);

    // The error from the first attempt is gone once a refetch succeeds.
    let snap = handle.snapshot();
    assert!(snap.error.is_none());
    assert_eq!(*snap.data.unwrap(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn settlement_for_a_dropped_subscriber_is_ignored() {
    let cache = cache();

    let handle = cache
        .subscribe::<Vec<i32>, _, _>(QueryKey::new("groups"), || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(vec![1])
        })
        .unwrap();
    drop(handle);
    assert!(cache.is_empty());

    // Let the in-flight fetch land against the detached entry.
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Nothing was retained: the key never settled while subscribed, so a
    // fresh subscribe starts from scratch.
    let mut handle = cache
        .subscribe::<Vec<i32>, _, _>(QueryKey::new("groups"), || async { Ok(vec![7]) })
        .unwrap();
    assert!(handle.snapshot().is_loading);
    assert_eq!(*handle.settled().await.data.unwrap(), vec![7]);
}

#[tokio::test(start_paused = true)]
async fn resubscribe_warms_from_the_retained_value() {
    let cache = cache();
    let key = QueryKey::new("skills").with_param("category", "welding");

    let mut handle = cache
        .subscribe::<Vec<i32>, _, _>(key.clone(), || async { Ok(vec![1, 2, 3]) })
        .unwrap();
    handle.settled().await;
    drop(handle);

    // Warm start: no fetch issued, data available immediately.
    let handle = cache
        .subscribe::<Vec<i32>, _, _>(key, || async {
            Err(FetchError::new("should not be called"))
        })
        .unwrap();
    let snap = handle.snapshot();
    assert!(!snap.is_loading);
    assert_eq!(*snap.data.unwrap(), vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn retention_is_bounded_by_capacity() {
    let cache = QueryCache::new(QueryCacheConfig {
        retained_capacity: 1,
    });

    for name in ["a", "b"] {
        let value = name.to_string();
        let mut handle = cache
            .subscribe::<String, _, _>(QueryKey::new(name), move || {
                let value = value.clone();
                async move { Ok(value) }
            })
            .unwrap();
        handle.settled().await;
    }

    // "a" was evicted by "b"; only "b" warms.
    let a = cache
        .subscribe::<String, _, _>(QueryKey::new("a"), || async { Ok("refetched".to_string()) })
        .unwrap();
    assert!(a.snapshot().is_loading);

    let b = cache
        .subscribe::<String, _, _>(QueryKey::new("b"), || async { Ok("unused".to_string()) })
        .unwrap();
    assert_eq!(*b.snapshot().data.unwrap(), "b");
}

#[tokio::test(start_paused = true)]
async fn invalidate_refetches_live_keys() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = QueryKey::new("attendance");

    let fetch = {
        let calls = Arc::clone(&calls);
        move || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(vec![call]) }
        }
    };

    let mut handle = cache.subscribe::<Vec<usize>, _, _>(key.clone(), fetch).unwrap();
    assert_eq!(*handle.settled().await.data.unwrap(), vec![0]);

    cache.invalidate(&key);
    handle.changed().await;
    assert_eq!(*handle.settled().await.data.unwrap(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn refetch_preserves_previous_data_until_settlement() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));

    let fetch = {
        let calls = Arc::clone(&calls);
        move || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call > 0 {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                Ok(vec![call])
            }
        }
    };

    let mut handle = cache
        .subscribe::<Vec<usize>, _, _>(QueryKey::new("mentors"), fetch)
        .unwrap();
    handle.settled().await;

    handle.refetcher().trigger();
    let snap = handle.snapshot();
    assert!(snap.is_loading);
    assert!(snap.is_refetching, "previous data still present mid-refetch");
    assert_eq!(*snap.data.unwrap(), vec![0]);

    let snap = handle.settled().await;
    assert!(!snap.is_refetching);
    assert_eq!(*snap.data.unwrap(), vec![1]);
}
