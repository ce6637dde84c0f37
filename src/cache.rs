//! Adaptive TTL cache with single-flight miss coalescing.
//!
//! Memoizes expensive or externally-sourced computations per string key.
//! Every entry carries its own TTL, so different keys can run different
//! freshness policies. Concurrent callers that miss on the same key share a
//! single in-flight computation instead of each triggering the upstream
//! call: the first caller starts it, late joiners await the same result.
//!
//! The computation runs in a detached task, so a caller that abandons its
//! request mid-flight does not starve the remaining waiters. Failures are
//! propagated to every waiter and are never stored.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::debug;

/// Time source for freshness checks. Injectable so tests advance simulated
/// time instead of sleeping.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

/// Wall-clock time via `Instant::now`.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// The wrapped computation failed. Carries the key and the shared underlying
/// error; the failure was not cached, so the next lookup recomputes.
#[derive(Debug, Clone, Error)]
#[error("computation for cache key '{key}' failed: {source}")]
pub struct ComputeFailure {
    pub key: String,
    #[source]
    source: Arc<dyn std::error::Error + Send + Sync>,
}

impl ComputeFailure {
    fn new(key: &str, error: anyhow::Error) -> Self {
        ComputeFailure {
            key: key.to_string(),
            source: Arc::from(Box::<dyn std::error::Error + Send + Sync>::from(error)),
        }
    }
}

type FlightResult<T> = Result<T, ComputeFailure>;
type FlightReceiver<T> = watch::Receiver<Option<FlightResult<T>>>;

struct CacheEntry<T> {
    value: T,
    created_at: Instant,
    ttl: Duration,
}

struct Inner<T> {
    entries: HashMap<String, CacheEntry<T>>,
    /// Keys with a computation currently running, mapped to the handle late
    /// joiners subscribe to.
    in_flight: HashMap<String, FlightReceiver<T>>,
}

/// Thread-safe TTL memoization keyed by caller-supplied strings.
///
/// Cheap to clone; clones share the same underlying store. One lock guards
/// both the entry map and the in-flight registry, which keeps the
/// check-then-register step on a miss atomic.
#[derive(Clone)]
pub struct AdaptiveCache<T> {
    inner: Arc<Mutex<Inner<T>>>,
    clock: Arc<dyn Clock>,
}

impl<T: Clone + Send + Sync + 'static> AdaptiveCache<T> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        AdaptiveCache {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
            })),
            clock,
        }
    }

    /// Return the cached value for `key`, computing it at most once across
    /// all concurrent callers when it is missing or expired.
    ///
    /// `compute` is only built and run on a miss; its result is stored with
    /// `ttl` on success and discarded on failure. Callers always receive a
    /// clone of the stored value, never a handle into the cache.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> FlightResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let mut rx = {
            let mut inner = self.inner.lock().await;

            if let Some(entry) = inner.entries.get(key) {
                if self.clock.now().duration_since(entry.created_at) < entry.ttl {
                    debug!("cache hit for '{}'", key);
                    return Ok(entry.value.clone());
                }
                debug!("cache entry for '{}' expired", key);
            }

            if let Some(rx) = inner.in_flight.get(key) {
                debug!("joining in-flight computation for '{}'", key);
                rx.clone()
            } else {
                let (tx, rx) = watch::channel(None);
                inner.in_flight.insert(key.to_string(), rx.clone());

                let future = compute();
                let cache = self.clone();
                let key = key.to_string();
                tokio::spawn(async move {
                    let result = future
                        .await
                        .map_err(|e| ComputeFailure::new(&key, e));
                    {
                        let mut inner = cache.inner.lock().await;
                        if let Ok(value) = &result {
                            inner.entries.insert(
                                key.clone(),
                                CacheEntry {
                                    value: value.clone(),
                                    created_at: cache.clock.now(),
                                    ttl,
                                },
                            );
                        }
                        inner.in_flight.remove(&key);
                    }
                    // A send error only means every waiter already left.
                    let _ = tx.send(Some(result));
                });
                rx
            }
        };

        loop {
            if let Some(result) = rx.borrow_and_update().clone() {
                return result;
            }
            if rx.changed().await.is_err() {
                // The computing task died without publishing (it panicked).
                // Drop the dead registry entry so the key is not poisoned,
                // then report the failure.
                let mut inner = self.inner.lock().await;
                if let Some(existing) = inner.in_flight.get(key) {
                    if existing.has_changed().is_err() {
                        inner.in_flight.remove(key);
                    }
                }
                return Err(ComputeFailure::new(
                    key,
                    anyhow::anyhow!("in-flight computation terminated without a result"),
                ));
            }
        }
    }

    /// Number of stored entries, fresh or expired.
    #[allow(dead_code)]
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for AdaptiveCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Test clock that only moves when told to.
    struct ManualClock {
        now: StdMutex<Instant>,
    }

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(ManualClock {
                now: StdMutex::new(Instant::now()),
            })
        }

        fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn miss_computes_and_hit_returns_without_recompute() {
        let cache: AdaptiveCache<u32> = AdaptiveCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let value = cache
                .get_or_compute("fixture:42", TTL, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn expired_entry_triggers_recompute_fresh_entry_does_not() {
        let clock = ManualClock::new();
        let cache: AdaptiveCache<u32> = AdaptiveCache::with_clock(clock.clone());
        let calls = Arc::new(AtomicUsize::new(0));

        let get = |value: u32| {
            let calls = Arc::clone(&calls);
            cache.get_or_compute("k", TTL, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            })
        };

        assert_eq!(get(1).await.unwrap(), 1);

        // Just inside the TTL: still the stored value, no recompute.
        clock.advance(TTL - Duration::from_secs(1));
        assert_eq!(get(2).await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Past the TTL: refreshed in place.
        clock.advance(Duration::from_secs(2));
        assert_eq!(get(3).await.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_misses_coalesce_into_one_compute() {
        let cache: AdaptiveCache<u32> = AdaptiveCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let futures: Vec<_> = (0..8)
            .map(|_| {
                let calls = Arc::clone(&calls);
                cache.get_or_compute("shared", TTL, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(99)
                })
            })
            .collect();

        let results = join_all(futures).await;
        for result in results {
            assert_eq!(result.unwrap(), 99);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_keys_compute_independently() {
        let cache: AdaptiveCache<String> = AdaptiveCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for key in ["form:1", "form:2", "h2h:1-2"] {
            let calls = Arc::clone(&calls);
            let value = cache
                .get_or_compute(key, TTL, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(key.to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, key);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache.len().await, 3);
    }

    #[tokio::test]
    async fn failed_compute_is_not_cached_and_propagates() {
        let cache: AdaptiveCache<u32> = AdaptiveCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let failing = {
            let calls = Arc::clone(&calls);
            cache.get_or_compute("flaky", TTL, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                anyhow::bail!("upstream unavailable")
            })
        };
        let err = failing.await.unwrap_err();
        assert_eq!(err.key, "flaky");
        assert!(err.to_string().contains("upstream unavailable"));
        assert_eq!(cache.len().await, 0);

        // The error was not stored; the next call recomputes and succeeds.
        let calls2 = Arc::clone(&calls);
        let value = cache
            .get_or_compute("flaky", TTL, move || async move {
                calls2.fetch_add(1, Ordering::SeqCst);
                Ok(5)
            })
            .await
            .unwrap();
        assert_eq!(value, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_waiters_all_observe_the_shared_failure() {
        let cache: AdaptiveCache<u32> = AdaptiveCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let futures: Vec<_> = (0..4)
            .map(|_| {
                let calls = Arc::clone(&calls);
                cache.get_or_compute("down", TTL, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    anyhow::bail!("feed offline")
                })
            })
            .collect();

        for result in join_all(futures).await {
            let err = result.unwrap_err();
            assert!(err.to_string().contains("feed offline"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_survive_the_first_caller_abandoning() {
        let cache: AdaptiveCache<u32> = AdaptiveCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        // First caller starts the computation, then gets dropped mid-flight.
        let leader = {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                cache
                    .get_or_compute("slow", TTL, move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(11)
                    })
                    .await
            })
        };
        // Let the leader register its flight before aborting it.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        leader.abort();

        let value = cache
            .get_or_compute("slow", TTL, || async { Ok(0) })
            .await
            .unwrap();
        assert_eq!(value, 11, "waiter should get the original computation");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn per_key_ttl_policies_are_honoured() {
        let clock = ManualClock::new();
        let cache: AdaptiveCache<u32> = AdaptiveCache::with_clock(clock.clone());
        let calls = Arc::new(AtomicUsize::new(0));

        let get = |key: &'static str, ttl: Duration| {
            let calls = Arc::clone(&calls);
            cache.get_or_compute(key, ttl, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(0)
            })
        };

        get("short", Duration::from_secs(10)).await.unwrap();
        get("long", Duration::from_secs(1000)).await.unwrap();

        clock.advance(Duration::from_secs(30));
        get("short", Duration::from_secs(10)).await.unwrap();
        get("long", Duration::from_secs(1000)).await.unwrap();

        // "short" expired and recomputed; "long" was still fresh.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
