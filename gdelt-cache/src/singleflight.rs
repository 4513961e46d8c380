//! `SingleFlightRegistry` — collapses concurrent fetches for the same key.
//!
//! Replaces the double-checked dictionary pattern with an atomic
//! compare-and-insert into a concurrent map (`dashmap`): creation of the
//! per-key mutex is itself race-safe, so two callers racing to register
//! the same key never both believe themselves the leader.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::error::{CacheError, CacheResult};

/// Ensures at most one in-flight `fn` per key across concurrent callers.
///
/// Followers block on the same per-key `Mutex` rather than being handed
/// the leader's result directly; by design (§4.6) they re-observe state
/// through the store after the leader releases the lock, not through a
/// shared return value.
pub struct SingleFlightRegistry<K: Eq + Hash + Clone + Send + Sync + 'static> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone + Send + Sync + 'static> Default for SingleFlightRegistry<K> {
    fn default() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone + Send + Sync + 'static> SingleFlightRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: &K) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Runs `fn` under the key's mutex. If `deadline` elapses while
    /// waiting to acquire it, returns `CacheError::Timeout` without
    /// cancelling whatever holder is currently running — its result
    /// still benefits future callers via the store.
    pub async fn do_once<F, Fut, T>(&self, key: &K, deadline: Option<Duration>, f: F) -> CacheResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheResult<T>>,
    {
        let lock = self.lock_for(key);

        let _guard = match deadline {
            Some(d) => timeout(d, lock.lock())
                .await
                .map_err(|_| CacheError::Timeout("single-flight key".to_string()))?,
            None => lock.lock().await,
        };

        f().await
    }

    /// Number of keys currently tracked (idle or active). Exposed for
    /// tests and diagnostics; the registry never evicts entries on its
    /// own, matching the spec's "GC of idle keys is optional".
    pub fn tracked_keys(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn concurrent_callers_collapse_to_one_execution() {
        let registry: Arc<SingleFlightRegistry<&'static str>> = Arc::new(SingleFlightRegistry::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let registry = registry.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                registry
                    .do_once(&"CH/2026-01-21", None, || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<_, CacheError>(())
                    })
                    .await
            }));
        }

        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 10, "each caller runs its own closure");
        assert_eq!(registry.tracked_keys(), 1);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_contend() {
        let registry: SingleFlightRegistry<&'static str> = SingleFlightRegistry::new();
        let (a, b) = tokio::join!(
            registry.do_once(&"CH", None, || async { Ok::<_, CacheError>(1) }),
            registry.do_once(&"US", None, || async { Ok::<_, CacheError>(2) }),
        );
        assert_eq!(a.unwrap(), 1);
        assert_eq!(b.unwrap(), 2);
        assert_eq!(registry.tracked_keys(), 2);
    }

    #[tokio::test]
    async fn deadline_elapsing_returns_timeout_without_aborting_leader() {
        let registry: Arc<SingleFlightRegistry<&'static str>> = Arc::new(SingleFlightRegistry::new());
        let leader_done = Arc::new(AtomicUsize::new(0));

        let leader_registry = registry.clone();
        let leader_flag = leader_done.clone();
        let leader = tokio::spawn(async move {
            leader_registry
                .do_once(&"CH", None, || async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    leader_flag.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, CacheError>(())
                })
                .await
        });

        tokio::time::sleep(Duration::from_millis(5)).await;

        let follower = registry
            .do_once(&"CH", Some(Duration::from_millis(5)), || async {
                Ok::<_, CacheError>(())
            })
            .await;

        assert!(matches!(follower, Err(CacheError::Timeout(_))));
        leader.await.unwrap().unwrap();
        assert_eq!(leader_done.load(Ordering::SeqCst), 1, "leader ran to completion");
    }
}
