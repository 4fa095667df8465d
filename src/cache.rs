//! Ranking cache with TTL, corpus-version keying, and single-flight
//!
//! Keys are (profile fingerprint, corpus version, k): a corpus bump or a
//! profile content change lands on a new key, so stale rankings are never
//! served. Concurrent requests for one key share a single in-flight
//! computation instead of recomputing; failed computations cache nothing.

use crate::error::Result;
use crate::matching::profile::{CompatibilityScore, Fingerprint};
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub fingerprint: Fingerprint,
    pub corpus_version: u64,
    pub k: usize,
}

struct CacheSlot {
    scores: Arc<Vec<CompatibilityScore>>,
    inserted_at: Instant,
}

type InflightCell = Arc<OnceCell<Arc<Vec<CompatibilityScore>>>>;

pub struct RankingCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheSlot>>,
    inflight: Mutex<HashMap<CacheKey, InflightCell>>,
}

impl RankingCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached ranking for `key`, or run `compute` to fill it.
    ///
    /// At most one computation per key runs at a time: callers arriving
    /// while one is in flight await its result. Unrelated keys never
    /// contend. The computation itself is expected to be deadline-bound by
    /// the caller, so this wait is bounded too.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: CacheKey,
        compute: F,
    ) -> Result<Arc<Vec<CompatibilityScore>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<CompatibilityScore>>>,
    {
        if let Some(hit) = self.lookup(&key) {
            debug!("ranking cache hit for {}", key.fingerprint);
            return Ok(hit);
        }

        let cell: InflightCell = {
            let mut inflight = self.inflight.lock();
            inflight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let initialized = cell
            .get_or_try_init(|| async { compute().await.map(Arc::new) })
            .await;

        match initialized {
            Ok(scores) => {
                let scores = Arc::clone(scores);
                self.entries.lock().insert(
                    key.clone(),
                    CacheSlot {
                        scores: Arc::clone(&scores),
                        inserted_at: Instant::now(),
                    },
                );
                self.inflight.lock().remove(&key);
                Ok(scores)
            }
            Err(e) => {
                // Nothing is cached on failure. The cell stays registered so
                // a retry still single-flights against concurrent callers.
                Err(e)
            }
        }
    }

    fn lookup(&self, key: &CacheKey) -> Option<Arc<Vec<CompatibilityScore>>> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(slot) if slot.inserted_at.elapsed() < self.ttl => {
                Some(Arc::clone(&slot.scores))
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Drop every entry computed under a corpus version other than
    /// `current`. A version bump already orphans old keys; this reclaims
    /// their memory.
    pub fn purge_stale(&self, current_version: u64) {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| key.corpus_version == current_version);
        let dropped = before - entries.len();
        if dropped > 0 {
            debug!("purged {} rankings from superseded corpus versions", dropped);
        }
    }

    pub fn invalidate_all(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
