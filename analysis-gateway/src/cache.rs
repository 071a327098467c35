//! In-memory result cache keyed by request fingerprint.
//!
//! Entries expire after the TTL of their result kind and the store holds at
//! most `capacity` entries; inserting a new key into a full cache evicts the
//! oldest entry by creation time. Incomplete-solution notices are never
//! stored.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::config::gateway_config::{CacheConfig, TtlTable};
use crate::model::{AnalysisResult, AnalysisTask, Submission};

#[derive(Debug, Clone)]
struct CacheEntry {
    result: AnalysisResult,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) < self.ttl
    }
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, `0.0` before any lookup.
    pub hit_rate: f64,
}

#[derive(Debug)]
pub struct ResultCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    capacity: usize,
    ttls: TtlTable,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl ResultCache {
    pub fn new(cfg: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(cfg.capacity.min(1024))),
            capacity: cfg.capacity,
            ttls: cfg.ttls,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns a fresh cached result. A stale entry is dropped on the way.
    pub async fn get(&self, fingerprint: &str) -> Option<AnalysisResult> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(fingerprint) {
                Some(entry) if entry.is_fresh(now) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.result.clone());
                }
                Some(_) => {}
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        }

        // Stale: re-check under the write lock, a concurrent put may have
        // refreshed it meanwhile.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(fingerprint) {
            if entry.is_fresh(now) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.result.clone());
            }
            entries.remove(fingerprint);
            debug!(fingerprint = short(fingerprint), "expired cache entry removed");
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Stores `result` under `fingerprint`, stamped now.
    ///
    /// Returns `false` when nothing was stored (notice, or caching disabled).
    pub async fn put(&self, fingerprint: &str, result: AnalysisResult) -> bool {
        let Some(kind) = result.result_kind() else {
            return false;
        };
        if self.capacity == 0 {
            return false;
        }

        let mut entries = self.entries.write().await;
        if !entries.contains_key(fingerprint) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.created_at)
                .map(|(k, _)| k.clone());
            if let Some(key) = oldest {
                entries.remove(&key);
                debug!(evicted = short(&key), "cache full; evicted oldest entry");
            }
        }
        entries.insert(
            fingerprint.to_string(),
            CacheEntry {
                result,
                created_at: Instant::now(),
                ttl: self.ttls.get(kind),
            },
        );
        true
    }

    /// Removes every expired entry; returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.is_fresh(now));
        before - entries.len()
    }

    /// Drops all entries and resets counters; returns how many were dropped.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let n = entries.len();
        entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        n
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        let size = self.len().await;
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            size,
            capacity: self.capacity,
            hits,
            misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }
}

/// SHA-256 hex fingerprint of (code, language, task, problem identity).
///
/// Every field is length-prefixed so distinct tuples never produce the same
/// byte stream.
pub fn fingerprint(task: &AnalysisTask, sub: &Submission<'_>) -> String {
    let problem = sub
        .problem
        .map(|p| p.identity())
        .unwrap_or_else(|| "none".to_string());
    let discriminator = task.discriminator();

    let mut hasher = Sha256::new();
    for part in [
        sub.code,
        sub.language.as_str(),
        discriminator.as_str(),
        problem.as_str(),
    ] {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// First 12 hex chars, enough to correlate log lines.
pub(crate) fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AnalysisKind, HintResult, IncompleteSolutionNotice, Language, ProblemContext,
    };

    fn hints(tag: &str) -> AnalysisResult {
        AnalysisResult::Hints(HintResult {
            hints: vec![tag.to_string()],
            progressive: true,
            next_steps: vec![],
        })
    }

    fn cache(capacity: usize, ttl_secs: u64) -> ResultCache {
        ResultCache::new(CacheConfig {
            capacity,
            ttls: TtlTable::uniform(Duration::from_secs(ttl_secs)),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_never_returned() {
        let c = cache(10, 60);
        assert!(c.put("k", hints("a")).await);
        assert_eq!(c.get("k").await, Some(hints("a")));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(c.get("k").await.is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(c.get("k").await.is_none());
        assert_eq!(c.len().await, 0, "stale entry removed on lookup");
    }

    #[tokio::test(start_paused = true)]
    async fn evicts_oldest_when_full() {
        let c = cache(2, 3600);
        c.put("a", hints("a")).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        c.put("b", hints("b")).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        c.put("c", hints("c")).await;

        assert_eq!(c.len().await, 2);
        assert!(c.get("a").await.is_none());
        assert!(c.get("b").await.is_some());
        assert!(c.get("c").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_existing_key_does_not_evict() {
        let c = cache(2, 3600);
        c.put("a", hints("a")).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        c.put("b", hints("b")).await;
        c.put("a", hints("a2")).await;
        assert_eq!(c.len().await, 2);
        assert_eq!(c.get("a").await, Some(hints("a2")));
        assert!(c.get("b").await.is_some());
    }

    #[tokio::test]
    async fn notices_are_not_cached() {
        let c = cache(10, 3600);
        let notice = AnalysisResult::IncompleteSolution(IncompleteSolutionNotice {
            message: "incomplete".into(),
            missing_elements: vec![],
            confidence: 0.9,
            suggestion: "hints".into(),
            analysis_kind: "complexity".into(),
        });
        assert!(!c.put("k", notice).await);
        assert!(c.is_empty().await);
    }

    #[tokio::test]
    async fn zero_capacity_disables_cache() {
        let c = cache(0, 3600);
        assert!(!c.put("k", hints("a")).await);
        assert!(c.get("k").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_depends_on_result_kind() {
        let c = ResultCache::new(CacheConfig {
            capacity: 10,
            ttls: TtlTable {
                hints: Duration::from_secs(10),
                ..TtlTable::uniform(Duration::from_secs(100))
            },
        });
        c.put("h", hints("a")).await;
        c.put(
            "q",
            AnalysisResult::QuickComplexity(crate::model::QuickComplexityResult {
                time_complexity: "O(n)".into(),
                space_complexity: "O(1)".into(),
                inferred_problem: None,
                inferred_problem_title: None,
            }),
        )
        .await;
        tokio::time::advance(Duration::from_secs(50)).await;
        assert!(c.get("h").await.is_none());
        assert!(c.get("q").await.is_some());
        assert_eq!(c.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn stats_and_clear() {
        let c = cache(10, 3600);
        c.put("k", hints("a")).await;
        c.get("k").await;
        c.get("k").await;
        c.get("missing").await;
        let s = c.stats().await;
        assert_eq!((s.size, s.hits, s.misses), (1, 2, 1));
        assert!((s.hit_rate - 2.0 / 3.0).abs() < 1e-9);

        assert_eq!(c.clear().await, 1);
        let s = c.stats().await;
        assert_eq!((s.size, s.hits, s.misses), (0, 0, 0));
        assert_eq!(s.hit_rate, 0.0);
    }

    #[test]
    fn fingerprint_separates_fields() {
        let task = AnalysisTask::Analyze(AnalysisKind::Complexity);
        let a = fingerprint(&task, &Submission::new("ab", Language::Python, None));
        let b = fingerprint(&task, &Submission::new("ab", Language::Ruby, None));
        let c = fingerprint(
            &AnalysisTask::Analyze(AnalysisKind::Hints),
            &Submission::new("ab", Language::Python, None),
        );
        let problem = ProblemContext::new("Two Sum");
        let d = fingerprint(&task, &Submission::new("ab", Language::Python, Some(&problem)));
        assert_eq!(a.len(), 64);
        assert!(a != b && a != c && a != d);
        assert_eq!(a, fingerprint(&task, &Submission::new("ab", Language::Python, None)));
    }
}
