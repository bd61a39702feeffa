//! In-memory embedding cache.
//!
//! The metrics embed the same gold spans several times per item (coverage,
//! partial correctness and the coverage fallback). Wrapping a slow provider
//! in [`CachedEmbedder`] sends each distinct string to it only once.

use super::{Embedding, EmbeddingProvider};
use crate::error::{Result, SpanEvalError};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Memoizing wrapper around another provider.
pub struct CachedEmbedder<P> {
    inner: P,
    cache: Mutex<HashMap<String, Embedding>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<P: EmbeddingProvider> CachedEmbedder<P> {
    /// Wrap `inner` with an empty cache.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Number of texts served from the cache.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of texts forwarded to the inner provider.
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    /// Number of distinct texts currently cached.
    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Check if nothing is cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached vector.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    /// Access the wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Embedding>>> {
        self.cache
            .lock()
            .map_err(|_| SpanEvalError::Embedding("embedding cache lock poisoned".to_string()))
    }
}

impl<P: EmbeddingProvider> EmbeddingProvider for CachedEmbedder<P> {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        // Distinct misses, in first-seen order, go to the inner provider as one batch.
        let missing: Vec<&str> = {
            let cache = self.lock()?;
            let mut seen = HashSet::new();
            texts
                .iter()
                .copied()
                .filter(|text| !cache.contains_key(*text) && seen.insert(*text))
                .collect()
        };

        // The lock is not held here, so other callers keep hitting the cache.
        let mut computed: HashMap<&str, Embedding> = HashMap::with_capacity(missing.len());
        if !missing.is_empty() {
            let vectors = self.inner.embed(&missing)?;
            if vectors.len() != missing.len() {
                return Err(SpanEvalError::EmbeddingCount {
                    expected: missing.len(),
                    found: vectors.len(),
                });
            }
            computed.extend(missing.iter().copied().zip(vectors));
        }

        let mut cache = self.lock()?;
        for (text, vector) in &computed {
            cache.insert((*text).to_string(), vector.clone());
        }

        self.misses.fetch_add(missing.len(), Ordering::Relaxed);
        self.hits
            .fetch_add(texts.len() - missing.len(), Ordering::Relaxed);
        tracing::debug!(
            requested = texts.len(),
            computed = missing.len(),
            cached = cache.len(),
            "embedding cache lookup"
        );

        texts
            .iter()
            .map(|text| {
                computed
                    .get(text)
                    .or_else(|| cache.get(*text))
                    .cloned()
                    .ok_or_else(|| {
                        SpanEvalError::Embedding(format!("no cached embedding for {text:?}"))
                    })
            })
            .collect()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use std::thread;
    use std::time::{Duration, Instant};

    /// Counts every text it is asked to embed.
    struct CountingEmbedder {
        inner: HashingEmbedder,
        calls: AtomicUsize,
        texts: AtomicUsize,
    }

    impl EmbeddingProvider for CountingEmbedder {
        fn embed(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.texts.fetch_add(texts.len(), Ordering::Relaxed);
            self.inner.embed(texts)
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn counting() -> CountingEmbedder {
        CountingEmbedder {
            inner: HashingEmbedder::new(32),
            calls: AtomicUsize::new(0),
            texts: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_cache_matches_inner_provider() {
        let cached = CachedEmbedder::new(HashingEmbedder::new(32));
        let direct = HashingEmbedder::new(32);
        let texts = ["alpha beta", "gamma", "alpha beta"];

        assert_eq!(cached.embed(&texts).unwrap(), direct.embed(&texts).unwrap());
    }

    #[test]
    fn test_cache_deduplicates_and_reuses() {
        let cached = CachedEmbedder::new(counting());

        let first = cached.embed(&["a b", "c", "a b"]).unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first[0], first[2]);
        assert_eq!(cached.inner().texts.load(Ordering::Relaxed), 2);
        assert_eq!(cached.misses(), 2);
        assert_eq!(cached.hits(), 1);

        cached.embed(&["c", "a b"]).unwrap();
        assert_eq!(cached.inner().calls.load(Ordering::Relaxed), 1);
        assert_eq!(cached.hits(), 3);
        assert_eq!(cached.len(), 2);
    }

    #[test]
    fn test_cache_clear() {
        let cached = CachedEmbedder::new(counting());
        cached.embed(&["x"]).unwrap();
        assert!(!cached.is_empty());

        cached.clear();
        assert!(cached.is_empty());
        cached.embed(&["x"]).unwrap();
        assert_eq!(cached.inner().calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_cache_empty_batch_skips_inner() {
        let cached = CachedEmbedder::new(counting());
        assert!(cached.embed(&[]).unwrap().is_empty());
        assert_eq!(cached.inner().calls.load(Ordering::Relaxed), 0);
    }

    /// Blocks inside `embed` until a second caller is also inside it, or
    /// until a deadline passes. Records the peak number of concurrent calls.
    struct RendezvousEmbedder {
        inner: HashingEmbedder,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl EmbeddingProvider for RendezvousEmbedder {
        fn embed(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let deadline = Instant::now() + Duration::from_secs(5);
            while self.in_flight.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
                thread::yield_now();
            }
            self.peak
                .fetch_max(self.in_flight.load(Ordering::SeqCst), Ordering::SeqCst);

            let vectors = self.inner.embed(texts);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            vectors
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        fn name(&self) -> &str {
            "rendezvous"
        }
    }

    #[test]
    fn test_concurrent_misses_reach_inner_provider_together() {
        let cached = CachedEmbedder::new(RendezvousEmbedder {
            inner: HashingEmbedder::new(32),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });

        let (left, right) = thread::scope(|scope| {
            let left = scope.spawn(|| cached.embed(&["raised beds"]));
            let right = scope.spawn(|| cached.embed(&["drip irrigation"]));
            (left.join().unwrap(), right.join().unwrap())
        });

        assert_eq!(cached.inner().peak.load(Ordering::SeqCst), 2);
        assert_eq!(left.unwrap(), cached.inner().inner.embed(&["raised beds"]).unwrap());
        assert_eq!(right.unwrap().len(), 1);
        assert_eq!(cached.len(), 2);
        assert_eq!(cached.misses(), 2);
    }
}
