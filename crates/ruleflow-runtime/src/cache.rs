//! Compiled artifact cache
//!
//! Memoizes rule compilation by content fingerprint. Compilation runs
//! outside any map lock; insertion re-checks the entry so concurrent
//! callers compiling the same content converge on one artifact. Failed
//! compiles never populate the cache and never fall back to a stale
//! artifact.

use crate::error::{Result, RuntimeError};
use crate::metrics::{MetricsCollector, MetricsSink};
use crate::stats::CacheStatistics;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ruleflow_core::{Fingerprint, RuleSourceDescriptor};
use ruleflow_engine::{Diagnostic, RuleBase, RuleEngine};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The immutable product of compiling one rule source
pub struct CompiledArtifact {
    /// Identity of the source this artifact was compiled from
    pub descriptor: RuleSourceDescriptor,
    /// The opaque, shareable rule base
    pub rule_base: Arc<dyn RuleBase>,
    /// Non-fatal compiler messages
    pub diagnostics: Vec<Diagnostic>,
    pub compiled_at: DateTime<Utc>,
}

impl std::fmt::Debug for CompiledArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledArtifact")
            .field("descriptor", &self.descriptor)
            .field("rule_base", &"<dyn RuleBase>")
            .field("diagnostics", &self.diagnostics)
            .field("compiled_at", &self.compiled_at)
            .finish()
    }
}

struct CacheEntry {
    artifact: Arc<CompiledArtifact>,
}

#[derive(Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    compilations: AtomicU64,
    compile_failures: AtomicU64,
    evictions: AtomicU64,
}

/// Fingerprint-keyed cache of compiled rule artifacts
pub struct ArtifactCache {
    engine: Arc<dyn RuleEngine>,
    entries: DashMap<String, CacheEntry>,
    counters: CacheCounters,
    metrics: Arc<MetricsCollector>,
}

impl ArtifactCache {
    pub fn new(engine: Arc<dyn RuleEngine>, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            engine,
            entries: DashMap::new(),
            counters: CacheCounters::default(),
            metrics,
        }
    }

    /// Return the cached artifact for `source_id` if its fingerprint still
    /// matches `content`, compiling and (re)caching otherwise.
    pub fn get_or_compile(&self, source_id: &str, content: &str) -> Result<Arc<CompiledArtifact>> {
        let fingerprint = Fingerprint::of_str(content);

        if let Some(entry) = self.entries.get(source_id) {
            if entry.artifact.descriptor.fingerprint == fingerprint {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                self.metrics.counter("cache_hits").inc();
                return Ok(Arc::clone(&entry.artifact));
            }
            tracing::info!(
                source_id,
                old = %entry.artifact.descriptor.fingerprint.short(),
                new = %fingerprint.short(),
                "rule source changed; recompiling"
            );
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        self.metrics.counter("cache_misses").inc();

        // Compile outside the map so other sources stay readable
        self.counters.compilations.fetch_add(1, Ordering::Relaxed);
        let compiled = self.engine.compile(source_id, content).map_err(|e| {
            self.counters.compile_failures.fetch_add(1, Ordering::Relaxed);
            self.metrics.record_error("compilation");
            RuntimeError::from_compile_error(source_id, e)
        })?;

        let artifact = Arc::new(CompiledArtifact {
            descriptor: RuleSourceDescriptor::new(source_id, fingerprint),
            rule_base: compiled.rule_base,
            diagnostics: compiled.diagnostics,
            compiled_at: Utc::now(),
        });

        match self.entries.entry(source_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().artifact.descriptor.fingerprint == fingerprint {
                    // Lost a race to an identical compile; converge on the winner
                    return Ok(Arc::clone(&occupied.get().artifact));
                }
                occupied.insert(CacheEntry {
                    artifact: Arc::clone(&artifact),
                });
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry {
                    artifact: Arc::clone(&artifact),
                });
            }
        }

        Ok(artifact)
    }

    /// Get the cached artifact without compiling
    pub fn get(&self, source_id: &str) -> Option<Arc<CompiledArtifact>> {
        self.entries
            .get(source_id)
            .map(|entry| Arc::clone(&entry.artifact))
    }

    /// Compare live content against the cached fingerprint without
    /// compiling. An uncached source counts as changed.
    pub fn has_changed(&self, source_id: &str, content: &str) -> bool {
        match self.entries.get(source_id) {
            Some(entry) => entry.artifact.descriptor.fingerprint != Fingerprint::of_str(content),
            None => true,
        }
    }

    /// Evict one source; returns whether an entry was removed
    pub fn evict(&self, source_id: &str) -> bool {
        match self.entries.remove(source_id) {
            Some(_) => {
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::info!(source_id, "evicted compiled artifact");
                true
            }
            None => {
                tracing::debug!(source_id, "eviction requested for uncached source");
                false
            }
        }
    }

    /// Evict every cached artifact
    pub fn evict_all(&self) {
        let evicted = self.entries.len() as u64;
        self.entries.clear();
        self.counters.evictions.fetch_add(evicted, Ordering::Relaxed);
        tracing::info!(evicted, "evicted all compiled artifacts");
    }

    /// Number of cached artifacts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the cache counters
    pub fn statistics(&self) -> CacheStatistics {
        CacheStatistics {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            compilations: self.counters.compilations.load(Ordering::Relaxed),
            compile_failures: self.counters.compile_failures.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    /// Reset the cache counters (explicit request only)
    pub fn reset_statistics(&self) {
        self.counters.hits.store(0, Ordering::Relaxed);
        self.counters.misses.store(0, Ordering::Relaxed);
        self.counters.compilations.store(0, Ordering::Relaxed);
        self.counters.compile_failures.store(0, Ordering::Relaxed);
        self.counters.evictions.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruleflow_engine::NativeEngine;

    const SOURCE: &str = r#"
rule:
  id: senior_discount
  when: "age > 60"
  then:
    - set: discount
      value: 10
"#;

    fn cache() -> ArtifactCache {
        ArtifactCache::new(
            Arc::new(NativeEngine::new()),
            Arc::new(MetricsCollector::new()),
        )
    }

    #[test]
    fn test_cache_idempotence() {
        let cache = cache();
        let first = cache.get_or_compile("pricing", SOURCE).unwrap();
        for _ in 0..4 {
            let again = cache.get_or_compile("pricing", SOURCE).unwrap();
            assert!(Arc::ptr_eq(&first, &again));
        }

        let stats = cache.statistics();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 4);
        assert_eq!(stats.compilations, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_cache_invalidation_on_content_change() {
        let cache = cache();
        let v1 = cache.get_or_compile("pricing", SOURCE).unwrap();

        let changed = SOURCE.replace("age > 60", "age > 65");
        let v2 = cache.get_or_compile("pricing", &changed).unwrap();
        assert!(!Arc::ptr_eq(&v1, &v2));
        assert_ne!(
            v1.descriptor.fingerprint,
            v2.descriptor.fingerprint
        );

        let stats = cache.statistics();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.compilations, 2);
    }

    #[test]
    fn test_compile_failure_not_cached() {
        let cache = cache();
        let broken = "rule:\n  id: r1\n  when: \"age banana\"\n  then: []\n";
        let err = cache.get_or_compile("pricing", broken).unwrap_err();
        assert!(matches!(err, RuntimeError::Compilation { .. }));
        assert!(cache.get("pricing").is_none());

        let stats = cache.statistics();
        assert_eq!(stats.compile_failures, 1);
        assert_eq!(stats.entries, 0);

        // A valid compile afterwards succeeds normally
        cache.get_or_compile("pricing", SOURCE).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_has_changed() {
        let cache = cache();
        assert!(cache.has_changed("pricing", SOURCE));

        cache.get_or_compile("pricing", SOURCE).unwrap();
        assert!(!cache.has_changed("pricing", SOURCE));
        assert!(cache.has_changed("pricing", "rule:\n  id: other\n  when: \"a > 1\"\n  then: []\n"));
    }

    #[test]
    fn test_evict_and_evict_all() {
        let cache = cache();
        cache.get_or_compile("a", SOURCE).unwrap();
        cache.get_or_compile("b", SOURCE).unwrap();
        assert_eq!(cache.len(), 2);

        assert!(cache.evict("a"));
        assert!(!cache.evict("a"));
        assert_eq!(cache.len(), 1);

        cache.evict_all();
        assert!(cache.is_empty());
        assert_eq!(cache.statistics().evictions, 2);
    }

    #[test]
    fn test_concurrent_get_or_compile_single_artifact() {
        let cache = Arc::new(cache());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                cache.get_or_compile("pricing", SOURCE).unwrap()
            }));
        }
        let artifacts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // All callers converge on one cached artifact
        let cached = cache.get("pricing").unwrap();
        for artifact in &artifacts {
            assert_eq!(
                artifact.descriptor.fingerprint,
                cached.descriptor.fingerprint
            );
        }
        let stats = cache.statistics();
        assert_eq!(stats.hits + stats.misses, 8);
        assert!(stats.misses >= 1);
    }
}
