//! Statistics snapshots exposed by the cache, pool, and orchestrator
//!
//! All counters are process-wide and monotonically increasing; they reset
//! only on an explicit `reset_metrics` request.

use serde::Serialize;

/// Compiled-artifact cache counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    pub compilations: u64,
    pub compile_failures: u64,
    pub evictions: u64,
    /// Current number of cached artifacts
    pub entries: usize,
}

impl CacheStatistics {
    /// Fraction of lookups served from cache, 0.0 when no lookups happened
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Session pool counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoolStatistics {
    /// Handles currently idle in the pool
    pub idle: usize,
    /// Persistent handles in existence (idle + borrowed)
    pub pooled: usize,
    /// Configured maximum of persistently pooled handles
    pub max_size: usize,
    pub created: u64,
    pub borrowed: u64,
    pub returned: u64,
    pub disposed: u64,
    /// Overflow handles created while the pool was at maximum
    pub transient_created: u64,
}

/// Orchestrator counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionStatistics {
    pub single_executions: u64,
    pub batch_executions: u64,
    pub chunked_executions: u64,
    pub async_submitted: u64,
    pub async_completed: u64,
    pub failures: u64,
    pub facts_processed: u64,
}

/// Aggregated runtime statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuntimeStatistics {
    pub execution: ExecutionStatistics,
    pub pool: PoolStatistics,
    pub cache: CacheStatistics,
}
