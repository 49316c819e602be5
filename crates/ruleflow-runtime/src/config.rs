//! Runtime configuration

use serde::{Deserialize, Serialize};

fn default_max_pool_size() -> usize {
    8
}

fn default_async_workers() -> usize {
    4
}

fn default_chunk_size() -> usize {
    100
}

fn default_enable_metrics() -> bool {
    true
}

/// Configuration for a [`RuleRuntime`](crate::RuleRuntime)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// The rule source the runtime executes against
    pub source_id: String,

    /// Maximum number of persistently pooled session handles
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: usize,

    /// Concurrency bound of the async worker pool
    #[serde(default = "default_async_workers")]
    pub async_workers: usize,

    /// Chunk size used when a caller does not supply one
    #[serde(default = "default_chunk_size")]
    pub default_chunk_size: usize,

    /// Enable metrics collection
    #[serde(default = "default_enable_metrics")]
    pub enable_metrics: bool,
}

impl RuntimeConfig {
    /// Create a configuration for the given rule source
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            max_pool_size: default_max_pool_size(),
            async_workers: default_async_workers(),
            default_chunk_size: default_chunk_size(),
            enable_metrics: default_enable_metrics(),
        }
    }

    /// Set the maximum persistent pool size
    pub fn with_max_pool_size(mut self, max_pool_size: usize) -> Self {
        self.max_pool_size = max_pool_size;
        self
    }

    /// Set the async worker bound
    pub fn with_async_workers(mut self, async_workers: usize) -> Self {
        self.async_workers = async_workers;
        self
    }

    /// Set the default chunk size
    pub fn with_default_chunk_size(mut self, default_chunk_size: usize) -> Self {
        self.default_chunk_size = default_chunk_size;
        self
    }

    /// Enable or disable metrics
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }
}
