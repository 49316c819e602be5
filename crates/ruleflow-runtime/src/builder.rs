//! Builder pattern for RuleRuntime
//!
//! # Example
//!
//! ```rust,ignore
//! use ruleflow_runtime::{RuleRuntimeBuilder, RuntimeConfig};
//!
//! let runtime = RuleRuntimeBuilder::new()
//!     .add_source("pricing", PRICING_YAML)
//!     .with_max_pool_size(4)
//!     .build()
//!     .await?;
//! ```

use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::provider::{MemorySourceProvider, SourceProvider};
use crate::runtime::RuleRuntime;
use ruleflow_engine::{NativeEngine, RuleEngine};
use std::sync::Arc;

/// Builder for [`RuleRuntime`]
pub struct RuleRuntimeBuilder {
    engine: Option<Arc<dyn RuleEngine>>,
    provider: Option<Arc<dyn SourceProvider>>,
    inline_sources: Vec<(String, String)>,
    source_id: Option<String>,
    max_pool_size: Option<usize>,
    async_workers: Option<usize>,
    default_chunk_size: Option<usize>,
    enable_metrics: bool,
}

impl RuleRuntimeBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            engine: None,
            provider: None,
            inline_sources: Vec::new(),
            source_id: None,
            max_pool_size: None,
            async_workers: None,
            default_chunk_size: None,
            enable_metrics: true,
        }
    }

    /// Use a custom rule engine instead of the native one
    pub fn with_engine(mut self, engine: Arc<dyn RuleEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Use a source provider for loading rule content
    pub fn with_provider(mut self, provider: Arc<dyn SourceProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Add rule content directly (alternative to a provider).
    ///
    /// The first source added becomes the active one unless
    /// [`with_active_source`](Self::with_active_source) says otherwise.
    pub fn add_source(mut self, source_id: impl Into<String>, content: impl Into<String>) -> Self {
        self.inline_sources.push((source_id.into(), content.into()));
        self
    }

    /// Select which source the runtime executes against
    pub fn with_active_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// Set the maximum persistent pool size
    pub fn with_max_pool_size(mut self, max_pool_size: usize) -> Self {
        self.max_pool_size = Some(max_pool_size);
        self
    }

    /// Set the async worker bound
    pub fn with_async_workers(mut self, async_workers: usize) -> Self {
        self.async_workers = Some(async_workers);
        self
    }

    /// Set the default chunk size
    pub fn with_default_chunk_size(mut self, default_chunk_size: usize) -> Self {
        self.default_chunk_size = Some(default_chunk_size);
        self
    }

    /// Enable metrics
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Build the runtime, compiling the active source
    pub async fn build(self) -> Result<RuleRuntime> {
        let engine = self
            .engine
            .unwrap_or_else(|| Arc::new(NativeEngine::new()));

        let source_id = match &self.source_id {
            Some(id) => id.clone(),
            None => self
                .inline_sources
                .first()
                .map(|(id, _)| id.clone())
                .ok_or_else(|| {
                    RuntimeError::Config(
                        "No active source: add a source or select one with with_active_source"
                            .to_string(),
                    )
                })?,
        };

        let provider: Arc<dyn SourceProvider> = match self.provider {
            Some(provider) => {
                if !self.inline_sources.is_empty() {
                    return Err(RuntimeError::Config(
                        "Inline sources and a provider are mutually exclusive".to_string(),
                    ));
                }
                provider
            }
            None => {
                let memory = MemorySourceProvider::new();
                for (id, content) in &self.inline_sources {
                    memory.put(id.clone(), content.clone());
                }
                Arc::new(memory)
            }
        };

        let mut config = RuntimeConfig::new(source_id);
        if let Some(max_pool_size) = self.max_pool_size {
            config.max_pool_size = max_pool_size;
        }
        if let Some(async_workers) = self.async_workers {
            config.async_workers = async_workers;
        }
        if let Some(default_chunk_size) = self.default_chunk_size {
            config.default_chunk_size = default_chunk_size;
        }
        config.enable_metrics = self.enable_metrics;

        RuleRuntime::initialize(engine, provider, config).await
    }
}

impl Default for RuleRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
