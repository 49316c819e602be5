//! Runtime facade
//!
//! `RuleRuntime` wires the cache, pool, and orchestrator together behind
//! the surface the API layer consumes. It is constructed once and passed
//! by reference; there are no process-wide singletons.

use crate::cache::{ArtifactCache, CompiledArtifact};
use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::executor::{AsyncExecution, ExecutionOutcome, ExecutionRequest, RuleExecutor};
use crate::metrics::MetricsCollector;
use crate::pool::SessionPool;
use crate::provider::SourceProvider;
use crate::stats::RuntimeStatistics;
use ruleflow_core::Fact;
use ruleflow_engine::RuleEngine;
use std::sync::{Arc, RwLock};

/// The rules execution runtime
pub struct RuleRuntime {
    engine: Arc<dyn RuleEngine>,
    provider: Arc<dyn SourceProvider>,
    cache: Arc<ArtifactCache>,
    metrics: Arc<MetricsCollector>,
    /// Swapped wholesale on reload; in-flight executions keep the executor
    /// clone they started with and drain against the retired pool
    executor: RwLock<RuleExecutor>,
    config: RuntimeConfig,
}

impl std::fmt::Debug for RuleRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRuntime")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RuleRuntime {
    /// Compile the active source and assemble the runtime
    pub(crate) async fn initialize(
        engine: Arc<dyn RuleEngine>,
        provider: Arc<dyn SourceProvider>,
        config: RuntimeConfig,
    ) -> Result<Self> {
        let metrics = Arc::new(MetricsCollector::new());
        let cache = Arc::new(ArtifactCache::new(
            Arc::clone(&engine),
            Arc::clone(&metrics),
        ));

        let artifact =
            Self::compile_active(&cache, provider.as_ref(), &config.source_id).await?;
        let executor = Self::build_executor(&artifact, &config, &metrics);

        tracing::info!(
            source_id = %config.source_id,
            rules = artifact.rule_base.rule_count(),
            max_pool_size = config.max_pool_size,
            "rule runtime initialized"
        );

        Ok(Self {
            engine,
            provider,
            cache,
            metrics,
            executor: RwLock::new(executor),
            config,
        })
    }

    /// Fetch and compile a source, retrying once when the source changes
    /// underneath the compile (transient race with a concurrent update)
    async fn compile_active(
        cache: &ArtifactCache,
        provider: &dyn SourceProvider,
        source_id: &str,
    ) -> Result<Arc<CompiledArtifact>> {
        for attempt in 0..2 {
            let source = provider.fetch(source_id).await?;
            let artifact = cache.get_or_compile(&source.source_id, &source.content)?;

            let live = provider.fingerprint(source_id).await?;
            if live == artifact.descriptor.fingerprint {
                for diagnostic in &artifact.diagnostics {
                    tracing::warn!(source_id, %diagnostic, "compilation diagnostic");
                }
                return Ok(artifact);
            }

            tracing::warn!(
                source_id,
                attempt,
                "rule source changed during compilation; retrying"
            );
            cache.evict(source_id);
        }
        Err(RuntimeError::CacheInconsistency {
            source_id: source_id.to_string(),
        })
    }

    fn build_executor(
        artifact: &Arc<CompiledArtifact>,
        config: &RuntimeConfig,
        metrics: &Arc<MetricsCollector>,
    ) -> RuleExecutor {
        let pool = Arc::new(SessionPool::new(
            Arc::clone(&artifact.rule_base),
            config.max_pool_size,
            Arc::clone(metrics),
        ));
        RuleExecutor::new(pool, Arc::clone(metrics), config.async_workers)
    }

    fn executor(&self) -> RuleExecutor {
        self.executor.read().unwrap().clone()
    }

    /// Execute rules against one fact
    pub fn execute_single(&self, fact: Fact) -> Result<Fact> {
        self.executor().execute_single(fact)
    }

    /// Execute rules against a batch of facts in one session
    pub fn execute_batch(&self, facts: Vec<Fact>) -> Result<Vec<Fact>> {
        self.executor().execute_batch(facts)
    }

    /// Execute rules in fixed-size chunks, preserving input order
    pub fn execute_chunked(&self, facts: Vec<Fact>, chunk_size: usize) -> Result<Vec<Fact>> {
        self.executor().execute_chunked(facts, chunk_size)
    }

    /// Execute a batch in chunks of the configured default size
    pub fn execute_chunked_default(&self, facts: Vec<Fact>) -> Result<Vec<Fact>> {
        self.executor()
            .execute_chunked(facts, self.config.default_chunk_size)
    }

    /// Submit an execution to the bounded async worker pool
    pub fn execute_async(&self, request: ExecutionRequest) -> AsyncExecution {
        self.executor().execute_async(request)
    }

    /// Execute a request synchronously on the caller's thread
    pub fn execute(&self, request: ExecutionRequest) -> Result<Vec<Fact>> {
        self.executor().execute(request)
    }

    /// Execute a request and report per-call statistics alongside the facts
    pub fn execute_with_outcome(&self, request: ExecutionRequest) -> Result<ExecutionOutcome> {
        self.executor().execute_with_outcome(request)
    }

    /// Force cache eviction and recompilation of the active source,
    /// swapping in a fresh session pool bound to the new artifact.
    ///
    /// Handles borrowed before the reload drain against the retired pool
    /// and are disposed with it.
    pub async fn reload(&self) -> Result<()> {
        tracing::info!(source_id = %self.config.source_id, "reloading rule source");
        self.cache.evict(&self.config.source_id);

        let artifact =
            Self::compile_active(&self.cache, self.provider.as_ref(), &self.config.source_id)
                .await?;
        let fresh = Self::build_executor(&artifact, &self.config, &self.metrics);

        let retired = {
            let mut executor = self.executor.write().unwrap();
            std::mem::replace(&mut *executor, fresh)
        };
        retired.pool().clear();

        tracing::info!(
            source_id = %self.config.source_id,
            rules = artifact.rule_base.rule_count(),
            "rule source reloaded"
        );
        Ok(())
    }

    /// Whether the active source has changed since it was last compiled
    pub async fn has_changed(&self) -> Result<bool> {
        let source = self.provider.fetch(&self.config.source_id).await?;
        Ok(self.cache.has_changed(&source.source_id, &source.content))
    }

    /// Aggregated execution, pool, and cache statistics
    pub fn statistics(&self) -> RuntimeStatistics {
        let executor = self.executor();
        RuntimeStatistics {
            execution: executor.statistics(),
            pool: executor.pool().statistics(),
            cache: self.cache.statistics(),
        }
    }

    /// Reset all counters and metrics (explicit request only)
    pub fn reset_metrics(&self) {
        let executor = self.executor();
        executor.reset_statistics();
        executor.pool().reset_statistics();
        self.cache.reset_statistics();
        self.metrics.reset_all();
        tracing::info!("metrics reset");
    }

    /// The metrics sink the runtime emits into
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        Arc::clone(&self.metrics)
    }

    /// The artifact cache (administrative access)
    pub fn cache(&self) -> Arc<ArtifactCache> {
        Arc::clone(&self.cache)
    }

    /// The engine this runtime compiles with
    pub fn engine(&self) -> Arc<dyn RuleEngine> {
        Arc::clone(&self.engine)
    }

    /// The runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Dispose all pooled sessions; used at process shutdown
    pub fn shutdown(&self) {
        self.executor().pool().clear();
        tracing::info!("rule runtime shut down");
    }
}
