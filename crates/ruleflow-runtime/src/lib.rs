//! Ruleflow Runtime - Lifecycle management for rule execution
//!
//! This crate provides the three components at the heart of the system:
//!
//! - [`ArtifactCache`]: fingerprint-keyed memoization of rule compilation
//! - [`SessionPool`]: bounded reuse of stateful execution sessions, with
//!   transient overflow instead of blocking
//! - [`RuleExecutor`]: single / batch / chunked / async orchestration over
//!   pooled sessions
//!
//! [`RuleRuntime`] assembles them behind the surface an API layer consumes.

pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod pool;
pub mod provider;
pub mod stats;
pub mod translator;

mod runtime;

// Re-export main types
pub use builder::RuleRuntimeBuilder;
pub use cache::{ArtifactCache, CompiledArtifact};
pub use config::RuntimeConfig;
pub use error::{ExecutionPhase, Result, RuntimeError};
pub use executor::{AsyncExecution, ExecutionOutcome, ExecutionRequest, RuleExecutor};
pub use metrics::{Counter, Gauge, Histogram, MetricsCollector, MetricsSink};
pub use pool::{SessionHandle, SessionPool};
pub use provider::{
    FileSystemSourceProvider, MemorySourceProvider, ProviderError, RuleSource, SourceProvider,
};
pub use runtime::RuleRuntime;
pub use stats::{CacheStatistics, ExecutionStatistics, PoolStatistics, RuntimeStatistics};
pub use translator::{
    ActionColumn, ConditionColumn, DecisionRow, DecisionTable, DecisionTableTranslator,
    SimpleTableTranslator, TranslateError,
};
