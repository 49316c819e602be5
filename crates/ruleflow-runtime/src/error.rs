//! Runtime error types
//!
//! Errors carry context from the point of failure: the execution phase, the
//! session and correlation ids, and compiler diagnostics where applicable.

use crate::provider::ProviderError;
use ruleflow_engine::{Diagnostic, EngineError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Phase of an execution cycle, used to locate failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPhase {
    Acquiring,
    Inserting,
    Firing,
    Extracting,
    Releasing,
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionPhase::Acquiring => "acquiring",
            ExecutionPhase::Inserting => "inserting",
            ExecutionPhase::Firing => "firing",
            ExecutionPhase::Extracting => "extracting",
            ExecutionPhase::Releasing => "releasing",
        };
        f.write_str(name)
    }
}

/// Runtime error
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The rule source failed to compile; never cached
    #[error("Compilation of '{source_id}' failed with {} diagnostic(s)", diagnostics.len())]
    Compilation {
        source_id: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// The engine could not instantiate a session from a valid artifact
    #[error("Failed to create session for '{source_id}': {reason}")]
    SessionCreation { source_id: String, reason: String },

    /// A failure while inserting facts or firing rules; the session handle
    /// involved has been discarded
    #[error("Execution failed while {phase} (session={session_id}, correlation={correlation_id}): {source}")]
    Execution {
        phase: ExecutionPhase,
        session_id: Uuid,
        correlation_id: String,
        #[source]
        source: EngineError,
    },

    /// A fingerprint check and a subsequent compile observed different
    /// content; transient, retried once upstream
    #[error("Rule source '{source_id}' changed while it was being compiled")]
    CacheInconsistency { source_id: String },

    /// Only produced under the strict bounded-blocking pool policy
    #[error("Session pool exhausted after waiting {waited_ms}ms")]
    PoolExhausted { waited_ms: u64 },

    #[error("Chunk size must be at least 1")]
    InvalidChunkSize,

    /// The async execution was cancelled before it started running
    #[error("Execution cancelled before it started")]
    Cancelled,

    #[error("Async execution task failed: {0}")]
    TaskFailed(String),

    #[error("Source provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RuntimeError {
    /// Wrap an engine compile error, preserving its diagnostics
    pub(crate) fn from_compile_error(source_id: &str, error: EngineError) -> Self {
        match error {
            EngineError::Compilation {
                source_id,
                diagnostics,
            } => RuntimeError::Compilation {
                source_id,
                diagnostics,
            },
            other => RuntimeError::Compilation {
                source_id: source_id.to_string(),
                diagnostics: vec![Diagnostic::error(other.to_string())],
            },
        }
    }
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
