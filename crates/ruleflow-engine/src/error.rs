//! Engine error types and compilation diagnostics

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Severity of a compilation diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// One compiler message attached to a rule source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Rule the message refers to, when attributable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            rule_id: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            rule_id: None,
        }
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match &self.rule_id {
            Some(rule_id) => write!(f, "{} [{}]: {}", severity, rule_id, self.message),
            None => write!(f, "{}: {}", severity, self.message),
        }
    }
}

/// Engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    /// The rule source could not be compiled; diagnostics attached
    #[error("Compilation of '{source_id}' failed with {} diagnostic(s)", diagnostics.len())]
    Compilation {
        source_id: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// The engine failed to instantiate a session from a valid artifact
    #[error("Session creation failed: {0}")]
    SessionCreation(String),

    /// Failure while inserting facts or firing rules
    #[error("Execution failed{}: {message}", rule_id.as_ref().map(|r| format!(" in rule '{}'", r)).unwrap_or_default())]
    Execution {
        message: String,
        rule_id: Option<String>,
    },

    /// The session could not be restored to a fact-free state
    #[error("Session reset failed: {0}")]
    Reset(String),
}

impl EngineError {
    pub fn execution(message: impl Into<String>) -> Self {
        EngineError::Execution {
            message: message.into(),
            rule_id: None,
        }
    }

    pub fn execution_in_rule(message: impl Into<String>, rule_id: impl Into<String>) -> Self {
        EngineError::Execution {
            message: message.into(),
            rule_id: Some(rule_id.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
