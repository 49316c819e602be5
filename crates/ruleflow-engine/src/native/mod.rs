//! Native reference engine
//!
//! Compiles YAML rule sources into an in-memory rule base and evaluates
//! them with a single forward pass per `fire` call, in priority order.
//! Inference networks are deliberately out of scope for this engine;
//! engines with richer matching strategies implement [`RuleEngine`]
//! themselves.

pub mod evaluator;
mod parser;
mod session;

use crate::error::EngineError;
use crate::traits::{Compiled, RuleBase, RuleEngine, RuleSession};
use ruleflow_core::{ConditionGroup, RuleDefinition};
use session::NativeSession;
use std::sync::Arc;

/// The built-in YAML rule engine
#[derive(Debug, Default)]
pub struct NativeEngine;

impl NativeEngine {
    pub fn new() -> Self {
        Self
    }
}

impl RuleEngine for NativeEngine {
    fn name(&self) -> &str {
        "native"
    }

    fn compile(&self, source_id: &str, content: &str) -> Result<Compiled, EngineError> {
        let (rules, diagnostics) = parser::compile_source(source_id, content)?;
        tracing::debug!(
            source_id,
            rules = rules.len(),
            warnings = diagnostics.len(),
            "compiled rule source"
        );
        Ok(Compiled {
            rule_base: Arc::new(NativeRuleBase {
                source_id: source_id.to_string(),
                rules: Arc::new(rules),
            }),
            diagnostics,
        })
    }
}

/// One rule with its `when` block parsed into an evaluatable group
#[derive(Debug)]
pub(crate) struct CompiledRule {
    pub(crate) definition: RuleDefinition,
    pub(crate) conditions: ConditionGroup,
}

/// Immutable rule base produced by [`NativeEngine::compile`]
struct NativeRuleBase {
    source_id: String,
    rules: Arc<Vec<CompiledRule>>,
}

impl RuleBase for NativeRuleBase {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn rule_ids(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.definition.id.clone()).collect()
    }

    fn rule_count(&self) -> usize {
        self.rules.len()
    }

    fn create_session(&self) -> Result<Box<dyn RuleSession>, EngineError> {
        Ok(Box::new(NativeSession::new(Arc::clone(&self.rules))))
    }
}
