//! Native execution session

use super::evaluator;
use super::CompiledRule;
use crate::error::EngineError;
use crate::traits::RuleSession;
use ruleflow_core::{Action, Fact};
use std::sync::Arc;

/// Stateful session over a shared rule base.
///
/// Facts live in insertion order; `fire` walks rules in priority order and
/// applies actions to every matching fact.
pub(super) struct NativeSession {
    rules: Arc<Vec<CompiledRule>>,
    facts: Vec<Fact>,
}

impl NativeSession {
    pub(super) fn new(rules: Arc<Vec<CompiledRule>>) -> Self {
        Self {
            rules,
            facts: Vec::new(),
        }
    }

    fn apply_actions(fact: &mut Fact, rule: &CompiledRule) {
        for action in &rule.definition.then {
            match action {
                Action::Set(set) => fact.set_path(&set.set, set.value.clone()),
                Action::Unset(unset) => {
                    fact.remove(&unset.unset);
                }
            }
        }
    }
}

impl RuleSession for NativeSession {
    fn insert(&mut self, fact: Fact) -> Result<(), EngineError> {
        self.facts.push(fact);
        Ok(())
    }

    fn fire(&mut self, selector: Option<&[String]>) -> Result<usize, EngineError> {
        let mut fired = 0usize;
        for rule in self.rules.iter() {
            if let Some(selected) = selector {
                if !selected.iter().any(|id| id == &rule.definition.id) {
                    continue;
                }
            }
            for fact in self.facts.iter_mut() {
                let matched =
                    evaluator::eval_group(&rule.conditions, fact).map_err(|e| match e {
                        EngineError::Execution { message, .. } => {
                            EngineError::execution_in_rule(message, rule.definition.id.clone())
                        }
                        other => other,
                    })?;
                if matched {
                    Self::apply_actions(fact, rule);
                    fired += 1;
                    tracing::trace!(rule_id = %rule.definition.id, "rule fired");
                }
            }
        }
        Ok(fired)
    }

    fn drain(&mut self) -> Vec<Fact> {
        std::mem::take(&mut self.facts)
    }

    fn fact_count(&self) -> usize {
        self.facts.len()
    }

    fn reset(&mut self) -> Result<(), EngineError> {
        self.facts.clear();
        Ok(())
    }
}
