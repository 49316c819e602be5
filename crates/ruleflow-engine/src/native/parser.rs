//! YAML rule-source parsing for the native engine
//!
//! A rule source is one or more YAML documents separated by `---`, each
//! with a top-level `rule:` key. Parsing collects diagnostics instead of
//! failing on the first problem so a broken source reports all its errors
//! at once.

use super::CompiledRule;
use crate::error::{Diagnostic, EngineError};
use ruleflow_core::condition::ConditionParser;
use ruleflow_core::RuleDocument;
use serde::Deserialize;
use std::collections::HashSet;

/// Parse and validate a rule source into evaluation-ordered compiled rules.
///
/// Returns the rules plus any warning diagnostics; error diagnostics fail
/// the whole compile.
pub(super) fn compile_source(
    source_id: &str,
    content: &str,
) -> Result<(Vec<CompiledRule>, Vec<Diagnostic>), EngineError> {
    let mut diagnostics = Vec::new();
    let mut rules = Vec::new();
    let mut seen_ids = HashSet::new();
    let condition_parser = ConditionParser::new();

    for document in serde_yaml::Deserializer::from_str(content) {
        let value = match serde_yaml::Value::deserialize(document) {
            Ok(value) => value,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("Invalid YAML document: {}", e)));
                continue;
            }
        };
        if value.is_null() {
            // Empty document, e.g. trailing separator
            continue;
        }
        let doc: RuleDocument = match serde_yaml::from_value(value) {
            Ok(doc) => doc,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("Invalid rule document: {}", e)));
                continue;
            }
        };

        let definition = doc.rule;
        if definition.id.is_empty() {
            diagnostics.push(Diagnostic::error("Rule id must not be empty"));
            continue;
        }
        if !seen_ids.insert(definition.id.clone()) {
            diagnostics.push(
                Diagnostic::error("Duplicate rule id").with_rule(definition.id.clone()),
            );
            continue;
        }
        if definition.then.is_empty() {
            diagnostics.push(
                Diagnostic::warning("Rule has no actions and can never change a fact")
                    .with_rule(definition.id.clone()),
            );
        }

        match condition_parser.parse_when_block(&definition.when) {
            Ok(conditions) => rules.push(CompiledRule {
                definition,
                conditions,
            }),
            Err(e) => {
                diagnostics.push(Diagnostic::error(e.to_string()).with_rule(definition.id));
            }
        }
    }

    if rules.is_empty() && diagnostics.iter().all(|d| !d.is_error()) {
        diagnostics.push(Diagnostic::warning("Source contains no rules"));
    }

    if diagnostics.iter().any(Diagnostic::is_error) {
        return Err(EngineError::Compilation {
            source_id: source_id.to_string(),
            diagnostics,
        });
    }

    // Higher priority first; stable sort keeps definition order within ties
    rules.sort_by_key(|r| std::cmp::Reverse(r.definition.priority));

    Ok((rules, diagnostics))
}
