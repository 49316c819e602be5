//! Decision-table translation boundary
//!
//! Tabular rule definitions are translated into native rule-source text
//! before they reach the cache; the core never compiles tables directly.
//! [`SimpleTableTranslator`] renders one rule document per table row.

use ruleflow_core::{Operator, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A condition column: every row supplies a value (or blank) for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionColumn {
    /// Field path the column constrains
    pub field: String,
    /// Operator applied between the field and the cell value
    pub operator: Operator,
}

/// An action column: matching rows set this field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionColumn {
    /// Field path the column writes
    pub field: String,
}

/// One table row; blank cells (None) leave the column out of the rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRow {
    /// Row identifier, used as the rule id suffix
    pub id: String,
    pub conditions: Vec<Option<Value>>,
    pub actions: Vec<Option<Value>>,
}

/// A tabular rule definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTable {
    pub name: String,
    pub condition_columns: Vec<ConditionColumn>,
    pub action_columns: Vec<ActionColumn>,
    pub rows: Vec<DecisionRow>,
}

/// Translation error
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("Decision table '{0}' has no rows")]
    EmptyTable(String),

    #[error("Row '{row}' has {actual} {kind} cells, expected {expected}")]
    ArityMismatch {
        row: String,
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Row '{0}' has no conditions and no actions")]
    EmptyRow(String),
}

/// Converts tabular rule definitions into native rule-source text
pub trait DecisionTableTranslator: Send + Sync {
    fn translate(&self, table: &DecisionTable) -> Result<String, TranslateError>;
}

/// Straightforward row-per-rule translator
#[derive(Debug, Default)]
pub struct SimpleTableTranslator;

impl SimpleTableTranslator {
    pub fn new() -> Self {
        Self
    }

    fn render_literal(value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => {
                if n.fract() == 0.0 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Value::String(s) => format!("\"{}\"", s),
            Value::Array(items) => {
                let rendered: Vec<String> = items.iter().map(Self::render_literal).collect();
                format!("[{}]", rendered.join(", "))
            }
            Value::Object(_) => "null".to_string(),
        }
    }
}

impl DecisionTableTranslator for SimpleTableTranslator {
    fn translate(&self, table: &DecisionTable) -> Result<String, TranslateError> {
        if table.rows.is_empty() {
            return Err(TranslateError::EmptyTable(table.name.clone()));
        }

        let mut documents = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            if row.conditions.len() != table.condition_columns.len() {
                return Err(TranslateError::ArityMismatch {
                    row: row.id.clone(),
                    kind: "condition",
                    expected: table.condition_columns.len(),
                    actual: row.conditions.len(),
                });
            }
            if row.actions.len() != table.action_columns.len() {
                return Err(TranslateError::ArityMismatch {
                    row: row.id.clone(),
                    kind: "action",
                    expected: table.action_columns.len(),
                    actual: row.actions.len(),
                });
            }

            let mut conditions = Vec::new();
            for (column, cell) in table.condition_columns.iter().zip(&row.conditions) {
                if let Some(value) = cell {
                    conditions.push(format!(
                        "    - {} {} {}",
                        column.field,
                        column.operator.symbol(),
                        Self::render_literal(value)
                    ));
                }
            }

            let mut actions = Vec::new();
            for (column, cell) in table.action_columns.iter().zip(&row.actions) {
                if let Some(value) = cell {
                    actions.push(format!(
                        "    - set: {}\n      value: {}",
                        column.field,
                        Self::render_literal(value)
                    ));
                }
            }

            if conditions.is_empty() && actions.is_empty() {
                return Err(TranslateError::EmptyRow(row.id.clone()));
            }

            let when = if conditions.is_empty() {
                "  when:\n    all: []".to_string()
            } else {
                format!("  when:\n    all:\n{}", conditions.join("\n"))
            };
            let then = if actions.is_empty() {
                "  then: []".to_string()
            } else {
                format!("  then:\n{}", actions.join("\n"))
            };

            documents.push(format!(
                "rule:\n  id: {}_{}\n{}\n{}",
                table.name, row.id, when, then
            ));
        }

        Ok(documents.join("\n---\n"))
    }
}
