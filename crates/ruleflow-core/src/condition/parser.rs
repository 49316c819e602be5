//! Condition string parser
//!
//! Parses condition strings like:
//! - `age > 60`
//! - `segment == "retail"`
//! - `country in ["DE", "AT", "CH"]`
//! - `tags contains "vip"`

use super::types::{
    Condition, ConditionGroup, ConditionNode, Operator, WhenBlock, WhenComplex, WhenItem,
};
use crate::types::Value;
use thiserror::Error;

/// Condition parse error
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to parse '{condition}': {message}")]
pub struct ConditionParseError {
    pub condition: String,
    pub message: String,
}

impl ConditionParseError {
    fn new(condition: &str, message: impl Into<String>) -> Self {
        Self {
            condition: condition.to_string(),
            message: message.into(),
        }
    }
}

/// Parser for condition strings and `when` blocks
#[derive(Debug, Default)]
pub struct ConditionParser;

impl ConditionParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a `when` block into an evaluatable condition group
    pub fn parse_when_block(&self, when: &WhenBlock) -> Result<ConditionGroup, ConditionParseError> {
        match when {
            WhenBlock::Simple(expr) => {
                let condition = self.parse_condition(expr)?;
                Ok(ConditionGroup::All(vec![ConditionNode::Leaf(condition)]))
            }
            WhenBlock::Complex(complex) => self.parse_complex(complex),
        }
    }

    fn parse_complex(&self, complex: &WhenComplex) -> Result<ConditionGroup, ConditionParseError> {
        // Prioritize 'all', then 'any', then 'not'
        if let Some(all) = &complex.all {
            Ok(ConditionGroup::All(self.parse_items(all)?))
        } else if let Some(any) = &complex.any {
            Ok(ConditionGroup::Any(self.parse_items(any)?))
        } else if let Some(not) = &complex.not {
            Ok(ConditionGroup::Not(self.parse_items(not)?))
        } else {
            Ok(ConditionGroup::always())
        }
    }

    fn parse_items(&self, items: &[WhenItem]) -> Result<Vec<ConditionNode>, ConditionParseError> {
        let mut result = Vec::new();
        for item in items {
            match item {
                WhenItem::Simple(expr) => {
                    result.push(ConditionNode::Leaf(self.parse_condition(expr)?));
                }
                WhenItem::Complex(nested) => {
                    result.push(ConditionNode::Group(self.parse_complex(nested)?));
                }
            }
        }
        Ok(result)
    }

    /// Parse a single condition string into a `Condition`
    pub fn parse_condition(&self, condition: &str) -> Result<Condition, ConditionParseError> {
        let condition = condition.trim();
        if condition.is_empty() {
            return Err(ConditionParseError::new(condition, "Empty condition"));
        }

        // Operators ordered so longer spellings match before their prefixes
        let operators = [
            ("!=", Operator::Ne),
            (">=", Operator::Ge),
            ("<=", Operator::Le),
            ("==", Operator::Eq),
            (">", Operator::Gt),
            ("<", Operator::Lt),
            (" not in ", Operator::NotIn),
            (" in ", Operator::In),
            (" contains ", Operator::Contains),
        ];

        for (op_str, op) in operators.iter() {
            if let Some(pos) = condition.find(op_str) {
                let field = condition[..pos].trim().to_string();
                let value_str = condition[pos + op_str.len()..].trim();

                if field.is_empty() {
                    return Err(ConditionParseError::new(condition, "Empty field name"));
                }

                let value = self.parse_value(value_str).map_err(|message| {
                    ConditionParseError::new(condition, message)
                })?;

                return Ok(Condition::new(field, *op, value));
            }
        }

        Err(ConditionParseError::new(condition, "No operator found"))
    }

    /// Parse a literal value: null, bool, number, quoted string, or array
    fn parse_value(&self, value_str: &str) -> Result<Value, String> {
        let value_str = value_str.trim();
        if value_str.is_empty() {
            return Err("Empty value".to_string());
        }

        if value_str == "null" {
            return Ok(Value::Null);
        }
        if value_str == "true" {
            return Ok(Value::Bool(true));
        }
        if value_str == "false" {
            return Ok(Value::Bool(false));
        }

        if let Ok(n) = value_str.parse::<f64>() {
            return Ok(Value::Number(n));
        }

        if (value_str.starts_with('"') && value_str.ends_with('"') && value_str.len() >= 2)
            || (value_str.starts_with('\'') && value_str.ends_with('\'') && value_str.len() >= 2)
        {
            return Ok(Value::String(value_str[1..value_str.len() - 1].to_string()));
        }

        if value_str.starts_with('[') && value_str.ends_with(']') {
            let inner = &value_str[1..value_str.len() - 1];
            let mut items = Vec::new();
            for part in split_top_level(inner) {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                items.push(self.parse_value(part)?);
            }
            return Ok(Value::Array(items));
        }

        Err(format!("Unrecognized literal: {}", value_str))
    }
}

/// Split an array body on commas, respecting quoted strings
fn split_top_level(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in input.chars() {
        match quote {
            Some(q) => {
                current.push(ch);
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => {
                    quote = Some(ch);
                    current.push(ch);
                }
                ',' => {
                    parts.push(std::mem::take(&mut current));
                }
                _ => current.push(ch),
            },
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}
