//! Rule definition AST
//!
//! The shapes rule sources deserialize into. A rule source is one or more
//! YAML documents, each carrying a top-level `rule:` key:
//!
//! ```yaml
//! rule:
//!   id: senior_discount
//!   name: Senior discount
//!   when:
//!     all:
//!       - age > 60
//!   then:
//!     - set: discount
//!       value: 10
//! ```

use crate::condition::WhenBlock;
use crate::types::Value;
use serde::{Deserialize, Serialize};

/// One declarative business rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleDefinition {
    /// Unique rule identifier within its source
    pub id: String,

    /// Human-readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Conditions under which the rule fires
    pub when: WhenBlock,

    /// Actions applied to each matching fact
    pub then: Vec<Action>,

    /// Evaluation priority; higher-priority rules fire first, ties keep
    /// definition order
    #[serde(default)]
    pub priority: i32,
}

/// An action applied to a fact when a rule fires
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Action {
    Set(SetAction),
    Unset(UnsetAction),
}

/// Set a (possibly nested) field to a literal value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetAction {
    /// Field path to write
    pub set: String,
    /// Value to write
    pub value: Value,
}

/// Remove a top-level field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnsetAction {
    /// Field to remove
    pub unset: String,
}

/// A rule source document: the top-level `rule:` wrapper
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleDocument {
    pub rule: RuleDefinition,
}
