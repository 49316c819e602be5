//! Condition types for rule `when` blocks

use crate::types::Value;
use serde::{Deserialize, Serialize};

/// Comparison and membership operators usable in conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// Equal (==)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Element in array
    In,
    /// Element not in array
    NotIn,
    /// String/array contains
    Contains,
}

impl Operator {
    /// The source-text spelling of the operator
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Contains => "contains",
        }
    }

    /// Returns true for ordering comparisons, which require numbers
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Operator::Gt | Operator::Ge | Operator::Lt | Operator::Le
        )
    }
}

/// A single parsed condition: `field <op> literal`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Field path (e.g. "age" or "customer.segment")
    pub field: String,
    /// Comparison operator
    pub operator: Operator,
    /// Literal value to compare against
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }
}

/// Logical grouping of parsed conditions
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionGroup {
    /// All conditions must be true (AND)
    All(Vec<ConditionNode>),
    /// At least one condition must be true (OR)
    Any(Vec<ConditionNode>),
    /// Negation: true when no condition in the group is true
    Not(Vec<ConditionNode>),
}

impl ConditionGroup {
    /// An empty group that matches everything
    pub fn always() -> Self {
        ConditionGroup::All(Vec::new())
    }

    /// Number of leaf conditions in the group, nested groups included
    pub fn condition_count(&self) -> usize {
        let items = match self {
            ConditionGroup::All(items)
            | ConditionGroup::Any(items)
            | ConditionGroup::Not(items) => items,
        };
        items
            .iter()
            .map(|item| match item {
                ConditionNode::Leaf(_) => 1,
                ConditionNode::Group(g) => g.condition_count(),
            })
            .sum()
    }
}

/// An item in a condition group: a leaf condition or a nested group
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    Leaf(Condition),
    Group(ConditionGroup),
}

/// A rule `when` block as written in YAML: a bare condition string or a
/// complex block with `all` / `any` / `not` lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum WhenBlock {
    /// Single condition expression (e.g. `age > 60`)
    Simple(String),
    /// Complex block with logical operators
    Complex(WhenComplex),
}

/// Complex `when` block with all/any/not logic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WhenComplex {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all: Option<Vec<WhenItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub any: Option<Vec<WhenItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Vec<WhenItem>>,
}

/// An item in a `when` block: a condition string or a nested complex block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum WhenItem {
    Simple(String),
    Complex(WhenComplex),
}
