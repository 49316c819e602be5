//! Condition types and parsing for rule `when` blocks

pub mod parser;
pub mod types;

pub use parser::{ConditionParseError, ConditionParser};
pub use types::{Condition, ConditionGroup, ConditionNode, Operator, WhenBlock, WhenComplex, WhenItem};
