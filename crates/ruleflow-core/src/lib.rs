//! Ruleflow Core - Shared types for the Ruleflow rules runtime
//!
//! This crate provides the leaf types shared by the engine and runtime
//! crates: runtime values and facts, the rule-definition AST, condition
//! parsing, and rule-source identity (content fingerprints).

pub mod ast;
pub mod condition;
pub mod error;
pub mod source;
pub mod types;

// Re-export main types
pub use ast::{Action, RuleDefinition, RuleDocument, SetAction, UnsetAction};
pub use condition::{Condition, ConditionGroup, ConditionNode, Operator, WhenBlock};
pub use error::{CoreError, Result};
pub use source::{Fingerprint, RuleSourceDescriptor};
pub use types::{Fact, Value};
