//! Trait seams between the runtime and a rule engine
//!
//! # Thread safety
//!
//! Engines and rule bases are shared read-only across threads and must be
//! `Send + Sync`. Sessions are stateful and exclusively owned: `Send` so a
//! handle can move between threads, but never shared.

use crate::error::{Diagnostic, EngineError};
use ruleflow_core::Fact;
use std::sync::Arc;

/// A compiler for rule-definition sources
pub trait RuleEngine: Send + Sync {
    /// Engine name, used in logs and diagnostics
    fn name(&self) -> &str;

    /// Compile rule-source text into an immutable, shareable rule base.
    ///
    /// Warnings survive a successful compile in [`Compiled::diagnostics`];
    /// any error-severity diagnostic fails the compile with
    /// [`EngineError::Compilation`].
    fn compile(&self, source_id: &str, content: &str) -> Result<Compiled, EngineError>;
}

/// Product of a successful compilation
pub struct Compiled {
    /// The opaque, immutable rule base
    pub rule_base: Arc<dyn RuleBase>,
    /// Non-fatal compiler messages
    pub diagnostics: Vec<Diagnostic>,
}

/// An immutable compiled rule base, shared read-only by many sessions
pub trait RuleBase: Send + Sync {
    /// Identifier of the source this base was compiled from
    fn source_id(&self) -> &str;

    /// Ids of all rules in the base, in evaluation order
    fn rule_ids(&self) -> Vec<String>;

    /// Number of rules in the base
    fn rule_count(&self) -> usize;

    /// Instantiate a fresh, empty execution session bound to this base
    fn create_session(&self) -> Result<Box<dyn RuleSession>, EngineError>;
}

/// A stateful execution session
///
/// # Contract
///
/// - `drain` yields facts in insertion order; the orchestrator's batch and
///   chunk ordering guarantees depend on it.
/// - After a successful `reset` the session holds no facts and is safe to
///   hand to another caller.
pub trait RuleSession: Send {
    /// Insert one fact into working memory
    fn insert(&mut self, fact: Fact) -> Result<(), EngineError>;

    /// Evaluate rules against all inserted facts, mutating them in place.
    ///
    /// `selector` restricts firing to the named rule ids; `None` fires all
    /// rules. Returns the number of rule activations.
    fn fire(&mut self, selector: Option<&[String]>) -> Result<usize, EngineError>;

    /// Remove and return all facts, in insertion order
    fn drain(&mut self) -> Vec<Fact>;

    /// Number of facts currently in working memory
    fn fact_count(&self) -> usize;

    /// Restore the session to a fact-free state
    fn reset(&mut self) -> Result<(), EngineError>;
}
