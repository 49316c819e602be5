//! Ruleflow Engine - The rule-engine boundary
//!
//! The runtime manages the *lifecycle* of a rule engine (compile, cache,
//! pool sessions); the matching algorithm itself lives behind the traits in
//! this crate. `NativeEngine` is the built-in reference implementation:
//! YAML rule sources, condition evaluation, set-field actions. Alternative
//! engines plug in by implementing [`RuleEngine`].

pub mod error;
pub mod native;
pub mod traits;

pub use error::{Diagnostic, EngineError, Severity};
pub use native::NativeEngine;
pub use traits::{Compiled, RuleBase, RuleEngine, RuleSession};
