//! Common test utilities for runtime integration tests
#![allow(dead_code)]

use ruleflow_core::{Fact, Value};
use ruleflow_runtime::{MemorySourceProvider, RuleRuntime, RuleRuntimeBuilder, SourceProvider};
use std::sync::Arc;

/// Discount rules used across the integration suites
pub const DISCOUNT_SOURCE: &str = r#"
rule:
  id: senior_discount
  name: Senior discount
  when:
    all:
      - age > 60
  then:
    - set: discount
      value: 10

---

rule:
  id: student_discount
  when:
    all:
      - "segment == \"student\""
  then:
    - set: discount
      value: 5
"#;

/// Build a runtime over a shared in-memory provider so tests can update
/// the source underneath it
pub async fn runtime_with_provider(
    max_pool_size: usize,
) -> (RuleRuntime, Arc<MemorySourceProvider>) {
    let provider = Arc::new(MemorySourceProvider::new());
    provider.put("discounts", DISCOUNT_SOURCE);

    let runtime = RuleRuntimeBuilder::new()
        .with_provider(Arc::clone(&provider) as Arc<dyn SourceProvider>)
        .with_active_source("discounts")
        .with_max_pool_size(max_pool_size)
        .build()
        .await
        .expect("runtime builds");
    (runtime, provider)
}

/// Build a runtime over inline discount rules
pub async fn discount_runtime(max_pool_size: usize) -> RuleRuntime {
    RuleRuntimeBuilder::new()
        .add_source("discounts", DISCOUNT_SOURCE)
        .with_max_pool_size(max_pool_size)
        .build()
        .await
        .expect("runtime builds")
}

pub fn fact_with_age(age: i64) -> Fact {
    let mut fact = Fact::new();
    fact.insert("age", age);
    fact
}

pub fn discount_of(fact: &Fact) -> Value {
    fact.get_path("discount")
}
