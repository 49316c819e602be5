//! Cache behavior through the runtime surface

mod common;

use common::{fact_with_age, runtime_with_provider, DISCOUNT_SOURCE};
use ruleflow_core::Value;
use ruleflow_runtime::{RuleRuntimeBuilder, RuntimeError};

#[tokio::test]
async fn repeated_compiles_of_unchanged_source_hit_the_cache() {
    let (runtime, _provider) = runtime_with_provider(2).await;
    let cache = runtime.cache();

    // Initialization compiled once
    assert_eq!(cache.statistics().misses, 1);

    for _ in 0..3 {
        cache.get_or_compile("discounts", DISCOUNT_SOURCE).unwrap();
    }

    let stats = cache.statistics();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 3);
    assert_eq!(stats.compilations, 1);
}

#[tokio::test]
async fn changed_source_is_detected_without_compiling() {
    let (runtime, provider) = runtime_with_provider(2).await;

    assert!(!runtime.has_changed().await.unwrap());

    provider.put(
        "discounts",
        DISCOUNT_SOURCE.replace("age > 60", "age > 65"),
    );
    assert!(runtime.has_changed().await.unwrap());

    // Detection alone does not recompile
    assert_eq!(runtime.statistics().cache.compilations, 1);
}

#[tokio::test]
async fn reload_recompiles_and_switches_behavior() -> anyhow::Result<()> {
    let (runtime, provider) = runtime_with_provider(2).await;

    let result = runtime.execute_single(fact_with_age(62))?;
    assert_eq!(result.get_path("discount"), Value::Number(10.0));

    provider.put(
        "discounts",
        DISCOUNT_SOURCE.replace("age > 60", "age > 65"),
    );
    runtime.reload().await?;

    // A 62-year-old no longer qualifies under the reloaded rules
    let result = runtime.execute_single(fact_with_age(62))?;
    assert_eq!(result.get_path("discount"), Value::Null);
    let result = runtime.execute_single(fact_with_age(70))?;
    assert_eq!(result.get_path("discount"), Value::Number(10.0));

    let stats = runtime.statistics().cache;
    assert_eq!(stats.compilations, 2);
    assert!(stats.evictions >= 1);
    Ok(())
}

#[tokio::test]
async fn compile_failure_surfaces_diagnostics_and_is_not_cached() {
    let broken = r#"
rule:
  id: broken
  when: "age banana 60"
  then: []
"#;
    let err = RuleRuntimeBuilder::new()
        .add_source("broken", broken)
        .build()
        .await
        .unwrap_err();

    match err {
        RuntimeError::Compilation {
            source_id,
            diagnostics,
        } => {
            assert_eq!(source_id, "broken");
            assert!(!diagnostics.is_empty());
            assert_eq!(diagnostics[0].rule_id.as_deref(), Some("broken"));
        }
        other => panic!("Expected compilation error, got {}", other),
    }
}

#[tokio::test]
async fn eviction_forces_recompilation() {
    let (runtime, _provider) = runtime_with_provider(2).await;
    let cache = runtime.cache();

    assert!(cache.evict("discounts"));
    cache.get_or_compile("discounts", DISCOUNT_SOURCE).unwrap();

    let stats = cache.statistics();
    assert_eq!(stats.compilations, 2);
    assert_eq!(stats.evictions, 1);
}
