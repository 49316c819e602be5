//! Pool behavior through the runtime surface

mod common;

use common::{discount_runtime, fact_with_age};
use ruleflow_core::Value;
use ruleflow_runtime::SessionPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn pool_at_maximum_overflows_with_a_disposed_transient() {
    let runtime = discount_runtime(2).await;
    let artifact = runtime.cache().get("discounts").unwrap();
    let pool = SessionPool::new(Arc::clone(&artifact.rule_base), 2, runtime.metrics());

    // Three borrows before any return: two pooled handles plus one transient
    let first = pool.borrow().unwrap();
    let second = pool.borrow().unwrap();
    let third = pool.borrow().unwrap();
    assert!(!first.is_transient());
    assert!(!second.is_transient());
    assert!(third.is_transient());

    let stats = pool.statistics();
    assert_eq!(stats.pooled, 2);
    assert_eq!(stats.created, 3);
    assert_eq!(stats.transient_created, 1);

    // The transient handle is disposed on return, never pooled
    pool.give_back(third);
    pool.give_back(second);
    pool.give_back(first);

    let stats = pool.statistics();
    assert_eq!(stats.idle, 2);
    assert_eq!(stats.disposed, 1);
    assert_eq!(stats.returned, 3);
}

#[tokio::test]
async fn returned_sessions_carry_no_residual_facts() {
    let runtime = discount_runtime(1).await;

    // With a single pooled session, consecutive executions share the
    // handle; results must never leak facts between calls
    for age in [65i64, 30, 70, 25] {
        let results = runtime.execute_batch(vec![fact_with_age(age)]).unwrap();
        assert_eq!(results.len(), 1, "residual facts leaked into the batch");
        assert_eq!(results[0].get_path("age"), Value::Number(age as f64));
    }

    let stats = runtime.statistics().pool;
    assert_eq!(stats.created, 1);
    assert_eq!(stats.borrowed, 4);
    assert_eq!(stats.returned, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_executions_never_share_a_session() {
    let runtime = Arc::new(discount_runtime(3).await);
    let peak_tracker = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for worker in 0..6 {
        let runtime = Arc::clone(&runtime);
        let peak_tracker = Arc::clone(&peak_tracker);
        tasks.push(tokio::task::spawn_blocking(move || {
            for i in 0..25 {
                let age = 55 + ((worker * 25 + i) % 20) as i64;
                let result = runtime.execute_single(fact_with_age(age)).unwrap();
                let expected = if age > 60 {
                    Value::Number(10.0)
                } else {
                    Value::Null
                };
                assert_eq!(result.get_path("discount"), expected);
                peak_tracker.fetch_max(
                    runtime.statistics().pool.pooled,
                    Ordering::SeqCst,
                );
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let stats = runtime.statistics();
    assert_eq!(stats.execution.single_executions, 150);
    assert_eq!(stats.pool.borrowed, 150);
    assert_eq!(stats.pool.returned, 150);
    // The persistent set never exceeded its bound
    assert!(peak_tracker.load(Ordering::SeqCst) <= 3);
    assert!(stats.pool.pooled <= 3);
}

#[tokio::test]
async fn shutdown_clears_the_pool() {
    let runtime = discount_runtime(2).await;
    runtime.execute_single(fact_with_age(65)).unwrap();
    assert_eq!(runtime.statistics().pool.idle, 1);

    runtime.shutdown();
    let stats = runtime.statistics().pool;
    assert_eq!(stats.idle, 0);
    assert_eq!(stats.pooled, 0);
}
