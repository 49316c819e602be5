//! Execution orchestrator
//!
//! Runs rule evaluation against facts using pooled sessions, in four
//! modes: single, batch, chunked batch, and async. One execution cycle
//! moves through ACQUIRING -> INSERTING -> FIRING -> EXTRACTING ->
//! RELEASING; any failure discards the session handle (corrupted working
//! memory must not re-enter the pool) and surfaces the error with phase
//! and session context. Batches fail fast; there are no partial results.

use crate::error::{ExecutionPhase, Result, RuntimeError};
use crate::metrics::{MetricsCollector, MetricsSink};
use crate::pool::SessionPool;
use crate::stats::ExecutionStatistics;
use ruleflow_core::Fact;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// One execution request: facts plus optional rule selection and chunking
#[derive(Debug, Clone, Default)]
pub struct ExecutionRequest {
    pub facts: Vec<Fact>,
    /// Restrict firing to these rule ids; `None` fires all rules
    pub selector: Option<Vec<String>>,
    /// Run as a chunked batch with this chunk size
    pub chunk_size: Option<usize>,
}

impl ExecutionRequest {
    pub fn single(fact: Fact) -> Self {
        Self {
            facts: vec![fact],
            ..Self::default()
        }
    }

    pub fn batch(facts: Vec<Fact>) -> Self {
        Self {
            facts,
            ..Self::default()
        }
    }

    pub fn chunked(facts: Vec<Fact>, chunk_size: usize) -> Self {
        Self {
            facts,
            selector: None,
            chunk_size: Some(chunk_size),
        }
    }

    pub fn with_selector(mut self, rule_ids: Vec<String>) -> Self {
        self.selector = Some(rule_ids);
        self
    }
}

/// Facts plus per-call statistics from one execution
#[derive(Debug)]
pub struct ExecutionOutcome {
    /// The (possibly mutated) facts, in input order
    pub facts: Vec<Fact>,
    /// Total rule activations across the call
    pub fired: usize,
    /// Wall-clock duration of the call
    pub duration: std::time::Duration,
}

/// Result of one session cycle
#[derive(Default)]
struct Cycle {
    facts: Vec<Fact>,
    fired: usize,
}

#[derive(Default)]
struct ExecCounters {
    single_executions: AtomicU64,
    batch_executions: AtomicU64,
    chunked_executions: AtomicU64,
    async_submitted: AtomicU64,
    async_completed: AtomicU64,
    failures: AtomicU64,
    facts_processed: AtomicU64,
}

struct ExecutorInner {
    pool: Arc<SessionPool>,
    metrics: Arc<MetricsCollector>,
    counters: ExecCounters,
    workers: Arc<Semaphore>,
}

/// Orchestrates rule execution over a session pool
#[derive(Clone)]
pub struct RuleExecutor {
    inner: Arc<ExecutorInner>,
}

impl RuleExecutor {
    pub fn new(pool: Arc<SessionPool>, metrics: Arc<MetricsCollector>, async_workers: usize) -> Self {
        Self {
            inner: Arc::new(ExecutorInner {
                pool,
                metrics,
                counters: ExecCounters::default(),
                workers: Arc::new(Semaphore::new(async_workers.max(1))),
            }),
        }
    }

    /// The pool this executor borrows sessions from
    pub fn pool(&self) -> &Arc<SessionPool> {
        &self.inner.pool
    }

    /// Execute rules against one fact
    pub fn execute_single(&self, fact: Fact) -> Result<Fact> {
        self.inner
            .counters
            .single_executions
            .fetch_add(1, Ordering::Relaxed);
        let mut cycle = self.run_cycle(vec![fact], None)?;
        // One fact in, one fact out
        Ok(cycle.facts.remove(0))
    }

    /// Execute rules against all facts in one session.
    ///
    /// More efficient per item than N single calls, at the cost of holding
    /// the whole input in one session's working memory.
    pub fn execute_batch(&self, facts: Vec<Fact>) -> Result<Vec<Fact>> {
        Ok(self.run_batch(facts, None)?.facts)
    }

    /// Execute rules in independent fixed-size chunks, bounding peak
    /// working-memory to `chunk_size` facts. Results preserve input order.
    pub fn execute_chunked(&self, facts: Vec<Fact>, chunk_size: usize) -> Result<Vec<Fact>> {
        Ok(self.run_chunked(facts, chunk_size, None)?.facts)
    }

    /// Execute a request, dispatching on its chunking mode
    pub fn execute(&self, request: ExecutionRequest) -> Result<Vec<Fact>> {
        Ok(self.execute_with_outcome(request)?.facts)
    }

    /// Execute a request and report per-call statistics alongside the facts
    pub fn execute_with_outcome(&self, request: ExecutionRequest) -> Result<ExecutionOutcome> {
        let start = Instant::now();
        let selector = request.selector;
        let outcome = match request.chunk_size {
            Some(chunk_size) => self.run_chunked(request.facts, chunk_size, selector.as_deref()),
            None => self.run_batch(request.facts, selector.as_deref()),
        }?;
        Ok(ExecutionOutcome {
            facts: outcome.facts,
            fired: outcome.fired,
            duration: start.elapsed(),
        })
    }

    fn run_batch(&self, facts: Vec<Fact>, selector: Option<&[String]>) -> Result<Cycle> {
        self.inner
            .counters
            .batch_executions
            .fetch_add(1, Ordering::Relaxed);
        if facts.is_empty() {
            return Ok(Cycle::default());
        }
        self.run_cycle(facts, selector)
    }

    fn run_chunked(
        &self,
        facts: Vec<Fact>,
        chunk_size: usize,
        selector: Option<&[String]>,
    ) -> Result<Cycle> {
        if chunk_size == 0 {
            return Err(RuntimeError::InvalidChunkSize);
        }
        self.inner
            .counters
            .chunked_executions
            .fetch_add(1, Ordering::Relaxed);

        let mut combined = Cycle {
            facts: Vec::with_capacity(facts.len()),
            fired: 0,
        };
        let mut queue = facts;
        while !queue.is_empty() {
            let take = queue.len().min(chunk_size);
            let chunk: Vec<Fact> = queue.drain(..take).collect();
            let cycle = self.run_cycle(chunk, selector)?;
            combined.facts.extend(cycle.facts);
            combined.fired += cycle.fired;
        }
        Ok(combined)
    }

    /// Submit a request to the bounded async worker pool.
    ///
    /// Submission never blocks; the returned handle resolves when the work
    /// completes. Cancellation is effective only before the task starts.
    pub fn execute_async(&self, request: ExecutionRequest) -> AsyncExecution {
        self.inner
            .counters
            .async_submitted
            .fetch_add(1, Ordering::Relaxed);

        let state = Arc::new(AtomicU8::new(AsyncExecution::PENDING));
        let executor = self.clone();
        let task_state = Arc::clone(&state);

        let handle = tokio::spawn(async move {
            let _permit = Arc::clone(&executor.inner.workers)
                .acquire_owned()
                .await
                .expect("worker semaphore is never closed");

            // Atomically claim the start; a cancel that won the race stops
            // the task here, a cancel that lost it is a no-op
            if task_state
                .compare_exchange(
                    AsyncExecution::PENDING,
                    AsyncExecution::STARTED,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_err()
            {
                tracing::debug!("async execution cancelled before start");
                return Err(RuntimeError::Cancelled);
            }

            let result = executor.execute(request);
            executor
                .inner
                .counters
                .async_completed
                .fetch_add(1, Ordering::Relaxed);
            result
        });

        AsyncExecution { handle, state }
    }

    /// One borrow/insert/fire/drain/release cycle over a session
    fn run_cycle(&self, facts: Vec<Fact>, selector: Option<&[String]>) -> Result<Cycle> {
        let correlation_id = format!("exec_{}", Uuid::new_v4().simple());
        let fact_count = facts.len();
        let start = Instant::now();

        let mut handle = self.inner.pool.borrow().map_err(|e| {
            self.record_failure();
            e
        })?;
        let session_id = handle.id();

        for fact in facts {
            if let Err(e) = handle.session_mut().insert(fact) {
                self.inner.pool.discard(handle);
                return Err(self.execution_error(
                    ExecutionPhase::Inserting,
                    session_id,
                    correlation_id,
                    e,
                ));
            }
        }

        let fired = match handle.session_mut().fire(selector) {
            Ok(fired) => fired,
            Err(e) => {
                self.inner.pool.discard(handle);
                return Err(self.execution_error(
                    ExecutionPhase::Firing,
                    session_id,
                    correlation_id,
                    e,
                ));
            }
        };

        let results = handle.session_mut().drain();
        self.inner.pool.give_back(handle);

        let elapsed = start.elapsed();
        self.inner
            .counters
            .facts_processed
            .fetch_add(fact_count as u64, Ordering::Relaxed);
        self.inner.metrics.counter("executions").inc();
        self.inner
            .metrics
            .record_execution_time("execution", elapsed);
        tracing::debug!(
            correlation_id = %correlation_id,
            session_id = %session_id,
            facts = fact_count,
            fired,
            elapsed_ms = elapsed.as_millis() as u64,
            "execution cycle complete"
        );

        Ok(Cycle {
            facts: results,
            fired,
        })
    }

    fn execution_error(
        &self,
        phase: ExecutionPhase,
        session_id: Uuid,
        correlation_id: String,
        source: ruleflow_engine::EngineError,
    ) -> RuntimeError {
        self.record_failure();
        RuntimeError::Execution {
            phase,
            session_id,
            correlation_id,
            source,
        }
    }

    fn record_failure(&self) {
        self.inner.counters.failures.fetch_add(1, Ordering::Relaxed);
        self.inner.metrics.record_error("execution");
    }

    /// Snapshot of the orchestrator counters
    pub fn statistics(&self) -> ExecutionStatistics {
        let c = &self.inner.counters;
        ExecutionStatistics {
            single_executions: c.single_executions.load(Ordering::Relaxed),
            batch_executions: c.batch_executions.load(Ordering::Relaxed),
            chunked_executions: c.chunked_executions.load(Ordering::Relaxed),
            async_submitted: c.async_submitted.load(Ordering::Relaxed),
            async_completed: c.async_completed.load(Ordering::Relaxed),
            failures: c.failures.load(Ordering::Relaxed),
            facts_processed: c.facts_processed.load(Ordering::Relaxed),
        }
    }

    /// Reset the orchestrator counters (explicit request only)
    pub fn reset_statistics(&self) {
        let c = &self.inner.counters;
        c.single_executions.store(0, Ordering::Relaxed);
        c.batch_executions.store(0, Ordering::Relaxed);
        c.chunked_executions.store(0, Ordering::Relaxed);
        c.async_submitted.store(0, Ordering::Relaxed);
        c.async_completed.store(0, Ordering::Relaxed);
        c.failures.store(0, Ordering::Relaxed);
        c.facts_processed.store(0, Ordering::Relaxed);
    }
}

/// Handle for one in-flight async execution
pub struct AsyncExecution {
    handle: JoinHandle<Result<Vec<Fact>>>,
    state: Arc<AtomicU8>,
}

impl AsyncExecution {
    const PENDING: u8 = 0;
    const STARTED: u8 = 1;
    const CANCELLED: u8 = 2;

    /// Request cancellation.
    ///
    /// Effective only before rule firing starts; returns whether the
    /// cancellation took effect. Once started, the execution runs to
    /// completion (firing is an atomic unit) and this is a no-op.
    pub fn cancel(&self) -> bool {
        self.state
            .compare_exchange(
                Self::PENDING,
                Self::CANCELLED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Whether the task has begun executing
    pub fn has_started(&self) -> bool {
        self.state.load(Ordering::Acquire) == Self::STARTED
    }

    /// Wait for the execution to finish
    pub async fn wait(self) -> Result<Vec<Fact>> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(RuntimeError::TaskFailed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruleflow_core::Value;
    use ruleflow_engine::{NativeEngine, RuleEngine};

    const SOURCE: &str = r#"
rule:
  id: senior_discount
  when: "age > 60"
  then:
    - set: discount
      value: 10
"#;

    fn executor(max_pool: usize) -> RuleExecutor {
        let engine = NativeEngine::new();
        let compiled = engine.compile("pricing", SOURCE).unwrap();
        let metrics = Arc::new(MetricsCollector::new());
        let pool = Arc::new(SessionPool::new(
            compiled.rule_base,
            max_pool,
            Arc::clone(&metrics),
        ));
        RuleExecutor::new(pool, metrics, 2)
    }

    fn fact_with_age(age: i64) -> Fact {
        let mut fact = Fact::new();
        fact.insert("age", age);
        fact
    }

    #[test]
    fn test_execute_single_applies_discount() {
        let executor = executor(2);
        let result = executor.execute_single(fact_with_age(65)).unwrap();
        assert_eq!(result.get_path("age"), Value::Number(65.0));
        assert_eq!(result.get_path("discount"), Value::Number(10.0));

        let stats = executor.statistics();
        assert_eq!(stats.single_executions, 1);
        assert_eq!(stats.facts_processed, 1);
    }

    #[test]
    fn test_execute_batch_preserves_order() {
        let executor = executor(2);
        let facts = vec![fact_with_age(65), fact_with_age(30), fact_with_age(70)];
        let results = executor.execute_batch(facts).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].get_path("discount"), Value::Number(10.0));
        assert_eq!(results[1].get_path("discount"), Value::Null);
        assert_eq!(results[2].get_path("discount"), Value::Number(10.0));
    }

    #[test]
    fn test_empty_batch_short_circuits() {
        let executor = executor(2);
        let results = executor.execute_batch(Vec::new()).unwrap();
        assert!(results.is_empty());
        assert_eq!(executor.pool().statistics().borrowed, 0);
    }

    #[test]
    fn test_chunked_matches_batch_output() {
        let executor = executor(2);
        let ages = [65i64, 30, 70, 62, 18];
        for chunk_size in 1..=6 {
            let facts: Vec<Fact> = ages.iter().map(|a| fact_with_age(*a)).collect();
            let chunked = executor.execute_chunked(facts, chunk_size).unwrap();
            let facts: Vec<Fact> = ages.iter().map(|a| fact_with_age(*a)).collect();
            let batch = executor.execute_batch(facts).unwrap();
            assert_eq!(chunked, batch, "chunk_size {}", chunk_size);
        }
    }

    #[test]
    fn test_chunked_rejects_zero_chunk_size() {
        let executor = executor(2);
        let err = executor
            .execute_chunked(vec![fact_with_age(65)], 0)
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidChunkSize));
    }

    #[test]
    fn test_chunked_empty_input() {
        let executor = executor(2);
        assert!(executor.execute_chunked(Vec::new(), 3).unwrap().is_empty());
    }

    #[test]
    fn test_failed_execution_discards_handle() {
        let executor = executor(2);
        let mut bad = Fact::new();
        bad.insert("age", "sixty-five");
        let err = executor.execute_single(bad).unwrap_err();
        match &err {
            RuntimeError::Execution { phase, .. } => {
                assert_eq!(*phase, ExecutionPhase::Firing);
            }
            other => panic!("Expected execution error, got {}", other),
        }

        let pool_stats = executor.pool().statistics();
        assert_eq!(pool_stats.disposed, 1);
        assert_eq!(pool_stats.idle, 0);
        assert_eq!(executor.statistics().failures, 1);

        // The pool recovers with a fresh session
        let result = executor.execute_single(fact_with_age(65)).unwrap();
        assert_eq!(result.get_path("discount"), Value::Number(10.0));
    }

    #[test]
    fn test_selector_via_request() {
        let executor = executor(2);
        let request = ExecutionRequest::batch(vec![fact_with_age(65)])
            .with_selector(vec!["no_such_rule".to_string()]);
        let results = executor.execute(request).unwrap();
        assert_eq!(results[0].get_path("discount"), Value::Null);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_execute_async_completes() {
        let executor = executor(2);
        let execution =
            executor.execute_async(ExecutionRequest::batch(vec![fact_with_age(65), fact_with_age(30)]));
        let results = execution.wait().await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].get_path("discount"), Value::Number(10.0));

        let stats = executor.statistics();
        assert_eq!(stats.async_submitted, 1);
        assert_eq!(stats.async_completed, 1);
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let executor = executor(2);
        // On a current-thread runtime the spawned task cannot run before
        // the first await, so the cancel always wins the race
        let execution = executor.execute_async(ExecutionRequest::single(fact_with_age(65)));
        assert!(execution.cancel());
        assert!(!execution.has_started());

        let err = execution.wait().await.unwrap_err();
        assert!(matches!(err, RuntimeError::Cancelled));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_after_start_is_noop() {
        let executor = executor(2);
        let execution = executor.execute_async(ExecutionRequest::batch(
            (0..1000).map(|i| fact_with_age(i % 100)).collect(),
        ));

        while !execution.has_started() && !execution.handle.is_finished() {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        assert!(!execution.cancel());

        let results = execution.wait().await.unwrap();
        assert_eq!(results.len(), 1000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_async_submission_does_not_block() {
        let executor = executor(2);
        let facts: Vec<Fact> = (0..10_000).map(|i| fact_with_age(i % 100)).collect();

        let start = Instant::now();
        let execution = executor.execute_async(ExecutionRequest::chunked(facts, 500));
        let submit_elapsed = start.elapsed();
        // Submission returns promptly regardless of input size
        assert!(submit_elapsed < std::time::Duration::from_millis(100));

        let results = execution.wait().await.unwrap();
        assert_eq!(results.len(), 10_000);
    }
}
