//! Execution session pool
//!
//! Manages a bounded set of reusable session handles bound to one compiled
//! rule base. Borrowing never blocks: when the pool is at its persistent
//! maximum, a transient handle is created instead and disposed on return
//! (availability over strict bounding).
//!
//! Handle lifecycle is CREATED -> IDLE -> BORROWED -> (IDLE | DISPOSED),
//! encoded as ownership transfer: `borrow` moves the handle to the caller,
//! `give_back`/`discard` move it back. No handle is ever held by two
//! callers.

use crate::error::{Result, RuntimeError};
use crate::metrics::{MetricsCollector, MetricsSink};
use crate::stats::PoolStatistics;
use chrono::{DateTime, Utc};
use ruleflow_engine::{RuleBase, RuleSession};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Exclusively owned reference to one execution session
pub struct SessionHandle {
    session: Box<dyn RuleSession>,
    id: Uuid,
    created_at: DateTime<Utc>,
    use_count: u64,
    transient: bool,
}

impl SessionHandle {
    fn new(session: Box<dyn RuleSession>, transient: bool) -> Self {
        Self {
            session,
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            use_count: 1,
            transient,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// How many times this handle has been borrowed
    pub fn use_count(&self) -> u64 {
        self.use_count
    }

    /// True for overflow handles that are never pooled
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    /// Mutable access to the underlying session
    pub fn session_mut(&mut self) -> &mut dyn RuleSession {
        &mut *self.session
    }
}

#[derive(Default)]
struct PoolCounters {
    created: AtomicU64,
    borrowed: AtomicU64,
    returned: AtomicU64,
    disposed: AtomicU64,
    transient_created: AtomicU64,
}

/// Bounded pool of reusable session handles
pub struct SessionPool {
    rule_base: Arc<dyn RuleBase>,
    idle: Mutex<VecDeque<SessionHandle>>,
    max_size: usize,
    /// Persistent handles in existence (idle + borrowed)
    pooled: AtomicUsize,
    counters: PoolCounters,
    metrics: Arc<MetricsCollector>,
}

impl SessionPool {
    pub fn new(
        rule_base: Arc<dyn RuleBase>,
        max_size: usize,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            rule_base,
            idle: Mutex::new(VecDeque::new()),
            max_size,
            pooled: AtomicUsize::new(0),
            counters: PoolCounters::default(),
            metrics,
        }
    }

    /// The rule base every handle in this pool is bound to
    pub fn rule_base(&self) -> &Arc<dyn RuleBase> {
        &self.rule_base
    }

    /// Borrow a session handle, reusing an idle one when possible.
    ///
    /// Never blocks: at maximum persistent size a transient handle is
    /// created so callers cannot deadlock waiting for a slot.
    pub fn borrow(&self) -> Result<SessionHandle> {
        // Pop before any further pool access; the guard must not be held
        // while the gauge re-locks the idle set
        let reused = self.idle.lock().unwrap().pop_front();
        if let Some(mut handle) = reused {
            handle.use_count += 1;
            self.counters.borrowed.fetch_add(1, Ordering::Relaxed);
            self.update_idle_gauge();
            tracing::trace!(session_id = %handle.id, use_count = handle.use_count, "reusing pooled session");
            return Ok(handle);
        }

        // Claim a persistent slot if one is free; overflow otherwise
        let persistent = self
            .pooled
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max_size).then_some(n + 1)
            })
            .is_ok();

        let session = match self.rule_base.create_session() {
            Ok(session) => session,
            Err(e) => {
                if persistent {
                    self.pooled.fetch_sub(1, Ordering::AcqRel);
                }
                self.metrics.record_error("session_creation");
                return Err(RuntimeError::SessionCreation {
                    source_id: self.rule_base.source_id().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        self.counters.created.fetch_add(1, Ordering::Relaxed);
        self.counters.borrowed.fetch_add(1, Ordering::Relaxed);
        self.metrics.counter("sessions_created").inc();

        let handle = SessionHandle::new(session, !persistent);
        if handle.transient {
            self.counters.transient_created.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                session_id = %handle.id,
                max_size = self.max_size,
                "pool at maximum; created transient session"
            );
        } else {
            tracing::debug!(session_id = %handle.id, "created pooled session");
        }
        Ok(handle)
    }

    /// Return a handle to the pool.
    ///
    /// The session is reset before re-entering the idle set; a handle that
    /// cannot be reset is disposed instead of recycled. Transient handles
    /// are always disposed.
    pub fn give_back(&self, mut handle: SessionHandle) {
        self.counters.returned.fetch_add(1, Ordering::Relaxed);

        if handle.transient {
            tracing::trace!(session_id = %handle.id, "disposing transient session");
            self.dispose(handle);
            return;
        }

        match handle.session.reset() {
            Ok(()) => {
                debug_assert_eq!(handle.session.fact_count(), 0);
                self.idle.lock().unwrap().push_back(handle);
                self.update_idle_gauge();
            }
            Err(e) => {
                tracing::warn!(session_id = %handle.id, error = %e, "session reset failed; disposing");
                self.dispose(handle);
            }
        }
    }

    /// Dispose a handle without returning it, e.g. after an execution
    /// failure left its state suspect.
    pub fn discard(&self, handle: SessionHandle) {
        tracing::debug!(session_id = %handle.id, "discarding session");
        self.dispose(handle);
    }

    fn dispose(&self, handle: SessionHandle) {
        if !handle.transient {
            self.pooled.fetch_sub(1, Ordering::AcqRel);
        }
        self.counters.disposed.fetch_add(1, Ordering::Relaxed);
        self.metrics.counter("sessions_disposed").inc();
        drop(handle);
    }

    /// Dispose every idle handle; used at shutdown
    pub fn clear(&self) {
        let drained: Vec<SessionHandle> = self.idle.lock().unwrap().drain(..).collect();
        let count = drained.len();
        for handle in drained {
            self.dispose(handle);
        }
        self.update_idle_gauge();
        tracing::info!(disposed = count, "cleared session pool");
    }

    fn update_idle_gauge(&self) {
        let idle = self.idle.lock().unwrap().len();
        self.metrics.gauge("pool_idle").set(idle as i64);
    }

    /// Snapshot of the pool counters
    pub fn statistics(&self) -> PoolStatistics {
        PoolStatistics {
            idle: self.idle.lock().unwrap().len(),
            pooled: self.pooled.load(Ordering::Acquire),
            max_size: self.max_size,
            created: self.counters.created.load(Ordering::Relaxed),
            borrowed: self.counters.borrowed.load(Ordering::Relaxed),
            returned: self.counters.returned.load(Ordering::Relaxed),
            disposed: self.counters.disposed.load(Ordering::Relaxed),
            transient_created: self.counters.transient_created.load(Ordering::Relaxed),
        }
    }

    /// Reset the pool counters (explicit request only)
    pub fn reset_statistics(&self) {
        self.counters.created.store(0, Ordering::Relaxed);
        self.counters.borrowed.store(0, Ordering::Relaxed);
        self.counters.returned.store(0, Ordering::Relaxed);
        self.counters.disposed.store(0, Ordering::Relaxed);
        self.counters.transient_created.store(0, Ordering::Relaxed);
    }
}
