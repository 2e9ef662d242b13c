//! Dispatcher: admission control over a handle budget.
//!
//! Every submitted unit gets its own driver task. The driver runs the
//! admission loop:
//!
//! 1. If the caller cancelled, reject with [`DispatchError::Cancelled`].
//! 2. Try to take a budget slot; if none is free, yield and go to 1.
//! 3. Start the unit and await it.
//! 4. Release the slot, then settle the outcome:
//!    - exhaustion with other units still in flight clamps the ceiling to
//!      that number and goes back to 1;
//!    - exhaustion with nothing else in flight rejects with
//!      [`DispatchError::BudgetExhausted`];
//!    - any other error or success is delivered to the caller once.
//!
//! Retries are rescheduled independently per unit, so admission order is
//! only roughly FIFO.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::core::audit::{build_dispatch_event, AuditSink, DispatchAction};
use crate::core::pending::UnitShared;
use crate::core::{BudgetTracker, DispatchError, OperationError, PendingOperation, UnitStatus};
use crate::runtime::api::BudgetSnapshot;
use crate::runtime::TokioSpawner;

/// Boxed future produced by starting a work unit.
pub type OperationFuture<T> =
    Pin<Box<dyn Future<Output = Result<T, OperationError>> + Send + 'static>>;

/// Something the dispatcher can start, possibly more than once.
///
/// A unit is restarted after an exhaustion report, so starting must be
/// repeatable. Closures returning a future implement this automatically.
pub trait WorkUnit: Send + 'static {
    /// Value delivered on success.
    type Output: Send + 'static;

    /// Start the underlying action.
    fn start(&mut self) -> OperationFuture<Self::Output>;
}

impl<F, Fut, T> WorkUnit for F
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, OperationError>> + Send + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn start(&mut self) -> OperationFuture<T> {
        Box::pin((self)())
    }
}

/// Abstraction for spawning driver tasks on a runtime.
pub trait Spawn {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// How a deferred unit waits before its next admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryStrategy {
    /// Yield to the scheduler once per attempt.
    #[default]
    Yield,
    /// Sleep for a fixed interval per attempt.
    Interval(Duration),
}

impl RetryStrategy {
    /// Map a millisecond interval to a strategy; zero means yield.
    #[must_use]
    pub const fn from_interval_ms(ms: u64) -> Self {
        if ms == 0 {
            Self::Yield
        } else {
            Self::Interval(Duration::from_millis(ms))
        }
    }

    async fn wait(self) {
        match self {
            Self::Yield => tokio::task::yield_now().await,
            Self::Interval(interval) => tokio::time::sleep(interval).await,
        }
    }
}

type SharedAudit = Arc<Mutex<Box<dyn AuditSink>>>;

/// Runs work units under a shrinking concurrency budget.
///
/// Cloning is cheap and clones share the same budget.
#[derive(Clone)]
pub struct Dispatcher<S = TokioSpawner> {
    name: Arc<str>,
    budget: Arc<BudgetTracker>,
    retry: RetryStrategy,
    spawner: S,
    audit: Option<SharedAudit>,
}

impl Default for Dispatcher<TokioSpawner> {
    fn default() -> Self {
        Self::new(BudgetTracker::new(), TokioSpawner::default())
    }
}

impl<S> fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("name", &self.name)
            .field("budget", &self.budget)
            .field("retry", &self.retry)
            .field("audit", &self.audit.is_some())
            .finish_non_exhaustive()
    }
}

impl<S> Dispatcher<S> {
    /// Create a dispatcher that owns `budget` and spawns drivers on `spawner`.
    pub fn new(budget: BudgetTracker, spawner: S) -> Self {
        Self {
            name: Arc::from("default"),
            budget: Arc::new(budget),
            retry: RetryStrategy::default(),
            spawner,
            audit: None,
        }
    }

    /// Label used in logs, audit events, and snapshots.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Arc::from(name.into());
        self
    }

    /// Change how deferred units wait between attempts.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(Arc::new(Mutex::new(audit)));
        self
    }

    /// Dispatcher label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying budget.
    pub fn budget(&self) -> &BudgetTracker {
        &self.budget
    }

    /// Current retry strategy.
    pub const fn retry(&self) -> RetryStrategy {
        self.retry
    }

    /// Units currently admitted and not yet finished.
    pub fn outstanding(&self) -> usize {
        self.budget.outstanding()
    }

    /// Current ceiling.
    pub fn limit(&self) -> f64 {
        self.budget.limit()
    }

    /// Replace the ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidLimit`] unless `limit` is finite and at least one.
    pub fn set_limit(&self, limit: f64) -> Result<(), DispatchError> {
        self.budget.set_limit(limit)?;
        tracing::info!(dispatcher = %self.name, limit, "handle limit set");
        Ok(())
    }

    /// Point-in-time view of the budget.
    pub fn snapshot(&self) -> BudgetSnapshot {
        BudgetSnapshot {
            name: self.name.to_string(),
            outstanding: self.budget.outstanding(),
            limit: (!self.budget.is_unbounded()).then(|| self.budget.limit()),
        }
    }
}

impl<S: Spawn> Dispatcher<S> {
    /// Submit a unit and get a handle to its eventual outcome.
    ///
    /// The unit is considered for admission right away on the spawner.
    pub fn submit<U: WorkUnit>(&self, unit: U) -> PendingOperation<U::Output> {
        let shared = UnitShared::new();
        let (tx, rx) = oneshot::channel();
        let driver = Driver {
            name: Arc::clone(&self.name),
            budget: Arc::clone(&self.budget),
            retry: self.retry,
            audit: self.audit.clone(),
            shared: Arc::clone(&shared),
        };

        driver.record(DispatchAction::Submit);
        tracing::trace!(dispatcher = %self.name, unit = %shared.id, "unit submitted");
        self.spawner.spawn(driver.run(unit, tx));

        PendingOperation::new(shared, rx)
    }
}

/// Per-unit state owned by the driver task.
struct Driver {
    name: Arc<str>,
    budget: Arc<BudgetTracker>,
    retry: RetryStrategy,
    audit: Option<SharedAudit>,
    shared: Arc<UnitShared>,
}

impl Driver {
    async fn run<U: WorkUnit>(
        self,
        mut unit: U,
        tx: oneshot::Sender<Result<U::Output, DispatchError>>,
    ) {
        let outcome = self.drive(&mut unit).await;
        if tx.send(outcome).is_err() {
            tracing::trace!(unit = %self.shared.id, "pending operation dropped before delivery");
        }
    }

    #[allow(clippy::cast_precision_loss)]
    async fn drive<U: WorkUnit>(&self, unit: &mut U) -> Result<U::Output, DispatchError> {
        loop {
            if self.shared.is_cancel_requested() {
                self.shared.set_status(UnitStatus::Cancelled);
                self.record(DispatchAction::Cancel);
                tracing::debug!(dispatcher = %self.name, unit = %self.shared.id, "unit cancelled before admission");
                return Err(DispatchError::Cancelled);
            }

            let Some(permit) = self.budget.try_acquire() else {
                tracing::trace!(dispatcher = %self.name, unit = %self.shared.id, "at capacity, deferring");
                self.retry.wait().await;
                continue;
            };

            self.shared.set_status(UnitStatus::Running);
            self.record(DispatchAction::Admit);
            tracing::debug!(
                dispatcher = %self.name,
                unit = %self.shared.id,
                outstanding = self.budget.outstanding(),
                "unit admitted"
            );

            let result = start_guarded(unit).await;
            let remaining = permit.release();

            match result {
                Ok(value) => {
                    self.shared.set_status(UnitStatus::Completed);
                    self.record(DispatchAction::Complete);
                    tracing::debug!(dispatcher = %self.name, unit = %self.shared.id, "unit completed");
                    return Ok(value);
                }
                Err(err) if err.is_resource_exhausted() => {
                    if remaining == 0 {
                        self.shared.set_status(UnitStatus::Completed);
                        self.record(DispatchAction::Exhausted);
                        tracing::error!(
                            dispatcher = %self.name,
                            unit = %self.shared.id,
                            "handle table exhausted with no other units in flight"
                        );
                        return Err(DispatchError::BudgetExhausted);
                    }

                    self.budget.store_limit(remaining as f64);
                    self.shared.set_status(UnitStatus::Queued);
                    self.record(DispatchAction::Shrink);
                    tracing::warn!(
                        dispatcher = %self.name,
                        unit = %self.shared.id,
                        limit = remaining,
                        "handle table exhausted, shrinking budget and retrying"
                    );
                    self.retry.wait().await;
                }
                Err(err) => {
                    self.shared.set_status(UnitStatus::Completed);
                    self.record(DispatchAction::Fail);
                    tracing::debug!(dispatcher = %self.name, unit = %self.shared.id, error = %err, "unit failed");
                    return Err(DispatchError::OperationFailed(err));
                }
            }
        }
    }

    fn record(&self, action: DispatchAction) {
        if let Some(audit) = &self.audit {
            audit.lock().record(build_dispatch_event(
                self.shared.id,
                self.name.as_ref(),
                action,
                self.budget.outstanding(),
                self.budget.limit(),
            ));
        }
    }
}

/// Start and await a unit, turning panics from either step into errors.
async fn start_guarded<U: WorkUnit>(unit: &mut U) -> Result<U::Output, OperationError> {
    let started = std::panic::catch_unwind(AssertUnwindSafe(|| unit.start()));
    match started {
        Ok(fut) => AssertUnwindSafe(fut)
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(OperationError::Panicked(panic_message(&*payload)))),
        Err(payload) => Err(OperationError::Panicked(panic_message(&*payload))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
