//! Caller-facing handle for a submitted unit.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::core::DispatchError;
use crate::util::UnitId;

/// Lifecycle of a submitted unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// Waiting for admission (initially, or again after an exhaustion retry).
    Queued,
    /// Admitted; the underlying action has been started.
    Running,
    /// Finished with a result or an error; its slot has been released.
    Completed,
    /// Withdrawn by the caller before admission; never ran.
    Cancelled,
}

impl UnitStatus {
    /// Whether no further transitions can happen.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// State shared between a pending handle and the driver running its unit.
#[derive(Debug)]
pub(crate) struct UnitShared {
    pub(crate) id: UnitId,
    status: Mutex<UnitStatus>,
    cancel_requested: AtomicBool,
}

impl UnitShared {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            id: UnitId::new(),
            status: Mutex::new(UnitStatus::Queued),
            cancel_requested: AtomicBool::new(false),
        })
    }

    pub(crate) fn status(&self) -> UnitStatus {
        *self.status.lock()
    }

    pub(crate) fn set_status(&self, status: UnitStatus) {
        *self.status.lock() = status;
    }

    pub(crate) fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::Acquire)
    }

    fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::Release);
    }
}

/// Cloneable handle that can cancel a unit while someone else awaits it.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    shared: Arc<UnitShared>,
}

impl CancelHandle {
    /// Mark the unit cancelled. Only takes effect while it is still queued.
    pub fn cancel(&self) {
        self.shared.request_cancel();
    }

    /// Identifier of the unit this handle controls.
    #[must_use]
    pub fn id(&self) -> UnitId {
        self.shared.id
    }
}

/// Eventual outcome of a submitted unit.
///
/// Await it for the result. Dropping it does not cancel the unit; call
/// [`PendingOperation::cancel`] for that. A unit that was already admitted
/// runs to completion regardless of cancellation.
#[derive(Debug)]
#[must_use = "a pending operation does nothing for the caller unless awaited"]
pub struct PendingOperation<T> {
    shared: Arc<UnitShared>,
    rx: oneshot::Receiver<Result<T, DispatchError>>,
}

impl<T> Unpin for PendingOperation<T> {}

impl<T> PendingOperation<T> {
    pub(crate) fn new(
        shared: Arc<UnitShared>,
        rx: oneshot::Receiver<Result<T, DispatchError>>,
    ) -> Self {
        Self { shared, rx }
    }

    /// Identifier of the underlying unit.
    #[must_use]
    pub fn id(&self) -> UnitId {
        self.shared.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> UnitStatus {
        self.shared.status()
    }

    /// Mark the unit cancelled. See [`CancelHandle::cancel`].
    pub fn cancel(&self) {
        self.shared.request_cancel();
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancel_requested(&self) -> bool {
        self.shared.is_cancel_requested()
    }

    /// Detachable cancellation handle for this unit.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Future for PendingOperation<T> {
    type Output = Result<T, DispatchError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(DispatchError::Abandoned)))
    }
}
