//! Core admission control: budget accounting, dispatch, and pending handles.

pub mod audit;
pub mod budget;
pub mod dispatcher;
pub mod error;
pub mod pending;

pub use audit::{build_dispatch_event, AuditSink, DispatchAction, DispatchEvent, InMemoryAuditSink};
pub use budget::{BudgetPermit, BudgetTracker, UNBOUNDED_LIMIT};
pub use dispatcher::{Dispatcher, OperationFuture, RetryStrategy, Spawn, WorkUnit};
pub use error::{AppResult, DispatchError, OperationError};
pub use pending::{CancelHandle, PendingOperation, UnitStatus};
