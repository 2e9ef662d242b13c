//! API-facing request/response models.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::{DispatchError, Dispatcher, PendingOperation, Spawn};
use crate::ops::{FileSystem, FsQueue, Operation, OperationOutput};

/// Point-in-time view of one budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    /// Dispatcher name.
    pub name: String,
    /// Units in flight.
    pub outstanding: usize,
    /// Ceiling, or `None` while still unbounded.
    pub limit: Option<f64>,
}

/// Snapshot every dispatcher, sorted by name.
pub fn list_budgets<S>(dispatchers: &HashMap<String, Dispatcher<S>>) -> Vec<BudgetSnapshot> {
    let mut snapshots: Vec<_> = dispatchers.values().map(Dispatcher::snapshot).collect();
    snapshots.sort_by(|a, b| a.name.cmp(&b.name));
    snapshots
}

/// Parse an operation addressed by name from JSON and submit it.
///
/// ```rust,ignore
/// let pending = submit_json(&queue, r#"{"op": "read_dir", "path": "/tmp"}"#)?;
/// ```
///
/// # Errors
///
/// Returns [`DispatchError::InvalidRequest`] when the request does not name a known operation.
pub fn submit_json<F, S>(
    queue: &FsQueue<F, S>,
    input: &str,
) -> Result<PendingOperation<OperationOutput>, DispatchError>
where
    F: FileSystem,
    S: Spawn,
{
    let op: Operation = serde_json::from_str(input)
        .map_err(|e| DispatchError::InvalidRequest(e.to_string()))?;
    Ok(queue.submit(op))
}
