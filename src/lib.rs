//! # fsq
//!
//! A handle-budgeted dispatcher for asynchronous filesystem calls.
//!
//! Opening too many files at once makes the OS refuse with `EMFILE`. This
//! crate puts a dispatcher in front of filesystem calls that caps how many
//! are in flight, parks the rest until a slot frees up, and learns the real
//! ceiling the hard way: when the OS reports exhaustion, the budget is
//! clamped to the number of calls still in flight and the refused call is
//! retried instead of failing.
//!
//! Callers never see the limiting. They submit a call and await a
//! [`PendingOperation`](crate::core::PendingOperation).
//!
//! ## Key Pieces
//!
//! - **`BudgetTracker`**: outstanding count plus a validated, adjustable ceiling
//! - **`Dispatcher`**: admission loop, deferral, and shrink-on-exhaustion
//! - **`PendingOperation`**: awaitable result that can be cancelled while queued
//! - **`FsQueue`**: typed filesystem facade over any `FileSystem` provider
//! - **`InMemoryFileSystem`**: provider with a simulated handle table for tests
//!
//! ```rust,ignore
//! use fsq::ops::FsQueue;
//!
//! let queue = FsQueue::new();
//! queue.set_limit(512.0)?;
//!
//! let names = queue.read_dir("/var/log").await?;
//! let reads: Vec<_> = names.iter().map(|n| queue.read_file(format!("/var/log/{n}"))).collect();
//! for read in reads {
//!     let bytes = read.await?;
//!     // ...
//! }
//! ```
//!
//! Independent budgets are separate dispatchers; see
//! [`builders::build_dispatchers`] for building them from configuration.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core admission control: budget, dispatcher, pending handles, errors.
pub mod core;
/// Configuration models for dispatchers.
pub mod config;
/// Builders to construct dispatchers from configuration.
pub mod builders;
/// Infrastructure adapters: concrete filesystem providers.
pub mod infra;
/// Filesystem operations and the `FsQueue` facade.
pub mod ops;
/// Runtime adapters and API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;

pub use crate::core::{
    BudgetTracker, CancelHandle, DispatchError, Dispatcher, OperationError, PendingOperation,
    UnitStatus,
};
pub use crate::infra::fs::{InMemoryFileSystem, TokioFileSystem};
pub use crate::ops::{FileSystem, FsQueue, Operation, OperationOutput};
