//! Configuration models for dispatchers and their budgets.

pub mod dispatcher;

pub use dispatcher::{DispatcherConfig, FsqConfig, ENV_MAX_HANDLES, ENV_RETRY_INTERVAL_MS};
