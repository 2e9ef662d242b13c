//! Builders to construct dispatchers from configuration.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::{DispatcherConfig, FsqConfig};
use crate::core::{BudgetTracker, DispatchError, Dispatcher, InMemoryAuditSink};

/// Builds one named dispatcher from its configuration.
#[derive(Debug, Clone)]
pub struct DispatcherBuilder {
    name: String,
    config: DispatcherConfig,
    audit: Option<Arc<Mutex<InMemoryAuditSink>>>,
}

impl DispatcherBuilder {
    /// Start from a name and configuration.
    pub fn new(name: impl Into<String>, config: DispatcherConfig) -> Self {
        let audit = config
            .audit_capacity
            .map(|capacity| Arc::new(Mutex::new(InMemoryAuditSink::new(capacity))));
        Self {
            name: name.into(),
            config,
            audit,
        }
    }

    /// Dispatcher name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration being built from.
    pub const fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Audit buffer the built dispatcher records into, when `audit_capacity` is set.
    pub fn audit_log(&self) -> Option<Arc<Mutex<InMemoryAuditSink>>> {
        self.audit.clone()
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Config`] when the configuration is invalid.
    pub fn build<S>(&self, spawner: S) -> Result<Dispatcher<S>, DispatchError> {
        self.config
            .validate()
            .map_err(|e| DispatchError::Config(format!("budget `{}`: {e}", self.name)))?;

        let budget = match self.config.max_handles {
            Some(max) => BudgetTracker::with_limit(max)?,
            None => BudgetTracker::new(),
        };
        let mut dispatcher = Dispatcher::new(budget, spawner)
            .named(self.name.clone())
            .with_retry(self.config.retry_strategy());
        if let Some(audit) = &self.audit {
            dispatcher = dispatcher.with_audit(Box::new(Arc::clone(audit)));
        }

        tracing::debug!(
            "built dispatcher `{}` (max_handles={:?}, retry={:?})",
            self.name,
            self.config.max_handles,
            dispatcher.retry()
        );
        Ok(dispatcher)
    }
}

/// Build one dispatcher per configured budget, all sharing `spawner`.
///
/// # Errors
///
/// Returns [`DispatchError::Config`] when the configuration is invalid.
pub fn build_dispatchers<S: Clone>(
    cfg: &FsqConfig,
    spawner: S,
) -> Result<HashMap<String, Dispatcher<S>>, DispatchError> {
    cfg.validate().map_err(DispatchError::Config)?;

    let mut dispatchers = HashMap::new();
    for (name, budget_cfg) in &cfg.budgets {
        let dispatcher =
            DispatcherBuilder::new(name.clone(), budget_cfg.clone()).build(spawner.clone())?;
        dispatchers.insert(name.clone(), dispatcher);
    }
    Ok(dispatchers)
}
