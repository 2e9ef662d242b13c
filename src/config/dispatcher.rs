//! Dispatcher configuration structures.

use std::collections::HashMap;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, RetryStrategy};

/// Environment variable holding the initial handle ceiling.
pub const ENV_MAX_HANDLES: &str = "FSQ_MAX_HANDLES";
/// Environment variable holding the retry interval in milliseconds.
pub const ENV_RETRY_INTERVAL_MS: &str = "FSQ_RETRY_INTERVAL_MS";

/// Configuration for one dispatcher (one independent budget).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Initial ceiling; absent means unbounded until exhaustion shrinks it.
    #[serde(default)]
    pub max_handles: Option<f64>,
    /// Wait between admission attempts; zero yields to the scheduler instead.
    #[serde(default)]
    pub retry_interval_ms: u64,
    /// Keep this many audit events in memory; absent disables auditing.
    #[serde(default)]
    pub audit_capacity: Option<usize>,
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsqConfig {
    /// Map of budget name to configuration.
    pub budgets: HashMap<String, DispatcherConfig>,
}

impl DispatcherConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Describes the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(max) = self.max_handles {
            if !max.is_finite() || max < 1.0 {
                return Err(format!("max_handles must be a finite number >= 1, got {max}"));
            }
        }
        if self.audit_capacity == Some(0) {
            return Err("audit_capacity must be greater than 0".into());
        }
        Ok(())
    }

    /// Retry strategy implied by `retry_interval_ms`.
    #[must_use]
    pub const fn retry_strategy(&self) -> RetryStrategy {
        RetryStrategy::from_interval_ms(self.retry_interval_ms)
    }

    /// Build from `FSQ_MAX_HANDLES` / `FSQ_RETRY_INTERVAL_MS`, loading `.env` first.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Fails when a variable is set but does not parse or validate.
    pub fn from_env() -> AppResult<Self> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!("ignoring unreadable .env file: {}", err);
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment, in [`Self::from_env`]).
    ///
    /// # Errors
    ///
    /// Fails when a value is present but does not parse or validate.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(ENV_MAX_HANDLES) {
            let max: f64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_MAX_HANDLES}={raw} is not a number"))?;
            cfg.max_handles = Some(max);
        }
        if let Some(raw) = lookup(ENV_RETRY_INTERVAL_MS) {
            cfg.retry_interval_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_RETRY_INTERVAL_MS}={raw} is not a whole number"))?;
        }
        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}

impl FsqConfig {
    /// Validate all budgets and ensure at least one exists.
    ///
    /// # Errors
    ///
    /// Names the first invalid budget.
    pub fn validate(&self) -> Result<(), String> {
        if self.budgets.is_empty() {
            return Err("at least one budget must be defined".into());
        }
        for (name, budget) in &self.budgets {
            budget
                .validate()
                .map_err(|e| format!("budget `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns parse or validation failures as text.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
