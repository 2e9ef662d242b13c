//! Tests for configuration validation

use std::collections::HashMap;

use fsq::config::{DispatcherConfig, FsqConfig, ENV_MAX_HANDLES, ENV_RETRY_INTERVAL_MS};
use fsq::core::RetryStrategy;

fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
    move |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).to_string())
    }
}

#[test]
fn test_dispatcher_config_defaults_validate() {
    let cfg = DispatcherConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.max_handles, None);
    assert_eq!(cfg.retry_strategy(), RetryStrategy::Yield);
}

#[test]
fn test_dispatcher_config_rejects_bad_ceilings() {
    for bad in [0.0, 0.5, -3.0, f64::NAN, f64::INFINITY] {
        let cfg = DispatcherConfig {
            max_handles: Some(bad),
            ..DispatcherConfig::default()
        };
        assert!(cfg.validate().is_err(), "{bad} should be rejected");
    }
}

#[test]
fn test_dispatcher_config_rejects_zero_audit_capacity() {
    let cfg = DispatcherConfig {
        audit_capacity: Some(0),
        ..DispatcherConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_from_lookup_reads_both_variables() {
    let pairs = [(ENV_MAX_HANDLES, "64"), (ENV_RETRY_INTERVAL_MS, " 5 ")];
    let cfg = DispatcherConfig::from_lookup(lookup(&pairs)).unwrap();
    assert_eq!(cfg.max_handles, Some(64.0));
    assert_eq!(
        cfg.retry_strategy(),
        RetryStrategy::Interval(std::time::Duration::from_millis(5))
    );
}

#[test]
fn test_from_lookup_with_nothing_set_is_default() {
    let cfg = DispatcherConfig::from_lookup(|_| None).unwrap();
    assert_eq!(cfg, DispatcherConfig::default());
}

#[test]
fn test_from_lookup_rejects_garbage() {
    let pairs = [(ENV_MAX_HANDLES, "lots")];
    let err = DispatcherConfig::from_lookup(lookup(&pairs)).unwrap_err();
    assert!(err.to_string().contains(ENV_MAX_HANDLES));

    let pairs = [(ENV_MAX_HANDLES, "0")];
    assert!(DispatcherConfig::from_lookup(lookup(&pairs)).is_err());

    let pairs = [(ENV_RETRY_INTERVAL_MS, "-1")];
    assert!(DispatcherConfig::from_lookup(lookup(&pairs)).is_err());
}

#[test]
fn test_fsq_config_requires_a_budget() {
    let cfg = FsqConfig {
        budgets: HashMap::new(),
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_fsq_config_from_json() {
    let json = r#"{
        "budgets": {
            "fs": { "max_handles": 256, "retry_interval_ms": 2 },
            "scratch": {}
        }
    }"#;
    let cfg = FsqConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.budgets.len(), 2);
    assert_eq!(cfg.budgets["fs"].max_handles, Some(256.0));
    assert_eq!(cfg.budgets["scratch"], DispatcherConfig::default());
}

#[test]
fn test_fsq_config_from_json_names_bad_budget() {
    let json = r#"{ "budgets": { "fs": { "max_handles": 0.25 } } }"#;
    let err = FsqConfig::from_json_str(json).unwrap_err();
    assert!(err.contains("budget `fs` invalid"), "{err}");

    assert!(FsqConfig::from_json_str("not json")
        .unwrap_err()
        .starts_with("parse error"));
}
