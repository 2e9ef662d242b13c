//! Tests for builder modules

use std::collections::HashMap;

use fsq::builders::{build_dispatchers, DispatcherBuilder};
use fsq::config::{DispatcherConfig, FsqConfig};
use fsq::core::{DispatchAction, DispatchError, OperationError, RetryStrategy};
use fsq::runtime::TokioSpawner;

#[test]
fn test_dispatcher_builder_applies_config() {
    let config = DispatcherConfig {
        max_handles: Some(16.0),
        retry_interval_ms: 3,
        audit_capacity: None,
    };

    let builder = DispatcherBuilder::new("fs", config);
    assert_eq!(builder.name(), "fs");
    assert_eq!(builder.config().max_handles, Some(16.0));
    assert!(builder.audit_log().is_none());

    let dispatcher = builder.build(TokioSpawner::default()).unwrap();
    assert_eq!(dispatcher.name(), "fs");
    assert!((dispatcher.limit() - 16.0).abs() < f64::EPSILON);
    assert_eq!(dispatcher.retry(), RetryStrategy::from_interval_ms(3));
}

#[test]
fn test_dispatcher_builder_without_ceiling_is_unbounded() {
    let dispatcher = DispatcherBuilder::new("open", DispatcherConfig::default())
        .build(TokioSpawner::default())
        .unwrap();
    assert!(dispatcher.budget().is_unbounded());
}

#[test]
fn test_dispatcher_builder_rejects_invalid_config() {
    let config = DispatcherConfig {
        max_handles: Some(0.0),
        ..DispatcherConfig::default()
    };
    let err = DispatcherBuilder::new("bad", config)
        .build(TokioSpawner::default())
        .unwrap_err();
    match err {
        DispatchError::Config(msg) => assert!(msg.contains("budget `bad`"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_dispatcher_builder_wires_audit_log() {
    let config = DispatcherConfig {
        audit_capacity: Some(8),
        ..DispatcherConfig::default()
    };
    let builder = DispatcherBuilder::new("audited", config);
    let log = builder.audit_log().expect("audit log configured");
    let dispatcher = builder.build(TokioSpawner::default()).unwrap();

    dispatcher
        .submit(|| async { Ok::<_, OperationError>(()) })
        .await
        .unwrap();

    let actions: Vec<_> = log.lock().events().iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![DispatchAction::Submit, DispatchAction::Admit, DispatchAction::Complete]
    );
}

#[test]
fn test_build_dispatchers_gives_independent_budgets() {
    let mut budgets = HashMap::new();
    budgets.insert(
        "fs".to_string(),
        DispatcherConfig {
            max_handles: Some(4.0),
            ..DispatcherConfig::default()
        },
    );
    budgets.insert("sockets".to_string(), DispatcherConfig::default());
    let cfg = FsqConfig { budgets };

    let dispatchers = build_dispatchers(&cfg, TokioSpawner::default()).unwrap();
    assert_eq!(dispatchers.len(), 2);

    dispatchers["fs"].set_limit(2.0).unwrap();
    assert!((dispatchers["fs"].limit() - 2.0).abs() < f64::EPSILON);
    assert!(dispatchers["sockets"].budget().is_unbounded());
}

#[test]
fn test_build_dispatchers_rejects_empty_config() {
    let cfg = FsqConfig {
        budgets: HashMap::new(),
    };
    assert!(matches!(
        build_dispatchers(&cfg, TokioSpawner::default()),
        Err(DispatchError::Config(_))
    ));
}
