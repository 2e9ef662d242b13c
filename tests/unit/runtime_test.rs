//! Tests for tokio spawner and API helpers

use std::collections::HashMap;

use fsq::core::{BudgetTracker, DispatchError, Dispatcher, Spawn};
use fsq::ops::{FsQueue, OperationOutput};
use fsq::runtime::{list_budgets, submit_json, BudgetSnapshot, TokioSpawner};
use fsq::InMemoryFileSystem;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[tokio::test]
async fn test_tokio_spawner_try_current_inside_runtime() {
    assert!(TokioSpawner::try_current().is_some());
}

#[test]
fn test_tokio_spawner_try_current_outside_runtime() {
    assert!(TokioSpawner::try_current().is_none());
}

#[test]
fn test_list_budgets_sorted_by_name() {
    let mut dispatchers = HashMap::new();
    dispatchers.insert(
        "zeta".to_string(),
        Dispatcher::new(BudgetTracker::new(), TokioSpawner::default()).named("zeta"),
    );
    dispatchers.insert(
        "alpha".to_string(),
        Dispatcher::new(BudgetTracker::with_limit(3.0).unwrap(), TokioSpawner::default())
            .named("alpha"),
    );

    let snapshots = list_budgets(&dispatchers);
    assert_eq!(
        snapshots,
        vec![
            BudgetSnapshot {
                name: "alpha".into(),
                outstanding: 0,
                limit: Some(3.0),
            },
            BudgetSnapshot {
                name: "zeta".into(),
                outstanding: 0,
                limit: None,
            },
        ]
    );
}

#[tokio::test]
async fn test_submit_json_runs_named_operation() {
    let fs = InMemoryFileSystem::new();
    fs.insert_file("/logs/a.log", "a");
    fs.insert_file("/logs/b.log", "b");
    let queue = FsQueue::with_file_system(fs);

    let output = submit_json(&queue, r#"{"op": "read_dir", "path": "/logs"}"#)
        .unwrap()
        .await
        .unwrap();
    assert_eq!(
        output,
        OperationOutput::Entries {
            files: vec!["a.log".into(), "b.log".into()]
        }
    );
    assert_eq!(
        serde_json::to_value(&output).unwrap(),
        serde_json::json!({ "files": ["a.log", "b.log"] })
    );
}

#[tokio::test]
async fn test_submit_json_rejects_unknown_operation() {
    let queue = FsQueue::with_file_system(InMemoryFileSystem::new());
    let err = submit_json(&queue, r#"{"op": "chmod", "path": "/"}"#).unwrap_err();
    assert!(matches!(err, DispatchError::InvalidRequest(_)));
    assert_eq!(queue.outstanding(), 0);
}
