//! Tests for error types

use fsq::core::{DispatchError, OperationError};

#[test]
fn test_invalid_limit_error() {
    let err = DispatchError::InvalidLimit(0.5);
    assert_eq!(format!("{}", err), "invalid handle limit: 0.5");
}

#[test]
fn test_budget_exhausted_error() {
    let err = DispatchError::BudgetExhausted;
    assert_eq!(
        format!("{}", err),
        "handle table exhausted with no outstanding units left to shrink to"
    );
}

#[test]
fn test_cancelled_error() {
    let err = DispatchError::Cancelled;
    assert_eq!(format!("{}", err), "operation cancelled before admission");
}

#[test]
fn test_operation_failed_passes_detail_through() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied: /etc/shadow");
    let err = DispatchError::from(OperationError::from(io));
    assert_eq!(format!("{}", err), "operation failed: denied: /etc/shadow");
    match err {
        DispatchError::OperationFailed(OperationError::Io(inner)) => {
            assert_eq!(inner.kind(), std::io::ErrorKind::PermissionDenied);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_config_error() {
    let err = DispatchError::Config("budget `fs`: bad".to_string());
    assert_eq!(format!("{}", err), "config invalid: budget `fs`: bad");
}
