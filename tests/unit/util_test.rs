//! Tests for utility functions

use fsq::util::{now_ms, UnitId};

#[test]
fn test_unit_ids_are_unique() {
    let a = UnitId::new();
    let b = UnitId::new();
    assert_ne!(a, b);
    assert_eq!(a.to_string().len(), 36);
}

#[test]
fn test_unit_id_serializes_as_plain_string() {
    let id = UnitId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));
}

#[test]
fn test_now_ms_is_after_2020() {
    assert!(now_ms() > 1_577_836_800_000);
}

#[test]
fn test_init_tracing_twice_is_harmless() {
    fsq::util::init_tracing();
    fsq::util::init_tracing();
    tracing::debug!("tracing initialised");
}
