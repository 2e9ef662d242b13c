//! Tests for audit sink

use fsq::core::{build_dispatch_event, AuditSink, DispatchAction, InMemoryAuditSink};
use fsq::util::UnitId;

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);
    let unit = UnitId::new();

    sink.record(build_dispatch_event(unit, "fs", DispatchAction::Submit, 0, 4.0));
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].unit, unit);
    assert_eq!(events[0].dispatcher, "fs");
    assert_eq!(events[0].action, DispatchAction::Submit);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);
    let units = [UnitId::new(), UnitId::new(), UnitId::new()];

    for unit in units {
        sink.record(build_dispatch_event(unit, "fs", DispatchAction::Admit, 1, 2.0));
    }

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].unit, units[1]); // First one popped
    assert_eq!(events[1].unit, units[2]);
}

#[test]
fn test_build_dispatch_event() {
    let unit = UnitId::new();
    let event = build_dispatch_event(unit, "sockets", DispatchAction::Shrink, 3, 3.0);

    assert_eq!(event.unit, unit);
    assert_eq!(event.dispatcher, "sockets");
    assert_eq!(event.action, DispatchAction::Shrink);
    assert_eq!(event.outstanding, 3);
    assert!((event.limit - 3.0).abs() < f64::EPSILON);
    assert!(event.at_ms > 0);
}

#[test]
fn test_zero_capacity_sink_keeps_nothing() {
    let mut sink = InMemoryAuditSink::new(0);
    sink.record(build_dispatch_event(UnitId::new(), "fs", DispatchAction::Cancel, 0, 1.0));
    assert!(sink.events().is_empty());
}
