//! Tests for trace sinks and the trace audit

use ferry_crossing::core::{
    audit_trace, AuditViolation, DepartureTrigger, InMemoryTraceSink, JsonLinesSink, Side,
    Trace, TraceEvent, TraceKind, TraceSink, VehicleClass, VehicleId,
};

fn truck(n: u32) -> VehicleId {
    VehicleId::new(VehicleClass::Heavy, n)
}

fn event(seq: u64, kind: TraceKind) -> TraceEvent {
    TraceEvent { seq, at_ms: 0, kind }
}

#[test]
fn test_in_memory_sink_drops_oldest() {
    let mut sink = InMemoryTraceSink::new(2);
    for departure in 1..=3 {
        sink.record(event(
            departure,
            TraceKind::ControllerStopped { departures: departure },
        ));
    }
    let seqs: Vec<u64> = sink.events().iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![2, 3]);
}

#[test]
fn test_trace_sequences_events() {
    let sink = InMemoryTraceSink::new(10);
    let trace = Trace::new(Box::new(sink.clone()));
    trace.record(TraceKind::FerryArrived {
        side: Side::East,
        crossing: 1,
    });
    trace.record(TraceKind::ControllerStopped { departures: 1 });

    let events = sink.events();
    assert_eq!(trace.recorded(), 2);
    assert_eq!(events[0].seq, 0);
    assert_eq!(events[1].seq, 1);
    assert!(events[0].at_ms > 0);
}

#[test]
fn test_json_lines_sink_writes_one_object_per_line() {
    let mut sink = JsonLinesSink::new(Vec::new());
    sink.record(event(
        0,
        TraceKind::Boarded {
            vehicle: truck(2),
            size: 3,
            side: Side::West,
            load: 3,
            capacity: 20,
        },
    ));
    sink.record(event(
        1,
        TraceKind::Departed {
            departure: 1,
            from: Side::West,
            load: 3,
            trigger: DepartureTrigger::Partial,
        },
    ));

    let bytes = sink.into_inner();
    let text = String::from_utf8(bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["event"], "boarded");
    assert_eq!(first["seq"], 0);
    assert_eq!(first["load"], 3);

    let second: TraceEvent = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second.seq, 1);
    assert!(matches!(
        second.kind,
        TraceKind::Departed {
            trigger: DepartureTrigger::Partial,
            ..
        }
    ));
}

#[test]
fn test_audit_flags_overload() {
    let events = vec![
        event(
            0,
            TraceKind::Boarded {
                vehicle: truck(1),
                size: 3,
                side: Side::West,
                load: 3,
                capacity: 5,
            },
        ),
        event(
            1,
            TraceKind::Boarded {
                vehicle: truck(2),
                size: 3,
                side: Side::West,
                load: 6,
                capacity: 5,
            },
        ),
    ];
    assert_eq!(
        audit_trace(&events, 5),
        Err(AuditViolation::CapacityExceeded {
            seq: 1,
            load: 6,
            capacity: 5,
        })
    );
}

#[test]
fn test_audit_flags_early_completion() {
    let events = vec![
        event(
            0,
            TraceKind::Boarded {
                vehicle: truck(1),
                size: 3,
                side: Side::West,
                load: 3,
                capacity: 5,
            },
        ),
        event(
            1,
            TraceKind::Completed {
                vehicle: truck(1),
                completed: 1,
            },
        ),
    ];
    let err = audit_trace(&events, 5).unwrap_err();
    assert!(matches!(
        err,
        AuditViolation::IncompleteRoundTrip { boardings: 1, .. }
    ));
    assert_eq!(err.to_string(), "event 1: heavy-1 completed after 1 boardings");
}
