//! Trace events, trace sinks and the invariant audit.
//!
//! Every transition of a run is recorded as a [`TraceEvent`] with a global sequence
//! number. Ferry-side events (boarding, departure, ferry arrival) are recorded while
//! the ferry lock is held, so their order in the trace is the order of the load
//! mutations. [`audit_trace`] replays a trace and checks the crossing invariants.

use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::departure::DepartureTrigger;
use crate::core::vehicle::{TripPhase, VehicleId, BOARDINGS_PER_ROUND_TRIP};
use crate::core::Side;
use crate::sync::Mutex;
use crate::util::clock::now_ms;

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum TraceKind {
    /// A vehicle paid at a booth.
    TollPassed {
        /// Vehicle.
        vehicle: VehicleId,
        /// Booth number.
        booth: usize,
        /// Side of the booth.
        side: Side,
    },
    /// A boarding was committed.
    Boarded {
        /// Vehicle.
        vehicle: VehicleId,
        /// Units added.
        size: u32,
        /// Side boarded from.
        side: Side,
        /// Load after boarding.
        load: u32,
        /// Ferry capacity.
        capacity: u32,
    },
    /// The ferry left a side.
    Departed {
        /// Departure number.
        departure: u64,
        /// Side left.
        from: Side,
        /// Load carried.
        load: u32,
        /// Why it left.
        trigger: DepartureTrigger,
    },
    /// The ferry docked after a crossing; load is back to zero.
    FerryArrived {
        /// Side reached.
        side: Side,
        /// Crossings completed so far.
        crossing: u64,
    },
    /// A vehicle got off.
    VehicleArrived {
        /// Vehicle.
        vehicle: VehicleId,
        /// Side reached.
        side: Side,
    },
    /// A vehicle finished its round trip.
    Completed {
        /// Vehicle.
        vehicle: VehicleId,
        /// Completed count after this one.
        completed: usize,
    },
    /// A vehicle gave up after a stop request.
    Abandoned {
        /// Vehicle.
        vehicle: VehicleId,
        /// Leg it was on.
        phase: TripPhase,
    },
    /// The controller terminated.
    ControllerStopped {
        /// Departures made.
        departures: u64,
    },
}

/// One recorded transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Global sequence number, starting at 0.
    pub seq: u64,
    /// Wall-clock milliseconds since the Unix epoch.
    pub at_ms: u64,
    /// Event payload.
    #[serde(flatten)]
    pub kind: TraceKind,
}

/// Trace sink abstraction.
pub trait TraceSink: Send {
    /// Record a trace event.
    fn record(&mut self, event: TraceEvent);

    /// Push buffered events to their destination.
    fn flush(&mut self) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn record(&mut self, _event: TraceEvent) {}
}

/// Bounded in-memory sink. Clones share the same buffer, so a caller can keep a
/// handle and read the events after the run.
#[derive(Debug, Clone)]
pub struct InMemoryTraceSink {
    events: Arc<Mutex<VecDeque<TraceEvent>>>,
    max_events: usize,
}

impl InMemoryTraceSink {
    /// Create a sink keeping at most `max_events`, dropping the oldest first.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(4096)))),
            max_events,
        }
    }

    /// Snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().iter().cloned().collect()
    }
}

impl TraceSink for InMemoryTraceSink {
    fn record(&mut self, event: TraceEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
    failed: bool,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Wrap a writer.
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            failed: false,
        }
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> TraceSink for JsonLinesSink<W> {
    fn record(&mut self, event: TraceEvent) {
        if self.failed {
            return;
        }
        let written = serde_json::to_writer(&mut self.writer, &event)
            .map_err(std::io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        if let Err(e) = written {
            tracing::warn!(error = %e, "trace sink write failed; further events dropped");
            self.failed = true;
        }
    }

    fn flush(&mut self) {
        if self.failed {
            return;
        }
        if let Err(e) = self.writer.flush() {
            tracing::warn!(error = %e, "trace sink flush failed; further events dropped");
            self.failed = true;
        }
    }
}

/// Sequenced front-end shared by the ferry, the agents and the controller.
pub struct Trace {
    sink: Mutex<Box<dyn TraceSink>>,
    next_seq: AtomicU64,
}

impl Trace {
    /// Wrap a sink.
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        Self {
            sink: Mutex::new(sink),
            next_seq: AtomicU64::new(0),
        }
    }

    /// A trace that records nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Box::new(NullTraceSink))
    }

    /// Record `kind`. The sequence number is taken under the sink lock so sequence
    /// order and sink order agree.
    pub fn record(&self, kind: TraceKind) {
        let mut sink = self.sink.lock();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        sink.record(TraceEvent {
            seq,
            at_ms: now_ms(),
            kind,
        });
    }

    /// Flush the sink.
    pub fn flush(&self) {
        self.sink.lock().flush();
    }

    /// Events recorded so far.
    #[must_use]
    pub fn recorded(&self) -> u64 {
        self.next_seq.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trace")
            .field("recorded", &self.recorded())
            .finish_non_exhaustive()
    }
}

/// Invariant violation found in a trace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditViolation {
    /// Load above capacity.
    #[error("event {seq}: load {load} exceeds capacity {capacity}")]
    CapacityExceeded {
        /// Sequence number.
        seq: u64,
        /// Observed load.
        load: u32,
        /// Capacity.
        capacity: u32,
    },
    /// Boarding load does not follow from the previous load.
    #[error("event {seq}: load {observed} after boarding, expected {expected}")]
    LoadMismatch {
        /// Sequence number.
        seq: u64,
        /// Expected load.
        expected: u32,
        /// Observed load.
        observed: u32,
    },
    /// A vehicle boarded more than twice.
    #[error("event {seq}: {vehicle} boarded a third time")]
    ExtraBoarding {
        /// Sequence number.
        seq: u64,
        /// Vehicle.
        vehicle: VehicleId,
    },
    /// A vehicle boarded from a side the ferry was not docked at.
    #[error("event {seq}: {vehicle} boarded at side {side} while docked at {docked}")]
    WrongSide {
        /// Sequence number.
        seq: u64,
        /// Vehicle.
        vehicle: VehicleId,
        /// Boarding side.
        side: Side,
        /// Docked side.
        docked: Side,
    },
    /// A vehicle arrived somewhere other than its crossing's destination.
    #[error("event {seq}: {vehicle} arrived at side {side}, expected {expected}")]
    SideInconsistent {
        /// Sequence number.
        seq: u64,
        /// Vehicle.
        vehicle: VehicleId,
        /// Reported side.
        side: Side,
        /// Destination of its last boarding.
        expected: Side,
    },
    /// A vehicle completed without exactly two boardings.
    #[error("event {seq}: {vehicle} completed after {boardings} boardings")]
    IncompleteRoundTrip {
        /// Sequence number.
        seq: u64,
        /// Vehicle.
        vehicle: VehicleId,
        /// Boardings seen.
        boardings: u8,
    },
}

/// Totals derived from a clean trace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    /// Committed boardings.
    pub boardings: u64,
    /// Departures.
    pub departures: u64,
    /// Departures with zero load.
    pub empty_departures: u64,
    /// Vehicles that completed.
    pub completed: usize,
    /// Vehicles that abandoned.
    pub abandoned: usize,
    /// Highest load seen.
    pub peak_load: u32,
}

#[derive(Default)]
struct VehicleLedger {
    boardings: u8,
    destination: Option<Side>,
}

/// Replay `events` (in sequence order) against a ferry of `capacity` units.
///
/// The docked side is learned from the first departure or ferry arrival, so traces
/// that begin mid-run are accepted as long as they start on an event boundary.
///
/// # Errors
///
/// Returns the first [`AuditViolation`] found.
pub fn audit_trace(events: &[TraceEvent], capacity: u32) -> Result<AuditSummary, AuditViolation> {
    let mut summary = AuditSummary::default();
    let mut vehicles: HashMap<VehicleId, VehicleLedger> = HashMap::new();
    let mut load: u32 = 0;
    let mut docked: Option<Side> = None;

    for event in events {
        let seq = event.seq;
        match &event.kind {
            TraceKind::Boarded {
                vehicle,
                size,
                side,
                load: after,
                ..
            } => {
                if *after > capacity {
                    return Err(AuditViolation::CapacityExceeded {
                        seq,
                        load: *after,
                        capacity,
                    });
                }
                if load.checked_add(*size) != Some(*after) {
                    return Err(AuditViolation::LoadMismatch {
                        seq,
                        expected: load.saturating_add(*size),
                        observed: *after,
                    });
                }
                if let Some(docked) = docked {
                    if docked != *side {
                        return Err(AuditViolation::WrongSide {
                            seq,
                            vehicle: *vehicle,
                            side: *side,
                            docked,
                        });
                    }
                }
                let ledger = vehicles.entry(*vehicle).or_default();
                if ledger.boardings >= BOARDINGS_PER_ROUND_TRIP {
                    return Err(AuditViolation::ExtraBoarding {
                        seq,
                        vehicle: *vehicle,
                    });
                }
                ledger.boardings += 1;
                ledger.destination = Some(side.opposite());
                load = *after;
                summary.boardings += 1;
                summary.peak_load = summary.peak_load.max(load);
            }
            TraceKind::Departed {
                from, load: carried, ..
            } => {
                if *carried > capacity {
                    return Err(AuditViolation::CapacityExceeded {
                        seq,
                        load: *carried,
                        capacity,
                    });
                }
                if *carried != load {
                    return Err(AuditViolation::LoadMismatch {
                        seq,
                        expected: load,
                        observed: *carried,
                    });
                }
                docked = Some(*from);
                summary.departures += 1;
                if *carried == 0 {
                    summary.empty_departures += 1;
                }
            }
            TraceKind::FerryArrived { side, .. } => {
                load = 0;
                docked = Some(*side);
            }
            TraceKind::VehicleArrived { vehicle, side } => {
                let expected = vehicles.get(vehicle).and_then(|l| l.destination);
                if let Some(expected) = expected {
                    if expected != *side {
                        return Err(AuditViolation::SideInconsistent {
                            seq,
                            vehicle: *vehicle,
                            side: *side,
                            expected,
                        });
                    }
                }
            }
            TraceKind::Completed { vehicle, .. } => {
                let boardings = vehicles.get(vehicle).map_or(0, |l| l.boardings);
                if boardings != BOARDINGS_PER_ROUND_TRIP {
                    return Err(AuditViolation::IncompleteRoundTrip {
                        seq,
                        vehicle: *vehicle,
                        boardings,
                    });
                }
                summary.completed += 1;
            }
            TraceKind::Abandoned { .. } => summary.abandoned += 1,
            TraceKind::TollPassed { .. } | TraceKind::ControllerStopped { .. } => {}
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vehicle::VehicleClass;

    fn event(seq: u64, kind: TraceKind) -> TraceEvent {
        TraceEvent { seq, at_ms: 0, kind }
    }

    fn car(n: u32) -> VehicleId {
        VehicleId::new(VehicleClass::Light, n)
    }

    fn boarded(seq: u64, vehicle: VehicleId, side: Side, load: u32) -> TraceEvent {
        event(
            seq,
            TraceKind::Boarded {
                vehicle,
                size: 1,
                side,
                load,
                capacity: 2,
            },
        )
    }

    fn crossing(seq: u64, from: Side, load: u32, n: u64) -> [TraceEvent; 2] {
        [
            event(
                seq,
                TraceKind::Departed {
                    departure: n,
                    from,
                    load,
                    trigger: DepartureTrigger::Partial,
                },
            ),
            event(
                seq + 1,
                TraceKind::FerryArrived {
                    side: from.opposite(),
                    crossing: n,
                },
            ),
        ]
    }

    #[test]
    fn test_clean_round_trip() {
        let mut events = vec![boarded(0, car(1), Side::West, 1)];
        events.extend(crossing(1, Side::West, 1, 1));
        events.push(event(
            3,
            TraceKind::VehicleArrived {
                vehicle: car(1),
                side: Side::East,
            },
        ));
        events.push(boarded(4, car(1), Side::East, 1));
        events.extend(crossing(5, Side::East, 1, 2));
        events.push(event(
            7,
            TraceKind::Completed {
                vehicle: car(1),
                completed: 1,
            },
        ));

        let summary = audit_trace(&events, 2).unwrap();
        assert_eq!(summary.boardings, 2);
        assert_eq!(summary.departures, 2);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.peak_load, 1);
    }

    #[test]
    fn test_capacity_violation_detected() {
        let events = vec![
            boarded(0, car(1), Side::West, 1),
            boarded(1, car(2), Side::West, 2),
            boarded(2, car(3), Side::West, 3),
        ];
        assert!(matches!(
            audit_trace(&events, 2),
            Err(AuditViolation::CapacityExceeded { seq: 2, .. })
        ));
    }

    #[test]
    fn test_third_boarding_detected() {
        let mut events = vec![boarded(0, car(1), Side::West, 1)];
        events.extend(crossing(1, Side::West, 1, 1));
        events.push(boarded(3, car(1), Side::East, 1));
        events.extend(crossing(4, Side::East, 1, 2));
        events.push(boarded(6, car(1), Side::West, 1));
        assert!(matches!(
            audit_trace(&events, 2),
            Err(AuditViolation::ExtraBoarding { seq: 6, .. })
        ));
    }

    #[test]
    fn test_wrong_arrival_side_detected() {
        let mut events = vec![boarded(0, car(1), Side::West, 1)];
        events.extend(crossing(1, Side::West, 1, 1));
        events.push(event(
            3,
            TraceKind::VehicleArrived {
                vehicle: car(1),
                side: Side::West,
            },
        ));
        assert!(matches!(
            audit_trace(&events, 2),
            Err(AuditViolation::SideInconsistent { .. })
        ));
    }

    #[test]
    fn test_boarding_on_undocked_side_detected() {
        let mut events = crossing(0, Side::West, 0, 1).to_vec();
        events.push(boarded(2, car(1), Side::West, 1));
        assert!(matches!(
            audit_trace(&events, 2),
            Err(AuditViolation::WrongSide { .. })
        ));
    }

    #[test]
    fn test_departure_load_must_match_boardings() {
        let mut events = vec![boarded(0, car(1), Side::West, 1)];
        events.extend(crossing(1, Side::West, 2, 1));
        assert!(matches!(
            audit_trace(&events, 2),
            Err(AuditViolation::LoadMismatch { .. })
        ));
    }

    #[test]
    fn test_boarding_size_overflow_is_a_mismatch() {
        let events = vec![
            boarded(0, car(1), Side::West, 1),
            event(
                1,
                TraceKind::Boarded {
                    vehicle: car(2),
                    size: u32::MAX,
                    side: Side::West,
                    load: u32::MAX,
                    capacity: u32::MAX,
                },
            ),
        ];
        assert_eq!(
            audit_trace(&events, u32::MAX),
            Err(AuditViolation::LoadMismatch {
                seq: 1,
                expected: u32::MAX,
                observed: u32::MAX,
            })
        );
    }

    #[test]
    fn test_in_memory_sink_bounded() {
        let mut sink = InMemoryTraceSink::new(2);
        for seq in 0..3 {
            sink.record(event(seq, TraceKind::ControllerStopped { departures: seq }));
        }
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].seq, 1);
    }

    #[test]
    fn test_trace_sequences_events() {
        let sink = InMemoryTraceSink::new(10);
        let trace = Trace::new(Box::new(sink.clone()));
        trace.record(TraceKind::ControllerStopped { departures: 0 });
        trace.record(TraceKind::ControllerStopped { departures: 1 });
        let seqs: Vec<_> = sink.events().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1]);
        assert_eq!(trace.recorded(), 2);
    }

    #[test]
    fn test_json_lines_sink_writes_tagged_objects() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.record(event(
            0,
            TraceKind::FerryArrived {
                side: Side::East,
                crossing: 1,
            },
        ));
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["event"], "ferry_arrived");
        assert_eq!(value["side"], "east");
        assert_eq!(value["seq"], 0);
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_trace_flush_drains_buffered_sink() {
        let buf = SharedBuf::default();
        let writer = std::io::BufWriter::new(buf.clone());
        let trace = Trace::new(Box::new(JsonLinesSink::new(writer)));
        trace.record(TraceKind::ControllerStopped { departures: 3 });
        assert!(buf.0.lock().is_empty());

        trace.flush();
        let text = String::from_utf8(buf.0.lock().clone()).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["event"], "controller_stopped");
        assert_eq!(value["departures"], 3);
    }
}
