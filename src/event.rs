//! The event channel: an abstract sink the engine reports side effects
//! to, used by visualizers and debuggers. The engine holds a handle and
//! never reenters itself through it.

use crate::point::Point;

/// A warrior handle, stable for the lifetime of a match.
pub type WarriorId = usize;

/// The kind of side effect being reported. Carries no payload beyond the
/// `(warrior, point)` pair passed alongside it to `EventSink::emit`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Executed,
    IRead,
    IWrite,
    ARead,
    AWrite,
    AInc,
    ADec,
    BRead,
    BWrite,
    BInc,
    BDec,
    AArith,
    BArith,
}

/// Receives a stream of `(warrior, point, kind)` tuples in causal order
/// within a single `step()`. No ordering contract holds across steps.
pub trait EventSink {
    fn emit(&mut self, warrior: WarriorId, point: Point, kind: EventKind);
}

/// The default sink: discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _warrior: WarriorId, _point: Point, _kind: EventKind) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        events: Vec<(WarriorId, Point, EventKind)>,
    }

    impl EventSink for RecordingSink {
        fn emit(&mut self, warrior: WarriorId, point: Point, kind: EventKind) {
            self.events.push((warrior, point, kind));
        }
    }

    #[test]
    fn null_sink_discards_everything() {
        let mut sink = NullSink;
        sink.emit(0, Point::new(0, 0), EventKind::Executed);
    }

    #[test]
    fn recording_sink_preserves_order() {
        let mut sink = RecordingSink::default();
        sink.emit(0, Point::new(1, 0), EventKind::Executed);
        sink.emit(0, Point::new(2, 0), EventKind::AInc);
        assert_eq!(sink.events.len(), 2);
        assert_eq!(sink.events[0].2, EventKind::Executed);
        assert_eq!(sink.events[1].2, EventKind::AInc);
    }
}
