//! The operand evaluator (C5): resolves an addressing mode and value
//! into read/write points, firing pre-decrement immediately and
//! returning any post-increment for the caller to apply later.

use crate::core::Core;
use crate::event::{EventKind, EventSink, WarriorId};
use crate::instruction::{AddressMode, Stepping};
use crate::modifier::Field;
use crate::point::Point;

/// The result of evaluating one operand.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Evaluated {
    /// Relative offset (from the program counter) to read from.
    pub read_point: Point,
    /// Relative offset to write to.
    pub write_point: Point,
    /// A side effect deferred until after the enclosing instruction
    /// finishes executing.
    pub pending_increment: Option<PendingIncrement>,
}

/// An increment owed to a cell's field after the current instruction
/// completes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PendingIncrement {
    pub target: Point,
    pub field: Field,
}

/// Which half of the instruction an operand belongs to, and therefore
/// which of the core's read/write limits bounds its addressing reach.
/// ICWS reserves READLIMIT for the A-operand and WRITELIMIT for the
/// B-operand, regardless of which operand a given opcode actually reads
/// from or writes to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperandSide {
    A,
    B,
}

impl OperandSide {
    fn trim(self, core: &Core, offset: Point) -> Point {
        match self {
            OperandSide::A => core.trim_read(offset),
            OperandSide::B => core.trim_write(offset),
        }
    }
}

/// Evaluates one operand at program counter `pc`, mutating `core` for
/// any pre-decrement side effect and emitting its event immediately.
#[allow(clippy::too_many_arguments)]
pub fn evaluate(
    core: &mut Core,
    pc: Point,
    mode: AddressMode,
    value: Point,
    stepping: Stepping,
    side: OperandSide,
    warrior: WarriorId,
    sink: &mut dyn EventSink,
) -> Evaluated {
    match mode {
        AddressMode::Immediate => Evaluated {
            read_point: Point::new(0, 0),
            write_point: Point::new(0, 0),
            pending_increment: None,
        },
        AddressMode::Direct => {
            let p = side.trim(core, value);
            Evaluated {
                read_point: p,
                write_point: p,
                pending_increment: None,
            }
        }
        AddressMode::IndirectA => indirect(core, pc, value, Field::A, side, warrior, sink),
        AddressMode::IndirectB => indirect(core, pc, value, Field::B, side, warrior, sink),
        AddressMode::PredecA => predec(core, pc, value, stepping, Field::A, side, warrior, sink),
        AddressMode::PredecB => predec(core, pc, value, stepping, Field::B, side, warrior, sink),
        AddressMode::PostincA => postinc(core, pc, value, Field::A, side, warrior, sink),
        AddressMode::PostincB => postinc(core, pc, value, Field::B, side, warrior, sink),
    }
}

/// Applies a deferred post-increment, mutating `core` and emitting its
/// event. Called once execution of the enclosing instruction is done.
pub fn apply_pending_increment(
    core: &mut Core,
    stepping: Stepping,
    warrior: WarriorId,
    sink: &mut dyn EventSink,
    pending: PendingIncrement,
) {
    let delta = stepping.step(1);
    let cell = core.cell_mut(pending.target);
    match pending.field {
        Field::A => cell.a_value += delta,
        Field::B => cell.b_value += delta,
    }
    let kind = match pending.field {
        Field::A => EventKind::AInc,
        Field::B => EventKind::BInc,
    };
    sink.emit(warrior, pending.target, kind);
}

fn indirect(
    core: &Core,
    pc: Point,
    value: Point,
    field: Field,
    side: OperandSide,
    warrior: WarriorId,
    sink: &mut dyn EventSink,
) -> Evaluated {
    let value = side.trim(core, value);
    let target = pc + value;
    let cell = core.read(target);
    let delta = match field {
        Field::A => cell.a_value,
        Field::B => cell.b_value,
    };
    let kind = match field {
        Field::A => EventKind::ARead,
        Field::B => EventKind::BRead,
    };
    sink.emit(warrior, target, kind);

    let p = side.trim(core, value + delta);
    Evaluated {
        read_point: p,
        write_point: p,
        pending_increment: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn predec(
    core: &mut Core,
    pc: Point,
    value: Point,
    stepping: Stepping,
    field: Field,
    side: OperandSide,
    warrior: WarriorId,
    sink: &mut dyn EventSink,
) -> Evaluated {
    let value = side.trim(core, value);
    let target = pc + value;
    let delta = stepping.step(-1);
    {
        let cell = core.cell_mut(target);
        match field {
            Field::A => cell.a_value += delta,
            Field::B => cell.b_value += delta,
        }
    }
    let kind = match field {
        Field::A => EventKind::ADec,
        Field::B => EventKind::BDec,
    };
    sink.emit(warrior, target, kind);

    indirect(core, pc, value, field, side, warrior, sink)
}

#[allow(clippy::too_many_arguments)]
fn postinc(
    core: &Core,
    pc: Point,
    value: Point,
    field: Field,
    side: OperandSide,
    warrior: WarriorId,
    sink: &mut dyn EventSink,
) -> Evaluated {
    let value = side.trim(core, value);
    let mut evaluated = indirect(core, pc, value, field, side, warrior, sink);
    evaluated.pending_increment = Some(PendingIncrement {
        target: pc + value,
        field,
    });
    evaluated
}
