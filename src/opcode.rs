//! The opcode executor (C6): per-opcode, per-modifier semantics, driven
//! by resolved instruction registers `IRA`/`IRB` and a write target `T`.

use crate::core::Core;
use crate::event::{EventKind, EventSink, WarriorId};
use crate::instruction::{Instruction, Modifier, Opcode, Stepping};
use crate::modifier::{self, Field};
use crate::operand::{self, OperandSide, PendingIncrement};
use crate::point::Point;

/// What happened after one instruction executed: zero, one, or two
/// successor program counters to enqueue, in enqueue order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub successors: Vec<Point>,
}

impl Outcome {
    fn dead() -> Self {
        Self { successors: Vec::new() }
    }

    fn single(target: Point) -> Self {
        Self {
            successors: vec![target],
        }
    }

    fn normal(pc: Point, stepping: Stepping) -> Self {
        Self::single(pc + stepping.step(1))
    }

    fn skip(pc: Point, stepping: Stepping) -> Self {
        Self::single(pc + stepping.step(2))
    }
}

/// Executes the instruction `ir`, already fetched from `cell(pc)`, in
/// `core`. Mutates `core` for every operand side effect and opcode
/// write, emits events to `sink`, and returns the successor task(s) the
/// scheduler should enqueue.
pub fn execute(
    core: &mut Core,
    pc: Point,
    ir: Instruction,
    warrior: WarriorId,
    sink: &mut dyn EventSink,
    energy_mode: bool,
) -> Outcome {
    let stepping = ir.stepping;

    let a_eval = operand::evaluate(
        core,
        pc,
        ir.a_mode,
        ir.a_value,
        stepping,
        OperandSide::A,
        warrior,
        sink,
    );
    let b_eval = operand::evaluate(
        core,
        pc,
        ir.b_mode,
        ir.b_value,
        stepping,
        OperandSide::B,
        warrior,
        sink,
    );

    let ira_point = pc + a_eval.read_point;
    let irb_point = pc + b_eval.read_point;
    let target = pc + b_eval.write_point;

    let ira = core.read(ira_point);
    let irb = core.read(irb_point);

    if energy_mode {
        let remaining = core.read(pc).energy.saturating_sub(1);
        core.cell_mut(pc).energy = remaining;
    }

    sink.emit(warrior, pc, EventKind::Executed);

    let outcome = match ir.opcode {
        Opcode::Dat => Outcome::dead(),
        Opcode::Nop => Outcome::normal(pc, stepping),
        Opcode::Mov => exec_mov(
            core, ir.modifier, ira, ira_point, target, warrior, sink, energy_mode, pc, stepping,
        ),
        Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod => exec_arith(
            core, ir.opcode, ir.modifier, ira, irb, target, warrior, sink, pc, stepping,
        ),
        Opcode::Jmp => Outcome::single(pc + a_eval.read_point),
        Opcode::Jmz => exec_jmz(ir.modifier, irb, pc, a_eval.read_point, stepping, false),
        Opcode::Jmn => exec_jmz(ir.modifier, irb, pc, a_eval.read_point, stepping, true),
        Opcode::Djn => exec_djn(core, ir.modifier, irb, target, pc, a_eval.read_point, stepping),
        Opcode::Spl => exec_spl(pc, a_eval.read_point, stepping),
        Opcode::Slt => exec_slt(ir.modifier, ira, irb, pc, stepping),
        Opcode::Cmp | Opcode::Seq | Opcode::Sne => {
            exec_compare(ir.opcode, ir.modifier, ira, irb, pc, stepping)
        }
    };

    fire_post_increments(core, stepping, warrior, sink, a_eval.pending_increment);
    fire_post_increments(core, stepping, warrior, sink, b_eval.pending_increment);

    outcome
}

fn fire_post_increments(
    core: &mut Core,
    stepping: Stepping,
    warrior: WarriorId,
    sink: &mut dyn EventSink,
    pending: Option<PendingIncrement>,
) {
    if let Some(p) = pending {
        operand::apply_pending_increment(core, stepping, warrior, sink, p);
    }
}

fn select(field: Field, a_value: Point, b_value: Point) -> Point {
    modifier::select(field, a_value, b_value)
}

fn write_field(core: &mut Core, target: Point, field: Field, value: Point) {
    let cell = core.cell_mut(target);
    match field {
        Field::A => cell.a_value = value,
        Field::B => cell.b_value = value,
    }
}

/// Projections to use for a field-wise opcode under `modifier`.
/// Modifier `I` ("whole instruction") has no field projection in
/// [`modifier::projections`]; for opcodes without a dedicated
/// whole-instruction behavior (everything but MOV/CMP/SEQ/SNE) it is
/// treated as `F`, operating on both fields.
fn field_projections(modifier: Modifier) -> &'static [modifier::Projection] {
    if modifier == Modifier::I {
        modifier::projections(Modifier::F)
    } else {
        modifier::projections(modifier)
    }
}

#[allow(clippy::too_many_arguments)]
fn exec_mov(
    core: &mut Core,
    modifier: Modifier,
    ira: Instruction,
    ira_point: Point,
    target: Point,
    warrior: WarriorId,
    sink: &mut dyn EventSink,
    energy_mode: bool,
    pc: Point,
    stepping: Stepping,
) -> Outcome {
    let src_energy = core.read(ira_point).energy;
    let dst_energy_before = core.read(target).energy;

    if modifier == Modifier::I {
        sink.emit(warrior, ira_point, EventKind::IRead);
        core.write(target, ira);
        sink.emit(warrior, target, EventKind::IWrite);
    } else {
        for proj in modifier::projections(modifier) {
            let value = select(proj.from_a, ira.a_value, ira.b_value);
            write_field(core, target, proj.to, value);
            let kind = match proj.to {
                Field::A => EventKind::AWrite,
                Field::B => EventKind::BWrite,
            };
            sink.emit(warrior, target, kind);
        }
    }

    if energy_mode {
        let (new_src, new_dst) = equalize_energy(src_energy, dst_energy_before);
        core.cell_mut(ira_point).energy = new_src;
        core.cell_mut(target).energy = new_dst;
    }

    Outcome::normal(pc, stepping)
}

/// `src`, `dst` energy after a MOV equalizes them: `floor((s+d)/2)` and
/// `ceil((s+d)/2)`, conserving the total.
fn equalize_energy(src: u32, dst: u32) -> (u32, u32) {
    let total = src + dst;
    (total / 2, total - total / 2)
}

#[allow(clippy::too_many_arguments)]
fn exec_arith(
    core: &mut Core,
    opcode: Opcode,
    modifier: Modifier,
    ira: Instruction,
    irb: Instruction,
    target: Point,
    warrior: WarriorId,
    sink: &mut dyn EventSink,
    pc: Point,
    stepping: Stepping,
) -> Outcome {
    for proj in field_projections(modifier) {
        let divisor = select(proj.from_a, ira.a_value, ira.b_value);
        let dividend = select(proj.from_b, irb.a_value, irb.b_value);

        if matches!(opcode, Opcode::Div | Opcode::Mod) && (divisor.x == 0 || divisor.y == 0) {
            return Outcome::dead();
        }

        let result = match opcode {
            Opcode::Add => dividend + divisor,
            Opcode::Sub => dividend - divisor,
            Opcode::Mul => dividend * divisor,
            Opcode::Div => dividend / divisor,
            Opcode::Mod => dividend % divisor,
            _ => unreachable!("exec_arith only called for arithmetic opcodes"),
        };

        write_field(core, target, proj.to, result);
        let kind = match proj.to {
            Field::A => EventKind::AArith,
            Field::B => EventKind::BArith,
        };
        sink.emit(warrior, target, kind);
    }

    Outcome::normal(pc, stepping)
}

fn exec_jmz(
    modifier: Modifier,
    irb: Instruction,
    pc: Point,
    rpa: Point,
    stepping: Stepping,
    invert_for_jmn: bool,
) -> Outcome {
    let fields: Vec<Point> = field_projections(modifier)
        .iter()
        .map(|p| select(p.from_b, irb.a_value, irb.b_value))
        .collect();

    let zero = Point::new(0, 0);
    let should_jump = if invert_for_jmn {
        fields.iter().any(|f| *f != zero)
    } else {
        fields.iter().all(|f| *f == zero)
    };

    if should_jump {
        Outcome::single(pc + rpa)
    } else {
        Outcome::normal(pc, stepping)
    }
}

fn exec_djn(
    core: &mut Core,
    modifier: Modifier,
    irb: Instruction,
    target: Point,
    pc: Point,
    rpa: Point,
    stepping: Stepping,
) -> Outcome {
    let one = Point::new(1, 0);
    let mut irb_after = irb;

    for field in field_projections(modifier).iter().map(|p| p.to) {
        let cell = core.cell_mut(target);
        match field {
            Field::A => {
                cell.a_value -= one;
                irb_after.a_value -= one;
            }
            Field::B => {
                cell.b_value -= one;
                irb_after.b_value -= one;
            }
        }
    }

    let zero = Point::new(0, 0);
    let any_nonzero = field_projections(modifier)
        .iter()
        .map(|p| select(p.to, irb_after.a_value, irb_after.b_value))
        .any(|f| f != zero);

    if any_nonzero {
        Outcome::single(pc + rpa)
    } else {
        Outcome::normal(pc, stepping)
    }
}

fn exec_spl(pc: Point, rpa: Point, stepping: Stepping) -> Outcome {
    Outcome {
        successors: vec![pc + stepping.step(1), pc + rpa],
    }
}

fn exec_slt(
    modifier: Modifier,
    ira: Instruction,
    irb: Instruction,
    pc: Point,
    stepping: Stepping,
) -> Outcome {
    // Field values are fundamentally integers with an optional secondary
    // axis; "strictly less" compares the primary (x) component, matching
    // the integer ordering the opcode has always used.
    let all_less = field_projections(modifier).iter().all(|p| {
        let a = select(p.from_a, ira.a_value, ira.b_value);
        let b = select(p.from_b, irb.a_value, irb.b_value);
        a.x < b.x
    });

    if all_less {
        Outcome::skip(pc, stepping)
    } else {
        Outcome::normal(pc, stepping)
    }
}

fn exec_compare(
    opcode: Opcode,
    modifier: Modifier,
    ira: Instruction,
    irb: Instruction,
    pc: Point,
    stepping: Stepping,
) -> Outcome {
    let equal = if modifier == Modifier::I {
        ira == irb
    } else {
        modifier::projections(modifier).iter().all(|p| {
            let a = select(p.from_a, ira.a_value, ira.b_value);
            let b = select(p.from_b, irb.a_value, irb.b_value);
            a == b
        })
    };

    let matched = match opcode {
        Opcode::Cmp | Opcode::Seq => equal,
        Opcode::Sne => !equal,
        _ => unreachable!("exec_compare only called for CMP/SEQ/SNE"),
    };

    if matched {
        Outcome::skip(pc, stepping)
    } else {
        Outcome::normal(pc, stepping)
    }
}
