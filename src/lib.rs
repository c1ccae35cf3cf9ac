//! `corewars2d` is a toroidal, energy-aware MARS (Memory Array Redcode
//! Simulator): the execution core of a Core War engine, extended with a
//! two-dimensional core and a per-cell energy model.
//!
//! This crate owns the hard part — [`core`]'s address arithmetic,
//! [`instruction`]'s data model, [`operand`]'s addressing-mode evaluator,
//! [`opcode`]'s per-instruction semantics, and [`mars`]'s scheduler. It does
//! not parse Redcode text, render a visualization, or provide a REPL/CLI;
//! those are external collaborators that hand this crate already-built
//! [`warrior::Warrior`] values and observe it through an [`event::EventSink`].

pub mod core;
pub mod event;
pub mod instruction;
pub mod mars;
pub mod modifier;
pub mod opcode;
pub mod operand;
pub mod point;
pub mod process;
pub mod warrior;

pub use core::Core;
pub use event::{EventKind, EventSink, NullSink, WarriorId};
pub use instruction::{AddressMode, Instruction, Modifier, Opcode, Stepping};
pub use mars::{EnergySkipPolicy, Mars, MarsConfig, MatchOutcome};
pub use point::Point;
pub use warrior::Warrior;
