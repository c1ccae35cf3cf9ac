//! The instruction data model: opcodes, modifiers, stepping, addressing
//! modes, and the default-modifier inference table.

use std::fmt;

use crate::point::Point;

/// The operation a cell performs when executed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    Dat,
    Mov,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Jmp,
    Jmz,
    Jmn,
    Djn,
    Spl,
    Slt,
    Cmp,
    Seq,
    Sne,
    Nop,
}

impl Opcode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Dat => "DAT",
            Self::Mov => "MOV",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::Mod => "MOD",
            Self::Jmp => "JMP",
            Self::Jmz => "JMZ",
            Self::Jmn => "JMN",
            Self::Djn => "DJN",
            Self::Spl => "SPL",
            Self::Slt => "SLT",
            Self::Cmp => "CMP",
            Self::Seq => "SEQ",
            Self::Sne => "SNE",
            Self::Nop => "NOP",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Selects which field(s) of the source and destination instructions an
/// opcode reads and writes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Modifier {
    A,
    B,
    AB,
    BA,
    F,
    X,
    I,
}

impl Modifier {
    fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::AB => "AB",
            Self::BA => "BA",
            Self::F => "F",
            Self::X => "X",
            Self::I => "I",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Controls how the program counter, and every pre/post side-effect, moves
/// through the core's two axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Stepping {
    #[default]
    Normal,
    Vertical,
    Backward,
    VerticalBackward,
}

impl Stepping {
    /// The unit-vector delta for a step of magnitude `k` under this
    /// stepping mode.
    #[must_use]
    pub fn step(self, k: i32) -> Point {
        match self {
            Self::Normal => Point::new(k, 0),
            Self::Vertical => Point::new(0, k),
            Self::Backward => Point::new(-k, 0),
            Self::VerticalBackward => Point::new(0, -k),
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::Normal => "",
            Self::Vertical => ".S",
            Self::Backward => ".Q",
            Self::VerticalBackward => ".W",
        }
    }
}

/// One of the eight Redcode addressing modes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Immediate,
    Direct,
    IndirectB,
    PredecB,
    PostincB,
    IndirectA,
    PredecA,
    PostincA,
}

impl AddressMode {
    fn symbol(self) -> char {
        match self {
            Self::Immediate => '#',
            Self::Direct => '$',
            Self::IndirectB => '@',
            Self::PredecB => '<',
            Self::PostincB => '>',
            Self::IndirectA => '*',
            Self::PredecA => '{',
            Self::PostincA => '}',
        }
    }

    /// Whether this mode belongs to the "immediate" class used by the
    /// ICWS default-modifier table. Every other mode (direct or any of
    /// the six indirect/pre/post variants) belongs to the complementary
    /// class.
    fn is_immediate_class(self) -> bool {
        matches!(self, Self::Immediate)
    }
}

impl fmt::Display for AddressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// An immutable-by-value cell held in the core.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub modifier: Modifier,
    pub stepping: Stepping,
    pub a_mode: AddressMode,
    pub a_value: Point,
    pub b_mode: AddressMode,
    pub b_value: Point,
    /// Non-negative; `0` means "unmetered" when energy-mode is off, or
    /// "exhausted" when it is on.
    pub energy: u32,
}

impl Instruction {
    /// Builds an instruction, deriving `modifier` from `opcode` and the
    /// two addressing modes per the ICWS'88→'94 default-modifier table.
    #[must_use]
    pub fn new(
        opcode: Opcode,
        a_mode: AddressMode,
        a_value: Point,
        b_mode: AddressMode,
        b_value: Point,
    ) -> Self {
        Self::with_modifier(
            opcode,
            default_modifier(opcode, a_mode, b_mode),
            a_mode,
            a_value,
            b_mode,
            b_value,
        )
    }

    /// Builds an instruction with an explicit modifier, bypassing
    /// inference.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn with_modifier(
        opcode: Opcode,
        modifier: Modifier,
        a_mode: AddressMode,
        a_value: Point,
        b_mode: AddressMode,
        b_value: Point,
    ) -> Self {
        Self {
            opcode,
            modifier,
            stepping: Stepping::default(),
            a_mode,
            a_value,
            b_mode,
            b_value,
            energy: 0,
        }
    }

    #[must_use]
    pub fn with_stepping(mut self, stepping: Stepping) -> Self {
        self.stepping = stepping;
        self
    }

    #[must_use]
    pub fn with_energy(mut self, energy: u32) -> Self {
        self.energy = energy;
        self
    }

    /// The global default cell contents: `DAT.F $0, $0`.
    #[must_use]
    pub fn dat_zero() -> Self {
        Self::new(
            Opcode::Dat,
            AddressMode::Direct,
            Point::new(0, 0),
            AddressMode::Direct,
            Point::new(0, 0),
        )
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}{} {}{}, {}{}",
            self.opcode,
            self.modifier,
            self.stepping.suffix(),
            self.a_mode,
            self.a_value,
            self.b_mode,
            self.b_value,
        )?;
        if self.energy > 0 {
            write!(f, " ; E:{}", self.energy)?;
        }
        Ok(())
    }
}

/// Infers the default modifier for `opcode` given its two addressing
/// modes, per the ICWS'88 to ICWS'94 conversion table. Addressing modes
/// are grouped into two classes for this table: immediate, and
/// everything else (direct and all six indirect variants).
#[must_use]
pub fn default_modifier(opcode: Opcode, a_mode: AddressMode, b_mode: AddressMode) -> Modifier {
    use Opcode::{Add, Cmp, Dat, Div, Djn, Jmn, Jmp, Jmz, Mod, Mov, Mul, Nop, Seq, Slt, Sne, Spl, Sub};

    let a_imm = a_mode.is_immediate_class();
    let b_imm = b_mode.is_immediate_class();

    match opcode {
        Dat | Nop => Modifier::F,
        Mov | Cmp => {
            if a_imm {
                Modifier::AB
            } else if b_imm {
                Modifier::B
            } else {
                Modifier::I
            }
        }
        Add | Sub | Mul | Div | Mod => {
            if a_imm {
                Modifier::AB
            } else if b_imm {
                Modifier::B
            } else {
                Modifier::F
            }
        }
        Slt | Seq | Sne => {
            if a_imm {
                Modifier::AB
            } else {
                Modifier::B
            }
        }
        Jmp | Jmz | Jmn | Djn | Spl => Modifier::B,
    }
}
