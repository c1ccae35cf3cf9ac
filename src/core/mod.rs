//! A [`Core`] is the toroidal block of memory in which Redcode programs
//! reside. It owns every cell's storage and address arithmetic; it knows
//! nothing about warriors, task queues, or opcode execution.

use std::fmt;
use std::ops::Index;

use thiserror::Error as ThisError;

use crate::instruction::Instruction;
use crate::point::Point;

const DEFAULT_CORE_SIZE: i32 = 8_000;

/// An error constructing a [`Core`].
#[derive(ThisError, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// `size` was not evenly divisible by `width`.
    #[error("core size {size} is not evenly divisible by width {width}")]
    SizeNotDivisibleByWidth { size: i32, width: i32 },

    /// `size`, `width`, `read_limit`, or `write_limit` was not positive.
    #[error("core dimensions must be positive, got size={size}, width={width}")]
    NonPositiveDimension { size: i32, width: i32 },
}

/// The toroidal memory of a MARS: a fixed-size array of instructions
/// addressed as a `width` x `height` grid with carry-coupled wraparound
/// between the two axes.
#[derive(Clone)]
pub struct Core {
    cells: Box<[Instruction]>,
    width: i32,
    height: i32,
    read_limit: i32,
    write_limit: i32,
    initial_instruction: Instruction,
}

impl Core {
    /// Constructs a core of `size` cells arranged in a grid `width` cells
    /// wide, filled with `initial_instruction`. `read_limit` and
    /// `write_limit` bound the distance operand evaluation is allowed to
    /// address relative to `size`; pass `size` for ICWS-default behavior.
    pub fn new(
        size: i32,
        width: i32,
        initial_instruction: Instruction,
        read_limit: i32,
        write_limit: i32,
    ) -> Result<Self, ConfigError> {
        if size <= 0 || width <= 0 {
            return Err(ConfigError::NonPositiveDimension { size, width });
        }
        if size % width != 0 {
            return Err(ConfigError::SizeNotDivisibleByWidth { size, width });
        }

        Ok(Self {
            cells: vec![initial_instruction; size as usize].into_boxed_slice(),
            width,
            height: size / width,
            read_limit,
            write_limit,
            initial_instruction,
        })
    }

    /// Constructs a square core (`height = 1`) of `size` cells, matching
    /// classic one-dimensional Core War.
    pub fn square(size: i32, initial_instruction: Instruction) -> Result<Self, ConfigError> {
        Self::new(size, size, initial_instruction, size, size)
    }

    #[must_use]
    pub fn size(&self) -> i32 {
        self.cells.len() as i32
    }

    #[must_use]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Maps a Point to a linear cell index using the carry-coupled 2D
    /// wrap described for toroidal addressing: overflow along `x` carries
    /// into `y`, and overflow along `y` carries back into `x`.
    #[must_use]
    pub fn index(&self, p: Point) -> usize {
        self.index_with_limits(p, self.width, self.height)
    }

    fn index_with_limits(&self, p: Point, width: i32, height: i32) -> usize {
        let wx = p.x.rem_euclid(width);
        let cx = p.x.div_euclid(width);
        let ry = (p.y + cx).rem_euclid(height);
        let cy = p.y.div_euclid(height);
        let fx = (wx + cy).rem_euclid(width);
        (ry * width + fx) as usize
    }

    /// Normalizes a Point to its canonical in-range representative: the
    /// Point whose own coordinates are `(fx, ry)` from the index mapping.
    #[must_use]
    pub fn normalize(&self, p: Point) -> Point {
        let idx = self.index(p) as i32;
        Point::new(idx % self.width, idx / self.width)
    }

    /// Folds a relative addressing offset's two axes independently through
    /// `limit` rather than the full core size. A `limit` at or above `size`
    /// is a no-op (the offset is already within any range the full-size
    /// carry formula would ever see). Used by `trim_read`/`trim_write` to
    /// bound how far an operand may directly reach before that offset is
    /// added to a program counter and carried through the normal toroidal
    /// index mapping.
    fn fold_offset(&self, offset: Point, limit: i32) -> Point {
        if limit >= self.size() {
            return offset;
        }
        let limit = limit.max(1);
        Point::new(offset.x.rem_euclid(limit), offset.y.rem_euclid(limit))
    }

    /// Folds a relative operand offset under `read_limit` before it is
    /// added to a program counter, per ICWS's reduced addressing reach for
    /// an instruction's A-operand (always evaluated for reading, never
    /// overwritten).
    #[must_use]
    pub fn trim_read(&self, offset: Point) -> Point {
        self.fold_offset(offset, self.read_limit)
    }

    /// Folds a relative operand offset under `write_limit` before it is
    /// added to a program counter, per ICWS's reduced addressing reach for
    /// an instruction's B-operand (the operand that may be overwritten).
    #[must_use]
    pub fn trim_write(&self, offset: Point) -> Point {
        self.fold_offset(offset, self.write_limit)
    }

    /// Returns a copy of the cell at `p`.
    #[must_use]
    pub fn read(&self, p: Point) -> Instruction {
        self.cells[self.index(p)]
    }

    /// Overwrites the cell at `p`.
    pub fn write(&mut self, p: Point, ins: Instruction) {
        let idx = self.index(p);
        self.cells[idx] = ins;
    }

    /// Returns a mutable reference to the cell at `p`, for in-place
    /// pre-decrement/post-increment side effects.
    pub fn cell_mut(&mut self, p: Point) -> &mut Instruction {
        let idx = self.index(p);
        &mut self.cells[idx]
    }

    /// Returns the cyclic range of cells `[a, b)`, wrapping if `a > b`.
    #[must_use]
    pub fn slice(&self, a: Point, b: Point) -> Vec<Instruction> {
        let start = self.index(a);
        let end = self.index(b);

        if start <= end {
            self.cells[start..end].to_vec()
        } else {
            let mut out = self.cells[start..].to_vec();
            out.extend_from_slice(&self.cells[..end]);
            out
        }
    }

    /// Re-fills every cell with `initial_instruction`, forgetting all
    /// loaded warriors.
    pub fn reset(&mut self) {
        self.cells.fill(self.initial_instruction);
    }

    /// Re-fills every cell with a new initial instruction, which becomes
    /// the default for subsequent `reset` calls.
    pub fn reset_with(&mut self, initial_instruction: Instruction) {
        self.initial_instruction = initial_instruction;
        self.reset();
    }
}

impl Default for Core {
    fn default() -> Self {
        Self::square(DEFAULT_CORE_SIZE, Instruction::dat_zero())
            .expect("default core size is always valid")
    }
}

impl Index<Point> for Core {
    type Output = Instruction;

    fn index(&self, p: Point) -> &Self::Output {
        let idx = self.index(p);
        &self.cells[idx]
    }
}

impl fmt::Debug for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Core")
            .field("size", &self.size())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
