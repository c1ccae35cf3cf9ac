//! A parsed Redcode program, as handed to the engine by the (external)
//! parser.

use std::collections::BTreeMap;

use crate::instruction::Instruction;
use crate::point::Point;

/// Metadata carried alongside a warrior's code. Entirely opaque to the
/// engine; never inspected outside of diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    pub name: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub version: Option<String>,
    pub strategy: Option<String>,
}

/// A loaded Redcode program: a sparse 2D instruction map plus an entry
/// point. Positions may be negative; the program occupies an arbitrary
/// shape, not necessarily a contiguous run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Warrior {
    pub metadata: Metadata,
    pub instructions: BTreeMap<(i32, i32), Instruction>,
    pub start: Point,
}

impl Warrior {
    #[must_use]
    pub fn new(start: Point) -> Self {
        Self {
            metadata: Metadata::default(),
            instructions: BTreeMap::new(),
            start,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Sets the cell at `p` (relative to the warrior's own origin).
    pub fn set(&mut self, p: Point, instruction: Instruction) {
        self.instructions.insert((p.x, p.y), instruction);
    }

    /// Iterates the warrior's cells in a stable order, position first.
    pub fn iter(&self) -> impl Iterator<Item = (Point, &Instruction)> {
        self.instructions
            .iter()
            .map(|(&(x, y), ins)| (Point::new(x, y), ins))
    }

    /// The warrior's bounding box: one past the highest `x` and `y`
    /// offset any cell occupies, `(1, 1)` if the warrior has no cells.
    /// Used by the scheduler to keep randomized warrior placements from
    /// overlapping in the core.
    #[must_use]
    pub fn bounding_size(&self) -> Point {
        let max_x = self.instructions.keys().map(|&(x, _)| x).max();
        let max_y = self.instructions.keys().map(|&(_, y)| y).max();
        match (max_x, max_y) {
            (Some(x), Some(y)) => Point::new(x + 1, y + 1),
            _ => Point::new(1, 1),
        }
    }
}
