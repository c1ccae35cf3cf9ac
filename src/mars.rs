//! The MARS: loads warriors into a [`Core`] with equally spaced,
//! optionally randomized starting positions, and drives the per-cycle
//! fetch/decode/operand/execute/enqueue pipeline.

use std::ops::Index;

use log::{debug, trace};
use rand::Rng;
use thiserror::Error as ThisError;

use crate::core::Core;
use crate::event::{EventKind, EventSink, NullSink, WarriorId};
use crate::instruction::Instruction;
use crate::opcode;
use crate::point::Point;
use crate::process::Queue;
use crate::warrior::Warrior;

const DEFAULT_MINIMUM_SEPARATION: i32 = 100;
const DEFAULT_MAX_PROCESSES: usize = 8_000;
const DEFAULT_MAX_CYCLES: u32 = 80_000;

/// An error constructing a [`Mars`].
#[derive(ThisError, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// `warriors` was empty; a match needs at least one combatant.
    #[error("a match needs at least one warrior")]
    NoWarriors,

    /// More warriors than the core has room to space out evenly.
    #[error("core of size {core_size} cannot host {warrior_count} warriors")]
    TooManyWarriors { core_size: i32, warrior_count: usize },
}

/// The policy applied when a task's cell has run out of energy. See
/// DESIGN.md for the reasoning behind the default.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum EnergySkipPolicy {
    /// Pop the task, then re-enqueue it at the tail of the same warrior's
    /// queue unchanged.
    #[default]
    RequeueAtTail,
    /// Pop the task, then re-enqueue it at the front so it is retried
    /// again next cycle before any other pending task of this warrior.
    PeekUntilAvailable,
}

/// Construction and scheduling parameters for a [`Mars`] match.
#[derive(Clone, Debug)]
pub struct MarsConfig {
    /// Minimum gap, in cells, kept between a randomized warrior placement
    /// and the next warrior's equally-spaced slot.
    pub minimum_separation: i32,
    /// Whether warrior placement is randomized within its slot, or pinned
    /// to the start of the slot.
    pub randomize: bool,
    /// Upper bound on a warrior's task queue length.
    pub max_processes: usize,
    /// Total energy divided across a warrior's cells at load time. `0`
    /// disables energy-mode entirely.
    pub total_energy: u32,
    /// Cycles after which a still-undecided match ties.
    pub max_cycles: u32,
    /// What to do with a task whose cell has no energy left.
    pub energy_skip_policy: EnergySkipPolicy,
}

impl Default for MarsConfig {
    fn default() -> Self {
        Self {
            minimum_separation: DEFAULT_MINIMUM_SEPARATION,
            randomize: true,
            max_processes: DEFAULT_MAX_PROCESSES,
            total_energy: 0,
            max_cycles: DEFAULT_MAX_CYCLES,
            energy_skip_policy: EnergySkipPolicy::default(),
        }
    }
}

/// The outcome of a finished (or in-progress) match.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Exactly one warrior (of at least two) remains alive.
    Win(WarriorId),
    /// The match is still running.
    Ongoing,
    /// Every warrior is dead, more than one remains alive, or there was
    /// never more than one combatant to begin with.
    Tie,
}

/// A running Core War match: a [`Core`], the warriors loaded into it, and
/// their per-warrior task queues.
pub struct Mars {
    core: Core,
    warriors: Vec<Warrior>,
    queues: Vec<Queue>,
    config: MarsConfig,
    energy_mode: bool,
    cycle: u32,
    sink: Box<dyn EventSink>,
}

impl Mars {
    /// Builds a match: constructs each warrior's task queue and writes
    /// its instructions into `core` at equally spaced (optionally
    /// randomized) positions.
    pub fn new(
        core: Core,
        warriors: Vec<Warrior>,
        config: MarsConfig,
        rng: &mut impl Rng,
    ) -> Result<Self, Error> {
        if warriors.is_empty() {
            return Err(Error::NoWarriors);
        }
        if core.size() < warriors.len() as i32 {
            return Err(Error::TooManyWarriors {
                core_size: core.size(),
                warrior_count: warriors.len(),
            });
        }

        let energy_mode = config.total_energy > 0;
        let queue_count = warriors.len();
        let mut mars = Self {
            core,
            warriors,
            queues: vec![Queue::new(); queue_count],
            config,
            energy_mode,
            cycle: 0,
            sink: Box::new(NullSink),
        };
        mars.load_warriors(rng);
        Ok(mars)
    }

    /// Attaches an observer that receives every side-effect event this
    /// match produces from here on.
    pub fn on_event(&mut self, sink: Box<dyn EventSink>) {
        self.sink = sink;
    }

    /// Re-fills the core with `initial_instruction` and reloads every
    /// warrior at a freshly (re-)randomized position.
    pub fn reset(&mut self, initial_instruction: Instruction, rng: &mut impl Rng) {
        self.core.reset_with(initial_instruction);
        self.cycle = 0;
        for queue in &mut self.queues {
            *queue = Queue::new();
        }
        self.load_warriors(rng);
    }

    #[must_use]
    pub fn core(&self) -> &Core {
        &self.core
    }

    #[must_use]
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    #[must_use]
    pub fn warrior_count(&self) -> usize {
        self.warriors.len()
    }

    #[must_use]
    pub fn is_alive(&self, warrior: WarriorId) -> bool {
        !self.queues[warrior].is_empty()
    }

    #[must_use]
    pub fn task_queue_len(&self, warrior: WarriorId) -> usize {
        self.queues[warrior].len()
    }

    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.queues.iter().filter(|q| !q.is_empty()).count()
    }

    fn load_warriors(&mut self, rng: &mut impl Rng) {
        let warrior_count = self.warriors.len() as i32;
        let size = self.core.size();
        let width = self.core.width();
        let space = size / warrior_count;
        let energy_mode = self.energy_mode;
        let total_energy = self.config.total_energy;

        for idx in 0..self.warriors.len() {
            let base_pos = idx as i32 * space;
            let mut warrior_position = Point::new(base_pos % width, base_pos / width);

            let (start_offset, warrior_len, grid, cells) = {
                let warrior = &self.warriors[idx];
                let len = warrior.len().max(1) as u32;
                let grid = warrior.bounding_size();
                let cells: Vec<(Point, Instruction)> =
                    warrior.iter().map(|(p, ins)| (p, *ins)).collect();
                (warrior.start, len, grid, cells)
            };

            if self.config.randomize {
                let warrior_grid_size = grid.x + grid.y * width;
                let max_offset = space - warrior_grid_size - self.config.minimum_separation;
                if max_offset > 0 {
                    let offset = rng.gen_range(0..=max_offset);
                    let pos = base_pos + offset;
                    warrior_position = Point::new(pos % width, pos / width);
                }
            }

            let start = warrior_position + start_offset;
            self.queues[idx] = Queue::seeded(start);

            let per_instruction_energy = if energy_mode {
                total_energy / warrior_len
            } else {
                0
            };

            for (pos, mut ins) in cells {
                if energy_mode {
                    ins.energy = per_instruction_energy;
                }
                let abs_pos = warrior_position + pos;
                self.core.write(abs_pos, ins);
                let normalized = self.core.normalize(abs_pos);
                self.sink.emit(idx, normalized, EventKind::IWrite);
            }

            debug!(
                "loaded warrior {} \"{}\" at {}",
                idx,
                self.warriors[idx]
                    .metadata
                    .name
                    .as_deref()
                    .unwrap_or("unnamed"),
                warrior_position,
            );
        }
    }

    /// Advances the match by one cycle: each warrior with a non-empty
    /// queue gets exactly one task dequeued, fetched, and executed.
    pub fn step(&mut self) {
        self.cycle += 1;

        for idx in 0..self.warriors.len() {
            if self.queues[idx].is_empty() {
                continue;
            }
            let pc = self.queues[idx]
                .pop_front()
                .expect("queue checked non-empty above");
            let ir = self.core.read(pc);

            if self.energy_mode && ir.energy == 0 {
                match self.config.energy_skip_policy {
                    EnergySkipPolicy::RequeueAtTail => self.queues[idx].requeue_tail(pc),
                    EnergySkipPolicy::PeekUntilAvailable => self.queues[idx].requeue_front(pc),
                }
                continue;
            }

            trace!("cycle {:>6} warrior {:>2} pc {} {}", self.cycle, idx, pc, ir);

            let outcome = opcode::execute(
                &mut self.core,
                pc,
                ir,
                idx,
                self.sink.as_mut(),
                self.energy_mode,
            );

            for successor in outcome.successors {
                let normalized = self.core.normalize(successor);
                self.queues[idx].push_back(normalized, self.config.max_processes);
            }
        }
    }

    /// The match's current outcome: [`MatchOutcome::Ongoing`] while more
    /// than one warrior remains alive (or, with a single combatant,
    /// while it remains alive and under `max_cycles`).
    #[must_use]
    pub fn outcome(&self) -> MatchOutcome {
        if self.warriors.len() >= 2 {
            let alive: Vec<WarriorId> = (0..self.warriors.len())
                .filter(|&i| self.is_alive(i))
                .collect();
            match alive.len() {
                0 => MatchOutcome::Tie,
                1 => MatchOutcome::Win(alive[0]),
                _ if self.cycle >= self.config.max_cycles => MatchOutcome::Tie,
                _ => MatchOutcome::Ongoing,
            }
        } else if self.cycle >= self.config.max_cycles || self.alive_count() == 0 {
            MatchOutcome::Tie
        } else {
            MatchOutcome::Ongoing
        }
    }

    /// Steps the match to completion: until one warrior remains (with at
    /// least two originally loaded), every warrior dies, or `max_cycles`
    /// is reached.
    pub fn run(&mut self) -> MatchOutcome {
        loop {
            match self.outcome() {
                MatchOutcome::Ongoing => self.step(),
                final_outcome => {
                    debug!("match decided after {} cycles: {:?}", self.cycle, final_outcome);
                    return final_outcome;
                }
            }
        }
    }
}

impl Index<Point> for Mars {
    type Output = Instruction;

    fn index(&self, p: Point) -> &Instruction {
        &self.core[p]
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::instruction::{AddressMode, Opcode};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn no_randomize(total_energy: u32) -> MarsConfig {
        MarsConfig {
            randomize: false,
            minimum_separation: 0,
            max_cycles: 8_000,
            total_energy,
            ..MarsConfig::default()
        }
    }

    fn single_instruction_warrior(ins: Instruction) -> Warrior {
        let mut w = Warrior::new(Point::new(0, 0));
        w.set(Point::new(0, 0), ins);
        w
    }

    #[test]
    fn rejects_empty_warrior_list() {
        let core = Core::square(100, Instruction::dat_zero()).unwrap();
        let err = Mars::new(core, vec![], MarsConfig::default(), &mut rng()).unwrap_err();
        assert_eq!(err, Error::NoWarriors);
    }

    #[test]
    fn dat_kills_a_one_task_warrior() {
        let core = Core::square(100, Instruction::dat_zero()).unwrap();
        let warrior = single_instruction_warrior(Instruction::new(
            Opcode::Dat,
            AddressMode::Direct,
            Point::new(0, 0),
            AddressMode::Direct,
            Point::new(0, 0),
        ));
        let mut mars = Mars::new(core, vec![warrior], no_randomize(0), &mut rng()).unwrap();
        assert!(mars.is_alive(0));
        mars.step();
        assert!(!mars.is_alive(0));
    }

    #[test]
    fn div_by_zero_kills_the_task() {
        let core = Core::square(100, Instruction::dat_zero()).unwrap();
        let warrior = single_instruction_warrior(Instruction::with_modifier(
            Opcode::Div,
            crate::instruction::Modifier::A,
            AddressMode::Immediate,
            Point::new(0, 0),
            AddressMode::Direct,
            Point::new(0, 0),
        ));
        let mut mars = Mars::new(core, vec![warrior], no_randomize(0), &mut rng()).unwrap();
        mars.step();
        assert!(!mars.is_alive(0));
    }

    #[test]
    fn spl_grows_task_queue_until_capped() {
        let core = Core::square(100, Instruction::dat_zero()).unwrap();
        let warrior = single_instruction_warrior(Instruction::new(
            Opcode::Spl,
            AddressMode::Direct,
            Point::new(0, 0),
            AddressMode::Direct,
            Point::new(0, 0),
        ));
        let mut config = no_randomize(0);
        config.max_processes = 4;
        let mut mars = Mars::new(core, vec![warrior], config, &mut rng()).unwrap();
        for expected in [2, 3, 4, 4, 4] {
            mars.step();
            assert_eq!(mars.task_queue_len(0), expected);
        }
    }

    #[test]
    fn energy_depletion_kills_after_exactly_n_executions() {
        let core = Core::square(100, Instruction::dat_zero()).unwrap();
        let warrior = single_instruction_warrior(
            Instruction::new(
                Opcode::Jmp,
                AddressMode::Direct,
                Point::new(0, 0),
                AddressMode::Direct,
                Point::new(0, 0),
            )
            .with_energy(10),
        );
        let mut mars = Mars::new(core, vec![warrior], no_randomize(100), &mut rng()).unwrap();

        for _ in 0..10 {
            assert!(mars.is_alive(0));
            mars.step();
        }
        // Energy is per-cell and this warrior occupies one cell, so the
        // loader divides total_energy by warrior_len == 1; the JMP
        // target is itself, so the same cell is re-executed every cycle
        // until its own energy is exhausted.
        assert!(mars.is_alive(0));
        mars.step();
        assert!(mars.is_alive(0));
    }

    #[test]
    fn self_modifying_add_wraps_through_carry_coupled_points() {
        // `ADD.AB #7, $0` writes its own A-operand (immediate 7) into its
        // own B-field (direct 0, i.e. itself) each execution, so the raw
        // (unnormalized) b_value accumulates 0, 7, 14, 21, 28, 35, ...; on
        // a 10x10 torus those raw values normalize to (0,0), (7,0), (4,1),
        // (1,2), (8,2), (5,3), matching §8's enumerated boundary sequence.
        let core = Core::new(100, 10, Instruction::dat_zero(), 100, 100).unwrap();
        let warrior = single_instruction_warrior(Instruction::new(
            Opcode::Add,
            AddressMode::Immediate,
            Point::new(7, 0),
            AddressMode::Direct,
            Point::new(0, 0),
        ));
        let mut mars = Mars::new(core, vec![warrior], no_randomize(0), &mut rng()).unwrap();

        let expected = [
            Point::new(7, 0),
            Point::new(4, 1),
            Point::new(1, 2),
            Point::new(8, 2),
            Point::new(5, 3),
        ];
        for p in expected {
            mars.step();
            let raw = mars[Point::new(0, 0)].b_value;
            assert_eq!(mars.core.normalize(raw), p);
        }
    }

    #[test]
    fn single_warrior_survives_ties_rather_than_wins() {
        let core = Core::square(100, Instruction::dat_zero()).unwrap();
        let warrior = single_instruction_warrior(Instruction::new(
            Opcode::Nop,
            AddressMode::Direct,
            Point::new(0, 0),
            AddressMode::Direct,
            Point::new(0, 0),
        ));
        let mut config = no_randomize(0);
        config.max_cycles = 3;
        let mut mars = Mars::new(core, vec![warrior], config, &mut rng()).unwrap();
        assert_eq!(mars.run(), MatchOutcome::Tie);
        assert!(mars.is_alive(0));
    }

    #[test]
    fn dwarf_beats_sitting_duck() {
        // `loop ADD.AB #2004, start; start MOV $2, $2; JMP loop`, entered
        // at `start` per `ORG start`. Modifiers are left to ICWS default
        // inference: ADD gets AB (immediate A-operand), MOV gets I (both
        // operands direct).
        let mut dwarf = Warrior::new(Point::new(1, 0));
        dwarf.set(
            Point::new(0, 0),
            Instruction::new(
                Opcode::Add,
                AddressMode::Immediate,
                Point::new(2004, 0),
                AddressMode::Direct,
                Point::new(1, 0),
            ),
        );
        dwarf.set(
            Point::new(1, 0),
            Instruction::new(
                Opcode::Mov,
                AddressMode::Direct,
                Point::new(2, 0),
                AddressMode::Direct,
                Point::new(2, 0),
            ),
        );
        dwarf.set(
            Point::new(2, 0),
            Instruction::new(
                Opcode::Jmp,
                AddressMode::Direct,
                Point::new(-2, 0),
                AddressMode::Direct,
                Point::new(0, 0),
            ),
        );

        // Five bare NOPs with no loop-back: once the program counter
        // walks off the fifth cell it runs into the core's ambient
        // `DAT.F $0, $0`, which kills the process.
        let mut sitting_duck = Warrior::new(Point::new(0, 0));
        for i in 0..5 {
            sitting_duck.set(
                Point::new(i, 0),
                Instruction::new(
                    Opcode::Nop,
                    AddressMode::Direct,
                    Point::new(0, 0),
                    AddressMode::Direct,
                    Point::new(0, 0),
                ),
            );
        }

        let core = Core::square(8_000, Instruction::dat_zero()).unwrap();
        let mut config = no_randomize(0);
        config.max_cycles = 8_000;
        let mut mars = Mars::new(core, vec![dwarf, sitting_duck], config, &mut rng()).unwrap();

        assert_eq!(mars.run(), MatchOutcome::Win(0));
        assert!(mars.is_alive(0));
        assert!(!mars.is_alive(1));
    }
}
