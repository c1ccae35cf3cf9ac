//! End-to-end match scenarios, driven entirely through the crate's public
//! API. Warriors are built by hand with `Warrior::set` rather than parsed
//! from text, since the textual parser is an external collaborator this
//! crate does not implement.

use rand::rngs::StdRng;
use rand::SeedableRng;

use corewars2d::instruction::{AddressMode, Modifier, Opcode};
use corewars2d::{Core, Instruction, Mars, MarsConfig, MatchOutcome, Point, Warrior};

fn rng() -> StdRng {
    StdRng::seed_from_u64(1)
}

/// Surfaces the scheduler's `trace!`/`debug!` logging under
/// `cargo test -- --nocapture`; harmless to call more than once.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn no_randomize() -> MarsConfig {
    MarsConfig {
        randomize: false,
        minimum_separation: 0,
        max_cycles: 8_000,
        ..MarsConfig::default()
    }
}

fn one_cell_warrior(ins: Instruction) -> Warrior {
    let mut w = Warrior::new(Point::new(0, 0));
    w.set(Point::new(0, 0), ins);
    w
}

/// Scenario 1: Dwarf vs. Sitting Duck. Dwarf survives 8000 cycles; Sitting
/// Duck walks off its five NOPs into the ambient `DAT.F $0, $0` and dies.
#[test]
fn dwarf_beats_sitting_duck() {
    init_logging();
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
    let mut mars = Mars::new(core, vec![dwarf, sitting_duck], no_randomize(), &mut rng()).unwrap();

    assert_eq!(mars.run(), MatchOutcome::Win(0));
    assert!(mars.is_alive(0));
    assert!(!mars.is_alive(1));
}

/// Scenario 3: any warrior executing a DAT cell terminates that task; a
/// one-task warrior dies outright.
#[test]
fn dat_kills_a_one_task_warrior() {
    init_logging();
    let core = Core::square(100, Instruction::dat_zero()).unwrap();
    let warrior = one_cell_warrior(Instruction::new(
        Opcode::Dat,
        AddressMode::Direct,
        Point::new(0, 0),
        AddressMode::Direct,
        Point::new(0, 0),
    ));
    let mut mars = Mars::new(core, vec![warrior], no_randomize(), &mut rng()).unwrap();
    assert!(mars.is_alive(0));
    mars.step();
    assert!(!mars.is_alive(0));
}

/// Scenario 4: a one-instruction `SPL $0,$0` warrior grows its task queue
/// by one per cycle until capped at `max_processes`.
#[test]
fn spl_doubles_until_capped() {
    init_logging();
    let core = Core::square(100, Instruction::dat_zero()).unwrap();
    let warrior = one_cell_warrior(Instruction::new(
        Opcode::Spl,
        AddressMode::Direct,
        Point::new(0, 0),
        AddressMode::Direct,
        Point::new(0, 0),
    ));
    let mut config = no_randomize();
    config.max_processes = 5;
    let mut mars = Mars::new(core, vec![warrior], config, &mut rng()).unwrap();

    for expected in [2, 3, 4, 5, 5, 5] {
        mars.step();
        assert_eq!(mars.task_queue_len(0), expected);
    }
}

/// Scenario 5: `DIV.A #0, $0` kills the executing task; the warrior's
/// task queue becomes empty.
#[test]
fn div_by_zero_kills_the_task() {
    init_logging();
    let core = Core::square(100, Instruction::dat_zero()).unwrap();
    let warrior = one_cell_warrior(Instruction::with_modifier(
        Opcode::Div,
        Modifier::A,
        AddressMode::Immediate,
        Point::new(0, 0),
        AddressMode::Direct,
        Point::new(0, 0),
    ));
    let mut mars = Mars::new(core, vec![warrior], no_randomize(), &mut rng()).unwrap();
    mars.step();
    assert!(!mars.is_alive(0));
    assert_eq!(mars.task_queue_len(0), 0);
}

/// Scenario 6: `JMP $0,$0` with initial cell energy 10, in energy-mode,
/// executes exactly 10 steps and is still alive (energy-mode does not
/// kill a warrior outright; a depleted cell simply stops progressing per
/// the default `RequeueAtTail` skip policy).
#[test]
fn energy_depletion_after_ten_executions() {
    init_logging();
    let core = Core::square(100, Instruction::dat_zero()).unwrap();
    let warrior = one_cell_warrior(
        Instruction::new(
            Opcode::Jmp,
            AddressMode::Direct,
            Point::new(0, 0),
            AddressMode::Direct,
            Point::new(0, 0),
        )
        .with_energy(10),
    );
    let mut config = no_randomize();
    // One cell, so the loader's `total_energy / warrior_len` sets the
    // cell's starting energy to exactly 10.
    config.total_energy = 10;
    let mut mars = Mars::new(core, vec![warrior], config, &mut rng()).unwrap();

    for _ in 0..10 {
        assert!(mars.is_alive(0));
        mars.step();
    }
    assert_eq!(mars[Point::new(0, 0)].energy, 0);
    // With the default `RequeueAtTail` skip policy the task is simply
    // re-queued unchanged every cycle its cell has no energy left; the
    // warrior is never killed outright by energy exhaustion.
    assert!(mars.is_alive(0));
    mars.step();
    assert!(mars.is_alive(0));
}
