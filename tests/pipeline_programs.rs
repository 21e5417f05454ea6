//! Hand-assembled programs run through the whole pipeline under
//! several instruction and data memory latencies.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use rstest::rstest;
use sim_lib::pipelined::control::RedirectSource;
use sim_lib::pipelined::control::StageState;

fn retired(reports: &[sim_lib::pipelined::TickReport]) -> Vec<u32> {
    reports.iter().filter_map(|report| report.retired).collect()
}

#[rstest]
fn arithmetic_with_forwarding(
    #[values(0, 1, 3)] imem: u32,
    #[values(0, 2)] dmem: u32,
) {
    let mut pipeline = machine(
        &[
            addi(1, 0, 5),
            addi(2, 0, 7),
            add(3, 1, 2),
            sub(4, 3, 1),
            add(5, 4, 4),
            ebreak(),
        ],
        imem,
        dmem,
    );
    let (exit_pc, _) = run_to_halt(&mut pipeline);
    assert_eq!(exit_pc, BASE + 20);
    assert_eq!(
        (1..=5).map(|r| reg(&pipeline, r)).collect::<Vec<_>>(),
        vec![5, 7, 12, 7, 14]
    );
    assert_eq!(pipeline.history.inst_count, 6);
}

#[rstest]
fn loads_stores_and_load_use(
    #[values(0, 1, 3)] imem: u32,
    #[values(0, 1, 4)] dmem: u32,
) {
    let mut pipeline = machine(
        &[
            lui(1, DATA >> 12),
            addi(2, 0, -5),
            sw(2, 1, 0),
            lw(3, 1, 0),
            // Uses the load result right away
            addi(4, 3, 1),
            lb(5, 1, 0),
            lbu(6, 1, 0),
            sb(4, 1, 4),
            lw(7, 1, 4),
            ebreak(),
        ],
        imem,
        dmem,
    );
    let (exit_pc, _) = run_to_halt(&mut pipeline);
    assert_eq!(exit_pc, BASE + 36);
    assert_eq!(reg(&pipeline, 3), -5i32 as u32);
    assert_eq!(reg(&pipeline, 4), -4i32 as u32);
    assert_eq!(reg(&pipeline, 5), -5i32 as u32);
    assert_eq!(reg(&pipeline, 6), 0xfb);
    assert_eq!(reg(&pipeline, 7), 0xfc);
    assert_eq!(pipeline.memory.mmu.get32(DATA), -5i32 as u32);
}

#[test]
fn load_use_stalls_execute() {
    let mut pipeline = machine(
        &[lui(1, DATA >> 12), lw(3, 1, 0), addi(4, 3, 1), ebreak()],
        0,
        0,
    );
    pipeline.memory.mmu.set32(DATA, 41);
    run_to_halt(&mut pipeline);
    assert_eq!(reg(&pipeline, 4), 42);
    assert_eq!(pipeline.history.execute_stall_count, 1);
}

#[rstest]
fn loop_retires_only_the_taken_path(
    #[values(0, 1, 3)] imem: u32,
    #[values(0, 2)] dmem: u32,
) {
    let mut pipeline = machine(
        &[
            addi(1, 0, 0),
            addi(2, 0, 5),
            addi(1, 1, 1),
            bne(1, 2, -4),
            ebreak(),
        ],
        imem,
        dmem,
    );
    let (exit_pc, reports) = run_to_halt(&mut pipeline);
    assert_eq!(exit_pc, BASE + 16);
    assert_eq!(reg(&pipeline, 1), 5);

    let mut expected = vec![BASE, BASE + 4];
    for _ in 0..5 {
        expected.extend([BASE + 8, BASE + 12]);
    }
    expected.push(BASE + 16);
    assert_eq!(retired(&reports), expected);
    assert_eq!(pipeline.history.redirect_count, 4);
}

#[rstest]
fn jumps_link_and_return(#[values(0, 2)] imem: u32) {
    let mut pipeline = machine(
        &[
            jal(1, 12),
            addi(5, 0, 1),
            ebreak(),
            auipc(6, 0),
            jalr(7, 1, 4),
        ],
        imem,
        0,
    );
    let (exit_pc, reports) = run_to_halt(&mut pipeline);
    assert_eq!(exit_pc, BASE + 8);
    assert_eq!(reg(&pipeline, 1), BASE + 4);
    assert_eq!(reg(&pipeline, 5), 0);
    assert_eq!(reg(&pipeline, 6), BASE + 12);
    assert_eq!(reg(&pipeline, 7), BASE + 20);
    assert_eq!(retired(&reports), vec![BASE, BASE + 12, BASE + 16, BASE + 8]);
}

#[test]
fn redirect_leaves_exactly_one_bubble() {
    let mut pipeline = machine(&[jal(0, 12), nop(), nop(), nop(), ebreak()], 0, 0);
    let (_, reports) = run_to_halt(&mut pipeline);
    let at = reports
        .iter()
        .position(|report| report.redirect.is_some())
        .unwrap();
    assert_eq!(
        reports[at].redirect.map(|r| (r.target, r.source)),
        Some((BASE + 12, RedirectSource::Branch))
    );
    assert_eq!(reports[at + 1].states.decode, StageState::Idle);
    assert_eq!(reports[at + 2].states.decode, StageState::Active);
    assert_eq!(retired(&reports), vec![BASE, BASE + 12, BASE + 16]);
}

#[rstest]
fn register_zero_stays_zero(#[values(0, 2)] imem: u32) {
    let mut pipeline = machine(
        &[
            addi(0, 0, 5),
            lui(0, 1),
            add(1, 0, 0),
            addi(2, 0, 3),
            jal(0, 8),
            nop(),
            ebreak(),
        ],
        imem,
        0,
    );
    run_to_halt(&mut pipeline);
    assert_eq!(reg(&pipeline, 0), 0);
    assert_eq!(reg(&pipeline, 1), 0);
    assert_eq!(reg(&pipeline, 2), 3);
    assert_eq!(pipeline.regfile.snapshot()[0], 0);
}

#[rstest]
fn ecall_traps_and_mret_returns(
    #[values(0, 1, 3)] imem: u32,
    #[values(0, 2)] dmem: u32,
) {
    let handler = [
        // Sum of x5 seen at each trap
        add(6, 6, 5),
        addi(2, 2, 1),
        addi(3, 0, 2),
        beq(2, 3, 8),
        mret(),
        lui(4, BASE >> 12),
        jalr(0, 4, 4),
    ];
    let mut pipeline = machine_with_handler(
        &[ecall(), addi(5, 5, 1), ebreak()],
        &handler,
        imem,
        dmem,
    );
    let (exit_pc, reports) = run_to_halt(&mut pipeline);
    assert_eq!(exit_pc, BASE + 8);
    // The instruction after ECALL ran once, after the second trap
    assert_eq!(reg(&pipeline, 5), 1);
    assert_eq!(reg(&pipeline, 6), 0);
    assert_eq!(reg(&pipeline, 2), 2);
    assert_eq!(pipeline.write_back_unit().mepc(), BASE);
    assert_eq!(pipeline.write_back_unit().mcause(), 11);
    assert_eq!(pipeline.history.trap_count, 2);
    assert_eq!(
        reports
            .iter()
            .filter(|report| report
                .redirect
                .is_some_and(|r| r.source == RedirectSource::Trap))
            .count(),
        3
    );
}

#[test]
fn illegal_instruction_traps() {
    let mut pipeline = machine_with_handler(
        &[0xffff_ffff, addi(5, 0, 1), ebreak()],
        &[lui(4, BASE >> 12), jalr(0, 4, 8)],
        0,
        0,
    );
    let (exit_pc, _) = run_to_halt(&mut pipeline);
    assert_eq!(exit_pc, BASE + 8);
    assert_eq!(reg(&pipeline, 5), 0);
    assert_eq!(pipeline.write_back_unit().mcause(), 2);
    assert_eq!(pipeline.write_back_unit().mepc(), BASE);
}

#[rstest]
fn forced_stall_with_taken_branch(
    #[values(0, 1)] imem: u32,
    #[values(0, 1, 3)] dmem: u32,
) {
    let mut pipeline = machine(
        &[
            lui(1, DATA >> 12),
            addi(2, 0, 7),
            sw(2, 1, 0),
            lw(3, 1, 0),
            // Waits on the load, then is taken
            beq(3, 2, 12),
            addi(5, 0, 1),
            ebreak(),
            addi(6, 0, 1),
            ebreak(),
        ],
        imem,
        dmem,
    );
    let (exit_pc, reports) = run_to_halt(&mut pipeline);
    assert_eq!(exit_pc, BASE + 32);
    assert_eq!(reg(&pipeline, 3), 7);
    assert_eq!(reg(&pipeline, 5), 0);
    assert_eq!(reg(&pipeline, 6), 1);
    assert_eq!(pipeline.history.redirect_count, 1);
    assert!(!retired(&reports).contains(&(BASE + 20)));
}

#[rstest]
fn fetch_stall_is_idempotent_and_replays(#[values(0, 2)] imem: u32) {
    let program = [
        addi(1, 0, 1),
        addi(2, 0, 2),
        addi(3, 0, 3),
        addi(4, 0, 4),
        addi(5, 0, 5),
        ebreak(),
    ];
    let mut pipeline = machine(&program, imem, 0);
    for _ in 0..6 {
        pipeline.tick();
    }

    pipeline.set_fetch_stall(true);
    for _ in 0..20 {
        pipeline.tick();
    }
    let snapshot = (
        pipeline.pc(),
        pipeline.state(),
        pipeline.regfile.snapshot(),
        pipeline.fetch_unit().replay(),
    );
    assert!(snapshot.3.is_some());
    for _ in 0..5 {
        let report = pipeline.tick();
        assert_eq!(report.retired, None);
        assert_eq!(
            (
                pipeline.pc(),
                pipeline.state(),
                pipeline.regfile.snapshot(),
                pipeline.fetch_unit().replay(),
            ),
            snapshot
        );
    }

    pipeline.set_fetch_stall(false);
    let (exit_pc, _) = run_to_halt(&mut pipeline);
    assert_eq!(exit_pc, BASE + 20);
    assert_eq!(
        (1..=5).map(|r| reg(&pipeline, r)).collect::<Vec<_>>(),
        vec![1, 2, 3, 4, 5]
    );
    assert_eq!(pipeline.history.inst_count, 6);
}

#[test]
fn reset_reruns_program() {
    let mut pipeline = machine(&[addi(1, 1, 1), ebreak()], 1, 0);
    run_to_halt(&mut pipeline);
    assert_eq!(reg(&pipeline, 1), 1);
    pipeline.reset();
    let (exit_pc, _) = run_to_halt(&mut pipeline);
    assert_eq!(exit_pc, BASE + 4);
    // Registers survive reset
    assert_eq!(reg(&pipeline, 1), 2);
}
