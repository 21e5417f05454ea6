//! Hand assembly of RV32I test programs and a pipeline to run them on.

#![allow(dead_code)]

use sim_lib::memory::Memory;
use sim_lib::pipelined::Pipeline;
use sim_lib::pipelined::TickReport;

/// Where test programs are placed
pub const BASE: u32 = 0x1000;
/// Where trap handlers are placed
pub const TRAP_VECTOR: u32 = 0x100;
/// Scratch data area
pub const DATA: u32 = 0x4000;

const OP: u32 = 0b0110011;
const OP_IMM: u32 = 0b0010011;
const LOAD: u32 = 0b0000011;
const STORE: u32 = 0b0100011;
const BRANCH: u32 = 0b1100011;
const JAL: u32 = 0b1101111;
const JALR: u32 = 0b1100111;
const LUI: u32 = 0b0110111;
const AUIPC: u32 = 0b0010111;
const SYSTEM: u32 = 0b1110011;

// ──────────────────────────────────────────────────────────
// Encoding helpers
// ──────────────────────────────────────────────────────────

pub fn r_type(opcode: u32, rd: u32, funct3: u32, rs1: u32, rs2: u32, funct7: u32) -> u32 {
    (funct7 & 0x7F) << 25
        | (rs2 & 0x1F) << 20
        | (rs1 & 0x1F) << 15
        | (funct3 & 0x7) << 12
        | (rd & 0x1F) << 7
        | (opcode & 0x7F)
}

pub fn i_type(opcode: u32, rd: u32, funct3: u32, rs1: u32, imm: i32) -> u32 {
    let imm_bits = (imm as u32) & 0xFFF;
    imm_bits << 20 | (rs1 & 0x1F) << 15 | (funct3 & 0x7) << 12 | (rd & 0x1F) << 7 | (opcode & 0x7F)
}

pub fn s_type(opcode: u32, funct3: u32, rs1: u32, rs2: u32, imm: i32) -> u32 {
    let v = imm as u32;
    let hi = (v >> 5) & 0x7F;
    let lo = v & 0x1F;
    hi << 25
        | (rs2 & 0x1F) << 20
        | (rs1 & 0x1F) << 15
        | (funct3 & 0x7) << 12
        | lo << 7
        | (opcode & 0x7F)
}

pub fn b_type(opcode: u32, funct3: u32, rs1: u32, rs2: u32, imm: i32) -> u32 {
    let v = imm as u32;
    let bit12 = (v >> 12) & 1;
    let bits10_5 = (v >> 5) & 0x3F;
    let bits4_1 = (v >> 1) & 0xF;
    let bit11 = (v >> 11) & 1;
    bit12 << 31
        | bits10_5 << 25
        | (rs2 & 0x1F) << 20
        | (rs1 & 0x1F) << 15
        | (funct3 & 0x7) << 12
        | bits4_1 << 8
        | bit11 << 7
        | (opcode & 0x7F)
}

pub fn u_type(opcode: u32, rd: u32, imm20: u32) -> u32 {
    (imm20 & 0xFFFFF) << 12 | (rd & 0x1F) << 7 | (opcode & 0x7F)
}

pub fn j_type(opcode: u32, rd: u32, imm: i32) -> u32 {
    let v = imm as u32;
    let bit20 = (v >> 20) & 1;
    let bits10_1 = (v >> 1) & 0x3FF;
    let bit11 = (v >> 11) & 1;
    let bits19_12 = (v >> 12) & 0xFF;
    bit20 << 31
        | bits10_1 << 21
        | bit11 << 20
        | bits19_12 << 12
        | (rd & 0x1F) << 7
        | (opcode & 0x7F)
}

// ──────────────────────────────────────────────────────────
// Mnemonics
// ──────────────────────────────────────────────────────────

pub fn add(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(OP, rd, 0b000, rs1, rs2, 0)
}

pub fn sub(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(OP, rd, 0b000, rs1, rs2, 0b0100000)
}

pub fn addi(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(OP_IMM, rd, 0b000, rs1, imm)
}

pub fn lw(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(LOAD, rd, 0b010, rs1, imm)
}

pub fn lb(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(LOAD, rd, 0b000, rs1, imm)
}

pub fn lbu(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(LOAD, rd, 0b100, rs1, imm)
}

pub fn sw(rs2: u32, rs1: u32, imm: i32) -> u32 {
    s_type(STORE, 0b010, rs1, rs2, imm)
}

pub fn sb(rs2: u32, rs1: u32, imm: i32) -> u32 {
    s_type(STORE, 0b000, rs1, rs2, imm)
}

pub fn beq(rs1: u32, rs2: u32, imm: i32) -> u32 {
    b_type(BRANCH, 0b000, rs1, rs2, imm)
}

pub fn bne(rs1: u32, rs2: u32, imm: i32) -> u32 {
    b_type(BRANCH, 0b001, rs1, rs2, imm)
}

pub fn blt(rs1: u32, rs2: u32, imm: i32) -> u32 {
    b_type(BRANCH, 0b100, rs1, rs2, imm)
}

pub fn jal(rd: u32, imm: i32) -> u32 {
    j_type(JAL, rd, imm)
}

pub fn jalr(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(JALR, rd, 0b000, rs1, imm)
}

pub fn lui(rd: u32, imm20: u32) -> u32 {
    u_type(LUI, rd, imm20)
}

pub fn auipc(rd: u32, imm20: u32) -> u32 {
    u_type(AUIPC, rd, imm20)
}

pub fn ecall() -> u32 {
    i_type(SYSTEM, 0, 0, 0, 0)
}

pub fn ebreak() -> u32 {
    i_type(SYSTEM, 0, 0, 0, 1)
}

pub fn mret() -> u32 {
    i_type(SYSTEM, 0, 0, 0, 0x302)
}

pub fn nop() -> u32 {
    addi(0, 0, 0)
}

// ──────────────────────────────────────────────────────────
// Running programs
// ──────────────────────────────────────────────────────────

pub fn place(memory: &mut Memory, base: u32, words: &[u32]) {
    for (i, word) in words.iter().enumerate() {
        memory.mmu.set32(base + 4 * i as u32, *word);
    }
}

/// A pipeline with `program` at [`BASE`] and `handler` at [`TRAP_VECTOR`]
pub fn machine_with_handler(
    program: &[u32],
    handler: &[u32],
    imem_latency: u32,
    dmem_latency: u32,
) -> Pipeline {
    let mut memory = Memory::make(imem_latency, dmem_latency);
    place(&mut memory, BASE, program);
    place(&mut memory, TRAP_VECTOR, handler);
    Pipeline::make(memory, BASE, TRAP_VECTOR)
}

pub fn machine(program: &[u32], imem_latency: u32, dmem_latency: u32) -> Pipeline {
    machine_with_handler(program, &[ebreak()], imem_latency, dmem_latency)
}

/// Runs to the halting EBREAK, keeping every tick report
pub fn run_to_halt(pipeline: &mut Pipeline) -> (u32, Vec<TickReport>) {
    let mut reports = vec![];
    let exit_pc = pipeline
        .run(10_000, |report| {
            reports.push(*report);
            Ok(())
        })
        .unwrap();
    (exit_pc, reports)
}

pub fn reg(pipeline: &Pipeline, index: u32) -> u32 {
    pipeline.regfile.value(sim_lib::instruction::RegIndex::new(index))
}
