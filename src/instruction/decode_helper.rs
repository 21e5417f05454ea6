//! Decoding helper functions.
//! Turns a raw word into the record the execute stage consumes.
//! Anything outside rv32i (plus FENCE and the trap instructions)
//! decodes to an illegal-instruction record that writes nothing.

use super::Exception;
use super::Instruction;
use super::Opcode;
use super::RegIndex;
use crate::alu::ALUOp;

const FUNCT7_ALT: u32 = 0x20;

const SYSTEM_ECALL: u32 = 0x000;
const SYSTEM_EBREAK: u32 = 0x001;
const SYSTEM_WFI: u32 = 0x105;
const SYSTEM_MRET: u32 = 0x302;

/// Decodes a raw instruction
pub fn decode(raw_inst: u32) -> Instruction {
    let Some(opcode) = raw_to_opcode(raw_inst) else {
        return illegal(raw_inst);
    };
    let funct3 = get_funct3(raw_inst);
    let Some((alu_op, exception)) = get_function(opcode, raw_inst) else {
        return illegal(raw_inst);
    };

    let (rs1, rs2, rd) = match opcode {
        Opcode::Op => (get_rs1(raw_inst), get_rs2(raw_inst), get_rd(raw_inst)),
        Opcode::OpImm | Opcode::Load | Opcode::Jalr => {
            (get_rs1(raw_inst), 0, get_rd(raw_inst))
        }
        Opcode::Store | Opcode::Branch => {
            (get_rs1(raw_inst), get_rs2(raw_inst), 0)
        }
        Opcode::Jal | Opcode::Lui | Opcode::AuiPc => (0, 0, get_rd(raw_inst)),
        Opcode::System if funct3 != 0 => (get_rs1(raw_inst), 0, get_rd(raw_inst)),
        Opcode::System | Opcode::Fence => (0, 0, 0),
    };

    Instruction {
        raw_inst,
        opcode,
        alu_op,
        funct3: funct3 as u8,
        rs1: RegIndex::new(rs1),
        rs2: RegIndex::new(rs2),
        rd: RegIndex::new(rd),
        imm: get_imm(opcode, raw_inst),
        exception,
    }
}

/// Canonical record for words that are not valid instructions
fn illegal(raw_inst: u32) -> Instruction {
    Instruction {
        raw_inst,
        opcode: Opcode::System,
        alu_op: ALUOp::ADD,
        funct3: 0,
        rs1: RegIndex::ZERO,
        rs2: RegIndex::ZERO,
        rd: RegIndex::ZERO,
        imm: 0,
        exception: Some(Exception::IllegalInstruction),
    }
}

/// Returns the opcode class from a raw instruction
pub fn raw_to_opcode(raw_inst: u32) -> Option<Opcode> {
    match get_opcode(raw_inst) {
        0x37 => Some(Opcode::Lui),
        0x17 => Some(Opcode::AuiPc),
        0x6f => Some(Opcode::Jal),
        0x67 => Some(Opcode::Jalr),
        0x63 => Some(Opcode::Branch),
        0x03 => Some(Opcode::Load),
        0x23 => Some(Opcode::Store),
        0x33 => Some(Opcode::Op),
        0x13 => Some(Opcode::OpImm),
        0x73 => Some(Opcode::System),
        0x0f => Some(Opcode::Fence),
        _ => None,
    }
}

/// Selects the ALU operation and any exception; None if illegal
fn get_function(
    opcode: Opcode,
    raw_inst: u32,
) -> Option<(ALUOp, Option<Exception>)> {
    use ALUOp::*;

    let funct3 = get_funct3(raw_inst);
    let funct7 = get_funct7(raw_inst);

    let alu_op = match opcode {
        Opcode::Op => match (funct3, funct7) {
            (0b000, 0) => ADD,
            (0b000, FUNCT7_ALT) => SUB,
            (0b001, 0) => SLL,
            (0b010, 0) => SLT,
            (0b011, 0) => SLTU,
            (0b100, 0) => XOR,
            (0b101, 0) => SRL,
            (0b101, FUNCT7_ALT) => SRA,
            (0b110, 0) => OR,
            (0b111, 0) => AND,
            _ => return None,
        },
        Opcode::OpImm => match (funct3, funct7) {
            (0b000, _) => ADD,
            (0b010, _) => SLT,
            (0b011, _) => SLTU,
            (0b100, _) => XOR,
            (0b110, _) => OR,
            (0b111, _) => AND,
            (0b001, 0) => SLL,
            (0b101, 0) => SRL,
            (0b101, FUNCT7_ALT) => SRA,
            _ => return None,
        },
        Opcode::Branch => match funct3 {
            0b000 => EQ,
            0b001 => NEQ,
            0b100 => SLT,
            0b101 => GE,
            0b110 => SLTU,
            0b111 => GEU,
            _ => return None,
        },
        Opcode::Load if matches!(funct3, 0b000 | 0b001 | 0b010 | 0b100 | 0b101) => {
            ADD
        }
        Opcode::Store if funct3 <= 0b010 => ADD,
        Opcode::Jalr if funct3 == 0 => ADD,
        Opcode::Jal | Opcode::Lui | Opcode::AuiPc | Opcode::Fence => ADD,
        Opcode::System => {
            if funct3 != 0 {
                // CSR access, value supplied past execute
                return (funct3 != 0b100).then_some((ADD, None));
            }
            let exception = match get_imm_i(raw_inst) {
                SYSTEM_ECALL => Some(Exception::EnvironmentCall),
                SYSTEM_EBREAK => Some(Exception::Breakpoint),
                SYSTEM_MRET => Some(Exception::TrapReturn),
                SYSTEM_WFI => None,
                _ => return None,
            };
            return Some((ADD, exception));
        }
        _ => return None,
    };
    Some((alu_op, None))
}

/// Extracts the sign-extended immediate for the class's format
fn get_imm(opcode: Opcode, raw_inst: u32) -> u32 {
    let sign = ((raw_inst as i32) >> 31) as u32;
    match opcode {
        Opcode::Lui | Opcode::AuiPc => raw_inst & 0xfffff000,
        Opcode::Jal => {
            (sign << 20)
                | (raw_inst & 0xff000)
                | (((raw_inst >> 20) & 0x1) << 11)
                | (((raw_inst >> 21) & 0x3ff) << 1)
        }
        Opcode::Branch => {
            (sign << 12)
                | (((raw_inst >> 7) & 0x1) << 11)
                | (((raw_inst >> 25) & 0x3f) << 5)
                | (((raw_inst >> 8) & 0xf) << 1)
        }
        Opcode::Store => {
            (sign << 12) | (((raw_inst >> 25) & 0x7f) << 5) | get_rd(raw_inst)
        }
        Opcode::System | Opcode::Fence => 0,
        Opcode::Op => 0,
        Opcode::OpImm | Opcode::Load | Opcode::Jalr => {
            ((raw_inst as i32) >> 20) as u32
        }
    }
}

/// Unsigned 12-bit I-type immediate
fn get_imm_i(raw_inst: u32) -> u32 {
    raw_inst >> 20
}

/// Extracts opcode from a raw instruction
fn get_opcode(raw_inst: u32) -> u32 {
    raw_inst & 0x7f
}

/// Extracts funct3 from a raw instruction
fn get_funct3(raw_inst: u32) -> u32 {
    (raw_inst >> 12) & 0x7
}

/// Extracts the rs1 field from a raw instruction
fn get_rs1(raw_inst: u32) -> u32 {
    (raw_inst >> 15) & 0x1f
}

/// Extracts the rs2 field from a raw instruction
fn get_rs2(raw_inst: u32) -> u32 {
    (raw_inst >> 20) & 0x1f
}

/// Extracts the rd field from a raw instruction
fn get_rd(raw_inst: u32) -> u32 {
    (raw_inst >> 7) & 0x1f
}

/// Extracts the funct7 field from a raw instruction
fn get_funct7(raw_inst: u32) -> u32 {
    (raw_inst >> 25) & 0x7f
}
