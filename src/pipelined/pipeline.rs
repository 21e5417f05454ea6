//! Pipeline registers between the five stages.
//! Each is owned by the stage that writes it; `ce` is the clock enable
//! the owner hands to the following stage.

use crate::instruction::Exception;
use crate::instruction::Instruction;
use crate::instruction::Opcode;
use crate::instruction::RegIndex;
use crate::instruction::NOP;

/// IF/ID register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IFIDRegister {
    /// Clock enable of decode
    pub ce: bool,

    /// Program counter
    pub pc: u32,

    /// Raw instruction
    pub raw_inst: u32,
}

impl Default for IFIDRegister {
    fn default() -> Self {
        Self { ce: false, pc: 0, raw_inst: NOP }
    }
}

/// ID/EX register
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IDEXRegister {
    /// Clock enable of execute
    pub ce: bool,

    /// Program counter
    pub pc: u32,

    /// Decoded instruction
    pub inst: Instruction,
}

/// EX/MEM register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EXMEMRegister {
    /// Clock enable of memory access
    pub ce: bool,

    /// Program counter
    pub pc: u32,

    pub opcode: Opcode,
    pub funct3: u8,
    pub exception: Option<Exception>,

    /// ALU result; the effective address for loads and stores
    pub y: u32,

    pub rs1_addr: RegIndex,
    pub rs1: u32,
    /// Store data
    pub rs2: u32,

    /// Low 12 bits of the immediate
    pub imm: u16,

    /// Destination
    pub rd_addr: RegIndex,
    pub rd: u32,
    /// rd holds its final value
    pub rd_valid: bool,
    /// The instruction writes rd
    pub wr_rd: bool,

    /// Memory access needs the data port this time
    pub stall_from_alu: bool,
}

impl Default for EXMEMRegister {
    fn default() -> Self {
        Self {
            ce: false,
            pc: 0,
            opcode: Opcode::OpImm,
            funct3: 0,
            exception: None,
            y: 0,
            rs1_addr: RegIndex::ZERO,
            rs1: 0,
            rs2: 0,
            imm: 0,
            rd_addr: RegIndex::ZERO,
            rd: 0,
            rd_valid: false,
            wr_rd: false,
            stall_from_alu: false,
        }
    }
}

/// MEM/WB register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MEMWBRegister {
    /// Clock enable of write back
    pub ce: bool,

    /// Program counter
    pub pc: u32,

    pub opcode: Opcode,
    pub funct3: u8,
    pub exception: Option<Exception>,

    pub rd_addr: RegIndex,
    /// Actual write back result; loaded data for loads
    pub rd: u32,
    pub rd_valid: bool,
    pub wr_rd: bool,
}

impl Default for MEMWBRegister {
    fn default() -> Self {
        Self {
            ce: false,
            pc: 0,
            opcode: Opcode::OpImm,
            funct3: 0,
            exception: None,
            rd_addr: RegIndex::ZERO,
            rd: 0,
            rd_valid: false,
            wr_rd: false,
        }
    }
}

/// Snapshot of all four pipeline registers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineState {
    pub if_id: IFIDRegister,
    pub id_ex: IDEXRegister,
    pub ex_mem: EXMEMRegister,
    pub mem_wb: MEMWBRegister,
}
