//! Instruction representation

use std::fmt;

use crate::alu::ALUOp;
use crate::alu::ALUSrc;
use crate::alu::ALUSrcA;
use crate::error::ControlError;

pub mod decode_helper;

/// NOP: ADDI x0, x0, 0
pub const NOP: u32 = 0x13;

/// Width of every rv32i instruction in bytes
pub const INSTRUCTION_WIDTH: u32 = 4;

/// Decoded instruction as handed from decode to execute.
/// Register values are not part of it: they arrive from the
/// register file (or forwarding) in the execute stage's own tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Raw representation
    pub raw_inst: u32,
    /// Opcode class
    pub opcode: Opcode,
    /// ALU operation
    pub alu_op: ALUOp,
    /// Function code
    pub funct3: u8,
    pub rs1: RegIndex,
    pub rs2: RegIndex,
    pub rd: RegIndex,
    /// Sign-extended immediate
    pub imm: u32,
    /// Exception raised by decode, carried but not interpreted
    pub exception: Option<Exception>,
}

impl Instruction {
    pub fn new(raw_inst: u32) -> Self {
        decode_helper::decode(raw_inst)
    }
}

impl Default for Instruction {
    fn default() -> Self {
        Self::new(NOP)
    }
}

/// 5-bit register address; index 0 is the hardwired zero
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegIndex(u8);

impl RegIndex {
    pub const ZERO: RegIndex = RegIndex(0);

    /// Keeps the low 5 bits, so every value is in range
    pub fn new(raw: u32) -> Self {
        Self((raw & 0x1f) as u8)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RegIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// rv32i opcode class.
/// The discriminant is the bit position in the one-hot encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Register-register
    Op = 0,
    /// Register-immediate
    OpImm = 1,
    Load = 2,
    Store = 3,
    Branch = 4,
    Jal = 5,
    Jalr = 6,
    Lui = 7,
    AuiPc = 8,
    System = 9,
    Fence = 10,
}

impl Opcode {
    pub const ALL: [Opcode; 11] = [
        Opcode::Op,
        Opcode::OpImm,
        Opcode::Load,
        Opcode::Store,
        Opcode::Branch,
        Opcode::Jal,
        Opcode::Jalr,
        Opcode::Lui,
        Opcode::AuiPc,
        Opcode::System,
        Opcode::Fence,
    ];

    /// Builds the class from a one-hot vector.
    /// Anything but exactly one bit among the low 11 is rejected.
    pub fn from_one_hot(bits: u16) -> Result<Self, ControlError> {
        if bits.count_ones() != 1 {
            return Err(ControlError::OpcodeVector(bits));
        }
        Self::ALL
            .get(bits.trailing_zeros() as usize)
            .copied()
            .ok_or(ControlError::OpcodeVector(bits))
    }

    pub fn to_one_hot(self) -> u16 {
        1 << self as u16
    }

    /// Source of ALU operand A
    pub fn src1(self) -> ALUSrcA {
        match self {
            Opcode::Jal | Opcode::AuiPc => ALUSrcA::PC,
            _ => ALUSrcA::REG,
        }
    }

    /// Source of ALU operand B
    pub fn src2(self) -> ALUSrc {
        match self {
            Opcode::Op | Opcode::Branch => ALUSrc::REG,
            _ => ALUSrc::IMM,
        }
    }

    pub fn is_jump(self) -> bool {
        matches!(self, Opcode::Jal | Opcode::Jalr)
    }

    pub fn is_memory(self) -> bool {
        matches!(self, Opcode::Load | Opcode::Store)
    }

    /// Whether an instruction of this class writes its destination.
    /// funct3 == 0 marks the non-CSR system instructions.
    pub fn writes_rd(self, funct3: u8) -> bool {
        !(matches!(self, Opcode::Branch | Opcode::Store | Opcode::Fence)
            || (self == Opcode::System && funct3 == 0))
    }

    /// Whether the destination value is known once execute finishes.
    /// Loads and CSR accesses get theirs from a later stage.
    pub fn rd_ready_after_execute(self, funct3: u8) -> bool {
        !(self == Opcode::Load || (self == Opcode::System && funct3 != 0))
    }
}

/// Exceptions detected by decode and resolved by writeback
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Exception {
    IllegalInstruction,
    EnvironmentCall,
    Breakpoint,
    /// MRET
    TrapReturn,
}

impl Exception {
    /// mcause value, None for the trap return
    pub fn cause(self) -> Option<u32> {
        match self {
            Exception::IllegalInstruction => Some(2),
            Exception::Breakpoint => Some(3),
            Exception::EnvironmentCall => Some(11),
            Exception::TrapReturn => None,
        }
    }
}
