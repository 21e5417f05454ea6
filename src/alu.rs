//! ALU implementation

use crate::error::ControlError;

/// Performs an atomic ALU operation.
/// Comparisons produce their result in bit 0, all other bits clear.
pub fn alu(op: ALUOp, a: u32, b: u32) -> u32 {
    let shamt = b & 0x1f;
    match op {
        ALUOp::ADD => a.wrapping_add(b),
        ALUOp::SUB => a.wrapping_sub(b),
        ALUOp::SLT => signed_less_than(a, b) as u32,
        ALUOp::SLTU => (a < b) as u32,
        ALUOp::XOR => a ^ b,
        ALUOp::OR => a | b,
        ALUOp::AND => a & b,
        ALUOp::SLL => a << shamt,
        ALUOp::SRL => a >> shamt,
        ALUOp::SRA => ((a as i32) >> shamt) as u32,
        ALUOp::EQ => (a == b) as u32,
        ALUOp::NEQ => (a != b) as u32,
        ALUOp::GE => signed_greater_equal(a, b) as u32,
        ALUOp::GEU => (a >= b) as u32,
    }
}

fn sign_bit(value: u32) -> bool {
    value >> 31 != 0
}

/// Differing signs decide on A's sign alone; otherwise magnitudes compare
fn signed_less_than(a: u32, b: u32) -> bool {
    if sign_bit(a) != sign_bit(b) {
        sign_bit(a)
    } else {
        a < b
    }
}

/// Differing signs decide on B's sign alone; otherwise magnitudes compare
fn signed_greater_equal(a: u32, b: u32) -> bool {
    if sign_bit(a) != sign_bit(b) {
        sign_bit(b)
    } else {
        a >= b
    }
}

/// Selector for ALU src1 input
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ALUSrcA {
    // From register
    #[default]
    REG,
    // From the instruction's PC
    PC,
}

/// Selector for ALU src2 input
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ALUSrc {
    // From register
    #[default]
    REG,
    // From immediate
    IMM,
}

/// The 14 ALU operations of the execute stage.
/// The discriminant is the bit position in the one-hot encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ALUOp {
    // Arithmetic
    #[default]
    ADD = 0,
    SUB = 1,
    // Set
    SLT = 2,
    SLTU = 3,
    // Logical
    XOR = 4,
    OR = 5,
    AND = 6,
    // Shift
    SLL = 7,
    SRL = 8,
    SRA = 9,
    // Compare
    EQ = 10,
    NEQ = 11,
    GE = 12,
    GEU = 13,
}

impl ALUOp {
    pub const ALL: [ALUOp; 14] = [
        ALUOp::ADD,
        ALUOp::SUB,
        ALUOp::SLT,
        ALUOp::SLTU,
        ALUOp::XOR,
        ALUOp::OR,
        ALUOp::AND,
        ALUOp::SLL,
        ALUOp::SRL,
        ALUOp::SRA,
        ALUOp::EQ,
        ALUOp::NEQ,
        ALUOp::GE,
        ALUOp::GEU,
    ];

    /// Builds the operation from a one-hot vector.
    /// Anything but exactly one bit among the low 14 is rejected.
    pub fn from_one_hot(bits: u16) -> Result<Self, ControlError> {
        if bits.count_ones() != 1 {
            return Err(ControlError::AluOpVector(bits));
        }
        Self::ALL
            .get(bits.trailing_zeros() as usize)
            .copied()
            .ok_or(ControlError::AluOpVector(bits))
    }

    pub fn to_one_hot(self) -> u16 {
        1 << self as u16
    }

    /// True for operations whose result is a single comparison bit
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            ALUOp::SLT
                | ALUOp::SLTU
                | ALUOp::EQ
                | ALUOp::NEQ
                | ALUOp::GE
                | ALUOp::GEU
        )
    }
}
