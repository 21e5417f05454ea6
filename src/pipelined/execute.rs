//! Execute stage: operand selection, ALU, branch/jump targets,
//! destination value and the stall/flush logic gating memory access.
//!
//! Everything but the EX/MEM register is combinational, so
//! [`ExecuteUnit::evaluate`] is a pure function of the tick's inputs and
//! [`ExecuteUnit::commit`] is the only place the latch changes.

use super::control::next_clock_enable;
use super::control::StageState;
use super::pipeline::EXMEMRegister;
use crate::alu::alu;
use crate::alu::ALUSrc;
use crate::alu::ALUSrcA;
use crate::instruction::Instruction;
use crate::instruction::Opcode;
use crate::instruction::INSTRUCTION_WIDTH;

/// Inputs of the execute stage for one tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecuteInput {
    /// Clock enable from decode
    pub ce: bool,
    /// PC of the held instruction
    pub pc: u32,
    pub inst: Instruction,
    /// Source register values, already forwarded
    pub rs1: u32,
    pub rs2: u32,
    /// A later stage is stalled
    pub stall: bool,
    /// Hold this stage regardless of later stages
    pub force_stall: bool,
    /// Discard the held instruction
    pub flush: bool,
}

/// Combinational outputs of the execute stage
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecuteOutputs {
    /// ALU result
    pub y: u32,
    /// Destination value
    pub rd: u32,
    pub rd_valid: bool,
    pub wr_rd: bool,
    /// Branch or jump target
    pub next_pc: u32,
    /// Request to load `next_pc` into fetch
    pub change_pc: bool,
    /// This stage cannot hand its result on
    pub stall: bool,
    /// Flush earlier stages
    pub flush: bool,
}

impl ExecuteOutputs {
    /// The redirection request, if any
    pub fn redirect(&self) -> Option<u32> {
        self.change_pc.then_some(self.next_pc)
    }
}

/// Execute stage with its EX/MEM register
#[derive(Clone, Debug, Default)]
pub struct ExecuteUnit {
    out: EXMEMRegister,
}

impl ExecuteUnit {
    pub fn make() -> Self {
        Self::default()
    }

    /// Clears the clock enable and the side signals
    pub fn reset(&mut self) {
        self.out = EXMEMRegister::default();
    }

    /// EX/MEM register as latched at the last tick boundary
    pub fn latch(&self) -> &EXMEMRegister {
        &self.out
    }

    /// Operands A and B for the instruction
    pub fn select_operands(input: &ExecuteInput) -> (u32, u32) {
        let opcode = input.inst.opcode;
        let a = match opcode.src1() {
            ALUSrcA::PC => input.pc,
            ALUSrcA::REG => input.rs1,
        };
        let b = match opcode.src2() {
            ALUSrc::REG => input.rs2,
            ALUSrc::IMM => input.inst.imm,
        };
        (a, b)
    }

    /// Combinational part of the stage
    pub fn evaluate(input: &ExecuteInput) -> ExecuteOutputs {
        let inst = &input.inst;
        let opcode = inst.opcode;
        let (a, b) = Self::select_operands(input);
        let y = alu(inst.alu_op, a, b);
        debug_assert!(!inst.alu_op.is_comparison() || y <= 1);

        // Shared target adder; JALR adds to rs1 instead of the PC
        let base = if opcode == Opcode::Jalr { input.rs1 } else { input.pc };
        let sum = base.wrapping_add(inst.imm);

        let mut outputs = ExecuteOutputs {
            y,
            rd: 0,
            rd_valid: opcode.rd_ready_after_execute(inst.funct3),
            wr_rd: opcode.writes_rd(inst.funct3),
            next_pc: 0,
            change_pc: false,
            // A flushed instruction does not wait on later stages
            stall: (input.stall || input.force_stall) && !input.flush,
            flush: input.flush,
        };

        if !input.flush {
            match opcode {
                Opcode::Op | Opcode::OpImm => outputs.rd = y,
                Opcode::Branch if y & 1 != 0 => {
                    outputs.next_pc = sum;
                    outputs.change_pc = input.ce;
                    outputs.flush = input.ce;
                }
                Opcode::Jal | Opcode::Jalr => {
                    outputs.next_pc = sum;
                    outputs.change_pc = input.ce;
                    outputs.flush = input.ce;
                    outputs.rd = input.pc.wrapping_add(INSTRUCTION_WIDTH);
                }
                _ => {}
            }
        }
        match opcode {
            Opcode::Lui => outputs.rd = inst.imm,
            Opcode::AuiPc => outputs.rd = sum,
            _ => {}
        }

        outputs
    }

    /// Summary of the enable/stall/flush triple for this tick
    pub fn state(input: &ExecuteInput, outputs: &ExecuteOutputs) -> StageState {
        StageState::resolve(
            input.ce,
            outputs.stall || input.stall,
            input.flush,
        )
    }

    /// Tick boundary: latch the result unless held
    pub fn commit(&mut self, input: &ExecuteInput, outputs: &ExecuteOutputs) {
        let stall_bit = outputs.stall || input.stall;
        let inst = &input.inst;

        if input.ce && !stall_bit {
            self.out = EXMEMRegister {
                ce: self.out.ce,
                pc: input.pc,
                opcode: inst.opcode,
                funct3: inst.funct3,
                exception: inst.exception,
                y: outputs.y,
                rs1_addr: inst.rs1,
                rs1: input.rs1,
                rs2: input.rs2,
                imm: (inst.imm & 0xfff) as u16,
                rd_addr: inst.rd,
                rd: outputs.rd,
                rd_valid: outputs.rd_valid,
                wr_rd: outputs.wr_rd,
                // Data memory usually needs more than one cycle
                stall_from_alu: inst.opcode.is_memory(),
            };
        }
        self.out.ce = next_clock_enable(
            self.out.ce,
            input.ce,
            stall_bit,
            input.stall,
            input.flush,
        );
    }
}
