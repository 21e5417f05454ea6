//! Decode stage: turns the IF/ID word into an instruction record and
//! presents its source addresses to the register file read port.

use super::control::next_clock_enable;
use super::control::StageState;
use super::pipeline::IDEXRegister;
use super::pipeline::IFIDRegister;
use crate::instruction::Instruction;
use crate::instruction::RegIndex;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeInput {
    pub if_id: IFIDRegister,
    /// A later stage is stalled
    pub stall: bool,
    pub flush: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeOutputs {
    pub inst: Instruction,
    pub stall: bool,
    /// Passed on to fetch
    pub flush: bool,
    /// Register file read port
    pub ce_read: bool,
    pub rs1_addr: RegIndex,
    pub rs2_addr: RegIndex,
}

#[derive(Clone, Debug, Default)]
pub struct DecodeUnit {
    out: IDEXRegister,
}

impl DecodeUnit {
    pub fn make() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.out = IDEXRegister::default();
    }

    pub fn latch(&self) -> &IDEXRegister {
        &self.out
    }

    pub fn evaluate(input: &DecodeInput) -> DecodeOutputs {
        let inst = Instruction::new(input.if_id.raw_inst);
        let stall = input.stall && !input.flush;
        DecodeOutputs {
            inst,
            stall,
            flush: input.flush,
            ce_read: input.if_id.ce && !(stall || input.stall),
            rs1_addr: inst.rs1,
            rs2_addr: inst.rs2,
        }
    }

    pub fn state(input: &DecodeInput, outputs: &DecodeOutputs) -> StageState {
        StageState::resolve(
            input.if_id.ce,
            outputs.stall || input.stall,
            input.flush,
        )
    }

    pub fn commit(&mut self, input: &DecodeInput, outputs: &DecodeOutputs) {
        let stall_bit = outputs.stall || input.stall;
        if input.if_id.ce && !stall_bit {
            self.out = IDEXRegister {
                ce: self.out.ce,
                pc: input.if_id.pc,
                inst: outputs.inst,
            };
        }
        self.out.ce = next_clock_enable(
            self.out.ce,
            input.if_id.ce,
            stall_bit,
            input.stall,
            input.flush,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Opcode;

    // add x3, x1, x2
    const ADD: u32 = 0x0020_81b3;

    fn word(raw_inst: u32) -> DecodeInput {
        DecodeInput {
            if_id: IFIDRegister { ce: true, pc: 0x40, raw_inst },
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_presents_sources() {
        let outputs = DecodeUnit::evaluate(&word(ADD));
        assert_eq!(outputs.inst.opcode, Opcode::Op);
        assert_eq!(outputs.rs1_addr, RegIndex::new(1));
        assert_eq!(outputs.rs2_addr, RegIndex::new(2));
        assert!(outputs.ce_read);
    }

    #[test]
    fn test_latch_and_hold() {
        let mut unit = DecodeUnit::make();
        let input = word(ADD);
        unit.commit(&input, &DecodeUnit::evaluate(&input));
        assert!(unit.latch().ce);
        assert_eq!(unit.latch().pc, 0x40);

        let mut held = word(0x13);
        held.if_id.pc = 0x44;
        held.stall = true;
        let outputs = DecodeUnit::evaluate(&held);
        assert!(!outputs.ce_read);
        unit.commit(&held, &outputs);
        assert_eq!(unit.latch().pc, 0x40);
        assert!(unit.latch().ce);
    }

    #[test]
    fn test_flush_while_stalled_is_ignored() {
        let mut unit = DecodeUnit::make();
        let input = word(ADD);
        unit.commit(&input, &DecodeUnit::evaluate(&input));

        let mut held = input;
        held.stall = true;
        held.flush = true;
        let outputs = DecodeUnit::evaluate(&held);
        unit.commit(&held, &outputs);
        assert!(unit.latch().ce);
    }

    #[test]
    fn test_flush_cancels_slot() {
        let mut unit = DecodeUnit::make();
        let mut input = word(ADD);
        input.flush = true;
        let outputs = DecodeUnit::evaluate(&input);
        assert_eq!(DecodeUnit::state(&input, &outputs), StageState::Flushed);
        unit.commit(&input, &outputs);
        assert!(!unit.latch().ce);
    }

    #[test]
    fn test_bubble_passes_through() {
        let mut unit = DecodeUnit::make();
        let input = word(ADD);
        unit.commit(&input, &DecodeUnit::evaluate(&input));
        let mut bubble = input;
        bubble.if_id.ce = false;
        let outputs = DecodeUnit::evaluate(&bubble);
        assert!(!outputs.ce_read);
        unit.commit(&bubble, &outputs);
        assert!(!unit.latch().ce);
    }
}
