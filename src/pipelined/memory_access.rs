//! Memory access stage: loads and stores through the data port.
//! A memory instruction holds the stage until its request is
//! acknowledged; every other instruction passes straight through.

use super::control::next_clock_enable;
use super::control::StageState;
use super::pipeline::EXMEMRegister;
use super::pipeline::MEMWBRegister;
use crate::instruction::Opcode;
use crate::memory::MemoryRequest;
use crate::memory::MemoryResponse;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryAccessInput {
    pub ex_mem: EXMEMRegister,
    /// Data port answer to [`MemoryAccessUnit::request`]
    pub response: MemoryResponse,
    pub stall: bool,
    pub flush: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryAccessOutputs {
    /// Value handed to writeback
    pub rd: u32,
    pub rd_valid: bool,
    pub stall: bool,
    pub flush: bool,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryAccessUnit {
    out: MEMWBRegister,
}

/// Access size in bytes from funct3
fn access_size(funct3: u8) -> u32 {
    match funct3 & 0b11 {
        0 => 1,
        1 => 2,
        _ => 4,
    }
}

/// Sign or zero extension of loaded data
fn extend_load(funct3: u8, data: u32) -> u32 {
    match funct3 {
        // LB
        0 => data as u8 as i8 as i32 as u32,
        // LH
        1 => data as u16 as i16 as i32 as u32,
        // LBU
        4 => data & 0xff,
        // LHU
        5 => data & 0xffff,
        _ => data,
    }
}

impl MemoryAccessUnit {
    pub fn make() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.out = MEMWBRegister::default();
    }

    pub fn latch(&self) -> &MEMWBRegister {
        &self.out
    }

    /// Request presented on the data port this tick
    pub fn request(ex_mem: &EXMEMRegister, flush: bool) -> MemoryRequest {
        if !ex_mem.ce || flush {
            return MemoryRequest::idle();
        }
        let size = access_size(ex_mem.funct3);
        match ex_mem.opcode {
            Opcode::Load => MemoryRequest::read(ex_mem.y, size),
            Opcode::Store => MemoryRequest::write(ex_mem.y, size, ex_mem.rs2),
            _ => MemoryRequest::idle(),
        }
    }

    pub fn evaluate(input: &MemoryAccessInput) -> MemoryAccessOutputs {
        let ex_mem = &input.ex_mem;
        let waiting = ex_mem.stall_from_alu && ex_mem.ce && !input.response.ack;
        let (rd, rd_valid) = match ex_mem.opcode {
            Opcode::Load => (extend_load(ex_mem.funct3, input.response.data), true),
            _ => (ex_mem.rd, ex_mem.rd_valid),
        };
        MemoryAccessOutputs {
            rd,
            rd_valid,
            stall: (waiting || input.stall) && !input.flush,
            flush: input.flush,
        }
    }

    pub fn state(
        input: &MemoryAccessInput,
        outputs: &MemoryAccessOutputs,
    ) -> StageState {
        StageState::resolve(
            input.ex_mem.ce,
            outputs.stall || input.stall,
            input.flush,
        )
    }

    pub fn commit(
        &mut self,
        input: &MemoryAccessInput,
        outputs: &MemoryAccessOutputs,
    ) {
        let stall_bit = outputs.stall || input.stall;
        let ex_mem = &input.ex_mem;
        if ex_mem.ce && !stall_bit {
            self.out = MEMWBRegister {
                ce: self.out.ce,
                pc: ex_mem.pc,
                opcode: ex_mem.opcode,
                funct3: ex_mem.funct3,
                exception: ex_mem.exception,
                rd_addr: ex_mem.rd_addr,
                rd: outputs.rd,
                rd_valid: outputs.rd_valid,
                wr_rd: ex_mem.wr_rd,
            };
        }
        self.out.ce = next_clock_enable(
            self.out.ce,
            ex_mem.ce,
            stall_bit,
            input.stall,
            input.flush,
        );
    }
}
