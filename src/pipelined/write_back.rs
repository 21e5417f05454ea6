//! Writeback stage: drives the register file write port and resolves
//! the exception carried by the retiring instruction.

use super::pipeline::MEMWBRegister;
use crate::instruction::Exception;
use crate::register_file::RegisterFileInput;

/// What writeback does with the instruction in MEM/WB
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteBackOutputs {
    /// Write port of the register file; the read half is left to decode
    pub write: RegisterFileInput,
    /// Trap entry or return target
    pub redirect: Option<u32>,
    pub flush: bool,
    /// Exception taken by this instruction
    pub trap: Option<Exception>,
    /// PC of the instruction that completed
    pub retired: Option<u32>,
    /// EBREAK reached writeback
    pub halt: bool,
}

/// Writeback with the trap registers it owns
#[derive(Clone, Debug, Default)]
pub struct WriteBackUnit {
    trap_vector: u32,
    mepc: u32,
    mcause: u32,
}

impl WriteBackUnit {
    pub fn make(trap_vector: u32) -> Self {
        Self { trap_vector, mepc: 0, mcause: 0 }
    }

    pub fn reset(&mut self) {
        *self = Self::make(self.trap_vector);
    }

    /// PC saved by the last trap entry
    pub fn mepc(&self) -> u32 {
        self.mepc
    }

    pub fn mcause(&self) -> u32 {
        self.mcause
    }

    pub fn evaluate(&self, mem_wb: &MEMWBRegister) -> WriteBackOutputs {
        let mut outputs = WriteBackOutputs::default();
        if !mem_wb.ce {
            return outputs;
        }
        match mem_wb.exception {
            None => {
                outputs.write = RegisterFileInput {
                    write_enable: mem_wb.wr_rd,
                    rd_addr: mem_wb.rd_addr,
                    // CSR contents are not modelled
                    rd: if mem_wb.rd_valid { mem_wb.rd } else { 0 },
                    ..Default::default()
                };
                outputs.retired = Some(mem_wb.pc);
            }
            Some(Exception::Breakpoint) => {
                outputs.retired = Some(mem_wb.pc);
                outputs.halt = true;
            }
            Some(Exception::TrapReturn) => {
                outputs.redirect = Some(self.mepc);
                outputs.retired = Some(mem_wb.pc);
            }
            Some(exception) => {
                outputs.redirect = Some(self.trap_vector);
                outputs.trap = Some(exception);
            }
        }
        outputs.flush = outputs.redirect.is_some();
        outputs
    }

    pub fn commit(&mut self, mem_wb: &MEMWBRegister, outputs: &WriteBackOutputs) {
        if let Some(cause) = outputs.trap.and_then(Exception::cause) {
            self.mepc = mem_wb.pc;
            self.mcause = cause;
        }
    }
}
