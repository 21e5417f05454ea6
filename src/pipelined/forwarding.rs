//! Operand forwarding into the execute stage.
//! See P&H p. 300-301 for the EX and MEM hazard conditions.

use super::pipeline::PipelineState;
use crate::instruction::RegIndex;

/// Source values handed to execute, plus its forced stall
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ForwardedOperands {
    pub rs1: u32,
    pub rs2: u32,
    /// A source is produced by a later stage but not known yet
    pub force_stall: bool,
}

/// Where one source operand comes from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Source {
    Value(u32),
    NotReady,
}

impl PipelineState {
    /// The instruction in memory access writes `addr`
    pub fn ex_hazard(&self, addr: RegIndex) -> bool {
        !addr.is_zero()
            && self.ex_mem.ce
            && self.ex_mem.wr_rd
            && self.ex_mem.rd_addr == addr
    }

    /// The instruction in writeback writes `addr`.
    /// Only consulted when there is no EX hazard on it.
    pub fn mem_hazard(&self, addr: RegIndex) -> bool {
        !addr.is_zero()
            && self.mem_wb.ce
            && self.mem_wb.wr_rd
            && self.mem_wb.rd_addr == addr
    }

    fn source(&self, addr: RegIndex, from_regfile: u32) -> Source {
        if addr.is_zero() {
            Source::Value(0)
        } else if self.ex_hazard(addr) {
            if self.ex_mem.rd_valid {
                Source::Value(self.ex_mem.rd)
            } else {
                Source::NotReady
            }
        } else if self.mem_hazard(addr) {
            if self.mem_wb.rd_valid {
                Source::Value(self.mem_wb.rd)
            } else {
                Source::NotReady
            }
        } else {
            Source::Value(from_regfile)
        }
    }

    /// Source values for the instruction in ID/EX, given the register
    /// file outputs for its latched addresses
    pub fn forward(&self, regfile: (u32, u32)) -> ForwardedOperands {
        if !self.id_ex.ce {
            return ForwardedOperands {
                rs1: regfile.0,
                rs2: regfile.1,
                force_stall: false,
            };
        }
        let inst = &self.id_ex.inst;
        let mut force_stall = false;
        let mut resolve = |addr, value| match self.source(addr, value) {
            Source::Value(v) => v,
            Source::NotReady => {
                force_stall = true;
                0
            }
        };
        let rs1 = resolve(inst.rs1, regfile.0);
        let rs2 = resolve(inst.rs2, regfile.1);
        ForwardedOperands { rs1, rs2, force_stall }
    }
}
