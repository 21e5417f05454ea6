//! Base register file: two synchronous read ports, one write port.
//!
//! Read addresses are latched at the tick boundary when the read enable
//! holds; the values seen during the following tick are those of the
//! latched addresses against the current contents. Writes land at the
//! tick boundary, so no read observes a write in the tick it was issued.
//! There is no forwarding here.

use crate::instruction::RegIndex;

/// Number of architectural registers
pub const REGISTER_COUNT: usize = 32;

/// Inputs sampled at a tick boundary
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegisterFileInput {
    /// Latch the read addresses this tick
    pub ce_read: bool,
    pub rs1_addr: RegIndex,
    pub rs2_addr: RegIndex,
    /// Write port
    pub write_enable: bool,
    pub rd_addr: RegIndex,
    pub rd: u32,
}

/// Register file simulation
#[derive(Clone, Debug, Default)]
pub struct RegisterFile {
    /// Entry 0 is never written and never read
    regs: [u32; REGISTER_COUNT],
    rs1_addr_q: RegIndex,
    rs2_addr_q: RegIndex,
}

impl RegisterFile {
    pub fn make() -> Self {
        Self::default()
    }

    /// Values of the latched read addresses
    pub fn read(&self) -> (u32, u32) {
        (self.value(self.rs1_addr_q), self.value(self.rs2_addr_q))
    }

    /// Current contents of a register, zero for x0
    pub fn value(&self, addr: RegIndex) -> u32 {
        if addr.is_zero() {
            0
        } else {
            self.regs[addr.index()]
        }
    }

    /// Latched read addresses
    pub fn read_addresses(&self) -> (RegIndex, RegIndex) {
        (self.rs1_addr_q, self.rs2_addr_q)
    }

    /// Whether a write with these inputs would change the store
    pub fn write_accepted(input: &RegisterFileInput) -> bool {
        input.write_enable && !input.rd_addr.is_zero()
    }

    /// Applies one tick boundary
    pub fn commit(&mut self, input: &RegisterFileInput) {
        if Self::write_accepted(input) {
            self.regs[input.rd_addr.index()] = input.rd;
        }
        if input.ce_read {
            self.rs1_addr_q = input.rs1_addr;
            self.rs2_addr_q = input.rs2_addr;
        }
    }

    /// Loads a register outside of the pipeline, e.g. the initial stack
    /// pointer. Writes to x0 are dropped.
    pub fn preload(&mut self, addr: RegIndex, value: u32) {
        if !addr.is_zero() {
            self.regs[addr.index()] = value;
        }
    }

    /// Snapshot of all registers, x0 included as zero
    pub fn snapshot(&self) -> [u32; REGISTER_COUNT] {
        let mut regs = self.regs;
        regs[0] = 0;
        regs
    }
}
