//! Run configuration and execution history

use crate::error::SimulatorError;
use crate::error::SimulatorResult;
use crate::instruction::INSTRUCTION_WIDTH;

/// Cycle limit used when none is given
pub const DEFAULT_MAX_CYCLES: u64 = 50_000_000;

/// CPU policy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CPUPolicy {
    /// Overrides the ELF entry point
    pub reset_vector: Option<u32>,
    /// Target of trap entry
    pub trap_vector: u32,
    /// Ticks the instruction port needs before acknowledging
    pub imem_latency: u32,
    /// Ticks the data port needs before acknowledging
    pub dmem_latency: u32,
    pub max_cycles: u64,
    pub history: bool,
    pub verbose: bool,
}

impl Default for CPUPolicy {
    fn default() -> Self {
        Self {
            reset_vector: None,
            trap_vector: 0,
            imem_latency: 0,
            dmem_latency: 0,
            max_cycles: DEFAULT_MAX_CYCLES,
            history: false,
            verbose: false,
        }
    }
}

impl CPUPolicy {
    /// Rejects settings the pipeline cannot run with
    pub fn validate(&self) -> SimulatorResult<()> {
        let misaligned = |address: u32| address % INSTRUCTION_WIDTH != 0;
        if let Some(reset_vector) = self.reset_vector {
            if misaligned(reset_vector) {
                return Err(SimulatorError::ConfigError(format!(
                    "reset vector {:#010x} is not word aligned",
                    reset_vector
                )));
            }
        }
        if misaligned(self.trap_vector) {
            return Err(SimulatorError::ConfigError(format!(
                "trap vector {:#010x} is not word aligned",
                self.trap_vector
            )));
        }
        if self.max_cycles == 0 {
            return Err(SimulatorError::ConfigError(
                "cycle limit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// History module
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CPUHistory {
    pub cycle_count: u64,
    /// Instructions completed in writeback
    pub inst_count: u64,
    /// Ticks fetch could not deliver a word
    pub fetch_stall_count: u64,
    /// Ticks execute held its instruction
    pub execute_stall_count: u64,
    /// Ticks memory access waited on the data port
    pub mem_stall_count: u64,
    /// Ticks a stage discarded its slot
    pub flush_count: u64,
    /// Empty slots handed from fetch to decode
    pub bubble_count: u64,
    /// Taken branches and jumps
    pub redirect_count: u64,
    pub trap_count: u64,
}

impl CPUHistory {
    /// Cycles per retired instruction
    pub fn cpi(&self) -> f64 {
        if self.inst_count == 0 {
            return 0.0;
        }
        self.cycle_count as f64 / self.inst_count as f64
    }
}
