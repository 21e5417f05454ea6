//! Pipelined implementation
//!
//! Five stages joined by four pipeline registers. Every tick first
//! evaluates all stages from the latched state, back to front so that
//! stall and flush signals can travel upstream within the tick, and only
//! then commits every latch, the register file and the memory.

use tracing::debug;
use tracing::trace;

use crate::cpu::CPUHistory;
use crate::error::ExecutionError;
use crate::error::SimulatorResult;
use crate::memory::Memory;
use crate::register_file::RegisterFile;
use crate::register_file::RegisterFileInput;

use control::Redirect;
use control::RedirectSource;
use control::StageState;
use decode::DecodeInput;
use decode::DecodeUnit;
use execute::ExecuteInput;
use execute::ExecuteUnit;
use fetch::FetchInput;
use fetch::FetchUnit;
use memory_access::MemoryAccessInput;
use memory_access::MemoryAccessUnit;
use pipeline::PipelineState;
use write_back::WriteBackUnit;

pub mod control;
pub mod decode;
pub mod execute;
pub mod fetch;
pub mod forwarding;
pub mod memory_access;
pub mod pipeline;
pub mod write_back;

/// What every stage did in one tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageStates {
    pub fetch: StageState,
    pub decode: StageState,
    pub execute: StageState,
    pub memory: StageState,
    pub write_back: StageState,
}

/// Observable summary of one tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// 1 for the first tick after reset
    pub cycle: u64,
    /// Fetch address during the tick
    pub fetch_pc: u32,
    pub states: StageStates,
    /// Redirection accepted by fetch
    pub redirect: Option<Redirect>,
    /// Instruction completed in writeback
    pub retired: Option<u32>,
    /// PC of an EBREAK that reached writeback
    pub halted: Option<u32>,
}

/// The assembled core with its memory
pub struct Pipeline {
    fetch: FetchUnit,
    decode: DecodeUnit,
    execute: ExecuteUnit,
    memory_access: MemoryAccessUnit,
    write_back: WriteBackUnit,

    /// Architectural registers
    pub regfile: RegisterFile,
    /// Instruction and data memory
    pub memory: Memory,
    /// History of execution
    pub history: CPUHistory,

    /// External hold on fetch alone
    fetch_force_stall: bool,
}

impl Pipeline {
    pub fn make(memory: Memory, reset_vector: u32, trap_vector: u32) -> Self {
        Self {
            fetch: FetchUnit::make(reset_vector),
            decode: DecodeUnit::make(),
            execute: ExecuteUnit::make(),
            memory_access: MemoryAccessUnit::make(),
            write_back: WriteBackUnit::make(trap_vector),
            regfile: RegisterFile::make(),
            memory,
            history: CPUHistory::default(),
            fetch_force_stall: false,
        }
    }

    /// PC back to the reset vector with every stage empty.
    /// Register and memory contents survive.
    pub fn reset(&mut self) {
        self.fetch.reset();
        self.decode.reset();
        self.execute.reset();
        self.memory_access.reset();
        self.write_back.reset();
        self.memory.reset();
        self.history = CPUHistory::default();
        self.fetch_force_stall = false;
    }

    /// Holds fetch until released
    pub fn set_fetch_stall(&mut self, stall: bool) {
        self.fetch_force_stall = stall;
    }

    /// Next address fetch will request
    pub fn pc(&self) -> u32 {
        self.fetch.pc()
    }

    pub fn fetch_unit(&self) -> &FetchUnit {
        &self.fetch
    }

    pub fn write_back_unit(&self) -> &WriteBackUnit {
        &self.write_back
    }

    /// Snapshot of the pipeline registers
    pub fn state(&self) -> PipelineState {
        PipelineState {
            if_id: *self.fetch.latch(),
            id_ex: *self.decode.latch(),
            ex_mem: *self.execute.latch(),
            mem_wb: *self.memory_access.latch(),
        }
    }

    /// Advances the whole core by one clock tick
    pub fn tick(&mut self) -> TickReport {
        let state = self.state();
        let fetch_pc = self.fetch.pc();

        // Writeback
        let wb = self.write_back.evaluate(&state.mem_wb);

        // Memory access
        let data_request = MemoryAccessUnit::request(&state.ex_mem, wb.flush);
        let mem_input = MemoryAccessInput {
            ex_mem: state.ex_mem,
            response: self.memory.respond_data(&data_request),
            stall: false,
            flush: wb.flush,
        };
        let mem = MemoryAccessUnit::evaluate(&mem_input);

        // Execute
        let operands = state.forward(self.regfile.read());
        let exe_input = ExecuteInput {
            ce: state.id_ex.ce,
            pc: state.id_ex.pc,
            inst: state.id_ex.inst,
            rs1: operands.rs1,
            rs2: operands.rs2,
            stall: mem.stall,
            force_stall: operands.force_stall,
            flush: mem.flush,
        };
        let exe = ExecuteUnit::evaluate(&exe_input);

        // Decode
        let dec_input = DecodeInput {
            if_id: state.if_id,
            stall: exe.stall || mem.stall,
            flush: exe.flush,
        };
        let dec = DecodeUnit::evaluate(&dec_input);

        // Fetch
        let instruction_request = self.fetch.request();
        let fetch_input = FetchInput {
            response: self.memory.respond_instruction(&instruction_request),
            writeback_redirect: wb.redirect,
            alu_redirect: exe.redirect(),
            stall: dec.stall || exe.stall || mem.stall,
            force_stall: self.fetch_force_stall,
            flush: dec.flush,
        };
        let fetch = self.fetch.evaluate(&fetch_input);

        let states = StageStates {
            fetch: self.fetch.state(&fetch_input, &fetch),
            decode: DecodeUnit::state(&dec_input, &dec),
            execute: ExecuteUnit::state(&exe_input, &exe),
            memory: MemoryAccessUnit::state(&mem_input, &mem),
            write_back: StageState::resolve(state.mem_wb.ce, false, wb.flush),
        };
        let report = TickReport {
            cycle: self.history.cycle_count + 1,
            fetch_pc,
            states,
            redirect: fetch.accepted,
            retired: wb.retired,
            halted: wb.halt.then_some(state.mem_wb.pc),
        };

        // Commit
        let fetch_was_enabled = self.fetch.enabled();
        self.regfile.commit(&RegisterFileInput {
            ce_read: dec.ce_read,
            rs1_addr: dec.rs1_addr,
            rs2_addr: dec.rs2_addr,
            ..wb.write
        });
        self.memory.commit(&instruction_request, &data_request);
        self.write_back.commit(&state.mem_wb, &wb);
        self.memory_access.commit(&mem_input, &mem);
        self.execute.commit(&exe_input, &exe);
        self.decode.commit(&dec_input, &dec);
        self.fetch.commit(&fetch_input, &fetch);

        self.record(&report);
        if fetch_was_enabled && !self.fetch.latch().ce {
            self.history.bubble_count += 1;
        }
        if exe_input.ce && (exe.stall || exe_input.stall) {
            self.history.execute_stall_count += 1;
        }
        if mem.stall {
            self.history.mem_stall_count += 1;
        }
        if let Some(exception) = wb.trap {
            self.history.trap_count += 1;
            debug!("trap: {:?} at pc = {:#010x}", exception, state.mem_wb.pc);
        }

        report
    }

    fn record(&mut self, report: &TickReport) {
        let states = &report.states;
        self.history.cycle_count += 1;
        if report.retired.is_some() {
            self.history.inst_count += 1;
        }
        if states.fetch == StageState::Stalled {
            self.history.fetch_stall_count += 1;
        }
        self.history.flush_count += [
            states.fetch,
            states.decode,
            states.execute,
            states.memory,
            states.write_back,
        ]
        .iter()
        .filter(|state| **state == StageState::Flushed)
        .count() as u64;

        trace!(
            "cycle {}: pc = {:#010x}, IF {}, ID {}, EX {}, MEM {}, WB {}",
            report.cycle,
            report.fetch_pc,
            states.fetch,
            states.decode,
            states.execute,
            states.memory,
            states.write_back
        );
        if let Some(redirect) = report.redirect {
            if redirect.source == RedirectSource::Branch {
                self.history.redirect_count += 1;
            }
            debug!(
                "redirect to {:#010x} ({:?})",
                redirect.target, redirect.source
            );
        }
        if let Some(pc) = report.halted {
            debug!("halt: ebreak at pc = {:#010x}", pc);
        }
    }

    /// Ticks until an EBREAK retires and returns its PC.
    /// `observer` sees every tick, the halting one included.
    pub fn run<F>(&mut self, max_cycles: u64, mut observer: F) -> SimulatorResult<u32>
    where
        F: FnMut(&TickReport) -> SimulatorResult<()>,
    {
        for _ in 0..max_cycles {
            let report = self.tick();
            observer(&report)?;
            if let Some(pc) = report.halted {
                return Ok(pc);
            }
        }
        Err(ExecutionError::ExecutionLimitReached(max_cycles).into())
    }
}
