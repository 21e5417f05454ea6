//! A simulator wrapper

use std::fs;
use std::path::Path;

use tracing::info;

use crate::cpu::CPUHistory;
use crate::cpu::CPUPolicy;
use crate::elf_helper;
use crate::error::ElfError;
use crate::error::SimulatorResult;
use crate::loader;
use crate::memory::Memory;
use crate::pipelined::Pipeline;
use crate::pipelined::TickReport;

const STACK_BASE: u32 = 0x80000000;

/// Outcome of a finished run
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunStats {
    /// PC of the EBREAK that ended the run
    pub exit_pc: u32,
    pub history: CPUHistory,
}

impl RunStats {
    pub fn cpi(&self) -> f64 {
        self.history.cpi()
    }
}

/// Builds a pipeline with the program loaded.
/// With `raw_base` the file is a flat image copied to that address,
/// otherwise it is parsed as an ELF file.
pub fn load_program(
    program: &Path,
    raw_base: Option<u32>,
    policy: &CPUPolicy,
) -> SimulatorResult<Pipeline> {
    policy.validate()?;
    let mut memory = Memory::make(policy.imem_latency, policy.dmem_latency);

    let entry = match raw_base {
        Some(base) => {
            let image = fs::read(program)
                .map_err(|e| ElfError::FileReadError(program.to_path_buf(), e))?;
            loader::load_raw(&mut memory.mmu, base, &image)?;
            base
        }
        None => {
            let (elf_reader, elf_data) = elf_helper::parse_elf_file(program)?;
            loader::load_elf(&mut memory.mmu, &elf_reader, &elf_data)?
        }
    };

    let reset_vector = policy.reset_vector.unwrap_or(entry);
    let mut pipeline = Pipeline::make(memory, reset_vector, policy.trap_vector);
    loader::set_stack(&mut pipeline.regfile, STACK_BASE);
    Ok(pipeline)
}

/// CSV sink with one row per tick
pub struct TraceWriter<W: std::io::Write> {
    writer: csv::Writer<W>,
}

impl TraceWriter<fs::File> {
    pub fn create(path: &Path) -> SimulatorResult<Self> {
        Self::make(csv::Writer::from_path(path)?)
    }
}

impl<W: std::io::Write> TraceWriter<W> {
    /// Wraps a writer and emits the header row
    pub fn make(mut writer: csv::Writer<W>) -> SimulatorResult<Self> {
        writer.write_record([
            "cycle",
            "fetch_pc",
            "fetch",
            "decode",
            "execute",
            "memory",
            "write_back",
            "redirect",
            "retired",
        ])?;
        Ok(Self { writer })
    }

    pub fn record(&mut self, report: &TickReport) -> SimulatorResult<()> {
        let hex = |value: Option<u32>| {
            value.map_or_else(String::new, |v| format!("{:#010x}", v))
        };
        let states = &report.states;
        self.writer.write_record([
            report.cycle.to_string(),
            format!("{:#010x}", report.fetch_pc),
            states.fetch.to_string(),
            states.decode.to_string(),
            states.execute.to_string(),
            states.memory.to_string(),
            states.write_back.to_string(),
            hex(report.redirect.map(|r| r.target)),
            hex(report.retired),
        ])?;
        Ok(())
    }

    pub fn flush(&mut self) -> SimulatorResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> csv::Writer<W> {
        self.writer
    }
}

/// Runs a loaded pipeline until it halts
pub fn run_pipeline(
    pipeline: &mut Pipeline,
    policy: &CPUPolicy,
    trace: Option<&Path>,
) -> SimulatorResult<RunStats> {
    let exit_pc = match trace {
        Some(path) => {
            let mut writer = TraceWriter::create(path)?;
            let exit_pc = pipeline
                .run(policy.max_cycles, |report| writer.record(report))?;
            writer.flush()?;
            exit_pc
        }
        None => pipeline.run(policy.max_cycles, |_| Ok(()))?,
    };
    info!("halted at pc = {:#010x}", exit_pc);

    let stats = RunStats { exit_pc, history: pipeline.history };
    if policy.history {
        print_history(&stats);
    }
    Ok(stats)
}

/// Run simulation on the given program
/// and return the exit PC with the history
pub fn run(
    program: &Path,
    raw_base: Option<u32>,
    policy: CPUPolicy,
    trace: Option<&Path>,
) -> SimulatorResult<RunStats> {
    let mut pipeline = load_program(program, raw_base, &policy)?;
    run_pipeline(&mut pipeline, &policy, trace)
}

fn print_history(stats: &RunStats) {
    let history = &stats.history;
    eprintln!("[HISTORY] Exit PC = {:#010x}", stats.exit_pc);
    eprintln!(
        "[HISTORY] # cycles = {}, # instructions = {}, CPI = {:.2}",
        history.cycle_count,
        history.inst_count,
        history.cpi()
    );
    eprintln!(
        "[HISTORY] Stalls: fetch = {}, execute = {}, memory = {}",
        history.fetch_stall_count,
        history.execute_stall_count,
        history.mem_stall_count
    );
    eprintln!(
        "[HISTORY] Flushes = {}, bubbles = {}, redirects = {}, traps = {}",
        history.flush_count,
        history.bubble_count,
        history.redirect_count,
        history.trap_count
    );
}
