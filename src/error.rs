use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the simulator
#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("Failed to load ELF file: {0}")]
    ElfLoadError(#[from] ElfError),

    #[error("CPU execution error: {0}")]
    ExecutionError(#[from] ExecutionError),

    #[error("Malformed control vector: {0}")]
    ControlError(#[from] ControlError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Trace output error: {0}")]
    TraceError(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Errors related to ELF file operations
#[derive(Error, Debug)]
pub enum ElfError {
    #[error("Failed to read ELF file '{0}': {1}")]
    FileReadError(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse ELF file '{0}': {1}")]
    ParseError(PathBuf, String),

    #[error("Invalid ELF format: {0}")]
    InvalidFormat(String),

    #[error("Memory address out of bounds: {0:#010x}")]
    AddressOutOfBounds(u32),

    #[error("Invalid ELF machine type: {0}")]
    InvalidMachine(u16),
}

/// Errors related to running the pipeline
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Execution limit reached: {0} cycles without a halt")]
    ExecutionLimitReached(u64),
}

/// One-hot control vectors that do not select exactly one entry
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    #[error("ALU operation vector {0:#06x} must have exactly one bit set")]
    AluOpVector(u16),

    #[error("Opcode class vector {0:#05x} must have exactly one bit set")]
    OpcodeVector(u16),
}

/// Type alias for Result with SimulatorError
pub type SimulatorResult<T> = Result<T, SimulatorError>;
