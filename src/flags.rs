use std::path::PathBuf;
use std::str::FromStr;

use crate::cpu::CPUPolicy;
use crate::cpu::DEFAULT_MAX_CYCLES;

xflags::xflags! {
    /// Cycle-level simulator of a five-stage RV32I pipeline.
    cmd SimArgs {
        /// Path to the ELF file (or flat binary with --raw-base) to simulate.
        required program: PathBuf

        /// Treats the program as a flat binary loaded at this address.
        optional --raw-base base: Address

        /// Starts fetching here instead of at the ELF entry point.
        optional --reset-vector address: Address

        /// Address fetched after an exception.
        optional --trap-vector address: Address

        /// Ticks the instruction port waits before acknowledging.
        optional --imem-latency ticks: u32

        /// Ticks the data port waits before acknowledging.
        optional --dmem-latency ticks: u32

        /// Gives up after this many cycles without an EBREAK.
        optional --max-cycles cycles: u64

        /// Writes one CSV row per cycle to this file.
        optional --trace path: PathBuf

        /// Enables history module, printing cycle and instruction counts after simulation.
        optional --history

        /// Enables verbose mode, printing redirections and traps during simulation.
        /// Largely used for debugging purposes.
        optional -v, --verbose
    }
}

/// A 32-bit address, hexadecimal with `0x` or decimal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Address(pub u32);

impl FromStr for Address {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
            None => s.parse::<u32>(),
        };
        parsed.map(Address).map_err(|_| {
            format!("Invalid address: '{}'. Expected e.g. 0x80000000.", s)
        })
    }
}

impl SimArgs {
    /// CPU policy selected by the flags
    pub fn policy(&self) -> CPUPolicy {
        CPUPolicy {
            reset_vector: self.reset_vector.map(|Address(a)| a),
            trap_vector: self.trap_vector.map_or(0, |Address(a)| a),
            imem_latency: self.imem_latency.unwrap_or(0),
            dmem_latency: self.dmem_latency.unwrap_or(0),
            max_cycles: self.max_cycles.unwrap_or(DEFAULT_MAX_CYCLES),
            history: self.history,
            verbose: self.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn parse(args: &[&str]) -> xflags::Result<SimArgs> {
        SimArgs::from_vec(args.iter().map(OsString::from).collect())
    }

    #[test]
    fn test_address_parsing() {
        assert_eq!("0x8000_0000".parse(), Ok(Address(0x8000_0000)));
        assert_eq!("4096".parse(), Ok(Address(4096)));
        assert!("0xzz".parse::<Address>().is_err());
        assert!("-1".parse::<Address>().is_err());
    }

    #[test]
    fn test_policy_from_flags() {
        let args = parse(&[
            "prog.elf",
            "--imem-latency",
            "2",
            "--trap-vector",
            "0x100",
            "--history",
        ])
        .unwrap();
        assert_eq!(args.program, PathBuf::from("prog.elf"));
        let policy = args.policy();
        assert_eq!(policy.imem_latency, 2);
        assert_eq!(policy.dmem_latency, 0);
        assert_eq!(policy.trap_vector, 0x100);
        assert_eq!(policy.reset_vector, None);
        assert!(policy.history);
        assert!(!policy.verbose);
    }

    #[test]
    fn test_program_required() {
        assert!(parse(&["--history"]).is_err());
    }
}
