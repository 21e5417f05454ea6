//! Memory structure
//!
//! One paged store shared by an instruction port and a data port.
//! Each port follows a request/acknowledge handshake: the master holds
//! `stb` with a stable address until `ack`; the data is valid in the
//! tick `ack` is high and belongs to the address presented in that tick.
//! A port acknowledges once the same address has been presented for
//! `latency` consecutive earlier ticks (latency 0 acknowledges at once).

pub mod mmu;

use mmu::MMU;

/// A request presented on a port for one tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryRequest {
    /// Request strobe
    pub stb: bool,
    pub address: u32,
    /// Access size in bytes
    pub size: u32,
    /// Store data, None for reads
    pub write: Option<u32>,
}

impl MemoryRequest {
    /// No request this tick
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn read(address: u32, size: u32) -> Self {
        Self { stb: true, address, size, write: None }
    }

    pub fn write(address: u32, size: u32, value: u32) -> Self {
        Self { stb: true, address, size, write: Some(value) }
    }
}

/// A port's answer for the current tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryResponse {
    pub ack: bool,
    pub data: u32,
}

/// Handshake timing of one port
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryPort {
    latency: u32,
    /// Address being waited on and for how many ticks
    waiting: Option<(u32, u32)>,
}

impl MemoryPort {
    pub fn make(latency: u32) -> Self {
        Self { latency, waiting: None }
    }

    pub fn latency(&self) -> u32 {
        self.latency
    }

    /// Whether the request is acknowledged in this tick
    pub fn ack(&self, request: &MemoryRequest) -> bool {
        if !request.stb {
            return false;
        }
        self.latency == 0
            || matches!(self.waiting,
                Some((address, waited))
                    if address == request.address && waited >= self.latency)
    }

    /// Forgets any partially waited request
    pub fn reset(&mut self) {
        self.waiting = None;
    }

    /// Advances the wait counter at the tick boundary
    pub fn commit(&mut self, request: &MemoryRequest) {
        if !request.stb || self.ack(request) {
            self.waiting = None;
            return;
        }
        self.waiting = match self.waiting {
            Some((address, waited)) if address == request.address => {
                Some((address, waited + 1))
            }
            _ => Some((request.address, 1)),
        };
    }
}

/// Storage plus its two ports
#[derive(Clone, Default)]
pub struct Memory {
    pub mmu: MMU,
    pub instruction_port: MemoryPort,
    pub data_port: MemoryPort,
}

impl Memory {
    pub fn make(imem_latency: u32, dmem_latency: u32) -> Self {
        Self {
            mmu: MMU::make(),
            instruction_port: MemoryPort::make(imem_latency),
            data_port: MemoryPort::make(dmem_latency),
        }
    }

    /// Port timers back to idle; the contents are kept
    pub fn reset(&mut self) {
        self.instruction_port.reset();
        self.data_port.reset();
    }

    /// Instruction port answer; always a full word
    pub fn respond_instruction(&self, request: &MemoryRequest) -> MemoryResponse {
        let ack = self.instruction_port.ack(request);
        let data = if ack { self.mmu.get32(request.address) } else { 0 };
        MemoryResponse { ack, data }
    }

    /// Data port answer; loads return the raw little-endian bytes
    pub fn respond_data(&self, request: &MemoryRequest) -> MemoryResponse {
        let ack = self.data_port.ack(request);
        let data = match (ack, request.write) {
            (true, None) => self.mmu.get(request.address, request.size),
            _ => 0,
        };
        MemoryResponse { ack, data }
    }

    /// Tick boundary: stores take effect, port timers advance
    pub fn commit(
        &mut self,
        instruction_request: &MemoryRequest,
        data_request: &MemoryRequest,
    ) {
        if let Some(value) = data_request.write {
            if self.data_port.ack(data_request) {
                self.mmu.set(data_request.address, data_request.size, value);
            }
        }
        self.instruction_port.commit(instruction_request);
        self.data_port.commit(data_request);
    }
}
