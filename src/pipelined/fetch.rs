//! Fetch stage: PC lifecycle and the instruction port handshake.
//!
//! The request line is the stage's own enable. A word is delivered to
//! IF/ID in the tick its ack arrives unless the stage is held; a word
//! acknowledged while held is kept as the replay pair and delivered
//! once the hold clears, so nothing fetched is ever dropped.

use super::control::next_clock_enable;
use super::control::Redirect;
use super::control::StageState;
use super::pipeline::IFIDRegister;
use crate::instruction::INSTRUCTION_WIDTH;
use crate::memory::MemoryRequest;
use crate::memory::MemoryResponse;

/// Inputs of the fetch stage for one tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchInput {
    /// Instruction port answer to [`FetchUnit::request`]
    pub response: MemoryResponse,
    /// Trap entry or return, always honoured
    pub writeback_redirect: Option<u32>,
    /// Taken branch or jump
    pub alu_redirect: Option<u32>,
    /// A later stage is stalled
    pub stall: bool,
    /// External hold of fetch alone
    pub force_stall: bool,
    pub flush: bool,
}

/// Combinational outputs of the fetch stage
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchOutputs {
    /// Fetch cannot deliver a word this tick
    pub stall: bool,
    /// (PC, word) that would be delivered
    pub available: Option<(u32, u32)>,
    /// Redirection taken at this tick boundary
    pub accepted: Option<Redirect>,
}

/// Fetch stage with the PC and the IF/ID register
#[derive(Clone, Debug)]
pub struct FetchUnit {
    reset_vector: u32,
    pc: u32,
    /// Request enable
    ce: bool,
    out: IFIDRegister,
    /// Word acknowledged while the stage was held
    replay: Option<(u32, u32)>,
}

impl FetchUnit {
    pub fn make(reset_vector: u32) -> Self {
        Self {
            reset_vector,
            pc: reset_vector,
            ce: false,
            out: IFIDRegister::default(),
            replay: None,
        }
    }

    /// PC to the reset vector, every enable cleared
    pub fn reset(&mut self) {
        *self = Self::make(self.reset_vector);
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn enabled(&self) -> bool {
        self.ce
    }

    pub fn replay(&self) -> Option<(u32, u32)> {
        self.replay
    }

    /// IF/ID register as latched at the last tick boundary
    pub fn latch(&self) -> &IFIDRegister {
        &self.out
    }

    /// Request presented on the instruction port this tick
    pub fn request(&self) -> MemoryRequest {
        if self.ce {
            MemoryRequest::read(self.pc, INSTRUCTION_WIDTH)
        } else {
            MemoryRequest::idle()
        }
    }

    pub fn evaluate(&self, input: &FetchInput) -> FetchOutputs {
        let stall_fetch = input.stall || input.force_stall;
        let available = self.replay.or_else(|| {
            (self.ce && input.response.ack)
                .then_some((self.pc, input.response.data))
        });
        FetchOutputs {
            stall: stall_fetch || available.is_none(),
            available,
            // Execute keeps asserting a held branch, so it is taken once
            // the later stages move again
            accepted: Redirect::arbitrate(
                input.writeback_redirect,
                input.alu_redirect,
                !input.stall,
            ),
        }
    }

    pub fn state(&self, input: &FetchInput, outputs: &FetchOutputs) -> StageState {
        StageState::resolve(self.ce, outputs.stall, input.flush)
    }

    /// Tick boundary
    pub fn commit(&mut self, input: &FetchInput, outputs: &FetchOutputs) {
        let was_enabled = self.ce;
        self.ce = true;

        if let Some(redirect) = outputs.accepted {
            self.pc = redirect.target;
            self.replay = None;
            self.out.ce = false;
            return;
        }

        match outputs.available {
            Some((pc, word)) if !outputs.stall => {
                self.out = IFIDRegister { ce: !input.flush, pc, raw_inst: word };
                self.pc = pc.wrapping_add(INSTRUCTION_WIDTH);
                self.replay = None;
            }
            _ => {
                let stall_fetch = input.stall || input.force_stall;
                if stall_fetch
                    && self.replay.is_none()
                    && was_enabled
                    && input.response.ack
                {
                    self.replay = Some((self.pc, input.response.data));
                }
                self.out.ce = next_clock_enable(
                    self.out.ce,
                    self.out.ce,
                    true,
                    input.stall,
                    input.flush,
                );
            }
        }
    }
}
