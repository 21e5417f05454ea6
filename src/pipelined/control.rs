//! Stage control: the enable/stall/flush triple and its cascade

use std::fmt;

/// What a stage does with its held slot in the current tick.
/// Flush wins over stall, stall wins over enable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StageState {
    /// No valid instruction held
    #[default]
    Idle,
    /// Valid instruction that will be handed on
    Active,
    /// Holding its instruction for another tick
    Stalled,
    /// Discarding its instruction
    Flushed,
}

impl StageState {
    pub fn resolve(enable: bool, stall: bool, flush: bool) -> Self {
        if flush {
            StageState::Flushed
        } else if stall {
            StageState::Stalled
        } else if enable {
            StageState::Active
        } else {
            StageState::Idle
        }
    }

    /// enable && !stall && !flush
    pub fn is_useful(self) -> bool {
        self == StageState::Active
    }

    pub fn label(self) -> &'static str {
        match self {
            StageState::Idle => "idle",
            StageState::Active => "active",
            StageState::Stalled => "stalled",
            StageState::Flushed => "flushed",
        }
    }
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Next clock enable latched for the following stage.
///
/// * `current` - the enable latched last tick
/// * `incoming` - the enable this stage would pass on
/// * `stall_bit` - this stage holds its latch this tick
/// * `downstream_stall` - the following stage holds too
/// * `flush` - this stage's slot is being discarded
pub fn next_clock_enable(
    current: bool,
    incoming: bool,
    stall_bit: bool,
    downstream_stall: bool,
    flush: bool,
) -> bool {
    if flush && !stall_bit {
        false
    } else if !stall_bit {
        incoming
    } else if !downstream_stall {
        // Held here while the next stage moves on: hand it a bubble
        false
    } else {
        current
    }
}

/// Who asked for the PC overwrite
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RedirectSource {
    /// Trap entry or trap return from writeback
    Trap,
    /// Taken branch or jump from execute
    Branch,
}

/// A PC overwrite accepted by fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Redirect {
    pub target: u32,
    pub source: RedirectSource,
}

impl Redirect {
    /// Picks at most one redirection; the trap one wins
    pub fn arbitrate(
        trap: Option<u32>,
        branch: Option<u32>,
        branch_allowed: bool,
    ) -> Option<Self> {
        match (trap, branch) {
            (Some(target), _) => {
                Some(Redirect { target, source: RedirectSource::Trap })
            }
            (None, Some(target)) if branch_allowed => {
                Some(Redirect { target, source: RedirectSource::Branch })
            }
            _ => None,
        }
    }
}
