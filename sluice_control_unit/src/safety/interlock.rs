//! Interlock evaluator.
//!
//! A pure function of the session decides whether any control output is
//! allowed. Every controller consults the same answer; none re-derives it.
//!
//! [`InterlockMonitor`] tracks the answer between ticks so the cycle can
//! log transitions and force running loops to stop on a rising edge.

use sluice_common::gate::safety::BlockReason;
use sluice_common::gate::state::{GeneratorState, OperatingMode};
use tracing::{info, warn};

use crate::state::session::ControlSession;

/// Collect every reason the session currently forbids outputs.
pub fn evaluate_interlock(session: &ControlSession) -> BlockReason {
    let mut reasons = BlockReason::empty();

    if session.mode == OperatingMode::Local {
        reasons |= BlockReason::LOCAL_MODE;
    }
    if session.protection_flags.tripped() {
        reasons |= BlockReason::PROTECTION_TRIP;
    }
    if session.generator_state == GeneratorState::Error {
        reasons |= BlockReason::GENERATOR_ERROR;
    }
    if !session.remote_enabled {
        reasons |= BlockReason::REMOTE_DISABLED;
    }
    if !session.logged_in {
        reasons |= BlockReason::NOT_LOGGED_IN;
    } else if !session.role.can_command() {
        reasons |= BlockReason::VIEWER_ROLE;
    }

    reasons
}

/// Interlock edge between two evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterlockEdge {
    Unchanged,
    /// Went from ready to blocked.
    Asserted,
    /// Went from blocked to ready.
    Released,
}

/// Remembers the previous interlock answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterlockMonitor {
    last: BlockReason,
}

impl InterlockMonitor {
    pub const fn new() -> Self {
        Self {
            last: BlockReason::empty(),
        }
    }

    #[inline]
    pub fn reasons(&self) -> BlockReason {
        self.last
    }

    /// Record `reasons` and report the blocked/ready edge.
    pub fn update(&mut self, reasons: BlockReason) -> InterlockEdge {
        let was_blocked = self.last.blocked();
        let changed = reasons != self.last;
        self.last = reasons;

        match (was_blocked, reasons.blocked()) {
            (false, true) => {
                warn!("Interlock asserted: {reasons:?}");
                InterlockEdge::Asserted
            }
            (true, false) => {
                info!("Interlock released");
                InterlockEdge::Released
            }
            _ => {
                if changed && reasons.blocked() {
                    warn!("Interlock reasons changed: {reasons:?}");
                }
                InterlockEdge::Unchanged
            }
        }
    }
}
