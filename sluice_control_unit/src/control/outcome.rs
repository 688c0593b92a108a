//! Result of an operator command.

use serde::Serialize;
use sluice_common::gate::safety::BlockReason;

/// What happened to a command. A non-accepted command changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutcome {
    Accepted,
    /// The interlock forbids outputs.
    Blocked(BlockReason),
    /// Valid command, wrong state (e.g. Start while an alarm is active).
    Rejected(&'static str),
    /// The gate type does not support the command.
    NotSupported,
}

impl CommandOutcome {
    #[inline]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}
