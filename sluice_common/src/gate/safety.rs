//! Protection trips and interlock reasons.
//!
//! Both types use the `bitflags` crate. Any protection flag set blocks all
//! control outputs; `BlockReason` is the aggregated answer of the
//! interlock evaluator (empty = ready).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Named protection trip conditions reported by the gate panel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ProtectionFlags: u16 {
        /// Emergency stop pushbutton latched.
        const EMERGENCY_STOP     = 0x0001;
        /// Hoist motor over-torque relay.
        const OVER_TORQUE        = 0x0002;
        /// Motor thermal overload.
        const THERMAL_OVERLOAD   = 0x0004;
        /// Supply phase loss / phase reversal.
        const PHASE_LOSS         = 0x0008;
        /// Upper/lower limit switch disagreement.
        const LIMIT_SWITCH_FAULT = 0x0010;
        /// Upstream level above the high-water trip.
        const HIGH_WATER         = 0x0020;
        /// Gate position encoder fault.
        const ENCODER_FAULT      = 0x0040;
    }
}

impl Default for ProtectionFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl ProtectionFlags {
    /// Returns true if any trip is active.
    #[inline]
    pub const fn tripped(&self) -> bool {
        !self.is_empty()
    }
}

bitflags! {
    /// Reasons the interlock currently forbids control outputs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct BlockReason: u8 {
        /// Operating mode is LOCAL.
        const LOCAL_MODE      = 0x01;
        /// At least one protection flag is set.
        const PROTECTION_TRIP = 0x02;
        /// Generator reports ERROR.
        const GENERATOR_ERROR = 0x04;
        /// Remote communication disabled.
        const REMOTE_DISABLED = 0x08;
        /// No operator logged in.
        const NOT_LOGGED_IN   = 0x10;
        /// Logged-in operator is a viewer.
        const VIEWER_ROLE     = 0x20;
    }
}

impl Default for BlockReason {
    fn default() -> Self {
        Self::empty()
    }
}

impl BlockReason {
    /// Returns true if control outputs are forbidden.
    #[inline]
    pub const fn blocked(&self) -> bool {
        !self.is_empty()
    }
}
