//! State enums for the gate control core.
//!
//! Session-level state (OperatingMode, GeneratorState, Role), per-gate
//! state (MotionState, Direction, GateClass) and per-loop state (RunState).
//! Every enum serializes snake_case, which is also what the CLI accepts
//! for modes and roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─── Session ────────────────────────────────────────────────────────

/// Operating mode selected at the panel.
///
/// Only the remote modes may drive gates; `Local` hands control to the
/// field panel and blocks every output from this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Field panel has control.
    #[default]
    Local,
    /// Operator jogs or sets gates directly.
    RemoteManual,
    /// Closed-loop K tracking.
    RemoteAutomatic,
    /// Pattern / schedule driven, open loop.
    RemoteProgram,
}

impl OperatingMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::RemoteManual => "remote_manual",
            Self::RemoteAutomatic => "remote_automatic",
            Self::RemoteProgram => "remote_program",
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "local" => Ok(Self::Local),
            "remote_manual" | "manual" => Ok(Self::RemoteManual),
            "remote_automatic" | "automatic" | "auto" => Ok(Self::RemoteAutomatic),
            "remote_program" | "program" => Ok(Self::RemoteProgram),
            other => Err(format!("unknown operating mode '{other}'")),
        }
    }
}

/// Standby generator / power supply state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorState {
    #[default]
    Off,
    Ready,
    Running,
    /// Generator fault. Blocks all control outputs.
    Error,
}

/// Operator role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Operator,
    /// Read-only. Never allowed to command.
    #[default]
    Viewer,
}

impl Role {
    #[inline]
    pub const fn can_command(&self) -> bool {
        !matches!(self, Self::Viewer)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "operator" => Ok(Self::Operator),
            "viewer" => Ok(Self::Viewer),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

// ─── Per-Gate ───────────────────────────────────────────────────────

/// Gate leaf motion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionState {
    #[default]
    Stopped,
    Opening,
    Closing,
}

/// Travel direction for jog and timed drive commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Raise,
    Down,
}

impl Direction {
    /// +1 for raise, -1 for down.
    #[inline]
    pub const fn sign(&self) -> f64 {
        match self {
            Self::Raise => 1.0,
            Self::Down => -1.0,
        }
    }

    #[inline]
    pub const fn motion(&self) -> MotionState {
        match self {
            Self::Raise => MotionState::Opening,
            Self::Down => MotionState::Closing,
        }
    }
}

/// Gate type attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateClass {
    #[default]
    Standard,
    /// Gate has no manual drive; manual commands are unsupported.
    NoManual,
}

impl GateClass {
    #[inline]
    pub const fn supports_manual(&self) -> bool {
        matches!(self, Self::Standard)
    }
}

// ─── Per-Loop ───────────────────────────────────────────────────────

/// Run state of an automatic or program control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Stopped,
    Running,
    Paused,
}
