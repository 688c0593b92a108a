//! Manual gate control.
//!
//! One controller per gate. `Raise`/`Down` jog continuously at the gate
//! speed until `Stop` or a travel limit; `Set` moves to an absolute
//! opening by discrete steps. Commands are accepted only while the
//! interlock is clear, and never for gates without a manual drive.

use std::time::Instant;

use serde::Serialize;
use sluice_common::convert::{clamp_pct, pct_from_m, round_m};
use sluice_common::gate::safety::BlockReason;
use sluice_common::gate::state::{Direction, MotionState};
use tracing::{debug, info};

use super::outcome::CommandOutcome;
use crate::state::gate::{Gate, MotionProfile};

/// Absolute set-point in either unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetPoint {
    Percent(f64),
    Meters(f64),
}

impl SetPoint {
    #[inline]
    fn is_nan(&self) -> bool {
        match self {
            Self::Percent(v) | Self::Meters(v) => v.is_nan(),
        }
    }

    /// Target opening [%] on `gate`. NaN holds the current opening.
    fn target_pct(&self, gate: &Gate) -> f64 {
        match *self {
            _ if self.is_nan() => gate.opening(),
            Self::Percent(pct) => clamp_pct(pct),
            Self::Meters(m) => pct_from_m(m, gate.max_open_m()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualCommand {
    Raise,
    Down,
    Stop,
    Set(SetPoint),
}

impl ManualCommand {
    /// Audit text recorded on the gate.
    fn describe(&self, gate: &Gate) -> String {
        match self {
            Self::Raise => "RAISE".to_string(),
            Self::Down => "DOWN".to_string(),
            Self::Stop => "STOP".to_string(),
            Self::Set(point) if point.is_nan() => "SET HOLD".to_string(),
            Self::Set(SetPoint::Percent(pct)) => format!("SET {:.0}%", clamp_pct(*pct)),
            Self::Set(SetPoint::Meters(m)) => {
                format!("SET {:.2}m", round_m(m.clamp(0.0, gate.max_open_m().max(0.0))))
            }
        }
    }
}

/// What the controller is currently doing with its gate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualActivity {
    #[default]
    Idle,
    Jog(Direction),
    /// Stepping toward an opening [%].
    Target(f64),
}

#[derive(Debug, Clone, Default)]
pub struct ManualController {
    activity: ManualActivity,
}

impl ManualController {
    pub const fn new() -> Self {
        Self {
            activity: ManualActivity::Idle,
        }
    }

    #[inline]
    pub fn activity(&self) -> ManualActivity {
        self.activity
    }

    /// Apply an operator command to `gate`.
    ///
    /// `reasons` is the current interlock answer. A non-accepted command
    /// leaves both the controller and the gate untouched.
    pub fn issue(
        &mut self,
        gate: &mut Gate,
        command: ManualCommand,
        reasons: BlockReason,
        now: Instant,
    ) -> CommandOutcome {
        if !gate.class().supports_manual() {
            debug!("{}: manual {command:?} not supported", gate.key());
            return CommandOutcome::NotSupported;
        }
        if reasons.blocked() {
            debug!("{}: manual {command:?} blocked ({reasons:?})", gate.key());
            return CommandOutcome::Blocked(reasons);
        }

        let text = command.describe(gate);
        self.activity = match command {
            ManualCommand::Raise => ManualActivity::Jog(Direction::Raise),
            ManualCommand::Down => ManualActivity::Jog(Direction::Down),
            ManualCommand::Stop => {
                gate.halt();
                ManualActivity::Idle
            }
            ManualCommand::Set(point) => ManualActivity::Target(point.target_pct(gate)),
        };
        info!("{}: {text}", gate.key());
        gate.record_command(text, now);
        CommandOutcome::Accepted
    }

    /// Advance the active command by one tick.
    pub fn tick(
        &mut self,
        gate: &mut Gate,
        reasons: BlockReason,
        dt_s: f64,
        profile: &MotionProfile,
    ) -> MotionState {
        if reasons.blocked() {
            self.force_stop(gate);
            return gate.motion();
        }

        match self.activity {
            ManualActivity::Idle => {
                gate.halt();
            }
            ManualActivity::Jog(direction) => {
                if gate.jog(direction, dt_s, profile) == MotionState::Stopped {
                    info!("{}: travel limit reached, jog stopped", gate.key());
                    self.activity = ManualActivity::Idle;
                }
            }
            ManualActivity::Target(target) => {
                if gate.step_toward(target, profile) == MotionState::Stopped {
                    debug!("{}: set-point {target:.1}% reached", gate.key());
                    self.activity = ManualActivity::Idle;
                }
            }
        }
        gate.motion()
    }

    /// Drop the active command and stop the gate.
    pub fn force_stop(&mut self, gate: &mut Gate) {
        if self.activity != ManualActivity::Idle {
            info!("{}: manual command reset to stop", gate.key());
        }
        self.activity = ManualActivity::Idle;
        gate.halt();
    }
}
