//! Gate leaf state and motion engine.
//!
//! A gate carries exactly one position value, its opening in percent of
//! full travel. The metre opening is always derived from it, so the two
//! can never disagree.
//!
//! Two motion forms share the same bounded state:
//! - **Step** (`step_toward`): absolute set-point, fixed percent per tick,
//!   never overshoots, reports Stopped in the tick it arrives.
//! - **Rate** (`jog`): continuous direction at the linear gate speed,
//!   scaled by the elapsed time (capped), auto-stops at a travel limit.

use std::time::Instant;

use sluice_common::convert::{clamp_pct, opening_m_from_pct};
use sluice_common::gate::config::ControlConfig;
use sluice_common::gate::key::GateKey;
use sluice_common::gate::state::{Direction, GateClass, MotionState};

/// Motion parameters shared by every gate, taken from `[control]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    /// Percent per tick for set-point motion.
    pub step_pct: f64,
    /// Linear travel speed [m/min].
    pub speed_m_per_min: f64,
    /// Elapsed-time cap for a single rate step [s].
    pub max_dt_s: f64,
    /// At-target window [%].
    pub tolerance_pct: f64,
}

impl MotionProfile {
    /// Clamp an elapsed time into `[0, max_dt_s]`. NaN counts as no time.
    #[inline]
    pub fn cap_dt(&self, dt_s: f64) -> f64 {
        if dt_s.is_nan() {
            0.0
        } else {
            dt_s.clamp(0.0, self.max_dt_s)
        }
    }
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self::from(&ControlConfig::default())
    }
}

impl From<&ControlConfig> for MotionProfile {
    fn from(cfg: &ControlConfig) -> Self {
        Self {
            step_pct: cfg.step_pct,
            speed_m_per_min: cfg.speed_m_per_min,
            max_dt_s: cfg.max_tick_dt_s,
            tolerance_pct: cfg.position_tolerance_pct,
        }
    }
}

/// Last operator/controller command issued to a gate (informational).
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRecord {
    pub text: String,
    pub at: Instant,
}

/// One controllable sluice leaf.
#[derive(Debug, Clone)]
pub struct Gate {
    key: GateKey,
    max_open_m: f64,
    class: GateClass,
    /// Opening [%], always within [0, 100].
    opening: f64,
    motion: MotionState,
    last_command: Option<CommandRecord>,
}

impl Gate {
    /// Create a stopped gate. `opening_pct` is clamped into [0, 100].
    pub fn new(key: GateKey, max_open_m: f64, class: GateClass, opening_pct: f64) -> Self {
        Self {
            key,
            max_open_m,
            class,
            opening: clamp_pct(opening_pct),
            motion: MotionState::Stopped,
            last_command: None,
        }
    }

    #[inline]
    pub fn key(&self) -> &GateKey {
        &self.key
    }

    #[inline]
    pub fn max_open_m(&self) -> f64 {
        self.max_open_m
    }

    #[inline]
    pub fn class(&self) -> GateClass {
        self.class
    }

    /// Exact opening [%].
    #[inline]
    pub fn opening(&self) -> f64 {
        self.opening
    }

    /// Opening rounded to whole percent, as displayed.
    #[inline]
    pub fn opening_pct(&self) -> u8 {
        self.opening.round() as u8
    }

    /// Opening [m], derived and rounded to display precision.
    #[inline]
    pub fn opening_m(&self) -> f64 {
        opening_m_from_pct(self.opening, self.max_open_m)
    }

    #[inline]
    pub fn motion(&self) -> MotionState {
        self.motion
    }

    #[inline]
    pub fn last_command(&self) -> Option<&CommandRecord> {
        self.last_command.as_ref()
    }

    /// Whether travel in `direction` is exhausted.
    #[inline]
    pub fn at_limit(&self, direction: Direction) -> bool {
        match direction {
            Direction::Raise => self.opening >= 100.0,
            Direction::Down => self.opening <= 0.0,
        }
    }

    /// Record an issued command. Called once per command, never per tick.
    pub fn record_command(&mut self, text: impl Into<String>, now: Instant) {
        self.last_command = Some(CommandRecord {
            text: text.into(),
            at: now,
        });
    }

    /// Stop without moving.
    #[inline]
    pub fn halt(&mut self) {
        self.motion = MotionState::Stopped;
    }

    /// Advance one discrete step toward `target_pct`.
    ///
    /// A NaN target holds the current opening.
    pub fn step_toward(&mut self, target_pct: f64, profile: &MotionProfile) -> MotionState {
        if target_pct.is_nan() {
            self.motion = MotionState::Stopped;
            return self.motion;
        }
        let target = clamp_pct(target_pct);
        let gap = target - self.opening;
        if gap.abs() <= profile.tolerance_pct {
            self.motion = MotionState::Stopped;
            return self.motion;
        }

        let step = gap.abs().min(profile.step_pct);
        self.opening = clamp_pct(self.opening + step.copysign(gap));

        self.motion = if (target - self.opening).abs() <= profile.tolerance_pct {
            MotionState::Stopped
        } else if gap > 0.0 {
            MotionState::Opening
        } else {
            MotionState::Closing
        };
        self.motion
    }

    /// Travel in `direction` for `dt_s` seconds at the profile speed.
    ///
    /// Returns `Stopped` once the travel limit is reached.
    pub fn jog(&mut self, direction: Direction, dt_s: f64, profile: &MotionProfile) -> MotionState {
        if self.max_open_m <= 0.0 || self.at_limit(direction) {
            self.motion = MotionState::Stopped;
            return self.motion;
        }

        let delta_m = profile.speed_m_per_min / 60.0 * profile.cap_dt(dt_s);
        let delta_pct = delta_m / self.max_open_m * 100.0;
        self.opening = clamp_pct(self.opening + direction.sign() * delta_pct);

        self.motion = if self.at_limit(direction) {
            MotionState::Stopped
        } else {
            direction.motion()
        };
        self.motion
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
