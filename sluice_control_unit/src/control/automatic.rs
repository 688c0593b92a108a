//! Closed-loop K tracking of one gatehouse.
//!
//! Run state machine: Stopped → Running ↔ Paused, any → Stopped.
//! While running, each tick compares `k_target` against the realized
//! `k_actual`, steps every gate of the house toward the opening that
//! passes `k_target * q_plan`, and escalates a persistent excursion to a
//! latched alarm after the failure timeout.
//!
//! Invariant: an active alarm implies `RunState::Stopped`.

use std::time::{Duration, Instant};

use sluice_common::gate::config::ControlConfig;
use sluice_common::gate::safety::BlockReason;
use sluice_common::gate::state::RunState;
use sluice_common::hydraulics::opening_pct_for_q;
use tracing::{error, info, warn};

use super::alarm::{AlarmEvent, TimeoutAlarm};
use super::outcome::CommandOutcome;
use crate::state::gate::{Gate, MotionProfile};
use crate::state::gatehouse::GateHouse;

/// Operator events of the automatic loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    Start,
    Pause,
    Stop,
}

/// Result of a run-state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopTransition {
    Ok(RunState),
    Rejected(&'static str),
}

/// What one automatic tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutoTick {
    /// Stopped or paused; gates held.
    Idle,
    /// Interlock asserted while running or paused.
    ForcedStop,
    /// Gates stepped toward `target_pct`.
    Tracking { target_pct: f64, deviation_pct: f64 },
    /// Timeout alarm fired; loop stopped.
    AlarmFired,
}

#[derive(Debug, Clone, Default)]
pub struct AutomaticController {
    run_state: RunState,
    alarm: TimeoutAlarm,
}

impl AutomaticController {
    pub const fn new() -> Self {
        Self {
            run_state: RunState::Stopped,
            alarm: TimeoutAlarm::new(),
        }
    }

    #[inline]
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    #[inline]
    pub fn alarm(&self) -> &TimeoutAlarm {
        &self.alarm
    }

    /// Drive the run state machine.
    pub fn handle_event(&mut self, event: LoopEvent) -> LoopTransition {
        use LoopEvent as E;
        use RunState as S;

        let next = match (self.run_state, event) {
            (S::Stopped, E::Start) => {
                if self.alarm.is_active() {
                    return LoopTransition::Rejected("alarm active; clear alarm before start");
                }
                self.alarm.reset_timer();
                S::Running
            }
            // Resume keeps the first execution time.
            (S::Paused, E::Start) => S::Running,
            (S::Running, E::Start) => S::Running,

            (S::Running | S::Paused, E::Pause) => S::Paused,
            (S::Stopped, E::Pause) => return LoopTransition::Rejected("loop is not running"),

            (_, E::Stop) => S::Stopped,
        };

        self.run_state = next;
        LoopTransition::Ok(next)
    }

    /// Operator command entry. Start needs a clear interlock; pause and
    /// stop are always allowed.
    pub fn command(&mut self, event: LoopEvent, reasons: BlockReason) -> CommandOutcome {
        if event == LoopEvent::Start && reasons.blocked() {
            return CommandOutcome::Blocked(reasons);
        }
        match self.handle_event(event) {
            LoopTransition::Ok(state) => {
                info!("Automatic loop {event:?} → {state:?}");
                CommandOutcome::Accepted
            }
            LoopTransition::Rejected(reason) => CommandOutcome::Rejected(reason),
        }
    }

    /// Explicit operator acknowledgement of the timeout alarm.
    pub fn clear_alarm(&mut self) -> bool {
        let cleared = self.alarm.clear();
        if cleared {
            info!("Automatic alarm cleared");
        }
        cleared
    }

    /// Stop without touching the alarm.
    pub fn force_stop(&mut self) {
        if self.run_state != RunState::Stopped {
            warn!("Automatic loop forced to stop from {:?}", self.run_state);
        }
        self.run_state = RunState::Stopped;
    }

    /// One control step over `house` and its `gates`.
    pub fn tick<'a>(
        &mut self,
        house: &GateHouse,
        gates: impl IntoIterator<Item = &'a mut Gate>,
        reasons: BlockReason,
        now: Instant,
        cfg: &ControlConfig,
        profile: &MotionProfile,
    ) -> AutoTick {
        if self.run_state == RunState::Stopped {
            halt_all(gates);
            return AutoTick::Idle;
        }
        if reasons.blocked() {
            warn!("{}: interlock {reasons:?}, automatic loop stopped", house.key());
            self.run_state = RunState::Stopped;
            halt_all(gates);
            return AutoTick::ForcedStop;
        }
        if self.run_state == RunState::Paused {
            halt_all(gates);
            return AutoTick::Idle;
        }

        let deviation = house.k_deviation_pct();
        self.alarm.arm(now);
        let timeout = Duration::from_secs(cfg.auto_fail_timeout_s);
        match self.alarm.evaluate(now, deviation, cfg.k_tolerance_pct, timeout) {
            AlarmEvent::Fired | AlarmEvent::Latched => {
                self.run_state = RunState::Stopped;
                error!(
                    "{}: automatic control failed: {}",
                    house.key(),
                    self.alarm.message().unwrap_or("timeout")
                );
                halt_all(gates);
                AutoTick::AlarmFired
            }
            AlarmEvent::Quiet | AlarmEvent::Pending => {
                let target = opening_pct_for_q(house.q_target(), house.q_full_open());
                for gate in gates {
                    gate.step_toward(target, profile);
                }
                AutoTick::Tracking {
                    target_pct: target,
                    deviation_pct: deviation,
                }
            }
        }
    }
}

fn halt_all<'a>(gates: impl IntoIterator<Item = &'a mut Gate>) {
    for gate in gates {
        gate.halt();
    }
}
