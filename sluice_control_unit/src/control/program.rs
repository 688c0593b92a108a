//! Program (open-loop) control of one gatehouse.
//!
//! A program is selected from one of three sources and then run:
//! - a catalog pattern (demand fraction, formula over `q_plan`, or hold),
//! - a direct position [%],
//! - a timed drive in one direction at the linear gate speed.
//!
//! There is no feedback and no timeout alarm. A timed drive stops itself
//! once its duration has elapsed; the other programs keep stepping the
//! gates toward their target until stopped.

use serde::Serialize;
use sluice_common::convert::clamp_pct;
use sluice_common::gate::config::{ControlConfig, PatternConfig, PatternRule, default_patterns};
use sluice_common::gate::safety::BlockReason;
use sluice_common::gate::state::{Direction, RunState};
use sluice_common::hydraulics::HydraulicModel;
use tracing::{info, warn};

use super::outcome::CommandOutcome;
use crate::error::SupervisorError;
use crate::state::gate::{Gate, MotionProfile};
use crate::state::gatehouse::GateHouse;

// ─── Pattern Catalog ────────────────────────────────────────────────

/// Program patterns addressable by id.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternCatalog {
    patterns: Vec<PatternConfig>,
}

impl PatternCatalog {
    pub fn new(patterns: Vec<PatternConfig>) -> Self {
        Self { patterns }
    }

    pub fn get(&self, id: &str) -> Option<&PatternConfig> {
        self.patterns.iter().find(|p| p.id == id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for PatternCatalog {
    fn default() -> Self {
        Self::new(default_patterns())
    }
}

// ─── Program Selection ──────────────────────────────────────────────

/// Operator program request.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgramSource {
    Pattern(String),
    Position(f64),
    Drive { direction: Direction, minutes: f64 },
}

/// A resolved, runnable program.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActiveProgram {
    Pattern { id: String, rule: PatternRule },
    /// `None` holds the current opening.
    Position { target_pct: Option<f64> },
    Drive {
        direction: Direction,
        duration_s: f64,
        elapsed_s: f64,
    },
}

impl ActiveProgram {
    /// Resolve a request. Positions and durations are clamped, a NaN
    /// position becomes a hold, and unknown pattern ids are an error.
    pub fn resolve(
        source: ProgramSource,
        catalog: &PatternCatalog,
        cfg: &ControlConfig,
    ) -> Result<Self, SupervisorError> {
        Ok(match source {
            ProgramSource::Pattern(id) => {
                let pattern = catalog
                    .get(&id)
                    .ok_or_else(|| SupervisorError::UnknownPattern(id.clone()))?;
                Self::Pattern {
                    id,
                    rule: pattern.rule,
                }
            }
            ProgramSource::Position(pct) => Self::Position {
                target_pct: (!pct.is_nan()).then(|| clamp_pct(pct)),
            },
            ProgramSource::Drive { direction, minutes } => Self::Drive {
                direction,
                duration_s: cfg.clamp_drive_minutes(minutes) * 60.0,
                elapsed_s: 0.0,
            },
        })
    }

    /// Audit text recorded on every gate of the house when the program runs.
    pub fn label(&self) -> String {
        match self {
            Self::Pattern { id, .. } => format!("PROGRAM {id}"),
            Self::Position {
                target_pct: Some(pct),
            } => format!("PROGRAM POS {pct:.0}%"),
            Self::Position { target_pct: None } => "PROGRAM POS HOLD".to_string(),
            Self::Drive {
                direction,
                duration_s,
                ..
            } => {
                let verb = match direction {
                    Direction::Raise => "RAISE",
                    Direction::Down => "DOWN",
                };
                format!("PROGRAM DRIVE {verb} {:.1}min", duration_s / 60.0)
            }
        }
    }

    /// Target opening [%] for step programs, `None` for hold and drive.
    pub fn target_pct(&self, house: &GateHouse, model: &HydraulicModel) -> Option<f64> {
        match self {
            Self::Pattern { rule, .. } => match *rule {
                PatternRule::Demand { fraction } => Some(clamp_pct(fraction * 100.0)),
                PatternRule::Formula { base_pct, gain } => Some(clamp_pct(
                    base_pct + gain * (house.q_plan() - model.reference_q),
                )),
                PatternRule::Hold => None,
            },
            Self::Position { target_pct } => *target_pct,
            Self::Drive { .. } => None,
        }
    }
}

// ─── Controller ─────────────────────────────────────────────────────

/// What one program tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgramTick {
    Idle,
    ForcedStop,
    Stepping { target_pct: f64 },
    Holding,
    Driving { remaining_s: f64 },
    /// Timed drive finished this tick; program stopped.
    Completed,
}

#[derive(Debug, Clone, Default)]
pub struct ProgramController {
    run_state: RunState,
    program: Option<ActiveProgram>,
}

impl ProgramController {
    pub const fn new() -> Self {
        Self {
            run_state: RunState::Stopped,
            program: None,
        }
    }

    #[inline]
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    #[inline]
    pub fn program(&self) -> Option<&ActiveProgram> {
        self.program.as_ref()
    }

    /// Replace the selected program. A running program is stopped first.
    pub fn select(&mut self, program: ActiveProgram) {
        if self.run_state != RunState::Stopped {
            info!("Program stopped for reselection");
        }
        self.run_state = RunState::Stopped;
        info!("Program selected: {program:?}");
        self.program = Some(program);
    }

    pub fn run(&mut self, reasons: BlockReason) -> CommandOutcome {
        if reasons.blocked() {
            return CommandOutcome::Blocked(reasons);
        }
        let Some(program) = self.program.as_mut() else {
            return CommandOutcome::Rejected("no program selected");
        };
        if self.run_state != RunState::Running {
            if let ActiveProgram::Drive { elapsed_s, .. } = program {
                *elapsed_s = 0.0;
            }
            self.run_state = RunState::Running;
            info!("Program running");
        }
        CommandOutcome::Accepted
    }

    pub fn stop(&mut self) -> CommandOutcome {
        if self.run_state != RunState::Stopped {
            info!("Program stopped");
        }
        self.run_state = RunState::Stopped;
        CommandOutcome::Accepted
    }

    pub fn force_stop(&mut self) {
        if self.run_state != RunState::Stopped {
            warn!("Program forced to stop");
        }
        self.run_state = RunState::Stopped;
    }

    /// One program step over `house` and its `gates`.
    pub fn tick<'a>(
        &mut self,
        house: &GateHouse,
        gates: impl IntoIterator<Item = &'a mut Gate>,
        reasons: BlockReason,
        dt_s: f64,
        model: &HydraulicModel,
        profile: &MotionProfile,
    ) -> ProgramTick {
        let gates = gates.into_iter();
        if self.run_state != RunState::Running {
            gates.for_each(Gate::halt);
            return ProgramTick::Idle;
        }
        if reasons.blocked() {
            warn!("{}: interlock {reasons:?}, program stopped", house.key());
            self.run_state = RunState::Stopped;
            gates.for_each(Gate::halt);
            return ProgramTick::ForcedStop;
        }
        let Some(program) = self.program.as_mut() else {
            self.run_state = RunState::Stopped;
            gates.for_each(Gate::halt);
            return ProgramTick::Idle;
        };

        if let ActiveProgram::Drive {
            direction,
            duration_s,
            elapsed_s,
        } = program
        {
            let step_s = profile.cap_dt(dt_s).min(*duration_s - *elapsed_s).max(0.0);
            *elapsed_s += step_s;
            let finished = *elapsed_s >= *duration_s;
            for gate in gates {
                gate.jog(*direction, step_s, profile);
                if finished {
                    gate.halt();
                }
            }
            if finished {
                info!("{}: timed drive {direction:?} complete", house.key());
                self.run_state = RunState::Stopped;
                return ProgramTick::Completed;
            }
            return ProgramTick::Driving {
                remaining_s: *duration_s - *elapsed_s,
            };
        }

        match program.target_pct(house, model) {
            Some(target) => {
                for gate in gates {
                    gate.step_toward(target, profile);
                }
                ProgramTick::Stepping { target_pct: target }
            }
            None => {
                gates.for_each(Gate::halt);
                ProgramTick::Holding
            }
        }
    }

}
