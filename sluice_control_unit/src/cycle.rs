//! Supervisory tick cycle.
//!
//! The [`Supervisor`] owns every gate, gatehouse and controller. Operator
//! commands and plan updates go through it, and one call to
//! [`Supervisor::advance`] performs exactly one tick:
//!
//! 1. Evaluate the interlock once for the whole tick.
//! 2. On a mode change, stop the controllers of every other mode.
//! 3. If blocked, force every controller to stop before anything runs.
//! 4. Run the controller of the selected mode (LOCAL holds all gates).
//! 5. Return a [`CycleReport`] snapshot.
//!
//! A stop issued between ticks takes effect on the next tick. Idle
//! logout is left to the host, see [`Supervisor::expire_idle`].
//!
//! Loop and program commands are recorded on every gate of their
//! gatehouse, once per command, next to the manual commands.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use sluice_common::gate::config::ControlConfig;
use sluice_common::gate::key::{GateHouseKey, GateKey};
use sluice_common::gate::safety::BlockReason;
use sluice_common::gate::state::{GateClass, MotionState, OperatingMode, RunState};
use sluice_common::hydraulics::{
    DeviationBand, DeviationBands, HydraulicModel, HydroReading, deviation_pct,
};
use tracing::{debug, info};

use crate::config::LoadedConfig;
use crate::control::automatic::{AutoTick, AutomaticController, LoopEvent};
use crate::control::manual::{ManualActivity, ManualCommand, ManualController};
use crate::control::outcome::CommandOutcome;
use crate::control::program::{
    ActiveProgram, PatternCatalog, ProgramController, ProgramSource, ProgramTick,
};
use crate::error::SupervisorError;
use crate::safety::interlock::{InterlockEdge, InterlockMonitor, evaluate_interlock};
use crate::state::gate::{Gate, MotionProfile};
use crate::state::gatehouse::GateHouse;
use crate::state::session::ControlSession;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// Counters over the supervisor lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CycleStats {
    /// Ticks executed.
    pub tick_count: u64,
    /// Control loops stopped by the interlock.
    pub forced_stops: u64,
    /// Automatic timeout alarms fired.
    pub alarms_fired: u64,
    /// Timed drives that ran to completion.
    pub drives_completed: u64,
    /// Elapsed time applied in the last tick [s].
    pub last_dt_s: f64,
}

// ─── Reports ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateReport {
    pub key: GateKey,
    pub class: GateClass,
    pub opening_pct: u8,
    pub opening_m: f64,
    pub motion: MotionState,
    pub last_command: Option<String>,
    pub manual: ManualActivity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateHouseReport {
    pub key: GateHouseKey,
    pub q_plan: f64,
    pub h_plan: f64,
    pub q_actual: f64,
    pub h_actual: f64,
    pub h_deviation_pct: f64,
    pub k_target: f64,
    pub k_actual: f64,
    pub k_deviation_pct: f64,
    pub band: DeviationBand,
    pub automatic: RunState,
    pub alarm_active: bool,
    pub alarm_message: Option<String>,
    pub program: RunState,
    pub program_detail: Option<ActiveProgram>,
    /// Recent `q_actual` readings, oldest first.
    pub trend: Vec<f64>,
}

/// Snapshot of the whole site after a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub tick: u64,
    pub mode: OperatingMode,
    pub blocked: bool,
    pub reasons: BlockReason,
    pub gates: Vec<GateReport>,
    pub gatehouses: Vec<GateHouseReport>,
}

// ─── Supervisor ─────────────────────────────────────────────────────

#[derive(Debug)]
struct GateSlot {
    gate: Gate,
    manual: ManualController,
}

#[derive(Debug)]
struct HouseSlot {
    house: GateHouse,
    automatic: AutomaticController,
    program: ProgramController,
}

/// Audit `text` on every gate of `house`.
fn record_house_command(
    gates: &mut BTreeMap<GateKey, GateSlot>,
    house: &GateHouseKey,
    text: &str,
    now: Instant,
) {
    gates
        .values_mut()
        .filter(|s| s.gate.key().belongs_to(house))
        .for_each(|s| s.gate.record_command(text, now));
}

/// Owner of all runtime state; single mutator per tick.
#[derive(Debug)]
pub struct Supervisor {
    control: ControlConfig,
    profile: MotionProfile,
    hydraulics: HydraulicModel,
    bands: DeviationBands,
    catalog: PatternCatalog,
    gates: BTreeMap<GateKey, GateSlot>,
    houses: BTreeMap<GateHouseKey, HouseSlot>,
    interlock: InterlockMonitor,
    last_mode: OperatingMode,
    last_tick: Option<Instant>,
    stats: CycleStats,
}

impl Supervisor {
    /// Build the runtime site from a validated config. Gates without an
    /// initial opening start closed.
    pub fn new(config: &LoadedConfig) -> Self {
        let mut gates = BTreeMap::new();
        let mut houses = BTreeMap::new();

        for station in &config.stations {
            for house_cfg in &station.gatehouses {
                let house_key = GateHouseKey::new(station.name.as_str(), house_cfg.name.as_str());
                for gate_cfg in &house_cfg.gates {
                    let key = house_key.gate(gate_cfg.name.as_str());
                    let gate = Gate::new(
                        key.clone(),
                        gate_cfg.max_open_m,
                        gate_cfg.class,
                        gate_cfg.initial_opening_pct.unwrap_or(0.0),
                    );
                    gates.insert(
                        key,
                        GateSlot {
                            gate,
                            manual: ManualController::new(),
                        },
                    );
                }
                houses.insert(
                    house_key.clone(),
                    HouseSlot {
                        house: GateHouse::from_config(house_key, house_cfg),
                        automatic: AutomaticController::new(),
                        program: ProgramController::new(),
                    },
                );
            }
        }

        info!(
            "Supervisor ready: {} gatehouses, {} gates",
            houses.len(),
            gates.len()
        );

        Self {
            control: config.control,
            profile: MotionProfile::from(&config.control),
            hydraulics: config.hydraulics,
            bands: config.bands,
            catalog: config.catalog.clone(),
            gates,
            houses,
            interlock: InterlockMonitor::new(),
            last_mode: OperatingMode::Local,
            last_tick: None,
            stats: CycleStats::default(),
        }
    }

    // ── Accessors ──

    #[inline]
    pub fn control(&self) -> &ControlConfig {
        &self.control
    }

    #[inline]
    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    #[inline]
    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    pub fn gate(&self, key: &GateKey) -> Option<&Gate> {
        self.gates.get(key).map(|s| &s.gate)
    }

    pub fn gates(&self) -> impl Iterator<Item = &Gate> {
        self.gates.values().map(|s| &s.gate)
    }

    pub fn gatehouse(&self, key: &GateHouseKey) -> Option<&GateHouse> {
        self.houses.get(key).map(|s| &s.house)
    }

    pub fn gatehouse_keys(&self) -> impl Iterator<Item = &GateHouseKey> {
        self.houses.keys()
    }

    pub fn automatic(&self, key: &GateHouseKey) -> Option<&AutomaticController> {
        self.houses.get(key).map(|s| &s.automatic)
    }

    pub fn program(&self, key: &GateHouseKey) -> Option<&ProgramController> {
        self.houses.get(key).map(|s| &s.program)
    }

    fn house_slot(&mut self, key: &GateHouseKey) -> Result<&mut HouseSlot, SupervisorError> {
        self.houses
            .get_mut(key)
            .ok_or_else(|| SupervisorError::UnknownGateHouse(key.clone()))
    }

    // ── Operator Commands ──

    /// Issue a manual command to one gate. Requires REMOTE MANUAL mode.
    pub fn issue_manual(
        &mut self,
        session: &mut ControlSession,
        key: &GateKey,
        command: ManualCommand,
        now: Instant,
    ) -> Result<CommandOutcome, SupervisorError> {
        let slot = self
            .gates
            .get_mut(key)
            .ok_or_else(|| SupervisorError::UnknownGate(key.clone()))?;
        let reasons = evaluate_interlock(session);

        if slot.gate.class().supports_manual()
            && !reasons.blocked()
            && session.mode != OperatingMode::RemoteManual
        {
            return Ok(CommandOutcome::Rejected("not in remote manual mode"));
        }
        let outcome = slot.manual.issue(&mut slot.gate, command, reasons, now);
        if outcome.is_accepted() {
            session.touch(now);
        }
        Ok(outcome)
    }

    /// Start the closed loop of a gatehouse. Requires REMOTE AUTOMATIC mode.
    pub fn start_automatic(
        &mut self,
        session: &mut ControlSession,
        key: &GateHouseKey,
        now: Instant,
    ) -> Result<CommandOutcome, SupervisorError> {
        self.loop_command(session, key, LoopEvent::Start, now)
    }

    pub fn pause_automatic(
        &mut self,
        session: &mut ControlSession,
        key: &GateHouseKey,
        now: Instant,
    ) -> Result<CommandOutcome, SupervisorError> {
        self.loop_command(session, key, LoopEvent::Pause, now)
    }

    pub fn stop_automatic(
        &mut self,
        session: &mut ControlSession,
        key: &GateHouseKey,
        now: Instant,
    ) -> Result<CommandOutcome, SupervisorError> {
        self.loop_command(session, key, LoopEvent::Stop, now)
    }

    fn loop_command(
        &mut self,
        session: &mut ControlSession,
        key: &GateHouseKey,
        event: LoopEvent,
        now: Instant,
    ) -> Result<CommandOutcome, SupervisorError> {
        let reasons = evaluate_interlock(session);
        let slot = self.house_slot(key)?;
        if event == LoopEvent::Start
            && !reasons.blocked()
            && session.mode != OperatingMode::RemoteAutomatic
        {
            return Ok(CommandOutcome::Rejected("not in remote automatic mode"));
        }
        let outcome = slot.automatic.command(event, reasons);
        if outcome.is_accepted() {
            session.touch(now);
            let text = match event {
                LoopEvent::Start => "AUTO START",
                LoopEvent::Pause => "AUTO PAUSE",
                LoopEvent::Stop => "AUTO STOP",
            };
            info!("{key}: {text}");
            record_house_command(&mut self.gates, key, text, now);
        }
        Ok(outcome)
    }

    /// Acknowledge the timeout alarm. Returns whether one was active.
    pub fn clear_alarm(&mut self, key: &GateHouseKey) -> Result<bool, SupervisorError> {
        Ok(self.house_slot(key)?.automatic.clear_alarm())
    }

    /// Select the program of a gatehouse; a running program is stopped.
    pub fn select_program(
        &mut self,
        key: &GateHouseKey,
        source: ProgramSource,
    ) -> Result<(), SupervisorError> {
        let program = ActiveProgram::resolve(source, &self.catalog, &self.control)?;
        self.house_slot(key)?.program.select(program);
        Ok(())
    }

    /// Run the selected program. Requires REMOTE PROGRAM mode.
    pub fn run_program(
        &mut self,
        session: &mut ControlSession,
        key: &GateHouseKey,
        now: Instant,
    ) -> Result<CommandOutcome, SupervisorError> {
        let reasons = evaluate_interlock(session);
        let slot = self.house_slot(key)?;
        if !reasons.blocked() && session.mode != OperatingMode::RemoteProgram {
            return Ok(CommandOutcome::Rejected("not in remote program mode"));
        }
        let outcome = slot.program.run(reasons);
        if outcome.is_accepted() {
            session.touch(now);
            if let Some(label) = slot.program.program().map(ActiveProgram::label) {
                let text = format!("{label} RUN");
                info!("{key}: {text}");
                record_house_command(&mut self.gates, key, &text, now);
            }
        }
        Ok(outcome)
    }

    pub fn stop_program(
        &mut self,
        key: &GateHouseKey,
        now: Instant,
    ) -> Result<CommandOutcome, SupervisorError> {
        let outcome = self.house_slot(key)?.program.stop();
        record_house_command(&mut self.gates, key, "PROGRAM STOP", now);
        Ok(outcome)
    }

    // ── Plan & Measurement Inputs ──

    pub fn set_q_plan(&mut self, key: &GateHouseKey, q_plan: f64) -> Result<(), SupervisorError> {
        let slot = self.house_slot(key)?;
        slot.house.set_q_plan(q_plan);
        debug!("{key}: q_plan = {:.2}", slot.house.q_plan());
        Ok(())
    }

    pub fn set_k_target(
        &mut self,
        key: &GateHouseKey,
        k_target: f64,
    ) -> Result<(), SupervisorError> {
        let slot = self.house_slot(key)?;
        slot.house.set_k_target(k_target);
        debug!("{key}: k_target = {:.3}", slot.house.k_target());
        Ok(())
    }

    pub fn record_reading(
        &mut self,
        key: &GateHouseKey,
        reading: HydroReading,
    ) -> Result<(), SupervisorError> {
        self.house_slot(key)?.house.record_reading(reading);
        Ok(())
    }

    // ── Session ──

    /// Log out an operator idle past `idle_timeout_s`. Hosts call this
    /// between ticks; `step` never does. Deferred while any automatic loop
    /// is running so an unattended loop still reaches its timeout alarm.
    pub fn expire_idle(&self, session: &mut ControlSession, now: Instant) -> bool {
        if self
            .houses
            .values()
            .any(|s| s.automatic.run_state() == RunState::Running)
        {
            return false;
        }
        session.expire_if_idle(now, Duration::from_secs(self.control.idle_timeout_s))
    }

    // ── Tick ──

    /// One tick at `now`, with elapsed time taken from the previous tick.
    /// The first tick applies no elapsed time.
    pub fn advance(&mut self, session: &mut ControlSession, now: Instant) -> CycleReport {
        let dt_s = self
            .last_tick
            .map(|at| now.saturating_duration_since(at).as_secs_f64())
            .unwrap_or(0.0);
        self.last_tick = Some(now);
        self.step(session, now, dt_s)
    }

    /// One tick with an explicit elapsed time [s].
    pub fn step(&mut self, session: &mut ControlSession, now: Instant, dt_s: f64) -> CycleReport {
        let reasons = evaluate_interlock(session);
        if self.interlock.update(reasons) == InterlockEdge::Asserted {
            debug!("Interlock asserted at tick {}", self.stats.tick_count);
        }

        if session.mode != self.last_mode {
            info!("Operating mode {} → {}", self.last_mode, session.mode);
            self.stop_inactive_modes(session.mode, now);
            self.last_mode = session.mode;
        }

        if reasons.blocked() {
            self.force_stop_all(now);
        }

        match session.mode {
            OperatingMode::Local => {
                self.gates.values_mut().for_each(|s| s.gate.halt());
            }
            OperatingMode::RemoteManual => {
                for slot in self.gates.values_mut() {
                    slot.manual.tick(&mut slot.gate, reasons, dt_s, &self.profile);
                }
            }
            OperatingMode::RemoteAutomatic => {
                for (key, slot) in self.houses.iter_mut() {
                    let gates = self
                        .gates
                        .values_mut()
                        .filter(|s| s.gate.key().belongs_to(key))
                        .map(|s| &mut s.gate);
                    let out = slot.automatic.tick(
                        &slot.house,
                        gates,
                        reasons,
                        now,
                        &self.control,
                        &self.profile,
                    );
                    let text = match out {
                        AutoTick::AlarmFired => {
                            self.stats.alarms_fired += 1;
                            "AUTO STOP (alarm)"
                        }
                        AutoTick::ForcedStop => "AUTO STOP (interlock)",
                        _ => continue,
                    };
                    record_house_command(&mut self.gates, key, text, now);
                }
            }
            OperatingMode::RemoteProgram => {
                for (key, slot) in self.houses.iter_mut() {
                    let gates = self
                        .gates
                        .values_mut()
                        .filter(|s| s.gate.key().belongs_to(key))
                        .map(|s| &mut s.gate);
                    let out = slot.program.tick(
                        &slot.house,
                        gates,
                        reasons,
                        dt_s,
                        &self.hydraulics,
                        &self.profile,
                    );
                    let text = match (out, slot.program.program()) {
                        (ProgramTick::Completed, Some(program)) => {
                            self.stats.drives_completed += 1;
                            format!("{} COMPLETE", program.label())
                        }
                        (ProgramTick::ForcedStop, _) => "PROGRAM STOP (interlock)".to_string(),
                        _ => continue,
                    };
                    record_house_command(&mut self.gates, key, &text, now);
                }
            }
        }

        self.stats.tick_count += 1;
        self.stats.last_dt_s = dt_s;
        self.report(session)
    }

    fn stop_inactive_modes(&mut self, mode: OperatingMode, now: Instant) {
        if mode != OperatingMode::RemoteManual {
            for slot in self.gates.values_mut() {
                slot.manual.force_stop(&mut slot.gate);
            }
        }
        for (key, slot) in self.houses.iter_mut() {
            if mode != OperatingMode::RemoteAutomatic
                && slot.automatic.run_state() != RunState::Stopped
            {
                slot.automatic.force_stop();
                record_house_command(&mut self.gates, key, "AUTO STOP (mode change)", now);
            }
            if mode != OperatingMode::RemoteProgram && slot.program.run_state() != RunState::Stopped
            {
                slot.program.force_stop();
                record_house_command(&mut self.gates, key, "PROGRAM STOP (mode change)", now);
            }
        }
    }

    fn force_stop_all(&mut self, now: Instant) {
        for slot in self.gates.values_mut() {
            slot.manual.force_stop(&mut slot.gate);
        }
        for (key, slot) in self.houses.iter_mut() {
            if slot.automatic.run_state() != RunState::Stopped {
                self.stats.forced_stops += 1;
                slot.automatic.force_stop();
                record_house_command(&mut self.gates, key, "AUTO STOP (interlock)", now);
            }
            if slot.program.run_state() != RunState::Stopped {
                self.stats.forced_stops += 1;
                slot.program.force_stop();
                record_house_command(&mut self.gates, key, "PROGRAM STOP (interlock)", now);
            }
        }
    }

    // ── Reporting ──

    /// Snapshot without ticking.
    pub fn report(&self, session: &ControlSession) -> CycleReport {
        let reasons = evaluate_interlock(session);
        let gates = self
            .gates
            .values()
            .map(|s| GateReport {
                key: s.gate.key().clone(),
                class: s.gate.class(),
                opening_pct: s.gate.opening_pct(),
                opening_m: s.gate.opening_m(),
                motion: s.gate.motion(),
                last_command: s.gate.last_command().map(|c| c.text.clone()),
                manual: s.manual.activity(),
            })
            .collect();
        let gatehouses = self
            .houses
            .values()
            .map(|s| {
                let h_plan = s.house.h_plan(&self.hydraulics);
                let k_deviation = s.house.k_deviation_pct();
                GateHouseReport {
                    key: s.house.key().clone(),
                    q_plan: s.house.q_plan(),
                    h_plan,
                    q_actual: s.house.q_actual(),
                    h_actual: s.house.h_actual(),
                    h_deviation_pct: deviation_pct(h_plan, s.house.h_actual()),
                    k_target: s.house.k_target(),
                    k_actual: s.house.k_actual(),
                    k_deviation_pct: k_deviation,
                    band: self.bands.classify(k_deviation),
                    automatic: s.automatic.run_state(),
                    alarm_active: s.automatic.alarm().is_active(),
                    alarm_message: s.automatic.alarm().message().map(str::to_string),
                    program: s.program.run_state(),
                    program_detail: s.program.program().cloned(),
                    trend: s.house.trend().copied().collect(),
                }
            })
            .collect();

        CycleReport {
            tick: self.stats.tick_count,
            mode: session.mode,
            blocked: reasons.blocked(),
            reasons,
            gates,
            gatehouses,
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
