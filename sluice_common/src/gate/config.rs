//! Configuration structures for the gate control core.
//!
//! All config types use `serde::Deserialize` for TOML loading.
//! Numeric parameters have `MIN`/`MAX` bounds from [`crate::consts`].
//! Optional fields use `#[serde(default)]` so a minimal file only needs
//! `[shared]` and the station catalog.

use serde::{Deserialize, Serialize};

use crate::config::SharedConfig;
use crate::consts::{
    AUTO_FAIL_TIMEOUT_S, DRIVE_MINUTES_MAX, DRIVE_MINUTES_MIN, GATE_SPEED_M_PER_MIN,
    GATE_SPEED_M_PER_MIN_MAX, GATE_SPEED_M_PER_MIN_MIN, IDLE_TIMEOUT_S, K_TOLERANCE_PCT,
    MAX_TICK_DT_S, POSITION_TOLERANCE_PCT, Q_FULL_OPEN_DEFAULT, STEP_PCT, STEP_PCT_MAX,
    STEP_PCT_MIN, TICK_INTERVAL_MS, TICK_INTERVAL_MS_MAX, TICK_INTERVAL_MS_MIN,
};
use crate::hydraulics::{DeviationBands, HydraulicModel};

use super::state::GateClass;

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete sluice configuration file.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "sluice-cu-01"
///
/// [control]
/// k_tolerance_pct = 5.0
///
/// [[stations]]
/// name = "Hantan"
///
/// [[stations.gatehouses]]
/// name = "GH-1"
/// q_plan = 12.0
///
/// [[stations.gatehouses.gates]]
/// name = "Gate 1"
/// max_open_m = 2.0
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SluiceConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub hydraulics: HydraulicModel,
    #[serde(default)]
    pub deviation_bands: DeviationBands,
    /// Program pattern catalog. Empty → [`default_patterns`].
    #[serde(default)]
    pub patterns: Vec<PatternConfig>,
    #[serde(default)]
    pub stations: Vec<StationConfig>,
}

// ─── Control Tunables ───────────────────────────────────────────────

/// Rates, tolerances and timeouts of the control core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Tick interval of the supervisory loop [ms].
    pub tick_interval_ms: u64,
    /// Discrete step per tick for absolute set-points [%].
    pub step_pct: f64,
    /// Linear gate travel speed for jog and timed drive [m/min].
    pub speed_m_per_min: f64,
    /// Cap on elapsed time applied in one rate-based step [s].
    pub max_tick_dt_s: f64,
    /// At-target window [%].
    pub position_tolerance_pct: f64,
    /// Automatic loop K tolerance [%].
    pub k_tolerance_pct: f64,
    /// Automatic loop failure timeout after first execution [s].
    pub auto_fail_timeout_s: u64,
    /// Timed drive duration range [min].
    pub drive_minutes_min: f64,
    pub drive_minutes_max: f64,
    /// Operator idle logout [s].
    pub idle_timeout_s: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: TICK_INTERVAL_MS,
            step_pct: STEP_PCT,
            speed_m_per_min: GATE_SPEED_M_PER_MIN,
            max_tick_dt_s: MAX_TICK_DT_S,
            position_tolerance_pct: POSITION_TOLERANCE_PCT,
            k_tolerance_pct: K_TOLERANCE_PCT,
            auto_fail_timeout_s: AUTO_FAIL_TIMEOUT_S,
            drive_minutes_min: DRIVE_MINUTES_MIN,
            drive_minutes_max: DRIVE_MINUTES_MAX,
            idle_timeout_s: IDLE_TIMEOUT_S,
        }
    }
}

impl ControlConfig {
    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), String> {
        if !(TICK_INTERVAL_MS_MIN..=TICK_INTERVAL_MS_MAX).contains(&self.tick_interval_ms) {
            return Err(format!(
                "tick_interval_ms {} out of range [{}, {}]",
                self.tick_interval_ms, TICK_INTERVAL_MS_MIN, TICK_INTERVAL_MS_MAX
            ));
        }
        if !(STEP_PCT_MIN..=STEP_PCT_MAX).contains(&self.step_pct) {
            return Err(format!(
                "step_pct {} out of range [{}, {}]",
                self.step_pct, STEP_PCT_MIN, STEP_PCT_MAX
            ));
        }
        if !(GATE_SPEED_M_PER_MIN_MIN..=GATE_SPEED_M_PER_MIN_MAX).contains(&self.speed_m_per_min) {
            return Err(format!(
                "speed_m_per_min {} out of range [{}, {}]",
                self.speed_m_per_min, GATE_SPEED_M_PER_MIN_MIN, GATE_SPEED_M_PER_MIN_MAX
            ));
        }
        if !(self.max_tick_dt_s > 0.0) {
            return Err(format!("max_tick_dt_s {} must be > 0", self.max_tick_dt_s));
        }
        if !(self.position_tolerance_pct >= 0.0 && self.position_tolerance_pct < self.step_pct) {
            return Err(format!(
                "position_tolerance_pct {} must be in [0, step_pct)",
                self.position_tolerance_pct
            ));
        }
        if !(self.k_tolerance_pct > 0.0 && self.k_tolerance_pct <= 100.0) {
            return Err(format!(
                "k_tolerance_pct {} out of range (0, 100]",
                self.k_tolerance_pct
            ));
        }
        if self.auto_fail_timeout_s == 0 {
            return Err("auto_fail_timeout_s must be > 0".to_string());
        }
        if !(self.drive_minutes_min > 0.0 && self.drive_minutes_min <= self.drive_minutes_max) {
            return Err(format!(
                "drive minutes range [{}, {}] is invalid",
                self.drive_minutes_min, self.drive_minutes_max
            ));
        }
        Ok(())
    }

    /// Clamp a requested drive duration into the allowed range [min].
    #[inline]
    pub fn clamp_drive_minutes(&self, minutes: f64) -> f64 {
        if minutes.is_nan() {
            return self.drive_minutes_min;
        }
        minutes.clamp(self.drive_minutes_min, self.drive_minutes_max)
    }
}

// ─── Program Patterns ───────────────────────────────────────────────

/// How a program pattern derives its target opening.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatternRule {
    /// Fixed fractional demand of full opening (0.0–1.0).
    Demand { fraction: f64 },
    /// `base_pct + gain * (q_plan - reference_q)` [%].
    Formula { base_pct: f64, gain: f64 },
    /// Hold position; issues no motion command.
    Hold,
}

/// Named entry of the program pattern catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub rule: PatternRule,
}

/// Built-in catalog: 100 % … 10 % demand in 10 % steps plus full-close hold.
pub fn default_patterns() -> Vec<PatternConfig> {
    let mut patterns: Vec<PatternConfig> = (1..=10)
        .rev()
        .map(|tenth| PatternConfig {
            id: format!("p{}", tenth * 10),
            label: format!("{}%", tenth * 10),
            rule: PatternRule::Demand {
                fraction: tenth as f64 / 10.0,
            },
        })
        .collect();
    patterns.push(PatternConfig {
        id: "full_close".to_string(),
        label: "0% full-close (hold)".to_string(),
        rule: PatternRule::Hold,
    });
    patterns
}

// ─── Site Catalog ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    pub name: String,
    #[serde(default)]
    pub gatehouses: Vec<GateHouseConfig>,
}

/// One control group sharing a hydraulic plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateHouseConfig {
    pub name: String,
    /// Planned discharge [m³/s].
    #[serde(default)]
    pub q_plan: f64,
    /// Demand ratio setpoint (0–1).
    #[serde(default = "default_k_target")]
    pub k_target: f64,
    /// Discharge at full opening [m³/s].
    #[serde(default = "default_q_full_open")]
    pub q_full_open: f64,
    #[serde(default)]
    pub gates: Vec<GateConfig>,
}

fn default_k_target() -> f64 {
    1.0
}
fn default_q_full_open() -> f64 {
    Q_FULL_OPEN_DEFAULT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    pub name: String,
    /// Full travel [m].
    pub max_open_m: f64,
    #[serde(default)]
    pub class: GateClass,
    /// Starting opening [%]. `None` → seeded by the simulator.
    #[serde(default)]
    pub initial_opening_pct: Option<f64>,
}
