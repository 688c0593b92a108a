//! System-wide constants for the sluice workspace.
//!
//! Canonical defaults for every tunable of the control core. Config
//! structures fall back to these; nothing else should hard-code them.

// ─── Tick ───────────────────────────────────────────────────────────

/// Default tick interval [ms] (one supervisory refresh per second).
pub const TICK_INTERVAL_MS: u64 = 1000;
pub const TICK_INTERVAL_MS_MIN: u64 = 10;
pub const TICK_INTERVAL_MS_MAX: u64 = 60_000;

/// Upper bound on the elapsed time fed into a rate-based motion step [s].
pub const MAX_TICK_DT_S: f64 = 2.0;

// ─── Motion ─────────────────────────────────────────────────────────

/// Discrete step per tick for absolute set-point motion [%].
pub const STEP_PCT: f64 = 2.0;
pub const STEP_PCT_MIN: f64 = 0.1;
pub const STEP_PCT_MAX: f64 = 50.0;

/// Linear gate travel speed [m/min].
pub const GATE_SPEED_M_PER_MIN: f64 = 0.3;
pub const GATE_SPEED_M_PER_MIN_MIN: f64 = 0.01;
pub const GATE_SPEED_M_PER_MIN_MAX: f64 = 10.0;

/// Window inside which a gate counts as "at target" [%].
pub const POSITION_TOLERANCE_PCT: f64 = 0.5;

/// Decimal places kept by the percent → metre conversion.
pub const OPENING_M_DECIMALS: i32 = 2;

// ─── Automatic loop ─────────────────────────────────────────────────

/// Allowed |k_target - k_actual| band before the loop counts as failing [%].
pub const K_TOLERANCE_PCT: f64 = 5.0;

/// Time after first execution before an unreachable target alarms [s].
pub const AUTO_FAIL_TIMEOUT_S: u64 = 60 * 60;

// ─── Program drive ──────────────────────────────────────────────────

/// Allowed range for a timed drive [min].
pub const DRIVE_MINUTES_MIN: f64 = 0.5;
pub const DRIVE_MINUTES_MAX: f64 = 60.0;

// ─── Hydraulics ─────────────────────────────────────────────────────

/// Affine H(Q) rating stand-in: `H = BASE + GAIN * (Q - REF_Q)`.
pub const H_BASE_OFFSET_M: f64 = 1.10;
pub const H_GAIN: f64 = 0.06;
pub const H_REFERENCE_Q: f64 = 10.0;

/// Discharge at full opening when a gatehouse does not configure one [m³/s].
pub const Q_FULL_OPEN_DEFAULT: f64 = 20.0;

/// Deviation badge bands [%].
pub const DEVIATION_OK_PCT: f64 = 2.0;
pub const DEVIATION_WARN_PCT: f64 = 5.0;

/// Capacity of the per-gatehouse `q_actual` trend buffer.
pub const TREND_CAPACITY: usize = 120;

// ─── Session ────────────────────────────────────────────────────────

/// Operator idle time before the session is logged out [s].
pub const IDLE_TIMEOUT_S: u64 = 30 * 60;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/sluice.toml";
