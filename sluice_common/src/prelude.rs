//! Prelude module for common re-exports.
//!
//! ```rust
//! use sluice_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::gate::config::{
    ControlConfig, GateConfig, GateHouseConfig, PatternConfig, PatternRule, SluiceConfig,
    StationConfig,
};

// ─── Types ──────────────────────────────────────────────────────────
pub use crate::gate::key::{GateHouseKey, GateKey};
pub use crate::gate::safety::{BlockReason, ProtectionFlags};
pub use crate::gate::state::{
    Direction, GateClass, GeneratorState, MotionState, OperatingMode, Role, RunState,
};

// ─── Math ───────────────────────────────────────────────────────────
pub use crate::convert::{opening_m_from_pct, opening_pct_from_m};
pub use crate::hydraulics::{
    DeviationBand, DeviationBands, HydraulicModel, HydroReading, deviation_pct, k_actual,
    opening_pct_for_q,
};
