//! Hydraulic model: head from discharge, demand ratio and deviations.
//!
//! The head mapping is a fixed affine stand-in for a rating curve. Its
//! constants come from the `[hydraulics]` config table.
//!
//! Every ratio here treats a zero denominator as a valid transient plan
//! and returns a neutral 0 instead of failing.

use serde::{Deserialize, Serialize};

use crate::consts::{DEVIATION_OK_PCT, DEVIATION_WARN_PCT, H_BASE_OFFSET_M, H_GAIN, H_REFERENCE_Q};
use crate::convert::clamp_pct;

/// Affine H(Q) model: `H = base_offset_m + gain * (Q - reference_q)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydraulicModel {
    /// Head at the reference discharge [m].
    pub base_offset_m: f64,
    /// Head change per unit discharge [m per m³/s].
    pub gain: f64,
    /// Reference discharge [m³/s].
    pub reference_q: f64,
}

impl Default for HydraulicModel {
    fn default() -> Self {
        Self {
            base_offset_m: H_BASE_OFFSET_M,
            gain: H_GAIN,
            reference_q: H_REFERENCE_Q,
        }
    }
}

impl HydraulicModel {
    /// Target head for a planned discharge [m].
    #[inline]
    pub fn h_target_from_q(&self, q: f64) -> f64 {
        self.base_offset_m + self.gain * (q - self.reference_q)
    }

    pub fn validate(&self) -> Result<(), String> {
        if ![self.base_offset_m, self.gain, self.reference_q]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err("hydraulic model constants must be finite".to_string());
        }
        if self.reference_q < 0.0 {
            return Err(format!("reference_q {} must be >= 0", self.reference_q));
        }
        Ok(())
    }
}

/// One simulated or measured hydrology sample of a gatehouse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HydroReading {
    /// Measured discharge [m³/s].
    pub q_actual: f64,
    /// Measured head [m].
    pub h_actual: f64,
}

/// Signed deviation of `actual` from `target` in percent of `target`.
///
/// `deviation_pct(10.0, 10.5) == 5.0`; zero target → 0.
#[inline]
pub fn deviation_pct(target: f64, actual: f64) -> f64 {
    if target == 0.0 {
        0.0
    } else {
        (actual - target) / target * 100.0
    }
}

/// Realized demand ratio `q_actual / q_plan`; 0 when there is no plan.
#[inline]
pub fn k_actual(q_actual: f64, q_plan: f64) -> f64 {
    if q_plan <= 0.0 { 0.0 } else { q_actual / q_plan }
}

/// Fixed linear mapping from a discharge to the opening that passes it.
///
/// Clamped to [0, 100]; 0 when `q_full_open <= 0`.
#[inline]
pub fn opening_pct_for_q(q: f64, q_full_open: f64) -> f64 {
    if q_full_open <= 0.0 {
        return 0.0;
    }
    clamp_pct(q / q_full_open * 100.0)
}

/// Severity badge for an absolute deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviationBand {
    Ok,
    Warn,
    Alarm,
}

/// Band thresholds [%] for [`DeviationBand`] classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviationBands {
    /// Upper bound of the OK band (inclusive).
    pub ok_pct: f64,
    /// Upper bound of the warning band (inclusive).
    pub warn_pct: f64,
}

impl Default for DeviationBands {
    fn default() -> Self {
        Self {
            ok_pct: DEVIATION_OK_PCT,
            warn_pct: DEVIATION_WARN_PCT,
        }
    }
}

impl DeviationBands {
    /// Classify a signed deviation by its magnitude.
    pub fn classify(&self, deviation_pct: f64) -> DeviationBand {
        let magnitude = deviation_pct.abs();
        if magnitude <= self.ok_pct {
            DeviationBand::Ok
        } else if magnitude <= self.warn_pct {
            DeviationBand::Warn
        } else {
            DeviationBand::Alarm
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.ok_pct < 0.0 || self.warn_pct < self.ok_pct {
            return Err(format!(
                "deviation bands must satisfy 0 <= ok_pct ({}) <= warn_pct ({})",
                self.ok_pct, self.warn_pct
            ));
        }
        Ok(())
    }
}
