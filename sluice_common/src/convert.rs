//! Gate opening unit conversions.
//!
//! Opening is carried as percent of full travel; metres are always derived
//! from it and the gate's `max_open_m`. None of these functions panic: a
//! non-positive travel yields a closed (zero) opening.

use crate::consts::OPENING_M_DECIMALS;

/// Round to the fixed metre precision used for display and audit text.
#[inline]
pub fn round_m(value: f64) -> f64 {
    let scale = 10f64.powi(OPENING_M_DECIMALS);
    (value * scale).round() / scale
}

/// Opening in metres for a percent opening, rounded to 2 decimals.
///
/// `pct` is clamped to [0, 100] first.
#[inline]
pub fn opening_m_from_pct(pct: f64, max_m: f64) -> f64 {
    if max_m <= 0.0 {
        return 0.0;
    }
    round_m(max_m * clamp_pct(pct) / 100.0)
}

/// Integer percent opening for a metre opening.
///
/// Returns 0 when `max_m <= 0`.
#[inline]
pub fn opening_pct_from_m(m: f64, max_m: f64) -> u8 {
    pct_from_m(m, max_m).round() as u8
}

/// Unrounded percent opening for a metre opening, clamped to [0, 100].
#[inline]
pub fn pct_from_m(m: f64, max_m: f64) -> f64 {
    if max_m <= 0.0 {
        return 0.0;
    }
    clamp_pct(m / max_m * 100.0)
}

/// Clamp a percent value into the valid travel range.
///
/// NaN maps to fully closed.
#[inline]
pub fn clamp_pct(pct: f64) -> f64 {
    if pct.is_nan() { 0.0 } else { pct.clamp(0.0, 100.0) }
}
