//! First-order hydrology response.
//!
//! Each step relaxes the measured discharge toward the flow the gates
//! currently pass, then derives the head from the rating model. Both
//! values get a little measurement jitter from the injected noise source.

use serde::{Deserialize, Serialize};
use sluice_common::hydraulics::{HydraulicModel, HydroReading};

/// Tunables of the simulated response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydrologyParams {
    /// Fraction of the gap to the gate flow closed per step (0–1].
    pub convergence: f64,
    /// Discharge jitter amplitude [m³/s].
    pub q_jitter: f64,
    /// Head jitter amplitude [m].
    pub h_jitter: f64,
}

impl Default for HydrologyParams {
    fn default() -> Self {
        Self {
            convergence: 0.2,
            q_jitter: 0.05,
            h_jitter: 0.005,
        }
    }
}

/// Flow passed by a gatehouse at a mean opening [%].
#[inline]
pub fn gate_flow(mean_opening_pct: f64, q_full_open: f64) -> f64 {
    if q_full_open <= 0.0 || mean_opening_pct.is_nan() {
        return 0.0;
    }
    mean_opening_pct.clamp(0.0, 100.0) / 100.0 * q_full_open
}

#[derive(Debug, Clone)]
pub struct HydrologySimulator<N> {
    model: HydraulicModel,
    params: HydrologyParams,
    noise: N,
}

impl<N: super::noise::NoiseSource> HydrologySimulator<N> {
    pub fn new(model: HydraulicModel, params: HydrologyParams, noise: N) -> Self {
        Self {
            model,
            params,
            noise,
        }
    }

    /// Next reading after `previous`, with the gates passing `q_gates`.
    pub fn step(&mut self, previous: HydroReading, q_gates: f64) -> HydroReading {
        let k = self.params.convergence.clamp(0.0, 1.0);
        let relaxed = previous.q_actual + (q_gates - previous.q_actual) * k;
        let q_actual = (relaxed + self.noise.sample(self.params.q_jitter)).max(0.0);
        let h_actual =
            self.model.h_target_from_q(q_actual) + self.noise.sample(self.params.h_jitter);
        HydroReading { q_actual, h_actual }
    }
}
