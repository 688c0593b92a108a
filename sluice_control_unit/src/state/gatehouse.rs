//! Gatehouse hydrology state.
//!
//! A gatehouse groups gates that share one hydraulic plan. Only the plan
//! inputs and the latest measurements are stored; `h_plan`, `k_actual`
//! and the K deviation are derived on demand.

use std::fmt;

use heapless::HistoryBuffer;
use sluice_common::consts::TREND_CAPACITY;
use sluice_common::gate::config::GateHouseConfig;
use sluice_common::gate::key::GateHouseKey;
use sluice_common::hydraulics::{HydraulicModel, HydroReading, k_actual};

/// Plan, measurements and `q_actual` trend of one gatehouse.
pub struct GateHouse {
    key: GateHouseKey,
    /// Planned discharge [m³/s], never negative.
    q_plan: f64,
    /// Demand ratio setpoint, within [0, 1].
    k_target: f64,
    /// Discharge at full opening [m³/s].
    q_full_open: f64,
    reading: HydroReading,
    trend: HistoryBuffer<f64, TREND_CAPACITY>,
}

impl GateHouse {
    pub fn new(key: GateHouseKey, q_plan: f64, k_target: f64, q_full_open: f64) -> Self {
        let mut house = Self {
            key,
            q_plan: 0.0,
            k_target: 0.0,
            q_full_open,
            reading: HydroReading::default(),
            trend: HistoryBuffer::new(),
        };
        house.set_q_plan(q_plan);
        house.set_k_target(k_target);
        house
    }

    pub fn from_config(key: GateHouseKey, cfg: &GateHouseConfig) -> Self {
        Self::new(key, cfg.q_plan, cfg.k_target, cfg.q_full_open)
    }

    #[inline]
    pub fn key(&self) -> &GateHouseKey {
        &self.key
    }

    #[inline]
    pub fn q_plan(&self) -> f64 {
        self.q_plan
    }

    #[inline]
    pub fn k_target(&self) -> f64 {
        self.k_target
    }

    #[inline]
    pub fn q_full_open(&self) -> f64 {
        self.q_full_open
    }

    #[inline]
    pub fn q_actual(&self) -> f64 {
        self.reading.q_actual
    }

    #[inline]
    pub fn h_actual(&self) -> f64 {
        self.reading.h_actual
    }

    #[inline]
    pub fn reading(&self) -> HydroReading {
        self.reading
    }

    /// Negative or NaN plans are treated as no plan.
    pub fn set_q_plan(&mut self, q_plan: f64) {
        self.q_plan = if q_plan.is_nan() { 0.0 } else { q_plan.max(0.0) };
    }

    pub fn set_k_target(&mut self, k_target: f64) {
        self.k_target = if k_target.is_nan() {
            0.0
        } else {
            k_target.clamp(0.0, 1.0)
        };
    }

    /// Store a new measurement and append `q_actual` to the trend.
    pub fn record_reading(&mut self, reading: HydroReading) {
        self.reading = reading;
        self.trend.write(reading.q_actual);
    }

    /// Head target for the current plan [m].
    #[inline]
    pub fn h_plan(&self, model: &HydraulicModel) -> f64 {
        model.h_target_from_q(self.q_plan)
    }

    /// Realized demand ratio, 0 without a plan.
    #[inline]
    pub fn k_actual(&self) -> f64 {
        k_actual(self.reading.q_actual, self.q_plan)
    }

    /// `(k_target - k_actual) * 100` [percentage points].
    #[inline]
    pub fn k_deviation_pct(&self) -> f64 {
        (self.k_target - self.k_actual()) * 100.0
    }

    /// Discharge the closed loop aims for [m³/s].
    #[inline]
    pub fn q_target(&self) -> f64 {
        self.k_target * self.q_plan
    }

    /// Trailing `q_actual` samples, oldest first.
    pub fn trend(&self) -> impl Iterator<Item = &f64> + '_ {
        self.trend.oldest_ordered()
    }

    #[inline]
    pub fn trend_len(&self) -> usize {
        self.trend.len()
    }
}

impl fmt::Debug for GateHouse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateHouse")
            .field("key", &self.key)
            .field("q_plan", &self.q_plan)
            .field("k_target", &self.k_target)
            .field("q_full_open", &self.q_full_open)
            .field("reading", &self.reading)
            .field("trend_len", &self.trend.len())
            .finish()
    }
}
