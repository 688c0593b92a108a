//! # Sluice Simulation
//!
//! Stand-in for field instrumentation when no panel is attached:
//!
//! - [`noise`] - injectable noise sources (seeded random, none, constant)
//! - [`hydrology`] - first-order discharge response to gate openings
//! - [`seed`] - demo site and random starting openings

pub mod hydrology;
pub mod noise;
pub mod seed;
