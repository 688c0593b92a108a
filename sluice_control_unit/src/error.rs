//! Supervisor lookup errors.
//!
//! Interlock blocks and state-machine rejections are not errors; they are
//! reported through [`crate::control::outcome::CommandOutcome`].

use sluice_common::gate::key::{GateHouseKey, GateKey};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupervisorError {
    /// No gate with this key in the site catalog
    #[error("Unknown gate: {0}")]
    UnknownGate(GateKey),

    /// No gatehouse with this key in the site catalog
    #[error("Unknown gatehouse: {0}")]
    UnknownGateHouse(GateHouseKey),

    /// Program pattern id not in the catalog
    #[error("Unknown program pattern: {0}")]
    UnknownPattern(String),
}
