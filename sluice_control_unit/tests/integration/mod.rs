//! Shared fixtures for the integration scenarios.

mod automatic_timeout;
mod config_files;
mod interlock_dominance;
mod program_drive;
mod scenarios;

use std::time::Instant;

use sluice_common::prelude::*;
use sluice_control_unit::config::load_config_from_str;
use sluice_control_unit::cycle::Supervisor;
use sluice_control_unit::state::session::ControlSession;

/// One station, one gatehouse, a 2 m and a 1 m standard gate plus a
/// no-manual gate.
pub const SITE: &str = r#"
[shared]
service_name = "sluice-it"

[[stations]]
name = "Hantan"

[[stations.gatehouses]]
name = "GH-1"
q_plan = 12.0
k_target = 0.8
q_full_open = 20.0

[[stations.gatehouses.gates]]
name = "Gate 1"
max_open_m = 2.0
initial_opening_pct = 40.0

[[stations.gatehouses.gates]]
name = "Gate 2"
max_open_m = 1.0
initial_opening_pct = 0.0

[[stations.gatehouses.gates]]
name = "Gate 3"
max_open_m = 2.0
class = "no_manual"
initial_opening_pct = 50.0
"#;

pub fn supervisor() -> Supervisor {
    Supervisor::new(&load_config_from_str(SITE).expect("fixture config is valid"))
}

/// A session with every interlock condition clear.
pub fn ready_session(mode: OperatingMode, now: Instant) -> ControlSession {
    let mut s = ControlSession::new();
    s.mode = mode;
    s.remote_enabled = true;
    s.generator_state = GeneratorState::Running;
    s.login("operator-1", Role::Operator, now);
    s
}

pub fn house() -> GateHouseKey {
    GateHouseKey::new("Hantan", "GH-1")
}

pub fn gate(name: &str) -> GateKey {
    house().gate(name)
}

pub fn openings(sup: &Supervisor) -> Vec<f64> {
    sup.gates().map(|g| g.opening()).collect()
}

/// Audit text of every gate, in key order.
pub fn last_commands(sup: &Supervisor) -> Vec<Option<&str>> {
    sup.gates()
        .map(|g| g.last_command().map(|c| c.text.as_str()))
        .collect()
}
