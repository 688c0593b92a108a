//! Integration test: the interlock dominates every controller.

use std::time::{Duration, Instant};

use sluice_common::gate::safety::{BlockReason, ProtectionFlags};
use sluice_common::gate::state::{GeneratorState, OperatingMode, Role, RunState};
use sluice_control_unit::control::manual::ManualCommand;
use sluice_control_unit::control::outcome::CommandOutcome;
use sluice_control_unit::control::program::ProgramSource;
use sluice_control_unit::state::session::ControlSession;

use super::{gate, house, openings, ready_session, supervisor};

type Breaker = fn(&mut ControlSession);

/// One way to assert each interlock condition on a ready session.
fn breakers() -> [Breaker; 5] {
    [
        |s: &mut ControlSession| s.protection_flags = ProtectionFlags::EMERGENCY_STOP,
        |s: &mut ControlSession| s.generator_state = GeneratorState::Error,
        |s: &mut ControlSession| s.remote_enabled = false,
        |s: &mut ControlSession| s.role = Role::Viewer,
        |s: &mut ControlSession| s.logout(),
    ]
}

#[test]
fn viewer_in_remote_manual_is_blocked() {
    let mut sup = supervisor();
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteManual, t0);
    s.role = Role::Viewer;

    let out = sup
        .issue_manual(&mut s, &gate("Gate 1"), ManualCommand::Raise, t0)
        .unwrap();
    assert_eq!(out, CommandOutcome::Blocked(BlockReason::VIEWER_ROLE));

    let before = openings(&sup);
    let report = sup.step(&mut s, t0, 1.0);
    assert!(report.blocked);
    assert_eq!(openings(&sup), before);
}

#[test]
fn local_mode_blocks_everything() {
    let mut sup = supervisor();
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::Local, t0);
    let out = sup.start_automatic(&mut s, &house(), t0).unwrap();
    assert_eq!(out, CommandOutcome::Blocked(BlockReason::LOCAL_MODE));
    let before = openings(&sup);
    for _ in 0..5 {
        sup.step(&mut s, t0, 1.0);
    }
    assert_eq!(openings(&sup), before);
}

#[test]
fn manual_jog_stops_on_every_block_reason() {
    for breaker in breakers() {
        let mut sup = supervisor();
        let t0 = Instant::now();
        let mut s = ready_session(OperatingMode::RemoteManual, t0);
        sup.issue_manual(&mut s, &gate("Gate 1"), ManualCommand::Down, t0)
            .unwrap();
        sup.step(&mut s, t0, 1.0);

        breaker(&mut s);
        let before = openings(&sup);
        for _ in 0..10 {
            sup.step(&mut s, t0, 1.0);
        }
        assert_eq!(openings(&sup), before);
    }
}

#[test]
fn automatic_loop_stops_on_every_block_reason() {
    for breaker in breakers() {
        let mut sup = supervisor();
        let t0 = Instant::now();
        let mut s = ready_session(OperatingMode::RemoteAutomatic, t0);
        assert!(sup.start_automatic(&mut s, &house(), t0).unwrap().is_accepted());
        sup.step(&mut s, t0, 1.0);

        breaker(&mut s);
        let before = openings(&sup);
        sup.step(&mut s, t0, 1.0);
        assert_eq!(openings(&sup), before);
        let auto = sup.automatic(&house()).unwrap();
        assert_eq!(auto.run_state(), RunState::Stopped);
        assert!(!auto.alarm().is_active());
    }
}

#[test]
fn program_stops_on_block_and_stays_stopped() {
    let mut sup = supervisor();
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteProgram, t0);
    sup.select_program(&house(), ProgramSource::Position(90.0))
        .unwrap();
    assert!(sup.run_program(&mut s, &house(), t0).unwrap().is_accepted());
    sup.step(&mut s, t0, 1.0);

    s.protection_flags = ProtectionFlags::HIGH_WATER;
    sup.step(&mut s, t0, 1.0);
    let held = openings(&sup);

    // Clearing the trip does not restart the program.
    s.protection_flags = ProtectionFlags::empty();
    for _ in 0..5 {
        sup.step(&mut s, t0, 1.0);
    }
    assert_eq!(openings(&sup), held);
    assert_eq!(sup.program(&house()).unwrap().run_state(), RunState::Stopped);
    assert_eq!(sup.stats().forced_stops, 1);
}

#[test]
fn idle_logout_blocks_outputs() {
    let mut sup = supervisor();
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteManual, t0);
    sup.issue_manual(&mut s, &gate("Gate 2"), ManualCommand::Raise, t0)
        .unwrap();
    sup.step(&mut s, t0, 1.0);

    // Ticking alone never logs the operator out.
    let late = t0 + Duration::from_secs(sup.control().idle_timeout_s);
    sup.step(&mut s, late, 1.0);
    assert!(s.logged_in);

    assert!(sup.expire_idle(&mut s, late));
    let report = sup.step(&mut s, late, 1.0);
    assert!(!s.logged_in);
    assert!(report.reasons.contains(BlockReason::NOT_LOGGED_IN));
    let before = openings(&sup);
    sup.step(&mut s, late, 1.0);
    assert_eq!(openings(&sup), before);
}

#[test]
fn no_manual_gate_reports_not_supported() {
    let mut sup = supervisor();
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteManual, t0);
    let out = sup
        .issue_manual(&mut s, &gate("Gate 3"), ManualCommand::Raise, t0)
        .unwrap();
    assert_eq!(out, CommandOutcome::NotSupported);

    s.role = Role::Viewer;
    let out = sup
        .issue_manual(&mut s, &gate("Gate 3"), ManualCommand::Raise, t0)
        .unwrap();
    assert_eq!(out, CommandOutcome::NotSupported);
}
