//! Integration test: end-to-end operator scenarios.

use std::time::Instant;

use sluice_common::gate::state::{Direction, MotionState, OperatingMode, RunState};
use sluice_common::hydraulics::{DeviationBand, HydroReading};
use sluice_control_unit::control::manual::{ManualCommand, SetPoint};
use sluice_control_unit::control::outcome::CommandOutcome;

use super::{gate, house, ready_session, supervisor};

#[test]
fn set_point_40_to_70() {
    let mut sup = supervisor();
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteManual, t0);

    let out = sup
        .issue_manual(&mut s, &gate("Gate 1"), ManualCommand::Set(SetPoint::Percent(70.0)), t0)
        .unwrap();
    assert_eq!(out, CommandOutcome::Accepted);

    sup.step(&mut s, t0, 1.0);
    let g = sup.gate(&gate("Gate 1")).unwrap();
    assert_eq!(g.opening_pct(), 42);
    assert_eq!(g.motion(), MotionState::Opening);

    for _ in 1..15 {
        sup.step(&mut s, t0, 1.0);
    }
    let g = sup.gate(&gate("Gate 1")).unwrap();
    assert_eq!(g.opening_pct(), 70);
    assert_eq!(g.opening_m(), 1.4);
    assert_eq!(g.motion(), MotionState::Stopped);

    // Further ticks hold the target.
    sup.step(&mut s, t0, 1.0);
    assert_eq!(sup.gate(&gate("Gate 1")).unwrap().opening(), 70.0);
}

#[test]
fn set_in_metres() {
    let mut sup = supervisor();
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteManual, t0);
    sup.issue_manual(&mut s, &gate("Gate 1"), ManualCommand::Set(SetPoint::Meters(0.9)), t0)
        .unwrap();
    for _ in 0..10 {
        sup.step(&mut s, t0, 1.0);
    }
    let g = sup.gate(&gate("Gate 1")).unwrap();
    assert_eq!(g.opening_pct(), 45);
    assert_eq!(g.opening_m(), 0.9);
}

#[test]
fn jog_raise_for_one_minute() {
    let mut sup = supervisor();
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteManual, t0);
    sup.issue_manual(&mut s, &gate("Gate 2"), ManualCommand::Raise, t0)
        .unwrap();

    for _ in 0..60 {
        sup.step(&mut s, t0, 1.0);
    }
    let g = sup.gate(&gate("Gate 2")).unwrap();
    assert_eq!(g.opening_pct(), 30);
    assert_eq!(g.motion(), Direction::Raise.motion());

    sup.issue_manual(&mut s, &gate("Gate 2"), ManualCommand::Stop, t0)
        .unwrap();
    sup.step(&mut s, t0, 1.0);
    let g = sup.gate(&gate("Gate 2")).unwrap();
    assert_eq!(g.opening_pct(), 30);
    assert_eq!(g.motion(), MotionState::Stopped);
    assert_eq!(g.last_command().map(|c| c.text.as_str()), Some("STOP"));
}

#[test]
fn demand_example_reports_small_deviation() {
    let mut sup = supervisor();
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteAutomatic, t0);
    sup.record_reading(
        &house(),
        HydroReading {
            q_actual: 9.5,
            h_actual: 1.2,
        },
    )
    .unwrap();
    assert_eq!(sup.start_automatic(&mut s, &house(), t0), Ok(CommandOutcome::Accepted));

    let report = sup.step(&mut s, t0, 1.0);
    let h = &report.gatehouses[0];
    assert!((h.k_actual - 0.7917).abs() < 1e-4);
    assert!((h.k_deviation_pct - 0.83).abs() < 0.01);
    assert!((h.h_plan - 1.22).abs() < 1e-9);
    assert_eq!(h.band, DeviationBand::Ok);
    assert_eq!(h.automatic, RunState::Running);
    assert!(!h.alarm_active);

    let house_state = sup.gatehouse(&house()).unwrap();
    assert!((house_state.q_target() - 9.6).abs() < 1e-9);
    // q_target 9.6 of 20 → 48 %; Gate 1 steps up from 40.
    assert_eq!(sup.gate(&gate("Gate 1")).unwrap().opening(), 42.0);
}

#[test]
fn plan_updates_flow_into_report() {
    let mut sup = supervisor();
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteAutomatic, t0);
    sup.set_q_plan(&house(), 10.0).unwrap();
    sup.set_k_target(&house(), 1.4).unwrap();
    let report = sup.step(&mut s, t0, 1.0);
    let h = &report.gatehouses[0];
    assert_eq!(h.q_plan, 10.0);
    assert_eq!(h.k_target, 1.0);
    assert!((h.h_plan - 1.10).abs() < 1e-9);
}
