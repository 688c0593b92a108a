//! Integration test: program mode patterns, positions and timed drives.

use std::time::{Duration, Instant};

use sluice_common::gate::state::{Direction, MotionState, OperatingMode, RunState};
use sluice_control_unit::config::load_config_from_str;
use sluice_control_unit::control::outcome::CommandOutcome;
use sluice_control_unit::control::program::{ActiveProgram, ProgramSource};
use sluice_control_unit::cycle::Supervisor;

use super::{SITE, gate, house, last_commands, openings, ready_session, supervisor};

#[test]
fn timed_drive_runs_for_its_duration() {
    let mut sup = supervisor();
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteProgram, t0);
    sup.select_program(
        &house(),
        ProgramSource::Drive {
            direction: Direction::Raise,
            minutes: 0.5,
        },
    )
    .unwrap();
    assert_eq!(sup.run_program(&mut s, &house(), t0), Ok(CommandOutcome::Accepted));

    for _ in 0..29 {
        sup.step(&mut s, t0, 1.0);
    }
    assert_eq!(sup.program(&house()).unwrap().run_state(), RunState::Running);
    assert_eq!(sup.stats().drives_completed, 0);

    let report = sup.step(&mut s, t0, 1.0);
    assert_eq!(report.gatehouses[0].program, RunState::Stopped);
    assert_eq!(sup.stats().drives_completed, 1);

    // 30 s at 0.3 m/min: 0.15 m of travel on every gate.
    let g1 = sup.gate(&gate("Gate 1")).unwrap();
    let g2 = sup.gate(&gate("Gate 2")).unwrap();
    let g3 = sup.gate(&gate("Gate 3")).unwrap();
    assert!((g1.opening() - 47.5).abs() < 1e-6);
    assert!((g2.opening() - 15.0).abs() < 1e-6);
    assert!((g3.opening() - 57.5).abs() < 1e-6);
    assert!(sup.gates().all(|g| g.motion() == MotionState::Stopped));

    let held = openings(&sup);
    sup.step(&mut s, t0, 1.0);
    assert_eq!(openings(&sup), held);
    assert_eq!(sup.stats().drives_completed, 1);
}

#[test]
fn short_drive_is_clamped_to_minimum() {
    let mut sup = supervisor();
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteProgram, t0);
    sup.select_program(
        &house(),
        ProgramSource::Drive {
            direction: Direction::Down,
            minutes: 0.0,
        },
    )
    .unwrap();
    match sup.program(&house()).unwrap().program() {
        Some(ActiveProgram::Drive { duration_s, .. }) => assert_eq!(*duration_s, 30.0),
        other => panic!("expected drive, got {other:?}"),
    }
    sup.run_program(&mut s, &house(), t0).unwrap();
    for _ in 0..30 {
        sup.step(&mut s, t0, 1.0);
    }
    // Gate 2 started closed and stays at the lower limit.
    assert_eq!(sup.gate(&gate("Gate 2")).unwrap().opening(), 0.0);
    assert_eq!(sup.stats().drives_completed, 1);
}

#[test]
fn demand_pattern_steps_all_gates() {
    let mut sup = supervisor();
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteProgram, t0);
    sup.select_program(&house(), ProgramSource::Pattern("p30".into()))
        .unwrap();
    sup.run_program(&mut s, &house(), t0).unwrap();

    for _ in 0..20 {
        sup.step(&mut s, t0, 1.0);
    }
    assert!(sup.gates().all(|g| g.opening_pct() == 30));
    assert!(sup.gates().all(|g| g.motion() == MotionState::Stopped));
    // Pattern programs keep running until stopped.
    assert_eq!(sup.program(&house()).unwrap().run_state(), RunState::Running);
    assert_eq!(sup.stop_program(&house(), t0), Ok(CommandOutcome::Accepted));
    assert_eq!(last_commands(&sup), [Some("PROGRAM STOP"); 3]);
}

#[test]
fn full_close_holds_position() {
    let mut sup = supervisor();
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteProgram, t0);
    sup.select_program(&house(), ProgramSource::Pattern("full_close".into()))
        .unwrap();
    sup.run_program(&mut s, &house(), t0).unwrap();
    let before = openings(&sup);
    for _ in 0..5 {
        sup.step(&mut s, t0, 1.0);
    }
    assert_eq!(openings(&sup), before);
}

#[test]
fn formula_pattern_tracks_plan() {
    let rule = r#"rule = { kind = "formula", base_pct = 20.0, gain = 2.5 }"#;
    let site = format!("{SITE}\n[[patterns]]\nid = \"storm\"\n{rule}\n");
    let mut sup = Supervisor::new(&load_config_from_str(&site).unwrap());
    assert_eq!(sup.catalog().len(), 1);

    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteProgram, t0);
    sup.select_program(&house(), ProgramSource::Pattern("storm".into()))
        .unwrap();
    sup.run_program(&mut s, &house(), t0).unwrap();
    // 20 + 2.5 * (12 - 10) = 25 %.
    for _ in 0..20 {
        sup.step(&mut s, t0, 1.0);
    }
    assert!(sup.gates().all(|g| g.opening_pct() == 25));
}

#[test]
fn run_needs_selection_and_program_mode() {
    let mut sup = supervisor();
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteProgram, t0);
    assert_eq!(
        sup.run_program(&mut s, &house(), t0),
        Ok(CommandOutcome::Rejected("no program selected"))
    );

    s.mode = OperatingMode::RemoteManual;
    sup.select_program(&house(), ProgramSource::Position(60.0))
        .unwrap();
    assert_eq!(
        sup.run_program(&mut s, &house(), t0),
        Ok(CommandOutcome::Rejected("not in remote program mode"))
    );
}

#[test]
fn reselect_stops_running_program() {
    let mut sup = supervisor();
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteProgram, t0);
    sup.select_program(&house(), ProgramSource::Position(100.0))
        .unwrap();
    sup.run_program(&mut s, &house(), t0).unwrap();
    sup.step(&mut s, t0, 1.0);

    sup.select_program(&house(), ProgramSource::Pattern("p10".into()))
        .unwrap();
    assert_eq!(sup.program(&house()).unwrap().run_state(), RunState::Stopped);
    let before = openings(&sup);
    sup.step(&mut s, t0, 1.0);
    assert_eq!(openings(&sup), before);
}

#[test]
fn program_commands_are_audited_on_every_gate() {
    let mut sup = supervisor();
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteProgram, t0);
    sup.select_program(&house(), ProgramSource::Pattern("p30".into()))
        .unwrap();
    sup.run_program(&mut s, &house(), t0).unwrap();
    assert_eq!(last_commands(&sup), [Some("PROGRAM p30 RUN"); 3]);

    // Recorded once per command, not refreshed by ticks.
    for i in 1..=5 {
        sup.step(&mut s, t0 + Duration::from_secs(i), 1.0);
    }
    assert!(sup.gates().all(|g| g.last_command().is_some_and(|c| c.at == t0)));

    sup.select_program(
        &house(),
        ProgramSource::Drive {
            direction: Direction::Raise,
            minutes: 0.5,
        },
    )
    .unwrap();
    sup.run_program(&mut s, &house(), t0).unwrap();
    assert_eq!(last_commands(&sup), [Some("PROGRAM DRIVE RAISE 0.5min RUN"); 3]);
    for _ in 0..30 {
        sup.step(&mut s, t0, 1.0);
    }
    assert_eq!(
        last_commands(&sup),
        [Some("PROGRAM DRIVE RAISE 0.5min COMPLETE"); 3]
    );
}

#[test]
fn nan_position_program_holds_gates() {
    let mut sup = supervisor();
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteProgram, t0);
    sup.select_program(&house(), ProgramSource::Position(f64::NAN))
        .unwrap();
    sup.run_program(&mut s, &house(), t0).unwrap();
    let before = openings(&sup);
    for _ in 0..10 {
        sup.step(&mut s, t0, 1.0);
    }
    assert_eq!(openings(&sup), before);
    assert_eq!(sup.program(&house()).unwrap().run_state(), RunState::Running);
    assert_eq!(last_commands(&sup), [Some("PROGRAM POS HOLD RUN"); 3]);
}
