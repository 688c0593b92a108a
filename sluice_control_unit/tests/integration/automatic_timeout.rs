//! Integration test: automatic loop failure timeout.

use std::time::{Duration, Instant};

use sluice_common::gate::state::{OperatingMode, RunState};
use sluice_common::hydraulics::{DeviationBand, HydroReading};
use sluice_control_unit::config::load_config_from_str;
use sluice_control_unit::control::outcome::CommandOutcome;
use sluice_control_unit::cycle::{CycleReport, Supervisor};
use sluice_control_unit::state::session::ControlSession;

use super::{house, last_commands, ready_session, supervisor};

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

/// Plan 10 m³/s at K 0.5 while 10 m³/s keep flowing: a -50 % excursion.
fn diverging(t0: Instant) -> (Supervisor, ControlSession) {
    let mut sup = supervisor();
    let s = ready_session(OperatingMode::RemoteAutomatic, t0);
    sup.set_q_plan(&house(), 10.0).unwrap();
    sup.set_k_target(&house(), 0.5).unwrap();
    sup.record_reading(
        &house(),
        HydroReading {
            q_actual: 10.0,
            h_actual: 1.1,
        },
    )
    .unwrap();
    (sup, s)
}

/// Tick with an attentive operator, so the idle logout never kicks in.
fn tick(sup: &mut Supervisor, s: &mut ControlSession, now: Instant) -> CycleReport {
    s.touch(now);
    sup.step(s, now, 1.0)
}

#[test]
fn fires_after_one_hour_and_latches() {
    let t0 = Instant::now();
    let (mut sup, mut s) = diverging(t0);
    assert_eq!(sup.start_automatic(&mut s, &house(), t0), Ok(CommandOutcome::Accepted));

    let report = tick(&mut sup, &mut s, t0);
    let h = &report.gatehouses[0];
    assert!((h.k_deviation_pct + 50.0).abs() < 1e-9);
    assert_eq!(h.band, DeviationBand::Alarm);
    assert!(!h.alarm_active);

    tick(&mut sup, &mut s, t0 + secs(1800));
    let report = tick(&mut sup, &mut s, t0 + secs(3599));
    assert_eq!(report.gatehouses[0].automatic, RunState::Running);
    assert!(!report.gatehouses[0].alarm_active);

    let report = tick(&mut sup, &mut s, t0 + secs(3600));
    let h = &report.gatehouses[0];
    assert!(h.alarm_active);
    assert_eq!(h.automatic, RunState::Stopped);
    assert!(h.alarm_message.as_deref().is_some_and(|m| m.contains("-50.00")));
    assert_eq!(sup.stats().alarms_fired, 1);

    // Back inside tolerance: the alarm stays until cleared and never re-fires.
    sup.record_reading(
        &house(),
        HydroReading {
            q_actual: 5.0,
            h_actual: 0.8,
        },
    )
    .unwrap();
    for m in 1..=5 {
        let report = tick(&mut sup, &mut s, t0 + secs(3600 + m * 600));
        assert!(report.gatehouses[0].alarm_active);
    }
    assert_eq!(sup.stats().alarms_fired, 1);
}

#[test]
fn restart_requires_clear() {
    let t0 = Instant::now();
    let (mut sup, mut s) = diverging(t0);
    sup.start_automatic(&mut s, &house(), t0).unwrap();
    tick(&mut sup, &mut s, t0);
    tick(&mut sup, &mut s, t0 + secs(3600));
    assert!(sup.automatic(&house()).unwrap().alarm().is_active());

    let later = t0 + secs(3700);
    s.touch(later);
    assert_eq!(
        sup.start_automatic(&mut s, &house(), later),
        Ok(CommandOutcome::Rejected("alarm active; clear alarm before start"))
    );

    assert_eq!(sup.clear_alarm(&house()), Ok(true));
    assert_eq!(sup.clear_alarm(&house()), Ok(false));
    assert_eq!(sup.start_automatic(&mut s, &house(), later), Ok(CommandOutcome::Accepted));

    // The timer restarts with the new run.
    let report = tick(&mut sup, &mut s, later);
    assert_eq!(report.gatehouses[0].automatic, RunState::Running);
    let report = tick(&mut sup, &mut s, later + secs(3599));
    assert!(!report.gatehouses[0].alarm_active);
    let report = tick(&mut sup, &mut s, later + secs(3600));
    assert!(report.gatehouses[0].alarm_active);
    assert_eq!(sup.stats().alarms_fired, 2);
}

#[test]
fn pause_keeps_first_execution() {
    let t0 = Instant::now();
    let (mut sup, mut s) = diverging(t0);
    sup.start_automatic(&mut s, &house(), t0).unwrap();
    tick(&mut sup, &mut s, t0);

    let paused_at = t0 + secs(10);
    s.touch(paused_at);
    assert_eq!(sup.pause_automatic(&mut s, &house(), paused_at), Ok(CommandOutcome::Accepted));
    let report = tick(&mut sup, &mut s, t0 + secs(1000));
    assert_eq!(report.gatehouses[0].automatic, RunState::Paused);

    let resumed_at = t0 + secs(3000);
    s.touch(resumed_at);
    sup.start_automatic(&mut s, &house(), resumed_at).unwrap();
    let report = tick(&mut sup, &mut s, t0 + secs(3600));
    assert!(report.gatehouses[0].alarm_active);
}

#[test]
fn stop_then_start_restarts_timer() {
    let t0 = Instant::now();
    let (mut sup, mut s) = diverging(t0);
    sup.start_automatic(&mut s, &house(), t0).unwrap();
    tick(&mut sup, &mut s, t0);

    let restart = t0 + secs(3000);
    s.touch(restart);
    sup.stop_automatic(&mut s, &house(), restart).unwrap();
    sup.start_automatic(&mut s, &house(), restart).unwrap();
    tick(&mut sup, &mut s, restart);

    let report = tick(&mut sup, &mut s, t0 + secs(3600));
    assert!(!report.gatehouses[0].alarm_active);
    let report = tick(&mut sup, &mut s, restart + secs(3600));
    assert!(report.gatehouses[0].alarm_active);
}

#[test]
fn converging_loop_never_alarms() {
    let t0 = Instant::now();
    let mut sup = supervisor();
    let mut s = ready_session(OperatingMode::RemoteAutomatic, t0);
    sup.record_reading(
        &house(),
        HydroReading {
            q_actual: 9.6,
            h_actual: 1.22,
        },
    )
    .unwrap();
    sup.start_automatic(&mut s, &house(), t0).unwrap();
    for minute in 0..=120 {
        let report = tick(&mut sup, &mut s, t0 + secs(minute * 60));
        assert!(!report.gatehouses[0].alarm_active);
    }
    assert_eq!(sup.stats().alarms_fired, 0);
    assert_eq!(sup.automatic(&house()).unwrap().run_state(), RunState::Running);
}

#[test]
fn unattended_loop_reaches_alarm() {
    const ONE_GATE: &str = r#"
[[stations]]
name = "Hantan"

[[stations.gatehouses]]
name = "GH-1"
q_plan = 10.0
k_target = 0.5

[[stations.gatehouses.gates]]
name = "Gate 1"
max_open_m = 2.0
initial_opening_pct = 40.0
"#;
    let mut sup = Supervisor::new(&load_config_from_str(ONE_GATE).unwrap());
    let t0 = Instant::now();
    let mut s = ready_session(OperatingMode::RemoteAutomatic, t0);
    sup.record_reading(
        &house(),
        HydroReading {
            q_actual: 10.0,
            h_actual: 1.1,
        },
    )
    .unwrap();
    assert_eq!(sup.start_automatic(&mut s, &house(), t0), Ok(CommandOutcome::Accepted));
    assert!(sup.control().idle_timeout_s < 3600);

    // Nobody touches the session; the host still asks for idle expiry.
    let mut report = sup.advance(&mut s, t0);
    for i in 1..=3700 {
        let now = t0 + secs(i);
        let logged_out = sup.expire_idle(&mut s, now);
        if i <= 3600 {
            assert!(!logged_out, "logged out at {i}s with the loop running");
        }
        report = sup.advance(&mut s, now);
    }

    let h = &report.gatehouses[0];
    assert!(h.alarm_active);
    assert_eq!(h.automatic, RunState::Stopped);
    assert_eq!(sup.stats().alarms_fired, 1);
    assert_eq!(sup.stats().forced_stops, 0);
    assert_eq!(last_commands(&sup), [Some("AUTO STOP (alarm)")]);
    // Once the loop stopped the idle operator was logged out.
    assert!(!s.logged_in);
}

#[test]
fn loop_commands_are_audited_on_every_gate() {
    let t0 = Instant::now();
    let (mut sup, mut s) = diverging(t0);
    sup.start_automatic(&mut s, &house(), t0).unwrap();
    assert_eq!(last_commands(&sup), [Some("AUTO START"); 3]);

    tick(&mut sup, &mut s, t0 + secs(5));
    assert!(sup.gates().all(|g| g.last_command().is_some_and(|c| c.at == t0)));

    sup.pause_automatic(&mut s, &house(), t0 + secs(10)).unwrap();
    assert_eq!(last_commands(&sup), [Some("AUTO PAUSE"); 3]);
    sup.stop_automatic(&mut s, &house(), t0 + secs(20)).unwrap();
    assert_eq!(last_commands(&sup), [Some("AUTO STOP"); 3]);

    // A rejected command leaves the audit alone.
    assert!(matches!(
        sup.pause_automatic(&mut s, &house(), t0 + secs(30)),
        Ok(CommandOutcome::Rejected(_))
    ));
    assert_eq!(last_commands(&sup), [Some("AUTO STOP"); 3]);

    sup.start_automatic(&mut s, &house(), t0 + secs(40)).unwrap();
    tick(&mut sup, &mut s, t0 + secs(40));
    tick(&mut sup, &mut s, t0 + secs(40 + 3600));
    assert_eq!(last_commands(&sup), [Some("AUTO STOP (alarm)"); 3]);
}
