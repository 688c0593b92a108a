//! Demo site and starting-state seeding.

use rand::Rng;
use sluice_common::config::SharedConfig;
use sluice_common::gate::config::{GateConfig, GateHouseConfig, SluiceConfig, StationConfig};
use sluice_common::gate::state::GateClass;
use tracing::debug;

/// Give every gate without an `initial_opening_pct` a random whole-percent
/// opening. Returns how many gates were seeded.
pub fn seed_openings<R: Rng>(config: &mut SluiceConfig, rng: &mut R) -> usize {
    let mut seeded = 0;
    let houses = config
        .stations
        .iter_mut()
        .flat_map(|s| s.gatehouses.iter_mut());
    for house in houses {
        for gate in house.gates.iter_mut().filter(|g| g.initial_opening_pct.is_none()) {
            let pct = rng.gen_range(0.0..=100.0_f64).round();
            debug!("Seeded {}/{} at {pct}%", house.name, gate.name);
            gate.initial_opening_pct = Some(pct);
            seeded += 1;
        }
    }
    seeded
}

fn gate(name: &str, max_open_m: f64, class: GateClass) -> GateConfig {
    GateConfig {
        name: name.to_string(),
        max_open_m,
        class,
        initial_opening_pct: None,
    }
}

/// Two stations with three gatehouses, used when no config file exists.
pub fn demo_config() -> SluiceConfig {
    let house = |name: &str, q_plan: f64, k_target: f64, q_full_open: f64, gates| GateHouseConfig {
        name: name.to_string(),
        q_plan,
        k_target,
        q_full_open,
        gates,
    };

    SluiceConfig {
        shared: SharedConfig {
            service_name: "sluice-demo".to_string(),
            ..SharedConfig::default()
        },
        stations: vec![
            StationConfig {
                name: "Hantan".to_string(),
                gatehouses: vec![
                    house(
                        "GH-1",
                        12.0,
                        0.8,
                        20.0,
                        vec![
                            gate("Gate 1", 2.0, GateClass::Standard),
                            gate("Gate 2", 2.0, GateClass::Standard),
                        ],
                    ),
                    house(
                        "GH-2",
                        8.0,
                        1.0,
                        15.0,
                        vec![gate("Gate 1", 1.5, GateClass::NoManual)],
                    ),
                ],
            },
            StationConfig {
                name: "Imjin".to_string(),
                gatehouses: vec![house(
                    "GH-1",
                    25.0,
                    0.6,
                    40.0,
                    vec![
                        gate("Gate 1", 3.0, GateClass::Standard),
                        gate("Gate 2", 3.0, GateClass::Standard),
                        gate("Gate 3", 3.0, GateClass::Standard),
                    ],
                )],
            },
        ],
        ..SluiceConfig::default()
    }
}
