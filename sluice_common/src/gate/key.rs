//! Typed catalog keys.
//!
//! A gate is addressed by station → gatehouse → gate. Keys order
//! lexicographically in that sequence, so a `BTreeMap<GateKey, _>` keeps
//! the gates of one gatehouse adjacent.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one gatehouse (control group) within a station.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GateHouseKey {
    pub station: String,
    pub gatehouse: String,
}

impl GateHouseKey {
    pub fn new(station: impl Into<String>, gatehouse: impl Into<String>) -> Self {
        Self {
            station: station.into(),
            gatehouse: gatehouse.into(),
        }
    }

    /// Key of a gate belonging to this gatehouse.
    pub fn gate(&self, gate: impl Into<String>) -> GateKey {
        GateKey {
            station: self.station.clone(),
            gatehouse: self.gatehouse.clone(),
            gate: gate.into(),
        }
    }
}

impl fmt::Display for GateHouseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.station, self.gatehouse)
    }
}

/// Identifies one gate leaf.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GateKey {
    pub station: String,
    pub gatehouse: String,
    pub gate: String,
}

impl GateKey {
    pub fn new(
        station: impl Into<String>,
        gatehouse: impl Into<String>,
        gate: impl Into<String>,
    ) -> Self {
        Self {
            station: station.into(),
            gatehouse: gatehouse.into(),
            gate: gate.into(),
        }
    }

    /// Key of the gatehouse this gate belongs to.
    pub fn gatehouse_key(&self) -> GateHouseKey {
        GateHouseKey::new(self.station.clone(), self.gatehouse.clone())
    }

    /// Whether this gate belongs to `house`.
    pub fn belongs_to(&self, house: &GateHouseKey) -> bool {
        self.station == house.station && self.gatehouse == house.gatehouse
    }
}

impl fmt::Display for GateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.station, self.gatehouse, self.gate)
    }
}
