//! Control engine root.
//!
//! Mode controllers sharing the gate motion engine, plus the timeout alarm
//! used by the closed loop.

pub mod alarm;
pub mod automatic;
pub mod manual;
pub mod outcome;
pub mod program;
