//! Gate control shared types.
//!
//! All types shared between the control unit, the simulator and the
//! binaries live here. Organized by domain: state enums, protection
//! bitflags, typed catalog keys and configuration structures.

pub mod config;
pub mod key;
pub mod safety;
pub mod state;
