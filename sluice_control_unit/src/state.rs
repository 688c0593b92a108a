//! Runtime state module root.
//!
//! Gate leaves, gatehouse hydrology and the operator session.

pub mod gate;
pub mod gatehouse;
pub mod session;
