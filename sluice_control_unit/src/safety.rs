//! Safety module root.
//!
//! Interlock evaluation over the operator session.

pub mod interlock;
