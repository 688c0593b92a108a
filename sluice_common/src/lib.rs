//! Sluice Common Library
//!
//! Shared types, constants and configuration loading utilities for all
//! sluice workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Canonical control constants (rates, tolerances, timeouts)
//! - [`config`] - Configuration loading traits and types
//! - [`convert`] - Percent ↔ metre opening conversions
//! - [`hydraulics`] - Q → H rating model and deviation math
//! - [`gate`] - Gate, gatehouse and session shared types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use sluice_common::prelude::*;
//!
//! let m = opening_m_from_pct(50.0, 2.0);
//! assert_eq!(m, 1.0);
//! ```

pub mod config;
pub mod consts;
pub mod convert;
pub mod gate;
pub mod hydraulics;
pub mod prelude;
