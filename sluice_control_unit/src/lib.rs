//! # Sluice Control Unit Library
//!
//! Supervisory control core for water gates. Each tick reads the operator
//! session, evaluates the interlock, runs the controller of the selected
//! operating mode and advances every gate one rate-limited step.
//!
//! ## Architecture Levels
//!
//! 1. **ControlSession**: operator context (mode, trips, role, login)
//! 2. **Interlock**: single allow/deny decision over the session
//! 3. **Controllers**: Manual (per gate), Automatic and Program (per gatehouse)
//! 4. **Gate motion engine**: bounded step / rate travel per gate
//! 5. **Alarm tracker**: timeout escalation of the automatic loop
//!
//! ## Tick Model
//!
//! Nothing runs in the background. [`cycle::Supervisor::advance`] performs
//! exactly one step; the caller decides when (timer loop, test harness).

pub mod config;
pub mod control;
pub mod cycle;
pub mod error;
pub mod safety;
pub mod state;
