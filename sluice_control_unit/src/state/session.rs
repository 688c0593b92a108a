//! Operator session context.
//!
//! The session is passed explicitly into every tick and every command.
//! There is no process-wide "current operator".

use std::time::{Duration, Instant};

use sluice_common::gate::safety::ProtectionFlags;
use sluice_common::gate::state::{GeneratorState, OperatingMode, Role};
use tracing::info;

/// Panel and operator inputs the interlock is evaluated over.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControlSession {
    pub operator: Option<String>,
    pub mode: OperatingMode,
    pub protection_flags: ProtectionFlags,
    pub remote_enabled: bool,
    pub generator_state: GeneratorState,
    pub role: Role,
    pub logged_in: bool,
    pub last_activity: Option<Instant>,
}

impl ControlSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(&mut self, operator: impl Into<String>, role: Role, now: Instant) {
        let operator = operator.into();
        info!("Operator '{operator}' logged in as {role:?}");
        self.operator = Some(operator);
        self.role = role;
        self.logged_in = true;
        self.last_activity = Some(now);
    }

    /// Tear down the login. Panel state (mode, trips, remote) is kept.
    pub fn logout(&mut self) {
        if let Some(operator) = self.operator.take() {
            info!("Operator '{operator}' logged out");
        }
        self.role = Role::Viewer;
        self.logged_in = false;
        self.last_activity = None;
    }

    /// Mark operator activity.
    #[inline]
    pub fn touch(&mut self, now: Instant) {
        if self.logged_in {
            self.last_activity = Some(now);
        }
    }

    /// Log out when idle longer than `timeout`. Returns true if it did.
    pub fn expire_if_idle(&mut self, now: Instant, timeout: Duration) -> bool {
        if !self.logged_in {
            return false;
        }
        let idle = self
            .last_activity
            .map(|at| now.saturating_duration_since(at))
            .unwrap_or(Duration::ZERO);
        if idle < timeout {
            return false;
        }
        info!("Session idle for {}s, logging out", idle.as_secs());
        self.logout();
        true
    }
}
