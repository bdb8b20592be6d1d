//! Health check logic

use std::sync::atomic::{AtomicBool, Ordering};

/// Tracks whether the relay passed its startup verification.
///
/// Liveness never depends on this; only readiness does.
#[derive(Debug, Default)]
pub struct HealthChecker {
    relay_ready: AtomicBool,
}

impl HealthChecker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the relay as verified (or not)
    pub fn set_relay_ready(&self, ready: bool) {
        self.relay_ready.store(ready, Ordering::Relaxed);
        tracing::debug!(ready, "Relay readiness updated");
    }

    /// Check if the application is alive
    ///
    /// Answering at all is proof of life.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        true
    }

    /// Check if the application can be expected to deliver submissions
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.relay_ready.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn get_status(&self) -> HealthStatus {
        let ready = self.is_ready();

        HealthStatus {
            status: if ready { "ready" } else { "degraded" },
            alive: self.is_alive(),
            relay_ready: ready,
        }
    }
}

/// Detailed health status information
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub alive: bool,
    pub relay_ready: bool,
}
