use std::sync::Arc;

use missive_common::RuntimeMode;
use missive_mail::{Composer, Dispatcher};

use crate::{HealthChecker, OriginPolicy};

/// Everything a request needs, built once at startup and shared read-only.
#[derive(Clone)]
pub struct AppState {
    pub policy: OriginPolicy,
    pub composer: Composer,
    pub dispatcher: Dispatcher,
    pub health: Arc<HealthChecker>,
    pub mode: RuntimeMode,
}

impl AppState {
    pub const fn new(
        policy: OriginPolicy,
        composer: Composer,
        dispatcher: Dispatcher,
        health: Arc<HealthChecker>,
        mode: RuntimeMode,
    ) -> Self {
        Self {
            policy,
            composer,
            dispatcher,
            health,
            mode,
        }
    }
}
