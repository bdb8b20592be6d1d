//! Shared plumbing for the missive crates: logging, configuration errors and
//! process-wide signals.

pub mod error;
pub mod logging;

use std::str::FromStr;

use serde::Deserialize;

pub use error::ConfigError;
pub use tracing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Shutdown,
}

/// Controls how much of an internal failure is echoed back to HTTP clients.
///
/// Production never leaks error detail; development adds the underlying cause
/// to 500 responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    #[default]
    Production,
    Development,
}

impl RuntimeMode {
    #[must_use]
    pub const fn exposes_error_detail(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for RuntimeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            other => Err(ConfigError::invalid(
                "mode",
                format!("expected `production` or `development`, got `{other}`"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_defaults_to_production() {
        assert_eq!(RuntimeMode::default(), RuntimeMode::Production);
        assert!(!RuntimeMode::default().exposes_error_detail());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("development".parse::<RuntimeMode>().unwrap(), RuntimeMode::Development);
        assert_eq!(" Prod ".parse::<RuntimeMode>().unwrap(), RuntimeMode::Production);
        assert!("staging".parse::<RuntimeMode>().is_err());
    }
}
