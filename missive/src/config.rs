//! Process configuration.
//!
//! Precedence, lowest first: built-in defaults, the RON file, environment
//! variables. The file is found the same way on every start:
//!
//! 1. `--config` / `MISSIVE_CONFIG`, which must exist if given
//! 2. `./missive.config.ron`
//! 3. `/etc/missive/missive.config.ron`
//!
//! No file at all is fine; a deployment configured purely through the
//! environment is the common case.

use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
    str::FromStr,
};

use missive_common::{ConfigError, RuntimeMode};
use missive_http::{AllowList, HttpConfig};
use missive_mail::{MailConfig, RelayConfig, RelaySecurity};
use serde::Deserialize;

const DEFAULT_PATHS: [&str; 2] = ["./missive.config.ron", "/etc/missive/missive.config.ron"];

/// What to do when the relay cannot be verified at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyFailurePolicy {
    /// Refuse to start.
    #[default]
    Exit,
    /// Serve anyway; readiness reports not ready.
    Continue,
}

impl FromStr for VerifyFailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exit" => Ok(Self::Exit),
            "continue" => Ok(Self::Continue),
            other => Err(ConfigError::invalid(
                "on_verify_failure",
                format!("expected `exit` or `continue`, got `{other}`"),
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub mail: MailConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub mode: RuntimeMode,

    #[serde(default)]
    pub on_verify_failure: VerifyFailurePolicy,
}

impl Config {
    /// Load, apply the process environment, and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, an environment
    /// value is unusable, or the result is incomplete.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match find_config_file(explicit)? {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid RON.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        ron::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Override fields from environment variables.
    ///
    /// `lookup` stands in for `std::env::var`. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or enumerated value does not parse.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(host) = get("SMTP_HOST") {
            self.relay.host = host;
        }

        if let Some(port) = get("SMTP_PORT") {
            self.relay.port = parse_env("SMTP_PORT", &port)?;
        }

        if let Some(secure) = get("SMTP_SECURE") {
            self.relay.security = match secure.trim().to_ascii_lowercase().as_str() {
                "true" => RelaySecurity::Tls,
                "false" => RelaySecurity::StartTls,
                _ => secure.parse()?,
            };
        }

        if let Some(username) = get("SMTP_USER") {
            self.relay.username = Some(username);
        }

        if let Some(password) = get("SMTP_PASS") {
            self.relay.password = Some(password);
        }

        if let Some(sender) = get("MAIL_FROM") {
            self.mail.sender = Some(sender);
        }

        if let Some(recipient) = get("MAIL_TO") {
            self.mail.recipient = Some(recipient);
        }

        if let Some(timeout) = get("DISPATCH_TIMEOUT_SECS") {
            self.mail.dispatch_timeout_secs = parse_env("DISPATCH_TIMEOUT_SECS", &timeout)?;
        }

        if let Some(origins) = get("ALLOWED_ORIGINS") {
            self.http.cors.extra_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(ToString::to_string)
                .collect();
        }

        if let Some(port) = get("PORT") {
            let port: u16 = parse_env("PORT", &port)?;
            self.http.listen_address = format!("[::]:{port}");
        }

        if let Some(mode) = get("MISSIVE_MODE") {
            self.mode = mode.parse()?;
        }

        if let Some(policy) = get("ON_VERIFY_FAILURE") {
            self.on_verify_failure = policy.parse()?;
        }

        Ok(())
    }

    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.relay.validate()?;
        self.mail.validate(&self.relay)?;

        AllowList::from_config(&self.http.cors)
            .map_err(|e| ConfigError::invalid("http.cors.trusted_origins", e.to_string()))?;

        if self.http.request_timeout_secs <= self.mail.dispatch_timeout_secs {
            return Err(ConfigError::invalid(
                "http.request_timeout_secs",
                format!(
                    "must be longer than mail.dispatch_timeout_secs ({}s)",
                    self.mail.dispatch_timeout_secs
                ),
            ));
        }

        Ok(())
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid(key, format!("`{value}`: {e}")))
}

/// Find the configuration file, if any.
///
/// # Errors
///
/// Returns an error if an explicitly requested file does not exist.
pub fn find_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(Some(path.to_path_buf()));
        }

        return Err(ConfigError::Read {
            path: path.to_path_buf(),
            source: io::Error::from(io::ErrorKind::NotFound),
        });
    }

    Ok(DEFAULT_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists()))
}
