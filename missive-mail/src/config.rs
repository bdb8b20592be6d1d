//! Relay and mail configuration

use std::{fmt, str::FromStr, time::Duration};

use lettre::{Address, transport::smtp::authentication::Credentials};
use missive_common::ConfigError;
use serde::Deserialize;

/// How the connection to the relay is secured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelaySecurity {
    /// Plain connection upgraded with STARTTLS (submission port 587).
    #[default]
    StartTls,
    /// Implicit TLS from the first byte (port 465).
    Tls,
    /// No TLS at all. Only for local relays and tests.
    None,
}

impl FromStr for RelaySecurity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starttls" => Ok(Self::StartTls),
            "tls" | "smtps" => Ok(Self::Tls),
            "none" | "plain" => Ok(Self::None),
            other => Err(ConfigError::invalid(
                "relay.security",
                format!("expected `starttls`, `tls` or `none`, got `{other}`"),
            )),
        }
    }
}

/// Connection settings for the upstream SMTP relay.
#[derive(Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub security: RelaySecurity,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Per-command timeout on the SMTP conversation.
    ///
    /// Default: 30 seconds
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

impl RelayConfig {
    /// Credentials for AUTH, if a username is configured.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        self.username.as_ref().map(|username| {
            Credentials::new(username.clone(), self.password.clone().unwrap_or_default())
        })
    }

    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// # Errors
    ///
    /// Returns an error if the host is empty, the port is zero, or a password
    /// is set without a username.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingField("relay.host"));
        }

        if self.port == 0 {
            return Err(ConfigError::invalid("relay.port", "must be between 1-65535"));
        }

        if self.password.is_some() && self.username.is_none() {
            return Err(ConfigError::invalid(
                "relay.password",
                "a password was given without a username",
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("command_timeout_secs", &self.command_timeout_secs)
            .finish()
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            security: RelaySecurity::default(),
            username: None,
            password: None,
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

/// Addressing and dispatch settings for the notification mail.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Relay-owned address placed in `From`. Falls back to the relay username.
    #[serde(default)]
    pub sender: Option<String>,

    /// Where notifications are delivered.
    #[serde(default)]
    pub recipient: Option<String>,

    /// Upper bound on a single dispatch, including connecting to the relay.
    ///
    /// Default: 30 seconds
    #[serde(default = "default_dispatch_timeout_secs")]
    pub dispatch_timeout_secs: u64,
}

impl MailConfig {
    #[must_use]
    pub const fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }

    /// The address used in `From`.
    ///
    /// # Errors
    ///
    /// Returns an error if neither a sender nor a relay username is set.
    pub fn sender_address<'a>(&'a self, relay: &'a RelayConfig) -> Result<&'a str, ConfigError> {
        self.sender
            .as_deref()
            .or(relay.username.as_deref())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingField("mail.sender"))
    }

    /// # Errors
    ///
    /// Returns an error if no recipient is configured.
    pub fn recipient_address(&self) -> Result<&str, ConfigError> {
        self.recipient
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingField("mail.recipient"))
    }

    /// # Errors
    ///
    /// Returns an error if an address is missing or unparsable, or the
    /// timeout is zero.
    pub fn validate(&self, relay: &RelayConfig) -> Result<(), ConfigError> {
        check_address("mail.sender", self.sender_address(relay)?)?;
        check_address("mail.recipient", self.recipient_address()?)?;

        if self.dispatch_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "mail.dispatch_timeout_secs",
                "must be greater than zero",
            ));
        }

        Ok(())
    }
}

fn check_address(field: &'static str, address: &str) -> Result<(), ConfigError> {
    address
        .parse::<Address>()
        .map(|_| ())
        .map_err(|e| ConfigError::invalid(field, format!("`{address}`: {e}")))
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            sender: None,
            recipient: None,
            dispatch_timeout_secs: default_dispatch_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "smtp.gmail.com".to_string()
}

const fn default_port() -> u16 {
    587
}

const fn default_command_timeout_secs() -> u64 {
    30
}

const fn default_dispatch_timeout_secs() -> u64 {
    30
}
