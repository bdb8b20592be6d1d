//! Error types for validation and dispatch.
//!
//! Validation errors are safe to show to the submitter. Dispatch errors are
//! not: they can carry relay host names, SMTP replies and credential failures,
//! so callers log them and answer with a generic message.

use std::time::Duration;

use thiserror::Error;

/// Why a submission was refused before any mail was composed.
///
/// The `Display` text is the message returned to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// One of name, email, subject or message is absent or empty.
    #[error("All fields are required")]
    MissingFields,

    /// The email address is not of the form `local@domain.tld`.
    #[error("Invalid email format")]
    InvalidEmail,
}

impl ValidationError {
    /// Stable machine-readable code for logs.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MissingFields => "MISSING_FIELDS",
            Self::InvalidEmail => "INVALID_EMAIL",
        }
    }
}

/// Failure to hand a composed message to the relay.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// An address could not be turned into a mailbox.
    #[error("Invalid address {address}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    /// The MIME message could not be assembled.
    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    /// Connection, TLS, authentication or SMTP-level failure.
    #[error("Relay transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The relay accepted the connection but failed the liveness test.
    #[error("Relay did not pass the connection test")]
    VerificationFailed,

    /// No answer from the relay within the configured bound.
    #[error("Relay did not respond within {0:?}")]
    Timeout(Duration),

    /// The task running the send panicked or was aborted.
    #[error("Dispatch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Failure reported by a non-SMTP relay implementation.
    #[error("Relay error: {0}")]
    Relay(String),
}

impl DispatchError {
    /// Returns `true` if a later resubmission could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_transient() || e.is_timeout(),
            Self::Timeout(_) => true,
            _ => false,
        }
    }
}
