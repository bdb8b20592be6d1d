//! Submission validation, message composition and relay dispatch.
//!
//! A form post flows through this crate in three steps:
//!
//! 1. [`SubmissionCandidate::validate`] turns the raw payload into a
//!    [`Submission`], or reports a [`ValidationError`].
//! 2. [`Composer::compose`] derives the [`OutboundMessage`] that will be sent
//!    to the site owner.
//! 3. [`Dispatcher::dispatch`] hands the message to a [`Relay`] with a bounded
//!    wait. Nothing is ever retried.
//!
//! ```rust,no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use missive_mail::{Composer, Dispatcher, RelayConfig, SmtpRelay, SubmissionCandidate};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let relay = Arc::new(SmtpRelay::new(&RelayConfig::default())?);
//! let dispatcher = Dispatcher::new(relay, Duration::from_secs(30));
//! let composer = Composer::new("relay@example.com", "owner@example.com");
//!
//! let submission = SubmissionCandidate {
//!     name: Some("Jane".to_string()),
//!     email: Some("jane@example.com".to_string()),
//!     subject: Some("Hi".to_string()),
//!     message: Some("Hello there".to_string()),
//! }
//! .validate()?;
//!
//! dispatcher.dispatch(composer.compose(&submission)).await?;
//! # Ok(())
//! # }
//! ```

mod compose;
mod config;
mod dispatch;
mod error;
mod relay;
mod submission;

pub use compose::{Composer, OutboundMessage, Sender};
pub use config::{MailConfig, RelayConfig, RelaySecurity};
pub use dispatch::Dispatcher;
pub use error::{DispatchError, ValidationError};
pub use relay::{Relay, SmtpRelay};
pub use submission::{Submission, SubmissionCandidate, is_valid_email};
