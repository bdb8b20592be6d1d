//! Contact-form to SMTP relay.
//!
//! [`Config`] is loaded from a RON file plus environment overrides, and
//! [`Missive`] wires the relay, the origin policy and the HTTP server together.

pub mod config;
pub mod controller;

pub use config::{Config, VerifyFailurePolicy};
pub use controller::Missive;
