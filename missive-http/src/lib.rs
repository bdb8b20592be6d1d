//! HTTP surface for missive
//!
//! Provides the contact endpoint and health probes:
//!
//! - `POST /contact`: validate, compose and relay a contact form submission
//! - `OPTIONS <any path>`: CORS preflight, always 204
//! - `GET /health`: liveness, 200 whenever the process answers
//! - `GET /health/ready`: readiness, 503 until the relay has been verified
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use missive_http::{AppState, HttpConfig, HttpServer};
//!
//! # async fn example(state: AppState) -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpConfig::default();
//! let server = HttpServer::new(&config, Arc::new(state)).await?;
//!
//! let (_tx, rx) = tokio::sync::broadcast::channel(1);
//! server.serve(rx).await?;
//! # Ok(())
//! # }
//! ```

mod checker;
mod config;
mod cors;
mod error;
mod handlers;
mod origin;
mod server;
mod state;

pub use checker::{HealthChecker, HealthStatus};
pub use config::{CorsConfig, HttpConfig};
pub use error::{ApiError, HttpError};
pub use origin::{
    Admission, AllowList, OriginDecision, OriginPattern, OriginPatternError, OriginPolicy,
};
pub use server::{HttpServer, router};
pub use state::AppState;
