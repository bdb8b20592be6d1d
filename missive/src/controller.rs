use std::sync::Arc;

use missive_common::{ConfigError, Signal, internal, logging, tracing};
use missive_http::{AppState, HealthChecker, HttpServer, OriginPolicy};
use missive_mail::{Composer, Dispatcher, Relay, SmtpRelay};
use tokio::sync::broadcast;

use crate::{Config, VerifyFailurePolicy};

/// Owns the configuration and the shutdown broadcast, and starts everything
/// else from them.
pub struct Missive {
    config: Config,
    shutdown: broadcast::Sender<Signal>,
}

impl Missive {
    /// # Errors
    ///
    /// Returns an error if the configuration is incomplete.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let (shutdown, _receiver) = broadcast::channel(16);
        Ok(Self { config, shutdown })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.shutdown.subscribe()
    }

    /// Ask every running server to stop.
    pub fn shutdown(&self) {
        if self.shutdown.send(Signal::Shutdown).is_err() {
            tracing::debug!("Shutdown requested with nothing running");
        }
    }

    /// Build the shared request state around `relay`.
    ///
    /// The relay is verified once here. What happens on failure is decided
    /// by [`VerifyFailurePolicy`].
    ///
    /// # Errors
    ///
    /// Returns an error if the relay fails verification under
    /// [`VerifyFailurePolicy::Exit`], or the origin policy cannot be built.
    pub async fn app_state(&self, relay: Arc<dyn Relay>) -> anyhow::Result<AppState> {
        let config = &self.config;
        let dispatcher = Dispatcher::new(relay, config.mail.dispatch_timeout());
        let health = Arc::new(HealthChecker::new());

        match dispatcher.verify().await {
            Ok(()) => {
                health.set_relay_ready(true);
                internal!(
                    level = INFO,
                    host = %config.relay.host,
                    port = config.relay.port,
                    "Relay verified"
                );
            }
            Err(e) => {
                internal!(
                    level = ERROR,
                    host = %config.relay.host,
                    port = config.relay.port,
                    error = %e,
                    "Relay verification failed"
                );

                if config.on_verify_failure == VerifyFailurePolicy::Exit {
                    return Err(anyhow::Error::new(e).context("Relay verification failed"));
                }

                internal!(
                    level = WARN,
                    "Continuing without a verified relay; readiness will report not ready"
                );
            }
        }

        let composer = Composer::new(
            config.mail.sender_address(&config.relay)?,
            config.mail.recipient_address()?,
        );

        Ok(AppState::new(
            OriginPolicy::from_config(&config.http.cors)?,
            composer,
            dispatcher,
            health,
            config.mode,
        ))
    }

    /// Connect to the configured SMTP relay and bind the HTTP listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay cannot be set up or verified (per
    /// policy), or the listener cannot be bound.
    pub async fn bind(&self) -> anyhow::Result<HttpServer> {
        let relay: Arc<dyn Relay> = Arc::new(SmtpRelay::new(&self.config.relay)?);
        let state = self.app_state(relay).await?;

        Ok(HttpServer::new(&self.config.http, Arc::new(state)).await?)
    }

    /// Verify the relay and report, without serving anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay is unreachable or rejects the
    /// credentials.
    pub async fn check(&self) -> anyhow::Result<()> {
        logging::init();

        let relay = Arc::new(SmtpRelay::new(&self.config.relay)?);
        Dispatcher::new(relay, self.config.mail.dispatch_timeout())
            .verify()
            .await?;

        internal!(
            level = INFO,
            host = %self.config.relay.host,
            port = self.config.relay.port,
            "Relay check passed"
        );

        Ok(())
    }

    /// Run until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if startup fails or the server stops abnormally.
    pub async fn run(self) -> anyhow::Result<()> {
        logging::init();

        internal!(level = INFO, mode = ?self.config.mode, "Controller running");

        let server = self.bind().await?;
        let mut serving = tokio::spawn(server.serve(self.subscribe()));

        tokio::select! {
            result = &mut serving => {
                // The server only returns on its own if it failed.
                return Ok(result??);
            }
            result = wait_for_signal() => result?,
        }

        internal!(level = INFO, "Shutting down...");
        self.shutdown();

        serving.await??;
        Ok(())
    }
}

async fn wait_for_signal() -> std::io::Result<()> {
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            internal!(level = INFO, "CTRL+C entered, shutting down");
        }
        _ = terminate.recv() => {
            internal!(level = INFO, "Terminate signal received, shutting down");
        }
    }

    Ok(())
}
