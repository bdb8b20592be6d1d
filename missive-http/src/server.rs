//! Contact HTTP server

use std::{any::Any, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router, middleware,
    routing::{get, post},
};
use missive_common::{Signal, internal};
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer};

use crate::{AppState, HttpConfig, HttpError, cors, error::panic_response, handlers};

/// Build the application router.
///
/// Layers, outermost first: origin gate, panic catcher, request timeout. The
/// gate sits outside everything else so even a timed-out or panicking request
/// gets the right CORS headers.
pub fn router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    let mode = state.mode;

    Router::new()
        .route("/contact", post(handlers::submit_contact))
        .route("/health", get(handlers::liveness))
        .route("/health/ready", get(handlers::readiness))
        .fallback(handlers::not_found)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CatchPanicLayer::custom(
            move |panic: Box<dyn Any + Send + 'static>| panic_response(panic, mode),
        ))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            cors::origin_gate,
        ))
        .with_state(state)
}

/// The public contact endpoint.
pub struct HttpServer {
    listener: TcpListener,
    router: Router,
}

impl HttpServer {
    /// Bind the listener and build the router.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the configured address fails.
    pub async fn new(config: &HttpConfig, state: Arc<AppState>) -> Result<Self, HttpError> {
        let listener = TcpListener::bind(&config.listen_address)
            .await
            .map_err(|e| HttpError::BindError {
                address: config.listen_address.clone(),
                source: e,
            })?;

        internal!(
            level = INFO,
            address = %config.listen_address,
            "HTTP server bound successfully"
        );

        Ok(Self {
            listener,
            router: router(state, config.request_timeout()),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the bound address cannot be read back.
    pub fn local_addr(&self) -> Result<SocketAddr, HttpError> {
        self.listener
            .local_addr()
            .map_err(|e| HttpError::ServerError(e.to_string()))
    }

    /// Run the server until a shutdown signal is received
    ///
    /// In-flight requests are allowed to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the server encounters a runtime error.
    pub async fn serve(
        self,
        mut shutdown: tokio::sync::broadcast::Receiver<Signal>,
    ) -> Result<(), HttpError> {
        internal!(level = INFO, "HTTP server starting");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                internal!(level = INFO, "HTTP server received shutdown signal");
            })
            .await
            .map_err(|e| HttpError::ServerError(e.to_string()))?;

        internal!(level = INFO, "HTTP server stopped");
        Ok(())
    }
}
