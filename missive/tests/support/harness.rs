//! End-to-end harness
//!
//! Starts a [`MockSmtpServer`], points a real missive instance at it (plain
//! SMTP, no credentials) and binds the HTTP side on an ephemeral local port.
//! Requests go through a real HTTP client so the whole stack, listener
//! included, is exercised.
//!
//! ```rust,no_run
//! use support::{Harness, MockSmtpServer};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mock = MockSmtpServer::builder().build().await?;
//! let harness = Harness::builder(mock).start().await?;
//!
//! let response = harness.get("/health").await?;
//! assert_eq!(response.status, 200);
//!
//! harness.shutdown().await;
//! # Ok(())
//! # }
//! ```
#![allow(dead_code)]

use std::{net::SocketAddr, time::Duration};

use missive::{Config, Missive, VerifyFailurePolicy};
use missive_common::RuntimeMode;
use missive_http::HttpError;
use missive_mail::RelaySecurity;
use reqwest::{
    Client, Method,
    header::{self, HeaderMap},
};
use tokio::task::JoinHandle;

use super::mock_server::MockSmtpServer;

/// A fully read HTTP response.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    async fn read(response: reqwest::Response) -> anyhow::Result<Self> {
        Ok(Self {
            status: response.status().as_u16(),
            headers: response.headers().clone(),
            body: response.text().await?,
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("response body is not JSON")
    }
}

pub struct Harness {
    pub mock: MockSmtpServer,
    missive: Missive,
    addr: SocketAddr,
    client: Client,
    serving: JoinHandle<Result<(), HttpError>>,
}

pub struct HarnessBuilder {
    mock: MockSmtpServer,
    mode: RuntimeMode,
    policy: VerifyFailurePolicy,
    origins: Vec<String>,
}

impl Harness {
    pub fn builder(mock: MockSmtpServer) -> HarnessBuilder {
        HarnessBuilder {
            mock,
            mode: RuntimeMode::Production,
            policy: VerifyFailurePolicy::Exit,
            origins: Vec::new(),
        }
    }

    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<HttpResponse> {
        let response = self.client.get(self.url(path)).send().await?;
        HttpResponse::read(response).await
    }

    pub async fn post_contact(
        &self,
        origin: Option<&str>,
        body: &serde_json::Value,
    ) -> anyhow::Result<HttpResponse> {
        let mut request = self.client.post(self.url("/contact")).json(body);
        if let Some(origin) = origin {
            request = request.header(header::ORIGIN, origin);
        }

        HttpResponse::read(request.send().await?).await
    }

    pub async fn preflight(&self, path: &str, origin: &str) -> anyhow::Result<HttpResponse> {
        let response = self
            .client
            .request(Method::OPTIONS, self.url(path))
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .send()
            .await?;

        HttpResponse::read(response).await
    }

    pub async fn shutdown(self) {
        self.missive.shutdown();
        let _ = self.serving.await;
        self.mock.shutdown();
    }
}

impl HarnessBuilder {
    pub const fn with_mode(mut self, mode: RuntimeMode) -> Self {
        self.mode = mode;
        self
    }

    pub const fn with_verify_failure_policy(mut self, policy: VerifyFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.origins.push(origin.into());
        self
    }

    fn config(&self) -> Config {
        let mut config = Config::default();

        config.relay.host = self.mock.addr().ip().to_string();
        config.relay.port = self.mock.addr().port();
        config.relay.security = RelaySecurity::None;
        config.relay.command_timeout_secs = 5;

        config.mail.sender = Some("relay@example.com".to_string());
        config.mail.recipient = Some("owner@example.com".to_string());
        config.mail.dispatch_timeout_secs = 5;

        config.http.listen_address = "127.0.0.1:0".to_string();
        config.http.request_timeout_secs = 10;
        config.http.cors.extra_origins.clone_from(&self.origins);

        config.mode = self.mode;
        config.on_verify_failure = self.policy;
        config
    }

    pub async fn start(self) -> anyhow::Result<Harness> {
        let missive = Missive::new(self.config())?;
        let server = missive.bind().await?;
        let addr = server.local_addr()?;
        let serving = tokio::spawn(server.serve(missive.subscribe()));
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Harness {
            mock: self.mock,
            missive,
            addr,
            client,
            serving,
        })
    }
}
