//! The outbound side: anything that can take an [`OutboundMessage`] and
//! deliver it.

use async_trait::async_trait;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
};
use missive_common::outgoing;

use crate::{DispatchError, OutboundMessage, RelayConfig, RelaySecurity};

/// An external service that transmits composed messages.
///
/// The relay is built once at startup and shared by every request, so
/// implementations must be safe to call concurrently.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Check that the relay is reachable and accepts our credentials.
    async fn verify(&self) -> Result<(), DispatchError>;

    /// Transmit a message. Called at most once per message.
    async fn send(&self, message: OutboundMessage) -> Result<(), DispatchError>;
}

/// [`Relay`] backed by an SMTP submission server.
pub struct SmtpRelay {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
    port: u16,
}

impl SmtpRelay {
    /// Build the transport. No connection is made until the first
    /// [`verify`](Relay::verify) or [`send`](Relay::send).
    ///
    /// # Errors
    ///
    /// Returns an error if TLS parameters cannot be derived from the host.
    pub fn new(config: &RelayConfig) -> Result<Self, DispatchError> {
        let builder = match config.security {
            RelaySecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            }
            RelaySecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
            RelaySecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            }
        };

        let mut builder = builder
            .port(config.port)
            .timeout(Some(config.command_timeout()));

        if let Some(credentials) = config.credentials() {
            builder = builder.credentials(credentials);
        }

        Ok(Self {
            transport: builder.build(),
            host: config.host.clone(),
            port: config.port,
        })
    }
}

#[async_trait]
impl Relay for SmtpRelay {
    async fn verify(&self) -> Result<(), DispatchError> {
        outgoing!(level = DEBUG, host = %self.host, port = self.port, "Testing relay connection");

        if self.transport.test_connection().await? {
            Ok(())
        } else {
            Err(DispatchError::VerificationFailed)
        }
    }

    async fn send(&self, message: OutboundMessage) -> Result<(), DispatchError> {
        let email = to_email(&message)?;
        let response = self.transport.send(email).await?;

        outgoing!(
            level = DEBUG,
            host = %self.host,
            code = %response.code(),
            "Relay accepted message"
        );

        Ok(())
    }
}

fn parse_address(address: &str) -> Result<Address, DispatchError> {
    address
        .parse()
        .map_err(|source| DispatchError::InvalidAddress {
            address: address.to_string(),
            source,
        })
}

fn to_email(message: &OutboundMessage) -> Result<Message, DispatchError> {
    let from = Mailbox::new(
        Some(message.from.name.clone()),
        parse_address(&message.from.address)?,
    );

    Ok(Message::builder()
        .from(from)
        .reply_to(Mailbox::new(None, parse_address(&message.reply_to)?))
        .to(Mailbox::new(None, parse_address(&message.to)?))
        .subject(message.subject.clone())
        .multipart(MultiPart::alternative_plain_html(
            message.text_body.clone(),
            message.html_body.clone(),
        ))?)
}
