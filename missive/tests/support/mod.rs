//! Test support for end-to-end runs against a mock SMTP relay.

pub mod harness;
pub mod mock_server;

pub use harness::Harness;
pub use mock_server::MockSmtpServer;
