use std::{sync::Arc, time::Duration};

use missive_common::outgoing;

use crate::{DispatchError, OutboundMessage, Relay};

/// Hands composed messages to the shared [`Relay`] with a bounded wait.
#[derive(Clone)]
pub struct Dispatcher {
    relay: Arc<dyn Relay>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(relay: Arc<dyn Relay>, timeout: Duration) -> Self {
        Self { relay, timeout }
    }

    /// Verify the relay once, bounded by the dispatch timeout.
    ///
    /// # Errors
    ///
    /// Returns the relay's error, or [`DispatchError::Timeout`].
    pub async fn verify(&self) -> Result<(), DispatchError> {
        tokio::time::timeout(self.timeout, self.relay.verify())
            .await
            .map_err(|_| DispatchError::Timeout(self.timeout))?
    }

    /// Send one message. Never retried.
    ///
    /// The send runs on its own task: if the caller goes away (for example
    /// the HTTP client disconnects) the message is still handed over rather
    /// than cut off halfway. The caller stops waiting after the timeout.
    ///
    /// # Errors
    ///
    /// Returns the relay's error, [`DispatchError::Timeout`] if the relay did
    /// not finish in time, or [`DispatchError::Task`] if the send panicked.
    pub async fn dispatch(&self, message: OutboundMessage) -> Result<(), DispatchError> {
        let relay = Arc::clone(&self.relay);
        let subject = message.subject.clone();
        let handle = tokio::spawn(async move { relay.send(message).await });

        let result = match tokio::time::timeout(self.timeout, handle).await {
            Ok(joined) => joined?,
            Err(_) => Err(DispatchError::Timeout(self.timeout)),
        };

        match &result {
            Ok(()) => outgoing!(level = INFO, subject = %subject, "Message dispatched"),
            Err(e) => outgoing!(
                level = ERROR,
                subject = %subject,
                transient = e.is_transient(),
                error = %e,
                "Message dispatch failed"
            ),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::Sender;

    #[derive(Default)]
    struct CountingRelay {
        sent: AtomicUsize,
        fail: bool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl Relay for CountingRelay {
        async fn verify(&self) -> Result<(), DispatchError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(())
        }

        async fn send(&self, _message: OutboundMessage) -> Result<(), DispatchError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.sent.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DispatchError::Relay("connection refused".to_string()));
            }
            Ok(())
        }
    }

    fn message() -> OutboundMessage {
        OutboundMessage {
            from: Sender {
                name: "Jane".to_string(),
                address: "relay@example.com".to_string(),
            },
            to: "owner@example.com".to_string(),
            reply_to: "jane@x.com".to_string(),
            subject: "Contact Form: Hi".to_string(),
            text_body: String::new(),
            html_body: String::new(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_sends_exactly_once() {
        let relay = Arc::new(CountingRelay::default());
        let dispatcher = Dispatcher::new(relay.clone(), Duration::from_secs(5));

        dispatcher.dispatch(message()).await.unwrap();
        assert_eq!(relay.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_retried() {
        let relay = Arc::new(CountingRelay {
            fail: true,
            ..CountingRelay::default()
        });
        let dispatcher = Dispatcher::new(relay.clone(), Duration::from_secs(5));

        let err = dispatcher.dispatch(message()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Relay(_)));
        assert_eq!(relay.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_relay_times_out() {
        let relay = Arc::new(CountingRelay {
            delay: Some(Duration::from_secs(120)),
            ..CountingRelay::default()
        });
        let dispatcher = Dispatcher::new(relay, Duration::from_secs(1));

        let err = dispatcher.dispatch(message()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Timeout(d) if d == Duration::from_secs(1)));

        let err = dispatcher.verify().await.unwrap_err();
        assert!(matches!(err, DispatchError::Timeout(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_completes_after_caller_stops_waiting() {
        let relay = Arc::new(CountingRelay {
            delay: Some(Duration::from_secs(2)),
            ..CountingRelay::default()
        });
        let dispatcher = Dispatcher::new(relay.clone(), Duration::from_secs(1));

        assert!(dispatcher.dispatch(message()).await.is_err());
        assert_eq!(relay.sent.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(relay.sent.load(Ordering::SeqCst), 1);
    }
}
