//! Event handling trait and the single-resolution delivery disposition.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::MessagingError;

/// Terminal outcome for one delivery.
///
/// Every delivery gets exactly one disposition; the value is moved into
/// [`crate::consumer::resolve`] when applied, so it cannot be applied twice.
#[must_use = "a delivery disposition must be applied exactly once"]
#[derive(Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Processing succeeded; acknowledge.
    Ack,
    /// Structurally invalid (poison) payload; reject without redelivery.
    Reject,
    /// Transient processing failure; reject with redelivery requested.
    Requeue,
}

/// Processes decoded events from a queue.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// The wire record this handler consumes.
    type Event: DeserializeOwned + Send + Sync;

    /// Handles one decoded event. An error requests redelivery.
    async fn handle(&self, event: Self::Event) -> Result<(), MessagingError>;

    /// Name used in log lines.
    fn name(&self) -> &str;
}

/// Decodes a payload and runs the handler, mapping the outcome to a
/// disposition: a malformed payload is rejected permanently (redelivery
/// cannot fix it), a handler failure requests redelivery.
pub async fn decide<H: EventHandler>(handler: &H, payload: &[u8]) -> Disposition {
    let event: H::Event = match serde_json::from_slice(payload) {
        Ok(event) => event,
        Err(e) => {
            log::error!("[{}] rejecting malformed payload: {e}", handler.name());
            return Disposition::Reject;
        }
    };

    match handler.handle(event).await {
        Ok(()) => Disposition::Ack,
        Err(e) => {
            log::error!("[{}] processing failed, requeueing: {e}", handler.name());
            Disposition::Requeue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Ping {
        ok: bool,
    }

    struct PingHandler;

    #[async_trait]
    impl EventHandler for PingHandler {
        type Event = Ping;

        async fn handle(&self, event: Ping) -> Result<(), MessagingError> {
            if event.ok {
                Ok(())
            } else {
                Err("simulated failure".into())
            }
        }

        fn name(&self) -> &str {
            "ping"
        }
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected_permanently() {
        let disposition = decide(&PingHandler, b"not json").await;
        assert_eq!(disposition, Disposition::Reject);
    }

    #[tokio::test]
    async fn structurally_invalid_payload_is_rejected_permanently() {
        let disposition = decide(&PingHandler, br#"{"ok": "yes"}"#).await;
        assert_eq!(disposition, Disposition::Reject);
    }

    #[tokio::test]
    async fn successful_handling_acknowledges() {
        let disposition = decide(&PingHandler, br#"{"ok": true}"#).await;
        assert_eq!(disposition, Disposition::Ack);
    }

    #[tokio::test]
    async fn handler_failure_requests_redelivery() {
        let disposition = decide(&PingHandler, br#"{"ok": false}"#).await;
        assert_eq!(disposition, Disposition::Requeue);
    }
}
