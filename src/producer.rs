//! The alternating error/info publish loop with per-publish confirms.

use std::future::Future;
use std::time::Duration;

use lapin::{
    options::{BasicPublishOptions, ConfirmSelectOptions},
    publisher_confirm::Confirmation,
    BasicProperties, Channel,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::Topology;
use crate::error::MessagingError;
use crate::generate::{self, EventIds};

/// Bounded wait for the broker to confirm each publish.
pub const CONFIRM_TIMEOUT: Duration = Duration::from_secs(5);
/// Pacing delay between publishes; also the cancellation observation point.
pub const PUBLISH_PACING: Duration = Duration::from_secs(1);

/// Publishes an alternating stream of error and info events until cancelled.
pub struct PublishLoop {
    topology: Topology,
    ids: EventIds,
}

impl PublishLoop {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            ids: EventIds::new(),
        }
    }

    /// Puts the channel in confirm mode, then alternates error and info
    /// publishes with a pacing delay after each.
    ///
    /// A confirm timeout or broker nack terminates the loop as a fatal
    /// error; there is no per-message publish retry. Cancellation during a
    /// pacing delay ends the loop cleanly.
    pub async fn run(
        &mut self,
        channel: &Channel,
        cancel: &CancellationToken,
    ) -> Result<(), MessagingError> {
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await?;
        log::info!("publisher confirms enabled");

        loop {
            let error_log = generate::random_error_log(&mut self.ids);
            publish_confirmed(
                channel,
                &self.topology.error_exchange,
                &self.topology.error_routing_key,
                &error_log,
                cancel,
            )
            .await?;
            log::info!(
                "sent error id={} service={} msg=\"{}\" severity={}",
                error_log.id,
                error_log.service,
                error_log.message,
                error_log.severity
            );
            if pace(cancel).await {
                return Ok(());
            }

            let info_log = generate::random_info_log(&mut self.ids);
            publish_confirmed(channel, &self.topology.info_exchange, "", &info_log, cancel).await?;
            log::info!(
                "sent info id={} service={} msg=\"{}\" latency_ms={}",
                info_log.id,
                info_log.service,
                info_log.message,
                info_log.latency_ms
            );
            if pace(cancel).await {
                return Ok(());
            }
        }
    }
}

/// Publishes one persistent JSON event and waits for the broker confirm,
/// bounded by [`CONFIRM_TIMEOUT`] and observing cancellation.
pub async fn publish_confirmed<T: Serialize>(
    channel: &Channel,
    exchange: &str,
    routing_key: &str,
    event: &T,
    cancel: &CancellationToken,
) -> Result<(), MessagingError> {
    let payload = serde_json::to_vec(event)?;
    let properties = BasicProperties::default()
        .with_content_type("application/json".into())
        .with_delivery_mode(2);

    let confirm = channel
        .basic_publish(
            exchange,
            routing_key,
            BasicPublishOptions::default(),
            &payload,
            properties,
        )
        .await?;

    match await_confirm(confirm, cancel).await? {
        Confirmation::Ack(_) | Confirmation::NotRequested => Ok(()),
        Confirmation::Nack(_) => Err(MessagingError::PublishNotConfirmed),
    }
}

/// Waits for a publisher confirm, bounded by [`CONFIRM_TIMEOUT`]. A shutdown
/// request during the wait returns promptly instead of sitting out the
/// bound; the in-flight publish is left to the broker.
async fn await_confirm<F>(
    confirm: F,
    cancel: &CancellationToken,
) -> Result<Confirmation, MessagingError>
where
    F: Future<Output = Result<Confirmation, lapin::Error>>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(MessagingError::Cancelled),
        result = tokio::time::timeout(CONFIRM_TIMEOUT, confirm) => {
            Ok(result.map_err(|_| MessagingError::ConfirmTimeout(CONFIRM_TIMEOUT))??)
        }
    }
}

/// Sleeps the pacing delay; returns true if cancellation was observed first.
async fn pace(cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(PUBLISH_PACING) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn pacing_waits_the_full_delay_when_not_cancelled() {
        let cancel = CancellationToken::new();
        let start = Instant::now();
        assert!(!pace(&cancel).await);
        assert_eq!(start.elapsed(), PUBLISH_PACING);
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_observes_cancellation_immediately() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let start = Instant::now();
        assert!(pace(&cancel).await);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_wait_observes_cancellation_immediately() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let start = Instant::now();

        let never = std::future::pending::<Result<Confirmation, lapin::Error>>();
        let result = await_confirm(never, &cancel).await;

        assert!(matches!(result, Err(MessagingError::Cancelled)));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_wait_times_out_at_the_bound() {
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let never = std::future::pending::<Result<Confirmation, lapin::Error>>();
        let result = await_confirm(never, &cancel).await;

        assert!(matches!(result, Err(MessagingError::ConfirmTimeout(_))));
        assert_eq!(start.elapsed(), CONFIRM_TIMEOUT);
    }
}
