//! Generic manual-acknowledgment consume loop shared by both consumer roles.

use futures_util::StreamExt;
use lapin::{
    message::Delivery,
    options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions},
    types::FieldTable,
    Channel,
};
use tokio_util::sync::CancellationToken;

use crate::error::MessagingError;
use crate::handler::{decide, Disposition, EventHandler};

/// Settings for one consumer instance.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// The queue to consume from.
    pub queue_name: String,
    /// Unique identifier for this consumer on the queue.
    pub consumer_tag: String,
    /// QoS prefetch count. 1 gives fair dispatch: the broker never assigns a
    /// second delivery while one is unacknowledged.
    pub prefetch_count: u16,
}

/// Consumes deliveries from a single queue with manual acknowledgment.
pub struct ConsumeLoop<H: EventHandler> {
    handler: H,
    config: ConsumerConfig,
}

impl<H: EventHandler> ConsumeLoop<H> {
    pub fn new(handler: H, config: ConsumerConfig) -> Self {
        Self { handler, config }
    }

    /// Runs until cancellation or a broker failure.
    ///
    /// Each delivery is decoded, handled, and resolved with exactly one
    /// disposition before the next delivery is taken from the stream; under
    /// prefetch=1 the broker also never has a second delivery in flight.
    /// Cancellation is observed between deliveries, never mid-handling, so
    /// an in-flight message always reaches its disposition.
    pub async fn run(
        &self,
        channel: &Channel,
        cancel: &CancellationToken,
    ) -> Result<(), MessagingError> {
        channel
            .basic_qos(self.config.prefetch_count, BasicQosOptions::default())
            .await?;

        let mut consumer = channel
            .basic_consume(
                &self.config.queue_name,
                &self.config.consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        log::info!(
            "[{}] consuming from '{}' (prefetch {})",
            self.handler.name(),
            self.config.queue_name,
            self.config.prefetch_count
        );

        loop {
            let delivery = tokio::select! {
                _ = cancel.cancelled() => {
                    log::info!("[{}] shutdown requested", self.handler.name());
                    return Ok(());
                }
                next = consumer.next() => match next {
                    Some(delivery) => delivery?,
                    // Consumer cancelled on the broker side.
                    None => return Ok(()),
                },
            };

            let disposition = decide(&self.handler, &delivery.data).await;
            resolve(delivery, disposition).await?;
        }
    }
}

/// Applies a disposition to its delivery, consuming both.
pub async fn resolve(delivery: Delivery, disposition: Disposition) -> Result<(), MessagingError> {
    match disposition {
        Disposition::Ack => delivery.ack(BasicAckOptions::default()).await?,
        Disposition::Reject => {
            delivery
                .nack(BasicNackOptions {
                    requeue: false,
                    ..Default::default()
                })
                .await?
        }
        Disposition::Requeue => {
            delivery
                .nack(BasicNackOptions {
                    requeue: true,
                    ..Default::default()
                })
                .await?
        }
    }
    Ok(())
}
