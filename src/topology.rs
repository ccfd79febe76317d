//! Idempotent broker topology declarations.
//!
//! Every process declares the objects it depends on at startup; declarations
//! are durable, non-exclusive, non-auto-delete, and safe to repeat across
//! restarts.

use lapin::{
    options::{ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions},
    types::FieldTable,
    Channel, ExchangeKind,
};

use crate::config::Topology;
use crate::error::MessagingError;

fn durable_exchange() -> ExchangeDeclareOptions {
    ExchangeDeclareOptions {
        durable: true,
        ..Default::default()
    }
}

fn durable_queue() -> QueueDeclareOptions {
    QueueDeclareOptions {
        durable: true,
        ..Default::default()
    }
}

/// Declares the direct error exchange, the shared error queue, and their
/// binding. Called by the producer, which owns the full error topology.
pub async fn declare_error_topology(
    channel: &Channel,
    topology: &Topology,
) -> Result<(), MessagingError> {
    channel
        .exchange_declare(
            &topology.error_exchange,
            ExchangeKind::Direct,
            durable_exchange(),
            FieldTable::default(),
        )
        .await?;

    declare_error_queue(channel, topology).await?;

    channel
        .queue_bind(
            &topology.error_queue,
            &topology.error_exchange,
            &topology.error_routing_key,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await?;

    log::info!(
        "error topology ready: exchange '{}' -> queue '{}' (key '{}')",
        topology.error_exchange,
        topology.error_queue,
        topology.error_routing_key
    );
    Ok(())
}

/// Declares (or confirms) the shared durable error queue. Workers call this
/// so they can start before the producer has ever run.
pub async fn declare_error_queue(
    channel: &Channel,
    topology: &Topology,
) -> Result<(), MessagingError> {
    channel
        .queue_declare(&topology.error_queue, durable_queue(), FieldTable::default())
        .await?;
    Ok(())
}

/// Declares the durable fanout exchange for info events.
pub async fn declare_info_exchange(
    channel: &Channel,
    topology: &Topology,
) -> Result<(), MessagingError> {
    channel
        .exchange_declare(
            &topology.info_exchange,
            ExchangeKind::Fanout,
            durable_exchange(),
            FieldTable::default(),
        )
        .await?;
    log::info!("info exchange ready: '{}'", topology.info_exchange);
    Ok(())
}

/// Declares this subscriber's private durable queue and binds it to the
/// fanout exchange with the empty routing key. Returns the queue name.
pub async fn declare_subscriber_queue(
    channel: &Channel,
    topology: &Topology,
    subscriber: &str,
) -> Result<String, MessagingError> {
    let queue = topology.info_queue_name(subscriber);

    channel
        .queue_declare(&queue, durable_queue(), FieldTable::default())
        .await?;

    channel
        .queue_bind(
            &queue,
            &topology.info_exchange,
            "",
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await?;

    log::info!(
        "subscriber queue '{}' bound to '{}'",
        queue,
        topology.info_exchange
    );
    Ok(queue)
}
