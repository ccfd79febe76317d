//! Broadcast consumer for info events.
//!
//! Each instance owns a private durable queue bound to the shared fanout
//! exchange, so every subscriber receives an independent copy of every
//! event regardless of the others' consumption rate.

use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use lapin::{Channel, Connection};
use logflow::{
    config, connect, shutdown, topology, ConsumeLoop, ConsumerConfig, EventHandler, InfoLog,
    MessagingError, Topology,
};

const PROCESSING_DELAY: Duration = Duration::from_millis(100);

/// Consumes info events from this subscriber's dedicated fanout queue.
#[derive(Parser, Debug)]
#[command(name = "info-subscriber")]
struct Args {
    /// Subscriber identity; appended to the queue-name prefix.
    #[arg(default_value = "unknown")]
    subscriber: String,
}

struct InfoLogHandler {
    name: String,
}

#[async_trait]
impl EventHandler for InfoLogHandler {
    type Event = InfoLog;

    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: InfoLog) -> Result<(), MessagingError> {
        log::info!(
            "[{}] {} -> dashboard updated (service: {}, latency: {}ms)",
            self.name,
            event.id,
            event.service,
            event.latency_ms
        );
        tokio::time::sleep(PROCESSING_DELAY).await;
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args.subscriber).await {
        Ok(()) | Err(MessagingError::Cancelled) => {}
        Err(e) => {
            log::error!("[info-subscriber-{}] fatal: {e}", args.subscriber);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(subscriber: &str) -> Result<(), MessagingError> {
    let name = format!("info-subscriber-{subscriber}");
    let uri = config::amqp_uri();
    log::info!("[{name}] connecting to {}", config::redact_uri(&uri));

    let cancel = shutdown::cancel_on_interrupt();
    let connection = connect::connect_with_retry(&uri, &cancel).await?;
    let channel = connection.create_channel().await?;

    let names = Topology::default();
    topology::declare_info_exchange(&channel, &names).await?;
    let queue = topology::declare_subscriber_queue(&channel, &names, subscriber).await?;

    let consume = ConsumeLoop::new(
        InfoLogHandler { name: name.clone() },
        ConsumerConfig {
            queue_name: queue,
            consumer_tag: name.clone(),
            prefetch_count: 1,
        },
    );
    let result = consume.run(&channel, &cancel).await;

    close(&name, &channel, &connection).await;
    log::info!("[{name}] connection closed");
    result
}

async fn close(name: &str, channel: &Channel, connection: &Connection) {
    if let Err(e) = channel.close(200, "shutting down").await {
        log::warn!("[{name}] channel close failed: {e}");
    }
    if let Err(e) = connection.close(200, "shutting down").await {
        log::warn!("[{name}] connection close failed: {e}");
    }
}
