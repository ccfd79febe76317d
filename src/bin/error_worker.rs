//! Competing consumer for the shared error queue.
//!
//! Run several instances against the same broker; prefetch=1 gives fair
//! dispatch, so each message goes to exactly one idle worker.

use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use lapin::{Channel, Connection};
use logflow::{
    config, connect, generate, shutdown, topology, ConsumeLoop, ConsumerConfig, ErrorLog,
    EventHandler, MessagingError, Topology,
};
use rand::Rng;

/// Consumes error events from the shared work queue with manual ack.
#[derive(Parser, Debug)]
#[command(name = "error-worker")]
struct Args {
    /// Worker identity used in log lines; defaults to a random short id.
    worker_id: Option<String>,
}

struct ErrorLogHandler {
    name: String,
}

#[async_trait]
impl EventHandler for ErrorLogHandler {
    type Event = ErrorLog;

    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: ErrorLog) -> Result<(), MessagingError> {
        log::info!("[{}] {} received, processing...", self.name, event.id);

        // Simulated variable processing latency.
        let millis = rand::rng().random_range(1000..3000);
        tokio::time::sleep(Duration::from_millis(millis)).await;

        log::info!(
            "[{}] {} done (service: {}, severity: {})",
            self.name,
            event.id,
            event.service,
            event.severity
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let worker_id = args.worker_id.unwrap_or_else(generate::short_id);

    match run(&worker_id).await {
        Ok(()) | Err(MessagingError::Cancelled) => {}
        Err(e) => {
            log::error!("[error-worker-{worker_id}] fatal: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(worker_id: &str) -> Result<(), MessagingError> {
    let name = format!("error-worker-{worker_id}");
    let uri = config::amqp_uri();
    log::info!("[{name}] connecting to {}", config::redact_uri(&uri));

    let cancel = shutdown::cancel_on_interrupt();
    let connection = connect::connect_with_retry(&uri, &cancel).await?;
    let channel = connection.create_channel().await?;

    let names = Topology::default();
    topology::declare_error_queue(&channel, &names).await?;

    let consume = ConsumeLoop::new(
        ErrorLogHandler { name: name.clone() },
        ConsumerConfig {
            queue_name: names.error_queue.clone(),
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
