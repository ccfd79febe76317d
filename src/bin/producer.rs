//! Declares the full topology and publishes alternating error/info events.

use clap::Parser;
use lapin::{Channel, Connection};
use logflow::{config, connect, shutdown, topology, MessagingError, PublishLoop, Topology};

/// Publishes a paced stream of error and info log events with publisher
/// confirms. Connection settings come from AMQP_URI or RABBIT_* variables.
#[derive(Parser, Debug)]
#[command(name = "producer")]
struct Args {}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let _args = Args::parse();

    match run().await {
        Ok(()) | Err(MessagingError::Cancelled) => {}
        Err(e) => {
            log::error!("[producer] fatal: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

async fn run() -> Result<(), MessagingError> {
    let uri = config::amqp_uri();
    log::info!("[producer] connecting to {}", config::redact_uri(&uri));

    let cancel = shutdown::cancel_on_interrupt();
    let connection = connect::connect_with_retry(&uri, &cancel).await?;
    let channel = connection.create_channel().await?;

    let names = Topology::default();
    topology::declare_error_topology(&channel, &names).await?;
    topology::declare_info_exchange(&channel, &names).await?;

    log::info!("[producer] publishing; interrupt to exit");
    let result = PublishLoop::new(names).run(&channel, &cancel).await;

    close(&channel, &connection).await;
    log::info!("[producer] connection closed");
    result
}

async fn close(channel: &Channel, connection: &Connection) {
    if let Err(e) = channel.close(200, "shutting down").await {
        log::warn!("[producer] channel close failed: {e}");
    }
    if let Err(e) = connection.close(200, "shutting down").await {
        log::warn!("[producer] connection close failed: {e}");
    }
}
