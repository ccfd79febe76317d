//! # logflow
//!
//! Two classic messaging patterns over RabbitMQ: a producer publishes
//! alternating error and info log events; error events are load-balanced
//! across competing workers on one shared queue (fair dispatch, prefetch 1,
//! manual ack), while info events fan out to a private durable queue per
//! subscriber.
//!
//! All durability, routing, and redelivery is delegated to the broker; this
//! crate supplies the connection retry discipline, topology declarations,
//! the confirmed publish loop, and the manual-acknowledgment consume loop.

pub mod config;
pub mod connect;
pub mod consumer;
pub mod error;
pub mod events;
pub mod generate;
pub mod handler;
pub mod producer;
pub mod shutdown;
pub mod topology;

pub use config::Topology;
pub use connect::connect_with_retry;
pub use consumer::{ConsumeLoop, ConsumerConfig};
pub use error::MessagingError;
pub use events::{ErrorLog, InfoLog, Severity};
pub use handler::{Disposition, EventHandler};
pub use producer::PublishLoop;
