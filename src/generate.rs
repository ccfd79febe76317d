//! Randomized sample data for published events.
//!
//! The value sets mirror a handful of plausible services and log lines; they
//! are illustrative, not a contract. Ids are the exception: they increment
//! monotonically per event type from arbitrary seeded offsets.

use chrono::Utc;
use rand::Rng;

use crate::events::{ErrorLog, InfoLog, Severity};

const SERVICES: &[&str] = &["auth", "web", "api", "db", "cache"];
const ERROR_MESSAGES: &[&str] = &[
    "DB timeout",
    "Connection failed",
    "Null reference",
    "Out of memory",
    "Deadlock detected",
];
const INFO_MESSAGES: &[&str] = &[
    "GET /api/orders 200",
    "POST /api/users 201",
    "PUT /api/products 200",
    "DELETE /api/items 204",
];
const SEVERITIES: &[Severity] = &[Severity::High, Severity::Critical, Severity::Medium];

/// Monotonic per-type id sequences.
#[derive(Debug)]
pub struct EventIds {
    next_error: u64,
    next_info: u64,
}

impl EventIds {
    pub fn new() -> Self {
        Self {
            next_error: 1000,
            next_info: 5000,
        }
    }

    pub fn next_error_id(&mut self) -> String {
        let id = format!("E-{}", self.next_error);
        self.next_error += 1;
        id
    }

    pub fn next_info_id(&mut self) -> String {
        let id = format!("I-{}", self.next_info);
        self.next_info += 1;
        id
    }
}

impl Default for EventIds {
    fn default() -> Self {
        Self::new()
    }
}

fn pick<'a>(rng: &mut impl Rng, items: &'a [&'a str]) -> String {
    items[rng.random_range(0..items.len())].to_string()
}

/// Builds the next error event with freshly randomized field values.
pub fn random_error_log(ids: &mut EventIds) -> ErrorLog {
    let mut rng = rand::rng();
    ErrorLog {
        id: ids.next_error_id(),
        service: pick(&mut rng, SERVICES),
        message: pick(&mut rng, ERROR_MESSAGES),
        severity: SEVERITIES[rng.random_range(0..SEVERITIES.len())],
        timestamp: Utc::now(),
    }
}

/// Builds the next info event with freshly randomized field values.
pub fn random_info_log(ids: &mut EventIds) -> InfoLog {
    let mut rng = rand::rng();
    InfoLog {
        id: ids.next_info_id(),
        service: pick(&mut rng, SERVICES),
        message: pick(&mut rng, INFO_MESSAGES),
        latency_ms: rng.random_range(10..500),
        timestamp: Utc::now(),
    }
}

/// A short random hex identifier, used as the default worker identity.
pub fn short_id() -> String {
    format!("{:08x}", rand::rng().random::<u32>())
}
