//! Wire records for the two log event types.
//!
//! Both records travel as UTF-8 JSON with PascalCase keys and RFC 3339 UTC
//! timestamps, matching the producer's published shape exactly.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of an error event, serialized as an upper-case string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Critical,
    Medium,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
            Severity::Medium => "MEDIUM",
        })
    }
}

/// A critical error event, routed to exactly one competing worker.
///
/// `id` is assigned once by the producer and never mutated; it is a
/// correlation key for log lines, not a deduplication key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorLog {
    pub id: String,
    pub service: String,
    pub message: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

/// An informational event, broadcast to every bound subscriber queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InfoLog {
    pub id: String,
    pub service: String,
    pub message: String,
    pub latency_ms: u32,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamp() -> DateTime<Utc> {
        "2026-08-26T09:26:53.589Z"
            .parse()
            .expect("valid RFC 3339 timestamp")
    }

    #[test]
    fn error_log_round_trip_preserves_all_fields() {
        let log = ErrorLog {
            id: "E-1000".to_string(),
            service: "auth".to_string(),
            message: "DB timeout".to_string(),
            severity: Severity::High,
            timestamp: timestamp(),
        };

        let json = serde_json::to_string(&log).expect("serialize");
        let back: ErrorLog = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, log);
        assert_eq!(back.timestamp.timestamp_subsec_millis(), 589);
    }

    #[test]
    fn info_log_round_trip_preserves_all_fields() {
        let log = InfoLog {
            id: "I-5000".to_string(),
            service: "web".to_string(),
            message: "GET /api/orders 200".to_string(),
            latency_ms: 42,
            timestamp: timestamp(),
        };

        let json = serde_json::to_string(&log).expect("serialize");
        let back: InfoLog = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, log);
    }

    #[test]
    fn wire_format_uses_pascal_case_keys() {
        let log = ErrorLog {
            id: "E-1001".to_string(),
            service: "db".to_string(),
            message: "Deadlock detected".to_string(),
            severity: Severity::Critical,
            timestamp: timestamp(),
        };

        let value = serde_json::to_value(&log).expect("serialize");
        assert_eq!(value["Id"], "E-1001");
        assert_eq!(value["Service"], "db");
        assert_eq!(value["Message"], "Deadlock detected");
        assert_eq!(value["Severity"], "CRITICAL");
        assert!(value["Timestamp"].is_string());
    }

    #[test]
    fn decodes_payload_published_by_other_clients() {
        let json = r#"{
            "Id": "I-5000",
            "Service": "web",
            "Message": "GET /api/orders 200",
            "LatencyMs": 42,
            "Timestamp": "2026-08-26T09:26:53.589Z"
        }"#;

        let log: InfoLog = serde_json::from_str(json).expect("deserialize");
        assert_eq!(log.id, "I-5000");
        assert_eq!(log.latency_ms, 42);
    }

    #[test]
    fn malformed_payload_fails_to_decode() {
        let result = serde_json::from_str::<ErrorLog>(r#"{"Id": 7}"#);
        assert!(result.is_err());
    }
}
