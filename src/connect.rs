//! Startup connection establishment with bounded, fixed-delay retry.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use lapin::{Connection, ConnectionProperties};
use tokio_util::sync::CancellationToken;

use crate::error::MessagingError;

pub const CONNECT_ATTEMPTS: u32 = 5;
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Connects to the broker, retrying up to [`CONNECT_ATTEMPTS`] times with a
/// constant [`CONNECT_RETRY_DELAY`] between attempts.
///
/// This is a process-startup precondition only. Once a connection is handed
/// back there is no supervision; a drop later in the run surfaces as a fatal
/// broker error.
pub async fn connect_with_retry(
    uri: &str,
    cancel: &CancellationToken,
) -> Result<Connection, MessagingError> {
    retry(CONNECT_ATTEMPTS, CONNECT_RETRY_DELAY, cancel, || {
        Connection::connect(uri, ConnectionProperties::default())
    })
    .await
}

/// Runs `op` up to `attempts` times, sleeping `delay` after each failure.
///
/// The delay observes `cancel`, so shutdown during a retry gap returns
/// promptly with [`MessagingError::Cancelled`] instead of finishing the
/// schedule.
async fn retry<T, E, F, Fut>(
    attempts: u32,
    delay: Duration,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, MessagingError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    for attempt in 1..=attempts {
        log::info!("connection attempt {attempt}/{attempts}...");
        match op().await {
            Ok(value) => {
                log::info!("connected on attempt {attempt}");
                return Ok(value);
            }
            Err(e) => {
                log::warn!("connection attempt {attempt}/{attempts} failed: {e}");
                if attempt == attempts {
                    break;
                }
                log::info!("retrying in {delay:?}...");
                tokio::select! {
                    _ = cancel.cancelled() => return Err(MessagingError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    Err(MessagingError::RetriesExhausted { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_five_attempts_with_fixed_gaps() {
        let cancel = CancellationToken::new();
        let calls = Cell::new(0u32);
        let start = Instant::now();

        let result = retry(5, Duration::from_secs(2), &cancel, || {
            calls.set(calls.get() + 1);
            async { Err::<(), _>("connection refused") }
        })
        .await;

        assert!(matches!(
            result,
            Err(MessagingError::RetriesExhausted { attempts: 5 })
        ));
        assert_eq!(calls.get(), 5);
        // Four gaps between five attempts, no delay after the last failure.
        assert_eq!(start.elapsed(), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_midway_without_further_attempts() {
        let cancel = CancellationToken::new();
        let calls = Cell::new(0u32);
        let start = Instant::now();

        let result = retry(5, Duration::from_secs(2), &cancel, || {
            calls.set(calls.get() + 1);
            let attempt = calls.get();
            async move {
                if attempt < 3 {
                    Err("connection refused")
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert!(matches!(result, Ok(3)));
        assert_eq!(calls.get(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_the_retry_gap_stops_the_schedule() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = Cell::new(0u32);

        let result = retry(5, Duration::from_secs(2), &cancel, || {
            calls.set(calls.get() + 1);
            async { Err::<(), _>("connection refused") }
        })
        .await;

        assert!(matches!(result, Err(MessagingError::Cancelled)));
        assert_eq!(calls.get(), 1);
    }
}
