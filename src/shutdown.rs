//! Interrupt handling.

use tokio_util::sync::CancellationToken;

/// Returns a token cancelled on the first Ctrl-C.
///
/// Every blocking wait in the process (connect retry, confirm wait, pacing
/// and processing delays, the consume loop) observes this token, so the
/// owning process can close its channel and connection before exiting.
pub fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("interrupt received, shutting down...");
                trigger.cancel();
            }
            Err(e) => log::error!("failed to listen for interrupt: {e}"),
        }
    });
    token
}
