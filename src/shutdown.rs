//! Shutdown wiring shared by all four processes.

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Token that fires on SIGTERM or Ctrl-C. Every loop selects on it; the
/// 500 ms bounded waits in the service loops keep exit latency inside one
/// cycle.
pub fn cancel_on_termination() -> CancellationToken {
    let token = CancellationToken::new();
    let fired = token.clone();
    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "cannot install SIGTERM handler");
                if tokio::signal::ctrl_c().await.is_ok() {
                    fired.cancel();
                }
                return;
            }
        };
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = tokio::signal::ctrl_c() => {}
        }
        fired.cancel();
    });
    token
}
