use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use ringlog_engine::Engine;

use crate::config::SessionConfig;
use crate::session::run_session;

/// Pause after a failed `accept` (e.g. out of file descriptors).
const ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

// ═══════════════════════════════════════════════════════════════
//  Listener task: accept → register → run_session
// ═══════════════════════════════════════════════════════════════

/// Accept connections and run each one as a registered session.
///
/// The task ends when the engine token is cancelled. Sessions already
/// registered keep running until they finish or the engine drains them.
pub fn spawn_listener(
    listener: TcpListener,
    engine: &Engine,
    config: Arc<SessionConfig>,
) -> JoinHandle<()> {
    let store = engine.store().clone();
    let registry = engine.registry().clone();
    let token = engine.token();

    tokio::spawn(async move {
        let local = listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "?".into());
        tracing::info!(addr = %local, mode = %config.mode, "listening");

        loop {
            let accepted = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            let (stream, peer) = match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!(error = %e, "accept error");
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(ACCEPT_BACKOFF) => {}
                    }
                    continue;
                }
            };

            let store = store.clone();
            let config = config.clone();
            let session_token = token.clone();
            let spawned = registry.spawn(peer.to_string(), move |id| async move {
                tracing::info!(session = %id, %peer, "accepted connection");
                match run_session(id, stream, store, config, session_token).await {
                    Ok(stats) => tracing::info!(
                        session = %id,
                        %peer,
                        records = stats.records,
                        seeks = stats.seeks,
                        rejected = stats.rejected,
                        bytes_in = stats.bytes_in,
                        bytes_out = stats.bytes_out,
                        "closed connection"
                    ),
                    Err(e) => tracing::warn!(session = %id, %peer, error = %e, "session failed"),
                }
            });
            if spawned.is_none() {
                tracing::debug!(%peer, "connection refused, shutting down");
                break;
            }
        }

        tracing::info!(addr = %local, "listener stopped");
    })
}
