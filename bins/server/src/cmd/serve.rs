use std::sync::Arc;

use tokio::net::TcpListener;

use pipeline::spawn_listener;
use ringlog_engine::Engine;

use crate::config::{Effective, ServeArgs};
use crate::error::ServerError;

pub async fn run(args: ServeArgs) -> Result<(), ServerError> {
    let eff = Effective::new(&args)?;
    tracing::info!(
        config = %args.config,
        addr = %eff.addr,
        capacity = eff.engine.capacity,
        mode = %eff.session.mode,
        "ringlog-server starting"
    );

    // Bind before the engine starts so a busy port fails without side effects.
    let listener = TcpListener::bind(&eff.addr)
        .await
        .map_err(|source| ServerError::Bind { addr: eff.addr.clone(), source })?;

    let engine = Engine::start(eff.engine)?;
    let listen = spawn_listener(listener, &engine, Arc::new(eff.session));
    tracing::info!("server ready");

    wait_for_shutdown().await?;
    tracing::info!("shutting down...");

    let report = engine.shutdown(eff.shutdown_timeout).await;
    if let Err(e) = listen.await {
        tracing::error!(error = %e, "listener task failed");
    }

    tracing::info!(
        sessions_pending = report.sessions_pending,
        records_released = report.records_released,
        commits = report.stats.commits,
        evictions = report.stats.evictions,
        "shutdown complete"
    );
    Ok(())
}

/// Ctrl+C, or SIGTERM on unix.
async fn wait_for_shutdown() -> Result<(), ServerError> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            r = tokio::signal::ctrl_c() => r?,
            _ = sigterm.recv() => tracing::info!("SIGTERM received"),
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}
