pub mod config;
pub mod error;
mod registry;
mod shared;
mod ticker;

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use config::{EngineConfig, StoreConfig, TimestampConfig};
pub use error::EngineError;
pub use registry::{SessionId, SessionRegistry};
pub use shared::{SharedStore, StoreStats};
pub use ticker::spawn_timestamp_task;

// ═══════════════════════════════════════════════════════════════
//  Engine
// ═══════════════════════════════════════════════════════════════

/// Top-level context: the shared store, the live-session registry,
/// the shutdown token and the optional timestamp task.
///
/// Created once at startup and consumed by [`Engine::shutdown`].
pub struct Engine {
    store: SharedStore,
    registry: SessionRegistry,
    token: CancellationToken,
    ticker: Option<JoinHandle<()>>,
}

/// What happened during [`Engine::shutdown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Sessions still running when the drain timeout expired. Shutdown
    /// waited for them before releasing the store.
    pub sessions_pending: usize,
    /// Records dropped when the store was released.
    pub records_released: usize,
    pub stats: StoreStats,
}

impl Engine {
    /// Build the engine and start the timestamp task if configured.
    /// Must be called from within a tokio runtime.
    pub fn start(config: EngineConfig) -> Result<Self, EngineError> {
        let store = SharedStore::new(config.capacity)?;
        let token = CancellationToken::new();

        let ticker = config.timestamp_interval.map(|interval| {
            spawn_timestamp_task(store.clone(), interval, config.terminator, token.clone())
        });

        tracing::info!(
            capacity = config.capacity,
            timestamps = config.timestamp_interval.is_some(),
            "engine started"
        );

        Ok(Self {
            store,
            registry: SessionRegistry::new(),
            token,
            ticker,
        })
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Token cancelled when shutdown begins.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stop accepting, drain sessions, stop the timestamp task, release
    /// the store.
    ///
    /// Sessions observe cancellation only between reads, so none is
    /// interrupted in the middle of a commit. `drain_timeout` only decides
    /// when stragglers are reported: the store is released after every
    /// registered session has finished.
    pub async fn shutdown(self, drain_timeout: Duration) -> ShutdownReport {
        tracing::info!(live = self.registry.len(), "shutting down engine");
        self.token.cancel();

        let sessions_pending = match self.registry.drain(drain_timeout).await {
            Ok(()) => 0,
            Err(remaining) => {
                for (session, peer) in self.registry.live() {
                    tracing::warn!(%session, %peer, "session still running after drain timeout");
                }
                tracing::warn!(
                    remaining,
                    timeout_ms = drain_timeout.as_millis() as u64,
                    "waiting for remaining sessions before releasing the store"
                );
                self.registry.wait().await;
                remaining
            }
        };

        if let Some(ticker) = self.ticker {
            if let Err(e) = ticker.await {
                tracing::error!(error = %e, "timestamp task failed");
            }
        }

        let stats = self.store.stats().await;
        let records_released = self.store.release().await;
        tracing::info!(records_released, commits = stats.commits, "store released");

        ShutdownReport {
            sessions_pending,
            records_released,
            stats,
        }
    }
}
