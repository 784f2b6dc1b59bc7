use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::task::TaskTracker;

/// Identifier of one accepted session. Unique for the lifetime of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════
//  SessionRegistry
// ═══════════════════════════════════════════════════════════════

#[derive(Default)]
struct Inner {
    tracker: TaskTracker,
    live: Mutex<HashMap<SessionId, String>>,
    next_id: AtomicU64,
}

/// Live sessions: registered on accept, removed when their task finishes.
///
/// Shutdown calls [`SessionRegistry::drain`], which stops new
/// registrations and waits for every registered session to complete.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Inner>,
}

/// Removes the session from the live map when its task ends, including
/// when the task panics.
struct LiveGuard {
    inner: Arc<Inner>,
    id: SessionId,
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        lock(&self.inner.live).remove(&self.id);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for `peer` and spawn the future built by `session`.
    ///
    /// Returns `None` without spawning once the registry is draining.
    pub fn spawn<F, Fut>(&self, peer: impl Into<String>, session: F) -> Option<SessionId>
    where
        F: FnOnce(SessionId) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.inner.tracker.is_closed() {
            return None;
        }
        let id = SessionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        lock(&self.inner.live).insert(id, peer.into());

        let guard = LiveGuard { inner: self.inner.clone(), id };
        let fut = session(id);
        self.inner.tracker.spawn(async move {
            let _guard = guard;
            fut.await;
        });
        Some(id)
    }

    /// Sessions currently running, ordered by id.
    pub fn live(&self) -> Vec<(SessionId, String)> {
        let mut sessions: Vec<_> = lock(&self.inner.live)
            .iter()
            .map(|(id, peer)| (*id, peer.clone()))
            .collect();
        sessions.sort_by_key(|(id, _)| *id);
        sessions
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.live).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_draining(&self) -> bool {
        self.inner.tracker.is_closed()
    }

    /// Refuse new sessions and wait up to `timeout` for the registered ones.
    ///
    /// On timeout returns `Err` with the number of sessions still running.
    pub async fn drain(&self, timeout: Duration) -> Result<(), usize> {
        self.inner.tracker.close();
        match tokio::time::timeout(timeout, self.inner.tracker.wait()).await {
            Ok(()) => Ok(()),
            Err(_) => Err(self.inner.tracker.len()),
        }
    }

    /// Refuse new sessions and wait, without a deadline, for the
    /// registered ones.
    pub async fn wait(&self) {
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn sessions_are_removed_on_completion() {
        let registry = SessionRegistry::new();
        let (tx, rx) = oneshot::channel::<()>();
        let id = registry
            .spawn("127.0.0.1:1", |_| async move {
                let _ = rx.await;
            })
            .unwrap();

        assert_eq!(registry.live(), vec![(id, "127.0.0.1:1".to_string())]);
        tx.send(()).unwrap();
        registry.drain(Duration::from_secs(1)).await.unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn ids_are_unique_and_increasing() {
        let registry = SessionRegistry::new();
        let a = registry.spawn("a", |_| async {}).unwrap();
        let b = registry.spawn("b", |_| async {}).unwrap();
        assert!(b > a);
        assert_eq!(b.to_string(), "#2");
    }

    #[tokio::test]
    async fn drain_refuses_new_sessions() {
        let registry = SessionRegistry::new();
        registry.drain(Duration::from_millis(10)).await.unwrap();
        assert!(registry.is_draining());
        assert!(registry.spawn("late", |_| async {}).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn drain_times_out_on_stuck_session() {
        let registry = SessionRegistry::new();
        let (_tx, rx) = oneshot::channel::<()>();
        registry.spawn("stuck", |_| async move {
            let _ = rx.await;
        });
        assert_eq!(registry.drain(Duration::from_secs(5)).await, Err(1));
    }

    #[tokio::test]
    async fn wait_outlasts_a_drain_timeout() {
        let registry = SessionRegistry::new();
        let (tx, rx) = oneshot::channel::<()>();
        let id = registry
            .spawn("slow", |_| async move {
                let _ = rx.await;
            })
            .unwrap();

        assert_eq!(registry.drain(Duration::from_millis(10)).await, Err(1));
        assert_eq!(registry.live(), vec![(id, "slow".to_string())]);

        tx.send(()).unwrap();
        registry.wait().await;
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn panicking_session_still_leaves_registry() {
        let registry = SessionRegistry::new();
        registry.spawn("boom", |_| async {
            panic!("session failure");
        });
        registry.drain(Duration::from_secs(1)).await.unwrap();
        assert!(registry.is_empty());
    }
}
