use std::sync::Arc;

use tokio::sync::Mutex;

use entry_store::EntryStore;
use ringlog_api::{now_ms, Record, SeekTo, StoreError};

// ═══════════════════════════════════════════════════════════════
//  SharedStore
// ═══════════════════════════════════════════════════════════════

struct State {
    store: EntryStore,
    commits: u64,
    evictions: u64,
    last_commit_ms: Option<i64>,
}

impl State {
    fn commit(&mut self, record: Record) -> Option<Record> {
        let len = record.len();
        let evicted = self.store.add(record);
        self.commits += 1;
        self.last_commit_ms = Some(now_ms());
        if let Some(ref old) = evicted {
            self.evictions += 1;
            tracing::debug!(evicted_len = old.len(), len, "store full, evicted oldest record");
        } else {
            tracing::debug!(len, retained = self.store.len(), "record committed");
        }
        evicted
    }
}

/// Point-in-time view of the store counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub records: usize,
    pub bytes: usize,
    pub capacity: usize,
    pub commits: u64,
    pub evictions: u64,
    pub last_commit_ms: Option<i64>,
}

/// Cloneable handle to the one process-wide entry store.
///
/// Every operation takes the same exclusive lock and holds it until the
/// operation is complete, so commits and reads are totally ordered. There
/// is no shared-read path: readers and writers exclude each other.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<State>>,
}

impl SharedStore {
    pub fn new(capacity: usize) -> Result<Self, StoreError> {
        Ok(Self {
            inner: Arc::new(Mutex::new(State {
                store: EntryStore::new(capacity)?,
                commits: 0,
                evictions: 0,
                last_commit_ms: None,
            })),
        })
    }

    /// Commit one record. Returns the evicted oldest record, if any.
    pub async fn commit(&self, record: Record) -> Option<Record> {
        self.inner.lock().await.commit(record)
    }

    /// Commit one record and read back the whole retained stream without
    /// releasing the lock in between.
    pub async fn commit_and_read_all(&self, record: Record) -> Vec<u8> {
        let mut state = self.inner.lock().await;
        state.commit(record);
        state.store.read_all()
    }

    /// Bytes from the position named by `seek` to the end of retained data.
    pub async fn read_from_seek(&self, seek: SeekTo) -> Result<Vec<u8>, StoreError> {
        self.inner.lock().await.store.read_indexed(seek, usize::MAX)
    }

    /// Retained records, oldest first.
    pub async fn records(&self) -> Vec<Record> {
        self.inner.lock().await.store.iter().cloned().collect()
    }

    pub async fn stats(&self) -> StoreStats {
        let state = self.inner.lock().await;
        StoreStats {
            records: state.store.len(),
            bytes: state.store.total_len(),
            capacity: state.store.capacity(),
            commits: state.commits,
            evictions: state.evictions,
            last_commit_ms: state.last_commit_ms,
        }
    }

    /// Drop all retained records. Returns how many were released.
    pub async fn release(&self) -> usize {
        self.inner.lock().await.store.clear()
    }
}
