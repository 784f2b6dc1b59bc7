use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use ringlog_api::{ErrorKind, Record, StoreError};
use ringlog_engine::{SessionId, SharedStore};

use crate::accumulator::Accumulator;
use crate::command::parse_seek;
use crate::config::{SessionConfig, SessionMode};
use crate::error::SessionError;

/// Counters of one finished session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionStats {
    pub bytes_in: usize,
    pub bytes_out: usize,
    /// Records committed to the store.
    pub records: usize,
    /// Seek commands answered.
    pub seeks: usize,
    /// Records or commands answered with an `ERR` line.
    pub rejected: usize,
}

// ═══════════════════════════════════════════════════════════════
//  Session loop: read → accumulate → commit → echo
// ═══════════════════════════════════════════════════════════════

/// Serve one connection until EOF or shutdown.
///
/// Accumulation happens without the store lock. Each completed record is
/// committed and read back under one lock acquisition, and the reply is
/// written after the lock is released. Cancellation is only observed while
/// waiting for the next read, never between a commit and its reply.
pub async fn run_session<S>(
    id: SessionId,
    mut stream: S,
    store: SharedStore,
    config: Arc<SessionConfig>,
    token: CancellationToken,
) -> Result<SessionStats, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut acc = Accumulator::new(config.terminator, config.max_record_bytes);
    let mut chunk = vec![0u8; config.read_chunk];
    let mut stats = SessionStats::default();

    loop {
        let n = tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!(session = %id, "shutdown requested, closing session");
                break;
            }
            read = stream.read(&mut chunk) => read?,
        };
        if n == 0 {
            break;
        }
        stats.bytes_in += n;
        acc.feed(&chunk[..n]);

        loop {
            let reply = match acc.next_record() {
                Ok(Some(record)) => respond(id, record, &store, &config, &mut stats).await?,
                Ok(None) => break,
                Err(e) => store_error_reply(id, e, config.terminator, &mut stats)?,
            };
            stream.write_all(&reply).await?;
            stats.bytes_out += reply.len();
        }
    }

    if !acc.pending().is_empty() {
        tracing::debug!(
            session = %id,
            pending = acc.pending().len(),
            "unterminated record dropped at session end"
        );
    }
    if let Err(e) = stream.shutdown().await {
        tracing::debug!(session = %id, error = %e, "shutdown of write half failed");
    }
    Ok(stats)
}

/// Bytes to send back for one completed record.
async fn respond(
    id: SessionId,
    record: Record,
    store: &SharedStore,
    config: &SessionConfig,
    stats: &mut SessionStats,
) -> Result<Vec<u8>, SessionError> {
    if config.mode == SessionMode::Seek {
        match parse_seek(&record, &config.seek_prefix, config.terminator) {
            Ok(Some(seek)) => {
                return match store.read_from_seek(seek).await {
                    Ok(bytes) => {
                        tracing::debug!(session = %id, %seek, len = bytes.len(), "seek served");
                        stats.seeks += 1;
                        Ok(bytes)
                    }
                    Err(e) => store_error_reply(id, e, config.terminator, stats),
                };
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(session = %id, error = %e, "bad seek command");
                stats.rejected += 1;
                return Ok(error_reply(&e, config.terminator));
            }
        }
    }

    stats.records += 1;
    Ok(store.commit_and_read_all(record).await)
}

/// Answer a store error according to its kind. Rejected seeks and records
/// get an `ERR` line and the session goes on; anything else ends it.
fn store_error_reply(
    id: SessionId,
    err: StoreError,
    terminator: u8,
    stats: &mut SessionStats,
) -> Result<Vec<u8>, SessionError> {
    match err.kind() {
        ErrorKind::OutOfRange => tracing::warn!(session = %id, error = %err, "seek rejected"),
        ErrorKind::ResourceExhaustion => tracing::warn!(session = %id, error = %err, "record rejected"),
        ErrorKind::Config => return Err(SessionError::Store(err)),
    }
    stats.rejected += 1;
    Ok(error_reply(&err, terminator))
}

fn error_reply(err: &dyn std::fmt::Display, terminator: u8) -> Vec<u8> {
    let mut reply = format!("ERR {err}").into_bytes();
    reply.push(terminator);
    reply
}
