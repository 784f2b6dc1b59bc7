/// Category of a store error. Lets the session layer decide whether to
/// answer the client or give up on the connection.
///
/// Reading past the end of retained data is not an error: `find` and
/// `locate` return `None` and flat reads produce zero bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Seek request names a record or offset that does not exist.
    OutOfRange,
    /// Record could not be accepted (size cap). Nothing is committed.
    ResourceExhaustion,
    /// Invalid construction parameters.
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::OutOfRange => f.write_str("out of range"),
            ErrorKind::ResourceExhaustion => f.write_str("resource exhaustion"),
            ErrorKind::Config => f.write_str("config"),
        }
    }
}

/// Errors returned by the entry store and the addressed reader.
///
/// All of them are plain values: none of them mutate the store, and the
/// coordinator turns them into per-session replies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record index {record_index} out of range ({retained} records retained)")]
    IndexOutOfRange { record_index: usize, retained: usize },

    #[error("byte offset {byte_offset} exceeds record {record_index} length {record_len}")]
    OffsetOutOfRange { record_index: usize, byte_offset: usize, record_len: usize },

    #[error("record exceeds {limit} bytes ({pending} pending), discarded")]
    ResourceExhaustion { limit: usize, pending: usize },

    #[error("store capacity must be greater than zero")]
    ZeroCapacity,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::IndexOutOfRange { .. }
            | StoreError::OffsetOutOfRange { .. } => ErrorKind::OutOfRange,
            StoreError::ResourceExhaustion { .. } => ErrorKind::ResourceExhaustion,
            StoreError::ZeroCapacity => ErrorKind::Config,
        }
    }
}
