/// A record carried the seek prefix but not a valid `<index>,<offset>` pair.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("malformed seek command '{0}' (expected <prefix><index>,<offset>)")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("store: {0}")]
    Store(#[from] ringlog_api::StoreError),
}
