#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("{0}")]
    Engine(#[from] ringlog_engine::EngineError),

    #[error("bind {addr}: {source}")]
    Bind { addr: String, source: std::io::Error },

    #[error("connect {addr}: {source}")]
    Connect { addr: String, source: std::io::Error },

    #[error("no reply within {0}s")]
    Timeout(u64),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
