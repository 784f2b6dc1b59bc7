use serde::Deserialize;

use ringlog_api::DEFAULT_TERMINATOR;

// ═══════════════════════════════════════════════════════════════
//  Session Mode
// ═══════════════════════════════════════════════════════════════

/// What a session sends back after each completed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Every record is committed; the full retained stream is echoed back.
    #[default]
    Legacy,
    /// Like `Legacy`, but records starting with the seek prefix are parsed
    /// as `<prefix><index>,<offset>` commands: nothing is committed and the
    /// bytes from the named position to the end are sent back.
    Seek,
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionMode::Legacy => f.write_str("legacy"),
            SessionMode::Seek => f.write_str("seek"),
        }
    }
}

impl std::str::FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(SessionMode::Legacy),
            "seek" => Ok(SessionMode::Seek),
            other => Err(format!("unknown session mode '{other}' (expected legacy|seek)")),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Session Config
// ═══════════════════════════════════════════════════════════════

/// Per-connection behaviour, shared by all sessions of one listener.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub mode: SessionMode,
    /// Byte that ends a record (default `\n`).
    #[serde(default = "default_terminator")]
    pub terminator: u8,
    /// Size of one socket read.
    #[serde(default = "default_read_chunk")]
    pub read_chunk: usize,
    /// Upper bound on one record, terminator included. Unbounded when absent.
    #[serde(default)]
    pub max_record_bytes: Option<usize>,
    /// Prefix of in-band seek commands (seek mode only).
    #[serde(default = "default_seek_prefix")]
    pub seek_prefix: String,
}

fn default_terminator() -> u8 {
    DEFAULT_TERMINATOR
}
fn default_read_chunk() -> usize {
    1024
}
fn default_seek_prefix() -> String {
    "AESDCHAR_IOCSEEKTO:".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: SessionMode::default(),
            terminator: default_terminator(),
            read_chunk: default_read_chunk(),
            max_record_bytes: None,
            seek_prefix: default_seek_prefix(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.read_chunk == 0 {
            return Err("session.read_chunk must be > 0".into());
        }
        if self.max_record_bytes == Some(0) {
            return Err("session.max_record_bytes must be > 0 when set".into());
        }
        if self.mode == SessionMode::Seek && self.seek_prefix.is_empty() {
            return Err("session.seek_prefix must not be empty in seek mode".into());
        }
        if self.seek_prefix.as_bytes().contains(&self.terminator) {
            return Err("session.seek_prefix must not contain the terminator".into());
        }
        Ok(())
    }
}
