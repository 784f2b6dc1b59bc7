use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use pipeline::{SessionConfig, SessionMode};
use ringlog_engine::{EngineConfig, StoreConfig, TimestampConfig};

use crate::error::ServerError;

#[derive(Parser)]
#[command(name = "ringlog-server", about = "Shared bounded record log over TCP")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the server in the foreground
    Serve(ServeArgs),
    /// Submit a payload to a running server and print the reply
    Send(SendArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Path to the TOML config file (defaults are used when it is missing)
    #[arg(long, default_value = "ringlog.toml", env = "RINGLOG_CONFIG")]
    pub config: String,

    /// Listen address, overrides server.host
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port, overrides server.port
    #[arg(long)]
    pub port: Option<u16>,

    /// Records kept, overrides store.capacity
    #[arg(long)]
    pub capacity: Option<usize>,

    /// legacy | seek, overrides session.mode
    #[arg(long)]
    pub mode: Option<SessionMode>,

    /// Disable the periodic timestamp record
    #[arg(long)]
    pub no_timestamps: bool,
}

#[derive(Args, Clone, Debug)]
pub struct SendArgs {
    /// Server address
    #[arg(long, default_value = "127.0.0.1:9000", env = "RINGLOG_ADDR")]
    pub addr: String,

    /// Record terminator byte
    #[arg(long, default_value_t = ringlog_api::DEFAULT_TERMINATOR)]
    pub terminator: u8,

    /// Seconds to wait for the reply
    #[arg(long, default_value_t = 5)]
    pub timeout_secs: u64,

    /// Payload words, joined by spaces. Read from stdin when empty.
    pub payload: Vec<String>,
}

// ---- TOML Config ----

#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ListenConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub timestamp: TimestampConfig,
}

#[derive(Debug, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long shutdown waits for open sessions.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    9000
}
fn default_shutdown_timeout_secs() -> u64 {
    5
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &str) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        Self::parse(&content)
            .map_err(|e| ServerError::Config { context: "parse", detail: format!("'{path}': {e}") })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// A missing file means defaults; any other failure is an error.
    pub fn load_or_default(path: &str) -> Result<Self, ServerError> {
        match Self::load(path) {
            Ok(cfg) => Ok(cfg),
            Err(_) if !std::path::Path::new(path).exists() => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Effective: merged config
// ═══════════════════════════════════════════════════════════════

/// Final config after the merge: ringlog.toml < env/CLI
#[derive(Debug)]
pub struct Effective {
    pub addr: String,
    pub shutdown_timeout: Duration,
    pub engine: EngineConfig,
    pub session: SessionConfig,
}

impl Effective {
    pub fn new(args: &ServeArgs) -> Result<Self, ServerError> {
        let cfg = ServerConfig::load_or_default(&args.config)?;
        Self::merge(cfg, args)
    }

    pub fn merge(mut cfg: ServerConfig, args: &ServeArgs) -> Result<Self, ServerError> {
        if let Some(host) = &args.host {
            cfg.server.host = host.clone();
        }
        if let Some(port) = args.port {
            cfg.server.port = port;
        }
        if let Some(capacity) = args.capacity {
            cfg.store.capacity = capacity;
        }
        if let Some(mode) = args.mode {
            cfg.session.mode = mode;
        }
        if args.no_timestamps {
            cfg.timestamp.enabled = false;
        }

        cfg.session
            .validate()
            .map_err(|detail| ServerError::Config { context: "validate", detail })?;
        let engine = EngineConfig::new(&cfg.store, &cfg.timestamp, cfg.session.terminator)
            .map_err(|e| e.with_context("validate"))?;

        Ok(Self {
            addr: format!("{}:{}", cfg.server.host, cfg.server.port),
            shutdown_timeout: Duration::from_secs(cfg.server.shutdown_timeout_secs),
            engine,
            session: cfg.session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serve_args(extra: &[&str]) -> ServeArgs {
        let argv = ["ringlog-server", "serve"].into_iter().chain(extra.iter().copied());
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Serve(args) => args,
            Commands::Send(_) => unreachable!(),
        }
    }

    #[test]
    fn empty_file_gives_defaults() {
        let eff = Effective::merge(ServerConfig::parse("").unwrap(), &serve_args(&[])).unwrap();
        assert_eq!(eff.addr, "0.0.0.0:9000");
        assert_eq!(eff.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(eff.engine.capacity, 10);
        assert_eq!(eff.engine.timestamp_interval, Some(Duration::from_secs(10)));
        assert_eq!(eff.session.mode, SessionMode::Legacy);
    }

    #[test]
    fn file_sections_are_read() {
        let cfg = ServerConfig::parse(
            r#"
[server]
host = "127.0.0.1"
port = 9100
shutdown_timeout_secs = 1

[store]
capacity = 3

[session]
mode = "seek"
max_record_bytes = 4096

[timestamp]
interval_secs = 2
"#,
        )
        .unwrap();
        let eff = Effective::merge(cfg, &serve_args(&[])).unwrap();
        assert_eq!(eff.addr, "127.0.0.1:9100");
        assert_eq!(eff.engine.capacity, 3);
        assert_eq!(eff.engine.timestamp_interval, Some(Duration::from_secs(2)));
        assert_eq!(eff.session.mode, SessionMode::Seek);
        assert_eq!(eff.session.max_record_bytes, Some(4096));
    }

    #[test]
    fn cli_overrides_file() {
        let cfg = ServerConfig::parse("[server]\nport = 9100\n[store]\ncapacity = 3\n").unwrap();
        let args = serve_args(&["--port", "9200", "--capacity", "7", "--mode", "seek", "--no-timestamps"]);
        let eff = Effective::merge(cfg, &args).unwrap();
        assert_eq!(eff.addr, "0.0.0.0:9200");
        assert_eq!(eff.engine.capacity, 7);
        assert_eq!(eff.engine.timestamp_interval, None);
        assert_eq!(eff.session.mode, SessionMode::Seek);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let cfg = ServerConfig::parse("[store]\ncapacity = 0\n").unwrap();
        assert!(Effective::merge(cfg, &serve_args(&[])).is_err());

        let cfg = ServerConfig::parse("[session]\nread_chunk = 0\n").unwrap();
        assert!(Effective::merge(cfg, &serve_args(&[])).is_err());

        assert!(ServerConfig::parse("[session]\nmode = \"other\"\n").is_err());
        assert!(Cli::try_parse_from(["ringlog-server", "serve", "--mode", "other"]).is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = ServerConfig::load_or_default("/nonexistent/ringlog.toml").unwrap();
        assert_eq!(cfg.server.port, 9000);
    }

    #[test]
    fn send_args_collect_payload() {
        let cli = Cli::try_parse_from(["ringlog-server", "send", "--addr", "127.0.0.1:9100", "hello", "world"]).unwrap();
        match cli.command {
            Commands::Send(args) => {
                assert_eq!(args.addr, "127.0.0.1:9100");
                assert_eq!(args.payload, vec!["hello", "world"]);
                assert_eq!(args.terminator, b'\n');
            }
            Commands::Serve(_) => unreachable!(),
        }
    }
}
