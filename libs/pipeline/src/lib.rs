pub mod config;
pub mod error;
mod accumulator;
mod command;
mod server;
mod session;

pub use accumulator::Accumulator;
pub use command::parse_seek;
pub use config::{SessionConfig, SessionMode};
pub use error::{CommandError, SessionError};
pub use server::spawn_listener;
pub use session::{SessionStats, run_session};
