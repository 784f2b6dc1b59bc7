//! Bounded ring of records with flat-offset and index-addressed reads.
//!
//! Nothing here locks: callers hold exclusive access (see the engine's
//! `SharedStore`) for the whole duration of every call.

mod reader;
mod store;

pub use store::{EntryStore, DEFAULT_CAPACITY};
