pub mod error;
pub mod util;

use bytes::Bytes;

pub use error::{ErrorKind, StoreError};
pub use util::{format_timestamp, now_ms, TIMESTAMP_FORMAT};

/// Default record terminator.
pub const DEFAULT_TERMINATOR: u8 = b'\n';

// ════════════════════════════════════════════════════════════════
//  Record
// ════════════════════════════════════════════════════════════════

/// One terminator-delimited unit of submitted data.
///
/// Immutable once built. Clones share the same allocation, so handing a
/// record to the store and keeping a copy for logging costs no extra
/// buffer. The store never inspects the contents.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Record(Bytes);

impl Record {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Build a timestamp record: `timestamp:<local time><terminator>`.
    pub fn timestamp<Tz>(at: &chrono::DateTime<Tz>, terminator: u8) -> Self
    where
        Tz: chrono::TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let mut buf = format_timestamp(at).into_bytes();
        buf.push(terminator);
        Self(Bytes::from(buf))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// `true` when the last byte equals `terminator`.
    pub fn is_terminated_by(&self, terminator: u8) -> bool {
        self.0.last() == Some(&terminator)
    }
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Record({:?})", String::from_utf8_lossy(&self.0))
    }
}

impl AsRef<[u8]> for Record {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Bytes> for Record {
    fn from(b: Bytes) -> Self {
        Self(b)
    }
}

impl From<Vec<u8>> for Record {
    fn from(v: Vec<u8>) -> Self {
        Self(Bytes::from(v))
    }
}

impl From<&'static str> for Record {
    fn from(s: &'static str) -> Self {
        Self(Bytes::from_static(s.as_bytes()))
    }
}

impl From<&'static [u8]> for Record {
    fn from(s: &'static [u8]) -> Self {
        Self(Bytes::from_static(s))
    }
}

// ════════════════════════════════════════════════════════════════
//  Addressing
// ════════════════════════════════════════════════════════════════

/// Index-addressed seek request: record `record_index` (0 = oldest retained)
/// plus `byte_offset` bytes into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekTo {
    pub record_index: usize,
    pub byte_offset: usize,
}

impl SeekTo {
    pub fn new(record_index: usize, byte_offset: usize) -> Self {
        Self { record_index, byte_offset }
    }
}

impl std::fmt::Display for SeekTo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.record_index, self.byte_offset)
    }
}

/// Result of resolving a flat offset: which retained record holds it and
/// where inside that record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub record_index: usize,
    pub byte_offset: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_record_matches_rfc2822_layout() {
        let at = chrono::FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 7, 8, 9)
            .unwrap();
        let rec = Record::timestamp(&at, b'\n');
        assert_eq!(rec.as_bytes(), b"timestamp:Tue, 05 Mar 2024 07:08:09 +0000\n");
        assert!(rec.is_terminated_by(b'\n'));
    }

    #[test]
    fn clones_share_contents() {
        let a = Record::from("abc\n");
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(b.len(), 4);
        assert!(!b.is_empty());
    }
}
