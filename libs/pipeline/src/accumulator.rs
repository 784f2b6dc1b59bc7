use bytes::{Buf, BytesMut};

use ringlog_api::{Record, StoreError};

// ═══════════════════════════════════════════════════════════════
//  Accumulator: terminator framing over one session's byte stream
// ═══════════════════════════════════════════════════════════════

/// Per-session scratch buffer that cuts the incoming byte stream into
/// records, one per terminator byte.
///
/// Bytes that follow a terminator in the same chunk stay pending and
/// become the start of the next record.
#[derive(Debug)]
pub struct Accumulator {
    pending: BytesMut,
    terminator: u8,
    max_record_bytes: Option<usize>,
    /// Prefix of `pending` already known to hold no terminator.
    scanned: usize,
    /// Set after an oversized record was dropped; everything up to the
    /// next terminator belongs to it and is skipped.
    discarding: bool,
}

impl Accumulator {
    pub fn new(terminator: u8, max_record_bytes: Option<usize>) -> Self {
        Self {
            pending: BytesMut::new(),
            terminator,
            max_record_bytes,
            scanned: 0,
            discarding: false,
        }
    }

    /// Append a received chunk. Empty chunks are ignored.
    pub fn feed(&mut self, chunk: &[u8]) {
        if !chunk.is_empty() {
            self.pending.extend_from_slice(chunk);
        }
    }

    /// Take the next completed record, terminator included.
    ///
    /// `Ok(None)` means more bytes are needed. `ResourceExhaustion` means a
    /// record outgrew `max_record_bytes`: its bytes are dropped and the
    /// remainder of it (up to the next terminator) will be skipped.
    pub fn next_record(&mut self) -> Result<Option<Record>, StoreError> {
        loop {
            let terminator_at = self.find_terminator();

            if self.discarding {
                match terminator_at {
                    Some(pos) => {
                        self.consume(pos + 1);
                        self.discarding = false;
                        continue;
                    }
                    None => {
                        self.reset();
                        return Ok(None);
                    }
                }
            }

            let record_len = terminator_at.map(|pos| pos + 1);
            let size = record_len.unwrap_or(self.pending.len());
            if let Some(limit) = self.max_record_bytes {
                if size > limit {
                    return Err(self.reject(limit, record_len));
                }
            }

            return Ok(record_len.map(|len| {
                self.scanned = 0;
                Record::from(self.pending.split_to(len).freeze())
            }));
        }
    }

    /// First terminator in `pending`. Only bytes past `scanned` are searched.
    fn find_terminator(&mut self) -> Option<usize> {
        let found = self.pending[self.scanned..]
            .iter()
            .position(|&b| b == self.terminator)
            .map(|i| self.scanned + i);
        if found.is_none() {
            self.scanned = self.pending.len();
        }
        found
    }

    fn consume(&mut self, len: usize) {
        self.pending.advance(len);
        self.scanned = 0;
    }

    fn reset(&mut self) {
        self.pending.clear();
        self.scanned = 0;
    }

    fn reject(&mut self, limit: usize, record_len: Option<usize>) -> StoreError {
        let pending = match record_len {
            Some(len) => {
                self.consume(len);
                len
            }
            None => {
                let len = self.pending.len();
                self.reset();
                self.discarding = true;
                len
            }
        };
        StoreError::ResourceExhaustion { limit, pending }
    }

    /// Bytes received since the last terminator.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    pub fn terminator(&self) -> u8 {
        self.terminator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(acc: &mut Accumulator) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(r) = acc.next_record().unwrap() {
            out.push(r.as_bytes().to_vec());
        }
        out
    }

    #[test]
    fn terminator_mid_chunk_holds_over_suffix() {
        let mut acc = Accumulator::new(b'\n', None);
        acc.feed(b"ab\ncd");
        assert_eq!(drain(&mut acc), vec![b"ab\n".to_vec()]);
        assert_eq!(acc.pending(), b"cd");
    }

    #[test]
    fn record_spans_several_feeds() {
        let mut acc = Accumulator::new(b'\n', None);
        acc.feed(b"hel");
        assert!(acc.next_record().unwrap().is_none());
        acc.feed(b"lo wo");
        assert!(acc.next_record().unwrap().is_none());
        acc.feed(b"rld\n");
        assert_eq!(drain(&mut acc), vec![b"hello world\n".to_vec()]);
        assert!(acc.pending().is_empty());
    }

    #[test]
    fn one_record_per_terminator() {
        let mut acc = Accumulator::new(b'\n', None);
        acc.feed(b"a\n\nbb\nc");
        assert_eq!(drain(&mut acc), vec![b"a\n".to_vec(), b"\n".to_vec(), b"bb\n".to_vec()]);
        assert_eq!(acc.pending(), b"c");
    }

    #[test]
    fn empty_feed_is_noop() {
        let mut acc = Accumulator::new(b'\n', None);
        acc.feed(b"");
        assert!(acc.next_record().unwrap().is_none());
        assert!(acc.pending().is_empty());
    }

    #[test]
    fn custom_terminator() {
        let mut acc = Accumulator::new(0, None);
        acc.feed(b"x\ny\0z");
        assert_eq!(drain(&mut acc), vec![b"x\ny\0".to_vec()]);
        assert_eq!(acc.terminator(), 0);
    }

    #[test]
    fn oversized_unterminated_record_is_discarded_until_terminator() {
        let mut acc = Accumulator::new(b'\n', Some(4));
        acc.feed(b"abcdef");
        assert_eq!(
            acc.next_record(),
            Err(StoreError::ResourceExhaustion { limit: 4, pending: 6 })
        );
        assert!(acc.pending().is_empty());

        // Tail of the dropped record, then a fresh one.
        acc.feed(b"gh\nok\n");
        assert_eq!(drain(&mut acc), vec![b"ok\n".to_vec()]);
    }

    #[test]
    fn oversized_terminated_record_is_rejected_alone() {
        let mut acc = Accumulator::new(b'\n', Some(3));
        acc.feed(b"long\nab\n");
        assert_eq!(
            acc.next_record(),
            Err(StoreError::ResourceExhaustion { limit: 3, pending: 5 })
        );
        assert_eq!(drain(&mut acc), vec![b"ab\n".to_vec()]);
    }

    #[test]
    fn long_unterminated_record_is_scanned_once() {
        let mut acc = Accumulator::new(b'\n', None);
        let chunk = [b'x'; 1024];
        for i in 1..=512 {
            acc.feed(&chunk);
            assert!(acc.next_record().unwrap().is_none());
            assert_eq!(acc.scanned, i * 1024);
        }

        acc.feed(b"\nnext");
        let record = acc.next_record().unwrap().unwrap();
        assert_eq!(record.len(), 512 * 1024 + 1);
        assert!(record.is_terminated_by(b'\n'));
        assert_eq!(acc.pending(), b"next");
        assert!(acc.next_record().unwrap().is_none());
        assert_eq!(acc.scanned, 4);
    }

    #[test]
    fn several_terminators_in_one_feed_after_a_long_prefix() {
        let mut acc = Accumulator::new(b'\n', None);
        acc.feed(&[b'a'; 4096]);
        assert!(acc.next_record().unwrap().is_none());
        acc.feed(b"\nb\nc");
        assert_eq!(acc.next_record().unwrap().map(|r| r.len()), Some(4097));
        assert_eq!(drain(&mut acc), vec![b"b\n".to_vec()]);
        assert_eq!(acc.pending(), b"c");
    }

    #[test]
    fn record_at_the_limit_is_accepted() {
        let mut acc = Accumulator::new(b'\n', Some(3));
        acc.feed(b"ab\n");
        assert_eq!(drain(&mut acc), vec![b"ab\n".to_vec()]);
    }
}
