use ringlog_api::{SeekTo, StoreError};

use crate::store::EntryStore;

// ═══════════════════════════════════════════════════════════════
//  Addressed reads over the concatenated record stream
// ═══════════════════════════════════════════════════════════════

impl EntryStore {
    /// Copy bytes starting at flat `offset` into `buf`.
    ///
    /// Returns the number of bytes copied: less than `buf.len()` when the
    /// end of retained data is reached, zero at or past the end.
    pub fn read_into(&self, offset: usize, buf: &mut [u8]) -> usize {
        let mut written = 0;
        while written < buf.len() {
            let Some((record, intra)) = self.find(offset + written) else {
                break;
            };
            let chunk = &record.as_bytes()[intra..];
            let n = chunk.len().min(buf.len() - written);
            buf[written..written + n].copy_from_slice(&chunk[..n]);
            written += n;
        }
        written
    }

    /// Up to `len` bytes starting at flat `offset`.
    pub fn read_at(&self, offset: usize, len: usize) -> Vec<u8> {
        let available = self.total_len().saturating_sub(offset);
        let mut buf = vec![0u8; len.min(available)];
        let n = self.read_into(offset, &mut buf);
        buf.truncate(n);
        buf
    }

    /// Whole retained stream, oldest record first.
    pub fn read_all(&self) -> Vec<u8> {
        self.read_at(0, self.total_len())
    }

    /// Flat offset of `seek`: lengths of records `0..record_index` plus
    /// `byte_offset`.
    ///
    /// `byte_offset` may equal the record length (end of that record) but
    /// not exceed it.
    pub fn seek_offset(&self, seek: SeekTo) -> Result<usize, StoreError> {
        let record = self.get(seek.record_index).ok_or(StoreError::IndexOutOfRange {
            record_index: seek.record_index,
            retained: self.len(),
        })?;
        if seek.byte_offset > record.len() {
            return Err(StoreError::OffsetOutOfRange {
                record_index: seek.record_index,
                byte_offset: seek.byte_offset,
                record_len: record.len(),
            });
        }
        let preceding: usize = self.iter().take(seek.record_index).map(|r| r.len()).sum();
        Ok(preceding + seek.byte_offset)
    }

    /// Up to `len` bytes starting at the position named by `seek`.
    pub fn read_indexed(&self, seek: SeekTo, len: usize) -> Result<Vec<u8>, StoreError> {
        let offset = self.seek_offset(seek)?;
        Ok(self.read_at(offset, len))
    }
}
