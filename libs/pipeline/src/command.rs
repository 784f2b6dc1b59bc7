use ringlog_api::{Record, SeekTo};

use crate::error::CommandError;

/// Recognise an in-band seek command: `<prefix><index>,<offset><terminator>`.
///
/// `Ok(None)` when the record does not start with `prefix` (it is plain
/// data and gets committed). A trailing `\r` before the terminator is
/// tolerated.
pub fn parse_seek(record: &Record, prefix: &str, terminator: u8) -> Result<Option<SeekTo>, CommandError> {
    let Some(rest) = record.as_bytes().strip_prefix(prefix.as_bytes()) else {
        return Ok(None);
    };
    let rest = rest.strip_suffix(&[terminator]).unwrap_or(rest);
    let rest = rest.strip_suffix(b"\r").unwrap_or(rest);

    let malformed = || CommandError::Malformed(String::from_utf8_lossy(record.as_bytes()).trim_end().to_string());

    let text = std::str::from_utf8(rest).map_err(|_| malformed())?;
    let (index, offset) = text.split_once(',').ok_or_else(malformed)?;
    let record_index = index.trim().parse::<usize>().map_err(|_| malformed())?;
    let byte_offset = offset.trim().parse::<usize>().map_err(|_| malformed())?;

    Ok(Some(SeekTo { record_index, byte_offset }))
}
