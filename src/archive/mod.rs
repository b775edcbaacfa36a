//! # Archive Format
//!
//! A `.tzip` archive is a plain sequence of records, one per input file, in
//! the byte-wise order of the file names:
//!
//! ```text
//! record  := length:u32 (little-endian) || payload:[u8; length]
//! archive := record*
//! ```
//!
//! There is no header, index or checksum beyond the one inside each zlib
//! payload. A record's identity is its position, so a reader needs the sorted
//! file list to put names back on the records.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crate::common::FileList;
use crate::compress::inflate;
use crate::error::{Result, TzipError};
use crate::workers::SlotTable;

/// Size of the length field in front of every record.
pub const RECORD_HEADER_LEN: usize = 4;

/// Largest up-front allocation made for a record payload while reading.
const MAX_PAYLOAD_RESERVE: usize = 64 * 1024;

/// Appends records to an output sink.
pub struct ArchiveWriter<W: Write> {
    writer: BufWriter<W>,
    path: PathBuf,
    records: usize,
}

impl<W: Write> ArchiveWriter<W> {
    /// Wraps `inner`; `path` is only used to label errors.
    pub fn new(inner: W, path: impl Into<PathBuf>) -> Self {
        Self {
            writer: BufWriter::new(inner),
            path: path.into(),
            records: 0,
        }
    }

    /// Writes one length-prefixed record.
    pub fn write_record(&mut self, payload: &[u8]) -> Result<()> {
        let len = u32::try_from(payload.len()).map_err(|_| TzipError::RecordTooLarge {
            path: self.path.clone(),
            size: payload.len(),
        })?;
        self.writer.write_all(&len.to_le_bytes()).map_err(|e| self.io_error(e))?;
        self.writer.write_all(payload).map_err(|e| self.io_error(e))?;
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }

    /// Flushes buffered records and hands back the sink.
    pub fn finish(self) -> Result<W> {
        let path = self.path;
        self.writer.into_inner().map_err(|e| TzipError::OutputWrite {
            path,
            source: e.into_error(),
        })
    }

    fn io_error(&self, source: io::Error) -> TzipError {
        TzipError::OutputWrite { path: self.path.clone(), source }
    }
}

/// Drains `slots` into `writer` in index order, releasing each buffer once written.
///
/// Empty slots belong to files skipped by the error policy and produce no record.
/// Returns the number of records written.
pub fn write_slots<W: Write>(writer: &mut ArchiveWriter<W>, slots: SlotTable, files: &FileList) -> Result<usize> {
    let mut written = 0;
    for (index, slot) in slots.into_slots().enumerate() {
        let Some(slot) = slot else {
            tracing::debug!(index, "no record for slot");
            continue;
        };
        writer.write_record(&slot.data).map_err(|e| match e {
            TzipError::RecordTooLarge { size, .. } => TzipError::RecordTooLarge {
                path: files.path(index).unwrap_or_default(),
                size,
            },
            other => other,
        })?;
        written += 1;
    }
    Ok(written)
}

/// Iterates the raw (still compressed) payloads of an archive.
pub struct ArchiveReader<R: Read> {
    reader: R,
    offset: u64,
    done: bool,
}

impl<R: Read> ArchiveReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, offset: 0, done: false }
    }

    /// Byte offset of the next record.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn read_record(&mut self) -> Result<Option<Vec<u8>>> {
        let mut header = [0u8; RECORD_HEADER_LEN];
        let filled = read_full(&mut self.reader, &mut header).map_err(|e| self.corrupt(e.to_string()))?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < RECORD_HEADER_LEN {
            return Err(self.corrupt(format!("truncated length field ({filled} of {RECORD_HEADER_LEN} bytes)")));
        }

        let len = u32::from_le_bytes(header) as usize;
        // The length comes from the file; let the buffer grow with what is actually read.
        let mut payload = Vec::with_capacity(len.min(MAX_PAYLOAD_RESERVE));
        let read = (&mut self.reader).take(len as u64).read_to_end(&mut payload);
        let got = read.map_err(|e| self.corrupt(e.to_string()))?;
        if got < len {
            return Err(self.corrupt(format!("truncated payload ({got} of {len} bytes)")));
        }

        self.offset += (RECORD_HEADER_LEN + len) as u64;
        Ok(Some(payload))
    }

    fn corrupt(&self, reason: String) -> TzipError {
        TzipError::CorruptArchive { offset: self.offset, reason }
    }
}

impl<R: Read> Iterator for ArchiveReader<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(payload)) => Some(Ok(payload)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Reads as many bytes as are available up to `buf.len()`, stopping early only at EOF.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn open_archive(path: &Path) -> Result<ArchiveReader<BufReader<File>>> {
    let file = File::open(path).map_err(|e| TzipError::CorruptArchive {
        offset: 0,
        reason: format!("cannot open '{}': {e}", path.display()),
    })?;
    Ok(ArchiveReader::new(BufReader::new(file)))
}

/// Loads every compressed payload of the archive at `path`.
pub fn read_records(path: &Path) -> Result<Vec<Vec<u8>>> {
    open_archive(path)?.collect()
}

/// Inflates every record of the archive at `path` and checks the record count.
///
/// Returns the total number of inflated bytes.
pub fn verify_archive(path: &Path, expected_records: usize) -> Result<u64> {
    let mut reader = open_archive(path)?;
    let mut records = 0usize;
    let mut inflated = 0u64;

    loop {
        let offset = reader.offset();
        let Some(payload) = reader.next() else { break };
        let data = inflate(&payload?).map_err(|e| TzipError::CorruptArchive {
            offset,
            reason: format!("record {records} does not inflate: {e}"),
        })?;
        inflated += data.len() as u64;
        records += 1;
    }

    if records != expected_records {
        return Err(TzipError::CorruptArchive {
            offset: reader.offset(),
            reason: format!("expected {expected_records} records, found {records}"),
        });
    }
    Ok(inflated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::{Compressor, ZlibCompressor};
    use crate::workers::Slot;
    use std::io::Cursor;

    #[test]
    fn records_are_length_prefixed_little_endian() {
        let mut writer = ArchiveWriter::new(Vec::new(), "mem");
        writer.write_record(b"abc").unwrap();
        writer.write_record(b"").unwrap();
        assert_eq!(writer.records(), 2);
        let bytes = writer.finish().unwrap();
        assert_eq!(bytes, [3, 0, 0, 0, b'a', b'b', b'c', 0, 0, 0, 0]);
    }

    #[test]
    fn reader_yields_records_in_order() {
        let bytes = vec![2, 0, 0, 0, 7, 8, 1, 0, 0, 0, 9];
        let records: Vec<_> = ArchiveReader::new(Cursor::new(bytes)).collect::<Result<_>>().unwrap();
        assert_eq!(records, vec![vec![7, 8], vec![9]]);
    }

    #[test]
    fn reader_reports_truncated_payload() {
        let bytes = vec![5, 0, 0, 0, 1, 2];
        let mut reader = ArchiveReader::new(Cursor::new(bytes));
        assert!(matches!(reader.next(), Some(Err(TzipError::CorruptArchive { offset: 0, .. }))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn reader_reports_truncated_length() {
        let bytes = vec![1, 0, 0, 0, 42, 3, 0];
        let mut reader = ArchiveReader::new(Cursor::new(bytes));
        assert_eq!(reader.next().unwrap().unwrap(), vec![42]);
        assert!(matches!(reader.next(), Some(Err(TzipError::CorruptArchive { offset: 5, .. }))));
    }

    #[test]
    fn oversized_length_field_is_reported_as_truncation() {
        let bytes = vec![0xFF, 0xFF, 0xFF, 0xFF, 1, 2, 3];
        let mut reader = ArchiveReader::new(Cursor::new(bytes));
        match reader.next() {
            Some(Err(TzipError::CorruptArchive { offset: 0, reason })) => assert!(reason.contains("3 of 4294967295")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn write_slots_skips_empty_slots() {
        let compressor = ZlibCompressor::default();
        let files = FileList::from_names("/src", ["a.txt", "b.txt", "c.txt"]);
        let slots = SlotTable::new(3);
        for index in [0, 2] {
            let data = compressor.compress(b"hello").unwrap();
            slots.store(index, Slot { input_len: 5, data }).unwrap();
        }

        let mut writer = ArchiveWriter::new(Vec::new(), "mem");
        assert_eq!(write_slots(&mut writer, slots, &files).unwrap(), 2);
        let bytes = writer.finish().unwrap();
        let records: Vec<_> = ArchiveReader::new(Cursor::new(bytes)).collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 2);
        for record in records {
            assert_eq!(inflate(&record).unwrap(), b"hello");
        }
    }
}
