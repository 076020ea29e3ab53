//! TFRecord framing.
//!
//! Each record is `u64 length | u32 length crc | payload | u32 payload crc`,
//! all little-endian. CRC fields are skipped.

use std::io::{self, Read};

/// Upper bound on a single record; anything larger is treated as corruption.
const MAX_RECORD_LEN: u64 = 256 * 1024 * 1024;

/// Iterator over raw record payloads.
pub struct RecordReader<R> {
    inner: R,
    offset: u64,
    truncated_at: Option<u64>,
    finished: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            offset: 0,
            truncated_at: None,
            finished: false,
        }
    }

    /// Byte offset of an incomplete trailing record, if the input ended in one.
    pub fn truncated_at(&self) -> Option<u64> {
        self.truncated_at
    }

    fn read_record(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut header = [0u8; 12];
        match read_full(&mut self.inner, &mut header)? {
            0 => return Ok(None),
            12 => {}
            _ => return Ok(self.truncate()),
        }

        let len = u64::from_le_bytes(header[..8].try_into().unwrap_or([0; 8]));
        if len > MAX_RECORD_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("record length {} at offset {} exceeds limit", len, self.offset),
            ));
        }

        // Grows with the data actually present, not with the claimed length
        let mut payload = Vec::new();
        (&mut self.inner).take(len).read_to_end(&mut payload)?;
        let mut footer = [0u8; 4];
        if (payload.len() as u64) < len || read_full(&mut self.inner, &mut footer)? < 4 {
            return Ok(self.truncate());
        }

        self.offset += 12 + len + 4;
        Ok(Some(payload))
    }

    fn truncate(&mut self) -> Option<Vec<u8>> {
        self.truncated_at = Some(self.offset);
        None
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_record() {
            Ok(Some(payload)) => Some(Ok(payload)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Read until `buf` is full or the input ends; returns the bytes read.
/// A short count means the writer may still be appending.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Write one framed record with zeroed CRC fields.
#[cfg(test)]
pub fn write_record<W: std::io::Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    writer.write_all(&(payload.len() as u64).to_le_bytes())?;
    writer.write_all(&[0u8; 4])?;
    writer.write_all(payload)?;
    writer.write_all(&[0u8; 4])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_records_in_order() {
        let mut buf = Vec::new();
        write_record(&mut buf, b"first").unwrap();
        write_record(&mut buf, b"").unwrap();
        write_record(&mut buf, b"third").unwrap();

        let records: Vec<Vec<u8>> = RecordReader::new(Cursor::new(buf))
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(records, vec![b"first".to_vec(), Vec::new(), b"third".to_vec()]);
    }

    #[test]
    fn test_truncated_tail_is_ignored() {
        let mut buf = Vec::new();
        write_record(&mut buf, b"complete").unwrap();
        write_record(&mut buf, b"partial").unwrap();
        buf.truncate(buf.len() - 6);

        let mut reader = RecordReader::new(Cursor::new(buf));
        let records: Vec<Vec<u8>> = reader.by_ref().collect::<io::Result<_>>().unwrap();
        assert_eq!(records, vec![b"complete".to_vec()]);
        assert_eq!(reader.truncated_at(), Some(12 + 8 + 4));
    }

    #[test]
    fn test_corrupt_length_reports_lost_tail() {
        let mut buf = Vec::new();
        write_record(&mut buf, b"first").unwrap();
        // Claims 1 MiB but only a few bytes follow
        buf.extend_from_slice(&(1024u64 * 1024).to_le_bytes());
        buf.extend_from_slice(&[0u8; 4]);
        buf.extend_from_slice(b"short");

        let mut reader = RecordReader::new(Cursor::new(buf));
        assert_eq!(reader.next().unwrap().unwrap(), b"first".to_vec());
        assert!(reader.next().is_none());
        assert_eq!(reader.truncated_at(), Some(12 + 5 + 4));
    }

    #[test]
    fn test_partial_header_is_truncation() {
        let mut buf = Vec::new();
        write_record(&mut buf, b"ok").unwrap();
        buf.extend_from_slice(&[1, 0, 0]);

        let mut reader = RecordReader::new(Cursor::new(buf));
        assert_eq!(reader.by_ref().count(), 1);
        assert_eq!(reader.truncated_at(), Some(12 + 2 + 4));
    }

    #[test]
    fn test_oversized_length_is_an_error() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&u64::MAX.to_le_bytes());
        buf.extend_from_slice(&[0u8; 4]);

        let mut reader = RecordReader::new(Cursor::new(buf));
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_empty_input() {
        let mut reader = RecordReader::new(Cursor::new(Vec::new()));
        assert_eq!(reader.by_ref().count(), 0);
        assert_eq!(reader.truncated_at(), None);
    }
}
