//! Versioned binary encoding of records.
//!
//! A stream is a plain concatenation of records, each written as:
//!
//! ```text
//! [version(1) | timestamp(8) | severity(1) | text(str) | depth(4) | extra(str)?]
//! ```
//!
//! Integers are little-endian. `timestamp` is the binary tick form from
//! [`clock::to_binary`]. A `str` is a 7-bit variable-length byte count
//! followed by UTF-8 bytes. `extra` is written only when the record has extra
//! data, and there is no presence flag: the reader can only tell it is absent
//! when the stream ends right after `depth`. A record without extra data in
//! the middle of a stream therefore does not read back cleanly, and `None`
//! and an empty string are indistinguishable at the end of one. Extra data is
//! stored as its rendered text only.

use std::io::{self, BufRead, Read, Write};

use crate::clock;
use crate::error::{Error, Result};
use crate::record::Record;
use crate::severity::Severity;

/// Version tag written in front of every record.
pub const RECORD_VERSION: u8 = 1;

/// Length prefixes are 32-bit values; at most five 7-bit groups.
const MAX_LENGTH_PREFIX_BYTES: usize = 5;

/// Appends one encoded record to `writer`.
///
/// A timestamp outside the tick range (before year 1 or after roughly year
/// 14600) is rejected with [`Error::MalformedRecord`] before anything is
/// written.
pub fn write_record<W: Write + ?Sized>(writer: &mut W, record: &Record) -> Result<()> {
    let timestamp = clock::to_binary(record.timestamp()).ok_or_else(|| {
        Error::MalformedRecord(format!(
            "timestamp {} is outside the encodable range",
            record.timestamp()
        ))
    })?;
    writer.write_all(&[RECORD_VERSION])?;
    writer.write_all(&timestamp.to_le_bytes())?;
    writer.write_all(&[record.severity().as_u8()])?;
    write_str(writer, record.text())?;
    let depth = i32::try_from(record.nesting_depth()).unwrap_or(i32::MAX);
    writer.write_all(&depth.to_le_bytes())?;
    if let Some(extra) = record.extra_data_as_string() {
        write_str(writer, &extra)?;
    }
    Ok(())
}

/// Encodes a record into a fresh buffer.
pub fn encode(record: &Record) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_record(&mut buf, record)?;
    Ok(buf)
}

fn write_str<W: Write + ?Sized>(writer: &mut W, s: &str) -> Result<()> {
    let len = u32::try_from(s.len()).map_err(|_| {
        Error::MalformedRecord(format!("string of {} bytes is too long to encode", s.len()))
    })?;
    write_length(writer, len)?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}

fn write_length<W: Write + ?Sized>(writer: &mut W, mut len: u32) -> io::Result<()> {
    let mut buf = [0u8; MAX_LENGTH_PREFIX_BYTES];
    let mut pos = 0;
    while len >= 0x80 {
        buf[pos] = (len as u8) | 0x80;
        len >>= 7;
        pos += 1;
    }
    buf[pos] = len as u8;
    writer.write_all(&buf[..=pos])
}

/// Sequential decoder for a binary record stream.
///
/// After the first error the reader is exhausted: there is no attempt to
/// resynchronize on a damaged or unknown-version stream.
///
/// # Examples
///
/// ```
/// use nested_logger::codec::{encode, RecordReader};
/// use nested_logger::{Record, Severity};
///
/// let record = Record::new(Severity::Notice, "disk almost full", 2).with_extra_data("93%");
/// let bytes = encode(&record)?;
///
/// let mut reader = RecordReader::new(bytes.as_slice());
/// let decoded = reader.read_record()?.unwrap();
/// assert_eq!(decoded.text(), "disk almost full");
/// assert_eq!(decoded.extra_data_as_string().as_deref(), Some("93%"));
/// assert!(reader.read_record()?.is_none());
/// # Ok::<(), nested_logger::Error>(())
/// ```
pub struct RecordReader<R> {
    inner: R,
    failed: bool,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            failed: false,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads the next record. Returns `Ok(None)` at a clean end of stream.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        if self.failed {
            return Ok(None);
        }
        let result = self.decode_next();
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn decode_next(&mut self) -> Result<Option<Record>> {
        if self.at_end()? {
            return Ok(None);
        }

        let version = self.read_u8()?;
        if version != RECORD_VERSION {
            return Err(Error::UnknownRecordVersion(version));
        }

        let timestamp = clock::from_binary(i64::from_le_bytes(self.read_array()?))?;
        let severity = Severity::try_from(self.read_u8()?)?;
        let text = self.read_str()?;
        let depth = i32::from_le_bytes(self.read_array()?);
        let depth = u32::try_from(depth)
            .map_err(|_| Error::MalformedRecord(format!("negative nesting depth {depth}")))?;

        let record = Record::new(severity, text, depth).with_timestamp(timestamp);
        if self.at_end()? {
            return Ok(Some(record));
        }
        let extra = self.read_str()?;
        Ok(Some(record.with_extra_data(extra)))
    }

    fn at_end(&mut self) -> Result<bool> {
        Ok(self.inner.fill_buf()?.is_empty())
    }

    fn read_u8(&mut self) -> Result<u8> {
        let [byte] = self.read_array()?;
        Ok(byte)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_length(&mut self) -> Result<usize> {
        let mut value: u32 = 0;
        for group in 0..MAX_LENGTH_PREFIX_BYTES {
            let byte = self.read_u8()?;
            value |= u32::from(byte & 0x7f) << (7 * group);
            if byte & 0x80 == 0 {
                return Ok(value as usize);
            }
        }
        Err(Error::MalformedRecord(
            "string length prefix is longer than five bytes".to_owned(),
        ))
    }

    fn read_str(&mut self) -> Result<String> {
        let len = self.read_length()?;
        let mut bytes = Vec::new();
        (&mut self.inner).take(len as u64).read_to_end(&mut bytes)?;
        if bytes.len() != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("string truncated: expected {len} bytes, got {}", bytes.len()),
            )
            .into());
        }
        Ok(match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        })
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}
