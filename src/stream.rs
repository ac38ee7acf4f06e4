//! Random-access byte cursor over an in-memory FIT buffer.
//!
//! All record decoding goes through this cursor: it owns the file bytes,
//! tracks an explicit offset, and performs endian-aware typed reads with
//! bounds checking on every access. The last two bytes of the buffer hold
//! the file CRC, so [`ByteStream::at_end`] reports true once the cursor has
//! consumed everything up to (but not including) the trailer.

use crate::crc::CRC_SIZE;
use crate::types::Endianness;
use crate::{FitError, Result};

/// Owned byte buffer with an explicit read cursor.
#[derive(Debug, Clone)]
pub struct ByteStream {
    data: Vec<u8>,
    offset: usize,
}

impl ByteStream {
    /// Wrap a byte buffer, cursor at the start.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, offset: 0 }
    }

    /// Total buffer length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current cursor offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Bytes between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// True once the cursor has reached the trailing CRC.
    ///
    /// The two trailer bytes are reserved: record decoding must never
    /// consume them through ordinary reads.
    pub fn at_end(&self) -> bool {
        self.offset + CRC_SIZE >= self.data.len()
    }

    /// Move the cursor to an absolute offset in `[0, len]`.
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(FitError::stream_at(
                format!("seek target {} beyond buffer of {} bytes", offset, self.data.len()),
                self.offset,
            ));
        }
        self.offset = offset;
        Ok(())
    }

    /// Move the cursor back to the start of the buffer.
    pub fn seek_start(&mut self) {
        self.offset = 0;
    }

    /// Read the next byte without advancing.
    pub fn peek_byte(&self) -> Result<u8> {
        self.data
            .get(self.offset)
            .copied()
            .ok_or_else(|| FitError::stream_at("peek past end of buffer", self.offset))
    }

    /// Read the next `n` bytes without advancing.
    pub fn peek_bytes(&self, n: usize) -> Result<&[u8]> {
        self.data
            .get(self.offset..self.offset + n)
            .ok_or_else(|| FitError::stream_at(format!("peek of {} bytes past end", n), self.offset))
    }

    /// Read a single byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        let b = self.peek_byte()?;
        self.offset += 1;
        Ok(b)
    }

    /// Read the next `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8]> {
        let start = self.offset;
        let end = start.checked_add(n).filter(|e| *e <= self.data.len()).ok_or_else(|| {
            FitError::stream_at(format!("read of {} bytes past end", n), start)
        })?;
        self.offset = end;
        Ok(&self.data[start..end])
    }

    /// Read a `u16` with the given endianness.
    pub fn read_u16(&mut self, endianness: Endianness) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        let raw = [bytes[0], bytes[1]];
        Ok(match endianness {
            Endianness::Little => u16::from_le_bytes(raw),
            Endianness::Big => u16::from_be_bytes(raw),
        })
    }

    /// Read a `u32` with the given endianness.
    pub fn read_u32(&mut self, endianness: Endianness) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
        Ok(match endianness {
            Endianness::Little => u32::from_le_bytes(raw),
            Endianness::Big => u32::from_be_bytes(raw),
        })
    }

    /// Read an `n`-byte string field, truncated at the first NUL.
    ///
    /// Returns the bytes before the terminator; UTF-8 validation is the
    /// caller's concern.
    pub fn read_string(&mut self, n: usize) -> Result<&[u8]> {
        let bytes = self.read_bytes(n)?;
        let nul = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(&bytes[..nul])
    }

    /// Borrow an arbitrary range of the buffer without moving the cursor.
    pub fn slice(&self, start: usize, len: usize) -> Result<&[u8]> {
        self.data
            .get(start..start + len)
            .ok_or_else(|| FitError::stream_at(format!("slice [{}; {}] out of bounds", start, len), start))
    }
}
