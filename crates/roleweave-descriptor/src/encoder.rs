//! Low-level encoding primitives for descriptor files
//!
//! Integers are little-endian; strings are a `u32` byte length followed by
//! UTF-8 bytes; optional strings carry a one-byte presence tag.

use thiserror::Error;

/// Errors that can occur while decoding descriptor bytes
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Unexpected end of input
    #[error("Unexpected end of descriptor at offset {0}")]
    UnexpectedEnd(usize),

    /// Invalid UTF-8 string
    #[error("Invalid UTF-8 string at offset {0}")]
    InvalidUtf8(usize),

    /// A tag byte with no meaning at this position
    #[error("Invalid tag {0} at offset {1}")]
    InvalidTag(u8, usize),

    /// Bytes left over after a complete structure
    #[error("{0} trailing bytes after structure")]
    TrailingBytes(usize),
}

/// Writer for descriptor bytes
#[derive(Debug, Default)]
pub struct DescriptorWriter {
    pub(crate) buffer: Vec<u8>,
}

impl DescriptorWriter {
    /// Create a new writer
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Current bytes
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the writer and return the bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Current offset (number of bytes written)
    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    /// Emit a raw byte
    pub fn emit_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Emit a 16-bit unsigned integer (little-endian)
    pub fn emit_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit a 32-bit unsigned integer (little-endian)
    pub fn emit_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit raw bytes
    pub fn emit_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Emit a length-prefixed string
    pub fn emit_string(&mut self, value: &str) {
        self.emit_u32(value.len() as u32);
        self.buffer.extend_from_slice(value.as_bytes());
    }

    /// Emit an optional string with a presence tag
    pub fn emit_opt_string(&mut self, value: Option<&str>) {
        match value {
            Some(value) => {
                self.emit_u8(1);
                self.emit_string(value);
            }
            None => self.emit_u8(0),
        }
    }

    /// Emit a count-prefixed list of strings
    pub fn emit_strings(&mut self, values: &[String]) {
        self.emit_u32(values.len() as u32);
        for value in values {
            self.emit_string(value);
        }
    }

    /// Patch a previously emitted u32 value at the given offset
    pub fn patch_u32(&mut self, offset: usize, value: u32) {
        self.buffer[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
}

/// Reader for descriptor bytes
pub struct DescriptorReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> DescriptorReader<'a> {
    /// Create a new reader
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Current position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Remaining bytes
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let value = *self
            .buffer
            .get(self.position)
            .ok_or(DecodeError::UnexpectedEnd(self.position))?;
        self.position += 1;
        Ok(value)
    }

    /// Read a 16-bit unsigned integer (little-endian)
    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.read_array::<2>()?;
        Ok(u16::from_le_bytes(bytes))
    }

    /// Read a 32-bit unsigned integer (little-endian)
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.read_array::<4>()?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Read a fixed number of bytes into an array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let slice = self.read_slice(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// Borrow the next `count` bytes
    pub fn read_slice(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .position
            .checked_add(count)
            .filter(|end| *end <= self.buffer.len())
            .ok_or(DecodeError::UnexpectedEnd(self.position))?;
        let slice = &self.buffer[self.position..end];
        self.position = end;
        Ok(slice)
    }

    /// Read a length-prefixed string
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let len = self.read_u32()? as usize;
        let start = self.position;
        let bytes = self.read_slice(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8(start))
    }

    /// Read an optional string with a presence tag
    pub fn read_opt_string(&mut self) -> Result<Option<String>, DecodeError> {
        match self.read_u8()? {
            0 => Ok(None),
            1 => Ok(Some(self.read_string()?)),
            tag => Err(DecodeError::InvalidTag(tag, self.position - 1)),
        }
    }

    /// Read a count-prefixed list of strings
    pub fn read_strings(&mut self) -> Result<Vec<String>, DecodeError> {
        let count = self.read_u32()? as usize;
        // Cap preallocation by what the input could possibly hold
        let mut values = Vec::with_capacity(count.min(self.remaining() / 4));
        for _ in 0..count {
            values.push(self.read_string()?);
        }
        Ok(values)
    }

    /// Fail if any bytes remain
    pub fn expect_end(&self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(DecodeError::TrailingBytes(n)),
        }
    }
}
