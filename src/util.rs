//! Cursor-based reader and writer for Bitcoin wire data.
//!
//! Covers the subset of the wire vocabulary this crate decodes: fixed-size
//! little-endian integers, varints, and raw byte runs.

use crate::error::WhatsOnChainError;

/// A cursor over a byte slice for reading Bitcoin wire data.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a new reader over the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, pos: 0 }
    }

    /// Read `n` bytes and advance the position.
    ///
    /// `n` may come straight from an untrusted length field; overflow of the
    /// end position reads as EOF.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], WhatsOnChainError> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or(WhatsOnChainError::UnexpectedEof)?;
        if end > self.data.len() {
            return Err(WhatsOnChainError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, WhatsOnChainError> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read a little-endian u32.
    pub fn read_u32_le(&mut self) -> Result<u32, WhatsOnChainError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a little-endian u64.
    pub fn read_u64_le(&mut self) -> Result<u64, WhatsOnChainError> {
        let bytes = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Read a Bitcoin varint (1, 3, 5, or 9 bytes).
    pub fn read_varint(&mut self) -> Result<u64, WhatsOnChainError> {
        match self.read_u8()? {
            0xff => self.read_u64_le(),
            0xfe => Ok(self.read_u32_le()? as u64),
            0xfd => {
                let bytes = self.read_bytes(2)?;
                Ok(u16::from_le_bytes([bytes[0], bytes[1]]) as u64)
            }
            b => Ok(b as u64),
        }
    }

    /// Number of unread bytes remaining.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

/// An append-only buffer for writing Bitcoin wire data.
#[derive(Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create a new empty writer.
    pub fn new() -> Self {
        ByteWriter { buf: Vec::new() }
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append a single byte.
    pub fn write_u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    /// Append a little-endian u32.
    pub fn write_u32_le(&mut self, val: u32) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a little-endian u64.
    pub fn write_u64_le(&mut self, val: u64) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a Bitcoin varint.
    pub fn write_varint(&mut self, val: u64) {
        if val < 0xfd {
            self.buf.push(val as u8);
        } else if val <= 0xffff {
            self.buf.push(0xfd);
            self.buf.extend_from_slice(&(val as u16).to_le_bytes());
        } else if val <= 0xffff_ffff {
            self.buf.push(0xfe);
            self.buf.extend_from_slice(&(val as u32).to_le_bytes());
        } else {
            self.buf.push(0xff);
            self.buf.extend_from_slice(&val.to_le_bytes());
        }
    }

    /// Consume the writer and return the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_round_trip() {
        for val in [0u64, 1, 252, 253, 65535, 65536, 4294967295, 4294967296, u64::MAX] {
            let mut writer = ByteWriter::new();
            writer.write_varint(val);
            let data = writer.into_bytes();
            let mut reader = ByteReader::new(&data);
            assert_eq!(reader.read_varint().unwrap(), val);
            assert_eq!(reader.remaining(), 0);
        }
    }

    #[test]
    fn test_varint_encoding_widths() {
        let width = |val: u64| {
            let mut writer = ByteWriter::new();
            writer.write_varint(val);
            writer.into_bytes().len()
        };
        assert_eq!(width(252), 1);
        assert_eq!(width(253), 3);
        assert_eq!(width(65535), 3);
        assert_eq!(width(65536), 5);
        assert_eq!(width(4294967295), 5);
        assert_eq!(width(4294967296), 9);
    }

    #[test]
    fn test_reader_writer_round_trip() {
        let mut writer = ByteWriter::new();
        writer.write_u8(0x42);
        writer.write_u32_le(0xDEADBEEF);
        writer.write_u64_le(0x0102030405060708);
        writer.write_varint(300);
        writer.write_bytes(b"hello");

        let data = writer.into_bytes();
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u8().unwrap(), 0x42);
        assert_eq!(reader.read_u32_le().unwrap(), 0xDEADBEEF);
        assert_eq!(reader.read_u64_le().unwrap(), 0x0102030405060708);
        assert_eq!(reader.read_varint().unwrap(), 300);
        assert_eq!(reader.read_bytes(5).unwrap(), b"hello");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_read_bytes_length_overflow_is_eof() {
        let mut reader = ByteReader::new(&[0x01, 0x02]);
        reader.read_u8().unwrap();
        assert!(matches!(
            reader.read_bytes(usize::MAX),
            Err(WhatsOnChainError::UnexpectedEof)
        ));
        // The failed read must not move the cursor.
        assert_eq!(reader.read_u8().unwrap(), 0x02);
    }

    #[test]
    fn test_reader_eof() {
        let mut reader = ByteReader::new(&[0x01]);
        assert!(reader.read_u8().is_ok());
        assert!(matches!(
            reader.read_u8(),
            Err(WhatsOnChainError::UnexpectedEof)
        ));
    }
}
