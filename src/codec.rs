//! Binary primitives for the save-file wire format
//!
//! Everything in an Elden Ring save is little-endian. Strings are UTF-16LE
//! with a declared byte capacity: the full capacity is always consumed on
//! read and always emitted on write, with the text truncated at the first
//! NUL code unit.

use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use std::io::{Cursor, Read};

use crate::error::{Result, SaveError};

// =============================================================================
// READER
// =============================================================================

/// Sequential reader over a save-file image.
///
/// Thin wrapper around `io::Cursor` that converts short reads into
/// [`SaveError::Truncated`] and keeps the byte position addressable, which
/// the slot codec needs for its offset map.
pub struct SaveCursor<'a> {
    inner: Cursor<&'a [u8]>,
}

impl<'a> SaveCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            inner: Cursor::new(data),
        }
    }

    /// Current byte position from the start of the buffer.
    pub fn position(&self) -> usize {
        self.inner.position() as usize
    }

    /// Total buffer length.
    pub fn len(&self) -> usize {
        self.inner.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.get_ref().is_empty()
    }

    /// Remaining bytes from the current position to the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position())
    }

    /// Jump to an absolute position. Positions past the end are allowed
    /// (the next read fails with `Truncated`), matching `io::Cursor`.
    pub fn seek_to(&mut self, position: usize) {
        self.inner.set_position(position as u64);
    }

    /// Advance the position by `n` bytes without looking at them.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        if self.remaining() < n {
            return Err(self.truncated(n));
        }
        self.seek_to(self.position() + n);
        Ok(())
    }

    fn truncated(&self, wanted: usize) -> SaveError {
        SaveError::Truncated {
            offset: self.position(),
            wanted,
        }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.inner.read_u8().map_err(|_| self.truncated(1))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.inner.read_u16::<LE>().map_err(|_| self.truncated(2))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.inner.read_u32::<LE>().map_err(|_| self.truncated(4))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.inner.read_u64::<LE>().map_err(|_| self.truncated(8))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.inner.read_i32::<LE>().map_err(|_| self.truncated(4))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.inner.read_f32::<LE>().map_err(|_| self.truncated(4))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.inner.read_f64::<LE>().map_err(|_| self.truncated(8))
    }

    /// Read exactly `n` bytes into an owned buffer.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        if self.remaining() < n {
            return Err(self.truncated(n));
        }
        let mut buf = vec![0u8; n];
        self.inner
            .read_exact(&mut buf)
            .map_err(|_| self.truncated(n))?;
        Ok(buf)
    }

    /// Read a fixed-size byte array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        if self.remaining() < N {
            return Err(self.truncated(N));
        }
        let mut buf = [0u8; N];
        self.inner
            .read_exact(&mut buf)
            .map_err(|_| self.truncated(N))?;
        Ok(buf)
    }

    /// Read a UTF-16LE string stored in a fixed `capacity_bytes` field.
    ///
    /// The whole capacity is consumed; the returned string stops at the
    /// first NUL code unit. Unpaired surrogates are replaced rather than
    /// rejected (save files in the wild contain garbage past the NUL).
    pub fn read_wstring(&mut self, capacity_bytes: usize) -> Result<String> {
        let raw = self.read_bytes(capacity_bytes)?;
        Ok(decode_wstring(&raw))
    }
}

/// Decode a fixed UTF-16LE field, stopping at the first NUL code unit.
pub fn decode_wstring(raw: &[u8]) -> String {
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

// =============================================================================
// WRITER
// =============================================================================

/// Append-only encoder used to re-serialize mutable substructures.
///
/// Writes are infallible: the writer grows its buffer as needed and the
/// caller checks the final length against the substructure's declared
/// size before anything touches the raw save image.
#[derive(Default)]
pub struct SaveWriter {
    buf: Vec<u8>,
}

impl SaveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.write_u8(value).expect("vec write");
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.write_u16::<LE>(value).expect("vec write");
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.write_u32::<LE>(value).expect("vec write");
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.write_u64::<LE>(value).expect("vec write");
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.write_i32::<LE>(value).expect("vec write");
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buf.write_f32::<LE>(value).expect("vec write");
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.write_f64::<LE>(value).expect("vec write");
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Encode a string into a fixed UTF-16LE field of `capacity_bytes`.
    ///
    /// The text is truncated to fit (leaving room for the NUL terminator)
    /// and the remainder of the capacity is zero-filled.
    pub fn write_wstring(&mut self, value: &str, capacity_bytes: usize) {
        let max_units = capacity_bytes / 2;
        let mut written = 0usize;
        for unit in value.encode_utf16() {
            if written + 1 >= max_units {
                break;
            }
            self.buf.write_u16::<LE>(unit).expect("vec write");
            written += 1;
        }
        // NUL terminator plus zero fill to capacity
        for _ in written * 2..capacity_bytes {
            self.buf.push(0);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_integers_little_endian() {
        let data = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0xFF];
        let mut cur = SaveCursor::new(&data);
        assert_eq!(cur.read_u16().unwrap(), 1);
        assert_eq!(cur.read_u32().unwrap(), 2);
        assert_eq!(cur.read_u8().unwrap(), 0xFF);
        assert_eq!(cur.position(), 7);
    }

    #[test]
    fn test_read_past_end_is_truncated() {
        let data = [0x01, 0x02];
        let mut cur = SaveCursor::new(&data);
        let err = cur.read_u32().unwrap_err();
        assert!(matches!(err, SaveError::Truncated { offset: 0, wanted: 4 }));
    }

    #[test]
    fn test_skip_past_end_is_truncated() {
        let data = [0u8; 4];
        let mut cur = SaveCursor::new(&data);
        assert!(cur.skip(4).is_ok());
        assert!(cur.skip(1).is_err());
    }

    #[test]
    fn test_wstring_roundtrip() {
        let mut w = SaveWriter::new();
        w.write_wstring("Tarnished", 0x22);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 0x22);

        let mut cur = SaveCursor::new(&bytes);
        assert_eq!(cur.read_wstring(0x22).unwrap(), "Tarnished");
        // Full capacity consumed even though the name is short
        assert_eq!(cur.position(), 0x22);
    }

    #[test]
    fn test_wstring_truncates_to_capacity() {
        let mut w = SaveWriter::new();
        // 16-unit capacity: 7 units of text + NUL fit, rest is cut
        w.write_wstring("abcdefghijklmnop", 16);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 16);
        assert_eq!(decode_wstring(&bytes), "abcdefg");
    }

    #[test]
    fn test_wstring_stops_at_nul() {
        let mut raw = Vec::new();
        for unit in "Melina\0junk".encode_utf16() {
            raw.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_wstring(&raw), "Melina");
    }

    #[test]
    fn test_read_bytes_exact() {
        let data = [1, 2, 3, 4, 5];
        let mut cur = SaveCursor::new(&data);
        assert_eq!(cur.read_bytes(3).unwrap(), vec![1, 2, 3]);
        assert_eq!(cur.remaining(), 2);
        assert!(cur.read_bytes(3).is_err());
    }

    #[test]
    fn test_float_roundtrip() {
        let mut w = SaveWriter::new();
        w.write_f32(123.5);
        w.write_f64(-0.25);
        let bytes = w.into_bytes();
        let mut cur = SaveCursor::new(&bytes);
        assert_eq!(cur.read_f32().unwrap(), 123.5);
        assert_eq!(cur.read_f64().unwrap(), -0.25);
    }
}
