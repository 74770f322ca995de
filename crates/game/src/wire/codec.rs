//! Little-endian field-by-field packet readers/writers.
//!
//! Records on the wire and on disk are packed with no padding; nothing is
//! ever reinterpreted from memory, every field goes through these helpers.

use std::io::{self, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("truncated record: {0}")]
    Truncated(#[from] io::Error),
    #[error("unknown packet type {0}")]
    BadType(i32),
    #[error("field out of range: {0}")]
    BadValue(&'static str),
}

pub const NAME_LEN: usize = 64;

/// Append-only little-endian writer.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    pub fn put_bytes(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    /// Fixed 64-byte NUL-padded name field.
    pub fn put_name(&mut self, name: &str) {
        let bytes = name.as_bytes();
        let n = bytes.len().min(NAME_LEN - 1);
        self.buf.extend_from_slice(&bytes[..n]);
        self.buf.extend(std::iter::repeat(0).take(NAME_LEN - n));
    }
}

/// Little-endian reader over a received frame.
pub struct ByteReader<'a> {
    cursor: io::Cursor<&'a [u8]>,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: io::Cursor::new(data),
        }
    }

    pub fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        (len - self.cursor.position().min(len)) as usize
    }

    pub fn get_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.cursor.read_u8()?)
    }

    pub fn get_i32(&mut self) -> Result<i32, WireError> {
        Ok(self.cursor.read_i32::<LittleEndian>()?)
    }

    pub fn get_i64(&mut self) -> Result<i64, WireError> {
        Ok(self.cursor.read_i64::<LittleEndian>()?)
    }

    pub fn get_f32(&mut self) -> Result<f32, WireError> {
        Ok(self.cursor.read_f32::<LittleEndian>()?)
    }

    pub fn get_f64(&mut self) -> Result<f64, WireError> {
        Ok(self.cursor.read_f64::<LittleEndian>()?)
    }

    pub fn get_bool(&mut self) -> Result<bool, WireError> {
        Ok(self.cursor.read_u8()? != 0)
    }

    pub fn get_bytes<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut out = [0u8; N];
        self.cursor.read_exact(&mut out)?;
        Ok(out)
    }

    pub fn get_vec(&mut self, len: usize) -> Result<Vec<u8>, WireError> {
        let mut out = vec![0u8; len];
        self.cursor.read_exact(&mut out)?;
        Ok(out)
    }

    /// Fixed 64-byte name field; bytes past the first NUL are ignored.
    pub fn get_name(&mut self) -> Result<String, WireError> {
        let raw: [u8; NAME_LEN] = self.get_bytes()?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trip() {
        let mut w = ByteWriter::new();
        w.put_i32(-7);
        w.put_i64(1 << 40);
        w.put_f32(3.5);
        w.put_f64(-0.25);
        w.put_u8(200);
        w.put_bool(true);

        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 4 + 8 + 4 + 8 + 1 + 1);

        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.get_i32().unwrap(), -7);
        assert_eq!(r.get_i64().unwrap(), 1 << 40);
        assert_eq!(r.get_f32().unwrap(), 3.5);
        assert_eq!(r.get_f64().unwrap(), -0.25);
        assert_eq!(r.get_u8().unwrap(), 200);
        assert!(r.get_bool().unwrap());
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn name_field_is_fixed_width() {
        let mut w = ByteWriter::new();
        w.put_name("Kirk");
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), NAME_LEN);

        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.get_name().unwrap(), "Kirk");
    }

    #[test]
    fn long_name_truncates() {
        let mut w = ByteWriter::new();
        w.put_name(&"x".repeat(100));
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), NAME_LEN);
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.get_name().unwrap().len(), NAME_LEN - 1);
    }

    #[test]
    fn short_read_reports_truncation() {
        let mut r = ByteReader::new(&[1, 2]);
        assert!(matches!(r.get_i32(), Err(WireError::Truncated(_))));
    }
}
