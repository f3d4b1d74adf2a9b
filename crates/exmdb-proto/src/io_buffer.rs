//! [`IoBuffer`]: the growable byte buffer with typed push/pop and
//! length-prefix framing described in spec.md §4.1.
//!
//! Mirrors the teacher's manual `BinRead`/`BinWrite` plumbing
//! (`smb-dtyp/src/binrw_util/multi_sz.rs`, `smb-fscc/src/chained_list.rs`)
//! rather than a derive: the tagged-dispatch types built on top of this
//! buffer (`TaggedPropval`, `Restriction`) decide their own shape at
//! runtime, so there's no fixed struct layout for `binrw` to derive over.

use crate::error::{ProtoError, Result};

/// A growable little-endian byte buffer plus a read cursor.
///
/// Used both to assemble an outgoing request body (`push*`, `start`/
/// `finalize`) and to walk an incoming response body (`pop*`).
#[derive(Default, Clone)]
pub struct IoBuffer {
    data: Vec<u8>,
    pos: usize,
    frame_start: Option<usize>,
}

impl IoBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already-received body for reading.
    pub fn from_vec(data: Vec<u8>) -> Self {
        IoBuffer {
            data,
            pos: 0,
            frame_start: None,
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.pos = 0;
        self.frame_start = None;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    // ---- framing ----------------------------------------------------

    /// Records the current offset and reserves a 4-byte length
    /// placeholder; call [`finalize`][Self::finalize] once the body has
    /// been written to patch in the real length.
    pub fn start(&mut self) {
        self.frame_start = Some(self.data.len());
        self.data.extend_from_slice(&[0u8; 4]);
    }

    /// Writes `current_size - start_offset - 4` into the placeholder
    /// reserved by [`start`][Self::start], little-endian.
    ///
    /// Panics if called without a matching `start()` — a caller bug,
    /// not a wire-format or I/O failure, so it isn't propagated as a
    /// `Result`.
    pub fn finalize(&mut self) {
        let start = self.frame_start.take().expect("finalize without start");
        let body_len = (self.data.len() - start - 4) as u32;
        self.data[start..start + 4].copy_from_slice(&body_len.to_le_bytes());
    }

    // ---- write --------------------------------------------------------

    pub fn push_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub fn push_u16(&mut self, v: u16) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn push_u32(&mut self, v: u32) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn push_u64(&mut self, v: u64) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    /// Writes `v` in big-endian order. Used only at the handful of wire
    /// spots spec.md §6/§9 call out as big-endian (the `AllocateCn`
    /// change-number field).
    pub fn push_u64_be(&mut self, v: u64) {
        self.data.extend_from_slice(&v.to_be_bytes());
    }

    pub fn push_i64(&mut self, v: i64) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn push_f32(&mut self, v: f32) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn push_f64(&mut self, v: f64) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    /// Raw byte copy, no length prefix.
    pub fn push_raw(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// A string body followed by a single NUL terminator.
    pub fn push_cstr(&mut self, s: &[u8]) {
        self.data.extend_from_slice(s);
        self.data.push(0);
    }

    /// `u32` length prefix followed by the raw bytes (binary propval
    /// shape).
    pub fn push_binary(&mut self, bytes: &[u8]) {
        self.push_u32(bytes.len() as u32);
        self.push_raw(bytes);
    }

    // ---- read -----------------------------------------------------

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        if self.remaining() < n {
            return Err(ProtoError::Short {
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn pop_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn pop_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn pop_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn pop_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn pop_u64_be(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn pop_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn pop_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn pop_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn pop_bytes(&mut self, n: usize) -> Result<&[u8]> {
        self.take(n)
    }

    /// A borrowed view of the bytes up to (and consuming) the next NUL
    /// terminator.
    pub fn pop_cstr(&mut self) -> Result<&[u8]> {
        let start = self.pos;
        let nul = self.data[self.pos..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(ProtoError::Short {
                needed: 1,
                available: 0,
            })?;
        self.pos = start + nul + 1;
        Ok(&self.data[start..start + nul])
    }

    /// `u32` length prefix followed by that many raw bytes.
    pub fn pop_binary(&mut self) -> Result<&[u8]> {
        let len = self.pop_u32()? as usize;
        self.pop_bytes(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_writes_body_length_excluding_prefix() {
        let mut buf = IoBuffer::new();
        buf.start();
        buf.push_u8(0x2a);
        buf.push_u32(0xdead_beef);
        buf.finalize();

        assert_eq!(buf.len(), 4 + 1 + 4);
        let len = u32::from_le_bytes(buf.as_slice()[0..4].try_into().unwrap());
        assert_eq!(len as usize, 1 + 4);
    }

    #[test]
    fn pop_reports_short_on_underflow() {
        let mut buf = IoBuffer::from_vec(vec![1, 2]);
        assert!(buf.pop_u32().is_err());
    }

    #[test]
    fn cstr_round_trip() {
        let mut buf = IoBuffer::new();
        buf.push_cstr(b"hello");
        buf.push_u8(0xff);

        let mut read = IoBuffer::from_vec(buf.into_vec());
        assert_eq!(read.pop_cstr().unwrap(), b"hello");
        assert_eq!(read.pop_u8().unwrap(), 0xff);
    }

    #[test]
    fn binary_round_trip_including_empty() {
        let mut buf = IoBuffer::new();
        buf.push_binary(b"");
        buf.push_binary(b"abc");

        let mut read = IoBuffer::from_vec(buf.into_vec());
        assert_eq!(read.pop_binary().unwrap(), b"");
        assert_eq!(read.pop_binary().unwrap(), b"abc");
    }

    #[test]
    fn big_endian_u64_round_trip() {
        let mut buf = IoBuffer::new();
        buf.push_u64_be(1);
        assert_eq!(buf.as_slice(), &[0, 0, 0, 0, 0, 0, 0, 1]);

        let mut read = IoBuffer::from_vec(buf.into_vec());
        assert_eq!(read.pop_u64_be().unwrap(), 1);
    }
}
