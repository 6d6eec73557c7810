//! Byte-level primitives shared by the RTMP and FLV crates.
//!
//! [`ByteReader`] wraps an [`AsyncRead`] with a refill-on-demand cache: callers
//! declare how many bytes they need with [`ByteReader::ensure`] and the reader
//! tops itself up from the socket in fixed-size chunks until that much data is
//! cached. [`ByteWriter`] is the write-side counterpart over a caller-supplied
//! scratch buffer, used to compose fixed-size headers (RTMP chunk headers, FLV
//! tag headers) without allocating on every message.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

mod error;

pub use error::ByteReadError;

/// Socket reads are performed in chunks of this size, per-spec.
const SOCKET_READ_SIZE: usize = 16 * 1024;

/// Once the consumed prefix grows past this many bytes we compact the backing
/// buffer so it doesn't grow unbounded across a long-lived connection.
const COMPACT_THRESHOLD: usize = 64 * 1024;

/// A refill-on-demand read buffer over an [`AsyncRead`].
///
/// All fixed-width accessors `ensure` their own byte count before reading, so
/// callers never need to call [`ByteReader::ensure`] directly except when they
/// want to check [`ByteReader::requires`] ahead of a multi-field read.
pub struct ByteReader<R> {
    inner: R,
    buf: BytesMut,
    pos: usize,
    scratch: [u8; SOCKET_READ_SIZE],
}

impl<R> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
            pos: 0,
            scratch: [0; SOCKET_READ_SIZE],
        }
    }

    /// Bytes currently cached but not yet consumed.
    pub fn requires(&self, n: usize) -> bool {
        self.buf.len() - self.pos >= n
    }

    fn compact(&mut self) {
        if self.pos >= COMPACT_THRESHOLD {
            self.buf.advance(self.pos);
            self.pos = 0;
        }
    }

    /// Advance or rewind the read cursor. Negative values rewind into bytes
    /// that were already read but not yet compacted away; used to undo a
    /// tentative extended-timestamp read that turns out to be payload.
    pub fn skip(&mut self, n: isize) {
        let new_pos = self.pos as isize + n;
        debug_assert!(new_pos >= 0, "skip rewound past the start of the buffer");
        self.pos = new_pos.max(0) as usize;
    }
}

impl<R: AsyncRead + Unpin> ByteReader<R> {
    /// Ensure at least `n` unconsumed bytes are cached, reading from the
    /// socket in [`SOCKET_READ_SIZE`] chunks until satisfied.
    pub async fn ensure(&mut self, n: usize) -> Result<(), ByteReadError> {
        while self.buf.len() - self.pos < n {
            let read = self.inner.read(&mut self.scratch).await?;
            if read == 0 {
                return Err(ByteReadError::Eof);
            }
            self.buf.extend_from_slice(&self.scratch[..read]);
        }

        Ok(())
    }

    /// Read `n` bytes, copying them out of the cache.
    pub async fn read(&mut self, n: usize) -> Result<Bytes, ByteReadError> {
        self.ensure(n).await?;
        let out = Bytes::copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        self.compact();
        Ok(out)
    }

    pub async fn read_u8(&mut self) -> Result<u8, ByteReadError> {
        self.ensure(1).await?;
        let v = self.buf[self.pos];
        self.pos += 1;
        self.compact();
        Ok(v)
    }

    pub async fn read_u16_be(&mut self) -> Result<u16, ByteReadError> {
        self.ensure(2).await?;
        let b = &self.buf[self.pos..self.pos + 2];
        let v = u16::from_be_bytes([b[0], b[1]]);
        self.pos += 2;
        self.compact();
        Ok(v)
    }

    pub async fn read_u24_be(&mut self) -> Result<u32, ByteReadError> {
        self.ensure(3).await?;
        let b = &self.buf[self.pos..self.pos + 3];
        let v = u32::from_be_bytes([0, b[0], b[1], b[2]]);
        self.pos += 3;
        self.compact();
        Ok(v)
    }

    pub async fn read_u32_be(&mut self) -> Result<u32, ByteReadError> {
        self.ensure(4).await?;
        let b = &self.buf[self.pos..self.pos + 4];
        let v = u32::from_be_bytes([b[0], b[1], b[2], b[3]]);
        self.pos += 4;
        self.compact();
        Ok(v)
    }

    pub async fn read_u32_le(&mut self) -> Result<u32, ByteReadError> {
        self.ensure(4).await?;
        let b = &self.buf[self.pos..self.pos + 4];
        let v = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        self.pos += 4;
        self.compact();
        Ok(v)
    }

    pub async fn read_f64_be(&mut self) -> Result<f64, ByteReadError> {
        self.ensure(8).await?;
        let mut b = [0u8; 8];
        b.copy_from_slice(&self.buf[self.pos..self.pos + 8]);
        self.pos += 8;
        self.compact();
        Ok(f64::from_be_bytes(b))
    }
}

use bytes::Buf as _;

/// A cursor over a caller-owned scratch buffer, used to compose fixed-size
/// wire headers without allocating. Unlike [`ByteReader`] this never grows
/// its backing storage; writing past the end panics, same as an out-of-bounds
/// slice index, because every caller sizes its scratch buffer up front.
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Advance (positive) or rewind (negative) the write cursor without
    /// touching the bytes already written.
    pub fn skip(&mut self, n: isize) {
        let new_pos = self.pos as isize + n;
        debug_assert!(new_pos >= 0, "skip rewound past the start of the buffer");
        self.pos = new_pos.max(0) as usize;
    }

    /// The bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf[self.pos] = v;
        self.pos += 1;
    }

    pub fn write_u16_be(&mut self, v: u16) {
        self.buf[self.pos..self.pos + 2].copy_from_slice(&v.to_be_bytes());
        self.pos += 2;
    }

    pub fn write_u24_be(&mut self, v: u32) {
        let b = v.to_be_bytes();
        self.buf[self.pos..self.pos + 3].copy_from_slice(&b[1..4]);
        self.pos += 3;
    }

    pub fn write_u32_be(&mut self, v: u32) {
        self.buf[self.pos..self.pos + 4].copy_from_slice(&v.to_be_bytes());
        self.pos += 4;
    }

    pub fn write_u32_le(&mut self, v: u32) {
        self.buf[self.pos..self.pos + 4].copy_from_slice(&v.to_le_bytes());
        self.pos += 4;
    }

    pub fn write_f64_be(&mut self, v: f64) {
        self.buf[self.pos..self.pos + 8].copy_from_slice(&v.to_be_bytes());
        self.pos += 8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_refills_in_chunks() {
        let data = vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut reader = ByteReader::new(std::io::Cursor::new(data));

        assert_eq!(reader.read_u8().await.unwrap(), 0x01);
        assert_eq!(reader.read_u16_be().await.unwrap(), 0x0203);
        assert_eq!(reader.read_u24_be().await.unwrap(), 0x040506);
        assert_eq!(reader.read_u16_be().await.unwrap(), 0x0708);
    }

    #[tokio::test]
    async fn skip_rewinds_into_already_read_bytes() {
        let data = vec![0xFF, 0xFF, 0xFF, 0xFF, 0xAB];
        let mut reader = ByteReader::new(std::io::Cursor::new(data));

        let tentative = reader.read_u32_be().await.unwrap();
        assert_eq!(tentative, 0xFFFFFFFF);
        reader.skip(-4);
        assert_eq!(reader.read_u8().await.unwrap(), 0xFF);
    }

    #[tokio::test]
    async fn eof_is_reported() {
        let mut reader = ByteReader::new(std::io::Cursor::new(Vec::<u8>::new()));
        assert!(matches!(reader.read_u8().await, Err(ByteReadError::Eof)));
    }

    #[test]
    fn writer_composes_big_and_little_endian_fields() {
        let mut scratch = [0u8; 15];
        let mut w = ByteWriter::new(&mut scratch);
        w.write_u32_be(0);
        w.write_u8(9);
        w.write_u24_be(0x112233);
        w.write_u32_le(0x01020304);
        w.write_u24_be(0);

        assert_eq!(
            w.written(),
            &[0, 0, 0, 0, 9, 0x11, 0x22, 0x33, 0x04, 0x03, 0x02, 0x01, 0, 0, 0]
        );
    }
}
