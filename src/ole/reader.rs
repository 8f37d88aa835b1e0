// Forward-only cursor over an immutable byte slice.
//
// Multi-byte integers are little-endian. Every read is bounds-checked and
// reports `Truncated` instead of panicking; nested structures are parsed
// through `narrow()`, which hands out a new reader over a sub-range without
// touching the parent's position.

use thiserror::Error;

/// A read ran past the end of the available bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("need {needed} bytes at offset {offset}, only {available} available")]
pub struct Truncated {
    /// Absolute offset (within the whole blob) where the read started.
    pub offset: usize,
    pub needed: usize,
    pub available: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Absolute offset of `data[0]` within the blob.
    base: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Absolute position within the blob.
    #[inline]
    pub fn position(&self) -> usize {
        self.base + self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn truncated(&self, needed: usize) -> Truncated {
        Truncated {
            offset: self.position(),
            needed,
            available: self.remaining(),
        }
    }

    /// Move to an absolute position. Positions before this reader's window
    /// or past its end are rejected.
    pub fn seek(&mut self, absolute: usize) -> Result<(), Truncated> {
        match absolute.checked_sub(self.base) {
            Some(rel) if rel <= self.data.len() => {
                self.pos = rel;
                Ok(())
            }
            _ => Err(Truncated {
                offset: absolute,
                needed: 0,
                available: 0,
            }),
        }
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Truncated> {
        if len > self.remaining() {
            return Err(self.truncated(len));
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), Truncated> {
        self.read_bytes(len).map(|_| ())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Truncated> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u16(&mut self) -> Result<u16, Truncated> {
        self.read_array().map(u16::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, Truncated> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn read_i32(&mut self) -> Result<i32, Truncated> {
        self.read_array().map(i32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64, Truncated> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Peek the next little-endian `u16` without consuming it.
    pub fn peek_u16(&self) -> Option<u16> {
        self.data
            .get(self.pos..self.pos + 2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
    }

    /// Whether the upcoming bytes equal `pattern`.
    pub fn peek_matches(&self, pattern: &[u8]) -> bool {
        self.data[self.pos..].starts_with(pattern)
    }

    /// Read up to and including the next NUL byte. The returned slice
    /// excludes the terminator; an unterminated string runs to the end.
    pub fn read_zero_terminated(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        match rest.iter().position(|&b| b == 0) {
            Some(nul) => {
                self.pos += nul + 1;
                &rest[..nul]
            }
            None => {
                self.pos = self.data.len();
                rest
            }
        }
    }

    /// Bytes at an absolute offset, without moving the cursor.
    pub fn bytes_at(&self, absolute: usize, len: usize) -> Result<&'a [u8], Truncated> {
        let err = Truncated {
            offset: absolute,
            needed: len,
            available: (self.base + self.data.len()).saturating_sub(absolute),
        };
        let start = absolute.checked_sub(self.base).ok_or(err)?;
        let end = start.checked_add(len).ok_or(err)?;
        self.data.get(start..end).ok_or(err)
    }

    /// A new reader over the next `len` bytes. The parent does not move.
    pub fn narrow(&self, len: usize) -> Result<ByteReader<'a>, Truncated> {
        if len > self.remaining() {
            return Err(self.truncated(len));
        }
        Ok(ByteReader {
            data: &self.data[self.pos..self.pos + len],
            pos: 0,
            base: self.position(),
        })
    }

    /// Everything from the cursor to the end of this reader's window.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_little_endian() {
        let data = [0x15, 0x1C, 0x01, 0x05, 0x00, 0x00];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.peek_u16(), Some(0x1C15));
        assert_eq!(r.read_u16().unwrap(), 0x1C15);
        assert_eq!(r.read_u32().unwrap(), 0x0501);
        assert!(r.is_empty());
    }

    #[test]
    fn short_read_reports_truncation() {
        let data = [1u8, 2, 3];
        let mut r = ByteReader::new(&data);
        r.skip(1).unwrap();
        let err = r.read_u32().unwrap_err();
        assert_eq!(
            err,
            Truncated {
                offset: 1,
                needed: 4,
                available: 2
            }
        );
        // Failed reads do not move the cursor.
        assert_eq!(r.position(), 1);
    }

    #[test]
    fn zero_terminated_consumes_terminator() {
        let data = b"abc\0de";
        let mut r = ByteReader::new(data);
        assert_eq!(r.read_zero_terminated(), b"abc");
        assert_eq!(r.position(), 4);
        assert_eq!(r.read_zero_terminated(), b"de");
        assert!(r.is_empty());
        assert_eq!(r.read_zero_terminated(), b"");
    }

    #[test]
    fn narrow_keeps_absolute_positions() {
        let data: Vec<u8> = (0..16).collect();
        let mut r = ByteReader::new(&data);
        r.skip(4).unwrap();
        let mut sub = r.narrow(6).unwrap();
        assert_eq!(r.position(), 4);
        assert_eq!(sub.position(), 4);
        assert_eq!(sub.read_u16().unwrap(), u16::from_le_bytes([4, 5]));
        assert_eq!(sub.position(), 6);
        assert_eq!(sub.remaining(), 4);
        assert_eq!(sub.bytes_at(8, 2).unwrap(), &[8, 9]);
        assert!(sub.bytes_at(9, 2).is_err());
        assert!(sub.bytes_at(2, 1).is_err());
        assert!(r.narrow(13).is_err());
    }

    #[test]
    fn seek_is_bounded_by_window() {
        let data = [0u8; 8];
        let mut r = ByteReader::new(&data);
        r.seek(8).unwrap();
        assert!(r.is_empty());
        assert!(r.seek(9).is_err());

        let mut sub = ByteReader::new(&data).narrow(4).unwrap();
        assert!(sub.seek(5).is_err());
    }

    #[test]
    fn peek_matches_prefix() {
        let data = [0xD0, 0xCF, 0x11];
        let r = ByteReader::new(&data);
        assert!(r.peek_matches(&[0xD0, 0xCF]));
        assert!(!r.peek_matches(&[0xD0, 0xCF, 0x11, 0xE0]));
    }
}
