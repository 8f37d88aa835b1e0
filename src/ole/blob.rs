// Read-mostly handle over a complete OLE package buffer.
//
// The typed `Content` is derived lazily on first access and cached for the
// blob's lifetime. `close` releases the buffer and the cache; any access
// afterwards fails with `OleError::Closed`.

use std::fmt;
use std::io::{self, Cursor, Write};
use std::sync::{Arc, OnceLock};

use super::compound::CompoundPackageFactory;
use super::content::{Content, ContentType};
use super::error::OleError;
use super::parser;

pub struct OleBlob {
    bytes: Option<Vec<u8>>,
    content: OnceLock<Content>,
    compound: Option<Arc<dyn CompoundPackageFactory>>,
}

impl OleBlob {
    /// Wrap raw column bytes. No compound extension is consulted.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::with_factory(bytes.into(), None)
    }

    pub(crate) fn with_factory(
        bytes: Vec<u8>,
        compound: Option<Arc<dyn CompoundPackageFactory>>,
    ) -> Self {
        Self {
            bytes: Some(bytes),
            content: OnceLock::new(),
            compound,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.bytes.is_none()
    }

    /// The full buffer.
    pub fn bytes(&self) -> Result<&[u8], OleError> {
        self.bytes.as_deref().ok_or(OleError::Closed)
    }

    pub fn len(&self) -> Result<usize, OleError> {
        Ok(self.bytes()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, OleError> {
        Ok(self.bytes()?.is_empty())
    }

    /// `len` bytes starting at `pos`.
    pub fn bytes_at(&self, pos: usize, len: usize) -> Result<&[u8], OleError> {
        let bytes = self.bytes()?;
        pos.checked_add(len)
            .and_then(|end| bytes.get(pos..end))
            .ok_or(OleError::OutOfRange {
                pos,
                len,
                size: bytes.len(),
            })
    }

    pub fn reader(&self) -> Result<Cursor<&[u8]>, OleError> {
        Ok(Cursor::new(self.bytes()?))
    }

    pub fn reader_at(&self, pos: usize, len: usize) -> Result<Cursor<&[u8]>, OleError> {
        Ok(Cursor::new(self.bytes_at(pos, len)?))
    }

    /// Offset of the first occurrence of `pattern` at or after `start`.
    pub fn position(&self, pattern: &[u8], start: usize) -> Result<Option<usize>, OleError> {
        let bytes = self.bytes()?;
        if start > bytes.len() {
            return Ok(None);
        }
        if pattern.is_empty() {
            return Ok(Some(start));
        }
        Ok(bytes[start..]
            .windows(pattern.len())
            .position(|w| w == pattern)
            .map(|i| i + start))
    }

    /// Write the whole buffer to `out`.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<(), OleError> {
        out.write_all(self.bytes()?)?;
        Ok(())
    }

    /// The decoded content.
    ///
    /// Parsed on first call; later calls return the same value. Concurrent
    /// first callers block until one of them has published the result.
    pub fn content(&self) -> Result<&Content, OleError> {
        let bytes = self.bytes()?;
        Ok(self
            .content
            .get_or_init(|| parser::parse_content(bytes, self.compound.as_deref())))
    }

    pub fn content_type(&self) -> Result<ContentType, OleError> {
        Ok(self.content()?.content_type())
    }

    /// The embedded payload bytes; `None` for links.
    pub fn payload(&self) -> Result<Option<&[u8]>, OleError> {
        let Some(range) = self.content()?.range() else {
            return Ok(None);
        };
        let bytes = self.bytes()?;
        bytes
            .get(range.as_range())
            .map(Some)
            .ok_or(OleError::OutOfRange {
                pos: range.position,
                len: range.length,
                size: bytes.len(),
            })
    }

    /// Copy the embedded payload to `out`, returning the number of bytes.
    pub fn write_payload_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<u64, OleError> {
        match self.payload()? {
            Some(payload) => {
                out.write_all(payload)?;
                Ok(payload.len() as u64)
            }
            None => Err(OleError::Unsupported("writing the payload of a link")),
        }
    }

    /// Take the buffer out of the blob.
    pub fn into_bytes(mut self) -> Result<Vec<u8>, OleError> {
        self.bytes.take().ok_or(OleError::Closed)
    }

    pub fn truncate(&mut self, _len: usize) -> Result<(), OleError> {
        Err(OleError::Unsupported("truncate"))
    }

    pub fn set_bytes(&mut self, _pos: usize, _bytes: &[u8]) -> Result<usize, OleError> {
        Err(OleError::Unsupported("set_bytes"))
    }

    pub fn set_binary_stream(&mut self, _pos: usize) -> Result<io::Sink, OleError> {
        Err(OleError::Unsupported("set_binary_stream"))
    }

    /// Release the buffer and any cached content. Idempotent.
    pub fn close(&mut self) {
        if self.bytes.take().is_some() {
            log::trace!("ole blob closed");
        }
        self.content.take();
    }
}

impl fmt::Debug for OleBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OleBlob")
            .field("len", &self.bytes.as_ref().map(Vec::len))
            .field("content", &self.content.get())
            .field("compound", &self.compound.is_some())
            .finish()
    }
}

impl fmt::Display for OleBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_closed() {
            return f.write_str("OleBlob[closed]");
        }
        match self.content.get() {
            Some(content) => write!(f, "OleBlob[{content}]"),
            None => f.write_str("OleBlob[(uninitialized)]"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
