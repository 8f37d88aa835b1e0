// Builder for new OLE package blobs.
//
// Assembly order (all lengths computed forward, nothing is back-patched):
//   1. outer package header + ole header
//   2. package stream header (Link, SimplePackage)
//   3. content bytes, copied or drained from a stream
//   4. package stream footer (SimplePackage)
//   5. fixed 12-byte trailer

use std::fmt;
use std::io::{self, Read};

use super::blob::OleBlob;
use super::codec::PackageCodec;
use super::content::ContentType;
use super::error::OleError;
use super::header::{
    OLE_HEADER_FIXED_LEN, OleHeader, PACKAGE_FOOTER, PACKAGE_PRETTY_NAME, PACKAGE_TYPE_NAME,
    PackageHeader, field_u32,
};
use super::stream;
use super::text;

/// Chunk size used when draining a content stream.
const BUF_SIZE: usize = 8 * 1024;

// ---------------------------------------------------------------------------
// Content source
// ---------------------------------------------------------------------------

/// Where the embedded content comes from.
pub enum ContentSource {
    Bytes(Vec<u8>),
    /// A reader yielding exactly `len` bytes. It is dropped (closed) when the
    /// build finishes, whether or not it succeeded.
    Stream { reader: Box<dyn Read>, len: u64 },
}

impl ContentSource {
    pub fn len(&self) -> u64 {
        match self {
            Self::Bytes(b) => b.len() as u64,
            Self::Stream { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn drain_into(self, out: &mut Vec<u8>) -> io::Result<()> {
        match self {
            Self::Bytes(b) => {
                out.extend_from_slice(&b);
                Ok(())
            }
            Self::Stream { reader, len } => {
                let mut reader = reader.take(len);
                let mut buf = [0u8; BUF_SIZE];
                let mut copied = 0u64;
                loop {
                    let n = match reader.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => n,
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => return Err(e),
                    };
                    out.extend_from_slice(&buf[..n]);
                    copied += n as u64;
                }
                if copied < len {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("content stream ended after {copied} of {len} bytes"),
                    ));
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Self::Stream { len, .. } => f.debug_struct("Stream").field("len", len).finish(),
        }
    }
}

// ---------------------------------------------------------------------------
// OleBlobBuilder
// ---------------------------------------------------------------------------

/// Collects the inputs for a new package blob.
///
/// ```no_run
/// use olepack::ole::{ContentType, OleBlobBuilder};
///
/// let blob = OleBlobBuilder::new()
///     .file_name("a.txt")
///     .file_path("C:\\a.txt")
///     .simple_package_bytes(b"AB".to_vec())
///     .build()
///     .unwrap();
/// assert_eq!(blob.content().unwrap().content_type(), ContentType::SimplePackage);
/// ```
#[derive(Debug, Default)]
pub struct OleBlobBuilder {
    content_type: Option<ContentType>,
    source: Option<ContentSource>,
    file_name: Option<String>,
    file_path: Option<String>,
    pretty_name: Option<String>,
    class_name: Option<String>,
    type_name: Option<String>,
}

impl OleBlobBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embed `bytes` as a simple package.
    pub fn simple_package_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.source = Some(ContentSource::Bytes(bytes.into()));
        self.content_type = Some(ContentType::SimplePackage);
        self
    }

    /// Embed `len` bytes read from `reader` as a simple package.
    pub fn simple_package_stream(mut self, reader: impl Read + 'static, len: u64) -> Self {
        self.source = Some(ContentSource::Stream {
            reader: Box::new(reader),
            len,
        });
        self.content_type = Some(ContentType::SimplePackage);
        self
    }

    /// Link to the external file at `path`.
    pub fn link_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self.content_type = Some(ContentType::Link);
        self
    }

    /// Embed `bytes` verbatim, without a package stream.
    pub fn other_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.source = Some(ContentSource::Bytes(bytes.into()));
        self.content_type = Some(ContentType::Other);
        self
    }

    /// Embed `len` bytes read from `reader` verbatim.
    pub fn other_stream(mut self, reader: impl Read + 'static, len: u64) -> Self {
        self.source = Some(ContentSource::Stream {
            reader: Box::new(reader),
            len,
        });
        self.content_type = Some(ContentType::Other);
        self
    }

    /// Request a content type directly. Only writable types build.
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn pretty_name(mut self, name: impl Into<String>) -> Self {
        self.pretty_name = Some(name.into());
        self
    }

    pub fn class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = Some(name.into());
        self
    }

    pub fn type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = Some(name.into());
        self
    }

    pub fn requested_type(&self) -> Option<ContentType> {
        self.content_type
    }

    /// Declared content length (before link paths replace it).
    pub fn content_len(&self) -> u64 {
        self.source.as_ref().map_or(0, ContentSource::len)
    }

    /// Build with the default [`PackageCodec`].
    pub fn build(self) -> Result<OleBlob, OleError> {
        PackageCodec::default().build(self)
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Resolve pretty/class/type names. Package shell objects default to the
/// shell's names; class and type each fall back to the other.
fn identity(
    content_type: ContentType,
    pretty_name: Option<String>,
    class_name: Option<String>,
    type_name: Option<String>,
) -> (String, String, String) {
    let shell = matches!(content_type, ContentType::Link | ContentType::SimplePackage);
    let pretty_name = pretty_name
        .or_else(|| shell.then(|| PACKAGE_PRETTY_NAME.to_string()))
        .unwrap_or_default();
    let class_name = class_name.or_else(|| shell.then(|| PACKAGE_TYPE_NAME.to_string()));
    let (class_name, type_name) = match (class_name, type_name) {
        (Some(c), Some(t)) => (c, t),
        (Some(c), None) => (c.clone(), c),
        (None, Some(t)) => (t.clone(), t),
        (None, None) => (String::new(), String::new()),
    };
    (pretty_name, class_name, type_name)
}

/// Assemble the package bytes described by `builder`.
///
/// The builder (and any content stream it holds) is consumed, so the stream
/// is dropped on every return path.
pub(crate) fn assemble(builder: OleBlobBuilder, max_size: u64) -> Result<Vec<u8>, OleError> {
    let OleBlobBuilder {
        content_type,
        source,
        file_name,
        file_path,
        pretty_name,
        class_name,
        type_name,
    } = builder;

    let content_type = content_type.unwrap_or(ContentType::Unknown);
    if !content_type.is_writable() {
        return Err(OleError::UnsupportedType(content_type));
    }

    let file_name = file_name.unwrap_or_default();
    let file_path = file_path.unwrap_or_default();
    let (pretty_name, class_name, type_name) =
        identity(content_type, pretty_name, class_name, type_name);

    let mut source = source.unwrap_or(ContentSource::Bytes(Vec::new()));
    let too_large = |size: u64| OleError::TooLarge {
        size,
        max: max_size,
    };
    // Content alone over the limit fails before any header field is sized.
    if source.len() > max_size {
        return Err(too_large(source.len()));
    }

    let (stream_header, stream_footer) = match content_type {
        ContentType::Link => {
            // The link "content" is the zero-terminated file path.
            source = ContentSource::Bytes(text::ansi_zero_terminated(&file_path));
            (stream::link_header(&file_name, &file_path), Vec::new())
        }
        ContentType::SimplePackage => (
            stream::embedded_header(&file_name, &file_path, source.len())?,
            stream::embedded_footer(&file_name, &file_path)?,
        ),
        _ => (Vec::new(), Vec::new()),
    };

    let package_header = PackageHeader::new(&pretty_name, &class_name)?;
    let ole_header_len = OLE_HEADER_FIXED_LEN + type_name.chars().count() + 1;

    let payload_len = (stream_header.len() as u64)
        .checked_add(stream_footer.len() as u64)
        .and_then(|n| n.checked_add(source.len()))
        .ok_or_else(|| too_large(u64::MAX))?;
    let total = (package_header.header_len as u64)
        .checked_add(ole_header_len as u64)
        .and_then(|n| n.checked_add(payload_len))
        .and_then(|n| n.checked_add(PACKAGE_FOOTER.len() as u64))
        .ok_or_else(|| too_large(u64::MAX))?;
    if total > max_size {
        return Err(too_large(total));
    }
    let ole_header = OleHeader::new(&type_name, field_u32("payload length", payload_len)?);

    let mut out = Vec::with_capacity(total as usize);
    package_header.encode(&mut out)?;
    ole_header.encode(&mut out)?;
    out.extend_from_slice(&stream_header);
    source.drain_into(&mut out)?;
    out.extend_from_slice(&stream_footer);
    out.extend_from_slice(&PACKAGE_FOOTER);

    log::debug!(
        "built {content_type} ole package: {total} bytes, payload {payload_len} bytes"
    );
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::codec::OLE_MAX_SIZE;
    use crate::ole::header::PACKAGE_SIGNATURE;
    use std::io::Cursor;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct TrackedReader {
        inner: Cursor<Vec<u8>>,
        dropped: Arc<AtomicBool>,
    }

    impl Read for TrackedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Drop for TrackedReader {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    fn tracked(data: &[u8]) -> (TrackedReader, Arc<AtomicBool>) {
        let dropped = Arc::new(AtomicBool::new(false));
        (
            TrackedReader {
                inner: Cursor::new(data.to_vec()),
                dropped: dropped.clone(),
            },
            dropped,
        )
    }

    #[test]
    fn other_layout_is_header_payload_trailer() {
        let bytes = assemble(
            OleBlobBuilder::new()
                .other_bytes(b"XYZ".to_vec())
                .class_name("Cls"),
            u64::MAX,
        )
        .unwrap();
        assert_eq!(&bytes[..2], &PACKAGE_SIGNATURE.to_le_bytes());
        assert_eq!(&bytes[bytes.len() - 12..], &PACKAGE_FOOTER);
        assert_eq!(&bytes[bytes.len() - 15..bytes.len() - 12], b"XYZ");
        // 20 + "\0" + "Cls\0" | 24 + "Cls\0" | 3 | 12
        assert_eq!(bytes.len(), 25 + 28 + 3 + 12);
    }

    #[test]
    fn unset_and_unknown_types_are_rejected() {
        assert!(matches!(
            assemble(OleBlobBuilder::new(), u64::MAX),
            Err(OleError::UnsupportedType(ContentType::Unknown))
        ));
        assert!(matches!(
            assemble(
                OleBlobBuilder::new().content_type(ContentType::CompoundStorage),
                u64::MAX
            ),
            Err(OleError::UnsupportedType(ContentType::CompoundStorage))
        ));
    }

    #[test]
    fn identity_defaults() {
        let (p, c, t) = identity(ContentType::SimplePackage, None, None, None);
        assert_eq!(
            (p.as_str(), c.as_str(), t.as_str()),
            (PACKAGE_PRETTY_NAME, PACKAGE_TYPE_NAME, PACKAGE_TYPE_NAME)
        );

        let (p, c, t) = identity(ContentType::Other, None, None, Some("T".into()));
        assert_eq!((p.as_str(), c.as_str(), t.as_str()), ("", "T", "T"));

        let (_, c, t) = identity(ContentType::Other, None, Some("C".into()), None);
        assert_eq!((c.as_str(), t.as_str()), ("C", "C"));

        let (_, c, t) = identity(
            ContentType::Link,
            None,
            Some("C".into()),
            Some("T".into()),
        );
        assert_eq!((c.as_str(), t.as_str()), ("C", "T"));
    }

    #[test]
    fn stream_is_drained_and_dropped() {
        let (reader, dropped) = tracked(b"streamed content");
        let bytes = assemble(OleBlobBuilder::new().other_stream(reader, 16), u64::MAX).unwrap();
        assert!(dropped.load(Ordering::SeqCst));
        assert!(
            bytes
                .windows(16)
                .any(|w| w == b"streamed content")
        );
    }

    #[test]
    fn stream_is_dropped_on_failure() {
        let (reader, dropped) = tracked(b"0123456789");
        let err = assemble(OleBlobBuilder::new().other_stream(reader, 10), 16).unwrap_err();
        assert!(matches!(err, OleError::TooLarge { max: 16, .. }));
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn short_stream_fails() {
        let (reader, dropped) = tracked(b"abc");
        let err = assemble(
            OleBlobBuilder::new().simple_package_stream(reader, 5),
            u64::MAX,
        )
        .unwrap_err();
        match err {
            OleError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected {other:?}"),
        }
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn huge_declared_stream_is_too_large() {
        let (reader, dropped) = tracked(b"abc");
        let err = assemble(
            OleBlobBuilder::new().other_stream(reader, u64::MAX - 8),
            OLE_MAX_SIZE,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            OleError::TooLarge { size, max: OLE_MAX_SIZE } if size == u64::MAX - 8
        ));
        assert!(dropped.load(Ordering::SeqCst));

        let (reader, _) = tracked(b"abc");
        let err = assemble(
            OleBlobBuilder::new().simple_package_stream(reader, u64::MAX - 8),
            OLE_MAX_SIZE,
        )
        .unwrap_err();
        assert!(matches!(err, OleError::TooLarge { .. }));
    }

    #[test]
    fn sum_overflow_is_too_large() {
        // Content fits the limit but the headers push the total past u64.
        let (reader, _) = tracked(b"abc");
        let err = assemble(
            OleBlobBuilder::new().other_stream(reader, u64::MAX - 8),
            u64::MAX,
        )
        .unwrap_err();
        assert!(matches!(err, OleError::TooLarge { size: u64::MAX, max: u64::MAX }));
    }

    #[test]
    fn oversized_payload_field_fails_before_allocation() {
        // 5 GiB declared: within a u64 limit but not a u32 length field.
        let (reader, _) = tracked(b"abc");
        let err = assemble(
            OleBlobBuilder::new().other_stream(reader, 5 << 30),
            u64::MAX,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            OleError::FieldTooLong { field: "payload length", .. }
        ));
    }

    #[test]
    fn long_stream_is_cut_at_declared_length() {
        let (reader, _) = tracked(b"abcdef");
        let bytes = assemble(OleBlobBuilder::new().other_stream(reader, 4), u64::MAX).unwrap();
        assert_eq!(&bytes[bytes.len() - 16..bytes.len() - 12], b"abcd");
    }

    #[test]
    fn link_replaces_stream_content_with_path() {
        let bytes = assemble(
            OleBlobBuilder::new()
                .link_path("C:\\l.txt")
                .file_name("l.txt"),
            u64::MAX,
        )
        .unwrap();
        let tail = &bytes[..bytes.len() - 12];
        assert!(tail.ends_with(b"C:\\l.txt\0"));
    }
}
