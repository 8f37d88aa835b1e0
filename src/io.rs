// File-level helpers around OLE package blobs.
//
// Loading raw blobs from disk, preparing builders from files on disk, and
// extracting embedded payloads. Optionally computes a SHA-256 of the
// extracted payload (feature-gated behind `file-io`).

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

#[cfg(feature = "file-io")]
use sha2::Digest;
use thiserror::Error;

use crate::ole::{ContentType, OleBlob, OleBlobBuilder, OleError, PackageCodec};
use crate::page::{CodecError, PageCodec, decode_page_in_place};

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `extract_payload()`.
#[derive(Debug, Clone)]
pub struct ExtractStats {
    /// Classification of the blob.
    pub content_type: ContentType,
    /// Size of the blob in bytes.
    pub blob_size: u64,
    /// Number of payload bytes written.
    pub payload_size: u64,
    /// SHA-256 of the payload (if `file-io` feature is enabled).
    pub payload_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file I/O operations.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("ole error: {0}")]
    Ole(#[from] OleError),
    #[error("page codec error: {0}")]
    Codec(#[from] CodecError),
    /// The path has no usable file name component.
    #[error("no file name in {0}")]
    NoFileName(PathBuf),
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Read a raw blob from `path` and wrap it with `codec`.
pub fn read_blob_file(path: &Path, codec: &PackageCodec) -> Result<OleBlob, IoError> {
    let bytes = std::fs::read(path)?;
    log::debug!("read {} byte blob from {}", bytes.len(), path.display());
    Ok(codec.parse(bytes))
}

/// Read page `page_number` of a database file and decode it with `codec`.
///
/// `scratch` is reused across calls by handlers that cannot decode in place.
pub fn read_page(
    path: &Path,
    page_number: u32,
    page_size: usize,
    codec: &dyn PageCodec,
    scratch: &mut Vec<u8>,
) -> Result<Vec<u8>, IoError> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(page_number as u64 * page_size as u64))?;
    let mut page = vec![0u8; page_size];
    file.read_exact(&mut page)?;
    decode_page_in_place(codec, &mut page, page_number, scratch)?;
    Ok(page)
}

// ---------------------------------------------------------------------------
// Builder helpers
// ---------------------------------------------------------------------------

fn file_identity(path: &Path) -> Result<(String, String), IoError> {
    let absolute = std::path::absolute(path)?;
    let name = absolute
        .file_name()
        .ok_or_else(|| IoError::NoFileName(path.to_path_buf()))?
        .to_string_lossy()
        .into_owned();
    Ok((name, absolute.to_string_lossy().into_owned()))
}

fn open_sized(path: &Path) -> Result<(BufReader<File>, u64), IoError> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    Ok((BufReader::with_capacity(BUF_SIZE, file), len))
}

/// Builder embedding the file at `path` as a simple package. The file name
/// and absolute path are filled in; the contents are streamed at build time.
pub fn simple_package_from_file(path: &Path) -> Result<OleBlobBuilder, IoError> {
    let (name, absolute) = file_identity(path)?;
    let (reader, len) = open_sized(path)?;
    Ok(OleBlobBuilder::new()
        .file_name(name)
        .file_path(absolute)
        .simple_package_stream(reader, len))
}

/// Builder linking to the file at `path`. The file does not need to exist.
pub fn link_from_file(path: &Path) -> Result<OleBlobBuilder, IoError> {
    let (name, absolute) = file_identity(path)?;
    Ok(OleBlobBuilder::new().file_name(name).link_path(absolute))
}

/// Builder embedding the raw contents of `path` without a package stream.
pub fn other_from_file(path: &Path) -> Result<OleBlobBuilder, IoError> {
    let (reader, len) = open_sized(path)?;
    Ok(OleBlobBuilder::new().other_stream(reader, len))
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Write the embedded payload of `blob` to `output_path`.
///
/// Links carry no payload and fail with [`OleError::Unsupported`]. Unknown
/// data is written whole.
pub fn extract_payload(blob: &OleBlob, output_path: &Path) -> Result<ExtractStats, IoError> {
    let content_type = blob.content_type()?;
    let blob_size = blob.len()? as u64;
    let payload = blob
        .payload()?
        .ok_or(OleError::Unsupported("extracting the payload of a link"))?;

    let output_file = File::create(output_path)?;
    let mut writer = BufWriter::with_capacity(BUF_SIZE, output_file);

    #[cfg(feature = "file-io")]
    let mut hasher = sha2::Sha256::new();

    #[cfg(feature = "file-io")]
    {
        let mut hashing_writer = HashingWriter {
            inner: &mut writer,
            hasher: &mut hasher,
        };
        hashing_writer.write_all(payload)?;
    }

    #[cfg(not(feature = "file-io"))]
    writer.write_all(payload)?;

    let payload_size = payload.len() as u64;
    writer.flush()?;

    #[cfg(feature = "file-io")]
    let payload_sha256 = Some(hasher.finalize().into());
    #[cfg(not(feature = "file-io"))]
    let payload_sha256: Option<[u8; 32]> = None;

    log::debug!(
        "extracted {payload_size} payload bytes from {content_type} blob to {}",
        output_path.display()
    );

    Ok(ExtractStats {
        content_type,
        blob_size,
        payload_size,
        payload_sha256,
    })
}

// ---------------------------------------------------------------------------
// Hashing writer (used with file-io feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "file-io")]
struct HashingWriter<'a, W: Write> {
    inner: &'a mut W,
    hasher: &'a mut sha2::Sha256,
}

#[cfg(feature = "file-io")]
impl<W: Write> Write for HashingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
