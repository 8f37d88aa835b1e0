// Package stream: the payload of a "Package" shell object.
//
// Embedded file:
//   sig:u16 = 2, file_name\0, file_path\0, kind:u32 = 0x00030000,
//   local_path_len:u32, local_path\0, data_len:u32, data,
//   then length-prefixed UTF-16LE strings (local path, file name, file path)
//   whose prefix is the character count.
//
// Linked file:
//   sig:u16 = 2, file_name\0, file_path\0, kind:u32 = 0x00010000,
//   reserved:u16 = 1, link_path\0

use super::content::EmbeddedRange;
use super::error::OleError;
use super::header::field_u32;
use super::reader::{ByteReader, Truncated};
use super::text;

pub const PACKAGE_STREAM_SIGNATURE: u16 = 0x02;
pub const PS_EMBEDDED_FILE: u32 = 0x0003_0000;
pub const PS_LINKED_FILE: u32 = 0x0001_0000;
const LINK_HEADER: u16 = 0x01;

/// Number of trailing UTF-16 strings that override earlier ANSI fields.
const OVERRIDE_STRINGS: usize = 3;

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

/// Stream header for an embedded file of `content_len` bytes.
pub fn embedded_header(
    file_name: &str,
    file_path: &str,
    content_len: u64,
) -> Result<Vec<u8>, OleError> {
    let name = text::ansi_zero_terminated(file_name);
    let path = text::ansi_zero_terminated(file_path);
    let path_len = field_u32("file path", path.len() as u64)?;
    let content_len = field_u32("content length", content_len)?;

    let mut out = Vec::with_capacity(14 + name.len() + 2 * path.len());
    out.extend_from_slice(&PACKAGE_STREAM_SIGNATURE.to_le_bytes());
    out.extend_from_slice(&name);
    out.extend_from_slice(&path);
    out.extend_from_slice(&PS_EMBEDDED_FILE.to_le_bytes());
    out.extend_from_slice(&path_len.to_le_bytes());
    out.extend_from_slice(&path);
    out.extend_from_slice(&content_len.to_le_bytes());
    Ok(out)
}

/// Stream header for a linked file. The link path itself follows as the
/// payload.
pub fn link_header(file_name: &str, file_path: &str) -> Vec<u8> {
    let name = text::ansi_zero_terminated(file_name);
    let path = text::ansi_zero_terminated(file_path);

    let mut out = Vec::with_capacity(8 + name.len() + path.len());
    out.extend_from_slice(&PACKAGE_STREAM_SIGNATURE.to_le_bytes());
    out.extend_from_slice(&name);
    out.extend_from_slice(&path);
    out.extend_from_slice(&PS_LINKED_FILE.to_le_bytes());
    out.extend_from_slice(&LINK_HEADER.to_le_bytes());
    out
}

/// Footer of an embedded file: path, name, path again, as UTF-16LE.
///
/// The format repeats the path and orders the strings this way; readers
/// map them back positionally (see [`parse`]).
pub fn embedded_footer(file_name: &str, file_path: &str) -> Result<Vec<u8>, OleError> {
    let name = text::utf16le(file_name);
    let path = text::utf16le(file_path);
    let name_chars = field_u32("file name", (name.len() / 2) as u64)?;
    let path_chars = field_u32("file path", (path.len() / 2) as u64)?;

    let mut out = Vec::with_capacity(12 + 2 * path.len() + name.len());
    out.extend_from_slice(&path_chars.to_le_bytes());
    out.extend_from_slice(&path);
    out.extend_from_slice(&name_chars.to_le_bytes());
    out.extend_from_slice(&name);
    out.extend_from_slice(&path_chars.to_le_bytes());
    out.extend_from_slice(&path);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Parse
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageStream {
    Embedded {
        file_name: String,
        file_path: String,
        local_file_path: String,
        data: EmbeddedRange,
    },
    Linked {
        file_name: String,
        file_path: String,
        link_path: String,
    },
    /// Bad signature or unknown kind.
    Unrecognized,
}

/// Parse a package stream occupying exactly the reader's window.
///
/// Truncation inside the fixed fields is an error (the caller treats the
/// stream as opaque); truncation among the trailing override strings just
/// ends the list.
pub fn parse(mut r: ByteReader<'_>) -> Result<PackageStream, Truncated> {
    if r.read_u16()? != PACKAGE_STREAM_SIGNATURE {
        return Ok(PackageStream::Unrecognized);
    }

    let mut file_name = text::decode_ansi(r.read_zero_terminated());
    let mut file_path = text::decode_ansi(r.read_zero_terminated());

    match r.read_u32()? {
        PS_EMBEDDED_FILE => {
            let local_len = r.read_u32()? as usize;
            let mut local_file_path = text::decode_ansi(r.read_bytes(local_len)?);
            let data_len = r.read_u32()? as usize;
            let data = EmbeddedRange::new(r.position(), data_len);
            r.skip(data_len)?;

            let mut index = 0;
            while r.remaining() >= 4 {
                let chars = r.read_u32()? as usize;
                let Some(bytes) = chars
                    .checked_mul(2)
                    .and_then(|len| r.read_bytes(len).ok())
                else {
                    log::trace!("override string {index} truncated at {}", r.position());
                    break;
                };
                let value = text::decode_utf16le(bytes);
                match index {
                    0 => local_file_path = value,
                    1 => file_name = value,
                    2 => file_path = value,
                    _ => {}
                }
                index += 1;
            }
            if index > OVERRIDE_STRINGS {
                log::trace!("ignored {} extra package strings", index - OVERRIDE_STRINGS);
            }

            Ok(PackageStream::Embedded {
                file_name,
                file_path,
                local_file_path,
                data,
            })
        }
        PS_LINKED_FILE => {
            r.skip(2)?;
            let link_path = text::decode_ansi(r.read_zero_terminated());
            Ok(PackageStream::Linked {
                file_name,
                file_path,
                link_path,
            })
        }
        kind => {
            log::debug!("unrecognized package stream kind {kind:#010X}");
            Ok(PackageStream::Unrecognized)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
