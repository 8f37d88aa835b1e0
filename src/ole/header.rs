// Outer package header and inner ole header encoding/decoding.
//
// Layout (all integers little-endian):
//
//   outer package header (20 bytes + names)
//     sig:u16 = 0x1C15, header_len:u16, object_type:u32 = 2,
//     pretty_len:u16, class_len:u16, pretty_off:u16, class_off:u16,
//     reserved:i32 = -1, pretty_name\0, class_name\0
//
//   ole header (24 bytes + type name), starting at `header_len`
//     version:u32 = 0x0501, format:u32 = 2, type_len:u32, type_name\0,
//     reserved:u64 = 0, data_len:u32

use super::error::OleError;
use super::reader::{ByteReader, Truncated};
use super::text;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const PACKAGE_SIGNATURE: u16 = 0x1C15;
pub const PACKAGE_OBJECT_TYPE: u32 = 0x02;
pub const OLE_VERSION: u32 = 0x0501;
pub const OLE_FORMAT: u32 = 0x02;

/// Type name of the "Package" shell object wrapping simple files and links.
pub const PACKAGE_TYPE_NAME: &str = "Package";
/// Pretty name the shell object uses by default.
pub const PACKAGE_PRETTY_NAME: &str = "Packager Shell Object";

/// Trailer appended after the payload of every package this crate builds.
pub const PACKAGE_FOOTER: [u8; 12] = [
    0x01, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0xAD, 0x05, 0xFE,
];

/// Size of the outer header before the name strings.
pub const PACKAGE_HEADER_FIXED_LEN: usize = 20;
/// Size of the ole header without the type name.
pub const OLE_HEADER_FIXED_LEN: usize = 24;

const RESERVED_OBJECT_SIZE: i32 = -1;

pub(crate) fn field_u16(field: &'static str, len: usize) -> Result<u16, OleError> {
    u16::try_from(len).map_err(|_| OleError::FieldTooLong {
        field,
        len: len as u64,
    })
}

pub(crate) fn field_u32(field: &'static str, len: u64) -> Result<u32, OleError> {
    u32::try_from(len).map_err(|_| OleError::FieldTooLong { field, len })
}

// ---------------------------------------------------------------------------
// Outer package header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageHeader {
    /// Offset of the ole header (length of this header including names).
    pub header_len: u16,
    pub object_type: u32,
    pub pretty_name: String,
    pub class_name: String,
}

impl PackageHeader {
    pub fn new(pretty_name: &str, class_name: &str) -> Result<Self, OleError> {
        // ANSI encoding is one byte per char plus the terminator.
        let len = PACKAGE_HEADER_FIXED_LEN
            + pretty_name.chars().count()
            + 1
            + class_name.chars().count()
            + 1;
        Ok(Self {
            header_len: field_u16("package header", len)?,
            object_type: PACKAGE_OBJECT_TYPE,
            pretty_name: pretty_name.to_string(),
            class_name: class_name.to_string(),
        })
    }

    /// Append the encoded header to `out`.
    ///
    /// The name strings are addressed by the offset fields, which point
    /// directly past the fixed block.
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), OleError> {
        let pretty = text::ansi_zero_terminated(&self.pretty_name);
        let class = text::ansi_zero_terminated(&self.class_name);

        let pretty_len = field_u16("pretty name", pretty.len())?;
        let class_len = field_u16("class name", class.len())?;
        let pretty_off = PACKAGE_HEADER_FIXED_LEN as u16;
        let class_off = field_u16("class name offset", PACKAGE_HEADER_FIXED_LEN + pretty.len())?;

        out.extend_from_slice(&PACKAGE_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&self.header_len.to_le_bytes());
        out.extend_from_slice(&self.object_type.to_le_bytes());
        out.extend_from_slice(&pretty_len.to_le_bytes());
        out.extend_from_slice(&class_len.to_le_bytes());
        out.extend_from_slice(&pretty_off.to_le_bytes());
        out.extend_from_slice(&class_off.to_le_bytes());
        out.extend_from_slice(&RESERVED_OBJECT_SIZE.to_le_bytes());
        out.extend_from_slice(&pretty);
        out.extend_from_slice(&class);
        Ok(())
    }

    /// Decode the outer header from a reader positioned at the signature.
    ///
    /// The caller has already checked the signature. Names are read from the
    /// recorded offsets; on return the reader sits just past the fixed block.
    pub fn decode(r: &mut ByteReader<'_>) -> Result<Self, Truncated> {
        let _signature = r.read_u16()?;
        let header_len = r.read_u16()?;
        let object_type = r.read_u32()?;
        let pretty_len = r.read_u16()? as usize;
        let class_len = r.read_u16()? as usize;
        let pretty_off = r.read_u16()? as usize;
        let class_off = r.read_u16()? as usize;
        let _object_size = r.read_i32()?;

        let pretty_name = text::decode_ansi(r.bytes_at(pretty_off, pretty_len)?);
        let class_name = text::decode_ansi(r.bytes_at(class_off, class_len)?);

        Ok(Self {
            header_len,
            object_type,
            pretty_name,
            class_name,
        })
    }
}

// ---------------------------------------------------------------------------
// Ole header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OleHeader {
    pub version: u32,
    pub format: u32,
    pub type_name: String,
    /// Length of the payload that follows the header.
    pub data_len: u32,
}

impl OleHeader {
    pub fn new(type_name: &str, data_len: u32) -> Self {
        Self {
            version: OLE_VERSION,
            format: OLE_FORMAT,
            type_name: type_name.to_string(),
            data_len,
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), OleError> {
        let type_name = text::ansi_zero_terminated(&self.type_name);
        let type_len = field_u32("type name", type_name.len() as u64)?;

        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.format.to_le_bytes());
        out.extend_from_slice(&type_len.to_le_bytes());
        out.extend_from_slice(&type_name);
        out.extend_from_slice(&0u64.to_le_bytes());
        out.extend_from_slice(&self.data_len.to_le_bytes());
        Ok(())
    }

    /// Decode the ole header; on return the reader sits at the payload.
    pub fn decode(r: &mut ByteReader<'_>) -> Result<Self, Truncated> {
        let version = r.read_u32()?;
        let format = r.read_u32()?;
        let type_len = r.read_u32()? as usize;
        let type_name = text::decode_ansi(r.read_bytes(type_len)?);
        let _reserved = r.read_u64()?;
        let data_len = r.read_u32()?;

        Ok(Self {
            version,
            format,
            type_name,
            data_len,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
