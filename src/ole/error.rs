use std::io;

use thiserror::Error;

use super::content::ContentType;

/// Errors raised while building or accessing OLE blobs.
///
/// Unrecognised blob data is not an error: it parses as
/// [`Content::Other`](super::Content::Other) or
/// [`Content::Unknown`](super::Content::Unknown).
#[derive(Debug, Error)]
pub enum OleError {
    /// The builder was asked for a content type it cannot write.
    #[error("cannot currently create ole values of type {0}")]
    UnsupportedType(ContentType),

    /// The assembled package exceeds the column's maximum size.
    #[error("content size of {size} is too large for ole column (max {max})")]
    TooLarge { size: u64, max: u64 },

    /// A string or length does not fit the width of its header field.
    #[error("{field} of {len} bytes does not fit its length field")]
    FieldTooLong { field: &'static str, len: u64 },

    /// The blob's buffer has been released.
    #[error("blob is closed")]
    Closed,

    /// Mutation the blob abstraction never supports.
    #[error("{0} is not supported on ole blobs")]
    Unsupported(&'static str),

    /// A requested byte range lies outside the blob.
    #[error("range {pos}+{len} is outside the {size}-byte blob")]
    OutOfRange { pos: usize, len: usize, size: usize },

    /// Failure reported by a compound storage extension.
    #[error("compound storage: {0}")]
    Compound(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
