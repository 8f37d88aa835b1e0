// Pluggable page codecs.
//
// A `PageCodec` transforms whole (or, when advertised, partial) pages between
// their on-disk and logical form. Concrete ciphers live outside this crate;
// built-in here are:
//   - IdentityCodec    (pages stored as-is)
//   - UnsupportedCodec (encoded database with no matching handler)
//
// A `CodecProvider` picks the handler for an opened database file.

use std::io;
use std::sync::Arc;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CodecError {
    /// The page could not be decoded (corrupt or incompatible data).
    #[error("failed to decode page {page}: {reason}")]
    Decode { page: u32, reason: String },

    /// The database uses a page encoding no installed handler understands.
    #[error(
        "decoding not supported for {database}: choose a codec provider which \
         supports reading the current database encoding"
    )]
    UnsupportedEncoding { database: String },

    /// Split input/output buffers of different sizes.
    #[error("page buffer size mismatch: input {input} bytes, output {output} bytes")]
    BufferMismatch { input: usize, output: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// Buffers
// ---------------------------------------------------------------------------

/// The buffers handed to [`PageCodec::decode_page`].
///
/// Handlers that report `can_decode_inline() == true` receive `Inline`;
/// everyone else always receives physically distinct `Split` buffers.
#[derive(Debug)]
pub enum PageBuffers<'a> {
    /// Decode in place: the page is read from and written to the same slice.
    Inline(&'a mut [u8]),
    /// Read from `input`, write the logical page into `output`.
    Split { input: &'a [u8], output: &'a mut [u8] },
}

impl PageBuffers<'_> {
    /// Length of the page being decoded.
    pub fn len(&self) -> usize {
        match self {
            Self::Inline(page) => page.len(),
            Self::Split { input, .. } => input.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// PageCodec trait
// ---------------------------------------------------------------------------

/// A handler which can encode/decode one specific page encoding.
///
/// Calls are independent of each other. Any per-page state (keys derived
/// from the page number, for instance) is the handler's own business.
///
/// # Implementing a custom handler
///
/// ```no_run
/// use olepack::page::{CodecError, PageBuffers, PageCodec};
///
/// struct Invert;
///
/// impl PageCodec for Invert {
///     fn can_encode_partial_page(&self) -> bool { true }
///     fn can_decode_inline(&self) -> bool { true }
///
///     fn decode_page(&self, buffers: PageBuffers<'_>, _page: u32) -> Result<(), CodecError> {
///         match buffers {
///             PageBuffers::Inline(page) => page.iter_mut().for_each(|b| *b = !*b),
///             PageBuffers::Split { input, output } => {
///                 for (o, i) in output.iter_mut().zip(input) {
///                     *o = !*i;
///                 }
///             }
///         }
///         Ok(())
///     }
///
///     fn encode_page<'a>(
///         &self,
///         page: &'a [u8],
///         _page_number: u32,
///         _page_offset: usize,
///         scratch: &'a mut Vec<u8>,
///     ) -> Result<&'a [u8], CodecError> {
///         scratch.clear();
///         scratch.extend(page.iter().map(|b| !*b));
///         Ok(scratch.as_slice())
///     }
/// }
/// ```
pub trait PageCodec: Send + Sync {
    /// Whether [`encode_page`](Self::encode_page) accepts a nonzero
    /// `page_offset`. When `false` the caller only ever encodes full pages.
    fn can_encode_partial_page(&self) -> bool;

    /// Whether decode may write its output back into the buffer it read from.
    /// When `false` the caller always supplies [`PageBuffers::Split`].
    fn can_decode_inline(&self) -> bool;

    /// Decode an on-disk page into its logical form.
    ///
    /// `page_number` may feed keystream/IV derivation.
    fn decode_page(&self, buffers: PageBuffers<'_>, page_number: u32) -> Result<(), CodecError>;

    /// Encode `page` (which starts logically at `page_offset` within the
    /// page) and return the encoded bytes.
    ///
    /// `page` is never modified. The result may borrow `scratch`, a buffer the
    /// caller reuses for every call, so it is only valid until the next
    /// encode; handlers that need no transformation may return `page` itself.
    fn encode_page<'a>(
        &self,
        page: &'a [u8],
        page_number: u32,
        page_offset: usize,
        scratch: &'a mut Vec<u8>,
    ) -> Result<&'a [u8], CodecError>;
}

/// Decode `page` in place, honouring the handler's inline capability.
///
/// Handlers that cannot decode inline get a copy of the page in `scratch` as
/// their input; `scratch` is reused across calls by the page manager.
pub fn decode_page_in_place(
    codec: &dyn PageCodec,
    page: &mut [u8],
    page_number: u32,
    scratch: &mut Vec<u8>,
) -> Result<(), CodecError> {
    if codec.can_decode_inline() {
        return codec.decode_page(PageBuffers::Inline(page), page_number);
    }

    scratch.clear();
    scratch.extend_from_slice(page);
    codec.decode_page(
        PageBuffers::Split {
            input: scratch.as_slice(),
            output: page,
        },
        page_number,
    )
}

// ---------------------------------------------------------------------------
// Identity handler
// ---------------------------------------------------------------------------

/// Handler for databases whose pages are stored without any transformation.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

impl PageCodec for IdentityCodec {
    fn can_encode_partial_page(&self) -> bool {
        true
    }

    fn can_decode_inline(&self) -> bool {
        true
    }

    fn decode_page(&self, buffers: PageBuffers<'_>, _page_number: u32) -> Result<(), CodecError> {
        match buffers {
            PageBuffers::Inline(_) => Ok(()),
            PageBuffers::Split { input, output } => {
                if input.len() != output.len() {
                    return Err(CodecError::BufferMismatch {
                        input: input.len(),
                        output: output.len(),
                    });
                }
                output.copy_from_slice(input);
                Ok(())
            }
        }
    }

    fn encode_page<'a>(
        &self,
        page: &'a [u8],
        _page_number: u32,
        _page_offset: usize,
        _scratch: &'a mut Vec<u8>,
    ) -> Result<&'a [u8], CodecError> {
        Ok(page)
    }
}

// ---------------------------------------------------------------------------
// Unsupported handler
// ---------------------------------------------------------------------------

/// Handler installed for an encoded database when no provider understands
/// its encoding. Every decode/encode fails with
/// [`CodecError::UnsupportedEncoding`].
#[derive(Debug, Clone)]
pub struct UnsupportedCodec {
    database: String,
}

impl UnsupportedCodec {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
        }
    }

    fn error(&self) -> CodecError {
        CodecError::UnsupportedEncoding {
            database: self.database.clone(),
        }
    }
}

impl PageCodec for UnsupportedCodec {
    fn can_encode_partial_page(&self) -> bool {
        true
    }

    fn can_decode_inline(&self) -> bool {
        true
    }

    fn decode_page(&self, _buffers: PageBuffers<'_>, page_number: u32) -> Result<(), CodecError> {
        log::debug!("refusing to decode page {page_number} of {}", self.database);
        Err(self.error())
    }

    fn encode_page<'a>(
        &self,
        _page: &'a [u8],
        _page_number: u32,
        _page_offset: usize,
        _scratch: &'a mut Vec<u8>,
    ) -> Result<&'a [u8], CodecError> {
        Err(self.error())
    }
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// What a provider knows about the database file being opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecContext {
    /// Name used in diagnostics (usually the file path).
    pub database: String,
    /// Page size of the file format version.
    pub page_size: usize,
    /// Whether the file header declares a page encoding.
    pub encoded: bool,
}

/// Creates the page handler for an opened database file.
pub trait CodecProvider: Send + Sync {
    fn create_handler(&self, ctx: &CodecContext) -> Result<Arc<dyn PageCodec>, CodecError>;
}

/// Provider used when the application installs none: plain databases get
/// [`IdentityCodec`], encoded ones get [`UnsupportedCodec`] so that opening
/// succeeds but reading any page reports the missing handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCodecProvider;

impl CodecProvider for DefaultCodecProvider {
    fn create_handler(&self, ctx: &CodecContext) -> Result<Arc<dyn PageCodec>, CodecError> {
        if ctx.encoded {
            log::warn!(
                "{} declares a page encoding but no codec provider is installed",
                ctx.database
            );
            Ok(Arc::new(UnsupportedCodec::new(ctx.database.clone())))
        } else {
            Ok(Arc::new(IdentityCodec))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
