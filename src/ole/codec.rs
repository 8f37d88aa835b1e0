// Entry point for parsing and building package blobs.

use std::fmt;
use std::sync::Arc;

use super::blob::OleBlob;
use super::builder::{self, OleBlobBuilder};
use super::compound::CompoundPackageFactory;
use super::error::OleError;

/// Largest value an OLE column accepts.
pub const OLE_MAX_SIZE: u64 = 0x3FFF_FFFF;

/// Limits applied when building packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageOptions {
    /// Upper bound on the assembled package size, in bytes.
    pub max_size: u64,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            max_size: OLE_MAX_SIZE,
        }
    }
}

/// Parses blobs and builds new ones, optionally with a compound storage
/// extension installed.
#[derive(Clone, Default)]
pub struct PackageCodec {
    options: PackageOptions,
    compound: Option<Arc<dyn CompoundPackageFactory>>,
}

impl PackageCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: PackageOptions) -> Self {
        Self {
            options,
            compound: None,
        }
    }

    /// Install a compound storage extension for blobs parsed by this codec.
    pub fn with_compound_factory(mut self, factory: Arc<dyn CompoundPackageFactory>) -> Self {
        self.compound = Some(factory);
        self
    }

    pub fn options(&self) -> &PackageOptions {
        &self.options
    }

    pub fn has_compound_factory(&self) -> bool {
        self.compound.is_some()
    }

    /// Wrap `bytes` as a blob. Parsing is deferred to the first content access.
    pub fn parse(&self, bytes: impl Into<Vec<u8>>) -> OleBlob {
        OleBlob::with_factory(bytes.into(), self.compound.clone())
    }

    /// Assemble the package described by `builder`.
    pub fn build(&self, builder: OleBlobBuilder) -> Result<OleBlob, OleError> {
        let bytes = builder::assemble(builder, self.options.max_size)?;
        Ok(self.parse(bytes))
    }
}

impl fmt::Debug for PackageCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageCodec")
            .field("options", &self.options)
            .field("compound", &self.compound.is_some())
            .finish()
    }
}

/// Parse with default options and no extension.
pub fn parse_blob(bytes: impl Into<Vec<u8>>) -> OleBlob {
    OleBlob::from_bytes(bytes)
}
