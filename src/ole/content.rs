// Decoded, typed interpretations of an OLE blob.
//
// Content values never own the blob's bytes: embedded variants record a
// byte range into the owning blob and are resolved through
// `OleBlob::payload()`.

use std::fmt;
use std::fs::File;
use std::io;
use std::ops::Range;

use super::compound::CompoundStorage;

// ---------------------------------------------------------------------------
// Content type tag
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// Reference to an external file.
    Link,
    /// Embedded file wrapped by the "Package" shell object.
    SimplePackage,
    /// Any other embedded object, readable as opaque bytes.
    Other,
    /// Structured storage decoded by an installed compound extension.
    CompoundStorage,
    /// Data that is not an OLE package at all.
    Unknown,
}

impl ContentType {
    /// Types the builder can produce.
    pub const WRITABLE: [ContentType; 3] = [Self::Link, Self::SimplePackage, Self::Other];

    pub fn is_writable(self) -> bool {
        Self::WRITABLE.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::SimplePackage => "simple_package",
            Self::Other => "other",
            Self::CompoundStorage => "compound_storage",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Shared records
// ---------------------------------------------------------------------------

/// Identity strings from the outer package header.
///
/// Parsed independently: the class and type names may differ or be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageInfo {
    pub pretty_name: String,
    pub class_name: String,
    pub type_name: String,
}

/// Location of an embedded payload inside the owning blob's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedRange {
    pub position: usize,
    pub length: usize,
}

impl EmbeddedRange {
    pub fn new(position: usize, length: usize) -> Self {
        Self { position, length }
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.position + self.length
    }

    #[inline]
    pub fn as_range(&self) -> Range<usize> {
        self.position..self.end()
    }
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

/// A link to an external file. Carries no embedded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkContent {
    pub package: PackageInfo,
    pub file_name: String,
    /// Absolute path of the linked file.
    pub link_path: String,
    pub file_path: String,
}

impl LinkContent {
    /// Open the linked file for reading.
    pub fn open_link(&self) -> io::Result<File> {
        File::open(&self.link_path)
    }
}

/// A file embedded through the "Package" shell object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplePackageContent {
    pub package: PackageInfo,
    pub range: EmbeddedRange,
    pub file_name: String,
    pub file_path: String,
    pub local_file_path: String,
}

/// An embedded object this crate does not interpret further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherContent {
    pub package: PackageInfo,
    pub range: EmbeddedRange,
}

/// Structured storage opened by a [`CompoundPackageFactory`](super::CompoundPackageFactory).
#[derive(Debug)]
pub struct CompoundContent {
    pub package: PackageInfo,
    pub range: EmbeddedRange,
    pub storage: Box<dyn CompoundStorage>,
}

/// Bytes that are not an OLE package; the payload is the whole blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownContent {
    pub length: usize,
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum Content {
    Link(LinkContent),
    SimplePackage(SimplePackageContent),
    Other(OtherContent),
    CompoundStorage(CompoundContent),
    Unknown(UnknownContent),
}

impl Content {
    pub fn content_type(&self) -> ContentType {
        match self {
            Self::Link(_) => ContentType::Link,
            Self::SimplePackage(_) => ContentType::SimplePackage,
            Self::Other(_) => ContentType::Other,
            Self::CompoundStorage(_) => ContentType::CompoundStorage,
            Self::Unknown(_) => ContentType::Unknown,
        }
    }

    /// Package identity, absent for unknown data.
    pub fn package(&self) -> Option<&PackageInfo> {
        match self {
            Self::Link(c) => Some(&c.package),
            Self::SimplePackage(c) => Some(&c.package),
            Self::Other(c) => Some(&c.package),
            Self::CompoundStorage(c) => Some(&c.package),
            Self::Unknown(_) => None,
        }
    }

    /// Byte range of the payload within the blob. Links have none.
    pub fn range(&self) -> Option<EmbeddedRange> {
        match self {
            Self::Link(_) => None,
            Self::SimplePackage(c) => Some(c.range),
            Self::Other(c) => Some(c.range),
            Self::CompoundStorage(c) => Some(c.range),
            Self::Unknown(c) => Some(EmbeddedRange::new(0, c.length)),
        }
    }

    pub fn as_link(&self) -> Option<&LinkContent> {
        match self {
            Self::Link(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_simple_package(&self) -> Option<&SimplePackageContent> {
        match self {
            Self::SimplePackage(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_other(&self) -> Option<&OtherContent> {
        match self {
            Self::Other(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&CompoundContent> {
        match self {
            Self::CompoundStorage(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content_type())?;
        if let Some(p) = self.package() {
            write!(
                f,
                " prettyName={:?} className={:?} typeName={:?}",
                p.pretty_name, p.class_name, p.type_name
            )?;
        }
        match self {
            Self::Link(c) => write!(
                f,
                " fileName={:?} linkPath={:?} filePath={:?}",
                c.file_name, c.link_path, c.file_path
            )?,
            Self::SimplePackage(c) => write!(
                f,
                " fileName={:?} filePath={:?} localFilePath={:?}",
                c.file_name, c.file_path, c.local_file_path
            )?,
            _ => {}
        }
        if let Some(r) = self.range() {
            write!(f, " content={}+{}", r.position, r.length)?;
        }
        Ok(())
    }
}
