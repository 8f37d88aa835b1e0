// OLE package blobs: parsing stored values into typed content and building
// new packages from files, links, or raw bytes.
//
// Pipeline:
//   bytes --> OleBlob --(lazy, cached)--> parser --> Content
//   OleBlobBuilder --> builder::assemble --> bytes --> OleBlob

pub mod blob;
pub mod builder;
pub mod codec;
pub mod compound;
pub mod content;
pub mod error;
pub mod header;
pub mod parser;
pub mod reader;
pub mod stream;
pub mod text;

pub use blob::OleBlob;
pub use builder::{ContentSource, OleBlobBuilder};
pub use codec::{OLE_MAX_SIZE, PackageCodec, PackageOptions, parse_blob};
pub use compound::{
    COMPOUND_STORAGE_SIGNATURE, CONTENTS_ENTRY, CompoundPackageFactory, CompoundRequest,
    CompoundStorage,
};
pub use content::{
    CompoundContent, Content, ContentType, EmbeddedRange, LinkContent, OtherContent, PackageInfo,
    SimplePackageContent, UnknownContent,
};
pub use error::OleError;
