//! Olepack: OLE package blobs and the page codec contract of desktop
//! database files.
//!
//! The crate provides:
//! - Parsing of stored OLE values into typed content and building new
//!   packages from files, links, or raw bytes (`ole`)
//! - The pluggable page encoding contract used by the page manager (`page`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use olepack::ole::{ContentType, OleBlobBuilder, PackageCodec};
//!
//! let blob = OleBlobBuilder::new()
//!     .file_name("a.txt")
//!     .file_path("C:\\a.txt")
//!     .simple_package_bytes(b"AB".to_vec())
//!     .build()
//!     .unwrap();
//!
//! let stored = blob.into_bytes().unwrap();
//! let reread = PackageCodec::default().parse(stored);
//! assert_eq!(reread.content_type().unwrap(), ContentType::SimplePackage);
//! assert_eq!(reread.payload().unwrap(), Some(&b"AB"[..]));
//! ```

pub mod io;
pub mod ole;
pub mod page;

#[cfg(feature = "cli")]
pub mod cli;
