// Optional compound-storage (structured storage) extension point.
//
// No compound file reader ships with this crate. Applications that have one
// install a `CompoundPackageFactory` on the `PackageCodec`; without it,
// compound payloads parse as `Content::Other` and stay readable as bytes.

use std::fmt;

use super::content::PackageInfo;
use super::error::OleError;

/// Magic at the start of every compound file.
pub const COMPOUND_STORAGE_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Name of the stream holding the primary data of a packaged document.
pub const CONTENTS_ENTRY: &str = "CONTENTS";

/// An opened compound storage container.
pub trait CompoundStorage: fmt::Debug + Send + Sync {
    /// Names of the streams in the container (paths use `/` separators).
    fn entry_names(&self) -> Vec<String>;

    /// Read a stream by name; `Ok(None)` if there is no such entry.
    fn read_entry(&self, name: &str) -> Result<Option<Vec<u8>>, OleError>;

    fn has_contents_entry(&self) -> bool {
        self.entry_names().iter().any(|n| n == CONTENTS_ENTRY)
    }
}

/// Everything the parser knows when it hands a payload to the extension.
#[derive(Debug, Clone, Copy)]
pub struct CompoundRequest<'a> {
    /// The whole blob buffer.
    pub blob: &'a [u8],
    pub package: &'a PackageInfo,
    /// Absolute position of the payload within `blob`.
    pub position: usize,
    /// The buffer from the payload position to the end of the blob.
    pub remaining: &'a [u8],
    /// Declared payload length.
    pub payload_len: usize,
}

impl<'a> CompoundRequest<'a> {
    /// The declared payload itself.
    pub fn payload(&self) -> &'a [u8] {
        &self.remaining[..self.payload_len.min(self.remaining.len())]
    }
}

/// Opens compound payloads. Failures degrade the blob to `Content::Other`.
pub trait CompoundPackageFactory: Send + Sync {
    fn open(&self, request: CompoundRequest<'_>) -> Result<Box<dyn CompoundStorage>, OleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Names(Vec<String>);

    impl CompoundStorage for Names {
        fn entry_names(&self) -> Vec<String> {
            self.0.clone()
        }

        fn read_entry(&self, _name: &str) -> Result<Option<Vec<u8>>, OleError> {
            Ok(None)
        }
    }

    #[test]
    fn contents_entry_detection() {
        assert!(Names(vec!["CONTENTS".into()]).has_contents_entry());
        assert!(!Names(vec!["\u{1}Ole".into()]).has_contents_entry());
    }

    #[test]
    fn request_payload_is_clamped() {
        let blob = [1u8, 2, 3, 4, 5];
        let package = PackageInfo::default();
        let req = CompoundRequest {
            blob: &blob,
            package: &package,
            position: 2,
            remaining: &blob[2..],
            payload_len: 10,
        };
        assert_eq!(req.payload(), &[3, 4, 5]);
    }
}
