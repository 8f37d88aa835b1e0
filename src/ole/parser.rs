// Classification of raw blob bytes into `Content`.
//
// A single forward pass with four outcomes for built-in data: Link,
// SimplePackage, Other, Unknown (plus CompoundStorage when an extension is
// installed). Guards are evaluated in a fixed order:
//
//   1. outer signature missing          -> Unknown
//   2. ole version not understood       -> Unknown
//   3. type name "Package"              -> package stream (Link/SimplePackage,
//                                          Other if unrecognised)
//   4. compound magic + extension       -> CompoundStorage
//   5. anything else                    -> Other
//
// Truncated headers, or a declared payload running past the buffer, also
// resolve to Unknown so that arbitrary data stays readable.

use super::compound::{COMPOUND_STORAGE_SIGNATURE, CompoundPackageFactory, CompoundRequest};
use super::content::{
    CompoundContent, Content, EmbeddedRange, LinkContent, OtherContent, PackageInfo,
    SimplePackageContent, UnknownContent,
};
use super::header::{OLE_VERSION, OleHeader, PACKAGE_SIGNATURE, PACKAGE_TYPE_NAME, PackageHeader};
use super::reader::{ByteReader, Truncated};
use super::stream::{self, PackageStream};

/// Classify `bytes`. Never fails: unrecognised data is `Unknown` or `Other`.
pub fn parse_content(bytes: &[u8], compound: Option<&dyn CompoundPackageFactory>) -> Content {
    match classify(bytes, compound) {
        Ok(content) => content,
        Err(t) => {
            log::debug!("ole package header truncated ({t}), reading as unknown");
            unknown(bytes)
        }
    }
}

fn unknown(bytes: &[u8]) -> Content {
    Content::Unknown(UnknownContent {
        length: bytes.len(),
    })
}

fn classify(
    bytes: &[u8],
    compound: Option<&dyn CompoundPackageFactory>,
) -> Result<Content, Truncated> {
    let mut r = ByteReader::new(bytes);
    if r.peek_u16() != Some(PACKAGE_SIGNATURE) {
        log::trace!("no package signature in {}-byte blob", bytes.len());
        return Ok(unknown(bytes));
    }

    let outer = PackageHeader::decode(&mut r)?;
    r.seek(outer.header_len as usize)?;

    let ole = OleHeader::decode(&mut r)?;
    if ole.version != OLE_VERSION {
        log::debug!("unsupported ole version {:#06X}", ole.version);
        return Ok(unknown(bytes));
    }

    let package = PackageInfo {
        pretty_name: outer.pretty_name,
        class_name: outer.class_name,
        type_name: ole.type_name,
    };
    let data_len = ole.data_len as usize;
    let payload = r.narrow(data_len)?;
    let range = EmbeddedRange::new(payload.position(), data_len);

    if package.type_name.eq_ignore_ascii_case(PACKAGE_TYPE_NAME) {
        return Ok(package_stream(package, payload, range));
    }

    if let Some(factory) = compound
        && r.peek_matches(&COMPOUND_STORAGE_SIGNATURE)
    {
        let request = CompoundRequest {
            blob: bytes,
            package: &package,
            position: range.position,
            remaining: r.rest(),
            payload_len: data_len,
        };
        match factory.open(request) {
            Ok(storage) => {
                log::trace!("compound storage payload at {}+{}", range.position, range.length);
                return Ok(Content::CompoundStorage(CompoundContent {
                    package,
                    range,
                    storage,
                }));
            }
            Err(e) => log::warn!("compound storage extension failed, reading as other: {e}"),
        }
    }

    Ok(Content::Other(OtherContent { package, range }))
}

/// Decode the "Package" shell object's stream; anything it does not
/// recognise is `Other` over the whole payload range.
fn package_stream(package: PackageInfo, payload: ByteReader<'_>, range: EmbeddedRange) -> Content {
    match stream::parse(payload) {
        Ok(PackageStream::Embedded {
            file_name,
            file_path,
            local_file_path,
            data,
        }) => Content::SimplePackage(SimplePackageContent {
            package,
            range: data,
            file_name,
            file_path,
            local_file_path,
        }),
        Ok(PackageStream::Linked {
            file_name,
            file_path,
            link_path,
        }) => Content::Link(LinkContent {
            package,
            file_name,
            link_path,
            file_path,
        }),
        Ok(PackageStream::Unrecognized) => Content::Other(OtherContent { package, range }),
        Err(t) => {
            log::debug!("package stream truncated ({t}), reading as other");
            Content::Other(OtherContent { package, range })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::content::ContentType;
    use crate::ole::header::{OLE_FORMAT, PACKAGE_FOOTER};

    fn package(pretty: &str, class: &str, type_name: &str, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        PackageHeader::new(pretty, class)
            .unwrap()
            .encode(&mut out)
            .unwrap();
        OleHeader::new(type_name, payload.len() as u32)
            .encode(&mut out)
            .unwrap();
        out.extend_from_slice(payload);
        out.extend_from_slice(&PACKAGE_FOOTER);
        out
    }

    #[test]
    fn single_zero_byte_is_unknown() {
        let content = parse_content(&[0x00], None);
        assert_eq!(content.content_type(), ContentType::Unknown);
    }

    #[test]
    fn empty_buffer_is_unknown() {
        assert_eq!(parse_content(&[], None).content_type(), ContentType::Unknown);
    }

    #[test]
    fn wrong_version_is_unknown() {
        let mut bytes = package("P", "C", "T", b"data");
        let header_len = u16::from_le_bytes([bytes[2], bytes[3]]) as usize;
        bytes[header_len..header_len + 4].copy_from_slice(&0x0502u32.to_le_bytes());
        assert_eq!(
            parse_content(&bytes, None).content_type(),
            ContentType::Unknown
        );
        // The format field is not checked.
        let mut bytes = package("P", "C", "T", b"data");
        bytes[header_len + 4..header_len + 8].copy_from_slice(&(OLE_FORMAT + 1).to_le_bytes());
        assert_eq!(
            parse_content(&bytes, None).content_type(),
            ContentType::Other
        );
    }

    #[test]
    fn other_records_payload_range() {
        let bytes = package("Pretty", "Cls", "Paint.Picture", b"PAYLOAD");
        let content = parse_content(&bytes, None);
        let other = content.as_other().expect("other content");
        assert_eq!(other.package.pretty_name, "Pretty");
        assert_eq!(other.package.class_name, "Cls");
        assert_eq!(other.package.type_name, "Paint.Picture");
        assert_eq!(&bytes[other.range.as_range()], b"PAYLOAD");
    }

    #[test]
    fn payload_past_end_is_unknown() {
        let mut bytes = package("P", "C", "T", b"abc");
        bytes.truncate(bytes.len() - PACKAGE_FOOTER.len() - 2);
        assert_eq!(
            parse_content(&bytes, None).content_type(),
            ContentType::Unknown
        );
    }

    #[test]
    fn package_type_is_case_insensitive() {
        for type_name in ["PACKAGE", "package"] {
            let mut payload = stream::embedded_header("a.txt", "C:\\a.txt", 2).unwrap();
            payload.extend_from_slice(b"AB");
            payload.extend(stream::embedded_footer("a.txt", "C:\\a.txt").unwrap());
            let bytes = package("P", "C", type_name, &payload);

            let content = parse_content(&bytes, None);
            assert_eq!(content.content_type(), ContentType::SimplePackage);
            let simple = content.as_simple_package().unwrap();
            assert_eq!(simple.file_name, "a.txt");
            assert_eq!(simple.file_path, "C:\\a.txt");
            assert_eq!(&bytes[simple.range.as_range()], b"AB");
        }
    }

    #[test]
    fn garbage_stream_under_package_type_is_other() {
        let bytes = package("P", "C", "PACKAGE", &[0x09, 0x00, 0x01]);
        let content = parse_content(&bytes, None);
        assert_eq!(content.content_type(), ContentType::Other);
        assert_eq!(content.range().unwrap().length, 3);
    }

    #[test]
    fn truncated_package_stream_is_other() {
        // Valid signature, then nothing where the kind should be.
        let bytes = package("P", "Package", "Package", &[0x02, 0x00, b'a', 0, b'b', 0]);
        assert_eq!(
            parse_content(&bytes, None).content_type(),
            ContentType::Other
        );
    }

    #[test]
    fn compound_magic_without_extension_is_other() {
        let mut payload = COMPOUND_STORAGE_SIGNATURE.to_vec();
        payload.extend_from_slice(&[0u8; 24]);
        let bytes = package("Sheet", "Excel.Sheet.8", "Excel.Sheet.8", &payload);
        let content = parse_content(&bytes, None);
        assert_eq!(content.content_type(), ContentType::Other);
        assert_eq!(content.range().unwrap().length, payload.len());
    }
}
