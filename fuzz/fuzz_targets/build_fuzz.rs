#![no_main]
use libfuzzer_sys::fuzz_target;
use olepack::ole::{ContentType, OleBlobBuilder};

fuzz_target!(|data: &[u8]| {
    // First bytes pick the names, the rest is the embedded content.
    if data.len() < 2 {
        return;
    }
    let name_len = (data[0] as usize).min(data.len() - 1);
    let name = String::from_utf8_lossy(&data[1..1 + name_len]).into_owned();
    if name.contains('\0') {
        // NUL terminates the ANSI header fields.
        return;
    }
    let content = data[1 + name_len..].to_vec();

    let blob = OleBlobBuilder::new()
        .file_name(name.clone())
        .file_path(name)
        .simple_package_bytes(content.clone())
        .build()
        .unwrap();
    assert_eq!(blob.content_type().unwrap(), ContentType::SimplePackage);
    assert_eq!(blob.payload().unwrap(), Some(content.as_slice()));
});
