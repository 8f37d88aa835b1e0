#![no_main]
use libfuzzer_sys::fuzz_target;
use olepack::ole::OleBlob;

fuzz_target!(|data: &[u8]| {
    // Classification must never panic and every reported range must lie
    // inside the blob.
    let blob = OleBlob::from_bytes(data.to_vec());
    let content = blob.content().unwrap();
    if let Some(range) = content.range() {
        assert!(range.end() <= data.len());
    }
    let _ = blob.payload().unwrap();

    // Same bytes behind a valid signature reach the deeper parse paths.
    let mut patched = data.to_vec();
    if patched.len() >= 2 {
        patched[..2].copy_from_slice(&[0x15, 0x1C]);
        let blob = OleBlob::from_bytes(patched);
        let _ = blob.payload().unwrap();
    }
});
