// String encodings used by the package format.
//
// Header fields use a single-byte ANSI encoding restricted to US-ASCII:
// unmappable characters become '?' when written and high bytes become
// U+FFFD when read. The simple-package footer repeats names as UTF-16LE,
// which keeps characters the ANSI copies lose.

/// Encode `s` as ANSI with a trailing NUL.
pub fn ansi_zero_terminated(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() + 1);
    out.extend(s.chars().map(|c| if c.is_ascii() { c as u8 } else { b'?' }));
    out.push(0);
    out
}

/// Decode ANSI bytes, dropping one trailing NUL if present.
pub fn decode_ansi(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(&[0]).unwrap_or(bytes);
    bytes
        .iter()
        .map(|&b| {
            if b.is_ascii() {
                b as char
            } else {
                char::REPLACEMENT_CHARACTER
            }
        })
        .collect()
}

/// Encode `s` as UTF-16LE without a terminator.
pub fn utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Decode UTF-16LE bytes, dropping one trailing NUL if present. An odd
/// trailing byte is ignored.
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    let units = units.strip_suffix(&[0]).unwrap_or(&units[..]);
    String::from_utf16_lossy(units)
}
