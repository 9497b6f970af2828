//! Plain-text decoding, also used for unrecognized extensions.

/// Decode UTF-8, silently dropping byte sequences that are not valid UTF-8.
pub(crate) fn decode_lossy(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}
