//! Byte-to-text decoding for delimited files.
//!
//! Detection order: byte-order mark (UTF-8, UTF-16LE, UTF-16BE), then strict UTF-8, then
//! Windows-1252, which maps every byte and so never fails.

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use tracing::debug;

/// Decode `bytes` and return the text together with the detected encoding's name.
pub fn decode_bytes(bytes: &[u8]) -> (String, &'static str) {
    let (encoding, body) = detect(bytes);
    let (text, _had_errors) = encoding.decode_without_bom_handling(body);
    debug!(encoding = encoding.name(), bytes = bytes.len(), "decoded input");
    (text.into_owned(), encoding.name())
}

fn detect(bytes: &[u8]) -> (&'static Encoding, &[u8]) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return (encoding, &bytes[bom_len..]);
    }
    if std::str::from_utf8(bytes).is_ok() {
        (UTF_8, bytes)
    } else {
        (WINDOWS_1252, bytes)
    }
}
