/*!
 * Image Payload
 * Transport encoding for raw fingerprint captures
 */

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{FingerprintError, Result};

const DATA_URL_PREFIX: &str = "data:image/";
const DATA_URL_MARKER: &str = ";base64,";

/// Encode raw capture bytes for transport.
pub fn image_to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Strip a `data:image/<subtype>;base64,` prefix if present.
pub fn strip_data_url(payload: &str) -> &str {
    let Some(rest) = payload.strip_prefix(DATA_URL_PREFIX) else {
        return payload;
    };
    match rest.find(DATA_URL_MARKER) {
        Some(idx) if idx > 0 && rest[..idx].bytes().all(|b| b.is_ascii_lowercase()) => {
            &rest[idx + DATA_URL_MARKER.len()..]
        }
        _ => payload,
    }
}

/// True when `payload` decodes and re-encodes to exactly the same text.
pub fn is_valid_base64(payload: &str) -> bool {
    decode_canonical(payload).is_some()
}

/// Decode a capture payload into its raw bytes.
pub fn decode_image(payload: &str) -> Result<Vec<u8>> {
    let data = strip_data_url(payload);
    if data.is_empty() {
        return Err(FingerprintError::InvalidImageData(
            "payload is empty".to_string(),
        ));
    }
    decode_canonical(data).ok_or_else(|| {
        FingerprintError::InvalidImageData("payload is not canonical base64".to_string())
    })
}

fn decode_canonical(payload: &str) -> Option<Vec<u8>> {
    let bytes = STANDARD.decode(payload).ok()?;
    // Reject encodings that only decode leniently.
    (STANDARD.encode(&bytes) == payload).then_some(bytes)
}
