//! Base64 decoding for share links and subscription bodies.
//!
//! Providers are inconsistent about alphabet and padding, so decoding tries
//! the standard and URL-safe alphabets, padded and unpadded, and accepts
//! non-canonical trailing bits.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tracing::trace;

use crate::error::ParseError;

const PADDED: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_allow_trailing_bits(true)
    .with_decode_padding_mode(DecodePaddingMode::RequireCanonical);

const UNPADDED: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_allow_trailing_bits(true)
    .with_decode_padding_mode(DecodePaddingMode::RequireNone);

const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, PADDED);
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, PADDED);
const LENIENT_STANDARD_NO_PAD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, UNPADDED);
const LENIENT_URL_SAFE_NO_PAD: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, UNPADDED);

// ============================================================================
// Base64 Decoding
// ============================================================================

/// Decodes Base64 content to raw bytes.
///
/// Whitespace is removed and padding added before decoding. Variants are
/// tried in this order:
/// 1. Standard Base64
/// 2. URL-safe Base64
/// 3. Standard Base64 without padding
/// 4. URL-safe Base64 without padding
pub fn decode_base64_bytes(content: &str) -> Result<Vec<u8>, ParseError> {
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let padded = add_base64_padding(&cleaned);
    trace!("Attempting Base64 decode, cleaned length: {} bytes", cleaned.len());

    if let Ok(decoded) = LENIENT_STANDARD.decode(&padded) {
        trace!("Decoded using standard Base64");
        return Ok(decoded);
    }
    if let Ok(decoded) = LENIENT_URL_SAFE.decode(&padded) {
        trace!("Decoded using URL-safe Base64");
        return Ok(decoded);
    }

    let unpadded = padded.trim_end_matches('=');
    if let Ok(decoded) = LENIENT_STANDARD_NO_PAD.decode(unpadded) {
        trace!("Decoded using standard Base64 without padding");
        return Ok(decoded);
    }
    if let Ok(decoded) = LENIENT_URL_SAFE_NO_PAD.decode(unpadded) {
        trace!("Decoded using URL-safe Base64 without padding");
        return Ok(decoded);
    }

    Err(ParseError::Base64Decode)
}

/// Decodes Base64 content that must be UTF-8 text.
pub fn decode_base64(content: &str) -> Result<String, ParseError> {
    let bytes = decode_base64_bytes(content)?;
    String::from_utf8(bytes).map_err(|_| ParseError::Base64Decode)
}

/// Standard padded Base64.
pub fn encode_base64(content: &str) -> String {
    STANDARD.encode(content.as_bytes())
}

/// Pads a Base64 string with `=` to a multiple of 4.
pub fn add_base64_padding(s: &str) -> String {
    let mut result = s.to_string();
    while !result.len().is_multiple_of(4) {
        result.push('=');
    }
    result
}
