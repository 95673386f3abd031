//! Strict UTF-16 decoding for code-unit entry points.
//!
//! Rust strings are well-formed by construction, so surrogate pairing can
//! only go wrong in data that arrives as raw UTF-16 code units (typically
//! from JavaScript-origin buffers). The `&[u16]` entry points on the XML
//! writer and the JSONP validator funnel through [`decode_utf16_strict`],
//! which reports the first mis-paired unit and where it sits.

use crate::error::EncodingViolation;

/// Decodes UTF-16 code units, rejecting any unpaired surrogate.
///
/// A high surrogate must be immediately followed by a low surrogate; a
/// leading low surrogate or a trailing high surrogate is an
/// [`EncodingViolation::UnpairedSurrogate`] carrying the unit and its index.
///
/// # Errors
///
/// Returns the violation for the first mis-paired unit encountered.
pub fn decode_utf16_strict(units: &[u16]) -> Result<String, EncodingViolation> {
    let mut decoded = String::with_capacity(units.len());
    let mut index = 0;
    for result in char::decode_utf16(units.iter().copied()) {
        match result {
            Ok(ch) => {
                decoded.push(ch);
                index += ch.len_utf16();
            }
            Err(err) => {
                return Err(EncodingViolation::UnpairedSurrogate {
                    unit: err.unpaired_surrogate(),
                    index,
                })
            }
        }
    }
    Ok(decoded)
}
