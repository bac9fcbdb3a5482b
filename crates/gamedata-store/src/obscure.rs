//! Reversible base64 obscuring of structured-text saves.
//!
//! Release builds write the JSON text base64-encoded so the file is not
//! casually readable. Anyone can reverse it; it provides no confidentiality.

use base64::Engine;

use crate::error::{StoreError, StoreResult};

/// Encode UTF-8 text to standard, padded base64.
pub fn obscure(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(text.as_bytes())
}

/// Reverse [`obscure`]. Surrounding whitespace (e.g. a trailing newline added
/// by an editor) is ignored.
pub fn reveal(obscured: &str) -> StoreResult<String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(obscured.trim())
        .map_err(|e| StoreError::Obscure(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| StoreError::Obscure(e.to_string()))
}
