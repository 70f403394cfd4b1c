//! Scan payload decoding.
//!
//! Input is origin-agnostic: a camera QR decode or manual text entry
//! both arrive as a single string. Structured payloads are JSON objects
//! carrying the identifier under `id`, `patient_id` or `tag_id`; anything
//! else (parse failure, no known field, bare token) falls back to the
//! trimmed raw string.

use crate::resolver::ResolveError;

/// Identifier fields recognised in a structured payload, in priority order.
const PAYLOAD_ID_FIELDS: &[&str] = &["id", "patient_id", "tag_id"];

/// Extract the identifier token from a raw scan string.
///
/// # Errors
/// [`ResolveError::EmptyIdentifier`] when the token is empty after
/// trimming — whether the input was blank or a payload carried an empty
/// identifier field.
pub fn decode_scan_token(raw: &str) -> Result<String, ResolveError> {
    if let Ok(payload) = serde_json::from_str::<serde_json::Value>(raw) {
        for field in PAYLOAD_ID_FIELDS {
            if let Some(value) = payload.get(field).and_then(|v| v.as_str()) {
                let token = value.trim();
                if token.is_empty() {
                    return Err(ResolveError::EmptyIdentifier);
                }
                return Ok(token.to_string());
            }
        }
    }

    let token = raw.trim();
    if token.is_empty() {
        return Err(ResolveError::EmptyIdentifier);
    }
    Ok(token.to_string())
}
