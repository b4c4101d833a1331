use serde::de::DeserializeOwned;

use crate::error::GenerationError;

/// Models sometimes wrap JSON replies in a Markdown code fence even when
/// asked not to.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

pub fn decode_json_reply<T: DeserializeOwned>(text: &str) -> Result<T, GenerationError> {
    serde_json::from_str(strip_code_fence(text))
        .map_err(|e| GenerationError::Malformed(format!("{e} in reply {text:?}")))
}
