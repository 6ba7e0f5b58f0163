//! Locating the JSON payload embedded in a completion response.
//!
//! Completion services wrap their reply in different envelopes: the
//! `choices[0].message.content` shape, a flat `content` field, and content
//! that is either a ready-made JSON object or prose with a JSON object buried
//! inside it.  [`extract_payload`] handles all of them.

use serde_json::Value;

use crate::completion::CompletionError;

/// Pull the planner's JSON payload out of a raw completion response.
///
/// Resolution order:
///
/// 1. `choices[0].message.content` when a `choices` array is present
///    (a bare-string `message` is tolerated), else the flat `content` field.
/// 2. If the content is already a JSON object, return it directly.
/// 3. Otherwise scan the content text for the first `{` and the last `}` and
///    parse that substring as JSON.
///
/// # Errors
///
/// [`CompletionError::Malformed`] when no brace pair exists or the substring
/// is not valid JSON.  The offending text is carried in the error for
/// diagnostics.
pub fn extract_payload(raw: &Value) -> Result<Value, CompletionError> {
    let content = if raw.get("choices").is_some() {
        let message = &raw["choices"][0]["message"];
        if message.is_string() {
            message.clone()
        } else {
            message["content"].clone()
        }
    } else {
        raw["content"].clone()
    };

    // Fast path: the service already returned structured content.
    if content.is_object() {
        return Ok(content);
    }

    let text = match &content {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };

    let (start, end) = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => return Err(CompletionError::Malformed(text)),
    };

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(payload) => Ok(payload),
        Err(_) => Err(CompletionError::Malformed(text)),
    }
}
