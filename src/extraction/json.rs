/*!
 * Recovering one JSON value from free-form model output.
 *
 * Responses may wrap the payload in markdown fences or surround it with
 * prose. The payload is taken from the first opening bracket to the last
 * matching closing bracket after any fence has been removed.
 */

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::ExtractionError;

/// Remove a markdown code fence if the response contains one
fn strip_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };

    let after = &trimmed[start + 3..];
    let after = match after.find('\n') {
        Some(newline)
            if after[..newline]
                .trim()
                .chars()
                .all(|c| c.is_ascii_alphanumeric()) =>
        {
            &after[newline + 1..]
        }
        _ => after,
    };

    match after.find("```") {
        Some(end) => &after[..end],
        None => after,
    }
}

fn bracketed(body: &str, open: char, close: char) -> Option<&str> {
    let start = body.find(open)?;
    let end = body.rfind(close)?;
    (end > start).then(|| &body[start..=end])
}

/// Substring between the first `{` and the last `}`
pub fn extract_object(response: &str) -> Option<&str> {
    bracketed(strip_fence(response), '{', '}')
}

/// First object or array in the response, whichever opens first
pub fn extract_value(response: &str) -> Option<&str> {
    let body = strip_fence(response);
    match body.find(['{', '[']) {
        Some(position) if body[position..].starts_with('[') => bracketed(body, '[', ']'),
        Some(_) => bracketed(body, '{', '}'),
        None => None,
    }
}

/// Parse the embedded JSON object into `T`
pub fn parse_object<T: DeserializeOwned>(response: &str) -> Result<T, ExtractionError> {
    let json = extract_object(response)
        .ok_or_else(|| ExtractionError::MalformedResponse("no JSON object in response".into()))?;
    serde_json::from_str(json).map_err(|e| ExtractionError::MalformedResponse(e.to_string()))
}

/// Parse the embedded JSON object or array into an untyped value
pub fn parse_value(response: &str) -> Result<Value, ExtractionError> {
    let json = extract_value(response)
        .ok_or_else(|| ExtractionError::MalformedResponse("no JSON value in response".into()))?;
    serde_json::from_str(json).map_err(|e| ExtractionError::MalformedResponse(e.to_string()))
}
