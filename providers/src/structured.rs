//! Pulling a JSON object out of a model reply.
//!
//! Models asked for JSON still wrap it in Markdown fences or lead with a
//! sentence of prose now and then.

use serde::de::DeserializeOwned;

use crate::ProviderError;

/// Contents of the first fenced code block, if the reply has one.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    // Skip the info string (`json`, `JSON`, ...) up to the end of the line.
    let body_start = after.find('\n').map_or(0, |i| i + 1);
    let body = &after[body_start..];
    let end = body.find("```").unwrap_or(body.len());
    Some(body[..end].trim())
}

/// First balanced `{...}` object in `text`, honoring strings and escapes.
fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// The JSON object carried by a model reply.
#[must_use]
pub fn extract_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let candidate = fenced_block(trimmed).unwrap_or(trimmed);
    first_object(candidate).or_else(|| first_object(trimmed))
}

/// Decode the JSON object in `text` as `T`.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, ProviderError> {
    let json = extract_json(text).ok_or_else(|| ProviderError::Structured {
        message: "no JSON object found in reply".to_string(),
    })?;
    serde_json::from_str(json).map_err(|e| ProviderError::Structured {
        message: e.to_string(),
    })
}
