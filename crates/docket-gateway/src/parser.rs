//! Parse model output into an extraction

use crate::error::GatewayError;
use docket_domain::{Extraction, TokenUsage};
use serde_json::Value;
use tracing::debug;

/// Parse the model's text answer into fields and tags
///
/// Accepts either `{"fields": {...}, "tags": [...]}` or a flat object whose
/// keys are the fields (with an optional `tags` entry).
pub fn parse_extraction(text: &str, usage: TokenUsage) -> Result<Extraction, GatewayError> {
    let invalid = |message: String| GatewayError::InvalidResponse {
        message,
        raw: text.to_string(),
    };

    let json_str =
        extract_json(text).ok_or_else(|| invalid("No JSON object in response".to_string()))?;
    let value: Value =
        serde_json::from_str(json_str).map_err(|e| invalid(format!("JSON parse error: {}", e)))?;
    let Value::Object(mut obj) = value else {
        return Err(invalid("Expected JSON object".to_string()));
    };

    let tags = match obj.remove("tags") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| s.trim().to_lowercase()))
            .filter(|s| !s.is_empty())
            .collect(),
        Some(other) => return Err(invalid(format!("'tags' must be an array, got {}", other))),
    };

    let fields = match obj.remove("fields") {
        Some(Value::Object(fields)) => fields,
        Some(other) => {
            // A field literally named "fields"; keep it alongside the rest.
            let mut fields = obj;
            fields.insert("fields".to_string(), other);
            fields
        }
        None => obj,
    };

    debug!(fields = fields.len(), tags = tags.len(), "Parsed extraction");
    Ok(Extraction {
        fields,
        tags,
        usage,
    })
}

/// Locate the JSON object in a response, handling markdown code blocks and
/// surrounding prose
fn extract_json(response: &str) -> Option<&str> {
    let trimmed = response.trim();

    let body = if let Some(rest) = trimmed.strip_prefix("```") {
        // Skip the language tag line and the closing fence
        let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
        rest.rsplit_once("```").map(|(body, _)| body).unwrap_or(rest)
    } else {
        trimmed
    };

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (end >= start).then(|| &body[start..=end])
}
