//! Response routing.
//!
//! Classifies one complete reply from the completion endpoint as either
//! plain chat content or an embedded executable-code directive. Replies
//! arrive incrementally, so classification runs only once the stream is
//! exhausted; partial JSON cannot be parsed mid-stream.

use serde_json::Value;
use tabchat_types::ResponseEnvelope;

/// Classify a completed reply.
///
/// A reply whose JSON body (bare, or wrapped in a single Markdown code
/// fence) carries a non-empty string `code` field becomes a
/// [`ResponseEnvelope::CodeDirective`] with that field's verbatim value.
/// Anything else (plain prose, malformed JSON, a missing or empty `code`
/// field) is plain text carrying the full original reply. Parse failures
/// never propagate.
pub fn classify_reply(reply: &str) -> ResponseEnvelope {
    if let Some(code) = parse_code_field(reply) {
        return ResponseEnvelope::CodeDirective { code };
    }

    ResponseEnvelope::PlainText {
        content: reply.to_string(),
    }
}

fn parse_code_field(reply: &str) -> Option<String> {
    let candidate = strip_code_fence(reply.trim());

    let value: Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(target: "tabchat::router", "Reply is not an envelope: {}", e);
            return None;
        }
    };

    match value.get("code").and_then(Value::as_str) {
        Some(code) if !code.is_empty() => Some(code.to_string()),
        _ => None,
    }
}

/// Strip a single surrounding Markdown code fence, if present.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop an info string like "json" on the opening fence line.
    match body.split_once('\n') {
        Some((first_line, remainder)) if !first_line.contains('{') => remainder.trim(),
        _ => body.trim(),
    }
}
