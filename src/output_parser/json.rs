//! Loose JSON-object recovery from generation replies.
//!
//! Structured-output modes usually return clean JSON, but replies still show
//! up wrapped in markdown fences or encoded twice (a JSON string whose
//! content is the JSON object). [`parse_loose_json`] undoes both.

use serde_json::{Map, Value};

use crate::output_parser::error::{truncate, ParseError, EXCERPT_LEN};

/// Parse a generation reply into a JSON object.
///
/// Strategies (in order):
/// 1. Direct parse of the trimmed text
/// 2. If (1) yields a JSON string, parse that string again (double encoding)
/// 3. If the text is wrapped in a code fence, strip the fence lines and
///    retry (1) and (2) on the inner text
///
/// Fails with [`ParseError::NotAnObject`] as soon as a strategy decodes
/// valid JSON that is not an object, and with [`ParseError::Unparseable`]
/// when no strategy decodes at all.
///
/// # Examples
///
/// ```
/// use decision_debate::output_parser::parse_loose_json;
///
/// let fenced = "```json\n{\"winner\": \"pro\"}\n```";
/// let obj = parse_loose_json(fenced).unwrap();
/// assert_eq!(obj["winner"], "pro");
///
/// let doubled = r#""{\"winner\": \"con\"}""#;
/// assert_eq!(parse_loose_json(doubled).unwrap()["winner"], "con");
/// ```
pub fn parse_loose_json(text: &str) -> Result<Map<String, Value>, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyResponse);
    }

    if let Some(result) = decode_object(trimmed, text) {
        return result;
    }

    if let Some(inner) = strip_code_fence(trimmed) {
        if let Some(result) = decode_object(inner, text) {
            return result;
        }
    }

    Err(ParseError::Unparseable {
        text: truncate(trimmed, EXCERPT_LEN),
    })
}

/// Strip a leading ```` ``` ```` / ```` ```json ```` line and a trailing
/// ```` ``` ```` from `text`.
///
/// Returns `None` if `text` does not start with a fence.
///
/// ```
/// use decision_debate::output_parser::strip_code_fence;
///
/// assert_eq!(strip_code_fence("```json\n{}\n```"), Some("{}"));
/// assert_eq!(strip_code_fence("{}"), None);
/// ```
pub fn strip_code_fence(text: &str) -> Option<&str> {
    let rest = text.trim_start().strip_prefix("```")?;
    // The fence line may carry a language hint; drop the whole line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => "",
    };
    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);
    Some(body.trim())
}

/// One decode pass: direct parse, then one level of string unwrapping.
///
/// `None` means the text is not JSON at all and the caller should move on
/// to the next strategy.
fn decode_object(candidate: &str, original: &str) -> Option<Result<Map<String, Value>, ParseError>> {
    let mut value: Value = serde_json::from_str(candidate).ok()?;

    if let Value::String(inner) = &value {
        value = serde_json::from_str(inner.trim()).ok()?;
    }

    Some(match value {
        Value::Object(map) => Ok(map),
        other => Err(ParseError::NotAnObject {
            kind: json_kind(&other),
            text: truncate(original.trim(), EXCERPT_LEN),
        }),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
