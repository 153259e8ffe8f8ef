//! JSON helpers used by the protocol writer.

use serde_json::Value;

/// Returns true if `text` is a complete, syntactically valid JSON value.
pub fn is_valid(text: &str) -> bool {
    serde_json::from_str::<Value>(text).is_ok()
}

/// Returns true if `text` is an already quoted JSON string literal.
pub fn is_string(text: &str) -> bool {
    matches!(serde_json::from_str::<Value>(text), Ok(Value::String(_)))
}

/// Escapes arbitrary text into a quoted JSON string literal.
///
/// ```
/// assert_eq!(blockbar_core::json::escape("a \"b\""), r#""a \"b\"""#);
/// ```
pub fn escape(text: &str) -> String {
    Value::String(text.to_owned()).to_string()
}
