//! Recognized i3bar protocol keys
//!
//! See <https://i3wm.org/docs/i3bar-protocol.html>. Only the keys listed
//! here are ever written to the bar; everything else a block holds
//! (`command`, `interval`, click coordinates...) stays internal.

/// How a recognized key's value is typed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Not part of the protocol, never rendered.
    Unknown,
    /// Always emitted as a JSON string.
    StringTyped,
    /// Emitted verbatim when it is valid JSON (numbers, booleans...).
    RawTyped,
}

/// Protocol keys in table order.
///
/// The order matters: line `n` of a block command's plain output fills
/// the `n`-th key.
pub const PROTOCOL_KEYS: &[(&str, KeyKind)] = &[
    ("full_text", KeyKind::StringTyped),
    ("short_text", KeyKind::StringTyped),
    ("color", KeyKind::StringTyped),
    ("background", KeyKind::StringTyped),
    ("border", KeyKind::StringTyped),
    // min_width can also be a number
    ("min_width", KeyKind::RawTyped),
    ("align", KeyKind::StringTyped),
    ("name", KeyKind::StringTyped),
    ("instance", KeyKind::StringTyped),
    ("urgent", KeyKind::RawTyped),
    ("separator", KeyKind::RawTyped),
    ("separator_block_width", KeyKind::RawTyped),
    ("markup", KeyKind::StringTyped),
    // i3-gaps
    ("border_top", KeyKind::RawTyped),
    ("border_bottom", KeyKind::RawTyped),
    ("border_left", KeyKind::RawTyped),
    ("border_right", KeyKind::RawTyped),
];

/// Looks up a key by exact name.
///
/// # Example
///
/// ```
/// use blockbar_core::keys::{key_kind, KeyKind};
///
/// assert_eq!(key_kind("full_text"), KeyKind::StringTyped);
/// assert_eq!(key_kind("urgent"), KeyKind::RawTyped);
/// assert_eq!(key_kind("command"), KeyKind::Unknown);
/// ```
pub fn key_kind(key: &str) -> KeyKind {
    PROTOCOL_KEYS
        .iter()
        .find(|(name, _)| *name == key)
        .map_or(KeyKind::Unknown, |(_, kind)| *kind)
}

/// Returns the key filled by the given zero-based output line, if any.
pub fn key_for_line(index: usize) -> Option<&'static str> {
    PROTOCOL_KEYS.get(index).map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_table_kinds() {
        let strings = [
            "full_text",
            "short_text",
            "color",
            "background",
            "border",
            "align",
            "name",
            "instance",
            "markup",
        ];
        let raws = [
            "min_width",
            "urgent",
            "separator",
            "separator_block_width",
            "border_top",
            "border_bottom",
            "border_left",
            "border_right",
        ];

        for key in strings {
            assert_eq!(key_kind(key), KeyKind::StringTyped, "{key}");
        }
        for key in raws {
            assert_eq!(key_kind(key), KeyKind::RawTyped, "{key}");
        }
        assert_eq!(PROTOCOL_KEYS.len(), strings.len() + raws.len());
    }

    #[test]
    fn test_lookup_is_exact() {
        assert_eq!(key_kind(""), KeyKind::Unknown);
        assert_eq!(key_kind("Full_Text"), KeyKind::Unknown);
        assert_eq!(key_kind("full_text "), KeyKind::Unknown);
    }

    #[test]
    fn test_key_for_line() {
        assert_eq!(key_for_line(0), Some("full_text"));
        assert_eq!(key_for_line(1), Some("short_text"));
        assert_eq!(key_for_line(2), Some("color"));
        assert_eq!(key_for_line(PROTOCOL_KEYS.len()), None);
    }

    proptest! {
        #[test]
        fn prop_unlisted_keys_are_unknown(key in "[a-z_]{1,24}") {
            let listed = PROTOCOL_KEYS.iter().any(|(name, _)| *name == key);
            prop_assert_eq!(key_kind(&key) == KeyKind::Unknown, !listed);
        }
    }
}
