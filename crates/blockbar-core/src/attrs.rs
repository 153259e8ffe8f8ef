//! Ordered string attribute map
//!
//! Blocks, configuration sections and click payloads are all flat
//! key/value sets. Insertion order is kept because the protocol writer
//! emits a block's keys in the order the block stores them.

use serde_json::{Map, Value};

use crate::error::BarResult;

/// Ordered map with unique keys.
///
/// A value of `None` stands for JSON `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    entries: Vec<(String, Option<String>)>,
}

impl AttributeMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of `key`, or `None` when the key is absent or null.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Returns true if `key` is present, even with a null value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Sets `key`, overwriting in place or appending a new entry.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<Option<String>>,
    {
        let key = key.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Copies every entry of `other` into `self` with overwrite semantics.
    pub fn extend_from(&mut self, other: &AttributeMap) {
        for (key, value) in other.iter() {
            self.set(key, value.map(str::to_owned));
        }
    }

    /// Iterates entries in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a single JSON object, e.g. one i3bar click event.
    ///
    /// Strings are stored unquoted, `null` as a null value and any other
    /// value as its raw JSON text.
    ///
    /// ```
    /// use blockbar_core::AttributeMap;
    ///
    /// let click = AttributeMap::from_json_object(r#"{"name":"cpu","button":1}"#).unwrap();
    /// assert_eq!(click.get("name"), Some("cpu"));
    /// assert_eq!(click.get("button"), Some("1"));
    /// ```
    pub fn from_json_object(text: &str) -> BarResult<Self> {
        let object: Map<String, Value> = serde_json::from_str(text)?;
        let mut map = Self::new();

        for (key, value) in object {
            let value = match value {
                Value::Null => None,
                Value::String(s) => Some(s),
                other => Some(other.to_string()),
            };
            map.set(key, value);
        }

        Ok(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.set(key, Some(value.into()));
        }
        map
    }
}
