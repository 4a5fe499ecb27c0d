//! Header model shared by intercepted requests, mocked responses and synthetic responses.
//!
//! Headers on the request side and in mocks are kept as an ordered list with the
//! caller's casing. Only the synthetic response exposes lower-cased names, either as
//! a mapping (later entries win) or as a flat raw sequence in mock order.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// A header value: either a single string or an ordered list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Single(String),
    Multiple(Vec<String>),
}

impl HeaderValue {
    /// All values in order. A single value yields a one-element slice.
    pub fn as_slice(&self) -> &[String] {
        match self {
            HeaderValue::Single(value) => std::slice::from_ref(value),
            HeaderValue::Multiple(values) => values,
        }
    }

    pub fn first(&self) -> Option<&str> {
        self.as_slice().first().map(String::as_str)
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_slice().join(", "))
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Single(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Single(value)
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(values: Vec<String>) -> Self {
        HeaderValue::Multiple(values)
    }
}

impl From<Vec<&str>> for HeaderValue {
    fn from(values: Vec<&str>) -> Self {
        HeaderValue::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

/// Ordered header entries, case preserved as supplied.
///
/// Behaves like a string-keyed record: inserting a name that is already present
/// (exact match) replaces its value in place, while names that differ only by case
/// are distinct entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    entries: Vec<(String, HeaderValue)>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Case-insensitive lookup; the last matching entry wins.
    pub fn get_ignore_case(&self, name: &str) -> Option<&HeaderValue> {
        self.entries
            .iter()
            .rev()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mapping with every name lower-cased. Later entries overwrite earlier ones
    /// whose lower-cased names collide.
    pub fn to_lowercase_map(&self) -> HashMap<String, HeaderValue> {
        let mut map = HashMap::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            map.insert(name.to_lowercase(), value.clone());
        }
        map
    }

    /// Flat `name, value, name, value, ...` sequence with lower-cased names, in
    /// entry order. A multi-valued entry contributes one pair per value.
    pub fn to_raw(&self) -> Vec<String> {
        let mut raw = Vec::with_capacity(self.entries.len() * 2);
        for (name, value) in &self.entries {
            let lower = name.to_lowercase();
            for item in value.as_slice() {
                raw.push(lower.clone());
                raw.push(item.clone());
            }
        }
        raw
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderList
where
    K: Into<String>,
    V: Into<HeaderValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = HeaderList::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl Serialize for HeaderList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct HeaderListVisitor;

impl<'de> Visitor<'de> for HeaderListVisitor {
    type Value = HeaderList;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of header names to a string or list of strings")
    }

    // Entries arrive in document order, which is what keeps raw headers ordered.
    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut headers = HeaderList::new();
        while let Some((name, value)) = access.next_entry::<String, HeaderValue>()? {
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

impl<'de> Deserialize<'de> for HeaderList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(HeaderListVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_insert_replaces_exact_name_in_place() {
        let headers = HeaderList::new()
            .with("Accept", "text/html")
            .with("X-Trace", "1")
            .with("Accept", "application/json");

        assert_eq!(headers.len(), 2);
        let names: Vec<&str> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Accept", "X-Trace"]);
        assert_eq!(
            headers.get("Accept"),
            Some(&HeaderValue::from("application/json"))
        );
    }

    #[test]
    fn test_case_variants_are_distinct_entries() {
        let headers = HeaderList::new()
            .with("Content-Type", "text/plain")
            .with("content-type", "application/json");

        assert_eq!(headers.len(), 2);
        assert_eq!(
            headers.get_ignore_case("CONTENT-TYPE"),
            Some(&HeaderValue::from("application/json"))
        );
    }

    #[test]
    fn test_lowercase_map_last_write_wins() {
        let headers = HeaderList::new()
            .with("X-Id", "first")
            .with("x-id", "second");

        let map = headers.to_lowercase_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("x-id"), Some(&HeaderValue::from("second")));
    }

    #[test]
    fn test_raw_headers_preserve_order_and_values() {
        let headers = HeaderList::new()
            .with("Content-Type", "application/json")
            .with("Set-Cookie", vec!["a=1", "b=2"])
            .with("X-Empty", "");

        assert_eq!(
            headers.to_raw(),
            vec![
                "content-type",
                "application/json",
                "set-cookie",
                "a=1",
                "set-cookie",
                "b=2",
                "x-empty",
                "",
            ]
        );
    }

    #[test]
    fn test_deserialize_keeps_document_order() {
        let json = r#"{"Zeta": "1", "Alpha": ["2", "3"], "mid": "4"}"#;
        let headers: HeaderList = serde_json::from_str(json).unwrap();

        let names: Vec<&str> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "mid"]);
        assert_eq!(
            headers.get("Alpha"),
            Some(&HeaderValue::Multiple(vec!["2".into(), "3".into()]))
        );
    }

    #[test]
    fn test_serialize_as_map() {
        let headers = HeaderList::new().with("Accept", "*/*");
        let value = serde_json::to_value(&headers).unwrap();
        assert_eq!(value, serde_json::json!({"Accept": "*/*"}));
    }

    #[test]
    fn test_header_value_display_joins() {
        assert_eq!(HeaderValue::from(vec!["a", "b"]).to_string(), "a, b");
        assert_eq!(HeaderValue::from("solo").first(), Some("solo"));
    }

    proptest! {
        #[test]
        fn prop_lowercase_map_keys_are_lowercase_and_idempotent(
            entries in proptest::collection::vec(("[A-Za-z][A-Za-z0-9-]{0,12}", "[ -~]{0,16}"), 0..8)
        ) {
            let headers: HeaderList = entries.into_iter().collect();
            let map = headers.to_lowercase_map();

            for key in map.keys() {
                prop_assert_eq!(key, &key.to_lowercase());
            }

            let again: HeaderList = map.clone().into_iter().collect();
            prop_assert_eq!(again.to_lowercase_map(), map);
        }

        #[test]
        fn prop_case_collision_keeps_later_value(
            name in "[a-z][a-z-]{0,10}",
            first in "[ -~]{0,10}",
            second in "[ -~]{0,10}",
        ) {
            let headers = HeaderList::new()
                .with(name.to_uppercase(), first)
                .with(name.clone(), second.clone());

            let map = headers.to_lowercase_map();
            prop_assert_eq!(map.len(), 1);
            prop_assert_eq!(map.get(&name), Some(&HeaderValue::Single(second)));
        }
    }
}
