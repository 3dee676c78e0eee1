use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form JSON object, as decoded from entry responses.
pub type EntryMap = Map<String, Value>;

/// One record in a datafeed.
///
/// Serialized as `{"key": ..., "values": {...}, "ttl": ...}`. Nothing is
/// checked locally: an empty key or negative ttl is passed through and left
/// for the server to reject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    #[serde(default)]
    pub values: EntryMap,
    /// Time to live in seconds.
    #[serde(default)]
    pub ttl: i64,
}

impl Entry {
    pub fn new(key: impl Into<String>, ttl: i64) -> Self {
        Self {
            key: key.into(),
            values: EntryMap::new(),
            ttl,
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_entry_wire_format() {
        let entry = Entry::new("u1", 3600).with_value("name", "Alice");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({"key": "u1", "values": {"name": "Alice"}, "ttl": 3600})
        );
    }

    #[test]
    fn test_entry_missing_fields_default() {
        let entry: Entry = serde_json::from_str(r#"{"key": "k"}"#).unwrap();
        assert_eq!(entry, Entry::new("k", 0));
    }

    #[test]
    fn test_negative_ttl_passes_through() {
        let entry = Entry::new("", -5);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["ttl"], json!(-5));
        assert_eq!(value["key"], json!(""));
    }
}
