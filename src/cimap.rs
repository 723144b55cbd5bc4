//! Case-insensitive, path-addressable view of a decoded config file.
//!
//! [`CiMap`] implements `Deserialize`, so any self-describing decoder
//! (`serde_yaml`, `serde_json`, `toml`) produces it directly. Mappings become
//! nested `CiMap`s; everything else (scalars, sequences) is kept as a
//! `serde_json::Value` so it can later be decoded into the target field type.
//!
//! ```text
//! Database:            get("database.port")  -> 5432
//!   Port: 5432         get("DATABASE.PORT")  -> 5432
//!                      get("database.host")  -> None
//! ```

use std::fmt;

use serde::de::{self, DeserializeOwned, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;

/// A value in a [`CiMap`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Value(Value),
    Map(CiMap),
}

impl Node {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Value(v) => v.as_str(),
            Node::Map(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Value(Value::Null))
    }

    /// Convert to plain JSON. Keys of nested maps keep their original case.
    pub fn to_json(&self) -> Value {
        match self {
            Node::Value(v) => v.clone(),
            Node::Map(map) => Value::Object(
                map.entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Decode into `T` with serde.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_json())
    }
}

/// Ordered mapping with case-insensitive keys.
#[derive(Debug, Clone, PartialEq)]
pub struct CiMap {
    separator: String,
    entries: Vec<(String, Node)>,
}

impl Default for CiMap {
    fn default() -> Self {
        Self::new(".")
    }
}

impl CiMap {
    pub fn new(separator: &str) -> Self {
        Self {
            separator: separator.to_string(),
            entries: Vec::new(),
        }
    }

    /// Use `separator` for path lookups on this map and every nested map.
    pub fn with_separator(mut self, separator: &str) -> Self {
        self.set_separator(separator);
        self
    }

    fn set_separator(&mut self, separator: &str) {
        self.separator = separator.to_string();
        for (_, node) in &mut self.entries {
            if let Node::Map(nested) = node {
                nested.set_separator(separator);
            }
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Insert a value. A key equal to an existing one ignoring case replaces
    /// that entry's value; the first spelling of the key is kept.
    pub fn insert(&mut self, key: impl Into<String>, node: Node) {
        let key = key.into();
        match self.position(&key) {
            Some(i) => self.entries[i].1 = node,
            None => self.entries.push((key, node)),
        }
    }

    /// Direct child lookup, ignoring case.
    pub fn get_key(&self, key: &str) -> Option<&Node> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    /// Path lookup: `path` is split on the separator and each segment is
    /// matched one level deeper. Any unmatched segment yields `None`.
    pub fn get(&self, path: &str) -> Option<&Node> {
        let mut segments = path.split(self.separator.as_str());
        let first = segments.next()?;
        let mut current = self.get_key(first)?;
        for segment in segments {
            let Node::Map(map) = current else {
                return None;
            };
            current = map.get_key(segment)?;
        }
        Some(current)
    }

    fn position(&self, key: &str) -> Option<usize> {
        let key = key.to_lowercase();
        self.entries.iter().position(|(k, _)| k.to_lowercase() == key)
    }
}

// --- Deserialize ---

impl<'de> Deserialize<'de> for CiMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CiMapVisitor)
    }
}

struct CiMapVisitor;

impl<'de> Visitor<'de> for CiMapVisitor {
    type Value = CiMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a mapping")
    }

    // An empty document is an empty map.
    fn visit_unit<E: de::Error>(self) -> Result<CiMap, E> {
        Ok(CiMap::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<CiMap, E> {
        Ok(CiMap::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<CiMap, A::Error> {
        let mut map = CiMap::default();
        while let Some((key, node)) = access.next_entry::<Key, Node>()? {
            map.insert(key.0, node);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any config value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Node, E> {
        Ok(Node::Value(Value::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Node, E> {
        Ok(Node::Value(Value::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Node, E> {
        Ok(Node::Value(Value::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Node, E> {
        // JSON numbers are finite; keep inf and NaN as text for the coercer
        let value = serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(v.to_string()));
        Ok(Node::Value(value))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Node, E> {
        Ok(Node::Value(Value::String(v.to_string())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Node, E> {
        Ok(Node::Value(Value::String(v)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Value(Value::Null))
    }

    fn visit_none<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Value(Value::Null))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Node, D::Error> {
        Node::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Node, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = access.next_element::<Node>()? {
            items.push(item.to_json());
        }
        Ok(Node::Value(Value::Array(items)))
    }

    fn visit_map<A: MapAccess<'de>>(self, access: A) -> Result<Node, A::Error> {
        let map = CiMapVisitor.visit_map(access)?;
        // toml hands datetimes over as a single-entry wrapper map
        if let [(key, Node::Value(Value::String(datetime)))] = map.entries.as_slice()
            && key == TOML_DATETIME_KEY
        {
            return Ok(Node::Value(Value::String(datetime.clone())));
        }
        Ok(Node::Map(map))
    }
}

const TOML_DATETIME_KEY: &str = "$__toml_private_datetime";

/// A mapping key. YAML allows non-string keys; they are stringified.
struct Key(String);

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(KeyVisitor)
    }
}

struct KeyVisitor;

impl<'de> Visitor<'de> for KeyVisitor {
    type Value = Key;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a scalar mapping key")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Key, E> {
        Ok(Key(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Key, E> {
        Ok(Key(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Key, E> {
        Ok(Key(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Key, E> {
        Ok(Key(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Key, E> {
        Ok(Key(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Key, E> {
        Ok(Key(v))
    }
}
