//! Property values and the entity property store interface.
//!
//! Properties are game-specific key/value pairs ("damage", "ai.aggro",
//! "spawn.radius"). The engine doesn't interpret them. They appear in two
//! places:
//!
//! - Event payloads and telegram extra info carry [`PropertyValue`]s.
//! - Entities expose their properties through [`PropertyStore`], which the
//!   entity-event path reads to parametrize generic events.
//!
//! ## PropertyValue Types
//!
//! - `Int`: Numbers (damage, counts)
//! - `Float`: Fractional numbers (speed, radius)
//! - `Bool`: Flags
//! - `Text`: Strings (names, states)
//! - `IntList`: Number lists
//! - `TextList`: String lists

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A game-defined property value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
    /// Text value.
    Text(String),
    /// List of integers.
    IntList(Vec<i64>),
    /// List of strings.
    TextList(Vec<String>),
}

impl PropertyValue {
    /// Get as integer if this is an Int value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as float. Int values widen.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get as bool if this is a Bool value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as string reference if this is a Text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get as int list reference if this is an IntList value.
    #[must_use]
    pub fn as_int_list(&self) -> Option<&[i64]> {
        match self {
            PropertyValue::IntList(v) => Some(v),
            _ => None,
        }
    }

    /// Get as text list reference if this is a TextList value.
    #[must_use]
    pub fn as_text_list(&self) -> Option<&[String]> {
        match self {
            PropertyValue::TextList(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Int(v as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<Vec<i64>> for PropertyValue {
    fn from(v: Vec<i64>) -> Self {
        PropertyValue::IntList(v)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(v: Vec<String>) -> Self {
        PropertyValue::TextList(v)
    }
}

/// Read access to an entity's properties.
///
/// Implemented by whatever owns entity state. The bus only reads through
/// this trait and never stores the entity.
pub trait PropertyStore {
    /// Look up a property by key.
    fn property(&self, key: &str) -> Option<PropertyValue>;

    /// All property keys currently set.
    fn property_keys(&self) -> Vec<String>;
}

/// A plain map-backed property store.
///
/// Handy for tests and for entities that don't have their own storage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyMap {
    values: FxHashMap<String, PropertyValue>,
}

impl PropertyMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property (builder pattern).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a property, returning the previous value.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.values.insert(key.into(), value.into())
    }

    /// Get a property.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    /// Remove a property.
    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.values.remove(key)
    }

    /// Does the map contain this key?
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over key/value pairs (unordered).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl PropertyStore for PropertyMap {
    fn property(&self, key: &str) -> Option<PropertyValue> {
        self.values.get(key).cloned()
    }

    fn property_keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

impl<K, V> FromIterator<(K, V)> for PropertyMap
where
    K: Into<String>,
    V: Into<PropertyValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.set(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_int() {
        let val = PropertyValue::Int(5);
        assert_eq!(val.as_int(), Some(5));
        assert_eq!(val.as_float(), Some(5.0));
        assert_eq!(val.as_bool(), None);
    }

    #[test]
    fn test_property_value_text() {
        let val = PropertyValue::Text("patrol".to_string());
        assert_eq!(val.as_text(), Some("patrol"));
        assert_eq!(val.as_int(), None);
    }

    #[test]
    fn test_property_value_from() {
        let int: PropertyValue = 42i32.into();
        assert_eq!(int.as_int(), Some(42));

        let float: PropertyValue = 1.5f64.into();
        assert_eq!(float.as_float(), Some(1.5));

        let boolean: PropertyValue = true.into();
        assert_eq!(boolean.as_bool(), Some(true));

        let list: PropertyValue = vec![1i64, 2, 3].into();
        assert_eq!(list.as_int_list(), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn test_property_map_store() {
        let map = PropertyMap::new()
            .with("hp", 10)
            .with("name", "orc");

        assert_eq!(map.len(), 2);
        assert_eq!(map.property("hp"), Some(PropertyValue::Int(10)));
        assert_eq!(map.property("missing"), None);

        let mut keys = map.property_keys();
        keys.sort();
        assert_eq!(keys, vec!["hp".to_string(), "name".to_string()]);
    }

    #[test]
    fn test_property_map_set_remove() {
        let mut map = PropertyMap::new();
        assert!(map.set("speed", 2.0).is_none());
        assert_eq!(map.set("speed", 3.0), Some(PropertyValue::Float(2.0)));
        assert!(map.contains("speed"));
        assert_eq!(map.remove("speed"), Some(PropertyValue::Float(3.0)));
        assert!(map.is_empty());
    }

    #[test]
    fn test_property_map_from_iter() {
        let map: PropertyMap = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(map.get("b").and_then(PropertyValue::as_int), Some(2));
    }
}
