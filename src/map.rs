//! Ordered map type for dicts and object fields.
//!
//! This module provides [`Map`], a wrapper around [`IndexMap`] keyed by
//! [`Key`]. Insertion order is kept so flattened output lists fields in the
//! order the application set them, which keeps encoded logs stable and easy to
//! diff.
//!
//! ## Examples
//!
//! ```rust
//! use firepickle::{Map, Value};
//!
//! let mut map = Map::new();
//! map.insert("name", Value::from("Alice"));
//! map.insert(7, Value::from("seven"));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use crate::{Key, Value};
use indexmap::IndexMap;

/// An ordered map of [`Key`]s to [`Value`]s.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Map(IndexMap<Key, Value>);

impl Map {
    #[must_use]
    pub fn new() -> Self {
        Map(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Map(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contained this key, the old value is returned and
    /// the key keeps its original position.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firepickle::{Map, Value};
    ///
    /// let mut map = Map::new();
    /// assert!(map.insert("key", Value::from(42)).is_none());
    /// assert!(map.insert("key", Value::from(43)).is_some());
    /// ```
    pub fn insert(&mut self, key: impl Into<Key>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Returns the value stored under a text key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(&Key::from(key))
    }

    /// Returns the value stored under any key.
    #[must_use]
    pub fn get_key(&self, key: &Key) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(&Key::from(key))
    }

    /// Removes a text key, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(&Key::from(key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, Key, Value> {
        self.0.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, Key, Value> {
        self.0.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Key, Value> {
        self.0.iter()
    }
}

impl IntoIterator for Map {
    type Item = (Key, Value);
    type IntoIter = indexmap::map::IntoIter<Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Map {
    type Item = (&'a Key, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<Key>> FromIterator<(K, Value)> for Map {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Map(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_lookup_matches_string_keys_only() {
        let mut map = Map::new();
        map.insert(1, Value::from("int"));
        map.insert("1", Value::from("text"));

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("1"), Some(&Value::from("text")));
        assert_eq!(map.get_key(&Key::Integer(1)), Some(&Value::from("int")));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut map: Map = [("a", Value::from(1)), ("b", Value::from(2)), ("c", Value::from(3))]
            .into_iter()
            .collect();
        map.remove("b");
        let keys: Vec<_> = map.keys().map(Key::to_text).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }
}
