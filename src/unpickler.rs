//! The restorer: JSON-safe tree back to a [`Value`] graph.
//!
//! [`Unpickler::restore`] reads the reserved [`Tag`] keys a flattened node
//! carries and rebuilds the shape they describe. Class names are resolved
//! through a [`Registry`]; nothing is looked up dynamically.
//!
//! Restoring is best effort. A class that is not registered, a reference to
//! a path that holds no object, or a malformed tag never fails the call: the
//! node comes back as a plain dict through [`Value::from_json`], with its tag
//! keys intact, and a `debug` event is logged.
//!
//! ```rust
//! use firepickle::registry::{Class, Registry};
//! use firepickle::{Unpickler, Value};
//! use serde_json::json;
//!
//! let mut registry = Registry::new();
//! registry.register(Class::fields("Thing"));
//!
//! let tree = json!({"py/object": "Thing", "name": "A String", "child": {"py/ref": "/"}});
//! let thing = Unpickler::new(&registry).restore(&tree);
//!
//! let obj = thing.as_object().unwrap();
//! let child = obj.get("child").unwrap();
//! assert!(child.as_object().unwrap().ptr_eq(obj));
//! ```

use crate::registry::{Registry, Shape};
use crate::tags::{self, Tag};
use crate::{Map, ObjectRef, Value};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::HashMap;
use tracing::debug;

type JsonObject = JsonMap<String, JsonValue>;

/// Rebuilds values from flattened trees.
///
/// Like the [`Pickler`](crate::Pickler), an unpickler clears its reference
/// table whenever recursion returns to the top and can be reused.
#[derive(Debug)]
pub struct Unpickler<'r> {
    registry: &'r Registry,
    depth: usize,
    /// Path to the object restored there.
    namedict: HashMap<String, ObjectRef>,
    namestack: Vec<String>,
}

impl<'r> Unpickler<'r> {
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        Unpickler {
            registry,
            depth: 0,
            namedict: HashMap::new(),
            namestack: Vec::new(),
        }
    }

    /// Restores a flattened tree.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firepickle::registry::Registry;
    /// use firepickle::{Unpickler, Value};
    /// use serde_json::json;
    ///
    /// let registry = Registry::new();
    /// let mut unpickler = Unpickler::new(&registry);
    ///
    /// let pair = unpickler.restore(&json!({"py/tuple": [1, 2]}));
    /// assert_eq!(pair, Value::tuple([Value::from(1), Value::from(2)]));
    ///
    /// // Unknown classes come back as plain dicts
    /// let raw = unpickler.restore(&json!({"py/object": "no.such.Class"}));
    /// assert!(raw.is_dict());
    /// ```
    pub fn restore(&mut self, node: &JsonValue) -> Value {
        self.depth += 1;
        let value = self.restore_node(node);
        self.depth -= 1;
        if self.depth == 0 {
            self.namedict.clear();
            self.namestack.clear();
        }
        value
    }

    fn restore_node(&mut self, node: &JsonValue) -> Value {
        let map = match node {
            JsonValue::Object(map) => map,
            JsonValue::Array(items) => return Value::List(self.restore_items(items)),
            other => return Value::from_json(other),
        };

        match Tag::of_node(map) {
            Some(Tag::Ref) => self.restore_ref(map, node),
            Some(Tag::Type) => self.restore_type(map, node),
            Some(Tag::Repr) => self.restore_repr(map, node),
            Some(Tag::Object) => self.restore_object(map, node),
            Some(Tag::Tuple) => match map.get(Tag::Tuple.as_str()) {
                Some(JsonValue::Array(items)) => Value::Tuple(self.restore_items(items)),
                _ => raw(node, "py/tuple value is not an array"),
            },
            Some(Tag::Set) => match map.get(Tag::Set.as_str()) {
                Some(JsonValue::Array(items)) => Value::set(self.restore_items(items)),
                _ => raw(node, "py/set value is not an array"),
            },
            None => {
                let mut dict = Map::with_capacity(map.len());
                for (key, value) in map {
                    let key = tags::unescape_key(key);
                    let value = self.restore_child(key.to_string(), value);
                    dict.insert(key, value);
                }
                Value::Dict(dict)
            }
        }
    }

    fn restore_ref(&mut self, map: &JsonObject, node: &JsonValue) -> Value {
        let Some(path) = map.get(Tag::Ref.as_str()).and_then(JsonValue::as_str) else {
            return raw(node, "py/ref value is not a string");
        };
        match self.namedict.get(path) {
            Some(obj) => Value::Object(obj.clone()),
            None => {
                debug!(path, "unresolved back-reference");
                Value::from_json(node)
            }
        }
    }

    fn restore_type(&self, map: &JsonObject, node: &JsonValue) -> Value {
        match map.get(Tag::Type.as_str()).and_then(JsonValue::as_str) {
            Some(name) if self.registry.contains(name) => Value::Type(name.to_string()),
            Some(name) => {
                debug!(class = name, "unknown class in py/type");
                Value::from_json(node)
            }
            None => raw(node, "py/type value is not a string"),
        }
    }

    fn restore_repr(&mut self, map: &JsonObject, node: &JsonValue) -> Value {
        let Some(repr) = map.get(Tag::Repr.as_str()).and_then(JsonValue::as_str) else {
            return raw(node, "py/repr value is not a string");
        };
        let Some((class, text)) = repr.split_once('/') else {
            return raw(node, "py/repr value has no class prefix");
        };
        let parsed = self
            .registry
            .get(class)
            .and_then(|class| class.parse(text));
        match parsed {
            Some(value) => {
                if let Value::Object(obj) = &value {
                    self.namedict
                        .insert(tags::path(&self.namestack), obj.clone());
                }
                value
            }
            None => {
                debug!(class, text, "py/repr could not be parsed");
                Value::from_json(node)
            }
        }
    }

    fn restore_object(&mut self, map: &JsonObject, node: &JsonValue) -> Value {
        let Some(name) = map.get(Tag::Object.as_str()).and_then(JsonValue::as_str) else {
            return raw(node, "py/object value is not a string");
        };
        let Some((class, obj)) = self
            .registry
            .get(name)
            .and_then(|class| Some((class, class.bare()?)))
        else {
            debug!(class = name, "unknown or unconstructible class in py/object");
            return Value::from_json(node);
        };

        // Registered before the fields so that children can refer back to it.
        self.namedict
            .insert(tags::path(&self.namestack), obj.clone());

        let mut entries: Vec<(&String, &JsonValue)> = map
            .iter()
            .filter(|(key, _)| key.as_str() != Tag::Object.as_str())
            .collect();
        if matches!(class.shape(), Shape::Sequence | Shape::Members) {
            // Indices must arrive in order; anything else is rejected below.
            entries.sort_by_key(|(key, _)| key.parse::<usize>().unwrap_or(usize::MAX));
        }

        for (key, value) in entries {
            let key = tags::unescape_key(key);
            let value = self.restore_child(key.to_string(), value);
            if !obj.set(key, value) {
                debug!(class = name, key, "entry does not fit the object's shape");
            }
        }
        Value::Object(obj)
    }

    fn restore_items(&mut self, items: &[JsonValue]) -> Vec<Value> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| self.restore_child(index.to_string(), item))
            .collect()
    }

    fn restore_child(&mut self, segment: String, node: &JsonValue) -> Value {
        self.namestack.push(segment);
        let value = self.restore(node);
        self.namestack.pop();
        value
    }
}

fn raw(node: &JsonValue, reason: &str) -> Value {
    debug!(reason, "restoring node verbatim");
    Value::from_json(node)
}
