//! The flattener: [`Value`] graph to JSON-safe tree.
//!
//! [`Pickler::flatten`] walks a value graph and produces a
//! [`serde_json::Value`]. Shapes JSON cannot express are marked with the
//! reserved [`Tag`] keys so the [`Unpickler`](crate::Unpickler) can rebuild
//! them. Objects seen a second time during one call are written as a
//! `py/ref` back-reference to the path where they first appeared, which is
//! what makes cyclic graphs terminate.
//!
//! ```rust
//! use firepickle::{ObjectRef, PickleOptions, Pickler, Value};
//! use serde_json::json;
//!
//! let thing = ObjectRef::fields("Thing", [("name", Value::from("A String"))]);
//! thing.set("child", Value::Object(thing.clone()));
//!
//! let mut pickler = Pickler::new(PickleOptions::new());
//! let flat = pickler.flatten(&Value::Object(thing)).unwrap();
//! assert_eq!(
//!     flat,
//!     json!({"py/object": "Thing", "name": "A String", "child": {"py/ref": "/"}})
//! );
//! ```

use crate::kind::{classify, Kind};
use crate::tags::{self, Tag};
use crate::{Map, ObjectBody, ObjectRef, PickleOptions, Value};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::HashMap;
use tracing::trace;

/// Converts values into JSON-safe trees.
///
/// A pickler owns the reference table and name stack of the call in
/// progress. Both are cleared whenever recursion returns to the top, so one
/// instance can be reused for any number of calls.
#[derive(Debug)]
pub struct Pickler {
    options: PickleOptions,
    depth: usize,
    /// Object identity to the path it was first written at.
    objs: HashMap<usize, String>,
    namestack: Vec<String>,
}

impl Pickler {
    #[must_use]
    pub fn new(options: PickleOptions) -> Self {
        Pickler {
            options,
            depth: 0,
            objs: HashMap::new(),
            namestack: Vec::new(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &PickleOptions {
        &self.options
    }

    /// Flattens a value.
    ///
    /// Returns `None` only for a function, which has no encoding. Functions
    /// nested in a dict or object drop their key; in a list they become
    /// `null`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firepickle::{value, PickleOptions, Pickler, Value};
    /// use serde_json::json;
    ///
    /// let mut pickler = Pickler::new(PickleOptions::new());
    /// assert_eq!(pickler.flatten(&Value::from(49)), Some(json!(49)));
    /// assert_eq!(pickler.flatten(&value!([1, 2, 3])), Some(json!([1, 2, 3])));
    /// assert_eq!(pickler.flatten(&Value::function("handler")), None);
    /// ```
    pub fn flatten(&mut self, value: &Value) -> Option<JsonValue> {
        self.depth += 1;
        let result = self.flatten_value(value);
        self.depth -= 1;
        if self.depth == 0 {
            self.objs.clear();
            self.namestack.clear();
        }
        result
    }

    fn flatten_value(&mut self, value: &Value) -> Option<JsonValue> {
        let kind = classify(value);
        match kind {
            Kind::Function => return None,
            Kind::Primitive => return Some(flatten_primitive(value)),
            _ => {}
        }

        if let Some(max_depth) = self.options.max_depth {
            if self.depth > max_depth {
                trace!(depth = self.depth, "depth limit reached, using repr");
                return Some(JsonValue::String(value.repr()));
            }
        }

        let flat = match (kind, value) {
            (Kind::List, Value::List(items)) => JsonValue::Array(self.flatten_items(items)),
            (Kind::Tuple, Value::Tuple(items)) => self.tagged_items(Tag::Tuple, items),
            (Kind::Set, Value::Set(items)) => self.tagged_items(Tag::Set, items),
            (Kind::Dict, Value::Dict(map)) => {
                let mut data = JsonMap::with_capacity(map.len());
                self.flatten_entries(map, &mut data);
                JsonValue::Object(data)
            }
            (Kind::Type, Value::Type(name)) => {
                if self.options.unpicklable {
                    tagged(Tag::Type, JsonValue::String(name.clone()))
                } else {
                    JsonValue::String(name.clone())
                }
            }
            (_, Value::Object(obj)) => self.flatten_object(kind, obj),
            // classify pairs every other variant with one of the kinds above
            _ => JsonValue::Null,
        };
        Some(flat)
    }

    fn flatten_object(&mut self, kind: Kind, obj: &ObjectRef) -> JsonValue {
        let id = obj.id();
        if let Some(path) = self.objs.get(&id) {
            trace!(path = %path, "emitting back-reference");
            return tagged(Tag::Ref, JsonValue::String(path.clone()));
        }
        self.objs.insert(id, tags::path(&self.namestack));

        let object = obj.borrow();
        let unpicklable = self.options.unpicklable;
        let class_tag = |data: &mut JsonMap<String, JsonValue>| {
            if unpicklable {
                data.insert(
                    Tag::Object.as_str().to_string(),
                    JsonValue::String(object.class().to_string()),
                );
            }
        };

        match (kind, object.body()) {
            (Kind::Repr, ObjectBody::Text(text)) => {
                if unpicklable {
                    tagged(
                        Tag::Repr,
                        JsonValue::String(format!("{}/{}", object.class(), text)),
                    )
                } else {
                    JsonValue::String(text.clone())
                }
            }
            (Kind::Object, ObjectBody::Fields(map))
            | (Kind::DictSubclass, ObjectBody::Mapping(map)) => {
                let mut data = JsonMap::with_capacity(map.len() + 1);
                class_tag(&mut data);
                self.flatten_entries(map, &mut data);
                JsonValue::Object(data)
            }
            (Kind::CollectionSubclass, ObjectBody::Sequence(items)) if unpicklable => {
                let mut data = JsonMap::with_capacity(items.len() + 1);
                class_tag(&mut data);
                for (index, item) in self.flatten_items(items).into_iter().enumerate() {
                    data.insert(index.to_string(), item);
                }
                JsonValue::Object(data)
            }
            (Kind::CollectionSubclass, ObjectBody::Sequence(items))
            | (Kind::NonComplex, ObjectBody::Members(items)) => {
                JsonValue::Array(self.flatten_items(items))
            }
            _ => JsonValue::Null,
        }
    }

    /// Flattens dict entries or object fields into `data`, skipping callables.
    fn flatten_entries(&mut self, map: &Map, data: &mut JsonMap<String, JsonValue>) {
        for (key, value) in map {
            let key = key.to_text();
            self.namestack.push(key.clone());
            let flat = self.flatten(value);
            self.namestack.pop();
            if let Some(flat) = flat {
                data.insert(tags::escape_key(&key).into_owned(), flat);
            }
        }
    }

    fn flatten_items(&mut self, items: &[Value]) -> Vec<JsonValue> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.namestack.push(index.to_string());
                let flat = self.flatten(item);
                self.namestack.pop();
                flat.unwrap_or(JsonValue::Null)
            })
            .collect()
    }

    fn tagged_items(&mut self, tag: Tag, items: &[Value]) -> JsonValue {
        let items = JsonValue::Array(self.flatten_items(items));
        if self.options.unpicklable {
            tagged(tag, items)
        } else {
            items
        }
    }
}

impl Default for Pickler {
    fn default() -> Self {
        Pickler::new(PickleOptions::default())
    }
}

fn flatten_primitive(value: &Value) -> JsonValue {
    match value {
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Number(n) => n.to_json(),
        Value::String(s) => JsonValue::String(s.clone()),
        _ => JsonValue::Null,
    }
}

fn tagged(tag: Tag, value: JsonValue) -> JsonValue {
    let mut data = JsonMap::with_capacity(1);
    data.insert(tag.as_str().to_string(), value);
    JsonValue::Object(data)
}
