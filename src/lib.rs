//! # firepickle
//!
//! Reference-tracking object flattening for FireLogger, the protocol that
//! ships server-side log records to the browser inside HTTP response headers.
//!
//! ## What it does
//!
//! Log records carry arbitrary application data: arguments, exception
//! details, the locals of every traceback frame. That data can be cyclic,
//! deeply nested, or full of shapes JSON cannot express. This crate turns
//! such a value graph into JSON and back:
//!
//! - **Reference tracking**: an object met twice is written once plus a
//!   `py/ref` back-reference, so cycles terminate and sharing survives
//! - **Type tags**: tuples, sets, class instances and class references are
//!   marked so they restore as themselves
//! - **Depth limit**: subtrees past a configured depth collapse to their
//!   textual form
//! - **Header transport**: payloads are base64-encoded and split across
//!   `FireLogger-<guid>-<n>` headers
//!
//! ## Quick Start
//!
//! ```rust
//! use firepickle::registry::{Class, Registry};
//! use firepickle::{decode_with_registry, encode, ObjectRef, Value};
//!
//! let thing = ObjectRef::fields("demo.Thing", [("name", Value::from("A String"))]);
//! thing.set("child", Value::Object(thing.clone()));
//!
//! let json = encode(&Value::Object(thing)).unwrap();
//! assert_eq!(
//!     json,
//!     r#"{"py/object":"demo.Thing","name":"A String","child":{"py/ref":"/"}}"#
//! );
//!
//! let mut registry = Registry::new();
//! registry.register(Class::fields("demo.Thing"));
//! let back = decode_with_registry(&json, &registry).unwrap();
//! let back = back.as_object().unwrap();
//! assert!(back.get("child").unwrap().as_object().unwrap().ptr_eq(back));
//! ```
//!
//! ### Display-only output
//!
//! ```rust
//! use firepickle::{encode_with_options, value, PickleOptions};
//!
//! let record = value!({"level": "error", "args": (1, 2)});
//! let json = encode_with_options(&record, PickleOptions::oneway()).unwrap();
//! assert_eq!(json, r#"{"level":"error","args":[1,2]}"#);
//! ```
//!
//! ### Serde types
//!
//! ```rust
//! use firepickle::to_string;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Request { path: String, status: u16 }
//!
//! let json = to_string(&Request { path: "/".into(), status: 500 }).unwrap();
//! assert_eq!(json, r#"{"py/object":"Request","path":"/","status":500}"#);
//! ```
//!
//! ## Failure model
//!
//! Flattening never fails. Restoring never fails either: a class that is not
//! in the [`Registry`] or a reference that does not resolve leaves the node
//! as a plain dict and logs a `debug` event. Errors are only returned for
//! malformed input at the edges, such as invalid JSON or a missing header
//! chunk.
//!
//! The wire format is described in [`format`].

pub mod buffer;
pub mod de;
pub mod error;
pub mod format;
pub mod headers;
pub mod kind;
pub mod macros;
pub mod map;
pub mod options;
pub mod pickler;
pub mod record;
pub mod registry;
pub mod ser;
pub mod tags;
pub mod unpickler;
pub mod value;

pub use de::from_value;
pub use error::{Error, Result};
pub use kind::Kind;
pub use map::Map;
pub use options::{HeaderOptions, PickleOptions, RecordOptions};
pub use pickler::Pickler;
pub use registry::{Class, Registry, Shape};
pub use ser::{to_value, ValueSerializer};
pub use tags::Tag;
pub use unpickler::Unpickler;
pub use value::{Key, Number, Object, ObjectBody, ObjectRef, Value};

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::io;

/// Flattens a value into a JSON tree.
///
/// A function at the root has no encoding and yields `null`.
///
/// # Examples
///
/// ```rust
/// use firepickle::{flatten, value, PickleOptions};
/// use serde_json::json;
///
/// let tree = flatten(&value!({"tags": ("a", "b")}), PickleOptions::new());
/// assert_eq!(tree, json!({"tags": {"py/tuple": ["a", "b"]}}));
/// ```
#[must_use]
pub fn flatten(value: &Value, options: PickleOptions) -> JsonValue {
    Pickler::new(options)
        .flatten(value)
        .unwrap_or(JsonValue::Null)
}

/// Restores a JSON tree using the process-wide registry.
#[must_use]
pub fn restore(tree: &JsonValue) -> Value {
    let registry = registry::global();
    Unpickler::new(&registry).restore(tree)
}

/// Encodes a value as JSON text with type tags and no depth limit.
///
/// # Errors
///
/// Returns an error only if JSON text cannot be produced.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode(value: &Value) -> Result<String> {
    encode_with_options(value, PickleOptions::default())
}

/// Encodes a value as JSON text with custom options.
///
/// # Examples
///
/// ```rust
/// use firepickle::{encode_with_options, value, PickleOptions};
///
/// let deep = value!({"a": {"b": {"c": 1}}});
/// let json = encode_with_options(&deep, PickleOptions::new().with_max_depth(2)).unwrap();
/// assert_eq!(json, r#"{"a":{"b":"{'c': 1}"}}"#);
/// ```
///
/// # Errors
///
/// Returns an error only if JSON text cannot be produced.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode_with_options(value: &Value, options: PickleOptions) -> Result<String> {
    Ok(serde_json::to_string(&flatten(value, options))?)
}

/// Encodes a value as JSON text into a writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn encode_to_writer<W>(writer: W, value: &Value, options: PickleOptions) -> Result<()>
where
    W: io::Write,
{
    serde_json::to_writer(writer, &flatten(value, options))?;
    Ok(())
}

/// Converts any `T: Serialize` and encodes it with type tags.
///
/// # Errors
///
/// Returns an error if `T` cannot be converted (see [`to_value`]).
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    encode(&to_value(value)?)
}

/// Decodes JSON text, resolving classes through the process-wide registry.
///
/// # Examples
///
/// ```rust
/// use firepickle::{decode, Value};
///
/// let value = decode(r#"{"level": "error", "args": {"py/tuple": [1, 2]}}"#).unwrap();
/// let args = value.as_dict().unwrap().get("args").unwrap();
/// assert_eq!(args, &Value::tuple([Value::from(1), Value::from(2)]));
/// ```
///
/// # Errors
///
/// Returns an error if the input is not valid JSON.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn decode(s: &str) -> Result<Value> {
    let registry = registry::global();
    decode_with_registry(s, &registry)
}

/// Decodes JSON text, resolving classes through the given registry.
///
/// # Errors
///
/// Returns an error if the input is not valid JSON.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn decode_with_registry(s: &str, registry: &Registry) -> Result<Value> {
    let tree: JsonValue = serde_json::from_str(s)?;
    Ok(Unpickler::new(registry).restore(&tree))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn thing_registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(Class::fields("Thing"));
        registry
    }

    fn roundtrip(value: &Value) -> Value {
        decode_with_registry(&encode(value).unwrap(), &thing_registry()).unwrap()
    }

    #[test]
    fn test_primitives_roundtrip() {
        for value in [
            Value::Null,
            Value::from(true),
            Value::from(-49),
            Value::from(350.5),
            Value::from("hello world"),
        ] {
            assert_eq!(roundtrip(&value), value);
        }
    }

    #[test]
    fn test_nested_containers_roundtrip() {
        let value = value!({"a": [1, {"b": [null, "c"]}], "d": {}});
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn test_tuple_and_set_roundtrip() {
        let value = value!({"level": "error", "args": (1, 2)});
        assert_eq!(roundtrip(&value), value);

        let set = Value::set([Value::from("x"), Value::from("y")]);
        assert_eq!(roundtrip(&set), set);
    }

    #[test]
    fn test_thing_faithful_and_oneway() {
        let thing = Value::Object(ObjectRef::fields(
            "Thing",
            [("name", Value::from("A String")), ("child", Value::Null)],
        ));

        let tree = flatten(&thing, PickleOptions::new());
        assert_eq!(tree["py/object"], json!("Thing"));

        let back = roundtrip(&thing);
        let back = back.as_object().unwrap();
        assert_eq!(back.class(), "Thing");
        assert_eq!(back.get("name"), Some(Value::from("A String")));
        assert_eq!(back.get("child"), Some(Value::Null));

        assert_eq!(
            flatten(&thing, PickleOptions::oneway()),
            json!({"name": "A String", "child": null})
        );
    }

    #[test]
    fn test_self_reference_restores_identity() {
        let thing = ObjectRef::fields("Thing", [("name", "loop")]);
        thing.set("child", Value::Object(thing.clone()));

        let back = roundtrip(&Value::Object(thing));
        let back = back.as_object().unwrap();
        let child = back.get("child").unwrap();
        assert!(child.as_object().unwrap().ptr_eq(back));
    }

    #[test]
    fn test_shared_child_encoded_once() {
        let shared = ObjectRef::fields("Thing", [("name", "shared")]);
        let data = value!({"left": (Value::Object(shared.clone())), "right": (Value::Object(shared))});

        let json = encode(&data).unwrap();
        assert_eq!(json.matches("py/object").count(), 1);
        assert_eq!(json.matches("py/ref").count(), 1);

        let back = roundtrip(&data);
        let dict = back.as_dict().unwrap();
        let left = dict.get("left").and_then(Value::as_object).unwrap();
        let right = dict.get("right").and_then(Value::as_object).unwrap();
        assert!(left.ptr_eq(right));
    }

    #[test]
    fn test_max_depth_zero() {
        let data = value!([1, 2]);
        assert_eq!(
            flatten(&data, PickleOptions::new().with_max_depth(0)),
            json!("[1, 2]")
        );
        assert_eq!(
            flatten(&Value::from("x"), PickleOptions::new().with_max_depth(0)),
            json!("x")
        );
    }

    #[test]
    fn test_oneway_has_no_type_tags() {
        let data = value!({
            "kind": (Value::type_ref("mod.Thing")),
            "thing": (Value::Object(ObjectRef::fields("Thing", [("n", 1)]))),
            "pair": (1, 2)
        });
        let json = encode_with_options(&data, PickleOptions::oneway()).unwrap();
        assert!(!json.contains("py/object"));
        assert!(!json.contains("py/type"));
        assert!(!json.contains("py/tuple"));
    }

    #[test]
    fn test_callable_value_omitted() {
        let mut map = Map::new();
        map.insert("handler", Value::function("on_request"));
        map.insert("path", Value::from("/"));
        assert_eq!(encode(&Value::Dict(map)).unwrap(), r#"{"path":"/"}"#);
        assert_eq!(flatten(&Value::function("f"), PickleOptions::new()), JsonValue::Null);
    }

    #[test]
    fn test_encode_to_writer() {
        let mut buffer = Vec::new();
        encode_to_writer(&mut buffer, &value!((1,)), PickleOptions::new()).unwrap();
        assert_eq!(buffer, br#"{"py/tuple":[1]}"#);
    }

    #[test]
    fn test_decode_invalid_json() {
        assert!(matches!(decode("{not json"), Err(Error::Json(_))));
    }
}
