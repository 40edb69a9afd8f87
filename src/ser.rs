//! Conversion of `Serialize` types into [`Value`].
//!
//! This module provides [`ValueSerializer`], the bridge that lets any
//! `T: Serialize` be logged and flattened without hand-building a [`Value`].
//!
//! ## Mapping
//!
//! | Rust | Value |
//! |------|-------|
//! | `struct Point { .. }` | object of class `Point` with named fields |
//! | tuples, tuple structs | [`Value::Tuple`] |
//! | `Vec<T>`, slices, sets | [`Value::List`] |
//! | maps | [`Value::Dict`] (keys must be strings, integers, booleans or unit) |
//! | unit variants | the variant name as a string |
//! | other variants | a one-entry dict `{variant: contents}` |
//! | `None`, `()` | [`Value::Null`] |
//!
//! ```rust
//! use firepickle::{encode, to_value};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Point { x: i32, y: i32 }
//!
//! let value = to_value(&Point { x: 1, y: 2 }).unwrap();
//! assert_eq!(value.as_object().unwrap().class(), "Point");
//! assert_eq!(encode(&value).unwrap(), r#"{"py/object":"Point","x":1,"y":2}"#);
//! ```

use crate::{Error, Key, Map, Number, ObjectRef, Result, Value};
use serde::{ser, Serialize};

/// Serializer whose output is a [`Value`].
pub struct ValueSerializer;

#[doc(hidden)]
pub struct SerializeVec {
    vec: Vec<Value>,
    tuple: bool,
    variant: Option<&'static str>,
}

#[doc(hidden)]
pub struct SerializeMap {
    map: Map,
    current_key: Option<Key>,
    class: Option<&'static str>,
    variant: Option<&'static str>,
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Number(Number::Integer(v)))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        self.serialize_i64(v as i64)
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        self.serialize_i64(v as i64)
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        self.serialize_i64(v as i64)
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        match i64::try_from(v) {
            Ok(i) => Ok(Value::Number(Number::Integer(i))),
            Err(_) => Ok(Value::Number(Number::Float(v as f64))),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Number(Number::Float(v as f64)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Number(Number::Float(v)))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::List(v.iter().map(|&b| Value::from(b as i64)).collect()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(variant_dict(variant, to_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0), false, None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, true, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, true, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, true, Some(variant)))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None, None))
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new(Some(name), None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None, Some(variant)))
    }
}

impl SerializeVec {
    fn new(capacity: usize, tuple: bool, variant: Option<&'static str>) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(capacity),
            tuple,
            variant,
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn finish(self) -> Value {
        let items = if self.tuple {
            Value::Tuple(self.vec)
        } else {
            Value::List(self.vec)
        };
        match self.variant {
            Some(variant) => variant_dict(variant, items),
            None => items,
        }
    }
}

impl SerializeMap {
    fn new(class: Option<&'static str>, variant: Option<&'static str>) -> Self {
        SerializeMap {
            map: Map::new(),
            current_key: None,
            class,
            variant,
        }
    }

    fn finish(self) -> Value {
        let value = match self.class {
            Some(class) => Value::Object(ObjectRef::fields(class, self.map)),
            None => Value::Dict(self.map),
        };
        match self.variant {
            Some(variant) => variant_dict(variant, value),
            None => value,
        }
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.current_key = Some(to_key(to_value(key)?)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

/// Converts any `T: Serialize` into a [`Value`].
///
/// # Errors
///
/// Fails if a map key is not a string, integer, boolean or unit, or if the
/// type's `Serialize` impl reports an error.
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}

fn to_key(value: Value) -> Result<Key> {
    match value {
        Value::Null => Ok(Key::Null),
        Value::Bool(b) => Ok(Key::Bool(b)),
        Value::Number(Number::Integer(i)) => Ok(Key::Integer(i)),
        Value::String(s) => Ok(Key::String(s)),
        other => Err(Error::unsupported_type(&format!(
            "dict key must be a string, integer, boolean or unit, found {}",
            other.repr()
        ))),
    }
}

fn variant_dict(variant: &'static str, value: Value) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(variant, value);
    Value::Dict(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Thing {
        name: String,
        child: Option<Box<Thing>>,
    }

    #[derive(Serialize)]
    enum Event {
        Started,
        Moved(i32, i32),
        Renamed { from: String },
    }

    #[test]
    fn test_struct_becomes_object() {
        let thing = Thing {
            name: "A String".to_string(),
            child: None,
        };
        let value = to_value(&thing).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.class(), "Thing");
        assert_eq!(obj.get("name"), Some(Value::from("A String")));
        assert_eq!(obj.get("child"), Some(Value::Null));
    }

    #[test]
    fn test_tuples_stay_tuples() {
        let value = to_value(&("error", (1, 2))).unwrap();
        assert_eq!(
            value,
            Value::tuple([
                Value::from("error"),
                Value::tuple([Value::from(1), Value::from(2)])
            ])
        );
        assert!(to_value(&vec![1, 2]).unwrap().is_list());
    }

    #[test]
    fn test_map_keys() {
        let mut map = BTreeMap::new();
        map.insert(2, "two");
        let value = to_value(&map).unwrap();
        assert_eq!(
            value.as_dict().unwrap().get_key(&Key::Integer(2)),
            Some(&Value::from("two"))
        );

        let mut bad = BTreeMap::new();
        bad.insert(vec![1], "list key");
        assert!(matches!(to_value(&bad), Err(Error::UnsupportedType(_))));
    }

    #[test]
    fn test_enum_variants() {
        assert_eq!(to_value(&Event::Started).unwrap(), Value::from("Started"));

        let moved = to_value(&Event::Moved(1, 2)).unwrap();
        assert_eq!(
            moved.as_dict().unwrap().get("Moved"),
            Some(&Value::tuple([Value::from(1), Value::from(2)]))
        );

        let renamed = to_value(&Event::Renamed {
            from: "a".to_string(),
        })
        .unwrap();
        assert!(renamed.as_dict().unwrap().get("Renamed").unwrap().is_dict());
    }

    #[test]
    fn test_large_unsigned_falls_back_to_float() {
        assert_eq!(to_value(&u64::MAX).unwrap(), Value::from(u64::MAX as f64));
    }
}
