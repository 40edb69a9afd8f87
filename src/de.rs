//! Conversion of [`Value`] into `Deserialize` types.
//!
//! [`from_value`] is the inverse of [`to_value`](crate::to_value): it reads
//! a restored value graph into ordinary Rust types.
//!
//! ```rust
//! use firepickle::registry::{Class, Registry};
//! use firepickle::{decode_with_registry, from_value};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Point { x: i32, y: i32 }
//!
//! let mut registry = Registry::new();
//! registry.register(Class::fields("Point"));
//!
//! let value = decode_with_registry(r#"{"py/object": "Point", "x": 1, "y": 2}"#, &registry).unwrap();
//! let point: Point = from_value(value).unwrap();
//! assert_eq!(point, Point { x: 1, y: 2 });
//! ```
//!
//! Objects are read through their body: fields and mapping entries as a map,
//! sequence and member objects as a sequence, text objects as their text.
//! Shared objects are copied out at each place they appear, so a cyclic
//! graph cannot be read into owned types; the nesting limit turns that case
//! into an error.

use crate::{Error, Key, Map, Number, ObjectBody, Result, Value};
use serde::de::{self, DeserializeOwned};
use serde::forward_to_deserialize_any;

/// Maximum nesting before a value is assumed to be cyclic.
const MAX_NESTING: usize = 128;

/// Deserializes any `T: DeserializeOwned` from a [`Value`].
///
/// # Errors
///
/// Fails when the value's shape does not match `T`, or when nesting exceeds
/// the limit because the graph is cyclic.
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value, 0))
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
    depth: usize,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>, depth: usize) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
            depth,
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed
                .deserialize(ValueDeserializer::new(value, self.depth))
                .map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<Key, Value>,
    value: Option<Value>,
    depth: usize,
}

impl MapDeserializer {
    fn new(map: Map, depth: usize) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
            depth,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(key_value(key), self.depth))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value, self.depth)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
    depth: usize,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant =
            seed.deserialize(ValueDeserializer::new(Value::String(self.variant), self.depth))?;
        let visitor = VariantDeserializer {
            value: self.value,
            depth: self.depth,
        };
        Ok((variant, visitor))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
    depth: usize,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Some(Value::Null) | None => Ok(()),
            _ => Err(Error::custom("Expected unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value, self.depth)),
            None => Err(Error::custom("Expected newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Tuple(items)) | Some(Value::List(items)) => {
                visitor.visit_seq(SeqDeserializer::new(items, self.depth))
            }
            _ => Err(Error::custom("Expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(value) => de::Deserializer::deserialize_any(
                ValueDeserializer::new(value, self.depth),
                visitor,
            ),
            None => Err(Error::custom("Expected struct variant")),
        }
    }
}

struct ValueDeserializer {
    value: Value,
    depth: usize,
}

impl ValueDeserializer {
    fn new(value: Value, depth: usize) -> Self {
        ValueDeserializer { value, depth }
    }

    fn check_depth(&self) -> Result<usize> {
        if self.depth >= MAX_NESTING {
            return Err(Error::custom(format!(
                "nesting deeper than {} levels, the value is probably cyclic",
                MAX_NESTING
            )));
        }
        Ok(self.depth + 1)
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let depth = self.check_depth()?;
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(Number::Integer(i)) => visitor.visit_i64(i),
            Value::Number(Number::Float(f)) => visitor.visit_f64(f),
            Value::String(s) | Value::Type(s) | Value::Function(s) => visitor.visit_string(s),
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
                visitor.visit_seq(SeqDeserializer::new(items, depth))
            }
            Value::Dict(map) => visitor.visit_map(MapDeserializer::new(map, depth)),
            Value::Object(obj) => {
                let body = obj.borrow().body().clone();
                match body {
                    ObjectBody::Fields(map) | ObjectBody::Mapping(map) => {
                        visitor.visit_map(MapDeserializer::new(map, depth))
                    }
                    ObjectBody::Sequence(items) | ObjectBody::Members(items) => {
                        visitor.visit_seq(SeqDeserializer::new(items, depth))
                    }
                    ObjectBody::Text(text) => visitor.visit_string(text),
                }
            }
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let depth = self.check_depth()?;
        match self.value {
            Value::String(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
                depth,
            }),
            Value::Dict(map) if map.len() == 1 => {
                let Some((Key::String(variant), value)) = map.into_iter().next() else {
                    return Err(Error::custom("Expected enum variant name"));
                };
                visitor.visit_enum(EnumDeserializer {
                    variant,
                    value: Some(value),
                    depth,
                })
            }
            _ => Err(Error::custom("Expected enum")),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

fn key_value(key: Key) -> Value {
    match key {
        Key::Null => Value::Null,
        Key::Bool(b) => Value::Bool(b),
        Key::Integer(i) => Value::Number(Number::Integer(i)),
        Key::String(s) => Value::String(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{to_value, ObjectRef};
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Record {
        level: String,
        args: (i32, i32),
        extra: Option<String>,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    enum Shape {
        Empty,
        Circle(f64),
        Rect { w: i32, h: i32 },
        Pair(i32, i32),
    }

    #[test]
    fn test_struct_roundtrip() {
        let record = Record {
            level: "error".to_string(),
            args: (1, 2),
            extra: None,
        };
        let value = to_value(&record).unwrap();
        let back: Record = from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_enum_roundtrip() {
        for shape in [
            Shape::Empty,
            Shape::Circle(1.5),
            Shape::Rect { w: 2, h: 3 },
            Shape::Pair(4, 5),
        ] {
            let value = to_value(&shape).unwrap();
            let back: Shape = from_value(value).unwrap();
            assert_eq!(back, shape);
        }
    }

    #[test]
    fn test_integer_keys() {
        let mut map = HashMap::new();
        map.insert(7_i64, "seven".to_string());
        let back: HashMap<i64, String> = from_value(to_value(&map).unwrap()).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_text_object_reads_as_string() {
        let date = Value::Object(ObjectRef::text("datetime.date", "2009-03-01"));
        let text: String = from_value(date).unwrap();
        assert_eq!(text, "2009-03-01");
    }

    #[test]
    fn test_cyclic_graph_errors() {
        let node = ObjectRef::fields("Node", Vec::<(&str, Value)>::new());
        node.set("next", Value::Object(node.clone()));
        let result: Result<serde_json::Value> = from_value(Value::Object(node));
        assert!(result.is_err());
    }
}
