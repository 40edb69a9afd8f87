//! Dynamic value representation for application data.
//!
//! This module provides the [`Value`] enum, the in-memory shape of anything a
//! log record may carry: primitives, lists, tuples, sets, dicts, type and
//! callable references, and shared objects with identity.
//!
//! ## Core Types
//!
//! - [`Value`]: A closed union over every shape the flattener knows
//! - [`Number`]: Integer or floating-point number
//! - [`Key`]: A dict key (text, integer, boolean or null)
//! - [`ObjectRef`]: A shared, identity-carrying handle to an [`Object`]
//! - [`ObjectBody`]: What an object holds (fields, entries, elements or text)
//!
//! ## Identity
//!
//! Lists, tuples, sets and dicts are owned trees. Only objects are shared:
//! cloning an [`ObjectRef`] clones the handle, not the object, so the same
//! object can sit at several places in a graph and even contain itself.
//!
//! ```rust
//! use firepickle::{ObjectRef, Value};
//!
//! let thing = ObjectRef::fields("Thing", [("name", Value::from("A String"))]);
//! thing.set("child", Value::Object(thing.clone()));
//!
//! let child = thing.get("child").unwrap();
//! assert!(child.as_object().unwrap().ptr_eq(&thing));
//! ```
//!
//! Equality between objects is identity: two objects with equal fields are
//! different values.

use crate::registry::Shape;
use crate::tags::unescape_key;
use crate::Map;
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use serde_json::Value as JsonValue;
use std::cell::{Ref, RefCell, RefMut};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// A dynamically-typed application value.
///
/// # Examples
///
/// ```rust
/// use firepickle::{Number, Value};
///
/// let null = Value::Null;
/// let num = Value::Number(Number::Integer(42));
/// let pair = Value::tuple([Value::from(1), Value::from(2)]);
///
/// assert!(null.is_null());
/// assert!(num.is_number());
/// assert!(pair.is_tuple());
/// ```
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Unique elements; use [`Value::set`] to build one.
    Set(Vec<Value>),
    Dict(Map),
    /// A reference to a class by qualified name.
    Type(String),
    /// A callable. Never serialized.
    Function(String),
    Object(ObjectRef),
}

/// A numeric value.
///
/// # Examples
///
/// ```rust
/// use firepickle::Number;
///
/// let integer = Number::Integer(42);
/// let float = Number::Float(3.5);
///
/// assert!(integer.is_integer());
/// assert_eq!(integer.as_i64(), Some(42));
/// assert_eq!(float.as_f64(), 3.5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    /// Returns `true` if this is an integer value.
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    /// Returns `true` if this is a floating-point value.
    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Converts this number to an `i64` if possible.
    ///
    /// Floats with no fractional part inside the `i64` range convert; anything
    /// else returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firepickle::Number;
    ///
    /// assert_eq!(Number::Float(42.0).as_i64(), Some(42));
    /// assert_eq!(Number::Float(42.5).as_i64(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
        }
    }

    /// Converts this number to an `f64`.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }

    /// Converts to a JSON number. Non-finite floats have no JSON form.
    pub(crate) fn to_json(self) -> JsonValue {
        match self {
            Number::Integer(i) => JsonValue::from(i),
            Number::Float(f) => serde_json::Number::from_f64(f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(fl) if fl.is_nan() => write!(f, "nan"),
            Number::Float(fl) if fl.is_infinite() => {
                write!(f, "{}", if *fl > 0.0 { "inf" } else { "-inf" })
            }
            // `{:?}` keeps the trailing `.0` on whole floats
            Number::Float(fl) => write!(f, "{:?}", fl),
        }
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Integer(value as i64)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Integer(value)
    }
}

impl From<u32> for Number {
    fn from(value: u32) -> Self {
        Number::Integer(value as i64)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

/// A dict key.
///
/// JSON only has text keys, so the flattener writes every key through
/// [`Key::to_text`]. Restored dicts always carry [`Key::String`] keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Null,
    Bool(bool),
    Integer(i64),
    String(String),
}

impl Key {
    /// Returns the key's text if it is a string key.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::String(s) => Some(s),
            _ => None,
        }
    }

    /// Coerces the key to text: strings verbatim, everything else by its repr.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firepickle::Key;
    ///
    /// assert_eq!(Key::from("name").to_text(), "name");
    /// assert_eq!(Key::from(7).to_text(), "7");
    /// assert_eq!(Key::Null.to_text(), "None");
    /// ```
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Key::Null => "None".to_string(),
            Key::Bool(true) => "True".to_string(),
            Key::Bool(false) => "False".to_string(),
            Key::Integer(i) => i.to_string(),
            Key::String(s) => s.clone(),
        }
    }

    fn repr(&self) -> String {
        match self {
            Key::String(s) => quote(s),
            other => other.to_text(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::String(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::String(value)
    }
}

impl From<&String> for Key {
    fn from(value: &String) -> Self {
        Key::String(value.clone())
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Integer(value as i64)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Integer(value)
    }
}

impl From<bool> for Key {
    fn from(value: bool) -> Self {
        Key::Bool(value)
    }
}

/// The contents of an [`Object`].
///
/// The variant decides how the object is flattened:
///
/// | Body | Kind | Flattened as |
/// |------|------|--------------|
/// | `Fields` | plain object | named fields plus `py/object` |
/// | `Mapping` | dict subclass | entries plus `py/object` |
/// | `Sequence` | collection subclass | indexed entries plus `py/object` |
/// | `Members` | non-complex | a plain array |
/// | `Text` | needs textual form | `py/repr` |
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectBody {
    Fields(Map),
    Mapping(Map),
    Sequence(Vec<Value>),
    Members(Vec<Value>),
    Text(String),
}

impl ObjectBody {
    /// An empty body of the given shape, or `None` for text objects, which
    /// only exist through their text.
    #[must_use]
    pub fn empty(shape: Shape) -> Option<Self> {
        match shape {
            Shape::Fields => Some(ObjectBody::Fields(Map::new())),
            Shape::Mapping => Some(ObjectBody::Mapping(Map::new())),
            Shape::Sequence => Some(ObjectBody::Sequence(Vec::new())),
            Shape::Members => Some(ObjectBody::Members(Vec::new())),
            Shape::Text => None,
        }
    }

    #[must_use]
    pub const fn shape(&self) -> Shape {
        match self {
            ObjectBody::Fields(_) => Shape::Fields,
            ObjectBody::Mapping(_) => Shape::Mapping,
            ObjectBody::Sequence(_) => Shape::Sequence,
            ObjectBody::Members(_) => Shape::Members,
            ObjectBody::Text(_) => Shape::Text,
        }
    }
}

/// An instance of a named class.
#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    class: String,
    body: ObjectBody,
}

impl Object {
    pub fn new(class: impl Into<String>, body: ObjectBody) -> Self {
        Object {
            class: class.into(),
            body,
        }
    }

    /// The qualified class name, e.g. `datetime.datetime`.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[must_use]
    pub fn body(&self) -> &ObjectBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut ObjectBody {
        &mut self.body
    }

    /// Looks up a named field or mapping entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match &self.body {
            ObjectBody::Fields(map) | ObjectBody::Mapping(map) => map.get(key),
            ObjectBody::Sequence(items) | ObjectBody::Members(items) => {
                key.parse::<usize>().ok().and_then(|i| items.get(i))
            }
            ObjectBody::Text(_) => None,
        }
    }

    /// Stores `value` under `key`.
    ///
    /// Fields and mappings insert the key. Sequences and members treat the key
    /// as an index: an existing index is overwritten and the index one past
    /// the end appends. Any other key, and every key on a text object, is
    /// ignored and reported as `false`.
    pub fn insert(&mut self, key: &str, value: Value) -> bool {
        match &mut self.body {
            ObjectBody::Fields(map) | ObjectBody::Mapping(map) => {
                map.insert(key, value);
                true
            }
            ObjectBody::Sequence(items) | ObjectBody::Members(items) => {
                let Ok(index) = key.parse::<usize>() else {
                    return false;
                };
                match index.cmp(&items.len()) {
                    Ordering::Less => items[index] = value,
                    Ordering::Equal => items.push(value),
                    Ordering::Greater => return false,
                }
                true
            }
            ObjectBody::Text(_) => false,
        }
    }

    /// The object's textual form, if it is a text object.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            ObjectBody::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// A shared handle to an [`Object`].
///
/// Equality is identity. `Debug` prints the class and address only, so cyclic
/// graphs can be debugged without recursing forever.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    pub fn new(object: Object) -> Self {
        ObjectRef(Rc::new(RefCell::new(object)))
    }

    /// Creates a plain object with named fields.
    pub fn fields<I, K, V>(class: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<crate::Key>,
        V: Into<Value>,
    {
        let map = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        ObjectRef::new(Object::new(class, ObjectBody::Fields(map)))
    }

    /// Creates a dict-subclass instance.
    pub fn mapping(class: impl Into<String>, entries: Map) -> Self {
        ObjectRef::new(Object::new(class, ObjectBody::Mapping(entries)))
    }

    /// Creates a collection-subclass instance.
    pub fn sequence(class: impl Into<String>, items: Vec<Value>) -> Self {
        ObjectRef::new(Object::new(class, ObjectBody::Sequence(items)))
    }

    /// Creates a non-complex instance: structured, but serialized as its members.
    pub fn members(class: impl Into<String>, items: Vec<Value>) -> Self {
        ObjectRef::new(Object::new(class, ObjectBody::Members(items)))
    }

    /// Creates an object whose faithful encoding is its text.
    pub fn text(class: impl Into<String>, text: impl Into<String>) -> Self {
        ObjectRef::new(Object::new(class, ObjectBody::Text(text.into())))
    }

    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Object> {
        self.0.borrow_mut()
    }

    /// Returns `true` if both handles point at the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The object's identity, stable for as long as any handle is alive.
    #[must_use]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    #[must_use]
    pub fn class(&self) -> String {
        self.0.borrow().class.clone()
    }

    /// Returns a clone of a field or entry. Objects inside come back as
    /// handles to the same objects.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    /// See [`Object::insert`].
    pub fn set(&self, key: &str, value: Value) -> bool {
        self.0.borrow_mut().insert(key, value)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(object) => write!(f, "ObjectRef({} @ {:#x})", object.class, self.id()),
            Err(_) => write!(f, "ObjectRef(<borrowed> @ {:#x})", self.id()),
        }
    }
}

impl Value {
    /// Builds a tuple.
    pub fn tuple<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::Tuple(items.into_iter().collect())
    }

    /// Builds a set, dropping duplicate elements.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firepickle::Value;
    ///
    /// let set = Value::set([Value::from(1), Value::from(1), Value::from(2)]);
    /// assert_eq!(set.as_set().map(|s| s.len()), Some(2));
    /// ```
    pub fn set<I: IntoIterator<Item = Value>>(items: I) -> Self {
        let mut unique: Vec<Value> = Vec::new();
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Value::Set(unique)
    }

    pub fn type_ref(name: impl Into<String>) -> Self {
        Value::Type(name.into())
    }

    pub fn function(name: impl Into<String>) -> Self {
        Value::Function(name.into())
    }

    /// A `datetime.datetime` text object in RFC 3339 form.
    pub fn datetime(dt: DateTime<Utc>) -> Self {
        Value::Object(ObjectRef::text("datetime.datetime", dt.to_rfc3339()))
    }

    /// A `datetime.date` text object in `YYYY-MM-DD` form.
    pub fn date(date: NaiveDate) -> Self {
        Value::Object(ObjectRef::text(
            "datetime.date",
            date.format("%Y-%m-%d").to_string(),
        ))
    }

    /// A `time.struct_time` non-complex object: year, month, day, hour,
    /// minute, second, weekday (Monday is 0), day of year, DST flag.
    pub fn struct_time(dt: DateTime<Utc>) -> Self {
        let members = [
            dt.year() as i64,
            dt.month() as i64,
            dt.day() as i64,
            dt.hour() as i64,
            dt.minute() as i64,
            dt.second() as i64,
            dt.weekday().num_days_from_monday() as i64,
            dt.ordinal() as i64,
            0,
        ]
        .into_iter()
        .map(Value::from)
        .collect();
        Value::Object(ObjectRef::members("time.struct_time", members))
    }

    /// Converts a JSON node without interpreting any tag keys.
    ///
    /// This is the "raw node" the restorer falls back to. Tag keys stay as
    /// they are; ordinary keys lose their escape `~` unless that would
    /// collide with a key already in the node.
    #[must_use]
    pub fn from_json(node: &JsonValue) -> Self {
        match node {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Number(Number::Integer(i)),
                None => Value::Number(Number::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(map) => {
                let mut dict = Map::with_capacity(map.len());
                for (key, value) in map {
                    let key = match unescape_key(key) {
                        plain if plain != key.as_str() && map.contains_key(plain) => key.as_str(),
                        plain => plain,
                    };
                    dict.insert(key, Value::from_json(value));
                }
                Value::Dict(dict)
            }
        }
    }

    /// The value's textual form, used when the depth limit cuts a subtree off.
    ///
    /// Objects print as `<class object at 0x...>` without descending into
    /// their fields, so this terminates on cyclic graphs.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firepickle::{value, Value};
    ///
    /// assert_eq!(Value::from("it's").repr(), "'it\\'s'");
    /// assert_eq!(Value::tuple([Value::from(1)]).repr(), "(1,)");
    /// assert_eq!(value!({"a": [1, 2.0, null]}).repr(), "{'a': [1, 2.0, None]}");
    /// ```
    #[must_use]
    pub fn repr(&self) -> String {
        match self {
            Value::Null => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => quote(s),
            Value::List(items) => format!("[{}]", join_repr(items)),
            Value::Tuple(items) if items.len() == 1 => format!("({},)", items[0].repr()),
            Value::Tuple(items) => format!("({})", join_repr(items)),
            Value::Set(items) if items.is_empty() => "set()".to_string(),
            Value::Set(items) => format!("{{{}}}", join_repr(items)),
            Value::Dict(map) => format!(
                "{{{}}}",
                map.iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Value::Type(name) => format!("<class '{}'>", name),
            Value::Function(name) => format!("<function {}>", name),
            Value::Object(obj) => {
                let object = obj.borrow();
                match object.text() {
                    Some(text) => text.to_string(),
                    None => format!("<{} object at {:#x}>", object.class(), obj.id()),
                }
            }
        }
    }

    /// Returns the value's [`Kind`](crate::Kind).
    #[must_use]
    pub fn kind(&self) -> crate::Kind {
        crate::kind::classify(self)
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_tuple(&self) -> bool {
        matches!(self, Value::Tuple(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_set(&self) -> bool {
        matches!(self, Value::Set(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_dict(&self) -> bool {
        matches!(self, Value::Dict(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_set(&self) -> Option<&[Value]> {
        match self {
            Value::Set(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_dict(&self) -> Option<&Map> {
        match self {
            Value::Dict(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Parses a `datetime.datetime` text object back into a chrono value.
    #[must_use]
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        let obj = self.as_object()?;
        let object = obj.borrow();
        if object.class() != "datetime.datetime" {
            return None;
        }
        DateTime::parse_from_rfc3339(object.text()?)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl PartialEq for Value {
    /// Structural equality, except that sets ignore order and objects compare
    /// by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|item| b.contains(item))
            }
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            other => f.write_str(&other.repr()),
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

fn join_repr(items: &[Value]) -> String {
    items
        .iter()
        .map(Value::repr)
        .collect::<Vec<_>>()
        .join(", ")
}

// TryFrom implementations for extracting values from Value
impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| crate::Error::custom(format!("cannot convert {} to i64", n))),
            _ => Err(crate::Error::custom(format!(
                "expected integer, found {:?}",
                value
            ))),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Number(n) => Ok(n.as_f64()),
            _ => Err(crate::Error::custom(format!(
                "expected number, found {:?}",
                value
            ))),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            _ => Err(crate::Error::custom(format!(
                "expected bool, found {:?}",
                value
            ))),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            _ => Err(crate::Error::custom(format!(
                "expected string, found {:?}",
                value
            ))),
        }
    }
}

// From implementations for creating Value from primitives
impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Number::Integer(value as i64))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::Integer(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(Number::Integer(value as i64))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::Float(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Dict(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tryfrom_i64() {
        let result: i64 = TryFrom::try_from(Value::from(42)).unwrap();
        assert_eq!(result, 42);

        let result: i64 = TryFrom::try_from(Value::from(42.0)).unwrap();
        assert_eq!(result, 42);

        assert!(i64::try_from(Value::from("test")).is_err());
    }

    #[test]
    fn test_tryfrom_string() {
        let result: String = TryFrom::try_from(Value::from("hello")).unwrap();
        assert_eq!(result, "hello");
        assert!(String::try_from(Value::from(42)).is_err());
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let a = Value::set([Value::from(1), Value::from(2)]);
        let b = Value::set([Value::from(2), Value::from(1)]);
        assert_eq!(a, b);
        assert_ne!(a, Value::List(vec![Value::from(1), Value::from(2)]));
    }

    #[test]
    fn test_objects_compare_by_identity() {
        let a = ObjectRef::fields("Thing", [("name", "x")]);
        let b = ObjectRef::fields("Thing", [("name", "x")]);
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
    }

    #[test]
    fn test_sequence_insert_appends_or_overwrites() {
        let obj = ObjectRef::sequence("MyList", Vec::new());
        assert!(obj.set("0", Value::from("a")));
        assert!(obj.set("1", Value::from("b")));
        assert!(obj.set("0", Value::from("c")));
        assert!(!obj.set("3", Value::from("gap")));
        assert!(!obj.set("18446744073709551615", Value::from("huge")));
        assert!(!obj.set("x", Value::from("ignored")));
        match obj.borrow().body() {
            ObjectBody::Sequence(items) => {
                assert_eq!(items, &vec![Value::from("c"), Value::from("b")]);
            }
            other => panic!("Expected sequence body, got {:?}", other),
        };
    }

    #[test]
    fn test_cyclic_debug_terminates() {
        let obj = ObjectRef::fields("Node", Vec::<(&str, Value)>::new());
        obj.set("me", Value::Object(obj.clone()));
        let printed = format!("{:?}", obj.borrow());
        assert!(printed.contains("ObjectRef(Node @"));
    }

    #[test]
    fn test_repr_forms() {
        assert_eq!(Value::Null.repr(), "None");
        assert_eq!(Value::from(1.0).repr(), "1.0");
        assert_eq!(Value::set(Vec::new()).repr(), "set()");
        assert_eq!(Value::type_ref("mod.Thing").repr(), "<class 'mod.Thing'>");
        assert_eq!(Value::function("handler").repr(), "<function handler>");

        let obj = ObjectRef::fields("mod.Thing", Vec::<(&str, Value)>::new());
        assert!(Value::Object(obj).repr().starts_with("<mod.Thing object at 0x"));
    }

    #[test]
    fn test_datetime_roundtrip_through_text() {
        let dt = DateTime::parse_from_rfc3339("2009-03-01T12:30:00+00:00")
            .unwrap()
            .with_timezone(&Utc);
        let value = Value::datetime(dt);
        assert_eq!(value.as_datetime(), Some(dt));
        assert_eq!(value.repr(), "2009-03-01T12:30:00+00:00");
    }

    #[test]
    fn test_struct_time_members() {
        let dt = DateTime::parse_from_rfc3339("2009-03-01T12:30:05+00:00")
            .unwrap()
            .with_timezone(&Utc);
        let value = Value::struct_time(dt);
        let obj = value.as_object().unwrap();
        assert_eq!(obj.get("0"), Some(Value::from(2009)));
        // 2009-03-01 was a Sunday
        assert_eq!(obj.get("6"), Some(Value::from(6)));
        assert_eq!(obj.get("7"), Some(Value::from(60)));
    }

    #[test]
    fn test_from_json_keeps_tags_verbatim() {
        let node = serde_json::json!({"py/object": "mod.Thing", "n": [1, 2.5]});
        let value = Value::from_json(&node);
        let dict = value.as_dict().unwrap();
        assert_eq!(dict.get("py/object"), Some(&Value::from("mod.Thing")));
        assert_eq!(
            dict.get("n"),
            Some(&Value::List(vec![Value::from(1), Value::from(2.5)]))
        );
    }

    #[test]
    fn test_from_json_unescapes_plain_keys() {
        let node = serde_json::json!({
            "py/object": "mod.Ghost",
            "~py/type": "field",
            "~~home": 1,
            "~py/object": "shadow"
        });
        let value = Value::from_json(&node);
        let dict = value.as_dict().unwrap();
        assert_eq!(dict.get("py/object"), Some(&Value::from("mod.Ghost")));
        assert_eq!(dict.get("py/type"), Some(&Value::from("field")));
        assert_eq!(dict.get("~home"), Some(&Value::from(1)));
        // Unescaping would overwrite the tag, so the key keeps its escape.
        assert_eq!(dict.get("~py/object"), Some(&Value::from("shadow")));
        assert_eq!(dict.len(), 4);
    }
}
