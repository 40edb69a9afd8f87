//! Class registry.
//!
//! Restoring `py/object`, `py/type` and `py/repr` nodes needs to turn a
//! qualified class name back into something that can build an instance. The
//! [`Registry`] is that lookup: a closed, explicitly populated table from
//! name to [`Class`]. Names that are not registered are never guessed at; the
//! restorer hands back the raw node instead.
//!
//! A [`Class`] declares its [`Shape`], which gives the "bare construct"
//! capability (an empty instance to fill field by field), and optionally a
//! parse capability for text objects.
//!
//! ```rust
//! use firepickle::registry::{Class, Registry};
//! use firepickle::{decode_with_registry, encode, ObjectRef, Value};
//!
//! let mut registry = Registry::new();
//! registry.register(Class::fields("demo.Thing"));
//!
//! let thing = ObjectRef::fields("demo.Thing", [("name", "A String")]);
//! let json = encode(&Value::Object(thing)).unwrap();
//!
//! let back = decode_with_registry(&json, &registry).unwrap();
//! let back = back.as_object().unwrap();
//! assert_eq!(back.class(), "demo.Thing");
//! assert_eq!(back.get("name"), Some(Value::from("A String")));
//! ```
//!
//! The process-wide registry behind [`global`] starts with the built-in
//! classes and is what [`decode`](crate::decode) uses.

use crate::{ObjectBody, ObjectRef, Value};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{OnceLock, PoisonError, RwLock, RwLockReadGuard};

/// How instances of a class store their contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    Fields,
    Mapping,
    Sequence,
    Members,
    Text,
}

/// Rebuilds a value from the text a `py/repr` node carries.
pub type ParseFn = fn(&str) -> Option<Value>;

/// A registered class.
#[derive(Clone)]
pub struct Class {
    name: String,
    shape: Shape,
    parse: Option<ParseFn>,
}

impl Class {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Class {
            name: name.into(),
            shape,
            parse: None,
        }
    }

    /// A plain class with named fields.
    pub fn fields(name: impl Into<String>) -> Self {
        Class::new(name, Shape::Fields)
    }

    /// A dict subclass.
    pub fn mapping(name: impl Into<String>) -> Self {
        Class::new(name, Shape::Mapping)
    }

    /// A collection subclass.
    pub fn sequence(name: impl Into<String>) -> Self {
        Class::new(name, Shape::Sequence)
    }

    /// A non-complex class.
    pub fn members(name: impl Into<String>) -> Self {
        Class::new(name, Shape::Members)
    }

    /// A class encoded through its text, with the function that parses it back.
    pub fn text(name: impl Into<String>, parse: ParseFn) -> Self {
        Class::new(name, Shape::Text).with_parse(parse)
    }

    #[must_use]
    pub fn with_parse(mut self, parse: ParseFn) -> Self {
        self.parse = Some(parse);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn shape(&self) -> Shape {
        self.shape
    }

    /// An empty instance, skipping any constructor logic. `None` for text
    /// classes.
    #[must_use]
    pub fn bare(&self) -> Option<ObjectRef> {
        ObjectBody::empty(self.shape)
            .map(|body| ObjectRef::new(crate::Object::new(self.name.clone(), body)))
    }

    /// Parses a textual form back into a value, if the class knows how.
    #[must_use]
    pub fn parse(&self, text: &str) -> Option<Value> {
        self.parse.and_then(|parse| parse(text))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("parse", &self.parse.is_some())
            .finish()
    }
}

/// Name → [`Class`] table.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    classes: HashMap<String, Class>,
}

impl Registry {
    /// A registry with no classes at all.
    #[must_use]
    pub fn empty() -> Self {
        Registry {
            classes: HashMap::new(),
        }
    }

    /// A registry with the built-in classes:
    ///
    /// - `datetime.datetime` (text, RFC 3339)
    /// - `datetime.date` (text, `YYYY-MM-DD`)
    /// - `time.struct_time` (members)
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Class::text("datetime.datetime", parse_datetime));
        registry.register(Class::text("datetime.date", parse_date));
        registry.register(Class::members("time.struct_time"));
        registry
    }

    /// Adds or replaces a class, returning the one it replaced.
    pub fn register(&mut self, class: Class) -> Option<Class> {
        self.classes.insert(class.name.clone(), class)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Class> {
        self.classes.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

fn parse_datetime(text: &str) -> Option<Value> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| Value::datetime(dt.with_timezone(&Utc)))
}

fn parse_date(text: &str) -> Option<Value> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(Value::date)
}

fn global_lock() -> &'static RwLock<Registry> {
    static GLOBAL: OnceLock<RwLock<Registry>> = OnceLock::new();
    GLOBAL.get_or_init(|| RwLock::new(Registry::new()))
}

/// Read access to the process-wide registry.
///
/// Hold the guard only for the duration of a restore; [`register`] blocks
/// while any guard is alive.
pub fn global() -> RwLockReadGuard<'static, Registry> {
    global_lock()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Registers a class in the process-wide registry. Call it at startup.
pub fn register(class: Class) -> Option<Class> {
    global_lock()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(class)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins() {
        let registry = Registry::new();
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("datetime.datetime"));
        assert!(Registry::empty().is_empty());
    }

    #[test]
    fn test_bare_matches_shape() {
        let obj = Class::mapping("Temp").bare().unwrap();
        assert_eq!(obj.class(), "Temp");
        assert!(matches!(obj.borrow().body(), ObjectBody::Mapping(m) if m.is_empty()));

        assert!(Class::text("datetime.date", parse_date).bare().is_none());
    }

    #[test]
    fn test_parse_capability() {
        let registry = Registry::new();
        let class = registry.get("datetime.date").unwrap();
        let value = class.parse("2009-03-01").unwrap();
        assert_eq!(value.repr(), "2009-03-01");
        assert!(class.parse("March first").is_none());
        assert!(Class::fields("Thing").parse("anything").is_none());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = Registry::empty();
        assert!(registry.register(Class::fields("Thing")).is_none());
        let previous = registry.register(Class::mapping("Thing")).unwrap();
        assert_eq!(previous.shape(), Shape::Fields);
        assert_eq!(registry.get("Thing").unwrap().shape(), Shape::Mapping);
    }
}
