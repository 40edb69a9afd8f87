//! Classification of values.
//!
//! The flattener decides how to encode a value from its [`Kind`]. Kinds are
//! checked in declaration order, so a dict subclass is never a plain object
//! and a set is never a list.
//!
//! ```rust
//! use firepickle::{kind, Kind, Map, ObjectRef, Value};
//!
//! let counts = Value::Object(ObjectRef::mapping("collections.Counter", Map::new()));
//! assert_eq!(counts.kind(), Kind::DictSubclass);
//! assert!(kind::is_dictionary_subclass(&counts));
//! assert!(!kind::is_dictionary(&counts));
//! ```

use crate::{ObjectBody, Value};

/// The categories the flattener distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Null, boolean, number or string. Atomic, never traversed.
    Primitive,
    Dict,
    List,
    /// Fixed-arity ordered collection; tagged so it is not restored as a list.
    Tuple,
    Set,
    DictSubclass,
    CollectionSubclass,
    /// Structured, but serialized as a plain sequence of its members.
    NonComplex,
    /// Encoded through its textual form.
    Repr,
    Function,
    Type,
    Object,
}

/// Classifies a value. Pure and infallible.
#[must_use]
pub fn classify(value: &Value) -> Kind {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Kind::Primitive,
        Value::Dict(_) => Kind::Dict,
        Value::List(_) => Kind::List,
        Value::Tuple(_) => Kind::Tuple,
        Value::Set(_) => Kind::Set,
        Value::Function(_) => Kind::Function,
        Value::Type(_) => Kind::Type,
        Value::Object(obj) => match obj.borrow().body() {
            ObjectBody::Mapping(_) => Kind::DictSubclass,
            ObjectBody::Sequence(_) => Kind::CollectionSubclass,
            ObjectBody::Members(_) => Kind::NonComplex,
            ObjectBody::Text(_) => Kind::Repr,
            ObjectBody::Fields(_) => Kind::Object,
        },
    }
}

/// Strings, numbers, booleans and null.
///
/// ```rust
/// use firepickle::{kind, Value};
///
/// assert!(kind::is_primitive(&Value::from(3)));
/// assert!(!kind::is_primitive(&Value::List(vec![Value::from(4)])));
/// ```
#[must_use]
pub fn is_primitive(value: &Value) -> bool {
    classify(value) == Kind::Primitive
}

/// A base dict, not a subclass.
#[must_use]
pub fn is_dictionary(value: &Value) -> bool {
    classify(value) == Kind::Dict
}

/// A base list, tuple or set.
#[must_use]
pub fn is_collection(value: &Value) -> bool {
    matches!(classify(value), Kind::List | Kind::Tuple | Kind::Set)
}

#[must_use]
pub fn is_list(value: &Value) -> bool {
    classify(value) == Kind::List
}

#[must_use]
pub fn is_tuple(value: &Value) -> bool {
    classify(value) == Kind::Tuple
}

#[must_use]
pub fn is_set(value: &Value) -> bool {
    classify(value) == Kind::Set
}

/// An object that behaves as a mapping but is not a base dict.
#[must_use]
pub fn is_dictionary_subclass(value: &Value) -> bool {
    classify(value) == Kind::DictSubclass
}

/// An object that behaves as a sequence but is not a base collection.
#[must_use]
pub fn is_collection_subclass(value: &Value) -> bool {
    classify(value) == Kind::CollectionSubclass
}

/// Structured values such as `time.struct_time`.
#[must_use]
pub fn is_noncomplex(value: &Value) -> bool {
    classify(value) == Kind::NonComplex
}

/// Values encoded through their text, such as dates.
#[must_use]
pub fn is_repr(value: &Value) -> bool {
    classify(value) == Kind::Repr
}

#[must_use]
pub fn is_function(value: &Value) -> bool {
    classify(value) == Kind::Function
}

#[must_use]
pub fn is_type(value: &Value) -> bool {
    classify(value) == Kind::Type
}

/// Any object with identity, whatever its body.
#[must_use]
pub fn is_object(value: &Value) -> bool {
    matches!(value, Value::Object(_))
}
