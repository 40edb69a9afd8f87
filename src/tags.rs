//! Reserved marker keys.
//!
//! A flattened node that is a JSON object may carry exactly one of these keys
//! to say it is not plain data:
//!
//! | Tag | Key | Meaning |
//! |-----|-----|---------|
//! | [`Tag::Object`] | `py/object` | object instance, value is the class name |
//! | [`Tag::Type`] | `py/type` | class reference, value is the class name |
//! | [`Tag::Repr`] | `py/repr` | text object, value is `<class>/<text>` |
//! | [`Tag::Ref`] | `py/ref` | back-reference, value is a path |
//! | [`Tag::Tuple`] | `py/tuple` | tuple, value is the element array |
//! | [`Tag::Set`] | `py/set` | set, value is the element array |
//!
//! Ordinary dict keys and field names that would be mistaken for a tag are
//! escaped with a leading `~`. Keys that already start with `~` get one more,
//! so unescaping is always "drop one leading `~`".
//!
//! ```rust
//! use firepickle::tags::{escape_key, unescape_key};
//!
//! assert_eq!(escape_key("py/ref"), "~py/ref");
//! assert_eq!(escape_key("~home"), "~~home");
//! assert_eq!(escape_key("name"), "name");
//! assert_eq!(unescape_key("~py/ref"), "py/ref");
//! ```

use serde_json::{Map as JsonMap, Value as JsonValue};
use std::borrow::Cow;

/// Prefix that marks an escaped ordinary key.
pub const ESCAPE: char = '~';

/// The closed set of reserved marker keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    Object,
    Type,
    Repr,
    Ref,
    Tuple,
    Set,
}

impl Tag {
    /// Every tag, in the order the restorer checks them.
    pub const ALL: [Tag; 6] = [
        Tag::Ref,
        Tag::Type,
        Tag::Repr,
        Tag::Object,
        Tag::Tuple,
        Tag::Set,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Tag::Object => "py/object",
            Tag::Type => "py/type",
            Tag::Repr => "py/repr",
            Tag::Ref => "py/ref",
            Tag::Tuple => "py/tuple",
            Tag::Set => "py/set",
        }
    }

    /// The tag a key spells, if any.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Tag> {
        Tag::ALL.into_iter().find(|tag| tag.as_str() == key)
    }

    #[must_use]
    pub fn is_reserved(key: &str) -> bool {
        Tag::from_key(key).is_some()
    }

    /// The tag that decides how a JSON object is restored.
    #[must_use]
    pub fn of_node(node: &JsonMap<String, JsonValue>) -> Option<Tag> {
        Tag::ALL
            .into_iter()
            .find(|tag| node.contains_key(tag.as_str()))
    }
}

/// Escapes an ordinary key so it cannot be read as a tag.
#[must_use]
pub fn escape_key(key: &str) -> Cow<'_, str> {
    if Tag::is_reserved(key) || key.starts_with(ESCAPE) {
        Cow::Owned(format!("{}{}", ESCAPE, key))
    } else {
        Cow::Borrowed(key)
    }
}

/// Reverses [`escape_key`].
#[must_use]
pub fn unescape_key(key: &str) -> &str {
    key.strip_prefix(ESCAPE).unwrap_or(key)
}

/// Joins name-stack segments into a reference path such as `/logs/0/args`.
///
/// Segments are escaped the way JSON Pointer does it (`~` as `~0`, `/` as
/// `~1`) so a key containing a slash cannot alias a deeper path.
#[must_use]
pub fn path(segments: &[String]) -> String {
    let mut out = String::from("/");
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push('/');
        }
        out.push_str(&segment.replace('~', "~0").replace('/', "~1"));
    }
    out
}
