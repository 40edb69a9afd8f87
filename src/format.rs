//! Wire format reference
//!
//! This module documents the flattened JSON format produced by
//! [`Pickler`](crate::Pickler) and read by [`Unpickler`](crate::Unpickler).
//! It has no items of its own.
//!
//! # Overview
//!
//! A flattened tree is ordinary JSON. Values JSON can express directly are
//! written as themselves; everything else is a JSON object carrying exactly
//! one reserved tag key.
//!
//! # Plain values
//!
//! | Value | Flattened |
//! |-------|-----------|
//! | null, booleans, strings | themselves |
//! | integers, finite floats | JSON numbers |
//! | NaN, infinities | `null` |
//! | list | array |
//! | dict | object; keys that are not strings are written as their repr (`1`, `None`, `True`) |
//! | function | omitted from dicts and objects, `null` in arrays |
//!
//! # Tagged values
//!
//! | Value | Faithful form | One-way form |
//! |-------|---------------|--------------|
//! | tuple | `{"py/tuple": [...]}` | `[...]` |
//! | set | `{"py/set": [...]}` | `[...]` |
//! | type | `{"py/type": "mod.Class"}` | `"mod.Class"` |
//! | object | `{"py/object": "mod.Class", "field": ...}` | `{"field": ...}` |
//! | dict subclass | `{"py/object": "mod.Class", "key": ...}` | `{"key": ...}` |
//! | collection subclass | `{"py/object": "mod.Class", "0": ..., "1": ...}` | `[...]` |
//! | non-complex object | `[...]` | `[...]` |
//! | text object | `{"py/repr": "mod.Class/<text>"}` | `"<text>"` |
//! | repeated object | `{"py/ref": "/path/to/first"}` | same |
//!
//! The one-way form is what [`PickleOptions::oneway`](crate::PickleOptions::oneway)
//! produces; it is meant for display and does not restore to the original
//! types.
//!
//! # References
//!
//! Within one top-level call each object is written in full the first time it
//! is met. Every later occurrence, including an object nested inside itself,
//! is written as `{"py/ref": path}` where `path` is the location of the first
//! occurrence.
//!
//! A path is `/` followed by the segments leading to the value, joined by
//! `/`. Segments are dict keys, field names and array indices. Inside a
//! segment `~` is written `~0` and `/` is written `~1`:
//!
//! ```text
//! {"py/object": "Thing", "name": "A String", "child": {"py/ref": "/"}}
//! [{"py/object": "Leaf"}, {"py/ref": "/0"}]
//! {"a/b": {"py/object": "Leaf"}, "c": {"py/ref": "/a~1b"}}
//! ```
//!
//! # Escaped keys
//!
//! An ordinary key equal to a tag, or beginning with `~`, gets one extra `~`
//! in front. The restorer removes exactly one leading `~` from every ordinary
//! key:
//!
//! ```text
//! {"py/ref": 1, "~x": 2}   is written as   {"~py/ref": 1, "~~x": 2}
//! ```
//!
//! # Restore priority
//!
//! When a node carries several tags the first match wins: `py/ref`,
//! `py/type`, `py/repr`, `py/object`, `py/tuple`, `py/set`. A node whose tag
//! cannot be resolved is restored verbatim as a dict.
//!
//! # Depth limit
//!
//! With a depth limit of `n`, containers up to `n` levels deep are flattened
//! and anything deeper is replaced by its repr string. Primitives are never
//! replaced. A limit of `0` turns any container root into its repr.
