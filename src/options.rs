//! Configuration options for flattening and header transport.
//!
//! This module provides builder-style option structs:
//!
//! - [`PickleOptions`]: controls the flattener (type tags, depth limit)
//! - [`HeaderOptions`]: controls how a payload is cut into response headers
//! - [`RecordOptions`]: controls how much of a stack frame a log record keeps
//!
//! ## Examples
//!
//! ```rust
//! use firepickle::{encode_with_options, value, PickleOptions};
//!
//! let data = value!({"args": (1, 2)});
//!
//! // Faithful form, with type tags
//! let json = encode_with_options(&data, PickleOptions::new()).unwrap();
//! assert_eq!(json, r#"{"args":{"py/tuple":[1,2]}}"#);
//!
//! // One-way form for display only
//! let json = encode_with_options(&data, PickleOptions::oneway()).unwrap();
//! assert_eq!(json, r#"{"args":[1,2]}"#);
//! ```

/// Configuration for the flattener.
///
/// # Examples
///
/// ```rust
/// use firepickle::PickleOptions;
///
/// let options = PickleOptions::new()
///     .with_unpicklable(false)
///     .with_max_depth(8);
/// assert!(!options.unpicklable);
/// assert_eq!(options.max_depth, Some(8));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PickleOptions {
    /// Emit the type tags needed to restore the value. When `false` the output
    /// is plain JSON meant for display only.
    pub unpicklable: bool,
    /// Levels of containers to descend before falling back to a value's
    /// textual form. `None` means unlimited.
    pub max_depth: Option<usize>,
}

impl Default for PickleOptions {
    fn default() -> Self {
        PickleOptions {
            unpicklable: true,
            max_depth: None,
        }
    }
}

impl PickleOptions {
    /// Creates default options: tagged output, no depth limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for one-way, display-only output.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firepickle::PickleOptions;
    ///
    /// assert!(!PickleOptions::oneway().unpicklable);
    /// ```
    #[must_use]
    pub fn oneway() -> Self {
        PickleOptions {
            unpicklable: false,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_unpicklable(mut self, unpicklable: bool) -> Self {
        self.unpicklable = unpicklable;
        self
    }

    /// Sets the depth limit.
    ///
    /// A limit of `0` replaces any non-primitive root by its textual form.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

/// Configuration for the header transport.
///
/// # Examples
///
/// ```rust
/// use firepickle::HeaderOptions;
///
/// let options = HeaderOptions::new().with_line_width(60);
/// assert_eq!(options.prefix, "FireLogger");
/// assert_eq!(options.line_width, 60);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderOptions {
    /// Header name prefix; headers are named `<prefix>-<guid>-<index>`.
    pub prefix: String,
    /// Maximum length of one header value.
    pub line_width: usize,
    /// Depth limit for the payload. Live request state can be arbitrarily deep.
    pub max_depth: usize,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        HeaderOptions {
            prefix: "FireLogger".to_string(),
            line_width: 76,
            max_depth: 8,
        }
    }
}

impl HeaderOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the chunk width. Zero is treated as one.
    #[must_use]
    pub fn with_line_width(mut self, line_width: usize) -> Self {
        self.line_width = line_width.max(1);
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The flattener options a payload is encoded with.
    #[must_use]
    pub fn pickle_options(&self) -> PickleOptions {
        PickleOptions::oneway().with_max_depth(self.max_depth)
    }
}

/// Configuration for log record capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordOptions {
    /// Keep frame locals as values. When `false` each local is kept as its
    /// textual form only.
    pub deep_locals: bool,
}

impl Default for RecordOptions {
    fn default() -> Self {
        RecordOptions { deep_locals: true }
    }
}

impl RecordOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_deep_locals(mut self, deep_locals: bool) -> Self {
        self.deep_locals = deep_locals;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = PickleOptions::default();
        assert!(options.unpicklable);
        assert_eq!(options.max_depth, None);
        assert!(RecordOptions::default().deep_locals);
    }

    #[test]
    fn test_header_options_flatten_one_way() {
        let options = HeaderOptions::new().with_max_depth(3).with_line_width(0);
        assert_eq!(options.line_width, 1);
        assert_eq!(
            options.pickle_options(),
            PickleOptions {
                unpicklable: false,
                max_depth: Some(3)
            }
        );
    }
}
