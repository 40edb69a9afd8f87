//! FireLogger log records and the response payload.
//!
//! A [`LogRecord`] is one captured log event. [`LogRecord::to_value`] turns it
//! into the dict the browser extension reads:
//!
//! | Key | Content |
//! |-----|---------|
//! | `level` | `debug`, `info`, `warning`, `error` or `critical` |
//! | `message` | the formatted message |
//! | `template` | the message before formatting, or `null` |
//! | `timestamp` | microseconds since the Unix epoch |
//! | `time` | local wall-clock time, `HH:MM:SS.mmm` |
//! | `args`, `pathname`, `lineno`, `exc_text`, `name`, `process`, `thread`, `threadName` | present when known |
//! | `exc_info` | `(kind, message, traceback)`, traceback entries are `(file, line, function, text)` |
//! | `exc_frames` | the locals of each traceback frame |
//!
//! A [`Payload`] bundles the records of one request. Failures of the logging
//! machinery itself travel in its `errors` list.

use crate::{flatten, Map, PickleOptions, RecordOptions, Value};
use chrono::{DateTime, Local, Utc};
use std::fmt;

/// Severity of a record, as the extension names it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    /// Maps a numeric level (10 debug ... 50 critical) onto a name. Values
    /// between thresholds round down.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firepickle::record::Level;
    ///
    /// assert_eq!(Level::from_numeric(50), Level::Critical);
    /// assert_eq!(Level::from_numeric(35), Level::Warning);
    /// assert_eq!(Level::from_numeric(0), Level::Debug);
    /// ```
    #[must_use]
    pub const fn from_numeric(level: u32) -> Level {
        match level {
            50.. => Level::Critical,
            40.. => Level::Error,
            30.. => Level::Warning,
            20.. => Level::Info,
            _ => Level::Debug,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Critical => "critical",
        }
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warning,
            tracing::Level::INFO => Level::Info,
            _ => Level::Debug,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One traceback entry.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    pub filename: String,
    pub lineno: u32,
    pub function: String,
    /// Source line, when available.
    pub text: Option<String>,
    pub locals: Map,
}

impl Frame {
    pub fn new(filename: impl Into<String>, lineno: u32, function: impl Into<String>) -> Self {
        Frame {
            filename: filename.into(),
            lineno,
            function: function.into(),
            text: None,
            locals: Map::new(),
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_local(mut self, name: &str, value: Value) -> Self {
        self.locals.insert(name, value);
        self
    }

    fn to_value(&self) -> Value {
        Value::tuple([
            Value::from(self.filename.as_str()),
            Value::from(self.lineno),
            Value::from(self.function.as_str()),
            Value::from(self.text.clone()),
        ])
    }

    fn locals_value(&self, options: &RecordOptions) -> Value {
        if options.deep_locals {
            return Value::Dict(self.locals.clone());
        }
        Value::Dict(
            self.locals
                .iter()
                .map(|(name, value)| (name.clone(), Value::String(value.repr())))
                .collect(),
        )
    }
}

/// Exception details attached to a record.
#[derive(Clone, Debug, Default)]
pub struct ExcInfo {
    /// Exception type name.
    pub kind: String,
    pub message: String,
    /// Innermost frame last.
    pub traceback: Vec<Frame>,
}

impl ExcInfo {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ExcInfo {
            kind: kind.into(),
            message: message.into(),
            traceback: Vec::new(),
        }
    }

    /// Placeholder used when an error report has no exception to show.
    #[must_use]
    pub fn unavailable() -> Self {
        ExcInfo::new("?", "No exception info available")
    }

    /// Builds exception info from an error and its `source` chain. Each link
    /// becomes a frame named after its message, outermost first.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut info = ExcInfo::new(short_type_name(err), err.to_string());
        let mut source = err.source();
        while let Some(cause) = source {
            info.traceback
                .push(Frame::new("<error source>", 0, cause.to_string()));
            source = cause.source();
        }
        info
    }

    #[must_use]
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.traceback.push(frame);
        self
    }

    fn to_value(&self) -> Value {
        Value::tuple([
            Value::from(self.kind.as_str()),
            Value::from(self.message.as_str()),
            Value::List(self.traceback.iter().map(Frame::to_value).collect()),
        ])
    }
}

fn short_type_name(err: &(dyn std::error::Error + 'static)) -> String {
    let debug = format!("{:?}", err);
    debug
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("Error")
        .to_string()
}

/// A captured log event.
///
/// # Examples
///
/// ```rust
/// use firepickle::record::{Level, LogRecord};
/// use firepickle::{value, RecordOptions};
///
/// let record = LogRecord::new(Level::Error, "disk full")
///     .with_args(value!(("sda1", 98)))
///     .with_name("storage");
///
/// let value = record.to_value(&RecordOptions::default());
/// let dict = value.as_dict().unwrap();
/// assert_eq!(dict.get("level").and_then(|v| v.as_str()), Some("error"));
/// assert!(dict.get("args").unwrap().is_tuple());
/// ```
#[derive(Clone, Debug)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub template: Option<String>,
    pub args: Option<Value>,
    pub created: DateTime<Utc>,
    pub pathname: Option<String>,
    pub lineno: Option<u32>,
    pub exc_text: Option<String>,
    /// Logger name.
    pub name: Option<String>,
    pub process: Option<u32>,
    pub thread: Option<String>,
    pub thread_name: Option<String>,
    pub exc_info: Option<ExcInfo>,
}

impl LogRecord {
    /// A record created now, on the current thread, in the current process.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        let current = std::thread::current();
        LogRecord {
            level,
            message: message.into(),
            template: None,
            args: None,
            created: Utc::now(),
            pathname: None,
            lineno: None,
            exc_text: None,
            name: None,
            process: Some(std::process::id()),
            thread: Some(format!("{:?}", current.id())),
            thread_name: current.name().map(str::to_string),
            exc_info: None,
        }
    }

    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    #[must_use]
    pub fn with_args(mut self, args: Value) -> Self {
        self.args = Some(args);
        self
    }

    #[must_use]
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    #[must_use]
    pub fn with_location(mut self, pathname: impl Into<String>, lineno: u32) -> Self {
        self.pathname = Some(pathname.into());
        self.lineno = Some(lineno);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_exc_info(mut self, exc_info: ExcInfo) -> Self {
        self.exc_info = Some(exc_info);
        self
    }

    /// Builds the dict the extension displays.
    #[must_use]
    pub fn to_value(&self, options: &RecordOptions) -> Value {
        let mut data = Map::with_capacity(16);
        data.insert("level", Value::from(self.level.as_str()));
        data.insert("message", Value::from(self.message.as_str()));
        data.insert("template", Value::from(self.template.clone()));
        data.insert("timestamp", Value::from(self.created.timestamp_micros()));
        data.insert("time", Value::from(self.time()));

        let optional = [
            ("args", self.args.clone()),
            ("pathname", self.pathname.clone().map(Value::from)),
            ("lineno", self.lineno.map(Value::from)),
            ("exc_text", self.exc_text.clone().map(Value::from)),
            ("name", self.name.clone().map(Value::from)),
            ("process", self.process.map(Value::from)),
            ("thread", self.thread.clone().map(Value::from)),
            ("threadName", self.thread_name.clone().map(Value::from)),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                data.insert(key, value);
            }
        }

        if let Some(exc_info) = &self.exc_info {
            data.insert("exc_info", exc_info.to_value());
            data.insert(
                "exc_frames",
                Value::List(
                    exc_info
                        .traceback
                        .iter()
                        .map(|frame| frame.locals_value(options))
                        .collect(),
                ),
            );
        }
        Value::Dict(data)
    }

    /// Local wall-clock time of creation, `HH:MM:SS.mmm`.
    #[must_use]
    pub fn time(&self) -> String {
        self.created
            .with_timezone(&Local)
            .format("%H:%M:%S%.3f")
            .to_string()
    }
}

/// Everything sent back for one request.
#[derive(Clone, Debug, Default)]
pub struct Payload {
    pub logs: Vec<Value>,
    pub errors: Vec<Value>,
    pub profile: Option<Value>,
}

impl Payload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a payload from buffered records.
    #[must_use]
    pub fn from_records(records: &[LogRecord], options: &RecordOptions) -> Self {
        Payload {
            logs: records.iter().map(|record| record.to_value(options)).collect(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_profile(mut self, profile: Value) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Records a failure of the logging machinery itself.
    pub fn push_internal_error(&mut self, err: &(dyn std::error::Error + 'static)) {
        self.errors.push(internal_error(err));
    }

    /// `{"logs": [...]}` plus `errors` and `profile` when present.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut data = Map::with_capacity(3);
        data.insert("logs", Value::List(self.logs.clone()));
        if !self.errors.is_empty() {
            data.insert("errors", Value::List(self.errors.clone()));
        }
        if let Some(profile) = &self.profile {
            data.insert("profile", profile.clone());
        }
        Value::Dict(data)
    }

    /// Encodes the payload as JSON text.
    ///
    /// Flattening is total and a JSON tree always prints, so this cannot fail.
    #[must_use]
    pub fn encode(&self, options: PickleOptions) -> String {
        flatten(&self.to_value(), options).to_string()
    }
}

fn internal_error(err: &(dyn std::error::Error + 'static)) -> Value {
    let mut data = Map::with_capacity(2);
    data.insert(
        "message",
        Value::String(format!("Internal FirePython error: {}", err)),
    );
    data.insert("exc_info", ExcInfo::from_error(err).to_value());
    Value::Dict(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;

    fn created() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2009-03-01T12:30:05.250+00:00")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(Level::from_numeric(40), Level::Error);
        assert_eq!(Level::from_numeric(39), Level::Warning);
        assert_eq!(Level::from_numeric(20), Level::Info);
        assert_eq!(Level::from_numeric(10), Level::Debug);
        assert_eq!(Level::from(tracing::Level::TRACE), Level::Debug);
        assert_eq!(Level::Critical.to_string(), "critical");
    }

    #[test]
    fn test_record_dict() {
        let record = LogRecord::new(Level::Info, "hello 42")
            .with_template("hello %d")
            .with_args(value!((42,)))
            .with_created(created())
            .with_location("app/views.rs", 17);
        let value = record.to_value(&RecordOptions::default());
        let dict = value.as_dict().unwrap();

        assert_eq!(dict.get("template"), Some(&Value::from("hello %d")));
        assert_eq!(dict.get("timestamp"), Some(&Value::from(1_235_910_605_250_000_i64)));
        assert_eq!(dict.get("lineno"), Some(&Value::from(17)));
        assert!(dict.get("time").and_then(Value::as_str).unwrap().ends_with(".250"));
        assert!(!dict.contains_key("exc_info"));
        assert!(!dict.contains_key("exc_text"));
    }

    #[test]
    fn test_exc_frames_respect_deep_locals() {
        let frame = Frame::new("app.rs", 3, "handler")
            .with_local("items", value!([1, 2]));
        let record = LogRecord::new(Level::Error, "boom")
            .with_exc_info(ExcInfo::new("ValueError", "boom").with_frame(frame));

        let deep = record.to_value(&RecordOptions::default());
        let frames = deep.as_dict().unwrap().get("exc_frames").unwrap().clone();
        assert_eq!(frames, value!([{"items": [1, 2]}]));

        let shallow = record.to_value(&RecordOptions::new().with_deep_locals(false));
        let frames = shallow.as_dict().unwrap().get("exc_frames").unwrap().clone();
        assert_eq!(frames, value!([{"items": "[1, 2]"}]));

        let exc_info = deep.as_dict().unwrap().get("exc_info").unwrap().clone();
        assert_eq!(
            exc_info,
            value!(("ValueError", "boom", [("app.rs", 3, "handler", null)]))
        );
    }

    #[test]
    fn test_payload_encode_contains_unencodable_values() {
        let mut payload = Payload::new();
        payload.logs.push(Value::List(vec![
            Value::from(f64::NAN),
            Value::function("callback"),
        ]));
        payload.push_internal_error(&crate::Error::custom("repr failed"));

        let json = payload.encode(PickleOptions::oneway());
        assert!(json.starts_with(r#"{"logs":[[null,null]],"errors":[{"message":"Internal FirePython error: repr failed""#));
    }

    #[test]
    fn test_payload_shape() {
        let payload = Payload::new();
        assert_eq!(
            payload.encode(PickleOptions::oneway()),
            r#"{"logs":[]}"#
        );

        let mut payload = Payload::new().with_profile(value!({"info": "1 call"}));
        payload.push_internal_error(&crate::Error::custom("repr failed"));
        let value = payload.to_value();
        let dict = value.as_dict().unwrap();
        assert!(dict.contains_key("errors"));
        assert!(dict.contains_key("profile"));
    }
}
