//! Per-thread record buffering.
//!
//! Records are collected only between [`start`] and [`finish`] on the current
//! thread, so a request served on one thread never sees the logs of another.
//! Values are `!Send`, which is why the buffer is thread-local rather than a
//! shared map.
//!
//! [`BufferLayer`] is a `tracing_subscriber` layer that feeds `tracing`
//! events into this buffer:
//!
//! ```rust
//! use firepickle::buffer::{self, BufferLayer};
//! use tracing_subscriber::prelude::*;
//!
//! let subscriber = tracing_subscriber::registry().with(BufferLayer::new());
//! tracing::subscriber::with_default(subscriber, || {
//!     buffer::start();
//!     tracing::warn!(user = "alice", "quota exceeded");
//!     buffer::finish();
//! });
//!
//! let records = buffer::take_records();
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].message, "quota exceeded");
//! ```

use crate::headers::parse_header_name;
use crate::record::{Level, LogRecord};
use crate::{HeaderOptions, Map, Value};
use std::cell::RefCell;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

#[derive(Default)]
struct ThreadBuffer {
    enabled: bool,
    records: Vec<LogRecord>,
    republished: Vec<(String, String)>,
}

thread_local! {
    static BUFFER: RefCell<ThreadBuffer> = RefCell::new(ThreadBuffer::default());
}

fn with_buffer<R>(f: impl FnOnce(&mut ThreadBuffer) -> R) -> R {
    BUFFER.with(|buffer| f(&mut buffer.borrow_mut()))
}

/// Starts collecting records on the current thread.
pub fn start() {
    with_buffer(|buffer| buffer.enabled = true);
}

/// Stops collecting. Records already buffered stay until taken or cleared.
pub fn finish() {
    with_buffer(|buffer| buffer.enabled = false);
}

#[must_use]
pub fn is_enabled() -> bool {
    with_buffer(|buffer| buffer.enabled)
}

/// Buffers a record if collection is enabled. Returns whether it was kept.
pub fn emit(record: LogRecord) -> bool {
    with_buffer(|buffer| {
        if buffer.enabled {
            buffer.records.push(record);
        }
        buffer.enabled
    })
}

/// A copy of the buffered records.
#[must_use]
pub fn records() -> Vec<LogRecord> {
    with_buffer(|buffer| buffer.records.clone())
}

/// Removes and returns the buffered records.
pub fn take_records() -> Vec<LogRecord> {
    with_buffer(|buffer| std::mem::take(&mut buffer.records))
}

pub fn clear_records() {
    with_buffer(|buffer| buffer.records.clear());
}

/// Keeps FireLogger headers produced by a nested application so they are
/// passed on with this thread's own headers. Other headers are ignored.
pub fn republish<I, K, V>(headers: I)
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    republish_with_options(headers, &HeaderOptions::default());
}

/// Like [`republish`], keeping headers named with `options.prefix`.
pub fn republish_with_options<I, K, V>(headers: I, options: &HeaderOptions)
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let kept: Vec<(String, String)> = headers
        .into_iter()
        .filter(|(name, _)| parse_header_name(name.as_ref(), &options.prefix).is_some())
        .map(|(name, value)| (name.as_ref().to_string(), value.into()))
        .collect();
    with_buffer(|buffer| buffer.republished.extend(kept));
}

/// Removes and returns the headers queued by [`republish`].
pub fn take_republished() -> Vec<(String, String)> {
    with_buffer(|buffer| std::mem::take(&mut buffer.republished))
}

/// A `tracing` layer that turns events into buffered [`LogRecord`]s.
///
/// The `message` field becomes the record message. Other fields are kept as
/// the record's `args` dict. Events on threads that have not called
/// [`start`] are ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct BufferLayer;

impl BufferLayer {
    #[must_use]
    pub fn new() -> Self {
        BufferLayer
    }
}

impl<S> Layer<S> for BufferLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !is_enabled() {
            return;
        }
        let meta = event.metadata();
        let mut fields = FieldVisitor::default();
        event.record(&mut fields);

        let mut record = LogRecord::new(
            Level::from(*meta.level()),
            fields.message.unwrap_or_default(),
        )
        .with_name(meta.target());
        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            record = record.with_location(file, line);
        }
        if !fields.args.is_empty() {
            record = record.with_args(Value::Dict(fields.args));
        }
        emit(record);
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    args: Map,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.args.insert(field.name(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let text = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(text);
        } else {
            self.insert(field, Value::String(text));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, Value::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        let value = i64::try_from(value).map_or(Value::from(value as f64), Value::from);
        self.insert(field, value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::prelude::*;

    fn reset() {
        finish();
        clear_records();
        take_republished();
    }

    #[test]
    fn test_emit_only_while_enabled() {
        reset();
        assert!(!emit(LogRecord::new(Level::Info, "dropped")));
        start();
        assert!(is_enabled());
        assert!(emit(LogRecord::new(Level::Info, "kept")));
        finish();

        let taken = take_records();
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].message, "kept");
        assert!(records().is_empty());
    }

    #[test]
    fn test_threads_are_isolated() {
        reset();
        start();
        emit(LogRecord::new(Level::Info, "main"));

        let other = std::thread::spawn(|| {
            emit(LogRecord::new(Level::Info, "other"));
            (is_enabled(), records().len())
        })
        .join()
        .unwrap();

        assert_eq!(other, (false, 0));
        assert_eq!(records().len(), 1);
        reset();
    }

    #[test]
    fn test_republish_filters_headers() {
        reset();
        republish(vec![
            ("FireLogger-0badf00d-0", "e30="),
            ("Content-Type", "text/html"),
            ("firelogger-0badf00d-1", "fQ=="),
        ]);
        let kept = take_republished();
        assert_eq!(kept.len(), 2);
        assert!(take_republished().is_empty());
    }

    #[test]
    fn test_republish_with_custom_prefix() {
        reset();
        let options = HeaderOptions::new().with_prefix("X-Log");
        republish_with_options(
            vec![
                ("X-Log-0badf00d-0", "e30="),
                ("FireLogger-0badf00d-0", "e30="),
            ],
            &options,
        );
        let kept = take_republished();
        assert_eq!(kept, vec![("X-Log-0badf00d-0".to_string(), "e30=".to_string())]);
    }

    #[test]
    fn test_layer_captures_fields() {
        reset();
        let subscriber = tracing_subscriber::registry().with(BufferLayer::new());
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("before start");
            start();
            tracing::error!(code = 7, retry = false, "upstream failed");
            finish();
        });

        let taken = take_records();
        assert_eq!(taken.len(), 1);
        let record = &taken[0];
        assert_eq!(record.level, Level::Error);
        assert_eq!(record.message, "upstream failed");
        assert!(record.lineno.is_some());

        let args = record.args.as_ref().and_then(Value::as_dict).unwrap();
        assert_eq!(args.get("code"), Some(&Value::from(7)));
        assert_eq!(args.get("retry"), Some(&Value::from(false)));
    }
}
