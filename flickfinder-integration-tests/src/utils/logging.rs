//! Capturing log events so tests can make assertions about them.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::{
    io,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Collects the JSON lines written by a `tracing_subscriber` JSON layer.
///
/// Hand the watcher to [`fmt::Layer::with_writer`] through
/// [`MakeWriter::make_writer`], then read the events back with
/// [`LogWatcher::events`] or [`LogWatcher::has`].
///
/// [`fmt::Layer::with_writer`]: tracing_subscriber::fmt::Layer::with_writer
#[derive(Default)]
pub struct LogWatcher {
    /// Everything written so far. Lines are only parsed once complete.
    buf: Arc<Mutex<Vec<u8>>>,

    /// Events already parsed out of `buf`.
    events: Vec<TracingJsonEvent>,
}

impl LogWatcher {
    /// All events logged so far.
    pub fn events(&mut self) -> &[TracingJsonEvent] {
        self.drain_complete_lines();
        &self.events
    }

    /// Test if any event logged so far matches `predicate`.
    #[must_use = "LogWatcher::has does not make assertions alone, you probably want to wrap it in assert!()"]
    pub fn has<F>(&mut self, predicate: F) -> bool
    where
        F: FnMut(&TracingJsonEvent) -> bool,
    {
        self.events().iter().any(predicate)
    }

    /// Parse every finished line in the buffer, leaving any partial line.
    fn drain_complete_lines(&mut self) {
        let complete: Vec<u8> = {
            let mut buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
            match buf.iter().rposition(|b| *b == b'\n') {
                Some(end) => buf.drain(..=end).collect(),
                None => return,
            }
        };

        let parsed = complete
            .split(|b| *b == b'\n')
            .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
            .map(|line| {
                serde_json::from_slice::<TracingJsonEvent>(line).unwrap_or_else(|err| {
                    panic!(
                        "Bad JSON in log line ({}): {}",
                        err,
                        String::from_utf8_lossy(line)
                    )
                })
            });
        self.events.extend(parsed);
    }
}

impl<'a> MakeWriter<'a> for LogWatcher {
    type Writer = LogWatcherWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWatcherWriter(Arc::clone(&self.buf))
    }
}

/// Appends to the buffer of the [`LogWatcher`] it was made from.
#[derive(Clone)]
pub struct LogWatcherWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogWatcherWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One line of [`tracing_subscriber::fmt::format::Json`] output. Span data is
/// ignored.
#[derive(Debug, Deserialize)]
pub struct TracingJsonEvent {
    /// The fields recorded on the event, including `message`.
    pub fields: Map<String, Value>,
    /// The level the event was emitted at.
    #[serde(with = "serde_with::rust::display_fromstr")]
    pub level: Level,
    /// The module the event came from.
    pub target: String,
}

impl TracingJsonEvent {
    /// Test if the field named `name` is a string containing `pat`.
    pub fn field_contains(&self, name: &str, pat: &str) -> bool {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .map_or(false, |value| value.contains(pat))
    }

    /// Test if any string field contains `pat`.
    pub fn any_field_contains(&self, pat: &str) -> bool {
        self.fields
            .values()
            .filter_map(Value::as_str)
            .any(|value| value.contains(pat))
    }
}
