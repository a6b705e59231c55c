//! Status events reported by the corpus.
//!
//! Every error or warning raised during loading, indexing or resolution is
//! delivered to a caller-registered callback, filtered by a minimum level.
//! The same events are mirrored onto the `tracing` subscriber so library
//! users get diagnostics even without a callback.

use std::fmt;
use std::sync::Arc;

/// Severity of a reported event, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatusLevel {
    Progress,
    Info,
    Warning,
    Error,
}

impl Default for StatusLevel {
    fn default() -> Self {
        StatusLevel::Info
    }
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusLevel::Progress => "progress",
            StatusLevel::Info => "info",
            StatusLevel::Warning => "warning",
            StatusLevel::Error => "error",
        };
        write!(f, "{name}")
    }
}

/// A single reported event with its corpus-path context.
#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub level: StatusLevel,
    pub message: String,
    /// Corpus path the event refers to, when one is known.
    pub corpus_path: Option<String>,
}

pub type EventCallback = Arc<dyn Fn(&StatusEvent) + Send + Sync>;

/// Dispatches status events to the registered callback.
#[derive(Clone, Default)]
pub struct EventEmitter {
    callback: Option<EventCallback>,
    report_at_level: StatusLevel,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the callback and the minimum level it wants to see.
    pub fn set_callback(&mut self, callback: EventCallback, report_at_level: StatusLevel) {
        self.callback = Some(callback);
        self.report_at_level = report_at_level;
    }

    pub fn report_at_level(&self) -> StatusLevel {
        self.report_at_level
    }

    /// Emit an event, tracing it and forwarding to the callback when it
    /// meets the registered level.
    pub fn emit(&self, level: StatusLevel, message: &str, corpus_path: Option<&str>) {
        match level {
            StatusLevel::Progress => tracing::trace!(path = corpus_path, "{message}"),
            StatusLevel::Info => tracing::debug!(path = corpus_path, "{message}"),
            StatusLevel::Warning => tracing::warn!(path = corpus_path, "{message}"),
            StatusLevel::Error => tracing::error!(path = corpus_path, "{message}"),
        }

        if let Some(callback) = &self.callback
            && level >= self.report_at_level
        {
            let event = StatusEvent {
                level,
                message: message.to_string(),
                corpus_path: corpus_path.map(str::to_string),
            };
            callback(&event);
        }
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("has_callback", &self.callback.is_some())
            .field("report_at_level", &self.report_at_level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_level_ordering() {
        assert!(StatusLevel::Progress < StatusLevel::Info);
        assert!(StatusLevel::Info < StatusLevel::Warning);
        assert!(StatusLevel::Warning < StatusLevel::Error);
    }

    #[test]
    fn test_callback_filtering() {
        let seen: Arc<Mutex<Vec<StatusLevel>>> = Arc::default();
        let mut emitter = EventEmitter::new();
        let sink = Arc::clone(&seen);
        emitter.set_callback(
            Arc::new(move |event| sink.lock().expect("event sink").push(event.level)),
            StatusLevel::Warning,
        );

        emitter.emit(StatusLevel::Info, "ignored", None);
        emitter.emit(StatusLevel::Warning, "kept", Some("local:/a.cdm.json"));
        emitter.emit(StatusLevel::Error, "kept", None);

        let seen = seen.lock().expect("event sink");
        assert_eq!(*seen, vec![StatusLevel::Warning, StatusLevel::Error]);
    }
}
