// Logging module - In-memory log capture with per-component histories
//
// This module provides a custom tracing layer that captures log events
// in memory, bucketed by the component that emitted them. Services tag
// their events with a `component` field; everything else is bucketed
// under its tracing target. The captured histories back the loader's
// diagnostics and the `render` command's failure report.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::{Level, Metadata, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Maximum number of log entries kept per component
const MAX_COMPONENT_ENTRIES: usize = 500;

/// A single log entry captured from tracing
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub component: String,
    pub message: String,
}

/// Log level for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<&Level> for LogLevel {
    fn from(level: &Level) -> Self {
        match *level {
            Level::ERROR => LogLevel::Error,
            Level::WARN => LogLevel::Warn,
            Level::INFO => LogLevel::Info,
            Level::DEBUG => LogLevel::Debug,
            Level::TRACE => LogLevel::Trace,
        }
    }
}

impl LogLevel {
    /// Get the display string for this log level
    pub fn as_str(&self) -> &str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

/// In-memory log store with one bounded ring buffer per component
#[derive(Clone, Default)]
pub struct LogStore {
    histories: Arc<Mutex<HashMap<String, VecDeque<LogEntry>>>>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a log entry to its component's history
    /// If the history is full, removes the oldest entry
    pub fn add(&self, entry: LogEntry) {
        let mut histories = self.histories.lock().unwrap();
        let history = histories.entry(entry.component.clone()).or_default();
        if history.len() >= MAX_COMPONENT_ENTRIES {
            history.pop_front();
        }
        history.push_back(entry);
    }

    /// Get the captured history for a single component (oldest first)
    pub fn component_history(&self, component: &str) -> Vec<LogEntry> {
        self.histories
            .lock()
            .unwrap()
            .get(component)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Get every captured entry across components, ordered by timestamp
    pub fn all_entries(&self) -> Vec<LogEntry> {
        let histories = self.histories.lock().unwrap();
        let mut entries: Vec<LogEntry> = histories.values().flatten().cloned().collect();
        entries.sort_by_key(|e| e.timestamp);
        entries
    }

    /// Names of components that have logged at least once
    pub fn components(&self) -> Vec<String> {
        let mut names: Vec<String> = self.histories.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    /// Clear one component's history, or everything when `component` is None
    pub fn clear(&self, component: Option<&str>) {
        let mut histories = self.histories.lock().unwrap();
        match component {
            Some(name) => {
                histories.remove(name);
            }
            None => histories.clear(),
        }
    }
}

/// Custom tracing layer that captures logs into a [`LogStore`]
pub struct ComponentLogLayer {
    store: LogStore,
}

impl ComponentLogLayer {
    pub fn new(store: LogStore) -> Self {
        Self { store }
    }
}

impl<S> Layer<S> for ComponentLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = LogLevel::from(metadata.level());

        // Extract the message and component fields using a visitor.
        // Events without an explicit component fall back to their target.
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let component = visitor
            .component
            .unwrap_or_else(|| metadata.target().to_string());

        self.store.add(LogEntry {
            timestamp: Utc::now(),
            level,
            component,
            message: visitor.message,
        });
    }

    fn enabled(&self, _metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        // Enable all log levels - filtering happens at subscriber level
        true
    }
}

/// Visitor to extract the message and component fields from a tracing event
#[derive(Default)]
struct FieldVisitor {
    message: String,
    component: Option<String>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "component" {
            self.component = Some(value.to_string());
        } else if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
            // Remove the quotes that Debug adds
            if self.message.starts_with('"') && self.message.ends_with('"') {
                self.message = self.message[1..self.message.len() - 1].to_string();
            }
        } else if field.name() == "component" && self.component.is_none() {
            let mut raw = format!("{:?}", value);
            if raw.starts_with('"') && raw.ends_with('"') {
                raw = raw[1..raw.len() - 1].to_string();
            }
            self.component = Some(raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(component: &str, message: &str) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Info,
            component: component.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_histories_are_bucketed_by_component() {
        let store = LogStore::new();
        store.add(entry("loader", "loading navbar"));
        store.add(entry("loader", "loading discussion"));
        store.add(entry("data", "fetching comments"));

        assert_eq!(store.component_history("loader").len(), 2);
        assert_eq!(store.component_history("data").len(), 1);
        assert_eq!(store.component_history("unknown").len(), 0);
        assert_eq!(store.components(), vec!["data", "loader"]);
    }

    #[test]
    fn test_history_is_bounded() {
        let store = LogStore::new();
        for i in 0..(MAX_COMPONENT_ENTRIES + 25) {
            store.add(entry("loader", &format!("event {i}")));
        }

        let history = store.component_history("loader");
        assert_eq!(history.len(), MAX_COMPONENT_ENTRIES);
        // Oldest entries were evicted first
        assert_eq!(history[0].message, "event 25");
    }

    #[test]
    fn test_clear_single_component() {
        let store = LogStore::new();
        store.add(entry("loader", "a"));
        store.add(entry("data", "b"));

        store.clear(Some("loader"));
        assert!(store.component_history("loader").is_empty());
        assert_eq!(store.component_history("data").len(), 1);

        store.clear(None);
        assert!(store.all_entries().is_empty());
    }
}
