use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One logged outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub at: DateTime<Utc>,
    pub value: serde_json::Value,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

/// Append-only record of everything a session did, successes and failures
/// alike. Each entry is mirrored to `tracing`.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self, value: impl Into<serde_json::Value>) {
        self.push(value.into(), false);
    }

    /// Log a failure. It is recorded like any other entry; nothing is raised.
    pub fn error(&self, value: impl Into<serde_json::Value>) {
        self.push(value.into(), true);
    }

    fn push(&self, value: serde_json::Value, is_error: bool) {
        let text = match &value {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        if is_error {
            tracing::warn!(target: "playauth::events", "{text}");
        } else {
            tracing::info!(target: "playauth::events", "{text}");
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Event {
                at: Utc::now(),
                value,
                is_error,
            });
    }

    /// Log `value` under a single key, e.g. `{"me": {...}}`.
    pub fn log_labeled(&self, label: &str, value: impl Into<serde_json::Value>) {
        let mut obj = serde_json::Map::new();
        obj.insert(label.to_string(), value.into());
        self.log(serde_json::Value::Object(obj));
    }

    pub fn entries(&self) -> Vec<Event> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|e| e.is_error)
    }

    /// Every string entry, in order.
    pub fn messages(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| e.value.as_str().map(String::from))
            .collect()
    }
}
