//! Append-only audit trail of registry actions
//!
//! Recording is a no-op unless history was enabled in the configuration.
//! Entries are never trimmed; they live as long as the registry.

use crate::types::HistoryEntry;
use serde::Serialize;
use std::sync::Mutex;

pub(crate) struct History {
    enabled: bool,
    entries: Mutex<Vec<HistoryEntry>>,
}

impl History {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn record(&self, message: impl Into<String>) {
        if self.enabled {
            self.push(HistoryEntry::new(message));
        }
    }

    /// Record a message with the payload captured as JSON
    ///
    /// A payload that fails to serialize is recorded without data.
    pub(crate) fn record_with_data<T: Serialize>(&self, message: impl Into<String>, data: &T) {
        if !self.enabled {
            return;
        }

        let entry = HistoryEntry::new(message);
        let entry = match serde_json::to_value(data) {
            Ok(value) => entry.with_data(value),
            Err(e) => {
                tracing::warn!(
                    entry = %entry.message,
                    error = %e,
                    "Payload not captured in history"
                );
                entry
            }
        };
        self.push(entry);
    }

    pub(crate) fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn push(&self, entry: HistoryEntry) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_disabled_history_records_nothing() {
        let history = History::new(false);
        history.record("subscribed for event: a");
        history.record_with_data("a event published with data:", &1);
        assert!(history.snapshot().is_empty());
        assert!(!history.is_enabled());
    }

    #[test]
    fn test_history_preserves_order_and_data() {
        let history = History::new(true);
        history.record("subscribed for event: a");
        history.record_with_data("a event published with data:", &json!({"k": "v"}));

        let entries = history.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], HistoryEntry::new("subscribed for event: a"));
        assert_eq!(entries[1].data, Some(json!({"k": "v"})));
    }

    #[test]
    fn test_unserializable_payload_recorded_without_data() {
        // JSON object keys must be strings
        let mut data = HashMap::new();
        data.insert((1, 2), "pair");

        let history = History::new(true);
        history.record_with_data("a event published with data:", &data);

        let entries = history.snapshot();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].data.is_none());
    }
}
