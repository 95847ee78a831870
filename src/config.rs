//! Registry configuration
//!
//! Configuration is fixed at construction. The event catalog documents the
//! events an application expects to use; it is never enforced against
//! publish or subscribe calls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catalog of known event names mapped to a sample payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventCatalog {
    events: BTreeMap<String, serde_json::Value>,
}

impl EventCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an event with a sample payload
    pub fn with_event(mut self, name: impl Into<String>, sample: serde_json::Value) -> Self {
        self.events.insert(name.into(), sample);
        self
    }

    /// Whether the catalog declares `name`
    pub fn contains(&self, name: &str) -> bool {
        self.events.contains_key(name)
    }

    /// Sample payload declared for `name`
    pub fn sample(&self, name: &str) -> Option<&serde_json::Value> {
        self.events.get(name)
    }

    /// Declared event names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, serde_json::Value)> for EventCatalog {
    fn from_iter<I: IntoIterator<Item = (K, serde_json::Value)>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Configuration for a `PubSub` registry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubSubConfig {
    /// Known events (documentation only)
    ///
    /// Leaving this unset is allowed but reported through the log sink when
    /// the registry is constructed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<EventCatalog>,

    /// Emit "No listeners found" notices and async handler failures
    #[serde(default)]
    pub enable_logs: bool,

    /// Record subscribe, unsubscribe, publish and clear actions
    #[serde(default)]
    pub keep_history: bool,
}

impl PubSubConfig {
    /// Create a configuration with the given event catalog
    pub fn new(events: EventCatalog) -> Self {
        Self {
            events: Some(events),
            ..Self::default()
        }
    }

    /// Set the event catalog
    pub fn with_events(mut self, events: EventCatalog) -> Self {
        self.events = Some(events);
        self
    }

    /// Enable or disable diagnostic notices
    pub fn with_logs(mut self, enabled: bool) -> Self {
        self.enable_logs = enabled;
        self
    }

    /// Enable or disable history recording
    pub fn with_history(mut self, enabled: bool) -> Self {
        self.keep_history = enabled;
        self
    }
}
