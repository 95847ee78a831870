//! Core types for the a3s-pubsub registry
//!
//! Serializable types use camelCase JSON for parity with the rest of the
//! A3S ecosystem.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

/// A named event bound to its payload type
///
/// The name is the registry key; `T` is the data every subscriber of this
/// event receives. Declaring topics as constants keeps publish and subscribe
/// call sites type-checked against each other:
///
/// ```rust
/// use a3s_pubsub::Topic;
///
/// const ORDER_PLACED: Topic<u64> = Topic::new("order.placed");
/// assert_eq!(ORDER_PLACED.name(), "order.placed");
/// ```
pub struct Topic<T> {
    name: Cow<'static, str>,
    _payload: PhantomData<fn() -> T>,
}

impl<T> Topic<T> {
    /// Create a topic from a static name (usable in `const` items)
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            _payload: PhantomData,
        }
    }

    /// Create a topic from a runtime name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            _payload: PhantomData,
        }
    }

    /// Event name used as the registry key
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Clone for Topic<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _payload: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Topic<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topic")
            .field("name", &self.name)
            .field("payload", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> fmt::Display for Topic<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl<T> AsRef<str> for Topic<T> {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

/// Registry-assigned subscription identifier
///
/// Strictly increasing over the lifetime of a registry and never reused,
/// so a stale unsubscribe handle can never match a later subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One record of the registry's audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Human-readable description of the action
    pub message: String,

    /// Payload attached to publish records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl HistoryEntry {
    /// Create a record without data
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    /// Attach a JSON payload
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Options for asynchronous publishing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishAsyncOptions {
    /// Wait for each async handler's future to settle before invoking the
    /// next subscriber
    ///
    /// When false, async handler futures are spawned onto the tokio runtime
    /// and the publish resolves once every handler has been invoked.
    #[serde(default = "default_await_all")]
    pub await_all_subscribers_finish: bool,
}

fn default_await_all() -> bool {
    true
}

impl Default for PublishAsyncOptions {
    fn default() -> Self {
        Self {
            await_all_subscribers_finish: true,
        }
    }
}

impl PublishAsyncOptions {
    /// Fire-and-forget: do not wait for async handlers to finish
    pub fn fire_and_forget() -> Self {
        Self {
            await_all_subscribers_finish: false,
        }
    }
}
