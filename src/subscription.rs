//! Unsubscribe handles
//!
//! `subscribe` hands back an `Unsubscribe` rather than a reference to the
//! subscription. The handle holds only the event name, the subscription id
//! and a weak reference to the registry, so it never keeps a dropped
//! registry alive.

use crate::registry::Inner;
use crate::types::SubscriptionId;
use std::sync::Weak;

/// Capability to remove one subscription
///
/// Dropping the handle does not unsubscribe. Calling `unsubscribe` more
/// than once, after the event was cleared, or after the registry was
/// dropped is a no-op.
#[derive(Debug, Clone)]
pub struct Unsubscribe {
    event: String,
    id: SubscriptionId,
    registry: Weak<Inner>,
}

impl Unsubscribe {
    pub(crate) fn new(event: impl Into<String>, id: SubscriptionId, registry: Weak<Inner>) -> Self {
        Self {
            event: event.into(),
            id,
            registry,
        }
    }

    /// Remove the subscription if it is still registered
    ///
    /// Returns whether this call removed it.
    pub fn unsubscribe(&self) -> bool {
        match self.registry.upgrade() {
            Some(inner) => inner.unsubscribe(&self.event, self.id),
            None => false,
        }
    }

    /// Whether the subscription is still registered
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|inner| inner.contains(&self.event, self.id))
    }

    /// Event name this handle belongs to
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Id of the subscription this handle removes
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}
