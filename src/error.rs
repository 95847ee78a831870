//! Error types for a3s-pubsub

use crate::types::SubscriptionId;
use thiserror::Error;

/// Boxed error returned by fallible handlers
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in the pub/sub registry
#[derive(Debug, Error)]
pub enum PubSubError {
    /// A subscriber's handler failed during a synchronous publish
    ///
    /// Delivery to the remaining subscribers of that publish is aborted.
    #[error("Handler for event '{event}' (subscription {subscription}) failed: {source}")]
    Handler {
        event: String,
        subscription: SubscriptionId,
        #[source]
        source: BoxError,
    },
}

/// Result type alias for pub/sub operations
pub type Result<T> = std::result::Result<T, PubSubError>;
