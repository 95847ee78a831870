//! # a3s-pubsub
//!
//! Typed in-process publish/subscribe registry for the A3S ecosystem.
//!
//! ## Overview
//!
//! `a3s-pubsub` lets components register handlers under named events and
//! broadcast payloads to them within a single process. Each event is a
//! [`Topic<T>`] binding the name to its payload type, so publishers and
//! subscribers are checked against each other at compile time.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_pubsub::{EventCatalog, PubSub, PubSubConfig, Topic};
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! const RATE_CHANGED: Topic<f64> = Topic::new("forex.rate_changed");
//!
//! # fn main() -> a3s_pubsub::Result<()> {
//! let events = EventCatalog::new().with_event("forex.rate_changed", serde_json::json!(7.35));
//! let pubsub = PubSub::new(PubSubConfig::new(events).with_history(true));
//!
//! let last = Arc::new(AtomicU64::new(0));
//! let seen = last.clone();
//! let unsubscribe = pubsub.subscribe(&RATE_CHANGED, move |rate: &f64| {
//!     seen.store(rate.to_bits(), Ordering::SeqCst);
//! });
//!
//! pubsub.publish(&RATE_CHANGED, 7.3521)?;
//! assert_eq!(f64::from_bits(last.load(Ordering::SeqCst)), 7.3521);
//!
//! unsubscribe.unsubscribe();
//! assert!(!pubsub.has_subscribers(&RATE_CHANGED));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **PubSub**: registry with subscribe, publish, clear, introspect
//! - **Unsubscribe**: idempotent capability returned by `subscribe`
//! - **LogSink**: pluggable diagnostics (`tracing` by default)
//! - **HistoryEntry**: optional ordered audit trail

pub mod config;
pub mod error;
pub mod handler;
mod history;
pub mod registry;
pub mod sink;
pub mod subscription;
pub mod types;

// Re-export core types
pub use config::{EventCatalog, PubSubConfig};
pub use error::{BoxError, PubSubError, Result};
pub use handler::{HandlerResult, IntoHandlerResult};
pub use registry::PubSub;
pub use sink::{LogLevel, LogRecord, LogSink, MemoryLogSink, TracingSink};
pub use subscription::Unsubscribe;
pub use types::{HistoryEntry, PublishAsyncOptions, SubscriptionId, Topic};
