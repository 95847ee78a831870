//! The pub/sub registry
//!
//! `PubSub` owns a table from event name to an ordered list of subscribers.
//! Delivery follows insertion order. A publish iterates a snapshot of the
//! subscriber ids taken when it starts, so handlers may subscribe,
//! unsubscribe or publish re-entrantly: subscribers removed mid-pass are
//! skipped, subscribers added mid-pass wait for the next publish.
//!
//! The table lock is never held while a handler runs or across an `.await`.
//!
//! ## Failure policy
//!
//! The two publish paths deliberately differ. `publish` returns the first
//! handler error as `PubSubError::Handler` and stops delivering; panics
//! unwind to the caller. `publish_async` catches handler errors and panics,
//! reports them through the log sink (when logs are enabled) and resolves
//! to `false`.

use crate::config::{EventCatalog, PubSubConfig};
use crate::error::{BoxError, PubSubError, Result};
use crate::handler::{self, ErasedHandler, Handler, HandlerResult, IntoHandlerResult};
use crate::history::History;
use crate::sink::{LogSink, TracingSink};
use crate::subscription::Unsubscribe;
use crate::types::{HistoryEntry, PublishAsyncOptions, SubscriptionId, Topic};
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) const MISSING_EVENTS_MSG: &str =
    "ERROR in PubSub: Events were not passed when initializing class";

pub(crate) const HISTORY_DISABLED_MSG: &str = "logHistory() will log empty array, because keepHistory param was not enabled while instantiating PubSub. Enable keepHistory first";

/// A table entry; publishes iterate clones taken when they start
#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    once_only: bool,
    handler: ErasedHandler,
}

#[derive(Default)]
struct EventTable {
    events: HashMap<String, Vec<Subscriber>>,
    last_id: u64,
}

impl EventTable {
    fn next_id(&mut self) -> SubscriptionId {
        self.last_id += 1;
        SubscriptionId(self.last_id)
    }
}

pub(crate) struct Inner {
    config: PubSubConfig,
    sink: Arc<dyn LogSink>,
    table: Mutex<EventTable>,
    history: History,
}

impl Inner {
    fn table(&self) -> MutexGuard<'_, EventTable> {
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Take a subscription out of the table by id
    ///
    /// The entry is returned so it is dropped after the lock is released:
    /// values captured by its handler may touch the registry when dropped.
    fn take(&self, event: &str, id: SubscriptionId) -> Option<Subscriber> {
        let mut table = self.table();
        let subs = table.events.get_mut(event)?;
        let index = subs.iter().position(|s| s.id == id)?;
        Some(subs.remove(index))
    }

    /// Remove a subscription by id, returning whether it was present
    fn remove(&self, event: &str, id: SubscriptionId) -> bool {
        self.take(event, id).is_some()
    }

    pub(crate) fn unsubscribe(&self, event: &str, id: SubscriptionId) -> bool {
        let removed = self.remove(event, id);
        if removed {
            tracing::debug!(event = %event, subscription = %id, "Unsubscribed");
            self.history
                .record(format!("Unsubscribed from event: {}", event));
        }
        removed
    }

    pub(crate) fn contains(&self, event: &str, id: SubscriptionId) -> bool {
        self.table()
            .events
            .get(event)
            .is_some_and(|subs| subs.iter().any(|s| s.id == id))
    }
}

/// In-process publish/subscribe registry
///
/// Cheap to clone; clones share the same subscribers and history.
#[derive(Clone)]
pub struct PubSub {
    inner: Arc<Inner>,
}

impl PubSub {
    /// Create a registry that reports through `tracing`
    pub fn new(config: PubSubConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    /// Create a registry with a custom log sink
    pub fn with_sink(config: PubSubConfig, sink: Arc<dyn LogSink>) -> Self {
        if config.events.is_none() {
            sink.error(MISSING_EVENTS_MSG);
        }

        let history = History::new(config.keep_history);
        Self {
            inner: Arc::new(Inner {
                config,
                sink,
                table: Mutex::new(EventTable::default()),
                history,
            }),
        }
    }

    /// The configuration this registry was built with
    pub fn config(&self) -> &PubSubConfig {
        &self.inner.config
    }

    /// The configured event catalog, if any
    pub fn known_events(&self) -> Option<&EventCatalog> {
        self.inner.config.events.as_ref()
    }

    // ─── Subscribe ───────────────────────────────────────────────

    /// Subscribe a handler to every publish of `topic`
    ///
    /// Returns a handle that removes exactly this subscription.
    pub fn subscribe<T, F, R>(&self, topic: &Topic<T>, handler: F) -> Unsubscribe
    where
        T: 'static,
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        let id = self.insert(topic.name(), Handler::from_fn(handler), false);
        self.unsubscribe_handle(topic.name(), id)
    }

    /// Subscribe an async handler to every publish of `topic`
    ///
    /// Each invocation receives its own clone of the payload.
    pub fn subscribe_async<T, F, Fut>(&self, topic: &Topic<T>, handler: F) -> Unsubscribe
    where
        T: 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoHandlerResult,
    {
        let id = self.insert(topic.name(), Handler::from_async_fn(handler), false);
        self.unsubscribe_handle(topic.name(), id)
    }

    /// Subscribe a handler for the next publish of `topic` only
    pub fn subscribe_once<T, F, R>(&self, topic: &Topic<T>, handler: F)
    where
        T: 'static,
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        self.insert(topic.name(), Handler::from_fn(handler), true);
    }

    /// Subscribe an async handler for the next publish of `topic` only
    pub fn subscribe_once_async<T, F, Fut>(&self, topic: &Topic<T>, handler: F)
    where
        T: 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoHandlerResult,
    {
        self.insert(topic.name(), Handler::from_async_fn(handler), true);
    }

    fn insert<T: 'static>(
        &self,
        event: &str,
        handler: Handler<T>,
        once_only: bool,
    ) -> SubscriptionId {
        let id = {
            let mut table = self.inner.table();
            let id = table.next_id();
            table
                .events
                .entry(event.to_string())
                .or_default()
                .push(Subscriber {
                    id,
                    once_only,
                    handler: handler::erase(handler),
                });
            id
        };

        if self
            .known_events()
            .is_some_and(|catalog| !catalog.contains(event))
        {
            tracing::debug!(event = %event, "Subscribed to event missing from catalog");
        }
        tracing::debug!(event = %event, subscription = %id, once_only, "Subscribed");

        if once_only {
            self.inner
                .history
                .record(format!("subscribed for one publish only for event: {}", event));
        } else {
            self.inner
                .history
                .record(format!("subscribed for event: {}", event));
        }
        id
    }

    fn unsubscribe_handle(&self, event: &str, id: SubscriptionId) -> Unsubscribe {
        Unsubscribe::new(event, id, Arc::downgrade(&self.inner))
    }

    // ─── Publish ─────────────────────────────────────────────────

    /// Invoke every subscriber of `topic` with `data`, in subscription order
    ///
    /// An event with no subscribers is not an error. The first handler
    /// error aborts delivery to the remaining subscribers and is returned.
    /// Async handlers are started on the current tokio runtime and not
    /// awaited.
    pub fn publish<T>(&self, topic: &Topic<T>, data: T) -> Result<()>
    where
        T: Clone + Serialize + Send + Sync + 'static,
    {
        let event = topic.name();
        let Some(pending) = self.snapshot(event) else {
            self.notify_no_listeners(event);
            return Ok(());
        };

        for entry in pending {
            let Some(handler) = self.claim::<T>(event, &entry) else {
                continue;
            };
            match handler {
                Handler::Sync(f) => f(&data).map_err(|source| PubSubError::Handler {
                    event: event.to_string(),
                    subscription: entry.id,
                    source,
                })?,
                Handler::Async(f) => self.spawn_detached(event, entry.id, f(data.clone())),
            }
        }

        self.inner
            .history
            .record_with_data(format!("{} event published with data:", event), &data);
        Ok(())
    }

    /// Publish asynchronously, awaiting each subscriber in turn
    ///
    /// Resolves to `false` when the event has no subscribers or a handler
    /// failed; `true` otherwise.
    pub async fn publish_async<T>(&self, topic: &Topic<T>, data: T) -> bool
    where
        T: Clone + Serialize + Send + Sync + 'static,
    {
        self.publish_async_with_options(topic, data, &PublishAsyncOptions::default())
            .await
    }

    /// Publish asynchronously with explicit options
    ///
    /// Subscribers are always invoked sequentially in subscription order.
    /// With `await_all_subscribers_finish` disabled, async handler futures
    /// are spawned and the call resolves once every handler was invoked;
    /// failures inside spawned work no longer affect the result.
    pub async fn publish_async_with_options<T>(
        &self,
        topic: &Topic<T>,
        data: T,
        opts: &PublishAsyncOptions,
    ) -> bool
    where
        T: Clone + Serialize + Send + Sync + 'static,
    {
        let event = topic.name();
        let Some(pending) = self.snapshot(event) else {
            self.notify_no_listeners(event);
            return false;
        };

        match self
            .deliver_async(event, pending, &data, opts.await_all_subscribers_finish)
            .await
        {
            Ok(()) => {
                self.inner.history.record_with_data(
                    format!("{} event published asynchronously with data:", event),
                    &data,
                );
                true
            }
            Err(e) => {
                if self.inner.config.enable_logs {
                    self.inner.sink.error(&format!(
                        "Error while publishing event {} asynchronously: {}",
                        event, e
                    ));
                }
                false
            }
        }
    }

    async fn deliver_async<T>(
        &self,
        event: &str,
        pending: Vec<Subscriber>,
        data: &T,
        await_all: bool,
    ) -> Result<()>
    where
        T: Clone + Send + Sync + 'static,
    {
        for entry in pending {
            let Some(handler) = self.claim::<T>(event, &entry) else {
                continue;
            };
            let failed = |source| PubSubError::Handler {
                event: event.to_string(),
                subscription: entry.id,
                source,
            };

            match handler {
                Handler::Sync(f) => catch_invoke(|| f(data)).and_then(|r| r).map_err(failed)?,
                Handler::Async(f) => {
                    let fut = catch_invoke(|| f(data.clone())).map_err(failed)?;
                    if await_all {
                        settle(fut).await.map_err(failed)?;
                    } else {
                        self.spawn_detached(event, entry.id, fut);
                    }
                }
            }
        }
        Ok(())
    }

    /// Ids and handlers of the current subscribers, or `None` when there
    /// are none
    fn snapshot(&self, event: &str) -> Option<Vec<Subscriber>> {
        let table = self.inner.table();
        let subs = table.events.get(event).filter(|subs| !subs.is_empty())?;
        Some(subs.to_vec())
    }

    /// Resolve a snapshot entry into a handler that should run now
    ///
    /// Skips entries removed since the snapshot was taken and entries whose
    /// payload type differs from `T`. One-shot entries are removed here, so
    /// concurrent publishes cannot both deliver to them.
    fn claim<T: 'static>(&self, event: &str, entry: &Subscriber) -> Option<Handler<T>> {
        let Some(handler) = handler::downcast::<T>(&entry.handler) else {
            tracing::warn!(
                event = %event,
                subscription = %entry.id,
                payload = std::any::type_name::<T>(),
                "Subscriber payload type does not match published payload, skipping"
            );
            return None;
        };

        if entry.once_only {
            if !self.inner.remove(event, entry.id) {
                return None;
            }
            self.inner.history.record(format!(
                "Unsubscribed from event: {} after one publish",
                event
            ));
        } else if !self.inner.contains(event, entry.id) {
            return None;
        }
        Some(handler)
    }

    fn notify_no_listeners(&self, event: &str) {
        if self.inner.config.enable_logs {
            self.inner
                .sink
                .info(&format!("No listeners found for eventName: {}", event));
        }
    }

    // ─── Clear & introspection ───────────────────────────────────

    /// Remove every subscriber of every event
    pub fn clear_all(&self) {
        let cleared = std::mem::take(&mut self.inner.table().events);
        tracing::debug!(events = cleared.len(), "All subscribers cleared");
        self.inner.history.record("All subscribers cleared");
    }

    /// Remove every subscriber of `event`
    pub fn clear_event(&self, event: impl AsRef<str>) {
        let event = event.as_ref();
        // Dropped at the end of this call, after the guard is released
        let removed = self.inner.table().events.remove(event);

        match removed {
            Some(subs) => {
                tracing::debug!(event = %event, count = subs.len(), "Event subscribers cleared");
                self.inner
                    .history
                    .record(format!("All subscribers cleared for event {}", event));
            }
            None => self.notify_no_listeners(event),
        }
    }

    /// Whether `event` has at least one live subscriber
    pub fn has_subscribers(&self, event: impl AsRef<str>) -> bool {
        self.count_subscribers(event) > 0
    }

    /// Number of live subscribers of `event`
    pub fn count_subscribers(&self, event: impl AsRef<str>) -> usize {
        self.inner
            .table()
            .events
            .get(event.as_ref())
            .map_or(0, Vec::len)
    }

    /// Event names currently present in the table, sorted
    ///
    /// Includes events whose subscribers were all unsubscribed; only
    /// `clear_event` and `clear_all` remove names.
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.table().events.keys().cloned().collect();
        names.sort();
        names
    }

    // ─── History ─────────────────────────────────────────────────

    /// Snapshot of the recorded history (empty when history is disabled)
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.inner.history.snapshot()
    }

    /// Emit the recorded history through the log sink
    ///
    /// Reports an error first when history was never enabled.
    pub fn log_history(&self) {
        if !self.inner.history.is_enabled() {
            self.inner.sink.error(HISTORY_DISABLED_MSG);
        }

        match serde_json::to_string(&self.history()) {
            Ok(dump) => self.inner.sink.info(&dump),
            Err(e) => tracing::warn!(error = %e, "Failed to render history"),
        }
    }

    /// Run handler work in the background on the current tokio runtime
    ///
    /// Without a runtime the work is never polled; the lost delivery is
    /// reported through the log sink when logs are enabled.
    fn spawn_detached(
        &self,
        event: &str,
        id: SubscriptionId,
        fut: BoxFuture<'static, HandlerResult>,
    ) {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let event = event.to_string();
                runtime.spawn(async move {
                    if let Err(e) = fut.await {
                        tracing::warn!(
                            event = %event,
                            subscription = %id,
                            error = %e,
                            "Detached handler failed"
                        );
                    }
                });
            }
            Err(_) => {
                tracing::warn!(
                    event = %event,
                    subscription = %id,
                    "No tokio runtime available, async handler work dropped"
                );
                if self.inner.config.enable_logs {
                    self.inner.sink.error(&format!(
                        "No async runtime available, async handler for event {} was not run",
                        event
                    ));
                }
            }
        }
    }
}

impl fmt::Debug for PubSub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.inner.table();
        let subscribers: usize = table.events.values().map(Vec::len).sum();
        f.debug_struct("PubSub")
            .field("config", &self.inner.config)
            .field("events", &table.events.len())
            .field("subscribers", &subscribers)
            .finish()
    }
}

/// Invoke a handler, converting a panic into an error
fn catch_invoke<R>(f: impl FnOnce() -> R) -> std::result::Result<R, BoxError> {
    std::panic::catch_unwind(AssertUnwindSafe(f)).map_err(handler::panic_error)
}

/// Await a handler future, converting a panic into an error
async fn settle(fut: BoxFuture<'static, HandlerResult>) -> HandlerResult {
    AssertUnwindSafe(fut)
        .catch_unwind()
        .await
        .map_err(handler::panic_error)
        .and_then(|r| r)
}
