//! Subscriber handlers
//!
//! Handlers are stored type-erased in the registry and recovered by payload
//! type at publish time. A handler may return `()` or `Result<(), E>`;
//! async handlers return a future resolving to either.

use crate::error::BoxError;
use futures::future::{BoxFuture, FutureExt};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;

/// Outcome of a single handler invocation
pub type HandlerResult = std::result::Result<(), BoxError>;

/// Conversion from a handler's return value into a `HandlerResult`
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> HandlerResult {
        Ok(())
    }
}

impl<E: Into<BoxError>> IntoHandlerResult for std::result::Result<(), E> {
    fn into_handler_result(self) -> HandlerResult {
        self.map_err(Into::into)
    }
}

type SyncFn<T> = dyn Fn(&T) -> HandlerResult + Send + Sync;
type AsyncFn<T> = dyn Fn(T) -> BoxFuture<'static, HandlerResult> + Send + Sync;

pub(crate) enum Handler<T> {
    Sync(Arc<SyncFn<T>>),
    Async(Arc<AsyncFn<T>>),
}

impl<T> Clone for Handler<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Sync(f) => Self::Sync(Arc::clone(f)),
            Self::Async(f) => Self::Async(Arc::clone(f)),
        }
    }
}

impl<T: 'static> Handler<T> {
    pub(crate) fn from_fn<F, R>(f: F) -> Self
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        Self::Sync(Arc::new(move |data: &T| f(data).into_handler_result()))
    }

    pub(crate) fn from_async_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoHandlerResult,
    {
        Self::Async(Arc::new(move |data: T| {
            f(data).map(IntoHandlerResult::into_handler_result).boxed()
        }))
    }
}

/// Type-erased handler as stored in the event table
pub(crate) type ErasedHandler = Arc<dyn Any + Send + Sync>;

pub(crate) fn erase<T: 'static>(handler: Handler<T>) -> ErasedHandler {
    Arc::new(handler)
}

/// Recover a handler for payload type `T`
pub(crate) fn downcast<T: 'static>(handler: &ErasedHandler) -> Option<Handler<T>> {
    (**handler).downcast_ref::<Handler<T>>().cloned()
}

/// Render a caught panic payload as an error
pub(crate) fn panic_error(payload: Box<dyn Any + Send>) -> BoxError {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("handler panicked: {}", detail).into()
}
