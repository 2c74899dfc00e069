//! Listener functions and their tower service wrapper.
//!
//! The [`Handler`] trait is implemented for async functions that:
//! - take 0-8 parameters implementing [`FromContext`]
//! - return a type implementing [`ListenerResponse`]
//!
//! ```rust,ignore
//! // Runs, lets the event propagate.
//! async fn log_all(event: Event) {
//!     tracing::info!(event = event.event_name());
//! }
//!
//! // Stops every lower-priority listener.
//! async fn exclusive(Text(rest): Text) -> Propagation {
//!     Propagation::Stop
//! }
//!
//! // Errors are logged by the bus and count as failures.
//! async fn fallible(event: EventContext<C2CMessage>) -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```
//!
//! [`ListenerService`] adapts any handler into a
//! `tower::Service<Arc<DispatchContext>>` so the bus can store listeners of
//! different signatures behind one [`BoxedListener`] type.

use std::marker::PhantomData;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use tower::Service;
use tower::util::BoxCloneSyncService;
use tracing::trace;

use crate::context::DispatchContext;
use crate::error::{BoxError, ListenerSkipped};
use crate::extractor::FromContext;

// ============================================================================
// Propagation
// ============================================================================

/// What happens to the event after a listener ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Propagation {
    /// Lower-priority listeners still receive the event.
    #[default]
    Continue,
    /// No further listener receives the event.
    Stop,
}

/// A type that can be returned from a listener.
pub trait ListenerResponse: Send {
    fn into_propagation(self) -> Result<Propagation, BoxError>;
}

impl ListenerResponse for () {
    fn into_propagation(self) -> Result<Propagation, BoxError> {
        Ok(Propagation::Continue)
    }
}

impl ListenerResponse for Propagation {
    fn into_propagation(self) -> Result<Propagation, BoxError> {
        Ok(self)
    }
}

impl<T, E> ListenerResponse for Result<T, E>
where
    T: ListenerResponse,
    E: Into<BoxError> + Send,
{
    fn into_propagation(self) -> Result<Propagation, BoxError> {
        match self {
            Ok(t) => t.into_propagation(),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// An async function usable as an event listener.
///
/// Returns [`ListenerSkipped`] when one of the parameters cannot be
/// extracted for the current event.
#[async_trait]
pub trait Handler<T>: Clone + Send + Sync + 'static {
    async fn call(self, ctx: Arc<DispatchContext>) -> Result<Propagation, BoxError>;
}

macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_variables)]
        #[async_trait]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: ListenerResponse + 'static,
            $( $ty: FromContext + Send + 'static, )*
        {
            async fn call(self, ctx: Arc<DispatchContext>) -> Result<Propagation, BoxError> {
                $(
                    let $ty = match $ty::from_context(&ctx) {
                        Ok(value) => value,
                        Err(e) => {
                            trace!(
                                listener = ctx.listener(),
                                error = %e,
                                "Extraction failed, skipping listener"
                            );
                            return Err(ListenerSkipped.into());
                        }
                    };
                )*

                (self)($($ty,)*).await.into_propagation()
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);

// ============================================================================
// ListenerService
// ============================================================================

/// A tower [`Service`] that calls a single listener function.
pub struct ListenerService<H, T> {
    handler: H,
    _marker: PhantomData<fn() -> T>,
}

impl<H, T> ListenerService<H, T> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

impl<H: Clone, T> Clone for ListenerService<H, T> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            _marker: PhantomData,
        }
    }
}

impl<H, T> Service<Arc<DispatchContext>> for ListenerService<H, T>
where
    H: Handler<T>,
    T: 'static,
{
    type Response = Propagation;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Propagation, BoxError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, ctx: Arc<DispatchContext>) -> Self::Future {
        self.handler.clone().call(ctx).boxed()
    }
}

/// A type-erased listener, as stored by the bus.
pub type BoxedListener = BoxCloneSyncService<Arc<DispatchContext>, Propagation, BoxError>;

/// Converts a listener function into a [`BoxedListener`].
pub fn into_listener<H, T>(handler: H) -> BoxedListener
where
    H: Handler<T>,
    T: 'static,
{
    BoxCloneSyncService::new(ListenerService::new(handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Text;
    use pharos_core::{ApplicationReady, Event, EventContext, GroupMessage};
    use tower::ServiceExt;

    fn ready() -> Arc<DispatchContext> {
        Arc::new(DispatchContext::for_event(Event::from(ApplicationReady)))
    }

    #[tokio::test]
    async fn test_unit_listener_continues() {
        let listener = into_listener(|| async {});
        let result = listener.oneshot(ready()).await.unwrap();
        assert_eq!(result, Propagation::Continue);
    }

    #[tokio::test]
    async fn test_failed_extraction_skips() {
        let listener = into_listener(|_: EventContext<GroupMessage>| async {});
        let err = listener.oneshot(ready()).await.unwrap_err();
        assert!(err.is::<ListenerSkipped>());
    }

    #[tokio::test]
    async fn test_error_response_is_reported() {
        let listener = into_listener(|_: Event| async { Err::<(), _>("boom") });
        let err = listener.oneshot(ready()).await.unwrap_err();
        assert!(!err.is::<ListenerSkipped>());
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn test_stop_response_and_named_value() {
        let ctx = ready();
        ctx.insert_named(Text::NAME, String::from("rest"));
        let listener = into_listener(|Text(text): Text| async move {
            assert_eq!(text, "rest");
            Propagation::Stop
        });
        assert_eq!(listener.oneshot(ctx).await.unwrap(), Propagation::Stop);
    }
}
