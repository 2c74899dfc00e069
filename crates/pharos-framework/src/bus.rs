//! Event bus.
//!
//! The [`EventBus`] trait is the seam between the module registry and
//! whatever actually invokes listeners. [`LocalBus`] is the in-process
//! implementation used by the runtime.
//!
//! # Dispatch
//!
//! When an event is published:
//!
//! 1. Subscriptions for the event's kind are snapshotted in priority order
//!    (lower value first, ties in subscription order)
//! 2. Each listener gets its own [`DispatchContext`]
//! 3. The listener's matchers run in order; a miss skips only this listener
//! 4. The listener's providers populate the context
//! 5. The listener runs; [`Propagation::Stop`] or
//!    [`DispatchContext::stop_propagation`] ends the publication
//!
//! Listener failures are logged and counted in the [`PublishReport`]; they
//! never abort the publication.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tower::ServiceExt;
use tracing::{Instrument, Level, debug, error, span, trace};

use pharos_core::{Event, EventKind};

use crate::context::{BaseContext, DispatchContext};
use crate::error::{BusError, ListenerSkipped};
use crate::handler::{BoxedListener, Propagation};
use crate::matcher::Matcher;
use crate::provider::Provider;

/// Priority given to listeners that do not set one.
pub const DEFAULT_PRIORITY: i32 = 16;

/// Identifies a subscription on a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Everything the bus needs to invoke one listener.
#[derive(Clone)]
pub struct Subscription {
    pub name: String,
    pub events: Vec<EventKind>,
    pub priority: i32,
    pub matchers: Vec<Matcher>,
    pub providers: Vec<Provider>,
    pub listener: BoxedListener,
}

impl Subscription {
    pub fn new(name: impl Into<String>, events: Vec<EventKind>, listener: BoxedListener) -> Self {
        Self {
            name: name.into(),
            events,
            priority: DEFAULT_PRIORITY,
            matchers: Vec::new(),
            providers: Vec::new(),
            listener,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn matcher(mut self, matcher: Matcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn provider(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("name", &self.name)
            .field("events", &self.events)
            .field("priority", &self.priority)
            .field("matchers", &self.matchers)
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}

/// Outcome of one publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub event: EventKind,
    /// Listeners whose body ran to completion.
    pub invoked: usize,
    /// Listeners skipped by a matcher or a failed extraction.
    pub skipped: usize,
    /// Listeners that returned an error.
    pub failed: usize,
    /// Whether a listener stopped propagation.
    pub stopped: bool,
}

impl PublishReport {
    fn new(event: EventKind) -> Self {
        Self {
            event,
            invoked: 0,
            skipped: 0,
            failed: 0,
            stopped: false,
        }
    }
}

// ============================================================================
// EventBus
// ============================================================================

/// Registration and delivery of events.
#[async_trait]
pub trait EventBus: Send + Sync + 'static {
    fn subscribe(&self, subscription: Subscription) -> SubscriptionId;

    /// Removes a subscription. Returns `false` if it was not registered.
    fn dispose(&self, id: SubscriptionId) -> bool;

    async fn publish(&self, event: Event) -> Result<PublishReport, BusError>;
}

// ============================================================================
// LocalBus
// ============================================================================

struct Entry {
    id: SubscriptionId,
    name: Arc<str>,
    events: Vec<EventKind>,
    priority: i32,
    matchers: Vec<Matcher>,
    providers: Vec<Provider>,
    listener: BoxedListener,
}

/// In-process bus running listeners sequentially on the publishing task.
#[derive(Default)]
pub struct LocalBus {
    entries: RwLock<Vec<Arc<Entry>>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Rejects all further publications.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn dispatch(&self, entries: Vec<Arc<Entry>>, event: Event) -> PublishReport {
        let base = Arc::new(BaseContext::new(event));
        let mut report = PublishReport::new(base.event().kind());

        for entry in entries {
            if !base.is_propagating() {
                break;
            }

            let ctx = Arc::new(DispatchContext::new(base.clone(), entry.name.clone()));

            if entry.matchers.iter().any(|m| m.apply(&ctx).is_err()) {
                trace!(listener = %entry.name, "Matcher did not match, skipping listener");
                report.skipped += 1;
                continue;
            }
            for provider in &entry.providers {
                provider.provide(&ctx);
            }

            match entry.listener.clone().oneshot(ctx).await {
                Ok(Propagation::Continue) => report.invoked += 1,
                Ok(Propagation::Stop) => {
                    report.invoked += 1;
                    base.stop_propagation();
                }
                Err(e) if e.is::<ListenerSkipped>() => report.skipped += 1,
                Err(e) => {
                    error!(
                        listener = %entry.name,
                        subscription = %entry.id,
                        error = %e,
                        "Listener failed"
                    );
                    report.failed += 1;
                }
            }
        }

        report.stopped = !base.is_propagating();
        if report.stopped {
            debug!("Propagation stopped");
        }
        report
    }
}

#[async_trait]
impl EventBus for LocalBus {
    fn subscribe(&self, subscription: Subscription) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = Arc::new(Entry {
            id,
            name: Arc::from(subscription.name),
            events: subscription.events,
            priority: subscription.priority,
            matchers: subscription.matchers,
            providers: subscription.providers,
            listener: subscription.listener,
        });

        let mut entries = self.entries.write();
        let at = entries.partition_point(|e| e.priority <= entry.priority);
        trace!(subscription = %id, listener = %entry.name, priority = entry.priority, "Subscribed");
        entries.insert(at, entry);
        id
    }

    fn dispose(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        before != entries.len()
    }

    async fn publish(&self, event: Event) -> Result<PublishReport, BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }

        let kind = event.kind();
        let snapshot: Vec<Arc<Entry>> = self
            .entries
            .read()
            .iter()
            .filter(|e| e.events.contains(&kind))
            .cloned()
            .collect();

        let span = span!(Level::DEBUG, "publish", event = %kind, candidates = snapshot.len());
        let report = self.dispatch(snapshot, event).instrument(span).await;
        Ok(report)
    }
}

impl fmt::Debug for LocalBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBus")
            .field("subscriptions", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Text;
    use crate::handler::into_listener;
    use parking_lot::Mutex;
    use pharos_core::{ApplicationReady, C2CMessage, Content};

    fn message(text: &str) -> Event {
        Event::from(C2CMessage {
            content: Content::from(text),
            ..Default::default()
        })
    }

    fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> BoxedListener {
        let log = log.clone();
        into_listener(move || {
            let log = log.clone();
            async move { log.lock().push(name.to_string()) }
        })
    }

    #[tokio::test]
    async fn test_priority_then_registration_order() {
        let bus = LocalBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let kinds = vec![EventKind::C2CMessage];

        bus.subscribe(
            Subscription::new("late", kinds.clone(), recorder(&log, "late")).priority(20),
        );
        bus.subscribe(Subscription::new("a", kinds.clone(), recorder(&log, "a")));
        bus.subscribe(
            Subscription::new("early", kinds.clone(), recorder(&log, "early")).priority(1),
        );
        bus.subscribe(Subscription::new("b", kinds.clone(), recorder(&log, "b")));

        let report = bus.publish(message("hi")).await.unwrap();
        assert_eq!(report.invoked, 4);
        assert_eq!(*log.lock(), ["early", "a", "b", "late"]);
    }

    #[tokio::test]
    async fn test_matcher_miss_skips_only_that_listener() {
        let bus = LocalBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let kinds = vec![EventKind::C2CMessage];

        bus.subscribe(
            Subscription::new("hello", kinds.clone(), recorder(&log, "hello"))
                .matcher(Matcher::prefix(["!hello"])),
        );
        bus.subscribe(
            Subscription::new("ping", kinds.clone(), recorder(&log, "ping"))
                .matcher(Matcher::keyword("ping")),
        );

        let report = bus.publish(message("say ping")).await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.invoked, 1);
        assert_eq!(*log.lock(), ["ping"]);
    }

    #[tokio::test]
    async fn test_stop_and_failures() {
        let bus = LocalBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let kinds = vec![EventKind::C2CMessage];

        bus.subscribe(Subscription::new(
            "fails",
            kinds.clone(),
            into_listener(|| async { Err::<(), _>("nope") }),
        ));
        bus.subscribe(
            Subscription::new(
                "stops",
                kinds.clone(),
                into_listener(|Text(text): Text| async move {
                    assert_eq!(text, "x");
                    Propagation::Stop
                }),
            )
            .matcher(Matcher::command("stop")),
        );
        bus.subscribe(Subscription::new("never", kinds, recorder(&log, "never")));

        let report = bus.publish(message("/stop x")).await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.invoked, 1);
        assert!(report.stopped);
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_dispose_and_close() {
        let bus = LocalBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let id = bus.subscribe(Subscription::new(
            "ready",
            vec![EventKind::ApplicationReady],
            recorder(&log, "ready"),
        ));

        assert!(bus.dispose(id));
        assert!(!bus.dispose(id));
        let report = bus.publish(Event::from(ApplicationReady)).await.unwrap();
        assert_eq!(report.invoked, 0);

        bus.close();
        assert!(matches!(
            bus.publish(Event::from(ApplicationReady)).await,
            Err(BusError::Closed)
        ));
    }
}
