//! Dispatch context for the Pharos framework.
//!
//! Two context types model how one event travels through its listeners:
//!
//! - [`BaseContext`]: the **shared** base for one publication. A single
//!   `Arc<BaseContext>` is created per published event. It holds the event
//!   and the propagation flag.
//!
//! - [`DispatchContext`]: the **per-listener** context. Every listener gets
//!   a fresh one, so values injected by one listener's matchers and
//!   providers are never visible to another listener. Calling
//!   [`stop_propagation`](DispatchContext::stop_propagation) writes through
//!   to the shared base and stops the remaining, lower-priority listeners.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use pharos_core::{Event, Target};

type ValueMap<K> = Mutex<HashMap<K, Box<dyn Any + Send + Sync>>>;

// =============================================================================
// BaseContext (shared, one per publication)
// =============================================================================

/// The shared base context for a single event publication.
pub struct BaseContext {
    event: Event,
    /// Cleared by any listener that stops propagation.
    is_propagating: AtomicBool,
}

impl BaseContext {
    pub fn new(event: Event) -> Self {
        Self {
            event,
            is_propagating: AtomicBool::new(true),
        }
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Returns `true` if the event is still propagating.
    pub fn is_propagating(&self) -> bool {
        self.is_propagating.load(Ordering::SeqCst)
    }

    pub fn stop_propagation(&self) {
        self.is_propagating.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for BaseContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseContext")
            .field("event", &self.event.event_name())
            .field("is_propagating", &self.is_propagating())
            .finish()
    }
}

// =============================================================================
// DispatchContext (per listener)
// =============================================================================

/// The context handed to one listener for one event.
///
/// Holds two isolated value stores: one keyed by type, one keyed by name.
/// Matchers and providers write into them before the listener runs, and
/// extractors read from them.
pub struct DispatchContext {
    base: Arc<BaseContext>,
    listener: Arc<str>,
    by_type: ValueMap<TypeId>,
    by_name: ValueMap<String>,
}

impl DispatchContext {
    pub fn new(base: Arc<BaseContext>, listener: Arc<str>) -> Self {
        Self {
            base,
            listener,
            by_type: Mutex::new(HashMap::new()),
            by_name: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a standalone context for `event`, mostly useful in tests.
    pub fn for_event(event: Event) -> Self {
        Self::new(Arc::new(BaseContext::new(event)), Arc::from("anonymous"))
    }

    // ─── Shared base delegation ───────────────────────────────────────────────

    pub fn event(&self) -> &Event {
        self.base.event()
    }

    /// The event's reply target, if it has one.
    pub fn target(&self) -> Option<Target> {
        self.base.event().target()
    }

    /// The text the matching pipeline works on.
    ///
    /// Events without content are matched against the empty string.
    pub fn text(&self) -> &str {
        self.base.event().content().map_or("", |c| c.as_str())
    }

    /// Stops propagation of this event to subsequent listeners.
    pub fn stop_propagation(&self) {
        self.base.stop_propagation();
    }

    pub fn is_propagating(&self) -> bool {
        self.base.is_propagating()
    }

    /// The name of the listener this context belongs to.
    pub fn listener(&self) -> &str {
        &self.listener
    }

    // ─── Values keyed by type ─────────────────────────────────────────────────

    /// Stores a value keyed by its type. Subsequent calls overwrite.
    pub fn insert<T: Send + Sync + 'static>(&self, value: T) {
        self.by_type.lock().insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a cloned value by type.
    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        self.by_type
            .lock()
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    /// Returns `true` if a value of type `T` is stored.
    pub fn contains<T: 'static>(&self) -> bool {
        self.by_type.lock().contains_key(&TypeId::of::<T>())
    }

    // ─── Values keyed by name ─────────────────────────────────────────────────

    /// Binds a value to a name. Subsequent calls overwrite.
    pub fn insert_named<T: Send + Sync + 'static>(&self, name: impl Into<String>, value: T) {
        self.by_name.lock().insert(name.into(), Box::new(value));
    }

    /// Retrieves a cloned value by name.
    ///
    /// Returns `None` if nothing is bound to `name` or if the bound value is
    /// not a `T`.
    pub fn get_named<T: Clone + 'static>(&self, name: &str) -> Option<T> {
        self.by_name
            .lock()
            .get(name)
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }
}

impl std::fmt::Debug for DispatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchContext")
            .field("base", &self.base)
            .field("listener", &self.listener)
            .field("values", &self.by_type.lock().len())
            .field("names", &self.by_name.lock().keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Short type name used in logs.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharos_core::{C2CMessage, Content};

    fn ctx() -> DispatchContext {
        DispatchContext::for_event(Event::from(C2CMessage {
            content: Content::from("hello"),
            ..Default::default()
        }))
    }

    #[test]
    fn test_typed_and_named_values_are_separate() {
        let ctx = ctx();
        ctx.insert(42u32);
        ctx.insert_named("answer", String::from("forty-two"));

        assert_eq!(ctx.get::<u32>(), Some(42));
        assert_eq!(ctx.get::<String>(), None);
        assert_eq!(ctx.get_named::<String>("answer").as_deref(), Some("forty-two"));
        assert_eq!(ctx.get_named::<u32>("answer"), None);
    }

    #[test]
    fn test_stop_propagation_is_shared() {
        let base = Arc::new(BaseContext::new(Event::from(C2CMessage::default())));
        let first = DispatchContext::new(base.clone(), Arc::from("first"));
        let second = DispatchContext::new(base.clone(), Arc::from("second"));

        first.insert(1u8);
        first.stop_propagation();

        assert!(!second.is_propagating());
        assert!(!second.contains::<u8>());
    }

    #[test]
    fn test_text_of_message() {
        assert_eq!(ctx().text(), "hello");
    }
}
