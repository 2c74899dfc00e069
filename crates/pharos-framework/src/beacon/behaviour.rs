//! Installation strategies for cubes.
//!
//! A [`Behaviour`] wires a loaded module's cubes into something that runs
//! them and unwires them on unload. [`BusBehaviour`] subscribes listener
//! cubes on an [`EventBus`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::cube::{Cube, CubeId, Schema};
use crate::bus::{EventBus, Subscription, SubscriptionId};
use crate::error::BoxError;

/// Allocates and releases cubes.
///
/// `allocate` is called once per cube when its module finishes loading,
/// `release` once per cube when the module is uninstalled.
pub trait Behaviour: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn allocate(&self, cube: &Cube) -> Result<(), BoxError>;

    fn release(&self, cube: &Cube) -> Result<(), BoxError>;
}

/// Subscribes listener cubes on an event bus.
pub struct BusBehaviour {
    bus: Arc<dyn EventBus>,
    subscriptions: Mutex<HashMap<CubeId, SubscriptionId>>,
}

impl BusBehaviour {
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self {
            bus,
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    /// Number of cubes currently subscribed through this behaviour.
    pub fn allocated(&self) -> usize {
        self.subscriptions.lock().len()
    }
}

impl Behaviour for BusBehaviour {
    fn name(&self) -> &str {
        "bus"
    }

    fn allocate(&self, cube: &Cube) -> Result<(), BoxError> {
        let Schema::Listener(schema) = cube.schema();
        let mut subscriptions = self.subscriptions.lock();
        if subscriptions.contains_key(&cube.id()) {
            return Err(format!("{} is already allocated", cube.id()).into());
        }

        let id = self.bus.subscribe(Subscription {
            name: schema.name.clone(),
            events: schema.events.clone(),
            priority: schema.priority,
            matchers: schema.matchers.clone(),
            providers: schema.providers.clone(),
            listener: cube.listener().clone(),
        });
        trace!(cube = %cube.id(), subscription = %id, "Cube allocated");
        subscriptions.insert(cube.id(), id);
        Ok(())
    }

    fn release(&self, cube: &Cube) -> Result<(), BoxError> {
        let id = self
            .subscriptions
            .lock()
            .remove(&cube.id())
            .ok_or_else(|| format!("{} was not allocated", cube.id()))?;

        if !self.bus.dispose(id) {
            return Err(format!("subscription {id} of {} was already disposed", cube.id()).into());
        }
        trace!(cube = %cube.id(), subscription = %id, "Cube released");
        Ok(())
    }
}

impl std::fmt::Debug for BusBehaviour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusBehaviour")
            .field("allocated", &self.allocated())
            .finish()
    }
}
