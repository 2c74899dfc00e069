//! Listener records.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use pharos_core::EventKind;

use crate::handler::BoxedListener;
use crate::matcher::Matcher;
use crate::provider::Provider;

static NEXT_CUBE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique id of a [`Cube`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CubeId(u64);

impl CubeId {
    pub(crate) fn next() -> Self {
        Self(NEXT_CUBE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CubeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cube#{}", self.0)
    }
}

/// How a cube is meant to be wired. Only listeners exist so far.
#[derive(Debug, Clone)]
pub enum Schema {
    Listener(ListenerSchema),
}

/// Declarative registration record of an event listener.
#[derive(Debug, Clone)]
pub struct ListenerSchema {
    pub name: String,
    pub events: Vec<EventKind>,
    /// Lower runs first.
    pub priority: i32,
    pub matchers: Vec<Matcher>,
    pub providers: Vec<Provider>,
}

/// A listener together with its schema, owned by exactly one module.
#[derive(Clone)]
pub struct Cube {
    pub(crate) id: CubeId,
    pub(crate) schema: Schema,
    pub(crate) listener: BoxedListener,
}

impl Cube {
    pub fn new(schema: Schema, listener: BoxedListener) -> Self {
        Self {
            id: CubeId::next(),
            schema,
            listener,
        }
    }

    pub fn id(&self) -> CubeId {
        self.id
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn listener(&self) -> &BoxedListener {
        &self.listener
    }

    /// The listener's name, used in logs.
    pub fn name(&self) -> &str {
        match &self.schema {
            Schema::Listener(schema) => &schema.name,
        }
    }
}

impl fmt::Debug for Cube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cube")
            .field("id", &self.id)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}
