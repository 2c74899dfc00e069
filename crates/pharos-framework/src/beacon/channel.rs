//! Loaded modules and the ambient declaration API.
//!
//! While a module's setup function runs, a load frame for that module sits
//! on top of a thread-local stack. The free functions in this file
//! ([`listen`], [`export`], [`describe`], [`current_module`]) write into the
//! top frame, so setup code never has to carry a handle around:
//!
//! ```rust,ignore
//! fn setup() -> Result<(), BoxError> {
//!     describe(|meta| meta.description = "Replies to !hello".into())?;
//!     listen([EventKind::C2CMessage, EventKind::GroupMessage])
//!         .matcher(Matcher::prefix(["!hello"]))
//!         .handle(on_hello)?;
//!     Ok(())
//! }
//! ```
//!
//! A module requiring another module during its setup pushes a second
//! frame; the inner module's declarations go to the inner frame.
//!
//! Outside of a load every declaration fails with
//! [`BeaconError::NoActiveModuleContext`].

use std::any::{Any, type_name};
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use pharos_core::EventKind;

use super::Beacon;
use super::behaviour::Behaviour;
use super::cube::{Cube, CubeId, ListenerSchema, Schema};
use crate::bus::DEFAULT_PRIORITY;
use crate::error::{BeaconError, BeaconResult};
use crate::handler::{Handler, into_listener};
use crate::matcher::Matcher;
use crate::provider::Provider;

pub(crate) type Export = Arc<dyn Any + Send + Sync>;

// =============================================================================
// Metadata
// =============================================================================

/// Descriptive information a module may declare about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMetadata {
    pub name: String,
    pub description: String,
    pub version: String,
    pub authors: Vec<String>,
}

impl ModuleMetadata {
    fn for_module(module: &str) -> Self {
        Self {
            name: module.to_string(),
            description: String::new(),
            version: "0.0.1".to_string(),
            authors: Vec::new(),
        }
    }
}

// =============================================================================
// Channel
// =============================================================================

/// A loaded module.
pub struct Channel {
    module: String,
    metadata: ModuleMetadata,
    cubes: Vec<Cube>,
    export: Option<Export>,
    /// Behaviours that allocated the cubes, in allocation order.
    behaviours: Vec<Arc<dyn Behaviour>>,
}

impl Channel {
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn metadata(&self) -> &ModuleMetadata {
        &self.metadata
    }

    pub fn cubes(&self) -> &[Cube] {
        &self.cubes
    }

    pub fn export(&self) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.export.as_ref()
    }

    pub(crate) fn behaviours(&self) -> &[Arc<dyn Behaviour>] {
        &self.behaviours
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("module", &self.module)
            .field("metadata", &self.metadata)
            .field("cubes", &self.cubes.len())
            .field("exported", &self.export.is_some())
            .finish()
    }
}

// =============================================================================
// Load frames
// =============================================================================

pub(crate) struct LoadFrame {
    pub(crate) module: String,
    pub(crate) beacon: Arc<Beacon>,
    metadata: ModuleMetadata,
    cubes: Vec<Cube>,
    export: Option<Export>,
}

impl LoadFrame {
    pub(crate) fn cubes(&self) -> &[Cube] {
        &self.cubes
    }

    pub(crate) fn into_channel(self, behaviours: Vec<Arc<dyn Behaviour>>) -> Channel {
        Channel {
            module: self.module,
            metadata: self.metadata,
            cubes: self.cubes,
            export: self.export,
            behaviours,
        }
    }
}

thread_local! {
    static FRAMES: RefCell<Vec<LoadFrame>> = const { RefCell::new(Vec::new()) };
}

/// Keeps a load frame on the stack for the duration of a setup call.
///
/// Dropping the guard without [`finish`](Self::finish) discards the frame.
pub(crate) struct FrameGuard {
    depth: usize,
    finished: bool,
}

impl FrameGuard {
    pub(crate) fn enter(module: &str, beacon: Arc<Beacon>) -> Self {
        let depth = FRAMES.with_borrow_mut(|frames| {
            frames.push(LoadFrame {
                module: module.to_string(),
                beacon,
                metadata: ModuleMetadata::for_module(module),
                cubes: Vec::new(),
                export: None,
            });
            frames.len()
        });
        Self {
            depth,
            finished: false,
        }
    }

    pub(crate) fn finish(mut self) -> Option<LoadFrame> {
        self.finished = true;
        FRAMES.with_borrow_mut(|frames| {
            if frames.len() == self.depth {
                frames.pop()
            } else {
                None
            }
        })
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        if !self.finished {
            FRAMES.with_borrow_mut(|frames| frames.truncate(self.depth.saturating_sub(1)));
        }
    }
}

fn with_frame<R>(f: impl FnOnce(&mut LoadFrame) -> R) -> BeaconResult<R> {
    FRAMES.with_borrow_mut(|frames| {
        frames
            .last_mut()
            .map(f)
            .ok_or(BeaconError::NoActiveModuleContext)
    })
}

/// The beacon loading the innermost module, if any.
pub(crate) fn loading_beacon() -> Option<Arc<Beacon>> {
    FRAMES.with_borrow(|frames| frames.last().map(|frame| frame.beacon.clone()))
}

// =============================================================================
// Ambient declaration API
// =============================================================================

/// Name of the module currently loading on this thread.
pub fn current_module() -> BeaconResult<String> {
    with_frame(|frame| frame.module.clone())
}

/// Sets the value returned by `require` for the current module.
///
/// A later call replaces the earlier export.
pub fn export<T: Any + Send + Sync>(value: T) -> BeaconResult<()> {
    with_frame(|frame| frame.export = Some(Arc::new(value)))
}

/// Edits the current module's metadata.
pub fn describe(f: impl FnOnce(&mut ModuleMetadata)) -> BeaconResult<()> {
    with_frame(|frame| f(&mut frame.metadata))
}

/// Starts declaring a listener for `events` in the current module.
///
/// Nothing is recorded until [`ListenerBuilder::handle`] is called.
pub fn listen(events: impl IntoIterator<Item = EventKind>) -> ListenerBuilder {
    ListenerBuilder {
        name: None,
        events: events.into_iter().collect(),
        priority: DEFAULT_PRIORITY,
        matchers: Vec::new(),
        providers: Vec::new(),
    }
}

/// Builder returned by [`listen`].
#[derive(Debug, Clone)]
#[must_use = "a listener is only declared once `handle` is called"]
pub struct ListenerBuilder {
    name: Option<String>,
    events: Vec<EventKind>,
    priority: i32,
    matchers: Vec<Matcher>,
    providers: Vec<Provider>,
}

impl ListenerBuilder {
    /// Lower runs first. Defaults to 16.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Appends a matcher. Matchers run in the order they were added.
    pub fn matcher(mut self, matcher: impl Into<Matcher>) -> Self {
        self.matchers.push(matcher.into());
        self
    }

    /// Appends a provider. Providers run after every matcher hit.
    pub fn provide(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Overrides the name used in logs. Defaults to the handler's type name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Records the listener in the current module.
    pub fn handle<H, T>(self, handler: H) -> BeaconResult<CubeId>
    where
        H: Handler<T>,
        T: 'static,
    {
        let name = self.name.unwrap_or_else(|| type_name::<H>().to_string());
        let cube = Cube::new(
            Schema::Listener(ListenerSchema {
                name,
                events: self.events,
                priority: self.priority,
                matchers: self.matchers,
                providers: self.providers,
            }),
            into_listener(handler),
        );
        with_frame(move |frame| {
            let id = cube.id();
            frame.cubes.push(cube);
            id
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declarations_outside_load_fail() {
        assert!(matches!(
            current_module(),
            Err(BeaconError::NoActiveModuleContext)
        ));
        assert!(export(1u8).is_err());
        assert!(describe(|meta| meta.version = "1".into()).is_err());
        assert!(matches!(
            listen([EventKind::FriendAdd]).handle(|| async {}),
            Err(BeaconError::NoActiveModuleContext)
        ));
    }

    #[test]
    fn test_nested_frames() {
        let beacon = Arc::new(Beacon::empty());
        let outer = FrameGuard::enter("outer", beacon.clone());
        {
            let inner = FrameGuard::enter("inner", beacon.clone());
            listen([EventKind::FriendAdd]).handle(|| async {}).unwrap();
            assert_eq!(current_module().unwrap(), "inner");
            let frame = inner.finish().unwrap();
            assert_eq!(frame.cubes().len(), 1);
        }
        assert_eq!(current_module().unwrap(), "outer");
        drop(outer);
        assert!(current_module().is_err());
    }
}
