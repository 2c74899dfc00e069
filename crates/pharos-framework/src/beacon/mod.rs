//! Module registry.
//!
//! The [`Beacon`] loads modules, keeps each loaded module as a [`Channel`]
//! and wires the module's cubes through every installed [`Behaviour`].
//!
//! # Lifecycle
//!
//! ```text
//! require("echo")
//!   ├─ already loaded?  → cached export or channel, setup does not run again
//!   ├─ push load frame  → setup() declares cubes via listen()/export()/describe()
//!   ├─ pop load frame
//!   ├─ allocate every cube through every behaviour
//!   └─ register the channel
//!
//! uninstall("echo")
//!   ├─ release every cube through the behaviours that allocated it (best effort)
//!   └─ remove the channel
//!
//! reload("echo") = uninstall + require
//! ```
//!
//! A failure in setup or in allocation discards the module: cubes already
//! allocated are released again and nothing is registered, so a later
//! `require` starts from scratch.
//!
//! `reload` leaves a short window in which the module has no listeners.
//!
//! Loads are expected to be driven from one startup sequence and are not
//! meant to run concurrently with each other.

mod behaviour;
mod channel;
mod cube;
mod descriptor;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

pub use behaviour::{Behaviour, BusBehaviour};
pub use channel::{
    Channel, ListenerBuilder, ModuleMetadata, current_module, describe, export, listen,
};
pub use cube::{Cube, CubeId, ListenerSchema, Schema};
pub use descriptor::{MODULES, ModuleDescriptor, SetupFn};
pub use linkme;

use channel::{FrameGuard, loading_beacon};

use crate::error::{BeaconError, BeaconResult};

static GLOBAL: OnceLock<Arc<Beacon>> = OnceLock::new();

/// What `require` hands back.
#[derive(Clone)]
pub enum Required {
    /// The module did not export anything.
    Channel(Arc<Channel>),
    /// The value the module passed to [`export`].
    Export(Arc<dyn std::any::Any + Send + Sync>),
}

impl Required {
    fn of(channel: &Arc<Channel>) -> Self {
        match channel.export() {
            Some(export) => Self::Export(export.clone()),
            None => Self::Channel(channel.clone()),
        }
    }

    pub fn channel(&self) -> Option<&Arc<Channel>> {
        match self {
            Self::Channel(channel) => Some(channel),
            Self::Export(_) => None,
        }
    }

    /// Returns the export if it is a `T`.
    pub fn downcast<T: std::any::Any + Send + Sync>(self) -> Option<Arc<T>> {
        match self {
            Self::Export(export) => export.downcast::<T>().ok(),
            Self::Channel(_) => None,
        }
    }
}

impl std::fmt::Debug for Required {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Channel(channel) => f.debug_tuple("Channel").field(&channel.module()).finish(),
            Self::Export(_) => f.write_str("Export(..)"),
        }
    }
}

/// Lifecycle state of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Unloaded,
    Loading,
    Loaded,
}

// =============================================================================
// Beacon
// =============================================================================

/// The module registry.
pub struct Beacon {
    sources: RwLock<BTreeMap<String, ModuleDescriptor>>,
    channels: RwLock<HashMap<String, Arc<Channel>>>,
    behaviours: RwLock<Vec<Arc<dyn Behaviour>>>,
    loading: Mutex<HashSet<String>>,
}

impl Default for Beacon {
    fn default() -> Self {
        Self::new()
    }
}

impl Beacon {
    /// Creates a registry knowing every module in [`MODULES`].
    pub fn new() -> Self {
        let beacon = Self::empty();
        for descriptor in MODULES.iter() {
            beacon.add_module(*descriptor);
        }
        beacon
    }

    /// Creates a registry knowing no module.
    pub fn empty() -> Self {
        Self {
            sources: RwLock::new(BTreeMap::new()),
            channels: RwLock::new(HashMap::new()),
            behaviours: RwLock::new(Vec::new()),
            loading: Mutex::new(HashSet::new()),
        }
    }

    /// Makes a module known to this registry without loading it.
    pub fn add_module(&self, descriptor: ModuleDescriptor) {
        if let Some(previous) = self
            .sources
            .write()
            .insert(descriptor.name.to_string(), descriptor)
        {
            warn!(module = previous.name, "Module registered twice, keeping the last one");
        }
    }

    /// Names of all known modules, sorted.
    pub fn modules(&self) -> Vec<String> {
        self.sources.read().keys().cloned().collect()
    }

    // ─── Global instance ──────────────────────────────────────────────────────

    /// Installs `beacon` as the process-wide registry used by [`require`].
    ///
    /// Returns `false` if one was already installed.
    pub fn set_global(beacon: Arc<Beacon>) -> bool {
        GLOBAL.set(beacon).is_ok()
    }

    pub fn global() -> Option<Arc<Beacon>> {
        GLOBAL.get().cloned()
    }

    // ─── Behaviours ───────────────────────────────────────────────────────────

    /// Appends a behaviour. Only modules loaded afterwards are allocated
    /// through it.
    pub fn install_behaviour(&self, behaviour: Arc<dyn Behaviour>) {
        debug!(behaviour = behaviour.name(), "Behaviour installed");
        self.behaviours.write().push(behaviour);
    }

    // ─── Queries ──────────────────────────────────────────────────────────────

    pub fn channel(&self, module: &str) -> Option<Arc<Channel>> {
        self.channels.read().get(module).cloned()
    }

    /// All loaded modules.
    pub fn channels(&self) -> Vec<Arc<Channel>> {
        self.channels.read().values().cloned().collect()
    }

    pub fn is_loaded(&self, module: &str) -> bool {
        self.channels.read().contains_key(module)
    }

    pub fn state(&self, module: &str) -> ModuleState {
        if self.is_loaded(module) {
            ModuleState::Loaded
        } else if self.loading.lock().contains(module) {
            ModuleState::Loading
        } else {
            ModuleState::Unloaded
        }
    }

    // ─── Lifecycle ────────────────────────────────────────────────────────────

    /// Loads `module` unless it is already loaded.
    ///
    /// Returns the module's export if it declared one, its channel otherwise.
    pub fn require(self: &Arc<Self>, module: &str) -> BeaconResult<Required> {
        if let Some(channel) = self.channel(module) {
            return Ok(Required::of(&channel));
        }

        let setup = self
            .sources
            .read()
            .get(module)
            .map(|descriptor| descriptor.setup)
            .ok_or_else(|| BeaconError::ModuleNotFound(module.to_string()))?;

        let loaded = {
            let _marker = LoadingMarker::insert(&self.loading, module)
                .ok_or_else(|| BeaconError::CircularRequire(module.to_string()))?;
            self.load(module, setup)
        };

        let channel = match loaded {
            Ok(channel) => Arc::new(channel),
            Err(e) => {
                error!(module, error = %e, "Failed to load module");
                return Err(e);
            }
        };

        self.channels
            .write()
            .insert(module.to_string(), channel.clone());
        info!(module, cubes = channel.cubes().len(), "Module loaded");
        Ok(Required::of(&channel))
    }

    fn load(self: &Arc<Self>, module: &str, setup: SetupFn) -> BeaconResult<Channel> {
        debug!(module, "Loading module");

        let guard = FrameGuard::enter(module, self.clone());
        let outcome = setup();
        let frame = guard.finish();
        outcome.map_err(|e| BeaconError::setup(module, e))?;
        let frame = frame.ok_or(BeaconError::NoActiveModuleContext)?;

        let behaviours = self.behaviours.read().clone();
        let mut allocated: Vec<(&Arc<dyn Behaviour>, &Cube)> = Vec::new();

        for cube in frame.cubes() {
            for behaviour in &behaviours {
                if let Err(source) = behaviour.allocate(cube) {
                    for (done, done_cube) in allocated.into_iter().rev() {
                        release_one(module, done.as_ref(), done_cube);
                    }
                    return Err(BeaconError::Allocate {
                        module: module.to_string(),
                        behaviour: behaviour.name().to_string(),
                        cube: cube.id(),
                        source,
                    });
                }
                allocated.push((behaviour, cube));
            }
        }

        Ok(frame.into_channel(behaviours))
    }

    /// Unloads `module`. Returns `false` if it was not loaded.
    ///
    /// Release failures are logged and do not stop the remaining releases.
    pub fn uninstall(&self, module: &str) -> bool {
        let Some(channel) = self.channel(module) else {
            return false;
        };

        for cube in channel.cubes() {
            for behaviour in channel.behaviours() {
                release_one(module, behaviour.as_ref(), cube);
            }
        }

        self.channels.write().remove(module);
        info!(module, "Module unloaded");
        true
    }

    /// Uninstalls then requires `module` again.
    pub fn reload(self: &Arc<Self>, module: &str) -> BeaconResult<Required> {
        self.uninstall(module);
        self.require(module)
    }

    /// Requires every known module in name order.
    ///
    /// Returns the failures; the other modules stay loaded.
    pub fn load_all(self: &Arc<Self>) -> Vec<(String, BeaconError)> {
        self.modules()
            .into_iter()
            .filter_map(|module| self.require(&module).err().map(|e| (module, e)))
            .collect()
    }
}

/// Marks a module as loading until dropped, including on unwind.
struct LoadingMarker<'a> {
    loading: &'a Mutex<HashSet<String>>,
    module: &'a str,
}

impl<'a> LoadingMarker<'a> {
    /// `None` if `module` is already loading.
    fn insert(loading: &'a Mutex<HashSet<String>>, module: &'a str) -> Option<Self> {
        loading
            .lock()
            .insert(module.to_string())
            .then_some(Self { loading, module })
    }
}

impl Drop for LoadingMarker<'_> {
    fn drop(&mut self) {
        self.loading.lock().remove(self.module);
    }
}

fn release_one(module: &str, behaviour: &dyn Behaviour, cube: &Cube) {
    if let Err(e) = behaviour.release(cube) {
        warn!(
            module,
            behaviour = behaviour.name(),
            cube = %cube.id(),
            error = %e,
            "Failed to release cube"
        );
    }
}

impl std::fmt::Debug for Beacon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Beacon")
            .field("modules", &self.modules())
            .field("loaded", &self.channels.read().keys().collect::<Vec<_>>())
            .field("behaviours", &self.behaviours.read().len())
            .finish()
    }
}

/// Requires `module` from the registry loading the current module, or from
/// the global registry outside of a load.
pub fn require(module: &str) -> BeaconResult<Required> {
    let beacon = loading_beacon()
        .or_else(Beacon::global)
        .ok_or(BeaconError::NoBeacon)?;
    beacon.require(module)
}
