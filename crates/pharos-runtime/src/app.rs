//! Application bootstrap.
//!
//! [`Pharos`] wires the pieces together:
//!
//! ```text
//! PharosConfig ──► logging
//!              ──► LocalBus ◄── BusBehaviour ◄── Beacon (modules)
//!              ──► WebhookHandler(bus, secret) ──► axum server
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use pharos_runtime::Pharos;
//!
//! // pharos.toml in the current directory, then PHAROS_* variables
//! let app = Pharos::load()?;
//! app.run().await?;
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use pharos_core::{ApplicationReady, Event};
use pharos_framework::{Beacon, BeaconError, BusBehaviour, EventBus, LocalBus};
use pharos_webhook::{ServerHandle, WebhookHandler, serve};
use tokio::signal;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigLoader, PharosConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// A configured bot application.
pub struct Pharos {
    config: PharosConfig,
    bus: Arc<LocalBus>,
    beacon: Arc<Beacon>,
    webhook: WebhookHandler,
    server: Mutex<Option<ServerHandle>>,
}

impl Pharos {
    /// Loads configuration from the default locations and builds the app.
    pub fn load() -> RuntimeResult<Self> {
        Self::builder().build()
    }

    pub fn builder() -> PharosBuilder {
        PharosBuilder::new()
    }

    /// Builds the app from an already loaded configuration.
    ///
    /// Initializes logging, validates `config`, then creates the bus and the
    /// module registry. The registry knows every module registered with
    /// [`pharos_framework::module!`] and becomes the global one unless
    /// another app installed it first.
    pub fn from_config(config: PharosConfig) -> RuntimeResult<Self> {
        logging::init_from_config(&config.logging);
        validate_config(&config)?;

        let bus = Arc::new(LocalBus::new());
        let beacon = Arc::new(Beacon::new());
        beacon.install_behaviour(Arc::new(BusBehaviour::new(bus.clone())));
        if !Beacon::set_global(beacon.clone()) {
            debug!("A global module registry is already installed");
        }

        let webhook = WebhookHandler::new(bus.clone(), &config.bot.secret, config.webhook_debug())?;

        info!(
            appid = %config.bot.appid,
            sandbox = config.bot.sandbox,
            log_level = %config.logging.level,
            "Pharos initialized"
        );

        Ok(Self {
            config,
            bus,
            beacon,
            webhook,
            server: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &PharosConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<LocalBus> {
        &self.bus
    }

    pub fn beacon(&self) -> &Arc<Beacon> {
        &self.beacon
    }

    pub fn webhook(&self) -> &WebhookHandler {
        &self.webhook
    }

    pub fn is_running(&self) -> bool {
        self.server.lock().is_some()
    }

    /// Requires the configured modules, or every known module when none is
    /// configured.
    ///
    /// Failures are logged and returned; the other modules stay loaded.
    pub fn load_modules(&self) -> Vec<(String, BeaconError)> {
        let failures = if self.config.modules.is_empty() {
            self.beacon.load_all()
        } else {
            self.config
                .modules
                .iter()
                .filter_map(|module| {
                    self.beacon
                        .require(module)
                        .err()
                        .map(|e| (module.clone(), e))
                })
                .collect()
        };

        for (module, e) in &failures {
            error!(module = %module, error = %e, "Module failed to load");
        }
        info!(
            loaded = self.beacon.channels().len(),
            failed = failures.len(),
            "Modules loaded"
        );
        failures
    }

    /// Starts the webhook server and publishes [`ApplicationReady`].
    ///
    /// Returns the bound address. Calling it on a running app returns the
    /// current address.
    pub async fn start(&self) -> RuntimeResult<SocketAddr> {
        if let Some(addr) = self.server.lock().as_ref().map(ServerHandle::local_addr) {
            warn!(addr = %addr, "Pharos is already running");
            return Ok(addr);
        }

        let addr = self.config.webhook.addr();
        let handle = serve(&addr, &self.config.webhook.path, self.webhook.clone())
            .await
            .map_err(|source| RuntimeError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = handle.local_addr();
        *self.server.lock() = Some(handle);

        info!(addr = %local_addr, path = %self.config.webhook.path, "Pharos started");

        let report = self.bus.publish(Event::from(ApplicationReady)).await?;
        debug!(listeners = report.invoked, "ApplicationReady published");

        Ok(local_addr)
    }

    /// Stops the webhook server. Loaded modules stay loaded.
    pub fn stop(&self) {
        match self.server.lock().take() {
            Some(handle) => {
                handle.shutdown();
                info!("Pharos stopped");
            }
            None => warn!("Pharos is not running"),
        }
    }

    /// Loads modules, starts, and runs until Ctrl+C or SIGTERM.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.run_until(wait_for_shutdown()).await
    }

    /// Loads modules, starts, and runs until `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.load_modules();
        self.start().await?;

        info!("Pharos is now running");
        shutdown.await;

        self.stop();
        Ok(())
    }
}

impl std::fmt::Debug for Pharos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pharos")
            .field("bot", &self.config.bot)
            .field("beacon", &self.beacon)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

/// Completes on Ctrl+C or, on Unix, SIGTERM.
pub async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    result = signal::ctrl_c() => log_ctrl_c(result),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    log_ctrl_c(signal::ctrl_c().await);
}

fn log_ctrl_c(result: std::io::Result<()>) {
    match result {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl+C, shutting down"),
    }
}

// =============================================================================
// PharosBuilder
// =============================================================================

/// Builder for a [`Pharos`] with custom configuration sources.
///
/// ```rust,ignore
/// let app = Pharos::builder()
///     .config_file("config/pharos.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct PharosBuilder {
    config_loader: ConfigLoader,
}

impl PharosBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration programmatically, under files and environment.
    pub fn merge(mut self, config: PharosConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    pub fn build(self) -> RuntimeResult<Pharos> {
        let config = self.config_loader.load()?;
        Pharos::from_config(config)
    }
}

impl Default for PharosBuilder {
    fn default() -> Self {
        Self::new()
    }
}
