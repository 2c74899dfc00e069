//! # Pharos Framework
//!
//! Everything between a typed [`Event`](pharos_core::Event) and the plugin
//! code that reacts to it:
//!
//! - [`beacon`]: the module registry, loading, unloading and reloading
//!   modules, and the ambient `listen`/`export`/`describe` API used by their
//!   setup code
//! - [`matcher`]: prefix, suffix, keyword, command and sub-command matchers
//!   gating each listener
//! - [`handler`] and [`extractor`]: axum-style listener functions with
//!   parameter injection
//! - [`bus`]: the [`EventBus`] seam and the in-process [`LocalBus`]
//!
//! # Example
//!
//! ```rust,ignore
//! use pharos_framework::prelude::*;
//!
//! async fn on_hello(event: EventContext<C2CMessage>, Text(rest): Text) {
//!     tracing::info!(from = event.author.display_name(), rest);
//! }
//!
//! fn setup() -> Result<(), BoxError> {
//!     listen([EventKind::C2CMessage])
//!         .matcher(Matcher::prefix(["!hello"]))
//!         .handle(on_hello)?;
//!     Ok(())
//! }
//!
//! pharos_framework::module!(HELLO, "hello", setup);
//! ```

pub mod beacon;
pub mod bus;
pub mod context;
pub mod error;
pub mod extractor;
pub mod handler;
pub mod matcher;
pub mod provider;

pub use beacon::{
    Beacon, Behaviour, BusBehaviour, Channel, Cube, CubeId, ModuleDescriptor, ModuleMetadata,
    ModuleState, Required, require,
};
pub use bus::{DEFAULT_PRIORITY, EventBus, LocalBus, PublishReport, Subscription, SubscriptionId};
pub use context::{BaseContext, DispatchContext};
pub use error::{
    BeaconError, BeaconResult, BoxError, BusError, ExtractError, ExtractResult, ListenerSkipped,
};
pub use extractor::{FromContext, Provided, Text};
pub use handler::{BoxedListener, Handler, ListenerResponse, Propagation, into_listener};
pub use matcher::{CommandResult, MatchResult, Matcher, SubCommand, SubCommandMatch};
pub use provider::Provider;

/// The names plugin code usually needs.
pub mod prelude {
    pub use crate::beacon::{current_module, describe, export, listen, require};
    pub use crate::context::DispatchContext;
    pub use crate::error::BoxError;
    pub use crate::extractor::{Provided, Text};
    pub use crate::handler::Propagation;
    pub use crate::matcher::{CommandResult, MatchResult, Matcher, SubCommandMatch};
    pub use crate::provider::Provider;
    pub use pharos_core::{
        ApplicationReady, Attachments, C2CMessage, ChannelMessage, Content, DirectMessage, Event,
        EventContext, EventKind, GroupMessage, Target,
    };
}
