//! Module descriptors: the static, `Copy` handle to a module's setup code.

use linkme::distributed_slice;

use crate::error::BoxError;

/// The setup function of a module.
///
/// Runs while the module is loading; every listener, export and metadata
/// declared during the call belongs to that module.
pub type SetupFn = fn() -> Result<(), BoxError>;

/// A static descriptor naming a module and its setup function.
///
/// Use the [`module!`](crate::module) macro to register one in [`MODULES`].
#[derive(Debug, Clone, Copy)]
pub struct ModuleDescriptor {
    pub name: &'static str,
    pub setup: SetupFn,
}

impl ModuleDescriptor {
    pub const fn new(name: &'static str, setup: SetupFn) -> Self {
        Self { name, setup }
    }
}

/// Every module linked into the binary.
///
/// Each crate or file that defines a module contributes one entry through
/// [`module!`](crate::module).
#[distributed_slice]
pub static MODULES: [ModuleDescriptor];

/// Registers a module in [`MODULES`].
///
/// ```rust,ignore
/// fn setup() -> Result<(), BoxError> {
///     listen([EventKind::C2CMessage])
///         .matcher(Matcher::keyword("ping"))
///         .handle(on_ping)?;
///     Ok(())
/// }
///
/// pharos_framework::module!(PING, "ping", setup);
/// ```
#[macro_export]
macro_rules! module {
    ($static_name:ident, $name:expr, $setup:path $(,)?) => {
        #[$crate::beacon::linkme::distributed_slice($crate::beacon::MODULES)]
        #[linkme(crate = $crate::beacon::linkme)]
        static $static_name: $crate::beacon::ModuleDescriptor =
            $crate::beacon::ModuleDescriptor::new($name, $setup);
    };
}
