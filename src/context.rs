//! Process-wide shim state
//!
//! Built once behind an initialization barrier and shared by every entry point.
//! Only the two captured chained functions change afterwards, each time the
//! host re-negotiates or re-resolves.

use std::sync::{OnceLock, RwLock};

use crate::chain::ChainedRuntime;
use crate::config::ShimConfig;
use crate::location::ModuleLocation;
use crate::logging;
use crate::mask::ExtensionMask;
use crate::xr::{PfnEnumerateInstanceExtensionProperties, PfnGetInstanceProcAddr, XrResult};

static CONTEXT: OnceLock<ShimContext> = OnceLock::new();

/// A captured chained function pointer; the latest capture wins.
pub(crate) struct FnSlot<F: Copy> {
    inner: RwLock<Option<F>>,
}

impl<F: Copy> std::fmt::Debug for FnSlot<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSlot")
            .field("captured", &self.get().is_some())
            .finish()
    }
}

impl<F: Copy> FnSlot<F> {
    pub(crate) fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    pub(crate) fn get(&self) -> Option<F> {
        *self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn set(&self, value: Option<F>) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = value;
    }
}

/// Shared state for the interceptors
#[derive(Debug)]
pub struct ShimContext {
    /// None = no runtime to forward to; every entry point fails.
    pub(crate) runtime: Option<ChainedRuntime>,
    pub(crate) mask: ExtensionMask,
    pub(crate) next_get_instance_proc_addr: FnSlot<PfnGetInstanceProcAddr>,
    pub(crate) next_enumerate_instance_extension_properties:
        FnSlot<PfnEnumerateInstanceExtensionProperties>,
}

impl ShimContext {
    pub fn new(runtime: Option<ChainedRuntime>, mask: ExtensionMask) -> Self {
        Self {
            runtime,
            mask,
            next_get_instance_proc_addr: FnSlot::new(),
            next_enumerate_instance_extension_properties: FnSlot::new(),
        }
    }

    /// Load the chained runtime named by `config`, resolved against `module_dir`.
    ///
    /// A runtime that fails to load is logged and leaves the context unavailable.
    pub fn from_config(config: &ShimConfig, module_dir: &std::path::Path) -> Self {
        let runtime = match ChainedRuntime::load(config.runtime_path(module_dir).as_deref()) {
            Ok(runtime) => Some(runtime),
            Err(e) => {
                tracing::error!("{}", e);
                None
            }
        };
        Self::new(runtime, ExtensionMask::new(config.masked_extensions.iter().cloned()))
    }

    /// Full startup sequence for the shim library: log, configuration, chain.
    pub fn initialize() -> Self {
        let location = ModuleLocation::current().unwrap_or_else(|_| ModuleLocation::fallback());
        Self::initialize_at(&location)
    }

    /// Startup sequence for a shim located at `location`.
    ///
    /// The configuration is `<base>.cfg` beside the module and the chained
    /// runtime is resolved against the module directory.
    pub fn initialize_at(location: &ModuleLocation) -> Self {
        logging::init(location.log_path().as_deref());
        tracing::info!(
            "{} {} starting from `{}'",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            location.dir.display()
        );

        let config = ShimConfig::load(&location.config_path());
        Self::from_config(&config, &location.dir)
    }

    pub fn is_available(&self) -> bool {
        self.runtime.is_some()
    }

    pub fn runtime(&self) -> Option<&ChainedRuntime> {
        self.runtime.as_ref()
    }

    pub fn mask(&self) -> &ExtensionMask {
        &self.mask
    }
}

/// Install `context` as the process context, before any entry point runs.
///
/// Gives the context back if one is already installed.
pub fn install(context: ShimContext) -> Result<(), ShimContext> {
    CONTEXT.set(context)
}

/// The process context, initializing it on first use.
pub fn global() -> &'static ShimContext {
    CONTEXT.get_or_init(ShimContext::initialize)
}

/// The process context if it has been initialized.
pub fn try_global() -> Option<&'static ShimContext> {
    CONTEXT.get()
}

/// Run an entry point body; a panic must not unwind into the host.
pub(crate) fn catch_panic<F: FnOnce() -> XrResult>(entry: &str, body: F) -> XrResult {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(body)).unwrap_or_else(|_| {
        tracing::error!("{} panicked", entry);
        XrResult::ERROR_RUNTIME_FAILURE
    })
}
