//! Chained runtime loading
//!
//! Loads the real OpenXR runtime module and resolves its negotiation entry
//! point. The library stays loaded for the life of the process so every
//! function pointer obtained from it remains valid.

use std::path::{Path, PathBuf};
use thiserror::Error;

use libloading::Library;

use crate::xr::{
    PfnNegotiateLoaderRuntimeInterface, XrNegotiateLoaderInfo, XrNegotiateRuntimeRequest,
    XrResult, NEGOTIATE_SYMBOL,
};

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("No runtime configured")]
    NotConfigured,

    #[error("Failed to load runtime `{path}': {source}")]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Runtime `{path}' does not export xrNegotiateLoaderRuntimeInterface: {source}")]
    MissingEntryPoint {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },
}

/// The loaded chained runtime
pub struct ChainedRuntime {
    negotiate: PfnNegotiateLoaderRuntimeInterface,
    path: Option<PathBuf>,
    /// Keep the library loaded.
    _library: Option<Library>,
}

impl ChainedRuntime {
    /// Load the runtime module at `path` (None = no runtime configured).
    pub fn load(path: Option<&Path>) -> Result<Self, ChainError> {
        let path = path.ok_or(ChainError::NotConfigured)?;
        tracing::info!("Loading runtime `{}'", path.display());

        // SAFETY: loading a runtime runs its initializers; that is the contract
        // of being chained in front of it.
        let library = unsafe { Library::new(path) }.map_err(|source| ChainError::LoadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        // SAFETY: the symbol type matches the OpenXR loader negotiation ABI.
        let negotiate = unsafe {
            library
                .get::<PfnNegotiateLoaderRuntimeInterface>(NEGOTIATE_SYMBOL)
                .map(|symbol| *symbol)
        }
        .map_err(|source| ChainError::MissingEntryPoint {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            negotiate,
            path: Some(path.to_path_buf()),
            _library: Some(library),
        })
    }

    /// Chain to a negotiation function that is already in memory.
    pub fn from_entry_point(negotiate: PfnNegotiateLoaderRuntimeInterface) -> Self {
        Self {
            negotiate,
            path: None,
            _library: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Forward a negotiation request to the chained runtime.
    ///
    /// # Safety
    /// Both pointers are passed through unchanged and must satisfy the
    /// chained runtime's expectations for `xrNegotiateLoaderRuntimeInterface`.
    pub unsafe fn negotiate(
        &self,
        loader_info: *const XrNegotiateLoaderInfo,
        runtime_request: *mut XrNegotiateRuntimeRequest,
    ) -> XrResult {
        // SAFETY: forwarded under the caller's contract.
        unsafe { (self.negotiate)(loader_info, runtime_request) }
    }
}

impl std::fmt::Debug for ChainedRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainedRuntime")
            .field("path", &self.path)
            .field("loaded", &self._library.is_some())
            .finish()
    }
}
