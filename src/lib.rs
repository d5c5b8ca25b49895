//! xr-extension-mask - OpenXR runtime shim that hides instance extensions
//!
//! The shim is registered with the OpenXR loader as the active runtime. It
//! loads the real (chained) runtime named in its configuration file, forwards
//! every call to it, and intercepts only two things:
//! - loader negotiation, to substitute its own `xrGetInstanceProcAddr`
//! - `xrEnumerateInstanceExtensionProperties`, to remove masked extensions
//!
//! The library builds both as a `cdylib` (the shim) and an `rlib` used by the
//! diagnostic CLI and the tests.

pub mod chain;
pub mod cli;
pub mod config;
pub mod context;
pub mod enumerate;
pub mod location;
pub mod logging;
pub mod mask;
pub mod negotiate;
pub mod proc_addr;
pub mod report;
pub mod xr;

pub use chain::{ChainError, ChainedRuntime};
pub use config::{ConfigIssue, ConfigIssueKind, ShimConfig};
pub use context::ShimContext;
pub use mask::ExtensionMask;
pub use negotiate::xrNegotiateLoaderRuntimeInterface;
