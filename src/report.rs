//! Extension report: drive the installed shim the way the OpenXR loader does
//!
//! Negotiates through the exported entry point, resolves
//! `xrEnumerateInstanceExtensionProperties` through the substituted resolver
//! and runs the two-call enumeration against both the chained runtime and the
//! shim, so the raw and visible lists can be compared.

use serde::Serialize;
use std::ffi::CString;
use thiserror::Error;

use crate::context;
use crate::enumerate;
use crate::negotiate::xrNegotiateLoaderRuntimeInterface;
use crate::xr::{
    PfnEnumerateInstanceExtensionProperties, PfnVoidFunction, XrExtensionProperties,
    XrNegotiateLoaderInfo, XrNegotiateRuntimeRequest, XrResult,
    ENUMERATE_INSTANCE_EXTENSION_PROPERTIES, XR_NULL_HANDLE,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("Runtime negotiation failed: {0}")]
    Negotiation(XrResult),

    #[error("Runtime returned no xrGetInstanceProcAddr")]
    NoResolver,

    #[error("Failed to resolve xrEnumerateInstanceExtensionProperties: {0}")]
    Resolve(XrResult),

    #[error("Chained runtime enumeration failed: {0}")]
    ChainedEnumeration(XrResult),

    #[error("Shim enumeration failed: {0}")]
    Enumeration(XrResult),
}

/// One extension advertised by the chained runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionEntry {
    pub name: String,
    pub version: u32,
    pub masked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionReport {
    /// Path of the chained runtime, when loaded from disk
    pub runtime: Option<String>,
    /// Runtime interface version agreed during negotiation
    pub interface_version: u32,
    /// Everything the chained runtime advertises, in its order
    pub extensions: Vec<ExtensionEntry>,
    /// What applications see through the shim
    pub visible: Vec<String>,
}

impl ExtensionReport {
    pub fn masked_count(&self) -> usize {
        self.extensions.iter().filter(|e| e.masked).count()
    }
}

/// Build a report from the installed process context.
pub fn probe() -> Result<ExtensionReport, ReportError> {
    let info = XrNegotiateLoaderInfo::from_loader();
    let mut request = XrNegotiateRuntimeRequest::from_loader();

    // SAFETY: both records are valid and sized as the loader sizes them.
    let result = unsafe { xrNegotiateLoaderRuntimeInterface(&info, &mut request) };
    if result.failed() {
        return Err(ReportError::Negotiation(result));
    }
    let resolver = request
        .get_instance_proc_addr
        .ok_or(ReportError::NoResolver)?;

    let name = CString::new(ENUMERATE_INSTANCE_EXTENSION_PROPERTIES)
        .map_err(|_| ReportError::Resolve(XrResult::ERROR_VALIDATION_FAILURE))?;
    let mut function: PfnVoidFunction = None;
    // SAFETY: `name` is NUL-terminated and `function` is writable.
    let result = unsafe { resolver(XR_NULL_HANDLE, name.as_ptr(), &mut function) };
    if result.failed() {
        return Err(ReportError::Resolve(result));
    }
    let function = function.ok_or(ReportError::Resolve(XrResult::ERROR_FUNCTION_UNSUPPORTED))?;
    // SAFETY: the resolver returned this pointer for the enumeration function.
    let shim_enumerate = unsafe {
        std::mem::transmute::<unsafe extern "system" fn(), PfnEnumerateInstanceExtensionProperties>(
            function,
        )
    };

    let context = context::global();
    let chained = context
        .next_enumerate_instance_extension_properties
        .get()
        .ok_or(ReportError::ChainedEnumeration(XrResult::ERROR_FUNCTION_UNSUPPORTED))?;

    // SAFETY: `chained` was captured from the chained resolver.
    let raw = unsafe { enumerate::materialize(chained) }.map_err(ReportError::ChainedEnumeration)?;
    // SAFETY: `shim_enumerate` follows the same contract as the chained function.
    let visible = unsafe { enumerate::materialize(shim_enumerate) }.map_err(ReportError::Enumeration)?;

    let mask = context.mask();
    Ok(ExtensionReport {
        runtime: context
            .runtime()
            .and_then(|r| r.path())
            .map(|p| p.display().to_string()),
        interface_version: request.runtime_interface_version,
        extensions: raw
            .iter()
            .map(|props| ExtensionEntry {
                name: props.name(),
                version: props.extension_version,
                masked: mask.should_mask(props.name_bytes()),
            })
            .collect(),
        visible: visible.iter().map(XrExtensionProperties::name).collect(),
    })
}
