//! Loader negotiation interceptor
//!
//! The OpenXR loader negotiates with the shim as if it were the runtime. The
//! request is forwarded to the chained runtime and, on success, the resolver it
//! hands back is swapped for the shim's own.

use crate::context::{self, ShimContext};
use crate::proc_addr;
use crate::xr::{XrNegotiateLoaderInfo, XrNegotiateRuntimeRequest, XrResult};

impl ShimContext {
    /// Negotiate on behalf of the chained runtime.
    ///
    /// Without a chained runtime this fails with `XR_ERROR_FILE_ACCESS_ERROR`,
    /// the code the loader reports for a runtime it could not load.
    ///
    /// # Safety
    /// `runtime_request` must be null or valid for reads and writes; both
    /// pointers are otherwise passed to the chained runtime unchanged.
    pub unsafe fn negotiate_loader_runtime_interface(
        &self,
        loader_info: *const XrNegotiateLoaderInfo,
        runtime_request: *mut XrNegotiateRuntimeRequest,
    ) -> XrResult {
        let Some(runtime) = self.runtime() else {
            tracing::warn!("Negotiation refused: no chained runtime");
            return XrResult::ERROR_FILE_ACCESS_ERROR;
        };

        // SAFETY: forwarded under the caller's contract.
        let result = unsafe { runtime.negotiate(loader_info, runtime_request) };
        if result.failed() {
            tracing::warn!("Chained runtime negotiation failed: {}", result);
            return result;
        }

        // SAFETY: non-null request pointers are valid per the caller's contract.
        if let Some(request) = unsafe { runtime_request.as_mut() } {
            self.next_get_instance_proc_addr
                .set(request.get_instance_proc_addr);
            request.get_instance_proc_addr = Some(proc_addr::xr_get_instance_proc_addr);
            tracing::info!(
                "Negotiated runtime interface {} (API version {:#x})",
                request.runtime_interface_version,
                request.runtime_api_version
            );
        }

        result
    }
}

/// Entry point the OpenXR loader resolves by name.
///
/// # Safety
/// Called by the loader with the pointers required by
/// `xrNegotiateLoaderRuntimeInterface`.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "system" fn xrNegotiateLoaderRuntimeInterface(
    loader_info: *const XrNegotiateLoaderInfo,
    runtime_request: *mut XrNegotiateRuntimeRequest,
) -> XrResult {
    context::catch_panic("xrNegotiateLoaderRuntimeInterface", || {
        // SAFETY: forwarded under the loader's contract.
        unsafe { context::global().negotiate_loader_runtime_interface(loader_info, runtime_request) }
    })
}
