//! `xrGetInstanceProcAddr` interceptor
//!
//! Every lookup goes to the chained resolver first. Only a successful lookup of
//! `xrEnumerateInstanceExtensionProperties` is redirected to the shim; all other
//! names come back exactly as the chained runtime answered.

use std::ffi::{c_char, CStr};

use crate::context::{self, ShimContext};
use crate::enumerate;
use crate::xr::{
    PfnEnumerateInstanceExtensionProperties, PfnVoidFunction, XrInstance, XrResult,
    ENUMERATE_INSTANCE_EXTENSION_PROPERTIES,
};

impl ShimContext {
    /// Resolve `name` through the chained runtime, substituting the shim's
    /// extension enumeration.
    ///
    /// # Safety
    /// `name` must be null or NUL-terminated and `function` must be null or
    /// writable, as for `xrGetInstanceProcAddr`.
    pub unsafe fn get_instance_proc_addr(
        &self,
        instance: XrInstance,
        name: *const c_char,
        function: *mut PfnVoidFunction,
    ) -> XrResult {
        let Some(next) = self.next_get_instance_proc_addr.get() else {
            return XrResult::ERROR_FUNCTION_UNSUPPORTED;
        };

        // SAFETY: forwarded under the caller's contract.
        let result = unsafe { next(instance, name, function) };
        if result.failed() || name.is_null() || function.is_null() {
            return result;
        }

        // SAFETY: non-null `name` is NUL-terminated per the caller's contract.
        let requested = unsafe { CStr::from_ptr(name) };
        if requested.to_bytes() != ENUMERATE_INSTANCE_EXTENSION_PROPERTIES.as_bytes() {
            return result;
        }

        // SAFETY: `function` was just written by the chained resolver.
        let Some(chained) = (unsafe { *function }) else {
            return result;
        };

        // SAFETY: the runtime returned this pointer for this exact name, so it
        // has the `xrEnumerateInstanceExtensionProperties` signature.
        let chained = unsafe {
            std::mem::transmute::<unsafe extern "system" fn(), PfnEnumerateInstanceExtensionProperties>(
                chained,
            )
        };
        self.next_enumerate_instance_extension_properties
            .set(Some(chained));

        let replacement: PfnEnumerateInstanceExtensionProperties =
            enumerate::xr_enumerate_instance_extension_properties;
        // SAFETY: the loader casts the pointer back to the signature for `name`.
        unsafe {
            *function = Some(std::mem::transmute::<
                PfnEnumerateInstanceExtensionProperties,
                unsafe extern "system" fn(),
            >(replacement));
        }
        tracing::debug!("Redirected {}", ENUMERATE_INSTANCE_EXTENSION_PROPERTIES);

        XrResult::SUCCESS
    }
}

/// The resolver handed to the loader in place of the chained one.
///
/// # Safety
/// Called by the loader or application with `xrGetInstanceProcAddr` arguments.
pub unsafe extern "system" fn xr_get_instance_proc_addr(
    instance: XrInstance,
    name: *const c_char,
    function: *mut PfnVoidFunction,
) -> XrResult {
    context::catch_panic("xrGetInstanceProcAddr", || match context::try_global() {
        // SAFETY: forwarded under the caller's contract.
        Some(context) => unsafe { context.get_instance_proc_addr(instance, name, function) },
        None => XrResult::ERROR_FUNCTION_UNSUPPORTED,
    })
}
