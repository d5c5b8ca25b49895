//! Filtered `xrEnumerateInstanceExtensionProperties`
//!
//! Callers use the two-call idiom: capacity 0 to learn the count, then again
//! with a buffer. Because masking changes the count, the replacement always runs
//! the full two-call sequence against the chained runtime, masks the owned
//! result, and serves the caller's call from that.

use std::ffi::c_char;

use crate::context::{self, ShimContext};
use crate::mask::ExtensionMask;
use crate::xr::{PfnEnumerateInstanceExtensionProperties, XrExtensionProperties, XrResult};

/// Fetch the chained runtime's full, unfiltered extension list.
///
/// # Safety
/// `next` must be a valid `xrEnumerateInstanceExtensionProperties`.
pub unsafe fn materialize(
    next: PfnEnumerateInstanceExtensionProperties,
) -> Result<Vec<XrExtensionProperties>, XrResult> {
    let mut count = 0u32;
    // SAFETY: discovery call with no buffer.
    let result = unsafe { next(std::ptr::null(), 0, &mut count, std::ptr::null_mut()) };
    if result.failed() {
        return Err(result);
    }

    let mut properties = vec![XrExtensionProperties::tagged(); count as usize];
    // SAFETY: `properties` holds exactly `count` writable records.
    let result = unsafe {
        next(
            std::ptr::null(),
            properties.len() as u32,
            &mut count,
            properties.as_mut_ptr(),
        )
    };
    if result.failed() {
        return Err(result);
    }

    properties.truncate(count as usize);
    Ok(properties)
}

/// Serve one two-call enumeration request from the chained runtime, masked.
///
/// The filtered count is always written. At most `property_capacity_input`
/// records are copied into `properties`, and nothing is copied when the
/// capacity is 0, even if a buffer is passed.
///
/// # Safety
/// `next` must be a valid `xrEnumerateInstanceExtensionProperties`; the
/// remaining arguments follow that function's contract.
pub unsafe fn enumerate_masked(
    next: PfnEnumerateInstanceExtensionProperties,
    mask: &ExtensionMask,
    layer_name: *const c_char,
    property_capacity_input: u32,
    property_count_output: *mut u32,
    properties: *mut XrExtensionProperties,
) -> XrResult {
    // Extensions of a named API layer are never masked.
    if !layer_name.is_null() {
        // SAFETY: forwarded under the caller's contract.
        return unsafe {
            next(
                layer_name,
                property_capacity_input,
                property_count_output,
                properties,
            )
        };
    }

    if property_count_output.is_null() {
        return XrResult::ERROR_VALIDATION_FAILURE;
    }

    // SAFETY: `next` is valid per the caller's contract.
    let mut filtered = match unsafe { materialize(next) } {
        Ok(list) => list,
        Err(result) => return result,
    };
    mask.apply(&mut filtered);

    let count = filtered.len() as u32;
    if !properties.is_null() && property_capacity_input > 0 {
        let copied = filtered.len().min(property_capacity_input as usize);
        // SAFETY: the caller's buffer holds at least `property_capacity_input` records.
        unsafe { std::ptr::copy_nonoverlapping(filtered.as_ptr(), properties, copied) };
    }

    // SAFETY: checked non-null above.
    unsafe { *property_count_output = count };

    if property_capacity_input > 0 && property_capacity_input < count {
        return XrResult::ERROR_SIZE_INSUFFICIENT;
    }
    XrResult::SUCCESS
}

impl ShimContext {
    /// `xrEnumerateInstanceExtensionProperties` with the configured mask applied.
    ///
    /// # Safety
    /// Arguments follow the `xrEnumerateInstanceExtensionProperties` contract.
    pub unsafe fn enumerate_instance_extension_properties(
        &self,
        layer_name: *const c_char,
        property_capacity_input: u32,
        property_count_output: *mut u32,
        properties: *mut XrExtensionProperties,
    ) -> XrResult {
        let Some(next) = self.next_enumerate_instance_extension_properties.get() else {
            return XrResult::ERROR_FUNCTION_UNSUPPORTED;
        };

        // SAFETY: forwarded under the caller's contract.
        unsafe {
            enumerate_masked(
                next,
                &self.mask,
                layer_name,
                property_capacity_input,
                property_count_output,
                properties,
            )
        }
    }
}

/// The enumeration function handed out by the resolver interceptor.
///
/// # Safety
/// Called with `xrEnumerateInstanceExtensionProperties` arguments.
pub unsafe extern "system" fn xr_enumerate_instance_extension_properties(
    layer_name: *const c_char,
    property_capacity_input: u32,
    property_count_output: *mut u32,
    properties: *mut XrExtensionProperties,
) -> XrResult {
    context::catch_panic("xrEnumerateInstanceExtensionProperties", || {
        match context::try_global() {
            // SAFETY: forwarded under the caller's contract.
            Some(context) => unsafe {
                context.enumerate_instance_extension_properties(
                    layer_name,
                    property_capacity_input,
                    property_count_output,
                    properties,
                )
            },
            None => XrResult::ERROR_FUNCTION_UNSUPPORTED,
        }
    })
}
