//! End-to-end loader protocol through the exported entry point
//!
//! Installs a process context chained to the fake runtime, then behaves like the
//! OpenXR loader: negotiate, resolve through the returned resolver, enumerate
//! through the returned function pointer.

mod fake_runtime;

use serial_test::serial;
use std::sync::Once;
use xr_extension_mask::report;
use xr_extension_mask::xr::{
    PfnEnumerateInstanceExtensionProperties, PfnGetInstanceProcAddr, PfnVoidFunction,
    XrExtensionProperties, XrNegotiateLoaderInfo, XrNegotiateRuntimeRequest, XrResult,
    XR_NULL_HANDLE,
};
use xr_extension_mask::{context, xrNegotiateLoaderRuntimeInterface};
use xr_extension_mask::{ChainedRuntime, ExtensionMask, ShimContext};

static INSTALL: Once = Once::new();

fn install_shim() {
    INSTALL.call_once(|| {
        context::install(ShimContext::new(
            Some(ChainedRuntime::from_entry_point(fake_runtime::negotiate)),
            ExtensionMask::new(["B", "D"]),
        ))
        .expect("context installed once");
    });
}

fn loader_negotiate() -> PfnGetInstanceProcAddr {
    install_shim();
    let info = XrNegotiateLoaderInfo::from_loader();
    let mut request = XrNegotiateRuntimeRequest::from_loader();
    let result = unsafe { xrNegotiateLoaderRuntimeInterface(&info, &mut request) };
    assert_eq!(result, XrResult::SUCCESS);
    request.get_instance_proc_addr.expect("resolver")
}

fn loader_enumerate() -> PfnEnumerateInstanceExtensionProperties {
    let resolver = loader_negotiate();
    let mut function: PfnVoidFunction = None;
    let name = c"xrEnumerateInstanceExtensionProperties";
    let result = unsafe { resolver(XR_NULL_HANDLE, name.as_ptr(), &mut function) };
    assert_eq!(result, XrResult::SUCCESS);
    fake_runtime::from_void(function.expect("enumeration function"))
}

#[test]
#[serial]
fn test_loader_sees_masked_list() {
    fake_runtime::reset(&["A", "B", "C", "D"]);
    let enumerate = loader_enumerate();

    let mut count = 0u32;
    let result = unsafe { enumerate(std::ptr::null(), 0, &mut count, std::ptr::null_mut()) };
    assert_eq!((result, count), (XrResult::SUCCESS, 2));

    let mut buffer = vec![XrExtensionProperties::tagged(); count as usize];
    let result = unsafe { enumerate(std::ptr::null(), count, &mut count, buffer.as_mut_ptr()) };
    assert_eq!((result, count), (XrResult::SUCCESS, 2));
    assert_eq!(fake_runtime::names(&buffer), vec!["A", "C"]);
}

#[test]
#[serial]
fn test_loader_undersized_buffer() {
    fake_runtime::reset(&["A", "B", "C", "D", "E"]);
    let enumerate = loader_enumerate();

    let mut count = 0u32;
    let mut buffer = vec![XrExtensionProperties::tagged(); 1];
    let result = unsafe { enumerate(std::ptr::null(), 1, &mut count, buffer.as_mut_ptr()) };
    assert_eq!(result, XrResult::ERROR_SIZE_INSUFFICIENT);
    assert_eq!(count, 3);
}

#[test]
#[serial]
fn test_loader_other_functions_are_the_runtimes() {
    fake_runtime::reset(&["A"]);
    let resolver = loader_negotiate();
    let mut function: PfnVoidFunction = None;
    let result = unsafe { resolver(XR_NULL_HANDLE, c"xrCreateInstance".as_ptr(), &mut function) };
    assert_eq!(result, XrResult::SUCCESS);
    assert_eq!(
        function.map(|f| f as usize),
        Some(fake_runtime::create_instance as usize)
    );
}

#[test]
#[serial]
fn test_loader_rejected_negotiation() {
    install_shim();
    fake_runtime::reset(&["A"]);
    fake_runtime::set_negotiate_result(XrResult::ERROR_INITIALIZATION_FAILED);

    let info = XrNegotiateLoaderInfo::from_loader();
    let mut request = XrNegotiateRuntimeRequest::from_loader();
    let result = unsafe { xrNegotiateLoaderRuntimeInterface(&info, &mut request) };
    assert_eq!(result, XrResult::ERROR_INITIALIZATION_FAILED);
    assert_eq!(
        request.get_instance_proc_addr.map(|f| f as usize),
        Some(fake_runtime::get_instance_proc_addr as usize)
    );
}

#[test]
#[serial]
fn test_probe_reports_raw_and_visible_lists() {
    install_shim();
    fake_runtime::reset(&["A", "B", "C", "D"]);

    let report = report::probe().unwrap();
    assert_eq!(report.interface_version, 1);
    assert_eq!(report.runtime, None);
    let masked: Vec<_> = report
        .extensions
        .iter()
        .filter(|e| e.masked)
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(masked, vec!["B", "D"]);
    assert_eq!(report.extensions.len(), 4);
    assert_eq!(report.visible, vec!["A", "C"]);
    assert_eq!(report.masked_count(), 2);
}
