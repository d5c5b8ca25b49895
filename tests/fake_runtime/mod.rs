//! In-process stand-in for a chained OpenXR runtime
//!
//! Implements negotiation, `xrGetInstanceProcAddr` and a well-behaved two-call
//! `xrEnumerateInstanceExtensionProperties` over a configurable list. State is
//! process-global, so tests using it run `#[serial]`.

#![allow(dead_code)]

use std::ffi::{c_char, CStr};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::Mutex;

use xr_extension_mask::xr::{
    PfnEnumerateInstanceExtensionProperties, PfnGetInstanceProcAddr, PfnVoidFunction,
    XrExtensionProperties, XrInstance, XrNegotiateLoaderInfo, XrNegotiateRuntimeRequest, XrResult,
    make_version,
};

pub const LAYER_NAME: &CStr = c"XR_APILAYER_fake_validation";

static EXTENSIONS: Mutex<Vec<(String, u32)>> = Mutex::new(Vec::new());
static NEGOTIATE_RESULT: AtomicI32 = AtomicI32::new(0);
static NEGOTIATE_CALLS: AtomicUsize = AtomicUsize::new(0);
static ENUMERATE_CALLS: AtomicUsize = AtomicUsize::new(0);
static RELOADED_RESOLVER: AtomicBool = AtomicBool::new(false);

/// Reset to a successful runtime advertising `names` (versions 1, 2, ...)
pub fn reset(names: &[&str]) {
    let mut list = EXTENSIONS.lock().unwrap();
    *list = names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_string(), i as u32 + 1))
        .collect();
    NEGOTIATE_RESULT.store(XrResult::SUCCESS.0, Ordering::SeqCst);
    NEGOTIATE_CALLS.store(0, Ordering::SeqCst);
    ENUMERATE_CALLS.store(0, Ordering::SeqCst);
    RELOADED_RESOLVER.store(false, Ordering::SeqCst);
}

pub fn set_negotiate_result(result: XrResult) {
    NEGOTIATE_RESULT.store(result.0, Ordering::SeqCst);
}

pub fn negotiate_calls() -> usize {
    NEGOTIATE_CALLS.load(Ordering::SeqCst)
}

pub fn enumerate_calls() -> usize {
    ENUMERATE_CALLS.load(Ordering::SeqCst)
}

fn current_list(layer_name: *const c_char) -> Vec<XrExtensionProperties> {
    if layer_name.is_null() {
        EXTENSIONS
            .lock()
            .unwrap()
            .iter()
            .map(|(name, version)| XrExtensionProperties::new(name, *version))
            .collect()
    } else {
        vec![
            XrExtensionProperties::new("XR_EXT_debug_utils", 4),
            XrExtensionProperties::new("XR_EXT_layer_only", 1),
        ]
    }
}

pub unsafe extern "system" fn enumerate_instance_extension_properties(
    layer_name: *const c_char,
    capacity: u32,
    count: *mut u32,
    properties: *mut XrExtensionProperties,
) -> XrResult {
    ENUMERATE_CALLS.fetch_add(1, Ordering::SeqCst);
    let list = current_list(layer_name);
    unsafe { *count = list.len() as u32 };
    if capacity == 0 {
        return XrResult::SUCCESS;
    }
    if (capacity as usize) < list.len() {
        return XrResult::ERROR_SIZE_INSUFFICIENT;
    }
    unsafe { std::ptr::copy_nonoverlapping(list.as_ptr(), properties, list.len()) };
    XrResult::SUCCESS
}

pub unsafe extern "system" fn create_instance() {}

pub unsafe extern "system" fn get_instance_proc_addr(
    _instance: XrInstance,
    name: *const c_char,
    function: *mut PfnVoidFunction,
) -> XrResult {
    let name = unsafe { CStr::from_ptr(name) }.to_bytes();
    let resolved: PfnVoidFunction = match name {
        b"xrEnumerateInstanceExtensionProperties" => Some(to_void(enumerate_instance_extension_properties)),
        b"xrCreateInstance" => Some(create_instance as unsafe extern "system" fn()),
        _ => None,
    };
    unsafe { *function = resolved };
    if resolved.is_some() {
        XrResult::SUCCESS
    } else {
        XrResult::ERROR_FUNCTION_UNSUPPORTED
    }
}

pub unsafe extern "system" fn create_instance_reloaded() {}

/// Resolver handed out once `use_reloaded_resolver` is set
pub unsafe extern "system" fn get_instance_proc_addr_reloaded(
    instance: XrInstance,
    name: *const c_char,
    function: *mut PfnVoidFunction,
) -> XrResult {
    if unsafe { CStr::from_ptr(name) }.to_bytes() == b"xrCreateInstance" {
        unsafe { *function = Some(create_instance_reloaded as unsafe extern "system" fn()) };
        return XrResult::SUCCESS;
    }
    unsafe { get_instance_proc_addr(instance, name, function) }
}

/// Make later negotiations hand out `get_instance_proc_addr_reloaded`
pub fn use_reloaded_resolver(enabled: bool) {
    RELOADED_RESOLVER.store(enabled, Ordering::SeqCst);
}

pub unsafe extern "system" fn negotiate(
    _loader_info: *const XrNegotiateLoaderInfo,
    runtime_request: *mut XrNegotiateRuntimeRequest,
) -> XrResult {
    NEGOTIATE_CALLS.fetch_add(1, Ordering::SeqCst);
    let result = XrResult(NEGOTIATE_RESULT.load(Ordering::SeqCst));
    let request = unsafe { &mut *runtime_request };
    let resolver: PfnGetInstanceProcAddr = if RELOADED_RESOLVER.load(Ordering::SeqCst) {
        get_instance_proc_addr_reloaded
    } else {
        get_instance_proc_addr
    };
    // A failing runtime may still scribble on the request.
    request.get_instance_proc_addr = Some(resolver);
    if result.succeeded() {
        request.runtime_interface_version = 1;
        request.runtime_api_version = make_version(1, 0, 34);
    }
    result
}

pub fn to_void(f: PfnEnumerateInstanceExtensionProperties) -> unsafe extern "system" fn() {
    unsafe { std::mem::transmute::<PfnEnumerateInstanceExtensionProperties, unsafe extern "system" fn()>(f) }
}

pub fn from_void(f: unsafe extern "system" fn()) -> PfnEnumerateInstanceExtensionProperties {
    unsafe { std::mem::transmute::<unsafe extern "system" fn(), PfnEnumerateInstanceExtensionProperties>(f) }
}

/// Two-call enumeration through `enumerate`, as an application would do it
pub fn enumerate_all(
    enumerate: PfnEnumerateInstanceExtensionProperties,
    layer_name: *const c_char,
) -> Result<Vec<XrExtensionProperties>, XrResult> {
    let mut count = 0u32;
    let result = unsafe { enumerate(layer_name, 0, &mut count, std::ptr::null_mut()) };
    if result.failed() {
        return Err(result);
    }
    let mut list = vec![XrExtensionProperties::tagged(); count as usize];
    let result = unsafe { enumerate(layer_name, count, &mut count, list.as_mut_ptr()) };
    if result.failed() {
        return Err(result);
    }
    list.truncate(count as usize);
    Ok(list)
}

pub fn names(list: &[XrExtensionProperties]) -> Vec<String> {
    list.iter().map(XrExtensionProperties::name).collect()
}

/// Byte view of records, for byte-identical comparisons
pub fn record_bytes(list: &[XrExtensionProperties]) -> Vec<Vec<u8>> {
    list.iter()
        .map(|props| {
            let mut bytes = props.name_bytes().to_vec();
            bytes.extend_from_slice(&props.extension_version.to_le_bytes());
            bytes.extend_from_slice(&props.ty.0.to_le_bytes());
            bytes
        })
        .collect()
}

/// The shim's own cdylib, built alongside the test binaries
pub fn shim_library() -> std::path::PathBuf {
    let file_name = format!(
        "{}xr_extension_mask{}",
        std::env::consts::DLL_PREFIX,
        std::env::consts::DLL_SUFFIX
    );
    let exe = std::env::current_exe().unwrap();
    // Test binaries live in target/<profile>/deps; the cdylib is there and
    // copied up one level.
    exe.ancestors()
        .skip(1)
        .take(2)
        .map(|dir| dir.join(&file_name))
        .find(|path| path.is_file())
        .unwrap_or_else(|| panic!("{} not found next to {}", file_name, exe.display()))
}
