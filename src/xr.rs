//! OpenXR ABI subset used by the shim
//!
//! Only the records, result codes and function-pointer types that the
//! negotiation and extension-enumeration paths touch are declared here.
//! Layouts follow `openxr.h` and `openxr_loader_negotiation.h`.

use std::ffi::{c_char, c_void, CStr};
use std::fmt;

/// `XR_MAX_EXTENSION_NAME_SIZE`
pub const XR_MAX_EXTENSION_NAME_SIZE: usize = 128;

/// `XR_CURRENT_LOADER_RUNTIME_VERSION`
pub const XR_CURRENT_LOADER_RUNTIME_VERSION: u32 = 1;

/// `XR_LOADER_INFO_STRUCT_VERSION`
pub const XR_LOADER_INFO_STRUCT_VERSION: u32 = 1;

/// `XR_RUNTIME_INFO_STRUCT_VERSION`
pub const XR_RUNTIME_INFO_STRUCT_VERSION: u32 = 1;

/// Symbol every runtime exports for the loader.
pub const NEGOTIATE_SYMBOL: &[u8] = b"xrNegotiateLoaderRuntimeInterface\0";

/// Name of the one function the resolver interceptor replaces.
pub const ENUMERATE_INSTANCE_EXTENSION_PROPERTIES: &str = "xrEnumerateInstanceExtensionProperties";

/// `XrVersion`
pub type XrVersion = u64;

/// `XR_MAKE_VERSION`
pub const fn make_version(major: u64, minor: u64, patch: u64) -> XrVersion {
    ((major & 0xffff) << 48) | ((minor & 0xffff) << 32) | (patch & 0xffff_ffff)
}

/// `XrInstance` (a non-dispatchable 64-bit handle)
pub type XrInstance = u64;

/// `XR_NULL_HANDLE`
pub const XR_NULL_HANDLE: XrInstance = 0;

/// `XrResult`
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct XrResult(pub i32);

impl XrResult {
    pub const SUCCESS: Self = Self(0);
    pub const ERROR_VALIDATION_FAILURE: Self = Self(-1);
    pub const ERROR_RUNTIME_FAILURE: Self = Self(-2);
    pub const ERROR_INITIALIZATION_FAILED: Self = Self(-6);
    pub const ERROR_FUNCTION_UNSUPPORTED: Self = Self(-7);
    pub const ERROR_SIZE_INSUFFICIENT: Self = Self(-11);
    pub const ERROR_HANDLE_INVALID: Self = Self(-12);
    pub const ERROR_FILE_ACCESS_ERROR: Self = Self(-32);

    /// `XR_SUCCEEDED`: every non-negative code is a success code.
    pub fn succeeded(self) -> bool {
        self.0 >= 0
    }

    /// `XR_FAILED`
    pub fn failed(self) -> bool {
        self.0 < 0
    }

    /// Symbolic name for the codes the shim knows about.
    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::SUCCESS => "XR_SUCCESS",
            Self::ERROR_VALIDATION_FAILURE => "XR_ERROR_VALIDATION_FAILURE",
            Self::ERROR_RUNTIME_FAILURE => "XR_ERROR_RUNTIME_FAILURE",
            Self::ERROR_INITIALIZATION_FAILED => "XR_ERROR_INITIALIZATION_FAILED",
            Self::ERROR_FUNCTION_UNSUPPORTED => "XR_ERROR_FUNCTION_UNSUPPORTED",
            Self::ERROR_SIZE_INSUFFICIENT => "XR_ERROR_SIZE_INSUFFICIENT",
            Self::ERROR_HANDLE_INVALID => "XR_ERROR_HANDLE_INVALID",
            Self::ERROR_FILE_ACCESS_ERROR => "XR_ERROR_FILE_ACCESS_ERROR",
            _ => return None,
        })
    }
}

impl fmt::Display for XrResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "XrResult({})", self.0),
        }
    }
}

/// `XrStructureType`
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct XrStructureType(pub i32);

impl XrStructureType {
    pub const EXTENSION_PROPERTIES: Self = Self(2);
}

/// `XrLoaderInterfaceStructs`
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct XrLoaderInterfaceStructs(pub i32);

impl XrLoaderInterfaceStructs {
    pub const LOADER_INFO: Self = Self(1);
    pub const RUNTIME_REQUEST: Self = Self(3);
}

/// `PFN_xrVoidFunction`
pub type PfnVoidFunction = Option<unsafe extern "system" fn()>;

/// `PFN_xrGetInstanceProcAddr`
pub type PfnGetInstanceProcAddr = unsafe extern "system" fn(
    instance: XrInstance,
    name: *const c_char,
    function: *mut PfnVoidFunction,
) -> XrResult;

/// `PFN_xrEnumerateInstanceExtensionProperties`
pub type PfnEnumerateInstanceExtensionProperties = unsafe extern "system" fn(
    layer_name: *const c_char,
    property_capacity_input: u32,
    property_count_output: *mut u32,
    properties: *mut XrExtensionProperties,
) -> XrResult;

/// `PFN_xrNegotiateLoaderRuntimeInterface`
pub type PfnNegotiateLoaderRuntimeInterface = unsafe extern "system" fn(
    loader_info: *const XrNegotiateLoaderInfo,
    runtime_request: *mut XrNegotiateRuntimeRequest,
) -> XrResult;

/// `XrExtensionProperties`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct XrExtensionProperties {
    pub ty: XrStructureType,
    pub next: *mut c_void,
    pub extension_name: [c_char; XR_MAX_EXTENSION_NAME_SIZE],
    pub extension_version: u32,
}

impl XrExtensionProperties {
    /// An empty record carrying the type tag the runtime expects on input.
    pub fn tagged() -> Self {
        Self {
            ty: XrStructureType::EXTENSION_PROPERTIES,
            next: std::ptr::null_mut(),
            extension_name: [0; XR_MAX_EXTENSION_NAME_SIZE],
            extension_version: 0,
        }
    }

    /// Build a populated record. Names longer than the fixed field are truncated.
    pub fn new(name: &str, version: u32) -> Self {
        let mut props = Self::tagged();
        let len = name.len().min(XR_MAX_EXTENSION_NAME_SIZE - 1);
        for (dst, src) in props.extension_name.iter_mut().zip(&name.as_bytes()[..len]) {
            *dst = *src as c_char;
        }
        props.extension_version = version;
        props
    }

    /// Raw name bytes up to (not including) the first NUL.
    pub fn name_bytes(&self) -> &[u8] {
        // SAFETY: c_char and u8 have the same size and alignment.
        let bytes = unsafe {
            std::slice::from_raw_parts(
                self.extension_name.as_ptr().cast::<u8>(),
                XR_MAX_EXTENSION_NAME_SIZE,
            )
        };
        match CStr::from_bytes_until_nul(bytes) {
            Ok(name) => name.to_bytes(),
            Err(_) => bytes,
        }
    }

    /// Name as text, lossily decoded.
    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.name_bytes()).into_owned()
    }
}

impl fmt::Debug for XrExtensionProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XrExtensionProperties")
            .field("ty", &self.ty)
            .field("extension_name", &self.name())
            .field("extension_version", &self.extension_version)
            .finish()
    }
}

/// `XrNegotiateLoaderInfo`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct XrNegotiateLoaderInfo {
    pub struct_type: XrLoaderInterfaceStructs,
    pub struct_version: u32,
    pub struct_size: usize,
    pub min_interface_version: u32,
    pub max_interface_version: u32,
    pub min_api_version: XrVersion,
    pub max_api_version: XrVersion,
}

impl XrNegotiateLoaderInfo {
    /// The record the OpenXR loader passes to a runtime.
    pub fn from_loader() -> Self {
        Self {
            struct_type: XrLoaderInterfaceStructs::LOADER_INFO,
            struct_version: XR_LOADER_INFO_STRUCT_VERSION,
            struct_size: std::mem::size_of::<Self>(),
            min_interface_version: 1,
            max_interface_version: XR_CURRENT_LOADER_RUNTIME_VERSION,
            min_api_version: make_version(1, 0, 0),
            max_api_version: make_version(1, 0x3ff, 0xfff),
        }
    }
}

/// `XrNegotiateRuntimeRequest`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct XrNegotiateRuntimeRequest {
    pub struct_type: XrLoaderInterfaceStructs,
    pub struct_version: u32,
    pub struct_size: usize,
    pub runtime_interface_version: u32,
    pub runtime_api_version: XrVersion,
    pub get_instance_proc_addr: Option<PfnGetInstanceProcAddr>,
}

impl XrNegotiateRuntimeRequest {
    /// An empty request as the loader prepares it before negotiation.
    pub fn from_loader() -> Self {
        Self {
            struct_type: XrLoaderInterfaceStructs::RUNTIME_REQUEST,
            struct_version: XR_RUNTIME_INFO_STRUCT_VERSION,
            struct_size: std::mem::size_of::<Self>(),
            runtime_interface_version: 0,
            runtime_api_version: 0,
            get_instance_proc_addr: None,
        }
    }
}
